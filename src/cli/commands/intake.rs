use anyhow::Result;
use chrono::{NaiveDate, Utc};

use super::{print_view, CommandContext};
use crate::lifecycle::{IpType, SubmissionDraft};

pub struct FileCommand {
    pub ip_type: IpType,
    pub title: String,
    pub description: String,
    pub delivery_unit: String,
    pub filing_date: Option<NaiveDate>,
    pub form_ref: Option<String>,
    pub design_ref: Option<String>,
}

impl FileCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let draft = SubmissionDraft {
            ip_type: self.ip_type,
            title: self.title,
            description: self.description,
            delivery_unit: self.delivery_unit,
            filing_date: self.filing_date.unwrap_or_else(|| Utc::now().date_naive()),
            official_form_ref: self.form_ref,
            design_representation_ref: self.design_ref,
        };

        let view = ctx.service.file(&ctx.actor, draft).await?;
        if ctx.json {
            return ctx.emit_json(&view);
        }

        println!("✅ Submission filed");
        print_view(&view);
        println!();
        println!(
            "💡 A consultant picks it up with: ip-portal receive {} {} --role consultant --user <id>",
            view.submission.ip_type, view.submission.id
        );
        Ok(())
    }
}
