use anyhow::Result;

use super::{print_view, CommandContext};
use crate::cli::SubmissionRef;
use crate::store::SubmissionFilter;

pub struct ShowCommand {
    pub target: SubmissionRef,
}

impl ShowCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let view = ctx.service.get(self.target.ip_type, &self.target.id).await?;
        if ctx.json {
            return ctx.emit_json(&view);
        }
        print_view(&view);
        Ok(())
    }
}

pub struct ListCommand {
    pub filter: SubmissionFilter,
}

impl ListCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let views = ctx.service.list(&self.filter).await?;
        if ctx.json {
            return ctx.emit_json(&views);
        }

        if views.is_empty() {
            println!("📋 No submissions found");
            println!("   💡 File one with: ip-portal file --help");
            return Ok(());
        }

        println!("📊 SUBMISSIONS ({})", views.len());
        println!("────────────────────");
        for view in &views {
            let submission = &view.submission;
            let case = view
                .active_case
                .as_ref()
                .map(|case| format!(" [resubmission #{}: {}]", case.number, case.status))
                .unwrap_or_default();
            println!(
                "  {} {:<18} {:<40} {}{}",
                status_icon(view),
                submission.status.as_str(),
                submission.key().to_string(),
                submission.title,
                case
            );
        }
        Ok(())
    }
}

fn status_icon(view: &crate::lifecycle::SubmissionView) -> &'static str {
    use crate::lifecycle::SubmissionStatus::*;
    match view.submission.status {
        New => "🆕",
        UnderReview if view.ready_for_review => "🟢",
        UnderReview => "🔍",
        ApprovedForFiling => "✅",
        Rejected => "🔴",
        Finalized => "🏁",
        EscalationRequired => "⚠️ ",
    }
}
