use anyhow::Result;

use super::{print_view, CommandContext};
use crate::cli::SubmissionRef;
use crate::lifecycle::{LifecycleCommand, SubmissionStatus};

/// Any single lifecycle transition issued from the command line.
pub struct TransitionCommand {
    pub target: SubmissionRef,
    pub command: LifecycleCommand,
}

impl TransitionCommand {
    pub fn new(target: SubmissionRef, command: LifecycleCommand) -> Self {
        Self { target, command }
    }

    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let name = self.command.name();
        let view = ctx
            .service
            .execute(self.target.ip_type, &self.target.id, &ctx.actor, self.command)
            .await?;

        if ctx.json {
            return ctx.emit_json(&view);
        }

        println!("✅ {} committed", name);
        print_view(&view);
        if let Some(hint) = next_step(&view) {
            println!();
            println!("💡 Next: {}", hint);
        }
        Ok(())
    }
}

fn next_step(view: &crate::lifecycle::SubmissionView) -> Option<&'static str> {
    use crate::lifecycle::ResubmissionStatus::*;
    if let Some(case) = &view.active_case {
        return Some(match case.status {
            PendingResubmission => "inventor runs 'ip-portal resubmit'",
            Resubmitted => "consultant runs 'ip-portal receive-resubmission'",
            ReceivedByConsultant => "consultant runs 'ip-portal start-rereview'",
            UnderReReview => "consultant runs 'ip-portal decide'",
            Approved | RejectedAgain => return None,
        });
    }
    match view.submission.status {
        SubmissionStatus::New => Some("consultant runs 'ip-portal receive'"),
        SubmissionStatus::UnderReview if view.ready_for_review => {
            Some("consultant runs 'ip-portal approve' or 'ip-portal reject'")
        }
        SubmissionStatus::UnderReview => Some("consultant completes 'ip-portal triage'"),
        SubmissionStatus::ApprovedForFiling | SubmissionStatus::Rejected => {
            Some("admin runs 'ip-portal finalize'")
        }
        SubmissionStatus::Finalized | SubmissionStatus::EscalationRequired => None,
    }
}
