use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::lifecycle::{
    Actor, ErrorKind, LifecycleError, LifecycleService, ResubmissionCase, SubmissionView,
};

pub mod intake;
pub mod query;
pub mod transition;

/// Everything a subcommand needs: the service and who is asking.
pub struct CommandContext {
    pub service: LifecycleService,
    pub actor: Actor,
    pub json: bool,
}

impl CommandContext {
    pub fn new(service: LifecycleService, actor: Actor, json: bool) -> Self {
        Self {
            service,
            actor,
            json,
        }
    }

    pub fn emit_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Process exit code for a failed command.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<LifecycleError>().map(LifecycleError::kind) {
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::InvalidTransition) => 4,
        Some(ErrorKind::GuardViolation) => 5,
        Some(ErrorKind::Forbidden) => 6,
        Some(ErrorKind::Conflict) => 7,
        Some(ErrorKind::Storage) => 8,
        None => 1,
    }
}

pub fn print_view(view: &SubmissionView) {
    let submission = &view.submission;
    println!("📋 {}: {}", submission.key(), submission.title);
    println!("   📌 Status: {} (revision {})", submission.status, submission.revision);
    println!("   👤 Submitter: {} ({})", submission.submitter_id, submission.delivery_unit);
    println!("   📅 Filed: {}", submission.filing_date);
    if submission.status == crate::lifecycle::SubmissionStatus::UnderReview {
        let ready = if view.ready_for_review { "yes" } else { "no" };
        println!("   ✅ Ready for review: {}", ready);
    }
    if let Some(reason) = &submission.rejection_reason {
        println!("   📝 Rejection reason: {}", reason);
    }
    if let Some(case) = &view.active_case {
        print_case(case);
    } else if !submission.resubmissions.is_empty() {
        println!("   🔁 Resubmission rounds: {}", submission.resubmissions.len());
    }
    if let Some(finalization) = &submission.finalization {
        println!(
            "   🏁 Final result: {} after {} day(s)",
            finalization.result, finalization.duration_days
        );
    }
}

fn print_case(case: &ResubmissionCase) {
    println!("   🔁 Resubmission #{}: {}", case.number, case.status);
    if let Some(deadline) = case.deadline {
        let overdue = if case.is_overdue(Utc::now().date_naive()) {
            " ⚠️  overdue"
        } else {
            ""
        };
        println!("      ⏰ Deadline: {}{}", deadline, overdue);
    }
    let mut missing = Vec::new();
    if case.missing.inventor_details {
        missing.push("inventor details");
    }
    if case.missing.design_views {
        missing.push("design views");
    }
    if case.missing.description {
        missing.push("description");
    }
    if !missing.is_empty() {
        println!("      📎 Missing: {}", missing.join(", "));
    }
}

pub fn show_how_to_get_started() -> Result<()> {
    println!("🗂️  IP Portal - submission review lifecycle");
    println!();
    println!("Inventor commands:");
    println!("  📝 ip-portal file --ip-type trademark --title ... --user <id>");
    println!("  🔁 ip-portal resubmit <ip-type> <id> --remarks ... --user <id>");
    println!();
    println!("Consultant commands:");
    println!("  📥 ip-portal receive <ip-type> <id> --role consultant --user <id>");
    println!("  ☑️  ip-portal triage <ip-type> <id> --all --role consultant --user <id>");
    println!("  ✅ ip-portal approve | reject | decide ...");
    println!();
    println!("Everyone:");
    println!("  👀 ip-portal show <ip-type> <id>");
    println!("  📊 ip-portal list [--status under_review]");
    println!();
    println!("💡 Add --json to any command for machine-readable output");
    Ok(())
}
