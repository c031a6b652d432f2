use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::lifecycle::{IpType, MissingItems, ReReviewOutcome, Role, SubmissionId, SubmissionStatus};

pub mod commands;

#[derive(Parser)]
#[command(name = "ip-portal")]
#[command(about = "Review and resubmission lifecycle for IP submissions")]
#[command(long_about = "ip-portal files intellectual-property submissions and drives them through \
                       consultant review, resubmission rounds and final decision. Start with \
                       'ip-portal file' as an inventor, then 'ip-portal receive' as a consultant.")]
pub struct Cli {
    /// Role the command is issued under
    #[arg(
        long,
        global = true,
        default_value = "inventor",
        help = "Acting role: inventor, consultant, admin or system"
    )]
    pub role: Role,

    /// User id the command is issued under
    #[arg(long, global = true, default_value = "", help = "Acting user id")]
    pub user: String,

    /// Print machine-readable JSON instead of the human summary
    #[arg(long, global = true, help = "Emit JSON on stdout")]
    pub json: bool,

    /// Override the file store location from configuration
    #[arg(
        long,
        global = true,
        help = "Path of the JSON submission store (forces the file backend)"
    )]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Identifies one submission: IP type plus id.
#[derive(Args, Debug, Clone)]
pub struct SubmissionRef {
    /// IP type of the submission
    #[arg(help = "IP type: industrial_design, utility_model, trademark, copyright")]
    pub ip_type: IpType,
    /// Submission id
    #[arg(help = "Submission id as printed by 'ip-portal file'")]
    pub id: SubmissionId,
}

/// Artifacts a rejection flags as missing.
#[derive(Args, Debug, Clone, Default)]
pub struct MissingArgs {
    #[arg(long, help = "Inventor contact details are missing")]
    pub missing_inventor_details: bool,
    #[arg(long, help = "Design views are missing")]
    pub missing_design_views: bool,
    #[arg(long, help = "Official form / description is missing")]
    pub missing_description: bool,
    #[arg(long, help = "Advisory resubmission deadline (YYYY-MM-DD)")]
    pub deadline: Option<NaiveDate>,
}

impl MissingArgs {
    pub fn items(&self) -> MissingItems {
        MissingItems {
            inventor_details: self.missing_inventor_details,
            design_views: self.missing_design_views,
            description: self.missing_description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Approved,
    RejectedAgain,
}

impl From<DecisionArg> for ReReviewOutcome {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Approved => ReReviewOutcome::Approved,
            DecisionArg::RejectedAgain => ReReviewOutcome::RejectedAgain,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// File a new submission (inventor)
    File {
        #[arg(long, help = "IP type: industrial_design, utility_model, trademark, copyright")]
        ip_type: IpType,
        #[arg(long, help = "Submission title")]
        title: String,
        #[arg(long, help = "Free-text description")]
        description: String,
        #[arg(long, help = "Business unit the submission is delivered for")]
        delivery_unit: String,
        #[arg(long, help = "Filing date (YYYY-MM-DD, defaults to today)")]
        filing_date: Option<NaiveDate>,
        #[arg(long, help = "Reference to the uploaded official form")]
        form_ref: Option<String>,
        #[arg(long, help = "Reference to the uploaded design representation")]
        design_ref: Option<String>,
    },
    /// Show one submission with its active resubmission case
    Show {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// List submissions, optionally filtered
    List {
        #[arg(long, help = "Only this IP type")]
        ip_type: Option<IpType>,
        #[arg(long, help = "Only submissions in this status")]
        status: Option<SubmissionStatus>,
        #[arg(long, help = "Only submissions filed by this user")]
        submitter: Option<String>,
        #[arg(long, help = "Only submissions filed by --user")]
        mine: bool,
    },
    /// Take a new submission into review (consultant)
    Receive {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// Update the triage checklist (consultant)
    Triage {
        #[command(flatten)]
        target: SubmissionRef,
        #[arg(long, help = "Inventor is identified")]
        inventor_identified: Option<bool>,
        #[arg(long, help = "Design views are complete")]
        design_views_complete: Option<bool>,
        #[arg(long, help = "Description is clear")]
        description_clear: Option<bool>,
        #[arg(long, help = "Tick every checklist item")]
        all: bool,
    },
    /// Approve a fully triaged submission for filing (consultant)
    Approve {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// Reject a submission, optionally opening a resubmission case (consultant)
    Reject {
        #[command(flatten)]
        target: SubmissionRef,
        #[arg(long, help = "Reason shown to the inventor")]
        reason: String,
        #[command(flatten)]
        missing: MissingArgs,
    },
    /// Record the final result (admin)
    Finalize {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// Submit corrections for the open resubmission case (inventor)
    Resubmit {
        #[command(flatten)]
        target: SubmissionRef,
        #[arg(long, help = "Reference to updated inventor contact details")]
        contact_ref: Option<String>,
        #[arg(long, help = "Reference to updated design views")]
        design_ref: Option<String>,
        #[arg(long, help = "Reference to the updated official form")]
        form_ref: Option<String>,
        #[arg(long, help = "Remarks for the consultant")]
        remarks: String,
    },
    /// Acknowledge a resubmission (consultant)
    ReceiveResubmission {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// Start re-reviewing a received resubmission (consultant)
    #[command(name = "start-rereview")]
    StartReReview {
        #[command(flatten)]
        target: SubmissionRef,
    },
    /// Decide a re-review (consultant)
    Decide {
        #[command(flatten)]
        target: SubmissionRef,
        #[arg(long, value_enum, help = "approved or rejected-again")]
        outcome: DecisionArg,
        #[arg(long, help = "Consultant remarks")]
        remarks: String,
        #[command(flatten)]
        missing: MissingArgs,
    },
}
