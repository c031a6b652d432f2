use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use ip_portal::cli::commands::intake::FileCommand;
use ip_portal::cli::commands::query::{ListCommand, ShowCommand};
use ip_portal::cli::commands::transition::TransitionCommand;
use ip_portal::cli::commands::{exit_code, show_how_to_get_started, CommandContext};
use ip_portal::cli::{Cli, Commands};
use ip_portal::config::{PortalConfig, StoreBackend};
use ip_portal::events::LogEventSink;
use ip_portal::lifecycle::{
    Actor, Corrections, LifecycleCommand, LifecycleService, ReReviewDecision, RejectionDecision,
    Triage, TriageUpdate,
};
use ip_portal::observability::lifecycle_metrics;
use ip_portal::store::{open_store, SubmissionFilter};
use ip_portal::telemetry::init_telemetry;

fn main() {
    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(run(cli)));

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        return show_how_to_get_started();
    };

    PortalConfig::load_env_file()?;
    let mut config = PortalConfig::load()?;
    if let Some(path) = cli.store {
        config.store.backend = StoreBackend::File;
        config.store.path = path;
    }
    init_telemetry(&config.observability)?;

    let store = open_store(&config).await?;
    let service = LifecycleService::new(store)
        .with_sink(Arc::new(LogEventSink))
        .with_policy(config.lifecycle.policy());
    let actor = Actor::new(cli.role, cli.user.trim());
    let ctx = CommandContext::new(service, actor, cli.json);

    let result = match command {
        Commands::File {
            ip_type,
            title,
            description,
            delivery_unit,
            filing_date,
            form_ref,
            design_ref,
        } => {
            FileCommand {
                ip_type,
                title,
                description,
                delivery_unit,
                filing_date,
                form_ref,
                design_ref,
            }
            .execute(&ctx)
            .await
        }
        Commands::Show { target } => ShowCommand { target }.execute(&ctx).await,
        Commands::List {
            ip_type,
            status,
            submitter,
            mine,
        } => {
            let submitter_id = if mine {
                Some(ctx.actor.user_id.clone())
            } else {
                submitter
            };
            ListCommand {
                filter: SubmissionFilter {
                    ip_type,
                    status,
                    submitter_id,
                },
            }
            .execute(&ctx)
            .await
        }
        Commands::Receive { target } => {
            TransitionCommand::new(target, LifecycleCommand::Receive)
                .execute(&ctx)
                .await
        }
        Commands::Triage {
            target,
            inventor_identified,
            design_views_complete,
            description_clear,
            all,
        } => {
            let update = if all {
                TriageUpdate::from(Triage::all_checked())
            } else {
                TriageUpdate {
                    inventor_identified,
                    design_views_complete,
                    description_clear,
                }
            };
            TransitionCommand::new(target, LifecycleCommand::UpdateTriage(update))
                .execute(&ctx)
                .await
        }
        Commands::Approve { target } => {
            TransitionCommand::new(target, LifecycleCommand::Approve)
                .execute(&ctx)
                .await
        }
        Commands::Reject {
            target,
            reason,
            missing,
        } => {
            let decision = RejectionDecision {
                reason,
                missing: missing.items(),
                deadline: missing.deadline,
            };
            TransitionCommand::new(target, LifecycleCommand::Reject(decision))
                .execute(&ctx)
                .await
        }
        Commands::Finalize { target } => {
            TransitionCommand::new(target, LifecycleCommand::Finalize)
                .execute(&ctx)
                .await
        }
        Commands::Resubmit {
            target,
            contact_ref,
            design_ref,
            form_ref,
            remarks,
        } => {
            let corrections = Corrections {
                updated_contact_ref: contact_ref,
                updated_design_ref: design_ref,
                updated_form_ref: form_ref,
                applicant_remarks: remarks,
            };
            TransitionCommand::new(target, LifecycleCommand::SubmitCorrections(corrections))
                .execute(&ctx)
                .await
        }
        Commands::ReceiveResubmission { target } => {
            TransitionCommand::new(target, LifecycleCommand::ReceiveResubmission)
                .execute(&ctx)
                .await
        }
        Commands::StartReReview { target } => {
            TransitionCommand::new(target, LifecycleCommand::StartReReview)
                .execute(&ctx)
                .await
        }
        Commands::Decide {
            target,
            outcome,
            remarks,
            missing,
        } => {
            let decision = ReReviewDecision {
                outcome: outcome.into(),
                consultant_remarks: remarks,
                missing: missing.items(),
                deadline: missing.deadline,
            };
            TransitionCommand::new(target, LifecycleCommand::Decide(decision))
                .execute(&ctx)
                .await
        }
    };

    lifecycle_metrics().log_stats();
    result
}
