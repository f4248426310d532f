//! `covcmp admin` — drives the Admin Mapping Workbench (spec §4.15):
//! list the event queue, and approve/reject/snooze individual events.
//! Every write goes through one `sqlx` transaction inside
//! `covcmp-admin`; this module only parses arguments and prints results.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use covcmp_admin::{
    AdminMappingStore, ApproveEventRequest, EventState, PgAdminMappingStore, RejectEventRequest, ResolutionType,
    SnoozeEventRequest, TargetType,
};
use covcmp_foundation::config::CoreConfig;
use covcmp_registry::InsurerCode;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List events in the mapping queue
    Queue(QueueArgs),

    /// Show one event in full, including its candidate codes and evidence
    Show {
        event_id: Uuid,
        #[clap(long)]
        database_url: Option<String>,
    },

    /// Approve an event, binding its coverage title to a canonical code
    Approve(ApproveArgs),

    /// Reject an event with no binding created
    Reject(RejectArgs),

    /// Snooze an event for later review
    Snooze(SnoozeArgs),

    /// List audit log entries
    AuditLog(AuditLogArgs),
}

#[derive(Args)]
pub struct QueueArgs {
    #[clap(long)]
    state: Option<EventState>,
    #[clap(long)]
    insurer: Option<InsurerCode>,
    #[clap(long, default_value_t = 1)]
    page: u32,
    #[clap(long, default_value_t = 20)]
    page_size: u32,
    #[clap(long)]
    database_url: Option<String>,
}

#[derive(Args)]
pub struct ApproveArgs {
    event_id: Uuid,
    #[clap(long)]
    coverage_code: String,
    #[clap(long)]
    resolution_type: ResolutionType,
    #[clap(long)]
    note: Option<String>,
    #[clap(long)]
    actor: String,
    #[clap(long)]
    database_url: Option<String>,
}

#[derive(Args)]
pub struct RejectArgs {
    event_id: Uuid,
    #[clap(long)]
    note: Option<String>,
    #[clap(long)]
    actor: String,
    #[clap(long)]
    database_url: Option<String>,
}

#[derive(Args)]
pub struct SnoozeArgs {
    event_id: Uuid,
    #[clap(long)]
    note: Option<String>,
    #[clap(long)]
    actor: String,
    #[clap(long)]
    database_url: Option<String>,
}

#[derive(Args)]
pub struct AuditLogArgs {
    #[clap(long)]
    target_type: Option<TargetType>,
    #[clap(long)]
    target_id: Option<String>,
    #[clap(long, default_value_t = 50)]
    limit: u32,
    #[clap(long)]
    database_url: Option<String>,
}

pub async fn handle_command(cmd: AdminCommands) -> Result<()> {
    match cmd {
        AdminCommands::Queue(args) => {
            let store = connect(args.database_url).await?;
            let (events, total) = store.get_queue(args.state, args.insurer, args.page, args.page_size).await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "total": total, "events": events }))?);
            Ok(())
        }
        AdminCommands::Show { event_id, database_url } => {
            let store = connect(database_url).await?;
            let event = store.get_event_detail(event_id).await?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
        AdminCommands::Approve(args) => {
            let store = connect(args.database_url).await?;
            let result = store
                .approve_event(ApproveEventRequest {
                    event_id: args.event_id,
                    coverage_code: args.coverage_code,
                    resolution_type: args.resolution_type,
                    note: args.note,
                    actor: args.actor,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        AdminCommands::Reject(args) => {
            let store = connect(args.database_url).await?;
            let audit_log_id = store
                .reject_event(RejectEventRequest { event_id: args.event_id, note: args.note, actor: args.actor })
                .await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "audit_log_id": audit_log_id }))?);
            Ok(())
        }
        AdminCommands::Snooze(args) => {
            let store = connect(args.database_url).await?;
            let audit_log_id = store
                .snooze_event(SnoozeEventRequest { event_id: args.event_id, note: args.note, actor: args.actor })
                .await?;
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "audit_log_id": audit_log_id }))?);
            Ok(())
        }
        AdminCommands::AuditLog(args) => {
            let store = connect(args.database_url).await?;
            let entries = store.get_audit_logs(args.target_type, args.target_id, args.limit).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
    }
}

async fn connect(database_url: Option<String>) -> Result<PgAdminMappingStore> {
    let config = CoreConfig::from_env().context("loading runtime configuration")?;
    let database_url = database_url.unwrap_or_else(|| config.database_url());
    let pool = PgPoolOptions::new().max_connections(5).connect(&database_url).await.context("connecting to Postgres")?;
    Ok(PgAdminMappingStore::new(pool))
}
