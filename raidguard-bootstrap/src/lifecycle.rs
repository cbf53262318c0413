use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use serde_json::{json, Value};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use raidguard_application::commands::capture_commands::{self, CaptureInput};
use raidguard_application::commands::extraction_commands;
use raidguard_application::commands::restore_commands::{self, HookKind, HookRequest};
use raidguard_application::queries::snapshot_queries;
use raidguard_application::AppState;
use raidguard_domain::{RaidExitStatus, SessionId, SlotSet};
use raidguard_infrastructure::{read_insured_templates, read_live_equipment};

use crate::context::AppContext;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Capture the enabled slots of a live equipment tree and save the snapshot
    Capture {
        #[arg(long)]
        session: String,
        /// JSON equipment tree exported by the host
        #[arg(long)]
        inventory: String,
        #[arg(long, default_value = "unknown")]
        location: String,
        /// JSON array of insured template ids
        #[arg(long)]
        insured: Option<String>,
    },
    /// Run post-raid hooks against a profile file
    Restore {
        #[arg(long)]
        session: String,
        #[arg(long)]
        profile: String,
        #[arg(long, default_value = "early", value_parser = parse_hook)]
        hook: HookKind,
        /// Raid exit status seen by the early hook
        #[arg(long, default_value = "Killed")]
        status: String,
        /// Comma-separated `restoredSlots` from an earlier `--hook early` run
        #[arg(long)]
        restored_slots: Option<String>,
    },
    /// Record how a raid ended; extractions clear the snapshot
    Extract {
        #[arg(long)]
        session: String,
        #[arg(long)]
        status: String,
    },
    /// Summarise a stored snapshot, or print one slot's captured items
    Show {
        #[arg(long)]
        session: String,
        #[arg(long)]
        slot: Option<String>,
    },
    /// List stored snapshots
    List,
    /// Delete snapshots older than the given age
    Prune {
        #[arg(long, default_value_t = 72)]
        older_than_hours: i64,
    },
}

fn parse_hook(value: &str) -> std::result::Result<HookKind, String> {
    HookKind::parse(value).ok_or_else(|| format!("unknown hook '{value}', expected early, late or both"))
}

fn parse_slot_list(value: &str) -> SlotSet {
    value
        .split(',')
        .map(str::trim)
        .filter(|slot| !slot.is_empty())
        .collect()
}

fn parse_session(value: &str) -> Result<SessionId> {
    SessionId::parse(value).map_err(|err| anyhow!("invalid session id '{value}': {err}"))
}

/// Installs the global subscriber: stderr always, plus a daily rolling file under
/// `log_dir` when set. The guard must live until the process exits.
pub fn init_logging(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "raidguard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;
    Ok(guard)
}

pub async fn run(config_path: Option<&str>, command: Command) -> Result<()> {
    let context = AppContext::new(config_path).await?;
    let _guard = init_logging(context.config.log_dir.as_deref())?;
    info!(
        snapshots_dir = %context.state.config.snapshots_dir,
        slots = context.state.config.enabled_slots.len(),
        "raidguard configured"
    );

    let output = execute(&context.state, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub async fn execute(state: &AppState, command: Command) -> Result<Value> {
    let output = match command {
        Command::Capture {
            session,
            inventory,
            location,
            insured,
        } => {
            let session_id = parse_session(&session)?;
            let equipment = read_live_equipment(&inventory).await?;
            let insured_templates = match insured {
                Some(path) => read_insured_templates(&path).await?,
                None => Default::default(),
            };
            let taken_in_raid = !location.eq_ignore_ascii_case("hideout");
            let report = capture_commands::capture_inventory(
                state,
                CaptureInput {
                    session_id,
                    equipment,
                    location,
                    taken_in_raid,
                    insured_templates,
                },
            )
            .await?;
            serde_json::to_value(report)?
        }
        Command::Restore {
            session,
            profile,
            hook,
            status,
            restored_slots,
        } => {
            let session_id = parse_session(&session)?;
            if !Path::new(&profile).exists() {
                return Err(anyhow!("profile file {profile} does not exist"));
            }
            let request = HookRequest {
                hook,
                status: RaidExitStatus::from(status.as_str()),
                restored_slots: restored_slots.as_deref().map(parse_slot_list),
            };
            let outcome =
                restore_commands::apply_hook_to_profile(state, &session_id, &profile, request)
                    .await?;
            serde_json::to_value(outcome)?
        }
        Command::Extract { session, status } => {
            let session_id = parse_session(&session)?;
            let report = extraction_commands::record_raid_exit(
                state,
                &session_id,
                RaidExitStatus::from(status.as_str()),
            )
            .await?;
            serde_json::to_value(report)?
        }
        Command::Show { session, slot } => {
            let session_id = parse_session(&session)?;
            match slot {
                Some(slot) => serde_json::to_value(
                    snapshot_queries::get_slot_contents(state, &session_id, &slot).await?,
                )?,
                None => serde_json::to_value(
                    snapshot_queries::get_snapshot_summary(state, &session_id).await?,
                )?,
            }
        }
        Command::List => {
            let stored = snapshot_queries::list_snapshots(state).await?;
            Value::Array(
                stored
                    .into_iter()
                    .map(|entry| {
                        json!({
                            "sessionId": entry.session_id,
                            "bytes": entry.bytes,
                            "modified": entry.modified,
                        })
                    })
                    .collect(),
            )
        }
        Command::Prune { older_than_hours } => {
            serde_json::to_value(
                extraction_commands::prune_stale_snapshots(state, older_than_hours).await?,
            )?
        }
    };
    Ok(output)
}
