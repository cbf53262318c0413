use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use raidguard_domain::{RaidExitStatus, SessionId};

use crate::{AppError, AppState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidExitReport {
    pub status: RaidExitStatus,
    pub snapshot_deleted: bool,
}

/// Any extraction clears the session's snapshot so the next raid starts clean.
/// Deaths leave it for the post-raid hooks.
pub async fn record_raid_exit(
    state: &AppState,
    session_id: &SessionId,
    status: RaidExitStatus,
) -> Result<RaidExitReport, AppError> {
    if !status.is_extraction() {
        if !status.is_death() {
            warn!(session_id = %session_id, status = status.as_str(), "unrecognised raid exit status");
        }
        return Ok(RaidExitReport {
            status,
            snapshot_deleted: false,
        });
    }

    // A record left by an earlier death is meaningless once the player extracted.
    state.coordination.try_consume(session_id);
    let deleted = state
        .snapshot_repo
        .delete(session_id)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    info!(
        session_id = %session_id,
        status = status.as_str(),
        deleted,
        "extraction recorded"
    );
    Ok(RaidExitReport {
        status,
        snapshot_deleted: deleted,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub pruned: Vec<SessionId>,
    pub coordination_swept: usize,
}

pub async fn prune_stale_snapshots(
    state: &AppState,
    older_than_hours: i64,
) -> Result<PruneReport, AppError> {
    if older_than_hours <= 0 {
        return Err(AppError::BadRequest(
            "older_than_hours must be > 0".to_string(),
        ));
    }
    let cutoff = Duration::try_hours(older_than_hours)
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .ok_or_else(|| {
            AppError::BadRequest(format!("older_than_hours {older_than_hours} is out of range"))
        })?;
    let pruned = state
        .snapshot_repo
        .prune_older_than(cutoff)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    let coordination_swept = state.coordination.sweep();
    if !pruned.is_empty() {
        info!(count = pruned.len(), "pruned stale snapshots");
    }
    Ok(PruneReport {
        pruned,
        coordination_swept,
    })
}
