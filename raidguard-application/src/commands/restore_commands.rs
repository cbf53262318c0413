use serde::Serialize;
use tracing::{debug, error, info, warn};

use raidguard_domain::{
    apply_death_penalty, check_invariants, restore_inventory, DeathPenaltyReport, Item,
    RaidExitStatus, RestoreError, RestoreOutcome, RestoreReport, RestoreRequest, SessionId,
    SlotSet, Snapshot,
};

use crate::commands::extraction_commands;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    Early,
    Late,
    /// Early then late in one call, sharing this process's coordination table.
    Both,
}

impl HookKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "early" => Some(HookKind::Early),
            "late" => Some(HookKind::Late),
            "both" => Some(HookKind::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HookRequest {
    pub hook: HookKind,
    /// Exit status seen by the early hook.
    pub status: RaidExitStatus,
    /// `restoredSlots` printed by an early hook that ran in another process. The late
    /// hook treats it as that process's coordination record.
    pub restored_slots: Option<SlotSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPath {
    /// Early hook restored the snapshot.
    Restored,
    /// Late hook found the early hook's record and applied the partial penalty.
    AlreadyRestored,
    /// Late hook restored because the early hook never ran.
    RestoredLate,
    NoSnapshot,
    /// Early hook saw an extraction and cleared the snapshot.
    Extracted,
    /// Exit status is neither a death nor an extraction.
    Ignored,
    /// Restoration refused the profile; it is returned untouched.
    Aborted,
}

impl HookPath {
    pub fn changed_items(&self) -> bool {
        matches!(
            self,
            HookPath::Restored | HookPath::AlreadyRestored | HookPath::RestoredLate
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutcome {
    pub path: HookPath,
    #[serde(skip)]
    pub items: Vec<Item>,
    /// Whether the host's own full death deletion should still run. After an early
    /// restore only the partial penalty of the late hook may run.
    pub call_base: bool,
    /// Slots the early hook restored. Hand them to a late hook running elsewhere.
    pub restored_slots: Option<SlotSet>,
    pub restore: Option<RestoreReport>,
    pub penalty: Option<DeathPenaltyReport>,
}

impl HookOutcome {
    fn unchanged(path: HookPath, items: Vec<Item>, call_base: bool) -> Self {
        Self {
            path,
            items,
            call_base,
            restored_slots: None,
            restore: None,
            penalty: None,
        }
    }
}

pub async fn handle_raid_end(
    state: &AppState,
    session_id: &SessionId,
    status: RaidExitStatus,
    items: Vec<Item>,
) -> Result<HookOutcome, AppError> {
    if status.is_extraction() {
        extraction_commands::record_raid_exit(state, session_id, status).await?;
        return Ok(HookOutcome::unchanged(HookPath::Extracted, items, true));
    }
    if !status.is_death() {
        warn!(session_id = %session_id, status = status.as_str(), "unrecognised raid exit; snapshot kept");
        return Ok(HookOutcome::unchanged(HookPath::Ignored, items, true));
    }

    let Some(snapshot) = load_snapshot(state, session_id).await else {
        return Ok(HookOutcome::unchanged(HookPath::NoSnapshot, items, true));
    };

    let outcome = match restore(&items, &snapshot) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(session_id = %session_id, "early restoration aborted, snapshot kept: {}", err);
            return Ok(HookOutcome::unchanged(HookPath::Aborted, items, false));
        }
    };

    state
        .coordination
        .mark_restored(session_id, outcome.report.managed_slots.clone());
    delete_snapshot(state, session_id).await;
    info!(
        session_id = %session_id,
        added = outcome.report.added,
        removed = outcome.report.removed,
        policy = outcome.report.policy,
        "restored snapshot at raid end"
    );

    Ok(HookOutcome {
        path: HookPath::Restored,
        items: outcome.items,
        call_base: false,
        restored_slots: Some(outcome.report.managed_slots.clone()),
        restore: Some(outcome.report),
        penalty: None,
    })
}

pub async fn handle_set_inventory(
    state: &AppState,
    session_id: &SessionId,
    items: Vec<Item>,
) -> Result<HookOutcome, AppError> {
    if let Some(managed) = state.coordination.try_consume(session_id) {
        // The early hook already deleted the snapshot; a leftover means that delete failed.
        delete_snapshot(state, session_id).await;
        return Ok(match apply_death_penalty(&items, &managed) {
            Ok(penalty) => HookOutcome {
                path: HookPath::AlreadyRestored,
                items: penalty.items,
                call_base: false,
                restored_slots: None,
                restore: None,
                penalty: Some(penalty.report),
            },
            Err(err) => {
                warn!(session_id = %session_id, "partial death penalty skipped: {}", err);
                HookOutcome::unchanged(HookPath::Aborted, items, false)
            }
        });
    }

    let Some(snapshot) = load_snapshot(state, session_id).await else {
        return Ok(HookOutcome::unchanged(HookPath::NoSnapshot, items, true));
    };

    let restored = match restore(&items, &snapshot) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(session_id = %session_id, "late restoration aborted, profile untouched: {}", err);
            return Ok(HookOutcome::unchanged(HookPath::Aborted, items, false));
        }
    };
    let penalty = apply_death_penalty(&restored.items, &restored.report.managed_slots)
        .map_err(|err| AppError::Internal(err.into()))?;
    delete_snapshot(state, session_id).await;
    info!(
        session_id = %session_id,
        added = restored.report.added,
        removed = restored.report.removed + penalty.report.removed,
        "restored snapshot on set-inventory"
    );

    Ok(HookOutcome {
        path: HookPath::RestoredLate,
        items: penalty.items,
        call_base: false,
        restored_slots: None,
        restore: Some(restored.report),
        penalty: Some(penalty.report),
    })
}

/// Early hook followed by the late hook on its result.
pub async fn handle_raid_end_and_set_inventory(
    state: &AppState,
    session_id: &SessionId,
    status: RaidExitStatus,
    items: Vec<Item>,
) -> Result<HookOutcome, AppError> {
    let early = handle_raid_end(state, session_id, status, items).await?;
    if early.path != HookPath::Restored {
        return Ok(early);
    }
    let late = handle_set_inventory(state, session_id, early.items).await?;
    Ok(HookOutcome {
        restored_slots: early.restored_slots,
        restore: early.restore,
        ..late
    })
}

/// Runs a hook against the profile document at `profile_path` and writes the
/// result back when the hook changed the item list.
pub async fn apply_hook_to_profile(
    state: &AppState,
    session_id: &SessionId,
    profile_path: &str,
    request: HookRequest,
) -> Result<HookOutcome, AppError> {
    let items = state
        .profile_repo
        .load_items(profile_path)
        .await
        .map_err(|err| AppError::BadRequest(format!("cannot read profile '{profile_path}': {err:#}")))?;

    let outcome = match request.hook {
        HookKind::Early => handle_raid_end(state, session_id, request.status, items).await?,
        HookKind::Late => {
            if let Some(restored) = request.restored_slots {
                debug!(session_id = %session_id, slots = %restored, "resuming early restoration record");
                state.coordination.mark_restored(session_id, restored);
            }
            handle_set_inventory(state, session_id, items).await?
        }
        HookKind::Both => {
            handle_raid_end_and_set_inventory(state, session_id, request.status, items).await?
        }
    };

    if outcome.path.changed_items() {
        state
            .profile_repo
            .save_items(profile_path, &outcome.items)
            .await
            .map_err(|err| {
                error!(session_id = %session_id, "failed to write profile: {}", err);
                AppError::Internal(err)
            })?;
    }
    Ok(outcome)
}

fn restore(items: &[Item], snapshot: &Snapshot) -> Result<RestoreOutcome, RestoreError> {
    let outcome = restore_inventory(RestoreRequest::from_snapshot(items, snapshot))?;
    for problem in check_invariants(items, &outcome.items, &outcome.equipment_id) {
        warn!(session_id = %snapshot.session_id, "restored inventory: {}", problem);
    }
    Ok(outcome)
}

async fn load_snapshot(state: &AppState, session_id: &SessionId) -> Option<Snapshot> {
    match state.snapshot_repo.load(session_id).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(session_id = %session_id, "snapshot unavailable, treating as absent: {}", err);
            None
        }
    }
}

async fn delete_snapshot(state: &AppState, session_id: &SessionId) {
    if let Err(err) = state.snapshot_repo.delete(session_id).await {
        warn!(session_id = %session_id, "failed to delete snapshot: {}", err);
    }
}
