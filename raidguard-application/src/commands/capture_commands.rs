use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use raidguard_domain::{capture_snapshot, CaptureRequest, LiveEquipment, SessionId, SlotSet};

use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub struct CaptureInput {
    pub session_id: SessionId,
    pub equipment: LiveEquipment,
    pub location: String,
    pub taken_in_raid: bool,
    pub insured_templates: HashSet<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub session_id: SessionId,
    pub path: PathBuf,
    pub bytes: u64,
    pub item_count: usize,
    pub empty_slots: SlotSet,
    pub excluded: usize,
    pub duplicates_skipped: usize,
}

/// Captures the enabled slots of `input.equipment` and saves the snapshot,
/// replacing any earlier snapshot for the same session.
pub async fn capture_inventory(
    state: &AppState,
    input: CaptureInput,
) -> Result<CaptureReport, AppError> {
    let outcome = capture_snapshot(CaptureRequest {
        session_id: input.session_id.clone(),
        equipment: &input.equipment,
        enabled_slots: &state.config.enabled_slots,
        options: &state.config.capture,
        insured_templates: &input.insured_templates,
        location: input.location,
        taken_in_raid: input.taken_in_raid,
        mod_version: state.config.mod_version.clone(),
        timestamp: Utc::now(),
    })
    .map_err(|err| AppError::Internal(err.into()))?;

    let receipt = state
        .snapshot_repo
        .save(&outcome.snapshot)
        .await
        .map_err(|err| {
            warn!(session_id = %input.session_id, "snapshot save failed, capture aborted: {}", err);
            AppError::Internal(err.into())
        })?;

    info!(
        session_id = %input.session_id,
        items = outcome.snapshot.items.len(),
        bytes = receipt.bytes,
        "snapshot saved"
    );

    Ok(CaptureReport {
        session_id: input.session_id,
        path: receipt.path,
        bytes: receipt.bytes,
        item_count: outcome.snapshot.items.len(),
        empty_slots: outcome.snapshot.empty_slots().iter().collect(),
        excluded: outcome.excluded,
        duplicates_skipped: outcome.duplicates_skipped + receipt.dropped_duplicates,
    })
}
