use tracing::error;

use raidguard_domain::ports::StoredSnapshot;
use raidguard_domain::{Item, ItemGraph, SessionId, Snapshot, SnapshotSummary};

use crate::{AppError, AppState};

async fn require_snapshot(state: &AppState, session_id: &SessionId) -> Result<Snapshot, AppError> {
    state
        .snapshot_repo
        .load(session_id)
        .await
        .map_err(|err| {
            error!("failed to load snapshot for {}: {}", session_id, err);
            AppError::Internal(err.into())
        })?
        .ok_or_else(|| AppError::NotFound(format!("no snapshot for session '{session_id}'")))
}

pub async fn get_snapshot_summary(
    state: &AppState,
    session_id: &SessionId,
) -> Result<SnapshotSummary, AppError> {
    Ok(require_snapshot(state, session_id).await?.summary())
}

pub async fn list_snapshots(state: &AppState) -> Result<Vec<StoredSnapshot>, AppError> {
    state.snapshot_repo.list().await.map_err(|err| {
        error!("failed to list snapshots: {}", err);
        AppError::Internal(err.into())
    })
}

/// The item captured in `slot` directly under the equipment root, with everything below it.
pub async fn get_slot_contents(
    state: &AppState,
    session_id: &SessionId,
    slot: &str,
) -> Result<Vec<Item>, AppError> {
    let snapshot = require_snapshot(state, session_id).await?;
    let graph = ItemGraph::build(&snapshot.items);
    let Some(root) = graph.equipment_roots().next() else {
        return Ok(Vec::new());
    };
    let Some(slot_item) = graph
        .children_of(&root.id)
        .find(|child| child.slot_id().is_some_and(|s| s.eq_ignore_ascii_case(slot)))
    else {
        return Ok(Vec::new());
    };
    graph
        .deep_copy_subtree(&slot_item.id)
        .map_err(|err| AppError::Internal(err.into()))
}
