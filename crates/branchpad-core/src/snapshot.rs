//! Per-cell snapshots
//!
//! A snapshot freezes a cell's code and results. Restoring copies them back
//! onto the live cell without executing anything; label, description and
//! colour stay as they are.

use crate::store::CellStore;
use crate::types::{CellId, Snapshot, SnapshotId};

/// Append a snapshot of `cell_id` labelled `label`
///
/// Returns `None` for a blank label or an unknown cell.
pub fn create_snapshot(store: &mut CellStore, cell_id: &CellId, label: &str) -> Option<SnapshotId> {
    let label = label.trim();
    if label.is_empty() {
        tracing::debug!("Ignoring snapshot of {} with blank label", cell_id);
        return None;
    }
    let Some(cell) = store.get_mut(cell_id) else {
        tracing::debug!("Snapshot requested for unknown cell {}", cell_id);
        return None;
    };

    let snapshot = Snapshot::capture(cell, label);
    let id = snapshot.id;
    cell.snapshots.push(snapshot);
    tracing::info!("Created snapshot '{}' ({}) of {}", label, id, cell_id);
    Some(id)
}

/// Copy snapshot `snapshot_id` back onto `cell_id`
///
/// Descendants are not re-run. Returns `false` when either id is unknown.
pub fn restore_snapshot(store: &mut CellStore, cell_id: &CellId, snapshot_id: SnapshotId) -> bool {
    let Some(cell) = store.get_mut(cell_id) else {
        tracing::debug!("Restore requested for unknown cell {}", cell_id);
        return false;
    };
    let Some(snapshot) = cell.snapshot(snapshot_id).cloned() else {
        tracing::debug!("Cell {} has no snapshot {}", cell_id, snapshot_id);
        return false;
    };

    cell.code = snapshot.code;
    cell.output = snapshot.output;
    cell.error = snapshot.error;
    cell.execution_context = snapshot.execution_context;
    cell.current_snapshot_id = Some(snapshot_id);
    tracing::info!("Restored {} to snapshot '{}'", cell_id, snapshot.label);
    true
}
