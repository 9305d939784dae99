/**
 * Patch Engine
 *
 * Pure transformation of a document snapshot by an ordered batch of
 * edit operations. The engine performs no I/O; the draft store owns
 * loading and writing back.
 *
 * # Skip-Malformed-Operation Policy
 *
 * A single operation that fails its own validation (unparseable shape,
 * wrong field types, out-of-range page index) is skipped silently and
 * the batch continues with the next operation. One bad operation never
 * aborts an otherwise-valid batch; the client recovers by sending a
 * full commit.
 *
 * # Ordering
 *
 * Operations apply strictly in batch order, and page indices are
 * re-evaluated operation by operation: an earlier `page_add` in the
 * same batch shifts what index 1 means for the next operation.
 */

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::backend::draft::snapshot::{
    backfill_page_overlay_ids, unique_overlay_id, Overlay, Page, Snapshot,
};

/// One edit operation, tagged by its `op` field
///
/// Wire shapes follow the editor client, e.g.
/// `{"op":"overlay_upsert","page":0,"obj":{"kind":"stamp"}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// Replace the document name; ignored when empty after trimming
    SetName { name: String },
    /// Set the `landscape` flag of one page
    RotatePage { page: usize, landscape: bool },
    /// Insert or replace an overlay by id within one page
    OverlayUpsert { page: usize, obj: Overlay },
    /// Delete an overlay by id; no-op when the id is unknown
    OverlayRemove { page: usize, id: String },
    /// Replace all free-form metadata of one page
    PageSetMeta {
        page: usize,
        meta: Map<String, Value>,
    },
    /// Insert a page; the index is clamped into `[0, len]`
    PageAdd {
        index: i64,
        #[serde(default)]
        page: Page,
    },
    /// Delete a page; no-op when the index is out of range
    PageRemove { index: usize },
}

/// Result of applying a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchOutcome {
    /// Snapshot after the batch
    pub snapshot: Snapshot,
    /// Operations that changed the snapshot
    pub applied: usize,
    /// Operations dropped by the skip-malformed-operation policy
    pub skipped: usize,
}

/// Apply an ordered batch of raw operations to a snapshot
///
/// Deterministic for valid batches: the same snapshot and the same
/// batch always yield the same output snapshot.
///
/// # Arguments
/// * `snapshot` - starting state (callers backfill overlay ids first)
/// * `ops` - raw JSON operations in arrival order
pub fn apply(mut snapshot: Snapshot, ops: &[Value]) -> PatchOutcome {
    let mut applied = 0;
    let mut skipped = 0;

    for raw in ops {
        match serde_json::from_value::<EditOp>(raw.clone()) {
            Ok(op) => {
                if apply_one(&mut snapshot, op) {
                    applied += 1;
                } else {
                    skipped += 1;
                }
            }
            Err(err) => {
                tracing::debug!("skipping malformed edit operation: {}", err);
                skipped += 1;
            }
        }
    }

    PatchOutcome {
        snapshot,
        applied,
        skipped,
    }
}

/// Apply a single parsed operation; `false` means it was ignored under
/// the edge-case policy of its variant
fn apply_one(snapshot: &mut Snapshot, op: EditOp) -> bool {
    match op {
        EditOp::SetName { name } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return false;
            }
            snapshot.name = trimmed.to_string();
            true
        }
        EditOp::RotatePage { page, landscape } => match snapshot.pages.get_mut(page) {
            Some(target) => {
                target.landscape = landscape;
                true
            }
            None => false,
        },
        EditOp::OverlayUpsert { page, mut obj } => {
            let Some(target) = snapshot.pages.get_mut(page) else {
                return false;
            };
            if obj.id.is_empty() {
                let taken = target
                    .overlays
                    .iter()
                    .filter(|o| !o.id.is_empty())
                    .map(|o| o.id.clone())
                    .collect();
                obj.id = unique_overlay_id(&taken, target.overlays.len());
            }
            match target.overlays.iter_mut().find(|o| o.id == obj.id) {
                // Replace in place so the overlay keeps its position
                Some(existing) => *existing = obj,
                None => target.overlays.push(obj),
            }
            true
        }
        EditOp::OverlayRemove { page, id } => {
            let Some(target) = snapshot.pages.get_mut(page) else {
                return false;
            };
            let before = target.overlays.len();
            target.overlays.retain(|o| o.id != id);
            target.overlays.len() != before
        }
        EditOp::PageSetMeta { page, mut meta } => {
            let Some(target) = snapshot.pages.get_mut(page) else {
                return false;
            };
            // Reserved fields stay under engine control even when the
            // supplied metadata tries to smuggle them in
            meta.remove("overlays");
            meta.remove("landscape");
            target.meta = meta;
            true
        }
        EditOp::PageAdd { index, mut page } => {
            backfill_page_overlay_ids(&mut page);
            let index = index.clamp(0, snapshot.pages.len() as i64) as usize;
            snapshot.pages.insert(index, page);
            true
        }
        EditOp::PageRemove { index } => {
            if index >= snapshot.pages.len() {
                return false;
            }
            snapshot.pages.remove(index);
            true
        }
    }
}
