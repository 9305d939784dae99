/**
 * Document Snapshot Model
 *
 * This module defines the typed in-memory shape of a document draft:
 * a name plus an ordered sequence of pages, where each page carries two
 * reserved fields (`landscape`, `overlays`) and an open string-keyed
 * metadata map for everything else the editor attaches to a page
 * (source image, dimensions, mime type, and so on).
 *
 * # Reserved Fields
 *
 * - `Snapshot.name` / `Snapshot.pages` at the document level
 * - `Page.landscape` / `Page.overlays` at the page level
 * - `Overlay.id` at the overlay level
 *
 * All other keys round-trip untouched through `#[serde(flatten)]` maps,
 * so newer editor clients can attach fields this server has never heard
 * of without losing them.
 *
 * # Overlay Identifiers
 *
 * Every overlay must carry a non-empty id that is unique within its
 * page. `ensure_overlay_ids` backfills missing ids deterministically
 * from the current time and the overlay's position; it is idempotent
 * and must run once on every freshly loaded or committed snapshot
 * before the patch engine touches it. Ids are never reused or
 * renumbered when overlays are removed.
 */

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Full document state exchanged on a commit and stored in the draft row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Document display name
    #[serde(default)]
    pub name: String,
    /// Ordered page sequence
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Unknown document-level fields, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Orientation flag toggled by `rotate_page`
    #[serde(default)]
    pub landscape: bool,
    /// Positioned annotations (signatures, seals, stamps)
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    /// Free-form page metadata (source, dimensions, mime, ...)
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

/// A positioned annotation object attached to a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Page-unique identifier; empty means "not yet assigned"
    #[serde(default)]
    pub id: String,
    /// Overlay payload (kind, position, image data, ...)
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// Backfill missing overlay ids across the whole snapshot
///
/// Scans every page once and assigns an id to each overlay that has
/// none. Running the pass twice produces no further changes.
///
/// # Returns
/// `true` if any overlay was assigned an id
pub fn ensure_overlay_ids(snapshot: &mut Snapshot) -> bool {
    let mut changed = false;
    for page in &mut snapshot.pages {
        changed |= backfill_page_overlay_ids(page);
    }
    changed
}

/// Backfill missing overlay ids on a single page
pub fn backfill_page_overlay_ids(page: &mut Page) -> bool {
    let mut taken: HashSet<String> = page
        .overlays
        .iter()
        .filter(|overlay| !overlay.id.is_empty())
        .map(|overlay| overlay.id.clone())
        .collect();

    let mut changed = false;
    for position in 0..page.overlays.len() {
        if page.overlays[position].id.is_empty() {
            let id = unique_overlay_id(&taken, position);
            taken.insert(id.clone());
            page.overlays[position].id = id;
            changed = true;
        }
    }
    changed
}

/// Derive an overlay id from the current time and the overlay position,
/// bumping a suffix until it does not collide with any id on the page
pub(crate) fn unique_overlay_id(taken: &HashSet<String>, position: usize) -> String {
    let base = format!("ov-{}-{}", Utc::now().timestamp_millis(), position);
    if !taken.contains(&base) {
        return base;
    }
    let mut bump = 1u32;
    loop {
        let candidate = format!("{}-{}", base, bump);
        if !taken.contains(&candidate) {
            return candidate;
        }
        bump += 1;
    }
}
