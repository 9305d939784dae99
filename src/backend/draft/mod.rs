/**
 * Draft Module
 *
 * The document-draft core: the typed snapshot model, the pure patch
 * engine that merges edit operations into a snapshot, the durable
 * per-user draft store, and the optional append-only event log.
 */

pub mod events;
pub mod patch;
pub mod snapshot;
pub mod store;
