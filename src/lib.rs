//! DraftSync - Main Library
//!
//! DraftSync is the backend for a browser-based document editor. Users
//! upload documents, annotate them (signatures, seals, page rotations),
//! and their in-progress edits must survive reloads and device switches.
//!
//! # Overview
//!
//! The core of this library is the live draft synchronization subsystem:
//!
//! - A per-user, per-editing-session WebSocket channel that accepts a
//!   stream of fine-grained edit operations
//! - A pure patch engine that merges those operations into a document
//!   snapshot
//! - A durable, TTL-expiring draft store backed by PostgreSQL
//! - A best-effort event log used as a recovery trail between commits
//!
//! # Module Structure
//!
//! Everything lives under **`backend`**:
//!
//! - `draft` - snapshot model, patch engine, draft store, event log
//! - `ws` - WebSocket gateway, wire protocol, per-connection session
//! - `auth` - access-token resolution to a user identity
//! - `billing` - read-through source for the draft TTL
//! - `routes` - HTTP router and the draft CRUD handlers
//! - `server` - configuration, shared state, initialization
//! - `error` - error types and HTTP conversions
//! - `middleware` - bearer authentication for the HTTP surface

pub mod backend;
