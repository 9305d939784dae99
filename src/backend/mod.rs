/**
 * Backend Module
 *
 * Server-side code for the draft synchronization backend: the Axum HTTP
 * server, the WebSocket editor channel, the draft store and patch engine,
 * and supporting auth/billing/error plumbing.
 */

pub mod auth;
pub mod billing;
pub mod draft;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod ws;
