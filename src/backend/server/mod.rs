/**
 * Server Module
 *
 * Configuration, shared application state, and initialization of the
 * Axum HTTP server.
 */

pub mod config;
pub mod init;
pub mod state;
