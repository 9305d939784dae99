/**
 * WebSocket Module
 *
 * The real-time editor channel: wire protocol types, the connection
 * gateway that authenticates an upgrade, and the per-connection
 * session handler.
 */

pub mod gateway;
pub mod protocol;
pub mod session;
