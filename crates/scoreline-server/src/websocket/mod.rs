//! WebSocket transport: per-connection state, the connection table used for
//! delivery, inbound frame decoding and the session loop.

pub mod connection;
pub mod frames;
pub mod handler;
pub mod session;
pub mod table;
