//! # scoreline-server
//!
//! Axum HTTP + WebSocket transport for the relay.
//!
//! - `GET /ws`: the real-time channel (`joinGame`, `leaveGame`, `scoreUpdate`)
//! - `GET /health`, `GET /metrics`
//! - `POST /api/auth/register`, `POST /api/auth/login`: accounts and tokens
//! - `GET /api/games/{game_id}/members`: behind the bearer-token guard

#![deny(unsafe_code)]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod games;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{AppState, RelayServer};
pub use shutdown::ShutdownCoordinator;
