//! # scoreline-relay
//!
//! Room-scoped real-time event relay.
//!
//! - [`ConnectionRegistry`]: live connections and their channel memberships
//! - [`ChannelDirectory`]: channel (game) → member connections, the unit of fan-out
//! - [`RelayDispatcher`]: resolves a channel's members and pushes one event to each
//! - [`Transport`]: the per-connection send primitive supplied by the transport adapter
//!
//! The crate performs no I/O. Membership is guarded by a single lock owned by
//! the directory; fan-out happens on a snapshot taken under that lock, after
//! it is released.

#![deny(unsafe_code)]

pub mod directory;
pub mod dispatcher;
pub mod frame;
pub mod ids;
pub mod metrics;
pub mod registry;
pub mod transport;

pub use directory::{ChannelDirectory, JoinOutcome, LeaveOutcome};
pub use dispatcher::{Echo, RelayDispatcher};
pub use frame::encode_frame;
pub use ids::{ChannelId, ConnectionId};
pub use registry::ConnectionRegistry;
pub use transport::{DeliveryError, Transport};
