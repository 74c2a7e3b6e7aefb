//! The per-connection send primitive the relay needs from a transport.

use std::sync::Arc;

use crate::ids::ConnectionId;

/// Why a single delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The transport no longer knows this connection.
    #[error("connection is gone")]
    Gone,
    /// The connection's outbound queue is full.
    #[error("outbound queue is full")]
    Full,
    /// The connection's writer has shut down.
    #[error("connection is closed")]
    Closed,
}

/// Delivers an encoded frame to one connection.
///
/// Implementations must not block: a slow peer is reported as
/// [`DeliveryError::Full`] rather than waited on.
pub trait Transport: Send + Sync {
    /// Queue `frame` for `connection`.
    fn send(&self, connection: &ConnectionId, frame: Arc<str>) -> Result<(), DeliveryError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, connection: &ConnectionId, frame: Arc<str>) -> Result<(), DeliveryError> {
        (**self).send(connection, frame)
    }
}
