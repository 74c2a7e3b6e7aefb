//! Live connection table: the delivery side of the relay's [`Transport`].

use std::sync::Arc;

use dashmap::DashMap;
use scoreline_relay::{ConnectionId, DeliveryError, Transport};

use super::connection::ClientConnection;

/// Connections indexed by ID, for outbound delivery.
#[derive(Default)]
pub struct ConnectionTable {
    connections: DashMap<ConnectionId, Arc<ClientConnection>>,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, replacing any entry with the same ID.
    pub fn insert(&self, connection: Arc<ClientConnection>) {
        let _ = self.connections.insert(connection.id.clone(), connection);
    }

    /// Remove a connection. Unknown IDs are a no-op.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.remove(id).map(|(_, conn)| conn)
    }

    /// Look up a connection.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.get(id).map(|entry| Arc::clone(entry.value()))
    }

}

impl Transport for ConnectionTable {
    fn send(&self, connection: &ConnectionId, frame: Arc<str>) -> Result<(), DeliveryError> {
        // Clone out of the shard before sending so no map lock is held.
        let conn = self.get(connection).ok_or(DeliveryError::Gone)?;
        conn.send(frame)
    }
}
