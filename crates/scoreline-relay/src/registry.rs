//! Connection registry.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::directory::ChannelDirectory;
use crate::ids::{ChannelId, ConnectionId};

/// Tracks live connections. Membership bookkeeping is delegated to the shared
/// [`ChannelDirectory`] so registration state and channel membership can never
/// disagree.
#[derive(Clone)]
pub struct ConnectionRegistry {
    directory: Arc<ChannelDirectory>,
}

impl ConnectionRegistry {
    /// Create a registry backed by `directory`.
    pub fn new(directory: Arc<ChannelDirectory>) -> Self {
        Self { directory }
    }

    /// The directory this registry writes through to.
    pub fn directory(&self) -> &Arc<ChannelDirectory> {
        &self.directory
    }

    /// Add a connection with an empty membership set.
    ///
    /// A duplicate registration is ignored; the existing memberships stay.
    pub fn register(&self, connection: &ConnectionId) {
        if self.directory.attach(connection) {
            debug!(connection_id = %connection, "connection registered");
        } else {
            warn!(connection_id = %connection, "duplicate connection registration ignored");
        }
    }

    /// Remove a connection and drop it from every channel it belonged to.
    ///
    /// Returns the channels it left. Unknown IDs are a no-op.
    pub fn unregister(&self, connection: &ConnectionId) -> Vec<ChannelId> {
        let left = self.directory.detach(connection);
        debug!(connection_id = %connection, channels = left.len(), "connection unregistered");
        left
    }

    /// Channels the connection currently belongs to.
    pub fn memberships_of(&self, connection: &ConnectionId) -> HashSet<ChannelId> {
        self.directory.memberships_of(connection)
    }

    /// Whether the connection is registered.
    pub fn is_registered(&self, connection: &ConnectionId) -> bool {
        self.directory.is_attached(connection)
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.directory.connection_count()
    }
}
