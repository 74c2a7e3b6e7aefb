//! Channel directory: the many-to-many relationship between connections and
//! channels.
//!
//! Both directions of the relationship live in one [`Membership`] value behind
//! a single `RwLock`, so a join, a leave or a disconnect cascade is applied
//! atomically and every read sees a complete point-in-time snapshot.
//!
//! Channels are created on first join and pruned, under the same write lock,
//! as soon as their member set becomes empty. The active-channel gauge is
//! also set under that lock, so concurrent mutations publish their counts in
//! the order they were applied.

use std::collections::{HashMap, HashSet};

use metrics::gauge;
use parking_lot::RwLock;
use tracing::debug;

use crate::ids::{ChannelId, ConnectionId};
use crate::metrics::RELAY_CHANNELS_ACTIVE;

/// Result of [`ChannelDirectory::join`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The connection was added to the channel.
    Joined,
    /// The connection was already a member; nothing changed.
    AlreadyMember,
    /// The connection is not registered; nothing changed.
    UnknownConnection,
}

/// Result of [`ChannelDirectory::leave`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The connection was removed from the channel.
    Left {
        /// Whether the channel became empty and was dropped.
        pruned: bool,
    },
    /// The connection was not a member; nothing changed.
    NotMember,
}

#[derive(Default)]
struct Membership {
    /// Channel → members. Never holds an empty set.
    channels: HashMap<ChannelId, HashSet<ConnectionId>>,
    /// Registered connection → channels it belongs to.
    connections: HashMap<ConnectionId, HashSet<ChannelId>>,
}

impl Membership {
    /// Remove `connection` from `channel`'s member set, pruning the channel
    /// when it empties. Returns `true` if the channel was pruned.
    fn drop_member(&mut self, channel: &ChannelId, connection: &ConnectionId) -> bool {
        let Some(members) = self.channels.get_mut(channel) else {
            return false;
        };
        let _ = members.remove(connection);
        if members.is_empty() {
            let _ = self.channels.remove(channel);
            true
        } else {
            false
        }
    }

    /// Set the active-channel gauge. Call with the write lock held.
    #[allow(clippy::cast_precision_loss)]
    fn publish_channel_gauge(&self) {
        gauge!(RELAY_CHANNELS_ACTIVE).set(self.channels.len() as f64);
    }
}

/// Owns every channel's member set and every connection's membership set.
#[derive(Default)]
pub struct ChannelDirectory {
    state: RwLock<Membership>,
}

impl ChannelDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection with no memberships.
    ///
    /// Returns `false` (and leaves the existing entry untouched) if the
    /// connection is already known.
    pub(crate) fn attach(&self, connection: &ConnectionId) -> bool {
        let mut state = self.state.write();
        if state.connections.contains_key(connection) {
            return false;
        }
        let _ = state.connections.insert(connection.clone(), HashSet::new());
        true
    }

    /// Forget a connection and remove it from every channel it belonged to.
    ///
    /// Returns the channels it was removed from; empty for an unknown ID.
    pub(crate) fn detach(&self, connection: &ConnectionId) -> Vec<ChannelId> {
        let mut state = self.state.write();
        let Some(channels) = state.connections.remove(connection) else {
            return Vec::new();
        };
        let mut pruned = 0usize;
        for channel in &channels {
            if state.drop_member(channel, connection) {
                pruned += 1;
            }
        }
        state.publish_channel_gauge();
        drop(state);

        if pruned > 0 {
            debug!(connection_id = %connection, pruned, "pruned empty channels on disconnect");
        }
        channels.into_iter().collect()
    }

    /// Add `connection` to `channel`, creating the channel if needed.
    pub fn join(&self, channel: &ChannelId, connection: &ConnectionId) -> JoinOutcome {
        let mut state = self.state.write();
        let Some(memberships) = state.connections.get_mut(connection) else {
            return JoinOutcome::UnknownConnection;
        };
        if !memberships.insert(channel.clone()) {
            return JoinOutcome::AlreadyMember;
        }
        let _ = state
            .channels
            .entry(channel.clone())
            .or_default()
            .insert(connection.clone());
        state.publish_channel_gauge();
        drop(state);

        JoinOutcome::Joined
    }

    /// Remove `connection` from `channel`.
    pub fn leave(&self, channel: &ChannelId, connection: &ConnectionId) -> LeaveOutcome {
        let mut state = self.state.write();
        let was_member = state
            .connections
            .get_mut(connection)
            .is_some_and(|memberships| memberships.remove(channel));
        if !was_member {
            return LeaveOutcome::NotMember;
        }
        let pruned = state.drop_member(channel, connection);
        state.publish_channel_gauge();
        drop(state);

        if pruned {
            debug!(channel_id = %channel, "pruned empty channel");
        }
        LeaveOutcome::Left { pruned }
    }

    /// Snapshot of a channel's members. Empty for an unknown channel.
    pub fn members_of(&self, channel: &ChannelId) -> Vec<ConnectionId> {
        self.state
            .read()
            .channels
            .get(channel)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the channels a connection belongs to. Empty for an unknown
    /// connection.
    pub fn memberships_of(&self, connection: &ConnectionId) -> HashSet<ChannelId> {
        self.state
            .read()
            .connections
            .get(connection)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the connection is currently registered.
    pub fn is_attached(&self, connection: &ConnectionId) -> bool {
        self.state.read().connections.contains_key(connection)
    }

    /// Number of members in a channel.
    pub fn member_count(&self, channel: &ChannelId) -> usize {
        self.state.read().channels.get(channel).map_or(0, HashSet::len)
    }

    /// Number of non-empty channels.
    pub fn channel_count(&self) -> usize {
        self.state.read().channels.len()
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.state.read().connections.len()
    }
}
