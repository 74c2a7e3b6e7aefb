//! Fan-out of one published event to every member of its channel.

use std::sync::Arc;

use metrics::counter;
use serde_json::value::RawValue;
use tracing::{debug, warn};

use crate::directory::ChannelDirectory;
use crate::frame::encode_frame;
use crate::ids::{ChannelId, ConnectionId};
use crate::metrics::{RELAY_DELIVERIES_TOTAL, RELAY_DELIVERY_FAILURES_TOTAL, RELAY_PUBLISH_TOTAL};
use crate::transport::Transport;

/// Whether the publisher receives its own event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Echo {
    /// Deliver to every member, the publisher included.
    #[default]
    IncludeSender,
    /// Deliver to every member except the publisher.
    ExcludeSender,
}

/// Resolves channel members and pushes events to them through a [`Transport`].
pub struct RelayDispatcher<T> {
    directory: Arc<ChannelDirectory>,
    transport: T,
}

impl<T: Transport> RelayDispatcher<T> {
    /// Create a dispatcher over `directory` delivering through `transport`.
    pub fn new(directory: Arc<ChannelDirectory>, transport: T) -> Self {
        Self {
            directory,
            transport,
        }
    }

    /// The transport used for delivery.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Broadcast `payload` to the current members of `channel`.
    ///
    /// Membership is snapshotted under the directory lock and delivery runs
    /// after the lock is released. The sender does not need to be a member.
    /// Individual delivery failures are logged and skipped; they never stop
    /// delivery to the other members and never reach the caller.
    pub fn publish(
        &self,
        sender: &ConnectionId,
        channel: &ChannelId,
        event: &str,
        payload: &RawValue,
        echo: Echo,
    ) {
        counter!(RELAY_PUBLISH_TOTAL).increment(1);
        let members = self.directory.members_of(channel);
        if members.is_empty() {
            debug!(channel_id = %channel, event, "publish to channel with no members");
            return;
        }
        if !members.contains(sender) {
            debug!(connection_id = %sender, channel_id = %channel, "publisher is not a member");
        }

        let frame = match encode_frame(event, payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(channel_id = %channel, event, error = %e, "failed to encode frame");
                return;
            }
        };

        let mut delivered = 0u32;
        let mut failed = 0u32;
        for member in &members {
            if echo == Echo::ExcludeSender && member == sender {
                continue;
            }
            match self.transport.send(member, Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    counter!(RELAY_DELIVERY_FAILURES_TOTAL).increment(1);
                    warn!(connection_id = %member, channel_id = %channel, error = %e, "failed to deliver event");
                }
            }
        }
        counter!(RELAY_DELIVERIES_TOTAL).increment(u64::from(delivered));
        debug!(
            channel_id = %channel,
            event,
            recipients = members.len(),
            delivered,
            failed,
            "broadcast event to channel"
        );
    }
}
