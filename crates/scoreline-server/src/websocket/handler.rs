//! Inbound message dispatch: decodes a client frame and applies it to the
//! channel directory or the relay dispatcher.

use scoreline_relay::{
    ConnectionId, ConnectionRegistry, Echo, JoinOutcome, LeaveOutcome, RelayDispatcher, Transport,
};
use tracing::{debug, instrument, warn};

use super::frames::{self, ClientFrame, FrameError};

/// Handle one inbound text frame from `sender`.
///
/// A rejected frame leaves relay state untouched; the caller reports the
/// error to the sender alone.
#[instrument(skip_all, fields(connection_id = %sender, event = tracing::field::Empty))]
pub fn handle_message<T: Transport>(
    text: &str,
    sender: &ConnectionId,
    registry: &ConnectionRegistry,
    dispatcher: &RelayDispatcher<T>,
) -> Result<(), FrameError> {
    let frame = frames::decode(text)?;
    match frame {
        ClientFrame::JoinGame(game) => {
            let _ = tracing::Span::current().record("event", frames::JOIN_GAME);
            match registry.directory().join(&game, sender) {
                JoinOutcome::Joined => debug!(game_id = %game, "joined game"),
                JoinOutcome::AlreadyMember => debug!(game_id = %game, "already in game"),
                JoinOutcome::UnknownConnection => {
                    warn!(game_id = %game, "join from unregistered connection ignored");
                }
            }
        }
        ClientFrame::LeaveGame(game) => {
            let _ = tracing::Span::current().record("event", frames::LEAVE_GAME);
            match registry.directory().leave(&game, sender) {
                LeaveOutcome::Left { pruned } => debug!(game_id = %game, pruned, "left game"),
                LeaveOutcome::NotMember => debug!(game_id = %game, "leave from non-member ignored"),
            }
        }
        ClientFrame::ScoreUpdate { game, payload } => {
            let _ = tracing::Span::current().record("event", frames::SCORE_UPDATE);
            dispatcher.publish(sender, &game, frames::SCORE_UPDATE, &payload, Echo::IncludeSender);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use scoreline_relay::{ChannelDirectory, ChannelId};
    use serde_json::Value;
    use tokio::sync::mpsc;

    use crate::websocket::connection::ClientConnection;
    use crate::websocket::table::ConnectionTable;

    struct Harness {
        registry: ConnectionRegistry,
        dispatcher: RelayDispatcher<Arc<ConnectionTable>>,
        table: Arc<ConnectionTable>,
    }

    impl Harness {
        fn new() -> Self {
            let directory = Arc::new(ChannelDirectory::new());
            let table = Arc::new(ConnectionTable::new());
            Self {
                registry: ConnectionRegistry::new(directory.clone()),
                dispatcher: RelayDispatcher::new(directory, table.clone()),
                table,
            }
        }

        fn connect(&self, id: &str) -> (ConnectionId, mpsc::Receiver<Arc<str>>) {
            let id = ConnectionId::from(id);
            let (tx, rx) = mpsc::channel(16);
            self.table
                .insert(Arc::new(ClientConnection::new(id.clone(), tx)));
            self.registry.register(&id);
            (id, rx)
        }

        fn handle(&self, sender: &ConnectionId, text: &str) -> Result<(), FrameError> {
            handle_message(text, sender, &self.registry, &self.dispatcher)
        }
    }

    fn next_data(rx: &mut mpsc::Receiver<Arc<str>>) -> Option<Value> {
        rx.try_recv()
            .ok()
            .map(|frame| serde_json::from_str::<Value>(&frame).unwrap()["data"].clone())
    }

    #[test]
    fn join_then_score_update_reaches_members() {
        let h = Harness::new();
        let (a, mut rx_a) = h.connect("a");
        let (b, mut rx_b) = h.connect("b");
        let (c, mut rx_c) = h.connect("c");
        h.handle(&a, r#"{"event":"joinGame","data":"game-42"}"#).unwrap();
        h.handle(&b, r#"{"event":"joinGame","data":"game-42"}"#).unwrap();
        h.handle(&c, r#"{"event":"joinGame","data":"game-7"}"#).unwrap();

        h.handle(&a, r#"{"event":"scoreUpdate","data":{"gameId":"game-42","score":"3-1"}}"#)
            .unwrap();

        assert_eq!(next_data(&mut rx_a).unwrap()["score"], "3-1");
        assert_eq!(next_data(&mut rx_b).unwrap()["score"], "3-1");
        assert!(next_data(&mut rx_c).is_none());
    }

    #[test]
    fn leave_game_stops_delivery() {
        let h = Harness::new();
        let (a, _rx_a) = h.connect("a");
        let (b, mut rx_b) = h.connect("b");
        h.handle(&a, r#"{"event":"joinGame","data":"g"}"#).unwrap();
        h.handle(&b, r#"{"event":"joinGame","data":"g"}"#).unwrap();
        h.handle(&b, r#"{"event":"leaveGame","data":"g"}"#).unwrap();

        h.handle(&a, r#"{"event":"scoreUpdate","data":{"gameId":"g"}}"#)
            .unwrap();
        assert!(next_data(&mut rx_b).is_none());
        assert!(h.registry.memberships_of(&b).is_empty());
    }

    #[test]
    fn rejected_frame_leaves_state_untouched() {
        let h = Harness::new();
        let (a, mut rx_a) = h.connect("a");
        h.handle(&a, r#"{"event":"joinGame","data":"g"}"#).unwrap();

        assert!(h.handle(&a, "garbage").is_err());
        assert!(h.handle(&a, r#"{"event":"joinGame","data":""}"#).is_err());
        assert!(h.handle(&a, r#"{"event":"resetGame","data":"g"}"#).is_err());

        assert_eq!(
            h.registry.memberships_of(&a),
            [ChannelId::from("g")].into_iter().collect()
        );
        assert!(next_data(&mut rx_a).is_none());
    }
}
