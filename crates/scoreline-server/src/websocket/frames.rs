//! Inbound frame decoding and server-originated frames.
//!
//! Clients send `{"event": <name>, "data": <value>}`:
//!
//! | event         | data                                         |
//! |---------------|----------------------------------------------|
//! | `joinGame`    | game ID string                               |
//! | `leaveGame`   | game ID string                               |
//! | `scoreUpdate` | object with a string `gameId`, relayed as-is |

use std::sync::Arc;

use scoreline_relay::{ChannelId, ConnectionId};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Event name clients use to join a game channel.
pub const JOIN_GAME: &str = "joinGame";
/// Event name clients use to leave a game channel.
pub const LEAVE_GAME: &str = "leaveGame";
/// Event name for score updates, inbound and outbound.
pub const SCORE_UPDATE: &str = "scoreUpdate";

/// A decoded client frame.
#[derive(Debug)]
pub enum ClientFrame {
    /// Join the named game channel.
    JoinGame(ChannelId),
    /// Leave the named game channel.
    LeaveGame(ChannelId),
    /// Relay `payload` to every member of `game`.
    ScoreUpdate {
        /// Target channel, taken from `data.gameId`.
        game: ChannelId,
        /// The whole `data` value, untouched.
        payload: Box<RawValue>,
    },
}

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Not JSON, or not an `{event, data}` envelope.
    #[error("invalid frame: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The event has no `data`.
    #[error("{0} requires data")]
    MissingData(&'static str),

    /// `data` does not name a game.
    #[error("{0} requires a non-empty string game id")]
    InvalidGameId(&'static str),

    /// The event name is not recognised.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl FrameError {
    /// Machine-readable code sent to the client.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "UNKNOWN_EVENT",
            _ => "INVALID_FRAME",
        }
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
}

#[derive(Deserialize)]
struct ScoreTarget {
    #[serde(rename = "gameId")]
    game_id: String,
}

/// Decode one inbound text frame.
pub fn decode(text: &str) -> Result<ClientFrame, FrameError> {
    let envelope: Envelope<'_> = serde_json::from_str(text)?;
    match envelope.event.as_str() {
        JOIN_GAME => game_id(JOIN_GAME, envelope.data).map(ClientFrame::JoinGame),
        LEAVE_GAME => game_id(LEAVE_GAME, envelope.data).map(ClientFrame::LeaveGame),
        SCORE_UPDATE => {
            let data = envelope.data.ok_or(FrameError::MissingData(SCORE_UPDATE))?;
            // Structs also deserialize from JSON arrays; only objects carry a gameId.
            if !data.get().trim_start().starts_with('{') {
                return Err(FrameError::InvalidGameId(SCORE_UPDATE));
            }
            let target: ScoreTarget = serde_json::from_str(data.get())
                .map_err(|_| FrameError::InvalidGameId(SCORE_UPDATE))?;
            if target.game_id.is_empty() {
                return Err(FrameError::InvalidGameId(SCORE_UPDATE));
            }
            Ok(ClientFrame::ScoreUpdate {
                game: ChannelId::from(target.game_id),
                payload: data.to_owned(),
            })
        }
        other => Err(FrameError::UnknownEvent(other.to_owned())),
    }
}

fn game_id(event: &'static str, data: Option<&RawValue>) -> Result<ChannelId, FrameError> {
    let data = data.ok_or(FrameError::MissingData(event))?;
    let id: String =
        serde_json::from_str(data.get()).map_err(|_| FrameError::InvalidGameId(event))?;
    if id.is_empty() {
        return Err(FrameError::InvalidGameId(event));
    }
    Ok(ChannelId::from(id))
}

#[derive(Serialize)]
struct Outbound<T> {
    event: &'static str,
    data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Established<'a> {
    connection_id: &'a ConnectionId,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

/// `connection.established`, sent once right after upgrade.
pub fn established_frame(id: &ConnectionId) -> serde_json::Result<Arc<str>> {
    let frame = Outbound {
        event: "connection.established",
        data: Established { connection_id: id },
    };
    serde_json::to_string(&frame).map(Arc::from)
}

/// `error` frame describing a rejected inbound frame; sent to its sender only.
pub fn error_frame(err: &FrameError) -> serde_json::Result<Arc<str>> {
    let message = err.to_string();
    let frame = Outbound {
        event: "error",
        data: ErrorBody {
            code: err.code(),
            message: &message,
        },
    };
    serde_json::to_string(&frame).map(Arc::from)
}
