//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scoreline_relay::{ConnectionId, DeliveryError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// One connected WebSocket client, as seen by senders.
pub struct ClientConnection {
    /// Connection ID assigned at upgrade.
    pub id: ConnectionId,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<Arc<str>>,
    /// When the last frame of any kind was received.
    last_seen: Mutex<Instant>,
    /// Count of frames refused because the queue was full or closed.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<str>>) -> Self {
        Self {
            id,
            tx,
            last_seen: Mutex::new(Instant::now()),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a frame for the write task without waiting.
    pub fn send(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        self.tx.try_send(frame).map_err(|e| {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            }
        })
    }

    /// Total frames refused for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Record inbound activity (any frame, including pongs).
    pub fn mark_alive(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since the last inbound frame (or connection establishment).
    pub fn last_seen_elapsed(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }
}
