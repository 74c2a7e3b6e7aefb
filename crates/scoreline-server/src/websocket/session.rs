//! WebSocket session lifecycle: handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use scoreline_relay::ConnectionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Instrument};

use super::connection::ClientConnection;
use super::frames;
use super::handler::handle_message;
use crate::config::ServerConfig;
use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_CONNECTION_DURATION_SECONDS,
    WS_DISCONNECTIONS_TOTAL, WS_INVALID_FRAMES_TOTAL,
};
use crate::server::AppState;

/// How long the write task gets to flush a close frame after the reader ends.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Why the outbound half of a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// Session or server shutdown.
    Cancelled,
    /// Every sender was dropped.
    QueueClosed,
    /// The socket rejected a write.
    SocketError,
    /// A write did not complete within the send timeout.
    WriteTimeout,
    /// The client was silent for longer than the heartbeat timeout.
    HeartbeatTimeout,
}

/// Run a WebSocket session for a connected client.
///
/// 1. Registers the connection and sends `connection.established`
/// 2. Applies inbound frames (`joinGame`, `leaveGame`, `scoreUpdate`)
/// 3. Forwards queued outbound frames, pinging on the heartbeat interval
/// 4. Unregisters the connection (leaving every channel) on disconnect
#[instrument(skip_all, fields(connection_id = %id))]
pub async fn run_ws_session(ws: WebSocket, id: ConnectionId, state: AppState) {
    let (ws_tx, mut ws_rx) = ws.split();

    let (send_tx, send_rx) = mpsc::channel::<Arc<str>>(state.config.send_queue_capacity);
    let connection = Arc::new(ClientConnection::new(id.clone(), send_tx));
    let session_token = state.shutdown.session_token();

    state.connections.insert(connection.clone());
    state.registry.register(&id);

    let connection_start = Instant::now();
    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    match frames::established_frame(&id) {
        Ok(frame) => {
            if let Err(e) = connection.send(frame) {
                warn!(error = %e, "failed to enqueue connection.established");
            }
        }
        Err(e) => warn!(error = %e, "failed to encode connection.established"),
    }

    let mut writer = tokio::spawn(
        write_loop(
            ws_tx,
            send_rx,
            connection.clone(),
            session_token.clone(),
            state.config.clone(),
        )
        .in_current_span(),
    );

    loop {
        let msg = tokio::select! {
            () = session_token.cancelled() => {
                debug!("session cancelled");
                break;
            }
            exit = &mut writer => {
                match exit {
                    Ok(WriterExit::HeartbeatTimeout) => warn!(
                        timeout_secs = state.config.heartbeat_timeout_secs,
                        "client unresponsive, disconnecting"
                    ),
                    Ok(reason) => debug!(?reason, "outbound stream ended"),
                    Err(e) => warn!(error = %e, "write task failed"),
                }
                break;
            }
            msg = ws_rx.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                connection.mark_alive();
                on_text(&state, &connection, text.as_str());
            }
            Some(Ok(Message::Binary(data))) => {
                connection.mark_alive();
                if let Ok(text) = std::str::from_utf8(&data) {
                    on_text(&state, &connection, text);
                } else {
                    info!(len = data.len(), "received non-UTF8 binary frame");
                }
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => connection.mark_alive(),
            Some(Ok(Message::Close(_))) => {
                info!("client sent close frame");
                break;
            }
            Some(Err(e)) => {
                debug!(error = %e, "websocket read error");
                break;
            }
            None => break,
        }
    }

    // Leave every channel before the socket is torn down so no new fan-out
    // snapshot includes this connection.
    let left = state.registry.unregister(&id);
    let _ = state.connections.remove(&id);

    session_token.cancel();
    if !writer.is_finished() && tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        writer.abort();
    }

    info!(
        channels_left = left.len(),
        dropped_frames = connection.drop_count(),
        "client disconnected"
    );
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection_start.elapsed().as_secs_f64());
}

/// Apply one inbound text frame; a rejected frame is answered on this
/// connection only.
fn on_text(state: &AppState, connection: &ClientConnection, text: &str) {
    let Err(err) = handle_message(
        text,
        &connection.id,
        &state.registry,
        state.dispatcher.as_ref(),
    ) else {
        return;
    };

    counter!(WS_INVALID_FRAMES_TOTAL, "code" => err.code()).increment(1);
    debug!(error = %err, "rejected client frame");
    match frames::error_frame(&err) {
        Ok(frame) => {
            if let Err(e) = connection.send(frame) {
                debug!(error = %e, "failed to enqueue error frame");
            }
        }
        Err(e) => warn!(error = %e, "failed to encode error frame"),
    }
}

/// Forward queued frames to the socket and ping on the heartbeat interval.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Arc<str>>,
    connection: Arc<ClientConnection>,
    token: CancellationToken,
    config: Arc<ServerConfig>,
) -> WriterExit {
    let write_timeout = config.send_timeout();
    let heartbeat_timeout = config.heartbeat_timeout();
    let mut ping_interval = tokio::time::interval(config.heartbeat_interval());
    // Skip the immediate first tick
    let _ = ping_interval.tick().await;

    loop {
        let message = tokio::select! {
            () = token.cancelled() => {
                let _ = tokio::time::timeout(write_timeout, sink.send(Message::Close(None))).await;
                return WriterExit::Cancelled;
            }
            frame = outbound.recv() => match frame {
                Some(frame) => Message::Text(frame.to_string().into()),
                None => return WriterExit::QueueClosed,
            },
            _ = ping_interval.tick() => {
                if connection.last_seen_elapsed() > heartbeat_timeout {
                    return WriterExit::HeartbeatTimeout;
                }
                Message::Ping(axum::body::Bytes::new())
            }
        };

        match tokio::time::timeout(write_timeout, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => return WriterExit::SocketError,
            Err(_) => return WriterExit::WriteTimeout,
        }
    }
}
