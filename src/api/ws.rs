//! WebSocket endpoint for display subscribers
//!
//! A display connects once under its chosen id and then only listens; the
//! server pushes status and result messages through the connection registry.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::AppState;

pub async fn display_socket(
    ws: WebSocketUpgrade,
    Path(display_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| display_session(socket, display_id, state))
}

/// Pump registry pushes out to the socket until either side goes away
async fn display_session(socket: WebSocket, display_id: String, state: Arc<AppState>) {
    let (connection, mut outbox) = state.registry.register(Some(&display_id));
    info!(display = %display_id, %connection, "Display connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            pushed = outbox.recv() => {
                // A closed outbox means the registry dropped this connection
                let Some(message) = pushed else { break };
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(display = %display_id, error = %e, "Could not serialize push message");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    // Displays are listen-only; inbound text is logged and dropped
                    Some(Ok(Message::Text(text))) => {
                        debug!(display = %display_id, %text, "Ignoring inbound display message");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(display = %display_id, error = %e, "Display socket error");
                        break;
                    }
                }
            }
        }
    }

    state.registry.unregister(connection, Some(&display_id));
    info!(display = %display_id, %connection, "Display disconnected");
}
