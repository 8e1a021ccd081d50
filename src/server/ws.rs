//! WebSocket gateway
//!
//! # Endpoints
//!
//! - `GET /ws` - WebSocket upgrade, one session per connection
//!
//! # Protocol
//!
//! The viewer sends `START` / `PAUSE` / `RESET` / `KEY_EVENT` JSON messages
//! and receives `FRAME`, `EXPERIMENT_COMPLETE` and `ERROR` messages.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::AppState;

/// WebSocket upgrade handler: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Bridge one socket to one session until either side goes away
async fn handle_socket(socket: WebSocket, state: AppState) {
    let manager = state.manager;
    let (id, mut outbound) = manager.connect().await;
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    warn!(session = %id, "Failed to serialize {}: {}", message.kind(), e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json)).await {
                warn!(session = %id, "Send to viewer failed: {}", e);
                break;
            }
        }
    });

    let recv_manager = manager.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => recv_manager.dispatch_text(id, &text).await,
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    warn!(session = %id, "WebSocket error: {}", e);
                    break;
                }
                _ => {} // Ignore ping/pong/binary
            }
        }
    });

    // Whichever side finishes first takes the other down with it
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    manager.disconnect(id).await;
    debug!(session = %id, "WebSocket closed");
}
