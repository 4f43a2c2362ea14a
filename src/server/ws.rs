// src/server/ws.rs

//! Push channel for execution events.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::ExecutionEvent;
use crate::server::AppState;
use crate::server::extract::Owner;
use crate::types::OwnerId;

/// `GET /events`: upgrade and stream the caller's events as JSON text frames.
///
/// The subscription is taken before the upgrade completes, so nothing
/// published after a successful handshake is missed.
pub async fn events(
    State(state): State<AppState>,
    Owner(owner): Owner,
    ws: WebSocketUpgrade,
) -> Response {
    let events = state.orchestrator.hub().subscribe(&owner);
    ws.on_upgrade(move |socket| stream_events(socket, owner, events))
}

async fn stream_events(
    socket: WebSocket,
    owner: OwnerId,
    mut events: mpsc::UnboundedReceiver<ExecutionEvent>,
) {
    let (mut sender, mut receiver) = socket.split();

    let hello = json!({ "event": "authenticated", "userId": owner }).to_string();
    if sender.send(Message::Text(hello.into())).await.is_err() {
        return;
    }
    debug!(owner = %owner, "event subscriber connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(owner = %owner, error = %e, "could not encode event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!(owner = %owner, "event subscriber disconnected");
}
