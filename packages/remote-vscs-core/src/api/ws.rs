//! WebSocket handler for VSCS sessions.
//!
//! A session receives the current snapshot as soon as it opens and a fresh
//! one after every change. Clients send `{"CommandName", "Value"}` messages
//! back; malformed ones are logged and dropped without closing the session.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use tower_http::trace::TraceLayer;

use crate::api::AppState;
use crate::protocol_constants::WS_VSCS_PATH;
use crate::services::{CommandDispatcher, DispatchOutcome};
use crate::vscs::VscsCommand;

/// Builds the WebSocket router: one service at [`WS_VSCS_PATH`].
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(WS_VSCS_PATH, get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Main WebSocket session handler.
async fn handle_ws(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Register first so no broadcast between here and the seed is missed
    let mut conn_guard = state.ws_manager.register();
    let cancel_token = conn_guard.cancel_token().clone();

    log::info!("[WS] New connection established: {}", conn_guard.id());

    conn_guard.seed(state.sync.snapshot_json());

    loop {
        tokio::select! {
            // Handle force-close request
            _ = cancel_token.cancelled() => {
                log::info!("[WS] Connection force-closed: {}", conn_guard.id());
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            // Handle incoming messages from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&state.dispatcher, conn_guard.id(), text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        log::debug!("[WS] Transport error on {}: {}", conn_guard.id(), e);
                        break;
                    }
                    // Binary frames are not part of the protocol; ping/pong is handled by axum
                    _ => {}
                }
            }
            // Deliver the latest snapshot
            payload = conn_guard.next_payload() => {
                let Some(payload) = payload else { break };
                if sender.send(Message::Text(payload.as_ref().into())).await.is_err() {
                    log::debug!("[WS] Send failed, client gone: {}", conn_guard.id());
                    break;
                }
            }
        }
    }

    // ConnectionGuard Drop impl unregisters the session
}

/// Decodes one inbound text frame and dispatches it.
///
/// Dispatch calls into the host, so it runs on the blocking pool.
async fn handle_text(dispatcher: &Arc<CommandDispatcher>, conn_id: &str, text: &str) {
    let command = match VscsCommand::decode(text) {
        Ok(command) => command,
        Err(e) => {
            log::warn!("[WS] Dropping malformed message from {}: {}", conn_id, e);
            return;
        }
    };
    log::debug!("[WS] {} -> {}", conn_id, command.name());

    let dispatcher = Arc::clone(dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.dispatch(&command)).await {
        Ok(DispatchOutcome::Applied) => {}
        Ok(outcome) => log::debug!("[WS] Command from {} not applied: {:?}", conn_id, outcome),
        Err(e) => log::error!("[WS] Dispatch task panicked: {}", e),
    }
}
