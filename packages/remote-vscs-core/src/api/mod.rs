//! HTTP/WebSocket API layer.
//!
//! This module contains the two listeners and the thin handlers behind them:
//! the static asset responder on the base port and the VSCS WebSocket
//! service on base port + 1. Handlers delegate to services.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::BootstrappedServices;
use crate::services::{CommandDispatcher, StateSync};
use crate::state::Config;

pub mod http;
pub mod ws;
pub mod ws_connection;

pub use http::StaticResponder;
pub use ws_connection::WsConnectionManager;

/// Listen backlog for both listeners.
const LISTEN_BACKLOG: i32 = 128;

/// Errors that can occur when starting the servers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind a listener.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
/// All business logic lives in the services themselves.
#[derive(Clone)]
pub struct AppState {
    /// Listener configuration.
    pub config: Arc<Config>,
    /// Owner of the current snapshot.
    pub sync: Arc<StateSync>,
    /// Applies client commands to the host.
    pub dispatcher: Arc<CommandDispatcher>,
    /// Open WebSocket sessions.
    pub ws_manager: Arc<WsConnectionManager>,
    /// Static asset responder.
    pub responder: Arc<StaticResponder>,
    /// Stops both accept loops when cancelled.
    pub cancel_token: CancellationToken,
}

impl AppState {
    /// Builds the API state from bootstrapped services.
    pub fn new(services: &BootstrappedServices) -> Self {
        Self {
            config: Arc::clone(&services.config),
            sync: Arc::clone(&services.sync),
            dispatcher: Arc::clone(&services.dispatcher),
            ws_manager: Arc::clone(&services.ws_manager),
            responder: Arc::clone(&services.responder),
            cancel_token: services.cancel_token.clone(),
        }
    }
}

/// Running listeners.
pub struct ServerHandles {
    /// Bound address of the static asset responder.
    pub http_addr: SocketAddr,
    /// Bound address of the WebSocket service.
    pub ws_addr: SocketAddr,
    http_task: JoinHandle<()>,
    ws_task: JoinHandle<()>,
}

impl ServerHandles {
    /// Waits for both accept loops to finish (after cancellation).
    pub async fn join(self) {
        if let Err(e) = self.http_task.await {
            log::error!("[HTTP] Listener task failed: {}", e);
        }
        if let Err(e) = self.ws_task.await {
            log::error!("[WS] Listener task failed: {}", e);
        }
    }
}

/// Binds a TCP listener with `SO_REUSEADDR` so a restart can reclaim the port.
fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let bind_err = |source| ServerError::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_err)?;

    // SO_REUSEADDR - allows bind on rapid restarts
    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("Failed to set SO_REUSEADDR on {}: {}", addr, e);
    }

    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(LISTEN_BACKLOG).map_err(bind_err)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(bind_err)
}

/// Binds both listeners and spawns their accept loops.
///
/// Binding either listener is fatal. The loops run until
/// `state.cancel_token` is cancelled.
pub async fn start_servers(state: AppState) -> Result<ServerHandles, ServerError> {
    let ip = state.config.bind_address;
    let http_listener = bind_listener(SocketAddr::new(ip, state.config.base_port))?;
    let ws_listener = bind_listener(SocketAddr::new(ip, state.config.ws_port()))?;

    let local_addr = |listener: &TcpListener, port| {
        listener
            .local_addr()
            .unwrap_or_else(|_| SocketAddr::new(ip, port))
    };
    let http_addr = local_addr(&http_listener, state.config.base_port);
    let ws_addr = local_addr(&ws_listener, state.config.ws_port());

    log::info!("[HTTP] Serving assets on http://{}", http_addr);
    let http_task = tokio::spawn(http::serve(
        http_listener,
        Arc::clone(&state.responder),
        state.cancel_token.clone(),
    ));

    log::info!(
        "[WS] Serving VSCS on ws://{}{}",
        ws_addr,
        crate::protocol_constants::WS_VSCS_PATH
    );
    let cancel = state.cancel_token.clone();
    let app = ws::create_router(state);
    let ws_task = tokio::spawn(async move {
        let result = axum::serve(ws_listener, app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await;
        match result {
            Ok(()) => log::info!("[WS] Listener stopped"),
            Err(e) => log::error!("[WS] Server error: {}", e),
        }
    });

    Ok(ServerHandles {
        http_addr,
        ws_addr,
        http_task,
        ws_task,
    })
}
