//! WebSocket session tracking and snapshot fan-out.
//!
//! This module provides tracking of VSCS sessions with force-close capability:
//!
//! - `WsConnectionManager`: Tracks all open sessions and their outboxes
//! - `ConnectionGuard`: RAII guard for automatic cleanup on disconnect
//!
//! Each session owns a latest-value outbox (`tokio::sync::watch`). A
//! broadcast replaces the value in every outbox without waiting, so a slow
//! client only ever misses intermediate snapshots, never the latest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Pending payload for one session. `None` until the first snapshot.
type Outbox = watch::Sender<Option<Arc<str>>>;

/// Per-session state held by the registry.
struct ConnectionState {
    outbox: Outbox,
}

/// Manages all open VSCS sessions.
///
/// Thread-safe and designed for concurrent access from multiple
/// WebSocket handlers and the snapshot rebuild path. Uses hierarchical
/// cancellation tokens for efficient force-close of all sessions.
pub struct WsConnectionManager {
    /// Open sessions: connection_id -> ConnectionState
    connections: DashMap<String, ConnectionState>,
    /// Counter for generating unique connection IDs.
    next_id: AtomicU64,
    /// Global cancellation token - when cancelled, all sessions close.
    /// Wrapped in RwLock so it can be replaced after close_all().
    global_cancel: RwLock<CancellationToken>,
}

impl WsConnectionManager {
    /// Creates a new connection manager.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
            global_cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Registers a new session and returns a guard for RAII cleanup.
    ///
    /// The session is visible to [`broadcast`](Self::broadcast) as soon as
    /// this returns. Seed it with the current snapshot via
    /// [`ConnectionGuard::seed`].
    pub fn register(self: &Arc<Self>) -> ConnectionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let conn_id = format!("ws-{}", id);
        let cancel_token = self.global_cancel.read().child_token();
        let (outbox, outbox_rx) = watch::channel(None);

        self.connections
            .insert(conn_id.clone(), ConnectionState { outbox: outbox.clone() });
        log::info!(
            "[WS] Connection registered: {} (total: {})",
            conn_id,
            self.connections.len()
        );

        ConnectionGuard {
            id: conn_id,
            manager: Arc::clone(self),
            cancel_token,
            outbox,
            outbox_rx,
        }
    }

    /// Unregisters a session by ID.
    fn unregister(&self, id: &str) {
        if self.connections.remove(id).is_some() {
            log::info!(
                "[WS] Connection unregistered: {} (remaining: {})",
                id,
                self.connections.len()
            );
        }
    }

    /// Queues `payload` as the next message of every open session.
    ///
    /// Never blocks. Empty payloads are skipped. Returns the number of
    /// sessions the payload was queued for.
    pub fn broadcast(&self, payload: Arc<str>) -> usize {
        if payload.is_empty() {
            log::debug!("[WS] Skipping empty broadcast");
            return 0;
        }
        let mut delivered = 0;
        for entry in self.connections.iter() {
            entry.value().outbox.send_replace(Some(Arc::clone(&payload)));
            delivered += 1;
        }
        log::trace!("[WS] Broadcast {} bytes to {} session(s)", payload.len(), delivered);
        delivered
    }

    /// Returns the number of open sessions.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Force-closes all sessions.
    ///
    /// This cancels the global token, which signals all session handlers
    /// to terminate gracefully. After cancellation, a fresh token is created
    /// so new sessions can still be accepted.
    ///
    /// Returns the number of sessions that were signaled to close.
    pub fn close_all(&self) -> usize {
        let count = self.connections.len();
        if count > 0 {
            log::info!("[WS] Force-closing {} connection(s)", count);
            let mut guard = self.global_cancel.write();
            guard.cancel();
            *guard = CancellationToken::new();
        } else {
            log::info!("[WS] close_all called but no connections to close");
        }
        count
    }
}

impl Default for WsConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that unregisters a session when dropped.
///
/// This ensures sessions are always cleaned up, even if the handler
/// panics or exits early.
pub struct ConnectionGuard {
    id: String,
    manager: Arc<WsConnectionManager>,
    /// Token for this specific session - cancelled on force-close.
    cancel_token: CancellationToken,
    outbox: Outbox,
    outbox_rx: watch::Receiver<Option<Arc<str>>>,
}

impl ConnectionGuard {
    /// Returns the connection ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the cancellation token for this session.
    ///
    /// Use this in `tokio::select!` to detect force-close requests:
    /// ```ignore
    /// tokio::select! {
    ///     _ = cancel_token.cancelled() => break,
    ///     // ... other branches
    /// }
    /// ```
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Queues the initial snapshot unless a broadcast already reached this
    /// session, which is at least as new.
    ///
    /// Returns whether the seed was queued.
    pub fn seed(&self, payload: Arc<str>) -> bool {
        if payload.is_empty() {
            return false;
        }
        self.outbox.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(payload);
                true
            } else {
                false
            }
        })
    }

    /// Waits for the next payload queued for this session.
    ///
    /// Returns the latest payload only; anything queued in between is
    /// superseded. Returns `None` if the outbox is gone.
    pub async fn next_payload(&mut self) -> Option<Arc<str>> {
        loop {
            self.outbox_rx.changed().await.ok()?;
            if let Some(payload) = self.outbox_rx.borrow_and_update().clone() {
                return Some(payload);
            }
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.manager.unregister(&self.id);
    }
}
