//! Owner of the current snapshot.
//!
//! `StateSync` holds the one current [`Snapshot`] and its encoded JSON, and
//! is the only thing that replaces them. Every rebuild goes through
//! [`StateSync::refresh`], which runs build → encode → store → broadcast
//! under one lock so broadcasts leave in the order snapshots were built.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::api::ws_connection::WsConnectionManager;
use crate::error::BridgeResult;
use crate::events::HostEventBridge;
use crate::host::VscsHost;
use crate::vscs::Snapshot;

/// How much of the snapshot a rebuild has to redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildScope {
    /// Keep the line/frequency lists, re-read each item's flags.
    Flags,
    /// Re-enumerate lines and frequencies and recompute ids.
    Structure,
}

impl RebuildScope {
    /// The wider of two scopes.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if self == Self::Structure || other == Self::Structure {
            Self::Structure
        } else {
            Self::Flags
        }
    }
}

/// Current snapshot holder and rebuild loop.
pub struct StateSync {
    host: Arc<dyn VscsHost>,
    events: Arc<HostEventBridge>,
    sessions: Arc<WsConnectionManager>,
    current: RwLock<Arc<Snapshot>>,
    current_json: RwLock<Arc<str>>,
    /// Serializes rebuilds.
    rebuild: Mutex<()>,
}

impl StateSync {
    /// Builds the initial snapshot from the host.
    pub fn new(
        host: Arc<dyn VscsHost>,
        events: Arc<HostEventBridge>,
        sessions: Arc<WsConnectionManager>,
    ) -> BridgeResult<Self> {
        let snapshot = Snapshot::build(&*host);
        let json: Arc<str> = snapshot.encode()?.into();
        log::info!(
            "[Sync] Initial snapshot: {} line(s), {} frequency(ies), connected={}",
            snapshot.lines.len(),
            snapshot.frequencies.len(),
            snapshot.connected
        );
        Ok(Self {
            host,
            events,
            sessions,
            current: RwLock::new(Arc::new(snapshot)),
            current_json: RwLock::new(json),
            rebuild: Mutex::new(()),
        })
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// The current snapshot, encoded. Never empty.
    pub fn snapshot_json(&self) -> Arc<str> {
        Arc::clone(&self.current_json.read())
    }

    /// The host this snapshot mirrors.
    pub fn host(&self) -> &Arc<dyn VscsHost> {
        &self.host
    }

    /// Rebuilds the snapshot, publishes it and broadcasts it to every session.
    ///
    /// Blocks on host reads; call from a blocking context. A structural
    /// change reported by the host since the last rebuild widens `scope`.
    pub fn refresh(&self, scope: RebuildScope) -> BridgeResult<Arc<Snapshot>> {
        let _guard = self.rebuild.lock();
        let scope = scope.merge(self.events.take_structural());

        let previous = self.snapshot();
        let next = match scope {
            RebuildScope::Structure => Snapshot::build(&*self.host),
            RebuildScope::Flags => previous.refresh(&*self.host).unwrap_or_else(|| {
                log::debug!("[Sync] Item vanished during flag refresh, re-enumerating");
                Snapshot::build(&*self.host)
            }),
        };
        let json: Arc<str> = next.encode()?.into();
        let next = Arc::new(next);

        *self.current.write() = Arc::clone(&next);
        *self.current_json.write() = Arc::clone(&json);
        let delivered = self.sessions.broadcast(json);
        log::debug!(
            "[Sync] Rebuilt snapshot ({:?}), sent to {} session(s)",
            scope,
            delivered
        );
        Ok(next)
    }

    /// Rebuild loop driven by host events. Runs until `cancel` fires.
    ///
    /// Rebuilds run on the blocking pool. Events arriving while a rebuild is
    /// in flight leave a pending request behind, so the last broadcast
    /// always reflects the latest host state.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        log::info!("[Sync] Rebuild loop started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.events.notified() => {}
            }
            while let Some(scope) = self.events.take() {
                let this = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || this.refresh(scope)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::warn!("[Sync] Rebuild failed: {}", e),
                    Err(e) => log::error!("[Sync] Rebuild task panicked: {}", e),
                }
            }
        }
        log::info!("[Sync] Rebuild loop stopped");
    }
}
