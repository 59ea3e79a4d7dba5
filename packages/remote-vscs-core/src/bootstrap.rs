//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together. The host is injected, so the
//! same wiring serves a real telephony subsystem, the standalone server's
//! simulated panel, and the tests.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{StaticResponder, WsConnectionManager};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{HostEventBridge, HostEventListener};
use crate::host::VscsHost;
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::services::{CommandDispatcher, StateSync};
use crate::state::Config;

/// Container for all bootstrapped services.
///
/// This struct holds all the wired services created during bootstrap.
/// It's consumed by `AppState` to build the final application state.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Validated configuration.
    pub config: Arc<Config>,
    /// The host telephony/radio subsystem.
    pub host: Arc<dyn VscsHost>,
    /// Receives host events and wakes the rebuild loop.
    pub events: Arc<HostEventBridge>,
    /// Open WebSocket sessions.
    pub ws_manager: Arc<WsConnectionManager>,
    /// Owner of the current snapshot.
    pub sync: Arc<StateSync>,
    /// Applies client commands to the host.
    pub dispatcher: Arc<CommandDispatcher>,
    /// Static asset responder with the bootstrap page loaded.
    pub responder: Arc<StaticResponder>,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Spawns the snapshot rebuild loop.
    pub fn start_background_tasks(&self) {
        let sync = Arc::clone(&self.sync);
        let cancel = self.cancel_token.clone();
        self.spawner.spawn(async move {
            sync.run(cancel).await;
        });
        log::info!("[Bootstrap] Background tasks started");
    }

    /// Initiates graceful shutdown of all services.
    ///
    /// Stops both accept loops and the rebuild loop, then force-closes every
    /// open session.
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");

        // Signal cancellation to listeners and background tasks
        self.cancel_token.cancel();

        let closed = self.ws_manager.close_all();
        if closed > 0 {
            log::info!("[Bootstrap] Closed {} WebSocket connection(s)", closed);
        }

        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Bootstraps all services on the current Tokio runtime.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime context.
pub fn bootstrap_services(
    config: &Config,
    host: Arc<dyn VscsHost>,
) -> BridgeResult<BootstrappedServices> {
    bootstrap_services_with_spawner(config, host, TokioSpawner::current())
}

/// Bootstraps all application services with their dependencies.
///
/// This is the composition root where all services are instantiated and
/// wired together, in dependency order:
///
/// 1. Static responder (loads the bootstrap document)
/// 2. Event bridge and session registry
/// 3. Host subscription (the bridge starts collecting events)
/// 4. State sync (builds the initial snapshot, needs host, bridge, registry)
/// 5. Dispatcher (depends on state sync)
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the bootstrap document
/// cannot be read, or the initial snapshot cannot be encoded.
pub fn bootstrap_services_with_spawner(
    config: &Config,
    host: Arc<dyn VscsHost>,
    spawner: TokioSpawner,
) -> BridgeResult<BootstrappedServices> {
    config.validate().map_err(BridgeError::Configuration)?;
    let config = Arc::new(config.clone());

    let responder = Arc::new(StaticResponder::load(&config)?);

    let events = Arc::new(HostEventBridge::new());
    let ws_manager = Arc::new(WsConnectionManager::new());

    // Subscribe before the initial build so a change racing with it still
    // raises a rebuild request
    host.subscribe(Arc::clone(&events) as Arc<dyn HostEventListener>);
    log::info!("[Bootstrap] Subscribed to host events");

    let sync = Arc::new(StateSync::new(
        Arc::clone(&host),
        Arc::clone(&events),
        Arc::clone(&ws_manager),
    )?);

    let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&sync)));

    Ok(BootstrappedServices {
        config,
        host,
        events,
        ws_manager,
        sync,
        dispatcher,
        responder,
        spawner,
        cancel_token: CancellationToken::new(),
    })
}
