//! Remote VSCS core - bridge between a voice switching panel and browsers.
//!
//! This crate exposes the live state of a VSCS panel (telephony lines and
//! radio frequencies) to remote browser clients and accepts control commands
//! back from them. It is used by the standalone headless server and can be
//! embedded in a host application that provides the real panel.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`host`]: Boundary to the telephony/radio subsystem, plus a simulated panel
//! - [`events`]: Host change notifications and the rebuild request bridge
//! - [`vscs`]: Snapshot, stable ids and the client command vocabulary
//! - [`services`]: Snapshot owner and command dispatcher
//! - [`api`]: Static asset responder and WebSocket session server
//! - [`bootstrap`]: Composition root
//! - [`runtime`]: Task spawning abstraction
//! - [`state`]: Configuration
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`VscsHost`](host::VscsHost): The panel being bridged
//! - [`HostEventListener`](events::HostEventListener): Host change callbacks
//! - [`TaskSpawner`](runtime::TaskSpawner): Spawning background tasks

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod events;
pub mod host;
pub mod protocol_constants;
pub mod runtime;
pub mod services;
pub mod state;
pub mod utils;
pub mod vscs;

// Re-export commonly used types at the crate root
pub use error::{BridgeError, BridgeResult, ErrorCode};
pub use events::{HostEvent, HostEventBridge, HostEventListener, LoggingEventListener};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use state::Config;

// Re-export host types
pub use host::{HostControl, HostError, HostEvents, HostPanel, SimulatedHost, VscsHost};

// Re-export model types
pub use vscs::{CommandDecodeError, Snapshot, VscsCommand};

// Re-export service types
pub use services::{CommandDispatcher, DispatchOutcome, StateSync};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, bootstrap_services_with_spawner, BootstrappedServices};

// Re-export API types
pub use api::{start_servers, AppState, ServerError, ServerHandles, WsConnectionManager};
