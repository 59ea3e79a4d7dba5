//! Application services layer.
//!
//! This module contains the services that sit between the API layer and the
//! host: the snapshot owner and the command dispatcher.

pub mod dispatcher;
pub mod state_sync;

pub use dispatcher::{CommandDispatcher, DispatchOutcome, IgnoreReason};
pub use state_sync::{RebuildScope, StateSync};
