//! VSCS state and command model.
//!
//! # Module Structure
//!
//! - `ids` - Stable line/frequency ids
//! - `snapshot` - The full panel state pushed to every client
//! - `command` - Inbound client commands

pub mod command;
pub mod ids;
pub mod snapshot;

pub use command::{CommandDecodeError, CommandMessage, VscsCommand};
pub use ids::{frequency_id, line_id};
pub use snapshot::{Frequency, Line, Snapshot};
