//! Boundary to the host telephony/radio subsystem.
//!
//! # Module Structure
//!
//! - `types` - Lines, frequencies, handles and panel flags as the host reports them
//! - `traits` - `HostPanel` / `HostControl` / `HostEvents` and the combined `VscsHost`
//! - `simulated` - In-memory host used by the standalone server and tests

pub mod simulated;
pub mod traits;
pub mod types;

pub use simulated::{CatalogueFrequency, SimulatedHost};
pub use traits::{HostControl, HostError, HostEvents, HostPanel, HostResult, VscsHost};
pub use types::{
    FrequencyHandle, FrequencyMode, HostFrequency, HostLine, LineHandle, LineState, LineType,
    PanelStatus,
};
