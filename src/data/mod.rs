//! Dashboard state models.
//!
//! Everything here is synchronous, clock-free and I/O-free; the
//! [`FlowMonitor`](crate::FlowMonitor) composes these pieces.
//!
//! ## Submodules
//!
//! - [`bot`]: Standby/Deployed lifecycle of the cleaning bot
//! - [`devices`]: Per-channel connectivity and data-mode records
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "2s", "500ms")
//! - [`history`]: Bounded reading buffer with min/avg/max statistics
//! - [`reading`]: A single flow sample
//! - [`threshold`]: Normal/Warning state machine with optional debounce
//!
//! ## Data Flow
//!
//! ```text
//! Reading
//!    │
//!    ▼
//! FlowHistory::record()  ──▶ StatsSnapshot
//!    │
//!    ▼
//! ThresholdEngine::evaluate()  ──▶ Transition (edge-triggered)
//! ```

pub mod bot;
pub mod devices;
pub mod duration;
pub mod history;
pub mod reading;
pub mod threshold;

pub use bot::{BotLifecycle, BotState};
pub use devices::{Channel, DeviceRegistry, DeviceStatus};
pub use history::{FlowHistory, Rounding, StatsSnapshot, MAX_HISTORY_SIZE};
pub use reading::{round_tenth, Reading, ReadingOrigin};
pub use threshold::{
    Direction, ThresholdEngine, ThresholdPolicy, Transition, WarningState, Zone,
};
