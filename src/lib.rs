// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # drainwatch
//!
//! A terminal dashboard and library for monitoring a drainage flow meter,
//! detecting probable clogs and dispatching a cleaning bot.
//!
//! The flow meter is polled over HTTP (or simulated when no endpoint is
//! configured), every reading is folded into session statistics and a
//! threshold engine, and two camera feeds (drain and bot) are health-checked.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│  monitor  │───▶│   ui    │───▶│Terminal │  │
//! │  │ (state) │    │(controller)    │(render) │    │         │  │
//! │  └────┬────┘    └─────┬─────┘    └─────────┘    └─────────┘  │
//! │       │               │ data: history, threshold, devices    │
//! │       ▼               ▲                                      │
//! │  ┌─────────┐   SourceEvent                                   │
//! │  │ source  │──────────┘  Sampler | embed probes (tokio)      │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`monitor`]**: [`FlowMonitor`], the single owner of dashboard state.
//!   Source tasks never mutate it; their events are applied by its owner.
//! - **[`source`]**: The sampler task (live HTTP or synthetic), camera/bot
//!   probes, and the [`SourceControl`] seam with [`SourceHub`] and
//!   [`ManualSource`] implementations
//! - **[`data`]**: Readings, rolling statistics, the threshold state machine,
//!   device registry and bot lifecycle
//! - **[`settings`]**: Layered configuration (defaults, TOML, environment)
//! - **[`app`]** / **[`events`]** / **[`ui`]**: Terminal UI state, key
//!   handling and ratatui rendering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Demo mode: synthetic flow, mock cameras
//! drainwatch
//!
//! # Live meter, debounced below-threshold detection
//! drainwatch --flow-url http://192.168.0.77/api/data --policy debounced
//!
//! # No terminal UI: log transitions, export after 10 samples
//! drainwatch --headless --ticks 10 --export snapshot.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::time::Instant;
//! use drainwatch::{Endpoints, FlowMonitor, Reading, ReadingOrigin, Rounding, ThresholdPolicy};
//!
//! let mut monitor = FlowMonitor::new(
//!     Endpoints::default(),
//!     150.0,
//!     ThresholdPolicy::immediate(),
//!     Rounding::OnRecord,
//! )
//! .unwrap();
//!
//! let reading = Reading::new(180.0, None, ReadingOrigin::Synthetic);
//! monitor.record_reading(reading, Instant::now());
//! assert!(monitor.warning_active());
//! ```
//!
//! ### Feeding events by hand
//!
//! ```
//! use drainwatch::{App, Endpoints, FlowMonitor, ManualSource, Rounding, ThresholdPolicy, Theme};
//!
//! let (events, commands, source) = ManualSource::create("bench rig");
//! let monitor = FlowMonitor::new(
//!     Endpoints::default(),
//!     150.0,
//!     ThresholdPolicy::immediate(),
//!     Rounding::OnRecord,
//! )
//! .unwrap();
//! let app = App::new(Box::new(source), monitor, Theme::dark());
//! ```
//!
//! ### Live sources
//!
//! ```no_run
//! use drainwatch::{SamplerConfig, SourceControl, SourceHub, SourceTiming};
//!
//! # tokio_test::block_on(async {
//! let mut hub = SourceHub::start(
//!     SourceTiming::default(),
//!     SamplerConfig::new("http://192.168.0.77/api/data", 0),
//! )
//! .unwrap();
//! while let Some(event) = hub.poll() {
//!     println!("{:?}", event);
//! }
//! # });
//! ```

pub mod app;
pub mod data;
pub mod error;
pub mod events;
pub mod monitor;
pub mod settings;
pub mod source;
pub mod ui;

pub use app::{App, View};
pub use data::{
    BotState, Channel, DeviceStatus, Direction, FlowHistory, Reading, ReadingOrigin, Rounding,
    StatsSnapshot, ThresholdEngine, ThresholdPolicy, Transition, WarningState, Zone,
};
pub use error::{InvalidThreshold, SourceError};
pub use monitor::{Endpoints, FlowMonitor, MonitorEvent, ProbeRequest};
pub use settings::Settings;
pub use source::{
    EmbedOutcome, ManualSource, SamplerConfig, SourceControl, SourceEvent, SourceHub,
    SourceTiming,
};
pub use ui::Theme;
