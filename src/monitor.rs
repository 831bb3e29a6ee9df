//! The dashboard controller.
//!
//! [`FlowMonitor`] is the single owner of all dashboard state: the history
//! buffer, the threshold engine, the device registry and the bot lifecycle.
//! Source tasks only ever produce [`SourceEvent`]s; whoever owns the monitor
//! applies them, so no state is shared between tasks.

use std::time::{Instant, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{
    round_tenth, BotLifecycle, BotState, Channel, DeviceRegistry, DeviceStatus, FlowHistory,
    Reading, ReadingOrigin, Rounding, StatsSnapshot, ThresholdEngine, ThresholdPolicy,
    Transition, WarningState, Zone,
};
use crate::error::{InvalidThreshold, SourceError};
use crate::source::{EmbedOutcome, SourceEvent};

/// Flow value that fills the gauge.
pub const GAUGE_MAX: f64 = 250.0;

/// Number of readings in the log view.
pub const LOG_LENGTH: usize = 10;

/// Operator-editable endpoint URLs. A blank URL means mock mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Endpoints {
    pub flow_url: String,
    pub camera_url: String,
    pub bot_url: String,
}

impl Endpoints {
    /// Addresses of the reference hardware on the site network.
    pub fn factory_defaults() -> Self {
        Self {
            flow_url: "http://192.168.0.77/api/data".to_string(),
            camera_url: "http://192.168.0.110/stream".to_string(),
            bot_url: "http://192.168.0.110/bot/stream".to_string(),
        }
    }

    /// Same endpoints with surrounding whitespace removed.
    pub fn normalized(self) -> Self {
        Self {
            flow_url: self.flow_url.trim().to_string(),
            camera_url: self.camera_url.trim().to_string(),
            bot_url: self.bot_url.trim().to_string(),
        }
    }

    pub fn url(&self, channel: Channel) -> &str {
        match channel {
            Channel::FlowMeter => &self.flow_url,
            Channel::DrainCamera => &self.camera_url,
            Channel::BotCamera => &self.bot_url,
        }
    }

    pub fn is_configured(&self, channel: Channel) -> bool {
        !self.url(channel).trim().is_empty()
    }

    /// Channels left in mock mode.
    pub fn mock_channels(&self) -> Vec<Channel> {
        Channel::ALL.into_iter().filter(|c| !self.is_configured(*c)).collect()
    }
}

/// A probe the monitor wants started on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub channel: Channel,
    pub url: String,
    pub generation: u64,
}

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Reading(Reading),
    Transition(Transition),
    SourceFailed { channel: Channel, error: SourceError },
    DeviceChanged { channel: Channel, status: DeviceStatus },
}

/// Min/avg/max formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayStats {
    pub min: String,
    pub average: String,
    pub max: String,
}

/// Last source failure, kept for the status bar.
#[derive(Debug, Clone, PartialEq)]
pub struct LastError {
    pub channel: Channel,
    pub error: SourceError,
    pub at: SystemTime,
}

/// Dashboard controller. See the module docs.
#[derive(Debug)]
pub struct FlowMonitor {
    endpoints: Endpoints,
    threshold: f64,
    history: FlowHistory,
    engine: ThresholdEngine,
    devices: DeviceRegistry,
    bot: BotLifecycle,
    total_volume: Option<f64>,
    generation: u64,
    bot_session: u64,
    last_error: Option<LastError>,
}

impl FlowMonitor {
    pub fn new(
        endpoints: Endpoints,
        threshold: f64,
        policy: ThresholdPolicy,
        rounding: Rounding,
    ) -> Result<Self, InvalidThreshold> {
        validate_threshold(threshold)?;
        Ok(Self {
            endpoints: endpoints.normalized(),
            threshold,
            history: FlowHistory::new(rounding),
            engine: ThresholdEngine::new(policy),
            devices: DeviceRegistry::new(),
            bot: BotLifecycle::new(),
            total_volume: None,
            generation: 0,
            bot_session: 0,
            last_error: None,
        })
    }

    /// Apply one source event. Events tagged with a superseded configuration
    /// are dropped.
    pub fn apply(&mut self, event: SourceEvent, now: Instant) -> Vec<MonitorEvent> {
        match event {
            SourceEvent::Sample {
                generation,
                outcome,
            } => self.apply_sample(generation, outcome, now),
            SourceEvent::Embed {
                channel,
                generation,
                outcome,
            } => self.apply_embed(channel, generation, outcome),
        }
    }

    /// Apply one sampler cycle: a reading or a fetch failure.
    pub fn apply_sample(
        &mut self,
        generation: u64,
        outcome: Result<Reading, SourceError>,
        now: Instant,
    ) -> Vec<MonitorEvent> {
        if generation != self.generation {
            debug!(
                "Dropping sample from configuration {} (current {})",
                generation, self.generation
            );
            return Vec::new();
        }
        match outcome {
            Ok(reading) => self.record_reading(reading, now),
            Err(error) => self.record_flow_failure(error),
        }
    }

    /// Feed a reading through statistics and the threshold engine.
    pub fn record_reading(&mut self, reading: Reading, now: Instant) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        let status = match reading.origin {
            ReadingOrigin::Live => DeviceStatus {
                using_real_data: true,
                connected: true,
            },
            ReadingOrigin::Synthetic => DeviceStatus::default(),
        };
        self.update_device(Channel::FlowMeter, status, &mut events);

        self.history.record(&reading);
        if let Some(volume) = reading.total_volume {
            self.total_volume = Some(volume);
        }

        let Some(stored) = self.history.latest().cloned() else {
            return events;
        };
        debug!("Flow {} L/min ({:?})", stored.flow_rate, stored.origin);

        let flow = stored.flow_rate;
        events.push(MonitorEvent::Reading(stored));

        if let Some(transition) = self.engine.evaluate(flow, self.threshold, now) {
            self.log_transition(transition, flow);
            events.push(MonitorEvent::Transition(transition));
        }

        events
    }

    fn record_flow_failure(&mut self, error: SourceError) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        let previous = self.devices.status(Channel::FlowMeter);
        let status = DeviceStatus {
            using_real_data: true,
            connected: false,
        };

        if previous != status {
            warn!(
                "Flow meter error ({}): {}",
                self.endpoints.flow_url, error
            );
        } else {
            debug!("Flow meter still failing: {}", error);
        }
        self.update_device(Channel::FlowMeter, status, &mut events);
        self.note_failure(Channel::FlowMeter, error, &mut events);
        events
    }

    /// Record a camera or bot probe outcome.
    pub fn apply_embed(
        &mut self,
        channel: Channel,
        generation: u64,
        outcome: EmbedOutcome,
    ) -> Vec<MonitorEvent> {
        let current = match channel {
            Channel::DrainCamera => generation == self.generation,
            Channel::BotCamera => generation == self.bot_session && self.bot.is_deployed(),
            Channel::FlowMeter => false,
        };
        if !current || !self.endpoints.is_configured(channel) {
            debug!("Ignoring stale {} probe result", channel.label());
            return Vec::new();
        }

        let mut events = Vec::new();
        match outcome {
            EmbedOutcome::Loaded | EmbedOutcome::AssumedLoaded => {
                info!("{} loaded: {}", channel.label(), self.endpoints.url(channel));
                let status = DeviceStatus {
                    using_real_data: true,
                    connected: true,
                };
                self.update_device(channel, status, &mut events);
            }
            EmbedOutcome::Failed(error) => {
                warn!(
                    "{} connection failed ({}): {}",
                    channel.label(),
                    self.endpoints.url(channel),
                    error
                );
                let status = DeviceStatus {
                    using_real_data: true,
                    connected: false,
                };
                self.update_device(channel, status, &mut events);
                self.note_failure(channel, error, &mut events);
            }
        }
        events
    }

    fn update_device(
        &mut self,
        channel: Channel,
        status: DeviceStatus,
        events: &mut Vec<MonitorEvent>,
    ) {
        if self.devices.status(channel) != status {
            self.devices.set_status(channel, status.connected, status.using_real_data);
            events.push(MonitorEvent::DeviceChanged { channel, status });
        }
    }

    fn note_failure(
        &mut self,
        channel: Channel,
        error: SourceError,
        events: &mut Vec<MonitorEvent>,
    ) {
        self.last_error = Some(LastError {
            channel,
            error: error.clone(),
            at: SystemTime::now(),
        });
        events.push(MonitorEvent::SourceFailed { channel, error });
    }

    fn log_transition(&self, transition: Transition, flow: f64) {
        match transition {
            Transition::EnteredWarning => warn!(
                "WARNING: flow {} L/min crossed threshold {} ({})",
                flow,
                self.threshold,
                self.engine.policy().direction.label()
            ),
            Transition::ReturnedToNormal => {
                info!("Flow {} L/min returned to normal", flow)
            }
        }
    }

    /// Change the threshold and re-evaluate the current reading right away.
    pub fn set_threshold(
        &mut self,
        threshold: f64,
        now: Instant,
    ) -> Result<Option<Transition>, InvalidThreshold> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        info!("Threshold set to {} L/min", threshold);

        let Some(flow) = self.current_flow() else {
            return Ok(None);
        };
        let transition = self.engine.evaluate(flow, threshold, now);
        if let Some(t) = transition {
            self.log_transition(t, flow);
        }
        Ok(transition)
    }

    /// Nudge the threshold, never below zero.
    pub fn adjust_threshold(&mut self, delta: f64, now: Instant) -> Option<Transition> {
        let target = (self.threshold + delta).max(0.0);
        self.set_threshold(target, now).ok().flatten()
    }

    /// Replace the endpoints. Every device status drops to `{false, false}`
    /// until re-derived; history and alarm state restart when the flow URL
    /// changes. Returns the new configuration generation.
    pub fn reconfigure(&mut self, endpoints: Endpoints) -> u64 {
        let endpoints = endpoints.normalized();
        let flow_changed = endpoints.flow_url != self.endpoints.flow_url;

        self.endpoints = endpoints;
        self.generation += 1;
        self.bot_session += 1;
        self.devices.reset_all();
        self.last_error = None;

        if flow_changed {
            self.history.reset();
            self.engine.reset();
            self.total_volume = None;
        }

        let mocks: Vec<&str> = self.endpoints.mock_channels().iter().map(|c| c.label()).collect();
        info!(
            "Configuration {} applied (mock: {})",
            self.generation,
            if mocks.is_empty() { "none".to_string() } else { mocks.join(", ") }
        );
        self.generation
    }

    /// Probes needed for the current configuration: the drain camera when
    /// configured, and the bot interface while deployed.
    pub fn probe_requests(&self) -> Vec<ProbeRequest> {
        let mut requests = Vec::new();
        if self.endpoints.is_configured(Channel::DrainCamera) {
            requests.push(ProbeRequest {
                channel: Channel::DrainCamera,
                url: self.endpoints.camera_url.clone(),
                generation: self.generation,
            });
        }
        if let Some(request) = self.bot_probe() {
            requests.push(request);
        }
        requests
    }

    /// Probe for the bot interface, if deployed and configured.
    pub fn bot_probe(&self) -> Option<ProbeRequest> {
        if !self.bot.is_deployed() || !self.endpoints.is_configured(Channel::BotCamera) {
            return None;
        }
        Some(ProbeRequest {
            channel: Channel::BotCamera,
            url: self.endpoints.bot_url.clone(),
            generation: self.bot_session,
        })
    }

    /// Send the bot out. Returns `false` if it was already deployed.
    pub fn deploy_bot(&mut self) -> bool {
        if !self.bot.deploy() {
            debug!("Deploy ignored: bot already deployed");
            return false;
        }
        self.bot_session += 1;
        let committed = self.endpoints.is_configured(Channel::BotCamera);
        self.devices.set_status(Channel::BotCamera, false, committed);
        info!("Deploying cleaning bot");
        true
    }

    /// Bring the bot back. Returns `false` if it was already docked.
    pub fn return_bot(&mut self) -> bool {
        if !self.bot.return_to_dock() {
            debug!("Return ignored: bot already docked");
            return false;
        }
        self.bot_session += 1;
        let committed = self.endpoints.is_configured(Channel::BotCamera);
        self.devices.set_status(Channel::BotCamera, false, committed);
        info!("Returning bot to dock");
        true
    }

    /// Deploy when docked, return when deployed.
    pub fn toggle_bot(&mut self) -> BotState {
        if self.bot.is_deployed() {
            self.return_bot();
        } else {
            self.deploy_bot();
        }
        self.bot.state()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.engine.policy()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn history(&self) -> &FlowHistory {
        &self.history
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.history.latest()
    }

    pub fn current_flow(&self) -> Option<f64> {
        self.history.latest().map(|r| r.flow_rate)
    }

    pub fn total_volume(&self) -> Option<f64> {
        self.total_volume
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.history.stats()
    }

    pub fn warning_state(&self) -> WarningState {
        self.engine.state()
    }

    pub fn warning_active(&self) -> bool {
        self.engine.is_warning()
    }

    pub fn engine(&self) -> &ThresholdEngine {
        &self.engine
    }

    /// Time left before a pending fault escalates to Warning.
    pub fn remaining_debounce(&self, now: Instant) -> Option<std::time::Duration> {
        self.engine.remaining_debounce(now)
    }

    pub fn bot_state(&self) -> BotState {
        self.bot.state()
    }

    pub fn device(&self, channel: Channel) -> DeviceStatus {
        self.devices.status(channel)
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Gauge fill, 0-100.
    pub fn gauge_percent(&self) -> f64 {
        self.current_flow().map_or(0.0, |flow| (flow / GAUGE_MAX * 100.0).min(100.0))
    }

    /// Gauge colour zone; `None` before the first reading.
    pub fn zone(&self) -> Option<Zone> {
        let flow = self.current_flow()?;
        Some(Zone::classify(flow, self.threshold, self.engine.policy().direction))
    }

    pub fn display_stats(&self) -> DisplayStats {
        let stats = self.stats();
        let empty = self.history.is_empty();
        let show = |value: f64| {
            if empty || !value.is_finite() {
                "-".to_string()
            } else {
                format_flow(value)
            }
        };
        DisplayStats {
            min: show(stats.min),
            average: show(stats.average),
            max: show(stats.max),
        }
    }

    /// The last `n` readings, newest first.
    pub fn recent_log(&self, n: usize) -> Vec<&Reading> {
        self.history.recent(n)
    }

    /// Serializable view of the dashboard for export.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            exported_at: SystemTime::now(),
            endpoints: self.endpoints.clone(),
            threshold: self.threshold,
            direction: self.engine.policy().direction.label(),
            debounce_ms: self.engine.policy().debounce.as_millis() as u64,
            current_flow: self.current_flow(),
            total_volume: self.total_volume,
            gauge_percent: self.gauge_percent(),
            zone: self.zone(),
            warning: self.engine.state(),
            stats: self.display_stats(),
            bot: self.bot.state(),
            devices: self
                .devices
                .iter()
                .map(|(channel, status)| DeviceEntry { channel, status })
                .collect(),
            log: self.recent_log(LOG_LENGTH).into_iter().cloned().collect(),
        }
    }
}

/// Export format.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub exported_at: SystemTime,
    pub endpoints: Endpoints,
    pub threshold: f64,
    pub direction: &'static str,
    pub debounce_ms: u64,
    pub current_flow: Option<f64>,
    pub total_volume: Option<f64>,
    pub gauge_percent: f64,
    pub zone: Option<Zone>,
    pub warning: WarningState,
    pub stats: DisplayStats,
    pub bot: BotState,
    pub devices: Vec<DeviceEntry>,
    pub log: Vec<Reading>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceEntry {
    pub channel: Channel,
    #[serde(flatten)]
    pub status: DeviceStatus,
}

/// "42.5 L/min"
pub fn format_flow(value: f64) -> String {
    format!("{} L/min", round_tenth(value))
}

fn validate_threshold(threshold: f64) -> Result<(), InvalidThreshold> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(InvalidThreshold(threshold))
    }
}
