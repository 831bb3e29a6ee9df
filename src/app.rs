//! Application state and operator actions.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use crate::data::{BotState, Channel, Transition};
use crate::monitor::{Endpoints, FlowMonitor, MonitorEvent};
use crate::source::SourceControl;
use crate::ui::Theme;

/// How long a status message stays on screen.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Threshold step for `+`/`-`.
pub const THRESHOLD_STEP: f64 = 5.0;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Flow gauge, statistics, trend and alert banner.
    Dashboard,
    /// Flow meter, drain camera and bot camera status.
    Devices,
    /// Most recent readings, newest first.
    Log,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Dashboard => View::Devices,
            View::Devices => View::Log,
            View::Log => View::Dashboard,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Dashboard => View::Log,
            View::Devices => View::Dashboard,
            View::Log => View::Devices,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Devices => "Devices",
            View::Log => "Log",
        }
    }
}

/// Endpoint editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigForm {
    /// Flow, camera and bot URL, in that order.
    pub fields: [String; 3],
    pub focused: usize,
}

impl ConfigForm {
    pub const LABELS: [&'static str; 3] =
        ["Flow meter URL", "Drain camera URL", "Bot interface URL"];

    pub fn from_endpoints(endpoints: &Endpoints) -> Self {
        Self {
            fields: [
                endpoints.flow_url.clone(),
                endpoints.camera_url.clone(),
                endpoints.bot_url.clone(),
            ],
            focused: 0,
        }
    }

    pub fn to_endpoints(&self) -> Endpoints {
        Endpoints {
            flow_url: self.fields[0].clone(),
            camera_url: self.fields[1].clone(),
            bot_url: self.fields[2].clone(),
        }
        .normalized()
    }

    pub fn restore_defaults(&mut self) {
        *self = Self::from_endpoints(&Endpoints::factory_defaults());
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push(&mut self, c: char) {
        self.fields[self.focused].push(c);
    }

    pub fn pop(&mut self) {
        self.fields[self.focused].pop();
    }

    pub fn clear_field(&mut self) {
        self.fields[self.focused].clear();
    }
}

/// What keystrokes currently edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing a new threshold value.
    Threshold(String),
    /// Editing endpoint URLs.
    Config(ConfigForm),
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub input: InputMode,

    source: Box<dyn SourceControl>,
    pub monitor: FlowMonitor,

    /// Alert banner hidden by the operator; cleared on the next Warning edge.
    pub alert_dismissed: bool,
    pub samples_seen: u64,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app and start probes for the initial configuration.
    pub fn new(source: Box<dyn SourceControl>, monitor: FlowMonitor, theme: Theme) -> Self {
        let mut app = Self {
            running: true,
            current_view: View::Dashboard,
            show_help: false,
            input: InputMode::Normal,
            source,
            monitor,
            alert_dismissed: false,
            samples_seen: 0,
            theme,
            status_message: None,
        };
        for request in app.monitor.probe_requests() {
            app.source.probe(request);
        }
        app
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Current status message, if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Drain pending source events into the monitor. Returns how many events
    /// were applied.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        while let Some(event) = self.source.poll() {
            applied += 1;
            for outcome in self.monitor.apply(event, now) {
                self.on_monitor_event(outcome);
            }
        }
        applied
    }

    fn on_monitor_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Reading(_) => self.samples_seen += 1,
            MonitorEvent::Transition(transition) => self.on_transition(transition),
            MonitorEvent::SourceFailed { .. } | MonitorEvent::DeviceChanged { .. } => {}
        }
    }

    fn on_transition(&mut self, transition: Transition) {
        match transition {
            Transition::EnteredWarning => {
                self.alert_dismissed = false;
                self.set_status_message("Clog warning: flow crossed threshold".to_string());
            }
            Transition::ReturnedToNormal => {
                self.set_status_message("Flow back to normal".to_string());
            }
        }
    }

    /// Whether the warning banner should be drawn.
    pub fn alert_visible(&self) -> bool {
        self.monitor.warning_active() && !self.alert_dismissed
    }

    pub fn dismiss_alert(&mut self) {
        if self.monitor.warning_active() {
            self.alert_dismissed = true;
        }
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn adjust_threshold(&mut self, delta: f64) {
        if let Some(transition) = self.monitor.adjust_threshold(delta, Instant::now()) {
            self.on_transition(transition);
        }
        self.set_status_message(format!("Threshold: {} L/min", self.monitor.threshold()));
    }

    pub fn start_threshold_input(&mut self) {
        self.input = InputMode::Threshold(String::new());
    }

    /// Parse and apply the typed threshold. Invalid input leaves the current
    /// threshold untouched.
    pub fn commit_threshold(&mut self) {
        let InputMode::Threshold(text) = std::mem::replace(&mut self.input, InputMode::Normal)
        else {
            return;
        };
        let parsed = text.trim().parse::<f64>();
        let result = match parsed {
            Ok(value) => self
                .monitor
                .set_threshold(value, Instant::now())
                .map_err(|e| e.to_string()),
            Err(_) => Err(format!("not a number: {:?}", text.trim())),
        };
        match result {
            Ok(transition) => {
                if let Some(t) = transition {
                    self.on_transition(t);
                }
                self.set_status_message(format!("Threshold: {} L/min", self.monitor.threshold()));
            }
            Err(e) => self.set_status_message(format!("Invalid threshold: {}", e)),
        }
    }

    pub fn open_config(&mut self) {
        self.input = InputMode::Config(ConfigForm::from_endpoints(self.monitor.endpoints()));
    }

    pub fn cancel_input(&mut self) {
        self.input = InputMode::Normal;
    }

    /// Apply the endpoint form: reconfigure the monitor, retarget the
    /// sampler and re-probe the embeds.
    pub fn apply_config(&mut self) {
        let InputMode::Config(form) = std::mem::replace(&mut self.input, InputMode::Normal) else {
            return;
        };
        self.apply_endpoints(form.to_endpoints());
    }

    pub fn apply_endpoints(&mut self, endpoints: Endpoints) {
        let generation = self.monitor.reconfigure(endpoints);
        let flow_url = self.monitor.endpoints().flow_url.clone();
        self.source.reconfigure(&flow_url, generation);
        for request in self.monitor.probe_requests() {
            self.source.probe(request);
        }

        let mocks = self.monitor.endpoints().mock_channels();
        let message = if mocks.is_empty() {
            "Configuration applied".to_string()
        } else {
            let names: Vec<&str> = mocks.iter().map(|c| c.label()).collect();
            format!("Configuration applied; mock mode: {}", names.join(", "))
        };
        self.set_status_message(message);
    }

    /// Deploy the bot when docked, return it when deployed.
    pub fn toggle_bot(&mut self) {
        let state = self.monitor.toggle_bot();
        if state == BotState::Deployed {
            if let Some(request) = self.monitor.bot_probe() {
                self.source.probe(request);
            }
            self.set_status_message("Bot deployed".to_string());
        } else {
            self.set_status_message("Bot returning to dock".to_string());
        }
    }

    /// Show where the bot's control interface lives.
    pub fn show_bot_interface(&mut self) {
        let message = if self.monitor.bot_state() != BotState::Deployed {
            "Bot is docked; deploy it first (d)".to_string()
        } else if self.monitor.endpoints().is_configured(Channel::BotCamera) {
            format!("Bot interface: {}", self.monitor.endpoints().bot_url)
        } else {
            "Bot interface not configured (mock)".to_string()
        };
        self.set_status_message(message);
    }

    /// Write a JSON snapshot of the dashboard.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        export_snapshot(&self.monitor, path)
    }
}

/// Write the monitor's snapshot as pretty JSON.
pub fn export_snapshot(monitor: &FlowMonitor, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&monitor.snapshot())?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!("Exported dashboard to {}", path.display());
    Ok(())
}
