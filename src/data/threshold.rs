//! Clog detection: threshold comparison with optional debounce.
//!
//! The engine never reads the clock; callers pass `now`, which keeps the
//! debounce window deterministic under test.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Default sustained-condition window for the debounced policy.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5_000);

/// Fraction of the threshold at which the gauge turns amber.
const WARNING_BAND: f64 = 0.8;

/// Which side of the threshold indicates a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `flow > threshold` is bad (overflow / backed-up drain).
    Above,
    /// `flow < threshold` is bad (blocked drain, flow starved).
    Below,
}

impl Direction {
    /// Strict comparison: a flow exactly at the threshold is never bad.
    pub fn is_bad(self, flow: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => flow > threshold,
            Direction::Below => flow < threshold,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Above => "above-is-bad",
            Direction::Below => "below-is-bad",
        }
    }
}

/// Comparison direction plus debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    pub direction: Direction,
    /// Zero means immediate: no pending state at all.
    pub debounce: Duration,
}

impl ThresholdPolicy {
    /// `flow > threshold` raises Warning on the same evaluation.
    pub fn immediate() -> Self {
        Self {
            direction: Direction::Above,
            debounce: Duration::ZERO,
        }
    }

    /// `flow < threshold` must persist for the window before Warning.
    pub fn debounced(window: Duration) -> Self {
        Self {
            direction: Direction::Below,
            debounce: window,
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.debounce.is_zero()
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

/// Alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningState {
    Normal,
    /// Fault condition seen but not yet sustained for the debounce window.
    PendingWarning,
    Warning,
}

impl WarningState {
    pub fn label(&self) -> &'static str {
        match self {
            WarningState::Normal => "Normal",
            WarningState::PendingWarning => "Pending",
            WarningState::Warning => "Warning",
        }
    }
}

/// Edge-triggered state change. Emitted once per crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    EnteredWarning,
    ReturnedToNormal,
}

/// Three-colour gauge classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Zone {
    Normal,
    Warning,
    Danger,
}

impl Zone {
    /// Classify a flow against the threshold.
    ///
    /// Danger is the fault side of the threshold. Warning is the band within
    /// 20% of it on the healthy side.
    pub fn classify(flow: f64, threshold: f64, direction: Direction) -> Self {
        if direction.is_bad(flow, threshold) {
            return Zone::Danger;
        }
        let near = match direction {
            Direction::Above => flow > threshold * WARNING_BAND,
            Direction::Below => flow < threshold / WARNING_BAND,
        };
        if near {
            Zone::Warning
        } else {
            Zone::Normal
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Zone::Normal => "OK",
            Zone::Warning => "NEAR",
            Zone::Danger => "CLOG",
        }
    }
}

/// Normal/Warning state machine.
#[derive(Debug, Clone)]
pub struct ThresholdEngine {
    policy: ThresholdPolicy,
    state: WarningState,
    condition_since: Option<Instant>,
}

impl ThresholdEngine {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self {
            policy,
            state: WarningState::Normal,
            condition_since: None,
        }
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub fn state(&self) -> WarningState {
        self.state
    }

    /// When a pending fault condition began. Cleared once it escalates.
    pub fn condition_since(&self) -> Option<Instant> {
        self.condition_since
    }

    pub fn is_warning(&self) -> bool {
        self.state == WarningState::Warning
    }

    /// Time left before a pending condition escalates.
    pub fn remaining_debounce(&self, now: Instant) -> Option<Duration> {
        if self.state != WarningState::PendingWarning {
            return None;
        }
        let since = self.condition_since?;
        Some(self.policy.debounce.saturating_sub(now.saturating_duration_since(since)))
    }

    /// Evaluate one flow value. Returns a transition only on a state edge.
    pub fn evaluate(&mut self, flow: f64, threshold: f64, now: Instant) -> Option<Transition> {
        if !self.policy.direction.is_bad(flow, threshold) {
            self.condition_since = None;
            let was_warning = self.state == WarningState::Warning;
            self.state = WarningState::Normal;
            return was_warning.then_some(Transition::ReturnedToNormal);
        }

        if self.state == WarningState::Warning {
            return None;
        }

        if self.policy.is_immediate() {
            self.state = WarningState::Warning;
            return Some(Transition::EnteredWarning);
        }

        let since = *self.condition_since.get_or_insert(now);
        if now.saturating_duration_since(since) >= self.policy.debounce {
            self.state = WarningState::Warning;
            self.condition_since = None;
            Some(Transition::EnteredWarning)
        } else {
            self.state = WarningState::PendingWarning;
            None
        }
    }

    /// Back to Normal with no pending condition, without emitting a transition.
    pub fn reset(&mut self) {
        self.state = WarningState::Normal;
        self.condition_since = None;
    }
}
