//! A single flow-rate sample.

use std::time::{Instant, SystemTime};

use serde::Serialize;

/// Where a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingOrigin {
    /// Fetched from the configured flow endpoint.
    Live,
    /// Produced by the synthetic generator (no endpoint configured).
    Synthetic,
}

/// One timestamped flow sample. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Flow rate in L/min, never negative.
    pub flow_rate: f64,
    /// Cumulative volume in litres, if the source reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_volume: Option<f64>,
    /// Wall-clock capture time, for logs and exports.
    pub captured_at: SystemTime,
    /// Monotonic capture time, for debounce arithmetic.
    #[serde(skip)]
    pub instant: Instant,
    pub origin: ReadingOrigin,
}

impl Reading {
    /// Create a reading captured now.
    pub fn new(flow_rate: f64, total_volume: Option<f64>, origin: ReadingOrigin) -> Self {
        Self {
            flow_rate: flow_rate.max(0.0),
            total_volume,
            captured_at: SystemTime::now(),
            instant: Instant::now(),
            origin,
        }
    }

    /// Copy of this reading with the flow rate replaced.
    pub fn with_flow_rate(&self, flow_rate: f64) -> Self {
        Self {
            flow_rate,
            ..self.clone()
        }
    }
}

/// Round to one decimal place, the precision every display uses.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(42.46), 42.5);
        assert_eq!(round_tenth(42.44), 42.4);
        assert_eq!(round_tenth(120.0), 120.0);
    }

    #[test]
    fn test_negative_flow_is_clamped() {
        let reading = Reading::new(-3.0, None, ReadingOrigin::Live);
        assert_eq!(reading.flow_rate, 0.0);
    }
}
