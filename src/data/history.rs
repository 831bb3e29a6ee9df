//! Rolling flow history and derived statistics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::reading::{round_tenth, Reading};

/// Maximum number of readings kept in the history buffer.
pub const MAX_HISTORY_SIZE: usize = 30;

/// When flow values are rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Round before storing; statistics operate on rounded values.
    #[default]
    OnRecord,
    /// Store raw values; round only when formatting for display.
    OnDisplay,
}

/// Statistics derived after each recorded reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Session minimum, `+inf` until the first reading.
    pub min: f64,
    /// Session maximum, `0` until the first reading.
    pub max: f64,
    /// Mean of the readings currently in the buffer.
    pub average: f64,
}

/// Bounded FIFO of recent readings plus running extrema.
///
/// Min and max cover the whole session; only the average is windowed to the
/// last [`MAX_HISTORY_SIZE`] readings.
#[derive(Debug, Clone)]
pub struct FlowHistory {
    readings: VecDeque<Reading>,
    min: f64,
    max: f64,
    rounding: Rounding,
}

impl Default for FlowHistory {
    fn default() -> Self {
        Self::new(Rounding::default())
    }
}

impl FlowHistory {
    /// Create an empty history.
    pub fn new(rounding: Rounding) -> Self {
        Self {
            readings: VecDeque::with_capacity(MAX_HISTORY_SIZE + 1),
            min: f64::INFINITY,
            max: 0.0,
            rounding,
        }
    }

    /// Record a reading and return the updated statistics.
    pub fn record(&mut self, reading: &Reading) -> StatsSnapshot {
        let value = match self.rounding {
            Rounding::OnRecord => round_tenth(reading.flow_rate),
            Rounding::OnDisplay => reading.flow_rate,
        };

        self.readings.push_back(reading.with_flow_rate(value));
        if self.readings.len() > MAX_HISTORY_SIZE {
            self.readings.pop_front();
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        self.stats()
    }

    /// Current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        let average = if self.readings.is_empty() {
            0.0
        } else {
            self.readings.iter().map(|r| r.flow_rate).sum::<f64>() / self.readings.len() as f64
        };

        StatsSnapshot {
            min: self.min,
            max: self.max,
            average,
        }
    }

    /// Forget everything, including the session extrema.
    pub fn reset(&mut self) {
        self.readings.clear();
        self.min = f64::INFINITY;
        self.max = 0.0;
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings in arrival order, oldest first.
    pub fn readings(&self) -> impl DoubleEndedIterator<Item = &Reading> + ExactSizeIterator {
        self.readings.iter()
    }

    /// Most recent reading, if any.
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    /// The last `n` readings, newest first.
    pub fn recent(&self, n: usize) -> Vec<&Reading> {
        self.readings.iter().rev().take(n).collect()
    }

    /// Get sparkline data (normalized to 0-7 for 8 bar levels).
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self) -> Vec<u8> {
        if self.readings.len() < 2 {
            return Vec::new();
        }

        let values: Vec<f64> = self.readings.iter().map(|r| r.flow_rate).collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = (max - min).max(f64::EPSILON);

        values
            .iter()
            .map(|&v| {
                let normalized = ((v - min) / range * 7.0) as u8;
                normalized.min(7)
            })
            .collect()
    }
}
