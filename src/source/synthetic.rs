//! Synthetic flow generator used when no flow endpoint is configured.
//!
//! A bounded random walk with a slowly changing trend and occasional spikes.
//! One generator lives for the whole process; it is never reseeded.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::{Reading, ReadingOrigin};

const INITIAL_BASE_FLOW: f64 = 120.0;
const INITIAL_TREND: f64 = 1.0;
const MIN_BASE_FLOW: f64 = 60.0;
const MAX_BASE_FLOW: f64 = 200.0;
const NOISE_AMPLITUDE: f64 = 5.0;
const TREND_CHANGE_PROBABILITY: f64 = 0.05;
const SPIKE_PROBABILITY: f64 = 0.10;
const SPIKE_HEIGHT: f64 = 50.0;

/// Lowest value the generator can emit.
pub const SYNTHETIC_MIN: f64 = MIN_BASE_FLOW;
/// Highest value the generator can emit (max base plus a spike).
pub const SYNTHETIC_MAX: f64 = MAX_BASE_FLOW + SPIKE_HEIGHT;

/// Random-walk flow generator.
#[derive(Debug, Clone)]
pub struct SyntheticFlow<R = StdRng> {
    rng: R,
    base_flow: f64,
    trend: f64,
    total_volume: f64,
}

impl SyntheticFlow<StdRng> {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic generator for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for SyntheticFlow<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SyntheticFlow<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            base_flow: INITIAL_BASE_FLOW,
            trend: INITIAL_TREND,
            total_volume: 0.0,
        }
    }

    pub fn base_flow(&self) -> f64 {
        self.base_flow
    }

    /// Advance the walk by one tick and return the emitted flow in L/min.
    pub fn next_flow(&mut self) -> f64 {
        self.base_flow += self.rng.random_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE) + self.trend;

        if self.rng.random_bool(TREND_CHANGE_PROBABILITY) {
            self.trend = self.rng.random_range(-1.0..1.0);
        }

        self.base_flow = self.base_flow.clamp(MIN_BASE_FLOW, MAX_BASE_FLOW);

        if self.rng.random_bool(SPIKE_PROBABILITY) {
            self.base_flow + SPIKE_HEIGHT
        } else {
            self.base_flow
        }
    }

    /// Produce a reading for a tick of length `elapsed`.
    ///
    /// Volume integrates flow over the tick, so it never decreases.
    pub fn sample(&mut self, elapsed: Duration) -> Reading {
        let flow = self.next_flow();
        self.total_volume += flow / 60.0 * elapsed.as_secs_f64();
        Reading::new(flow, Some(self.total_volume), ReadingOrigin::Synthetic)
    }
}
