//! Flow, camera and bot sources.
//!
//! Sources run as tokio tasks and never touch dashboard state. They report
//! through [`SourceEvent`]s, which the owner of the
//! [`FlowMonitor`](crate::FlowMonitor) drains and applies.

pub mod embed;
pub mod http;
mod manual;
pub mod sampler;
pub mod synthetic;

#[cfg(test)]
mod test_server;

pub use embed::EmbedOutcome;
pub use http::FlowEndpoint;
pub use manual::{ManualSource, SourceCommand};
pub use sampler::{Sampler, SamplerConfig};
pub use synthetic::SyntheticFlow;

use std::fmt::Debug;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::data::{Channel, Reading};
use crate::error::SourceError;
use crate::monitor::ProbeRequest;

/// Capacity of the event channel between tasks and the monitor owner.
const EVENT_BUFFER: usize = 64;

/// Something a source task observed.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// One sampler cycle on the flow channel.
    Sample {
        generation: u64,
        outcome: Result<Reading, SourceError>,
    },
    /// A camera or bot probe finished (or was assumed finished).
    Embed {
        channel: Channel,
        generation: u64,
        outcome: EmbedOutcome,
    },
}

/// Seam between the dashboard and its sources.
///
/// [`SourceHub`] is the real implementation. [`ManualSource`] lets tests and
/// demos push events by hand.
pub trait SourceControl: Send + Debug {
    /// Next pending event, without blocking.
    fn poll(&mut self) -> Option<SourceEvent>;

    /// Point the sampler at a new flow URL (blank for synthetic).
    fn reconfigure(&mut self, flow_url: &str, generation: u64);

    /// Start a camera or bot probe.
    fn probe(&mut self, request: ProbeRequest);

    /// Human-readable description for the status bar.
    fn description(&self) -> &str;
}

/// Timing knobs for [`SourceHub`].
#[derive(Debug, Clone, Copy)]
pub struct SourceTiming {
    pub update_interval: Duration,
    pub request_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for SourceTiming {
    fn default() -> Self {
        Self {
            update_interval: sampler::DEFAULT_INTERVAL,
            request_timeout: http::DEFAULT_TIMEOUT,
            settle_delay: embed::DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Owns the sampler task and spawns probes. Must be created inside a tokio
/// runtime context.
#[derive(Debug)]
pub struct SourceHub {
    client: Client,
    timing: SourceTiming,
    config: watch::Sender<SamplerConfig>,
    events_tx: mpsc::Sender<SourceEvent>,
    events_rx: mpsc::Receiver<SourceEvent>,
    sampler: JoinHandle<()>,
    description: String,
}

impl SourceHub {
    /// Start sampling `initial` immediately.
    pub fn start(timing: SourceTiming, initial: SamplerConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timing.request_timeout)
            .build()
            .map_err(|e| SourceError::EndpointUnreachable(e.to_string()))?;

        let description = describe(&initial.flow_url);
        let (config, config_rx) = watch::channel(initial);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let sampler =
            Sampler::new(timing.update_interval, client.clone(), config_rx, events_tx.clone())
                .spawn();

        Ok(Self {
            client,
            timing,
            config,
            events_tx,
            events_rx,
            sampler,
            description,
        })
    }

    pub fn timing(&self) -> SourceTiming {
        self.timing
    }
}

impl SourceControl for SourceHub {
    fn poll(&mut self) -> Option<SourceEvent> {
        self.events_rx.try_recv().ok()
    }

    fn reconfigure(&mut self, flow_url: &str, generation: u64) {
        self.description = describe(flow_url);
        self.config.send_replace(SamplerConfig::new(flow_url, generation));
    }

    fn probe(&mut self, request: ProbeRequest) {
        let client = self.client.clone();
        let events = self.events_tx.clone();
        match request.channel {
            Channel::BotCamera => {
                tokio::spawn(embed::probe_bot(
                    client,
                    request.url,
                    request.generation,
                    self.timing.settle_delay,
                    events,
                ));
            }
            Channel::DrainCamera => {
                tokio::spawn(embed::probe_camera(client, request.url, request.generation, events));
            }
            // The flow meter is sampled, never probed.
            Channel::FlowMeter => debug!("Ignoring probe request for the flow meter"),
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for SourceHub {
    fn drop(&mut self) {
        self.sampler.abort();
    }
}

fn describe(flow_url: &str) -> String {
    if flow_url.trim().is_empty() {
        "synthetic flow".to_string()
    } else {
        format!("http: {}", flow_url.trim())
    }
}

/// `host[:port]` of a URL for labels; the input itself if it does not parse.
pub fn extract_hostname(url: &str) -> String {
    match reqwest::Url::parse(url.trim()) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hostname() {
        assert_eq!(extract_hostname("http://192.168.0.110/stream"), "192.168.0.110");
        assert_eq!(extract_hostname("http://cam.local:8080/bot"), "cam.local:8080");
        assert_eq!(extract_hostname("not a url"), "not a url");
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(""), "synthetic flow");
        assert_eq!(describe(" http://x/api "), "http: http://x/api");
    }

    #[tokio::test]
    async fn test_hub_delivers_synthetic_samples() {
        let timing = SourceTiming {
            update_interval: Duration::from_millis(20),
            ..SourceTiming::default()
        };
        let mut hub = SourceHub::start(timing, SamplerConfig::new("", 0)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut samples = 0;
        while let Some(event) = hub.poll() {
            assert!(matches!(event, SourceEvent::Sample { outcome: Ok(_), .. }));
            samples += 1;
        }
        assert!(samples >= 2, "samples = {samples}");
    }

    #[tokio::test]
    async fn test_flow_meter_probe_requests_are_dropped() {
        let timing = SourceTiming {
            update_interval: Duration::from_secs(60),
            ..SourceTiming::default()
        };
        let mut hub = SourceHub::start(timing, SamplerConfig::new("", 0)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        while hub.poll().is_some() {}

        hub.probe(ProbeRequest {
            channel: Channel::FlowMeter,
            url: "http://127.0.0.1:1/api/data".to_string(),
            generation: 0,
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(hub.poll().is_none());
    }
}
