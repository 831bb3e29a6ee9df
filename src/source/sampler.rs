//! Periodic flow sampler.
//!
//! One timer drives both strategies. On each tick the current configuration
//! is read once and exactly one strategy runs: the synthetic generator when
//! no flow URL is configured, otherwise a live fetch spawned as its own task
//! so a slow endpoint never delays the next tick.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::http::FlowEndpoint;
use super::synthetic::SyntheticFlow;
use super::SourceEvent;

/// Default sampling period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2_000);

/// What the sampler needs to know about the current configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Flow endpoint; blank means synthetic.
    pub flow_url: String,
    /// Configuration generation the samples are tagged with.
    pub generation: u64,
}

impl SamplerConfig {
    pub fn new(flow_url: impl Into<String>, generation: u64) -> Self {
        Self {
            flow_url: flow_url.into(),
            generation,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.flow_url.trim().is_empty()
    }
}

/// Which strategy a tick dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Synthetic,
    Live,
}

/// Timer-driven flow sampler.
#[derive(Debug)]
pub struct Sampler {
    interval: Duration,
    client: Client,
    config: watch::Receiver<SamplerConfig>,
    events: mpsc::Sender<SourceEvent>,
    synthetic: SyntheticFlow,
}

impl Sampler {
    pub fn new(
        interval: Duration,
        client: Client,
        config: watch::Receiver<SamplerConfig>,
        events: mpsc::Sender<SourceEvent>,
    ) -> Self {
        Self::with_generator(interval, client, config, events, SyntheticFlow::new())
    }

    pub fn with_generator(
        interval: Duration,
        client: Client,
        config: watch::Receiver<SamplerConfig>,
        events: mpsc::Sender<SourceEvent>,
        synthetic: SyntheticFlow,
    ) -> Self {
        Self {
            interval,
            client,
            config,
            events,
            synthetic,
        }
    }

    /// Run the sampler on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sampler started with a {:?} period", self.interval);

        loop {
            ticker.tick().await;
            if self.events.is_closed() {
                debug!("Sampler receiver dropped, stopping");
                break;
            }
            self.tick().await;
        }
    }

    /// Sample once. Synthetic readings are delivered before returning; live
    /// fetches are only dispatched.
    pub async fn tick(&mut self) -> Dispatch {
        let config = self.config.borrow_and_update().clone();

        if !config.is_live() {
            let reading = self.synthetic.sample(self.interval);
            let _ = self
                .events
                .send(SourceEvent::Sample {
                    generation: config.generation,
                    outcome: Ok(reading),
                })
                .await;
            return Dispatch::Synthetic;
        }

        let endpoint = FlowEndpoint::with_client(self.client.clone(), config.flow_url);
        let events = self.events.clone();
        let generation = config.generation;
        tokio::spawn(async move {
            let outcome = endpoint.fetch().await;
            let _ = events.send(SourceEvent::Sample { generation, outcome }).await;
        });
        Dispatch::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReadingOrigin;
    use crate::error::SourceError;
    use crate::source::test_server;

    fn client(timeout: Duration) -> Client {
        Client::builder().timeout(timeout).build().unwrap()
    }

    fn sampler(
        url: &str,
        timeout: Duration,
    ) -> (Sampler, watch::Sender<SamplerConfig>, mpsc::Receiver<SourceEvent>) {
        let (config_tx, config_rx) = watch::channel(SamplerConfig::new(url, 1));
        let (tx, rx) = mpsc::channel(16);
        let sampler = Sampler::with_generator(
            DEFAULT_INTERVAL,
            client(timeout),
            config_rx,
            tx,
            SyntheticFlow::seeded(1),
        );
        (sampler, config_tx, rx)
    }

    #[tokio::test]
    async fn test_blank_url_uses_synthetic() {
        let (mut sampler, _config, mut rx) = sampler("   ", DEFAULT_INTERVAL);

        assert_eq!(sampler.tick().await, Dispatch::Synthetic);

        match rx.recv().await.unwrap() {
            SourceEvent::Sample {
                generation,
                outcome: Ok(reading),
            } => {
                assert_eq!(generation, 1);
                assert_eq!(reading.origin, ReadingOrigin::Synthetic);
                assert!((60.0..=250.0).contains(&reading.flow_rate));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_live_success() {
        let url = test_server::serve(
            "200 OK",
            "application/json",
            r#"{"flowRate": 42.5, "totalVolume": 10.0}"#,
        )
        .await;
        let (mut sampler, _config, mut rx) = sampler(&url, Duration::from_secs(2));

        assert_eq!(sampler.tick().await, Dispatch::Live);

        match rx.recv().await.unwrap() {
            SourceEvent::Sample {
                outcome: Ok(reading),
                ..
            } => {
                assert_eq!(reading.flow_rate, 42.5);
                assert_eq!(reading.total_volume, Some(10.0));
                assert_eq!(reading.origin, ReadingOrigin::Live);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_live_http_error() {
        let url = test_server::serve("503 Service Unavailable", "text/plain", "busy").await;
        let (mut sampler, _config, mut rx) = sampler(&url, Duration::from_secs(2));

        sampler.tick().await;

        match rx.recv().await.unwrap() {
            SourceEvent::Sample {
                outcome: Err(err), ..
            } => assert_eq!(err, SourceError::HttpError(503)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_live_timeout_has_no_fallback() {
        let url = test_server::serve_hanging().await;
        let (mut sampler, _config, mut rx) = sampler(&url, Duration::from_millis(200));

        assert_eq!(sampler.tick().await, Dispatch::Live);

        match rx.recv().await.unwrap() {
            SourceEvent::Sample {
                outcome: Err(err), ..
            } => assert!(matches!(err, SourceError::EndpointUnreachable(_))),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reconfigure_switches_strategy() {
        let url = test_server::serve("200 OK", "application/json", r#"{"flowRate": 7}"#).await;
        let (mut sampler, config, mut rx) = sampler("", Duration::from_secs(2));

        assert_eq!(sampler.tick().await, Dispatch::Synthetic);
        rx.recv().await.unwrap();

        config.send(SamplerConfig::new(url, 2)).unwrap();
        assert_eq!(sampler.tick().await, Dispatch::Live);

        match rx.recv().await.unwrap() {
            SourceEvent::Sample {
                generation,
                outcome: Ok(reading),
            } => {
                assert_eq!(generation, 2);
                assert_eq!(reading.flow_rate, 7.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
