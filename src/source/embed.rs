//! Best-effort health probes for the camera stream and bot interface.
//!
//! These are approximate: a camera counts as loaded once a 2xx response head
//! arrives (MJPEG bodies never end, so the body is not read). The bot
//! interface follows frame semantics: success is assumed after a settle
//! delay unless an explicit failure shows up first. A failure that arrives
//! after the assumed success is still reported.

use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use super::SourceEvent;
use crate::data::Channel;
use crate::error::SourceError;

/// Default settle delay before a frame embed is assumed loaded.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Result of one embed probe.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedOutcome {
    /// The feed answered.
    Loaded,
    /// No error within the settle delay.
    AssumedLoaded,
    Failed(SourceError),
}

/// Request the feed and wait only for the response head.
pub async fn probe_feed(client: &Client, url: &str) -> Result<(), SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::EmbedLoadFailure(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(SourceError::EmbedLoadFailure(format!(
            "{} answered {}",
            url,
            response.status()
        )))
    }
}

/// Probe a camera stream and report the outcome once.
pub async fn probe_camera(
    client: Client,
    url: String,
    generation: u64,
    events: mpsc::Sender<SourceEvent>,
) {
    let outcome = match probe_feed(&client, &url).await {
        Ok(()) => EmbedOutcome::Loaded,
        Err(e) => EmbedOutcome::Failed(e),
    };
    debug!("Camera probe for {} finished: {:?}", url, outcome);
    let _ = events
        .send(SourceEvent::Embed {
            channel: Channel::DrainCamera,
            generation,
            outcome,
        })
        .await;
}

/// Probe the bot interface with the settle-delay contract.
pub async fn probe_bot(
    client: Client,
    url: String,
    session: u64,
    settle_delay: Duration,
    events: mpsc::Sender<SourceEvent>,
) {
    let settle_at = Instant::now() + settle_delay;
    let send = move |outcome: EmbedOutcome| {
        let events = events.clone();
        async move {
            events
                .send(SourceEvent::Embed {
                    channel: Channel::BotCamera,
                    generation: session,
                    outcome,
                })
                .await
                .is_ok()
        }
    };

    let probe = probe_feed(&client, &url);
    tokio::pin!(probe);

    tokio::select! {
        result = &mut probe => {
            match result {
                Err(e) => {
                    send(EmbedOutcome::Failed(e)).await;
                }
                Ok(()) => {
                    tokio::time::sleep_until(settle_at).await;
                    send(EmbedOutcome::AssumedLoaded).await;
                }
            }
        }
        _ = tokio::time::sleep_until(settle_at) => {
            if !send(EmbedOutcome::AssumedLoaded).await {
                return;
            }
            if let Err(e) = probe.await {
                send(EmbedOutcome::Failed(e)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_server;

    fn client() -> Client {
        Client::builder().timeout(Duration::from_secs(2)).build().unwrap()
    }

    #[tokio::test]
    async fn test_camera_loaded() {
        let url = test_server::serve_once("200 OK", "image/jpeg", "\u{ff}\u{d8}").await;
        let (tx, mut rx) = mpsc::channel(4);

        probe_camera(client(), url, 3, tx).await;

        match rx.recv().await.unwrap() {
            SourceEvent::Embed {
                channel,
                generation,
                outcome,
            } => {
                assert_eq!(channel, Channel::DrainCamera);
                assert_eq!(generation, 3);
                assert_eq!(outcome, EmbedOutcome::Loaded);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_camera_http_error_is_embed_failure() {
        let url = test_server::serve_once("404 Not Found", "text/plain", "gone").await;
        let (tx, mut rx) = mpsc::channel(4);

        probe_camera(client(), url, 1, tx).await;

        match rx.recv().await.unwrap() {
            SourceEvent::Embed { outcome, .. } => {
                assert!(matches!(
                    outcome,
                    EmbedOutcome::Failed(SourceError::EmbedLoadFailure(_))
                ));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bot_failure_before_settle() {
        let url = test_server::unreachable_url().await;
        let (tx, mut rx) = mpsc::channel(4);

        probe_bot(client(), url, 7, Duration::from_secs(5), tx).await;

        match rx.recv().await.unwrap() {
            SourceEvent::Embed {
                channel, outcome, ..
            } => {
                assert_eq!(channel, Channel::BotCamera);
                assert!(matches!(outcome, EmbedOutcome::Failed(_)));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_bot_assumed_loaded_after_settle() {
        let url = test_server::serve_once("200 OK", "text/html", "<html></html>").await;
        let (tx, mut rx) = mpsc::channel(4);

        probe_bot(client(), url, 2, Duration::from_millis(50), tx).await;

        match rx.recv().await.unwrap() {
            SourceEvent::Embed {
                generation, outcome, ..
            } => {
                assert_eq!(generation, 2);
                assert_eq!(outcome, EmbedOutcome::AssumedLoaded);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
