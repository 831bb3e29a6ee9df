//! Error types for flow, camera and bot sources.
//!
//! None of these are fatal: the monitor absorbs them, logs them and marks the
//! affected channel as disconnected.

use thiserror::Error;

/// Errors raised while sampling the flow endpoint or probing an embedded feed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Network failure or request timeout.
    #[error("endpoint unreachable: {0}")]
    EndpointUnreachable(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP error: status {0}")]
    HttpError(u16),

    /// The body was not JSON or `flowRate` was missing or non-numeric.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A camera stream or bot interface failed to load.
    #[error("embed failed to load: {0}")]
    EmbedLoadFailure(String),
}

/// Rejected operator threshold input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("threshold must be a non-negative number, got {0}")]
pub struct InvalidThreshold(pub f64);

impl SourceError {
    /// Short label used in the status bar and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::EndpointUnreachable(_) => "unreachable",
            SourceError::HttpError(_) => "http",
            SourceError::MalformedPayload(_) => "malformed",
            SourceError::EmbedLoadFailure(_) => "embed",
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            SourceError::EndpointUnreachable(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::HttpError(status.as_u16())
        } else if err.is_decode() || err.is_body() {
            SourceError::MalformedPayload(err.to_string())
        } else {
            SourceError::EndpointUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_malformed_payloads() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = SourceError::from(err);
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_display() {
        assert_eq!(SourceError::HttpError(503).to_string(), "HTTP error: status 503");
        assert_eq!(
            SourceError::EmbedLoadFailure("bot".into()).to_string(),
            "embed failed to load: bot"
        );
    }
}
