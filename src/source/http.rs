//! Live flow endpoint client.
//!
//! Expects `GET <url>` to answer 2xx with `{"flowRate": number, "totalVolume"?: number}`,
//! which is what the ESP32 flow meter firmware serves on `/api/data`.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::data::{Reading, ReadingOrigin};
use crate::error::SourceError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire format of the flow endpoint.
#[derive(Debug, Deserialize)]
struct FlowPayload {
    #[serde(rename = "flowRate")]
    flow_rate: Value,
    #[serde(rename = "totalVolume", default)]
    total_volume: Option<Value>,
}

/// HTTP client bound to one flow endpoint.
#[derive(Debug, Clone)]
pub struct FlowEndpoint {
    client: Client,
    url: String,
}

impl FlowEndpoint {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::EndpointUnreachable(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    /// Reuse an existing client (shares its connection pool and timeout).
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one reading.
    pub async fn fetch(&self) -> Result<Reading, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::HttpError(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        parse_payload(&body)
    }
}

/// Decode an endpoint body into a live reading.
///
/// `flowRate` must be a non-negative number or the whole response is
/// rejected. `totalVolume` is kept only when numeric.
pub fn parse_payload(body: &[u8]) -> Result<Reading, SourceError> {
    let payload: FlowPayload = serde_json::from_slice(body)?;

    let flow_rate = payload
        .flow_rate
        .as_f64()
        .ok_or_else(|| SourceError::MalformedPayload("flowRate must be a number".to_string()))?;
    if flow_rate < 0.0 {
        return Err(SourceError::MalformedPayload(format!(
            "flowRate must not be negative, got {}",
            flow_rate
        )));
    }

    let total_volume = payload.total_volume.as_ref().and_then(Value::as_f64);

    Ok(Reading::new(flow_rate, total_volume, ReadingOrigin::Live))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let reading = parse_payload(br#"{"flowRate": 42.5, "totalVolume": 10.0}"#).unwrap();
        assert_eq!(reading.flow_rate, 42.5);
        assert_eq!(reading.total_volume, Some(10.0));
        assert_eq!(reading.origin, ReadingOrigin::Live);
    }

    #[test]
    fn test_parse_without_volume() {
        let reading = parse_payload(br#"{"flowRate": 3}"#).unwrap();
        assert_eq!(reading.flow_rate, 3.0);
        assert_eq!(reading.total_volume, None);
    }

    #[test]
    fn test_non_numeric_volume_is_ignored() {
        let reading = parse_payload(br#"{"flowRate": 1.5, "totalVolume": "lots"}"#).unwrap();
        assert_eq!(reading.total_volume, None);
    }

    #[test]
    fn test_string_flow_rate_is_malformed() {
        let err = parse_payload(br#"{"flowRate": "42.5"}"#).unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_flow_rate_is_malformed() {
        let err = parse_payload(br#"{"totalVolume": 1.0}"#).unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(_)));
    }

    #[test]
    fn test_null_flow_rate_is_malformed() {
        let err = parse_payload(br#"{"flowRate": null}"#).unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(_)));
    }

    #[test]
    fn test_negative_flow_rate_is_malformed() {
        let err = parse_payload(br#"{"flowRate": -2.0}"#).unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(_)));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let err = parse_payload(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, SourceError::MalformedPayload(_)));
    }
}
