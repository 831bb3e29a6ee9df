//! Start-up configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `DRAINWATCH_*` environment variables. Command-line overrides are
//! applied on top by the binary.
//!
//! ```toml
//! flow_url = "http://192.168.0.77/api/data"
//! camera_url = "http://192.168.0.110/stream"
//! threshold = 120
//! policy = "debounced"
//! debounce = "5s"
//! update_interval = "2s"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration;
use crate::data::threshold::DEFAULT_DEBOUNCE;
use crate::data::{Direction, Rounding, ThresholdPolicy};
use crate::monitor::Endpoints;
use crate::source::{embed, http, sampler, SourceTiming};

/// Prefix for environment overrides, e.g. `DRAINWATCH_FLOW_URL`.
pub const ENV_PREFIX: &str = "DRAINWATCH";

/// Default clog threshold in L/min.
pub const DEFAULT_THRESHOLD: f64 = 150.0;

/// Threshold evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Immediate,
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub flow_url: String,
    pub camera_url: String,
    pub bot_url: String,
    pub threshold: f64,
    pub policy: PolicyKind,
    /// Overrides the direction implied by `policy`.
    pub direction: Option<Direction>,
    #[serde(deserialize_with = "duration::deserialize")]
    pub debounce: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub update_interval: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub request_timeout: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub settle_delay: Duration,
    pub rounding: Rounding,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flow_url: String::new(),
            camera_url: String::new(),
            bot_url: String::new(),
            threshold: DEFAULT_THRESHOLD,
            policy: PolicyKind::Immediate,
            direction: None,
            debounce: DEFAULT_DEBOUNCE,
            update_interval: sampler::DEFAULT_INTERVAL,
            request_timeout: http::DEFAULT_TIMEOUT,
            settle_delay: embed::DEFAULT_SETTLE_DELAY,
            rounding: Rounding::OnRecord,
        }
    }
}

impl Settings {
    /// Load defaults, an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Same as [`Settings::load`] with an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            bail!("threshold must be a non-negative number, got {}", self.threshold);
        }
        if self.update_interval.is_zero() {
            bail!("update_interval must be greater than zero");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than zero");
        }
        for (name, url) in [
            ("flow_url", &self.flow_url),
            ("camera_url", &self.camera_url),
            ("bot_url", &self.bot_url),
        ] {
            let url = url.trim();
            if !url.is_empty() {
                reqwest::Url::parse(url)
                    .with_context(|| format!("{} is not a URL: {}", name, url))?;
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> ThresholdPolicy {
        let mut policy = match self.policy {
            PolicyKind::Immediate => ThresholdPolicy::immediate(),
            PolicyKind::Debounced => ThresholdPolicy::debounced(self.debounce),
        };
        if let Some(direction) = self.direction {
            policy.direction = direction;
        }
        policy
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            flow_url: self.flow_url.clone(),
            camera_url: self.camera_url.clone(),
            bot_url: self.bot_url.clone(),
        }
        .normalized()
    }

    pub fn timing(&self) -> SourceTiming {
        SourceTiming {
            update_interval: self.update_interval,
            request_timeout: self.request_timeout,
            settle_delay: self.settle_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
    }

    fn env(pairs: &[(&str, &str)]) -> Environment {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(map))
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, no_env()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.threshold, 150.0);
        assert_eq!(settings.update_interval, Duration::from_secs(2));
        assert_eq!(settings.policy(), ThresholdPolicy::immediate());
        assert_eq!(settings.endpoints(), Endpoints::default());
    }

    #[test]
    fn test_file_values() {
        let file = toml_file(
            r#"
flow_url = " http://meter.local/api/data "
threshold = 120
policy = "debounced"
debounce = "3s"
update_interval = "500ms"
rounding = "on-display"
"#,
        );
        let settings = Settings::load_with_env(Some(file.path()), no_env()).unwrap();

        assert_eq!(settings.threshold, 120.0);
        assert_eq!(settings.update_interval, Duration::from_millis(500));
        assert_eq!(settings.rounding, Rounding::OnDisplay);
        assert_eq!(
            settings.policy(),
            ThresholdPolicy::debounced(Duration::from_secs(3))
        );
        assert_eq!(settings.endpoints().flow_url, "http://meter.local/api/data");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = toml_file("threshold = 120\n");
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("DRAINWATCH_THRESHOLD", "90"),
                ("DRAINWATCH_CAMERA_URL", "http://cam.local/stream"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.threshold, 90.0);
        assert_eq!(settings.camera_url, "http://cam.local/stream");
    }

    #[test]
    fn test_direction_override() {
        let file = toml_file("direction = \"below\"\n");
        let settings = Settings::load_with_env(Some(file.path()), no_env()).unwrap();
        let policy = settings.policy();
        assert_eq!(policy.direction, Direction::Below);
        assert!(policy.is_immediate());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let negative = toml_file("threshold = -5\n");
        assert!(Settings::load_with_env(Some(negative.path()), no_env()).is_err());

        let bad_duration = toml_file("update_interval = \"soon\"\n");
        assert!(Settings::load_with_env(Some(bad_duration.path()), no_env()).is_err());

        let huge = toml_file("update_interval = \"1e20s\"\n");
        assert!(Settings::load_with_env(Some(huge.path()), no_env()).is_err());
        assert!(
            Settings::load_with_env(None, env(&[("DRAINWATCH_DEBOUNCE", "1e20s")])).is_err()
        );

        let bad_url = toml_file("flow_url = \"not a url\"\n");
        assert!(Settings::load_with_env(Some(bad_url.path()), no_env()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/drainwatch.toml");
        assert!(Settings::load_with_env(Some(path), no_env()).is_err());
    }
}
