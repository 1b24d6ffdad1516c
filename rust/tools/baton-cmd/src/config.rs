//! Optional JSON configuration for baton-cmd.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.
//! Command-line flags take precedence over values read from the file.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use baton_relay::{ExchangeOptions, Token};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatonConfig {
    pub relay: RelayConfig,
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    pub length: usize,
    pub seed: Token,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig { length: 3, seed: 0 }
    }
}

impl RelayConfig {
    pub fn with_overrides(mut self, length: Option<usize>, seed: Option<Token>) -> Self {
        if let Some(length) = length {
            self.length = length;
        }
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    pub seed: Token,
    pub duration_ms: u64,
    pub join_timeout_ms: u64,
    pub labels: [String; 2],
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let options = ExchangeOptions::default();
        ExchangeConfig {
            seed: 0,
            duration_ms: 1000,
            join_timeout_ms: options.join_timeout.as_millis() as u64,
            labels: options.labels,
        }
    }
}

impl ExchangeConfig {
    pub fn with_overrides(mut self, seed: Option<Token>, duration_ms: Option<u64>) -> Self {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        if let Some(duration_ms) = duration_ms {
            self.duration_ms = duration_ms;
        }
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn options(&self) -> ExchangeOptions {
        ExchangeOptions::default()
            .with_labels(self.labels[0].clone(), self.labels[1].clone())
            .with_join_timeout(Duration::from_millis(self.join_timeout_ms))
    }
}

impl BatonConfig {
    /// Reads the configuration from `path`, or returns the defaults when no
    /// path is given.
    pub fn load(path: Option<&str>) -> Result<BatonConfig> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(BatonConfig::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<BatonConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use super::BatonConfig;

    #[test]
    fn test_defaults_without_file() {
        let config = BatonConfig::load(None).unwrap();
        assert_eq!(config.relay.length, 3);
        assert_eq!(config.relay.seed, 0);
        assert_eq!(config.exchange.duration(), Duration::from_secs(1));
        assert_eq!(config.exchange.labels, ["ping", "pong"]);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "relay": {{ "length": 7 }}, "exchange": {{ "duration_ms": 25, "labels": ["tick", "tock"] }} }}"#
        )
        .unwrap();

        let config = BatonConfig::from_file(file.path()).unwrap();
        assert_eq!(config.relay.length, 7);
        assert_eq!(config.relay.seed, 0);
        assert_eq!(config.exchange.duration_ms, 25);

        let options = config.exchange.options();
        assert_eq!(options.labels, ["tick", "tock"]);
        assert_eq!(options.join_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_flags_override_file() {
        let config = BatonConfig::default();
        let relay = config.relay.with_overrides(Some(10), None);
        assert_eq!((relay.length, relay.seed), (10, 0));
        let exchange = config.exchange.with_overrides(Some(-4), Some(0));
        assert_eq!((exchange.seed, exchange.duration_ms), (-4, 0));
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "relay": {{ "stages": 7 }} }}"#).unwrap();
        let err = BatonConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));

        let err = BatonConfig::from_file("/nonexistent/baton.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
