use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, net::SocketAddr, path::Path, time::Duration};

use crate::error::RelayError;

/// Service settings, read from a TOML file. Every field has a default, so an empty or missing
/// file yields a working configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Address the HTTP surface listens on.
    pub bind: SocketAddr,
    /// Events buffered per subscriber before it is disconnected as too slow.
    pub subscriber_queue: usize,
    /// Interval between keep-alive comments on idle event streams.
    pub keep_alive_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            subscriber_queue: 256,
            keep_alive_secs: 15,
        }
    }
}

impl RelayConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let path = path.as_ref();
        tracing::debug!("[RelayConfig::load] Attempting to read config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("[RelayConfig::load] Config file not found, using defaults.");
            return Ok(RelayConfig::default());
        }
        let content = read_to_string(path)?;
        RelayConfig::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, RelayError> {
        let config: RelayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.subscriber_queue == 0 {
            return Err(RelayError::Config(
                "subscriber_queue must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig::load(dir.path().join("relay.toml")).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.keep_alive(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "subscriber_queue = 8").unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.subscriber_queue, 8);
        assert_eq!(config.keep_alive_secs, 15);
    }

    #[test]
    fn test_rejects_zero_queue() {
        let err = RelayConfig::parse("subscriber_queue = 0").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = RelayConfig::parse("bind = \"0.0.0.0:9000\"\nverbose = true").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
