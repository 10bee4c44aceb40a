//! # Runtime Configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//!
//! ```toml
//! items = ["item1", "item2"]
//!
//! [bus]
//! url = "memory://local"
//! queue_name = "stocksQueue"
//! topic_name = "stocksTopic"
//! msg_pool_size = 15
//! recovery_pause_ms = 2000
//!
//! [adapter]
//! watchdog_interval_ms = 2000
//!
//! [generator]
//! heartbeat_interval_ms = 1000
//! tick_interval_ms = 100
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SQ_BUS_URL` | `bus.url` |
//! | `SQ_QUEUE_NAME` | `bus.queue_name` |
//! | `SQ_TOPIC_NAME` | `bus.topic_name` |
//! | `SQ_MSG_POOL_SIZE` | `bus.msg_pool_size` |
//! | `SQ_RECOVERY_PAUSE_MS` | `bus.recovery_pause_ms` |

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use shared_bus::{DEFAULT_POOL_BATCH, DEFAULT_QUEUE_NAME, DEFAULT_TOPIC_NAME};
use shared_types::{ItemName, ProducerEpoch};
use sq_01_feed_adapter::AdapterConfig;
use sq_02_feed_generator::GeneratorConfig;

use crate::error::ConfigError;

/// Only scheme the runtime can connect to.
pub const MEMORY_SCHEME: &str = "memory://";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub bus: BusConfig,
    pub adapter: AdapterSection,
    pub generator: GeneratorSection,
    /// Items the logging consumer subscribes to at startup.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    pub url: String,
    pub queue_name: String,
    pub topic_name: String,
    pub msg_pool_size: usize,
    pub recovery_pause_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterSection {
    pub watchdog_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub heartbeat_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub epoch: Option<u32>,
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            adapter: AdapterSection::default(),
            generator: GeneratorSection::default(),
            items: (1..=5).map(|id| format!("item{id}")).collect(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: format!("{MEMORY_SCHEME}local"),
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            topic_name: DEFAULT_TOPIC_NAME.to_string(),
            msg_pool_size: DEFAULT_POOL_BATCH,
            recovery_pause_ms: 2000,
        }
    }
}

impl Default for AdapterSection {
    fn default() -> Self {
        Self {
            watchdog_interval_ms: 2000,
        }
    }
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
            tick_interval_ms: 100,
            epoch: None,
            seed: None,
        }
    }
}

impl RuntimeConfig {
    /// Load `path` (defaults when `None`), apply environment overrides and
    /// validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `SQ_*` overrides fetched through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SQ_BUS_URL") {
            self.bus.url = url;
        }
        if let Some(name) = lookup("SQ_QUEUE_NAME") {
            self.bus.queue_name = name;
        }
        if let Some(name) = lookup("SQ_TOPIC_NAME") {
            self.bus.topic_name = name;
        }
        if let Some(size) = lookup("SQ_MSG_POOL_SIZE") {
            self.bus.msg_pool_size = parse_value("SQ_MSG_POOL_SIZE", size)?;
        }
        if let Some(pause) = lookup("SQ_RECOVERY_PAUSE_MS") {
            self.bus.recovery_pause_ms = parse_value("SQ_RECOVERY_PAUSE_MS", pause)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bus.url.starts_with(MEMORY_SCHEME) {
            return Err(ConfigError::UnsupportedBusUrl(self.bus.url.clone()));
        }
        if self.bus.queue_name.is_empty() || self.bus.topic_name.is_empty() {
            return Err(ConfigError::Invalid(
                "queue and topic names must not be empty".to_string(),
            ));
        }
        if self.bus.msg_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "bus.msg_pool_size",
                value: "0".to_string(),
            });
        }
        if self.generator.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "generator.tick_interval_ms",
                value: "0".to_string(),
            });
        }
        if self.generator.heartbeat_interval_ms == 0
            || self.generator.heartbeat_interval_ms >= self.adapter.watchdog_interval_ms
        {
            return Err(ConfigError::Invalid(format!(
                "heartbeat interval ({} ms) must be positive and below the watchdog interval ({} ms)",
                self.generator.heartbeat_interval_ms, self.adapter.watchdog_interval_ms
            )));
        }
        for item in &self.items {
            ItemName::parse(item).map_err(|_| ConfigError::InvalidValue {
                key: "items",
                value: item.clone(),
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            recovery_pause: Duration::from_millis(self.bus.recovery_pause_ms),
            watchdog_interval: Duration::from_millis(self.adapter.watchdog_interval_ms),
            pool_batch: self.bus.msg_pool_size,
        }
    }

    #[must_use]
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            heartbeat_interval: Duration::from_millis(self.generator.heartbeat_interval_ms),
            tick_interval: Duration::from_millis(self.generator.tick_interval_ms),
            recovery_pause: Duration::from_millis(self.bus.recovery_pause_ms),
            pool_batch: self.bus.msg_pool_size,
            epoch: self.generator.epoch.map(ProducerEpoch),
            seed: self.generator.seed,
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::default();
        config.validate().unwrap();

        let adapter = config.adapter_config();
        assert_eq!(adapter.recovery_pause, Duration::from_millis(2000));
        assert_eq!(adapter.watchdog_interval, Duration::from_secs(2));
        assert_eq!(adapter.pool_batch, 15);
        assert_eq!(
            config.generator_config().heartbeat_interval,
            Duration::from_secs(1)
        );
        assert_eq!(config.bus.queue_name, "stocksQueue");
        assert_eq!(config.bus.topic_name, "stocksTopic");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml(
            r#"
            items = ["item7"]

            [bus]
            msg_pool_size = 4

            [generator]
            epoch = 77
            "#,
        )
        .unwrap();

        assert_eq!(config.items, vec!["item7".to_string()]);
        assert_eq!(config.bus.msg_pool_size, 4);
        assert_eq!(config.bus.recovery_pause_ms, 2000);
        assert_eq!(config.generator_config().epoch, Some(ProducerEpoch(77)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = RuntimeConfig::from_toml("[bus]\nbroker = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RuntimeConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("SQ_QUEUE_NAME", "requests"),
                ("SQ_TOPIC_NAME", "updates"),
                ("SQ_MSG_POOL_SIZE", "3"),
                ("SQ_RECOVERY_PAUSE_MS", " 250 "),
            ]))
            .unwrap();

        assert_eq!(config.bus.queue_name, "requests");
        assert_eq!(config.bus.topic_name, "updates");
        assert_eq!(config.bus.msg_pool_size, 3);
        assert_eq!(config.bus.recovery_pause_ms, 250);
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = RuntimeConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("SQ_MSG_POOL_SIZE", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "SQ_MSG_POOL_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = RuntimeConfig::default();
        config.bus.url = "tcp://localhost:61616".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedBusUrl(_))
        ));

        let mut config = RuntimeConfig::default();
        config.generator.heartbeat_interval_ms = 2000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = RuntimeConfig::default();
        config.items.push("item31".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "items", .. })
        ));

        let mut config = RuntimeConfig::default();
        config.bus.msg_pool_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[adapter]\nwatchdog_interval_ms = 5000").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.adapter.watchdog_interval_ms, 5000);

        let missing = RuntimeConfig::from_file(Path::new("/nonexistent/feed.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
