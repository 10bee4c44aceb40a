//! Runtime errors.

use std::path::PathBuf;

use shared_bus::PoolError;
use sq_01_feed_adapter::SubscriptionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unsupported bus URL {0:?}: only memory:// is available")]
    UnsupportedBusUrl(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Message pool: {0}")]
    Pool(#[from] PoolError),

    #[error("Subscription failed: {0}")]
    Subscription(#[from] SubscriptionError),
}
