//! Errors that abort a collection pass.

use crate::config::ConfigError;

/// Error returned by [`Collector::collect`](super::Collector::collect).
#[derive(Debug)]
pub enum CollectError {
    /// The collector's configuration is malformed.
    Config(ConfigError),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CollectError {
    fn from(e: ConfigError) -> Self {
        CollectError::Config(e)
    }
}
