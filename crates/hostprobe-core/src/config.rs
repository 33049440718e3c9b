//! Collector configuration.
//!
//! The host agent owns configuration loading; collectors receive their section
//! as a generic `serde_json::Value` and validate it here.

use std::time::Duration;

use serde_json::Value;

/// Default connect/read/write timeout for collector network I/O.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Malformed collector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the memcached collector.
#[derive(Debug, Clone, PartialEq)]
pub struct MemcachedConfig {
    /// Endpoint strings, `[alias@]host[:port]` or `[alias@]/path/to/socket`.
    pub hosts: Vec<String>,
    /// Fields to publish. `None` publishes everything parsed.
    pub publish: Option<Vec<String>>,
    pub timeout: Duration,
    /// Namespace the agent publishes this collector's metrics under.
    pub path: String,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:11211".to_string()],
            publish: None,
            timeout: DEFAULT_TIMEOUT,
            path: "memcached".to_string(),
        }
    }
}

impl MemcachedConfig {
    /// Builds the config from the agent's value for this collector.
    ///
    /// `hosts` may be a single string or a list of strings; anything else is
    /// rejected. Missing keys keep their defaults.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let Some(section) = section(value, "memcached")? else {
            return Ok(config);
        };

        if let Some(hosts) = string_list(section.get("hosts"), "hosts")? {
            config.hosts = hosts;
        }
        config.publish = string_list(section.get("publish"), "publish")?;
        if let Some(timeout) = timeout_ms(section.get("timeout_ms"))? {
            config.timeout = timeout;
        }
        if let Some(path) = section.get("path").and_then(Value::as_str) {
            config.path = path.to_string();
        }

        Ok(config)
    }
}

/// Settings for the Solr collector.
#[derive(Debug, Clone, PartialEq)]
pub struct SolrConfig {
    pub host: String,
    pub ports: Vec<u16>,
    /// Enabled stat groups: `jvm`, `threads`.
    pub stats: Vec<String>,
    pub timeout: Duration,
    pub path: String,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            ports: vec![8983],
            stats: vec!["jvm".to_string(), "threads".to_string()],
            timeout: DEFAULT_TIMEOUT,
            path: "solr".to_string(),
        }
    }
}

impl SolrConfig {
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let Some(section) = section(value, "solr")? else {
            return Ok(config);
        };

        if let Some(host) = section.get("host").and_then(Value::as_str) {
            config.host = host.to_string();
        }
        if let Some(port) = section.get("port") {
            config.ports = ports(port)?;
        }
        if let Some(stats) = string_list(section.get("stats"), "stats")? {
            config.stats = stats;
        }
        if let Some(timeout) = timeout_ms(section.get("timeout_ms"))? {
            config.timeout = timeout;
        }
        if let Some(path) = section.get("path").and_then(Value::as_str) {
            config.path = path.to_string();
        }

        Ok(config)
    }

    pub fn stat_enabled(&self, name: &str) -> bool {
        self.stats.iter().any(|s| s == name)
    }
}

fn section<'a>(
    value: &'a Value,
    name: &str,
) -> Result<Option<&'a serde_json::Map<String, Value>>, ConfigError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ConfigError::new(format!("{} config must be a table", name))),
    }
}

/// Reads a value that is either one string or an ordered list of strings.
fn string_list(value: Option<&Value>, field: &str) -> Result<Option<Vec<String>>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::new(format!("{} must contain only strings", field))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ConfigError::new(format!(
            "{} must be a string or a list of strings",
            field
        ))),
    }
}

fn timeout_ms(value: Option<&Value>) -> Result<Option<Duration>, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .filter(|ms| *ms > 0)
            .map(|ms| Some(Duration::from_millis(ms)))
            .ok_or_else(|| ConfigError::new("timeout_ms must be a positive integer")),
    }
}

fn port(value: &Value) -> Result<u16, ConfigError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ConfigError::new(format!("invalid port: {}", value)))
}

/// Port may be an integer, a numeric string or a list of either.
fn ports(value: &Value) -> Result<Vec<u16>, ConfigError> {
    match value {
        Value::Number(_) | Value::String(_) => Ok(vec![port(value)?]),
        Value::Array(items) => items.iter().map(port).collect(),
        _ => Err(ConfigError::new("port value is not str/int or list")),
    }
}
