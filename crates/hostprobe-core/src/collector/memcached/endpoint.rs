//! Endpoint resolution for `hosts` entries.
//!
//! Format: `[alias@]host[:port]` for TCP, `[alias@]/path/to/socket` for a
//! local socket. Without an explicit alias the address doubles as the alias.

use std::fmt;

use crate::config::ConfigError;

/// One addressable memcached instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Metric prefix for this instance. Never empty.
    pub alias: String,
    /// Host name/IP, or a socket path when `port` is `None`.
    pub address: String,
    pub port: Option<u16>,
}

impl Endpoint {
    /// Parses one `hosts` entry.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let entry = entry.trim();

        // Alias is everything up to the last '@'
        let (alias, rest) = match entry.rsplit_once('@') {
            Some((alias, rest)) if !alias.is_empty() => (Some(alias), rest),
            _ => (None, entry),
        };

        let (address, port) = match rest.rsplit_once(':') {
            Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| ConfigError::new(format!("port out of range in '{}'", entry)))?;
                (host, Some(port))
            }
            _ => (rest, None),
        };

        if address.is_empty() {
            return Err(ConfigError::new(format!("missing address in '{}'", entry)));
        }

        Ok(Self {
            alias: alias.unwrap_or(address).to_string(),
            address: address.to_string(),
            port,
        })
    }

    /// True for local (unix domain) socket endpoints.
    pub fn is_local_socket(&self) -> bool {
        self.port.is_none()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.address, port),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Resolves every configured host, failing on the first malformed entry.
pub fn resolve_endpoints<S: AsRef<str>>(hosts: &[S]) -> Result<Vec<Endpoint>, ConfigError> {
    hosts.iter().map(|h| Endpoint::parse(h.as_ref())).collect()
}
