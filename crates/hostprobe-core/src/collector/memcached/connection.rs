//! Transient connections to a memcached endpoint.
//!
//! Every fetch opens a fresh TCP or unix socket connection, writes one command,
//! does a single bounded read and drops the socket. Nothing is pooled.
//!
//! The timeout bounds the TCP connect across all resolved addresses together,
//! then each write and read. Host name resolution goes through the system
//! resolver and is not covered by it.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::endpoint::Endpoint;
use crate::collector::traits::StatsTransport;
use crate::config::DEFAULT_TIMEOUT;

/// Upper bound of a single response read. Larger replies are truncated.
pub const RESPONSE_BUFFER_SIZE: usize = 4096;

/// Stat request understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsCommand {
    /// `stats`: flat status block.
    Stats,
    /// `stats slabs`: per-slab table plus overall trailer.
    Slabs,
}

impl StatsCommand {
    /// Maps a stats type name to a command. Unknown names get the flat query.
    pub fn from_name(name: &str) -> Self {
        match name {
            "slabs" => StatsCommand::Slabs,
            _ => StatsCommand::Stats,
        }
    }

    /// Wire form of the command, newline-terminated.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            StatsCommand::Stats => b"stats\n",
            StatsCommand::Slabs => b"stats slabs\n",
        }
    }
}

/// Bytes returned by one command against one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    data: Vec<u8>,
}

impl RawResponse {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Response meaning "no data this pass".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Response text, with invalid UTF-8 replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

/// Why a fetch produced no data.
#[derive(Debug)]
pub enum ConnectionFault {
    /// Host name did not resolve to any address.
    Resolve(String),
    /// Could not connect to any resolved address.
    Connect(io::Error),
    /// Connect, write or read exceeded the timeout.
    Timeout,
    /// Write or read failed.
    Io(io::Error),
    /// Local sockets are not available on this platform.
    UnsupportedSocket,
}

impl std::fmt::Display for ConnectionFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionFault::Resolve(host) => write!(f, "cannot resolve {}", host),
            ConnectionFault::Connect(e) => write!(f, "connect failed: {}", e),
            ConnectionFault::Timeout => write!(f, "timed out"),
            ConnectionFault::Io(e) => write!(f, "I/O error: {}", e),
            ConnectionFault::UnsupportedSocket => write!(f, "unix sockets are not supported"),
        }
    }
}

impl std::error::Error for ConnectionFault {}

impl From<io::Error> for ConnectionFault {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ConnectionFault::Timeout,
            _ => ConnectionFault::Io(e),
        }
    }
}

/// Real socket transport.
#[derive(Debug, Clone, Copy)]
pub struct SocketTransport {
    timeout: Duration,
}

impl Default for SocketTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl SocketTransport {
    /// Creates a transport whose connect, write and read are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs one request/response exchange, reporting the fault on failure.
    pub fn try_fetch(
        &self,
        endpoint: &Endpoint,
        command: StatsCommand,
    ) -> Result<RawResponse, ConnectionFault> {
        match endpoint.port {
            Some(port) => {
                let mut stream = self.connect_tcp(&endpoint.address, port)?;
                stream.set_read_timeout(Some(self.timeout))?;
                stream.set_write_timeout(Some(self.timeout))?;
                exchange(&mut stream, command)
            }
            None => self.fetch_local(&endpoint.address, command),
        }
    }

    fn connect_tcp(&self, address: &str, port: u16) -> Result<TcpStream, ConnectionFault> {
        let target = format!("{}:{}", address, port);
        let addrs: Vec<_> = target
            .to_socket_addrs()
            .map_err(|_| ConnectionFault::Resolve(target.clone()))?
            .collect();
        if addrs.is_empty() {
            return Err(ConnectionFault::Resolve(target));
        }
        connect_any(&addrs, self.timeout)
    }

    #[cfg(unix)]
    fn fetch_local(
        &self,
        path: &str,
        command: StatsCommand,
    ) -> Result<RawResponse, ConnectionFault> {
        use std::os::unix::net::UnixStream;

        let mut stream = UnixStream::connect(path).map_err(ConnectionFault::Connect)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        exchange(&mut stream, command)
    }

    #[cfg(not(unix))]
    fn fetch_local(
        &self,
        _path: &str,
        _command: StatsCommand,
    ) -> Result<RawResponse, ConnectionFault> {
        Err(ConnectionFault::UnsupportedSocket)
    }
}

/// Tries each address in turn, sharing one deadline between the attempts.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream, ConnectionFault> {
    let deadline = Instant::now() + timeout;
    let mut last_err = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ConnectionFault::Timeout);
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(match last_err {
        Some(e) if e.kind() == io::ErrorKind::TimedOut => ConnectionFault::Timeout,
        Some(e) => ConnectionFault::Connect(e),
        None => ConnectionFault::Timeout,
    })
}

/// Writes the command and performs one bounded read.
fn exchange<S: Read + Write>(
    stream: &mut S,
    command: StatsCommand,
) -> Result<RawResponse, ConnectionFault> {
    stream.write_all(command.as_bytes())?;
    stream.flush()?;

    let mut buf = vec![0u8; RESPONSE_BUFFER_SIZE];
    let n = stream.read(&mut buf)?;
    buf.truncate(n);
    Ok(RawResponse::new(buf))
}

impl StatsTransport for SocketTransport {
    fn fetch(&self, endpoint: &Endpoint, command: StatsCommand) -> RawResponse {
        match self.try_fetch(endpoint, command) {
            Ok(response) => {
                debug!(endpoint = %endpoint, ?command, bytes = response.len(), "stats fetched");
                response
            }
            Err(e) => {
                warn!(endpoint = %endpoint, ?command, error = %e, "failed to get stats");
                RawResponse::empty()
            }
        }
    }
}
