//! Seams between collectors and the outside world.
//!
//! `FileSystem` covers `/proc` reads and `StatsTransport` covers the stats
//! protocol exchange, so collectors run against real sockets and `/proc` in
//! production and against in-memory mocks in tests.

use std::io;
use std::path::Path;

use crate::collector::error::CollectError;
use crate::collector::memcached::{Endpoint, RawResponse, StatsCommand};
use crate::sample::MetricSink;

/// Abstraction for filesystem reads.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// One stats request/response exchange with an endpoint.
///
/// Implementations never fail: a connection fault is logged and reported as
/// an empty response, which callers treat as "no data this pass".
pub trait StatsTransport: Send + Sync {
    fn fetch(&self, endpoint: &Endpoint, command: StatsCommand) -> RawResponse;
}

/// A metrics collector plugin.
///
/// The agent calls `collect` once per scheduled pass. A collector holds no
/// state between passes beyond its configuration.
pub trait Collector {
    /// Collector name, used as the metric namespace and in logs.
    fn name(&self) -> &str;

    /// Runs one collection pass, publishing into `sink`.
    ///
    /// Only configuration errors abort a pass; unreachable endpoints simply
    /// publish nothing.
    fn collect(&mut self, sink: &mut dyn MetricSink) -> Result<(), CollectError>;
}
