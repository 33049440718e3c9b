//! memcached stats collector.
//!
//! Per endpoint and pass:
//!
//! ```text
//! hosts entry ──► Endpoint ──► `stats`       ──► StatusBlock ──► pid ──► /proc/[pid]/cmdline
//!                    │                              │                         │
//!                    │                              │◄──── limit_maxconn ─────┘
//!                    │                              ▼
//!                    └───────► `stats slabs` ──► SlabStats    publish_status (gauge/counter)
//!                                                   │
//!                                                   ▼
//!                                             publish_slabs (raw)
//! ```
//!
//! Endpoints are polled one after another. Nothing is shared between them,
//! so a failing endpoint only costs its own samples.

pub mod classify;
pub mod connection;
pub mod endpoint;
pub mod parser;

pub use classify::{GAUGES, classify, publish_slabs, publish_status};
pub use connection::{ConnectionFault, RawResponse, SocketTransport, StatsCommand};
pub use endpoint::{Endpoint, resolve_endpoints};
pub use parser::{SlabEntry, SlabOverallEntry, SlabStats, StatusBlock, StatusField};

use tracing::{debug, info};

use crate::collector::error::CollectError;
use crate::collector::procfs::read_connection_limit;
use crate::collector::traits::{Collector, FileSystem, RealFs, StatsTransport};
use crate::config::MemcachedConfig;
use crate::sample::{MetricSink, MetricValue};

/// Field under which the recovered `-c` limit is published.
pub const LIMIT_MAXCONN_FIELD: &str = "limit_maxconn";

/// Polls every configured memcached endpoint.
pub struct MemcachedCollector<F: FileSystem, T: StatsTransport> {
    fs: F,
    transport: T,
    proc_path: String,
    config: MemcachedConfig,
}

impl MemcachedCollector<RealFs, SocketTransport> {
    /// Collector over real sockets and the host `/proc`.
    pub fn from_config(config: MemcachedConfig) -> Self {
        let transport = SocketTransport::new(config.timeout);
        Self::new(RealFs::new(), transport, "/proc", config)
    }
}

impl<F: FileSystem, T: StatsTransport> MemcachedCollector<F, T> {
    /// Creates a collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `transport` - Stats protocol transport (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `config` - Collector settings
    pub fn new(fs: F, transport: T, proc_path: impl Into<String>, config: MemcachedConfig) -> Self {
        Self {
            fs,
            transport,
            proc_path: proc_path.into(),
            config,
        }
    }

    pub fn config(&self) -> &MemcachedConfig {
        &self.config
    }

    /// Fetches and parses the flat status block of one endpoint, adding the
    /// connection limit recovered from the server's command line.
    pub fn fetch_status(&self, endpoint: &Endpoint) -> StatusBlock {
        let response = self.transport.fetch(endpoint, StatsCommand::Stats);
        let mut status = parser::parse_stats(&response.text());

        debug!(
            endpoint = %endpoint,
            pid = ?status.pid,
            fields = status.fields.len(),
            "parsed stats"
        );
        if let Some(pid) = status.pid
            && let Some(limit) = read_connection_limit(&self.fs, &self.proc_path, pid)
        {
            status.insert(LIMIT_MAXCONN_FIELD, MetricValue::from(limit));
        }
        status
    }

    /// Fetches and parses the slabs table of one endpoint.
    pub fn fetch_slabs(&self, endpoint: &Endpoint) -> SlabStats {
        let response = self.transport.fetch(endpoint, StatsCommand::Slabs);
        parser::parse_slabs(&response.text())
    }

    /// Collects one endpoint: slab stats first, then status fields.
    /// Returns the number of samples published.
    pub fn collect_endpoint(&self, endpoint: &Endpoint, sink: &mut dyn MetricSink) -> usize {
        let status = self.fetch_status(endpoint);
        let slabs = self.fetch_slabs(endpoint);

        let mut published = publish_slabs(&slabs, sink);
        if status.fields.is_empty() {
            debug!(endpoint = %endpoint, "no stats data this pass");
            return published;
        }
        published += publish_status(
            &endpoint.alias,
            &status,
            self.config.publish.as_deref(),
            sink,
        );
        published
    }
}

impl<F: FileSystem, T: StatsTransport> Collector for MemcachedCollector<F, T> {
    fn name(&self) -> &str {
        &self.config.path
    }

    fn collect(&mut self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        let endpoints = resolve_endpoints(&self.config.hosts)?;

        for endpoint in &endpoints {
            let published = self.collect_endpoint(endpoint, sink);
            info!(
                endpoint = %endpoint,
                alias = %endpoint.alias,
                published,
                "memcached pass complete"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockTransport, scenarios};
    use crate::sample::{Classification, SampleBuffer};

    fn config(hosts: &[&str], publish: Option<&[&str]>) -> MemcachedConfig {
        MemcachedConfig {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            publish: publish.map(|p| p.iter().map(|f| f.to_string()).collect()),
            ..MemcachedConfig::default()
        }
    }

    #[test]
    fn test_collect_example_scenario() {
        let mut transport = MockTransport::new();
        transport.add_response(
            "localhost:11211",
            StatsCommand::Stats,
            "STAT curr_connections 5\nSTAT bytes 120.5\nSTAT pid 431\n",
        );
        let mut fs = MockFs::new();
        fs.add_file("/proc/431/cmdline", "memcached\0-c\01024\0");

        let mut collector =
            MemcachedCollector::new(fs, transport, "/proc", config(&["localhost:11211"], None));
        let mut sink = SampleBuffer::new();
        collector.collect(&mut sink).unwrap();

        assert_eq!(sink.len(), 3);
        let conns = sink.get("localhost.curr_connections").unwrap();
        assert_eq!(conns.value, MetricValue::Int(5));
        assert_eq!(conns.classification, Classification::Gauge);
        let bytes = sink.get("localhost.bytes").unwrap();
        assert_eq!(bytes.value, MetricValue::Float(120.5));
        assert_eq!(bytes.classification, Classification::Gauge);
        let limit = sink.get("localhost.limit_maxconn").unwrap();
        assert_eq!(limit.value, MetricValue::Int(1024));
        assert_eq!(limit.classification, Classification::Counter);
    }

    #[test]
    fn test_collect_without_cmdline() {
        let mut transport = MockTransport::new();
        transport.add_response(
            "localhost:11211",
            StatsCommand::Stats,
            "STAT pid 999\nSTAT get_hits 3\n",
        );

        let mut collector = MemcachedCollector::new(
            MockFs::new(),
            transport,
            "/proc",
            config(&["localhost:11211"], None),
        );
        let mut sink = SampleBuffer::new();
        collector.collect(&mut sink).unwrap();

        assert_eq!(sink.len(), 1);
        assert!(sink.get("localhost.limit_maxconn").is_none());
    }

    #[test]
    fn test_collect_full_scenario() {
        let transport = MockTransport::typical_server("cache1@10.0.0.5:11211");
        let fs = MockFs::memcached_process(scenarios::STATS_PID, 4096);

        let mut collector = MemcachedCollector::new(
            fs,
            transport,
            "/proc",
            config(&["cache1@10.0.0.5:11211"], None),
        );
        let mut sink = SampleBuffer::new();
        collector.collect(&mut sink).unwrap();

        assert_eq!(
            sink.get("cache1.limit_maxconn").unwrap().value,
            MetricValue::Int(4096)
        );
        assert_eq!(
            sink.get("cache1.uptime").unwrap().classification,
            Classification::Gauge
        );
        assert_eq!(
            sink.get("cache1.cmd_get").unwrap().classification,
            Classification::Counter
        );
        assert_eq!(
            sink.get("slab.active_slabs").unwrap().classification,
            Classification::Raw
        );
        assert!(sink.get("slab.1.chunk_size").is_some());
        assert!(sink.get("cache1.version").is_none());
    }

    #[test]
    fn test_unreachable_endpoint_publishes_nothing() {
        let mut transport = MockTransport::new();
        transport.add_response("up:11211", StatsCommand::Stats, "STAT threads 4\n");

        let mut collector = MemcachedCollector::new(
            MockFs::new(),
            transport,
            "/proc",
            config(&["down:11211", "up:11211"], None),
        );
        let mut sink = SampleBuffer::new();
        collector.collect(&mut sink).unwrap();

        assert_eq!(sink.len(), 1);
        assert!(sink.get("up.threads").is_some());
    }

    #[test]
    fn test_allow_list_limits_output() {
        let transport = MockTransport::typical_server("localhost:11211");
        let mut collector = MemcachedCollector::new(
            MockFs::new(),
            transport,
            "/proc",
            config(&["localhost:11211"], Some(&["curr_items", "bogus_field"])),
        );
        let mut sink = SampleBuffer::new();
        collector.collect(&mut sink).unwrap();

        let status_keys: Vec<&str> = sink
            .iter()
            .map(|s| s.key.as_str())
            .filter(|k| k.starts_with("localhost."))
            .collect();
        assert_eq!(status_keys, vec!["localhost.curr_items"]);
    }

    #[test]
    fn test_bad_host_aborts_pass() {
        let mut collector = MemcachedCollector::new(
            MockFs::new(),
            MockTransport::new(),
            "/proc",
            config(&["localhost:11211", "cache@:1"], None),
        );
        let mut sink = SampleBuffer::new();
        let err = collector.collect(&mut sink).unwrap_err();
        assert!(matches!(err, CollectError::Config(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_collector_name_is_path() {
        let collector = MemcachedCollector::from_config(MemcachedConfig::default());
        assert_eq!(collector.name(), "memcached");

        let config = MemcachedConfig {
            path: "cache".to_string(),
            ..MemcachedConfig::default()
        };
        let collector =
            MemcachedCollector::new(MockFs::new(), MockTransport::new(), "/proc", config);
        assert_eq!(collector.name(), "cache");
        assert_eq!(collector.config().hosts, vec!["localhost:11211"]);
    }
}
