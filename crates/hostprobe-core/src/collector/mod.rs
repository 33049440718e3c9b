//! Metric collector plugins.
//!
//! Each collector polls one data source and publishes normalized samples into
//! a [`MetricSink`](crate::sample::MetricSink) handed over by the agent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Collector (trait)                       │
//! │  ┌─────────────────────────────┐   ┌─────────────────────┐  │
//! │  │     MemcachedCollector      │   │    SolrCollector    │  │
//! │  │  - stats / stats slabs      │   │  - admin REST API   │  │
//! │  │  - /proc/[pid]/cmdline      │   │                     │  │
//! │  └──────┬───────────────┬──────┘   └──────────┬──────────┘  │
//! │         │               │                     │             │
//! │  ┌──────▼──────┐ ┌──────▼────────┐   ┌────────▼─────────┐   │
//! │  │ FileSystem  │ │StatsTransport │   │    JsonSource    │   │
//! │  └──────┬──────┘ └──────┬────────┘   └────────┬─────────┘   │
//! └─────────┼───────────────┼─────────────────────┼─────────────┘
//!           │               │                     │
//!     RealFs / MockFs   SocketTransport /     HttpJsonSource /
//!                       MockTransport         test doubles
//! ```
//!
//! # Usage
//!
//! ```
//! use hostprobe_core::collector::{Collector, MemcachedCollector, MockFs, MockTransport};
//! use hostprobe_core::config::MemcachedConfig;
//! use hostprobe_core::sample::SampleBuffer;
//!
//! let transport = MockTransport::typical_server("localhost:11211");
//! let mut collector =
//!     MemcachedCollector::new(MockFs::new(), transport, "/proc", MemcachedConfig::default());
//! let mut sink = SampleBuffer::new();
//! collector.collect(&mut sink).unwrap();
//! assert!(sink.get("localhost.curr_connections").is_some());
//! ```

mod error;
pub mod memcached;
pub mod mock;
pub mod procfs;
#[cfg(feature = "solr")]
pub mod solr;
pub mod traits;

pub use error::CollectError;
pub use memcached::MemcachedCollector;
pub use mock::{MockFs, MockTransport};
#[cfg(feature = "solr")]
pub use solr::SolrCollector;
pub use traits::{Collector, FileSystem, RealFs, StatsTransport};
