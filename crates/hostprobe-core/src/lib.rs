//! hostprobe-core: metric collector plugins for a host monitoring agent.
//!
//! Provides:
//! - `collector`: the `Collector` trait and the collectors themselves
//!   (memcached stats protocol, Solr admin API)
//! - `sample`: metric values, classification and the publish sink
//! - `config`: collector configuration built from the agent's config values
//!
//! Scheduling, configuration-file loading and metric transport belong to the
//! host agent. A collector is handed a [`sample::MetricSink`] and runs one pass.

pub mod collector;
pub mod config;
pub mod sample;
