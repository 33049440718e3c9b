//! Solr admin API collector.
//!
//! For each configured port the first core reported by `/solr/admin/cores`
//! is used to read JVM memory (`admin/system`) and thread counts
//! (`admin/threads`). Values are published unclassified as
//! `<port>.jvm.mem.<key>` and `<port>.jvm.threads.<key>`.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::collector::error::CollectError;
use crate::collector::traits::Collector;
use crate::config::SolrConfig;
use crate::sample::{MetricSink, MetricValue};

const MEMORY_KEYS: &[&str] = &["free", "total", "max", "used"];
const THREAD_KEYS: &[&str] = &["current", "peak", "daemon"];

/// Why a Solr request produced no data.
#[derive(Debug)]
pub enum SolrFault {
    /// Request failed, timed out, or returned an error status.
    Http(reqwest::Error),
    /// Response was not the expected JSON document.
    Decode(String),
}

impl std::fmt::Display for SolrFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolrFault::Http(e) => write!(f, "HTTP error: {}", e),
            SolrFault::Decode(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for SolrFault {}

impl From<reqwest::Error> for SolrFault {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SolrFault::Decode(e.to_string())
        } else {
            SolrFault::Http(e)
        }
    }
}

/// Source of JSON documents from the Solr admin API.
pub trait JsonSource: Send + Sync {
    fn get_json(&self, port: u16, path: &str, params: &[(&str, &str)]) -> Result<Value, SolrFault>;
}

/// Blocking HTTP client against `http://<host>:<port>`.
pub struct HttpJsonSource {
    client: reqwest::blocking::Client,
    host: String,
}

impl HttpJsonSource {
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, SolrFault> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }
}

impl JsonSource for HttpJsonSource {
    fn get_json(&self, port: u16, path: &str, params: &[(&str, &str)]) -> Result<Value, SolrFault> {
        let url = format!("http://{}:{}{}", self.host, port, path);
        let value = self
            .client
            .get(&url)
            .query(params)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(value)
    }
}

/// Name of the first core in a `cores?action=STATUS` response.
pub fn first_core(response: &Value) -> Option<String> {
    response
        .get("status")?
        .as_object()?
        .keys()
        .next()
        .cloned()
}

fn number(value: &Value) -> Option<MetricValue> {
    value
        .as_i64()
        .map(MetricValue::Int)
        .or_else(|| value.as_u64().map(MetricValue::UInt))
        .or_else(|| value.as_f64().map(MetricValue::Float))
}

/// Picks `keys` out of `obj`, naming each `<prefix>.<key>`.
fn extract(obj: Option<&Value>, prefix: &str, keys: &[&str]) -> Vec<(String, MetricValue)> {
    let Some(obj) = obj else {
        return Vec::new();
    };
    keys.iter()
        .filter_map(|key| {
            let value = obj.get(*key).and_then(number);
            if value.is_none() {
                debug!(prefix, key, "solr value missing");
            }
            value.map(|v| (format!("{}.{}", prefix, key), v))
        })
        .collect()
}

/// JVM memory metrics from an `admin/system` response.
pub fn jvm_memory_metrics(port: u16, response: &Value) -> Vec<(String, MetricValue)> {
    let raw = response.pointer("/jvm/memory/raw");
    extract(raw, &format!("{}.jvm.mem", port), MEMORY_KEYS)
}

/// Thread metrics from an `admin/threads` response.
pub fn thread_metrics(port: u16, response: &Value) -> Vec<(String, MetricValue)> {
    let counts = response.pointer("/system/threadCount");
    extract(counts, &format!("{}.jvm.threads", port), THREAD_KEYS)
}

/// Polls the Solr admin API on every configured port.
pub struct SolrCollector<S: JsonSource> {
    source: S,
    config: SolrConfig,
}

impl SolrCollector<HttpJsonSource> {
    pub fn from_config(config: SolrConfig) -> Result<Self, SolrFault> {
        let source = HttpJsonSource::new(&config.host, config.timeout)?;
        Ok(Self::new(source, config))
    }
}

impl<S: JsonSource> SolrCollector<S> {
    pub fn new(source: S, config: SolrConfig) -> Self {
        Self { source, config }
    }

    fn fetch(&self, port: u16, path: &str, params: &[(&str, &str)]) -> Option<Value> {
        match self.source.get_json(port, path, params) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    host = %self.config.host,
                    port,
                    path,
                    error = %e,
                    "unable to connect to URL, or timed out"
                );
                None
            }
        }
    }

    /// Collects one port. Returns the metrics in publish order.
    pub fn collect_port(&self, port: u16) -> Vec<(String, MetricValue)> {
        let core = self
            .fetch(port, "/solr/admin/cores", &[("action", "STATUS"), ("wt", "json")])
            .as_ref()
            .and_then(first_core);
        let Some(core) = core else {
            warn!(port, "no cores found to do operations on");
            return Vec::new();
        };

        let params = [("stats", "true"), ("wt", "json")];
        let mut metrics = Vec::new();

        if self.config.stat_enabled("jvm")
            && let Some(response) =
                self.fetch(port, &format!("/solr/{}/admin/system", core), &params)
        {
            metrics.extend(jvm_memory_metrics(port, &response));
        }

        if self.config.stat_enabled("threads")
            && let Some(response) =
                self.fetch(port, &format!("/solr/{}/admin/threads", core), &params)
        {
            metrics.extend(thread_metrics(port, &response));
        }

        metrics
    }
}

impl<S: JsonSource> Collector for SolrCollector<S> {
    fn name(&self) -> &str {
        &self.config.path
    }

    fn collect(&mut self, sink: &mut dyn MetricSink) -> Result<(), CollectError> {
        for &port in &self.config.ports {
            let metrics = self.collect_port(port);
            let published = metrics.len();
            for (key, value) in metrics {
                sink.publish(&key, value);
            }
            info!(host = %self.config.host, port, published, "solr pass complete");
        }
        Ok(())
    }
}
