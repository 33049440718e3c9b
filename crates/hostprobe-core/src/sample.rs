//! Metric samples and the sink collectors publish into.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A numeric metric value.
///
/// Integer and float are kept apart so that an integer-valued float reported
/// by a server (`"1.0"`) is not silently turned into an integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    /// Unsigned counter above `i64::MAX`.
    UInt(u64),
    Float(f64),
}

impl MetricValue {
    /// Coerces a textual value: anything containing `.` is a float,
    /// everything else an integer. Returns `None` if the text is not numeric.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.contains('.') {
            return raw.parse().ok().map(MetricValue::Float);
        }
        match raw.parse::<i64>() {
            Ok(v) => Some(MetricValue::Int(v)),
            Err(_) => raw.parse::<u64>().ok().map(MetricValue::UInt),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::UInt(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => MetricValue::Int(v),
            Err(_) => MetricValue::UInt(v),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// How the downstream agent should treat a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Instantaneous value.
    Gauge,
    /// Monotonically increasing value, turned into a rate downstream.
    Counter,
    /// Published as-is, no gauge/counter semantics.
    Raw,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Gauge => write!(f, "gauge"),
            Classification::Counter => write!(f, "counter"),
            Classification::Raw => write!(f, "raw"),
        }
    }
}

/// One emitted metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub key: String,
    pub value: MetricValue,
    pub classification: Classification,
}

/// The agent-provided publish sink.
///
/// Collectors only ever call into this; what happens to a sample afterwards
/// (buffering, rate conversion, transport) is up to the agent.
pub trait MetricSink {
    /// Publishes an unclassified sample.
    fn publish(&mut self, key: &str, value: MetricValue);

    fn publish_gauge(&mut self, key: &str, value: MetricValue);

    fn publish_counter(&mut self, key: &str, value: MetricValue);
}

/// In-memory sink keyed by metric key.
///
/// Publishing the same key twice keeps the latest sample.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    samples: BTreeMap<String, MetricSample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: &str, value: MetricValue, classification: Classification) {
        self.samples.insert(
            key.to_string(),
            MetricSample {
                key: key.to_string(),
                value,
                classification,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&MetricSample> {
        self.samples.get(key)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates samples ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.values()
    }

    /// Drains the buffer, returning samples ordered by key.
    pub fn drain(&mut self) -> Vec<MetricSample> {
        std::mem::take(&mut self.samples).into_values().collect()
    }
}

impl MetricSink for SampleBuffer {
    fn publish(&mut self, key: &str, value: MetricValue) {
        self.insert(key, value, Classification::Raw);
    }

    fn publish_gauge(&mut self, key: &str, value: MetricValue) {
        self.insert(key, value, Classification::Gauge);
    }

    fn publish_counter(&mut self, key: &str, value: MetricValue) {
        self.insert(key, value, Classification::Counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_syntactic() {
        assert_eq!(MetricValue::parse("5"), Some(MetricValue::Int(5)));
        assert_eq!(MetricValue::parse("120.5"), Some(MetricValue::Float(120.5)));
        // Integer-valued float stays a float
        assert_eq!(MetricValue::parse("3.0"), Some(MetricValue::Float(3.0)));
        assert_eq!(MetricValue::parse("-7"), Some(MetricValue::Int(-7)));
    }

    #[test]
    fn test_parse_unsigned_above_i64() {
        assert_eq!(
            MetricValue::parse("9223372036854775807"),
            Some(MetricValue::Int(i64::MAX))
        );
        assert_eq!(
            MetricValue::parse("18446744073709551615"),
            Some(MetricValue::UInt(u64::MAX))
        );
        assert_eq!(MetricValue::UInt(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(MetricValue::from(2u64), MetricValue::Int(2));
        assert_eq!(MetricValue::from(u64::MAX), MetricValue::UInt(u64::MAX));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(MetricValue::parse("yes"), None);
        assert_eq!(MetricValue::parse("1.4.15"), None);
        assert_eq!(MetricValue::parse(""), None);
        assert_eq!(MetricValue::parse("99999999999999999999"), None);
    }

    #[test]
    fn test_buffer_overwrites_same_key() {
        let mut buf = SampleBuffer::new();
        buf.publish_counter("a.hits", MetricValue::Int(1));
        buf.publish_gauge("a.hits", MetricValue::Int(2));

        assert_eq!(buf.len(), 1);
        let sample = buf.get("a.hits").unwrap();
        assert_eq!(sample.value, MetricValue::Int(2));
        assert_eq!(sample.classification, Classification::Gauge);
    }

    #[test]
    fn test_buffer_drain_orders_by_key() {
        let mut buf = SampleBuffer::new();
        buf.publish("b", MetricValue::Int(1));
        buf.publish("a", MetricValue::Float(0.5));

        let samples = buf.drain();
        assert!(buf.is_empty());
        let keys: Vec<&str> = samples.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(samples[0].classification, Classification::Raw);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(MetricValue::Int(42).to_string(), "42");
        assert_eq!(MetricValue::Float(120.5).to_string(), "120.5");
    }
}
