//! Metric naming and gauge/counter classification.

use tracing::warn;

use super::parser::{SlabStats, StatusBlock};
use crate::sample::{Classification, MetricSink};

/// Status fields that are instantaneous values. Every other field is a counter.
pub const GAUGES: &[&str] = &[
    "bytes",
    "connection_structures",
    "curr_connections",
    "curr_items",
    "threads",
    "reserved_fds",
    "limit_maxbytes",
    "hash_power_level",
    "hash_bytes",
    "hash_is_expanding",
    "uptime",
];

/// Classifies a status field by name alone.
pub fn classify(field: &str) -> Classification {
    if GAUGES.contains(&field) {
        Classification::Gauge
    } else {
        Classification::Counter
    }
}

/// Publishes status fields as `<alias>.<field>`.
///
/// With an allow-list only the listed fields are published, in list order;
/// a listed field missing from the reply is logged and skipped. Without one,
/// every parsed field is published. Returns the number of samples published.
pub fn publish_status(
    alias: &str,
    status: &StatusBlock,
    allow_list: Option<&[String]>,
    sink: &mut dyn MetricSink,
) -> usize {
    let wanted: Vec<&str> = match allow_list {
        Some(list) => list.iter().map(String::as_str).collect(),
        None => status.fields.keys().map(String::as_str).collect(),
    };

    let mut published = 0;
    for field in wanted {
        let Some(value) = status.get(field) else {
            warn!(alias, field, "no such key available, issue 'stats' for a full list");
            continue;
        };

        let key = format!("{}.{}", alias, field);
        match classify(field) {
            Classification::Gauge => sink.publish_gauge(&key, value),
            _ => sink.publish_counter(&key, value),
        }
        published += 1;
    }
    published
}

/// Publishes slab stats unclassified: `slab.<field>` for the overall trailer,
/// `slab.<index>.<field>` per slab. Returns the number of samples published.
pub fn publish_slabs(slabs: &SlabStats, sink: &mut dyn MetricSink) -> usize {
    for entry in &slabs.overall {
        sink.publish(&format!("slab.{}", entry.field), entry.value.into());
    }
    for entry in &slabs.slabs {
        sink.publish(
            &format!("slab.{}.{}", entry.slab_index, entry.field),
            entry.value,
        );
    }
    slabs.overall.len() + slabs.slabs.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::memcached::parser::{parse_slabs, parse_stats};
    use crate::sample::{MetricValue, SampleBuffer};

    #[test]
    fn test_classify() {
        assert_eq!(classify("curr_connections"), Classification::Gauge);
        assert_eq!(classify("bytes"), Classification::Gauge);
        assert_eq!(classify("uptime"), Classification::Gauge);
        assert_eq!(classify("get_hits"), Classification::Counter);
        assert_eq!(classify("limit_maxconn"), Classification::Counter);
    }

    #[test]
    fn test_publish_everything_parsed() {
        let status = parse_stats(
            "STAT curr_connections 5\nSTAT bytes 120.5\nSTAT get_hits 9\nSTAT pid 431\n",
        );
        let mut sink = SampleBuffer::new();

        let n = publish_status("cache1", &status, None, &mut sink);

        assert_eq!(n, 3);
        assert_eq!(sink.len(), 3);
        let conns = sink.get("cache1.curr_connections").unwrap();
        assert_eq!(conns.value, MetricValue::Int(5));
        assert_eq!(conns.classification, Classification::Gauge);
        let bytes = sink.get("cache1.bytes").unwrap();
        assert_eq!(bytes.value, MetricValue::Float(120.5));
        assert_eq!(bytes.classification, Classification::Gauge);
        assert_eq!(
            sink.get("cache1.get_hits").unwrap().classification,
            Classification::Counter
        );
        assert!(sink.get("cache1.pid").is_none());
    }

    #[test]
    fn test_classification_ignores_value() {
        let status = parse_stats("STAT threads -1\nSTAT cmd_get 0\nSTAT evictions -3.5\n");
        let mut sink = SampleBuffer::new();
        publish_status("a", &status, None, &mut sink);

        assert_eq!(sink.get("a.threads").unwrap().classification, Classification::Gauge);
        assert_eq!(sink.get("a.cmd_get").unwrap().classification, Classification::Counter);
        assert_eq!(sink.get("a.evictions").unwrap().classification, Classification::Counter);
    }

    #[test]
    fn test_allow_list_with_missing_field() {
        let status = parse_stats("STAT curr_connections 5\nSTAT get_hits 9\nSTAT get_misses 1\n");
        let allow = vec![
            "get_hits".to_string(),
            "no_such_field".to_string(),
            "curr_connections".to_string(),
        ];
        let mut sink = SampleBuffer::new();

        let n = publish_status("localhost", &status, Some(&allow), &mut sink);

        assert_eq!(n, 2);
        assert!(sink.get("localhost.get_hits").is_some());
        assert!(sink.get("localhost.curr_connections").is_some());
        assert!(sink.get("localhost.no_such_field").is_none());
        assert!(sink.get("localhost.get_misses").is_none());
    }

    #[test]
    fn test_empty_allow_list_publishes_nothing() {
        let status = parse_stats("STAT curr_connections 5\n");
        let mut sink = SampleBuffer::new();
        assert_eq!(publish_status("a", &status, Some(&[]), &mut sink), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_publish_slabs_keys() {
        let slabs = parse_slabs(
            "STAT 1:chunk_size 96\n\
             STAT 12:used_chunks 4\n\
             STAT active_slabs 2\n\
             STAT total_malloced 2048\n\
             END\n",
        );
        let mut sink = SampleBuffer::new();

        assert_eq!(publish_slabs(&slabs, &mut sink), 4);

        let overall = sink.get("slab.active_slabs").unwrap();
        assert_eq!(overall.value, MetricValue::Int(2));
        assert_eq!(overall.classification, Classification::Raw);
        assert_eq!(sink.get("slab.total_malloced").unwrap().value, MetricValue::Int(2048));
        assert_eq!(sink.get("slab.1.chunk_size").unwrap().value, MetricValue::Int(96));
        assert_eq!(
            sink.get("slab.12.used_chunks").unwrap().classification,
            Classification::Raw
        );
    }
}
