//! Parsers for memcached `stats` and `stats slabs` replies.
//!
//! Pure functions over the response text. Lines that do not fit the expected
//! shape are skipped without error: the protocol interleaves lines this
//! collector has no use for.

use std::collections::BTreeMap;

use crate::sample::MetricValue;

/// Leading token of every stat line.
pub const STAT_TAG: &str = "STAT";

/// Reply terminator sent after the last stat line.
pub const END_MARKER: &str = "END";

/// Status fields that carry no numeric meaning.
pub const IGNORED_FIELDS: &[&str] = &[
    "libevent",
    "pointer_size",
    "time",
    "version",
    "repcached_version",
    "replication",
    "accepting_conns",
];

/// Field holding the server's process id.
pub const PID_FIELD: &str = "pid";

/// One parsed `STAT <key> <value>` line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusField {
    pub key: String,
    pub value: MetricValue,
}

/// Parsed `stats` reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBlock {
    /// Numeric fields by name. A repeated key keeps the last value.
    pub fields: BTreeMap<String, MetricValue>,
    /// Server pid, kept out of `fields`.
    pub pid: Option<u32>,
}

impl StatusBlock {
    pub fn get(&self, key: &str) -> Option<MetricValue> {
        self.fields.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetricValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = StatusField> + '_ {
        self.fields.iter().map(|(key, value)| StatusField {
            key: key.clone(),
            value: *value,
        })
    }
}

/// Parses the flat `stats` reply.
///
/// Keeps lines of exactly three tokens `STAT <key> <value>` whose key is not
/// ignored. Values containing `.` become floats, all others integers
/// (unsigned when above `i64::MAX`).
pub fn parse_stats(content: &str) -> StatusBlock {
    let mut block = StatusBlock::default();

    for line in content.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [tag, key, value] = tokens.as_slice() else {
            continue;
        };
        if *tag != STAT_TAG || IGNORED_FIELDS.contains(key) {
            continue;
        }
        if *key == PID_FIELD {
            block.pid = value.parse().ok();
            continue;
        }
        if let Some(value) = MetricValue::parse(value) {
            block.insert(*key, value);
        }
    }

    block
}

/// One `STAT <slab>:<field> <value>` line.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabEntry {
    pub slab_index: String,
    pub field: String,
    pub value: MetricValue,
}

/// One of the two trailing `STAT <field> <value>` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabOverallEntry {
    pub field: String,
    pub value: u64,
}

/// Parsed `stats slabs` reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlabStats {
    /// Per-slab entries in reply order.
    pub slabs: Vec<SlabEntry>,
    pub overall: Vec<SlabOverallEntry>,
}

impl SlabStats {
    /// Groups per-slab entries by slab index.
    pub fn by_slab(&self) -> BTreeMap<&str, Vec<&SlabEntry>> {
        let mut groups: BTreeMap<&str, Vec<&SlabEntry>> = BTreeMap::new();
        for entry in &self.slabs {
            groups.entry(entry.slab_index.as_str()).or_default().push(entry);
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty() && self.overall.is_empty()
    }
}

/// Parses the tabular `stats slabs` reply.
///
/// After dropping a final `END` line, the last two lines are the overall
/// trailer and everything before them is per-slab. The split is positional:
/// a truncated reply puts per-slab lines into the trailer slot.
pub fn parse_slabs(content: &str) -> SlabStats {
    let mut lines: Vec<&str> = content.lines().collect();
    if lines.last().is_some_and(|l| l.trim() == END_MARKER) {
        lines.pop();
    }

    let split = lines.len().saturating_sub(2);
    let (slab_lines, overall_lines) = lines.split_at(split);

    SlabStats {
        slabs: slab_lines.iter().filter_map(|l| parse_slab_line(l)).collect(),
        overall: overall_lines
            .iter()
            .filter_map(|l| parse_overall_line(l))
            .collect(),
    }
}

/// `STAT <1-3 digits>:<field> <digits and dots>`
fn parse_slab_line(line: &str) -> Option<SlabEntry> {
    let rest = line.strip_prefix(STAT_TAG)?.strip_prefix(' ')?;
    let (index, rest) = rest.split_once(':')?;
    if index.is_empty() || index.len() > 3 || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (field, value) = rest.trim_end().rsplit_once(' ')?;
    if field.is_empty()
        || value.is_empty()
        || !value.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }

    Some(SlabEntry {
        slab_index: index.to_string(),
        field: field.to_string(),
        value: MetricValue::parse(value)?,
    })
}

/// `STAT <field> <digits>`
fn parse_overall_line(line: &str) -> Option<SlabOverallEntry> {
    let rest = line.strip_prefix(STAT_TAG)?.strip_prefix(' ')?;
    let (field, value) = rest.trim_end().rsplit_once(' ')?;
    if field.is_empty() || value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(SlabOverallEntry {
        field: field.to_string(),
        value: value.parse().ok()?,
    })
}
