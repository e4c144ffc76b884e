//! In-memory clone report model and its small wire-level value types.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use crate::errors::{DupscanError, DupscanResult};

// ---------------------------------------------------------------------------
// Gaps
// ---------------------------------------------------------------------------

/// A filtered-out sub-region inside a clone instance, in unit indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gap {
    pub start: usize,
    pub end: usize,
}

/// Renders a gap list as `"3-5,10-12"`; an empty list renders empty.
pub fn format_gaps(gaps: &[Gap]) -> String {
    gaps.iter()
        .map(|gap| format!("{}-{}", gap.start, gap.end))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses the `format_gaps` encoding. Empty input yields no gaps; a
/// segment without exactly one `-` is a report error.
pub fn parse_gaps(text: &str) -> DupscanResult<Vec<Gap>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut gaps = Vec::new();
    for segment in text.split(',') {
        let mut parts = segment.split('-');
        let (start, end) = match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => (start, end),
            _ => {
                return Err(DupscanError::Report(format!(
                    "malformed gap segment '{segment}'"
                )))
            }
        };
        let start = start
            .parse::<usize>()
            .map_err(|_| DupscanError::Report(format!("malformed gap segment '{segment}'")))?;
        let end = end
            .parse::<usize>()
            .map_err(|_| DupscanError::Report(format!("malformed gap segment '{segment}'")))?;
        gaps.push(Gap { start, end });
    }
    Ok(gaps)
}

// ---------------------------------------------------------------------------
// Typed key/value store
// ---------------------------------------------------------------------------

/// A report value together with a type tag that survives the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl ReportValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ReportValue::Integer(_) => "integer",
            ReportValue::Float(_) => "float",
            ReportValue::Boolean(_) => "boolean",
            ReportValue::Text(_) => "string",
        }
    }

    pub fn render(&self) -> String {
        match self {
            ReportValue::Integer(v) => v.to_string(),
            ReportValue::Float(v) => v.to_string(),
            ReportValue::Boolean(v) => v.to_string(),
            ReportValue::Text(v) => v.clone(),
        }
    }

    pub fn parse(type_name: &str, text: &str) -> DupscanResult<Self> {
        match type_name {
            "integer" => text
                .parse()
                .map(ReportValue::Integer)
                .map_err(|_| DupscanError::Report(format!("bad integer value '{text}'"))),
            "float" => text
                .parse()
                .map(ReportValue::Float)
                .map_err(|_| DupscanError::Report(format!("bad float value '{text}'"))),
            "boolean" => text
                .parse()
                .map(ReportValue::Boolean)
                .map_err(|_| DupscanError::Report(format!("bad boolean value '{text}'"))),
            "string" => Ok(ReportValue::Text(text.to_string())),
            other => Err(DupscanError::Report(format!(
                "unknown value type '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct StoredValue {
    value: ReportValue,
    transient: bool,
}

/// Insertion-ordered key/value store attached to a report. Transient
/// entries are visible in memory but never serialized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueStore {
    entries: IndexMap<String, StoredValue>,
}

impl ValueStore {
    pub fn set(&mut self, key: impl Into<String>, value: ReportValue) {
        self.entries.insert(
            key.into(),
            StoredValue {
                value,
                transient: false,
            },
        );
    }

    pub fn set_transient(&mut self, key: impl Into<String>, value: ReportValue) {
        self.entries.insert(
            key.into(),
            StoredValue {
                value,
                transient: true,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.entries.get(key).map(|stored| &stored.value)
    }

    pub fn persistent_entries(&self) -> impl Iterator<Item = (&str, &ReportValue)> {
        self.entries
            .iter()
            .filter(|(_, stored)| !stored.transient)
            .map(|(key, stored)| (key.as_str(), &stored.value))
    }

    /// True when serialization would have nothing to write.
    pub fn is_persistently_empty(&self) -> bool {
        self.entries.values().all(|stored| stored.transient)
    }
}

// ---------------------------------------------------------------------------
// Report structures
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFileDescriptor {
    pub id: u32,
    pub path: String,
    pub location: String,
    pub length: u64,
    pub fingerprint: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CloneInstance {
    pub id: u32,
    pub fingerprint: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub source_file_id: u32,
    pub start_unit_index_in_file: usize,
    pub length_in_units: usize,
    pub delta_in_units: usize,
    pub gaps: Vec<Gap>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CloneClass {
    pub id: u32,
    pub normalized_length: usize,
    pub fingerprint: String,
    pub clones: Vec<CloneInstance>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloneReport {
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub values: ValueStore,
    pub source_files: Vec<SourceFileDescriptor>,
    pub clone_classes: Vec<CloneClass>,
}

impl CloneReport {
    /// Puts every collection into the canonical output order so that two
    /// writes of equivalent reports are byte-identical. Source files sort
    /// by id, classes by descending normalized length with the fingerprint
    /// as tiebreaker, clones within a class by file then offset.
    pub fn sort_for_output(&mut self) {
        self.source_files.sort_by_key(|file| file.id);
        for class in &mut self.clone_classes {
            class
                .clones
                .sort_by_key(|clone| (clone.source_file_id, clone.start_offset));
        }
        self.clone_classes.sort_by(|a, b| {
            b.normalized_length
                .cmp(&a.normalized_length)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_round_trip() {
        let gaps = vec![Gap { start: 3, end: 5 }, Gap { start: 10, end: 12 }];
        let text = format_gaps(&gaps);
        assert_eq!(text, "3-5,10-12");
        assert_eq!(parse_gaps(&text).unwrap(), gaps);
    }

    #[test]
    fn test_empty_gap_string_yields_no_gaps() {
        assert_eq!(format_gaps(&[]), "");
        assert!(parse_gaps("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_gap_segments_fail() {
        assert!(parse_gaps("3-5,10").is_err());
        assert!(parse_gaps("3-5-7").is_err());
        assert!(parse_gaps("a-b").is_err());
        assert!(parse_gaps(",").is_err());
    }

    #[test]
    fn test_value_round_trip_by_type_name() {
        let values = vec![
            ReportValue::Integer(-42),
            ReportValue::Float(2.5),
            ReportValue::Boolean(true),
            ReportValue::Text("clone run".to_string()),
        ];
        for value in values {
            let parsed = ReportValue::parse(value.type_name(), &value.render()).unwrap();
            assert_eq!(parsed, value);
        }
        assert!(ReportValue::parse("decimal", "1").is_err());
        assert!(ReportValue::parse("integer", "x").is_err());
    }

    #[test]
    fn test_transient_values_are_invisible_to_serialization() {
        let mut store = ValueStore::default();
        store.set_transient("scratch", ReportValue::Integer(1));
        assert!(store.is_persistently_empty());
        assert!(store.get("scratch").is_some());

        store.set("units", ReportValue::Integer(812));
        assert!(!store.is_persistently_empty());
        let keys: Vec<&str> = store.persistent_entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["units"]);
    }

    #[test]
    fn test_sort_for_output_is_canonical() {
        let clone = |file: u32, offset: usize| CloneInstance {
            id: 0,
            fingerprint: "cf".to_string(),
            start_line: 1,
            end_line: 2,
            start_offset: offset,
            end_offset: offset + 10,
            source_file_id: file,
            start_unit_index_in_file: 0,
            length_in_units: 5,
            delta_in_units: 0,
            gaps: Vec::new(),
        };
        let mut report = CloneReport {
            clone_classes: vec![
                CloneClass {
                    id: 1,
                    normalized_length: 5,
                    fingerprint: "bbb".to_string(),
                    clones: vec![clone(2, 0), clone(1, 40), clone(1, 10)],
                },
                CloneClass {
                    id: 2,
                    normalized_length: 9,
                    fingerprint: "aaa".to_string(),
                    clones: Vec::new(),
                },
                CloneClass {
                    id: 3,
                    normalized_length: 5,
                    fingerprint: "aaa".to_string(),
                    clones: Vec::new(),
                },
            ],
            ..CloneReport::default()
        };
        report.sort_for_output();
        let order: Vec<u32> = report.clone_classes.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        let clones: Vec<(u32, usize)> = report.clone_classes[2]
            .clones
            .iter()
            .map(|c| (c.source_file_id, c.start_offset))
            .collect();
        assert_eq!(clones, vec![(1, 10), (1, 40), (2, 0)]);
    }
}
