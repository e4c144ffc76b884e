//! Clone class construction from the normalized unit stream.
//!
//! Detection is exact matching over normalized content: every window of
//! `min_clone_length` content units is grouped by its normalized text,
//! groups with at least two disjoint occurrences are extended to maximal
//! length, and groups fully covered by a longer class are dropped.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{DupscanError, DupscanResult};
use crate::models::{ContentUnit, Unit};
use crate::report::model::{CloneClass, CloneInstance};

const KEY_SEPARATOR: char = '\u{1f}';

fn content_at(units: &[Unit], index: usize) -> Option<&ContentUnit> {
    units.get(index).and_then(|unit| unit.as_content())
}

fn window_key(units: &[Unit], start: usize, length: usize) -> Option<String> {
    let mut key = String::new();
    for index in start..start + length {
        let content = content_at(units, index)?;
        if index > start {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&content.normalized_content);
    }
    Some(key)
}

fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CandidateClass {
    starts: Vec<usize>,
    length: usize,
}

impl CandidateClass {
    fn intervals(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.starts
            .iter()
            .map(move |&start| (start, start + self.length - 1))
    }
}

/// Finds clone classes over a unit stream that carries file-boundary
/// sentinels. Origins are translated to numeric file ids through
/// `file_ids`; a window never spans a sentinel because sentinels have no
/// content to key on.
pub fn detect_clones(
    units: &[Unit],
    min_clone_length: usize,
    file_ids: &IndexMap<String, u32>,
) -> DupscanResult<Vec<CloneClass>> {
    if min_clone_length < 1 {
        return Err(DupscanError::Config(
            "min_clone_length must be positive".to_string(),
        ));
    }
    if units.len() < min_clone_length {
        return Ok(Vec::new());
    }

    // Group window start positions by normalized window text.
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for start in 0..=units.len() - min_clone_length {
        if let Some(key) = window_key(units, start, min_clone_length) {
            groups.entry(key).or_default().push(start);
        }
    }

    let mut candidates: Vec<CandidateClass> = Vec::new();
    for starts in groups.into_values() {
        if starts.len() < 2 {
            continue;
        }
        let length = extend_to_maximal(units, &starts, min_clone_length);
        let starts = select_disjoint(&starts, length);
        if starts.len() < 2 {
            continue;
        }
        candidates.push(CandidateClass { starts, length });
    }

    // Longer classes win; a candidate whose every occurrence lies inside
    // some accepted occurrence adds no information.
    candidates.sort_by_key(|candidate| (std::cmp::Reverse(candidate.length), candidate.starts[0]));
    let mut accepted: Vec<CandidateClass> = Vec::new();
    for candidate in candidates {
        let subsumed = candidate.intervals().all(|(start, end)| {
            accepted.iter().any(|kept| {
                kept.intervals()
                    .any(|(kept_start, kept_end)| kept_start <= start && end <= kept_end)
            })
        });
        if !subsumed {
            accepted.push(candidate);
        }
    }

    let mut classes = Vec::new();
    for (class_index, candidate) in accepted.iter().enumerate() {
        let key = window_key(units, candidate.starts[0], candidate.length)
            .unwrap_or_default();
        let mut clones = Vec::new();
        for (clone_index, &start) in candidate.starts.iter().enumerate() {
            let first = content_at(units, start).ok_or_else(|| {
                DupscanError::Report("clone window lost its content".to_string())
            })?;
            let last = content_at(units, start + candidate.length - 1).ok_or_else(|| {
                DupscanError::Report("clone window lost its content".to_string())
            })?;
            let source_file_id = *file_ids.get(&first.origin).ok_or_else(|| {
                DupscanError::Report(format!("unknown origin '{}'", first.origin))
            })?;
            clones.push(CloneInstance {
                id: clone_index as u32 + 1,
                fingerprint: fingerprint(&format!(
                    "{}:{}:{}",
                    first.origin, first.start_offset, key
                )),
                start_line: first.line_number,
                end_line: last.line_number,
                start_offset: first.start_offset,
                end_offset: last.end_offset,
                source_file_id,
                start_unit_index_in_file: first.index_in_file,
                length_in_units: candidate.length,
                delta_in_units: 0,
                gaps: Vec::new(),
            });
        }
        classes.push(CloneClass {
            id: class_index as u32 + 1,
            normalized_length: candidate.length,
            fingerprint: fingerprint(&key),
            clones,
        });
    }

    debug!(classes = classes.len(), "clone detection finished");
    Ok(classes)
}

/// Grows the window while every occurrence still matches the first one.
fn extend_to_maximal(units: &[Unit], starts: &[usize], min_length: usize) -> usize {
    let mut length = min_length;
    loop {
        let Some(reference) = content_at(units, starts[0] + length) else {
            return length;
        };
        let all_match = starts[1..].iter().all(|&start| {
            content_at(units, start + length)
                .is_some_and(|content| content.normalized_content == reference.normalized_content)
        });
        if !all_match {
            return length;
        }
        length += 1;
    }
}

/// Keeps the leftmost occurrence of each overlapping cluster.
fn select_disjoint(starts: &[usize], length: usize) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut last_end: Option<usize> = None;
    for &start in starts {
        if last_end.is_none_or(|end| start > end) {
            selected.push(start);
            last_end = Some(start + length - 1);
        }
    }
    selected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SentinelUnit, TokenKind};

    fn unit(origin: &str, normalized: &str, offset: usize, index: usize) -> Unit {
        Unit::Content(ContentUnit {
            normalized_content: normalized.to_string(),
            original_content: normalized.to_string(),
            start_offset: offset,
            end_offset: offset + normalized.len(),
            line_number: offset / 10 + 1,
            origin: origin.to_string(),
            kind: TokenKind::Identifier,
            index_in_file: index,
        })
    }

    fn stream(origin: &str, contents: &[&str]) -> Vec<Unit> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| unit(origin, c, i * 10, i))
            .collect()
    }

    fn ids(origins: &[&str]) -> IndexMap<String, u32> {
        origins
            .iter()
            .enumerate()
            .map(|(i, o)| (o.to_string(), i as u32 + 1))
            .collect()
    }

    #[test]
    fn test_detects_cross_file_clone() {
        let mut units = stream("a", &["id0", "=", "id1", "+", "id1", ";"]);
        units.push(Unit::Sentinel(SentinelUnit {
            origin: "a".to_string(),
        }));
        units.extend(stream("b", &["id0", "=", "id1", "+", "id1", ";"]));
        let classes = detect_clones(&units, 3, &ids(&["a", "b"])).unwrap();
        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.normalized_length, 6);
        assert_eq!(class.clones.len(), 2);
        assert_eq!(class.clones[0].source_file_id, 1);
        assert_eq!(class.clones[1].source_file_id, 2);
        assert_eq!(class.clones[1].start_unit_index_in_file, 0);
        assert_eq!(class.clones[0].length_in_units, 6);
        assert_eq!(class.clones[0].delta_in_units, 0);
        assert!(class.clones[0].gaps.is_empty());
    }

    #[test]
    fn test_windows_never_span_sentinels() {
        let mut units = stream("a", &["x", "y"]);
        units.push(Unit::Sentinel(SentinelUnit {
            origin: "a".to_string(),
        }));
        units.extend(stream("a", &["x", "y"]));
        // Only windows of length 2 exist on each side; the pair repeats.
        let classes = detect_clones(&units, 2, &ids(&["a"])).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].normalized_length, 2);
        // Nothing of length 3 can exist across the sentinel.
        let classes = detect_clones(&units, 3, &ids(&["a"])).unwrap();
        assert!(classes.is_empty());
    }

    #[test]
    fn test_shorter_windows_inside_longer_clone_are_subsumed() {
        let mut units = stream("a", &["p", "q", "r", "s", "z1"]);
        units.extend(stream("b", &["p", "q", "r", "s", "z2"]));
        let classes = detect_clones(&units, 2, &ids(&["a", "b"])).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].normalized_length, 4);
    }

    #[test]
    fn test_single_occurrence_produces_no_class() {
        let units = stream("a", &["one", "two", "three"]);
        assert!(detect_clones(&units, 2, &ids(&["a"])).unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_occurrences_collapse_to_disjoint_instances() {
        // Six identical units: windows overlap heavily but the class must
        // keep only disjoint instances.
        let units = stream("a", &["k", "k", "k", "k", "k", "k"]);
        let classes = detect_clones(&units, 2, &ids(&["a"])).unwrap();
        for class in &classes {
            let mut previous_end: Option<usize> = None;
            for clone in &class.clones {
                if let Some(end) = previous_end {
                    assert!(clone.start_offset > end);
                }
                previous_end = Some(clone.end_offset);
            }
            assert!(class.clones.len() >= 2);
        }
    }

    #[test]
    fn test_zero_min_length_is_a_config_error() {
        let units = stream("a", &["x"]);
        assert!(detect_clones(&units, 0, &ids(&["a"])).is_err());
    }

    #[test]
    fn test_unknown_origin_is_a_report_error() {
        let units = stream("mystery", &["x", "y", "x", "y"]);
        assert!(detect_clones(&units, 2, &ids(&["a"])).is_err());
    }

    #[test]
    fn test_deterministic_class_ids_across_runs() {
        let mut units = stream("a", &["m", "n", "o", "m", "n", "o"]);
        units.extend(stream("b", &["u", "v", "u", "v"]));
        let first = detect_clones(&units, 2, &ids(&["a", "b"])).unwrap();
        let second = detect_clones(&units, 2, &ids(&["a", "b"])).unwrap();
        assert_eq!(first, second);
    }
}
