//! Named, region-scoped offset intervals used to select configurations and
//! to mark ignored stretches of a file.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

/// One inclusive byte-offset interval inside a single file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

/// A set of disjoint regions per origin file.
///
/// Construction is per file: a file whose declared regions are malformed
/// (inverted or overlapping) keeps *none* of them — that file's region info
/// is skipped with a warning and processing continues.
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    by_origin: IndexMap<String, Vec<Region>>,
}

impl RegionSet {
    /// Install the regions for one origin after validating them.
    ///
    /// Returns false (and logs a warning) when the data is malformed; the
    /// origin then has no regions in this set.
    pub fn set_regions(&mut self, origin: &str, mut regions: Vec<Region>) -> bool {
        regions.sort_by_key(|r| r.start);
        for window in regions.windows(2) {
            if window[0].end >= window[1].start {
                warn!(origin, "overlapping regions declared; skipping region info for file");
                return false;
            }
        }
        if regions.iter().any(|r| r.start > r.end) {
            warn!(origin, "inverted region declared; skipping region info for file");
            return false;
        }
        self.by_origin.insert(origin.to_string(), regions);
        true
    }

    /// Whether `offset` in `origin` falls inside any region of this set.
    pub fn contains(&self, origin: &str, offset: usize) -> bool {
        let Some(regions) = self.by_origin.get(origin) else {
            return false;
        };
        // Regions are sorted and disjoint.
        match regions.binary_search_by(|r| {
            if offset < r.start {
                std::cmp::Ordering::Greater
            } else if offset > r.end {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        }) {
            Ok(_) => true,
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }
}

/// All named region sets declared for one input root.
#[derive(Clone, Debug, Default)]
pub struct RegionCatalog {
    sets: IndexMap<String, RegionSet>,
}

/// Serializable form of a catalog: set name → origin → regions.
pub type RegionCatalogSpec = IndexMap<String, IndexMap<String, Vec<Region>>>;

impl RegionCatalog {
    /// Build a catalog from its serialized form, dropping malformed per-file
    /// entries with a warning.
    pub fn from_spec(spec: &RegionCatalogSpec) -> Self {
        let mut catalog = RegionCatalog::default();
        for (name, origins) in spec {
            let set = catalog.sets.entry(name.clone()).or_default();
            for (origin, regions) in origins {
                set.set_regions(origin, regions.clone());
            }
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&RegionSet> {
        self.sets.get(name)
    }

    pub fn insert(&mut self, name: &str, set: RegionSet) {
        self.sets.insert(name.to_string(), set);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_inside_and_outside() {
        let mut set = RegionSet::default();
        assert!(set.set_regions(
            "a.java",
            vec![Region { start: 10, end: 20 }, Region { start: 40, end: 45 }],
        ));
        assert!(set.contains("a.java", 10));
        assert!(set.contains("a.java", 15));
        assert!(set.contains("a.java", 20));
        assert!(!set.contains("a.java", 21));
        assert!(set.contains("a.java", 42));
        assert!(!set.contains("b.java", 15));
    }

    #[test]
    fn test_overlapping_regions_are_rejected_per_file() {
        let mut set = RegionSet::default();
        assert!(!set.set_regions(
            "a.java",
            vec![Region { start: 0, end: 10 }, Region { start: 5, end: 15 }],
        ));
        // The malformed file keeps no regions; other files are unaffected.
        assert!(!set.contains("a.java", 7));
        assert!(set.set_regions("b.java", vec![Region { start: 0, end: 3 }]));
        assert!(set.contains("b.java", 2));
    }

    #[test]
    fn test_inverted_region_rejected() {
        let mut set = RegionSet::default();
        assert!(!set.set_regions("a.java", vec![Region { start: 9, end: 3 }]));
    }

    #[test]
    fn test_catalog_from_spec() {
        let json = r#"{ "ignore": { "a.java": [ { "start": 0, "end": 4 } ] } }"#;
        let spec: RegionCatalogSpec = serde_json::from_str(json).unwrap();
        let catalog = RegionCatalog::from_spec(&spec);
        assert!(catalog.get("ignore").unwrap().contains("a.java", 2));
        assert!(catalog.get("other").is_none());
    }
}
