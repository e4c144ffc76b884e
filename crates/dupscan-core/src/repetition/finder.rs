//! Generic maximal-repetition search over arbitrary element arrays.
//!
//! A repetition is a contiguous run of at least two consecutive instances of
//! the same motif, where "same" is decided by a pluggable [`Equator`]. The
//! single-length scan is a greedy, leftmost-longest single pass; the
//! composed multi-length search lets short motifs claim their span first so
//! the same physical region is never reported twice under different motif
//! lengths.

use std::collections::HashSet;

use crate::repetition::equator::Equator;
use crate::repetition::params::RepetitionParameters;

// ---------------------------------------------------------------------------
// Repetition value type
// ---------------------------------------------------------------------------

/// One maximal repeated-motif region inside an input array.
///
/// Bounds violations are programmer errors and assert immediately; they are
/// never silently corrected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repetition<'a, T> {
    input: &'a [T],
    start_index: usize,
    end_index: usize,
    motif_length: usize,
}

impl<'a, T> Repetition<'a, T> {
    pub fn new(input: &'a [T], start_index: usize, end_index: usize, motif_length: usize) -> Self {
        assert!(motif_length > 0, "motif length must be positive");
        assert!(
            start_index <= end_index,
            "start index {start_index} exceeds end index {end_index}"
        );
        assert!(
            end_index < input.len(),
            "end index {end_index} outside input of length {}",
            input.len()
        );
        Self {
            input,
            start_index,
            end_index,
            motif_length,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn motif_length(&self) -> usize {
        self.motif_length
    }

    /// Number of elements covered; always a positive multiple of the motif
    /// length, and at least twice the motif length.
    pub fn length(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// How many motif instances the region contains.
    pub fn instance_count(&self) -> usize {
        self.length() / self.motif_length
    }

    /// Element at `offset` from the start of the repetition.
    pub fn get_element(&self, offset: usize) -> &T {
        assert!(
            self.start_index + offset < self.input.len(),
            "element offset {offset} outside input"
        );
        &self.input[self.start_index + offset]
    }
}

// ---------------------------------------------------------------------------
// Finder
// ---------------------------------------------------------------------------

pub struct RepetitionFinder<'a, T, E: Equator<T>> {
    input: &'a [T],
    equator: E,
    params: RepetitionParameters,
}

impl<'a, T, E: Equator<T>> RepetitionFinder<'a, T, E> {
    pub fn new(input: &'a [T], equator: E, params: RepetitionParameters) -> Self {
        Self {
            input,
            equator,
            params,
        }
    }

    fn motifs_equal(&self, left: usize, right: usize, motif_length: usize) -> bool {
        (0..motif_length).all(|i| {
            self.equator
                .equals(&self.input[left + i], &self.input[right + i])
        })
    }

    /// Acceptance check for a candidate window `[start, end)` of motif
    /// length `m`: at least two instances matched, the window is long
    /// enough, and it holds enough instances.
    fn accept(&self, start: usize, end: usize, motif_length: usize) -> bool {
        end > start + motif_length
            && (end - start) >= self.params.min_length()
            && (end - start) / motif_length >= self.params.min_motif_instances()
    }

    /// All maximal repetitions of one fixed motif length, left to right.
    ///
    /// Greedy leftmost-longest scan: while the motif keeps matching the
    /// window grows unconditionally; acceptance is evaluated only once
    /// extension stops, so ties cannot occur.
    pub fn find_repetitions_for(&self, motif_length: usize) -> Vec<Repetition<'a, T>> {
        assert!(motif_length > 0, "motif length must be positive");
        let n = self.input.len();
        let mut found = Vec::new();

        let mut left = 0usize;
        let mut right = motif_length;
        while left < n && right + motif_length <= n {
            if self.motifs_equal(left, right, motif_length) {
                right += motif_length;
            } else {
                if self.accept(left, right, motif_length) {
                    found.push(Repetition::new(self.input, left, right - 1, motif_length));
                    left = right;
                } else {
                    left += 1;
                }
                right = left + motif_length;
            }
        }
        // A repetition running to the end of input has no trailing mismatch
        // to trigger detection; check the outstanding window once more.
        if right <= n && self.accept(left, right, motif_length) {
            found.push(Repetition::new(self.input, left, right - 1, motif_length));
        }

        found
    }

    /// Non-overlapping repetitions across the configured motif-length range.
    ///
    /// The scan always starts at motif length 1, even below the configured
    /// minimum, so short-motif repetitions claim their span first and are
    /// never misreported as an accidental longer-motif repetition. Only the
    /// first claim of an exact interval survives, and only claims at or
    /// above the minimum motif length are reported.
    pub fn find_repetitions(&self) -> Vec<Repetition<'a, T>> {
        let min = self.params.min_motif_length();
        let max = self.params.max_motif_length();
        assert!(min <= max, "motif length range is inverted");

        let mut claimed: HashSet<(usize, usize)> = HashSet::new();
        let mut out = Vec::new();
        for motif_length in 1..=max {
            for repetition in self.find_repetitions_for(motif_length) {
                let interval = (repetition.start_index(), repetition.end_index());
                if claimed.insert(interval) && motif_length >= min {
                    out.push(repetition);
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repetition::equator::ValueEquator;

    fn params(
        min_length: usize,
        min_motif: usize,
        max_motif: usize,
        min_instances: usize,
    ) -> RepetitionParameters {
        RepetitionParameters::new(min_length, min_motif, max_motif, min_instances).unwrap()
    }

    #[test]
    fn test_single_length_scan_boundary_rejection() {
        // Eight 1s qualify; the trailing 2,2 and 8,8 runs fall below the
        // minimum length of 3 and must be rejected.
        let input = [1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 8, 8];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(3, 1, 1, 2));
        let reps = finder.find_repetitions_for(1);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].start_index(), 0);
        assert_eq!(reps[0].end_index(), 7);
        assert_eq!(reps[0].motif_length(), 1);
        assert_eq!(reps[0].instance_count(), 8);
    }

    #[test]
    fn test_repetition_running_to_end_of_input() {
        let input = [9, 5, 5, 5, 5];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(2, 1, 1, 2));
        let reps = finder.find_repetitions_for(1);
        assert_eq!(reps.len(), 1);
        assert_eq!((reps[0].start_index(), reps[0].end_index()), (1, 4));
    }

    #[test]
    fn test_motif_length_two() {
        let input = [7, 1, 2, 1, 2, 1, 2, 9];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(4, 2, 2, 2));
        let reps = finder.find_repetitions_for(2);
        assert_eq!(reps.len(), 1);
        assert_eq!((reps[0].start_index(), reps[0].end_index()), (1, 6));
        assert_eq!(reps[0].instance_count(), 3);
    }

    #[test]
    fn test_min_instances_rejects_two_instance_run() {
        let input = [1, 2, 1, 2, 9];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(2, 2, 2, 3));
        assert!(finder.find_repetitions_for(2).is_empty());
    }

    #[test]
    fn test_multi_length_claims_prevent_duplicate_reports() {
        // "x111111x": the run of six '1's is a motif-length-1 repetition
        // and must not be re-reported at motif lengths 2 or 3.
        let input: Vec<char> = "x111111x".chars().collect();
        let finder = RepetitionFinder::new(&input, ValueEquator, params(2, 1, 3, 2));
        let reps = finder.find_repetitions();
        assert_eq!(reps.len(), 1);
        assert_eq!((reps[0].start_index(), reps[0].end_index()), (1, 6));
        assert_eq!(reps[0].motif_length(), 1);
    }

    #[test]
    fn test_multi_length_min_motif_floor_suppresses_output_but_claims() {
        // With min_motif_length 2 the single-char run is claimed at length
        // 1 but not reported, and the claim still blocks the length-2 view
        // of the same interval.
        let input: Vec<char> = "x111111x".chars().collect();
        let finder = RepetitionFinder::new(&input, ValueEquator, params(2, 2, 3, 2));
        assert!(finder.find_repetitions().is_empty());
    }

    #[test]
    fn test_multi_length_reports_genuine_longer_motif() {
        let input = [5, 1, 2, 1, 2, 1, 2, 6];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(4, 1, 3, 2));
        let reps = finder.find_repetitions();
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].motif_length(), 2);
        assert_eq!((reps[0].start_index(), reps[0].end_index()), (1, 6));
    }

    #[test]
    fn test_output_order_by_motif_length_then_position() {
        let input = [1, 1, 1, 1, 9, 2, 3, 2, 3, 2, 3, 9, 4, 4, 4, 4];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(4, 1, 2, 2));
        let reps = finder.find_repetitions();
        let summary: Vec<(usize, usize)> = reps
            .iter()
            .map(|r| (r.motif_length(), r.start_index()))
            .collect();
        assert_eq!(summary, vec![(1, 0), (1, 12), (2, 5)]);
    }

    #[test]
    fn test_short_and_empty_inputs_yield_nothing() {
        let empty: [i32; 0] = [];
        let finder = RepetitionFinder::new(&empty, ValueEquator, params(2, 1, 2, 2));
        assert!(finder.find_repetitions().is_empty());

        let short = [1];
        let finder = RepetitionFinder::new(&short, ValueEquator, params(2, 1, 2, 2));
        assert!(finder.find_repetitions().is_empty());
    }

    #[test]
    #[should_panic(expected = "end index")]
    fn test_repetition_end_out_of_bounds_panics() {
        let input = [1, 2, 3];
        let _ = Repetition::new(&input, 0, 3, 1);
    }

    #[test]
    #[should_panic(expected = "start index")]
    fn test_repetition_inverted_bounds_panic() {
        let input = [1, 2, 3];
        let _ = Repetition::new(&input, 2, 1, 1);
    }

    #[test]
    #[should_panic(expected = "motif length")]
    fn test_repetition_zero_motif_panics() {
        let input = [1, 2, 3];
        let _ = Repetition::new(&input, 0, 1, 0);
    }

    #[test]
    #[should_panic(expected = "element offset")]
    fn test_get_element_out_of_bounds_panics() {
        let input = [1, 1, 1, 1];
        let finder = RepetitionFinder::new(&input, ValueEquator, params(2, 1, 1, 2));
        let reps = finder.find_repetitions_for(1);
        let _ = reps[0].get_element(10);
    }
}
