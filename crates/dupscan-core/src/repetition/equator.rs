//! Pluggable equality predicates for motif matching.

use crate::models::Unit;
use crate::repetition::statements::StatementUnit;

/// Decides whether two sequence elements match for repetition purposes.
///
/// The configuration space is a small closed set, so implementations are
/// concrete types chosen ahead of time rather than anything reflective.
pub trait Equator<T: ?Sized> {
    fn equals(&self, left: &T, right: &T) -> bool;
}

/// Plain value equality via `PartialEq`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueEquator;

impl<T: PartialEq> Equator<T> for ValueEquator {
    fn equals(&self, left: &T, right: &T) -> bool {
        left == right
    }
}

/// Equality over normalized units: content units match by normalized
/// content; a sentinel matches nothing, not even another sentinel.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitContentEquator;

impl Equator<Unit> for UnitContentEquator {
    fn equals(&self, left: &Unit, right: &Unit) -> bool {
        match (left.as_content(), right.as_content()) {
            (Some(a), Some(b)) => a.normalized_content == b.normalized_content,
            _ => false,
        }
    }
}

/// Structural statement equality: equal-length unit sequences whose token
/// kinds match element-wise. Content is intentionally ignored so that
/// structurally identical statements with different literal values or
/// identifier names still count as repeating. Two absent statements
/// compare equal; absent never equals present.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatementTypeEquator;

impl Equator<Option<StatementUnit>> for StatementTypeEquator {
    fn equals(&self, left: &Option<StatementUnit>, right: &Option<StatementUnit>) -> bool {
        match (left, right) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.kinds().len() == b.kinds().len()
                    && a.kinds().iter().zip(b.kinds().iter()).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
