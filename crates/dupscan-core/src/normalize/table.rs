//! Per-statement identifier numbering.

use indexmap::IndexMap;

/// Injective identifier→id mapping, assigned in first-seen order from 0.
///
/// Scoped to one statement: the normalizer clears the table on every
/// end-of-statement token and on every origin change, so `id0` always means
/// "first distinct identifier of this statement".
#[derive(Debug, Default)]
pub struct IdentifierTable {
    ids: IndexMap<String, usize>,
}

impl IdentifierTable {
    /// Id for `identifier`, assigning the next free id on first sight.
    pub fn id_for(&mut self, identifier: &str) -> usize {
        let next = self.ids.len();
        *self.ids.entry(identifier.to_string()).or_insert(next)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut table = IdentifierTable::default();
        assert_eq!(table.id_for("b"), 0);
        assert_eq!(table.id_for("a"), 1);
        assert_eq!(table.id_for("b"), 0);
        assert_eq!(table.id_for("c"), 2);
    }

    #[test]
    fn test_clear_restarts_numbering() {
        let mut table = IdentifierTable::default();
        table.id_for("x");
        table.id_for("y");
        table.clear();
        assert_eq!(table.id_for("z"), 0);
    }
}
