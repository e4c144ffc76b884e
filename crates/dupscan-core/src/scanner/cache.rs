//! Bounded LRU cache for computed token lists.
//!
//! Tokenizing a file is the one place where cross-invocation reuse pays off,
//! so token lists are cached per (path, encoding, language) triple. The
//! cache stores only the token vectors — no source handles and no loggers —
//! so it can never pin a larger resource tree in memory. Eviction is an
//! explicit bounded LRU rather than anything garbage-collector-observable.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::models::{Language, Token};

type CachedTokens = Arc<OnceLock<Arc<Vec<Token>>>>;

/// Shared token cache, safe to use from rayon workers.
pub struct TokenCache {
    max_entries: usize,
    entries: Mutex<IndexMap<String, CachedTokens>>,
}

impl TokenCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Mutex::new(IndexMap::new()),
        }
    }

    fn cache_key(path: &str, encoding: &str, language: Language) -> String {
        format!("{path}|{encoding}|{}", language.name())
    }

    /// Return the cached token list for the triple, computing it at most
    /// once per distinct key while the entry stays resident.
    ///
    /// The outer lock is released before `compute` runs, so scans of
    /// different files proceed in parallel; concurrent requests for the
    /// same key block on the per-entry cell instead of recomputing.
    pub fn get_or_scan<F>(
        &self,
        path: &str,
        encoding: &str,
        language: Language,
        compute: F,
    ) -> Arc<Vec<Token>>
    where
        F: FnOnce() -> Vec<Token>,
    {
        let key = Self::cache_key(path, encoding, language);

        let cell = {
            let mut entries = self.entries.lock();
            if let Some(cell) = entries.get(&key) {
                let cell = Arc::clone(cell);
                // Move to end for LRU.
                let entry = entries.shift_remove(&key).unwrap();
                entries.insert(key, entry);
                cell
            } else {
                let cell: CachedTokens = Arc::new(OnceLock::new());
                entries.insert(key, Arc::clone(&cell));
                while entries.len() > self.max_entries {
                    entries.shift_remove_index(0);
                }
                cell
            }
        };

        Arc::clone(cell.get_or_init(|| Arc::new(compute())))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn token(origin: &str) -> Token {
        Token::new(TokenKind::Identifier, "x", 0, 1, 1, origin)
    }

    #[test]
    fn test_computes_once_per_key() {
        let cache = TokenCache::new(8);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let toks = cache.get_or_scan("a.java", "utf-8", Language::Java, || {
                calls.fetch_add(1, Ordering::SeqCst);
                vec![token("a.java")]
            });
            assert_eq!(toks.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let cache = TokenCache::new(8);
        cache.get_or_scan("a.java", "utf-8", Language::Java, || vec![token("a.java")]);
        cache.get_or_scan("a.java", "utf-8", Language::CSharp, || vec![]);
        cache.get_or_scan("a.java", "latin1", Language::Java, || vec![]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_lru_eviction_drops_oldest() {
        let cache = TokenCache::new(2);
        cache.get_or_scan("a", "utf-8", Language::Java, || vec![token("a")]);
        cache.get_or_scan("b", "utf-8", Language::Java, || vec![token("b")]);
        // Touch "a" so "b" is now the least recently used entry.
        cache.get_or_scan("a", "utf-8", Language::Java, || unreachable!());
        cache.get_or_scan("c", "utf-8", Language::Java, || vec![token("c")]);

        let recomputed = AtomicUsize::new(0);
        cache.get_or_scan("b", "utf-8", Language::Java, || {
            recomputed.fetch_add(1, Ordering::SeqCst);
            vec![token("b")]
        });
        assert_eq!(recomputed.load(Ordering::SeqCst), 1);
    }
}
