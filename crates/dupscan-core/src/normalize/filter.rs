//! Upstream token filtering: ignored regions, ignore patterns, and sentinel
//! substitution at discontinuities.
//!
//! Dropping tokens silently would let two unrelated stretches of code become
//! adjacent in the normalized stream and match as a clone. Whenever this
//! stage removes something, or the raw pre-filter content already had a gap,
//! a sentinel token is substituted so the discontinuity stays visible — and
//! unmatched — downstream.

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::errors::DupscanResult;
use crate::models::{Token, TokenKind};
use crate::normalize::provider::TokenProvider;
use crate::normalize::regions::RegionSet;

// ---------------------------------------------------------------------------
// Gap query capability
// ---------------------------------------------------------------------------

/// External capability answering whether the raw content between two
/// consecutive surviving tokens of one origin contained filtered material.
pub trait GapQuery {
    fn has_gap(&self, origin: &str, prev_end: usize, next_start: usize) -> DupscanResult<bool>;
}

/// Gap query for streams whose raw content is fully tokenized: no gaps.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGaps;

impl GapQuery for NoGaps {
    fn has_gap(&self, _origin: &str, _prev_end: usize, _next_start: usize) -> DupscanResult<bool> {
        Ok(false)
    }
}

/// Gap query backed by the raw source text per origin: a gap exists when
/// the slice between the two tokens contains non-whitespace bytes.
#[derive(Clone, Debug, Default)]
pub struct SourceGaps {
    sources: HashMap<String, String>,
}

impl SourceGaps {
    pub fn new(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }
}

impl GapQuery for SourceGaps {
    fn has_gap(&self, origin: &str, prev_end: usize, next_start: usize) -> DupscanResult<bool> {
        if next_start <= prev_end {
            return Ok(false);
        }
        let source = self.sources.get(origin).ok_or_else(|| {
            crate::errors::DupscanError::Scan(format!("no source text registered for '{origin}'"))
        })?;
        let slice = source.get(prev_end..next_start).unwrap_or("");
        Ok(slice.chars().any(|c| !c.is_whitespace()))
    }
}

// ---------------------------------------------------------------------------
// Filtering provider
// ---------------------------------------------------------------------------

/// Token-dropping stage composed between the raw provider and the
/// normalizer.
///
/// A token is dropped when its offset falls inside the ignore region set for
/// its origin, or when its text matches any ignore pattern. Sentinels are
/// substituted on kept→ignored transitions and on raw-content gaps; two
/// sentinels are never emitted back to back.
pub struct FilteringProvider<P: TokenProvider, G: GapQuery> {
    inner: P,
    gap_query: G,
    ignore_regions: RegionSet,
    ignore_patterns: Vec<Regex>,
    last_survivor: Option<Token>,
    in_ignored_run: bool,
    pending: Option<Token>,
}

impl<P: TokenProvider, G: GapQuery> FilteringProvider<P, G> {
    pub fn new(
        inner: P,
        gap_query: G,
        ignore_regions: RegionSet,
        ignore_patterns: Vec<Regex>,
    ) -> Self {
        Self {
            inner,
            gap_query,
            ignore_regions,
            ignore_patterns,
            last_survivor: None,
            in_ignored_run: false,
            pending: None,
        }
    }

    fn is_filtered(&self, token: &Token) -> bool {
        if self.ignore_regions.contains(&token.origin, token.offset) {
            return true;
        }
        self.ignore_patterns.iter().any(|p| p.is_match(&token.text))
    }
}

impl<P: TokenProvider, G: GapQuery> TokenProvider for FilteringProvider<P, G> {
    fn next_token(&mut self) -> DupscanResult<Option<Token>> {
        if let Some(token) = self.pending.take() {
            self.last_survivor = Some(token.clone());
            return Ok(Some(token));
        }

        loop {
            let Some(token) = self.inner.next_token()? else {
                return Ok(None);
            };

            // File boundaries reset filtering state; adjacency across files
            // is the normalizer's concern, not ours.
            if self
                .last_survivor
                .as_ref()
                .is_some_and(|prev| prev.origin != token.origin)
            {
                self.last_survivor = None;
                self.in_ignored_run = false;
            }

            if token.kind == TokenKind::Sentinel {
                // An upstream stage already marked this discontinuity.
                self.last_survivor = None;
                self.in_ignored_run = false;
                return Ok(Some(token));
            }

            if self.is_filtered(&token) {
                if !self.in_ignored_run && self.last_survivor.is_some() {
                    self.in_ignored_run = true;
                    self.last_survivor = None;
                    return Ok(Some(Token::sentinel(
                        token.origin.clone(),
                        token.offset,
                        token.line_number,
                    )));
                }
                self.in_ignored_run = true;
                continue;
            }

            let after_run = std::mem::take(&mut self.in_ignored_run);
            if !after_run {
                if let Some(prev) = &self.last_survivor {
                    let gap = match self
                        .gap_query
                        .has_gap(&token.origin, prev.end_offset, token.offset)
                    {
                        Ok(gap) => gap,
                        Err(err) => {
                            warn!(origin = %token.origin, error = %err,
                                "gap query failed; assuming no gap");
                            false
                        }
                    };
                    if gap {
                        let sentinel =
                            Token::sentinel(token.origin.clone(), token.offset, token.line_number);
                        self.pending = Some(token);
                        self.last_survivor = None;
                        return Ok(Some(sentinel));
                    }
                }
            }

            self.last_survivor = Some(token.clone());
            return Ok(Some(token));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
