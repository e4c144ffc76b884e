//! The token normalizer: raw tokens in, normalized units out.
//!
//! This is the policy heart of the pipeline. Tokens are pulled from the
//! underlying (already filtered) provider; each one is either dropped under
//! the active configuration's ignore rules or rewritten into a
//! [`ContentUnit`]. Sentinel tokens pass through as [`Unit::Sentinel`]
//! without consuming a per-file index. All mutable scratch state (identifier
//! table, pending-ignore counter, trace) is private to one normalizer
//! instance; parallel runs get one instance per file.

use std::sync::Arc;

use tracing::debug;

use crate::errors::{DupscanError, DupscanResult};
use crate::models::{ContentUnit, Language, SentinelUnit, Token, TokenKind, Unit};
use crate::normalize::config::{ConfigResolver, TokenConfiguration};
use crate::normalize::debug::{DebugRenderer, TraceEntry};
use crate::normalize::provider::{Lookahead, TokenProvider};
use crate::normalize::table::IdentifierTable;

pub struct TokenNormalizer<P: TokenProvider> {
    provider: Lookahead<P>,
    resolver: Arc<ConfigResolver>,
    language: Language,
    /// Global override: when set, end-of-statement tokens always survive.
    keep_end_of_statement: bool,
    debug_renderer: Option<DebugRenderer>,

    // Per-file scratch state, reset on every origin change.
    identifier_table: IdentifierTable,
    pending_ignore: usize,
    index_in_file: usize,
    current_origin: Option<String>,
    trace: Vec<TraceEntry>,
}

impl<P: TokenProvider> TokenNormalizer<P> {
    pub fn new(provider: P, resolver: Arc<ConfigResolver>, language: Language) -> Self {
        Self {
            provider: Lookahead::new(provider),
            resolver,
            language,
            keep_end_of_statement: false,
            debug_renderer: None,
            identifier_table: IdentifierTable::default(),
            pending_ignore: 0,
            index_in_file: 0,
            current_origin: None,
            trace: Vec::new(),
        }
    }

    pub fn with_keep_end_of_statement(mut self, keep: bool) -> Self {
        self.keep_end_of_statement = keep;
        self
    }

    pub fn with_debug_renderer(mut self, renderer: Option<DebugRenderer>) -> Self {
        self.debug_renderer = renderer;
        self
    }

    /// Pull the next normalized unit, or `Ok(None)` at end of stream.
    pub fn produce_next(&mut self) -> DupscanResult<Option<Unit>> {
        loop {
            let Some(token) = self.provider.next_token()? else {
                self.finish_file();
                return Ok(None);
            };

            // Per-file state clears whenever the origin changes between
            // consecutive tokens.
            if self.current_origin.as_deref() != Some(token.origin.as_str()) {
                self.finish_file();
                self.current_origin = Some(token.origin.clone());
            }

            if token.kind == TokenKind::Sentinel {
                // Sentinels pass through without an index.
                return Ok(Some(Unit::Sentinel(SentinelUnit {
                    origin: token.origin,
                })));
            }

            // The identifier table is statement-scoped.
            if token.kind == TokenKind::EndOfStatement {
                self.identifier_table.clear();
            }

            let config = self
                .resolver
                .active_for(&token.origin, token.offset)
                .clone();

            if self.is_ignored(&token, &config)? {
                self.trace.push(TraceEntry {
                    token,
                    normalized: None,
                });
                continue;
            }

            let kind = self.normalized_kind(token.kind, &config);
            let normalized = self.normalize_content(&token, kind, &config)?;
            let unit = ContentUnit {
                normalized_content: normalized.clone(),
                original_content: token.text.clone(),
                start_offset: token.offset,
                end_offset: token.end_offset,
                line_number: token.line_number,
                origin: token.origin.clone(),
                kind,
                index_in_file: self.index_in_file,
            };
            self.index_in_file += 1;
            self.trace.push(TraceEntry {
                token,
                normalized: Some(normalized),
            });

            // One token of lookahead tells us whether this was the last
            // unit of its file; flush eagerly so the per-file state is gone
            // before the next file's first token arrives.
            let at_file_end = match self.provider.peek(0)? {
                Some(next) => Some(next.origin.as_str()) != self.current_origin.as_deref(),
                None => true,
            };
            if at_file_end {
                self.finish_file();
            }

            return Ok(Some(Unit::Content(unit)));
        }
    }

    /// Flush the debug rendering for the finished file and reset all
    /// per-file scratch state.
    fn finish_file(&mut self) {
        if let (Some(renderer), Some(origin)) = (&self.debug_renderer, &self.current_origin) {
            if let Some(rendered) = renderer.render(origin, &self.trace) {
                debug!(origin = %origin, normalized = %rendered, "normalized file");
            }
        }
        self.identifier_table.clear();
        self.pending_ignore = 0;
        self.index_in_file = 0;
        self.current_origin = None;
        self.trace.clear();
    }

    // -- Ignore decision ----------------------------------------------------

    fn is_ignored(&mut self, token: &Token, config: &TokenConfiguration) -> DupscanResult<bool> {
        // The global keep flag wins over everything, including a pending
        // ignore run.
        if token.kind == TokenKind::EndOfStatement && self.keep_end_of_statement {
            self.pending_ignore = 0;
            return Ok(false);
        }

        if self.pending_ignore > 0 {
            self.pending_ignore -= 1;
            return Ok(true);
        }

        match token.kind {
            TokenKind::EndOfStatement => Ok(config.ignore_end_of_statement_tokens),
            TokenKind::Comment => Ok(config.ignore_comments),
            kind if kind.is_delimiter() => Ok(config.ignore_delimiters),
            TokenKind::Preprocessor => Ok(config.ignore_preprocessor_directives),
            TokenKind::Keyword
                if config.ignore_this_references && token.text == "this" =>
            {
                // `this` followed by a member access drops both tokens.
                if self.peek_is(0, token, TokenKind::Dot)? {
                    self.pending_ignore = 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            TokenKind::Identifier if config.normalize_fully_qualified_names => {
                // Head of a dotted/scoped name: consume everything up to,
                // but not including, the final identifier segment.
                let mut ahead = 0;
                while self.peek_is(ahead, token, TokenKind::Dot)?
                    && self.peek_is(ahead + 1, token, TokenKind::Identifier)?
                {
                    ahead += 2;
                }
                if ahead > 0 {
                    self.pending_ignore = ahead - 1;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            TokenKind::VisibilityModifier => Ok(config.ignore_visibility_modifiers),
            TokenKind::Word if config.ignore_stop_words => {
                let stop_words = config.stop_words.as_ref().ok_or_else(|| {
                    DupscanError::Config(
                        "stop-word filtering enabled without a stop-word set".to_string(),
                    )
                })?;
                Ok(stop_words.contains(&token.text))
            }
            _ => Ok(false),
        }
    }

    /// Whether the token `n` ahead has the given kind and shares the
    /// current token's origin. Lookahead never crosses a file boundary.
    fn peek_is(&mut self, n: usize, current: &Token, kind: TokenKind) -> DupscanResult<bool> {
        Ok(self
            .provider
            .peek(n)?
            .is_some_and(|t| t.kind == kind && t.origin == current.origin))
    }

    // -- Content normalization ----------------------------------------------

    fn normalized_kind(&self, kind: TokenKind, config: &TokenConfiguration) -> TokenKind {
        if config.normalize_type_keywords && kind.is_type_keyword() {
            // The `string` keyword stays distinct in languages that carve
            // it out; everything else collapses onto the identifier kind.
            if kind == TokenKind::StringType && self.language.keeps_string_keyword() {
                return kind;
            }
            return TokenKind::Identifier;
        }
        kind
    }

    fn normalize_content(
        &mut self,
        token: &Token,
        kind: TokenKind,
        config: &TokenConfiguration,
    ) -> DupscanResult<String> {
        // Identifiers keep their casing only in case-sensitive languages;
        // everything else is always folded.
        let folded = if self.language.is_case_sensitive() && kind == TokenKind::Identifier {
            token.text.clone()
        } else {
            token.text.to_lowercase()
        };

        let normalized = match kind {
            TokenKind::Identifier if config.normalize_identifiers => {
                format!("id{}", self.identifier_table.id_for(&folded))
            }
            TokenKind::StringLiteral if config.normalize_string_literals => String::new(),
            TokenKind::CharLiteral if config.normalize_char_literals => "char".to_string(),
            TokenKind::IntegerLiteral if config.normalize_integer_literals => "0".to_string(),
            TokenKind::FloatLiteral if config.normalize_float_literals => "0.0".to_string(),
            TokenKind::BooleanLiteral if config.normalize_boolean_literals => "true".to_string(),
            TokenKind::Word if config.stem_words => {
                let stemmer = config.stemmer.as_ref().ok_or_else(|| {
                    DupscanError::Config("stem_words enabled without a configured stemmer".to_string())
                })?;
                stemmer.stem(&folded)
            }
            // Line units always lose their internal whitespace; this rule
            // is not policy-gated.
            TokenKind::Line => folded.split_whitespace().collect(),
            _ => folded,
        };
        Ok(normalized)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
