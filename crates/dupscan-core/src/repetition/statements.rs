//! Statement-level grouping of the normalized unit stream and
//! repetitive-region marking on top of it.

use tracing::debug;

use crate::models::{ContentUnit, TokenKind, Unit};
use crate::repetition::equator::StatementTypeEquator;
use crate::repetition::finder::RepetitionFinder;
use crate::repetition::params::RepetitionParameters;

// ---------------------------------------------------------------------------
// Statement units
// ---------------------------------------------------------------------------

/// A run of content units forming one statement, closed by an
/// end-of-statement unit or by the end of its source region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementUnit {
    units: Vec<ContentUnit>,
    kinds: Vec<TokenKind>,
}

impl StatementUnit {
    pub fn new(units: Vec<ContentUnit>) -> Self {
        assert!(!units.is_empty(), "statement unit must hold at least one unit");
        let kinds = units.iter().map(|u| u.kind).collect();
        Self { units, kinds }
    }

    pub fn units(&self) -> &[ContentUnit] {
        &self.units
    }

    /// Ordered token kinds of the statement; the structural equality key.
    pub fn kinds(&self) -> &[TokenKind] {
        &self.kinds
    }

    pub fn origin(&self) -> &str {
        &self.units[0].origin
    }

    pub fn start_offset(&self) -> usize {
        self.units[0].start_offset
    }

    pub fn end_offset(&self) -> usize {
        self.units[self.units.len() - 1].end_offset
    }

    pub fn start_line(&self) -> usize {
        self.units[0].line_number
    }

    pub fn end_line(&self) -> usize {
        self.units[self.units.len() - 1].line_number
    }
}

/// Splits a unit stream into statement slots.
///
/// Content units accumulate until an end-of-statement unit closes the
/// statement (the closer is included). A sentinel flushes any open
/// statement and then occupies its own `None` slot, so repetitions can
/// never silently bridge an ignored run or a file boundary. An origin
/// change also flushes, covering streams without trailing terminators.
pub fn group_statements(units: &[Unit]) -> Vec<Option<StatementUnit>> {
    let mut statements: Vec<Option<StatementUnit>> = Vec::new();
    let mut current: Vec<ContentUnit> = Vec::new();

    for unit in units {
        match unit {
            Unit::Sentinel(_) => {
                if !current.is_empty() {
                    statements.push(Some(StatementUnit::new(std::mem::take(&mut current))));
                }
                statements.push(None);
            }
            Unit::Content(content) => {
                if let Some(open) = current.first() {
                    if open.origin != content.origin {
                        statements.push(Some(StatementUnit::new(std::mem::take(&mut current))));
                    }
                }
                let closes = content.kind == TokenKind::EndOfStatement;
                current.push(content.clone());
                if closes {
                    statements.push(Some(StatementUnit::new(std::mem::take(&mut current))));
                }
            }
        }
    }
    if !current.is_empty() {
        statements.push(Some(StatementUnit::new(current)));
    }
    statements
}

// ---------------------------------------------------------------------------
// Repetitive-region marking
// ---------------------------------------------------------------------------

/// A contiguous stretch of structurally repeating statements in one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepetitiveRegion {
    pub origin: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub statement_count: usize,
    pub motif_length: usize,
}

/// Finds stretches of structurally repeating statements.
///
/// Statements are compared by their token-kind sequences, so repeated
/// boilerplate with varying identifiers and literal values still counts.
/// A repetition that straddles an origin boundary is reported per origin.
pub fn mark_repetitive_regions(
    units: &[Unit],
    params: RepetitionParameters,
) -> Vec<RepetitiveRegion> {
    let statements = group_statements(units);
    let finder = RepetitionFinder::new(&statements, StatementTypeEquator, params);

    let mut regions = Vec::new();
    for repetition in finder.find_repetitions() {
        let covered = &statements[repetition.start_index()..=repetition.end_index()];
        let mut run: Vec<&StatementUnit> = Vec::new();
        for slot in covered.iter().chain(std::iter::once(&None)) {
            match slot {
                Some(statement)
                    if run
                        .last()
                        .is_none_or(|prev| prev.origin() == statement.origin()) =>
                {
                    run.push(statement);
                }
                _ => {
                    if !run.is_empty() {
                        regions.push(region_from_run(&run, repetition.motif_length()));
                        run.clear();
                    }
                    if let Some(statement) = slot {
                        run.push(statement);
                    }
                }
            }
        }
    }
    debug!(regions = regions.len(), "marked repetitive regions");
    regions
}

fn region_from_run(run: &[&StatementUnit], motif_length: usize) -> RepetitiveRegion {
    let first = run[0];
    let last = run[run.len() - 1];
    RepetitiveRegion {
        origin: first.origin().to_string(),
        start_offset: first.start_offset(),
        end_offset: last.end_offset(),
        start_line: first.start_line(),
        end_line: last.end_line(),
        statement_count: run.len(),
        motif_length,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
