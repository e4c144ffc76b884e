//! Debug rendering of normalized files.
//!
//! Reconstructs the original whitespace of a file with the normalized token
//! text substituted in place, so a normalization run can be inspected by
//! eye. Only files whose extension matches the configured debug extension
//! are rendered; the rendering goes to the `debug!` log, never into the
//! normalized stream.

use std::collections::HashMap;

use crate::models::Token;

/// One entry of the ordered token→unit trace the normalizer keeps per file.
///
/// `normalized` is `None` for tokens the normalizer dropped.
#[derive(Clone, Debug)]
pub struct TraceEntry {
    pub token: Token,
    pub normalized: Option<String>,
}

/// Holds the debug extension and the raw source text per origin.
#[derive(Debug, Default)]
pub struct DebugRenderer {
    extension: String,
    sources: HashMap<String, String>,
}

impl DebugRenderer {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            sources: HashMap::new(),
        }
    }

    pub fn register_source(&mut self, origin: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(origin.into(), source.into());
    }

    pub fn wants(&self, origin: &str) -> bool {
        origin.rsplit('.').next().is_some_and(|ext| ext == self.extension)
            && self.sources.contains_key(origin)
    }

    /// Render the normalized view of one file from its trace.
    ///
    /// Whitespace between tokens is copied from the original source; dropped
    /// tokens leave only their surrounding whitespace behind.
    pub fn render(&self, origin: &str, trace: &[TraceEntry]) -> Option<String> {
        if !self.wants(origin) {
            return None;
        }
        let source = self.sources.get(origin)?;
        let mut out = String::new();
        let mut cursor = 0usize;
        for entry in trace {
            let start = entry.token.offset.min(source.len());
            if cursor < start {
                out.extend(source[cursor..start].chars().filter(|c| c.is_whitespace()));
            }
            if let Some(normalized) = &entry.normalized {
                out.push_str(normalized);
            }
            cursor = cursor.max(entry.token.end_offset.min(source.len()));
        }
        Some(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
