//! Dupscan core library — source-code clone detection pipeline.
//!
//! Source text is scanned into tokens, tokens are normalized into a
//! canonical unit stream under a configurable policy (so identifier names,
//! literal values, and formatting do not block matches), and the normalized
//! stream is searched for maximal repeated subsequences. Results are
//! serialized as a stable XML clone report.

pub mod errors;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod repetition;
pub mod report;
pub mod scanner;
