//! Error types for the dupscan core library.

/// Top-level error enum for the dupscan core library.
///
/// Configuration errors are raised eagerly at the point of misuse; per-file
/// scan problems are *not* errors (they degrade with a logged warning).
/// Programmer errors such as repetition bounds violations are assertions,
/// not variants of this enum.
#[derive(Debug, thiserror::Error)]
pub enum DupscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type DupscanResult<T> = Result<T, DupscanError>;
