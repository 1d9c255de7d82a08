//! Domain error types for patchview.
//!
//! These errors describe failures of the diff pipeline and of the diff
//! sources feeding it. Highlighting errors are recovered inside the line
//! processor; everything else propagates to the caller.

use thiserror::Error;

/// Errors raised while parsing or rendering a patch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("Unsupported or invalid diff format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed patch: {0}")]
    Parse(String),

    /// Diff segments reached past the end of the highlight tokens computed
    /// for the same line.
    #[error("Highlight tokens end at byte {available}, segment needs byte {offset}")]
    HighlightMismatch { offset: usize, available: usize },

    #[error("No file at index {0}")]
    FileNotFound(usize),
}

/// Errors raised by a syntax highlight provider for a single line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("Unknown syntax theme: {0}")]
    UnknownTheme(String),

    #[error("Tokenization failed: {0}")]
    Tokenize(String),
}

/// Errors raised while obtaining raw patch text or file blobs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unsupported URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid comparison format '{0}'. Expected base...head or base..head")]
    InvalidCompareRange(String),

    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No blob source available for image file {0}")]
    NoBlobSource(String),

    #[error("{0} has no base revision")]
    NoBaseRevision(String),
}
