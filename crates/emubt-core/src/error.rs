//! Error types for emubt-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in emubt-core
#[derive(Debug, Error)]
pub enum Error {
    /// A token was empty after trimming
    #[error("empty token")]
    EmptyToken,

    /// A token could not be read as a decimal or hexadecimal number
    #[error("invalid token '{token}': {reason}")]
    TokenParse { token: String, reason: String },

    /// Grid rows do not share one common length
    #[error("inconsistent row lengths in '{path}': {lengths:?}")]
    InconsistentRowLength { path: PathBuf, lengths: Vec<usize> },

    /// Grid file holds no non-blank cells
    #[error("empty CSV '{path}'")]
    EmptyGrid { path: PathBuf },

    /// Observed cell count differs from the declared symbol size
    #[error("size mismatch: {found} cells vs symbol {width}x{height}")]
    DimensionMismatch {
        found: usize,
        width: usize,
        height: usize,
    },

    /// No symbol in the document sanitizes to this name
    #[error("no matching <symbol> for '{name}' in '{document}'")]
    UnmatchedSymbol { name: String, document: PathBuf },

    /// No document with this stem in the directory
    #[error("source .emubt for '{stem}' not found in '{dir}'")]
    DocumentNotFound { stem: String, dir: PathBuf },

    /// Malformed XML
    #[error("XML parse failed for '{path}': {message}")]
    DocumentParse { path: PathBuf, message: String },

    /// Handle does not point at an element of this document
    #[error("no element at event index {0}")]
    InvalidHandle(usize),

    /// Failed to write an output document
    #[error("save failed for '{path}': {message}")]
    Save { path: PathBuf, message: String },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
