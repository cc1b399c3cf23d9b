//! Error types for the fixture harness.

use thiserror::Error;

/// Errors that can occur while loading or running fixtures.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Error parsing a fixture file.
    #[error("failed to parse fixture {path}: {message}")]
    Parse { path: String, message: String },

    /// Error loading a fixture file.
    #[error("failed to load fixture: {path}: {message}")]
    Load { path: String, message: String },

    /// The fixture carries tunables the highlighter rejects.
    #[error("invalid fixture configuration: {0}")]
    Config(#[from] layered_citations::HighlightError),
}

/// Result type for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;
