//! Error types for citation highlighting.
//!
//! Highlighting itself fails open on malformed markup. The only errors are
//! invalid tunables and unreadable configuration.

use thiserror::Error;

/// Errors that can occur while configuring the highlighter.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// A numeric tunable was outside its accepted range.
    #[error("invalid argument `{name}`: {value} (must be at least 1)")]
    InvalidArgument { name: &'static str, value: usize },

    /// A TOML configuration document could not be parsed.
    #[error("failed to parse highlight config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for highlighting operations.
pub type HighlightResult<T> = Result<T, HighlightError>;
