//! Highlighter configuration.

use crate::errors::{HighlightError, HighlightResult};
use serde::{Deserialize, Serialize};

/// Default number of significant tokens in a matching window.
pub const DEFAULT_NGRAM_SIZE: usize = 8;

/// Default upper bound on the size of a bridged gap between two citations.
pub const DEFAULT_MAX_NON_CITATION_HIGHLIGHT: usize = 8;

/// Tunables for the longest-match highlighter.
///
/// `ngram_size` trades precision for recall: larger windows avoid spurious
/// matches on common phrasing but miss short quotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Number of significant tokens per index key.
    pub ngram_size: usize,
    /// Largest unmatched gap (in significant tokens) wrapped as `nao-citacao`
    /// when it sits between two citations.
    pub max_non_citation_highlight: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
            max_non_citation_highlight: DEFAULT_MAX_NON_CITATION_HIGHLIGHT,
        }
    }
}

impl HighlightConfig {
    /// Create a validated configuration.
    pub fn new(ngram_size: usize, max_non_citation_highlight: usize) -> HighlightResult<Self> {
        let config = Self {
            ngram_size,
            max_non_citation_highlight,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject zero-sized tunables.
    pub fn validate(&self) -> HighlightResult<()> {
        if self.ngram_size == 0 {
            return Err(HighlightError::InvalidArgument {
                name: "ngram_size",
                value: self.ngram_size,
            });
        }
        if self.max_non_citation_highlight == 0 {
            return Err(HighlightError::InvalidArgument {
                name: "max_non_citation_highlight",
                value: self.max_non_citation_highlight,
            });
        }
        Ok(())
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    ///
    /// ```
    /// use layered_citations::HighlightConfig;
    ///
    /// let config = HighlightConfig::from_toml_str("ngram_size = 12").unwrap();
    /// assert_eq!(config.ngram_size, 12);
    /// assert_eq!(config.max_non_citation_highlight, 8);
    /// ```
    pub fn from_toml_str(content: &str) -> HighlightResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
