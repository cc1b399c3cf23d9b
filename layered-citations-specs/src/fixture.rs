//! Fixture file format.
//!
//! ```toml
//! title = "Library document excerpt"
//! ngram_size = 8
//!
//! source = '''<library-document title="Doc1">...</library-document>'''
//! generated = '''<p>...</p>'''
//!
//! [expect]
//! citations = 1
//! sources = ["Documento da Biblioteca, Título: Doc1"]
//! contains = ['<span class="citacao"']
//! ```

use layered_citations::{HighlightConfig, HighlightResult, DEFAULT_MAX_NON_CITATION_HIGHLIGHT, DEFAULT_NGRAM_SIZE};
use serde::{Deserialize, Serialize};

/// One highlighting scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CitationFixture {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ngram_size: Option<usize>,
    #[serde(default)]
    pub max_non_citation_highlight: Option<usize>,
    pub source: String,
    pub generated: String,
    #[serde(default)]
    pub expect: Expectations,
}

impl CitationFixture {
    /// Tunables for this fixture, falling back to the crate defaults.
    pub fn config(&self) -> HighlightResult<HighlightConfig> {
        HighlightConfig::new(
            self.ngram_size.unwrap_or(DEFAULT_NGRAM_SIZE),
            self.max_non_citation_highlight
                .unwrap_or(DEFAULT_MAX_NON_CITATION_HIGHLIGHT),
        )
    }
}

/// What the highlighted output must look like. Every field is optional;
/// an empty table only checks that the fixture runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    /// Output must equal the generated input byte for byte.
    #[serde(default)]
    pub unchanged: Option<bool>,
    /// Number of citation passages in the report.
    #[serde(default)]
    pub citations: Option<usize>,
    /// Distinct tooltip titles, in order of first appearance.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    /// Number of bridged gaps (`nao-citacao` spans) in the output.
    #[serde(default)]
    pub bridged_gaps: Option<usize>,
    /// Snippets the output must contain.
    #[serde(default)]
    pub contains: Vec<String>,
    /// Snippets the output must not contain.
    #[serde(default)]
    pub absent: Vec<String>,
    /// Exact expected output.
    #[serde(default)]
    pub html: Option<String>,
}
