//! Longest-match citation highlighting for AI-generated legal text.
//!
//! Given the source material that was shown to a model (library documents,
//! attachments, paginated case pieces, rulings) and the model's output, this
//! crate marks which parts of the output reproduce the source verbatim and
//! attaches provenance (title, file name, page, event and label) to each of
//! them.
//!
//! ## Pipeline
//!
//! - [`tokenize`] - scans HTML into typed tokens, consuming provenance tags
//!   of the source into a per-call context stack
//! - [`NGramIndex`] - maps every window of `n` source tokens to its offsets
//! - [`LongestMatchScanner`] - aligns generated tokens against the index,
//!   always committing the longest agreeing run
//! - [`reconstruct_html`] - replays the annotated tokens into HTML with
//!   `citacao` / `nao-citacao` spans
//! - [`CitationReport`] - the same result as queryable data
//!
//! ## Example
//!
//! ```
//! use layered_citations::highlight_citations;
//!
//! let source = r#"<library-document title="Doc1">A parte ré deverá pagar a quantia devida no prazo de quinze dias.</library-document>"#;
//! let generated = "Conforme a sentença, a parte ré deverá pagar a quantia devida no prazo de quinze dias.";
//!
//! let html = highlight_citations(source, generated);
//! assert!(html.contains(r#"<span class="citacao" title="Documento da Biblioteca, Título: Doc1">"#));
//! ```

mod config;
mod context;
mod display;
mod errors;
mod metadata;
mod ngram_index;
mod reconstruct;
mod report;
mod scanner;
mod tokenizer;

pub use config::{HighlightConfig, DEFAULT_MAX_NON_CITATION_HIGHLIGHT, DEFAULT_NGRAM_SIZE};
pub use context::{ProvenanceContext, EVENT, FILENAME, LABEL, PAGE_NUMBER, TITLE};
pub use display::TokenStreamDisplay;
pub use errors::{HighlightError, HighlightResult};
pub use metadata::{is_fixed_metadata_tag, opens_metadata_scope, parse_attributes, ParsedTag, METADATA_TAGS};
pub use ngram_index::NGramIndex;
pub use reconstruct::{
    is_block_tag, reconstruct_html, strip_empty_spans, HtmlReconstructor, BLOCK_TAGS,
    CITATION_CLASS, NON_CITATION_CLASS,
};
pub use report::{Citation, CitationReport, CoverageStats};
pub use scanner::{apply_matches, measure_match_length, LongestMatchScanner, MatchRun, TAIL_MIN_WINDOW};
pub use tokenizer::{tokenize, SignificantTokens, Token, TokenKind, Tokenizer};

/// Highlighted HTML together with its report.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOutcome {
    pub html: String,
    pub report: CitationReport,
}

/// Citation highlighter with fixed tunables.
///
/// Every call is independent: token streams, the index and the context stack
/// live only for the duration of one call, so a single highlighter can be
/// shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    /// Create a highlighter with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a highlighter with a custom configuration.
    pub fn with_config(config: HighlightConfig) -> HighlightResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Tokenize the generated HTML and mark every token that reproduces the
    /// source, carrying the source token's provenance.
    #[tracing::instrument(level = "debug", skip_all, fields(ngram_size = self.config.ngram_size))]
    pub fn annotate(&self, source_html: &str, generated_html: &str) -> Vec<Token> {
        let mut generated_tokens = tokenize(generated_html, false);
        if source_html.trim().is_empty() || generated_html.trim().is_empty() {
            return generated_tokens;
        }

        let source_tokens = tokenize(source_html, true);
        let source = SignificantTokens::new(&source_tokens);
        let index = NGramIndex::build(&source, self.config.ngram_size);

        let (runs, generated_indices) = {
            let generated = SignificantTokens::new(&generated_tokens);
            let runs = LongestMatchScanner::new(&source, &index).scan(&generated);
            (runs, generated.indices().to_vec())
        };
        apply_matches(&mut generated_tokens, &generated_indices, &source, &runs);

        tracing::debug!(
            source_tokens = source.len(),
            generated_tokens = generated_indices.len(),
            index_keys = index.len(),
            runs = runs.len(),
            matched = runs.iter().map(|run| run.length).sum::<usize>(),
            "aligned generated text against source"
        );

        generated_tokens
    }

    /// Annotated HTML of `generated_html`.
    ///
    /// Returns the input unchanged when either side is empty or nothing
    /// matched.
    pub fn highlight(&self, source_html: &str, generated_html: &str) -> String {
        self.highlight_with_report(source_html, generated_html).html
    }

    /// Citations of `generated_html` as data.
    pub fn report(&self, source_html: &str, generated_html: &str) -> CitationReport {
        CitationReport::from_tokens(&self.annotate(source_html, generated_html))
    }

    /// Annotated HTML and the matching report, from a single alignment.
    pub fn highlight_with_report(&self, source_html: &str, generated_html: &str) -> HighlightOutcome {
        let tokens = self.annotate(source_html, generated_html);
        let report = CitationReport::from_tokens(&tokens);
        let html = if report.is_empty() {
            generated_html.to_string()
        } else {
            reconstruct_html(&tokens, self.config.max_non_citation_highlight)
        };
        HighlightOutcome { html, report }
    }
}

/// Mark the spans of `generated_html` that reproduce `source_html`.
///
/// `ngram_size` is the number of significant tokens a passage must share with
/// the source before it is considered a quotation; `max_non_citation_highlight`
/// bounds the unmatched gaps bridged between two quotations. Both must be at
/// least 1.
pub fn highlight_citations_longest_match(
    source_html: &str,
    generated_html: &str,
    ngram_size: usize,
    max_non_citation_highlight: usize,
) -> HighlightResult<String> {
    let config = HighlightConfig::new(ngram_size, max_non_citation_highlight)?;
    Ok(Highlighter { config }.highlight(source_html, generated_html))
}

/// [`highlight_citations_longest_match`] with the default tunables.
pub fn highlight_citations(source_html: &str, generated_html: &str) -> String {
    Highlighter::new().highlight(source_html, generated_html)
}

#[cfg(test)]
mod tests {
    mod display;
    mod highlight;
    mod properties;
}
