//! Queryable summary of the citations found in generated text.
//!
//! The report is data, not rendering: reviewers' tooling can list the quoted
//! passages with their provenance, or ship the whole report as JSON next to
//! the annotated HTML.

use crate::context::ProvenanceContext;
use crate::reconstruct::is_block_tag;
use crate::tokenizer::{Token, TokenKind};
use serde::{Deserialize, Serialize};

/// One quoted passage of the generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Formatted provenance (the tooltip text).
    pub title: String,
    pub context: ProvenanceContext,
    /// Generated text of the passage, markup removed.
    pub text: String,
    /// First significant token of the passage.
    pub start: usize,
    /// One past the last significant token of the passage.
    pub end: usize,
    /// Position of the first token in the full generated token array.
    pub token_start: usize,
    /// One past the last token in the full generated token array.
    pub token_end: usize,
}

impl Citation {
    /// Number of significant tokens in the passage.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Summary counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageStats {
    /// Significant tokens in the generated text.
    pub significant_tokens: usize,
    /// Significant tokens reproduced from the source.
    pub matched_tokens: usize,
    /// Number of passages.
    pub citations: usize,
}

/// All citations of one generated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    pub citations: Vec<Citation>,
    pub stats: CoverageStats,
}

impl CitationReport {
    /// Build a report from annotated generated tokens.
    ///
    /// A passage is a maximal run of matched tokens sharing one formatted
    /// provenance. Whitespace and inline tags may sit inside a passage; block
    /// tags and unmatched words end it.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut builder = PassageBuilder::default();
        let mut sig_idx = 0;

        for (idx, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Tag if is_block_tag(&token.content) => builder.close(),
                TokenKind::Tag => {}
                TokenKind::Whitespace => builder.pending_text.push_str(&token.content),
                TokenKind::Word | TokenKind::Punctuation => {
                    builder.stats.significant_tokens += 1;
                    match token.citation_title() {
                        Some(title) => {
                            builder.stats.matched_tokens += 1;
                            builder.extend(idx, sig_idx, token, title);
                        }
                        None => builder.close(),
                    }
                    sig_idx += 1;
                }
            }
        }
        builder.close();

        let mut stats = builder.stats;
        stats.citations = builder.citations.len();
        Self {
            citations: builder.citations,
            stats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    /// Share of significant generated tokens reproduced from the source
    /// (0.0 when there are none).
    pub fn coverage(&self) -> f64 {
        if self.stats.significant_tokens == 0 {
            return 0.0;
        }
        self.stats.matched_tokens as f64 / self.stats.significant_tokens as f64
    }

    /// Distinct provenance titles in order of first appearance.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for citation in &self.citations {
            if !seen.contains(&citation.title.as_str()) {
                seen.push(&citation.title);
            }
        }
        seen
    }

    /// Iterate over citations matching a predicate.
    pub fn filter<F>(&self, predicate: F) -> impl Iterator<Item = &Citation>
    where
        F: Fn(&Citation) -> bool,
    {
        self.citations.iter().filter(move |c| predicate(c))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Default)]
struct PassageBuilder {
    current: Option<Citation>,
    /// Whitespace seen since the last matched token of `current`.
    pending_text: String,
    citations: Vec<Citation>,
    stats: CoverageStats,
}

impl PassageBuilder {
    fn extend(&mut self, token_idx: usize, sig_idx: usize, token: &Token, title: String) {
        if let Some(current) = self.current.as_mut() {
            if current.title == title {
                current.text.push_str(&self.pending_text);
                current.text.push_str(&token.content);
                current.end = sig_idx + 1;
                current.token_end = token_idx + 1;
                self.pending_text.clear();
                return;
            }
        }
        self.close();
        self.current = Some(Citation {
            title,
            context: token.context.as_deref().cloned().unwrap_or_default(),
            text: token.content.clone(),
            start: sig_idx,
            end: sig_idx + 1,
            token_start: token_idx,
            token_end: token_idx + 1,
        });
    }

    fn close(&mut self) {
        if let Some(citation) = self.current.take() {
            self.citations.push(citation);
        }
        self.pending_text.clear();
    }
}
