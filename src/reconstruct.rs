//! Rebuilds generated HTML with citation spans around matched runs.
//!
//! Matched tokens are wrapped in `<span class="citacao" title="..">`, where
//! the title is the formatted provenance of the match. A span stays open
//! across whitespace and inline tags as long as the next significant token is
//! a match with the same provenance; block-level tags always close it.
//!
//! Once a span is open, a matched token with a different provenance does not
//! split it. The span title therefore reflects the context the span opened
//! with, which is a known precision limit for matches that cross a source
//! scope boundary without any whitespace in the generated text.
//!
//! Inline tags pass through unchanged, so an inline element that opens
//! before a citation and closes inside it (or the reverse) ends up crossing
//! the span boundary, e.g. `<b><span ..>um</b> dois</span>`.
//!
//! Short unmatched gaps that sit between two citations are wrapped in
//! `<span class="nao-citacao">` so the connective text reads as part of the
//! quoted passage.

use crate::metadata::ParsedTag;
use crate::tokenizer::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Tags that break a citation span.
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "table",
    "thead",
    "tbody",
    "tr",
    "li",
    "ul",
    "ol",
    "br",
    "hr",
    "blockquote",
];

pub const CITATION_CLASS: &str = "citacao";
pub const NON_CITATION_CLASS: &str = "nao-citacao";

static EMPTY_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="(?:citacao|nao-citacao)"(?: title="[^"]*")?>(\s*)</span>"#)
        .expect("valid empty span regex")
});

/// Whether a raw tag (opening or closing) is block level.
pub fn is_block_tag(raw: &str) -> bool {
    ParsedTag::parse(raw).map_or(false, |tag| BLOCK_TAGS.contains(&tag.name.as_str()))
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Remove citation spans left without content.
pub fn strip_empty_spans(html: &str) -> String {
    EMPTY_SPAN.replace_all(html, "$1").into_owned()
}

/// Replays annotated generated tokens into HTML.
#[derive(Debug)]
pub struct HtmlReconstructor<'t> {
    tokens: &'t [Token],
    /// Formatted provenance of each matched token.
    titles: Vec<Option<String>>,
    block: Vec<bool>,
    max_non_citation_highlight: usize,
    out: String,
    inside_citation: bool,
    current_title: String,
    /// Pending tokens outside any citation.
    buffer: Vec<usize>,
    had_any_citation: bool,
}

impl<'t> HtmlReconstructor<'t> {
    pub fn new(tokens: &'t [Token], max_non_citation_highlight: usize) -> Self {
        let titles = tokens.iter().map(Token::citation_title).collect();
        let block = tokens
            .iter()
            .map(|token| token.kind == TokenKind::Tag && is_block_tag(&token.content))
            .collect();
        Self {
            tokens,
            titles,
            block,
            max_non_citation_highlight,
            out: String::new(),
            inside_citation: false,
            current_title: String::new(),
            buffer: Vec::new(),
            had_any_citation: false,
        }
    }

    pub fn render(mut self) -> String {
        let tokens = self.tokens;
        for (idx, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Tag if self.block[idx] => {
                    let was_inside = self.inside_citation;
                    self.close_citation();
                    self.flush_buffer(false);
                    self.out.push_str(&token.content);
                    if was_inside && self.continues_citation(idx + 1, &self.current_title) {
                        let title = self.current_title.clone();
                        self.open_citation(title);
                    }
                }
                TokenKind::Tag => {
                    if self.inside_citation {
                        self.out.push_str(&token.content);
                    } else {
                        self.buffer.push(idx);
                    }
                }
                TokenKind::Whitespace => {
                    if self.inside_citation && self.continues_citation(idx + 1, &self.current_title) {
                        self.out.push_str(&token.content);
                    } else {
                        self.close_citation();
                        self.buffer.push(idx);
                    }
                }
                TokenKind::Word | TokenKind::Punctuation => {
                    if token.is_match {
                        self.flush_buffer(true);
                        self.had_any_citation = true;
                        if !self.inside_citation {
                            let title = self.titles[idx].clone().unwrap_or_default();
                            self.open_citation(title);
                        }
                        self.out.push_str(&token.content);
                    } else {
                        self.close_citation();
                        self.buffer.push(idx);
                    }
                }
            }
        }

        self.close_citation();
        self.flush_buffer(false);
        strip_empty_spans(&self.out)
    }

    /// Whether the next significant token after `from` is a match titled
    /// `title`, with only whitespace and inline tags in between.
    fn continues_citation(&self, from: usize, title: &str) -> bool {
        for idx in from..self.tokens.len() {
            match self.tokens[idx].kind {
                TokenKind::Whitespace => continue,
                TokenKind::Tag if self.block[idx] => return false,
                TokenKind::Tag => continue,
                TokenKind::Word | TokenKind::Punctuation => {
                    return self.titles[idx].as_deref() == Some(title);
                }
            }
        }
        false
    }

    fn open_citation(&mut self, title: String) {
        self.out.push_str("<span class=\"");
        self.out.push_str(CITATION_CLASS);
        self.out.push_str("\" title=\"");
        self.out.push_str(&escape_attribute(&title));
        self.out.push_str("\">");
        self.current_title = title;
        self.inside_citation = true;
    }

    fn close_citation(&mut self) {
        if self.inside_citation {
            self.out.push_str("</span>");
            self.inside_citation = false;
        }
    }

    /// Emit pending non-citation tokens. A gap strictly between two
    /// citations with at most `max_non_citation_highlight` significant tokens
    /// is wrapped. Surrounding whitespace and tags stay outside the wrapper
    /// unless they pair with an inline tag inside it.
    fn flush_buffer(&mut self, followed_by_citation: bool) {
        if self.buffer.is_empty() {
            return;
        }
        let buffer = std::mem::take(&mut self.buffer);
        let significant: Vec<usize> = buffer
            .iter()
            .enumerate()
            .filter(|(_, idx)| self.tokens[**idx].is_significant())
            .map(|(pos, _)| pos)
            .collect();

        let wrap = followed_by_citation
            && self.had_any_citation
            && !significant.is_empty()
            && significant.len() <= self.max_non_citation_highlight;

        if !wrap {
            for &idx in &buffer {
                self.out.push_str(&self.tokens[idx].content);
            }
            return;
        }

        let (first, last) = self.balanced_range(&buffer, significant[0], significant[significant.len() - 1]);
        for (pos, &idx) in buffer.iter().enumerate() {
            if pos == first {
                self.out.push_str("<span class=\"");
                self.out.push_str(NON_CITATION_CLASS);
                self.out.push_str("\">");
            }
            self.out.push_str(&self.tokens[idx].content);
            if pos == last {
                self.out.push_str("</span>");
            }
        }
    }

    /// Widen `first..=last` over the inline tags needed to keep the wrapper
    /// well nested: closing tags of elements opened inside the range, and
    /// opening tags of elements closed inside it.
    fn balanced_range(&self, buffer: &[usize], first: usize, last: usize) -> (usize, usize) {
        let mut unclosed: Vec<String> = Vec::new();
        let mut unopened: Vec<String> = Vec::new();
        for &idx in &buffer[first..=last] {
            match self.inline_tag(idx) {
                Some(tag) if tag.is_closing => match unclosed.iter().rposition(|name| *name == tag.name) {
                    Some(at) => {
                        unclosed.remove(at);
                    }
                    None => unopened.push(tag.name),
                },
                Some(tag) => unclosed.push(tag.name),
                None => {}
            }
        }

        let mut end = last;
        for (pos, &idx) in buffer.iter().enumerate().skip(last + 1) {
            if unclosed.is_empty() {
                break;
            }
            if let Some(tag) = self.inline_tag(idx).filter(|tag| tag.is_closing) {
                if let Some(at) = unclosed.iter().rposition(|name| *name == tag.name) {
                    unclosed.remove(at);
                    end = pos;
                }
            }
        }

        let mut start = first;
        for pos in (0..first).rev() {
            if unopened.is_empty() {
                break;
            }
            if let Some(tag) = self.inline_tag(buffer[pos]).filter(|tag| !tag.is_closing) {
                if let Some(at) = unopened.iter().position(|name| *name == tag.name) {
                    unopened.remove(at);
                    start = pos;
                }
            }
        }

        (start, end)
    }

    /// The token at `idx` parsed as a paired tag; `None` for text, comments
    /// and self-closing tags.
    fn inline_tag(&self, idx: usize) -> Option<ParsedTag<'t>> {
        let tokens = self.tokens;
        let token = &tokens[idx];
        if token.kind != TokenKind::Tag {
            return None;
        }
        ParsedTag::parse(&token.content).filter(|tag| !tag.is_self_closing)
    }
}

/// Render annotated generated tokens as HTML.
pub fn reconstruct_html(tokens: &[Token], max_non_citation_highlight: usize) -> String {
    HtmlReconstructor::new(tokens, max_non_citation_highlight).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ProvenanceContext, PAGE_NUMBER, TITLE};
    use crate::tokenizer::tokenize;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn doc(title: &str) -> Arc<ProvenanceContext> {
        Arc::new(
            ProvenanceContext::for_source("library-document", BTreeMap::new())
                .with_attribute(TITLE, title),
        )
    }

    /// Tokenize `html` and mark the significant tokens whose text is listed
    /// in `matches` with the paired context.
    fn annotate(html: &str, matches: &[(&str, &Arc<ProvenanceContext>)]) -> Vec<Token> {
        let mut tokens = tokenize(html, false);
        let mut pending = matches.iter().peekable();
        for token in tokens.iter_mut().filter(|t| t.is_significant()) {
            if let Some(&&(text, ctx)) = pending.peek() {
                if token.content == text {
                    token.is_match = true;
                    token.context = Some(Arc::clone(ctx));
                    pending.next();
                }
            }
        }
        tokens
    }

    #[test]
    fn test_block_tags() {
        assert!(is_block_tag("<p>"));
        assert!(is_block_tag("</P>"));
        assert!(is_block_tag("<br/>"));
        assert!(is_block_tag(r#"<div class="x">"#));
        assert!(is_block_tag("<h3>"));
        assert!(!is_block_tag("<b>"));
        assert!(!is_block_tag("</em>"));
        assert!(!is_block_tag("<span>"));
        assert!(!is_block_tag("<!-- p -->"));
    }

    #[test]
    fn test_unmatched_stream_is_unchanged() {
        let html = "<p>Nada <b>aqui</b> foi citado.</p>";
        assert_eq!(reconstruct_html(&tokenize(html, false), 8), html);
    }

    #[test]
    fn test_matched_run_is_wrapped() {
        let a = doc("A");
        let tokens = annotate("Diz: um dois tres.", &[("um", &a), ("dois", &a), ("tres", &a), (".", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"Diz: <span class="citacao" title="Documento da Biblioteca, Título: A">um dois tres.</span>"#
        );
    }

    #[test]
    fn test_whitespace_before_other_context_closes_span() {
        let a = doc("A");
        let b = doc("B");
        let tokens = annotate("um dois tres quatro", &[("um", &a), ("dois", &a), ("tres", &b), ("quatro", &b)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            concat!(
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um dois</span> "#,
                r#"<span class="citacao" title="Documento da Biblioteca, Título: B">tres quatro</span>"#,
            )
        );
    }

    #[test]
    fn test_adjacent_context_flip_is_sticky() {
        let a = doc("A");
        let b = doc("B");
        let tokens = annotate("um dois.", &[("um", &a), ("dois", &a), (".", &b)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um dois.</span>"#
        );
    }

    #[test]
    fn test_inline_tags_stay_inside_span() {
        let a = doc("A");
        let tokens = annotate("um <b>dois</b> tres", &[("um", &a), ("dois", &a), ("tres", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um <b>dois</b> tres</span>"#
        );
    }

    #[test]
    fn test_block_tag_closes_and_reopens() {
        let a = doc("A");
        let tokens = annotate("um<br>dois", &[("um", &a), ("dois", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            concat!(
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um</span><br>"#,
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">dois</span>"#,
            )
        );
    }

    #[test]
    fn test_paragraph_boundaries() {
        let a = doc("A");
        let tokens = annotate("<p>um dois</p>\n<p>tres</p>", &[("um", &a), ("dois", &a), ("tres", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            concat!(
                r#"<p><span class="citacao" title="Documento da Biblioteca, Título: A">um dois</span></p>"#,
                "\n",
                r#"<p><span class="citacao" title="Documento da Biblioteca, Título: A">tres</span></p>"#,
            )
        );
    }

    #[test]
    fn test_short_gap_between_citations_is_bridged() {
        let a = doc("A");
        let tokens = annotate("um dois e também tres quatro", &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            concat!(
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um dois</span> "#,
                r#"<span class="nao-citacao">e também</span> "#,
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">tres quatro</span>"#,
            )
        );
    }

    #[test]
    fn test_long_gap_is_not_bridged() {
        let a = doc("A");
        let tokens = annotate("um dois e também tres quatro", &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)]);
        let html = reconstruct_html(&tokens, 1);
        assert!(!html.contains(NON_CITATION_CLASS));
        assert!(html.contains("</span> e também <span"));
    }

    #[test]
    fn test_leading_and_trailing_gaps_are_not_bridged() {
        let a = doc("A");
        let tokens = annotate("antes um dois depois", &[("um", &a), ("dois", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"antes <span class="citacao" title="Documento da Biblioteca, Título: A">um dois</span> depois"#
        );
    }

    #[test]
    fn test_block_tag_splits_gap() {
        let a = doc("A");
        let tokens = annotate("um dois</p><p>e tres quatro", &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)]);
        let html = reconstruct_html(&tokens, 8);
        // Only the part of the gap after the block tag is pending when the
        // next citation starts.
        assert!(html.contains(r#"dois</span></p><p><span class="nao-citacao">e</span> <span class="citacao""#));
    }

    #[test]
    fn test_gap_before_block_tag_is_not_bridged() {
        let a = doc("A");
        let tokens = annotate("um dois e</p><p>tres quatro", &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)]);
        let html = reconstruct_html(&tokens, 8);
        assert!(!html.contains(NON_CITATION_CLASS));
        assert!(html.contains("dois</span> e</p><p><span"));
    }

    #[test]
    fn test_bridged_gap_keeps_inline_markup_balanced() {
        let a = doc("A");
        let tokens = annotate(
            "um dois e <b>mesmo assim</b> tres quatro",
            &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)],
        );
        assert_eq!(
            reconstruct_html(&tokens, 8),
            concat!(
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">um dois</span> "#,
                r#"<span class="nao-citacao">e <b>mesmo assim</b></span> "#,
                r#"<span class="citacao" title="Documento da Biblioteca, Título: A">tres quatro</span>"#,
            )
        );
    }

    #[test]
    fn test_bridged_gap_takes_opening_tag_of_element_closed_inside() {
        let a = doc("A");
        let tokens = annotate(
            "um dois <em>e</em> também tres quatro",
            &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)],
        );
        let html = reconstruct_html(&tokens, 8);
        assert!(html.contains(r#"</span> <span class="nao-citacao"><em>e</em> também</span> <span"#));
    }

    #[test]
    fn test_bridged_gap_leaves_enclosing_markup_outside() {
        let a = doc("A");
        let tokens = annotate(
            "um dois <em>e também</em> tres quatro",
            &[("um", &a), ("dois", &a), ("tres", &a), ("quatro", &a)],
        );
        let html = reconstruct_html(&tokens, 8);
        assert!(html.contains(r#"</span> <em><span class="nao-citacao">e também</span></em> <span"#));
    }

    #[test]
    fn test_inline_tag_crossing_span_start_passes_through() {
        let a = doc("A");
        let tokens = annotate("<b>um</b> dois", &[("um", &a), ("dois", &a)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"<b><span class="citacao" title="Documento da Biblioteca, Título: A">um</b> dois</span>"#
        );
    }

    #[test]
    fn test_title_is_escaped() {
        let ctx = Arc::new(
            ProvenanceContext::for_source("library-document", BTreeMap::new())
                .with_attribute(TITLE, r#"Lei "A" & <B>"#)
                .with_attribute(PAGE_NUMBER, "2"),
        );
        let tokens = annotate("um", &[("um", &ctx)]);
        assert_eq!(
            reconstruct_html(&tokens, 8),
            r#"<span class="citacao" title="Documento da Biblioteca, Título: Lei &quot;A&quot; &amp; &lt;B&gt;, Pág: 2">um</span>"#
        );
    }

    #[test]
    fn test_strip_empty_spans() {
        assert_eq!(
            strip_empty_spans(r#"a<span class="citacao" title="x"></span>b<span class="nao-citacao"> </span>c"#),
            "ab c"
        );
        assert_eq!(strip_empty_spans(r#"<span class="outra"></span>"#), r#"<span class="outra"></span>"#);
    }
}
