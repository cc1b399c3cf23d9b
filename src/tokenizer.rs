//! HTML tokenization with provenance tracking.
//!
//! The tokenizer is regex based and lossless: concatenating the `content` of
//! every emitted token reproduces the input, minus any metadata tags that were
//! consumed into the context stack.
//!
//! ```
//! use layered_citations::{tokenize, TokenKind};
//!
//! let tokens = tokenize(r#"<page number="2">Art. 5</page>"#, true);
//! let words: Vec<_> = tokens
//!     .iter()
//!     .filter(|t| t.kind == TokenKind::Word)
//!     .map(|t| t.content.as_str())
//!     .collect();
//! assert_eq!(words, ["Art", "5"]);
//! assert_eq!(tokens[0].context.as_ref().unwrap().page_number(), Some("2"));
//! ```

use crate::context::{ProvenanceContext, PAGE_NUMBER, TITLE};
use crate::metadata::{is_fixed_metadata_tag, opens_metadata_scope, ParsedTag};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<tag></?[A-Za-z!][^<>]*>)|(?P<word>\w+)|(?P<space>\s+)|(?P<punct>[^\w\s<]+|<)")
        .expect("valid token regex")
});

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Markup passed through verbatim.
    Tag,
    /// Run of word characters.
    Word,
    /// Run of characters that are neither word nor whitespace.
    Punctuation,
    /// Run of whitespace.
    Whitespace,
}

impl TokenKind {
    /// Words and punctuation take part in n-gram alignment.
    pub fn is_significant(self) -> bool {
        matches!(self, TokenKind::Word | TokenKind::Punctuation)
    }
}

/// A single token of an HTML stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw text as it appeared in the input.
    pub content: String,
    /// Lowercased content. Only set for significant tokens.
    pub normalized: Option<String>,
    /// Set on generated tokens that reproduce source text.
    pub is_match: bool,
    /// Provenance snapshot. Only set for significant tokens.
    pub context: Option<Arc<ProvenanceContext>>,
}

impl Token {
    fn plain(kind: TokenKind, content: &str) -> Self {
        Self {
            kind,
            content: content.to_string(),
            normalized: None,
            is_match: false,
            context: None,
        }
    }

    fn significant(kind: TokenKind, content: &str, context: Arc<ProvenanceContext>) -> Self {
        Self {
            kind,
            content: content.to_string(),
            normalized: Some(content.to_lowercase()),
            is_match: false,
            context: Some(context),
        }
    }

    pub fn is_significant(&self) -> bool {
        self.kind.is_significant()
    }

    pub fn normalized(&self) -> &str {
        self.normalized.as_deref().unwrap_or("")
    }

    /// Formatted provenance of a matched token.
    pub fn citation_title(&self) -> Option<String> {
        if !self.is_match {
            return None;
        }
        Some(self.context.as_deref().map_or_else(
            || ProvenanceContext::new().format(),
            ProvenanceContext::format,
        ))
    }
}

/// An open metadata scope and the plain elements of the same name opened
/// inside it, which must close before the scope does.
#[derive(Debug)]
struct OpenScope {
    name: String,
    nested: usize,
}

/// Single-use tokenizer owning the context stack of one call.
#[derive(Debug)]
pub struct Tokenizer {
    extract_metadata: bool,
    current: Arc<ProvenanceContext>,
    /// Contexts saved when a scope opened, restored when it closes.
    stack: Vec<Arc<ProvenanceContext>>,
    /// Open scopes, parallel to `stack`.
    open_scopes: Vec<OpenScope>,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(extract_metadata: bool) -> Self {
        Self {
            extract_metadata,
            current: Arc::new(ProvenanceContext::new()),
            stack: Vec::new(),
            open_scopes: Vec::new(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self, html: &str) -> Vec<Token> {
        for captures in TOKEN.captures_iter(html) {
            if let Some(tag) = captures.name("tag") {
                let raw = tag.as_str();
                if !(self.extract_metadata && self.consume_metadata_tag(raw)) {
                    self.tokens.push(Token::plain(TokenKind::Tag, raw));
                }
            } else if let Some(word) = captures.name("word") {
                self.push_significant(TokenKind::Word, word.as_str());
            } else if let Some(space) = captures.name("space") {
                self.tokens.push(Token::plain(TokenKind::Whitespace, space.as_str()));
            } else if let Some(punct) = captures.name("punct") {
                self.push_significant(TokenKind::Punctuation, punct.as_str());
            }
        }
        self.tokens
    }

    fn push_significant(&mut self, kind: TokenKind, content: &str) {
        let context = Arc::clone(&self.current);
        self.tokens.push(Token::significant(kind, content, context));
    }

    /// Returns true when the tag was a metadata tag and must not be emitted.
    fn consume_metadata_tag(&mut self, raw: &str) -> bool {
        let tag = match ParsedTag::parse(raw) {
            Some(tag) => tag,
            None => return false,
        };

        if tag.is_closing {
            if is_fixed_metadata_tag(&tag.name) {
                self.close_scope();
                return true;
            }
            let closes_scope = match self.innermost_scope(&tag.name) {
                Some(scope) if scope.nested > 0 => {
                    scope.nested -= 1;
                    false
                }
                Some(_) => true,
                None => false,
            };
            if closes_scope {
                self.close_scope();
            }
            return closes_scope;
        }

        let attributes = tag.attributes();
        if !opens_metadata_scope(&tag.name, &attributes) {
            if !tag.is_self_closing {
                if let Some(scope) = self.innermost_scope(&tag.name) {
                    scope.nested += 1;
                }
            }
            return false;
        }
        if !tag.is_self_closing {
            self.open_scope(tag.name, attributes);
        }
        true
    }

    fn open_scope(&mut self, name: String, attributes: BTreeMap<String, String>) {
        let parent = Arc::clone(&self.current);
        let next = if name == "page" {
            let mut overlay = (*parent).clone();
            match attributes.get(PAGE_NUMBER) {
                Some(page) => {
                    overlay.attributes.insert(PAGE_NUMBER.to_string(), page.clone());
                }
                None => {
                    overlay.attributes.remove(PAGE_NUMBER);
                }
            }
            overlay
        } else {
            let inherit_title = name == "library-attachment" && !attributes.contains_key(TITLE);
            let mut context = ProvenanceContext::for_source(name.clone(), attributes);
            if inherit_title {
                if let Some(title) = parent.get(TITLE) {
                    context.attributes.insert(TITLE.to_string(), title.to_string());
                }
            }
            context
        };

        self.stack.push(parent);
        self.open_scopes.push(OpenScope { name, nested: 0 });
        self.current = Arc::new(next);
    }

    fn innermost_scope(&mut self, name: &str) -> Option<&mut OpenScope> {
        self.open_scopes.iter_mut().rev().find(|scope| scope.name == name)
    }

    fn close_scope(&mut self) {
        self.open_scopes.pop();
        self.current = self
            .stack
            .pop()
            .unwrap_or_else(|| Arc::new(ProvenanceContext::new()));
    }
}

/// Tokenize `html`. With `extract_metadata`, provenance tags are consumed
/// into the context stack instead of being emitted as `Tag` tokens.
pub fn tokenize(html: &str, extract_metadata: bool) -> Vec<Token> {
    Tokenizer::new(extract_metadata).tokenize(html)
}

/// The Word and Punctuation tokens of a stream, with their positions in the
/// full token array.
#[derive(Debug, Clone)]
pub struct SignificantTokens<'a> {
    tokens: &'a [Token],
    indices: Vec<usize>,
}

impl<'a> SignificantTokens<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let indices = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is_significant())
            .map(|(idx, _)| idx)
            .collect();
        Self { tokens, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Positions of the significant tokens in the full token array.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn token(&self, sig_idx: usize) -> &'a Token {
        &self.tokens[self.indices[sig_idx]]
    }

    pub fn normalized(&self, sig_idx: usize) -> &'a str {
        self.token(sig_idx).normalized()
    }

    /// Space-joined normalized text of `len` tokens starting at `start`.
    pub fn key(&self, start: usize, len: usize) -> String {
        let mut key = String::new();
        for sig_idx in start..start + len {
            if sig_idx > start {
                key.push(' ');
            }
            key.push_str(self.normalized(sig_idx));
        }
        key
    }
}
