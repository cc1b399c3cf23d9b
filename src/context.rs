//! Provenance context carried by significant tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key for document titles.
pub const TITLE: &str = "title";
/// Attribute key for file names.
pub const FILENAME: &str = "filename";
/// Attribute key for page numbers (`number` in markup is renamed to this).
pub const PAGE_NUMBER: &str = "pageNumber";
/// Attribute key for case events.
pub const EVENT: &str = "event";
/// Attribute key for case piece labels.
pub const LABEL: &str = "label";

/// Where a span of source text came from.
///
/// `source_type` is the name of the tag that opened the enclosing document
/// scope; every other attribute from that tag lives in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProvenanceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ProvenanceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a document scope: `{sourceType: name, ...attrs}`.
    pub fn for_source(source_type: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            source_type: Some(source_type.into()),
            attributes,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.source_type.is_none() && self.attributes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute value, treating empty strings as absent.
    fn present(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.present(TITLE)
    }

    pub fn filename(&self) -> Option<&str> {
        self.present(FILENAME)
    }

    pub fn page_number(&self) -> Option<&str> {
        self.present(PAGE_NUMBER)
    }

    pub fn event(&self) -> Option<&str> {
        self.present(EVENT)
    }

    pub fn label(&self) -> Option<&str> {
        self.present(LABEL)
    }

    /// Human-readable provenance, used both as tooltip text and as the
    /// equality key when deciding whether adjacent matches share a span.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProvenanceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.label(), self.event()) {
            (Some(label), Some(event)) => write!(f, "{} (e. {})", label, event.to_uppercase())?,
            _ => match self.source_type.as_deref().filter(|s| !s.is_empty()) {
                Some("library-document") => f.write_str("Documento da Biblioteca")?,
                Some("library-attachment") => f.write_str("Anexo da Biblioteca")?,
                Some(other) => write!(f, "[{}]", other.to_uppercase())?,
                None => f.write_str("Trecho encontrado no prompt")?,
            },
        }

        if let Some(title) = self.title() {
            write!(f, ", Título: {}", title)?;
        }
        if let Some(filename) = self.filename() {
            write!(f, ", Arq: {}", filename)?;
        }
        if let Some(page) = self.page_number() {
            write!(f, ", Pág: {}", page)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        assert_eq!(ProvenanceContext::new().format(), "Trecho encontrado no prompt");
    }

    #[test]
    fn test_library_document() {
        let ctx = ProvenanceContext::for_source("library-document", BTreeMap::new())
            .with_attribute(TITLE, "Doc1")
            .with_attribute(FILENAME, "doc1.pdf")
            .with_attribute(PAGE_NUMBER, "3");
        assert_eq!(
            ctx.format(),
            "Documento da Biblioteca, Título: Doc1, Arq: doc1.pdf, Pág: 3"
        );
    }

    #[test]
    fn test_library_attachment() {
        let ctx = ProvenanceContext::for_source("library-attachment", BTreeMap::new())
            .with_attribute(TITLE, "Parecer");
        assert_eq!(ctx.format(), "Anexo da Biblioteca, Título: Parecer");
    }

    #[test]
    fn test_other_source_type_is_bracketed() {
        let ctx = ProvenanceContext::for_source("sentenca", BTreeMap::new());
        assert_eq!(ctx.format(), "[SENTENCA]");
    }

    #[test]
    fn test_event_and_label_take_precedence() {
        let ctx = ProvenanceContext::for_source("peca", BTreeMap::new())
            .with_attribute(EVENT, "12a")
            .with_attribute(LABEL, "Contestação")
            .with_attribute(PAGE_NUMBER, "4");
        assert_eq!(ctx.format(), "Contestação (e. 12A), Pág: 4");
    }

    #[test]
    fn test_label_without_event_falls_back_to_source_type() {
        let ctx = ProvenanceContext::for_source("acordao", BTreeMap::new())
            .with_attribute(LABEL, "Acórdão");
        assert_eq!(ctx.format(), "[ACORDAO]");
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let ctx = ProvenanceContext::for_source("library-document", BTreeMap::new())
            .with_attribute(TITLE, "")
            .with_attribute(PAGE_NUMBER, "7");
        assert_eq!(ctx.format(), "Documento da Biblioteca, Pág: 7");
    }
}
