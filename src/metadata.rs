//! Metadata tag classification.
//!
//! Source HTML wraps quotable regions in provenance tags such as
//! `<library-document title="..">` or `<page number="3">`. These tags open a
//! metadata scope instead of producing visible output. Besides the fixed
//! allow-list, any tag carrying both `event` and `label` attributes is
//! treated as a case-piece scope.
//!
//! Known limitation: the `event` + `label` heuristic also fires on unrelated
//! markup that happens to carry both attributes. Plain elements with the
//! same name as such a scope may nest inside it; only the closing tag that
//! balances the scope's own opening tag ends it.

use crate::context::{EVENT, LABEL, PAGE_NUMBER};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Tag names that always open a metadata scope.
pub const METADATA_TAGS: &[&str] = &[
    "library-document",
    "library-attachment",
    "page",
    "acordao",
    "peticao",
    "sentenca",
];

static TAG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(/)?\s*([A-Za-z][A-Za-z0-9:_.-]*)").expect("valid tag name regex")
});

// Quoted values only; `key=value` without quotes is dropped.
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

/// A tag split into its name and shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag<'a> {
    /// Lowercased tag name.
    pub name: String,
    pub is_closing: bool,
    pub is_self_closing: bool,
    /// Everything after the tag name, up to (not including) the final `>`.
    attribute_text: &'a str,
}

impl<'a> ParsedTag<'a> {
    /// Parse a raw tag such as `<page number="2">`.
    ///
    /// Returns `None` for markup without an element name (comments, doctype).
    pub fn parse(raw: &'a str) -> Option<Self> {
        let captures = TAG_NAME.captures(raw)?;
        let whole = captures.get(0)?;
        let name = captures.get(2)?.as_str().to_ascii_lowercase();
        let is_closing = captures.get(1).is_some();
        let rest = raw[whole.end()..].strip_suffix('>').unwrap_or(&raw[whole.end()..]);
        let is_self_closing = !is_closing && rest.trim_end().ends_with('/');
        Some(Self {
            name,
            is_closing,
            is_self_closing,
            attribute_text: rest,
        })
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        parse_attributes(self.attribute_text)
    }
}

/// Collect quoted `key="value"` pairs. The key `number` becomes `pageNumber`.
pub fn parse_attributes(text: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for captures in ATTRIBUTE.captures_iter(text) {
        let key = &captures[1];
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map_or("", |m| m.as_str());
        let key = if key == "number" { PAGE_NUMBER } else { key };
        attributes.insert(key.to_string(), value.to_string());
    }
    attributes
}

/// Whether the tag name is in the fixed metadata allow-list.
pub fn is_fixed_metadata_tag(name: &str) -> bool {
    METADATA_TAGS.contains(&name)
}

/// Whether an opening tag starts a metadata scope.
pub fn opens_metadata_scope(name: &str, attributes: &BTreeMap<String, String>) -> bool {
    is_fixed_metadata_tag(name) || (attributes.contains_key(EVENT) && attributes.contains_key(LABEL))
}
