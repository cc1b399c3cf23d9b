//! N-gram index over the significant tokens of the source stream.

use crate::tokenizer::SignificantTokens;
use std::collections::HashMap;

/// Maps every window of `n` normalized significant tokens to the source
/// offsets where it starts.
///
/// Offsets for a key are kept in discovery order, so the first candidate is
/// always the earliest occurrence in the source.
#[derive(Debug, Clone, Default)]
pub struct NGramIndex {
    n: usize,
    entries: HashMap<String, Vec<usize>>,
}

impl NGramIndex {
    /// Index every `n`-token window of `source`. Empty when the source has
    /// fewer than `n` significant tokens.
    pub fn build(source: &SignificantTokens<'_>, n: usize) -> Self {
        let mut entries: HashMap<String, Vec<usize>> = HashMap::new();
        if n > 0 && source.len() >= n {
            for start in 0..=source.len() - n {
                entries.entry(source.key(start, n)).or_default().push(start);
            }
        }
        Self { n, entries }
    }

    /// Window size this index was built with.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Source offsets sharing `key`, earliest first.
    pub fn get(&self, key: &str) -> Option<&[usize]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
