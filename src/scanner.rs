//! Greedy longest-match alignment of generated text against the source.
//!
//! The scanner walks the generated significant tokens left to right. Each
//! window of `n` tokens found in the source index is extended as far as the
//! two streams keep agreeing, and the longest extension among all candidate
//! source offsets is committed before the cursor jumps past it. Committed
//! runs never overlap.
//!
//! Tokens near the end of the generated text can never start a full window,
//! so a second pass retries the tail with shrinking windows (down to
//! [`TAIL_MIN_WINDOW`] tokens).

use crate::ngram_index::NGramIndex;
use crate::tokenizer::{SignificantTokens, Token};
use std::sync::Arc;

/// Smallest window the tail pass will try.
pub const TAIL_MIN_WINDOW: usize = 3;

/// A committed alignment between the two significant-token streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRun {
    pub generated_start: usize,
    pub source_start: usize,
    pub length: usize,
}

/// Number of consecutive tokens with equal normalized text starting at the
/// two offsets.
pub fn measure_match_length(
    generated: &SignificantTokens<'_>,
    generated_start: usize,
    source: &SignificantTokens<'_>,
    source_start: usize,
) -> usize {
    let mut length = 0;
    while generated_start + length < generated.len()
        && source_start + length < source.len()
        && generated.normalized(generated_start + length) == source.normalized(source_start + length)
    {
        length += 1;
    }
    length
}

/// Scanner over one source stream and its index.
#[derive(Debug)]
pub struct LongestMatchScanner<'a, 's> {
    source: &'a SignificantTokens<'s>,
    index: &'a NGramIndex,
}

impl<'a, 's> LongestMatchScanner<'a, 's> {
    pub fn new(source: &'a SignificantTokens<'s>, index: &'a NGramIndex) -> Self {
        Self { source, index }
    }

    /// Find all runs of `generated` that reproduce source text.
    ///
    /// Returns nothing when the index is empty, i.e. when the source is
    /// shorter than one window.
    pub fn scan(&self, generated: &SignificantTokens<'_>) -> Vec<MatchRun> {
        let mut runs = Vec::new();
        let n = self.index.n();
        if self.index.is_empty() || n == 0 {
            return runs;
        }

        let len = generated.len();
        let mut gen_index = 0;

        while gen_index + n <= len {
            let key = generated.key(gen_index, n);
            let best = self
                .index
                .get(&key)
                .and_then(|candidates| self.longest(generated, gen_index, candidates.iter().copied()));
            match best {
                Some(run) => {
                    tracing::trace!(?run, key = %key, "committed window match");
                    gen_index += run.length.max(1);
                    runs.push(run);
                }
                None => gen_index += 1,
            }
        }

        let min_window = TAIL_MIN_WINDOW.min(n);
        while gen_index < len {
            let remaining = len - gen_index;
            let mut found = None;
            for size in (min_window..=remaining).rev() {
                let candidates = self.window_offsets(generated, gen_index, size);
                if let Some(run) = self.longest(generated, gen_index, candidates.into_iter()) {
                    found = Some(run);
                    break;
                }
            }
            match found {
                Some(run) => {
                    tracing::trace!(?run, "committed tail match");
                    gen_index += run.length.max(1);
                    runs.push(run);
                }
                None => gen_index += 1,
            }
        }

        runs
    }

    /// The candidate with the longest agreement. Ties keep the earliest
    /// candidate.
    fn longest(
        &self,
        generated: &SignificantTokens<'_>,
        gen_index: usize,
        candidates: impl Iterator<Item = usize>,
    ) -> Option<MatchRun> {
        let mut best: Option<MatchRun> = None;
        for source_start in candidates {
            let length = measure_match_length(generated, gen_index, self.source, source_start);
            if length == 0 {
                continue;
            }
            if best.map_or(true, |b| length > b.length) {
                best = Some(MatchRun {
                    generated_start: gen_index,
                    source_start,
                    length,
                });
            }
        }
        best
    }

    /// Source offsets where the `size` generated tokens at `gen_index` occur.
    fn window_offsets(
        &self,
        generated: &SignificantTokens<'_>,
        gen_index: usize,
        size: usize,
    ) -> Vec<usize> {
        if size == 0 || self.source.len() < size {
            return Vec::new();
        }
        (0..=self.source.len() - size)
            .filter(|&start| {
                (0..size).all(|k| generated.normalized(gen_index + k) == self.source.normalized(start + k))
            })
            .collect()
    }
}

/// Mark the generated tokens covered by `runs`, copying each source token's
/// context onto its aligned generated token.
///
/// `generated_indices` are the positions of the generated significant tokens
/// in `generated_tokens`.
pub fn apply_matches(
    generated_tokens: &mut [Token],
    generated_indices: &[usize],
    source: &SignificantTokens<'_>,
    runs: &[MatchRun],
) {
    for run in runs {
        for offset in 0..run.length {
            let token = &mut generated_tokens[generated_indices[run.generated_start + offset]];
            token.is_match = true;
            token.context = source.token(run.source_start + offset).context.as_ref().map(Arc::clone);
        }
    }
}
