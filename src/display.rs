use crate::report::CitationReport;
use crate::tokenizer::{Token, TokenKind};
use std::fmt::{self, Write};
use unicode_width::UnicodeWidthStr;

/// Renders annotated tokens with their citation passages underlined.
///
/// Whitespace tokens are not shown; the remaining tokens are separated by two
/// spaces and every passage gets one line with its provenance title.
pub struct TokenStreamDisplay<'a> {
    tokens: &'a [Token],
}

impl<'a> TokenStreamDisplay<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }
}

// um  dois  ,  e  tres  quatro
// ╰─────────╯Documento da Biblioteca, Título: A
//                 ╰──────────╯Documento da Biblioteca, Título: B
impl<'a> fmt::Display for TokenStreamDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SPACE_PADDING: usize = 2;
        let mut token_idx_to_start_display_char_idx = vec![0; self.tokens.len()];
        let mut token_idx_to_end_display_char_idx = vec![0; self.tokens.len()];

        let mut opening_line = String::new();
        {
            let mut is_first = true;
            for (idx, token) in self.tokens.iter().enumerate() {
                if token.kind == TokenKind::Whitespace {
                    continue;
                }
                if is_first {
                    is_first = false;
                } else {
                    opening_line.extend(std::iter::repeat(' ').take(SPACE_PADDING));
                }
                token_idx_to_start_display_char_idx[idx] = UnicodeWidthStr::width(&*opening_line);
                opening_line.push_str(&token.content);
                token_idx_to_end_display_char_idx[idx] = UnicodeWidthStr::width(&*opening_line);
            }
        }

        f.write_str(&opening_line)?;

        let report = CitationReport::from_tokens(self.tokens);
        for citation in &report.citations {
            f.write_char('\n')?;

            let start_char_idx = token_idx_to_start_display_char_idx[citation.token_start];
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;

            let end_char_idx = token_idx_to_end_display_char_idx[citation.token_end - 1];
            let char_len = end_char_idx - start_char_idx;
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }

            if char_len > 1 {
                f.write_char('╯')?;
            }

            f.write_str(&citation.title)?;
        }

        Ok(())
    }
}
