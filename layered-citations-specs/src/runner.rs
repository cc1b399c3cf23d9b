//! Runs fixtures through the highlighter and checks their expectations.

use crate::fixture::CitationFixture;
use crate::SpecResult;
use layered_citations::{HighlightOutcome, Highlighter, NON_CITATION_CLASS};
use std::fmt::{self, Write};

/// A single expectation that did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationMismatch {
    Unchanged { expected: bool },
    Citations { expected: usize, actual: usize },
    Sources { expected: Vec<String>, actual: Vec<String> },
    BridgedGaps { expected: usize, actual: usize },
    Missing(String),
    Unexpected(String),
    Html { expected: String },
}

impl ExpectationMismatch {
    /// Short name used to reference the expectation in `expected-failures.toml`.
    pub fn key(&self) -> &'static str {
        match self {
            ExpectationMismatch::Unchanged { .. } => "unchanged",
            ExpectationMismatch::Citations { .. } => "citations",
            ExpectationMismatch::Sources { .. } => "sources",
            ExpectationMismatch::BridgedGaps { .. } => "bridged_gaps",
            ExpectationMismatch::Missing(_) => "contains",
            ExpectationMismatch::Unexpected(_) => "absent",
            ExpectationMismatch::Html { .. } => "html",
        }
    }
}

impl fmt::Display for ExpectationMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectationMismatch::Unchanged { expected: true } => {
                write!(f, "expected output to equal the generated input")
            }
            ExpectationMismatch::Unchanged { expected: false } => {
                write!(f, "expected output to differ from the generated input")
            }
            ExpectationMismatch::Citations { expected, actual } => {
                write!(f, "expected {} citation(s), found {}", expected, actual)
            }
            ExpectationMismatch::Sources { expected, actual } => {
                write!(f, "expected sources {:?}, found {:?}", expected, actual)
            }
            ExpectationMismatch::BridgedGaps { expected, actual } => {
                write!(f, "expected {} bridged gap(s), found {}", expected, actual)
            }
            ExpectationMismatch::Missing(snippet) => write!(f, "missing snippet: {}", snippet),
            ExpectationMismatch::Unexpected(snippet) => write!(f, "unexpected snippet: {}", snippet),
            ExpectationMismatch::Html { expected } => write!(f, "expected exact output:\n{}", expected),
        }
    }
}

/// Output of one fixture and the expectations it violated.
#[derive(Debug)]
pub struct FixtureRun {
    pub outcome: HighlightOutcome,
    pub mismatches: Vec<ExpectationMismatch>,
}

impl FixtureRun {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Highlight the fixture and check every expectation it declares.
///
/// Fails only when the fixture's tunables are invalid; unmet expectations
/// are reported in [`FixtureRun::mismatches`].
pub fn run_fixture(fixture: &CitationFixture) -> SpecResult<FixtureRun> {
    let highlighter = Highlighter::with_config(fixture.config()?)?;
    let outcome = highlighter.highlight_with_report(&fixture.source, &fixture.generated);
    let mismatches = check_expectations(fixture, &outcome);
    Ok(FixtureRun { outcome, mismatches })
}

fn check_expectations(fixture: &CitationFixture, outcome: &HighlightOutcome) -> Vec<ExpectationMismatch> {
    let expect = &fixture.expect;
    let html = &outcome.html;
    let mut mismatches = Vec::new();

    if let Some(expected) = expect.unchanged {
        if (html == &fixture.generated) != expected {
            mismatches.push(ExpectationMismatch::Unchanged { expected });
        }
    }

    if let Some(expected) = expect.citations {
        let actual = outcome.report.citations.len();
        if actual != expected {
            mismatches.push(ExpectationMismatch::Citations { expected, actual });
        }
    }

    if let Some(expected) = &expect.sources {
        let actual: Vec<String> = outcome.report.sources().into_iter().map(String::from).collect();
        if &actual != expected {
            mismatches.push(ExpectationMismatch::Sources {
                expected: expected.clone(),
                actual,
            });
        }
    }

    if let Some(expected) = expect.bridged_gaps {
        let marker = format!("<span class=\"{}\">", NON_CITATION_CLASS);
        let actual = html.matches(&marker).count();
        if actual != expected {
            mismatches.push(ExpectationMismatch::BridgedGaps { expected, actual });
        }
    }

    for snippet in &expect.contains {
        if !html.contains(snippet.as_str()) {
            mismatches.push(ExpectationMismatch::Missing(snippet.clone()));
        }
    }

    for snippet in &expect.absent {
        if html.contains(snippet.as_str()) {
            mismatches.push(ExpectationMismatch::Unexpected(snippet.clone()));
        }
    }

    if let Some(expected) = &expect.html {
        if html != expected {
            mismatches.push(ExpectationMismatch::Html {
                expected: expected.clone(),
            });
        }
    }

    mismatches
}

/// Format a failed fixture with its output for the test log.
pub fn format_failure(fixture_name: &str, run: &FixtureRun) -> String {
    let mut output = String::new();

    writeln!(output, "\nFAIL: {}", fixture_name).unwrap();
    writeln!(output).unwrap();
    for mismatch in &run.mismatches {
        writeln!(output, "  \u{2717} [{}] {}", mismatch.key(), mismatch).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "  output:").unwrap();
    writeln!(output, "  {}", run.outcome.html).unwrap();

    output
}
