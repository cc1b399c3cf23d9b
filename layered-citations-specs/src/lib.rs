#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Fixture-driven testing infrastructure for layered-citations.
//!
//! Each fixture is a TOML file holding a source document, a generated
//! answer, optional tunables and the expectations the highlighted output
//! must meet. Fixtures keep end-to-end behavior reviewable as data rather
//! than as string literals spread across test functions.
//!
//! ## Modules
//!
//! - [`fixture`] - Fixture and expectation types
//! - [`loader`] - Fixture file loading
//! - [`runner`] - Runs a fixture and checks its expectations
//! - [`failures`] - Expected failures tracking via TOML
//! - [`errors`] - Error types for the harness

pub mod errors;
pub mod failures;
pub mod fixture;
pub mod loader;
pub mod runner;

pub use errors::{SpecError, SpecResult};
pub use failures::{ExpectedFailures, FailureEntry, FailureState, HarnessResult};
pub use fixture::{CitationFixture, Expectations};
pub use loader::{load_all_fixtures, load_fixture, parse_fixture};
pub use runner::{format_failure, run_fixture, ExpectationMismatch, FixtureRun};
