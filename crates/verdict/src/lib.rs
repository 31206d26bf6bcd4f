#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Verdict
//!
//! A small test-orchestration and assertion engine.
//!
//! Verdict registers test cases, runs them in a defined order with a
//! stop-on-failure policy, and reports pass/fail with timing and diagnostic
//! context on a single text stream.
//!
//! ## Architecture
//!
//! - [`Checker`]: the assertion engine handed to every running test
//! - [`Test`] / [`TestCase`]: a named, identified, orderable unit of work
//! - [`TestSuite`]: a composite test with an unordered and an ordered partition
//! - [`Failure`]: the structured value describing one failed assertion
//! - [`Reporter`]: the append-only output sink
//! - [`Registry`]: explicit registration of test factories
//!
//! ## Example
//!
//! ```rust
//! use verdict::prelude::*;
//!
//! let mut suite = TestSuite::new("arithmetic");
//! suite
//!     .add_test(TestCase::new("addition", |c| {
//!         c.check_equal(&(2 + 2), &4, "2 + 2", here!())?;
//!         Ok(true)
//!     }).with_order(2))
//!     .unwrap();
//! suite
//!     .add_test(TestCase::new("division", |c| {
//!         c.check_close(1.0_f64 / 3.0, 0.333_333_33, "1 / 3", here!())?;
//!         Ok(true)
//!     }).with_order(1))
//!     .unwrap();
//!
//! let mut reporter = Reporter::new().with_output(std::io::sink());
//! assert!(suite.run_with(&mut reporter));
//! ```
//!
//! ## Failure semantics
//!
//! Every check returns an [`Outcome`]. A mismatch is written to the reporter
//! and yields `Ok(false)`, unless the running test has stop-on-failure set,
//! in which case it yields `Err(Failure)` and the test body bails out with
//! `?`. The nearest enclosing suite absorbs the failure.

pub mod checker;
pub mod comparison;
pub mod config;
pub mod failure;
pub mod id;
pub mod registry;
pub mod report;
pub mod stopwatch;
pub mod suite;
pub mod test_case;

pub use checker::Checker;
pub use comparison::{Approximate, Comparison, DEFAULT_DELTA};
pub use config::{ConfigError, ReportConfig};
pub use failure::{Failure, Location, Outcome, SuiteError};
pub use id::{IdKind, TestId, next_id};
pub use registry::{ALL_TESTS, Registry, all_tests};
pub use report::{Diagnostic, OutputFormat, Relation, Reporter};
pub use stopwatch::{StopWatch, format_duration};
pub use suite::TestSuite;
pub use test_case::{Test, TestCase, TestHandle, TestMeta, UNORDERED, predicate};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Checker, Failure, Location, Outcome, Registry, Reporter, Test, TestCase, TestHandle,
        TestSuite, all_tests, check, check_eq, check_ne, here,
    };
}
