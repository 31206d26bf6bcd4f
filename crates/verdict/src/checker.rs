//! Checker - The assertion engine handed to running tests
//!
//! Every check takes the value(s) under test, a message and a [`Location`],
//! and returns an [`Outcome`]:
//!
//! - on success: `Ok(true)`
//! - on mismatch: one diagnostic line is written to the [`Reporter`]; then
//!   `Err(Failure)` if the running test stops on failure, else `Ok(false)`
//!
//! Test bodies propagate escalated failures with `?`:
//!
//! ```rust
//! use verdict::prelude::*;
//!
//! let mut case = TestCase::new("strings", |c| {
//!     c.check_equal_str("abc", "abc", "same text", here!())?;
//!     check_ne!(c, 1, 2, "distinct")?;
//!     Ok(true)
//! });
//! let mut reporter = Reporter::new().with_output(std::io::sink());
//! let mut checker = Checker::new(&mut reporter, case.meta());
//! assert_eq!(case.run(&mut checker), Ok(true));
//! ```

use std::fmt::Debug;

use crate::comparison::{self, Approximate, Comparison, DEFAULT_DELTA};
use crate::failure::{Failure, Location, Outcome};
use crate::id::TestId;
use crate::report::{Diagnostic, Relation, Reporter};
use crate::test_case::TestMeta;

/// Check surface of one running test.
///
/// Knows the identity and stop-on-failure flag of the test it was created
/// for and borrows the shared report stream.
pub struct Checker<'r> {
    /// Report stream
    reporter: &'r mut Reporter,
    /// Identity of the running test
    test_id: TestId,
    /// Name of the running test
    test_name: String,
    /// Whether a mismatch escalates to a [`Failure`]
    stop_on_failure: bool,
    /// Number of checks that failed so far
    failed_checks: usize,
}

impl<'r> Checker<'r> {
    /// Create a checker for the test described by `meta`.
    pub fn new(reporter: &'r mut Reporter, meta: &TestMeta) -> Self {
        Self {
            reporter,
            test_id: meta.id(),
            test_name: meta.name().to_string(),
            stop_on_failure: meta.stop_on_failure(),
            failed_checks: 0,
        }
    }

    /// The shared report stream.
    pub fn reporter(&mut self) -> &mut Reporter {
        &mut *self.reporter
    }

    /// Identifier of the running test.
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Name of the running test.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Whether mismatches escalate.
    pub fn stop_on_failure(&self) -> bool {
        self.stop_on_failure
    }

    /// Number of failed checks recorded so far.
    pub fn failed_checks(&self) -> usize {
        self.failed_checks
    }

    /// True while no check has failed.
    pub fn passed(&self) -> bool {
        self.failed_checks == 0
    }

    /// Succeeds iff `expression` is true.
    pub fn check(&mut self, expression: bool, message: &str, location: Location) -> Outcome {
        let comparison = comparison::exact(&expression, &true);
        self.settle(comparison, Relation::Equal, message, location)
    }

    /// Succeeds iff `actual == expected`.
    pub fn check_equal<T>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
        location: Location,
    ) -> Outcome
    where
        T: PartialEq + Debug + ?Sized,
    {
        let comparison = comparison::exact(actual, expected);
        self.settle(comparison, Relation::Equal, message, location)
    }

    /// Succeeds iff `actual != expected`.
    pub fn check_not_equal<T>(
        &mut self,
        actual: &T,
        expected: &T,
        message: &str,
        location: Location,
    ) -> Outcome
    where
        T: PartialEq + Debug + ?Sized,
    {
        let comparison = comparison::distinct(actual, expected);
        self.settle(comparison, Relation::NotEqual, message, location)
    }

    /// Succeeds iff both strings have the same content.
    pub fn check_equal_str(
        &mut self,
        actual: &str,
        expected: &str,
        message: &str,
        location: Location,
    ) -> Outcome {
        let comparison = comparison::same_text(actual, expected);
        self.settle(comparison, Relation::Equal, message, location)
    }

    /// Succeeds iff the strings differ in content.
    pub fn check_not_equal_str(
        &mut self,
        actual: &str,
        expected: &str,
        message: &str,
        location: Location,
    ) -> Outcome {
        let comparison = comparison::different_text(actual, expected);
        self.settle(comparison, Relation::NotEqual, message, location)
    }

    /// Tolerance equality with [`DEFAULT_DELTA`].
    pub fn check_close<T: Approximate>(
        &mut self,
        actual: T,
        expected: T,
        message: &str,
        location: Location,
    ) -> Outcome {
        self.check_close_within(actual, expected, DEFAULT_DELTA, message, location)
    }

    /// Succeeds iff `|actual - expected| < delta`.
    pub fn check_close_within<T: Approximate>(
        &mut self,
        actual: T,
        expected: T,
        delta: f64,
        message: &str,
        location: Location,
    ) -> Outcome {
        let comparison = comparison::close(actual, expected, delta);
        let message = with_delta(message, delta);
        self.settle(comparison, Relation::Equal, &message, location)
    }

    /// Tolerance inequality with [`DEFAULT_DELTA`].
    pub fn check_not_close<T: Approximate>(
        &mut self,
        actual: T,
        expected: T,
        message: &str,
        location: Location,
    ) -> Outcome {
        self.check_not_close_within(actual, expected, DEFAULT_DELTA, message, location)
    }

    /// Succeeds iff `|actual - expected| >= delta`.
    pub fn check_not_close_within<T: Approximate>(
        &mut self,
        actual: T,
        expected: T,
        delta: f64,
        message: &str,
        location: Location,
    ) -> Outcome {
        let comparison = comparison::apart(actual, expected, delta);
        let message = with_delta(message, delta);
        self.settle(comparison, Relation::NotEqual, &message, location)
    }

    /// Element-wise equality of two sequences.
    ///
    /// A length mismatch fails immediately and reports both lengths. Each
    /// differing index is reported on its own line.
    pub fn check_equal_collection<A, E, T>(
        &mut self,
        actual: &A,
        expected: &E,
        message: &str,
        location: Location,
    ) -> Outcome
    where
        A: AsRef<[T]> + ?Sized,
        E: AsRef<[T]> + ?Sized,
        T: PartialEq + Debug,
    {
        let comparison = comparison::sequence(actual.as_ref(), expected.as_ref(), |a, e| a == e);
        self.settle(comparison, Relation::Equal, message, location)
    }

    /// Element-wise tolerance equality of two sequences.
    pub fn check_close_collection<T: Approximate>(
        &mut self,
        actual: &[T],
        expected: &[T],
        delta: f64,
        message: &str,
        location: Location,
    ) -> Outcome {
        let comparison = comparison::sequence(actual, expected, |a, e| {
            comparison::approx_eq(*a, *e, delta)
        });
        let message = with_delta(message, delta);
        self.settle(comparison, Relation::Equal, &message, location)
    }

    fn settle(
        &mut self,
        comparison: Comparison,
        relation: Relation,
        message: &str,
        location: Location,
    ) -> Outcome {
        match comparison {
            Comparison::Match => Ok(true),
            Comparison::Mismatch { actual, expected } => {
                self.record(Diagnostic {
                    location,
                    actual,
                    expected,
                    relation,
                    message: message.to_string(),
                });
                self.escalate(message, location)
            }
            Comparison::SizeMismatch { actual, expected } => {
                self.record(Diagnostic {
                    location,
                    actual: actual.to_string(),
                    expected: expected.to_string(),
                    relation: Relation::SameSize,
                    message: message.to_string(),
                });
                self.escalate(message, location)
            }
            Comparison::ElementMismatch(mismatches) => {
                for mismatch in mismatches {
                    let indexed = format!("{message} at index {}", mismatch.index);
                    self.record(Diagnostic {
                        location,
                        actual: mismatch.actual,
                        expected: mismatch.expected,
                        relation,
                        message: indexed.clone(),
                    });
                    if self.stop_on_failure {
                        return self.escalate(&indexed, location);
                    }
                }
                Ok(false)
            }
        }
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        self.failed_checks += 1;
        tracing::debug!(
            test = %self.test_name,
            file = diagnostic.location.file,
            line = diagnostic.location.line,
            "check failed"
        );
        self.reporter.check_failed(&self.test_name, &diagnostic);
    }

    fn escalate(&self, message: &str, location: Location) -> Outcome {
        if self.stop_on_failure {
            Err(Failure::new(
                self.test_id,
                self.test_name.clone(),
                message,
                location,
            ))
        } else {
            Ok(false)
        }
    }
}

fn with_delta(message: &str, delta: f64) -> String {
    format!("{message} (delta = {delta})")
}

/// `check!(checker, expression, message)`: boolean check at the invocation site.
#[macro_export]
macro_rules! check {
    ($checker:expr, $expression:expr, $message:expr $(,)?) => {
        $checker.check($expression, $message, $crate::here!())
    };
}

/// `check_eq!(checker, actual, expected, message)`: exact equality at the
/// invocation site.
#[macro_export]
macro_rules! check_eq {
    ($checker:expr, $actual:expr, $expected:expr, $message:expr $(,)?) => {
        $checker.check_equal(&$actual, &$expected, $message, $crate::here!())
    };
}

/// `check_ne!(checker, actual, expected, message)`: exact inequality at the
/// invocation site.
#[macro_export]
macro_rules! check_ne {
    ($checker:expr, $actual:expr, $expected:expr, $message:expr $(,)?) => {
        $checker.check_not_equal(&$actual, &$expected, $message, $crate::here!())
    };
}
