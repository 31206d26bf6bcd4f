//! Comparison - Value-kind comparison without side effects
//!
//! One comparison per capability:
//! - exact: anything with `PartialEq + Debug`
//! - tolerance: [`Approximate`] kinds (`f32`, `f64`) with an absolute delta
//! - sequence: slices, compared length first and then index by index
//!
//! The [`Checker`](crate::Checker) turns a [`Comparison`] into a report line
//! and an [`Outcome`](crate::Outcome).

use std::fmt::Debug;

/// Default absolute tolerance for [`Approximate`] comparisons.
pub const DEFAULT_DELTA: f64 = 0.000_000_1;

/// Values compared by absolute difference rather than bit equality.
pub trait Approximate: Copy + Debug {
    /// Absolute difference between `self` and `other`, widened to `f64`.
    fn abs_diff(self, other: Self) -> f64;
}

impl Approximate for f64 {
    fn abs_diff(self, other: Self) -> f64 {
        (self - other).abs()
    }
}

impl Approximate for f32 {
    fn abs_diff(self, other: Self) -> f64 {
        f64::from((self - other).abs())
    }
}

/// `|actual - expected| < delta`.
///
/// NaN is never approximately equal to anything.
pub fn approx_eq<T: Approximate>(actual: T, expected: T, delta: f64) -> bool {
    actual.abs_diff(expected) < delta
}

/// `|actual - expected| >= delta`: a difference of exactly `delta` counts as
/// not equal.
///
/// Like [`approx_eq`], this is false when either value is NaN.
pub fn approx_ne<T: Approximate>(actual: T, expected: T, delta: f64) -> bool {
    actual.abs_diff(expected) >= delta
}

/// One index at which two sequences differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMismatch {
    /// Index of the differing element.
    pub index: usize,
    /// Rendered actual element.
    pub actual: String,
    /// Rendered expected element.
    pub expected: String,
}

/// Result of comparing an actual value with an expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The relation holds.
    Match,
    /// The relation does not hold for scalar values.
    Mismatch {
        /// Rendered actual value.
        actual: String,
        /// Rendered expected value.
        expected: String,
    },
    /// Sequences of different length; no element was compared.
    SizeMismatch {
        /// Length of the actual sequence.
        actual: usize,
        /// Length of the expected sequence.
        expected: usize,
    },
    /// Sequences of equal length differing at one or more indices.
    ElementMismatch(Vec<ElementMismatch>),
}

impl Comparison {
    /// Returns true if the relation holds.
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }

    fn scalar(holds: bool, actual: String, expected: String) -> Self {
        if holds {
            Comparison::Match
        } else {
            Comparison::Mismatch { actual, expected }
        }
    }
}

/// Render a value for a report line.
pub fn render<T: Debug + ?Sized>(value: &T) -> String {
    format!("{value:?}")
}

/// `actual == expected`.
pub fn exact<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T) -> Comparison {
    Comparison::scalar(actual == expected, render(actual), render(expected))
}

/// `actual != expected`.
pub fn distinct<T: PartialEq + Debug + ?Sized>(actual: &T, expected: &T) -> Comparison {
    Comparison::scalar(actual != expected, render(actual), render(expected))
}

/// Content equality of two strings, rendered without quoting.
pub fn same_text(actual: &str, expected: &str) -> Comparison {
    Comparison::scalar(actual == expected, actual.to_string(), expected.to_string())
}

/// Content inequality of two strings, rendered without quoting.
pub fn different_text(actual: &str, expected: &str) -> Comparison {
    Comparison::scalar(actual != expected, actual.to_string(), expected.to_string())
}

/// Tolerance equality, see [`approx_eq`].
pub fn close<T: Approximate>(actual: T, expected: T, delta: f64) -> Comparison {
    Comparison::scalar(
        approx_eq(actual, expected, delta),
        render(&actual),
        render(&expected),
    )
}

/// Tolerance inequality, see [`approx_ne`].
pub fn apart<T: Approximate>(actual: T, expected: T, delta: f64) -> Comparison {
    Comparison::scalar(
        approx_ne(actual, expected, delta),
        render(&actual),
        render(&expected),
    )
}

/// Compare two sequences with `eq` applied index by index.
///
/// A length mismatch is reported on its own; elements are only compared
/// when both sequences have the same length.
pub fn sequence<A, E, F>(actual: &[A], expected: &[E], mut eq: F) -> Comparison
where
    A: Debug,
    E: Debug,
    F: FnMut(&A, &E) -> bool,
{
    if actual.len() != expected.len() {
        return Comparison::SizeMismatch {
            actual: actual.len(),
            expected: expected.len(),
        };
    }

    let mismatches: Vec<ElementMismatch> = actual
        .iter()
        .zip(expected)
        .enumerate()
        .filter(|&(_, (a, e))| !eq(a, e))
        .map(|(index, (a, e))| ElementMismatch {
            index,
            actual: render(a),
            expected: render(e),
        })
        .collect();

    if mismatches.is_empty() {
        Comparison::Match
    } else {
        Comparison::ElementMismatch(mismatches)
    }
}
