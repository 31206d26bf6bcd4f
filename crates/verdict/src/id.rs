//! Identifier source for tests and suites.
//!
//! Each entity kind draws from its own process-wide, monotonically increasing
//! sequence. Identifiers of different kinds never compare equal, even when
//! their sequence numbers coincide.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_CASE: AtomicU64 = AtomicU64::new(1);
static NEXT_SUITE: AtomicU64 = AtomicU64::new(1);

/// Kind of entity an identifier was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// A leaf test case.
    Case,
    /// A composite test suite.
    Suite,
}

impl IdKind {
    /// Returns the string name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Suite => "suite",
        }
    }

    fn counter(self) -> &'static AtomicU64 {
        match self {
            Self::Case => &NEXT_CASE,
            Self::Suite => &NEXT_SUITE,
        }
    }
}

/// Unique identifier of a test case or suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TestId {
    kind: IdKind,
    seq: u64,
}

impl TestId {
    /// Entity kind this identifier belongs to.
    #[must_use]
    pub fn kind(&self) -> IdKind {
        self.kind
    }

    /// Sequence number within the kind.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.as_str(), self.seq)
    }
}

/// Issues the next identifier for `kind`.
pub fn next_id(kind: IdKind) -> TestId {
    let seq = kind.counter().fetch_add(1, Ordering::Relaxed);
    TestId { kind, seq }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_within_a_kind() {
        let a = next_id(IdKind::Case);
        let b = next_id(IdKind::Case);
        assert!(b.seq() > a.seq());
        assert_ne!(a, b);
    }

    #[test]
    fn kinds_are_independent() {
        let case = next_id(IdKind::Case);
        let suite = next_id(IdKind::Suite);
        assert_eq!(case.kind(), IdKind::Case);
        assert_eq!(suite.kind(), IdKind::Suite);
        assert_ne!(case, suite);
    }

    #[test]
    fn display_includes_kind() {
        let id = next_id(IdKind::Suite);
        assert_eq!(id.to_string(), format!("suite#{}", id.seq()));
    }
}
