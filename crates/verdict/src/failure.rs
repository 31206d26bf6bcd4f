//! Failure values and the error types of the suite API.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::id::TestId;

/// Source position of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Source file path.
    pub file: &'static str,
    /// 1-based line number.
    pub line: u32,
}

impl Location {
    /// Create a location from a file path and line.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line \t{}", self.file, self.line)
    }
}

/// Expands to the [`Location`] of the invocation.
#[macro_export]
macro_rules! here {
    () => {
        $crate::Location::new(file!(), line!())
    };
}

/// One failed assertion, escalated out of a test body.
///
/// The `Display` output is the pre-formatted line the enclosing suite writes
/// to the report stream when it absorbs the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{location}\ttest_id = {test_id}\ttest_name = {test_name}\terror = {message}")]
pub struct Failure {
    test_id: TestId,
    test_name: String,
    message: String,
    location: Location,
}

impl Failure {
    /// Create a failure for the given test.
    #[must_use]
    pub fn new(
        test_id: TestId,
        test_name: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            test_id,
            test_name: test_name.into(),
            message: message.into(),
            location,
        }
    }

    /// Identifier of the failing test.
    #[must_use]
    pub fn test_id(&self) -> TestId {
        self.test_id
    }

    /// Name of the failing test at the time of the failure.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// The caller's message, including any check-specific suffix.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the failing check was written.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Source file of the failing check.
    #[must_use]
    pub fn file(&self) -> &'static str {
        self.location.file
    }

    /// Source line of the failing check.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.location.line
    }
}

/// Result of a check or a test run.
///
/// - `Ok(true)`: passed
/// - `Ok(false)`: failed, recorded, execution continues
/// - `Err(_)`: failed with stop-on-failure set; unwinds to the nearest suite
pub type Outcome = Result<bool, Failure>;

/// Misuse of the suite registration API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuiteError {
    /// A suite cannot contain itself.
    #[error("suite {0} cannot be added to itself")]
    SelfReference(TestId),
    /// The test is already registered in this suite.
    #[error("test {0} is already registered in this suite")]
    Duplicate(TestId),
    /// The test is locked, typically because it is running right now.
    #[error("test {0} is in use and cannot be registered")]
    Busy(TestId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{IdKind, next_id};

    #[test]
    fn failure_display_is_preformatted() {
        let id = next_id(IdKind::Case);
        let failure = Failure::new(id, "parse", "bad token", Location::new("src/a.rs", 12));
        assert_eq!(
            failure.to_string(),
            format!("src/a.rs line \t12\ttest_id = {id}\ttest_name = parse\terror = bad token")
        );
        assert_eq!(failure.file(), "src/a.rs");
        assert_eq!(failure.line(), 12);
    }

    #[test]
    fn here_captures_this_file() {
        let loc = here!();
        assert!(loc.file.ends_with("failure.rs"));
        assert!(loc.line > 0);
    }

    #[test]
    fn caller_location_points_at_call_site() {
        #[track_caller]
        fn where_am_i() -> Location {
            Location::caller()
        }
        let expected_line = line!() + 1;
        let loc = where_am_i();
        assert_eq!(loc.line, expected_line);
    }
}
