//! Unit tests for verdict error types.
//!
//! Tests verify:
//! - Failure formatting and accessors
//! - SuiteError variants and Display
//! - ConfigError from missing and malformed files

use std::error::Error as StdError;
use std::io::Write;

use verdict::prelude::*;
use verdict::{ConfigError, OutputFormat, ReportConfig, SuiteError, TestMeta};

mod failure_tests {
    use super::*;

    #[test]
    fn failure_is_an_error() {
        let meta = TestMeta::new("parse");
        let failure = Failure::new(meta.id(), meta.name(), "bad input", Location::new("lib.rs", 4));
        let as_error: &dyn StdError = &failure;
        assert!(as_error.source().is_none());
        assert!(as_error.to_string().starts_with("lib.rs line \t4\ttest_id = case#"));
    }

    #[test]
    fn failure_clone_is_equal() {
        let meta = TestMeta::new("clone");
        let failure = Failure::new(meta.id(), "clone", "m", Location::new("a.rs", 1));
        assert_eq!(failure.clone(), failure);
        assert_eq!(failure.test_id(), meta.id());
    }
}

mod suite_error_tests {
    use super::*;

    #[test]
    fn display_mentions_the_test() {
        let handle = TestCase::new("x", |_| Ok(true)).into_handle();
        let id = handle.id();
        assert_eq!(
            SuiteError::Duplicate(id).to_string(),
            format!("test {id} is already registered in this suite")
        );
        assert!(SuiteError::Busy(id).to_string().contains("in use"));
        assert!(SuiteError::SelfReference(id).to_string().contains("itself"));
    }
}

mod config_error_tests {
    use super::*;

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = \"json\"").unwrap();
        writeln!(file, "name_width = 12").unwrap();

        let config = ReportConfig::load(file.path()).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.name_width, 12);
        assert!(config.stop_on_failure);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = [").unwrap();

        let err = ReportConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_format_is_parse_error() {
        let err = ReportConfig::from_toml_str("format = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_keeps_the_io_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReportConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.source().is_some());
    }
}
