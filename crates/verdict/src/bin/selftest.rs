#![forbid(unsafe_code)]

//! # verdict-selftest
//!
//! Registers a demonstration suite, runs it, and exits non-zero if it fails.
//!
//! ## Usage
//!
//! ```bash
//! verdict-selftest                       # Human-readable report
//! verdict-selftest --format json         # One JSON object per line
//! verdict-selftest --include-failing     # Add a case that fails on purpose
//! verdict-selftest --config verdict.toml # Load report settings
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use verdict::prelude::*;
use verdict::{OutputFormat, ReportConfig, SuiteError, TestMeta};

/// Run verdict's demonstration suite.
#[derive(Parser, Debug, Clone)]
#[command(name = "verdict-selftest", author, version, about)]
struct Cli {
    /// Path to a TOML report configuration
    #[arg(long, short = 'c', env = "VERDICT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (human or json); overrides the config file
    #[arg(long, short = 'f')]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Keep running after the first failing case
    #[arg(long)]
    continue_on_failure: bool,

    /// Add a case that fails on purpose
    #[arg(long)]
    include_failing: bool,

    /// Enable verbose logging (repeat for more)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "verdict=debug",
        _ => "verdict=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Leaf case exercising every check kind once.
struct Kinds {
    meta: TestMeta,
}

impl Test for Kinds {
    fn meta(&self) -> &TestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TestMeta {
        &mut self.meta
    }

    fn run(&mut self, c: &mut Checker<'_>) -> Outcome {
        check_eq!(c, "verdict".len(), 7, "byte length")?;
        c.check_equal_str("ok", "ok", "text content", here!())?;
        c.check_not_equal_str("ok", "ko", "text content differs", here!())?;
        c.check_close(0.1_f64 + 0.2, 0.3, "binary rounding", here!())?;
        c.check_not_close_within(1.0_f32, 1.5, 0.5, "boundary counts as apart", here!())?;
        c.check_equal_collection(&[1, 2, 3][..], &vec![1, 2, 3], "slices", here!())?;
        Ok(true)
    }
}

/// Nested suite of ranked arithmetic cases.
fn squares() -> Result<TestSuite, SuiteError> {
    let mut nested = TestSuite::new("nested").with_order(5);
    for n in 1..=3_u64 {
        let rank = i32::try_from(n).unwrap_or(i32::MAX);
        nested.add_test(
            TestCase::new(format!("square {n}"), move |c| {
                check_eq!(c, n * n, n.pow(2), "square")?;
                Ok(true)
            })
            .with_order(rank),
        )?;
    }
    Ok(nested)
}

fn demo_registry(include_failing: bool) -> Result<Registry, SuiteError> {
    let mut registry = Registry::new();
    registry
        .register_with(|| Kinds {
            meta: TestMeta::new("check kinds"),
        })
        .register_with(|| {
            TestCase::new("ordering", |c| {
                let mut ranks = vec![5, 1, 3];
                ranks.sort_unstable_by(|a, b| b.cmp(a));
                c.check_equal_collection(&ranks, &vec![5, 3, 1], "descending", here!())?;
                Ok(true)
            })
            .with_order(10)
        })
        .register_handle(TestHandle::new(squares()?))
        .register_with(|| {
            TestCase::new("not implemented yet", |c| {
                check!(c, false, "should never run")?;
                Ok(true)
            })
            .disabled()
        })
        .register_with(|| verdict::predicate("predicate", || 2_i32.pow(10) == 1024, "powers"));

    if include_failing {
        registry.register_with(|| {
            TestCase::new("deliberate failure", |c| {
                check_eq!(c, 2 + 2, 5, "arithmetic is broken")?;
                Ok(true)
            })
            .with_order(0)
        });
    }
    Ok(registry)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(format) = cli.format {
        config.format = format;
    }
    if cli.no_color {
        config.colors = false;
    }
    if cli.continue_on_failure {
        config.stop_on_failure = false;
    }

    let mut suite = demo_registry(cli.include_failing)
        .and_then(|registry| registry.build("verdict self-test"))
        .context("registering demonstration suite")?;
    suite.set_stop_on_failure(config.stop_on_failure);

    let mut reporter = Reporter::from_config(&config);
    if suite.run_with(&mut reporter) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
