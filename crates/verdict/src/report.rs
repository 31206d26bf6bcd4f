//! Reporter - The append-only output sink for suite runs
//!
//! Every event is written as exactly one line and flushed immediately:
//! - failed checks (file, line, actual, expected, message)
//! - finished cases with their countdown index and elapsed time
//! - disabled cases
//! - escalated failures absorbed by a suite
//! - the final `ok` line of a fully successful suite
//!
//! Two formats are supported: human-readable text (optionally colored) and
//! one JSON object per line for CI parsing. Write errors are swallowed; the
//! sink never turns a passing run into a failing one.
//!
//! # Example
//!
//! ```rust
//! use verdict::{OutputFormat, Reporter};
//!
//! let mut reporter = Reporter::new()
//!     .with_format(OutputFormat::Json)
//!     .with_output(std::io::sink());
//! reporter.case_disabled(3, "slow_case");
//! ```

use std::io::{self, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::ReportConfig;
use crate::failure::{Failure, Location};
use crate::id::TestId;
use crate::stopwatch::format_duration;

/// Output format for the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(format!("invalid output format: {s:?}")),
        }
    }
}

/// Relation that a failed check expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Values should have been equal.
    Equal,
    /// Values should have differed.
    NotEqual,
    /// Sequences should have had the same length.
    SameSize,
}

/// Everything a failed check writes to the report stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where the check was written.
    pub location: Location,
    /// Rendered actual value (or length).
    pub actual: String,
    /// Rendered expected value (or length).
    pub expected: String,
    /// The relation that did not hold.
    pub relation: Relation,
    /// Caller's message plus any check-specific suffix.
    pub message: String,
}

impl Diagnostic {
    /// The human-readable diagnostic line, without indentation.
    pub fn line(&self) -> String {
        let loc = self.location;
        match self.relation {
            Relation::Equal => format!(
                "{loc}\t actual [{}] != [{}] expected\t{}",
                self.actual, self.expected, self.message
            ),
            Relation::NotEqual => format!(
                "{loc}\t actual [{}] == [{}] expected\t{}",
                self.actual, self.expected, self.message
            ),
            Relation::SameSize => format!(
                "{loc}\t actual size [{}] != [{}] expected size\t{}",
                self.actual, self.expected, self.message
            ),
        }
    }
}

/// JSON event for structured output
#[derive(Debug, Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<&'a Diagnostic>,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, depth: usize) -> Self {
        Self {
            event,
            depth,
            index: None,
            name: None,
            elapsed_ms: None,
            passed: None,
            message: None,
            diagnostic: None,
        }
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Destination of report lines
///
/// Every report line is written whole: the terminal variant holds the stdout
/// lock for the line, the buffered variant assembles it and issues one write.
enum OutputWriter {
    /// Standard output, colored when the terminal allows it
    Terminal(StandardStream),
    /// Caller-provided writer (files, buffers, tests); never colored
    Buffered(Box<dyn Write + Send>),
}

impl OutputWriter {
    fn stdout(colors: bool) -> Self {
        let choice = if colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        OutputWriter::Terminal(StandardStream::stdout(choice))
    }

    fn line(&mut self, indent: &str, style: Option<&ColorSpec>, text: &str) -> io::Result<()> {
        match self {
            OutputWriter::Terminal(stream) => {
                let mut out = stream.lock();
                out.write_all(indent.as_bytes())?;
                if let Some(spec) = style {
                    out.set_color(spec)?;
                    out.write_all(text.as_bytes())?;
                    out.reset()?;
                } else {
                    out.write_all(text.as_bytes())?;
                }
                out.write_all(b"\n")?;
                out.flush()
            }
            OutputWriter::Buffered(writer) => {
                let mut line = String::with_capacity(indent.len() + text.len() + 1);
                line.push_str(indent);
                line.push_str(text);
                line.push('\n');
                writer.write_all(line.as_bytes())?;
                writer.flush()
            }
        }
    }
}

/// Append-only sink for suite and check events
pub struct Reporter {
    /// Output destination
    output: OutputWriter,
    /// Output format (Human or JSON)
    format: OutputFormat,
    /// Whether to use colors
    colors: bool,
    /// Nesting depth of the running suite
    indent: usize,
    /// Width of the countdown index (zero padded)
    index_width: usize,
    /// Width the case name is padded to
    name_width: usize,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("format", &self.format)
            .field("colors", &self.colors)
            .field("indent", &self.indent)
            .field("index_width", &self.index_width)
            .field("name_width", &self.name_width)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Create a reporter writing human-readable lines to stdout
    pub fn new() -> Self {
        Self {
            output: OutputWriter::stdout(true),
            format: OutputFormat::Human,
            colors: true,
            indent: 0,
            index_width: 4,
            name_width: 30,
        }
    }

    /// Create a stdout reporter from a loaded configuration
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new()
            .with_colors(config.colors)
            .with_format(config.format)
            .with_index_width(config.index_width)
            .with_name_width(config.name_width)
    }

    /// Set the output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set whether to use colors
    ///
    /// Only affects stdout; a destination set with [`Reporter::with_output`]
    /// is kept and stays uncolored.
    pub fn with_colors(mut self, colors: bool) -> Self {
        if let OutputWriter::Terminal(_) = self.output {
            self.output = OutputWriter::stdout(colors);
            self.colors = colors;
        }
        self
    }

    /// Set a custom output destination (disables colors)
    pub fn with_output<W: Write + Send + 'static>(mut self, output: W) -> Self {
        self.output = OutputWriter::Buffered(Box::new(output));
        self.colors = false;
        self
    }

    /// Set the zero-padded width of the countdown index
    pub fn with_index_width(mut self, width: usize) -> Self {
        self.index_width = width;
        self
    }

    /// Set the width case names are padded to
    pub fn with_name_width(mut self, width: usize) -> Self {
        self.name_width = width;
        self
    }

    /// Current output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Increase indentation for a nested suite
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease indentation after a nested suite
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.indent
    }

    fn human_line(&mut self, color: Option<Color>, bold: bool, text: &str) {
        let indent = "  ".repeat(self.indent);
        let spec = color.filter(|_| self.colors).map(|color| {
            let mut spec = ColorSpec::new();
            spec.set_fg(Some(color)).set_bold(bold);
            spec
        });
        let _ = self.output.line(&indent, spec.as_ref(), text);
    }

    fn json_line(&mut self, event: &JsonEvent<'_>) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = self.output.line("", None, &json);
        }
    }

    /// Report a failed check
    pub fn check_failed(&mut self, test_name: &str, diagnostic: &Diagnostic) {
        match self.format {
            OutputFormat::Human => self.human_line(Some(Color::Red), false, &diagnostic.line()),
            OutputFormat::Json => {
                let mut event = JsonEvent::new("check_failed", self.indent);
                event.name = Some(test_name);
                event.passed = Some(false);
                event.diagnostic = Some(diagnostic);
                self.json_line(&event);
            }
        }
    }

    /// Report a case that ran to completion
    pub fn case_finished(&mut self, index: usize, name: &str, elapsed: Duration, passed: bool) {
        match self.format {
            OutputFormat::Human => {
                let line = format!(
                    "{index:0iw$} {name:<nw$} {elapsed}",
                    iw = self.index_width,
                    nw = self.name_width,
                    elapsed = format_duration(elapsed),
                );
                let color = if passed { Color::Green } else { Color::Red };
                self.human_line(Some(color), false, &line);
            }
            OutputFormat::Json => {
                let mut event = JsonEvent::new("case", self.indent);
                event.index = Some(index);
                event.name = Some(name);
                event.elapsed_ms = Some(millis(elapsed));
                event.passed = Some(passed);
                self.json_line(&event);
            }
        }
    }

    /// Report a case that was skipped because it is disabled
    pub fn case_disabled(&mut self, index: usize, name: &str) {
        match self.format {
            OutputFormat::Human => {
                let line = format!("{index:0iw$} {name} is disabled", iw = self.index_width);
                self.human_line(Some(Color::Yellow), false, &line);
            }
            OutputFormat::Json => {
                let mut event = JsonEvent::new("disabled", self.indent);
                event.index = Some(index);
                event.name = Some(name);
                self.json_line(&event);
            }
        }
    }

    /// Report a case that could not be locked because it is already running
    pub fn case_busy(&mut self, index: usize, id: TestId) {
        match self.format {
            OutputFormat::Human => {
                let line = format!("{index:0iw$} {id} is already running", iw = self.index_width);
                self.human_line(Some(Color::Red), false, &line);
            }
            OutputFormat::Json => {
                let mut event = JsonEvent::new("busy", self.indent);
                event.index = Some(index);
                event.passed = Some(false);
                event.message = Some(id.to_string());
                self.json_line(&event);
            }
        }
    }

    /// Report an escalated failure absorbed by a suite
    pub fn failure(&mut self, failure: &Failure) {
        match self.format {
            OutputFormat::Human => self.human_line(Some(Color::Red), true, &failure.to_string()),
            OutputFormat::Json => {
                let mut event = JsonEvent::new("failure", self.indent);
                event.name = Some(failure.test_name());
                event.passed = Some(false);
                event.message = Some(failure.to_string());
                self.json_line(&event);
            }
        }
    }

    /// Report a fully successful suite
    pub fn suite_ok(&mut self, name: &str, elapsed: Duration) {
        match self.format {
            OutputFormat::Human => {
                let line = format!("ok {}", format_duration(elapsed));
                self.human_line(Some(Color::Green), true, &line);
            }
            OutputFormat::Json => {
                let mut event = JsonEvent::new("ok", self.indent);
                event.name = Some(name);
                event.elapsed_ms = Some(millis(elapsed));
                event.passed = Some(true);
                self.json_line(&event);
            }
        }
    }
}
