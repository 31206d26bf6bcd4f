//! Shared helpers for verdict integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use verdict::prelude::*;

/// In-memory report stream.
#[derive(Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn reporter(&self) -> Reporter {
        Reporter::new().with_output(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Lines with the trailing elapsed time removed.
    pub fn untimed_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .map(|line| {
                let trimmed = line.trim_end();
                if trimmed.ends_with("ms") || trimmed.ends_with('s') {
                    match trimmed.rsplit_once(' ') {
                        Some((head, _)) => head.trim_end().to_string(),
                        None => trimmed.to_string(),
                    }
                } else {
                    trimmed.to_string()
                }
            })
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Names of executed tests, in execution order.
pub type Trace = Arc<Mutex<Vec<String>>>;

/// A case that records its execution and then passes or fails.
pub fn traced(trace: &Trace, name: &str, pass: bool) -> TestCase {
    let trace = trace.clone();
    let label = name.to_string();
    TestCase::new(name, move |c| {
        trace.lock().push(label.clone());
        c.check(pass, "traced outcome", here!())?;
        Ok(c.passed())
    })
}
