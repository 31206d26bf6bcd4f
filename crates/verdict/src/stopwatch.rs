//! Wall-clock stopwatch used for per-case and per-suite timing.

use std::time::{Duration, Instant};

/// Stopwatch with a movable mark.
///
/// `elapsed` measures from construction until [`StopWatch::stop`] (or now if
/// still running); `elapsed_since_mark` measures from the last [`StopWatch::mark`].
#[derive(Debug, Clone, Copy)]
pub struct StopWatch {
    start: Instant,
    mark: Instant,
    stopped: Option<Instant>,
}

impl Default for StopWatch {
    fn default() -> Self {
        Self::start()
    }
}

impl StopWatch {
    /// Start a new stopwatch.
    #[must_use]
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            mark: now,
            stopped: None,
        }
    }

    /// Move the mark to now.
    pub fn mark(&mut self) {
        self.mark = Instant::now();
    }

    /// Freeze the total elapsed time.
    pub fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(Instant::now());
        }
    }

    fn now(&self) -> Instant {
        self.stopped.unwrap_or_else(Instant::now)
    }

    /// Time since the stopwatch started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.now().saturating_duration_since(self.start)
    }

    /// Time since the last mark.
    #[must_use]
    pub fn elapsed_since_mark(&self) -> Duration {
        self.now().saturating_duration_since(self.mark)
    }
}

/// Render a duration the way report lines show it.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{:.3}ms", secs * 1000.0)
    } else {
        format!("{secs:.3}s")
    }
}
