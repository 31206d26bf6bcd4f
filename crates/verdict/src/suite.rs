//! TestSuite - Composite test with ordered and unordered partitions
//!
//! A suite schedules its tests in two phases:
//! - the unordered partition, in insertion order
//! - the ordered partition, highest order rank first (equal ranks: lower
//!   identifier first)
//!
//! Before each test runs it inherits the suite's stop-on-failure flag. With
//! the flag set, the first failing test ends its partition, and a failure in
//! the unordered partition skips the ordered one entirely. The suite passes
//! iff every executed test passed; disabled tests count as passed.
//!
//! Escalated [`Failure`](crate::Failure)s are absorbed here: the suite writes
//! the failure line and marks the test failed without propagating further.

use std::collections::BinaryHeap;
use std::fmt;

use indexmap::IndexMap;

use crate::checker::Checker;
use crate::failure::{Outcome, SuiteError};
use crate::id::TestId;
use crate::report::Reporter;
use crate::stopwatch::StopWatch;
use crate::test_case::{Test, TestHandle, TestMeta};

/// Outcome of running one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartitionRun {
    passed: bool,
    aborted: bool,
}

/// Composite test aggregating other tests
pub struct TestSuite {
    /// Identity and configuration of the suite itself
    meta: TestMeta,
    /// Tests without an order rank, in insertion order
    unordered: IndexMap<TestId, TestHandle>,
    /// Tests with an order rank, keyed by the rank recorded at registration
    ordered: BinaryHeap<TestHandle>,
}

impl TestSuite {
    /// Create an empty, enabled, stop-on-failure suite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: TestMeta::for_suite(name),
            unordered: IndexMap::new(),
            ordered: BinaryHeap::new(),
        }
    }

    /// Give the suite an explicit order rank inside its parent.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.meta.set_order(Some(order));
        self
    }

    /// Set the stop-on-failure flag.
    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.meta.set_stop_on_failure(stop);
        self
    }

    /// Start out disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.meta.set_enabled(false);
        self
    }

    /// Register a test by handle.
    ///
    /// Partition and rank are taken from the test now; changing the rank
    /// later does not move it.
    pub fn add(&mut self, mut handle: TestHandle) -> Result<(), SuiteError> {
        let id = handle.id();
        if id == self.meta.id() {
            return Err(SuiteError::SelfReference(id));
        }
        if self.contains(id) {
            return Err(SuiteError::Duplicate(id));
        }
        let order = handle.refresh_rank().ok_or(SuiteError::Busy(id))?;

        tracing::trace!(suite = %self.meta.name(), test = %id, ?order, "registered test");
        match order {
            Some(_) => self.ordered.push(handle),
            None => {
                self.unordered.insert(id, handle);
            }
        }
        Ok(())
    }

    /// Move `test` behind a handle, register it, and return the handle.
    pub fn add_test<T: Test + 'static>(&mut self, test: T) -> Result<TestHandle, SuiteError> {
        let handle = TestHandle::new(test);
        self.add(handle.clone())?;
        Ok(handle)
    }

    /// True if a test with `id` is registered.
    pub fn contains(&self, id: TestId) -> bool {
        self.unordered.contains_key(&id) || self.ordered.iter().any(|h| h.id() == id)
    }

    /// Number of registered tests.
    pub fn count(&self) -> usize {
        self.unordered.len() + self.ordered.len()
    }

    /// True if no test is registered.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn ordered_schedule(&self) -> Vec<TestHandle> {
        let mut heap = self.ordered.clone();
        std::iter::from_fn(|| heap.pop()).collect()
    }

    fn unordered_schedule(&self) -> Vec<TestHandle> {
        self.unordered.values().cloned().collect()
    }

    /// Identifiers in the order a run visits them.
    pub fn case_ids(&self) -> Vec<TestId> {
        self.unordered_schedule()
            .iter()
            .chain(self.ordered_schedule().iter())
            .map(TestHandle::id)
            .collect()
    }

    /// Run the suite as the top-level suite and return whether it passed.
    pub fn run_with(&mut self, reporter: &mut Reporter) -> bool {
        self.execute(reporter)
    }

    fn execute(&mut self, reporter: &mut Reporter) -> bool {
        let span = tracing::debug_span!("suite", name = %self.meta.name(), id = %self.meta.id());
        let _enter = span.enter();

        let stop = self.meta.stop_on_failure();
        let mut remaining = self.count();
        let mut watch = StopWatch::start();
        tracing::debug!(tests = remaining, stop_on_failure = stop, "running suite");

        let first = run_partition(
            &self.unordered_schedule(),
            stop,
            &mut remaining,
            &mut watch,
            reporter,
        );
        let mut passed = first.passed;
        if first.aborted {
            tracing::debug!("unordered partition aborted, skipping ordered partition");
        } else {
            let second = run_partition(
                &self.ordered_schedule(),
                stop,
                &mut remaining,
                &mut watch,
                reporter,
            );
            passed &= second.passed;
        }

        watch.stop();
        if passed {
            reporter.suite_ok(self.meta.name(), watch.elapsed());
        }
        tracing::debug!(passed, "suite finished");
        passed
    }
}

fn run_partition(
    schedule: &[TestHandle],
    stop: bool,
    remaining: &mut usize,
    watch: &mut StopWatch,
    reporter: &mut Reporter,
) -> PartitionRun {
    let mut passed = true;
    for handle in schedule {
        *remaining -= 1;
        let index = *remaining;
        let ok = run_one(handle, index, stop, watch, reporter);
        passed &= ok;
        if !ok && stop {
            tracing::debug!(test = %handle.id(), "stopping after failure");
            return PartitionRun {
                passed,
                aborted: true,
            };
        }
    }
    PartitionRun {
        passed,
        aborted: false,
    }
}

fn run_one(
    handle: &TestHandle,
    index: usize,
    stop: bool,
    watch: &mut StopWatch,
    reporter: &mut Reporter,
) -> bool {
    let Some(mut test) = handle.try_lock() else {
        tracing::warn!(test = %handle.id(), "test is already running");
        reporter.case_busy(index, handle.id());
        return false;
    };

    if !test.is_enabled() {
        reporter.case_disabled(index, test.name());
        return true;
    }

    test.set_stop_on_failure(stop);
    let meta = test.meta().clone();
    tracing::trace!(test = %meta.name(), index, "running test");

    watch.mark();
    let outcome = {
        let mut checker = Checker::new(reporter, &meta);
        test.run(&mut checker)
    };
    let elapsed = watch.elapsed_since_mark();

    match outcome {
        Ok(passed) => {
            reporter.case_finished(index, test.name(), elapsed, passed);
            passed
        }
        Err(failure) => {
            reporter.failure(&failure);
            false
        }
    }
}

impl Test for TestSuite {
    fn meta(&self) -> &TestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TestMeta {
        &mut self.meta
    }

    fn run(&mut self, checker: &mut Checker<'_>) -> Outcome {
        let reporter = checker.reporter();
        reporter.indent();
        let passed = self.execute(reporter);
        reporter.dedent();
        Ok(passed)
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("meta", &self.meta)
            .field("unordered", &self.unordered.len())
            .field("ordered", &self.ordered.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::here;
    use crate::report::tests::TestBuffer;
    use crate::test_case::TestCase;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn traced(trace: &Trace, name: &str, pass: bool) -> TestCase {
        let trace = trace.clone();
        let label = name.to_string();
        TestCase::new(name, move |c| {
            trace.lock().push(label.clone());
            c.check(pass, "expected pass", here!())?;
            Ok(true)
        })
    }

    fn quiet() -> (Reporter, TestBuffer) {
        let buffer = TestBuffer::new();
        (Reporter::new().with_output(buffer.clone()), buffer)
    }

    #[test]
    fn empty_suite_passes() {
        let (mut reporter, buffer) = quiet();
        let mut suite = TestSuite::new("empty");
        assert!(suite.is_empty());
        assert!(suite.run_with(&mut reporter));
        assert!(buffer.contents().starts_with("ok "));
    }

    #[test]
    fn ordered_tests_run_by_descending_rank() {
        let trace = Trace::default();
        let mut suite = TestSuite::new("ranks");
        suite.add_test(traced(&trace, "five", true).with_order(5)).unwrap();
        suite.add_test(traced(&trace, "one", true).with_order(1)).unwrap();
        suite.add_test(traced(&trace, "three", true).with_order(3)).unwrap();

        let (mut reporter, _) = quiet();
        assert!(suite.run_with(&mut reporter));
        assert_eq!(*trace.lock(), vec!["five", "three", "one"]);
    }

    #[test]
    fn equal_ranks_run_in_creation_order() {
        let trace = Trace::default();
        let first = traced(&trace, "first", true).with_order(2);
        let second = traced(&trace, "second", true).with_order(2);
        let mut suite = TestSuite::new("ties");
        suite.add_test(second).unwrap();
        suite.add_test(first).unwrap();

        let (mut reporter, _) = quiet();
        suite.run_with(&mut reporter);
        assert_eq!(*trace.lock(), vec!["first", "second"]);
    }

    #[test]
    fn unordered_partition_runs_first_in_insertion_order() {
        let trace = Trace::default();
        let mut suite = TestSuite::new("mixed");
        suite.add_test(traced(&trace, "ranked", true).with_order(9)).unwrap();
        suite.add_test(traced(&trace, "loose_b", true)).unwrap();
        suite.add_test(traced(&trace, "loose_a", true)).unwrap();

        let (mut reporter, _) = quiet();
        assert!(suite.run_with(&mut reporter));
        assert_eq!(*trace.lock(), vec!["loose_b", "loose_a", "ranked"]);
        assert_eq!(suite.case_ids().len(), 3);
    }

    #[test]
    fn scheduling_does_not_wait_for_running_tests() {
        let trace = Trace::default();
        let mut suite = TestSuite::new("suite");
        let low = suite.add_test(traced(&trace, "low", true).with_order(1)).unwrap();
        let mid = suite.add_test(traced(&trace, "mid", true).with_order(4)).unwrap();
        let high = suite.add_test(traced(&trace, "high", true).with_order(8)).unwrap();

        let _running = mid.lock();
        assert_eq!(suite.case_ids(), vec![high.id(), mid.id(), low.id()]);
    }

    #[test]
    fn rank_changes_after_registration_do_not_reorder() {
        let trace = Trace::default();
        let mut suite = TestSuite::new("suite");
        let first = suite.add_test(traced(&trace, "first", true).with_order(2)).unwrap();
        let second = suite.add_test(traced(&trace, "second", true).with_order(5)).unwrap();
        first.lock().meta_mut().set_order(Some(10));

        assert_eq!(suite.case_ids(), vec![second.id(), first.id()]);
    }

    #[test]
    fn rejects_self_duplicate_and_busy() {
        let mut suite = TestSuite::new("guarded");
        let handle = suite.add_test(TestCase::new("once", |_| Ok(true))).unwrap();
        assert_eq!(suite.add(handle.clone()), Err(SuiteError::Duplicate(handle.id())));

        let locked = TestCase::new("locked", |_| Ok(true)).into_handle();
        let guard = locked.lock();
        assert_eq!(suite.add(locked.clone()), Err(SuiteError::Busy(locked.id())));
        drop(guard);
        assert!(suite.add(locked).is_ok());
        assert_eq!(suite.count(), 2);
    }

    #[test]
    fn suite_cannot_contain_itself() {
        let mut suite = TestSuite::new("loop");
        let id = suite.meta().id();
        let shared = Arc::new(Mutex::new(TestSuite::new("shared")));
        let handle = TestHandle::shared(&shared);
        assert_ne!(handle.id(), id);
        let err = shared.lock().add(handle.clone()).unwrap_err();
        assert_eq!(err, SuiteError::SelfReference(handle.id()));
        assert!(suite.add(handle).is_ok());
    }

    #[test]
    fn escalated_failure_is_absorbed_and_printed() {
        let mut suite = TestSuite::new("absorb");
        suite
            .add_test(TestCase::new("bad", |c| {
                c.check_equal(&1, &2, "one is two", here!())?;
                Ok(true)
            }))
            .unwrap();

        let (mut reporter, buffer) = quiet();
        assert!(!suite.run_with(&mut reporter));
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("actual [1] != [2] expected\tone is two"));
        assert!(lines[1].contains("test_name = bad\terror = one is two"));
    }

    #[test]
    fn stop_flag_is_propagated_late() {
        let mut suite = TestSuite::new("late");
        let handle = suite
            .add_test(TestCase::new("soft", |c| {
                c.check(false, "soft failure", here!())?;
                Ok(c.passed())
            }))
            .unwrap();
        assert!(handle.lock().stop_on_failure());

        suite.set_stop_on_failure(false);
        let (mut reporter, buffer) = quiet();
        assert!(!suite.run_with(&mut reporter));
        assert!(!handle.lock().stop_on_failure());
        // Recorded, not escalated: a case line follows the diagnostic.
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("0000 soft"));
    }

    #[test]
    fn nested_suite_is_indented() {
        let mut inner = TestSuite::new("inner");
        inner.add_test(TestCase::new("leaf", |_| Ok(true))).unwrap();
        let mut outer = TestSuite::new("outer");
        outer.add_test(inner).unwrap();

        let (mut reporter, buffer) = quiet();
        assert!(outer.run_with(&mut reporter));
        let lines = buffer.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  0000 leaf"));
        assert!(lines[1].starts_with("  ok "));
        assert!(lines[2].starts_with("0000 inner"));
        assert!(lines[3].starts_with("ok "));
    }
}
