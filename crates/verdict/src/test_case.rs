//! Test - The unit of work scheduled by suites
//!
//! Defines the interface every test implements, the configuration each test
//! owns, a closure-backed [`TestCase`], and the shared [`TestHandle`] suites
//! hold on to.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::checker::Checker;
use crate::failure::{Location, Outcome};
use crate::id::{IdKind, TestId, next_id};

/// Order rank of a test that is not explicitly ordered.
pub const UNORDERED: Option<i32> = None;

/// Identity and configuration owned by every test.
///
/// `enabled` and `stop_on_failure` are independent switches, fixed for the
/// duration of a run and mutable between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMeta {
    id: TestId,
    name: String,
    order: Option<i32>,
    enabled: bool,
    stop_on_failure: bool,
}

impl TestMeta {
    /// Metadata for a new test case with a fresh case identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(IdKind::Case, name)
    }

    /// Metadata for a new suite with a fresh suite identifier.
    pub fn for_suite(name: impl Into<String>) -> Self {
        Self::with_kind(IdKind::Suite, name)
    }

    fn with_kind(kind: IdKind, name: impl Into<String>) -> Self {
        Self {
            id: next_id(kind),
            name: name.into(),
            order: UNORDERED,
            enabled: true,
            stop_on_failure: true,
        }
    }

    /// Give the test an explicit order rank.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the stop-on-failure flag.
    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Start out disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Identifier assigned at creation; never changes.
    pub fn id(&self) -> TestId {
        self.id
    }

    /// Display name used in report lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the test.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Order rank, or [`UNORDERED`].
    pub fn order(&self) -> Option<i32> {
        self.order
    }

    /// Change the order rank.
    ///
    /// Suites read the rank when the test is added, so this only affects
    /// suites the test joins afterwards.
    pub fn set_order(&mut self, order: Option<i32>) {
        self.order = order;
    }

    /// False if runs skip this test.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// True if the first failed check ends the test.
    pub fn stop_on_failure(&self) -> bool {
        self.stop_on_failure
    }

    /// Set the stop-on-failure flag. A parent suite overwrites it before
    /// each run.
    pub fn set_stop_on_failure(&mut self, stop: bool) {
        self.stop_on_failure = stop;
    }
}

/// Trait for everything a suite can schedule
///
/// Implementors own a [`TestMeta`] and provide `run`. Suites implement this
/// trait too, which is what makes nesting work.
///
/// # Example
///
/// ```rust
/// use verdict::prelude::*;
/// use verdict::TestMeta;
///
/// struct Parity {
///     meta: TestMeta,
///     input: u32,
/// }
///
/// impl Test for Parity {
///     fn meta(&self) -> &TestMeta { &self.meta }
///     fn meta_mut(&mut self) -> &mut TestMeta { &mut self.meta }
///     fn run(&mut self, c: &mut Checker<'_>) -> Outcome {
///         check!(c, self.input % 2 == 0, "input is even")?;
///         Ok(true)
///     }
/// }
///
/// let mut suite = TestSuite::new("parity");
/// suite.add_test(Parity { meta: TestMeta::new("four"), input: 4 }).unwrap();
/// assert!(suite.run_with(&mut Reporter::new().with_output(std::io::sink())));
/// ```
pub trait Test: Send {
    /// Identity and configuration of this test.
    fn meta(&self) -> &TestMeta;

    /// Mutable access to identity and configuration.
    fn meta_mut(&mut self) -> &mut TestMeta;

    /// Execute the test.
    ///
    /// Returning `Ok(true)` means passed. Failed checks that did not
    /// escalate do not change that unless the body chooses to return
    /// `Ok(false)` (e.g. via [`Checker::passed`]).
    fn run(&mut self, checker: &mut Checker<'_>) -> Outcome;

    /// Identifier of this test.
    fn id(&self) -> TestId {
        self.meta().id()
    }

    /// Display name of this test.
    fn name(&self) -> &str {
        self.meta().name()
    }

    /// Rename this test.
    fn set_name(&mut self, name: &str) {
        self.meta_mut().set_name(name);
    }

    /// Order rank, `None` when unordered.
    fn order(&self) -> Option<i32> {
        self.meta().order()
    }

    /// True if the test has an explicit order rank.
    fn is_ordered(&self) -> bool {
        self.meta().order().is_some()
    }

    /// True unless disabled.
    fn is_enabled(&self) -> bool {
        self.meta().is_enabled()
    }

    /// Include this test in future runs.
    fn enable(&mut self) {
        self.meta_mut().set_enabled(true);
    }

    /// Skip this test in future runs; a disabled test counts as passed.
    fn disable(&mut self) {
        self.meta_mut().set_enabled(false);
    }

    /// Current stop-on-failure flag.
    fn stop_on_failure(&self) -> bool {
        self.meta().stop_on_failure()
    }

    /// Set the stop-on-failure flag.
    ///
    /// Suites forward their own flag to each test right before running it,
    /// so setting it on a nested test only lasts until its parent runs.
    fn set_stop_on_failure(&mut self, stop: bool) {
        self.meta_mut().set_stop_on_failure(stop);
    }
}

type Body = Box<dyn FnMut(&mut Checker<'_>) -> Outcome + Send>;

/// A test whose body is a closure.
pub struct TestCase {
    meta: TestMeta,
    body: Body,
}

impl TestCase {
    /// Create an unordered, enabled, stop-on-failure test.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnMut(&mut Checker<'_>) -> Outcome + Send + 'static,
    {
        Self {
            meta: TestMeta::new(name),
            body: Box::new(body),
        }
    }

    /// Give the test an explicit order rank.
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

    /// Wrap into a shared handle.
    pub fn into_handle(self) -> TestHandle {
        TestHandle::new(self)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl Test for TestCase {
    fn meta(&self) -> &TestMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut TestMeta {
        &mut self.meta
    }

    fn run(&mut self, checker: &mut Checker<'_>) -> Outcome {
        (self.body)(checker)
    }
}

/// A test that passes iff `predicate` holds.
///
/// The check is attributed to the caller of this function.
#[track_caller]
pub fn predicate<P>(name: impl Into<String>, predicate: P, message: impl Into<String>) -> TestCase
where
    P: Fn() -> bool + Send + 'static,
{
    let location = Location::caller();
    let message = message.into();
    TestCase::new(name, move |c| {
        c.check(predicate(), &message, location)?;
        Ok(true)
    })
}

/// Shared, non-owning reference to a test.
///
/// Suites store handles, never the tests themselves; the creator can keep a
/// clone and still reconfigure the test between runs. Equality is identity.
///
/// A handle carries the order rank the test had when the handle was created
/// or registered. Ordering uses that rank, so comparing handles never locks
/// a test: higher rank sorts greater, unordered sorts below every rank, and
/// equal ranks put the lower identifier first (greater).
#[derive(Clone)]
pub struct TestHandle {
    id: TestId,
    rank: Option<i32>,
    inner: Arc<Mutex<dyn Test>>,
}

impl TestHandle {
    /// Move `test` behind a new handle.
    pub fn new<T: Test + 'static>(test: T) -> Self {
        let id = test.id();
        let rank = test.order();
        Self {
            id,
            rank,
            inner: Arc::new(Mutex::new(test)),
        }
    }

    /// Reference a test whose typed storage stays with the caller.
    pub fn shared<T: Test + 'static>(test: &Arc<Mutex<T>>) -> Self {
        let (id, rank) = {
            let guard = test.lock();
            (guard.id(), guard.order())
        };
        let inner: Arc<Mutex<dyn Test>> = test.clone();
        Self { id, rank, inner }
    }

    /// Identifier of the referenced test.
    pub fn id(&self) -> TestId {
        self.id
    }

    /// Order rank recorded on this handle.
    pub fn rank(&self) -> Option<i32> {
        self.rank
    }

    /// Re-read the rank from the test, unless the test is locked.
    ///
    /// Returns `None` without touching the recorded rank when the test is
    /// running or otherwise locked.
    pub fn refresh_rank(&mut self) -> Option<Option<i32>> {
        let rank = self.inner.try_lock()?.order();
        self.rank = rank;
        Some(rank)
    }

    /// Lock the test for exclusive access.
    pub fn lock(&self) -> MutexGuard<'_, dyn Test> {
        self.inner.lock()
    }

    /// Lock the test unless it is already locked (e.g. running).
    pub fn try_lock(&self) -> Option<MutexGuard<'_, dyn Test>> {
        self.inner.try_lock()
    }
}

impl PartialEq for TestHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TestHandle {}

impl PartialOrd for TestHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TestHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            return Ordering::Equal;
        }
        self.rank
            .cmp(&other.rank)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl fmt::Debug for TestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHandle").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Reporter;

    fn run(test: &mut dyn Test) -> Outcome {
        let mut reporter = Reporter::new().with_output(std::io::sink());
        let meta = test.meta().clone();
        let mut checker = Checker::new(&mut reporter, &meta);
        test.run(&mut checker)
    }

    #[test]
    fn defaults() {
        let case = TestCase::new("plain", |_| Ok(true));
        assert_eq!(case.name(), "plain");
        assert_eq!(case.order(), UNORDERED);
        assert!(!case.is_ordered());
        assert!(case.is_enabled());
        assert!(case.stop_on_failure());
        assert_eq!(case.id().kind(), IdKind::Case);
    }

    #[test]
    fn accessors_mutate_configuration() {
        let mut case = TestCase::new("plain", |_| Ok(true)).with_order(3);
        assert!(case.is_ordered());
        case.disable();
        assert!(!case.is_enabled());
        case.enable();
        assert!(case.is_enabled());
        case.set_stop_on_failure(false);
        assert!(!case.stop_on_failure());
        case.set_name("renamed");
        assert_eq!(case.name(), "renamed");
    }

    #[test]
    fn ids_are_unique() {
        let a = TestCase::new("a", |_| Ok(true));
        let b = TestCase::new("a", |_| Ok(true));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn predicate_passes_and_fails() {
        let mut yes = predicate("yes", || 2 > 1, "two beats one");
        assert_eq!(run(&mut yes), Ok(true));

        let mut no = predicate("no", || 1 > 2, "one beats two");
        let failure = run(&mut no).unwrap_err();
        assert_eq!(failure.message(), "one beats two");
        assert!(failure.file().ends_with("test_case.rs"));
    }

    #[test]
    fn handles_compare_by_identity_and_rank() {
        let low = TestCase::new("low", |_| Ok(true)).with_order(1).into_handle();
        let high = TestCase::new("high", |_| Ok(true)).with_order(5).into_handle();
        let loose = TestCase::new("loose", |_| Ok(true)).into_handle();
        assert_eq!(low, low.clone());
        assert_ne!(low, high);
        assert!(high > low);
        assert!(loose < low);
        assert_eq!(low.cmp(&low.clone()), Ordering::Equal);
    }

    #[test]
    fn equal_ranks_favor_lower_id() {
        let first = TestCase::new("first", |_| Ok(true)).with_order(2).into_handle();
        let second = TestCase::new("second", |_| Ok(true)).with_order(2).into_handle();
        assert!(first > second);
    }

    #[test]
    fn comparing_against_a_locked_test_does_not_block() {
        let mine = TestCase::new("mine", |_| Ok(true)).with_order(3).into_handle();
        let mut other = TestCase::new("other", |_| Ok(true)).with_order(7).into_handle();

        let guard = mine.lock();
        let (tx, rx) = std::sync::mpsc::channel();
        let (a, b) = (other.clone(), mine.clone());
        std::thread::spawn(move || {
            let _ = tx.send(a.cmp(&b));
        });
        let ordering = rx.recv_timeout(std::time::Duration::from_secs(2));
        assert_eq!(ordering, Ok(Ordering::Greater));

        let mut locked = mine.clone();
        assert_eq!(locked.refresh_rank(), None);
        drop(guard);
        assert_eq!(locked.refresh_rank(), Some(Some(3)));

        other.lock().meta_mut().set_order(None);
        assert_eq!(other.rank(), Some(7));
        assert_eq!(other.refresh_rank(), Some(None));
        assert!(other < mine);
    }

    #[test]
    fn shared_handle_sees_external_changes() {
        let external = Arc::new(Mutex::new(TestCase::new("ext", |_| Ok(true))));
        let handle = TestHandle::shared(&external);
        external.lock().disable();
        assert!(!handle.lock().is_enabled());
        assert!(handle.try_lock().is_some());
    }
}
