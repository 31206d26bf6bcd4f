//! Registration of tests before execution.
//!
//! [`Registry`] collects test factories and builds a suite in one step, so
//! nothing depends on the order in which statics happen to be initialised.
//! [`all_tests`] is the process-wide default suite for callers that want a
//! single shared registration target.

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use crate::checker::Checker;
use crate::failure::{Outcome, SuiteError};
use crate::suite::TestSuite;
use crate::test_case::{Test, TestCase, TestHandle};

/// Name of the default global suite.
pub const ALL_TESTS: &str = "All tests";

static GLOBAL_SUITE: Lazy<Mutex<TestSuite>> = Lazy::new(|| Mutex::new(TestSuite::new(ALL_TESTS)));

/// Lock the default global suite, creating it on first access.
///
/// The suite lives until the process exits.
pub fn all_tests() -> MutexGuard<'static, TestSuite> {
    GLOBAL_SUITE.lock()
}

type Factory = Box<dyn FnOnce() -> TestHandle + Send>;

/// Collects test factories and turns them into a suite.
#[derive(Default)]
pub struct Registry {
    factories: Vec<Factory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure-backed test.
    pub fn register<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnMut(&mut Checker<'_>) -> Outcome + Send + 'static,
    {
        let name = name.into();
        self.factories
            .push(Box::new(move || TestCase::new(name, body).into_handle()));
        self
    }

    /// Register a factory producing any [`Test`].
    pub fn register_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Test + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.factories
            .push(Box::new(move || TestHandle::new(factory())));
        self
    }

    /// Register an existing handle.
    pub fn register_handle(&mut self, handle: TestHandle) -> &mut Self {
        self.factories.push(Box::new(move || handle));
        self
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate every test into `suite`, in registration order.
    pub fn install(self, suite: &mut TestSuite) -> Result<Vec<TestHandle>, SuiteError> {
        let mut handles = Vec::with_capacity(self.factories.len());
        for factory in self.factories {
            let handle = factory();
            suite.add(handle.clone())?;
            handles.push(handle);
        }
        tracing::debug!(suite = %suite.name(), tests = handles.len(), "installed registry");
        Ok(handles)
    }

    /// Instantiate every test into a new suite named `name`.
    pub fn build(self, name: impl Into<String>) -> Result<TestSuite, SuiteError> {
        let mut suite = TestSuite::new(name);
        self.install(&mut suite)?;
        Ok(suite)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("factories", &self.factories.len())
            .finish()
    }
}
