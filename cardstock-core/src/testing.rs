//! Test support for dispatch-loop assertions

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::action::Action;
use crate::handle::StateHandle;
use crate::store::Middleware;

/// Middleware that records the name of every dispatched action.
///
/// Clone it before handing it to a runtime; the clone shares the record and
/// can be queried from the test body.
#[derive(Clone, Default)]
pub struct RecordingMiddleware {
    names: Arc<Mutex<Vec<String>>>,
}

impl RecordingMiddleware {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all dispatched actions, in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.names.lock().expect("recorder lock").clone()
    }

    /// How many dispatched actions carried the given name.
    pub fn count(&self, name: &str) -> usize {
        self.names
            .lock()
            .expect("recorder lock")
            .iter()
            .filter(|n| n.as_str() == name)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.names.lock().expect("recorder lock").clear();
    }
}

impl<A: Action> Middleware<A> for RecordingMiddleware {
    fn before(&mut self, _action: &A) {}

    fn after(&mut self, action: &A, _state_changed: bool) {
        self.names
            .lock()
            .expect("recorder lock")
            .push(action.name().to_string());
    }
}

/// Await a state predicate, panicking if it does not hold within `timeout`.
///
/// The asynchronous assertion used by integration tests: dispatch, then
/// `eventually(...)` the invariant the reactions are expected to restore.
pub async fn eventually<S, A, F>(handle: &StateHandle<S, A>, timeout: Duration, predicate: F)
where
    S: Send + Sync + 'static,
    A: Action,
    F: FnMut(&S) -> bool,
{
    if handle.wait_for(predicate, timeout).await.is_err() {
        panic!("state predicate not reached within {timeout:?}");
    }
}
