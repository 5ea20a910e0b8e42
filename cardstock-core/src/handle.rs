//! Shared dispatchable state with change notification
//!
//! [`StateHandle`] wraps a [`Store`](crate::Store) so that concurrent
//! reactions can read it, dispatch to it, and await conditions over it.
//! Every state-changing dispatch bumps a `watch`-channel version counter;
//! [`StateHandle::wait_for`] re-checks its predicate on each bump, which is
//! how a reaction blocks until some other reaction has landed its results.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock, RwLockReadGuard};

use crate::action::Action;
use crate::store::{Middleware, NoopMiddleware, Reducer, Store};

/// Error returned when a condition-wait expires before its predicate holds.
#[derive(Debug, Error)]
#[error("condition-wait timed out after {0:?}")]
pub struct WaitTimeout(pub Duration);

/// Cloneable handle to a shared store.
///
/// Dispatches are serialized; readers see a consistent snapshot. Cross-store
/// consistency is eventual and owed to listeners, not to the handle itself.
pub struct StateHandle<S, A: Action> {
    inner: Arc<Inner<S, A>>,
}

struct Inner<S, A: Action> {
    store: RwLock<Store<S, A>>,
    middleware: Mutex<Box<dyn Middleware<A> + Send>>,
    version: watch::Sender<u64>,
}

impl<S, A: Action> Clone for StateHandle<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> StateHandle<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a handle with no middleware.
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self::with_middleware(state, reducer, NoopMiddleware)
    }

    /// Create a handle with middleware hooks around the reducer.
    pub fn with_middleware<M>(state: S, reducer: Reducer<S, A>, middleware: M) -> Self
    where
        M: Middleware<A> + Send + 'static,
    {
        let (version, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(Store::new(state, reducer)),
                middleware: Mutex::new(Box::new(middleware)),
                version,
            }),
        }
    }

    /// Dispatch an action through middleware and the reducer.
    ///
    /// Holding the middleware lock for the whole exchange serializes
    /// dispatches, so readers never observe a half-applied transition.
    /// Returns the reducer's change indicator; when `true`, waiters are
    /// woken.
    pub async fn dispatch(&self, action: A) -> bool {
        let mut middleware = self.inner.middleware.lock().await;
        middleware.before(&action);
        let changed = {
            let mut store = self.inner.store.write().await;
            store.dispatch(action.clone())
        };
        middleware.after(&action, changed);
        drop(middleware);

        if changed {
            self.inner.version.send_modify(|v| *v = v.wrapping_add(1));
        }
        changed
    }

    /// Read guard over the current state.
    pub async fn read(&self) -> RwLockReadGuard<'_, S> {
        RwLockReadGuard::map(self.inner.store.read().await, Store::state)
    }

    /// Run `f` against a consistent snapshot of the state.
    pub async fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(self.inner.store.read().await.state())
    }

    /// The number of state-changing dispatches so far.
    pub fn version(&self) -> u64 {
        *self.inner.version.borrow()
    }

    /// Await until `predicate` holds over the current state.
    ///
    /// The predicate is checked immediately and then after every
    /// state-changing dispatch. Errors with [`WaitTimeout`] when `timeout`
    /// elapses first; callers must re-read state afterwards rather than
    /// reuse anything captured before the wait.
    pub async fn wait_for<F>(&self, mut predicate: F, timeout: Duration) -> Result<(), WaitTimeout>
    where
        F: FnMut(&S) -> bool,
    {
        let mut versions = self.inner.version.subscribe();
        let satisfied = async {
            loop {
                if predicate(self.inner.store.read().await.state()) {
                    return;
                }
                if versions.changed().await.is_err() {
                    // The sender lives in `self.inner`, so this is
                    // unreachable; park until the timeout fires regardless.
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::time::timeout(timeout, satisfied)
            .await
            .map_err(|_| WaitTimeout(timeout))
    }
}
