//! Centralized state store with reducer pattern

use crate::Action;

/// A reducer function that handles actions and mutates state.
///
/// Returns `true` if the state changed. The change indicator gates
/// change-notification and listener predicates downstream, so reducers
/// should return `false` for no-op transitions.
pub type Reducer<S, A> = fn(&mut S, A) -> bool;

/// Centralized state container with a Redux-like reducer.
///
/// The store holds one state value and funnels every mutation through
/// `dispatch`. Concurrent access is layered on top by
/// [`StateHandle`](crate::StateHandle); the store itself is single-owner.
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct Ledger {
///     entries: Vec<String>,
/// }
///
/// fn reducer(state: &mut Ledger, action: LedgerAction) -> bool {
///     match action {
///         LedgerAction::Record(entry) => {
///             state.entries.push(entry);
///             true
///         }
///         LedgerAction::Noop => false,
///     }
/// }
///
/// let mut store = Store::new(Ledger::default(), reducer);
/// store.dispatch(LedgerAction::Record("hello".into()));
/// ```
pub struct Store<S, A: Action> {
    state: S,
    reducer: Reducer<S, A>,
}

impl<S, A: Action> Store<S, A> {
    /// Create a new store with initial state and reducer
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self { state, reducer }
    }

    /// Dispatch an action to the store
    ///
    /// Returns `true` if the reducer reports a state change.
    pub fn dispatch(&mut self, action: A) -> bool {
        (self.reducer)(&mut self.state, action)
    }

    /// Get a reference to the current state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Get a mutable reference to the state
    ///
    /// Use this sparingly - prefer dispatching actions for state changes.
    /// Mutations made this way bypass middleware and change notification.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging, persistence, or other
/// cross-cutting concerns around the reducer.
pub trait Middleware<A: Action> {
    /// Called before the action reaches the reducer
    fn before(&mut self, action: &A);

    /// Called after the reducer ran, with its change indicator
    fn after(&mut self, action: &A, state_changed: bool);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn before(&mut self, _action: &A) {}
    fn after(&mut self, _action: &A, _state_changed: bool) {}
}

/// Middleware that logs actions through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log before dispatch
    pub log_before: bool,
    /// Whether to log after dispatch
    pub log_after: bool,
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
        }
    }

    /// Create a logging middleware that logs both before and after
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            log_after: true,
        }
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before {
            tracing::debug!(action = %action.name(), "Dispatching action");
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        if self.log_after {
            tracing::debug!(
                action = %action.name(),
                state_changed = state_changed,
                "Action processed"
            );
        }
    }
}

/// Compose multiple middleware into a single middleware
pub struct ComposedMiddleware<A: Action> {
    middlewares: Vec<Box<dyn Middleware<A> + Send>>,
}

impl<A: Action> std::fmt::Debug for ComposedMiddleware<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middlewares_count", &self.middlewares.len())
            .finish()
    }
}

impl<A: Action> Default for ComposedMiddleware<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> ComposedMiddleware<A> {
    /// Create a new composed middleware
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add a middleware to the composition
    pub fn add<M: Middleware<A> + Send + 'static>(&mut self, middleware: M) {
        self.middlewares.push(Box::new(middleware));
    }
}

impl<A: Action> Middleware<A> for ComposedMiddleware<A> {
    fn before(&mut self, action: &A) {
        for middleware in &mut self.middlewares {
            middleware.before(action);
        }
    }

    fn after(&mut self, action: &A, state_changed: bool) {
        // Call in reverse order for proper nesting
        for middleware in self.middlewares.iter_mut().rev() {
            middleware.after(action, state_changed);
        }
    }
}
