//! Listener registry: named reactive rules over store transitions
//!
//! A listener pairs a change predicate with an async reaction. Predicates
//! run synchronously on the dispatch loop against the post-transition
//! state; matching reactions are spawned as independent tasks. A reaction
//! may dispatch further actions (which re-enter the loop and can cascade
//! into other rules) and may block on a condition over future state via
//! [`ListenerCtx::wait_for`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::action::Action;
use crate::handle::{StateHandle, WaitTimeout};

/// Sender half of the dispatch loop's action channel.
pub struct Dispatcher<A> {
    tx: mpsc::UnboundedSender<A>,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Action> Dispatcher<A> {
    /// Wrap a raw action sender.
    pub fn new(tx: mpsc::UnboundedSender<A>) -> Self {
        Self { tx }
    }

    /// Enqueue an action on the dispatch loop.
    ///
    /// Actions enqueued after the runtime has shut down are dropped.
    pub fn dispatch(&self, action: A) {
        if let Err(err) = self.tx.send(action) {
            tracing::debug!(action = %err.0.name(), "dispatch after shutdown, action dropped");
        }
    }
}

/// Context handed to each listener invocation.
pub struct ListenerCtx<S, A: Action> {
    handle: StateHandle<S, A>,
    dispatcher: Dispatcher<A>,
}

impl<S, A: Action> Clone for ListenerCtx<S, A> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S, A> ListenerCtx<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(handle: StateHandle<S, A>, dispatcher: Dispatcher<A>) -> Self {
        Self { handle, dispatcher }
    }

    /// The shared state handle.
    pub fn handle(&self) -> &StateHandle<S, A> {
        &self.handle
    }

    /// The dispatcher feeding the loop that spawned this listener.
    pub fn dispatcher(&self) -> &Dispatcher<A> {
        &self.dispatcher
    }

    /// Enqueue a follow-up action.
    pub fn dispatch(&self, action: A) {
        self.dispatcher.dispatch(action);
    }

    /// Run `f` against the current state.
    ///
    /// Reactions must call this again after any await instead of reusing an
    /// earlier snapshot; the state may have moved on while they slept.
    pub async fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.handle.with(f).await
    }

    /// Block this reaction until `predicate` holds, or time out.
    pub async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> Result<(), WaitTimeout>
    where
        F: FnMut(&S) -> bool,
    {
        self.handle.wait_for(predicate, timeout).await
    }
}

type BoxHandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type Predicate<S, A> = Box<dyn Fn(&A, bool, &S) -> bool + Send + Sync>;
type Handler<S, A> = Arc<dyn Fn(A, ListenerCtx<S, A>) -> BoxHandlerFuture + Send + Sync>;

/// One reactive rule: a named change predicate plus an async reaction.
pub struct Listener<S, A: Action> {
    name: &'static str,
    predicate: Predicate<S, A>,
    handler: Handler<S, A>,
}

impl<S, A: Action> Listener<S, A> {
    /// The rule name, used for logging.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn matches(&self, action: &A, state_changed: bool, state: &S) -> bool {
        (self.predicate)(action, state_changed, state)
    }

    pub(crate) fn invoke(&self, action: A, ctx: ListenerCtx<S, A>) -> BoxHandlerFuture {
        (self.handler)(action, ctx)
    }
}

/// Registry of reactive rules evaluated after every dispatch.
pub struct ListenerRegistry<S, A: Action> {
    listeners: Vec<Listener<S, A>>,
}

impl<S, A: Action> Default for ListenerRegistry<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A: Action> ListenerRegistry<S, A> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a rule.
    ///
    /// `predicate` receives the dispatched action, the reducer's change
    /// indicator, and the post-transition state. `handler` is spawned as an
    /// independent task whenever the predicate matches; a panicking or
    /// failing handler never affects sibling rules.
    pub fn on<P, H, Fut>(&mut self, name: &'static str, predicate: P, handler: H) -> &mut Self
    where
        P: Fn(&A, bool, &S) -> bool + Send + Sync + 'static,
        H: Fn(A, ListenerCtx<S, A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.listeners.push(Listener {
            name,
            predicate: Box::new(predicate),
            handler: Arc::new(move |action, ctx| Box::pin(handler(action, ctx))),
        });
        self
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Listener<S, A>> {
        self.listeners.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    enum TestAction {
        Ping,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            "Ping"
        }
    }

    #[test]
    fn test_registry_registration() {
        let mut registry: ListenerRegistry<(), TestAction> = ListenerRegistry::new();
        assert!(registry.is_empty());

        registry.on("ping", |_, _, _| true, |_action, _ctx| async {});

        assert_eq!(registry.len(), 1);
        let listener = registry.iter().next().expect("registered");
        assert_eq!(listener.name(), "ping");
        assert!(listener.matches(&TestAction::Ping, true, &()));
    }
}
