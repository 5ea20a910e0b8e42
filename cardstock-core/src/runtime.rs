//! Dispatch loop: actions in, reductions and spawned reactions out

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::action::Action;
use crate::handle::StateHandle;
use crate::listener::{Dispatcher, ListenerCtx, ListenerRegistry};
use crate::store::{Middleware, NoopMiddleware, Reducer};

/// Owns the action channel, the shared state, and the listener registry.
///
/// Build the runtime, register listeners, hand out [`Dispatcher`]s and the
/// [`StateHandle`], then spawn [`ListenerRuntime::run`]. The loop applies
/// each received action through the reducer, then evaluates every listener
/// predicate against the post-transition state and spawns the matching
/// reactions. Reactions are independent tasks: they interleave freely and a
/// failure in one never reaches its siblings.
pub struct ListenerRuntime<S, A: Action> {
    handle: StateHandle<S, A>,
    registry: ListenerRegistry<S, A>,
    action_tx: mpsc::UnboundedSender<A>,
    action_rx: mpsc::UnboundedReceiver<A>,
    cancel: CancellationToken,
}

impl<S, A> ListenerRuntime<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a runtime with no middleware.
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self::with_middleware(state, reducer, NoopMiddleware)
    }

    /// Create a runtime with middleware hooks around the reducer.
    pub fn with_middleware<M>(state: S, reducer: Reducer<S, A>, middleware: M) -> Self
    where
        M: Middleware<A> + Send + 'static,
    {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            handle: StateHandle::with_middleware(state, reducer, middleware),
            registry: ListenerRegistry::new(),
            action_tx,
            action_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Clone the shared state handle.
    pub fn handle(&self) -> StateHandle<S, A> {
        self.handle.clone()
    }

    /// Create a dispatcher feeding this runtime's action channel.
    pub fn dispatcher(&self) -> Dispatcher<A> {
        Dispatcher::new(self.action_tx.clone())
    }

    /// The listener registry, for rule registration.
    pub fn listeners(&mut self) -> &mut ListenerRegistry<S, A> {
        &mut self.registry
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the dispatch loop until cancelled.
    ///
    /// The runtime keeps a sender of its own for listener contexts, so the
    /// channel never closes on its own; cancellation is the shutdown path.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("dispatch loop cancelled");
                    break;
                }
                action = self.action_rx.recv() => match action {
                    Some(action) => self.process(action).await,
                    None => break,
                },
            }
        }
    }

    async fn process(&mut self, action: A) {
        let changed = self.handle.dispatch(action.clone()).await;
        trace!(action = action.name(), changed, "action applied");

        let state = self.handle.read().await;
        for listener in self.registry.iter() {
            if listener.matches(&action, changed, &state) {
                trace!(
                    listener = listener.name(),
                    action = action.name(),
                    "reaction spawned"
                );
                let ctx = ListenerCtx::new(self.handle.clone(), Dispatcher::new(self.action_tx.clone()));
                tokio::spawn(listener.invoke(action.clone(), ctx));
            }
        }
    }
}
