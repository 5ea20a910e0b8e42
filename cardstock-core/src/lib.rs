//! Core store, listener, and task machinery for cardstock
//!
//! This crate provides the foundational abstractions for building an
//! event-driven state layer with centralized state management, following a
//! Redux-inspired architecture.
//!
//! # Core Concepts
//!
//! - **Action**: Events that describe state transitions
//! - **Store**: Centralized state container with reducer pattern
//! - **StateHandle**: Cloneable shared store with change notification and
//!   condition-wait
//! - **Listener**: Named reactive rule (change predicate + async reaction)
//! - **ListenerRuntime**: The dispatch loop that applies actions and spawns
//!   matching reactions
//! - **TaskManager**: Keyed async tasks (fetches) reporting back as actions
//!
//! # Basic Example
//!
//! ```ignore
//! use cardstock_core::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! enum MyAction {
//!     Set(i32),
//!     DidDerive(i32),
//! }
//!
//! let mut runtime = ListenerRuntime::new(MyState::default(), reducer);
//!
//! // A rule: whenever Set lands, derive a follow-up value asynchronously.
//! runtime.listeners().on(
//!     "derive",
//!     |action, changed, _state| changed && matches!(action, MyAction::Set(_)),
//!     |_action, ctx| async move {
//!         let value = ctx.with(|s| s.value).await;
//!         ctx.dispatch(MyAction::DidDerive(value * 2));
//!     },
//! );
//!
//! let dispatcher = runtime.dispatcher();
//! tokio::spawn(runtime.run());
//! dispatcher.dispatch(MyAction::Set(21));
//! ```
//!
//! # Reaction Pattern
//!
//! Reactions may await backend calls and conditions over future state. Two
//! rules keep them well-behaved:
//!
//! 1. Re-read state after every await ([`ListenerCtx::with`]); never dispatch
//!    from a snapshot captured before the await.
//! 2. Bound every condition-wait ([`ListenerCtx::wait_for`] takes a timeout);
//!    an expired wait means the reaction abandons its dispatch, not that the
//!    system stalls.

pub mod action;
pub mod handle;
pub mod listener;
pub mod runtime;
pub mod store;
pub mod tasks;
pub mod testing;

// Core trait exports
pub use action::Action;

// Store exports
pub use store::{ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Reducer, Store};

// Shared state exports
pub use handle::{StateHandle, WaitTimeout};

// Listener exports
pub use listener::{Dispatcher, Listener, ListenerCtx, ListenerRegistry};
pub use runtime::ListenerRuntime;

// Task exports
pub use tasks::{TaskKey, TaskManager};

// Testing exports
pub use testing::{eventually, RecordingMiddleware};

// Re-export the cancellation token so downstream crates don't need a direct
// tokio-util dependency for shutdown plumbing.
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::handle::{StateHandle, WaitTimeout};
    pub use crate::listener::{Dispatcher, ListenerCtx, ListenerRegistry};
    pub use crate::runtime::ListenerRuntime;
    pub use crate::store::{
        ComposedMiddleware, LoggingMiddleware, Middleware, NoopMiddleware, Reducer, Store,
    };
    pub use crate::tasks::{TaskKey, TaskManager};
    pub use crate::CancellationToken;
}
