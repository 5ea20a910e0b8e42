//! Action trait for type-safe state transitions

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched to a store.
///
/// Actions describe state transitions. They should be:
/// - Clone: an action is handed to every listener whose predicate matches
/// - Debug: for logging
/// - Send + 'static: actions cross task boundaries (fetch tasks, reactions)
pub trait Action: Clone + Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}
