//! Keyed async tasks that report back as actions
//!
//! Fetches and other side effects run as tasks owned by a [`TaskManager`].
//! Tasks with the same key are mutually exclusive: spawning a key that is
//! already running aborts the previous task, so a superseded fetch can
//! never land its (now stale) result action. Completed tasks send their
//! action through the runtime's dispatcher.

use std::collections::HashMap;
use std::future::Future;

use tokio::task::{AbortHandle, JoinHandle};

use crate::listener::Dispatcher;
use crate::Action;

/// Identifies a task for replacement and cancellation.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    /// Create a new task key.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the key name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Manages async task lifecycle with keyed replacement.
///
/// # Type Parameters
///
/// - `A`: The action type that tasks produce
pub struct TaskManager<A> {
    tasks: HashMap<TaskKey, AbortHandle>,
    dispatcher: Dispatcher<A>,
}

impl<A> TaskManager<A>
where
    A: Action,
{
    /// Create a new task manager.
    ///
    /// Completed tasks dispatch their result action through `dispatcher`.
    pub fn new(dispatcher: Dispatcher<A>) -> Self {
        Self {
            tasks: HashMap::new(),
            dispatcher,
        }
    }

    /// Spawn a task, aborting any existing task with the same key.
    ///
    /// The future resolves to the action to dispatch on completion. If the
    /// task is aborted before completion, no action is dispatched.
    ///
    /// # Example
    ///
    /// ```ignore
    /// tasks.spawn("sources", async move {
    ///     match backend.sources().await {
    ///         Ok(sources) => AppAction::SourcesDidLoad { sources },
    ///         Err(err) => AppAction::ErrorReport { /* ... */ },
    ///     }
    /// });
    /// ```
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        let key = key.into();

        // A still-running task under this key is superseded.
        self.cancel(&key);

        let dispatcher = self.dispatcher.clone();
        let handle: JoinHandle<()> = tokio::spawn(async move {
            let action = future.await;
            dispatcher.dispatch(action);
        });

        self.tasks.insert(key, handle.abort_handle());
        self
    }

    /// Abort a task by key.
    ///
    /// If no task exists with the given key, this is a no-op.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
        }
    }

    /// Abort all running tasks.
    ///
    /// Useful for cleanup on shutdown.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Check if a task with the given key is currently running.
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    /// Get the number of running tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if there are no running tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<A> Drop for TaskManager<A> {
    fn drop(&mut self) {
        // Abort all running tasks on drop
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Clone, Debug)]
    enum TestAction {
        Done(usize),
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            "Done"
        }
    }

    #[test]
    fn test_task_key() {
        let k1 = TaskKey::new("test");
        let k2 = TaskKey::from("test");
        let k3: TaskKey = "test".into();

        assert_eq!(k1, k2);
        assert_eq!(k2, k3);
        assert_eq!(k1.name(), "test");
    }

    #[tokio::test]
    async fn test_spawn_dispatches_action() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(Dispatcher::new(tx));

        tasks.spawn("test", async { TestAction::Done(42) });

        let action = tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");

        assert!(matches!(action, TestAction::Done(42)));
    }

    #[tokio::test]
    async fn test_spawn_aborts_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(Dispatcher::new(tx));

        let counter = Arc::new(AtomicUsize::new(0));

        // First task stalls long enough to be superseded.
        let c1 = counter.clone();
        tasks.spawn("test", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            c1.fetch_add(1, Ordering::SeqCst);
            TestAction::Done(1)
        });

        let c2 = counter.clone();
        tasks.spawn("test", async move {
            c2.fetch_add(10, Ordering::SeqCst);
            TestAction::Done(2)
        });

        // Only the second task completes.
        let action = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");

        assert!(matches!(action, TestAction::Done(2)));
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(Dispatcher::new(tx));

        tasks.spawn("test", async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            TestAction::Done(1)
        });

        assert!(tasks.is_running(&TaskKey::new("test")));

        tasks.cancel(&TaskKey::new("test"));

        assert!(!tasks.is_running(&TaskKey::new("test")));

        // No action arrives for the aborted task.
        let result = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(result.is_err() || result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(Dispatcher::new(tx));

        tasks.spawn("a", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            TestAction::Done(1)
        });
        tasks.spawn("b", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            TestAction::Done(2)
        });

        assert_eq!(tasks.len(), 2);

        tasks.cancel_all();

        assert!(tasks.is_empty());
    }
}
