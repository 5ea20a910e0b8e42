//! Assembly: wires the stores, coordinator, middleware, and dispatch loop

use std::sync::Arc;
use std::time::Duration;

use cardstock_core::{
    CancellationToken, ComposedMiddleware, Dispatcher, ListenerRuntime, LoggingMiddleware,
    StateHandle, TaskManager, WaitTimeout,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::action::AppAction;
use crate::backend::Backend;
use crate::config::{ConfigStore, SettingsPersistMiddleware};
use crate::coordinator;
use crate::import;
use crate::model::{Face, SearchQuery};
use crate::reducer::reducer;
use crate::selectors;
use crate::state::{AppState, Modal, SearchSettings, Slot};

/// A running editor state engine.
///
/// Owns the dispatch loop task; user operations are thin dispatch wrappers.
/// Everything asynchronous (fetches, reconciliation) happens in coordinator
/// reactions behind the scenes; callers observe the results through
/// [`Engine::state`] and [`Engine::wait_until`].
pub struct Engine {
    handle: StateHandle<AppState, AppAction>,
    dispatcher: Dispatcher<AppAction>,
    tasks: Arc<Mutex<TaskManager<AppAction>>>,
    cancel: CancellationToken,
    loop_task: JoinHandle<()>,
}

impl Engine {
    /// Start the engine with the given backend and settings store.
    pub fn start<B, C>(backend: Arc<B>, config: Arc<C>) -> Self
    where
        B: Backend,
        C: ConfigStore,
    {
        let mut middleware = ComposedMiddleware::new();
        middleware.add(LoggingMiddleware::new());
        middleware.add(SettingsPersistMiddleware::new(config.clone()));

        let mut runtime = ListenerRuntime::with_middleware(AppState::default(), reducer, middleware);
        let tasks = Arc::new(Mutex::new(TaskManager::new(runtime.dispatcher())));
        coordinator::register(runtime.listeners(), backend, config, tasks.clone());

        let handle = runtime.handle();
        let dispatcher = runtime.dispatcher();
        let cancel = runtime.cancellation_token();
        let loop_task = tokio::spawn(runtime.run());

        Self {
            handle,
            dispatcher,
            tasks,
            cancel,
            loop_task,
        }
    }

    /// Enqueue a raw action.
    pub fn dispatch(&self, action: AppAction) {
        self.dispatcher.dispatch(action);
    }

    /// Clone the dispatcher.
    pub fn dispatcher(&self) -> Dispatcher<AppAction> {
        self.dispatcher.clone()
    }

    /// Clone the state handle.
    pub fn handle(&self) -> StateHandle<AppState, AppAction> {
        self.handle.clone()
    }

    /// Read the current state.
    pub async fn state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        self.handle.with(f).await
    }

    /// Await a condition over the state.
    pub async fn wait_until<F>(&self, predicate: F, timeout: Duration) -> Result<(), WaitTimeout>
    where
        F: FnMut(&AppState) -> bool,
    {
        self.handle.wait_for(predicate, timeout).await
    }

    /// Stop the dispatch loop and abort in-flight fetches.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.tasks.lock().await.cancel_all();
        let _ = self.loop_task.await;
    }

    // ===== Backend =====

    /// Point the editor at a card database service.
    pub fn configure_backend(&self, url: impl Into<String>) {
        self.dispatch(AppAction::BackendConfigure { url: url.into() });
    }

    /// Forget the configured backend.
    pub fn clear_backend(&self) {
        self.dispatch(AppAction::BackendClear);
    }

    // ===== Settings =====

    /// Apply a user edit to the search settings.
    pub fn update_settings(&self, settings: SearchSettings) {
        self.dispatch(AppAction::SettingsUpdate { settings });
    }

    // ===== Project =====

    /// Import a plain-text decklist, appending its slots.
    pub fn import_text(&self, text: &str) {
        let slots = import::slots_from_text(text);
        if !slots.is_empty() {
            self.dispatch(AppAction::ProjectAddSlots { slots });
        }
    }

    /// Append pre-built slots to the project.
    pub fn add_slots(&self, slots: Vec<Slot>) {
        if !slots.is_empty() {
            self.dispatch(AppAction::ProjectAddSlots { slots });
        }
    }

    /// Delete slots by index.
    pub fn delete_slots(&self, slots: Vec<usize>) {
        self.dispatch(AppAction::ProjectDeleteSlots { slots });
    }

    /// Edit one member's query.
    pub fn set_query(&self, slot: usize, face: Face, query: SearchQuery) {
        self.dispatch(AppAction::ProjectSetQuery { slot, face, query });
    }

    /// Clear queries; back faces revert to the project cardback.
    pub fn clear_queries(&self, targets: Vec<(usize, Face)>) {
        self.dispatch(AppAction::ProjectClearQueries { targets });
    }

    /// Bulk "change version": one image for several members, one dispatch.
    pub fn set_selected_images(&self, targets: Vec<(usize, Face)>, image: Option<String>) {
        self.dispatch(AppAction::ProjectSetSelectedImages { targets, image });
    }

    /// Bulk-set selection flags.
    pub fn set_selection(&self, targets: Vec<(usize, Face)>, selected: bool) {
        self.dispatch(AppAction::ProjectSetSelection { targets, selected });
    }

    /// Toggle one member's selection flag.
    pub fn toggle_selection(&self, slot: usize, face: Face) {
        self.dispatch(AppAction::ProjectToggleSelection { slot, face });
    }

    /// Set the project-wide cardback.
    pub fn set_cardback(&self, cardback: Option<String>) {
        self.dispatch(AppAction::ProjectSetCardback { cardback });
    }

    /// Advance a member to the next image in its result list, wrapping.
    pub async fn next_image(&self, slot: usize, face: Face) {
        self.step_image(slot, face, 1).await;
    }

    /// Step a member back to the previous image, wrapping.
    pub async fn previous_image(&self, slot: usize, face: Face) {
        self.step_image(slot, face, -1).await;
    }

    async fn step_image(&self, slot: usize, face: Face, delta: isize) {
        let image = self
            .state(|s| selectors::image_at_offset(s, slot, face, delta))
            .await;
        if image.is_some() {
            self.dispatch(AppAction::ProjectSetSelectedImages {
                targets: vec![(slot, face)],
                image,
            });
        }
    }

    // ===== Modals and notifications =====

    /// Show a modal, replacing any open one.
    pub fn show_modal(&self, modal: Modal) {
        self.dispatch(AppAction::ModalShow { modal });
    }

    /// Hide the open modal.
    pub fn hide_modal(&self) {
        self.dispatch(AppAction::ModalHide);
    }

    /// Dismiss one error notification.
    pub fn dismiss_error(&self, id: impl Into<String>) {
        self.dispatch(AppAction::ErrorDismiss { id: id.into() });
    }

    /// Dismiss every error notification.
    pub fn dismiss_all_errors(&self) {
        self.dispatch(AppAction::ErrorClearAll);
    }

    /// Drop every invalid-selection warning.
    pub fn clear_invalid_warnings(&self) {
        self.dispatch(AppAction::InvalidClearAll);
    }
}
