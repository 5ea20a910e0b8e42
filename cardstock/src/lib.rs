//! Client-side state engine for assembling card print projects
//!
//! A card project is an ordered sequence of slots, each with a front and a
//! back image picked from a searchable card database. This crate holds the
//! whole client state (search settings, cached search results, the
//! project itself, cardbacks, invalid-selection warnings, modals, error
//! notifications) and a Reactive Coordinator that keeps those stores
//! mutually consistent: editing a query re-fetches its results, fresh
//! results re-select images, a refreshed cardback list revalidates the
//! project cardback, and so on.
//!
//! # Architecture
//!
//! Built on [`cardstock_core`]: one [`AppAction`](action::AppAction) enum,
//! one root [`reducer`](reducer::reducer) over [`AppState`](state::AppState),
//! and a table of named coordinator rules (see [`coordinator`]) registered
//! as listeners on the dispatch loop. Reactions run as independent tasks,
//! re-read state after every await, and surface fetch failures as keyed
//! error notifications instead of retrying.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cardstock::{Engine, FileConfigStore, HttpBackend};
//!
//! let backend = Arc::new(HttpBackend::new("https://server.example"));
//! let config = Arc::new(FileConfigStore::new(path));
//! let engine = Engine::start(backend, config);
//!
//! engine.configure_backend("https://server.example");
//! engine.import_text("2x island\n1 swamp");
//! // ... reactions fetch results and pick default images
//! ```

pub mod action;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod import;
pub mod model;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod testing;

pub use action::AppAction;
pub use backend::{Backend, BackendError, HttpBackend, CARDS_PAGE_SIZE};
pub use config::{ConfigStore, FileConfigStore, PersistedSettings};
pub use engine::Engine;
pub use import::{parse_decklist, slots_from_text, DecklistLine};
pub use model::{CardDocument, CardType, Face, SearchQuery, SourceDescriptor};
pub use reducer::reducer;
pub use state::{
    AppState, BackendState, CardDocumentsState, CardbacksState, ErrorNotification,
    InvalidIdentifier, InvalidIdentifiersState, Modal, ModalState, NotificationsState, Project,
    ProjectMember, SearchResultsState, SearchSettings, SettingsState, Slot, SourcesState,
};
