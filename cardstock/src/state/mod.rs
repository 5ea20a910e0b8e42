//! Store state containers composed into [`AppState`]
//!
//! Each store is a plain data container whose operations are pure state
//! transitions returning a change indicator. Cross-store consistency is
//! the coordinator's job (see [`crate::coordinator`]), not the stores'.

mod cardbacks;
mod invalid;
mod modal;
mod notifications;
mod project;
mod search;
mod settings;
mod sources;

pub use cardbacks::CardbacksState;
pub use invalid::{InvalidIdentifier, InvalidIdentifiersState};
pub use modal::{Modal, ModalState};
pub use notifications::{ErrorNotification, NotificationsState};
pub use project::{Project, ProjectMember, Slot};
pub use search::{CardDocumentsState, SearchResultsState};
pub use settings::{
    SearchSettings, SettingsState, DEFAULT_MAX_DPI, DEFAULT_MAX_SIZE_MB, DEFAULT_MIN_DPI,
};
pub use sources::SourcesState;

/// Backend connection configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendState {
    /// Base URL of the card database service, once configured.
    pub url: Option<String>,
}

impl BackendState {
    /// Whether a backend is configured.
    pub fn configured(&self) -> bool {
        self.url.is_some()
    }
}

/// The whole client state: every store the coordinator keeps consistent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub backend: BackendState,
    pub settings: SettingsState,
    pub sources: SourcesState,
    pub search: SearchResultsState,
    pub cards: CardDocumentsState,
    pub cardbacks: CardbacksState,
    pub project: Project,
    pub invalid: InvalidIdentifiersState,
    pub modal: ModalState,
    pub notifications: NotificationsState,
}
