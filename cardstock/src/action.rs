//! Every state transition in the editor
//!
//! Intent/result pairs follow the `DidLoad` naming convention: `Did*`
//! actions are produced by spawned fetch tasks, everything else by user
//! operations or coordinator reactions.

use std::collections::HashMap;

use cardstock_core::Action;

use crate::model::{CardDocument, CardType, Face, SearchQuery, SourceDescriptor};
use crate::state::{Modal, SearchSettings, Slot};

#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    // ===== Backend connection =====
    /// Point the editor at a card database service.
    BackendConfigure { url: String },
    /// Forget the configured backend.
    BackendClear,

    // ===== Fetch results =====
    /// The source list arrived.
    SourcesDidLoad { sources: Vec<SourceDescriptor> },
    /// Search results arrived for the queries in the payload.
    ///
    /// `generation` is the search-cache generation the fetch was issued
    /// under; payloads from a superseded generation are dropped.
    SearchResultsDidLoad {
        generation: u64,
        results: HashMap<String, HashMap<CardType, Vec<String>>>,
    },
    /// Card metadata arrived.
    CardDocumentsDidLoad {
        cards: HashMap<String, CardDocument>,
    },
    /// The cardback list arrived.
    CardbacksDidLoad { cardbacks: Vec<String> },

    // ===== Search settings =====
    /// Settings restored from persisted configuration (coordinator-driven).
    SettingsDidLoad { settings: SearchSettings },
    /// Settings edited by the user.
    SettingsUpdate { settings: SearchSettings },

    // ===== Caches =====
    /// Drop all backend-derived caches and start a new search generation.
    CachesClear,

    // ===== Project =====
    ProjectAddSlots { slots: Vec<Slot> },
    ProjectDeleteSlots { slots: Vec<usize> },
    /// The user edited one member's query.
    ProjectSetQuery {
        slot: usize,
        face: Face,
        query: SearchQuery,
    },
    /// Clear queries; back faces revert to the project cardback.
    ProjectClearQueries { targets: Vec<(usize, Face)> },
    /// Set the selected image for several members in one transaction.
    ProjectSetSelectedImages {
        targets: Vec<(usize, Face)>,
        image: Option<String>,
    },
    ProjectSetSelection {
        targets: Vec<(usize, Face)>,
        selected: bool,
    },
    ProjectToggleSelection { slot: usize, face: Face },
    ProjectSetCardback { cardback: Option<String> },

    // ===== Invalid-identifier ledger =====
    InvalidRecord {
        slot: usize,
        face: Face,
        query: SearchQuery,
        identifier: String,
    },
    InvalidClear { slot: usize, face: Face },
    InvalidClearAll,

    // ===== Modals =====
    ModalShow { modal: Modal },
    ModalHide,

    // ===== Error notifications =====
    ErrorReport {
        id: String,
        name: String,
        message: Option<String>,
    },
    ErrorDismiss { id: String },
    ErrorClearAll,
}

impl Action for AppAction {
    fn name(&self) -> &'static str {
        match self {
            AppAction::BackendConfigure { .. } => "BackendConfigure",
            AppAction::BackendClear => "BackendClear",
            AppAction::SourcesDidLoad { .. } => "SourcesDidLoad",
            AppAction::SearchResultsDidLoad { .. } => "SearchResultsDidLoad",
            AppAction::CardDocumentsDidLoad { .. } => "CardDocumentsDidLoad",
            AppAction::CardbacksDidLoad { .. } => "CardbacksDidLoad",
            AppAction::SettingsDidLoad { .. } => "SettingsDidLoad",
            AppAction::SettingsUpdate { .. } => "SettingsUpdate",
            AppAction::CachesClear => "CachesClear",
            AppAction::ProjectAddSlots { .. } => "ProjectAddSlots",
            AppAction::ProjectDeleteSlots { .. } => "ProjectDeleteSlots",
            AppAction::ProjectSetQuery { .. } => "ProjectSetQuery",
            AppAction::ProjectClearQueries { .. } => "ProjectClearQueries",
            AppAction::ProjectSetSelectedImages { .. } => "ProjectSetSelectedImages",
            AppAction::ProjectSetSelection { .. } => "ProjectSetSelection",
            AppAction::ProjectToggleSelection { .. } => "ProjectToggleSelection",
            AppAction::ProjectSetCardback { .. } => "ProjectSetCardback",
            AppAction::InvalidRecord { .. } => "InvalidRecord",
            AppAction::InvalidClear { .. } => "InvalidClear",
            AppAction::InvalidClearAll => "InvalidClearAll",
            AppAction::ModalShow { .. } => "ModalShow",
            AppAction::ModalHide => "ModalHide",
            AppAction::ErrorReport { .. } => "ErrorReport",
            AppAction::ErrorDismiss { .. } => "ErrorDismiss",
            AppAction::ErrorClearAll => "ErrorClearAll",
        }
    }
}
