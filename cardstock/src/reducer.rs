//! Root reducer: delegates each action to its store

use crate::action::AppAction;
use crate::state::{AppState, ErrorNotification};

/// Apply one action. Returns `true` when any store actually changed; no-op
/// transitions (same cardback, identical settings, unknown slot indices)
/// report `false` so change-gated listeners stay quiet.
pub fn reducer(state: &mut AppState, action: AppAction) -> bool {
    match action {
        AppAction::BackendConfigure { url } => {
            if state.backend.url.as_deref() == Some(url.as_str()) {
                return false;
            }
            state.backend.url = Some(url);
            true
        }
        AppAction::BackendClear => {
            if state.backend.url.is_none() {
                return false;
            }
            state.backend.url = None;
            true
        }

        AppAction::SourcesDidLoad { sources } => state.sources.replace(sources),
        AppAction::SearchResultsDidLoad {
            generation,
            results,
        } => state.search.apply(generation, results),
        AppAction::CardDocumentsDidLoad { cards } => state.cards.merge(cards),
        AppAction::CardbacksDidLoad { cardbacks } => state.cardbacks.replace(cardbacks),

        AppAction::SettingsDidLoad { settings } => state.settings.load(settings),
        AppAction::SettingsUpdate { settings } => state.settings.update(settings),

        AppAction::CachesClear => {
            let search = state.search.clear();
            let cards = state.cards.clear();
            let cardbacks = state.cardbacks.clear();
            search || cards || cardbacks
        }

        AppAction::ProjectAddSlots { slots } => state.project.add_slots(slots),
        AppAction::ProjectDeleteSlots { slots } => {
            let removed = state.project.delete_slots(&slots);
            // Keep the invalid ledger aligned with the renumbered slots.
            state.invalid.apply_deletion(&removed);
            !removed.is_empty()
        }
        AppAction::ProjectSetQuery { slot, face, query } => {
            state.project.set_query(slot, face, Some(query))
        }
        AppAction::ProjectClearQueries { targets } => state.project.clear_queries(&targets),
        AppAction::ProjectSetSelectedImages { targets, image } => state
            .project
            .set_selected_images(&targets, image.as_deref()),
        AppAction::ProjectSetSelection { targets, selected } => {
            state.project.set_selection(&targets, selected)
        }
        AppAction::ProjectToggleSelection { slot, face } => {
            state.project.toggle_selection(slot, face)
        }
        AppAction::ProjectSetCardback { cardback } => state.project.set_cardback(cardback),

        AppAction::InvalidRecord {
            slot,
            face,
            query,
            identifier,
        } => state.invalid.record(slot, face, query, identifier),
        AppAction::InvalidClear { slot, face } => state.invalid.clear(slot, face),
        AppAction::InvalidClearAll => state.invalid.clear_all(),

        AppAction::ModalShow { modal } => state.modal.show(modal),
        AppAction::ModalHide => state.modal.hide(),

        AppAction::ErrorReport { id, name, message } => {
            state.notifications.report(ErrorNotification { id, name, message })
        }
        AppAction::ErrorDismiss { id } => state.notifications.dismiss(&id),
        AppAction::ErrorClearAll => state.notifications.clear(),
    }
}
