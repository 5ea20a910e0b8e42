//! Read-only projections over [`AppState`]

use std::collections::HashSet;

use crate::model::{Face, SearchQuery};
use crate::state::AppState;

/// The result list a member draws from.
///
/// Queried members read the search cache. An unqueried back face falls
/// back to the cardback list; an unqueried front face has no default.
pub fn results_for_query_or_default<'a>(
    state: &'a AppState,
    query: Option<&SearchQuery>,
    face: Face,
) -> Option<&'a [String]> {
    match query {
        Some(query) if !query.query.is_empty() => state.search.get(query),
        _ => match face {
            Face::Back => Some(state.cardbacks.cardbacks.as_slice()),
            Face::Front => None,
        },
    }
}

/// Wrapped index arithmetic for prev/next navigation.
pub fn wrapped_index(index: usize, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    Some((((index as isize + delta) % len + len) % len) as usize)
}

/// The image `delta` steps away from a member's current selection within
/// its result list. A selection not present in the list (or no selection)
/// counts as position zero.
pub fn image_at_offset(
    state: &AppState,
    slot: usize,
    face: Face,
    delta: isize,
) -> Option<String> {
    let member = state.project.member(slot, face)?;
    let results = results_for_query_or_default(state, member.query.as_ref(), face)?;
    let current = member
        .selected_image
        .as_ref()
        .and_then(|image| results.iter().position(|r| r == image))
        .unwrap_or(0);
    let index = wrapped_index(current, delta, results.len())?;
    results.get(index).cloned()
}

/// The next image in a member's result list, wrapping at the end.
pub fn next_image(state: &AppState, slot: usize, face: Face) -> Option<String> {
    image_at_offset(state, slot, face, 1)
}

/// The previous image in a member's result list, wrapping at the start.
pub fn previous_image(state: &AppState, slot: usize, face: Face) -> Option<String> {
    image_at_offset(state, slot, face, -1)
}

/// Whether every enabled source is known to the backend.
pub fn enabled_sources_valid(state: &AppState) -> bool {
    state
        .settings
        .settings
        .sources
        .iter()
        .all(|key| state.sources.contains_key(key))
}

/// Identifiers referenced by results and cardbacks but missing from the
/// document cache, in first-seen order.
pub fn missing_card_documents(state: &AppState) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut missing = Vec::new();
    let referenced = state
        .search
        .results
        .values()
        .flat_map(|by_type| by_type.values())
        .flatten()
        .chain(state.cardbacks.cardbacks.iter());
    for identifier in referenced {
        if !state.cards.contains(identifier) && seen.insert(identifier.clone()) {
            missing.push(identifier.clone());
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Slot;

    #[test]
    fn test_wrapped_index() {
        assert_eq!(wrapped_index(0, 1, 3), Some(1));
        assert_eq!(wrapped_index(2, 1, 3), Some(0));
        assert_eq!(wrapped_index(0, -1, 3), Some(2));
        assert_eq!(wrapped_index(1, -1, 3), Some(0));
        assert_eq!(wrapped_index(0, 1, 0), None);
        assert_eq!(wrapped_index(1, -4, 3), Some(0));
    }

    fn state_with_results(query: &str, hits: &[&str]) -> AppState {
        let mut state = AppState::default();
        let generation = state.search.generation;
        let mut by_type = std::collections::HashMap::new();
        by_type.insert(
            crate::model::CardType::Card,
            hits.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        );
        let mut results = std::collections::HashMap::new();
        results.insert(query.to_string(), by_type);
        state.search.apply(generation, results);
        state
            .project
            .add_slots(vec![Slot::front_query(SearchQuery::card(query))]);
        state
    }

    #[test]
    fn test_navigation_wraps_both_ways() {
        let mut state = state_with_results("island", &["a", "b", "c"]);
        state
            .project
            .set_selected_images(&[(0, Face::Front)], Some("b"));

        assert_eq!(next_image(&state, 0, Face::Front).as_deref(), Some("c"));
        assert_eq!(
            previous_image(&state, 0, Face::Front).as_deref(),
            Some("a")
        );

        state
            .project
            .set_selected_images(&[(0, Face::Front)], Some("c"));
        assert_eq!(next_image(&state, 0, Face::Front).as_deref(), Some("a"));
    }

    #[test]
    fn test_unqueried_back_reads_cardbacks() {
        let mut state = AppState::default();
        state
            .cardbacks
            .replace(vec!["back-1".into(), "back-2".into()]);
        state
            .project
            .add_slots(vec![Slot::front_query(SearchQuery::card("island"))]);

        let results =
            results_for_query_or_default(&state, None, Face::Back).expect("cardback default");
        assert_eq!(results, ["back-1".to_string(), "back-2".to_string()]);

        assert_eq!(results_for_query_or_default(&state, None, Face::Front), None);
    }

    #[test]
    fn test_missing_card_documents_dedupes() {
        let mut state = state_with_results("island", &["a", "b"]);
        state.cardbacks.replace(vec!["a".into(), "c".into()]);

        let mut missing = missing_card_documents(&state);
        missing.sort();
        assert_eq!(missing, vec!["a", "b", "c"]);
    }
}
