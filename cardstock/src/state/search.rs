//! Search-result and card-document caches

use std::collections::HashMap;

use crate::model::{CardDocument, CardType, SearchQuery};

/// Cached search results keyed by query string, then card type.
///
/// Entries are replaced wholesale on re-fetch, never merged. `generation`
/// increases on every cache clear; result payloads stamped with an older
/// generation are discarded, so a slow fetch issued before a clear can
/// never overwrite fresher data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResultsState {
    pub results: HashMap<String, HashMap<CardType, Vec<String>>>,
    pub generation: u64,
}

impl SearchResultsState {
    /// Drop every cached entry and start a new generation.
    pub fn clear(&mut self) -> bool {
        self.generation += 1;
        self.results.clear();
        true
    }

    /// Whether results for `query` are cached (possibly empty).
    pub fn contains(&self, query: &SearchQuery) -> bool {
        self.results
            .get(&query.query)
            .is_some_and(|by_type| by_type.contains_key(&query.card_type))
    }

    /// The cached result list for `query`.
    pub fn get(&self, query: &SearchQuery) -> Option<&[String]> {
        self.results
            .get(&query.query)
            .and_then(|by_type| by_type.get(&query.card_type))
            .map(Vec::as_slice)
    }

    /// Replace entries fetched under `generation`; stale payloads are
    /// dropped whole.
    pub fn apply(
        &mut self,
        generation: u64,
        results: HashMap<String, HashMap<CardType, Vec<String>>>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "dropping search results from a superseded fetch"
            );
            return false;
        }
        let mut changed = false;
        for (query, by_type) in results {
            for (card_type, hits) in by_type {
                let entry = self.results.entry(query.clone()).or_default();
                if entry.get(&card_type) != Some(&hits) {
                    entry.insert(card_type, hits);
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Card metadata cache, merged additively.
///
/// Documents are immutable per identifier, so re-fetching can only fill
/// gaps; it never rewrites existing entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CardDocumentsState {
    pub cards: HashMap<String, CardDocument>,
}

impl CardDocumentsState {
    /// Whether metadata for `identifier` is cached.
    pub fn contains(&self, identifier: &str) -> bool {
        self.cards.contains_key(identifier)
    }

    /// Merge a fetched batch into the cache.
    pub fn merge(&mut self, cards: HashMap<String, CardDocument>) -> bool {
        let mut changed = false;
        for (identifier, card) in cards {
            if !self.cards.contains_key(&identifier) {
                self.cards.insert(identifier, card);
                changed = true;
            }
        }
        changed
    }

    /// Drop every cached document.
    pub fn clear(&mut self) -> bool {
        if self.cards.is_empty() {
            return false;
        }
        self.cards.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_for(query: &str, hits: &[&str]) -> HashMap<String, HashMap<CardType, Vec<String>>> {
        let mut by_type = HashMap::new();
        by_type.insert(
            CardType::Card,
            hits.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        );
        let mut results = HashMap::new();
        results.insert(query.to_string(), by_type);
        results
    }

    #[test]
    fn test_apply_replaces_wholesale() {
        let mut state = SearchResultsState::default();
        let generation = state.generation;

        assert!(state.apply(generation, results_for("island", &["a", "b"])));
        assert_eq!(
            state.get(&SearchQuery::card("island")),
            Some(["a".to_string(), "b".to_string()].as_slice())
        );

        assert!(state.apply(generation, results_for("island", &["c"])));
        assert_eq!(
            state.get(&SearchQuery::card("island")),
            Some(["c".to_string()].as_slice())
        );
    }

    #[test]
    fn test_apply_drops_stale_generation() {
        let mut state = SearchResultsState::default();
        let old_generation = state.generation;

        state.clear();

        assert!(!state.apply(old_generation, results_for("island", &["a"])));
        assert!(!state.contains(&SearchQuery::card("island")));
    }

    #[test]
    fn test_contains_distinguishes_empty_from_missing() {
        let mut state = SearchResultsState::default();
        let generation = state.generation;
        state.apply(generation, results_for("island", &[]));

        assert!(state.contains(&SearchQuery::card("island")));
        assert!(!state.contains(&SearchQuery::card("swamp")));
        assert_eq!(state.get(&SearchQuery::card("island")), Some(&[][..]));
    }

    #[test]
    fn test_documents_merge_additively() {
        let mut state = CardDocumentsState::default();

        let mut batch = HashMap::new();
        batch.insert(
            "id-1".to_string(),
            crate::testing::document("id-1", CardType::Card),
        );
        assert!(state.merge(batch.clone()));
        assert!(state.contains("id-1"));

        // Re-merging the same batch changes nothing.
        assert!(!state.merge(batch));
    }
}
