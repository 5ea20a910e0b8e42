//! Settings store: user-configurable search parameters

use serde::{Deserialize, Serialize};

/// Lower DPI bound applied when nothing is persisted.
pub const DEFAULT_MIN_DPI: u32 = 0;
/// Upper DPI bound applied when nothing is persisted.
pub const DEFAULT_MAX_DPI: u32 = 1500;
/// Default per-file size ceiling, in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u32 = 30;

/// User-configurable search parameters.
///
/// Any actual change here invalidates every cached search result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Relaxed text matching instead of precise matching.
    pub fuzzy_search: bool,
    /// Whether the cardback list honours the filters below.
    pub filter_cardbacks: bool,
    /// Enabled sources in search-priority order, by source key.
    pub sources: Vec<String>,
    pub min_dpi: u32,
    pub max_dpi: u32,
    /// Per-file size ceiling, in megabytes.
    pub max_size_mb: u32,
    /// Language filter (alpha-2 codes); empty means all languages.
    pub languages: Vec<String>,
    pub includes_tags: Vec<String>,
    pub excludes_tags: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            fuzzy_search: false,
            filter_cardbacks: false,
            sources: Vec::new(),
            min_dpi: DEFAULT_MIN_DPI,
            max_dpi: DEFAULT_MAX_DPI,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            languages: Vec::new(),
            includes_tags: Vec::new(),
            excludes_tags: Vec::new(),
        }
    }
}

/// Settings store state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsState {
    pub settings: SearchSettings,
    /// Set once settings have been loaded from persisted configuration.
    pub loaded: bool,
}

impl SettingsState {
    /// Install freshly-loaded settings.
    ///
    /// Loading always counts as a change: it (re)establishes the search
    /// baseline after a backend connection, even when the persisted values
    /// happen to equal the in-memory ones.
    pub fn load(&mut self, settings: SearchSettings) -> bool {
        self.settings = settings;
        self.loaded = true;
        true
    }

    /// Apply a user edit, reporting whether any field actually changed
    /// (deep comparison).
    pub fn update(&mut self, settings: SearchSettings) -> bool {
        if self.loaded && self.settings == settings {
            return false;
        }
        self.settings = settings;
        self.loaded = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deep_compares() {
        let mut state = SettingsState::default();
        assert!(state.load(SearchSettings::default()));

        // Identical settings: no change.
        assert!(!state.update(SearchSettings::default()));

        // One field differs: change.
        let mut fuzzy = SearchSettings::default();
        fuzzy.fuzzy_search = true;
        assert!(state.update(fuzzy));
    }

    #[test]
    fn test_load_always_counts_as_change() {
        let mut state = SettingsState::default();
        assert!(state.load(SearchSettings::default()));
        assert!(state.load(SearchSettings::default()));
        assert!(state.loaded);
    }
}
