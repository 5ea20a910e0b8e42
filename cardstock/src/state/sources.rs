//! Source store: the backend's source list

use crate::model::SourceDescriptor;

/// Cache of source descriptors, in backend ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourcesState {
    pub sources: Vec<SourceDescriptor>,
}

impl SourcesState {
    /// Replace the source list wholesale.
    pub fn replace(&mut self, sources: Vec<SourceDescriptor>) -> bool {
        if self.sources == sources {
            return false;
        }
        self.sources = sources;
        true
    }

    /// Whether a source with the given key is known.
    pub fn contains_key(&self, key: &str) -> bool {
        self.sources.iter().any(|s| s.key == key)
    }

    /// Drop the cached list.
    pub fn clear(&mut self) -> bool {
        if self.sources.is_empty() {
            return false;
        }
        self.sources.clear();
        true
    }
}
