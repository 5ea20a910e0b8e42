//! Cardback store: images valid as a generic card back

/// Identifiers usable as a generic card back, in backend ranking order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CardbacksState {
    pub cardbacks: Vec<String>,
}

impl CardbacksState {
    /// Replace the list wholesale.
    pub fn replace(&mut self, cardbacks: Vec<String>) -> bool {
        if self.cardbacks == cardbacks {
            return false;
        }
        self.cardbacks = cardbacks;
        true
    }

    /// Whether `identifier` is a valid cardback.
    pub fn contains(&self, identifier: &str) -> bool {
        self.cardbacks.iter().any(|c| c == identifier)
    }

    /// The top-ranked cardback.
    pub fn first(&self) -> Option<&str> {
        self.cardbacks.first().map(String::as_str)
    }

    /// Drop the cached list.
    pub fn clear(&mut self) -> bool {
        if self.cardbacks.is_empty() {
            return false;
        }
        self.cardbacks.clear();
        true
    }
}
