//! Domain model shared by the stores and the backend client

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of image a query is searching for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardType {
    #[default]
    Card,
    Cardback,
    Token,
}

/// Front or back of a card slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Front,
    Back,
}

impl Face {
    /// Both faces, front first.
    pub fn both() -> [Face; 2] {
        [Face::Front, Face::Back]
    }
}

/// Identifies what one face of one slot is searching for.
///
/// Two faces with an identical query share the same result list.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub card_type: CardType,
}

impl SearchQuery {
    /// A front-face card query.
    pub fn card(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            card_type: CardType::Card,
        }
    }

    /// A token query.
    pub fn token(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            card_type: CardType::Token,
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.card_type, self.query)
    }
}

/// Card metadata as served by the card-documents endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDocument {
    pub identifier: String,
    pub card_type: CardType,
    pub name: String,
    #[serde(default)]
    pub priority: i64,
    pub source: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub source_verbose: String,
    #[serde(default)]
    pub dpi: u32,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub small_thumbnail_url: Option<String>,
    #[serde(default)]
    pub medium_thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub language: String,
}

/// One row of the source list, in backend ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub pk: i64,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub external_link: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&CardType::Card).expect("serialize"),
            "\"CARD\""
        );
        assert_eq!(
            serde_json::to_string(&CardType::Cardback).expect("serialize"),
            "\"CARDBACK\""
        );
        assert_eq!(
            serde_json::to_string(&CardType::Token).expect("serialize"),
            "\"TOKEN\""
        );
    }

    #[test]
    fn test_query_ordering_is_deterministic() {
        let mut queries = vec![
            SearchQuery::token("goblin"),
            SearchQuery::card("island"),
            SearchQuery::card("forest"),
        ];
        queries.sort();
        assert_eq!(queries[0], SearchQuery::card("forest"));
        assert_eq!(queries[1], SearchQuery::token("goblin"));
        assert_eq!(queries[2], SearchQuery::card("island"));
    }
}
