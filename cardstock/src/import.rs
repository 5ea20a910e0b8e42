//! Decklist text import
//!
//! Parses the plain-text decklist format: one query per line with an
//! optional quantity prefix (`2x island`, `2 island`, or a bare `island`),
//! `t:` marking token queries. Blank lines and `#` comments are skipped.
//! CSV and import-site URL flows are handled elsewhere.

use crate::model::{CardType, SearchQuery};
use crate::state::Slot;

/// One parsed decklist line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecklistLine {
    pub quantity: usize,
    pub query: SearchQuery,
}

/// Parse a whole decklist.
pub fn parse_decklist(text: &str) -> Vec<DecklistLine> {
    text.lines().filter_map(parse_line).collect()
}

/// Build front-face slots for every parsed line, in order.
pub fn slots_from_text(text: &str) -> Vec<Slot> {
    parse_decklist(text)
        .into_iter()
        .flat_map(|line| {
            std::iter::repeat_with(move || Slot::front_query(line.query.clone()))
                .take(line.quantity)
        })
        .collect()
}

fn parse_line(line: &str) -> Option<DecklistLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (quantity, rest) = split_quantity(line);
    let (card_type, name) = match rest.strip_prefix("t:") {
        Some(token_name) => (CardType::Token, token_name),
        None => (CardType::Card, rest),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(DecklistLine {
        quantity,
        query: SearchQuery {
            query: name.to_string(),
            card_type,
        },
    })
}

/// Split an optional leading quantity (`2x rest`, `2 rest`) off a line.
fn split_quantity(line: &str) -> (usize, &str) {
    let mut parts = line.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default();
    if let Some(rest) = parts.next() {
        let digits = first
            .strip_suffix(['x', 'X'])
            .filter(|d| !d.is_empty())
            .unwrap_or(first);
        if let Ok(quantity) = digits.parse::<usize>() {
            if quantity > 0 {
                return (quantity, rest);
            }
        }
    }
    (1, line)
}
