//! Invalid-identifier store: selections that vanished from their results
//!
//! Purely a notification ledger for passive user review; it never touches
//! project state by itself. Records are created by the apply-results
//! reaction and destroyed when the user deliberately edits that face's
//! query.

use std::collections::HashMap;

use crate::model::{Face, SearchQuery};

/// A selection that is no longer present in the current result list.
#[derive(Clone, Debug, PartialEq)]
pub struct InvalidIdentifier {
    pub query: SearchQuery,
    pub identifier: String,
}

/// Per-slot, per-face ledger of invalidated selections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvalidIdentifiersState {
    pub records: HashMap<(usize, Face), InvalidIdentifier>,
}

impl InvalidIdentifiersState {
    /// Record an invalidated selection, overwriting any prior record for
    /// that slot/face.
    pub fn record(
        &mut self,
        slot: usize,
        face: Face,
        query: SearchQuery,
        identifier: String,
    ) -> bool {
        let record = InvalidIdentifier { query, identifier };
        if self.records.get(&(slot, face)) == Some(&record) {
            return false;
        }
        self.records.insert((slot, face), record);
        true
    }

    /// Clear the record for one slot/face.
    pub fn clear(&mut self, slot: usize, face: Face) -> bool {
        self.records.remove(&(slot, face)).is_some()
    }

    /// Clear every record.
    pub fn clear_all(&mut self) -> bool {
        if self.records.is_empty() {
            return false;
        }
        self.records.clear();
        true
    }

    /// The record for one slot/face, if any.
    pub fn get(&self, slot: usize, face: Face) -> Option<&InvalidIdentifier> {
        self.records.get(&(slot, face))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renumber records after slots were deleted.
    ///
    /// `removed` must be sorted ascending (as returned by
    /// [`Project::delete_slots`](crate::state::Project::delete_slots)).
    /// Records for removed slots are dropped; records for later slots shift
    /// down by the count removed before them.
    pub fn apply_deletion(&mut self, removed: &[usize]) -> bool {
        if removed.is_empty() || self.records.is_empty() {
            return false;
        }
        let old = std::mem::take(&mut self.records);
        let mut changed = false;
        for ((slot, face), record) in old {
            if removed.binary_search(&slot).is_ok() {
                changed = true;
                continue;
            }
            let shift = removed.partition_point(|&r| r < slot);
            if shift > 0 {
                changed = true;
            }
            self.records.insert((slot - shift, face), record);
        }
        changed
    }
}
