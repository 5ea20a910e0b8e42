//! Project store: the ordered slot list and the project-wide cardback

use std::collections::BTreeSet;

use crate::model::{Face, SearchQuery};

/// One face of one slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectMember {
    /// What this face is searching for. `None` on a back face means the
    /// project cardback applies.
    pub query: Option<SearchQuery>,
    /// The chosen image. Kept consistent with the current result list by
    /// coordinator reactions, not by this store.
    pub selected_image: Option<String>,
    /// Per-member selection flag used by bulk operations.
    pub selected: bool,
}

impl ProjectMember {
    /// A member searching for `query`, with nothing selected yet.
    pub fn with_query(query: SearchQuery) -> Self {
        Self {
            query: Some(query),
            selected_image: None,
            selected: false,
        }
    }
}

/// One slot: up to two members, front and back.
///
/// Either face may be absent (deleted); a slot with both absent is
/// logically deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slot {
    pub front: Option<ProjectMember>,
    pub back: Option<ProjectMember>,
}

impl Slot {
    /// A slot searching for `query` on its front, with an unqueried back
    /// that follows the project cardback.
    pub fn front_query(query: SearchQuery) -> Self {
        Self {
            front: Some(ProjectMember::with_query(query)),
            back: Some(ProjectMember::default()),
        }
    }

    /// The member for a face, if present.
    pub fn member(&self, face: Face) -> Option<&ProjectMember> {
        match face {
            Face::Front => self.front.as_ref(),
            Face::Back => self.back.as_ref(),
        }
    }

    /// Mutable member access.
    pub fn member_mut(&mut self, face: Face) -> Option<&mut ProjectMember> {
        match face {
            Face::Front => self.front.as_mut(),
            Face::Back => self.back.as_mut(),
        }
    }
}

/// The ordered project plus its project-wide cardback.
///
/// Slot indices are dense and zero-based; every operation below is a pure
/// state transition returning whether anything changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Project {
    pub slots: Vec<Slot>,
    /// Default back image for slots lacking an explicit back query.
    pub cardback: Option<String>,
}

impl Project {
    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the project has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The member at (slot, face), if both exist.
    pub fn member(&self, slot: usize, face: Face) -> Option<&ProjectMember> {
        self.slots.get(slot).and_then(|s| s.member(face))
    }

    /// Mutable member access.
    pub fn member_mut(&mut self, slot: usize, face: Face) -> Option<&mut ProjectMember> {
        self.slots.get_mut(slot).and_then(|s| s.member_mut(face))
    }

    /// Append slots. New back faces without a query or an explicit image
    /// pick up the project cardback.
    pub fn add_slots(&mut self, slots: Vec<Slot>) -> bool {
        if slots.is_empty() {
            return false;
        }
        for mut slot in slots {
            if let Some(back) = slot.back.as_mut() {
                if back.query.is_none() && back.selected_image.is_none() {
                    back.selected_image = self.cardback.clone();
                }
            }
            self.slots.push(slot);
        }
        true
    }

    /// Delete slots by index. Later slots renumber down by the count
    /// removed before them. Returns the indices actually removed, sorted
    /// ascending, so dependent per-slot ledgers can renumber too.
    pub fn delete_slots(&mut self, indices: &[usize]) -> Vec<usize> {
        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.slots.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();
        for &index in sorted.iter().rev() {
            self.slots.remove(index);
        }
        sorted
    }

    /// Set the selected image for several (slot, face) pairs in one
    /// transaction.
    pub fn set_selected_images(&mut self, targets: &[(usize, Face)], image: Option<&str>) -> bool {
        let mut changed = false;
        for &(slot, face) in targets {
            if let Some(member) = self.member_mut(slot, face) {
                if member.selected_image.as_deref() != image {
                    member.selected_image = image.map(str::to_string);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Set one member's query.
    pub fn set_query(&mut self, slot: usize, face: Face, query: Option<SearchQuery>) -> bool {
        match self.member_mut(slot, face) {
            Some(member) if member.query != query => {
                member.query = query;
                true
            }
            _ => false,
        }
    }

    /// Clear queries for the given targets. Back faces revert to the
    /// project cardback; front faces are left with nothing selected.
    pub fn clear_queries(&mut self, targets: &[(usize, Face)]) -> bool {
        let cardback = self.cardback.clone();
        let mut changed = false;
        for &(slot, face) in targets {
            if let Some(member) = self.member_mut(slot, face) {
                let image = match face {
                    Face::Front => None,
                    Face::Back => cardback.clone(),
                };
                if member.query.is_some() || member.selected_image != image {
                    member.query = None;
                    member.selected_image = image;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Bulk-set the per-member selection flag.
    pub fn set_selection(&mut self, targets: &[(usize, Face)], selected: bool) -> bool {
        let mut changed = false;
        for &(slot, face) in targets {
            if let Some(member) = self.member_mut(slot, face) {
                if member.selected != selected {
                    member.selected = selected;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Toggle one member's selection flag.
    pub fn toggle_selection(&mut self, slot: usize, face: Face) -> bool {
        match self.member_mut(slot, face) {
            Some(member) => {
                member.selected = !member.selected;
                true
            }
            None => false,
        }
    }

    /// Set the project cardback. Back faces without a query that were
    /// tracking the old default move to the new one; back faces the user
    /// pointed at a specific image are left alone.
    pub fn set_cardback(&mut self, cardback: Option<String>) -> bool {
        if self.cardback == cardback {
            return false;
        }
        let old = std::mem::replace(&mut self.cardback, cardback);
        for slot in &mut self.slots {
            if let Some(back) = slot.back.as_mut() {
                if back.query.is_none() && back.selected_image == old {
                    back.selected_image = self.cardback.clone();
                }
            }
        }
        true
    }

    /// Distinct queries currently referenced by the project.
    pub fn queries(&self) -> BTreeSet<SearchQuery> {
        let mut queries = BTreeSet::new();
        for slot in &self.slots {
            for face in Face::both() {
                if let Some(query) = slot.member(face).and_then(|m| m.query.as_ref()) {
                    queries.insert(query.clone());
                }
            }
        }
        queries
    }

    /// Every (slot, face) whose member is flagged selected.
    pub fn selected_members(&self) -> Vec<(usize, Face)> {
        let mut members = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            for face in Face::both() {
                if slot.member(face).is_some_and(|m| m.selected) {
                    members.push((index, face));
                }
            }
        }
        members
    }
}
