//! Live project model
//!
//! Holds every description, the regular and extended views derived from it
//! and the spaces. The views keep their own copies so that each copy's index
//! is its position in the view that holds it.

use tracing::debug;
use uuid::Uuid;

use crate::collection::IndexedCollection;
use crate::types::{Description, Space};

/// Observable collections of the current project
#[derive(Debug, Default)]
pub struct ProjectModel {
    all_descriptions: IndexedCollection<Description>,
    regular_descriptions: IndexedCollection<Description>,
    extended_descriptions: IndexedCollection<Description>,
    spaces: IndexedCollection<Space>,
}

impl ProjectModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every description, in authoring order
    pub fn all_descriptions(&self) -> &IndexedCollection<Description> {
        &self.all_descriptions
    }

    /// Descriptions that are not extended
    pub fn regular_descriptions(&self) -> &IndexedCollection<Description> {
        &self.regular_descriptions
    }

    /// Extended descriptions
    pub fn extended_descriptions(&self) -> &IndexedCollection<Description> {
        &self.extended_descriptions
    }

    pub fn spaces(&self) -> &IndexedCollection<Space> {
        &self.spaces
    }

    /// Append a description, returning its index in the full collection
    pub fn add_description(&mut self, description: Description) -> usize {
        let at = self.all_descriptions.len();
        self.insert_description(at, description)
    }

    /// Insert a description at `at` in the full collection.
    ///
    /// The copy placed in its view keeps the relative order of the full
    /// collection.
    pub fn insert_description(&mut self, at: usize, description: Description) -> usize {
        let at = self.all_descriptions.insert(at, description.clone());
        self.route_into_view(description);
        at
    }

    /// Replace all descriptions
    pub fn set_descriptions(&mut self, descriptions: Vec<Description>) {
        self.all_descriptions.clear();
        self.regular_descriptions.clear();
        self.extended_descriptions.clear();
        for description in descriptions {
            self.add_description(description);
        }
    }

    /// Remove a description from the full collection and from its view.
    ///
    /// The returned copy carries the index it had in the full collection.
    pub fn remove_description(&mut self, id: Uuid) -> Option<Description> {
        let removed = self.all_descriptions.remove(id)?;
        self.view_mut(removed.is_extended).remove(id);
        debug!("Removed description {} at {}", id, removed.index);
        Some(removed)
    }

    /// Edit a description. Flipping its extended flag moves it to the other view.
    pub fn update_description<F>(&mut self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Description),
    {
        if !self.all_descriptions.update(id, f) {
            return false;
        }
        let Some(updated) = self.all_descriptions.find(id).cloned() else {
            return false;
        };

        let view = self.view_mut(updated.is_extended);
        if view.contains(id) {
            view.update(id, |copy| *copy = updated);
        } else {
            self.view_mut(!updated.is_extended).remove(id);
            self.route_into_view(updated);
        }
        true
    }

    /// Reorder a description in the full collection
    pub fn move_description(&mut self, from: usize, to: usize) -> bool {
        let Some(description) = self.all_descriptions.get(from).cloned() else {
            return false;
        };
        if !self.all_descriptions.move_item(from, to) {
            return false;
        }
        self.view_mut(description.is_extended).remove(description.id);
        self.route_into_view(description);
        true
    }

    /// Append a space, returning its index
    pub fn add_space(&mut self, space: Space) -> usize {
        self.spaces.push(space)
    }

    /// Insert a space at `at`, returning its index
    pub fn insert_space(&mut self, at: usize, space: Space) -> usize {
        self.spaces.insert(at, space)
    }

    /// Append several spaces in order
    pub fn extend_spaces(&mut self, spaces: Vec<Space>) {
        for space in spaces {
            self.spaces.push(space);
        }
    }

    /// Add detected spaces that do not overlap any existing one, keeping
    /// the collection ordered by start time. Returns the added spaces.
    pub fn merge_spaces(&mut self, detected: Vec<Space>) -> Vec<Space> {
        let fresh: Vec<Space> = detected
            .into_iter()
            .filter(|space| !self.spaces.iter().any(|existing| existing.overlaps(space)))
            .collect();
        let ids: Vec<Uuid> = fresh.iter().map(|space| space.id).collect();

        self.extend_spaces(fresh);
        self.spaces.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));

        ids.into_iter()
            .filter_map(|id| self.spaces.find(id).cloned())
            .collect()
    }

    /// Replace all spaces
    pub fn set_spaces(&mut self, spaces: Vec<Space>) {
        self.spaces.clear();
        self.extend_spaces(spaces);
    }

    /// Remove a space; the returned copy carries its former index
    pub fn remove_space(&mut self, id: Uuid) -> Option<Space> {
        let removed = self.spaces.remove(id)?;
        debug!("Removed space {} at {}", id, removed.index);
        Some(removed)
    }

    pub fn update_space<F>(&mut self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Space),
    {
        self.spaces.update(id, f)
    }

    /// Empty all four collections
    pub fn clear(&mut self) {
        self.all_descriptions.clear();
        self.regular_descriptions.clear();
        self.extended_descriptions.clear();
        self.spaces.clear();
    }

    fn view_mut(&mut self, extended: bool) -> &mut IndexedCollection<Description> {
        if extended {
            &mut self.extended_descriptions
        } else {
            &mut self.regular_descriptions
        }
    }

    /// Insert the view copy after every same-kind item that precedes it in
    /// the full collection.
    fn route_into_view(&mut self, description: Description) {
        let extended = description.is_extended;
        let id = description.id;
        let at = self
            .all_descriptions
            .iter()
            .take_while(|other| other.id != id)
            .filter(|other| other.is_extended == extended)
            .count();
        self.view_mut(extended).insert(at, description);
    }
}
