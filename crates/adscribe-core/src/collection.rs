//! Observable ordered collection that keeps item indices in sync

use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::types::Indexed;

/// Capacity of the change channel per collection
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Structural or content change of an [`IndexedCollection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionChange {
    /// Item inserted at `index`
    Inserted { index: usize, id: Uuid },
    /// Item removed from `index`
    Removed { index: usize, id: Uuid },
    /// Item moved between positions
    Moved { from: usize, to: usize, id: Uuid },
    /// Item content changed in place
    Updated { index: usize, id: Uuid },
    /// All items removed
    Cleared,
}

/// Ordered collection whose members always carry their own position as index
#[derive(Debug)]
pub struct IndexedCollection<T> {
    items: Vec<T>,
    changes: broadcast::Sender<CollectionChange>,
}

impl<T: Indexed> IndexedCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            items: Vec::new(),
            changes,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Find an item by id
    pub fn find(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Position of an item by id
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    /// Append an item, returning its index
    pub fn push(&mut self, item: T) -> usize {
        let at = self.items.len();
        self.insert(at, item)
    }

    /// Insert an item at `at` (clamped to the end), returning its index
    pub fn insert(&mut self, at: usize, item: T) -> usize {
        let at = at.min(self.items.len());
        let id = item.id();
        self.items.insert(at, item);
        self.reindex_from(at);
        self.notify(CollectionChange::Inserted { index: at, id });
        at
    }

    /// Remove an item by id. The returned item still carries the index it had.
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        let at = self.position(id)?;
        Some(self.remove_at(at))
    }

    /// Remove the item at `at`
    ///
    /// Panics if `at` is out of bounds, like [`Vec::remove`].
    pub fn remove_at(&mut self, at: usize) -> T {
        let item = self.items.remove(at);
        self.reindex_from(at);
        self.notify(CollectionChange::Removed {
            index: at,
            id: item.id(),
        });
        item
    }

    /// Move the item at `from` to `to` (clamped to the last position)
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() {
            return false;
        }
        let to = to.min(self.items.len() - 1);
        if from == to {
            return true;
        }
        let item = self.items.remove(from);
        let id = item.id();
        self.items.insert(to, item);
        self.reindex_from(from.min(to));
        self.notify(CollectionChange::Moved { from, to, id });
        true
    }

    /// Mutate an item in place. Identity and index are restored afterwards.
    pub fn update<F>(&mut self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(at) = self.position(id) else {
            return false;
        };
        let item = &mut self.items[at];
        f(item);
        if item.id() != id {
            warn!("Ignoring id change of item {} at {}", id, at);
            item.set_id(id);
        }
        item.set_index(at);
        self.notify(CollectionChange::Updated { index: at, id });
        true
    }

    /// Remove every item
    pub fn clear(&mut self) {
        self.items.clear();
        self.notify(CollectionChange::Cleared);
    }

    /// Sort with `compare`, reindexing afterwards
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        let before: Vec<Uuid> = self.items.iter().map(Indexed::id).collect();
        self.items.sort_by(|a, b| compare(a, b));
        self.reindex_from(0);
        for (to, item) in self.items.iter().enumerate() {
            let id = item.id();
            if let Some(from) = before.iter().position(|other| *other == id) {
                if from != to {
                    self.notify(CollectionChange::Moved { from, to, id });
                }
            }
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, item) in self.items.iter_mut().enumerate().skip(start) {
            item.set_index(index);
        }
    }

    fn notify(&self, change: CollectionChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }
}

impl<T: Indexed + Clone> IndexedCollection<T> {
    /// Snapshot of the current items
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Indexed> Default for IndexedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a IndexedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Space;

    fn assert_indices_match_positions(collection: &IndexedCollection<Space>) {
        for (position, space) in collection.iter().enumerate() {
            assert_eq!(space.index, position);
        }
    }

    fn collection_of(count: usize) -> IndexedCollection<Space> {
        let mut collection = IndexedCollection::new();
        for i in 0..count {
            let start = i as f64 * 1000.0;
            collection.push(Space::new(start, start + 500.0));
        }
        collection
    }

    #[test]
    fn test_push_assigns_positions() {
        let collection = collection_of(4);
        assert_eq!(collection.len(), 4);
        assert_indices_match_positions(&collection);
    }

    #[test]
    fn test_insert_and_remove_reindex() {
        let mut collection = collection_of(5);

        let removed = collection.remove_at(1);
        assert_eq!(removed.index, 1);
        assert_indices_match_positions(&collection);

        let at = collection.insert(0, removed.clone());
        assert_eq!(at, 0);
        assert_eq!(collection.get(0).unwrap().id, removed.id);
        assert_indices_match_positions(&collection);

        let clamped = collection.insert(99, Space::new(9000.0, 9100.0));
        assert_eq!(clamped, 5);
        assert_indices_match_positions(&collection);
    }

    #[test]
    fn test_move_and_sort_reindex() {
        let mut collection = collection_of(4);
        let first = collection.get(0).unwrap().id;

        assert!(collection.move_item(0, 3));
        assert_eq!(collection.get(3).unwrap().id, first);
        assert_indices_match_positions(&collection);

        collection.sort_by(|a, b| a.start_ms.partial_cmp(&b.start_ms).unwrap());
        assert_eq!(collection.get(0).unwrap().id, first);
        assert_indices_match_positions(&collection);
    }

    #[test]
    fn test_update_keeps_index() {
        let mut collection = collection_of(3);
        let id = collection.get(2).unwrap().id;

        assert!(collection.update(id, |space| {
            space.index = 42;
            space.text = "Car passes".to_string();
        }));

        let space = collection.find(id).unwrap();
        assert_eq!(space.index, 2);
        assert_eq!(space.text, "Car passes");
    }

    #[test]
    fn test_update_cannot_change_identity() {
        let mut collection = collection_of(2);
        let id = collection.get(1).unwrap().id;
        let mut changes = collection.subscribe();

        assert!(collection.update(id, |space| space.id = Uuid::new_v4()));

        assert_eq!(collection.get(1).unwrap().id, id);
        assert!(collection.contains(id));
        assert_eq!(
            changes.try_recv().unwrap(),
            CollectionChange::Updated { index: 1, id }
        );
    }

    #[test]
    fn test_changes_are_broadcast() {
        let mut collection = IndexedCollection::new();
        let mut changes = collection.subscribe();

        let space = Space::new(0.0, 100.0);
        let id = space.id;
        collection.push(space);
        collection.remove(id);
        collection.clear();

        assert_eq!(
            changes.try_recv().unwrap(),
            CollectionChange::Inserted { index: 0, id }
        );
        assert_eq!(
            changes.try_recv().unwrap(),
            CollectionChange::Removed { index: 0, id }
        );
        assert_eq!(changes.try_recv().unwrap(), CollectionChange::Cleared);
    }
}
