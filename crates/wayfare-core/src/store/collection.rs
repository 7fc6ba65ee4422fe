// ── Normalized entity collection ──
//
// Insertion-ordered, id-keyed, immutable. `insert` builds a new value and
// never touches the one it was called on, so holders of an older snapshot
// keep seeing exactly what they had.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{Entity, EntityId};

/// An ordered set of entities keyed by id.
///
/// Ordering is first-seen order: merging a known id replaces the stored
/// snapshot in place, new ids go to the end. The ordering and the id map
/// are one `IndexMap`, so they cannot disagree.
pub struct Collection<T> {
    entries: Arc<IndexMap<EntityId, Arc<T>>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(IndexMap::new()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// Order-sensitive: two collections are equal when they list the same
/// entities in the same order.
impl<T: PartialEq> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materialize the ordered list (cheap `Arc` clones).
    pub fn get(&self) -> Vec<Arc<T>> {
        self.entries.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up one entity. Total over its input: a missing id, a blank id
    /// (`0`, `""`) and an unknown id all yield `None`.
    pub fn get_item(&self, id: Option<&EntityId>) -> Option<Arc<T>> {
        let id = id.filter(|id| !id.is_blank())?;
        self.entries.get(id).cloned()
    }

    /// `true` when both handles share storage, i.e. nothing was merged in
    /// between. Renderers use this to skip unchanged lists.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<T: Entity> Collection<T> {
    /// Merge a batch, returning the new collection.
    #[must_use]
    pub fn insert<I>(&self, batch: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut batch = batch.into_iter().peekable();
        if batch.peek().is_none() {
            return self.clone();
        }

        let mut entries = IndexMap::clone(&self.entries);
        for entity in batch {
            // IndexMap::insert keeps the slot of an existing key.
            entries.insert(entity.id().clone(), Arc::new(entity));
        }
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<T: Entity> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new().insert(iter)
    }
}
