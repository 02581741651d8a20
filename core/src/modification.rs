use std::collections::HashSet;

use crate::model::EntityColumnModel;

/// The change-detection seam: reports which columns of an entity differ from
/// its last persisted state. Systems without change tracking can skip this
/// and build an all-columns [`ModificationSet`] instead.
pub trait ModificationTracker<T> {
    fn modified_columns(&self, entity: &T) -> HashSet<String>;
}

/// Per-entity changed-column sets, positionally aligned with the entity
/// collection handed to the engine. Entry `i` belongs to entity `i`; the
/// engine slices it batch by batch in lock-step with the entities.
#[derive(Debug, Clone, Default)]
pub struct ModificationSet {
    entries: Vec<HashSet<String>>,
}

impl ModificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, columns: impl IntoIterator<Item = impl Into<String>>) {
        self.entries.push(columns.into_iter().map(Into::into).collect());
    }

    pub fn from_tracker<T>(entities: &[T], tracker: &impl ModificationTracker<T>) -> Self {
        Self { entries: entities.iter().map(|entity| tracker.modified_columns(entity)).collect() }
    }

    /// Marks every column of the model modified for `count` entities, for
    /// callers that have no change tracking and want a full rewrite.
    pub fn all_columns<T>(model: &EntityColumnModel<T>, count: usize) -> Self {
        let columns: HashSet<String> =
            model.columns().iter().map(|column| column.name().to_string()).collect();
        Self { entries: vec![columns; count] }
    }

    /// Marks no column modified for `count` entities.
    pub fn unmodified(count: usize) -> Self {
        Self { entries: vec![HashSet::new(); count] }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_modified(&self, index: usize, column: &str) -> bool {
        self.entries.get(index).is_some_and(|columns| columns.contains(column))
    }

    pub(crate) fn batch(&self, start: usize, len: usize) -> &[HashSet<String>] {
        &self.entries[start..start + len]
    }
}
