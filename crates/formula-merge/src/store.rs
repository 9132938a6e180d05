use std::collections::HashMap;

use crate::error::{MergeError, MergeResult};
use crate::join::{join, JoinSpec, RelationSource};
use crate::model::{Relation, RelationId};
use crate::options::JoinOptions;
use crate::seed::seed_relations;

/// The working set of relations for a session.
///
/// Relations keep their insertion order. Nothing in the store is mutated or removed once added;
/// joins only ever append.
#[derive(Clone, Debug, Default)]
pub struct RelationStore {
    relations: Vec<Relation>,
    index: HashMap<RelationId, usize>,
    merged_counter: u64,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the demo datasets.
    pub fn with_seed_relations() -> Self {
        let mut store = Self::new();
        for relation in seed_relations() {
            store.append(relation);
        }
        store
    }

    pub fn from_relations(relations: impl IntoIterator<Item = Relation>) -> MergeResult<Self> {
        let mut store = Self::new();
        for relation in relations {
            store.insert(relation)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, relation: Relation) -> MergeResult<()> {
        if self.index.contains_key(relation.id()) {
            return Err(MergeError::DuplicateRelation(relation.id().clone()));
        }
        self.append(relation);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Relation> {
        self.index.get(id).map(|&idx| &self.relations[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Relation> {
        self.relations.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RelationId> + '_ {
        self.relations.iter().map(Relation::id)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Next id for a merged relation: `merged_{n}` with `n` strictly increasing.
    ///
    /// Ids already present are skipped, and a number handed out once is never handed out again,
    /// even if the join that requested it failed.
    pub fn next_merged_id(&mut self) -> RelationId {
        loop {
            self.merged_counter += 1;
            let candidate = format!("merged_{}", self.merged_counter);
            if !self.contains(&candidate) {
                return RelationId::new(candidate);
            }
        }
    }

    /// Join two relations of this store and append the result under a fresh id.
    ///
    /// On error the store is left unchanged (apart from the consumed id number).
    pub fn merge(&mut self, spec: &JoinSpec, options: &JoinOptions) -> MergeResult<RelationId> {
        let id = self.next_merged_id();
        let merged = join(&*self, spec, id.clone(), options)?;
        log::debug!(
            "appending merged relation {id} ({}) with {} rows",
            merged.name(),
            merged.row_count()
        );
        self.append(merged);
        Ok(id)
    }

    fn append(&mut self, relation: Relation) {
        self.index
            .insert(relation.id().clone(), self.relations.len());
        self.relations.push(relation);
    }
}

impl RelationSource for RelationStore {
    fn relation(&self, id: &RelationId) -> Option<&Relation> {
        self.get(id.as_str())
    }
}

impl<'a> IntoIterator for &'a RelationStore {
    type Item = &'a Relation;
    type IntoIter = std::slice::Iter<'a, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
