//! Allocation sets.
//!
//! An [`AllocSet`] is an unordered collection of allocations keyed by ID.
//! It is the substrate the classifier partitions and the name index is
//! seeded from. Iteration follows ID order, which keeps every derived
//! result deterministic for a given snapshot.

use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap};

use convoy_id::AllocId;

use crate::classify::{TaintedClassifier, TaintedPartition};
use crate::error::{ReconcileError, ReconcileResult};
use crate::model::Allocation;
use crate::node_view::NodeLookup;

/// A set of allocations keyed by allocation ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocSet {
    allocs: BTreeMap<AllocId, Allocation>,
}

impl AllocSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an allocation, returning any previous one with the same ID.
    pub fn insert(&mut self, alloc: Allocation) -> Option<Allocation> {
        self.allocs.insert(alloc.id, alloc)
    }

    pub fn remove(&mut self, id: &AllocId) -> Option<Allocation> {
        self.allocs.remove(id)
    }

    pub fn get(&self, id: &AllocId) -> Option<&Allocation> {
        self.allocs.get(id)
    }

    pub fn contains(&self, id: &AllocId) -> bool {
        self.allocs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.allocs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocs.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, AllocId, Allocation> {
        self.allocs.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AllocId> + '_ {
        self.allocs.keys()
    }

    /// All allocations in `self` and in any of `others`.
    pub fn union(&self, others: &[&AllocSet]) -> AllocSet {
        let mut out = self.clone();
        for other in others {
            out.extend(other.iter().cloned());
        }
        out
    }

    /// Allocations in `self` that appear in none of `others`.
    pub fn difference(&self, others: &[&AllocSet]) -> AllocSet {
        self.iter()
            .filter(|a| !others.iter().any(|o| o.contains(&a.id)))
            .cloned()
            .collect()
    }

    /// The non-terminal subset.
    pub fn filter_by_terminal(&self) -> AllocSet {
        self.iter().filter(|a| !a.is_terminal()).cloned().collect()
    }

    pub fn filter_by_task_group(&self, task_group: &str) -> AllocSet {
        self.iter()
            .filter(|a| a.task_group == task_group)
            .cloned()
            .collect()
    }

    pub fn group_by_task_group(&self) -> BTreeMap<String, AllocSet> {
        let mut groups: BTreeMap<String, AllocSet> = BTreeMap::new();
        for alloc in self.iter() {
            groups
                .entry(alloc.task_group.clone())
                .or_default()
                .insert(alloc.clone());
        }
        groups
    }

    pub fn name_set(&self) -> BTreeSet<String> {
        self.iter().map(|a| a.name.clone()).collect()
    }

    /// Allocations ordered by index, ties broken by ID.
    pub fn name_order(&self) -> ReconcileResult<Vec<(u32, &Allocation)>> {
        let mut ordered = self
            .iter()
            .map(|a| a.index().map(|i| (i, a)))
            .collect::<ReconcileResult<Vec<_>>>()?;
        ordered.sort_by_key(|(i, a)| (*i, a.id));
        Ok(ordered)
    }

    /// Check that no two live allocations of the same job and task group
    /// share an index.
    pub fn check_unique_indices(&self) -> ReconcileResult<()> {
        let mut seen: HashMap<(&str, &str, u32), AllocId> = HashMap::new();
        for alloc in self.iter().filter(|a| !a.is_terminal()) {
            let index = alloc.index()?;
            let key = (alloc.job_id.as_str(), alloc.task_group.as_str(), index);
            if let Some(first) = seen.insert(key, alloc.id) {
                return Err(ReconcileError::DuplicateIndex {
                    task_group: alloc.task_group.clone(),
                    index,
                    first,
                    second: alloc.id,
                });
            }
        }
        Ok(())
    }

    /// Partition the set by node health using the default classifier.
    ///
    /// See [`TaintedClassifier`] for the rules.
    pub fn filter_by_tainted_and_unknown<N>(&self, nodes: &N) -> TaintedPartition
    where
        N: NodeLookup + ?Sized,
    {
        TaintedClassifier::default().partition(self, nodes)
    }
}

impl FromIterator<Allocation> for AllocSet {
    fn from_iter<I: IntoIterator<Item = Allocation>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Allocation> for AllocSet {
    fn extend<I: IntoIterator<Item = Allocation>>(&mut self, iter: I) {
        for alloc in iter {
            self.insert(alloc);
        }
    }
}

impl IntoIterator for AllocSet {
    type Item = Allocation;
    type IntoIter = btree_map::IntoValues<AllocId, Allocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.allocs.into_values()
    }
}

impl<'a> IntoIterator for &'a AllocSet {
    type Item = &'a Allocation;
    type IntoIter = btree_map::Values<'a, AllocId, Allocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.allocs.values()
    }
}
