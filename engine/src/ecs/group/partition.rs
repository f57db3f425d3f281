use std::any::{Any, TypeId};

use crate::ecs::{
    entity::Entity,
    error::Result,
    group::{
        Group,
        set::{ComponentSet, OwnedSet},
    },
};

/// A contiguous run of grouped entities sharing one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<K> {
    /// Key shared by every entity in the run.
    pub key: K,
    /// Index of the first entity of the run in group order.
    pub start: usize,
    /// Number of entities in the run.
    pub count: usize,
}

/// Identifies a cached partitioning of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PartitionId {
    /// Partitioned by a key extracted from one component.
    Field {
        component: TypeId,
        key: TypeId,
    },
    /// Partitioned by a caller-named entity key function.
    Named(String),
}

/// Cached partitions of one [`PartitionId`].
pub(crate) struct PartitionCache {
    pub(crate) dirty: bool,
    pub(crate) partitions: Box<dyn Any + Send + Sync>,
}

/// A partitioned view over a group.
///
/// The group's entities are laid out so that each partition is a contiguous range, which lets
/// [`Self::each`] walk one partition without touching the others.
pub struct PartitionView<'g, 'w, O: OwnedSet, N: ComponentSet, K> {
    group: &'g mut Group<'w, O, N>,
    partitions: Vec<Partition<K>>,
}

impl<'g, 'w, O: OwnedSet, N: ComponentSet, K: PartialEq> PartitionView<'g, 'w, O, N, K> {
    pub(crate) fn new(group: &'g mut Group<'w, O, N>, partitions: Vec<Partition<K>>) -> Self {
        Self { group, partitions }
    }

    /// The partition holding `key`, if any entity has it.
    pub fn partition(&self, key: &K) -> Option<&Partition<K>> {
        self.partitions.iter().find(|partition| partition.key == *key)
    }

    /// All partitions in layout order.
    #[inline]
    pub fn partitions(&self) -> &[Partition<K>] {
        &self.partitions
    }

    /// Keys of all partitions in layout order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.partitions
            .iter()
            .map(|partition| partition.key.clone())
            .collect()
    }

    /// Number of partitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Entities of the partition holding `key`. Empty for unknown keys.
    pub fn entities(&self, key: &K) -> &[Entity] {
        match self.partition(key) {
            Some(partition) => {
                &self.group.entities()[partition.start..partition.start + partition.count]
            }
            None => &[],
        }
    }

    /// Call `f` for every entity of the partition holding `key`. Unknown keys are a no-op.
    pub fn each<F>(&mut self, key: &K, f: F) -> Result<()>
    where
        F: for<'a> FnMut(Entity, O::ItemMut<'a>, N::Item<'a>),
    {
        let Some(partition) = self.partition(key) else {
            return Ok(());
        };
        let (start, count) = (partition.start, partition.count);
        self.group.each_in_range(start, count, f)
    }

    /// The underlying group.
    #[inline]
    pub fn group(&mut self) -> &mut Group<'w, O, N> {
        &mut *self.group
    }
}
