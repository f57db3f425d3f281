use fixedbitset::FixedBitSet;

use crate::ecs::{
    entity::{Entity, MAX_ENTITIES},
    error::{Error, Result},
};

/// Marks a sparse slot with no dense entry.
const INVALID_INDEX: u32 = u32::MAX;

/// Entity bookkeeping shared by every component array.
///
/// `sparse[entity]` holds the entity's dense index, `dense[index]` holds the entity back. The
/// first `group_size` dense slots form the grouped region. The set never touches component data;
/// each mutating operation reports the dense slot swaps it performs through a callback so the
/// owning array can mirror them on its data.
#[derive(Debug, Clone)]
pub struct SparseSet {
    sparse: Vec<u32>,
    dense: Vec<Entity>,
    group_size: usize,
    initial_capacity: usize,
}

impl SparseSet {
    /// Create a set sized for `capacity` entities. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sparse: vec![INVALID_INDEX; capacity],
            dense: Vec::with_capacity(capacity),
            group_size: 0,
            initial_capacity: capacity,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    #[inline]
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Dense capacity currently reserved.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    #[inline]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// All entities in dense order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.dense
    }

    /// Entities in the grouped region.
    #[inline]
    pub fn grouped(&self) -> &[Entity] {
        &self.dense[..self.group_size]
    }

    #[inline]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        match self.sparse.get(entity.index()) {
            Some(&index) if index != INVALID_INDEX => Some(index as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index_of(entity).is_some()
    }

    #[inline]
    pub fn is_grouped(&self, entity: Entity) -> bool {
        self.index_of(entity)
            .is_some_and(|index| index < self.group_size)
    }

    pub fn entity_at(&self, index: usize) -> Result<Entity> {
        self.dense
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange(index))
    }

    /// Dense index of `entity`, or [`Error::ComponentNotFound`].
    #[inline]
    pub(crate) fn require(&self, entity: Entity) -> Result<usize> {
        self.index_of(entity)
            .ok_or(Error::ComponentNotFound(entity))
    }

    /// Append `entity` at the end of the dense array and return its index.
    ///
    /// The caller must have checked that the entity is not present yet.
    pub(crate) fn push(&mut self, entity: Entity) -> Result<usize> {
        if !entity.is_valid() {
            return Err(Error::OutOfRange(entity.index()));
        }
        if entity.index() >= self.sparse.len() {
            let mut new_len = self.sparse.len().max(1);
            while new_len <= entity.index() {
                new_len *= 2;
            }
            self.sparse
                .resize(new_len.min(MAX_ENTITIES as usize), INVALID_INDEX);
        }

        let index = self.dense.len();
        self.sparse[entity.index()] = index as u32;
        self.dense.push(entity);
        Ok(index)
    }

    /// Remove `entity`, moving it to the back of the dense array first.
    ///
    /// A grouped entity is first swapped to the end of the grouped region and the group shrinks
    /// by one; then it is swapped with the last element. On return the entity occupied the last
    /// slot, which the caller pops from its data.
    pub(crate) fn swap_remove(
        &mut self,
        entity: Entity,
        mut swap: impl FnMut(usize, usize),
    ) -> Result<()> {
        let mut index = self.require(entity)?;

        if index < self.group_size {
            let boundary = self.group_size - 1;
            self.swap(index, boundary, &mut swap);
            self.group_size -= 1;
            index = boundary;
        }

        let last = self.dense.len() - 1;
        self.swap(index, last, &mut swap);
        self.dense.pop();
        self.sparse[entity.index()] = INVALID_INDEX;
        Ok(())
    }

    /// Move `entity` into the grouped region. Returns `false` if it already was there.
    pub(crate) fn add_to_group(
        &mut self,
        entity: Entity,
        mut swap: impl FnMut(usize, usize),
    ) -> Result<bool> {
        let index = self.require(entity)?;
        if index < self.group_size {
            return Ok(false);
        }

        let boundary = self.group_size;
        self.swap(index, boundary, &mut swap);
        self.group_size += 1;
        Ok(true)
    }

    /// Move `entity` out of the grouped region. Returns `false` if it was not grouped.
    pub(crate) fn remove_from_group(
        &mut self,
        entity: Entity,
        mut swap: impl FnMut(usize, usize),
    ) -> Result<bool> {
        let index = self.require(entity)?;
        if index >= self.group_size {
            return Ok(false);
        }

        self.group_size -= 1;
        let boundary = self.group_size;
        self.swap(index, boundary, &mut swap);
        Ok(true)
    }

    /// Current dense index of each entity in `order`.
    ///
    /// `order` must list every grouped entity exactly once; nothing is modified when it does not.
    pub(crate) fn reorder_sources(&self, order: &[Entity]) -> Result<Vec<usize>> {
        if order.len() != self.group_size {
            return Err(Error::internal(format!(
                "reorder lists {} entities but the group holds {}",
                order.len(),
                self.group_size
            )));
        }

        let mut seen = FixedBitSet::with_capacity(self.group_size);
        order
            .iter()
            .map(|&entity| {
                let index = self
                    .index_of(entity)
                    .filter(|&index| index < self.group_size)
                    .ok_or_else(|| Error::internal(format!("entity {entity} is not grouped")))?;
                if seen.put(index) {
                    return Err(Error::internal(format!(
                        "entity {entity} listed twice in reorder"
                    )));
                }
                Ok(index)
            })
            .collect()
    }

    /// Rewrite the grouped region to follow `order`. Callers validate with
    /// [`Self::reorder_sources`] first.
    pub(crate) fn apply_order(&mut self, order: &[Entity]) {
        for (index, &entity) in order.iter().enumerate() {
            self.dense[index] = entity;
            self.sparse[entity.index()] = index as u32;
        }
    }

    /// Shrink the dense array once it is mostly empty.
    ///
    /// Returns the element capacity the owning array should shrink its data to, if any.
    pub(crate) fn shrink(&mut self) -> Option<usize> {
        let capacity = self.dense.capacity();
        if capacity > self.initial_capacity && self.dense.len() < capacity / 4 {
            let target = (self.dense.len() * 2).max(self.initial_capacity);
            self.dense.shrink_to(target);
            Some(target)
        } else {
            None
        }
    }

    /// Bytes reserved for the sparse and dense arrays.
    pub fn memory_usage(&self) -> usize {
        self.sparse.capacity() * size_of::<u32>() + self.dense.capacity() * size_of::<Entity>()
    }

    fn swap(&mut self, a: usize, b: usize, swap: &mut impl FnMut(usize, usize)) {
        if a == b {
            return;
        }
        self.dense.swap(a, b);
        self.sparse[self.dense[a].index()] = a as u32;
        self.sparse[self.dense[b].index()] = b as u32;
        swap(a, b);
    }
}
