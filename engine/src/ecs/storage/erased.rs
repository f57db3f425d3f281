use std::any::Any;

use log::warn;

use crate::ecs::{
    entity::Entity,
    error::{Error, Result},
    storage::{ComponentStorage, DEFAULT_CAPACITY, SparseSet},
};

/// Component storage for layouts only known at runtime.
///
/// Each component is an opaque record of `component_size` bytes packed into one byte buffer,
/// ordered like the dense entity list. Grouping, removal and shrinking behave exactly as in
/// [`crate::ecs::ComponentArray`]; only the element type differs.
#[derive(Debug, Clone)]
pub struct ErasedComponentArray {
    set: SparseSet,
    data: Vec<u8>,
    component_size: usize,
}

impl ErasedComponentArray {
    /// Create an array of `component_size`-byte records sized for `capacity` entities.
    pub fn new(component_size: usize, capacity: usize) -> Result<Self> {
        if component_size == 0 {
            return Err(Error::InvalidArgument("component size must be non-zero"));
        }
        let set = SparseSet::with_capacity(capacity);
        let data = Vec::with_capacity(set.initial_capacity() * component_size);
        Ok(Self {
            set,
            data,
            component_size,
        })
    }

    /// Create an array sized for [`DEFAULT_CAPACITY`] entities.
    #[inline]
    pub fn with_component_size(component_size: usize) -> Result<Self> {
        Self::new(component_size, DEFAULT_CAPACITY)
    }

    #[inline]
    pub fn component_size(&self) -> usize {
        self.component_size
    }

    /// Insert the raw bytes of a component for `entity`.
    ///
    /// Inserting for an entity that already has a component keeps the existing bytes and logs a
    /// warning.
    pub fn insert_raw(&mut self, entity: Entity, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.component_size {
            return Err(Error::LayoutMismatch {
                expected: self.component_size,
                actual: bytes.len(),
            });
        }
        if self.set.contains(entity) {
            warn!("entity {entity} already has this runtime component, keeping the existing value");
            return Ok(());
        }

        self.set.push(entity)?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn remove(&mut self, entity: Entity) -> Result<()> {
        let (data, size) = (&mut self.data, self.component_size);
        self.set
            .swap_remove(entity, |a, b| swap_records(data, size, a, b))?;
        self.data.truncate(self.set.len() * self.component_size);
        if let Some(target) = self.set.shrink() {
            self.data.shrink_to(target * self.component_size);
        }
        Ok(())
    }

    pub fn get_raw(&self, entity: Entity) -> Result<&[u8]> {
        let index = self.set.require(entity)?;
        Ok(self.record(index))
    }

    pub fn get_raw_mut(&mut self, entity: Entity) -> Result<&mut [u8]> {
        let index = self.set.require(entity)?;
        let start = index * self.component_size;
        Ok(&mut self.data[start..start + self.component_size])
    }

    pub fn try_get_raw(&self, entity: Entity) -> Option<&[u8]> {
        self.set.index_of(entity).map(|index| self.record(index))
    }

    /// Every record in dense order, back to back.
    #[inline]
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn has_component(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    #[inline]
    pub fn group_size(&self) -> usize {
        self.set.group_size()
    }

    /// Number of records that fit without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity() / self.component_size
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.set.entities()
    }

    pub fn add_to_group(&mut self, entity: Entity) -> Result<()> {
        let (data, size) = (&mut self.data, self.component_size);
        self.set
            .add_to_group(entity, |a, b| swap_records(data, size, a, b))?;
        Ok(())
    }

    pub fn remove_from_group(&mut self, entity: Entity) -> Result<()> {
        let (data, size) = (&mut self.data, self.component_size);
        self.set
            .remove_from_group(entity, |a, b| swap_records(data, size, a, b))?;
        Ok(())
    }

    pub fn reorder_group(&mut self, order: &[Entity]) -> Result<()> {
        let sources = self.set.reorder_sources(order)?;

        let size = self.component_size;
        let mut reordered = Vec::with_capacity(sources.len() * size);
        for source in sources {
            reordered.extend_from_slice(self.record(source));
        }
        self.data[..reordered.len()].copy_from_slice(&reordered);

        self.set.apply_order(order);
        Ok(())
    }

    /// Copy the record of `source` onto `destination`.
    pub fn duplicate_component(&mut self, source: Entity, destination: Entity) -> Result<()> {
        let bytes = self.get_raw(source)?.to_vec();
        self.insert_raw(destination, &bytes)
    }

    pub fn memory_usage(&self) -> usize {
        self.set.memory_usage() + self.data.capacity()
    }

    #[inline]
    fn record(&self, index: usize) -> &[u8] {
        let start = index * self.component_size;
        &self.data[start..start + self.component_size]
    }
}

/// Swap the `size`-byte records at indices `a` and `b`.
fn swap_records(data: &mut [u8], size: usize, a: usize, b: usize) {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let (head, tail) = data.split_at_mut(high * size);
    head[low * size..(low + 1) * size].swap_with_slice(&mut tail[..size]);
}

impl ComponentStorage for ErasedComponentArray {
    #[inline]
    fn has_component(&self, entity: Entity) -> bool {
        ErasedComponentArray::has_component(self, entity)
    }

    #[inline]
    fn len(&self) -> usize {
        ErasedComponentArray::len(self)
    }

    #[inline]
    fn group_size(&self) -> usize {
        ErasedComponentArray::group_size(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        ErasedComponentArray::capacity(self)
    }

    #[inline]
    fn entities(&self) -> &[Entity] {
        ErasedComponentArray::entities(self)
    }

    fn entity_at(&self, index: usize) -> Result<Entity> {
        self.set.entity_at(index)
    }

    fn remove(&mut self, entity: Entity) -> Result<()> {
        ErasedComponentArray::remove(self, entity)
    }

    fn entity_destroyed(&mut self, entity: Entity) {
        if self.set.contains(entity)
            && let Err(error) = ErasedComponentArray::remove(self, entity)
        {
            warn!("failed to drop runtime component of {entity}: {error}");
        }
    }

    fn add_to_group(&mut self, entity: Entity) -> Result<()> {
        ErasedComponentArray::add_to_group(self, entity)
    }

    fn remove_from_group(&mut self, entity: Entity) -> Result<()> {
        ErasedComponentArray::remove_from_group(self, entity)
    }

    fn reorder_group(&mut self, order: &[Entity]) -> Result<()> {
        ErasedComponentArray::reorder_group(self, order)
    }

    fn memory_usage(&self) -> usize {
        ErasedComponentArray::memory_usage(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
