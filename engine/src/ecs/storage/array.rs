use std::{
    any::{Any, type_name},
    fmt,
};

use log::warn;

use crate::ecs::{
    component::Component,
    entity::Entity,
    error::{Error, Result},
    storage::{ComponentStorage, DEFAULT_CAPACITY, SparseSet},
};

/// Dense storage for all components of type `T`.
///
/// Components are kept contiguous in a `Vec<T>` that mirrors the dense entity list of a
/// [`SparseSet`]. Lookup by entity is two array reads; iteration is a slice walk.
///
/// ```ignore
/// let mut positions = ComponentArray::<Position>::new();
/// positions.insert(Entity::new(3), Position { x: 1.0, y: 2.0 })?;
/// positions.get_mut(Entity::new(3))?.x += 1.0;
/// ```
pub struct ComponentArray<T> {
    set: SparseSet,
    data: Vec<T>,
}

impl<T: Component> Default for ComponentArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentArray<T> {
    /// Create an array sized for [`DEFAULT_CAPACITY`] entities.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an array sized for `capacity` entities. Zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let set = SparseSet::with_capacity(capacity);
        let data = Vec::with_capacity(set.initial_capacity());
        Self { set, data }
    }

    /// Insert a component for `entity`.
    ///
    /// Inserting for an entity that already has a component keeps the existing value and logs a
    /// warning.
    pub fn insert(&mut self, entity: Entity, component: T) -> Result<()> {
        if self.set.contains(entity) {
            warn!(
                "entity {entity} already has a {} component, keeping the existing value",
                type_name::<T>()
            );
            return Ok(());
        }

        self.set.push(entity)?;
        self.data.push(component);
        Ok(())
    }

    /// Insert many components, stopping at the first error.
    pub fn insert_batch(&mut self, components: impl IntoIterator<Item = (Entity, T)>) -> Result<()> {
        let components = components.into_iter();
        self.data.reserve(components.size_hint().0);
        for (entity, component) in components {
            self.insert(entity, component)?;
        }
        Ok(())
    }

    /// Remove and return the component of `entity`.
    pub fn remove(&mut self, entity: Entity) -> Result<T> {
        let data = &mut self.data;
        self.set.swap_remove(entity, |a, b| data.swap(a, b))?;
        let component = self
            .data
            .pop()
            .ok_or_else(|| Error::internal("component data shorter than its entity list"))?;
        self.shrink();
        Ok(component)
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Result<&T> {
        let index = self.set.require(entity)?;
        Ok(&self.data[index])
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T> {
        let index = self.set.require(entity)?;
        Ok(&mut self.data[index])
    }

    /// Component at a dense index.
    #[inline]
    pub fn get_at(&self, index: usize) -> Result<&T> {
        self.data.get(index).ok_or(Error::OutOfRange(index))
    }

    #[inline]
    pub fn get_at_mut(&mut self, index: usize) -> Result<&mut T> {
        self.data.get_mut(index).ok_or(Error::OutOfRange(index))
    }

    #[inline]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.set.index_of(entity).map(|index| &self.data[index])
    }

    #[inline]
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.set.index_of(entity).map(|index| &mut self.data[index])
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

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Entities in dense order, parallel to [`Self::components`].
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.set.entities()
    }

    #[inline]
    pub fn entity_at(&self, index: usize) -> Result<Entity> {
        self.set.entity_at(index)
    }

    /// All components in dense order.
    #[inline]
    pub fn components(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Entities of the grouped region.
    #[inline]
    pub fn grouped_entities(&self) -> &[Entity] {
        self.set.grouped()
    }

    /// Components of the grouped region.
    #[inline]
    pub fn grouped(&self) -> &[T] {
        &self.data[..self.set.group_size()]
    }

    #[inline]
    pub fn grouped_mut(&mut self) -> &mut [T] {
        let group_size = self.set.group_size();
        &mut self.data[..group_size]
    }

    /// Iterate `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.set.entities().iter().copied().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.set.entities().iter().copied().zip(self.data.iter_mut())
    }

    pub fn add_to_group(&mut self, entity: Entity) -> Result<()> {
        let data = &mut self.data;
        self.set.add_to_group(entity, |a, b| data.swap(a, b))?;
        Ok(())
    }

    pub fn remove_from_group(&mut self, entity: Entity) -> Result<()> {
        let data = &mut self.data;
        self.set.remove_from_group(entity, |a, b| data.swap(a, b))?;
        Ok(())
    }

    /// Rewrite the grouped region so that `order[i]` ends up at dense index `i`.
    ///
    /// Values are moved through a temporary buffer; the rest of the array is untouched.
    pub fn reorder_group(&mut self, order: &[Entity]) -> Result<()> {
        let sources = self.set.reorder_sources(order)?;

        let group_size = order.len();
        let mut taken: Vec<Option<T>> = self.data.drain(..group_size).map(Some).collect();
        let reordered: Vec<T> = sources
            .into_iter()
            .filter_map(|source| taken[source].take())
            .collect();
        self.data.splice(0..0, reordered);

        self.set.apply_order(order);
        Ok(())
    }

    /// Bytes reserved by the sparse map, entity list and component data.
    pub fn memory_usage(&self) -> usize {
        self.set.memory_usage() + self.data.capacity() * size_of::<T>()
    }

    fn shrink(&mut self) {
        if let Some(target) = self.set.shrink() {
            self.data.shrink_to(target);
        }
    }
}

impl<T: Component + Clone> ComponentArray<T> {
    /// Copy the component of `source` onto `destination`.
    pub fn duplicate_component(&mut self, source: Entity, destination: Entity) -> Result<()> {
        let component = self.get(source)?.clone();
        self.insert(destination, component)
    }
}

impl<T> fmt::Debug for ComponentArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentArray")
            .field("type", &type_name::<T>())
            .field("len", &self.set.len())
            .field("group_size", &self.set.group_size())
            .finish()
    }
}

impl<T: Component> ComponentStorage for ComponentArray<T> {
    #[inline]
    fn has_component(&self, entity: Entity) -> bool {
        ComponentArray::has_component(self, entity)
    }

    #[inline]
    fn len(&self) -> usize {
        ComponentArray::len(self)
    }

    #[inline]
    fn group_size(&self) -> usize {
        ComponentArray::group_size(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        ComponentArray::capacity(self)
    }

    #[inline]
    fn entities(&self) -> &[Entity] {
        ComponentArray::entities(self)
    }

    #[inline]
    fn entity_at(&self, index: usize) -> Result<Entity> {
        ComponentArray::entity_at(self, index)
    }

    fn remove(&mut self, entity: Entity) -> Result<()> {
        ComponentArray::remove(self, entity).map(drop)
    }

    fn entity_destroyed(&mut self, entity: Entity) {
        if self.set.contains(entity)
            && let Err(error) = ComponentArray::remove(self, entity)
        {
            warn!("failed to drop {} of {entity}: {error}", type_name::<T>());
        }
    }

    fn add_to_group(&mut self, entity: Entity) -> Result<()> {
        ComponentArray::add_to_group(self, entity)
    }

    fn remove_from_group(&mut self, entity: Entity) -> Result<()> {
        ComponentArray::remove_from_group(self, entity)
    }

    fn reorder_group(&mut self, order: &[Entity]) -> Result<()> {
        ComponentArray::reorder_group(self, order)
    }

    fn memory_usage(&self) -> usize {
        ComponentArray::memory_usage(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
