//! The World ties entity lifecycles to component storage.
//!
//! A `World` hands out entity ids through an [`Allocator`] and keeps their components in a
//! [`ComponentManager`]. Destroying an entity drops every component it holds, takes it out of
//! every group and recycles its id. The world also holds [`Unique`] values, one per type, that
//! belong to no entity.
//!
//! # Example
//!
//! ```ignore
//! use sparse_ecs::ecs::World;
//!
//! let mut world = World::new();
//! world.register_component::<Position>()?;
//! world.register_component::<Velocity>()?;
//!
//! let entity = world.create_entity()?;
//! world.add_component(entity, Position { x: 0.0, y: 0.0 })?;
//! world.add_component(entity, Velocity { dx: 1.0, dy: 0.0 })?;
//!
//! world
//!     .register_group::<(Position, Velocity), ()>()?
//!     .each(|_, (position, velocity), ()| position.x += velocity.dx)?;
//!
//! world.destroy_entity(entity)?;
//! ```

use std::{any::type_name, sync::Arc};

use fixedbitset::FixedBitSet;

use crate::ecs::{
    component::{Component, ComponentType, Signature, TypeRegistry},
    entity::{Allocator, Entity},
    error::{Error, Result},
    group::{ComponentSet, Group, OwnedSet},
    manager::{ComponentManager, Config},
    storage::Uniques,
    unique::Unique,
};

/// Entities plus their components.
pub struct World {
    /// Hands out and recycles entity ids.
    entities: Allocator,

    /// Which ids are currently handed out.
    alive: FixedBitSet,

    /// Component storage and groups.
    components: ComponentManager,

    /// Singletons, one per type.
    uniques: Uniques,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::from_manager(ComponentManager::new())
    }

    /// Create a world assigning component ids through a shared registry.
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self::from_manager(ComponentManager::with_registry(registry))
    }

    /// Create a world whose component arrays use `config`.
    pub fn with_config(config: Config) -> Self {
        Self::from_manager(ComponentManager::new().with_config(config))
    }

    fn from_manager(components: ComponentManager) -> Self {
        Self {
            entities: Allocator::new(),
            alive: FixedBitSet::new(),
            components,
            uniques: Uniques::new(),
        }
    }

    #[inline]
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    #[inline]
    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    /// Create an entity with no components.
    pub fn create_entity(&mut self) -> Result<Entity> {
        let entity = self.entities.alloc()?;
        self.mark_alive(entity);
        Ok(entity)
    }

    /// Create `count` entities, or none if the id space runs out.
    pub fn create_entities(&mut self, count: usize) -> Result<Vec<Entity>> {
        let entities = self.entities.alloc_many(count)?;
        for &entity in &entities {
            self.mark_alive(entity);
        }
        Ok(entities)
    }

    /// Drop every component of `entity` and recycle its id.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<()> {
        self.ensure_alive(entity)?;
        self.components.entity_destroyed(entity)?;
        self.alive.set(entity.index(), false);
        self.entities.free(entity);
        Ok(())
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(entity.index())
    }

    /// Number of entities currently alive.
    #[inline]
    pub fn living(&self) -> u32 {
        self.entities.living()
    }

    #[inline]
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentType> {
        self.components.register_component::<T>()
    }

    #[inline]
    pub fn register_dynamic_component(&mut self, name: &str, size: usize) -> Result<ComponentType> {
        self.components.register_dynamic_component(name, size)
    }

    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        self.ensure_alive(entity)?;
        self.components.add_component(entity, component)
    }

    pub fn add_raw_component(&mut self, entity: Entity, ty: ComponentType, bytes: &[u8]) -> Result<()> {
        self.ensure_alive(entity)?;
        self.components.add_raw_component(entity, ty, bytes)
    }

    #[inline]
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T> {
        self.components.remove_component::<T>(entity)
    }

    #[inline]
    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool> {
        self.components.try_remove_component::<T>(entity)
    }

    #[inline]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.components.get_component(entity)
    }

    #[inline]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.components.get_component_mut(entity)
    }

    #[inline]
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.try_get_component(entity)
    }

    #[inline]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.has_component::<T>(entity)
    }

    #[inline]
    pub fn signature(&self, entity: Entity) -> Signature {
        self.components.signature(entity)
    }

    /// Entities holding every component in `required` and none in `excluded`.
    #[inline]
    pub fn entities_matching(&self, required: &Signature, excluded: &Signature) -> Vec<Entity> {
        self.components.entities_matching(required, excluded)
    }

    /// Store the unique value of type `U`. Fails if one is already stored.
    pub fn register_unique<U: Unique>(&mut self, value: U) -> Result<()> {
        if self.uniques.contains::<U>() {
            return Err(Error::UniqueAlreadyRegistered(type_name::<U>()));
        }
        self.uniques.insert(value);
        Ok(())
    }

    pub fn get_unique<U: Unique>(&self) -> Result<&U> {
        self.uniques
            .get::<U>()
            .ok_or(Error::UniqueNotRegistered(type_name::<U>()))
    }

    pub fn get_unique_mut<U: Unique>(&mut self) -> Result<&mut U> {
        self.uniques
            .get_mut::<U>()
            .ok_or(Error::UniqueNotRegistered(type_name::<U>()))
    }

    #[inline]
    pub fn has_unique<U: Unique>(&self) -> bool {
        self.uniques.contains::<U>()
    }

    /// Take the unique value of type `U` out of the world.
    pub fn remove_unique<U: Unique>(&mut self) -> Result<U> {
        self.uniques
            .remove::<U>()
            .ok_or(Error::UniqueNotRegistered(type_name::<U>()))
    }

    #[inline]
    pub fn register_group<O: OwnedSet, N: ComponentSet>(&mut self) -> Result<Group<'_, O, N>> {
        self.components.register_group::<O, N>()
    }

    #[inline]
    pub fn group<O: OwnedSet, N: ComponentSet>(&mut self) -> Result<Group<'_, O, N>> {
        self.components.group::<O, N>()
    }

    fn mark_alive(&mut self, entity: Entity) {
        self.alive.grow(entity.index() + 1);
        self.alive.insert(entity.index());
    }

    fn ensure_alive(&self, entity: Entity) -> Result<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(Error::EntityNotAlive(entity))
        }
    }
}
