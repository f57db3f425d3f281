//! The component manager: one storage per component type, per-entity signatures and the group
//! registry.

use std::{
    any::type_name,
    collections::HashMap,
    sync::Arc,
};

use log::{debug, warn};

use crate::ecs::{
    component::{Component, ComponentType, Signature, TypeRegistry},
    entity::Entity,
    error::{Error, Result},
    group::{ComponentSet, Group, GroupKey, GroupState, OwnedSet, StorageSlot},
    storage::{ComponentArray, ComponentStorage, DEFAULT_CAPACITY, ErasedComponentArray},
};

/// Settings applied to every array a [`ComponentManager`] allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of entities each array is sized for, and the floor it never shrinks below.
    pub initial_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Use `capacity` as the initial array size. Zero is treated as one.
    #[inline]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity.max(1);
        self
    }
}

/// Owns the component arrays and keeps groups in sync with component changes.
///
/// The manager tracks the [`Signature`] of every entity it has seen. Adding or removing a
/// component updates the signature and moves the entity into or out of each registered group
/// whose requirements it starts or stops meeting.
///
/// ```ignore
/// let mut manager = ComponentManager::new();
/// manager.register_component::<Position>()?;
/// manager.register_component::<Velocity>()?;
/// manager.add_component(entity, Position::default())?;
/// let mut group = manager.register_group::<(Position, Velocity), ()>()?;
/// ```
pub struct ComponentManager {
    registry: Arc<TypeRegistry>,
    config: Config,
    /// Storage per component type, indexed by [`ComponentType`].
    arrays: Vec<Option<Box<dyn ComponentStorage>>>,
    /// Signature per entity, indexed by entity id.
    signatures: Vec<Signature>,
    groups: Vec<GroupState>,
    group_index: HashMap<GroupKey, usize>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentManager {
    /// Create a manager with its own registry and the default config.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(TypeRegistry::new()))
    }

    /// Create a manager assigning ids through a shared registry.
    pub fn with_registry(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            config: Config::default(),
            arrays: Vec::new(),
            signatures: Vec::new(),
            groups: Vec::new(),
            group_index: HashMap::new(),
        }
    }

    /// Replace the config applied to arrays allocated from now on.
    #[inline]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Register `T` and allocate its array. Registering twice logs a warning and returns the
    /// existing id.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentType> {
        let ty = self.registry.register::<T>()?;
        let capacity = self.config.initial_capacity;
        let slot = self.slot(ty);
        if slot.is_some() {
            warn!("component {} is already registered", type_name::<T>());
            return Ok(ty);
        }

        *slot = Some(Box::new(ComponentArray::<T>::with_capacity(capacity)));
        debug!("registered component {} as {ty}", type_name::<T>());
        Ok(ty)
    }

    /// Register a runtime-defined layout of `size` bytes and allocate its byte array.
    pub fn register_dynamic_component(&mut self, name: &str, size: usize) -> Result<ComponentType> {
        let ty = self.registry.register_dynamic(name, size)?;
        let capacity = self.config.initial_capacity;
        let slot = self.slot(ty);
        if slot.is_some() {
            warn!("dynamic component {name} is already registered");
            return Ok(ty);
        }

        *slot = Some(Box::new(ErasedComponentArray::new(size, capacity)?));
        debug!("registered dynamic component {name} ({size} bytes) as {ty}");
        Ok(ty)
    }

    /// Id of `T`, provided this manager has an array for it.
    pub fn component_type<T: Component>(&self) -> Result<ComponentType> {
        self.registry
            .get::<T>()
            .filter(|ty| self.has_storage(*ty))
            .ok_or_else(|| Error::not_registered(type_name::<T>()))
    }

    /// Add a component to `entity` and join every group it now satisfies.
    ///
    /// Adding a component the entity already has keeps the existing value and logs a warning.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        let ty = self.component_type::<T>()?;
        let array = self.array_mut::<T>(ty)?;
        if array.has_component(entity) {
            warn!(
                "entity {entity} already has a {} component, keeping the existing value",
                type_name::<T>()
            );
            return Ok(());
        }

        array.insert(entity, component)?;
        self.component_added(entity, ty)
    }

    /// Add a raw record of a dynamic component type to `entity`.
    pub fn add_raw_component(&mut self, entity: Entity, ty: ComponentType, bytes: &[u8]) -> Result<()> {
        let array = self.erased_mut(ty)?;
        if array.has_component(entity) {
            warn!("entity {entity} already has a {ty} component, keeping the existing value");
            return Ok(());
        }

        array.insert_raw(entity, bytes)?;
        self.component_added(entity, ty)
    }

    /// Remove the `T` component of `entity`, leaving every group it no longer satisfies.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T> {
        let ty = self.component_type::<T>()?;
        if !self.storage(ty)?.has_component(entity) {
            return Err(Error::ComponentNotFound(entity));
        }

        self.component_removing(entity, ty)?;
        self.array_mut::<T>(ty)?.remove(entity)
    }

    /// Remove the component of type `ty` from `entity`. Works for typed and dynamic components.
    pub fn remove_component_by_type(&mut self, entity: Entity, ty: ComponentType) -> Result<()> {
        if !self.storage(ty)?.has_component(entity) {
            return Err(Error::ComponentNotFound(entity));
        }

        self.component_removing(entity, ty)?;
        self.storage_mut(ty)?.remove(entity)
    }

    /// Remove the `T` component of `entity` if it has one. Returns whether anything was removed.
    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<bool> {
        match self.remove_component::<T>(entity) {
            Ok(_) => Ok(true),
            Err(Error::ComponentNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.component_array::<T>()?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.component_array_mut::<T>()?.get_mut(entity)
    }

    /// The `T` component of `entity`, or `None` when it has none or `T` is not registered.
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.component_array::<T>().ok()?.try_get(entity)
    }

    pub fn try_get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.component_array_mut::<T>().ok()?.try_get_mut(entity)
    }

    /// Raw bytes of a dynamic component.
    pub fn get_raw_component(&self, entity: Entity, ty: ComponentType) -> Result<&[u8]> {
        self.erased(ty)?.get_raw(entity)
    }

    pub fn get_raw_component_mut(&mut self, entity: Entity, ty: ComponentType) -> Result<&mut [u8]> {
        self.erased_mut(ty)?.get_raw_mut(entity)
    }

    #[inline]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.component_array::<T>()
            .is_ok_and(|array| array.has_component(entity))
    }

    /// Copy the `T` component of `source` onto `destination`.
    pub fn duplicate_component<T: Component + Clone>(
        &mut self,
        source: Entity,
        destination: Entity,
    ) -> Result<()> {
        let ty = self.component_type::<T>()?;
        let array = self.array_mut::<T>(ty)?;
        if array.has_component(destination) {
            warn!(
                "entity {destination} already has a {} component, keeping the existing value",
                type_name::<T>()
            );
            return Ok(());
        }

        array.duplicate_component(source, destination)?;
        self.component_added(destination, ty)
    }

    /// The array holding every `T` component.
    pub fn component_array<T: Component>(&self) -> Result<&ComponentArray<T>> {
        let ty = self.component_type::<T>()?;
        self.storage(ty)?
            .as_any()
            .downcast_ref::<ComponentArray<T>>()
            .ok_or_else(|| mismatched::<T>(ty))
    }

    /// Mutable access to the array holding every `T` component.
    ///
    /// Meant for writing component values in place. Inserting or removing through the array
    /// bypasses signature tracking, so groups will not see the change.
    pub fn component_array_mut<T: Component>(&mut self) -> Result<&mut ComponentArray<T>> {
        let ty = self.component_type::<T>()?;
        self.array_mut::<T>(ty)
    }

    /// Leave every group, then drop every component of `entity`.
    pub fn entity_destroyed(&mut self, entity: Entity) -> Result<()> {
        let signature = self.signature(entity);
        for group in &mut self.groups {
            if group.matches(signature) {
                group.remove_entity(&mut self.arrays, entity)?;
            }
        }

        for storage in self.arrays.iter_mut().flatten() {
            storage.entity_destroyed(entity);
        }
        if let Some(signature) = self.signatures.get_mut(entity.index()) {
            *signature = Signature::EMPTY;
        }
        Ok(())
    }

    /// Component types `entity` currently has.
    #[inline]
    pub fn signature(&self, entity: Entity) -> Signature {
        self.signatures
            .get(entity.index())
            .copied()
            .unwrap_or(Signature::EMPTY)
    }

    pub fn component_types(&self, entity: Entity) -> Vec<ComponentType> {
        self.signature(entity).iter().collect()
    }

    /// Entities holding at least every component in `signature`, in id order.
    #[inline]
    pub fn entities_with(&self, signature: &Signature) -> Vec<Entity> {
        self.entities_matching(signature, &Signature::EMPTY)
    }

    /// Entities holding every component in `required` and none in `excluded`, in id order.
    pub fn entities_matching(&self, required: &Signature, excluded: &Signature) -> Vec<Entity> {
        self.signatures
            .iter()
            .enumerate()
            .filter(|(_, current)| {
                !current.is_empty()
                    && current.contains_all(required)
                    && !current.intersects(excluded)
            })
            .map(|(id, _)| Entity::new(id as u32))
            .collect()
    }

    /// Bytes reserved by every component array.
    pub fn memory_usage(&self) -> usize {
        self.arrays
            .iter()
            .flatten()
            .map(|storage| storage.memory_usage())
            .sum()
    }

    /// Register the group owning `O` and joining `N`, or view it if it already exists.
    ///
    /// A new group takes in every entity that already has all of its components. Fails with
    /// [`Error::OverlappingGroups`] if another group owns any component in `O`.
    pub fn register_group<O: OwnedSet, N: ComponentSet>(&mut self) -> Result<Group<'_, O, N>> {
        let owned = self.resolve::<O>()?;
        let non_owned = self.resolve::<N>()?;
        let key = self.group_key(&owned, &non_owned)?;

        let index = match self.group_index.get(&key) {
            Some(&index) => index,
            None => self.create_group(key, &owned)?,
        };
        self.view(index, &owned, &non_owned)
    }

    /// View the registered group owning `O` and joining `N`.
    pub fn group<O: OwnedSet, N: ComponentSet>(&mut self) -> Result<Group<'_, O, N>> {
        let owned = self.resolve::<O>()?;
        let non_owned = self.resolve::<N>()?;
        let key = self.group_key(&owned, &non_owned)?;

        let index = *self
            .group_index
            .get(&key)
            .ok_or(Error::GroupNotFound(key))?;
        self.view(index, &owned, &non_owned)
    }

    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Key of a group layout. Each component may appear once across both sides.
    fn group_key(&self, owned: &[ComponentType], non_owned: &[ComponentType]) -> Result<GroupKey> {
        let mut seen = Signature::EMPTY;
        for &ty in owned.iter().chain(non_owned) {
            if seen.test(ty) {
                return Err(Error::DuplicateGroupComponent(self.registry.name(ty)));
            }
            seen.set(ty);
        }
        Ok(GroupKey::new(
            Signature::from_types(owned.iter().copied()),
            Signature::from_types(non_owned.iter().copied()),
        ))
    }

    fn create_group(&mut self, key: GroupKey, owned: &[ComponentType]) -> Result<usize> {
        if self
            .groups
            .iter()
            .any(|group| group.key().owned().intersects(&key.owned()))
        {
            return Err(Error::OverlappingGroups(key.owned()));
        }

        let mut state = GroupState::new(key, owned.to_vec());
        let driving = owned
            .first()
            .copied()
            .ok_or_else(|| Error::internal("group has no owned component"))?;
        let candidates = self.storage(driving)?.entities().to_vec();
        for entity in candidates {
            if state.matches(self.signature(entity)) {
                state.add_entity(&mut self.arrays, entity)?;
            }
        }

        debug!(
            "registered group {key} with {} members",
            self.storage(driving)?.group_size()
        );
        let index = self.groups.len();
        self.groups.push(state);
        self.group_index.insert(key, index);
        Ok(index)
    }

    fn view<O: OwnedSet, N: ComponentSet>(
        &mut self,
        index: usize,
        owned: &[ComponentType],
        non_owned: &[ComponentType],
    ) -> Result<Group<'_, O, N>> {
        let mut slots: Vec<StorageSlot<'_>> = self.arrays.iter_mut().map(Option::as_mut).collect();
        let owned = O::fetch_arrays(&mut slots, owned)?;
        let joined = N::fetch_arrays(&mut slots, non_owned)?;
        let state = self
            .groups
            .get_mut(index)
            .ok_or_else(|| Error::internal(format!("group index {index} is stale")))?;
        Ok(Group::new(owned, joined, state))
    }

    /// Ids of every component in `S`, in layout order.
    fn resolve<S: ComponentSet>(&self) -> Result<Vec<ComponentType>> {
        S::type_ids()
            .into_iter()
            .map(|(type_id, name)| {
                self.registry
                    .get_by_type_id(type_id)
                    .filter(|ty| self.has_storage(*ty))
                    .ok_or_else(|| Error::not_registered(name))
            })
            .collect()
    }

    fn component_added(&mut self, entity: Entity, ty: ComponentType) -> Result<()> {
        let old = self.signature(entity);
        let new = old.with(ty);
        self.set_signature(entity, new);

        for group in &mut self.groups {
            if group.matches(new) && !group.matches(old) {
                group.add_entity(&mut self.arrays, entity)?;
            }
        }
        Ok(())
    }

    /// Leave the groups `entity` stops satisfying once `ty` is gone. Runs before the array
    /// removal so owned arrays still hold the component.
    fn component_removing(&mut self, entity: Entity, ty: ComponentType) -> Result<()> {
        let old = self.signature(entity);
        let new = old.without(ty);

        for group in &mut self.groups {
            if group.matches(old) && !group.matches(new) {
                group.remove_entity(&mut self.arrays, entity)?;
            }
        }
        self.set_signature(entity, new);
        Ok(())
    }

    fn set_signature(&mut self, entity: Entity, signature: Signature) {
        let index = entity.index();
        if index >= self.signatures.len() {
            self.signatures.resize(index + 1, Signature::EMPTY);
        }
        self.signatures[index] = signature;
    }

    fn slot(&mut self, ty: ComponentType) -> &mut Option<Box<dyn ComponentStorage>> {
        let index = ty.index();
        if index >= self.arrays.len() {
            self.arrays.resize_with(index + 1, || None);
        }
        &mut self.arrays[index]
    }

    #[inline]
    fn has_storage(&self, ty: ComponentType) -> bool {
        self.arrays.get(ty.index()).is_some_and(Option::is_some)
    }

    fn storage(&self, ty: ComponentType) -> Result<&dyn ComponentStorage> {
        self.arrays
            .get(ty.index())
            .and_then(Option::as_deref)
            .ok_or_else(|| Error::not_registered(self.registry.name(ty)))
    }

    fn storage_mut(&mut self, ty: ComponentType) -> Result<&mut Box<dyn ComponentStorage>> {
        let registry = &self.registry;
        self.arrays
            .get_mut(ty.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::not_registered(registry.name(ty)))
    }

    fn array_mut<T: Component>(&mut self, ty: ComponentType) -> Result<&mut ComponentArray<T>> {
        self.storage_mut(ty)?
            .as_any_mut()
            .downcast_mut::<ComponentArray<T>>()
            .ok_or_else(|| mismatched::<T>(ty))
    }

    fn erased(&self, ty: ComponentType) -> Result<&ErasedComponentArray> {
        self.storage(ty)?
            .as_any()
            .downcast_ref::<ErasedComponentArray>()
            .ok_or(Error::InvalidArgument("component type is not a dynamic layout"))
    }

    fn erased_mut(&mut self, ty: ComponentType) -> Result<&mut ErasedComponentArray> {
        self.storage_mut(ty)?
            .as_any_mut()
            .downcast_mut::<ErasedComponentArray>()
            .ok_or(Error::InvalidArgument("component type is not a dynamic layout"))
    }
}

fn mismatched<T>(ty: ComponentType) -> Error {
    Error::internal(format!(
        "storage {ty} does not hold {} components",
        type_name::<T>()
    ))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use sparse_macros::Component;

    use super::*;

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Health(i32);

    #[derive(Component, Debug)]
    struct Unregistered;

    fn e(id: u32) -> Entity {
        Entity::new(id)
    }

    fn pos(x: f32) -> Position {
        Position { x, y: 0.0 }
    }

    fn vel(dx: f32) -> Velocity {
        Velocity { dx, dy: 0.0 }
    }

    fn manager() -> ComponentManager {
        let mut manager = ComponentManager::new();
        manager.register_component::<Position>().unwrap();
        manager.register_component::<Velocity>().unwrap();
        manager.register_component::<Health>().unwrap();
        manager
    }

    fn ids(entities: &[Entity]) -> Vec<u32> {
        let mut ids: Vec<u32> = entities.iter().map(Entity::id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn register_component_is_idempotent() {
        // Given
        let mut manager = ComponentManager::new();

        // When
        let first = manager.register_component::<Position>().unwrap();
        let second = manager.register_component::<Position>().unwrap();
        let other = manager.register_component::<Velocity>().unwrap();

        // Then
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(manager.component_type::<Position>(), Ok(first));
    }

    #[test]
    fn shared_registry_keeps_ids_consistent() {
        // Given
        let registry = Arc::new(TypeRegistry::new());
        registry.register::<Velocity>().unwrap();
        let mut first = ComponentManager::with_registry(registry.clone());
        let mut second = ComponentManager::with_registry(registry.clone());

        // When
        let a = first.register_component::<Position>().unwrap();
        let b = thread::spawn(move || second.register_component::<Position>().unwrap())
            .join()
            .unwrap();

        // Then
        assert_eq!(a, b);
        assert_eq!(a, ComponentType::new(1));
        assert!(matches!(
            first.component_type::<Velocity>(),
            Err(Error::ComponentNotRegistered(_))
        ));
    }

    #[test]
    fn add_get_and_remove() {
        // Given
        let mut manager = manager();

        // When
        manager.add_component(e(1), pos(1.0)).unwrap();
        manager.get_component_mut::<Position>(e(1)).unwrap().x = 2.0;

        // Then
        assert_eq!(manager.get_component::<Position>(e(1)), Ok(&pos(2.0)));
        assert!(manager.has_component::<Position>(e(1)));
        assert_eq!(manager.try_get_component::<Velocity>(e(1)), None);

        // When
        let removed = manager.remove_component::<Position>(e(1)).unwrap();

        // Then
        assert_eq!(removed, pos(2.0));
        assert!(!manager.has_component::<Position>(e(1)));
        assert_eq!(
            manager.get_component::<Position>(e(1)),
            Err(Error::ComponentNotFound(e(1)))
        );
    }

    #[test]
    fn unregistered_types_are_reported() {
        let mut manager = manager();

        assert!(matches!(
            manager.add_component(e(0), Unregistered),
            Err(Error::ComponentNotRegistered(_))
        ));
        assert!(matches!(
            manager.register_group::<Unregistered, ()>(),
            Err(Error::ComponentNotRegistered(_))
        ));
        assert!(manager.try_get_component::<Unregistered>(e(0)).is_none());
    }

    #[test]
    fn duplicate_add_keeps_the_original() {
        let mut manager = manager();
        manager.add_component(e(3), Health(10)).unwrap();

        manager.add_component(e(3), Health(99)).unwrap();

        assert_eq!(manager.get_component::<Health>(e(3)), Ok(&Health(10)));
        assert_eq!(manager.component_array::<Health>().unwrap().len(), 1);
    }

    #[test]
    fn try_remove_reports_absence() {
        let mut manager = manager();
        manager.add_component(e(3), Health(10)).unwrap();

        assert_eq!(manager.try_remove_component::<Health>(e(3)), Ok(true));
        assert_eq!(manager.try_remove_component::<Health>(e(3)), Ok(false));
        assert_eq!(
            manager.remove_component::<Health>(e(3)),
            Err(Error::ComponentNotFound(e(3)))
        );
    }

    #[test]
    fn signatures_follow_component_changes() {
        // Given
        let mut manager = manager();
        let position = manager.component_type::<Position>().unwrap();
        let health = manager.component_type::<Health>().unwrap();

        // When
        manager.add_component(e(4), pos(0.0)).unwrap();
        manager.add_component(e(4), Health(1)).unwrap();
        manager.add_component(e(5), Health(1)).unwrap();

        // Then
        assert_eq!(manager.signature(e(4)), Signature::from_types([position, health]));
        assert_eq!(manager.component_types(e(4)), vec![position, health]);
        assert_eq!(
            manager.entities_with(&Signature::EMPTY.with(health)),
            vec![e(4), e(5)]
        );

        // When
        manager.remove_component::<Position>(e(4)).unwrap();

        // Then
        assert_eq!(manager.signature(e(4)), Signature::EMPTY.with(health));
        assert_eq!(manager.signature(e(100)), Signature::EMPTY);
    }

    #[test]
    fn entities_matching_skips_excluded_components() {
        // Given
        let mut manager = manager();
        let position = manager.component_type::<Position>().unwrap();
        let velocity = manager.component_type::<Velocity>().unwrap();
        let health = manager.component_type::<Health>().unwrap();
        for id in 0..4 {
            manager.add_component(e(id), pos(id as f32)).unwrap();
        }
        manager.add_component(e(1), vel(1.0)).unwrap();
        manager.add_component(e(2), Health(2)).unwrap();
        manager.add_component(e(3), vel(3.0)).unwrap();
        manager.add_component(e(3), Health(3)).unwrap();

        // When
        let still = manager.entities_matching(
            &Signature::EMPTY.with(position),
            &Signature::from_types([velocity, health]),
        );
        let moving = manager.entities_matching(
            &Signature::from_types([position, velocity]),
            &Signature::EMPTY.with(health),
        );

        // Then
        assert_eq!(still, vec![e(0)]);
        assert_eq!(moving, vec![e(1)]);
        assert_eq!(
            manager.entities_matching(&Signature::EMPTY.with(position), &Signature::EMPTY),
            manager.entities_with(&Signature::EMPTY.with(position))
        );
    }

    #[test]
    fn duplicate_component_joins_groups() {
        // Given
        let mut manager = manager();
        manager.add_component(e(1), pos(1.0)).unwrap();
        manager.add_component(e(1), vel(1.0)).unwrap();
        manager.add_component(e(2), vel(2.0)).unwrap();
        manager
            .register_group::<(Position, Velocity), ()>()
            .unwrap();

        // When
        manager.duplicate_component::<Position>(e(1), e(2)).unwrap();

        // Then
        assert_eq!(manager.get_component::<Position>(e(2)), Ok(&pos(1.0)));
        let group = manager.group::<(Position, Velocity), ()>().unwrap();
        assert_eq!(ids(group.entities()), vec![1, 2]);
    }

    #[test]
    fn dynamic_components_store_raw_bytes() {
        // Given
        let mut manager = manager();
        let tag = manager.register_dynamic_component("tag", 4).unwrap();

        // When
        manager
            .add_raw_component(e(7), tag, &[1, 2, 3, 4])
            .unwrap();
        manager.get_raw_component_mut(e(7), tag).unwrap()[0] = 9;

        // Then
        assert_eq!(manager.get_raw_component(e(7), tag), Ok(&[9, 2, 3, 4][..]));
        assert!(manager.signature(e(7)).test(tag));
        assert!(matches!(
            manager.add_raw_component(e(8), tag, &[1, 2]),
            Err(Error::LayoutMismatch {
                expected: 4,
                actual: 2
            })
        ));

        // When
        manager.remove_component_by_type(e(7), tag).unwrap();

        // Then
        assert!(!manager.signature(e(7)).test(tag));
        assert!(matches!(
            manager.get_raw_component(e(7), tag),
            Err(Error::ComponentNotFound(_))
        ));
    }

    #[test]
    fn raw_access_to_typed_component_is_rejected() {
        let mut manager = manager();
        let position = manager.component_type::<Position>().unwrap();
        manager.add_component(e(1), pos(1.0)).unwrap();

        assert!(matches!(
            manager.get_raw_component(e(1), position),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn group_tracks_component_changes() {
        // Given
        let mut manager = manager();
        manager
            .register_group::<(Position, Velocity), ()>()
            .unwrap();

        // When
        for id in 0..5 {
            manager.add_component(e(id), pos(id as f32)).unwrap();
        }
        for id in [1, 3] {
            manager.add_component(e(id), vel(id as f32)).unwrap();
        }

        // Then
        let group = manager.group::<(Position, Velocity), ()>().unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(ids(group.entities()), vec![1, 3]);
        drop(group);

        // When
        manager.remove_component::<Position>(e(1)).unwrap();

        // Then
        let group = manager.group::<(Position, Velocity), ()>().unwrap();
        assert_eq!(ids(group.entities()), vec![3]);
        drop(group);
        let positions = manager.component_array::<Position>().unwrap();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions.group_size(), 1);
        let velocities = manager.component_array::<Velocity>().unwrap();
        assert_eq!(velocities.group_size(), 1);
        assert_eq!(velocities.len(), 2);
    }

    #[test]
    fn removing_a_non_owned_component_leaves_the_group() {
        // Given
        let mut manager = manager();
        manager.add_component(e(1), pos(1.0)).unwrap();
        manager.add_component(e(1), Health(5)).unwrap();
        manager.register_group::<Position, Health>().unwrap();

        // When
        manager.remove_component::<Health>(e(1)).unwrap();

        // Then
        let group = manager.group::<Position, Health>().unwrap();
        assert!(group.is_empty());
        drop(group);
        assert_eq!(
            manager.component_array::<Position>().unwrap().group_size(),
            0
        );
    }

    #[test]
    fn register_group_back_fills_existing_entities() {
        // Given
        let mut manager = manager();
        for id in 0..6 {
            manager.add_component(e(id), pos(id as f32)).unwrap();
            if id % 2 == 0 {
                manager.add_component(e(id), Health(id as i32)).unwrap();
            }
        }

        // When
        let group = manager.register_group::<Position, Health>().unwrap();

        // Then
        assert_eq!(ids(group.entities()), vec![0, 2, 4]);
    }

    #[test]
    fn register_group_returns_the_existing_group() {
        let mut manager = manager();
        manager.register_group::<Position, Health>().unwrap();

        manager.register_group::<Position, Health>().unwrap();

        assert_eq!(manager.group_count(), 1);
    }

    #[test]
    fn overlapping_owned_components_are_rejected() {
        // Given
        let mut manager = manager();
        manager.register_group::<Position, Velocity>().unwrap();

        // When
        let overlapping = manager.register_group::<(Velocity, Position), ()>();

        // Then
        assert!(matches!(overlapping, Err(Error::OverlappingGroups(_))));
        assert_eq!(manager.group_count(), 1);
        assert!(manager.register_group::<Velocity, Position>().is_ok());
    }

    #[test]
    fn duplicate_group_components_are_rejected() {
        let mut manager = manager();

        assert!(matches!(
            manager.register_group::<(Position, Position), ()>(),
            Err(Error::DuplicateGroupComponent(_))
        ));
        assert!(matches!(
            manager.register_group::<Position, Position>(),
            Err(Error::DuplicateGroupComponent(_))
        ));
        assert_eq!(manager.group_count(), 0);
    }

    #[test]
    fn unknown_group_is_reported() {
        let mut manager = manager();

        assert!(matches!(
            manager.group::<Position, ()>(),
            Err(Error::GroupNotFound(_))
        ));
    }

    #[test]
    fn entity_destroyed_clears_components_and_groups() {
        // Given
        let mut manager = manager();
        for id in 0..3 {
            manager.add_component(e(id), pos(id as f32)).unwrap();
            manager.add_component(e(id), vel(id as f32)).unwrap();
        }
        manager.add_component(e(1), Health(1)).unwrap();
        manager
            .register_group::<(Position, Velocity), ()>()
            .unwrap();

        // When
        manager.entity_destroyed(e(1)).unwrap();
        manager.entity_destroyed(e(42)).unwrap();

        // Then
        assert_eq!(manager.signature(e(1)), Signature::EMPTY);
        assert!(!manager.has_component::<Health>(e(1)));
        let group = manager.group::<(Position, Velocity), ()>().unwrap();
        assert_eq!(ids(group.entities()), vec![0, 2]);
    }

    #[test]
    fn config_sets_array_capacity() {
        // Given
        let config = Config::default().with_initial_capacity(16);
        let mut manager = ComponentManager::new().with_config(config);

        // When
        manager.register_component::<Health>().unwrap();

        // Then
        let capacity = manager.component_array::<Health>().unwrap().capacity();
        assert!((16..DEFAULT_CAPACITY).contains(&capacity));
        assert!(manager.memory_usage() > 0);
        assert_eq!(Config::default().with_initial_capacity(0).initial_capacity, 1);
    }
}
