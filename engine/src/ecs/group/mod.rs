//! Owned groups over component arrays.
//!
//! A group is declared by two component sets: the *owned* components, whose arrays the group
//! reorders, and the *non-owned* components, which are only read. An entity belongs to the group
//! exactly when it has every owned and every non-owned component.
//!
//! ```text
//!              grouped region (len = 3)
//!            ◄────────────────────────►
//! Position   │ e7 │ e2 │ e9 ││ e4 │ e1 │      owned, aligned slot by slot
//! Velocity   │ e7 │ e2 │ e9 ││ e5 │ e4 │ e1   owned, aligned slot by slot
//! Health     │ e1 │ e9 │ e3 │ e2 │ e7 │      non-owned, looked up by entity
//! ```
//!
//! Because every owned array keeps the group's entities in the same leading slots, iterating a
//! group reads the owned arrays by index and only does sparse lookups into the non-owned ones.
//! A component type can be owned by at most one group.
//!
//! # Sorting and partitioning
//!
//! [`Group::sort_by`] and [`Group::partition_view`] physically reorder the grouped region of
//! every owned array. Both results are cached. Adding or removing group members invalidates the
//! caches; so does changing component values in place, which the group cannot observe. Call
//! [`Group::invalidate_sorting`] or [`Group::invalidate_partitions`] after such writes.
//!
//! ```ignore
//! let mut group = manager.register_group::<(Position, Velocity), Health>()?;
//! group.each(|_, (position, velocity), _| position.x += velocity.x)?;
//! group.sort_by(|health: &Health| health.value, true)?;
//! ```

mod partition;
mod set;

use std::{
    any::TypeId,
    cmp::Ordering,
    collections::HashMap,
    fmt,
    hash::Hash,
};

use log::{error, trace};

pub use partition::{Partition, PartitionView};
pub use set::{At, ComponentSet, InJoined, InOwned, Locate, OwnedSet, Select, StorageSlot};

use partition::{PartitionCache, PartitionId};

use crate::ecs::{
    component::{Component, ComponentType, Signature},
    entity::Entity,
    error::{Error, Result},
    storage::{ComponentArray, ComponentStorage},
};

/// Identifies a group by its owned and non-owned component signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    owned: Signature,
    non_owned: Signature,
}

impl GroupKey {
    #[inline]
    pub const fn new(owned: Signature, non_owned: Signature) -> Self {
        Self { owned, non_owned }
    }

    #[inline]
    pub const fn owned(&self) -> Signature {
        self.owned
    }

    #[inline]
    pub const fn non_owned(&self) -> Signature {
        self.non_owned
    }

    /// Every component an entity needs to be a member.
    #[inline]
    pub const fn all(&self) -> Signature {
        self.owned.union(self.non_owned)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owned {} + non-owned {}", self.owned, self.non_owned)
    }
}

/// What the grouped region is currently sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortKey {
    component: TypeId,
    ascending: bool,
}

/// Persistent state of a registered group, owned by the component manager.
pub(crate) struct GroupState {
    key: GroupKey,
    owned: Vec<ComponentType>,
    sort: Option<SortKey>,
    partitions: HashMap<PartitionId, PartitionCache>,
}

impl GroupState {
    pub(crate) fn new(key: GroupKey, owned: Vec<ComponentType>) -> Self {
        Self {
            key,
            owned,
            sort: None,
            partitions: HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> GroupKey {
        self.key
    }

    /// Whether an entity with `signature` belongs to this group.
    #[inline]
    pub(crate) fn matches(&self, signature: Signature) -> bool {
        signature.contains_all(&self.key.all())
    }

    /// Move `entity` into the grouped region of every owned array.
    pub(crate) fn add_entity(
        &mut self,
        arrays: &mut [Option<Box<dyn ComponentStorage>>],
        entity: Entity,
    ) -> Result<()> {
        for &ty in &self.owned {
            owned_storage(arrays, ty)?.add_to_group(entity)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Move `entity` out of the grouped region of every owned array.
    pub(crate) fn remove_entity(
        &mut self,
        arrays: &mut [Option<Box<dyn ComponentStorage>>],
        entity: Entity,
    ) -> Result<()> {
        for &ty in &self.owned {
            owned_storage(arrays, ty)?.remove_from_group(entity)?;
        }
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.sort = None;
        self.invalidate_partitions();
    }

    fn invalidate_partitions(&mut self) {
        for cache in self.partitions.values_mut() {
            cache.dirty = true;
        }
    }

    fn cached_partitions<K: Clone + 'static>(&self, id: &PartitionId) -> Option<Vec<Partition<K>>> {
        self.partitions
            .get(id)
            .filter(|cache| !cache.dirty)
            .and_then(|cache| cache.partitions.downcast_ref::<Vec<Partition<K>>>())
            .cloned()
    }

    fn store_partitions<K: Send + Sync + 'static>(
        &mut self,
        id: PartitionId,
        partitions: Vec<Partition<K>>,
    ) {
        self.partitions.insert(
            id,
            PartitionCache {
                dirty: false,
                partitions: Box::new(partitions),
            },
        );
    }
}

fn owned_storage(
    arrays: &mut [Option<Box<dyn ComponentStorage>>],
    ty: ComponentType,
) -> Result<&mut Box<dyn ComponentStorage>> {
    arrays
        .get_mut(ty.index())
        .and_then(Option::as_mut)
        .ok_or_else(|| Error::internal(format!("owned storage {ty} is missing")))
}

/// A borrowed view of a registered group.
///
/// Obtained from [`crate::ecs::ComponentManager::register_group`] or
/// [`crate::ecs::ComponentManager::group`]. The view borrows the manager mutably, so components
/// cannot be added or removed while it is alive.
pub struct Group<'w, O: OwnedSet, N: ComponentSet = ()> {
    owned: O::Arrays<'w>,
    joined: N::Arrays<'w>,
    state: &'w mut GroupState,
}

impl<'w, O: OwnedSet, N: ComponentSet> Group<'w, O, N> {
    pub(crate) fn new(owned: O::Arrays<'w>, joined: N::Arrays<'w>, state: &'w mut GroupState) -> Self {
        Self {
            owned,
            joined,
            state,
        }
    }

    /// Number of entities in the group.
    #[inline]
    pub fn len(&self) -> usize {
        O::driving(&self.owned).group_size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grouped entities in iteration order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        let driving = O::driving(&self.owned);
        &driving.entities()[..driving.group_size()]
    }

    #[inline]
    pub fn key(&self) -> GroupKey {
        self.state.key
    }

    #[inline]
    pub fn owned_signature(&self) -> Signature {
        self.state.key.owned()
    }

    #[inline]
    pub fn all_signature(&self) -> Signature {
        self.state.key.all()
    }

    /// Grouped components of the owned type `T`, parallel to [`Self::entities`].
    #[inline]
    pub fn get<T: Component, I>(&self) -> &[T]
    where
        O: Select<T, I>,
    {
        O::select(&self.owned).grouped()
    }

    #[inline]
    pub fn get_mut<T: Component, I>(&mut self) -> &mut [T]
    where
        O: Select<T, I>,
    {
        O::select_mut(&mut self.owned).grouped_mut()
    }

    /// The whole array of the non-owned type `T`.
    #[inline]
    pub fn joined<T: Component, I>(&self) -> &ComponentArray<T>
    where
        N: Select<T, I>,
    {
        N::select(&self.joined)
    }

    /// Entity and components at position `index` of the group.
    pub fn get_at(&self, index: usize) -> Result<(Entity, O::Item<'_>, N::Item<'_>)> {
        if index >= self.len() {
            return Err(Error::OutOfRange(index));
        }
        let entity = O::driving(&self.owned).entity_at(index)?;
        Ok((
            entity,
            O::fetch_index(&self.owned, index)?,
            N::fetch(&self.joined, entity)?,
        ))
    }

    /// Iterate `(entity, owned, non_owned)` with shared access.
    #[inline]
    pub fn iter(&self) -> GroupIter<'_, 'w, O, N> {
        GroupIter {
            group: self,
            index: 0,
            len: self.len(),
        }
    }

    /// Call `f` for every member with mutable owned components and shared non-owned components.
    pub fn each<F>(&mut self, f: F) -> Result<()>
    where
        F: for<'a> FnMut(Entity, O::ItemMut<'a>, N::Item<'a>),
    {
        let len = self.len();
        self.each_in_range(0, len, f)
    }

    /// Like [`Self::each`], restricted to `count` members starting at position `start`.
    ///
    /// A range running past the end of the group is cut short; one starting past it visits
    /// nothing.
    pub fn each_in_range<F>(&mut self, start: usize, count: usize, mut f: F) -> Result<()>
    where
        F: for<'a> FnMut(Entity, O::ItemMut<'a>, N::Item<'a>),
    {
        let len = self.len();
        if start >= len {
            return Ok(());
        }
        let end = start.saturating_add(count).min(len);

        for index in start..end {
            let entity = O::driving(&self.owned).entity_at(index)?;
            let owned = O::fetch_index_mut(&mut self.owned, index)?;
            let joined = N::fetch(&self.joined, entity)?;
            f(entity, owned, joined);
        }
        Ok(())
    }

    /// Whether the grouped region is not known to be sorted.
    #[inline]
    pub fn sorting_invalidated(&self) -> bool {
        self.state.sort.is_none()
    }

    /// Forget the current sort order so the next [`Self::sort_by`] sorts again.
    #[inline]
    pub fn invalidate_sorting(&mut self) {
        self.state.sort = None;
    }

    /// Mark every cached partitioning as stale.
    #[inline]
    pub fn invalidate_partitions(&mut self) {
        self.state.invalidate_partitions();
    }

    /// Stable-sort the group by a key extracted from component `C`, owned or non-owned.
    ///
    /// A no-op while the group is still sorted by component `C` in the same direction, whatever
    /// the extractor. Call [`Self::invalidate_sorting`] to sort the same component by another
    /// key. Comparisons between keys without an order (such as NaN) treat them as equal.
    pub fn sort_by<C, M, K, F>(&mut self, extractor: F, ascending: bool) -> Result<()>
    where
        C: Component,
        (O, N): Locate<C, M, Owned = O, Joined = N>,
        K: PartialOrd,
        F: Fn(&C) -> K,
    {
        let key = SortKey {
            component: TypeId::of::<C>(),
            ascending,
        };
        if self.state.sort == Some(key) {
            return Ok(());
        }

        let array = <(O, N) as Locate<C, M>>::locate(&self.owned, &self.joined);
        let mut keyed = self
            .entities()
            .iter()
            .map(|&entity| Ok((extractor(array.get(entity)?), entity)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let order: Vec<Entity> = keyed.into_iter().map(|(_, entity)| entity).collect();
        O::reorder(&mut self.owned, &order)?;
        self.state.sort = Some(key);
        self.state.invalidate_partitions();
        trace!("sorted group {} by {}", self.state.key, std::any::type_name::<C>());
        Ok(())
    }

    /// Partition the group by a key extracted from component `C`, owned or non-owned.
    ///
    /// Partitions are laid out in order of first appearance of each key in the current group
    /// order. The result is cached per component and key type until invalidated, so a second
    /// extractor over the same component and key type needs [`Self::invalidate_partitions`].
    pub fn partition_view<C, M, K, F>(
        &mut self,
        extractor: F,
    ) -> Result<PartitionView<'_, 'w, O, N, K>>
    where
        C: Component,
        (O, N): Locate<C, M, Owned = O, Joined = N>,
        K: Eq + Hash + Clone + Send + Sync + 'static,
        F: Fn(&C) -> K,
    {
        let id = PartitionId::Field {
            component: TypeId::of::<C>(),
            key: TypeId::of::<K>(),
        };
        if let Some(partitions) = self.state.cached_partitions::<K>(&id) {
            return Ok(PartitionView::new(self, partitions));
        }

        let array = <(O, N) as Locate<C, M>>::locate(&self.owned, &self.joined);
        let keyed = self
            .entities()
            .iter()
            .map(|&entity| Ok((extractor(array.get(entity)?), entity)))
            .collect::<Result<Vec<_>>>()?;
        let partitions = self.rebuild_partitions(keyed)?;
        self.state.store_partitions(id, partitions.clone());
        Ok(PartitionView::new(self, partitions))
    }

    /// Partition the group by a key computed from each entity.
    ///
    /// Cached under `partition_id` until invalidated; reuse the id only with the same extractor.
    pub fn entity_partition_view<K, F>(
        &mut self,
        partition_id: &str,
        mut extractor: F,
    ) -> Result<PartitionView<'_, 'w, O, N, K>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        F: FnMut(Entity) -> K,
    {
        let id = PartitionId::Named(partition_id.to_owned());
        if let Some(partitions) = self.state.cached_partitions::<K>(&id) {
            return Ok(PartitionView::new(self, partitions));
        }

        let keyed: Vec<(K, Entity)> = self
            .entities()
            .iter()
            .map(|&entity| (extractor(entity), entity))
            .collect();
        let partitions = self.rebuild_partitions(keyed)?;
        self.state.store_partitions(id, partitions.clone());
        Ok(PartitionView::new(self, partitions))
    }

    /// Bucket `keyed` by key, lay the buckets out contiguously and reorder the owned arrays.
    fn rebuild_partitions<K: Eq + Hash + Clone>(
        &mut self,
        keyed: Vec<(K, Entity)>,
    ) -> Result<Vec<Partition<K>>> {
        let mut slots: HashMap<K, usize> = HashMap::new();
        let mut buckets: Vec<(K, Vec<Entity>)> = Vec::new();
        for (key, entity) in keyed {
            match slots.get(&key) {
                Some(&slot) => buckets[slot].1.push(entity),
                None => {
                    slots.insert(key.clone(), buckets.len());
                    buckets.push((key, vec![entity]));
                }
            }
        }

        let mut order = Vec::with_capacity(self.len());
        let mut partitions = Vec::with_capacity(buckets.len());
        for (key, entities) in buckets {
            partitions.push(Partition {
                key,
                start: order.len(),
                count: entities.len(),
            });
            order.extend(entities);
        }

        O::reorder(&mut self.owned, &order)?;
        self.state.sort = None;
        self.state.invalidate_partitions();
        trace!(
            "partitioned group {} into {} runs",
            self.state.key,
            partitions.len()
        );
        Ok(partitions)
    }
}

/// Shared iterator over a [`Group`].
pub struct GroupIter<'g, 'w, O: OwnedSet, N: ComponentSet> {
    group: &'g Group<'w, O, N>,
    index: usize,
    len: usize,
}

impl<'g, 'w, O: OwnedSet, N: ComponentSet> Iterator for GroupIter<'g, 'w, O, N> {
    type Item = (Entity, O::Item<'g>, N::Item<'g>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let group: &'g Group<'w, O, N> = self.group;
        match group.get_at(index) {
            Ok(item) => Some(item),
            Err(err) => {
                error!("group iteration stopped at {index}: {err}");
                self.index = self.len;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'g, 'w, O: OwnedSet, N: ComponentSet> IntoIterator for &'g Group<'w, O, N> {
    type Item = (Entity, O::Item<'g>, N::Item<'g>);
    type IntoIter = GroupIter<'g, 'w, O, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use sparse_macros::Component;

    use super::*;
    use crate::ecs::manager::ComponentManager;

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
    }

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
    }

    #[derive(Component, Debug, Clone, PartialEq)]
    struct Health {
        value: i32,
    }

    #[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Team {
        Red,
        Blue,
    }

    fn e(id: u32) -> Entity {
        Entity::new(id)
    }

    fn manager() -> ComponentManager {
        let mut manager = ComponentManager::new();
        manager.register_component::<Position>().unwrap();
        manager.register_component::<Velocity>().unwrap();
        manager.register_component::<Health>().unwrap();
        manager.register_component::<Team>().unwrap();
        manager
    }

    /// Entities 0..5 with health 100, 80, 90, 60, 70.
    fn with_health(manager: &mut ComponentManager) {
        for (id, value) in [100, 80, 90, 60, 70].into_iter().enumerate() {
            let entity = e(id as u32);
            manager
                .add_component(entity, Position { x: id as f32 })
                .unwrap();
            manager.add_component(entity, Health { value }).unwrap();
        }
    }

    #[test]
    fn each_updates_owned_components() {
        // Given
        let mut manager = manager();
        for id in 0..4 {
            manager
                .add_component(e(id), Position { x: 0.0 })
                .unwrap();
            manager
                .add_component(e(id), Velocity { dx: id as f32 })
                .unwrap();
        }
        manager
            .add_component(e(9), Position { x: 0.0 })
            .unwrap();
        let mut group = manager
            .register_group::<(Position, Velocity), ()>()
            .unwrap();

        // When
        group
            .each(|_, (position, velocity), ()| position.x += velocity.dx)
            .unwrap();

        // Then
        assert_eq!(group.len(), 4);
        for (entity, (position, velocity), ()) in &group {
            assert_eq!(position.x, velocity.dx);
            assert_ne!(entity, e(9));
        }
        drop(group);
        assert_eq!(manager.get_component::<Position>(e(9)), Ok(&Position { x: 0.0 }));
    }

    #[test]
    fn owned_arrays_stay_aligned() {
        // Given
        let mut manager = manager();
        for id in [5, 1, 8] {
            manager
                .add_component(e(id), Velocity { dx: id as f32 })
                .unwrap();
        }
        for id in [8, 3, 5, 1] {
            manager
                .add_component(e(id), Position { x: id as f32 })
                .unwrap();
        }

        // When
        let group = manager
            .register_group::<(Position, Velocity), ()>()
            .unwrap();

        // Then
        let positions = group.get::<Position, _>();
        let velocities = group.get::<Velocity, _>();
        assert_eq!(positions.len(), 3);
        for (index, entity) in group.entities().iter().enumerate() {
            assert_eq!(positions[index].x, entity.id() as f32);
            assert_eq!(velocities[index].dx, entity.id() as f32);
        }
    }

    #[test]
    fn non_owned_components_are_joined_by_entity() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        manager.add_component(e(7), Health { value: 1 }).unwrap();

        // When
        let group = manager.register_group::<Position, Health>().unwrap();

        // Then
        assert_eq!(group.len(), 5);
        assert_eq!(group.joined::<Health, _>().len(), 6);
        let (entity, position, health) = group.get_at(3).unwrap();
        assert_eq!(position.x, entity.id() as f32);
        assert_eq!(
            Some(health),
            group.joined::<Health, _>().try_get(entity)
        );
    }

    #[test]
    fn get_at_past_the_end_fails() {
        let mut manager = manager();
        with_health(&mut manager);
        let group = manager.register_group::<Position, Health>().unwrap();

        assert!(matches!(group.get_at(5), Err(Error::OutOfRange(5))));
        assert_eq!(group.iter().count(), 5);
    }

    #[test]
    fn sort_by_owned_component_ascending() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        let mut group = manager.register_group::<(Position, Health), ()>().unwrap();

        // When
        group.sort_by(|health: &Health| health.value, true).unwrap();

        // Then
        let values: Vec<i32> = group.get::<Health, _>().iter().map(|h| h.value).collect();
        assert_eq!(values, vec![60, 70, 80, 90, 100]);
        assert!(!group.sorting_invalidated());
        for (entity, (position, _), ()) in group.iter() {
            assert_eq!(position.x, entity.id() as f32);
        }
    }

    #[test]
    fn sort_by_non_owned_component_descending() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        let mut group = manager.register_group::<Position, Health>().unwrap();

        // When
        group.sort_by(|health: &Health| health.value, false).unwrap();

        // Then
        let values: Vec<i32> = group.iter().map(|(_, _, health)| health.value).collect();
        assert_eq!(values, vec![100, 90, 80, 70, 60]);
        let ids: Vec<u32> = group.entities().iter().map(Entity::id).collect();
        assert_eq!(ids, vec![0, 2, 1, 4, 3]);
    }

    #[test]
    fn sort_is_stable_and_cached() {
        // Given
        let mut manager = manager();
        for (id, value) in [(0, 2), (1, 1), (2, 2), (3, 1)] {
            manager
                .add_component(e(id), Position { x: id as f32 })
                .unwrap();
            manager.add_component(e(id), Health { value }).unwrap();
        }
        let mut group = manager.register_group::<(Position, Health), ()>().unwrap();

        // When
        group.sort_by(|health: &Health| health.value, true).unwrap();
        group.get_mut::<Health, _>()[0].value = 50;
        group.sort_by(|health: &Health| health.value, true).unwrap();

        // Then - the second call was skipped, equal keys kept their order
        let ids: Vec<u32> = group.entities().iter().map(Entity::id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);

        // When
        group.invalidate_sorting();
        group.sort_by(|health: &Health| health.value, true).unwrap();

        // Then
        let ids: Vec<u32> = group.entities().iter().map(Entity::id).collect();
        assert_eq!(ids, vec![3, 0, 2, 1]);
    }

    #[test]
    fn membership_changes_invalidate_sorting() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        let mut group = manager.register_group::<(Position, Health), ()>().unwrap();
        group.sort_by(|health: &Health| health.value, true).unwrap();
        drop(group);

        // When
        manager.add_component(e(10), Position { x: 10.0 }).unwrap();
        manager.add_component(e(10), Health { value: 1 }).unwrap();

        // Then
        let group = manager.group::<(Position, Health), ()>().unwrap();
        assert!(group.sorting_invalidated());
        assert_eq!(group.len(), 6);
    }

    #[test]
    fn partition_view_lays_keys_out_contiguously() {
        // Given
        let mut manager = manager();
        let teams = [Team::Red, Team::Blue, Team::Red, Team::Blue, Team::Red];
        for (id, team) in teams.into_iter().enumerate() {
            let entity = e(id as u32);
            manager
                .add_component(entity, Position { x: id as f32 })
                .unwrap();
            manager.add_component(entity, team).unwrap();
        }
        let mut group = manager.register_group::<Position, Team>().unwrap();

        // When
        let mut view = group.partition_view(|team: &Team| *team).unwrap();

        // Then
        assert_eq!(view.len(), 2);
        assert_eq!(view.keys(), vec![Team::Red, Team::Blue]);
        assert_eq!(
            view.partition(&Team::Red),
            Some(&Partition {
                key: Team::Red,
                start: 0,
                count: 3
            })
        );
        let blue: Vec<u32> = view.entities(&Team::Blue).iter().map(Entity::id).collect();
        assert_eq!(blue, vec![1, 3]);

        // When
        let mut visited = Vec::new();
        view.each(&Team::Red, |entity, position, team| {
            assert_eq!(*team, Team::Red);
            position.x += 100.0;
            visited.push(entity.id());
        })
        .unwrap();

        // Then
        visited.sort();
        assert_eq!(visited, vec![0, 2, 4]);
    }

    #[test]
    fn partition_view_is_cached_until_membership_changes() {
        // Given
        let mut manager = manager();
        for id in 0..4 {
            manager
                .add_component(e(id), Position { x: id as f32 })
                .unwrap();
        }
        let mut group = manager.register_group::<Position, ()>().unwrap();
        let parity = |entity: Entity| entity.id() % 2;

        // When
        let first = group
            .entity_partition_view("parity", parity)
            .unwrap()
            .partitions()
            .to_vec();
        let mut calls = 0;
        let second = group
            .entity_partition_view("parity", |entity| {
                calls += 1;
                entity.id() % 2
            })
            .unwrap()
            .partitions()
            .to_vec();

        // Then - served from the cache without calling the extractor
        assert_eq!(first, second);
        assert_eq!(calls, 0);

        // When
        group.invalidate_partitions();
        let third = group
            .entity_partition_view("parity", |entity| {
                calls += 1;
                entity.id() % 2
            })
            .unwrap()
            .len();

        // Then
        assert_eq!(third, 2);
        assert_eq!(calls, 4);
    }

    #[test]
    fn partition_each_with_unknown_key_is_a_noop() {
        let mut manager = manager();
        manager.add_component(e(0), Position { x: 0.0 }).unwrap();
        manager.add_component(e(0), Team::Red).unwrap();
        let mut group = manager.register_group::<Position, Team>().unwrap();

        let mut view = group.partition_view(|team: &Team| *team).unwrap();
        let mut calls = 0;
        view.each(&Team::Blue, |_, _, _| calls += 1).unwrap();

        assert_eq!(calls, 0);
        assert!(view.entities(&Team::Blue).is_empty());
    }

    #[test]
    fn each_in_range_clamps_to_the_group() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        let mut group = manager.register_group::<Position, Health>().unwrap();

        // When
        let mut inside = 0;
        group.each_in_range(1, 3, |_, _, _| inside += 1).unwrap();
        let mut overrun = Vec::new();
        group
            .each_in_range(3, 10, |entity, _, _| overrun.push(entity))
            .unwrap();
        let mut past_end = 0;
        group.each_in_range(5, 2, |_, _, _| past_end += 1).unwrap();

        // Then
        assert_eq!(inside, 3);
        assert_eq!(overrun, group.entities()[3..].to_vec());
        assert_eq!(past_end, 0);
    }

    #[test]
    fn sort_cache_is_shared_across_call_sites() {
        // Given
        let mut manager = manager();
        with_health(&mut manager);
        let mut group = manager.register_group::<(Position, Health), ()>().unwrap();
        let by_value = |health: &Health| health.value;
        group.sort_by(by_value, true).unwrap();
        group.get_mut::<Health, _>()[0].value = 1_000;

        // When - another extractor over the same component and direction
        group.sort_by(|health: &Health| -health.value, true).unwrap();

        // Then - skipped, the first member still holds the edited value
        assert_eq!(group.get::<Health, _>()[0].value, 1_000);

        // When - the direction changes
        group.sort_by(by_value, false).unwrap();

        // Then
        let values: Vec<i32> = group.get::<Health, _>().iter().map(|h| h.value).collect();
        assert_eq!(values, vec![1_000, 100, 90, 80, 70]);
    }

    #[test]
    fn field_partitions_are_cached_across_call_sites() {
        // Given
        let mut manager = manager();
        for (id, team) in [Team::Blue, Team::Red, Team::Blue].into_iter().enumerate() {
            manager
                .add_component(e(id as u32), Position { x: 0.0 })
                .unwrap();
            manager.add_component(e(id as u32), team).unwrap();
        }
        let mut group = manager.register_group::<Position, Team>().unwrap();
        let first = group
            .partition_view(|team: &Team| *team)
            .unwrap()
            .partitions()
            .to_vec();

        // When
        let calls = Cell::new(0);
        let second = group
            .partition_view(|team: &Team| {
                calls.set(calls.get() + 1);
                *team
            })
            .unwrap()
            .partitions()
            .to_vec();

        // Then
        assert_eq!(first, second);
        assert_eq!(calls.get(), 0);
    }
}
