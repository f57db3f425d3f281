//! Sparse-set component storage.
//!
//! Every component type lives in its own array. An array is a sparse set: a sparse map from
//! entity id to dense index, a dense list of entities, and the component values stored in
//! parallel with the dense list.
//!
//! ```text
//!   sparse (by entity id)     dense entities          component data
//! ┌───┬───┬───┬───┬───┐     ┌────┬────┬────┬────┐   ┌────┬────┬────┬────┐
//! │ 2 │ - │ 0 │ 1 │ 3 │     │ e2 │ e3 │ e0 │ e4 │   │ c2 │ c3 │ c0 │ c4 │
//! └───┴───┴───┴───┴───┘     └────┴────┴────┴────┘   └────┴────┴────┴────┘
//!   e0  e1  e2  e3  e4      ◄─ grouped ─►
//!                           group_size = 2
//! ```
//!
//! # Grouped region
//!
//! The first `group_size` dense slots hold the entities that belong to the group owning this
//! array. A group keeps the grouped regions of all its owned arrays in lockstep, so the entity at
//! dense index `i` is the same in every one of them.
//!
//! Adding an entity to the group swaps it with the first non-grouped slot and grows the region;
//! removing swaps it with the last grouped slot and shrinks the region. Removing a component from
//! a grouped entity does both: it leaves the grouped region first, then swaps with the last
//! element and pops.
//!
//! # Layouts
//!
//! - [`ComponentArray<T>`]: values of a Rust type `T`.
//! - [`ErasedComponentArray`]: fixed-size byte records for layouts only known at runtime.
//!
//! Both implement [`ComponentStorage`], the type-agnostic interface the component manager
//! drives on entity destruction and group membership changes. [`Uniques`] holds the per-world
//! singletons, which live outside of any sparse set.

use std::any::Any;

mod array;
mod erased;
mod sparse;
mod unique;

pub use array::ComponentArray;
pub use erased::ErasedComponentArray;
pub use sparse::SparseSet;
pub use unique::Uniques;

use crate::ecs::{entity::Entity, error::Result};

/// Default number of entities an array is sized for.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Type-agnostic interface over a component array.
pub trait ComponentStorage: Any + Send + Sync {
    /// Whether `entity` has a component in this array.
    fn has_component(&self, entity: Entity) -> bool;

    /// Number of stored components.
    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entities in the grouped region.
    fn group_size(&self) -> usize;

    /// Number of components that fit without reallocating.
    fn capacity(&self) -> usize;

    /// All entities in dense order.
    fn entities(&self) -> &[Entity];

    /// Entity at a dense index, or [`crate::ecs::Error::OutOfRange`].
    fn entity_at(&self, index: usize) -> Result<Entity>;

    /// Remove the component of `entity`.
    fn remove(&mut self, entity: Entity) -> Result<()>;

    /// Remove the component of `entity` if present. Missing components are ignored.
    fn entity_destroyed(&mut self, entity: Entity);

    /// Move `entity` into the grouped region.
    fn add_to_group(&mut self, entity: Entity) -> Result<()>;

    /// Move `entity` out of the grouped region.
    fn remove_from_group(&mut self, entity: Entity) -> Result<()>;

    /// Reorder the grouped region to match `order`, which must list every grouped entity once.
    fn reorder_group(&mut self, order: &[Entity]) -> Result<()>;

    /// Bytes reserved by this array.
    fn memory_usage(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
