//! Entity handles and id allocation.
//!
//! An [`Entity`] is nothing more than a small integer. It carries no data of its own; it is the
//! key every component array is indexed by. Component arrays size their sparse maps by entity id,
//! so ids are kept compact: the [`Allocator`] hands out sequential ids and recycles freed ones
//! before minting new ids.
//!
//! ```rust,ignore
//! let allocator = Allocator::new();
//! let a = allocator.alloc()?; // Entity(0)
//! allocator.free(a);
//! let b = allocator.alloc()?; // Entity(0) again, recycled from the dead pool
//! ```
//!
//! Ids never reach [`MAX_ENTITIES`]; allocation fails with [`Error::TooManyEntities`] instead.

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use crossbeam::queue::SegQueue;

use crate::ecs::error::{Error, Result};

/// Upper bound (exclusive) on entity ids.
pub const MAX_ENTITIES: u32 = 500_000;

/// An entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Sentinel for "no entity". Never handed out by the allocator.
    pub const INVALID: Self = Self(u32::MAX);

    /// Construct an entity from a raw id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id of this entity.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    /// Get the index of this entity if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Whether the id lies inside the allocatable range.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 < MAX_ENTITIES
    }
}

impl From<u32> for Entity {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An allocator for entities.
///
/// Allocates unique entity ids and recycles freed ids to keep the id space compact. Allocation
/// and freeing are lock-free, so a shared allocator can hand out ids from several threads.
#[derive(Default, Debug)]
pub struct Allocator {
    /// Pool of ids available for reuse.
    dead_pool: SegQueue<Entity>,

    /// Next fresh id to allocate.
    next_id: AtomicU32,

    /// Number of entities currently handed out.
    living: AtomicU32,
}

impl Allocator {
    /// Construct a new entity allocator starting from id 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            dead_pool: SegQueue::new(),
            next_id: AtomicU32::new(0),
            living: AtomicU32::new(0),
        }
    }

    /// Allocate a new entity, either by reusing a freed id from the dead pool or by allocating a
    /// fresh one.
    pub fn alloc(&self) -> Result<Entity> {
        let entity = match self.dead_pool.pop() {
            Some(entity) => entity,
            None => self
                .next_id
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |id| {
                    (id < MAX_ENTITIES).then_some(id + 1)
                })
                .map(Entity::new)
                .map_err(|_| Error::TooManyEntities)?,
        };
        self.living.fetch_add(1, Ordering::Relaxed);
        Ok(entity)
    }

    /// Allocate many entities at once.
    ///
    /// Either every entity is allocated or, on exhaustion, the ones taken so far are returned to
    /// the pool and the error is reported.
    pub fn alloc_many(&self, count: usize) -> Result<Vec<Entity>> {
        let mut alloced = Vec::with_capacity(count);
        for _ in 0..count {
            match self.alloc() {
                Ok(entity) => alloced.push(entity),
                Err(error) => {
                    for entity in alloced {
                        self.free(entity);
                    }
                    return Err(error);
                }
            }
        }
        Ok(alloced)
    }

    /// Free an entity for reuse.
    pub fn free(&self, entity: Entity) {
        self.dead_pool.push(entity);
        self.living.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of entities currently alive.
    #[inline]
    pub fn living(&self) -> u32 {
        self.living.load(Ordering::Relaxed)
    }
}
