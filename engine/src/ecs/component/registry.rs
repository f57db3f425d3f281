use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicU32, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use log::debug;

use crate::ecs::{
    component::{Component, ComponentType, MAX_COMPONENT_TYPE},
    error::{Error, Result},
};

/// How a component type's storage is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A Rust type stored in a typed `ComponentArray<T>`.
    Static,
    /// A runtime-defined layout stored as raw bytes.
    Dynamic,
}

/// Metadata about a registered component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    id: ComponentType,
    name: Cow<'static, str>,
    size: usize,
    kind: ComponentKind,
}

impl ComponentInfo {
    fn of<C: Component>(id: ComponentType) -> Self {
        Self {
            id,
            name: Cow::Borrowed(type_name::<C>()),
            size: size_of::<C>(),
            kind: ComponentKind::Static,
        }
    }

    #[inline]
    pub fn id(&self) -> ComponentType {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes of one component value.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }
}

/// A thread-safe component type registry.
///
/// Assigns each component type a dense [`ComponentType`] id in registration order. Lookups are
/// lock-free reads on a `DashMap`; registration takes one map shard plus a short write lock on the
/// info table.
///
/// The registry is an explicit object rather than a process-wide counter: share one through an
/// `Arc` wherever several managers must agree on ids, and register types in a fixed order when
/// ids need to be reproducible.
#[derive(Debug)]
pub struct TypeRegistry {
    /// Rust types, keyed by `TypeId`.
    type_map: DashMap<TypeId, ComponentType>,

    /// Runtime-defined layouts, keyed by name.
    dynamic_map: DashMap<String, ComponentType>,

    /// Info per id. Protected by RwLock for rare writes.
    components: RwLock<Vec<Option<ComponentInfo>>>,

    /// Next available component id.
    next_id: AtomicU32,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            dynamic_map: DashMap::new(),
            components: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register a component type and get its id.
    ///
    /// Idempotent: an already registered type returns its existing id. Fails once
    /// [`MAX_COMPONENT_TYPE`] ids are in use.
    pub fn register<C: Component>(&self) -> Result<ComponentType> {
        let type_id = TypeId::of::<C>();

        // Fast path: already registered (lock-free read)
        if let Some(id) = self.type_map.get(&type_id) {
            return Ok(*id);
        }

        // Entry API so two racing threads cannot both allocate an id
        match self.type_map.entry(type_id) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let id = self.allocate(ComponentInfo::of::<C>)?;
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Register a runtime-defined component layout of `size` bytes under `name`.
    ///
    /// Registering the same name again returns the existing id, provided the size matches.
    pub fn register_dynamic(&self, name: &str, size: usize) -> Result<ComponentType> {
        if size == 0 {
            return Err(Error::InvalidArgument("component size must be non-zero"));
        }

        match self.dynamic_map.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                let expected = self.info(id).map_or(size, |info| info.size());
                if expected != size {
                    return Err(Error::LayoutMismatch {
                        expected,
                        actual: size,
                    });
                }
                Ok(id)
            }
            Entry::Vacant(entry) => {
                let id = self.allocate(|id| ComponentInfo {
                    id,
                    name: Cow::Owned(name.to_owned()),
                    size,
                    kind: ComponentKind::Dynamic,
                })?;
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Get the id of a registered Rust type.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<ComponentType> {
        self.type_map.get(&TypeId::of::<C>()).map(|entry| *entry)
    }

    /// Get the id of a registered dynamic layout by name.
    #[inline]
    pub fn get_dynamic(&self, name: &str) -> Option<ComponentType> {
        self.dynamic_map.get(name).map(|entry| *entry)
    }

    /// Get the id registered for a `TypeId`.
    #[inline]
    pub(crate) fn get_by_type_id(&self, type_id: TypeId) -> Option<ComponentType> {
        self.type_map.get(&type_id).map(|entry| *entry)
    }

    /// Get metadata for a component id.
    pub fn info(&self, id: ComponentType) -> Option<ComponentInfo> {
        let components = self.components.read().unwrap_or_else(PoisonError::into_inner);
        components.get(id.index()).and_then(Clone::clone)
    }

    /// Human readable name of a component id, for diagnostics.
    pub fn name(&self, id: ComponentType) -> Cow<'static, str> {
        self.info(id)
            .map_or_else(|| Cow::Owned(id.to_string()), |info| info.name)
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        (self.next_id.load(Ordering::Acquire) as usize).min(MAX_COMPONENT_TYPE)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(&self, info: impl FnOnce(ComponentType) -> ComponentInfo) -> Result<ComponentType> {
        let raw = self
            .next_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |id| {
                ((id as usize) < MAX_COMPONENT_TYPE).then_some(id + 1)
            })
            .map_err(|_| Error::TooManyComponentTypes)?;
        let id = ComponentType::new(raw as u8);
        let info = info(id);
        debug!("registered component {} as {id}", info.name());

        let mut components = self.components.write().unwrap_or_else(PoisonError::into_inner);
        if id.index() >= components.len() {
            components.resize(id.index() + 1, None);
        }
        components[id.index()] = Some(info);

        Ok(id)
    }
}
