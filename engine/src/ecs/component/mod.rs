//! Component types, signatures and type registration.
//!
//! Components are the plain data records attached to entities. Each registered component type
//! receives a small dense [`ComponentType`] id from a [`TypeRegistry`]; a [`Signature`] is a bitset
//! over those ids describing which components an entity (or a group) has.
//!
//! ## Usage
//!
//! ```ignore
//! use sparse_ecs::ecs::component::TypeRegistry;
//! use sparse_macros::Component;
//!
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = TypeRegistry::new();
//! let position = registry.register::<Position>()?;
//! ```

use std::fmt;

mod registry;
mod signature;

pub use registry::{ComponentInfo, ComponentKind, TypeRegistry};
pub use signature::Signature;

/// Maximum number of distinct component types.
pub const MAX_COMPONENT_TYPE: usize = 32;

/// A component type identifier, dense in `0..MAX_COMPONENT_TYPE`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentType(u8);

impl ComponentType {
    /// Construct a component type from a raw id.
    #[inline]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[inline]
    pub const fn id(&self) -> u8 {
        self.0
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for ComponentType {
    #[inline]
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A trait representing a component.
///
/// At present this only sets the required trait bounds for a type to be used as a component.
/// Use `#[derive(Component)]` from `sparse_macros` to implement it.
pub trait Component: 'static + Sized + Send + Sync {}
