//! Error type shared by every fallible ECS operation.

use std::borrow::Cow;

use crate::ecs::{
    component::{MAX_COMPONENT_TYPE, Signature},
    entity::{Entity, MAX_ENTITIES},
    group::GroupKey,
};

/// Errors raised by component storage, the component manager, groups and the world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The entity has no component in the queried array.
    #[error("component not found for: {0}")]
    ComponentNotFound(Entity),

    /// The component type was used before being registered with the manager.
    #[error("component `{0}` has not been registered before use")]
    ComponentNotRegistered(Cow<'static, str>),

    /// An index or entity id fell outside of the valid range.
    #[error("index {0} is out of range")]
    OutOfRange(usize),

    /// A new group tried to own a component that another group already owns.
    #[error("group owning {0} overlaps the owned components of an existing group")]
    OverlappingGroups(Signature),

    /// No group matches the requested layout.
    #[error("no group registered for {0}")]
    GroupNotFound(GroupKey),

    /// An internal invariant did not hold.
    #[error("internal error: {0}")]
    Internal(Cow<'static, str>),

    /// The entity was never created or has already been destroyed.
    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    /// Every entity id below the entity limit is in use.
    #[error("cannot allocate more than {} entities", MAX_ENTITIES)]
    TooManyEntities,

    /// Every component type id is in use.
    #[error("cannot register more than {} component types", MAX_COMPONENT_TYPE)]
    TooManyComponentTypes,

    /// Raw component bytes do not match the layout the array was created with.
    #[error("component layout mismatch: expected {expected} bytes, got {actual}")]
    LayoutMismatch { expected: usize, actual: usize },

    /// A caller supplied argument is not usable.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A group layout names the same component more than once.
    #[error("component `{0}` appears more than once in a group layout")]
    DuplicateGroupComponent(Cow<'static, str>),

    /// A unique value of this type is already stored.
    #[error("unique `{0}` is already registered")]
    UniqueAlreadyRegistered(&'static str),

    /// No unique value of this type is stored.
    #[error("unique `{0}` has not been registered")]
    UniqueNotRegistered(&'static str),
}

impl Error {
    /// Build an [`Error::Internal`] from a static or owned message.
    #[inline]
    pub(crate) fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(message.into())
    }

    /// Build an [`Error::ComponentNotRegistered`] from a type or component name.
    #[inline]
    pub(crate) fn not_registered(name: impl Into<Cow<'static, str>>) -> Self {
        Self::ComponentNotRegistered(name.into())
    }
}

/// Result alias used across the ECS.
pub type Result<T> = std::result::Result<T, Error>;
