//! Type-erased storage for unique values.
//!
//! [`Uniques`] maps each [`Unique`] type to at most one boxed value. Lookups go through the
//! [`TypeId`] directly, so uniques never take a [`crate::ecs::ComponentType`] id and never
//! appear in entity signatures.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use crate::ecs::unique::Unique;

/// Heterogeneous singleton store keyed by type.
#[derive(Default)]
pub struct Uniques {
    data: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Uniques {
    #[inline]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Store `value`, returning the value of the same type it replaces.
    pub fn insert<U: Unique>(&mut self, value: U) -> Option<U> {
        self.data
            .insert(TypeId::of::<U>(), Box::new(value))
            .and_then(|previous| (previous as Box<dyn Any>).downcast::<U>().ok())
            .map(|boxed| *boxed)
    }

    #[inline]
    pub fn get<U: Unique>(&self) -> Option<&U> {
        self.data
            .get(&TypeId::of::<U>())
            .and_then(|stored| stored.downcast_ref::<U>())
    }

    #[inline]
    pub fn get_mut<U: Unique>(&mut self) -> Option<&mut U> {
        self.data
            .get_mut(&TypeId::of::<U>())
            .and_then(|stored| stored.downcast_mut::<U>())
    }

    /// Take the value of type `U` out of the store.
    pub fn remove<U: Unique>(&mut self) -> Option<U> {
        self.data
            .remove(&TypeId::of::<U>())
            .and_then(|stored| (stored as Box<dyn Any>).downcast::<U>().ok())
            .map(|boxed| *boxed)
    }

    #[inline]
    pub fn contains<U: Unique>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<U>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use sparse_macros::Unique;

    use super::*;

    #[derive(Unique, Debug, PartialEq)]
    struct FrameTime {
        elapsed: f32,
        delta: f32,
    }

    #[derive(Unique, Debug, PartialEq)]
    struct Score(u32);

    #[test]
    fn new_store_is_empty() {
        let uniques = Uniques::new();

        assert!(uniques.is_empty());
        assert!(uniques.get::<Score>().is_none());
    }

    #[test]
    fn insert_replaces_and_returns_the_previous_value() {
        // Given
        let mut uniques = Uniques::new();

        // When
        let first = uniques.insert(Score(10));
        let second = uniques.insert(Score(20));

        // Then
        assert_eq!(first, None);
        assert_eq!(second, Some(Score(10)));
        assert_eq!(uniques.get::<Score>(), Some(&Score(20)));
        assert_eq!(uniques.len(), 1);
    }

    #[test]
    fn types_are_stored_independently() {
        // Given
        let mut uniques = Uniques::new();
        uniques.insert(Score(1));
        uniques.insert(FrameTime {
            elapsed: 0.0,
            delta: 0.5,
        });

        // When
        {
            let time = uniques.get_mut::<FrameTime>().unwrap();
            time.elapsed += time.delta;
        }
        let removed = uniques.remove::<Score>();

        // Then
        assert_eq!(removed, Some(Score(1)));
        assert!(!uniques.contains::<Score>());
        assert_eq!(uniques.get::<FrameTime>().map(|time| time.elapsed), Some(0.5));
        assert_eq!(uniques.len(), 1);
        assert_eq!(uniques.remove::<Score>(), None);
    }
}
