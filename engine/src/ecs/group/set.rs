use std::{
    any::{TypeId, type_name},
    marker::PhantomData,
};

use crate::ecs::{
    component::{Component, ComponentType},
    entity::Entity,
    error::{Error, Result},
    storage::{ComponentArray, ComponentStorage},
};

/// A borrowed storage slot, taken out at most once while assembling a group view.
pub type StorageSlot<'w> = Option<&'w mut Box<dyn ComponentStorage>>;

/// Type-level tuple position used to pick a component out of a [`ComponentSet`].
pub struct At<const N: usize>;

/// Marks a component located among a group's owned components.
pub struct InOwned<I>(PhantomData<I>);

/// Marks a component located among a group's non-owned components.
pub struct InJoined<I>(PhantomData<I>);

/// A list of component types forming one side of a group layout.
///
/// Implemented for single components, for tuples of up to 12 components, and for `()`.
pub trait ComponentSet: 'static {
    /// Borrowed arrays, one per component.
    type Arrays<'w>
    where
        Self: 'w;

    /// Shared references to one entity's components.
    type Item<'a>
    where
        Self: 'a;

    /// Mutable references to one entity's components.
    type ItemMut<'a>
    where
        Self: 'a;

    /// Number of component types in the set.
    const COUNT: usize;

    /// `TypeId` and name of each component, in layout order.
    fn type_ids() -> Vec<(TypeId, &'static str)>;

    /// Take the arrays of `types` (in layout order) out of `slots`.
    #[doc(hidden)]
    fn fetch_arrays<'w>(
        slots: &mut [StorageSlot<'w>],
        types: &[ComponentType],
    ) -> Result<Self::Arrays<'w>>;

    /// Look up `entity` in every array.
    #[doc(hidden)]
    fn fetch<'a>(arrays: &'a Self::Arrays<'_>, entity: Entity) -> Result<Self::Item<'a>>;

    /// Read the dense slot `index` of every array.
    #[doc(hidden)]
    fn fetch_index<'a>(arrays: &'a Self::Arrays<'_>, index: usize) -> Result<Self::Item<'a>>;

    /// Mutably read the dense slot `index` of every array.
    #[doc(hidden)]
    fn fetch_index_mut<'a>(
        arrays: &'a mut Self::Arrays<'_>,
        index: usize,
    ) -> Result<Self::ItemMut<'a>>;

    /// Reorder the grouped region of every array.
    #[doc(hidden)]
    fn reorder(arrays: &mut Self::Arrays<'_>, order: &[Entity]) -> Result<()>;
}

/// A non-empty [`ComponentSet`], usable as the owned side of a group.
pub trait OwnedSet: ComponentSet {
    /// The array whose dense order drives iteration.
    #[doc(hidden)]
    fn driving<'a>(arrays: &'a Self::Arrays<'_>) -> &'a dyn ComponentStorage;
}

/// Compile-time selection of component `T` at position `I` of a set.
pub trait Select<T: Component, I>: ComponentSet {
    #[doc(hidden)]
    fn select<'a>(arrays: &'a Self::Arrays<'_>) -> &'a ComponentArray<T>;

    #[doc(hidden)]
    fn select_mut<'a>(arrays: &'a mut Self::Arrays<'_>) -> &'a mut ComponentArray<T>;
}

/// Compile-time selection of component `T` from either side of a group layout `(Owned, NonOwned)`.
pub trait Locate<T: Component, M> {
    type Owned: OwnedSet;
    type Joined: ComponentSet;

    #[doc(hidden)]
    fn locate<'a>(
        owned: &'a <Self::Owned as ComponentSet>::Arrays<'_>,
        joined: &'a <Self::Joined as ComponentSet>::Arrays<'_>,
    ) -> &'a ComponentArray<T>;
}

impl<T, I, O, N> Locate<T, InOwned<I>> for (O, N)
where
    T: Component,
    O: OwnedSet + Select<T, I>,
    N: ComponentSet,
{
    type Owned = O;
    type Joined = N;

    #[inline]
    fn locate<'a>(owned: &'a O::Arrays<'_>, _: &'a N::Arrays<'_>) -> &'a ComponentArray<T> {
        O::select(owned)
    }
}

impl<T, I, O, N> Locate<T, InJoined<I>> for (O, N)
where
    T: Component,
    O: OwnedSet,
    N: ComponentSet + Select<T, I>,
{
    type Owned = O;
    type Joined = N;

    #[inline]
    fn locate<'a>(_: &'a O::Arrays<'_>, joined: &'a N::Arrays<'_>) -> &'a ComponentArray<T> {
        N::select(joined)
    }
}

/// Take the typed array for `ty` out of `slots`.
fn take_array<'w, T: Component>(
    slots: &mut [StorageSlot<'w>],
    ty: Option<ComponentType>,
) -> Result<&'w mut ComponentArray<T>> {
    let ty = ty.ok_or_else(|| Error::internal("group layout is missing a component type"))?;
    let storage = slots
        .get_mut(ty.index())
        .and_then(Option::take)
        .ok_or_else(|| Error::not_registered(type_name::<T>()))?;
    storage
        .as_any_mut()
        .downcast_mut::<ComponentArray<T>>()
        .ok_or_else(|| {
            Error::internal(format!(
                "storage {ty} does not hold {} components",
                type_name::<T>()
            ))
        })
}

impl ComponentSet for () {
    type Arrays<'w> = ();
    type Item<'a> = ();
    type ItemMut<'a> = ();

    const COUNT: usize = 0;

    fn type_ids() -> Vec<(TypeId, &'static str)> {
        Vec::new()
    }

    fn fetch_arrays<'w>(_: &mut [StorageSlot<'w>], _: &[ComponentType]) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn fetch<'a>(_: &'a (), _: Entity) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn fetch_index<'a>(_: &'a (), _: usize) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn fetch_index_mut<'a>(_: &'a mut (), _: usize) -> Result<()> {
        Ok(())
    }

    fn reorder(_: &mut (), _: &[Entity]) -> Result<()> {
        Ok(())
    }
}

impl<C: Component> ComponentSet for C {
    type Arrays<'w> = &'w mut ComponentArray<C>;
    type Item<'a> = &'a C;
    type ItemMut<'a> = &'a mut C;

    const COUNT: usize = 1;

    fn type_ids() -> Vec<(TypeId, &'static str)> {
        vec![(TypeId::of::<C>(), type_name::<C>())]
    }

    fn fetch_arrays<'w>(
        slots: &mut [StorageSlot<'w>],
        types: &[ComponentType],
    ) -> Result<&'w mut ComponentArray<C>> {
        take_array::<C>(slots, types.first().copied())
    }

    #[inline]
    fn fetch<'a>(arrays: &'a &mut ComponentArray<C>, entity: Entity) -> Result<&'a C> {
        arrays.get(entity)
    }

    #[inline]
    fn fetch_index<'a>(arrays: &'a &mut ComponentArray<C>, index: usize) -> Result<&'a C> {
        arrays.get_at(index)
    }

    #[inline]
    fn fetch_index_mut<'a>(
        arrays: &'a mut &mut ComponentArray<C>,
        index: usize,
    ) -> Result<&'a mut C> {
        arrays.get_at_mut(index)
    }

    fn reorder(arrays: &mut &mut ComponentArray<C>, order: &[Entity]) -> Result<()> {
        arrays.reorder_group(order)
    }
}

impl<C: Component> OwnedSet for C {
    #[inline]
    fn driving<'a>(arrays: &'a &mut ComponentArray<C>) -> &'a dyn ComponentStorage {
        &**arrays
    }
}

impl<C: Component> Select<C, At<0>> for C {
    #[inline]
    fn select<'a>(arrays: &'a &mut ComponentArray<C>) -> &'a ComponentArray<C> {
        arrays
    }

    #[inline]
    fn select_mut<'a>(arrays: &'a mut &mut ComponentArray<C>) -> &'a mut ComponentArray<C> {
        arrays
    }
}

/// Implement `Select` for one position of a tuple. The full tuple travels as `[A, B, ..]`.
macro_rules! select_impl {
    ([$($all:ident),*]; $name:ident, $index:tt) => {
        impl<$($all: Component),*> Select<$name, At<$index>> for ($($all,)*) {
            #[inline]
            fn select<'a>(arrays: &'a Self::Arrays<'_>) -> &'a ComponentArray<$name> {
                &*arrays.$index
            }

            #[inline]
            fn select_mut<'a>(arrays: &'a mut Self::Arrays<'_>) -> &'a mut ComponentArray<$name> {
                &mut *arrays.$index
            }
        }
    };
}

/// Implement the component set traits for a tuple of `(Type, index)` pairs.
macro_rules! tuple_component_set {
    ($(($name:ident, $index:tt)),*) => {
        impl<$($name: Component),*> ComponentSet for ($($name,)*) {
            type Arrays<'w> = ($(&'w mut ComponentArray<$name>,)*);
            type Item<'a> = ($(&'a $name,)*);
            type ItemMut<'a> = ($(&'a mut $name,)*);

            const COUNT: usize = [$($index),*].len();

            fn type_ids() -> Vec<(TypeId, &'static str)> {
                vec![$((TypeId::of::<$name>(), type_name::<$name>())),*]
            }

            fn fetch_arrays<'w>(
                slots: &mut [StorageSlot<'w>],
                types: &[ComponentType],
            ) -> Result<Self::Arrays<'w>> {
                Ok(($(take_array::<$name>(slots, types.get($index).copied())?,)*))
            }

            #[inline]
            fn fetch<'a>(arrays: &'a Self::Arrays<'_>, entity: Entity) -> Result<Self::Item<'a>> {
                Ok(($(arrays.$index.get(entity)?,)*))
            }

            #[inline]
            fn fetch_index<'a>(arrays: &'a Self::Arrays<'_>, index: usize) -> Result<Self::Item<'a>> {
                Ok(($(arrays.$index.get_at(index)?,)*))
            }

            #[inline]
            fn fetch_index_mut<'a>(
                arrays: &'a mut Self::Arrays<'_>,
                index: usize,
            ) -> Result<Self::ItemMut<'a>> {
                Ok(($(arrays.$index.get_at_mut(index)?,)*))
            }

            fn reorder(arrays: &mut Self::Arrays<'_>, order: &[Entity]) -> Result<()> {
                $(arrays.$index.reorder_group(order)?;)*
                Ok(())
            }
        }

        impl<$($name: Component),*> OwnedSet for ($($name,)*) {
            #[inline]
            fn driving<'a>(arrays: &'a Self::Arrays<'_>) -> &'a dyn ComponentStorage {
                &*arrays.0
            }
        }

        tuple_select!([$($name),*] $(($name, $index))*);
    };
}

/// Implement `Select` for every position of a tuple.
macro_rules! tuple_select {
    ($all:tt $(($name:ident, $index:tt))*) => {
        $(select_impl!($all; $name, $index);)*
    };
}

crate::all_tuples!(tuple_component_set);
