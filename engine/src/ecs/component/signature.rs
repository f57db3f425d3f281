use std::fmt;

use crate::ecs::component::{ComponentType, MAX_COMPONENT_TYPE};

/// A fixed-width bitset over component type ids.
///
/// Bit `i` is set when the component with id `i` is present. Signatures are `Copy` and compare
/// by value, so they double as hash keys for group layouts. Ids past the bitset width are
/// ignored: setting them is a no-op and testing them is always false.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(u32);

const _: () = assert!(MAX_COMPONENT_TYPE <= u32::BITS as usize);

/// Mask of the bit for `ty`, empty when the id does not fit.
#[inline]
const fn bit(ty: ComponentType) -> u32 {
    match 1u32.checked_shl(ty.id() as u32) {
        Some(mask) => mask,
        None => 0,
    }
}

impl Signature {
    /// A signature with no bits set.
    pub const EMPTY: Self = Self(0);

    /// Construct a signature from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Get the raw bits.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Build a signature with every given component set.
    pub fn from_types(types: impl IntoIterator<Item = ComponentType>) -> Self {
        types
            .into_iter()
            .fold(Self::EMPTY, |signature, ty| signature.with(ty))
    }

    #[inline]
    pub fn set(&mut self, ty: ComponentType) {
        self.0 |= bit(ty);
    }

    #[inline]
    pub fn reset(&mut self, ty: ComponentType) {
        self.0 &= !bit(ty);
    }

    #[inline]
    pub const fn test(&self, ty: ComponentType) -> bool {
        self.0 & bit(ty) != 0
    }

    /// Copy of this signature with `ty` set.
    #[inline]
    pub const fn with(self, ty: ComponentType) -> Self {
        Self(self.0 | bit(ty))
    }

    /// Copy of this signature with `ty` cleared.
    #[inline]
    pub const fn without(self, ty: ComponentType) -> Self {
        Self(self.0 & !bit(ty))
    }

    /// Whether every bit of `other` is also set in `self`.
    #[inline]
    pub const fn contains_all(&self, other: &Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the set component types in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentType> + use<> {
        let bits = self.0;
        (0..MAX_COMPONENT_TYPE as u8)
            .filter(move |id| bits & (1 << id) != 0)
            .map(ComponentType::new)
    }
}

impl FromIterator<ComponentType> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentType>>(iter: I) -> Self {
        Self::from_types(iter)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|ty| ty.id())).finish()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}
