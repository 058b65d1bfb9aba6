use core::ops::{BitAnd, BitOr, Not};

use num_traits::{One, PrimInt};

/// Trait implemented by user-defined flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// You choose the backing integer type via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // Equivalent to: 1 << index
        // NOTE: Ensure your `bit_index()` is < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A pure bitmask container.
///
/// Set algebra (`&`, `|`, `!`) operates on whole masks so that policies can combine
/// requested/default sets without unpacking individual flags.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub const fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    /// Build a mask from a list of tags.
    pub fn from_tags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::empty();
        flags.add_many(tags);
        flags
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    // --- Single Tag Operations ---
    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    // --- Bulk Operations ---
    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    // --- Logic Gates ---
    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, tags: &[U]) -> bool {
        if tags.is_empty() {
            return true;
        }
        let combined = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        (self.bits & combined) == combined
    }

    // --- Mask Operations ---
    /// True if every bit of `other` is set in `self`.
    pub fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// True if `self` and `other` share at least one bit.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }
}

impl<T: PrimInt> BitAnd for BitmaskFlags<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::new(self.bits & rhs.bits)
    }
}

impl<T: PrimInt> BitOr for BitmaskFlags<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::new(self.bits | rhs.bits)
    }
}

impl<T: PrimInt> Not for BitmaskFlags<T> {
    type Output = Self;

    fn not(self) -> Self {
        Self::new(!self.bits)
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Variants are assigned bit indices in declaration order, so keep the list stable when
/// the bit positions are part of a wire format.
///
/// Example:
/// ```rust
/// relay_shared::define_bitmask_flags!(UnitStatus, u16, {
///     IsFriendly,
///     InCombat,
///     Stunned,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_bitmask_flags!(Tint, u8, { Red, Green, Blue });

    #[test]
    fn tags_map_to_declaration_order_bits() {
        assert_eq!(Tint::Red.mask(), 0b001);
        assert_eq!(Tint::Green.mask(), 0b010);
        assert_eq!(Tint::Blue.mask(), 0b100);
    }

    #[test]
    fn add_and_query_single_tags() {
        let mut flags = BitmaskFlags::<u8>::empty();
        assert!(flags.is_empty());
        flags.add(Tint::Green);
        assert!(flags.has(Tint::Green));
        assert!(!flags.has(Tint::Red));
    }

    #[test]
    fn mask_algebra_matches_raw_bits() {
        let rg = BitmaskFlags::from_tags(&[Tint::Red, Tint::Green]);
        let gb = BitmaskFlags::from_tags(&[Tint::Green, Tint::Blue]);

        assert_eq!((rg & gb).bits, 0b010);
        assert_eq!((rg | gb).bits, 0b111);
        assert!(rg.intersects(gb));
        assert!((rg | gb).contains(rg));
        assert!(!rg.contains(gb));
        assert_eq!((!rg & gb).bits, 0b100);
    }

    #[test]
    fn has_all_accepts_an_empty_list() {
        let mut flags = BitmaskFlags::from_tags(&[Tint::Blue]);
        assert!(flags.has_all::<Tint>(&[]));
        assert!(!flags.has_all(&[Tint::Red, Tint::Blue]));

        flags.add_many(&[Tint::Red]);
        assert!(flags.has_all(&[Tint::Red, Tint::Blue]));
    }
}
