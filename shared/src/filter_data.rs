//! Per-shape filter words and their packed engine representation.

use crate::constants::{DEFAULT_FILTER_GROUP, DEFAULT_FILTER_MASK};
use crate::pair_flags::PairFlags;

/// The packed form of a [`FilterData`] stored as a collider's 128-bit user data.
///
/// # Bit layout
/// Least-significant bit = bit 0:
///
/// - bits 0..=31   : `word0` (group bits)
/// - bits 32..=63  : `word1` (collision mask)
/// - bits 64..=95  : `word2` (requested pair events)
/// - bits 96..=127 : `word3` (reserved, carried unchanged)
///
/// # Compatibility
/// The layout is read back by the engine hooks on every pair evaluation; both sides must agree.
pub type PackedFilter = u128;

/// Four 32-bit filter words attached to every shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterData {
    /// Groups this shape belongs to.
    pub word0: u32,
    /// Groups this shape collides with.
    pub word1: u32,
    /// Requested pair events, in [`PairFlags`] bit positions.
    pub word2: u32,
    pub word3: u32,
}

impl FilterData {
    pub const fn new(word0: u32, word1: u32, word2: u32, word3: u32) -> Self {
        Self {
            word0,
            word1,
            word2,
            word3,
        }
    }

    /// Filter used for shapes created without an explicit one: member of the default group,
    /// colliding with everything and requesting the contact notification set.
    pub fn standard() -> Self {
        Self::new(
            DEFAULT_FILTER_GROUP,
            DEFAULT_FILTER_MASK,
            PairFlags::CONTACT_NOTIFY.bits,
            0,
        )
    }

    /// Replace the simulation words (`word0`, `word1`), keeping event and reserved words.
    pub fn with_simulation(mut self, group: u32, mask: u32) -> Self {
        self.word0 = group;
        self.word1 = mask;
        self
    }

    /// Replace the requested-event word (`word2`).
    pub fn with_events(mut self, events: PairFlags) -> Self {
        self.word2 = events.bits;
        self
    }

    pub fn requested_events(&self) -> PairFlags {
        PairFlags::new(self.word2)
    }

    pub fn pack(&self) -> PackedFilter {
        (self.word0 as u128)
            | ((self.word1 as u128) << 32)
            | ((self.word2 as u128) << 64)
            | ((self.word3 as u128) << 96)
    }

    pub fn unpack(packed: PackedFilter) -> Self {
        const WORD_MASK: u128 = u32::MAX as u128;
        Self {
            word0: (packed & WORD_MASK) as u32,
            word1: ((packed >> 32) & WORD_MASK) as u32,
            word2: ((packed >> 64) & WORD_MASK) as u32,
            word3: ((packed >> 96) & WORD_MASK) as u32,
        }
    }
}

impl From<FilterData> for PackedFilter {
    fn from(filter: FilterData) -> Self {
        filter.pack()
    }
}

impl From<PackedFilter> for FilterData {
    fn from(packed: PackedFilter) -> Self {
        Self::unpack(packed)
    }
}
