//! Pairwise filter policy evaluated for every overlapping shape pair.

use std::fmt::Debug;

use crate::filter_data::FilterData;
use crate::pair_flags::PairFlags;

/// The per-shape inputs a pair filter sees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShapeFilterInfo {
    pub filter: FilterData,
    pub is_trigger: bool,
}

impl ShapeFilterInfo {
    pub fn new(filter: FilterData, is_trigger: bool) -> Self {
        Self { filter, is_trigger }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterAction {
    /// The pair is discarded: no contact, no overlap, no events.
    Suppress,
    Accept,
}

/// How an evaluated pair is processed downstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairClassification {
    Suppressed,
    Trigger,
    Contact,
}

/// Result of evaluating a pair: the action plus the pair flags that gate its events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairDecision {
    pub action: FilterAction,
    pub flags: PairFlags,
    pub classification: PairClassification,
}

impl PairDecision {
    pub fn suppress(flags: PairFlags) -> Self {
        Self {
            action: FilterAction::Suppress,
            flags,
            classification: PairClassification::Suppressed,
        }
    }

    pub fn trigger(flags: PairFlags) -> Self {
        Self {
            action: FilterAction::Accept,
            flags,
            classification: PairClassification::Trigger,
        }
    }

    pub fn contact(flags: PairFlags) -> Self {
        Self {
            action: FilterAction::Accept,
            flags,
            classification: PairClassification::Contact,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.action == FilterAction::Accept
    }

    /// Flags that report events. Suppressed pairs report nothing regardless of bookkeeping
    /// flags.
    pub fn event_flags(&self) -> PairFlags {
        match self.action {
            FilterAction::Suppress => PairFlags::empty(),
            FilterAction::Accept => self.flags,
        }
    }
}

/// Strategy deciding whether two shapes interact and which events they raise.
///
/// Implementations must be pure: deterministic, symmetric in `a`/`b`, and callable
/// concurrently from the engine's narrow phase.
pub trait PairFilterPolicy: Send + Sync + Debug {
    fn classify(&self, a: &ShapeFilterInfo, b: &ShapeFilterInfo) -> PairDecision;
}

/// `true` when each shape's group bits hit the other's collision mask.
#[inline]
pub fn can_interact(a: &FilterData, b: &FilterData) -> bool {
    (a.word0 & b.word1) != 0 && (b.word0 & a.word1) != 0
}

/// Group/mask filtering with trigger and contact event gating from `word2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupMaskPairFilter;

impl PairFilterPolicy for GroupMaskPairFilter {
    fn classify(&self, a: &ShapeFilterInfo, b: &ShapeFilterInfo) -> PairDecision {
        if a.is_trigger && b.is_trigger {
            return PairDecision::suppress(PairFlags::TRIGGER_DEFAULT);
        }

        if !can_interact(&a.filter, &b.filter) {
            return PairDecision::suppress(PairFlags::CONTACT_DEFAULT);
        }

        let requested_a = a.filter.requested_events();
        let requested_b = b.filter.requested_events();

        if a.is_trigger || b.is_trigger {
            return PairDecision::trigger(requested_a & requested_b & PairFlags::TRIGGER_DEFAULT);
        }

        PairDecision::contact(
            PairFlags::CONTACT_DEFAULT | (PairFlags::CONTACT_NOTIFY & (requested_a | requested_b)),
        )
    }
}
