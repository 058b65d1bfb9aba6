/*!
Identifier-keyed event records and the raw per-step notifications they are built from.

Raw notifications are generic over the engine's shape (`S`) and actor (`A`) handle types so
this crate stays engine-agnostic; the aggregator turns them into records keyed by
[`Identifier`]s.
*/

use crate::constants::MAX_CONTACT_POINTS;
use crate::pair_flags::PairFlags;
use crate::types::{Identifier, Vec3};

/// One contact point copied out of an engine manifold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    /// World-space position.
    pub position: Vec3,
    /// World-space normal, pointing from shape A towards shape B.
    pub normal: Vec3,
    /// Impulse applied along the normal during the step.
    pub impulse: Vec3,
}

impl Default for ContactPoint {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            normal: Vec3::zeros(),
            impulse: Vec3::zeros(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerPhase {
    Begin,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactPhase {
    Begin,
    Persist,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerRecord {
    pub trigger_shape: Identifier,
    pub trigger_actor: Identifier,
    pub other_shape: Identifier,
    pub other_actor: Identifier,
    pub phase: TriggerPhase,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactRecord {
    pub shape_a: Identifier,
    pub shape_b: Identifier,
    /// Number of valid entries in `points`, never above [`MAX_CONTACT_POINTS`].
    pub contact_count: u8,
    pub points: [ContactPoint; MAX_CONTACT_POINTS],
    pub phase: ContactPhase,
}

impl ContactRecord {
    /// Build a record, keeping at most [`MAX_CONTACT_POINTS`] points in the given order.
    pub fn new(
        shape_a: Identifier,
        shape_b: Identifier,
        phase: ContactPhase,
        raw: &[ContactPoint],
    ) -> Self {
        let mut points = [ContactPoint::default(); MAX_CONTACT_POINTS];
        let count = raw.len().min(MAX_CONTACT_POINTS);
        points[..count].copy_from_slice(&raw[..count]);
        Self {
            shape_a,
            shape_b,
            contact_count: count as u8,
            points,
            phase,
        }
    }

    /// The valid contact points.
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.points[..self.contact_count as usize]
    }
}

/// Delivery categories, in the order a flush emits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    Wake,
    Sleep,
    TriggerBegin,
    TriggerEnd,
    ContactBegin,
    ContactPersist,
    ContactEnd,
}

impl EventCategory {
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Wake,
        EventCategory::Sleep,
        EventCategory::TriggerBegin,
        EventCategory::TriggerEnd,
        EventCategory::ContactBegin,
        EventCategory::ContactPersist,
        EventCategory::ContactEnd,
    ];
}

/// One category's records for one step. Never empty when delivered.
#[derive(Clone, Debug, PartialEq)]
pub enum EventBatch {
    Wake(Vec<Identifier>),
    Sleep(Vec<Identifier>),
    TriggerBegin(Vec<TriggerRecord>),
    TriggerEnd(Vec<TriggerRecord>),
    ContactBegin(Vec<ContactRecord>),
    ContactPersist(Vec<ContactRecord>),
    ContactEnd(Vec<ContactRecord>),
}

impl EventBatch {
    pub fn category(&self) -> EventCategory {
        match self {
            EventBatch::Wake(_) => EventCategory::Wake,
            EventBatch::Sleep(_) => EventCategory::Sleep,
            EventBatch::TriggerBegin(_) => EventCategory::TriggerBegin,
            EventBatch::TriggerEnd(_) => EventCategory::TriggerEnd,
            EventBatch::ContactBegin(_) => EventCategory::ContactBegin,
            EventBatch::ContactPersist(_) => EventCategory::ContactPersist,
            EventBatch::ContactEnd(_) => EventCategory::ContactEnd,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EventBatch::Wake(ids) | EventBatch::Sleep(ids) => ids.len(),
            EventBatch::TriggerBegin(r) | EventBatch::TriggerEnd(r) => r.len(),
            EventBatch::ContactBegin(r) | EventBatch::ContactPersist(r) | EventBatch::ContactEnd(r) => {
                r.len()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A trigger overlap change reported by the engine for one step.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTriggerPair<S, A> {
    pub trigger_shape: S,
    pub trigger_actor: Option<A>,
    pub other_shape: S,
    pub other_actor: Option<A>,
    /// Touch bits reported for this pair, already gated by the pair filter.
    pub status: PairFlags,
}

/// A contact pair reported by the engine for one step.
#[derive(Clone, Debug, PartialEq)]
pub struct RawContactPair<S> {
    pub shapes: [S; 2],
    /// Touch bits reported for this pair, already gated by the pair filter.
    pub events: PairFlags,
    /// Points as reported by the engine; may exceed [`MAX_CONTACT_POINTS`].
    pub points: Vec<ContactPoint>,
}

/// Everything the engine reported during one step, in emission order.
#[derive(Clone, Debug, PartialEq)]
pub struct StepNotifications<S, A> {
    pub woken: Vec<A>,
    pub slept: Vec<A>,
    pub triggers: Vec<RawTriggerPair<S, A>>,
    pub contacts: Vec<RawContactPair<S>>,
}

impl<S, A> StepNotifications<S, A> {
    pub fn new() -> Self {
        Self {
            woken: Vec::new(),
            slept: Vec::new(),
            triggers: Vec::new(),
            contacts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.woken.is_empty()
            && self.slept.is_empty()
            && self.triggers.is_empty()
            && self.contacts.is_empty()
    }
}

impl<S, A> Default for StepNotifications<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32) -> ContactPoint {
        ContactPoint {
            position: Vec3::new(x, 0.0, 0.0),
            normal: Vec3::y(),
            impulse: Vec3::zeros(),
        }
    }

    #[test]
    fn six_raw_points_clamp_to_four() {
        let raw: Vec<_> = (0..6).map(|i| point(i as f32)).collect();

        let record = ContactRecord::new(1, 2, ContactPhase::Begin, &raw);

        assert_eq!(record.contact_count, 4);
        assert_eq!(record.contacts(), &raw[..4]);
    }

    #[test]
    fn unused_point_slots_stay_zeroed() {
        let record = ContactRecord::new(1, 2, ContactPhase::Persist, &[point(3.0)]);

        assert_eq!(record.contacts().len(), 1);
        assert_eq!(record.points[1], ContactPoint::default());
    }

    #[test]
    fn end_record_without_points_has_zero_count() {
        let record = ContactRecord::new(1, 2, ContactPhase::End, &[]);
        assert_eq!(record.contact_count, 0);
        assert!(record.contacts().is_empty());
    }

    #[test]
    fn categories_are_listed_in_delivery_order() {
        let mut sorted = EventCategory::ALL;
        sorted.sort();
        assert_eq!(sorted, EventCategory::ALL);
    }
}
