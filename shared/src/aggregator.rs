/*!
Per-step event aggregation.

The aggregator receives the raw wake/sleep/trigger/contact notifications of one step,
resolves every handle to its [`Identifier`] and groups the resulting records by category.
`flush` hands each non-empty category to an [`EventSink`] in a fixed order and resets the
aggregator for the next step; nothing accumulates across steps.

Lifecycle: `Idle -> Collecting -> Flushed -> Idle`.
*/

use crate::error::{IdentifierKind, MarshalError};
use crate::events::{
    ContactPhase, ContactRecord, EventBatch, RawContactPair, RawTriggerPair, StepNotifications,
    TriggerPhase, TriggerRecord,
};
use crate::identifier::{IdentifierLookup, UnresolvedPolicy};
use crate::pair_flags::PairFlags;
use crate::sink::EventSink;
use crate::types::Identifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatorPhase {
    Idle,
    Collecting,
    Flushed,
}

/// Summary of one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Batches handed to the sink.
    pub batches: usize,
    /// Records (identifiers for wake/sleep) across all delivered batches.
    pub records: usize,
    /// Records skipped because an identifier could not be resolved.
    pub dropped_unresolved: usize,
    /// Pairs skipped because they reported touch-found and touch-lost together.
    pub rejected_conflicting: usize,
}

#[derive(Debug)]
pub struct EventAggregator {
    phase: AggregatorPhase,
    policy: UnresolvedPolicy,
    wake: Vec<Identifier>,
    sleep: Vec<Identifier>,
    trigger_begin: Vec<TriggerRecord>,
    trigger_end: Vec<TriggerRecord>,
    contact_begin: Vec<ContactRecord>,
    contact_persist: Vec<ContactRecord>,
    contact_end: Vec<ContactRecord>,
    dropped_unresolved: usize,
    rejected_conflicting: usize,
    first_unresolved: Option<MarshalError>,
}

impl EventAggregator {
    pub fn new(policy: UnresolvedPolicy) -> Self {
        Self {
            phase: AggregatorPhase::Idle,
            policy,
            wake: Vec::new(),
            sleep: Vec::new(),
            trigger_begin: Vec::new(),
            trigger_end: Vec::new(),
            contact_begin: Vec::new(),
            contact_persist: Vec::new(),
            contact_end: Vec::new(),
            dropped_unresolved: 0,
            rejected_conflicting: 0,
            first_unresolved: None,
        }
    }

    pub fn phase(&self) -> AggregatorPhase {
        self.phase
    }

    pub fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// Feed every notification of a step, in emission order.
    pub fn collect<L: IdentifierLookup>(
        &mut self,
        lookup: &L,
        notifications: &StepNotifications<L::Shape, L::Actor>,
    ) {
        self.on_wake(lookup, &notifications.woken);
        self.on_sleep(lookup, &notifications.slept);
        for pair in &notifications.triggers {
            self.on_trigger(lookup, pair);
        }
        for pair in &notifications.contacts {
            self.on_contact(lookup, pair);
        }
    }

    pub fn on_wake<L: IdentifierLookup>(&mut self, lookup: &L, actors: &[L::Actor]) {
        self.begin_collecting();
        for &actor in actors {
            match lookup.resolve_actor(actor) {
                Ok(id) => self.wake.push(id),
                Err(err) => self.note_unresolved(err),
            }
        }
    }

    pub fn on_sleep<L: IdentifierLookup>(&mut self, lookup: &L, actors: &[L::Actor]) {
        self.begin_collecting();
        for &actor in actors {
            match lookup.resolve_actor(actor) {
                Ok(id) => self.sleep.push(id),
                Err(err) => self.note_unresolved(err),
            }
        }
    }

    pub fn on_trigger<L: IdentifierLookup>(
        &mut self,
        lookup: &L,
        pair: &RawTriggerPair<L::Shape, L::Actor>,
    ) {
        self.begin_collecting();
        let found = pair.status.intersects(PairFlags::TOUCH_FOUND);
        let lost = pair.status.intersects(PairFlags::TOUCH_LOST);
        if found && lost {
            self.reject_conflicting(pair.trigger_shape, pair.other_shape);
            return;
        }
        let phase = match (found, lost) {
            (true, _) => TriggerPhase::Begin,
            (_, true) => TriggerPhase::End,
            _ => return,
        };

        match trigger_record(lookup, pair, phase) {
            Ok(record) => match phase {
                TriggerPhase::Begin => self.trigger_begin.push(record),
                TriggerPhase::End => self.trigger_end.push(record),
            },
            Err(err) => self.note_unresolved(err),
        }
    }

    pub fn on_contact<L: IdentifierLookup>(&mut self, lookup: &L, pair: &RawContactPair<L::Shape>) {
        self.begin_collecting();
        let found = pair.events.intersects(PairFlags::TOUCH_FOUND | PairFlags::TOUCH_CCD);
        let persists = pair.events.intersects(PairFlags::TOUCH_PERSISTS);
        let lost = pair.events.intersects(PairFlags::TOUCH_LOST);
        if found && lost {
            self.reject_conflicting(pair.shapes[0], pair.shapes[1]);
            return;
        }
        if !(found || persists || lost) {
            return;
        }

        let ids = lookup
            .resolve_shape(pair.shapes[0])
            .and_then(|a| lookup.resolve_shape(pair.shapes[1]).map(|b| (a, b)));
        let (shape_a, shape_b) = match ids {
            Ok(ids) => ids,
            Err(err) => {
                self.note_unresolved(err);
                return;
            }
        };

        if found {
            self.contact_begin
                .push(ContactRecord::new(shape_a, shape_b, ContactPhase::Begin, &pair.points));
        } else if persists {
            self.contact_persist.push(ContactRecord::new(
                shape_a,
                shape_b,
                ContactPhase::Persist,
                &pair.points,
            ));
        }
        if lost {
            self.contact_end
                .push(ContactRecord::new(shape_a, shape_b, ContactPhase::End, &[]));
        }
    }

    /// Deliver the collected batches to `sink` and reset for the next step.
    ///
    /// With [`UnresolvedPolicy::Reject`], any unresolved identifier seen during collection
    /// fails the flush and nothing is delivered.
    pub fn flush(&mut self, sink: &mut dyn EventSink) -> Result<FlushReport, MarshalError> {
        self.phase = AggregatorPhase::Flushed;

        let mut report = FlushReport {
            dropped_unresolved: self.dropped_unresolved,
            rejected_conflicting: self.rejected_conflicting,
            ..FlushReport::default()
        };

        if let Some(err) = self.first_unresolved.take() {
            self.reset();
            return Err(err);
        }

        let batches = [
            EventBatch::Wake(std::mem::take(&mut self.wake)),
            EventBatch::Sleep(std::mem::take(&mut self.sleep)),
            EventBatch::TriggerBegin(std::mem::take(&mut self.trigger_begin)),
            EventBatch::TriggerEnd(std::mem::take(&mut self.trigger_end)),
            EventBatch::ContactBegin(std::mem::take(&mut self.contact_begin)),
            EventBatch::ContactPersist(std::mem::take(&mut self.contact_persist)),
            EventBatch::ContactEnd(std::mem::take(&mut self.contact_end)),
        ];
        for batch in batches {
            if batch.is_empty() {
                continue;
            }
            report.batches += 1;
            report.records += batch.len();
            sink.deliver(batch);
        }

        self.reset();
        log::debug!(
            "flushed {} batches ({} records, {} dropped, {} conflicting)",
            report.batches,
            report.records,
            report.dropped_unresolved,
            report.rejected_conflicting
        );
        Ok(report)
    }

    /// Discard everything collected so far.
    pub fn reset(&mut self) {
        self.wake.clear();
        self.sleep.clear();
        self.trigger_begin.clear();
        self.trigger_end.clear();
        self.contact_begin.clear();
        self.contact_persist.clear();
        self.contact_end.clear();
        self.dropped_unresolved = 0;
        self.rejected_conflicting = 0;
        self.first_unresolved = None;
        self.phase = AggregatorPhase::Idle;
    }

    fn begin_collecting(&mut self) {
        if self.phase == AggregatorPhase::Idle {
            self.phase = AggregatorPhase::Collecting;
        }
    }

    fn note_unresolved(&mut self, err: MarshalError) {
        self.dropped_unresolved += 1;
        match self.policy {
            UnresolvedPolicy::Reject => {
                if self.first_unresolved.is_none() {
                    self.first_unresolved = Some(err);
                }
            }
            UnresolvedPolicy::Drop => log::warn!("dropping event record: {err}"),
        }
    }

    fn reject_conflicting(&mut self, a: impl std::fmt::Debug, b: impl std::fmt::Debug) {
        self.rejected_conflicting += 1;
        log::warn!("pair {a:?}/{b:?} reported touch found and lost in one step; dropped");
    }
}

fn trigger_record<L: IdentifierLookup>(
    lookup: &L,
    pair: &RawTriggerPair<L::Shape, L::Actor>,
    phase: TriggerPhase,
) -> Result<TriggerRecord, MarshalError> {
    Ok(TriggerRecord {
        trigger_shape: lookup.resolve_shape(pair.trigger_shape)?,
        trigger_actor: resolve_parent(lookup, pair.trigger_shape, pair.trigger_actor)?,
        other_shape: lookup.resolve_shape(pair.other_shape)?,
        other_actor: resolve_parent(lookup, pair.other_shape, pair.other_actor)?,
        phase,
    })
}

fn resolve_parent<L: IdentifierLookup>(
    lookup: &L,
    shape: L::Shape,
    actor: Option<L::Actor>,
) -> Result<Identifier, MarshalError> {
    match actor {
        Some(actor) => lookup.resolve_actor(actor),
        None => Err(MarshalError::unresolved(
            IdentifierKind::Actor,
            format_args!("parent of {shape:?}"),
        )),
    }
}
