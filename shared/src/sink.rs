//! Host-side receivers for flushed event batches.

use crossbeam_channel::Sender;

use crate::events::{ContactRecord, EventBatch, TriggerRecord};
use crate::types::Identifier;

/// Receives one [`EventBatch`] per non-empty category per step, in category order.
pub trait EventSink: Send {
    fn deliver(&mut self, batch: EventBatch);
}

/// Collects batches in memory; handy for hosts that drain after each step.
impl EventSink for Vec<EventBatch> {
    fn deliver(&mut self, batch: EventBatch) {
        self.push(batch);
    }
}

/// Forwards batches as messages over a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<EventBatch>,
}

impl ChannelSink {
    pub fn new(tx: Sender<EventBatch>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn deliver(&mut self, batch: EventBatch) {
        let category = batch.category();
        if self.tx.send(batch).is_err() {
            log::warn!("event receiver disconnected; dropping {category:?} batch");
        }
    }
}

type IdHandler = Box<dyn FnMut(&[Identifier]) + Send>;
type TriggerHandler = Box<dyn FnMut(&[TriggerRecord]) + Send>;
type ContactHandler = Box<dyn FnMut(&[ContactRecord]) + Send>;

/// Per-category callback registration. Categories without a handler are ignored.
#[derive(Default)]
pub struct HandlerSink {
    wake: Option<IdHandler>,
    sleep: Option<IdHandler>,
    trigger_begin: Option<TriggerHandler>,
    trigger_end: Option<TriggerHandler>,
    contact_begin: Option<ContactHandler>,
    contact_persist: Option<ContactHandler>,
    contact_end: Option<ContactHandler>,
}

impl HandlerSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_wake(mut self, f: impl FnMut(&[Identifier]) + Send + 'static) -> Self {
        self.wake = Some(Box::new(f));
        self
    }

    pub fn on_sleep(mut self, f: impl FnMut(&[Identifier]) + Send + 'static) -> Self {
        self.sleep = Some(Box::new(f));
        self
    }

    pub fn on_trigger_begin(mut self, f: impl FnMut(&[TriggerRecord]) + Send + 'static) -> Self {
        self.trigger_begin = Some(Box::new(f));
        self
    }

    pub fn on_trigger_end(mut self, f: impl FnMut(&[TriggerRecord]) + Send + 'static) -> Self {
        self.trigger_end = Some(Box::new(f));
        self
    }

    pub fn on_contact_begin(mut self, f: impl FnMut(&[ContactRecord]) + Send + 'static) -> Self {
        self.contact_begin = Some(Box::new(f));
        self
    }

    pub fn on_contact_persist(
        mut self,
        f: impl FnMut(&[ContactRecord]) + Send + 'static,
    ) -> Self {
        self.contact_persist = Some(Box::new(f));
        self
    }

    pub fn on_contact_end(mut self, f: impl FnMut(&[ContactRecord]) + Send + 'static) -> Self {
        self.contact_end = Some(Box::new(f));
        self
    }
}

impl EventSink for HandlerSink {
    fn deliver(&mut self, batch: EventBatch) {
        match batch {
            EventBatch::Wake(ids) => call(&mut self.wake, &ids),
            EventBatch::Sleep(ids) => call(&mut self.sleep, &ids),
            EventBatch::TriggerBegin(r) => call(&mut self.trigger_begin, &r),
            EventBatch::TriggerEnd(r) => call(&mut self.trigger_end, &r),
            EventBatch::ContactBegin(r) => call(&mut self.contact_begin, &r),
            EventBatch::ContactPersist(r) => call(&mut self.contact_persist, &r),
            EventBatch::ContactEnd(r) => call(&mut self.contact_end, &r),
        }
    }
}

fn call<T>(handler: &mut Option<Box<dyn FnMut(&[T]) + Send>>, records: &[T]) {
    if let Some(f) = handler {
        f(records);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::events::TriggerPhase;

    #[test]
    fn handler_sink_routes_by_category() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let wake_seen = Arc::clone(&seen);
        let end_seen = Arc::clone(&seen);

        let mut sink = HandlerSink::new()
            .on_wake(move |ids| wake_seen.lock().unwrap().push(format!("wake {ids:?}")))
            .on_trigger_end(move |r| end_seen.lock().unwrap().push(format!("end {}", r.len())));

        sink.deliver(EventBatch::Wake(vec![3, 4]));
        sink.deliver(EventBatch::Sleep(vec![5]));
        sink.deliver(EventBatch::TriggerEnd(vec![TriggerRecord {
            trigger_shape: 1,
            trigger_actor: 2,
            other_shape: 3,
            other_actor: 4,
            phase: TriggerPhase::End,
        }]));

        assert_eq!(*seen.lock().unwrap(), vec!["wake [3, 4]", "end 1"]);
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink::new(tx);

        sink.deliver(EventBatch::Sleep(vec![1]));
        assert_eq!(rx.try_recv().unwrap(), EventBatch::Sleep(vec![1]));

        drop(rx);
        sink.deliver(EventBatch::Sleep(vec![2]));
    }
}
