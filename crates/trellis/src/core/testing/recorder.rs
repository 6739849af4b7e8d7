use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    Canvas, ItemId,
    error::Result,
    event::{Event, EventOutcome},
};

/// One delivered event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRecord {
    /// Item whose handler ran.
    pub current: ItemId,
    /// Item the event was aimed at.
    pub target: Option<ItemId>,
    /// The event.
    pub event: Event,
}

impl EventRecord {
    /// Short event name.
    pub fn name(&self) -> &'static str {
        self.event.name()
    }
}

/// Collects events delivered to the items it is attached to. Clones share
/// the same record.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    /// Delivered events in order.
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl EventRecorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the record.
    fn lock(&self) -> MutexGuard<'_, Vec<EventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record events reaching `item` and let them bubble on.
    pub fn attach(&self, canvas: &mut Canvas, item: ItemId) -> Result<()> {
        self.attach_with(canvas, item, EventOutcome::Ignore)
    }

    /// Record events reaching `item` and answer each with `outcome`.
    pub fn attach_with(
        &self,
        canvas: &mut Canvas,
        item: ItemId,
        outcome: EventOutcome,
    ) -> Result<()> {
        let recorder = self.clone();
        canvas.connect(item, move |_, cx, event| {
            recorder.lock().push(EventRecord {
                current: cx.current,
                target: cx.target,
                event: *event,
            });
            Ok(outcome)
        })
    }

    /// Everything recorded so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.lock().clone()
    }

    /// Event names delivered to `item`, in order.
    pub fn names_for(&self, item: ItemId) -> Vec<&'static str> {
        self.lock()
            .iter()
            .filter(|r| r.current == item)
            .map(EventRecord::name)
            .collect()
    }

    /// All event names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.lock().iter().map(EventRecord::name).collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
