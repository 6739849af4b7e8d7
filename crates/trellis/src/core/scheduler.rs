use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Schedules the canvas's deferred update pass.
///
/// The canvas calls [`Scheduler::schedule`] at most once per pending pass.
/// The host is expected to arrange for [`Canvas::flush`](crate::Canvas::flush)
/// to be called once control returns to its event loop, before the next
/// repaint. Schedulers are `Send` because model trees shared with other
/// threads wake them when they change.
pub trait Scheduler: fmt::Debug + Send {
    /// Arrange for one deferred update pass.
    fn schedule(&mut self);
}

/// A scheduler for headless use that only counts requests.
///
/// The host (or a test) drives updates by calling `flush` itself. Clones share
/// the counter, so a handle can be kept after the scheduler moves into the
/// canvas.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    /// Passes scheduled so far.
    scheduled: Arc<AtomicUsize>,
}

impl ManualScheduler {
    /// A new scheduler with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many passes have been scheduled so far.
    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
    }
}

/// The canvas's handle on its scheduler.
///
/// Clones are shared with the model trees the canvas subscribes to, so a
/// model edit can ask for a pass. Requests coalesce until the next flush.
#[derive(Clone)]
pub(crate) struct UpdateWaker {
    /// Shared state.
    inner: Arc<WakerState>,
}

/// State behind an [`UpdateWaker`].
struct WakerState {
    /// A pass has been scheduled and has not been flushed.
    scheduled: AtomicBool,
    /// Model changes arrived since the last drain.
    notified: AtomicBool,
    /// The host's scheduler.
    scheduler: Mutex<Box<dyn Scheduler>>,
}

impl fmt::Debug for UpdateWaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateWaker")
            .field("scheduled", &self.inner.scheduled.load(Ordering::SeqCst))
            .field("notified", &self.inner.notified.load(Ordering::SeqCst))
            .finish()
    }
}

impl UpdateWaker {
    /// Wrap `scheduler`.
    pub(crate) fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(WakerState {
                scheduled: AtomicBool::new(false),
                notified: AtomicBool::new(false),
                scheduler: Mutex::new(scheduler),
            }),
        }
    }

    /// Swap in a different host scheduler. Existing clones follow.
    pub(crate) fn replace(&self, scheduler: Box<dyn Scheduler>) {
        *self.inner.scheduler.lock().unwrap_or_else(PoisonError::into_inner) = scheduler;
    }

    /// Ask for one pass unless one is already pending.
    pub(crate) fn schedule(&self) {
        if !self.inner.scheduled.swap(true, Ordering::SeqCst) {
            self.inner
                .scheduler
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .schedule();
        }
    }

    /// The pending pass is running.
    pub(crate) fn clear_scheduled(&self) {
        self.inner.scheduled.store(false, Ordering::SeqCst);
    }

    /// A model changed: remember it and ask for a pass.
    pub(crate) fn notify(&self) {
        self.inner.notified.store(true, Ordering::SeqCst);
        self.schedule();
    }

    /// Have model changes arrived since the last drain?
    pub(crate) fn notified(&self) -> bool {
        self.inner.notified.load(Ordering::SeqCst)
    }

    /// Model notifications are about to be drained.
    pub(crate) fn clear_notified(&self) {
        self.inner.notified.store(false, Ordering::SeqCst);
    }
}
