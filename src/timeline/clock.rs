use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::{Rc, Weak},
};

use crate::timeline::frame::{FrameHandle, FrameScheduler};

type SubscriberFn = dyn FnMut(f64) -> anyhow::Result<()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Identifies one clock subscription.
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    callback: Rc<RefCell<SubscriberFn>>,
}

struct ContinuousSync {
    scheduler: Rc<dyn FrameScheduler>,
    sample: Rc<dyn Fn() -> f64>,
    pending: Option<FrameHandle>,
    generation: u64,
}

#[derive(Default)]
struct ClockInner {
    current: Cell<f64>,
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
    notifying: Cell<bool>,
    queued: RefCell<VecDeque<f64>>,
    sync: RefCell<Option<ContinuousSync>>,
    sync_generation: Cell<u64>,
}

/// Shared timeline position with synchronous, ordered change notification.
///
/// Cloning a `Clock` yields another handle to the same timeline. Time may move backwards;
/// subscribers receive absolute times, never deltas.
#[derive(Clone, Default)]
pub struct Clock {
    inner: Rc<ClockInner>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("current", &self.inner.current.get())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("continuous", &self.is_continuous())
            .finish()
    }
}

/// Clears the notifying flag even if a subscriber panics.
struct NotifyGuard<'a>(&'a Cell<bool>);

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Clock {
    /// Create a clock at time `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in seconds.
    pub fn time(&self) -> f64 {
        self.inner.current.get()
    }

    /// Move the clock to `t` and notify subscribers in registration order.
    ///
    /// Setting the current value again is a no-op. A call made from inside a subscriber is queued
    /// and applied once the in-progress notification has reached every subscriber. Non-finite
    /// times are ignored.
    pub fn set_time(&self, t: f64) {
        if !t.is_finite() {
            tracing::warn!(time = t, "ignoring non-finite clock time");
            return;
        }
        if self.inner.notifying.get() {
            self.inner.queued.borrow_mut().push_back(t);
            return;
        }

        self.apply(t);
        loop {
            let next = self.inner.queued.borrow_mut().pop_front();
            match next {
                Some(t) => self.apply(t),
                None => break,
            }
        }
    }

    fn apply(&self, t: f64) {
        if t == self.inner.current.get() {
            return;
        }
        self.inner.current.set(t);

        self.inner.notifying.set(true);
        let _guard = NotifyGuard(&self.inner.notifying);

        let snapshot: Vec<(SubscriptionId, Rc<RefCell<SubscriberFn>>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, s.callback.clone()))
            .collect();

        for (id, callback) in snapshot {
            // Unsubscribed by an earlier subscriber during this notification.
            if !self.is_subscribed(id) {
                continue;
            }
            let Ok(mut callback) = callback.try_borrow_mut() else {
                continue;
            };
            if let Err(err) = (&mut *callback)(t) {
                tracing::warn!(subscription = id.0, time = t, error = %err, "clock subscriber failed");
            }
        }
    }

    /// Register `callback`; it runs on every subsequent time change.
    pub fn subscribe(
        &self,
        callback: impl FnMut(f64) -> anyhow::Result<()> + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.inner.subscribers.borrow_mut();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.borrow().iter().any(|s| s.id == id)
    }

    /// Sample `sample` once per animation frame and feed the result to [`Clock::set_time`].
    ///
    /// Returns `false` (and changes nothing) if continuous sync is already running.
    pub fn start_continuous_sync(
        &self,
        scheduler: Rc<dyn FrameScheduler>,
        sample: impl Fn() -> f64 + 'static,
    ) -> bool {
        if self.inner.sync.borrow().is_some() {
            tracing::debug!("continuous sync already running");
            return false;
        }
        let generation = self.inner.sync_generation.get() + 1;
        self.inner.sync_generation.set(generation);
        *self.inner.sync.borrow_mut() = Some(ContinuousSync {
            scheduler,
            sample: Rc::new(sample),
            pending: None,
            generation,
        });
        self.schedule_frame();
        true
    }

    /// Stop the frame loop started by [`Clock::start_continuous_sync`]. Idempotent.
    pub fn stop_continuous_sync(&self) {
        let Some(sync) = self.inner.sync.borrow_mut().take() else {
            return;
        };
        if let Some(handle) = sync.pending {
            sync.scheduler.cancel_frame(handle);
        }
    }

    /// Whether the continuous frame loop is running.
    pub fn is_continuous(&self) -> bool {
        self.inner.sync.borrow().is_some()
    }

    fn schedule_frame(&self) {
        let (scheduler, generation) = match self.inner.sync.borrow().as_ref() {
            Some(sync) => (sync.scheduler.clone(), sync.generation),
            None => return,
        };
        let weak: Weak<ClockInner> = Rc::downgrade(&self.inner);
        let handle = scheduler.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Clock { inner }.on_frame(generation);
            }
        }));
        if let Some(sync) = self.inner.sync.borrow_mut().as_mut() {
            sync.pending = Some(handle);
        }
    }

    fn on_frame(&self, generation: u64) {
        let sample = match self.inner.sync.borrow_mut().as_mut() {
            Some(sync) if sync.generation == generation => {
                sync.pending = None;
                sync.sample.clone()
            }
            // Stopped, or a stale callback from a loop that was restarted.
            _ => return,
        };

        self.set_time(sample());

        let still_running = matches!(
            self.inner.sync.borrow().as_ref(),
            Some(sync) if sync.generation == generation
        );
        if still_running {
            self.schedule_frame();
        }
    }

    /// Stop continuous sync, drop every subscriber and reset the time to `0`.
    pub fn destroy(&self) {
        self.stop_continuous_sync();
        self.inner.subscribers.borrow_mut().clear();
        self.inner.queued.borrow_mut().clear();
        self.inner.current.set(0.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
