//! Trailing-edge debouncing over a pluggable timer source.
//!
//! A [`Debounced`] wrapper owns exactly one pending timer. Every call drops
//! the previous handle (which cancels it) and schedules a fresh one, so a
//! burst of calls collapses into a single invocation carrying the arguments
//! of the last call.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Schedules one-shot tasks. Dropping the returned handle must cancel the
/// task if it has not fired yet.
pub trait TimerHost: Clone + 'static {
    type Handle: 'static;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Handle;
}

pub struct Debounced<A, H: TimerHost> {
    inner: Rc<DebounceInner<A, H>>,
}

struct DebounceInner<A, H: TimerHost> {
    callback: Rc<dyn Fn(A)>,
    delay_ms: u32,
    timers: H,
    pending: RefCell<Option<H::Handle>>,
}

impl<A, H: TimerHost> Clone for Debounced<A, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

pub fn debounce<A, H, F>(callback: F, delay_ms: u32, timers: H) -> Debounced<A, H>
where
    A: 'static,
    H: TimerHost,
    F: Fn(A) + 'static,
{
    Debounced {
        inner: Rc::new(DebounceInner {
            callback: Rc::new(callback),
            delay_ms,
            timers,
            pending: RefCell::new(None),
        }),
    }
}

impl<A: 'static, H: TimerHost> Debounced<A, H> {
    pub fn call(&self, args: A) {
        let callback = Rc::clone(&self.inner.callback);
        let handle = self
            .inner
            .timers
            .schedule(self.inner.delay_ms, Box::new(move || callback(args)));
        // The fired handle is left in place and released by the next call, so
        // a timer is never dropped from inside its own task.
        let previous = self.inner.pending.replace(Some(handle));
        drop(previous);
    }
}

/// Deterministic timer source driven by [`VirtualTimers::advance`].
#[derive(Clone, Default)]
pub struct VirtualTimers {
    state: Rc<RefCell<VirtualClock>>,
}

#[derive(Default)]
struct VirtualClock {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, u64), Box<dyn FnOnce()>>,
}

pub struct VirtualTimeout {
    key: (u64, u64),
    clock: Weak<RefCell<VirtualClock>>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Moves the clock forward, running every task that comes due in
    /// deadline order. Tasks scheduled while advancing run too if they fall
    /// inside the window.
    pub fn advance(&self, ms: u64) {
        let target = self.state.borrow().now + ms;
        loop {
            let due = {
                let mut clock = self.state.borrow_mut();
                let next = clock.queue.first_key_value().map(|(&key, _)| key);
                match next {
                    Some(key) if key.0 <= target => {
                        clock.now = key.0;
                        clock.queue.remove(&key)
                    }
                    _ => None,
                }
            };
            match due {
                Some(task) => task(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }
}

impl TimerHost for VirtualTimers {
    type Handle = VirtualTimeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> VirtualTimeout {
        let mut clock = self.state.borrow_mut();
        clock.next_id += 1;
        let key = (clock.now + u64::from(delay_ms), clock.next_id);
        clock.queue.insert(key, task);
        VirtualTimeout {
            key,
            clock: Rc::downgrade(&self.state),
        }
    }
}

impl Drop for VirtualTimeout {
    fn drop(&mut self) {
        let Some(clock) = self.clock.upgrade() else {
            return;
        };
        let removed = clock
            .try_borrow_mut()
            .ok()
            .and_then(|mut clock| clock.queue.remove(&self.key));
        // Run the task's destructor outside the clock borrow.
        drop(removed);
    }
}
