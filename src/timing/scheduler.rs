use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use crate::timing::clock::{FRAME, Tick};

/// Handle for a scheduled timer; cancellation is idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type BoxedCallback = Box<dyn FnMut()>;

struct Entry {
    due: Tick,
    seq: u64,
    id: u64,
    period: Option<Duration>,
    cb: BoxedCallback,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest (due, seq) pops first.
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

struct Inner {
    now: Tick,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Entry>,
    live: HashSet<u64>,
    cancelled: HashSet<u64>,
}

/// Single-threaded virtual-time timer queue.
///
/// Every delay, interval, and per-frame callback in the crate is registered
/// here, which gives two properties the choreography depends on:
///
/// - tests advance virtual time deterministically instead of sleeping, and
/// - a component can cancel everything it ever registered on teardown.
///
/// Delivery order is `(due instant, insertion order)`. Callbacks run with the
/// queue unlocked, so they may schedule and cancel timers freely; work that
/// becomes due during [`Scheduler::advance`] still runs within that call. No
/// ordering is guaranteed between timers due at different instants beyond the
/// instants themselves.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                now: Tick::ZERO,
                next_id: 1,
                next_seq: 0,
                queue: BinaryHeap::new(),
                live: HashSet::new(),
                cancelled: HashSet::new(),
            })),
        }
    }

    pub fn now(&self) -> Tick {
        self.inner.borrow().now
    }

    /// Run `cb` once after `delay` of virtual time.
    pub fn schedule(&self, delay: Duration, cb: impl FnOnce() + 'static) -> TimerId {
        let mut cb = Some(cb);
        self.push(delay, None, Box::new(move || {
            if let Some(cb) = cb.take() {
                cb();
            }
        }))
    }

    /// Run `cb` every `period` of virtual time until cancelled.
    pub fn every(&self, period: Duration, cb: impl FnMut() + 'static) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), Box::new(cb))
    }

    /// Run `cb` once per nominal frame (every [`FRAME`]) until cancelled.
    pub fn every_frame(&self, cb: impl FnMut() + 'static) -> TimerId {
        self.every(FRAME, cb)
    }

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    pub fn cancel(&self, id: TimerId) {
        let mut inner = self.inner.borrow_mut();
        if inner.live.remove(&id.0) {
            inner.cancelled.insert(id.0);
        }
    }

    /// Advance virtual time by `by`, running every callback that becomes due,
    /// in `(due, insertion)` order.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.borrow().now.after(by);
        loop {
            let entry = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.peek() {
                    Some(e) if e.due <= target => inner.queue.pop(),
                    _ => None,
                }
            };
            let Some(mut entry) = entry else { break };

            {
                let mut inner = self.inner.borrow_mut();
                if inner.cancelled.remove(&entry.id) {
                    continue;
                }
                if entry.due > inner.now {
                    inner.now = entry.due;
                }
                if entry.period.is_none() {
                    inner.live.remove(&entry.id);
                }
            }

            (entry.cb)();

            if let Some(period) = entry.period {
                let mut inner = self.inner.borrow_mut();
                if inner.cancelled.remove(&entry.id) {
                    inner.live.remove(&entry.id);
                } else {
                    let seq = inner.next_seq;
                    inner.next_seq += 1;
                    inner.queue.push(Entry {
                        due: entry.due.after(period),
                        seq,
                        id: entry.id,
                        period: Some(period),
                        cb: entry.cb,
                    });
                }
            }
        }
        self.inner.borrow_mut().now = target;
    }

    fn push(&self, delay: Duration, period: Option<Duration>, cb: BoxedCallback) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now.after(delay);
        inner.live.insert(id);
        inner.queue.push(Entry {
            due,
            seq,
            id,
            period,
            cb,
        });
        TimerId(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/scheduler.rs"]
mod tests;
