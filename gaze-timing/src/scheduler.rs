use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::trace;

use crate::timer::{Clock, Millis, MonotonicClock, VirtualClock};

/// Handle returned by the scheduling calls, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Slot<E> {
    event: E,
    period: Option<Millis>,
}

/// Single-threaded timer queue over a [`Clock`].
///
/// Timers fire in deadline order; timers sharing a deadline fire in the order
/// they were scheduled. A repeating timer's re-arm counts as a fresh
/// scheduling, so it lines up behind timers already queued for its next
/// deadline.
#[derive(Debug)]
pub struct Scheduler<C: Clock, E: Clone> {
    clock: C,
    queue: BinaryHeap<Reverse<(Millis, u64, TimerId)>>,
    slots: HashMap<TimerId, Slot<E>>,
    next_seq: u64,
    next_id: u64,
}

pub type VirtualScheduler<E> = Scheduler<VirtualClock, E>;
pub type MonotonicScheduler<E> = Scheduler<MonotonicClock, E>;

impl<C: Clock, E: Clone> Scheduler<C, E> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            queue: BinaryHeap::new(),
            slots: HashMap::new(),
            next_seq: 0,
            next_id: 0,
        }
    }

    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn schedule_once(&mut self, delay: Millis, event: E) -> TimerId {
        self.insert(delay, None, event)
    }

    /// First fires one `period` from now. A zero period is treated as 1 ms.
    pub fn schedule_repeating(&mut self, period: Millis, event: E) -> TimerId {
        let period = period.max(1);
        self.insert(period, Some(period), event)
    }

    /// Returns `false` when the id is unknown or the one-shot already fired.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.slots.remove(&id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }

    /// Deadline of the earliest live timer.
    pub fn next_deadline(&mut self) -> Option<Millis> {
        self.discard_cancelled();
        self.queue.peek().map(|Reverse((due, _, _))| *due)
    }

    /// Pops the earliest timer due at or before `until`.
    ///
    /// The clock is not moved and nothing later than its current reading
    /// fires. Callers sleep the clock to [`Scheduler::next_deadline`] first so
    /// that a fired event observes its own deadline as "now".
    pub fn pop_due(&mut self, until: Millis) -> Option<E> {
        let due = self.next_deadline()?;
        if due > until || due > self.clock.now_ms() {
            return None;
        }
        let Reverse((due, _, id)) = self.queue.pop()?;
        let period = self.slots.get(&id)?.period;
        match period {
            Some(period) => {
                let event = self.slots.get(&id)?.event.clone();
                let seq = self.bump_seq();
                self.queue.push(Reverse((due.saturating_add(period), seq, id)));
                trace!(?id, due, period, "repeating timer fired");
                Some(event)
            }
            None => {
                trace!(?id, due, "timer fired");
                self.slots.remove(&id).map(|slot| slot.event)
            }
        }
    }

    pub fn sleep_until(&mut self, deadline: Millis) {
        self.clock.sleep_until(deadline);
    }

    /// Fires everything due up to `until` and leaves the clock there.
    ///
    /// Returns each event with the time it fired. Hosts whose handlers
    /// schedule further timers drive [`Scheduler::pop_due`] themselves.
    pub fn advance_to(&mut self, until: Millis) -> Vec<(Millis, E)> {
        let mut fired = Vec::new();
        while let Some(due) = self.next_deadline() {
            if due > until {
                break;
            }
            self.sleep_until(due);
            if let Some(event) = self.pop_due(due) {
                fired.push((due, event));
            }
        }
        self.sleep_until(until);
        fired
    }

    fn insert(&mut self, delay: Millis, period: Option<Millis>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        let due = self.clock.now_ms().saturating_add(delay);
        self.queue.push(Reverse((due, seq, id)));
        self.slots.insert(id, Slot { event, period });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, _, id))) = self.queue.peek() {
            if self.slots.contains_key(id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<E: Clone> Default for Scheduler<VirtualClock, E> {
    fn default() -> Self {
        Self::new(VirtualClock::new())
    }
}
