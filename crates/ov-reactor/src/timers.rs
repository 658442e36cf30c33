use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

pub type TimerId = u64;

/// Sentinel returned by `set_timer` when the timer table is full.
pub const INVALID_TIMER: TimerId = 0;

struct Scheduled {
    deadline: Instant,
    callback: Box<dyn FnMut(&mut crate::Reactor)>,
}

/// Single-shot timer table ordered by absolute deadline.
///
/// Cancellation is lazy: `cancel_timer` removes the callback from
/// `entries` immediately but leaves the heap entry in place; `pop_ready`
/// and `next_deadline` skip over ids no longer present in `entries`.
pub(crate) struct TimerTable {
    next_id: TimerId,
    entries: HashMap<TimerId, Scheduled>,
    order: BinaryHeap<Reverse<(Instant, TimerId)>>,
    max_timers: usize,
}

impl TimerTable {
    pub(crate) fn new(max_timers: usize) -> Self {
        Self {
            next_id: INVALID_TIMER,
            entries: HashMap::new(),
            order: BinaryHeap::new(),
            max_timers,
        }
    }

    pub(crate) fn set_timer(
        &mut self,
        relative: Duration,
        callback: Box<dyn FnMut(&mut crate::Reactor)>,
    ) -> TimerId {
        if self.entries.len() >= self.max_timers {
            return INVALID_TIMER;
        }
        self.next_id += 1;
        let id = self.next_id;
        let deadline = Instant::now() + relative;
        self.entries.insert(id, Scheduled { deadline, callback });
        self.order.push(Reverse((deadline, id)));
        id
    }

    /// Always succeeds, including for an unknown or already-fired id.
    pub(crate) fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.entries.remove(&id);
        true
    }

    fn discard_stale_heap_top(&mut self) {
        while let Some(Reverse((_, id))) = self.order.peek() {
            if self.entries.contains_key(id) {
                break;
            }
            self.order.pop();
        }
    }

    pub(crate) fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale_heap_top();
        self.order.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Removes and returns every callback whose deadline is `<= now`, in
    /// ascending deadline order. Timers a callback schedules while this
    /// runs land in `entries`/`order` with a deadline computed from
    /// "now when scheduled", so they can never be due within the same
    /// pop (their deadline is always `> now`).
    pub(crate) fn pop_ready(&mut self, now: Instant) -> Vec<Box<dyn FnMut(&mut crate::Reactor)>> {
        let mut ready = Vec::new();
        loop {
            self.discard_stale_heap_top();
            let Some(Reverse((deadline, _))) = self.order.peek() else {
                break;
            };
            if *deadline > now {
                break;
            }
            let Some(Reverse((_, id))) = self.order.pop() else {
                break;
            };
            if let Some(scheduled) = self.entries.remove(&id) {
                ready.push(scheduled.callback);
            }
        }
        ready
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
