//! Deferred work keyed by deadline.
//!
//! [`TimerQueue`] is a min-heap of pending timers. Entries with equal
//! deadlines fire in the order they were scheduled. Nothing here sleeps:
//! callers pop whatever is due at a given instant, which lets tests drive
//! time explicitly and lets the async driver sleep until
//! [`TimerQueue::next_deadline`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use tokio::time::Instant;

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Scheduled<T> {
    deadline: Instant,
    id: TimerId,
    item: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    // Reversed so the max-heap yields the earliest deadline, then the
    // lowest id.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

pub struct TimerQueue<T> {
    heap: BinaryHeap<Scheduled<T>>,
    cancelled: HashSet<TimerId>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, deadline: Instant, item: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Scheduled { deadline, id, item });
        id
    }

    /// Drop a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let pending = self
            .heap
            .iter()
            .any(|scheduled| scheduled.id == id && !self.cancelled.contains(&id));
        if pending {
            self.cancelled.insert(id);
        }
        pending
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.heap.peek() {
            if !self.cancelled.contains(&top.id) {
                break;
            }
            let id = top.id;
            self.heap.pop();
            self.cancelled.remove(&id);
        }
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, Instant, T)> {
        self.discard_cancelled();
        if self.heap.peek()?.deadline > now {
            return None;
        }
        let scheduled = self.heap.pop()?;
        Some((scheduled.id, scheduled.deadline, scheduled.item))
    }

    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled();
        self.heap.peek().map(|scheduled| scheduled.deadline)
    }

    /// Number of timers still waiting to fire.
    pub fn len(&self) -> usize {
        self.heap.len() - self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A timer that re-arms itself every `interval` after it fires.
///
/// The task holds the id of its single pending timer; [`RepeatingTask::cancel`]
/// removes it so nothing further is scheduled.
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    interval: Duration,
    pending: Option<TimerId>,
}

impl RepeatingTask {
    /// Arm the first firing one interval after `now`.
    pub fn start<T>(queue: &mut TimerQueue<T>, interval: Duration, now: Instant, item: T) -> Self {
        let pending = Some(queue.schedule(now + interval, item));
        Self { interval, pending }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `id` is this task's pending timer.
    pub fn owns(&self, id: TimerId) -> bool {
        self.pending == Some(id)
    }

    /// Re-arm after the timer that was due at `fired_at` has fired.
    pub fn rearm<T>(&mut self, queue: &mut TimerQueue<T>, fired_at: Instant, item: T) {
        if self.pending.is_some() {
            self.pending = Some(queue.schedule(fired_at + self.interval, item));
        }
    }

    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>) {
        if let Some(id) = self.pending.take() {
            queue.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_queue_ordering() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start + Duration::from_secs(10), "a");
        queue.schedule(start + Duration::from_secs(5), "b");
        queue.schedule(start + Duration::from_secs(15), "c");
        queue.schedule(start + Duration::from_secs(5), "d");
        assert_eq!(queue.len(), 4);

        let far = start + Duration::from_secs(60);
        let order: Vec<&str> = std::iter::from_fn(|| queue.pop_due(far))
            .map(|(_, _, item)| item)
            .collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(start + Duration::from_millis(2500), 1);
        assert!(queue.pop_due(start).is_none());
        assert!(queue.pop_due(start + Duration::from_millis(2499)).is_none());
        let (_, deadline, item) = queue
            .pop_due(start + Duration::from_millis(2500))
            .expect("due timer");
        assert_eq!(item, 1);
        assert_eq!(deadline, start + Duration::from_millis(2500));
    }

    #[test]
    fn test_cancel_skips_timer() {
        let start = Instant::now();
        let mut queue = TimerQueue::new();
        let first = queue.schedule(start + Duration::from_secs(1), "first");
        queue.schedule(start + Duration::from_secs(2), "second");
        assert!(queue.cancel(first));
        assert!(!queue.cancel(first));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_secs(2)));
        let (_, _, item) = queue
            .pop_due(start + Duration::from_secs(5))
            .expect("second timer");
        assert_eq!(item, "second");
        assert!(queue.next_deadline().is_none());
    }

    #[test]
    fn test_repeating_task_rearms_until_cancelled() {
        let start = Instant::now();
        let interval = Duration::from_secs(30);
        let mut queue = TimerQueue::new();
        let mut task = RepeatingTask::start(&mut queue, interval, start, "tick");
        assert_eq!(queue.next_deadline(), Some(start + interval));

        let (id, fired_at, _) = queue.pop_due(start + interval).expect("first tick");
        assert!(task.owns(id));
        task.rearm(&mut queue, fired_at, "tick");
        assert_eq!(queue.next_deadline(), Some(start + interval * 2));

        task.cancel(&mut queue);
        assert!(!task.is_active());
        assert!(queue.next_deadline().is_none());

        task.rearm(&mut queue, start + interval * 2, "tick");
        assert!(queue.is_empty());
    }
}
