//! Virtual-clock task queue
//!
//! Every delayed continuation (effect completions, fixed delays, poll ticks)
//! goes through a `Timeline`. Entries are never cancelled: each one fires
//! exactly once and the owner decides whether it is still relevant.

/// A scheduled entry
#[derive(Debug)]
struct Entry<T> {
    at_ms: u64,
    task: T,
}

/// Pending tasks ordered by due time, FIFO among equal times
#[derive(Debug)]
pub struct Timeline<T> {
    now_ms: u64,
    pending: Vec<Entry<T>>,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` to fire `delay_ms` after now
    pub fn schedule(&mut self, delay_ms: u64, task: T) {
        let at_ms = self.now_ms.saturating_add(delay_ms);
        // Insert after every entry due no later, so equal times stay FIFO
        let idx = self.pending.partition_point(|e| e.at_ms <= at_ms);
        self.pending.insert(idx, Entry { at_ms, task });
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        self.pending.first().map(|e| e.at_ms)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its due time
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, T)> {
        let first = self.pending.first()?;
        if first.at_ms > until {
            return None;
        }
        let entry = self.pending.remove(0);
        self.now_ms = self.now_ms.max(entry.at_ms);
        Some((entry.at_ms, entry.task))
    }

    /// Move the clock forward without running anything
    pub fn advance_to(&mut self, t: u64) {
        self.now_ms = self.now_ms.max(t);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut tl = Timeline::new();
        tl.schedule(300, "c");
        tl.schedule(100, "a");
        tl.schedule(200, "b");

        assert_eq!(tl.next_due(), Some(100));
        assert_eq!(tl.pop_due(1000), Some((100, "a")));
        assert_eq!(tl.now(), 100);
        assert_eq!(tl.pop_due(1000), Some((200, "b")));
        assert_eq!(tl.pop_due(1000), Some((300, "c")));
        assert!(tl.is_empty());
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut tl = Timeline::new();
        tl.schedule(0, 1);
        tl.schedule(0, 2);
        tl.schedule(0, 3);
        let order: Vec<i32> = std::iter::from_fn(|| tl.pop_due(0).map(|(_, t)| t)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_not_due_stays_pending() {
        let mut tl = Timeline::new();
        tl.schedule(400, ());
        assert!(tl.pop_due(399).is_none());
        assert_eq!(tl.len(), 1);
        tl.advance_to(399);
        assert_eq!(tl.now(), 399);
        assert!(tl.pop_due(400).is_some());
    }

    #[test]
    fn test_schedule_is_relative_to_clock() {
        let mut tl = Timeline::new();
        tl.advance_to(1000);
        tl.schedule(100, ());
        assert_eq!(tl.next_due(), Some(1100));
    }

    #[test]
    fn test_far_future_delay_saturates() {
        let mut tl = Timeline::new();
        tl.advance_to(1000);
        tl.schedule(u64::MAX, "never");
        tl.schedule(5, "soon");
        assert_eq!(tl.pop_due(1005), Some((1005, "soon")));
        assert_eq!(tl.next_due(), Some(u64::MAX));
    }
}
