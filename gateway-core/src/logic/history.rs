//! History Window
//!
//! Bounded FIFO used by every stateful detector. Oldest entry is evicted
//! when a push would exceed capacity.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HistoryWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryWindow<T> {
    /// Capacity is clamped to at least 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Drop entries from the front while `pred` holds
    pub fn prune_front<F>(&mut self, mut pred: F)
    where
        F: FnMut(&T) -> bool,
    {
        while self.items.front().map_or(false, &mut pred) {
            self.items.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut w = HistoryWindow::new(3);
        for i in 0..5 {
            w.push(i);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(w.last(), Some(&4));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut w = HistoryWindow::new(0);
        w.push("a");
        w.push("b");
        assert_eq!(w.capacity(), 1);
        assert_eq!(w.last(), Some(&"b"));
    }

    #[test]
    fn test_prune_front() {
        let mut w = HistoryWindow::new(10);
        for i in [1, 2, 3, 10, 2] {
            w.push(i);
        }
        w.prune_front(|x| *x < 5);
        assert_eq!(w.iter().copied().collect::<Vec<_>>(), vec![10, 2]);
        w.clear();
        assert!(w.is_empty());
    }
}
