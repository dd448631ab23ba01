//! Bounded undo log of whole-mask snapshots.
//!
//! Each entry is a full copy of the mask, so the worst-case memory held here
//! is `capacity * width * height` bytes (50 entries of a 1280x720 mask is
//! about 46 MB). Snapshotting is O(mask size) per stroke start.

use std::collections::VecDeque;

use log::debug;

use crate::types::Mask;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug)]
pub struct History {
    snapshots: VecDeque<Mask>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { snapshots: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a snapshot, evicting the oldest entry once over capacity.
    pub fn push_snapshot(&mut self, mask: Mask) {
        self.snapshots.push_back(mask);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            debug!("history full ({}), evicted oldest snapshot", self.capacity);
        }
    }

    /// Most recent snapshot, or `None` when there is nothing to undo.
    pub fn pop_and_restore(&mut self) -> Option<Mask> {
        self.snapshots.pop_back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// A 1x1 mask whose only alpha value tags the snapshot.
    fn tagged(tag: u8) -> Mask {
        Mask { width: 1, height: 1, alpha: vec![tag] }
    }

    #[test]
    fn fifty_one_pushes_keep_fifty_and_drop_the_oldest() {
        let mut history = History::default();
        for tag in 0..51u8 {
            history.push_snapshot(tagged(tag));
        }
        assert_eq!(history.len(), 50);

        let mut popped = Vec::new();
        while let Some(m) = history.pop_and_restore() {
            popped.push(m.alpha[0]);
        }
        assert_eq!(popped.first(), Some(&50));
        assert_eq!(popped.last(), Some(&1));
        assert!(!popped.contains(&0));
    }

    #[test]
    fn pops_in_reverse_chronological_order() {
        let mut history = History::new(5);
        history.push_snapshot(tagged(1));
        history.push_snapshot(tagged(2));
        history.push_snapshot(tagged(3));
        assert_eq!(history.pop_and_restore(), Some(tagged(3)));
        assert_eq!(history.pop_and_restore(), Some(tagged(2)));
        assert_eq!(history.pop_and_restore(), Some(tagged(1)));
        assert_eq!(history.pop_and_restore(), None);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = History::new(0);
        history.push_snapshot(tagged(7));
        history.push_snapshot(tagged(8));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.pop_and_restore(), Some(tagged(8)));
        assert!(history.is_empty());
    }
}
