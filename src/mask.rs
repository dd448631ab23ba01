//! Mask store: sole owner of the live fog mask.
//!
//! All mutation happens on the input path and all reads on the frame path of
//! the same thread, so a write is always complete before the next frame reads
//! it. The dirty flag tells the compositor when its cached fog layer is stale.

use log::debug;

use crate::brush::{self, StampReport};
use crate::types::{Mask, MaskPoint};

#[derive(Debug)]
pub struct MaskStore {
    mask: Mask,
    dirty: bool,
}

impl Default for MaskStore {
    fn default() -> Self {
        Self { mask: Mask::new(0, 0, true), dirty: true }
    }
}

impl MaskStore {
    pub fn new(width: usize, height: usize, opaque: bool) -> Self {
        Self { mask: Mask::new(width, height, opaque), dirty: true }
    }

    /// Allocate a fresh mask of the given size, fogged or clear.
    pub fn initialize(&mut self, width: usize, height: usize, opaque: bool) {
        debug!("mask initialize {width}x{height} opaque={opaque}");
        self.mask = Mask::new(width, height, opaque);
        self.dirty = true;
    }

    /// Swap in a whole new mask (reset, reveal-all, undo). Returns the old one.
    pub fn replace(&mut self, new_mask: Mask) -> Mask {
        self.dirty = true;
        std::mem::replace(&mut self.mask, new_mask)
    }

    /// Deep copy of the live mask for the history stack.
    pub fn snapshot(&self) -> Mask {
        self.mask.clone()
    }

    /// Clear a circle on the live mask. Only a stamp that actually revealed
    /// something marks the store dirty.
    pub fn stamp(&mut self, center: MaskPoint, radius: f64) -> StampReport {
        let report = brush::apply_brush(&mut self.mask, center.x, center.y, radius);
        if report.cleared > 0 {
            self.dirty = true;
        }
        report
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn size(&self) -> (usize, usize) {
        (self.mask.width, self.mask.height)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FOG_CLEAR, FOG_OPAQUE};
    use test_log::test;

    #[test]
    fn initialize_sets_size_and_alpha() {
        let mut store = MaskStore::default();
        store.initialize(8, 6, true);
        assert_eq!(store.size(), (8, 6));
        assert!(store.mask().alpha.iter().all(|&a| a == FOG_OPAQUE));

        store.initialize(3, 2, false);
        assert!(store.mask().alpha.iter().all(|&a| a == FOG_CLEAR));
    }

    #[test]
    fn snapshot_is_independent_of_live_mask() {
        let mut store = MaskStore::new(10, 10, true);
        let before = store.snapshot();
        store.stamp(MaskPoint { x: 5.0, y: 5.0 }, 2.0);
        assert_ne!(store.mask(), &before);
        assert!(before.alpha.iter().all(|&a| a == FOG_OPAQUE));
    }

    #[test]
    fn replace_returns_previous_and_marks_dirty() {
        let mut store = MaskStore::new(2, 2, true);
        store.take_dirty();
        let old = store.replace(Mask::new(2, 2, false));
        assert!(old.alpha.iter().all(|&a| a == FOG_OPAQUE));
        assert!(store.is_dirty());
        assert!(store.take_dirty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn stamp_on_revealed_area_leaves_store_clean() {
        let mut store = MaskStore::new(10, 10, false);
        store.take_dirty();
        let report = store.stamp(MaskPoint { x: 5.0, y: 5.0 }, 3.0);
        assert!(report.covered > 0);
        assert_eq!(report.cleared, 0);
        assert!(!store.is_dirty());
    }
}
