//! Bounded stroke history with an undo/redo pointer.
//!
//! Entries below `pointer` are visible; entries at or above it are kept
//! for redo until the next commit truncates them. Entry 0 starts out as a
//! baseline that undo never removes. When a commit pushes the pointer past
//! the capacity, the oldest entry is evicted and handed back to the caller
//! to be flattened into the overflow raster. Eviction cannot be undone.

use dp_core::model::Stroke;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of entries kept, baseline included.
pub const MAX_HISTORY: usize = 200;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Arc<Stroke>>,
    pointer: usize,
    capacity: usize,
}

impl History {
    pub fn new(baseline: Stroke) -> Self {
        Self::with_capacity(baseline, MAX_HISTORY)
    }

    /// `capacity` is raised to 2 so at least one stroke fits above the
    /// baseline.
    pub fn with_capacity(baseline: Stroke, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let mut entries = VecDeque::with_capacity(capacity + 1);
        entries.push_back(Arc::new(baseline));
        Self {
            entries,
            pointer: 1,
            capacity,
        }
    }

    /// Append a stroke, discarding the redo branch. Returns the evicted
    /// oldest entry when the history was full.
    pub fn commit(&mut self, stroke: Stroke) -> Option<Arc<Stroke>> {
        let discarded = self.entries.len() - self.pointer;
        if discarded > 0 {
            log::trace!("commit discards {discarded} redo entr(ies)");
        }
        self.entries.truncate(self.pointer);
        self.entries.push_back(Arc::new(stroke));
        self.pointer += 1;

        if self.pointer > self.capacity {
            let evicted = self.entries.pop_front();
            self.pointer -= 1;
            log::debug!("history full ({}): evicting oldest entry", self.capacity);
            return evicted;
        }
        None
    }

    /// Step back one entry. False at the baseline.
    pub fn undo(&mut self) -> bool {
        if self.pointer <= 1 {
            return false;
        }
        self.pointer -= 1;
        true
    }

    /// Step forward one entry. False when nothing is left to redo.
    pub fn redo(&mut self) -> bool {
        if self.pointer >= self.entries.len() {
            return false;
        }
        self.pointer += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 1
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.entries.len()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Stroke>> {
        self.entries.get(index)
    }

    /// Entries below the pointer, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Arc<Stroke>> {
        self.entries.range(..self.pointer)
    }

    /// The most recent visible entry.
    pub fn last_visible(&self) -> Option<&Arc<Stroke>> {
        self.entries.get(self.pointer - 1)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Stroke::baseline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_core::kurbo::Point;
    use dp_core::model::{Geometry, StrokeStyle};
    use pretty_assertions::assert_eq;

    fn dot(x: f64) -> Stroke {
        Stroke::new(Geometry::Dot(Point::new(x, 0.0)), StrokeStyle::default())
    }

    fn xs(history: &History) -> Vec<f64> {
        history
            .visible()
            .filter_map(|s| s.geometry.start())
            .map(|p| p.x)
            .collect()
    }

    #[test]
    fn starts_at_baseline() {
        let mut history = History::default();
        assert_eq!(history.pointer(), 1);
        assert_eq!(history.len(), 1);
        assert!(!history.undo());
        assert!(!history.redo());
    }

    #[test]
    fn undo_redo_moves_pointer() {
        let mut history = History::default();
        history.commit(dot(1.0));
        history.commit(dot(2.0));
        assert!(history.undo());
        assert_eq!(xs(&history), vec![1.0]);
        assert!(history.can_redo());
        assert!(history.redo());
        assert_eq!(xs(&history), vec![1.0, 2.0]);
        assert!(!history.redo());
    }

    #[test]
    fn commit_after_undo_truncates_redo_branch() {
        let mut history = History::default();
        history.commit(dot(1.0));
        history.commit(dot(2.0));
        history.undo();
        history.commit(dot(3.0));
        assert_eq!(history.len(), 3);
        assert_eq!(xs(&history), vec![1.0, 3.0]);
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = History::with_capacity(Stroke::baseline(), 3);
        assert!(history.commit(dot(1.0)).is_none());
        assert!(history.commit(dot(2.0)).is_none());
        // Fourth entry overflows: the baseline goes.
        let evicted = history.commit(dot(3.0)).unwrap();
        assert_eq!(evicted.geometry, Geometry::Empty);
        assert_eq!(history.len(), 3);
        assert_eq!(history.pointer(), 3);
        assert_eq!(xs(&history), vec![1.0, 2.0, 3.0]);

        let mut undos = 0;
        while history.undo() {
            undos += 1;
        }
        assert_eq!(undos, 2);
        assert_eq!(xs(&history), vec![1.0]);
    }

    #[test]
    fn tiny_capacity_is_raised() {
        let history = History::with_capacity(Stroke::baseline(), 0);
        assert_eq!(history.capacity(), 2);
    }
}
