//! Input abstraction layer.
//!
//! The host translates its native touch/mouse/stylus events into
//! `PointerEvent`s in screen coordinates before handing them to the engine.

use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// A pointer touched the surface (first or additional finger).
    Down,
    Move,
    /// A pointer left the surface.
    Up,
}

/// One pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    /// Screen position of the pointer this event is about.
    pub x: f64,
    pub y: f64,
    /// Pointers touching the surface while this event happens. For `Up`
    /// this still counts the pointer being lifted.
    pub pointer_count: usize,
    /// Stable index of the pointer this event is about.
    pub pointer_index: usize,
}

impl PointerEvent {
    pub fn new(action: PointerAction, x: f64, y: f64, pointer_count: usize, pointer_index: usize) -> Self {
        Self {
            action,
            x,
            y,
            pointer_count,
            pointer_index,
        }
    }

    /// Single-pointer down.
    pub fn down(x: f64, y: f64) -> Self {
        Self::new(PointerAction::Down, x, y, 1, 0)
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerAction::Move, x, y, 1, 0)
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::new(PointerAction::Up, x, y, 1, 0)
    }

    /// Same event, reported for pointer `index` out of `count`.
    pub fn with_pointer(mut self, count: usize, index: usize) -> Self {
        self.pointer_count = count;
        self.pointer_index = index;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Pointers still down once this event has been applied.
    pub fn remaining_pointers(&self) -> usize {
        match self.action {
            PointerAction::Up => self.pointer_count.saturating_sub(1),
            PointerAction::Down | PointerAction::Move => self.pointer_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_releases_its_pointer() {
        assert_eq!(PointerEvent::up(0.0, 0.0).remaining_pointers(), 0);
        let second_up = PointerEvent::up(0.0, 0.0).with_pointer(2, 1);
        assert_eq!(second_up.remaining_pointers(), 1);
        assert_eq!(PointerEvent::down(1.0, 2.0).position(), Point::new(1.0, 2.0));
    }
}
