//! Draw vs. pan/zoom arbitration.
//!
//! The mode only changes on pointer-count transitions: one pointer down
//! starts drawing, a second pointer switches to transforming, and the
//! transform stays latched until every pointer is up. While transforming,
//! the two tracked pointers define a pinch session measured against where
//! they were when the session started.

use crate::input::{PointerAction, PointerEvent};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    Drawing,
    Transforming,
}

/// What the engine should do with a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Start a stroke at this screen point.
    DrawBegin(Point),
    DrawMove(Point),
    DrawEnd(Point),
    /// A pinch session starts: interrupt any stroke, snapshot the transform.
    TransformBegin,
    /// Pan/zoom relative to the session snapshot.
    Transform {
        translation: Vec2,
        scale: f64,
        pivot: Point,
    },
    /// The pinch session ended; keep the transform.
    TransformEnd,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchSession {
    mid: Point,
    span: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    mode: GestureMode,
    pointers: SmallVec<[(usize, Point); 2]>,
    session: Option<PinchSession>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn handle(&mut self, event: &PointerEvent) -> GestureAction {
        let pos = event.position();
        match event.action {
            PointerAction::Down => {
                self.track(event.pointer_index, pos);
                if event.pointer_count >= 2 {
                    self.mode = GestureMode::Transforming;
                    self.session = self.pinch();
                    GestureAction::TransformBegin
                } else if self.mode == GestureMode::Transforming {
                    GestureAction::Ignore
                } else {
                    self.pointers.retain(|(i, _)| *i == event.pointer_index);
                    self.mode = GestureMode::Drawing;
                    GestureAction::DrawBegin(pos)
                }
            }

            PointerAction::Move => {
                self.track(event.pointer_index, pos);
                match self.mode {
                    GestureMode::Drawing => GestureAction::DrawMove(pos),
                    GestureMode::Transforming => self.transform(),
                    GestureMode::Idle => GestureAction::Ignore,
                }
            }

            PointerAction::Up => {
                self.pointers.retain(|(i, _)| *i != event.pointer_index);
                let remaining = event.remaining_pointers();
                match self.mode {
                    GestureMode::Drawing => {
                        self.mode = GestureMode::Idle;
                        self.pointers.clear();
                        GestureAction::DrawEnd(pos)
                    }
                    GestureMode::Transforming => {
                        if remaining == 0 {
                            self.mode = GestureMode::Idle;
                            self.pointers.clear();
                        }
                        if self.session.take().is_some() {
                            GestureAction::TransformEnd
                        } else {
                            GestureAction::Ignore
                        }
                    }
                    GestureMode::Idle => GestureAction::Ignore,
                }
            }
        }
    }

    fn track(&mut self, index: usize, pos: Point) {
        if let Some(entry) = self.pointers.iter_mut().find(|(i, _)| *i == index) {
            entry.1 = pos;
        } else {
            self.pointers.push((index, pos));
        }
    }

    fn pinch(&self) -> Option<PinchSession> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => Some(PinchSession {
                mid: a.midpoint(*b),
                span: a.distance(*b),
            }),
            _ => None,
        }
    }

    fn transform(&mut self) -> GestureAction {
        let Some(now) = self.pinch() else {
            return GestureAction::Ignore;
        };
        let Some(start) = self.session else {
            // Second pointer position became known after the session began.
            self.session = Some(now);
            return GestureAction::Ignore;
        };
        let scale = if start.span > f64::EPSILON && now.span > f64::EPSILON {
            now.span / start.span
        } else {
            1.0
        };
        GestureAction::Transform {
            translation: now.mid - start.mid,
            scale,
            pivot: now.mid,
        }
    }
}
