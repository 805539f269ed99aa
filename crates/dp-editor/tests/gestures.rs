//! Integration tests: draw vs. pan/zoom arbitration through the engine.

use dp_core::Point;
use dp_core::config::CanvasConfig;
use dp_editor::{CaptureState, DrawEngine, PointerAction, PointerEvent};
use pretty_assertions::assert_eq;

fn make_engine() -> DrawEngine {
    DrawEngine::new(CanvasConfig::default()).unwrap()
}

fn ev(action: PointerAction, x: f64, y: f64, count: usize, index: usize) -> PointerEvent {
    PointerEvent::new(action, x, y, count, index)
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-6
}

#[test]
fn second_finger_commits_grown_stroke() {
    let engine = make_engine();
    engine.handle_pointer(&PointerEvent::down(0.0, 0.0));
    engine.handle_pointer(&PointerEvent::moved(50.0, 0.0));
    engine.handle_pointer(&ev(PointerAction::Down, 100.0, 100.0, 2, 1));

    assert_eq!(engine.history_pointer(), 2);
    assert_eq!(engine.capture_state(), CaptureState::Committed);
}

#[test]
fn second_finger_discards_untouched_stroke() {
    let engine = make_engine();
    engine.handle_pointer(&PointerEvent::down(0.0, 0.0));
    engine.handle_pointer(&ev(PointerAction::Down, 100.0, 100.0, 2, 1));
    assert_eq!(engine.history_pointer(), 1);
    assert_eq!(engine.capture_state(), CaptureState::Idle);
}

#[test]
fn pinch_zooms_about_fingers_without_drift() {
    let engine = make_engine();
    engine.handle_pointer(&ev(PointerAction::Down, 100.0, 100.0, 1, 0));
    engine.handle_pointer(&ev(PointerAction::Down, 200.0, 100.0, 2, 1));

    // Jitter back and forth, then settle at double span.
    for x in [210.0, 190.0, 250.0, 300.0] {
        engine.handle_pointer(&ev(PointerAction::Move, x, 100.0, 2, 1));
    }
    let view = engine.view_transform();
    assert!((view.scale() - 2.0).abs() < 1e-9);
    // The canvas point under the first finger stays under it.
    assert!(close(view.to_screen(Point::new(100.0, 100.0)), Point::new(100.0, 100.0)));

    engine.handle_pointer(&ev(PointerAction::Up, 300.0, 100.0, 2, 1));
    engine.handle_pointer(&ev(PointerAction::Move, 120.0, 120.0, 1, 0));
    engine.handle_pointer(&ev(PointerAction::Up, 120.0, 120.0, 1, 0));

    // Nothing was drawn by the leftover finger.
    assert_eq!(engine.history_pointer(), 1);
    assert!((engine.view_transform().scale() - 2.0).abs() < 1e-9);
}

#[test]
fn zoom_is_clamped_to_limits() {
    let engine = make_engine();
    engine.handle_pointer(&ev(PointerAction::Down, 0.0, 0.0, 1, 0));
    engine.handle_pointer(&ev(PointerAction::Down, 1.0, 0.0, 2, 1));
    engine.handle_pointer(&ev(PointerAction::Move, 1000.0, 0.0, 2, 1));
    assert!((engine.view_transform().scale() - 20.0).abs() < 1e-9);
}

#[test]
fn strokes_after_pan_land_in_canvas_space() {
    let engine = make_engine();
    engine.translate(100.0, 0.0);
    engine.handle_pointer(&PointerEvent::down(100.0, 50.0));
    engine.handle_pointer(&PointerEvent::moved(200.0, 50.0));
    engine.handle_pointer(&PointerEvent::up(200.0, 50.0));
    let stroke = engine.visible_strokes().pop().unwrap();
    assert_eq!(stroke.geometry.start(), Some(Point::new(0.0, 50.0)));
    assert_eq!(stroke.geometry.end(), Some(Point::new(100.0, 50.0)));
}
