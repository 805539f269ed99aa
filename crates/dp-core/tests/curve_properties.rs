//! Integration tests: smoothed curve construction (dp-core).
//!
//! Checks the endpoint guarantees and the constant per-knot cost of the
//! incremental curve builder over longer, irregular knot sequences.

use dp_core::curve::{CurveBuilder, smooth_path};
use dp_core::kurbo::{PathEl, Point};
use dp_core::model::el_end;

fn zigzag(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let x = i as f64 * 7.5;
            let y = if i % 2 == 0 { 0.0 } else { 13.0 + (i % 5) as f64 };
            Point::new(x, y)
        })
        .collect()
}

// ─── Endpoints ──────────────────────────────────────────────────────────

#[test]
fn curve_starts_and_ends_on_the_outer_knots() {
    for n in 3..40 {
        let knots = zigzag(n);
        let path = smooth_path(&knots);
        let els = path.elements();
        assert_eq!(els.first(), Some(&PathEl::MoveTo(knots[0])), "n = {n}");
        assert_eq!(
            els.last().and_then(el_end),
            Some(knots[n - 1]),
            "last point must equal last knot for n = {n}"
        );
    }
}

#[test]
fn interior_spans_join_at_midpoints() {
    let knots = zigzag(8);
    let path = smooth_path(&knots);
    // MoveTo + one QuadTo per interior knot.
    assert_eq!(path.elements().len(), knots.len() - 1);
    for (i, el) in path.elements().iter().enumerate().skip(1) {
        let PathEl::QuadTo(control, end) = *el else {
            panic!("expected quadratic span, got {el:?}");
        };
        assert_eq!(control, knots[i]);
        if i < knots.len() - 2 {
            assert_eq!(end, knots[i].midpoint(knots[i + 1]));
        }
    }
}

#[test]
fn incremental_matches_batch() {
    let knots = zigzag(25);
    let mut builder = CurveBuilder::new();
    for &k in &knots {
        builder.add_knot(k);
    }
    assert_eq!(builder.to_bez_path(), smooth_path(&knots));
}

// ─── Cost ───────────────────────────────────────────────────────────────

#[test]
fn each_knot_costs_a_constant_number_of_writes() {
    let mut builder = CurveBuilder::new();
    let mut last_written = 0;
    for (i, k) in zigzag(500).into_iter().enumerate() {
        builder.add_knot(k);
        let stats = builder.stats();
        let delta = stats.elements_written - last_written;
        assert!(delta <= 2, "knot {i} wrote {delta} elements");
        last_written = stats.elements_written;
        // The path grows by at most one element per knot.
        assert!(builder.current_path().len() <= i + 1);
    }
    let stats = builder.stats();
    assert_eq!(stats.knots_added, 500);
    assert!(stats.elements_written <= 2 * 500);
}
