//! Incremental knot-based curve smoothing.
//!
//! Knots are joined by quadratic spans whose control points are the knots
//! themselves and whose end points are the midpoints between consecutive
//! knots. The result is C¹-continuous, starts exactly at the first knot and
//! ends exactly at the last one, and passes near every interior knot.
//!
//! For knots `k0..kn`:
//!
//! ```text
//! n = 1   MoveTo(k0)
//! n = 2   MoveTo(k0) LineTo(k1)
//! n ≥ 3   MoveTo(k0) QuadTo(k1, mid(k1,k2)) … QuadTo(k[n-2], k[n-1])
//! ```
//!
//! Appending a knot only rewrites the final span and pushes one new one,
//! so the builder does O(1) work per knot no matter how long the stroke is.

use kurbo::{BezPath, PathEl, Point};

/// Work counters, for checking the per-knot cost stays constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurveStats {
    /// Knots appended since the last reset.
    pub knots_added: usize,
    /// Path elements written (pushed or rewritten) since the last reset.
    pub elements_written: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CurveBuilder {
    knots: Vec<Point>,
    elements: Vec<PathEl>,
    stats: CurveStats,
}

impl CurveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all knots and the accumulated path.
    pub fn reset(&mut self) {
        self.knots.clear();
        self.elements.clear();
        self.stats = CurveStats::default();
    }

    /// Append a knot and extend the path by its newly affected span.
    pub fn add_knot(&mut self, knot: Point) {
        self.knots.push(knot);
        self.stats.knots_added += 1;

        match self.knots.len() {
            1 => self.write(PathEl::MoveTo(knot)),
            2 => self.write(PathEl::LineTo(knot)),
            n => {
                // The previous tail ended exactly on the previous last knot.
                // With three knots it was the straight k0→k1 segment and is
                // simply replaced; otherwise it now has to stop at the
                // midpoint between its control and the previous last knot.
                self.elements.pop();
                let control = self.knots[n - 2];
                if n > 3 {
                    let prev_control = self.knots[n - 3];
                    self.write(PathEl::QuadTo(prev_control, prev_control.midpoint(control)));
                }
                self.write(PathEl::QuadTo(control, knot));
            }
        }
    }

    /// The path built so far. Valid until the next `add_knot` / `reset`.
    pub fn current_path(&self) -> &[PathEl] {
        &self.elements
    }

    /// Owned copy of the current path.
    pub fn to_bez_path(&self) -> BezPath {
        BezPath::from_vec(self.elements.clone())
    }

    pub fn knots(&self) -> &[Point] {
        &self.knots
    }

    pub fn last_knot(&self) -> Option<Point> {
        self.knots.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn stats(&self) -> CurveStats {
        self.stats
    }

    fn write(&mut self, el: PathEl) {
        self.elements.push(el);
        self.stats.elements_written += 1;
    }
}

/// Build the smoothed path for a full knot sequence in one go.
pub fn smooth_path(knots: &[Point]) -> BezPath {
    let mut builder = CurveBuilder::new();
    for &k in knots {
        builder.add_knot(k);
    }
    builder.to_bez_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn single_knot_is_a_dot() {
        let mut b = CurveBuilder::new();
        b.add_knot(p(4.0, 5.0));
        assert_eq!(b.current_path(), &[PathEl::MoveTo(p(4.0, 5.0))]);
    }

    #[test]
    fn two_knots_are_a_segment() {
        let mut b = CurveBuilder::new();
        b.add_knot(p(0.0, 0.0));
        b.add_knot(p(10.0, 0.0));
        assert_eq!(
            b.current_path(),
            &[PathEl::MoveTo(p(0.0, 0.0)), PathEl::LineTo(p(10.0, 0.0))]
        );
    }

    #[test]
    fn three_knots_form_one_quad() {
        let path = smooth_path(&[p(0.0, 0.0), p(10.0, 10.0), p(20.0, 0.0)]);
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(p(0.0, 0.0)),
                PathEl::QuadTo(p(10.0, 10.0), p(20.0, 0.0)),
            ]
        );
    }

    #[test]
    fn four_knots_split_at_midpoint() {
        let path = smooth_path(&[p(0.0, 0.0), p(10.0, 10.0), p(20.0, 0.0), p(30.0, 10.0)]);
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(p(0.0, 0.0)),
                PathEl::QuadTo(p(10.0, 10.0), p(15.0, 5.0)),
                PathEl::QuadTo(p(20.0, 0.0), p(30.0, 10.0)),
            ]
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut b = CurveBuilder::new();
        b.add_knot(p(1.0, 1.0));
        b.add_knot(p(2.0, 2.0));
        b.reset();
        assert!(b.is_empty());
        assert!(b.current_path().is_empty());
        assert_eq!(b.stats(), CurveStats::default());
        b.add_knot(p(3.0, 3.0));
        assert_eq!(b.current_path(), &[PathEl::MoveTo(p(3.0, 3.0))]);
    }
}
