//! Canvas ↔ screen mapping under pan and zoom.
//!
//! `ViewTransform` owns an affine matrix mapping canvas space to screen
//! space and keeps its inverse in step: every mutation recomputes the
//! inverse immediately, so pointer input is never mapped through a stale
//! matrix. Scale is uniform and clamped to the configured limits.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleLimits {
    pub min: f64,
    pub max: f64,
}

impl ScaleLimits {
    pub const DEFAULT_MIN: f64 = 0.1;
    pub const DEFAULT_MAX: f64 = 20.0;

    /// Limits that fail validation fall back to the defaults.
    pub fn sanitized(self) -> Self {
        let valid = self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.min <= self.max;
        if valid { self } else { Self::default() }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    matrix: Affine,
    inverse: Affine,
    limits: ScaleLimits,
    /// Matrix captured by `save()` at the start of a gesture.
    saved: Option<Affine>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(ScaleLimits::default())
    }
}

impl ViewTransform {
    pub fn new(limits: ScaleLimits) -> Self {
        Self {
            matrix: Affine::IDENTITY,
            inverse: Affine::IDENTITY,
            limits: limits.sanitized(),
            saved: None,
        }
    }

    /// Canvas → screen matrix.
    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Screen → canvas matrix.
    pub fn inverse(&self) -> Affine {
        self.inverse
    }

    pub fn limits(&self) -> ScaleLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ScaleLimits) {
        self.limits = limits.sanitized();
        let clamped = self.limits.clamp(self.scale());
        if clamped != self.scale() {
            let factor = clamped / self.scale();
            self.set_matrix(Affine::scale(factor) * self.matrix);
        }
    }

    /// Current uniform zoom factor.
    pub fn scale(&self) -> f64 {
        self.matrix.determinant().abs().sqrt()
    }

    /// Pan by a screen-space offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.set_matrix(Affine::translate(Vec2::new(dx, dy)) * self.matrix);
    }

    /// Zoom by `factor` around a screen-space pivot, keeping the composed
    /// scale inside the limits. Returns the factor actually applied.
    pub fn scale_about(&mut self, factor: f64, pivot: Point) -> f64 {
        if !factor.is_finite() || factor <= 0.0 {
            return 1.0;
        }
        let current = self.scale();
        let applied = self.limits.clamp(current * factor) / current;
        let about = pivot.to_vec2();
        self.set_matrix(
            Affine::translate(about) * Affine::scale(applied) * Affine::translate(-about) * self.matrix,
        );
        applied
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        self.matrix * canvas
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        self.inverse * screen
    }

    /// Map a screen-space length into canvas units.
    ///
    /// Used to keep the sampling tolerance constant in visual size.
    pub fn map_radius(&self, screen_length: f64) -> f64 {
        screen_length * self.inverse.determinant().abs().sqrt()
    }

    /// Snapshot the current matrix; later gesture deltas apply relative to it.
    pub fn save(&mut self) {
        self.saved = Some(self.matrix);
    }

    /// Return to the snapshot taken by `save()`, if any.
    pub fn restore(&mut self) {
        if let Some(saved) = self.saved {
            self.set_matrix(saved);
        }
    }

    /// Drop the gesture snapshot.
    pub fn commit(&mut self) {
        self.saved = None;
    }

    pub fn is_saved(&self) -> bool {
        self.saved.is_some()
    }

    /// Restore the snapshot, then pan by `translation` and zoom by `scale`
    /// around `pivot`. Repeated calls during one gesture never accumulate.
    pub fn apply_gesture(&mut self, translation: Vec2, scale: f64, pivot: Point) {
        self.restore();
        self.translate(translation.x, translation.y);
        self.scale_about(scale, pivot);
    }

    /// Back to identity.
    pub fn reset(&mut self) {
        self.saved = None;
        self.set_matrix(Affine::IDENTITY);
    }

    fn set_matrix(&mut self, matrix: Affine) {
        self.matrix = matrix;
        self.inverse = matrix.inverse();
    }
}
