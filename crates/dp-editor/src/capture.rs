//! Stroke capture.
//!
//! Drives one tool through a stroke's lifecycle (`Idle → Active →
//! Committed`) and pairs the finished geometry with the style that was in
//! effect when the stroke started.

use crate::tools::{BeginOutcome, Sample, Tool};
use dp_core::config::ToolKind;
use dp_core::model::{Stroke, StrokeStyle};
use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Active,
    /// The last stroke was handed off; the next `begin` starts a new one.
    Committed,
}

pub struct StrokeCapture {
    tool: Box<dyn Tool>,
    state: CaptureState,
    style: StrokeStyle,
    start: Option<Point>,
    accepted: usize,
}

impl StrokeCapture {
    pub fn new(tool: Box<dyn Tool>) -> Self {
        Self {
            tool,
            state: CaptureState::Idle,
            style: StrokeStyle::default(),
            start: None,
            accepted: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CaptureState::Active
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    /// Swap the tool, dropping any stroke in progress.
    pub fn set_tool(&mut self, tool: Box<dyn Tool>) {
        self.cancel();
        self.tool = tool;
    }

    /// Start point of the active stroke.
    pub fn start(&self) -> Option<Point> {
        self.start.filter(|_| self.is_active())
    }

    /// Samples accepted since `begin`.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Press at `point` (canvas space). Returns true when a stroke became
    /// active. Ignored while another stroke is active.
    pub fn begin(&mut self, point: Point, style: StrokeStyle) -> bool {
        if self.is_active() {
            log::trace!("begin ignored: stroke already active");
            return false;
        }
        match self.tool.begin(point) {
            BeginOutcome::Started => {
                self.state = CaptureState::Active;
                self.style = style;
                self.start = Some(point);
                self.accepted = 0;
                true
            }
            BeginOutcome::Pending => {
                log::trace!("{:?}: waiting for second touch", self.tool.kind());
                false
            }
        }
    }

    /// Feed a sample to the active stroke.
    pub fn extend(&mut self, point: Point, tolerance: f64) -> Sample {
        if !self.is_active() {
            return Sample::Rejected;
        }
        let sample = self.tool.extend(point, tolerance);
        if sample == Sample::Accepted {
            self.accepted += 1;
        }
        sample
    }

    /// The stroke as it currently looks, if one is active and non-empty.
    pub fn live_stroke(&self) -> Option<Stroke> {
        if !self.is_active() {
            return None;
        }
        let geometry = self.tool.geometry();
        (!geometry.is_empty()).then(|| Stroke::new(geometry, self.style.clone()))
    }

    /// Release: finalize the active stroke for history.
    pub fn end(&mut self) -> Option<Stroke> {
        if !self.is_active() {
            // Lets a two-tap tool see the release of its first tap.
            let _ = self.tool.end();
            return None;
        }
        self.state = CaptureState::Committed;
        self.start = None;
        let geometry = self.tool.end()?;
        Some(Stroke::new(geometry, self.style.clone()))
    }

    /// A second pointer arrived: keep the stroke if it grew past its first
    /// knot, otherwise throw it away.
    pub fn interrupt(&mut self) -> Option<Stroke> {
        if !self.is_active() {
            self.tool.cancel();
            return None;
        }
        if self.accepted > 0 {
            self.end()
        } else {
            self.cancel();
            None
        }
    }

    pub fn cancel(&mut self) {
        self.tool.cancel();
        self.state = CaptureState::Idle;
        self.start = None;
        self.accepted = 0;
    }
}
