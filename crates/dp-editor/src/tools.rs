//! Drawing tools.
//!
//! Each tool turns a sequence of canvas-space samples into stroke geometry.
//! Stroke capture drives the active tool through the `Tool` trait and never
//! looks at which tool it is.
//!
//! | Tool | Drag behavior | Tap without drag |
//! |------|---------------|------------------|
//! | Pen | polyline through accepted samples | dot |
//! | SmoothPen / Eraser | smoothed curve through accepted samples | dot |
//! | Line / Rectangle / Circle / Ellipse | shape from start to current point | nothing |
//! | QuadCurve / CubicCurve | 1st tap: start; 2nd touch: control, drag: end | nothing |
//! | Text | drag moves the anchor; release places the text | text at the tap |

use dp_core::config::{CanvasConfig, ToolKind};
use dp_core::curve::CurveBuilder;
use dp_core::model::Geometry;
use dp_core::text::layout_text;
use kurbo::{BezPath, Circle, Ellipse, PathEl, Point, Rect, Shape};

/// Flattening accuracy for closed-form shapes, in canvas units.
const SHAPE_ACCURACY: f64 = 0.1;

/// Result of pressing a pointer with a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// A stroke is now being drawn.
    Started,
    /// The press was recorded, but no stroke starts yet (first tap of a
    /// two-tap curve).
    Pending,
}

/// Whether an `extend` sample changed the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Accepted,
    /// Closer than the tolerance to the last accepted sample.
    Rejected,
}

pub trait Tool: Send {
    fn kind(&self) -> ToolKind;

    fn begin(&mut self, point: Point) -> BeginOutcome;

    /// Feed a sample. `tolerance` is the minimum per-axis distance, in
    /// canvas units, that freehand tools require between accepted samples.
    fn extend(&mut self, point: Point, tolerance: f64) -> Sample;

    /// Geometry of the stroke in progress.
    fn geometry(&self) -> Geometry;

    /// Finish the stroke. `None` means there is nothing worth keeping.
    fn end(&mut self) -> Option<Geometry>;

    /// Drop the stroke in progress and any pending taps.
    fn cancel(&mut self);
}

/// Build the tool that drives input under `config`'s tool and mode.
/// `None` when the mode switches drawing off.
pub fn tool_for(config: &CanvasConfig) -> Option<Box<dyn Tool>> {
    let tool: Box<dyn Tool> = match config.effective_tool()? {
        ToolKind::Pen => Box::new(PenTool::new()),
        ToolKind::SmoothPen => Box::new(SmoothPenTool::new()),
        ToolKind::Eraser => Box::new(SmoothPenTool::eraser()),
        ToolKind::Line => Box::new(ShapeTool::new(ShapeKind::Line)),
        ToolKind::Rectangle => Box::new(ShapeTool::new(ShapeKind::Rectangle)),
        ToolKind::Circle => Box::new(ShapeTool::new(ShapeKind::Circle)),
        ToolKind::Ellipse => Box::new(ShapeTool::new(ShapeKind::Ellipse)),
        ToolKind::QuadCurve => Box::new(CurveTool::quadratic()),
        ToolKind::CubicCurve => Box::new(CurveTool::cubic()),
        ToolKind::Text => Box::new(TextTool::new(
            config.text(),
            config.font_size(),
            config.viewport().width as f64,
        )),
    };
    Some(tool)
}

/// Per-axis jitter filter shared by the freehand tools.
fn passes_tolerance(last: Point, next: Point, tolerance: f64) -> bool {
    (next.x - last.x).abs() >= tolerance || (next.y - last.y).abs() >= tolerance
}

// ─── Pen ─────────────────────────────────────────────────────────────────

/// Straight segments between accepted samples.
pub struct PenTool {
    path: BezPath,
    last: Option<Point>,
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PenTool {
    pub fn new() -> Self {
        Self {
            path: BezPath::new(),
            last: None,
        }
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn begin(&mut self, point: Point) -> BeginOutcome {
        self.path = BezPath::new();
        self.path.move_to(point);
        self.last = Some(point);
        BeginOutcome::Started
    }

    fn extend(&mut self, point: Point, tolerance: f64) -> Sample {
        match self.last {
            Some(last) if passes_tolerance(last, point, tolerance) => {
                self.path.line_to(point);
                self.last = Some(point);
                Sample::Accepted
            }
            _ => Sample::Rejected,
        }
    }

    fn geometry(&self) -> Geometry {
        match self.path.elements() {
            [] => Geometry::Empty,
            [PathEl::MoveTo(p)] => Geometry::Dot(*p),
            _ => Geometry::Path(self.path.clone()),
        }
    }

    fn end(&mut self) -> Option<Geometry> {
        let geometry = self.geometry();
        self.cancel();
        (!geometry.is_empty()).then_some(geometry)
    }

    fn cancel(&mut self) {
        self.path = BezPath::new();
        self.last = None;
    }
}

// ─── Smooth pen ──────────────────────────────────────────────────────────

/// Smoothed freehand curve. Samples are knots of an incremental
/// `CurveBuilder`, so each accepted sample costs O(1).
pub struct SmoothPenTool {
    builder: CurveBuilder,
    kind: ToolKind,
}

impl Default for SmoothPenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SmoothPenTool {
    pub fn new() -> Self {
        Self {
            builder: CurveBuilder::new(),
            kind: ToolKind::SmoothPen,
        }
    }

    /// Same curve, reported as the eraser.
    pub fn eraser() -> Self {
        Self {
            kind: ToolKind::Eraser,
            ..Self::new()
        }
    }

    pub fn knot_count(&self) -> usize {
        self.builder.knots().len()
    }
}

impl Tool for SmoothPenTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn begin(&mut self, point: Point) -> BeginOutcome {
        self.builder.reset();
        self.builder.add_knot(point);
        BeginOutcome::Started
    }

    fn extend(&mut self, point: Point, tolerance: f64) -> Sample {
        match self.builder.last_knot() {
            Some(last) if passes_tolerance(last, point, tolerance) => {
                self.builder.add_knot(point);
                Sample::Accepted
            }
            _ => Sample::Rejected,
        }
    }

    fn geometry(&self) -> Geometry {
        match self.builder.knots() {
            [] => Geometry::Empty,
            [p] => Geometry::Dot(*p),
            _ => Geometry::Path(self.builder.to_bez_path()),
        }
    }

    fn end(&mut self) -> Option<Geometry> {
        let geometry = self.geometry();
        self.builder.reset();
        (!geometry.is_empty()).then_some(geometry)
    }

    fn cancel(&mut self) {
        self.builder.reset();
    }
}

// ─── Shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Line,
    Rectangle,
    /// Centered on the start point, through the current point.
    Circle,
    /// Inscribed in the start/current bounding box.
    Ellipse,
}

/// Closed-form shapes recomputed from the start and current point.
pub struct ShapeTool {
    shape: ShapeKind,
    start: Option<Point>,
    current: Option<Point>,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            start: None,
            current: None,
        }
    }

    fn build(&self, start: Point, end: Point) -> BezPath {
        match self.shape {
            ShapeKind::Line => {
                let mut path = BezPath::new();
                path.move_to(start);
                path.line_to(end);
                path
            }
            ShapeKind::Rectangle => Rect::from_points(start, end).to_path(SHAPE_ACCURACY),
            ShapeKind::Circle => Circle::new(start, start.distance(end)).to_path(SHAPE_ACCURACY),
            ShapeKind::Ellipse => {
                Ellipse::from_rect(Rect::from_points(start, end)).to_path(SHAPE_ACCURACY)
            }
        }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            ShapeKind::Line => ToolKind::Line,
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Circle => ToolKind::Circle,
            ShapeKind::Ellipse => ToolKind::Ellipse,
        }
    }

    fn begin(&mut self, point: Point) -> BeginOutcome {
        self.start = Some(point);
        self.current = None;
        BeginOutcome::Started
    }

    fn extend(&mut self, point: Point, _tolerance: f64) -> Sample {
        if self.start.is_none() {
            return Sample::Rejected;
        }
        self.current = Some(point);
        Sample::Accepted
    }

    fn geometry(&self) -> Geometry {
        match (self.start, self.current) {
            (Some(start), Some(end)) if start != end => Geometry::Path(self.build(start, end)),
            _ => Geometry::Empty,
        }
    }

    fn end(&mut self) -> Option<Geometry> {
        let geometry = self.geometry();
        self.cancel();
        (!geometry.is_empty()).then_some(geometry)
    }

    fn cancel(&mut self) {
        self.start = None;
        self.current = None;
    }
}

// ─── Two-tap curves ──────────────────────────────────────────────────────

/// Bézier drawn in two touches: the first tap fixes the start point, the
/// second touch places the control point and dragging moves the end.
pub struct CurveTool {
    cubic: bool,
    start: Option<Point>,
    control: Option<Point>,
    end: Option<Point>,
}

impl CurveTool {
    pub fn quadratic() -> Self {
        Self {
            cubic: false,
            start: None,
            control: None,
            end: None,
        }
    }

    pub fn cubic() -> Self {
        Self {
            cubic: true,
            ..Self::quadratic()
        }
    }

    /// True between the first tap and the second touch.
    pub fn is_pending(&self) -> bool {
        self.start.is_some() && self.control.is_none()
    }
}

impl Tool for CurveTool {
    fn kind(&self) -> ToolKind {
        if self.cubic {
            ToolKind::CubicCurve
        } else {
            ToolKind::QuadCurve
        }
    }

    fn begin(&mut self, point: Point) -> BeginOutcome {
        if self.start.is_none() {
            self.start = Some(point);
            return BeginOutcome::Pending;
        }
        self.control = Some(point);
        self.end = Some(point);
        BeginOutcome::Started
    }

    fn extend(&mut self, point: Point, _tolerance: f64) -> Sample {
        if self.control.is_none() {
            return Sample::Rejected;
        }
        self.end = Some(point);
        Sample::Accepted
    }

    fn geometry(&self) -> Geometry {
        let (Some(start), Some(control), Some(end)) = (self.start, self.control, self.end) else {
            return Geometry::Empty;
        };
        let mut path = BezPath::new();
        path.move_to(start);
        if self.cubic {
            // Second control: the first one reflected through the chord midpoint.
            let mirrored = start + (end - control);
            path.curve_to(control, mirrored, end);
        } else {
            path.quad_to(control, end);
        }
        Geometry::Path(path)
    }

    fn end(&mut self) -> Option<Geometry> {
        if self.is_pending() {
            // Lifting the first tap keeps the start for the second touch.
            return None;
        }
        let geometry = self.geometry();
        self.cancel();
        match (&geometry, geometry.start(), geometry.end()) {
            (Geometry::Path(_), Some(a), Some(b)) if a != b => Some(geometry),
            _ => None,
        }
    }

    fn cancel(&mut self) {
        self.start = None;
        self.control = None;
        self.end = None;
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Places the configured text. Dragging moves the anchor; release commits.
pub struct TextTool {
    text: String,
    font_size: f32,
    canvas_width: f64,
    anchor: Option<Point>,
}

impl TextTool {
    pub fn new(text: impl Into<String>, font_size: f32, canvas_width: f64) -> Self {
        Self {
            text: text.into(),
            font_size,
            canvas_width,
            anchor: None,
        }
    }
}

impl Tool for TextTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Text
    }

    fn begin(&mut self, point: Point) -> BeginOutcome {
        self.anchor = Some(point);
        BeginOutcome::Started
    }

    fn extend(&mut self, point: Point, _tolerance: f64) -> Sample {
        if self.anchor.is_none() {
            return Sample::Rejected;
        }
        self.anchor = Some(point);
        Sample::Accepted
    }

    fn geometry(&self) -> Geometry {
        match self.anchor {
            Some(anchor) if !self.text.is_empty() => Geometry::Text(layout_text(
                &self.text,
                anchor,
                self.font_size,
                self.canvas_width,
            )),
            _ => Geometry::Empty,
        }
    }

    fn end(&mut self) -> Option<Geometry> {
        let geometry = self.geometry();
        self.anchor = None;
        (!geometry.is_empty()).then_some(geometry)
    }

    fn cancel(&mut self) {
        self.anchor = None;
    }
}
