//! Engine configuration with validated setters.
//!
//! Every value the UI can change lives in one `CanvasConfig`. Setters never
//! fail: an invalid value is replaced by the documented default so the
//! engine always has something renderable. The same rules run when a
//! configuration is loaded from JSON.

use crate::model::{BlendMode, Color, PaintStyle, StrokeCap, StrokeJoin, StrokeStyle};
use crate::transform::ScaleLimits;
use kurbo::Rect;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;
pub const DEFAULT_OPACITY: u8 = 255;
pub const DEFAULT_BLUR: f32 = 0.0;
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
/// Minimum screen-space distance between accepted samples, in pixels.
pub const DEFAULT_TOUCH_TOLERANCE: f64 = 15.0;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_PLAIN_COLOR: Color = Color::rgb(0xA2, 0xA2, 0xA2);

/// The drawing tool used for new strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Polyline through the accepted samples.
    Pen,
    /// Smoothed curve through the accepted samples.
    #[default]
    SmoothPen,
    Line,
    Rectangle,
    Circle,
    Ellipse,
    /// First tap sets the start, second tap the control, drag the end.
    QuadCurve,
    /// Like `QuadCurve`, but with a mirrored second control point.
    CubicCurve,
    Text,
    Eraser,
}

/// What pointer input on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Draw,
    Text,
    Eraser,
    /// Drawing input is ignored; gestures still pan and zoom.
    None,
}

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Logical page rectangle, in canvas coordinates. Outside it the plain
/// color is painted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawBound {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl DrawBound {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Zero height means "no bound set".
    pub fn is_empty(&self) -> bool {
        self.bottom - self.top == 0.0
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    stroke_color: Color,
    fill_color: Color,
    stroke_width: f32,
    #[serde(deserialize_with = "deserialize_opacity")]
    opacity: u8,
    blur: f32,
    line_cap: StrokeCap,
    line_join: StrokeJoin,
    paint_style: PaintStyle,
    font_size: f32,
    text: String,
    base_color: Color,
    plain_color: Color,
    draw_bound: Option<DrawBound>,
    tool: ToolKind,
    mode: Mode,
    viewport: Viewport,
    scale_limits: ScaleLimits,
    touch_tolerance: f64,
    frame_interval_ms: u64,
}

/// Accept any integer and clamp it like `set_opacity` does.
fn deserialize_opacity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u8::try_from(raw).unwrap_or(DEFAULT_OPACITY))
}

fn non_negative(what: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::debug!("{what} {value} is invalid, using {default}");
        default
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            opacity: DEFAULT_OPACITY,
            blur: DEFAULT_BLUR,
            line_cap: StrokeCap::Round,
            line_join: StrokeJoin::Bevel,
            paint_style: PaintStyle::Stroke,
            font_size: DEFAULT_FONT_SIZE,
            text: String::new(),
            base_color: Color::WHITE,
            plain_color: DEFAULT_PLAIN_COLOR,
            draw_bound: None,
            tool: ToolKind::SmoothPen,
            mode: Mode::Draw,
            viewport: Viewport::default(),
            scale_limits: ScaleLimits::default(),
            touch_tolerance: DEFAULT_TOUCH_TOLERANCE,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl CanvasConfig {
    /// Parse a JSON configuration. Missing fields take their defaults and
    /// out-of-range values are clamped exactly like the setters do.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: CanvasConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Run every field through its setter.
    pub fn sanitized(mut self) -> Self {
        self.set_stroke_width(self.stroke_width);
        self.set_blur(self.blur);
        self.set_font_size(self.font_size);
        self.set_viewport(self.viewport);
        self.set_scale_limits(self.scale_limits);
        self.set_touch_tolerance(self.touch_tolerance);
        if let Some(bound) = self.draw_bound {
            self.set_draw_bound(bound);
        }
        self
    }

    // ─── Style ───────────────────────────────────────────────────────────

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Negative or non-finite widths fall back to 3.0.
    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = non_negative("stroke width", width, DEFAULT_STROKE_WIDTH);
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Values outside 0..=255 fall back to 255.
    pub fn set_opacity(&mut self, opacity: i32) {
        self.opacity = u8::try_from(opacity).unwrap_or_else(|_| {
            log::debug!("opacity {opacity} out of range, using {DEFAULT_OPACITY}");
            DEFAULT_OPACITY
        });
    }

    pub fn blur(&self) -> f32 {
        self.blur
    }

    /// Negative or non-finite radii fall back to 0.
    pub fn set_blur(&mut self, blur: f32) {
        self.blur = non_negative("blur", blur, DEFAULT_BLUR);
    }

    pub fn line_cap(&self) -> StrokeCap {
        self.line_cap
    }

    pub fn set_line_cap(&mut self, cap: StrokeCap) {
        self.line_cap = cap;
    }

    pub fn line_join(&self) -> StrokeJoin {
        self.line_join
    }

    pub fn set_line_join(&mut self, join: StrokeJoin) {
        self.line_join = join;
    }

    pub fn paint_style(&self) -> PaintStyle {
        self.paint_style
    }

    pub fn set_paint_style(&mut self, style: PaintStyle) {
        self.paint_style = style;
    }

    // ─── Text ────────────────────────────────────────────────────────────

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Negative or non-finite sizes fall back to 32.
    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = non_negative("font size", size, DEFAULT_FONT_SIZE);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    // ─── Canvas ──────────────────────────────────────────────────────────

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn set_base_color(&mut self, color: Color) {
        self.base_color = color;
    }

    pub fn plain_color(&self) -> Color {
        self.plain_color
    }

    pub fn set_plain_color(&mut self, color: Color) {
        self.plain_color = color;
    }

    pub fn draw_bound(&self) -> Option<DrawBound> {
        self.draw_bound
    }

    /// An empty or non-finite bound clears it (the whole surface is the page).
    pub fn set_draw_bound(&mut self, bound: DrawBound) {
        let finite = [bound.left, bound.top, bound.right, bound.bottom]
            .iter()
            .all(|v| v.is_finite());
        self.draw_bound = (finite && !bound.is_empty()).then_some(bound);
    }

    pub fn clear_draw_bound(&mut self) {
        self.draw_bound = None;
    }

    /// The page rectangle: the draw bound, or the whole viewport.
    pub fn page_rect(&self) -> Rect {
        match self.draw_bound {
            Some(bound) => bound.to_rect(),
            None => Rect::new(
                0.0,
                0.0,
                self.viewport.width as f64,
                self.viewport.height as f64,
            ),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Zero-sized viewports fall back to 800×600.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = if viewport.width > 0 && viewport.height > 0 {
            viewport
        } else {
            Viewport::default()
        };
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// The tool that pointer input actually drives, after the mode is
    /// taken into account. `None` when drawing input is switched off.
    pub fn effective_tool(&self) -> Option<ToolKind> {
        match self.mode {
            Mode::None => None,
            Mode::Text => Some(ToolKind::Text),
            Mode::Eraser => Some(match self.tool {
                ToolKind::Text => ToolKind::Eraser,
                other => other,
            }),
            Mode::Draw => Some(self.tool),
        }
    }

    /// Style for a stroke started now.
    pub fn stroke_style(&self) -> StrokeStyle {
        let erasing = self.mode == Mode::Eraser || self.tool == ToolKind::Eraser;
        StrokeStyle {
            stroke_color: self.stroke_color,
            fill_color: self.fill_color,
            width: self.stroke_width,
            cap: self.line_cap,
            join: self.line_join,
            blur: self.blur,
            opacity: self.opacity,
            paint_style: if erasing {
                PaintStyle::Stroke
            } else {
                self.paint_style
            },
            blend: if erasing {
                BlendMode::Clear
            } else {
                BlendMode::Normal
            },
        }
    }

    // ─── View / timing ───────────────────────────────────────────────────

    pub fn scale_limits(&self) -> ScaleLimits {
        self.scale_limits
    }

    pub fn set_scale_limits(&mut self, limits: ScaleLimits) {
        self.scale_limits = limits.sanitized();
    }

    pub fn touch_tolerance(&self) -> f64 {
        self.touch_tolerance
    }

    /// Non-positive or non-finite tolerances fall back to 15 px.
    pub fn set_touch_tolerance(&mut self, tolerance: f64) {
        self.touch_tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            DEFAULT_TOUCH_TOLERANCE
        };
    }

    pub fn frame_interval_ms(&self) -> u64 {
        self.frame_interval_ms
    }

    pub fn set_frame_interval_ms(&mut self, ms: u64) {
        self.frame_interval_ms = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn negative_width_reads_back_default() {
        let mut c = CanvasConfig::default();
        c.set_stroke_width(-5.0);
        assert_eq!(c.stroke_width(), 3.0);
        c.set_stroke_width(0.0);
        assert_eq!(c.stroke_width(), 0.0);
        c.set_stroke_width(f32::NAN);
        assert_eq!(c.stroke_width(), 3.0);
    }

    #[test]
    fn opacity_out_of_range_reads_back_default() {
        let mut c = CanvasConfig::default();
        c.set_opacity(128);
        assert_eq!(c.opacity(), 128);
        c.set_opacity(300);
        assert_eq!(c.opacity(), 255);
        c.set_opacity(-1);
        assert_eq!(c.opacity(), 255);
    }

    #[test]
    fn blur_and_font_size_defaults() {
        let mut c = CanvasConfig::default();
        c.set_blur(-2.0);
        assert_eq!(c.blur(), 0.0);
        c.set_blur(4.5);
        assert_eq!(c.blur(), 4.5);
        c.set_font_size(-1.0);
        assert_eq!(c.font_size(), 32.0);
        c.set_font_size(12.0);
        assert_eq!(c.font_size(), 12.0);
    }

    #[test]
    fn empty_draw_bound_means_whole_viewport() {
        let mut c = CanvasConfig::default();
        c.set_draw_bound(DrawBound::new(10.0, 10.0, 50.0, 10.0));
        assert_eq!(c.draw_bound(), None);
        assert_eq!(c.page_rect(), Rect::new(0.0, 0.0, 800.0, 600.0));
        c.set_draw_bound(DrawBound::new(50.0, 60.0, 10.0, 20.0));
        assert_eq!(c.page_rect(), Rect::new(10.0, 20.0, 50.0, 60.0));
    }

    #[test]
    fn eraser_mode_uses_clear_blend() {
        let mut c = CanvasConfig::default();
        c.set_paint_style(PaintStyle::Fill);
        assert_eq!(c.stroke_style().blend, BlendMode::Normal);
        c.set_mode(Mode::Eraser);
        let style = c.stroke_style();
        assert_eq!(style.blend, BlendMode::Clear);
        assert_eq!(style.paint_style, PaintStyle::Stroke);
    }

    #[test]
    fn effective_tool_follows_mode() {
        let mut c = CanvasConfig::default();
        c.set_tool(ToolKind::Rectangle);
        assert_eq!(c.effective_tool(), Some(ToolKind::Rectangle));
        c.set_mode(Mode::Text);
        assert_eq!(c.effective_tool(), Some(ToolKind::Text));
        c.set_mode(Mode::None);
        assert_eq!(c.effective_tool(), None);
        c.set_mode(Mode::Eraser);
        c.set_tool(ToolKind::Text);
        assert_eq!(c.effective_tool(), Some(ToolKind::Eraser));
    }

    #[test]
    fn json_load_sanitizes() {
        let json = r##"{
            "stroke_width": -4.0,
            "font_size": -10.0,
            "stroke_color": "#FF0000",
            "tool": "ellipse",
            "opacity": 300,
            "viewport": { "width": 0, "height": 10 }
        }"##;
        let c = CanvasConfig::from_json(json).unwrap();
        assert_eq!(c.stroke_width(), 3.0);
        assert_eq!(c.font_size(), 32.0);
        assert_eq!(c.stroke_color(), Color::rgb(255, 0, 0));
        assert_eq!(c.tool(), ToolKind::Ellipse);
        assert_eq!(c.viewport(), Viewport::default());
        assert_eq!(c.opacity(), 255);
    }

    #[test]
    fn json_roundtrip() {
        let mut c = CanvasConfig::default();
        c.set_plain_color(Color::rgba(1, 2, 3, 4));
        c.set_mode(Mode::Eraser);
        let json = c.to_json().unwrap();
        let back = CanvasConfig::from_json(&json).unwrap();
        assert_eq!(back, c);
    }
}
