//! Core stroke data model for DP drawings.
//!
//! A drawing is an ordered list of `Stroke`s. Each stroke pairs immutable
//! geometry (a piecewise line/quadratic/cubic path, a dot, a full-canvas
//! flood, or a text placement) with the style that was active when the
//! stroke started. Strokes are painted in list order (painter's algorithm).

use kurbo::{BezPath, PathEl, Point};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// Straight-alpha RGBA color, 8 bits per channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Unpack a `0xAARRGGBB` integer, the layout most UI toolkits hand out.
    pub const fn from_argb(argb: u32) -> Self {
        Self::rgba(
            (argb >> 16) as u8,
            (argb >> 8) as u8,
            argb as u8,
            (argb >> 24) as u8,
        )
    }

    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Same color with its alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let mut channels = [255u8; 4];
                for (slot, &digit) in channels.iter_mut().zip(bytes) {
                    *slot = hex_val(digit)? * 17;
                }
                let [r, g, b, a] = channels;
                Some(Self::rgba(r, g, b, a))
            }
            6 | 8 => {
                let mut channels = [255u8; 4];
                for (slot, pair) in channels.iter_mut().zip(bytes.chunks(2)) {
                    *slot = hex_val(pair[0])? << 4 | hex_val(pair[1])?;
                }
                let [r, g, b, a] = channels;
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeJoin {
    Miter,
    Round,
    #[default]
    Bevel,
}

/// Whether a stroke outlines its geometry, fills it, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintStyle {
    #[default]
    Stroke,
    Fill,
    FillAndStroke,
}

/// How a stroke's pixels combine with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Ordinary source-over painting.
    #[default]
    Normal,
    /// Erase to transparent wherever the stroke covers.
    Clear,
}

/// Everything needed to paint a stroke, frozen when the stroke starts.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub width: f32,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
    /// Halo radius painted beneath the stroke; 0 disables it.
    pub blur: f32,
    /// Alpha applied on top of the color's own alpha, 0..=255.
    pub opacity: u8,
    pub paint_style: PaintStyle,
    pub blend: BlendMode,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
            width: 3.0,
            cap: StrokeCap::Round,
            join: StrokeJoin::Bevel,
            blur: 0.0,
            opacity: 255,
            paint_style: PaintStyle::Stroke,
            blend: BlendMode::Normal,
        }
    }
}

impl StrokeStyle {
    /// Opaque fill style used by full-canvas floods (clear).
    pub fn flood(color: Color) -> Self {
        Self {
            stroke_color: color,
            fill_color: color,
            width: 0.0,
            paint_style: PaintStyle::Fill,
            ..Self::default()
        }
    }

    pub fn is_eraser(&self) -> bool {
        self.blend == BlendMode::Clear
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// One laid-out line of a text placement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Left end of the line's baseline, in canvas space.
    pub baseline: Point,
}

/// A block of text anchored at a canvas point, already broken into lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub origin: Point,
    pub font_size: f32,
    pub lines: Vec<TextLine>,
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// The drawable shape of a stroke, in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    /// Nothing to paint (the history baseline).
    #[default]
    Empty,
    /// A single tap: a round mark of the stroke width.
    Dot(Point),
    /// Piecewise line / quadratic / cubic path, open or closed.
    Path(BezPath),
    /// Covers the entire canvas.
    Flood,
    /// Placed text.
    Text(TextBlock),
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Empty => true,
            Geometry::Path(path) => path.elements().is_empty(),
            Geometry::Text(block) => block.lines.is_empty(),
            Geometry::Dot(_) | Geometry::Flood => false,
        }
    }

    /// First point the geometry passes through, if it has one.
    pub fn start(&self) -> Option<Point> {
        match self {
            Geometry::Dot(p) => Some(*p),
            Geometry::Path(path) => path.elements().first().and_then(el_end),
            Geometry::Text(block) => Some(block.origin),
            Geometry::Empty | Geometry::Flood => None,
        }
    }

    /// Last point the geometry passes through, if it has one.
    pub fn end(&self) -> Option<Point> {
        match self {
            Geometry::Dot(p) => Some(*p),
            Geometry::Path(path) => path.elements().iter().rev().find_map(el_end),
            Geometry::Text(block) => Some(block.origin),
            Geometry::Empty | Geometry::Flood => None,
        }
    }
}

/// End point of a path element (`None` for `ClosePath`).
pub fn el_end(el: &PathEl) -> Option<Point> {
    match *el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
            Some(p)
        }
        PathEl::ClosePath => None,
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

/// One finalized drawable unit in history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stroke {
    pub geometry: Geometry,
    pub style: StrokeStyle,
}

impl Stroke {
    pub fn new(geometry: Geometry, style: StrokeStyle) -> Self {
        Self { geometry, style }
    }

    /// The empty entry every history starts from.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// A full-canvas opaque fill, used to clear the drawing undoably.
    pub fn flood(color: Color) -> Self {
        Self::new(Geometry::Flood, StrokeStyle::flood(color.with_alpha(255)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_all_forms() {
        assert_eq!(Color::from_hex("#FFF"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("f008"), Some(Color::rgba(255, 0, 0, 136)));
        assert_eq!(Color::from_hex("#a2a2a2"), Some(Color::rgb(162, 162, 162)));
        assert_eq!(Color::from_hex("#00000080"), Some(Color::rgba(0, 0, 0, 128)));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#GG0000"), None);
    }

    #[test]
    fn hex_emit_roundtrip() {
        let c = Color::rgba(18, 52, 86, 120);
        assert_eq!(c.to_hex(), "#12345678");
        assert_eq!(Color::from_hex(&c.to_hex()), Some(c));
        assert_eq!(Color::BLACK.to_hex(), "#000000");
    }

    #[test]
    fn argb_packing() {
        let c = Color::from_argb(0x80FF_2010);
        assert_eq!(c, Color::rgba(0xFF, 0x20, 0x10, 0x80));
        assert_eq!(c.to_argb(), 0x80FF_2010);
    }

    #[test]
    fn geometry_endpoints() {
        let mut path = BezPath::new();
        path.move_to((1.0, 2.0));
        path.quad_to((3.0, 4.0), (5.0, 6.0));
        path.close_path();
        let g = Geometry::Path(path);
        assert_eq!(g.start(), Some(Point::new(1.0, 2.0)));
        assert_eq!(g.end(), Some(Point::new(5.0, 6.0)));
        assert!(!g.is_empty());
        assert!(Geometry::Path(BezPath::new()).is_empty());
        assert!(Stroke::baseline().geometry.is_empty());
    }

    #[test]
    fn flood_is_opaque() {
        let s = Stroke::flood(Color::rgba(10, 20, 30, 40));
        assert_eq!(s.geometry, Geometry::Flood);
        assert_eq!(s.style.fill_color.a, 255);
        assert_eq!(s.style.paint_style, PaintStyle::Fill);
    }
}
