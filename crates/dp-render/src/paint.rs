//! Strokes → tiny-skia drawing commands.
//!
//! Paints one `Stroke` at a time onto a raster under a given transform:
//! fills, outlines, dots, full-canvas floods, text and blurred halos.

use crate::text::{default_font, draw_text, text_bounds};
use dp_core::kurbo::{Affine, BezPath, PathEl, Shape};
use dp_core::model::{
    BlendMode, Color, Geometry, PaintStyle, Stroke, StrokeCap, StrokeJoin, StrokeStyle,
};
use image::{RgbaImage, imageops};
use tiny_skia::{
    BlendMode as SkiaBlendMode, FillRule, IntRect, IntSize, LineCap, LineJoin, Paint, PathBuilder,
    Pixmap, PixmapPaint, Rect, Stroke as SkiaStroke, Transform,
};

/// Paint `stroke` onto `pixmap`, mapping canvas space through `transform`.
pub fn paint_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Affine) {
    let style = &stroke.style;

    match &stroke.geometry {
        Geometry::Empty => {}

        Geometry::Flood => {
            let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
            if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
                let paint = make_paint(style.fill_color, style);
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            }
        }

        Geometry::Dot(p) => {
            let half = (style.width / 2.0).max(0.5);
            let (x, y) = (p.x as f32, p.y as f32);
            let dot = match style.cap {
                StrokeCap::Round => PathBuilder::from_circle(x, y, half),
                StrokeCap::Square => {
                    Rect::from_xywh(x - half, y - half, half * 2.0, half * 2.0).map(PathBuilder::from_rect)
                }
                // A zero-length butt-capped segment covers nothing.
                StrokeCap::Butt => None,
            };
            if let Some(dot) = dot {
                let reach = half as f64;
                let bounds = transform.transform_rect_bbox(dp_core::kurbo::Rect::new(
                    p.x - reach,
                    p.y - reach,
                    p.x + reach,
                    p.y + reach,
                ));
                let paint = make_paint(style.stroke_color, style);
                with_halo(pixmap, style, transform, bounds, |target, affine| {
                    target.fill_path(&dot, &paint, FillRule::Winding, to_skia_transform(affine), None);
                });
            }
        }

        Geometry::Path(bez) => {
            let Some(path) = to_skia_path(bez) else {
                return;
            };
            // Miter joins can reach past half the width.
            let reach = style.width as f64 * 2.0;
            let bounds = transform.transform_rect_bbox(bez.bounding_box().inflate(reach, reach));
            let fill = matches!(style.paint_style, PaintStyle::Fill | PaintStyle::FillAndStroke)
                .then(|| make_paint(style.fill_color, style));
            let outline = matches!(style.paint_style, PaintStyle::Stroke | PaintStyle::FillAndStroke)
                .then(|| (make_paint(style.stroke_color, style), skia_stroke(style)));
            with_halo(pixmap, style, transform, bounds, |target, affine| {
                let ts = to_skia_transform(affine);
                if let Some(paint) = &fill {
                    target.fill_path(&path, paint, FillRule::Winding, ts, None);
                }
                if let Some((paint, line)) = &outline {
                    target.stroke_path(&path, paint, line, ts, None);
                }
            });
        }

        Geometry::Text(block) => {
            let Some(font) = default_font() else {
                log::warn!("no font available; text stroke skipped");
                return;
            };
            let Some(bounds) = text_bounds(font, block, transform) else {
                return;
            };
            log::trace!(
                "TEXT {} line(s) at ({}, {}) size {}",
                block.lines.len(),
                block.origin.x,
                block.origin.y,
                block.font_size
            );
            let paint = make_paint(style.stroke_color, style);
            with_halo(pixmap, style, transform, bounds, |target, affine| {
                draw_text(target, font, block, &paint, affine);
            });
        }
    }
}

/// A copy of `stroke` that paints in `color` with normal blending.
///
/// Eraser strokes clear to transparent in the cached raster; on a
/// presented frame they are previewed in the canvas base color instead.
pub fn eraser_preview(stroke: &Stroke, color: Color) -> Stroke {
    let mut preview = stroke.clone();
    preview.style.blend = BlendMode::Normal;
    preview.style.stroke_color = color;
    preview.style.fill_color = color;
    preview.style.opacity = 255;
    preview.style.blur = 0.0;
    preview
}

// ─── Conversions ─────────────────────────────────────────────────────────────

pub fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

pub fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

pub fn to_skia_color(color: Color, opacity: u8) -> tiny_skia::Color {
    let alpha = (color.a as u16 * opacity as u16 / 255) as u8;
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, alpha)
}

fn make_paint(color: Color, style: &StrokeStyle) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color, style.opacity));
    paint.anti_alias = true;
    paint.blend_mode = match style.blend {
        BlendMode::Normal => SkiaBlendMode::SourceOver,
        BlendMode::Clear => SkiaBlendMode::Clear,
    };
    paint
}

fn skia_stroke(style: &StrokeStyle) -> SkiaStroke {
    SkiaStroke {
        width: style.width,
        line_cap: match style.cap {
            StrokeCap::Butt => LineCap::Butt,
            StrokeCap::Round => LineCap::Round,
            StrokeCap::Square => LineCap::Square,
        },
        line_join: match style.join {
            StrokeJoin::Miter => LineJoin::Miter,
            StrokeJoin::Round => LineJoin::Round,
            StrokeJoin::Bevel => LineJoin::Bevel,
        },
        ..SkiaStroke::default()
    }
}

// ─── Blur halo ───────────────────────────────────────────────────────────────

/// Gaussian sigma for a blur radius, in the same units as the radius.
pub fn blur_sigma(radius: f32) -> f32 {
    radius * 0.57735 + 0.5
}

/// Run `draw` onto `pixmap` under `transform`, first painting a blurred
/// copy underneath when the style asks for one. `bounds` is the device-space
/// box the crisp drawing covers.
fn with_halo(
    pixmap: &mut Pixmap,
    style: &StrokeStyle,
    transform: Affine,
    bounds: dp_core::kurbo::Rect,
    draw: impl Fn(&mut Pixmap, Affine),
) {
    if style.blur > 0.0 && style.blend == BlendMode::Normal {
        let sigma = blur_sigma(style.blur) * transform.determinant().abs().sqrt() as f32;
        match halo_region(bounds, sigma, pixmap.width(), pixmap.height()) {
            Some(region) => paint_halo(pixmap, region, sigma, transform, &draw),
            None => log::trace!("blur halo off screen"),
        }
    }
    draw(pixmap, transform);
}

/// Pixel region a halo around `bounds` can touch, clipped to the raster.
pub fn halo_region(bounds: dp_core::kurbo::Rect, sigma: f32, width: u32, height: u32) -> Option<IntRect> {
    let pad = (sigma * 3.0).ceil() as f64;
    let r = bounds.inflate(pad, pad);
    let x0 = r.x0.floor().max(0.0);
    let y0 = r.y0.floor().max(0.0);
    let x1 = r.x1.ceil().min(width as f64);
    let y1 = r.y1.ceil().min(height as f64);
    if !(x1 > x0 && y1 > y0) {
        return None;
    }
    IntRect::from_xywh(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32)
}

fn paint_halo(
    pixmap: &mut Pixmap,
    region: IntRect,
    sigma: f32,
    transform: Affine,
    draw: &impl Fn(&mut Pixmap, Affine),
) {
    let Some(mut layer) = Pixmap::new(region.width(), region.height()) else {
        log::warn!("skipping blur halo: layer allocation failed");
        return;
    };
    let offset = Affine::translate((-region.x() as f64, -region.y() as f64));
    draw(&mut layer, offset * transform);
    if let Some(blurred) = blur_pixmap(&layer, sigma) {
        pixmap.draw_pixmap(
            region.x(),
            region.y(),
            blurred.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

/// Gaussian-blur a premultiplied raster.
pub fn blur_pixmap(pixmap: &Pixmap, sigma: f32) -> Option<Pixmap> {
    let buffer = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())?;
    let mut data = imageops::fast_blur(&buffer, sigma).into_raw();
    // Rounding may push a color channel past its alpha.
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(alpha);
        }
    }
    Pixmap::from_vec(data, IntSize::from_wh(pixmap.width(), pixmap.height())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_core::kurbo::Point;

    fn canvas() -> Pixmap {
        let mut p = Pixmap::new(40, 40).unwrap();
        p.fill(tiny_skia::Color::WHITE);
        p
    }

    fn rgba(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn line(from: (f64, f64), to: (f64, f64)) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        path
    }

    #[test]
    fn stroke_paints_along_the_path() {
        let mut p = canvas();
        let style = StrokeStyle {
            stroke_color: Color::rgb(255, 0, 0),
            width: 4.0,
            ..StrokeStyle::default()
        };
        paint_stroke(&mut p, &Stroke::new(Geometry::Path(line((5.0, 20.0), (35.0, 20.0))), style), Affine::IDENTITY);
        assert_eq!(rgba(&p, 20, 20), (255, 0, 0, 255));
        assert_eq!(rgba(&p, 20, 5), (255, 255, 255, 255));
    }

    #[test]
    fn transform_moves_the_stroke() {
        let mut p = canvas();
        let style = StrokeStyle {
            width: 4.0,
            ..StrokeStyle::default()
        };
        let stroke = Stroke::new(Geometry::Path(line((5.0, 5.0), (15.0, 5.0))), style);
        paint_stroke(&mut p, &stroke, Affine::translate((0.0, 20.0)));
        assert_eq!(rgba(&p, 10, 25), (0, 0, 0, 255));
        assert_eq!(rgba(&p, 10, 5), (255, 255, 255, 255));
    }

    #[test]
    fn flood_covers_everything_regardless_of_transform() {
        let mut p = canvas();
        paint_stroke(&mut p, &Stroke::flood(Color::rgb(0, 0, 255)), Affine::scale(0.1));
        assert_eq!(rgba(&p, 0, 0), (0, 0, 255, 255));
        assert_eq!(rgba(&p, 39, 39), (0, 0, 255, 255));
    }

    #[test]
    fn round_dot_is_drawn() {
        let mut p = canvas();
        let style = StrokeStyle {
            width: 10.0,
            ..StrokeStyle::default()
        };
        paint_stroke(&mut p, &Stroke::new(Geometry::Dot(Point::new(20.0, 20.0)), style), Affine::IDENTITY);
        assert_eq!(rgba(&p, 20, 20), (0, 0, 0, 255));
        assert_eq!(rgba(&p, 30, 30), (255, 255, 255, 255));
    }

    #[test]
    fn eraser_clears_to_transparent() {
        let mut p = canvas();
        let style = StrokeStyle {
            width: 6.0,
            blend: BlendMode::Clear,
            ..StrokeStyle::default()
        };
        paint_stroke(&mut p, &Stroke::new(Geometry::Path(line((0.0, 20.0), (40.0, 20.0))), style), Affine::IDENTITY);
        assert_eq!(rgba(&p, 20, 20).3, 0);
        assert_eq!(rgba(&p, 20, 2).3, 255);
    }

    #[test]
    fn fill_style_fills_closed_shapes() {
        let mut p = canvas();
        let mut square = BezPath::new();
        square.move_to((10.0, 10.0));
        square.line_to((30.0, 10.0));
        square.line_to((30.0, 30.0));
        square.line_to((10.0, 30.0));
        square.close_path();
        let style = StrokeStyle {
            fill_color: Color::rgb(0, 255, 0),
            paint_style: PaintStyle::Fill,
            ..StrokeStyle::default()
        };
        paint_stroke(&mut p, &Stroke::new(Geometry::Path(square), style), Affine::IDENTITY);
        assert_eq!(rgba(&p, 20, 20), (0, 255, 0, 255));
    }

    #[test]
    fn opacity_scales_alpha() {
        let c = to_skia_color(Color::rgba(10, 20, 30, 255), 128);
        assert_eq!(c.to_color_u8().alpha(), 128);
    }

    #[test]
    fn blur_spreads_beyond_the_stroke() {
        let mut sharp = canvas();
        let mut soft = canvas();
        let base = StrokeStyle {
            width: 2.0,
            ..StrokeStyle::default()
        };
        let blurred = StrokeStyle {
            blur: 4.0,
            ..base.clone()
        };
        let path = line((5.0, 20.0), (35.0, 20.0));
        paint_stroke(&mut sharp, &Stroke::new(Geometry::Path(path.clone()), base), Affine::IDENTITY);
        paint_stroke(&mut soft, &Stroke::new(Geometry::Path(path), blurred), Affine::IDENTITY);
        assert_eq!(rgba(&sharp, 20, 24), (255, 255, 255, 255));
        assert!(rgba(&soft, 20, 24).0 < 255, "halo should darken nearby pixels");
    }

    #[test]
    fn blur_preserves_flat_areas() {
        let p = canvas();
        let soft = blur_pixmap(&p, 3.0).unwrap();
        assert_eq!(rgba(&soft, 20, 20), (255, 255, 255, 255));
    }

    #[test]
    fn halo_stays_near_the_stroke() {
        let mut p = Pixmap::new(400, 400).unwrap();
        p.fill(tiny_skia::Color::WHITE);
        let style = StrokeStyle {
            width: 4.0,
            blur: 8.0,
            ..StrokeStyle::default()
        };
        let path = line((100.0, 100.0), (120.0, 100.0));
        let box_ = path.bounding_box().inflate(4.0, 4.0);
        paint_stroke(&mut p, &Stroke::new(Geometry::Path(path), style), Affine::IDENTITY);

        let region = halo_region(box_, blur_sigma(8.0), 400, 400).unwrap();
        assert!(region.width() < 80 && region.height() < 80, "{region:?}");
        assert!(rgba(&p, 110, 108).0 < 255, "halo should reach past the crisp edge");
        for (x, y) in [(0, 0), (300, 300), (110, 200), (250, 100)] {
            assert_eq!(rgba(&p, x, y), (255, 255, 255, 255), "at ({x}, {y})");
        }
    }

    #[test]
    fn halo_region_is_clipped_to_the_raster() {
        let near_edge = dp_core::kurbo::Rect::new(-10.0, -10.0, 5.0, 5.0);
        let region = halo_region(near_edge, 2.0, 50, 50).unwrap();
        assert_eq!((region.x(), region.y()), (0, 0));
        let off = dp_core::kurbo::Rect::new(100.0, 100.0, 120.0, 120.0);
        assert!(halo_region(off, 2.0, 50, 50).is_none());
    }

    #[test]
    fn text_stroke_paints_glyphs() {
        let mut p = Pixmap::new(200, 80).unwrap();
        p.fill(tiny_skia::Color::WHITE);
        let block = dp_core::text::layout_text("HELLO", Point::new(10.0, 10.0), 32.0, 200.0);
        let style = StrokeStyle {
            stroke_color: Color::rgb(200, 0, 0),
            ..StrokeStyle::default()
        };
        paint_stroke(&mut p, &Stroke::new(Geometry::Text(block), style), Affine::IDENTITY);
        let inked = p.pixels().iter().filter(|px| px.green() < 200).count();
        assert!(inked > 100, "only {inked} pixels inked");
    }
}
