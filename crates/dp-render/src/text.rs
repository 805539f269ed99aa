//! Glyph rasterization for text strokes.
//!
//! Lines are already broken by `dp_core::text`; here each line is outlined
//! with `ab_glyph` starting at its baseline and the glyph coverage is used
//! as a mask for an ordinary tiny-skia fill, so opacity and blending behave
//! exactly like any other stroke.

use ab_glyph::{Font, FontArc, FontRef, OutlinedGlyph, PxScale, ScaleFont, point};
use dp_core::kurbo::{Affine, Rect};
use dp_core::model::TextBlock;
use std::sync::OnceLock;
use tiny_skia::{Mask, Paint, Pixmap, Transform};

/// The face bundled with the renderer (Ubuntu Light).
pub fn default_font() -> Option<&'static FontArc> {
    static FONT: OnceLock<Option<FontArc>> = OnceLock::new();
    FONT.get_or_init(|| {
        match FontRef::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT) {
            Ok(face) => Some(FontArc::from(face)),
            Err(err) => {
                log::warn!("bundled font is unreadable: {err}");
                None
            }
        }
    })
    .as_ref()
}

/// Uniform scale factor of a similarity transform.
fn scale_of(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}

/// Outline every glyph of `block` in device space.
fn outline(font: &FontArc, block: &TextBlock, transform: Affine) -> Vec<OutlinedGlyph> {
    let px = block.font_size as f64 * scale_of(transform);
    if !(px > 0.0) {
        return Vec::new();
    }
    let scaled = font.as_scaled(PxScale::from(px as f32));

    let mut glyphs = Vec::new();
    for line in &block.lines {
        let origin = transform * line.baseline;
        let mut caret = point(origin.x as f32, origin.y as f32);
        for ch in line.text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = caret;
            caret.x += scaled.h_advance(glyph.id);
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                glyphs.push(outlined);
            }
        }
    }
    glyphs
}

/// Device-space box covering every inked pixel of `block`.
pub fn text_bounds(font: &FontArc, block: &TextBlock, transform: Affine) -> Option<Rect> {
    outline(font, block, transform)
        .iter()
        .map(|g| {
            let b = g.px_bounds();
            Rect::new(b.min.x as f64, b.min.y as f64, b.max.x as f64, b.max.y as f64)
        })
        .reduce(|a, b| a.union(b))
}

/// Fill the glyphs of `block` with `paint`.
pub fn draw_text(pixmap: &mut Pixmap, font: &FontArc, block: &TextBlock, paint: &Paint, transform: Affine) {
    let glyphs = outline(font, block, transform);
    if glyphs.is_empty() {
        return;
    }
    let (w, h) = (pixmap.width() as i32, pixmap.height() as i32);
    let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };

    let coverage = mask.data_mut();
    let mut inked: Option<(i32, i32, i32, i32)> = None;
    for glyph in &glyphs {
        let bounds = glyph.px_bounds();
        let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
        glyph.draw(|x, y, c| {
            let (px, py) = (ox + x as i32, oy + y as i32);
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let cell = &mut coverage[(py * w + px) as usize];
            *cell = (*cell).max((c.clamp(0.0, 1.0) * 255.0).round() as u8);
            inked = Some(match inked {
                None => (px, py, px, py),
                Some((x0, y0, x1, y1)) => (x0.min(px), y0.min(py), x1.max(px), y1.max(py)),
            });
        });
    }

    let Some((x0, y0, x1, y1)) = inked else {
        return;
    };
    let rect = tiny_skia::Rect::from_ltrb(x0 as f32, y0 as f32, (x1 + 1) as f32, (y1 + 1) as f32);
    if let Some(rect) = rect {
        pixmap.fill_rect(rect, paint, Transform::identity(), Some(&mask));
    }
}
