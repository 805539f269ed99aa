//! Pixel buffer helpers: allocation, straight-alpha import/export,
//! scaling, and PNG/JPEG encoding via the `image` crate.
//!
//! Rasters are tiny-skia `Pixmap`s, which store premultiplied RGBA.
//! Everything that crosses the crate boundary as raw bytes is straight
//! (non-premultiplied) RGBA, row-major, four bytes per pixel.

use crate::error::{RenderError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::{ColorU8, FilterQuality, Pixmap, PixmapPaint, Transform};

/// Output encodings offered to the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    Png,
    Jpeg,
}

/// Allocate a transparent raster.
pub fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })
}

/// Build a raster from straight-alpha RGBA bytes.
pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Pixmap> {
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(RenderError::BufferSize {
            width,
            height,
            expected,
            actual: data.len(),
        });
    }
    let mut pixmap = new_pixmap(width, height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(data.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

/// Straight-alpha RGBA bytes of a raster.
pub fn to_rgba8(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}

/// Decode PNG, JPEG or any other format `image` was built with.
pub fn decode(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    from_rgba8(width, height, rgba.as_raw())
}

/// Resample to `width`×`height` with bilinear filtering.
pub fn scaled(pixmap: &Pixmap, width: u32, height: u32) -> Result<Pixmap> {
    let mut out = new_pixmap(width, height)?;
    let sx = width as f32 / pixmap.width() as f32;
    let sy = height as f32 / pixmap.height() as f32;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    out.draw_pixmap(0, 0, pixmap.as_ref(), &paint, Transform::from_scale(sx, sy), None);
    Ok(out)
}

/// Encode a raster. `quality` (clamped to 1..=100) only affects JPEG;
/// JPEG output drops the alpha channel.
pub fn encode(pixmap: &Pixmap, format: EncodeFormat, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let data = to_rgba8(pixmap);
    let actual = data.len();
    let rgba = RgbaImage::from_raw(width, height, data).ok_or(RenderError::BufferSize {
        width,
        height,
        expected: width as usize * height as usize * 4,
        actual,
    })?;

    let mut out = Vec::new();
    match format {
        EncodeFormat::Png => {
            DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        }
        EncodeFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&rgb)?;
        }
    }
    log::trace!("encoded {width}x{height} raster as {format:?}: {} bytes", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn checker() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..4u8 {
            data.extend_from_slice(&[i * 60, 255 - i * 60, 7, 255]);
        }
        data
    }

    #[test]
    fn rgba_import_export_is_lossless_when_opaque() {
        let data = checker();
        let pixmap = from_rgba8(2, 2, &data).unwrap();
        assert_eq!(to_rgba8(&pixmap), data);
    }

    #[test]
    fn wrong_buffer_length_is_an_error() {
        let err = from_rgba8(3, 3, &[0; 12]).unwrap_err();
        assert!(matches!(err, RenderError::BufferSize { expected: 36, actual: 12, .. }));
    }

    #[test]
    fn zero_size_allocation_fails() {
        assert!(matches!(
            new_pixmap(0, 10),
            Err(RenderError::Allocation { width: 0, height: 10 })
        ));
    }

    #[test]
    fn png_survives_decode() {
        let pixmap = from_rgba8(2, 2, &checker()).unwrap();
        let bytes = encode(&pixmap, EncodeFormat::Png, 100).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let back = decode(&bytes).unwrap();
        assert_eq!(to_rgba8(&back), checker());
    }

    #[test]
    fn jpeg_has_soi_marker() {
        let pixmap = from_rgba8(2, 2, &checker()).unwrap();
        let bytes = encode(&pixmap, EncodeFormat::Jpeg, 0).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode(b"not an image"), Err(RenderError::Codec(_))));
    }

    #[test]
    fn scaling_keeps_solid_color() {
        let mut pixmap = new_pixmap(4, 4).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 200, 30, 255));
        let small = scaled(&pixmap, 2, 2).unwrap();
        assert_eq!((small.width(), small.height()), (2, 2));
        let px = small.pixel(1, 1).unwrap();
        let near = |a: u8, b: u8| a.abs_diff(b) <= 1;
        assert!(near(px.red(), 10) && near(px.green(), 200) && near(px.blue(), 30), "{px:?}");
    }
}
