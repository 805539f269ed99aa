//! Frame composition.
//!
//! The compositor owns two canvas-sized rasters:
//!
//! - the **screen cache**: base color, background, overflow and every
//!   visible stroke, painted in history order. Rebuilt only on request;
//!   a freshly finished stroke is folded straight into it instead.
//! - the **overflow raster**: strokes evicted from bounded history. It only
//!   ever grows.
//!
//! Each frame blits the cache through the view transform, draws the live
//! stroke on top and masks everything outside the page with the plain color.

use crate::error::Result;
use crate::paint::{eraser_preview, paint_stroke, to_skia_color, to_skia_transform};
use crate::raster::new_pixmap;
use dp_core::config::Viewport;
use dp_core::kurbo::{Affine, Point, Rect};
use dp_core::model::{Color, Stroke};
use std::sync::Arc;
use tiny_skia::{FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Everything one frame needs, copied out of shared state under its lock.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Rebuild the screen cache before drawing.
    pub full_repaint: bool,
    /// Logical canvas size in canvas units.
    pub canvas: Viewport,
    pub base_color: Color,
    pub plain_color: Color,
    /// Page bound in canvas space; everything outside is masked.
    pub page: Rect,
    /// Canvas → screen.
    pub transform: Affine,
    pub background: Option<Arc<Pixmap>>,
    /// Committed strokes below the history pointer, oldest first.
    pub visible: Vec<Arc<Stroke>>,
    /// Strokes that just left history; baked into the overflow raster.
    pub evicted: Vec<Arc<Stroke>>,
    /// Stroke currently being drawn.
    pub live: Option<Stroke>,
    /// Finished stroke not yet in the screen cache.
    pub fold: Option<Arc<Stroke>>,
}

impl FrameSnapshot {
    /// A snapshot with nothing drawn, for a canvas of the given size.
    pub fn blank(canvas: Viewport) -> Self {
        Self {
            full_repaint: true,
            canvas,
            base_color: Color::WHITE,
            plain_color: dp_core::config::DEFAULT_PLAIN_COLOR,
            page: Rect::new(0.0, 0.0, canvas.width as f64, canvas.height as f64),
            transform: Affine::IDENTITY,
            background: None,
            visible: Vec::new(),
            evicted: Vec::new(),
            live: None,
            fold: None,
        }
    }
}

/// What a `compose` call did besides drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub rebuilt: bool,
    pub folded: bool,
    pub baked: usize,
}

pub struct Compositor {
    screen: Pixmap,
    overflow: Pixmap,
    canvas: Viewport,
    dirty: bool,
}

impl Compositor {
    pub fn new(canvas: Viewport) -> Result<Self> {
        Ok(Self {
            screen: new_pixmap(canvas.width, canvas.height)?,
            overflow: new_pixmap(canvas.width, canvas.height)?,
            canvas,
            dirty: true,
        })
    }

    /// True until the first rebuild, and again after a resize.
    pub fn needs_rebuild(&self) -> bool {
        self.dirty
    }

    pub fn screen(&self) -> &Pixmap {
        &self.screen
    }

    pub fn overflow(&self) -> &Pixmap {
        &self.overflow
    }

    /// Compose one frame into `frame` (screen pixels).
    pub fn compose(&mut self, snap: &FrameSnapshot, frame: &mut Pixmap) -> Result<FrameReport> {
        if snap.canvas != self.canvas {
            self.resize(snap.canvas)?;
        }

        for stroke in &snap.evicted {
            paint_stroke(&mut self.overflow, stroke, Affine::IDENTITY);
        }
        if !snap.evicted.is_empty() {
            log::debug!("baked {} evicted stroke(s) into overflow", snap.evicted.len());
        }

        let rebuilt = snap.full_repaint || self.dirty;
        if rebuilt {
            self.rebuild(snap);
        }

        // A rebuild already painted the finished stroke from `visible`.
        let folded = match &snap.fold {
            Some(stroke) if !rebuilt => {
                paint_stroke(&mut self.screen, stroke, Affine::IDENTITY);
                true
            }
            Some(_) => true,
            None => false,
        };

        let ts = to_skia_transform(snap.transform);
        frame.fill(to_skia_color(snap.plain_color, 255));
        if let Some(canvas_rect) = tiny_skia::Rect::from_xywh(
            0.0,
            0.0,
            self.canvas.width as f32,
            self.canvas.height as f32,
        ) {
            frame.fill_rect(canvas_rect, &solid(snap.base_color), ts, None);
        }
        let blit = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        frame.draw_pixmap(0, 0, self.screen.as_ref(), &blit, ts, None);

        if let Some(live) = &snap.live {
            if live.style.is_eraser() {
                paint_stroke(frame, &eraser_preview(live, snap.base_color), snap.transform);
            } else {
                paint_stroke(frame, live, snap.transform);
            }
        }

        mask_outside_page(frame, snap.page, snap.transform, snap.plain_color);

        Ok(FrameReport {
            rebuilt,
            folded,
            baked: snap.evicted.len(),
        })
    }

    /// Compose into a fresh `width`×`height` raster.
    pub fn render_current(&mut self, snap: &FrameSnapshot, width: u32, height: u32) -> Result<Pixmap> {
        let mut frame = new_pixmap(width, height)?;
        self.compose(snap, &mut frame)?;
        Ok(frame)
    }

    fn rebuild(&mut self, snap: &FrameSnapshot) {
        log::debug!("rebuilding screen cache: {} stroke(s)", snap.visible.len());
        self.screen.fill(to_skia_color(snap.base_color.with_alpha(255), 255));

        // Backgrounds keep their native pixel size, anchored top-left.
        if let Some(bg) = snap.background.as_deref() {
            self.screen.draw_pixmap(
                0,
                0,
                bg.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        self.screen.draw_pixmap(
            0,
            0,
            self.overflow.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        for stroke in &snap.visible {
            paint_stroke(&mut self.screen, stroke, Affine::IDENTITY);
        }
        self.dirty = false;
    }

    fn resize(&mut self, canvas: Viewport) -> Result<()> {
        log::debug!(
            "canvas resized {}x{} -> {}x{}",
            self.canvas.width,
            self.canvas.height,
            canvas.width,
            canvas.height
        );
        let mut overflow = new_pixmap(canvas.width, canvas.height)?;
        overflow.draw_pixmap(
            0,
            0,
            self.overflow.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.screen = new_pixmap(canvas.width, canvas.height)?;
        self.overflow = overflow;
        self.canvas = canvas;
        self.dirty = true;
        Ok(())
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color, 255));
    paint
}

/// Fill the area between the frame edge and the transformed page with
/// `plain`, as one even-odd path.
fn mask_outside_page(frame: &mut Pixmap, page: Rect, transform: Affine, plain: Color) {
    let Some(bounds) = tiny_skia::Rect::from_xywh(0.0, 0.0, frame.width() as f32, frame.height() as f32)
    else {
        return;
    };
    let corners = [
        Point::new(page.x0, page.y0),
        Point::new(page.x1, page.y0),
        Point::new(page.x1, page.y1),
        Point::new(page.x0, page.y1),
    ]
    .map(|p| transform * p);

    let mut pb = PathBuilder::new();
    pb.push_rect(bounds);
    pb.move_to(corners[0].x as f32, corners[0].y as f32);
    for c in &corners[1..] {
        pb.line_to(c.x as f32, c.y as f32);
    }
    pb.close();
    if let Some(path) = pb.finish() {
        frame.fill_path(&path, &solid(plain), FillRule::EvenOdd, Transform::identity(), None);
    }
}
