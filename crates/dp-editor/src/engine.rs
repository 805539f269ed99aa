//! The draw engine.
//!
//! Two actors share one scene:
//!
//! - the **input side** (whoever owns the `DrawEngine`) feeds pointer
//!   events, runs commands and changes configuration;
//! - the **render thread** repeatedly snapshots the scene and composes a
//!   frame onto the attached surface.
//!
//! Scene state sits behind one mutex and the compositor behind another.
//! Both sides always lock the compositor before the scene, and the scene
//! lock is only held while a snapshot is copied out, never while drawing.

use crate::capture::{CaptureState, StrokeCapture};
use crate::error::{EngineError, Result};
use crate::gesture::{GestureAction, GestureTracker};
use crate::history::History;
use crate::input::PointerEvent;
use crate::tools::{SmoothPenTool, tool_for};
use dp_core::config::{CanvasConfig, DrawBound, Mode, ToolKind, Viewport};
use dp_core::model::{Color, PaintStyle, Stroke, StrokeCap, StrokeJoin};
use dp_core::transform::{ScaleLimits, ViewTransform};
use dp_render::raster::{self, EncodeFormat};
use dp_render::{Compositor, FrameReport, FrameSnapshot, Pixmap, Surface, with_frame};
use kurbo::Point;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type CanvasListener = Arc<dyn Fn() + Send + Sync>;

// ─── Scene ───────────────────────────────────────────────────────────────

/// Everything the input side mutates and the render side reads.
struct SceneState {
    config: CanvasConfig,
    history: History,
    capture: StrokeCapture,
    gestures: GestureTracker,
    transform: ViewTransform,
    background: Option<Arc<Pixmap>>,
    /// Rebuild the screen cache on the next frame.
    full_repaint: bool,
    /// Finished stroke waiting to be folded into the screen cache.
    pending_fold: Option<Arc<Stroke>>,
    /// Strokes evicted from history, waiting to be baked into overflow.
    evicted: Vec<Arc<Stroke>>,
}

impl SceneState {
    fn new(config: CanvasConfig) -> Self {
        let tool = tool_for(&config).unwrap_or_else(|| Box::new(SmoothPenTool::new()));
        Self {
            transform: ViewTransform::new(config.scale_limits()),
            config,
            history: History::default(),
            capture: StrokeCapture::new(tool),
            gestures: GestureTracker::new(),
            background: None,
            full_repaint: true,
            pending_fold: None,
            evicted: Vec::new(),
        }
    }

    /// Copy out one frame's worth of state, consuming the pending flags.
    fn take_snapshot(&mut self) -> FrameSnapshot {
        FrameSnapshot {
            full_repaint: std::mem::take(&mut self.full_repaint),
            canvas: self.config.viewport(),
            base_color: self.config.base_color(),
            plain_color: self.config.plain_color(),
            page: self.config.page_rect(),
            transform: self.transform.matrix(),
            background: self.background.clone(),
            visible: self.history.visible().cloned().collect(),
            evicted: std::mem::take(&mut self.evicted),
            live: self.capture.live_stroke(),
            fold: self.pending_fold.take(),
        }
    }

    /// Put back what a failed frame consumed.
    fn requeue(&mut self, snap: FrameSnapshot) {
        let mut evicted = snap.evicted;
        evicted.append(&mut self.evicted);
        self.evicted = evicted;
        self.full_repaint = true;
    }

    fn commit(&mut self, stroke: Stroke) {
        if let Some(evicted) = self.history.commit(stroke) {
            self.evicted.push(evicted);
        }
        if self.pending_fold.is_some() {
            // Two strokes finished between frames; let a rebuild pick both up.
            self.full_repaint = true;
        }
        self.pending_fold = self.history.last_visible().cloned();
        log::trace!(
            "commit: pointer {} of {}",
            self.history.pointer(),
            self.history.len()
        );
    }

    fn handle_pointer(&mut self, event: &PointerEvent) {
        match self.gestures.handle(event) {
            GestureAction::DrawBegin(screen) => {
                if self.config.effective_tool().is_none() {
                    return;
                }
                let point = self.transform.to_canvas(screen);
                let style = self.config.stroke_style();
                self.capture.begin(point, style);
            }
            GestureAction::DrawMove(screen) => {
                let tolerance = self.transform.map_radius(self.config.touch_tolerance());
                let point = self.transform.to_canvas(screen);
                self.capture.extend(point, tolerance);
            }
            GestureAction::DrawEnd(_) => {
                if let Some(stroke) = self.capture.end() {
                    self.commit(stroke);
                }
            }
            GestureAction::TransformBegin => {
                if let Some(stroke) = self.capture.interrupt() {
                    self.commit(stroke);
                }
                self.transform.save();
            }
            GestureAction::Transform {
                translation,
                scale,
                pivot,
            } => self.transform.apply_gesture(translation, scale, pivot),
            GestureAction::TransformEnd => self.transform.commit(),
            GestureAction::Ignore => {}
        }
    }

    /// Rebuild the capture tool after tool, mode or text settings change.
    fn refresh_tool(&mut self) {
        match tool_for(&self.config) {
            Some(tool) => self.capture.set_tool(tool),
            None => self.capture.cancel(),
        }
    }
}

// ─── Shared state ────────────────────────────────────────────────────────

struct Shared {
    scene: Mutex<SceneState>,
    compositor: Mutex<Compositor>,
    running: AtomicBool,
    listener: Mutex<Option<CanvasListener>>,
}

impl Shared {
    fn scene(&self) -> MutexGuard<'_, SceneState> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn compositor(&self) -> MutexGuard<'_, Compositor> {
        self.compositor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_canvas_updated(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener();
        }
    }

    /// Compose one frame into `frame` from a fresh snapshot.
    fn compose(&self, compositor: &mut Compositor, frame: &mut Pixmap) -> Result<FrameReport> {
        let snap = self.scene().take_snapshot();
        match compositor.compose(&snap, frame) {
            Ok(report) => Ok(report),
            Err(err) => {
                self.scene().requeue(snap);
                Err(err.into())
            }
        }
    }
}

// ─── Render loop ─────────────────────────────────────────────────────────

/// One frame: `None` when the surface was not ready.
fn render_frame(shared: &Shared, surface: &mut dyn Surface) -> Option<Result<FrameReport>> {
    surface.size()?;
    let mut compositor = shared.compositor();
    with_frame(surface, |frame| shared.compose(&mut compositor, frame))
}

fn render_loop(shared: Arc<Shared>, mut surface: Box<dyn Surface>) -> Box<dyn Surface> {
    log::info!("render loop started");
    let mut frames = 0u32;
    let mut window = Instant::now();

    while shared.running.load(Ordering::Acquire) {
        let interval = Duration::from_millis(shared.scene().config.frame_interval_ms());

        match render_frame(&shared, &mut *surface) {
            Some(Ok(report)) => {
                frames += 1;
                if report.folded {
                    shared.notify_canvas_updated();
                }
            }
            Some(Err(err)) => log::warn!("frame failed: {err}"),
            None => log::trace!("surface not ready, skipping frame"),
        }

        if window.elapsed() >= Duration::from_secs(1) {
            log::debug!("fps: {frames}");
            frames = 0;
            window = Instant::now();
        }
        thread::sleep(interval);
    }

    log::info!("render loop stopped");
    surface
}

// ─── Engine ──────────────────────────────────────────────────────────────

pub struct DrawEngine {
    shared: Arc<Shared>,
    render: Option<JoinHandle<Box<dyn Surface>>>,
    surface: Option<Box<dyn Surface>>,
}

impl DrawEngine {
    pub fn new(config: CanvasConfig) -> Result<Self> {
        let config = config.sanitized();
        let compositor = Compositor::new(config.viewport())?;
        Ok(Self {
            shared: Arc::new(Shared {
                scene: Mutex::new(SceneState::new(config)),
                compositor: Mutex::new(compositor),
                running: AtomicBool::new(false),
                listener: Mutex::new(None),
            }),
            render: None,
            surface: None,
        })
    }

    /// Create an engine presenting to `surface` and start rendering.
    pub fn start(config: CanvasConfig, surface: Box<dyn Surface>) -> Result<Self> {
        let mut engine = Self::new(config)?;
        engine.set_surface(surface)?;
        engine.resume()?;
        Ok(engine)
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Attach a presentation surface, replacing the previous one. A running
    /// render loop is restarted on the new surface.
    pub fn set_surface(&mut self, surface: Box<dyn Surface>) -> Result<()> {
        let was_running = self.is_running();
        self.pause();
        self.surface = Some(surface);
        self.shared.scene().full_repaint = true;
        if was_running {
            self.resume()?;
        }
        Ok(())
    }

    /// (Re)start the render thread. Does nothing if it is already running
    /// or no surface is attached.
    pub fn resume(&mut self) -> Result<()> {
        if self.render.is_some() {
            return Ok(());
        }
        let Some(surface) = self.surface.take() else {
            log::warn!("resume without a surface; render loop not started");
            return Ok(());
        };
        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("dp-render".into())
            .spawn(move || render_loop(shared, surface));
        match spawned {
            Ok(handle) => {
                self.render = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                Err(EngineError::Spawn(err))
            }
        }
    }

    /// Stop the render thread and wait until it has exited. The surface
    /// stays attached for the next `resume`.
    pub fn pause(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.render.take() {
            match handle.join() {
                Ok(surface) => self.surface = Some(surface),
                Err(_) => log::error!("render thread panicked; surface dropped"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.render.is_some()
    }

    /// Called on the render thread whenever a finished stroke has been
    /// folded into the cached canvas.
    pub fn on_canvas_updated(&self, listener: impl Fn() + Send + Sync + 'static) {
        *self
            .shared
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
    }

    // ─── Input / commands ────────────────────────────────────────────────

    pub fn handle_pointer(&self, event: &PointerEvent) {
        self.shared.scene().handle_pointer(event);
    }

    pub fn undo(&self) -> bool {
        let mut scene = self.shared.scene();
        let undone = scene.history.undo();
        if undone {
            scene.full_repaint = true;
            log::debug!("undo: pointer now {}", scene.history.pointer());
        }
        undone
    }

    pub fn redo(&self) -> bool {
        let mut scene = self.shared.scene();
        let redone = scene.history.redo();
        if redone {
            scene.full_repaint = true;
            log::debug!("redo: pointer now {}", scene.history.pointer());
        }
        redone
    }

    /// Cover the canvas with the base color as a new, undoable entry.
    pub fn clear(&self) {
        let mut scene = self.shared.scene();
        let base = scene.config.base_color();
        scene.capture.cancel();
        scene.commit(Stroke::flood(base));
    }

    pub fn can_undo(&self) -> bool {
        self.shared.scene().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.shared.scene().history.can_redo()
    }

    pub fn history_pointer(&self) -> usize {
        self.shared.scene().history.pointer()
    }

    pub fn history_len(&self) -> usize {
        self.shared.scene().history.len()
    }

    /// Visible strokes, oldest first.
    pub fn visible_strokes(&self) -> Vec<Arc<Stroke>> {
        self.shared.scene().history.visible().cloned().collect()
    }

    pub fn live_stroke(&self) -> Option<Stroke> {
        self.shared.scene().capture.live_stroke()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.shared.scene().capture.state()
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn view_transform(&self) -> ViewTransform {
        self.shared.scene().transform
    }

    /// Pan by a screen-space offset.
    pub fn translate(&self, dx: f64, dy: f64) {
        self.shared.scene().transform.translate(dx, dy);
    }

    /// Zoom about a screen point; returns the factor actually applied.
    pub fn scale_about(&self, factor: f64, pivot_x: f64, pivot_y: f64) -> f64 {
        self.shared
            .scene()
            .transform
            .scale_about(factor, Point::new(pivot_x, pivot_y))
    }

    pub fn reset_view(&self) {
        self.shared.scene().transform.reset();
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Render the current frame (view transform, page mask, live stroke)
    /// at canvas size, on the calling thread.
    pub fn current_raster(&self) -> Result<Pixmap> {
        let viewport = self.shared.scene().config.viewport();
        let mut frame = raster::new_pixmap(viewport.width, viewport.height)?;
        let report = {
            let mut compositor = self.shared.compositor();
            self.shared.compose(&mut compositor, &mut frame)?
        };
        if report.folded {
            self.shared.notify_canvas_updated();
        }
        Ok(frame)
    }

    pub fn current_raster_scaled(&self, width: u32, height: u32) -> Result<Pixmap> {
        Ok(raster::scaled(&self.current_raster()?, width, height)?)
    }

    /// Straight-alpha RGBA bytes of the current frame.
    pub fn current_rgba(&self) -> Result<(Viewport, Vec<u8>)> {
        let frame = self.current_raster()?;
        let size = Viewport {
            width: frame.width(),
            height: frame.height(),
        };
        Ok((size, raster::to_rgba8(&frame)))
    }

    pub fn encode(&self, format: EncodeFormat, quality: u8) -> Result<Vec<u8>> {
        Ok(raster::encode(&self.current_raster()?, format, quality)?)
    }

    /// Decode an encoded image and show it beneath all strokes.
    pub fn load_background(&self, bytes: &[u8]) -> Result<()> {
        let pixmap = raster::decode(bytes)?;
        self.set_background(pixmap);
        Ok(())
    }

    /// Show straight-alpha RGBA pixels beneath all strokes.
    pub fn load_background_rgba(&self, width: u32, height: u32, data: &[u8]) -> Result<()> {
        let pixmap = raster::from_rgba8(width, height, data)?;
        self.set_background(pixmap);
        Ok(())
    }

    pub fn clear_background(&self) {
        let mut scene = self.shared.scene();
        scene.background = None;
        scene.full_repaint = true;
    }

    fn set_background(&self, pixmap: Pixmap) {
        log::debug!("background set: {}x{}", pixmap.width(), pixmap.height());
        let mut scene = self.shared.scene();
        scene.background = Some(Arc::new(pixmap));
        scene.full_repaint = true;
    }

    // ─── Configuration ───────────────────────────────────────────────────

    pub fn config(&self) -> CanvasConfig {
        self.shared.scene().config.clone()
    }

    /// Replace the whole configuration (sanitized first).
    pub fn set_config(&self, config: CanvasConfig) {
        let mut scene = self.shared.scene();
        scene.config = config.sanitized();
        let limits = scene.config.scale_limits();
        scene.transform.set_limits(limits);
        scene.refresh_tool();
        scene.full_repaint = true;
    }

    fn configure(&self, f: impl FnOnce(&mut CanvasConfig)) {
        f(&mut self.shared.scene().config);
    }

    pub fn set_stroke_color(&self, color: Color) {
        self.configure(|c| c.set_stroke_color(color));
    }

    pub fn set_fill_color(&self, color: Color) {
        self.configure(|c| c.set_fill_color(color));
    }

    pub fn set_stroke_width(&self, width: f32) {
        self.configure(|c| c.set_stroke_width(width));
    }

    pub fn set_opacity(&self, opacity: i32) {
        self.configure(|c| c.set_opacity(opacity));
    }

    pub fn set_blur(&self, blur: f32) {
        self.configure(|c| c.set_blur(blur));
    }

    pub fn set_line_cap(&self, cap: StrokeCap) {
        self.configure(|c| c.set_line_cap(cap));
    }

    pub fn set_line_join(&self, join: StrokeJoin) {
        self.configure(|c| c.set_line_join(join));
    }

    pub fn set_paint_style(&self, style: PaintStyle) {
        self.configure(|c| c.set_paint_style(style));
    }

    pub fn set_plain_color(&self, color: Color) {
        self.configure(|c| c.set_plain_color(color));
    }

    pub fn set_draw_bound(&self, bound: DrawBound) {
        self.configure(|c| c.set_draw_bound(bound));
    }

    pub fn clear_draw_bound(&self) {
        self.configure(|c| c.clear_draw_bound());
    }

    pub fn set_touch_tolerance(&self, tolerance: f64) {
        self.configure(|c| c.set_touch_tolerance(tolerance));
    }

    pub fn set_frame_interval_ms(&self, ms: u64) {
        self.configure(|c| c.set_frame_interval_ms(ms));
    }

    /// The base color shows through erased areas and under everything.
    pub fn set_base_color(&self, color: Color) {
        let mut scene = self.shared.scene();
        scene.config.set_base_color(color);
        scene.full_repaint = true;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        let mut scene = self.shared.scene();
        scene.config.set_viewport(viewport);
        scene.full_repaint = true;
        scene.refresh_tool();
    }

    pub fn set_scale_limits(&self, limits: ScaleLimits) {
        let mut scene = self.shared.scene();
        scene.config.set_scale_limits(limits);
        let limits = scene.config.scale_limits();
        scene.transform.set_limits(limits);
    }

    pub fn set_tool(&self, tool: ToolKind) {
        let mut scene = self.shared.scene();
        scene.config.set_tool(tool);
        scene.refresh_tool();
    }

    pub fn set_mode(&self, mode: Mode) {
        let mut scene = self.shared.scene();
        scene.config.set_mode(mode);
        scene.refresh_tool();
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let mut scene = self.shared.scene();
        scene.config.set_text(text);
        scene.refresh_tool();
    }

    pub fn set_font_size(&self, size: f32) {
        let mut scene = self.shared.scene();
        scene.config.set_font_size(size);
        scene.refresh_tool();
    }
}

impl Drop for DrawEngine {
    fn drop(&mut self) {
        self.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> DrawEngine {
        DrawEngine::new(CanvasConfig::default()).unwrap()
    }

    fn stroke(engine: &DrawEngine, from: (f64, f64), to: (f64, f64)) {
        engine.handle_pointer(&PointerEvent::down(from.0, from.1));
        engine.handle_pointer(&PointerEvent::moved(to.0, to.1));
        engine.handle_pointer(&PointerEvent::up(to.0, to.1));
    }

    #[test]
    fn drawing_commits_to_history() {
        let e = engine();
        stroke(&e, (10.0, 10.0), (100.0, 10.0));
        assert_eq!(e.history_pointer(), 2);
        assert_eq!(e.capture_state(), CaptureState::Committed);
    }

    #[test]
    fn live_stroke_is_visible_mid_drag() {
        let e = engine();
        e.handle_pointer(&PointerEvent::down(0.0, 0.0));
        e.handle_pointer(&PointerEvent::moved(50.0, 0.0));
        assert!(e.live_stroke().is_some());
        assert_eq!(e.history_pointer(), 1);
    }

    #[test]
    fn mode_none_ignores_drawing() {
        let e = engine();
        e.set_mode(Mode::None);
        stroke(&e, (10.0, 10.0), (100.0, 10.0));
        assert_eq!(e.history_pointer(), 1);
    }

    #[test]
    fn clear_is_undoable() {
        let e = engine();
        stroke(&e, (10.0, 10.0), (100.0, 10.0));
        e.clear();
        assert_eq!(e.history_pointer(), 3);
        assert!(e.undo());
        assert_eq!(e.history_pointer(), 2);
    }

    #[test]
    fn style_changes_apply_to_next_stroke() {
        let e = engine();
        e.set_stroke_width(-5.0);
        e.set_opacity(300);
        e.set_stroke_color(Color::rgb(1, 2, 3));
        stroke(&e, (0.0, 0.0), (60.0, 0.0));
        let last = e.visible_strokes().pop().unwrap();
        assert_eq!(last.style.width, 3.0);
        assert_eq!(last.style.opacity, 255);
        assert_eq!(last.style.stroke_color, Color::rgb(1, 2, 3));
    }

    #[test]
    fn tolerance_follows_zoom() {
        let e = engine();
        e.scale_about(2.0, 0.0, 0.0);
        e.set_tool(ToolKind::Pen);
        e.handle_pointer(&PointerEvent::down(0.0, 0.0));
        // 10 screen px is under the 15 px tolerance at any zoom.
        e.handle_pointer(&PointerEvent::moved(10.0, 0.0));
        e.handle_pointer(&PointerEvent::moved(40.0, 0.0));
        e.handle_pointer(&PointerEvent::up(40.0, 0.0));
        let last = e.visible_strokes().pop().unwrap();
        assert_eq!(last.geometry.end(), Some(Point::new(20.0, 0.0)));
    }
}
