//! Presentation surfaces.
//!
//! A `Surface` hands out one frame buffer at a time: `lock_frame` borrows
//! the next buffer to draw into and `unlock_and_post` returns it for
//! display. `with_frame` wraps the pair in a guard so the buffer always
//! goes back to the surface, even if composition bails out or panics.

use std::sync::{Arc, Mutex, PoisonError};
use tiny_skia::Pixmap;

pub trait Surface: Send {
    /// Current pixel size, or `None` while the surface is not usable
    /// (not created yet, being resized, rotated away).
    fn size(&self) -> Option<(u32, u32)>;

    /// Borrow the next frame buffer, or `None` if no buffer is available
    /// right now.
    fn lock_frame(&mut self) -> Option<Pixmap>;

    /// Give a frame buffer back and present it.
    fn unlock_and_post(&mut self, frame: Pixmap);
}

/// Scoped frame lock: posts the frame back when dropped.
struct FrameLock<'a> {
    surface: &'a mut dyn Surface,
    frame: Option<Pixmap>,
}

impl<'a> FrameLock<'a> {
    fn acquire(surface: &'a mut dyn Surface) -> Option<Self> {
        surface.size()?;
        let frame = surface.lock_frame()?;
        Some(Self {
            surface,
            frame: Some(frame),
        })
    }
}

impl Drop for FrameLock<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.surface.unlock_and_post(frame);
        }
    }
}

/// Lock a frame, run `f` on it, and post it. Returns `None` (and runs
/// nothing) when the surface is not ready.
pub fn with_frame<R>(surface: &mut dyn Surface, f: impl FnOnce(&mut Pixmap) -> R) -> Option<R> {
    let mut lock = FrameLock::acquire(surface)?;
    let frame = lock.frame.as_mut()?;
    Some(f(frame))
}

// ─── In-memory surface ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ProbeState {
    ready: bool,
    presented: Option<Pixmap>,
    frames: u64,
    outstanding: bool,
}

/// Offscreen surface that keeps the last presented frame.
///
/// Used headless and in tests; a `SurfaceProbe` cloned off it observes
/// presented frames from another thread and toggles readiness.
pub struct MemorySurface {
    width: u32,
    height: u32,
    state: Arc<Mutex<ProbeState>>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Arc::new(Mutex::new(ProbeState {
                ready: true,
                ..ProbeState::default()
            })),
        }
    }

    pub fn probe(&self) -> SurfaceProbe {
        SurfaceProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> Option<(u32, u32)> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.ready.then_some((self.width, self.height))
    }

    fn lock_frame(&mut self) -> Option<Pixmap> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.ready || state.outstanding {
            return None;
        }
        let frame = Pixmap::new(self.width, self.height)?;
        state.outstanding = true;
        Some(frame)
    }

    fn unlock_and_post(&mut self, frame: Pixmap) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.outstanding = false;
        state.frames += 1;
        state.presented = Some(frame);
    }
}

/// Shared view into a `MemorySurface`.
#[derive(Clone)]
pub struct SurfaceProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl SurfaceProbe {
    pub fn set_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    pub fn frames_presented(&self) -> u64 {
        self.lock().frames
    }

    pub fn last_frame(&self) -> Option<Pixmap> {
        self.lock().presented.clone()
    }

    /// True while a frame is locked and not yet posted.
    pub fn is_locked(&self) -> bool {
        self.lock().outstanding
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
