pub mod compositor;
pub mod error;
pub mod paint;
pub mod raster;
pub mod surface;
pub mod text;

pub use compositor::{Compositor, FrameReport, FrameSnapshot};
pub use error::{RenderError, Result};
pub use raster::EncodeFormat;
pub use surface::{MemorySurface, Surface, SurfaceProbe, with_frame};

pub use tiny_skia;
pub use tiny_skia::Pixmap;
