pub mod config;
pub mod curve;
pub mod model;
pub mod text;
pub mod transform;

pub use config::{CanvasConfig, DrawBound, Mode, ToolKind, Viewport};
pub use curve::{CurveBuilder, CurveStats, smooth_path};
pub use model::*;
pub use text::layout_text;
pub use transform::{ScaleLimits, ViewTransform};

// Re-export kurbo so downstream crates share one geometry vocabulary
pub use kurbo;
pub use kurbo::{Point, Vec2};
