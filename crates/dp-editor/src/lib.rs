pub mod capture;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod history;
pub mod input;
pub mod tools;

pub use capture::{CaptureState, StrokeCapture};
pub use engine::DrawEngine;
pub use error::{EngineError, Result};
pub use gesture::{GestureAction, GestureMode, GestureTracker};
pub use history::{History, MAX_HISTORY};
pub use input::{PointerAction, PointerEvent};
pub use tools::{BeginOutcome, Sample, Tool, tool_for};
