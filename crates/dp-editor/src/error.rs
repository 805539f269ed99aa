use dp_render::RenderError;
use thiserror::Error;

/// Failures the engine reports to its host.
///
/// Configuration problems never end up here; bad values are clamped.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
