use thiserror::Error;

use crate::render::LayerKind;

pub type ScatterResult<T> = Result<T, ScatterError>;

#[derive(Debug, Error)]
pub enum ScatterError {
    #[error("invalid canvas size: width={width}, height={height}")]
    InvalidCanvasSize { width: f64, height: f64 },

    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("failed to acquire drawing context for {layer:?} layer: {reason}")]
    ContextAcquisition { layer: LayerKind, reason: String },

    #[error("{layer:?} layer is disabled after a context failure")]
    LayerDisabled { layer: LayerKind },

    #[error("render backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
