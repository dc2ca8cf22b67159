use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Core(#[from] datasandbox_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    /// The core error behind this failure, if any.
    pub fn core(&self) -> Option<&datasandbox_core::Error> {
        match self {
            GenerationError::Core(err) => Some(err),
            _ => None,
        }
    }
}
