use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("mesh '{0}' not found")]
    MeshNotFound(String),

    #[error("grid with {segments} segments is not supported (expected 1..={max})")]
    InvalidGrid { segments: usize, max: usize },
}
