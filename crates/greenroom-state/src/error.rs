use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    /// The state blob could not be parsed or produced.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
