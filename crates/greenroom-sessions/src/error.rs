use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The supplied state blob could not be parsed.
    #[error("invalid state blob: {0}")]
    InvalidBlob(#[from] greenroom_state::StateError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
