use thiserror::Error;

/// Workspace-level error for the few operations that cross crate
/// boundaries. Subsystems keep their own focused error enums (provider,
/// enrichment, state, sessions) and convert at the edges.
#[derive(Debug, Error)]
pub enum GreenroomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GreenroomError>;
