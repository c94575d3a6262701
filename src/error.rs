use thiserror::Error;

/// Main error type for Data Sweeper.
/// Aggregates the per-stage pipeline errors so collaborators can handle any step with one type.
#[derive(Error, Debug)]
pub enum SweeperError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Pipeline stage errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    DecodeError(#[from] crate::decoder::DecodeError),

    #[error("{0}")]
    UnknownColumnError(#[from] crate::projector::UnknownColumnError),

    #[error("{0}")]
    EncodeError(#[from] crate::encoder::EncodeError),

    // Collaborator-facing errors
    #[error("{0}")]
    SessionError(#[from] crate::session::SessionError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

pub type Result<T, E = SweeperError> = std::result::Result<T, E>;

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SweeperError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SweeperError::WithContextError(format!("{}: {}", message, e)))
    }
}
