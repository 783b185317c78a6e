use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::move_repository_errors::MoveRepositoryError;
use crate::repositories::errors::remote_host_errors::RemoteHostError;
use crate::services::errors::chess_service_errors::ChessServiceError;

#[derive(Debug)]
pub enum MoveProcessorError {
    /// Nothing was written locally or remotely, the item can run again.
    Retryable(String),
    /// The remote host played the move but the local write did not complete.
    Divergence(String),
}

impl MoveProcessorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, MoveProcessorError::Retryable(_))
    }
}

impl std::fmt::Display for MoveProcessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveProcessorError::Retryable(msg) => write!(f, "Retryable failure: {}", msg),
            MoveProcessorError::Divergence(msg) => write!(f, "Local state diverged: {}", msg),
        }
    }
}

impl std::error::Error for MoveProcessorError {}

impl From<GameRepositoryError> for MoveProcessorError {
    fn from(err: GameRepositoryError) -> Self {
        MoveProcessorError::Retryable(err.to_string())
    }
}

impl From<MoveRepositoryError> for MoveProcessorError {
    fn from(err: MoveRepositoryError) -> Self {
        MoveProcessorError::Retryable(err.to_string())
    }
}

impl From<RemoteHostError> for MoveProcessorError {
    fn from(err: RemoteHostError) -> Self {
        MoveProcessorError::Retryable(err.to_string())
    }
}

impl From<ChessServiceError> for MoveProcessorError {
    fn from(err: ChessServiceError) -> Self {
        MoveProcessorError::Retryable(err.to_string())
    }
}
