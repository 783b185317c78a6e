use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::move_queue_errors::MoveQueueError;
use crate::repositories::errors::move_repository_errors::MoveRepositoryError;
use crate::repositories::errors::remote_host_errors::RemoteHostError;

/// Failures of the intake's collaborators. Business rejections are not errors,
/// see `IntakeDecision::Rejected`.
#[derive(Debug)]
pub enum IntakeServiceError {
    GameRepository(GameRepositoryError),
    MoveRepository(MoveRepositoryError),
    Queue(MoveQueueError),
    RemoteHost(RemoteHostError),
}

impl std::fmt::Display for IntakeServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeServiceError::GameRepository(err) => write!(f, "Game repository error: {}", err),
            IntakeServiceError::MoveRepository(err) => write!(f, "Move repository error: {}", err),
            IntakeServiceError::Queue(err) => write!(f, "Move queue error: {}", err),
            IntakeServiceError::RemoteHost(err) => write!(f, "Remote host error: {}", err),
        }
    }
}

impl std::error::Error for IntakeServiceError {}

impl From<GameRepositoryError> for IntakeServiceError {
    fn from(err: GameRepositoryError) -> Self {
        IntakeServiceError::GameRepository(err)
    }
}

impl From<MoveRepositoryError> for IntakeServiceError {
    fn from(err: MoveRepositoryError) -> Self {
        IntakeServiceError::MoveRepository(err)
    }
}

impl From<MoveQueueError> for IntakeServiceError {
    fn from(err: MoveQueueError) -> Self {
        IntakeServiceError::Queue(err)
    }
}

impl From<RemoteHostError> for IntakeServiceError {
    fn from(err: RemoteHostError) -> Self {
        IntakeServiceError::RemoteHost(err)
    }
}
