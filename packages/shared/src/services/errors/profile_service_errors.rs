use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::errors::move_repository_errors::MoveRepositoryError;

#[derive(Debug)]
pub enum ProfileServiceError {
    GameRepository(GameRepositoryError),
    MoveRepository(MoveRepositoryError),
}

impl std::fmt::Display for ProfileServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileServiceError::GameRepository(err) => {
                write!(f, "Game repository error: {}", err)
            }
            ProfileServiceError::MoveRepository(err) => {
                write!(f, "Move repository error: {}", err)
            }
        }
    }
}

impl std::error::Error for ProfileServiceError {}

impl From<GameRepositoryError> for ProfileServiceError {
    fn from(err: GameRepositoryError) -> Self {
        ProfileServiceError::GameRepository(err)
    }
}

impl From<MoveRepositoryError> for ProfileServiceError {
    fn from(err: MoveRepositoryError) -> Self {
        ProfileServiceError::MoveRepository(err)
    }
}
