#[derive(Debug)]
pub enum MoveQueueError {
    Serialization(String),
    DynamoDb(String),
    /// The consumer for the game has shut down.
    Closed(String),
}

impl std::fmt::Display for MoveQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveQueueError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            MoveQueueError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            MoveQueueError::Closed(game_id) => {
                write!(f, "Move queue for game {} is closed", game_id)
            }
        }
    }
}

impl std::error::Error for MoveQueueError {}
