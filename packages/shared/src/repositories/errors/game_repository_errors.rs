#[derive(Debug)]
pub enum GameRepositoryError {
    /// A game row could not be converted to or from its DynamoDB item.
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for GameRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameRepositoryError::Serialization(msg) => {
                write!(f, "Malformed row in games table: {}", msg)
            }
            GameRepositoryError::DynamoDb(msg) => {
                write!(f, "Games table request failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for GameRepositoryError {}
