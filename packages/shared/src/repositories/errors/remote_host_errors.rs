#[derive(Debug)]
pub enum RemoteHostError {
    Transport(String),
    UnexpectedResponse(String),
}

impl std::fmt::Display for RemoteHostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteHostError::Transport(msg) => write!(f, "Remote host transport error: {}", msg),
            RemoteHostError::UnexpectedResponse(msg) => {
                write!(f, "Unexpected remote host response: {}", msg)
            }
        }
    }
}

impl std::error::Error for RemoteHostError {}

impl From<reqwest::Error> for RemoteHostError {
    fn from(err: reqwest::Error) -> Self {
        RemoteHostError::Transport(err.to_string())
    }
}
