#[derive(Debug)]
pub enum ChatError {
    Transport(String),
    Rejected(u16),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::Transport(msg) => write!(f, "Chat transport error: {}", msg),
            ChatError::Rejected(status) => write!(f, "Chat webhook rejected message: {}", status),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Transport(err.to_string())
    }
}
