//! Chat error types

use thiserror::Error;

/// Errors surfaced by the chat connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// `open` was called without a room
    #[error("Room id must not be empty")]
    EmptyRoom,

    /// Outgoing text was empty after trimming
    #[error("Message is empty")]
    EmptyMessage,

    /// `send` was called while not connected
    #[error("Chat is not connected")]
    NotConnected,

    /// The transport could not be opened or failed mid-stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// The room history could not be loaded
    #[error("History unavailable: {0}")]
    History(String),

    /// A frame could not be encoded
    #[error("Encoding error: {0}")]
    Encode(String),

    /// The connection task is gone
    #[error("Chat connection closed")]
    Closed,
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Encode(err.to_string())
    }
}

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ChatError::NotConnected.to_string(), "Chat is not connected");
        assert_eq!(
            ChatError::Transport("refused".to_string()).to_string(),
            "Transport error: refused"
        );
    }
}
