pub mod chat;
pub mod config;
pub mod session;
pub mod speech;
pub mod stream;
pub mod transcript;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MurmurError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MurmurError {
    fn from(e: std::io::Error) -> Self {
        MurmurError::Io(e.to_string())
    }
}

impl MurmurError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A failed exchange can simply be sent again
            MurmurError::Transport(_) => true,
            // A bad line is skipped, the stream keeps going
            MurmurError::Parse(_) => true,
            // Config errors require user intervention
            MurmurError::Config(_) => false,
            MurmurError::Channel(_) => false,
            MurmurError::Speech(_) => true,
            MurmurError::Io(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MurmurError::Transport(_) => {
                "Could not reach the chat server. Please check your connection.".to_string()
            }
            MurmurError::Parse(_) => {
                "The server sent a response we could not read.".to_string()
            }
            MurmurError::Config(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MurmurError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MurmurError::Speech(_) => {
                "Speech output failed. The response is still shown as text.".to_string()
            }
            MurmurError::Io(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
