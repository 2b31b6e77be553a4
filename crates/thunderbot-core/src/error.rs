use thiserror::Error;

/// Top-level error type for Thunderbot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Settings file missing, unreadable, or malformed.
    #[error("settings error: {0}")]
    Settings(String),

    /// Error from the chat client.
    #[error("client error: {0}")]
    Client(String),

    /// Session persistence error.
    #[error("session error: {0}")]
    Session(String),

    /// Message log error.
    #[error("message log error: {0}")]
    Log(String),

    /// The message log was used before `start()` succeeded.
    #[error("message log was not started")]
    LogNotInitialized,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
