//! Error types for the airspy-core library.

use thiserror::Error;

/// Result type alias for airspy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the wrapped tools.
#[derive(Error, Debug)]
pub enum Error {
    /// An external tool ran but reported a failure.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// An external tool is not installed or not on `PATH`.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse tool output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// A precondition for an operation is not met (e.g. monitor mode).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A user supplied value is invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The operation was interrupted before it could finish.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Maps a spawn failure to [`Error::ToolNotFound`] when the binary is missing.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound(program.to_string())
        } else {
            Error::CommandFailed(format!("Failed to start {}: {}", program, err))
        }
    }
}
