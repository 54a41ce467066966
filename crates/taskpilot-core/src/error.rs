//! Error types for Taskpilot Core

use thiserror::Error;

/// Result type alias using Taskpilot Error
pub type Result<T> = std::result::Result<T, Error>;

/// Taskpilot error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The completion provider call itself failed (network, auth, quota).
    /// Not recoverable by the agent loop.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

/// Tool-specific errors
///
/// These never escape the tool registry: they are rendered as
/// `Error: <message>` tool results and fed back to the model.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    Decode(String),

    #[error("Task not found: {0}")]
    NotFound(i64),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

/// Record store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
