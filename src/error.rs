//! Error types for the transaction insight agent

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Transaction source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream call timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Model backend unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Tool call limit exceeded after {0} invocations")]
    ToolLimitExceeded(usize),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
