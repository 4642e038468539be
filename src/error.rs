//! Error types for the chronoken planner.

/// Top-level error type for the planning assistant.
#[derive(Debug, thiserror::Error)]
pub enum ChronoError {
    /// Task store read/write error.
    #[error("store error: {0}")]
    Store(String),

    /// Language model transport or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Cache lock or bookkeeping error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChronoError>;
