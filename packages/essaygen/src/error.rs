//! Error types for essay generation.
//!
//! Only batch-fatal conditions live here. Per-attempt completion failures
//! (blocked, stopped, transport) are values of [`crate::completion::Completion`]
//! and never surface as an `EssayError`.

use thiserror::Error;

/// Main error type for the essaygen library.
#[derive(Debug, Error)]
pub enum EssayError {
    /// Missing or invalid configuration (credentials, flags).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input dataset lacks columns the prompt builder needs.
    #[error("input is missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Invalid user input, such as a row index out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for essaygen operations.
pub type Result<T> = std::result::Result<T, EssayError>;
