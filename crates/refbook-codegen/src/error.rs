//! Code generation error types

use thiserror::Error;

/// Result type for code generation
pub type GenerateResult<T> = std::result::Result<T, GenerateError>;

/// Errors that can occur while generating code
#[derive(Debug, Error)]
pub enum GenerateError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Language name with no generator
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] refbook_core::Error),
}
