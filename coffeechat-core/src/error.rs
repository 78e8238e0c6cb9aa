//! Error types for the coffeechat ecosystem.

use thiserror::Error;

/// Errors that can occur in coffeechat operations.
#[derive(Error, Debug)]
pub enum CoffeeChatError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Calendar backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for coffeechat operations.
pub type CoffeeChatResult<T> = Result<T, CoffeeChatError>;
