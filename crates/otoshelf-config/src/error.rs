//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// No API credential was found in any layer or the environment.
    #[error("missing API key: set GEMINI_API_KEY or the api_key config field")]
    MissingApiKey,
    /// Generic validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}
