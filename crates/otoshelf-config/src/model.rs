//! Configuration schema for otoshelf.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root config for the otoshelf SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    /// Credential for the generative-language service. May also arrive via
    /// the GEMINI_API_KEY environment variable (environment wins).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Location of the persisted shelf document. Defaults to the user data
    /// directory when unset.
    #[serde(default)]
    pub shelf_path: Option<String>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            schema: None,
            api_key: None,
            chat_model: default_chat_model(),
            summary_model: default_summary_model(),
            base_url: default_base_url(),
            shelf_path: None,
        }
    }
}

impl ShelfConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ShelfConfigBuilder {
        ShelfConfigBuilder::new()
    }

    /// Return the configured API key, failing when none is present.
    ///
    /// A missing credential is a fatal startup condition for binaries.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Resolve the shelf document path, falling back to the user data dir.
    pub fn resolve_shelf_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.shelf_path {
            return Ok(PathBuf::from(path));
        }
        let base = directories::BaseDirs::new().ok_or_else(|| {
            ConfigError::Invalid("could not determine a user data directory".to_string())
        })?;
        Ok(base
            .data_dir()
            .join("otoshelf")
            .join(DEFAULT_SHELF_FILE_NAME))
    }
}

/// Builder for assembling a `ShelfConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ShelfConfigBuilder {
    config: ShelfConfig,
}

impl ShelfConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ShelfConfig::default(),
        }
    }

    /// Set the API credential.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Replace the chat model name.
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    /// Replace the summary model name.
    pub fn summary_model(mut self, model: impl Into<String>) -> Self {
        self.config.summary_model = model.into();
        self
    }

    /// Replace the service base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Replace the shelf document path.
    pub fn shelf_path(mut self, path: impl Into<String>) -> Self {
        self.config.shelf_path = Some(path.into());
        self
    }

    /// Finalize and return the built `ShelfConfig`.
    pub fn build(self) -> ShelfConfig {
        self.config
    }
}

/// File name for the persisted shelf document.
pub const DEFAULT_SHELF_FILE_NAME: &str = "memory_music_shelf.json";

/// Default model used for the interview chat session.
fn default_chat_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Default model used for the one-shot summarization call.
fn default_summary_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Default generative-language service endpoint.
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
