//! Layered configuration loader.
//!
//! Discovers configuration layers (user/cwd/runtime), merges them over the
//! schema defaults, and applies environment overrides to produce a final
//! `ShelfConfig`.

use crate::{ConfigError, ShelfConfig};
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "otoshelf.json5";
/// Default config directory under the user home.
const DEFAULT_CONFIG_DIR: &str = ".otoshelf";
/// Environment variable carrying the service credential.
const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the shelf document location.
const SHELF_PATH_ENV: &str = "OTOSHELF_SHELF_PATH";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: ShelfConfig,
    /// Metadata for each layer considered during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration under the home directory.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Explicit config path passed at runtime (highest file precedence).
    Runtime,
    /// Environment variable overrides.
    Environment,
}

/// Metadata about a config layer considered during load.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin (user, cwd, runtime, environment).
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfigOptions {
    /// Explicit config file path; an error when it does not exist.
    pub config_path: Option<PathBuf>,
    /// Working directory used for the cwd layer; defaults to the process cwd.
    pub cwd: Option<PathBuf>,
    /// Whether environment variables may override file layers.
    pub read_environment: bool,
    /// Skip the home-directory layer (used by hermetic tests).
    pub skip_user_layer: bool,
}

impl LayeredConfig {
    /// Load and merge all configured layers into an effective config.
    pub fn load(options: &LayeredConfigOptions) -> Result<Self, ConfigError> {
        let mut merged = serde_json::to_value(ShelfConfig::default())?;
        let mut layers = Vec::new();

        if !options.skip_user_layer
            && let Some(path) = user_config_path()
            && let Some(value) = load_optional_layer(ConfigLayerSource::User, &path)?
        {
            merge_value(&mut merged, value);
            layers.push(ConfigLayer {
                source: ConfigLayerSource::User,
                path: Some(path),
            });
        }

        let cwd = match &options.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()?,
        };
        let cwd_path = cwd.join(DEFAULT_CONFIG_FILE);
        if let Some(value) = load_optional_layer(ConfigLayerSource::Cwd, &cwd_path)? {
            merge_value(&mut merged, value);
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Cwd,
                path: Some(cwd_path),
            });
        }

        if let Some(path) = &options.config_path {
            let value = load_required_layer(ConfigLayerSource::Runtime, path)?;
            merge_value(&mut merged, value);
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path: Some(path.clone()),
            });
        }

        let mut config: ShelfConfig = serde_json::from_value(merged)?;

        if options.read_environment
            && apply_environment(&mut config, |name| std::env::var(name).ok())
        {
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Environment,
                path: None,
            });
        }

        info!("loaded config ({} layers)", layers.len());
        Ok(Self { config, layers })
    }
}

/// Path of the user-level config file, when a home directory exists.
fn user_config_path() -> Option<PathBuf> {
    let base = directories::BaseDirs::new()?;
    Some(
        base.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
    )
}

/// Load an optional layer if the given path exists.
fn load_optional_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        debug!(
            "optional layer missing (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(None);
    }
    Ok(Some(load_required_layer(source, path)?))
}

/// Load a required layer from disk.
fn load_required_layer(source: ConfigLayerSource, path: &Path) -> Result<Value, ConfigError> {
    debug!(
        "loading config layer (source={:?}, path={})",
        source,
        path.display()
    );
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    if !value.is_object() {
        return Err(ConfigError::Invalid(format!(
            "config layer is not an object: {}",
            path.display()
        )));
    }
    Ok(value)
}

/// Deep-merge an overlay into a base JSON value; overlay entries win.
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply environment overrides; returns whether any value was taken.
fn apply_environment(
    config: &mut ShelfConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> bool {
    let mut applied = false;
    if let Some(key) = lookup(API_KEY_ENV)
        && !key.trim().is_empty()
    {
        config.api_key = Some(key);
        applied = true;
    }
    if let Some(path) = lookup(SHELF_PATH_ENV)
        && !path.trim().is_empty()
    {
        config.shelf_path = Some(path);
        applied = true;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn options_for(dir: &Path) -> LayeredConfigOptions {
        LayeredConfigOptions {
            config_path: None,
            cwd: Some(dir.to_path_buf()),
            read_environment: false,
            skip_user_layer: true,
        }
    }

    #[test]
    fn load_without_layers_yields_defaults() {
        let temp = tempdir().expect("tempdir");
        let loaded = LayeredConfig::load(&options_for(temp.path())).expect("load");
        assert_eq!(loaded.config.chat_model, "gemini-2.5-flash");
        assert!(loaded.layers.is_empty());
    }

    #[test]
    fn cwd_layer_overrides_defaults() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            r#"{ chat_model: "test-model", api_key: "from-file" }"#,
        )
        .expect("write layer");

        let loaded = LayeredConfig::load(&options_for(temp.path())).expect("load");
        assert_eq!(loaded.config.chat_model, "test-model");
        assert_eq!(loaded.config.api_key.as_deref(), Some("from-file"));
        // Untouched fields keep their defaults.
        assert_eq!(loaded.config.summary_model, "gemini-2.5-flash");
    }

    #[test]
    fn runtime_layer_wins_over_cwd_layer() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            r#"{ chat_model: "cwd-model" }"#,
        )
        .expect("write cwd layer");
        let runtime = temp.path().join("override.json5");
        std::fs::write(&runtime, r#"{ chat_model: "runtime-model" }"#).expect("write runtime");

        let mut options = options_for(temp.path());
        options.config_path = Some(runtime);
        let loaded = LayeredConfig::load(&options).expect("load");
        assert_eq!(loaded.config.chat_model, "runtime-model");
    }

    #[test]
    fn missing_runtime_layer_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let mut options = options_for(temp.path());
        options.config_path = Some(temp.path().join("absent.json5"));
        assert!(LayeredConfig::load(&options).is_err());
    }

    #[test]
    fn environment_overrides_take_precedence() {
        let mut config = ShelfConfig::builder().api_key("file-key").build();
        let applied = apply_environment(&mut config, |name| match name {
            "GEMINI_API_KEY" => Some("env-key".to_string()),
            _ => None,
        });
        assert!(applied);
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let mut config = ShelfConfig::default();
        let applied = apply_environment(&mut config, |_| Some("   ".to_string()));
        assert!(!applied);
        assert!(config.api_key.is_none());
    }
}
