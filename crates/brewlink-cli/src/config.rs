//! TOML configuration for the `brewlink` tool.
//!
//! Default location:
//! - `$XDG_CONFIG_HOME/brewlink/config.toml`, or
//! - `~/.config/brewlink/config.toml` when `XDG_CONFIG_HOME` is unset.
//!
//! ```toml
//! log_level = "debug"
//!
//! [models]
//! EC900 = "maps/ec900.json"
//! EC1000 = "/usr/share/brewlink/ec1000.toml"
//! ```
//!
//! Relative device map paths are resolved against the directory holding the
//! config file.  A missing config file yields [`CliConfig::default`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use brewlink_core::ModelRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine config directory")]
    NoConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Model identifier → device map path.
    #[serde(default)]
    pub models: BTreeMap<String, PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            models: BTreeMap::new(),
        }
    }
}

impl CliConfig {
    /// Builds the model registry from the `[models]` table.
    pub fn registry(&self) -> ModelRegistry {
        self.models
            .iter()
            .map(|(model, path)| (model.clone(), path.clone()))
            .collect()
    }
}

/// Resolves the default config file path from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if neither `XDG_CONFIG_HOME` nor
/// `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("brewlink").join("config.toml"))
}

/// Loads the config at `path`, returning the default if it does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<CliConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CliConfig::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut cfg: CliConfig = toml::from_str(&content)?;
    if let Some(dir) = path.parent() {
        for map_path in cfg.models.values_mut() {
            if map_path.is_relative() {
                *map_path = dir.join(&*map_path);
            }
        }
    }
    Ok(cfg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
