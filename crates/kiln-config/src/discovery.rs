//! File-based config discovery and layered loading for CLI use.
//!
//! Layers, lowest priority first: serde defaults, the config file,
//! `KILN_`-prefixed environment variables, command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use serde_json::Value;

use crate::config::{ConfigOverrides, KilnConfig};
use crate::error::{ConfigError, Result};

/// Environment variable prefix; `__` separates nested keys
/// (`KILN_OUTPUT__DIR=public`).
pub const ENV_PREFIX: &str = "KILN_";

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use kiln_config::{ConfigDiscovery, ConfigOverrides};
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load(&ConfigOverrides::default()).unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a new config discovery with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. kiln.toml
    /// 2. kiln.json
    /// 3. package.json (kiln field)
    pub fn find(&self) -> Option<PathBuf> {
        for name in ["kiln.toml", "kiln.json"] {
            let path = self.root.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join("package.json");
        if pkg_path.is_file() {
            if let Ok(content) = fs::read_to_string(&pkg_path) {
                if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                    if parsed.get("kiln").is_some_and(|v| !v.is_null()) {
                        return Some(pkg_path);
                    }
                }
            }
        }

        None
    }

    /// Load the discovered config file, or defaults when there is none.
    pub fn load(&self, overrides: &ConfigOverrides) -> Result<KilnConfig> {
        let figment = match self.find() {
            Some(path) => {
                tracing::debug!("Using config file {}", path.display());
                with_file(Figment::new(), &path)?
            }
            None => {
                tracing::debug!("No config file in {}, using defaults", self.root.display());
                Figment::new()
            }
        };
        extract(figment, overrides)
    }

    /// Load a specific config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist.
    pub fn load_from(&self, path: &Path, overrides: &ConfigOverrides) -> Result<KilnConfig> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if !path.is_file() {
            return Err(ConfigError::NotFound(path));
        }
        extract(with_file(Figment::new(), &path)?, overrides)
    }
}

fn with_file(figment: Figment, path: &Path) -> Result<Figment> {
    if path.file_name() == Some(std::ffi::OsStr::new("package.json")) {
        let content = fs::read_to_string(path)?;
        let parsed: Value =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
                field: "package.json".to_string(),
                hint: Some(format!("Invalid JSON: {}", e)),
            })?;
        let kiln = parsed
            .get("kiln")
            .filter(|v| v.is_object())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "kiln".to_string(),
                hint: Some("Add a 'kiln' object to your package.json".to_string()),
            })?;
        return Ok(figment.merge(Serialized::defaults(kiln.clone())));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        Some("json") => Ok(figment.merge(Json::file(path))),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn extract(figment: Figment, overrides: &ConfigOverrides) -> Result<KilnConfig> {
    let config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Serialized::defaults(overrides))
        .extract::<KilnConfig>()?;
    Ok(config)
}

/// Discover and load config from current directory (convenience function)
pub fn discover() -> Result<KilnConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(&root).load(&ConfigOverrides::default())
}
