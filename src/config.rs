//! Sticky on-disk CLI preferences, distinct from the per-run [`Env`](crate::env::Env).
//!
//! `CliConfig` never participates in dependency resolution; it only seeds
//! the initial overrides the CLI passes into the root `Env` it builds for a
//! given invocation (see `cli::build_root_env`).

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::{BuzzyError, Result};

/// Sticky CLI preferences read from `~/.config/buzzy/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default `-v` verbosity applied when the CLI is invoked without any.
    #[serde(default)]
    pub default_verbose: u8,
    /// Default `-q` quiet mode.
    #[serde(default)]
    pub default_quiet: bool,
    /// Overrides `${cache_path}` when set.
    #[serde(default)]
    pub cache_dir_override: Option<PathBuf>,
    /// Forces a specific native package manager when more than one is
    /// detectable on the host (e.g. a Homebrew install on a Linux box).
    #[serde(default)]
    pub preferred_packager: Option<String>,
    /// Always behave as if `-f/--force` were passed.
    #[serde(default)]
    pub always_force: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_verbose: 0,
            default_quiet: false,
            cache_dir_override: None,
            preferred_packager: None,
            always_force: false,
        }
    }
}

impl CliConfig {
    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| BuzzyError::bad_config("Could not find config directory"))?;
        Ok(config_dir.join("buzzy").join("config.toml"))
    }

    /// Load configuration from file, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: CliConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BuzzyError::bad_config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Reset configuration to defaults.
    pub fn reset() -> Result<()> {
        let config = Self::default();
        config.save()
    }

    /// Initialize configuration file.
    pub fn init(force: bool) -> Result<()> {
        let path = Self::config_path()?;

        if path.exists() && !force {
            return Err(BuzzyError::bad_config(
                "Configuration file already exists. Use --force to overwrite.",
            ));
        }

        let config = Self::default();
        config.save()
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "default_verbose" => Some(self.default_verbose.to_string()),
            "default_quiet" => Some(self.default_quiet.to_string()),
            "cache_dir_override" => self
                .cache_dir_override
                .as_ref()
                .map(|p| p.display().to_string()),
            "preferred_packager" => self.preferred_packager.clone(),
            "always_force" => Some(self.always_force.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_verbose" => {
                self.default_verbose = value
                    .parse()
                    .map_err(|_| BuzzyError::bad_config("Invalid number for default_verbose"))?;
            }
            "default_quiet" => {
                self.default_quiet = value
                    .parse()
                    .map_err(|_| BuzzyError::bad_config("Invalid boolean for default_quiet"))?;
            }
            "cache_dir_override" => {
                self.cache_dir_override =
                    if value.is_empty() { None } else { Some(PathBuf::from(value)) };
            }
            "preferred_packager" => {
                self.preferred_packager =
                    if value.is_empty() { None } else { Some(value.to_string()) };
            }
            "always_force" => {
                self.always_force = value
                    .parse()
                    .map_err(|_| BuzzyError::bad_config("Invalid boolean for always_force"))?;
            }
            _ => {
                return Err(BuzzyError::bad_config(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_overrides() {
        let config = CliConfig::default();
        assert_eq!(config.default_verbose, 0);
        assert!(!config.always_force);
        assert!(config.preferred_packager.is_none());
    }

    #[test]
    fn get_set_round_trips() {
        let mut config = CliConfig::default();

        config.set("always_force", "true").unwrap();
        assert_eq!(config.get("always_force"), Some("true".to_string()));

        config.set("preferred_packager", "pacman").unwrap();
        assert_eq!(config.get("preferred_packager"), Some("pacman".to_string()));

        config.set("preferred_packager", "").unwrap();
        assert_eq!(config.get("preferred_packager"), None);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut config = CliConfig::default();
        assert!(config.set("bogus.key", "x").is_err());
    }

    #[test]
    fn set_rejects_malformed_values() {
        let mut config = CliConfig::default();
        assert!(config.set("default_verbose", "not-a-number").is_err());
    }
}
