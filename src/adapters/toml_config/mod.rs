// TOML config adapter - Settings files with a [reelforge] table

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config_initialization::{Settings, SettingsLayer};
use crate::error::{ReelForgeError, ReelForgeResult};

/// Table holding ReelForge settings inside a TOML document
pub const SETTINGS_TABLE: &str = "reelforge";

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Files probed, in order, when no settings file is given explicitly
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("reelforge.toml"),
            PathBuf::from("config").join("reelforge.toml"),
        ];
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(config_home).join("reelforge").join("config.toml"));
        } else if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("reelforge")
                    .join("config.toml"),
            );
        }
        paths
    }

    /// Parse the `[reelforge]` table of a TOML document. A document without
    /// the table yields an empty layer.
    pub fn parse(content: &str) -> ReelForgeResult<SettingsLayer> {
        let parsed: toml::Value = toml::from_str(content)?;
        match parsed.get(SETTINGS_TABLE) {
            Some(table) => table
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| ReelForgeError::ConfigError(e.to_string())),
            None => Ok(SettingsLayer::default()),
        }
    }

    /// Load a settings file that must exist
    pub fn load(path: &Path) -> ReelForgeResult<SettingsLayer> {
        if !path.is_file() {
            return Err(ReelForgeError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let layer = Self::parse(&content).map_err(|e| {
            ReelForgeError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded settings from: {}", path.display());
        Ok(layer)
    }

    /// First default settings file that exists, if any
    pub fn load_default() -> ReelForgeResult<Option<SettingsLayer>> {
        for path in Self::default_config_paths() {
            if path.is_file() {
                return Self::load(&path).map(Some);
            }
            debug!("No settings file at {}", path.display());
        }
        Ok(None)
    }

    /// Serialize resolved settings back into a `[reelforge]` document
    pub fn render(settings: &Settings) -> ReelForgeResult<String> {
        let layer = SettingsLayer::from(settings);
        let mut document = toml::map::Map::new();
        document.insert(
            SETTINGS_TABLE.to_string(),
            toml::Value::try_from(layer)
                .map_err(|e| ReelForgeError::ConfigError(e.to_string()))?,
        );
        toml::to_string_pretty(&toml::Value::Table(document))
            .map_err(|e| ReelForgeError::ConfigError(e.to_string()))
    }
}
