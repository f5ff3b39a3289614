//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::toml_config::TomlConfigAdapter;
use crate::error::{ReelForgeError, ReelForgeResult};
use crate::utils::logging::LogLevel;

/// Default per-stage time budget
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 600;

/// Resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Budget for a single stage executor call
    pub stage_timeout: Duration,
    /// Variants processed at once; 1 runs the batch sequentially
    pub max_concurrent_variants: usize,
    /// Used when a pipeline config names no output directory
    pub output_dir: Option<PathBuf>,
    /// Parent of work arenas; the output directory when unset
    pub temp_root: Option<PathBuf>,
    pub log_level: LogLevel,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECS),
            max_concurrent_variants: 1,
            output_dir: None,
            temp_root: None,
            log_level: LogLevel::Info,
            log_json: false,
        }
    }
}

/// One source of settings; unset fields leave lower layers untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffprobe_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_variants: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_json: Option<bool>,
}

impl SettingsLayer {
    /// Number of fields this layer sets
    pub fn len(&self) -> usize {
        [
            self.ffmpeg_path.is_some(),
            self.ffprobe_path.is_some(),
            self.stage_timeout_secs.is_some(),
            self.max_concurrent_variants.is_some(),
            self.output_dir.is_some(),
            self.temp_root.is_some(),
            self.log_level.is_some(),
            self.log_json.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&Settings> for SettingsLayer {
    fn from(settings: &Settings) -> Self {
        Self {
            ffmpeg_path: Some(settings.ffmpeg_path.clone()),
            ffprobe_path: Some(settings.ffprobe_path.clone()),
            stage_timeout_secs: Some(settings.stage_timeout.as_secs()),
            max_concurrent_variants: Some(settings.max_concurrent_variants),
            output_dir: settings.output_dir.clone(),
            temp_root: settings.temp_root.clone(),
            log_level: Some(settings.log_level),
            log_json: Some(settings.log_json),
        }
    }
}

impl Settings {
    /// Overlay every field the layer sets
    pub fn apply(&mut self, layer: &SettingsLayer) {
        if let Some(path) = &layer.ffmpeg_path {
            self.ffmpeg_path = path.clone();
        }
        if let Some(path) = &layer.ffprobe_path {
            self.ffprobe_path = path.clone();
        }
        if let Some(secs) = layer.stage_timeout_secs {
            self.stage_timeout = Duration::from_secs(secs);
        }
        if let Some(count) = layer.max_concurrent_variants {
            self.max_concurrent_variants = count;
        }
        if let Some(dir) = &layer.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(dir) = &layer.temp_root {
            self.temp_root = Some(dir.clone());
        }
        if let Some(level) = layer.log_level {
            self.log_level = level;
        }
        if let Some(json) = layer.log_json {
            self.log_json = json;
        }
    }

    /// Clamp values into their usable ranges
    pub fn normalize(mut self) -> ReelForgeResult<Self> {
        if self.stage_timeout.is_zero() {
            return Err(ReelForgeError::ConfigError(
                "stage timeout must be at least one second".to_string(),
            ));
        }
        self.max_concurrent_variants = self.max_concurrent_variants.clamp(1, num_cpus::get().max(1));
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ReelForgeResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReelForgeError::ConfigError(format!("Invalid value for {}: {}", key, value)))
}

/// Build a layer from `REELFORGE_*` variables
pub fn environment_layer<I>(vars: I) -> ReelForgeResult<SettingsLayer>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut layer = SettingsLayer::default();
    for (key, value) in vars {
        match key.as_str() {
            "REELFORGE_FFMPEG" => layer.ffmpeg_path = Some(PathBuf::from(value)),
            "REELFORGE_FFPROBE" => layer.ffprobe_path = Some(PathBuf::from(value)),
            "REELFORGE_STAGE_TIMEOUT" => layer.stage_timeout_secs = Some(parse_env(&key, &value)?),
            "REELFORGE_MAX_CONCURRENT_VARIANTS" => {
                layer.max_concurrent_variants = Some(parse_env(&key, &value)?)
            }
            "REELFORGE_OUTPUT_DIR" => layer.output_dir = Some(PathBuf::from(value)),
            "REELFORGE_TEMP_ROOT" => layer.temp_root = Some(PathBuf::from(value)),
            "REELFORGE_LOG_LEVEL" => layer.log_level = Some(value.parse()?),
            "REELFORGE_LOG_JSON" => layer.log_json = Some(parse_env(&key, &value)?),
            _ => continue,
        }
        info!("Found environment override: {}", key);
    }
    Ok(layer)
}

/// Resolve settings with precedence CLI > environment > file > defaults
///
/// An explicit `settings_file` must exist; otherwise the default locations
/// are probed and a missing file is not an error.
pub fn initialize_settings(
    settings_file: Option<&Path>,
    cli_layer: &SettingsLayer,
) -> ReelForgeResult<Settings> {
    let mut settings = Settings::default();

    let file_layer = match settings_file {
        Some(path) => Some(TomlConfigAdapter::load(path)?),
        None => TomlConfigAdapter::load_default()?,
    };
    if let Some(layer) = &file_layer {
        settings.apply(layer);
    }

    let env_layer = environment_layer(std::env::vars())?;
    if !env_layer.is_empty() {
        info!("Applied {} environment variable overrides", env_layer.len());
    }
    settings.apply(&env_layer);

    if !cli_layer.is_empty() {
        info!("Applied {} CLI configuration overrides", cli_layer.len());
    }
    settings.apply(cli_layer);

    settings.normalize()
}
