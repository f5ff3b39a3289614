//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::adapters::{TomlConfigAdapter, TracingProgressSink};
use crate::app::container::AppContainer;
use crate::cli::args::{EffectsArgs, PresetsArgs, RunArgs, VariantsArgs};
use crate::config_initialization::Settings;
use crate::domain::model::{GenerateVariantsResult, PipelineConfig, PipelineResult, VariantConfig};
use crate::effects::map_effects;
use crate::engine::progress::ProgressSink;
use crate::error::{ReelForgeError, ReelForgeResult};
use crate::presets;
use crate::utils::{format_duration, format_file_size};

/// Job file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFormat {
    Json,
    Yaml,
    Toml,
}

impl JobFormat {
    pub fn from_path(path: &Path) -> ReelForgeResult<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(JobFormat::Json),
            "yaml" | "yml" => Ok(JobFormat::Yaml),
            "toml" => Ok(JobFormat::Toml),
            _ => Err(ReelForgeError::InvalidJobFile {
                path: path.display().to_string(),
                message: "expected a .json, .yaml, .yml or .toml file".to_string(),
            }),
        }
    }
}

/// Parse a job document in the given format
pub fn parse_job<T: DeserializeOwned>(content: &str, format: JobFormat) -> ReelForgeResult<T> {
    Ok(match format {
        JobFormat::Json => serde_json::from_str(content)?,
        JobFormat::Yaml => serde_yaml::from_str(content)?,
        JobFormat::Toml => toml::from_str(content)?,
    })
}

/// Read and parse a job file
pub fn load_job<T: DeserializeOwned>(path: &Path) -> ReelForgeResult<T> {
    let format = JobFormat::from_path(path)?;
    if !path.is_file() {
        return Err(ReelForgeError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_job(&content, format).map_err(|e| ReelForgeError::InvalidJobFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// A variant file holds either a bare list or a `variants` table
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VariantsDocument {
    Batch { variants: Vec<VariantConfig> },
    List(Vec<VariantConfig>),
}

/// Read a variant list from any job format
pub fn load_variants(path: &Path) -> ReelForgeResult<Vec<VariantConfig>> {
    Ok(match load_job::<VariantsDocument>(path)? {
        VariantsDocument::Batch { variants } | VariantsDocument::List(variants) => variants,
    })
}

fn progress_sink() -> Arc<dyn ProgressSink> {
    Arc::new(TracingProgressSink::new())
}

/// Execute the run command. Returns whether the pipeline succeeded.
pub async fn run(container: &dyn AppContainer, args: RunArgs) -> Result<bool> {
    let mut config: PipelineConfig = load_job(&args.config)
        .with_context(|| format!("Failed to load pipeline job {}", args.config.display()))?;
    if let Some(input) = args.input {
        config.input_path = input;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = Some(output_dir);
    }

    info!("Input: {}", config.input_path.display());
    let sink = progress_sink();
    let result = container
        .pipeline_interactor()
        .run(&config, sink.as_ref())
        .await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        display_pipeline_result(&result);
    }
    Ok(result.success)
}

/// Execute the variants command. Returns whether at least one variant succeeded.
pub async fn variants(
    container: &dyn AppContainer,
    settings: &Settings,
    args: VariantsArgs,
) -> Result<bool> {
    let variants = load_variants(&args.config)
        .with_context(|| format!("Failed to load variants {}", args.config.display()))?;
    let output_dir = batch_output_dir(&args.input, args.output_dir, settings);

    info!(
        "Generating {} variants of {} into {}",
        variants.len(),
        args.input.display(),
        output_dir.display()
    );
    let result = container
        .variant_interactor()
        .generate(&args.input, &output_dir, &variants, progress_sink())
        .await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    } else {
        display_variants_result(&result);
    }
    Ok(result.total_variants == 0 || result.successful_variants > 0)
}

/// `--output-dir`, then the configured default, then `<input dir>/variants`
fn batch_output_dir(input: &Path, explicit: Option<PathBuf>, settings: &Settings) -> PathBuf {
    explicit
        .or_else(|| settings.output_dir.clone())
        .unwrap_or_else(|| {
            input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .join("variants")
        })
}

/// Execute the presets command
pub fn presets(args: PresetsArgs) -> Result<()> {
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(presets::all()).context("Failed to serialize presets")?
        );
        return Ok(());
    }

    println!(
        "{:<16} {:>11} {:>5} {:>9} {:>9} {:>6}",
        "PLATFORM", "SIZE", "FPS", "VIDEO", "AUDIO", "CODEC"
    );
    for preset in presets::all() {
        println!(
            "{:<16} {:>11} {:>5} {:>9} {:>9} {:>6}",
            preset.platform.as_str(),
            format!("{}x{}", preset.width, preset.height),
            preset.fps,
            format!("{}k", preset.video_bitrate),
            format!("{}k", preset.audio_bitrate),
            preset.codec
        );
    }
    Ok(())
}

/// Execute the effects command
pub fn effects(args: EffectsArgs) -> Result<()> {
    let mapping = map_effects(&args.effects, args.intensity);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&mapping).context("Failed to serialize mapping")?
        );
        return Ok(());
    }

    println!("Video filters: {}", mapping.video_chain().unwrap_or_default());
    match mapping.audio_chain() {
        Some(chain) => println!("Audio filters: {}", chain),
        None => println!("Audio filters: (none)"),
    }
    Ok(())
}

/// Execute the settings command
pub fn settings(settings: &Settings) -> Result<()> {
    print!(
        "{}",
        TomlConfigAdapter::render(settings).context("Failed to render settings")?
    );
    Ok(())
}

fn display_pipeline_result(result: &PipelineResult) {
    println!("=== Pipeline Result ===");
    for outcome in &result.stages {
        println!(
            "  {:<10} {:<4} {}",
            outcome.stage.as_str(),
            if outcome.success { "ok" } else { "FAIL" },
            format_duration(outcome.elapsed)
        );
    }
    if result.success {
        if let Some(output) = &result.output_path {
            println!("Output: {}", output.display());
        }
        if let Some(thumbnail) = &result.thumbnail_path {
            println!("Thumbnail: {}", thumbnail.display());
        }
        if let Some(meta) = &result.metadata {
            println!(
                "Video: {}x{} {} {:.2}s {:.2}fps, {}",
                meta.width,
                meta.height,
                meta.codec,
                meta.duration,
                meta.fps,
                format_file_size(meta.file_size)
            );
        }
    } else if let Some(error) = &result.error {
        println!("Failed: {}", error);
    }
}

fn display_variants_result(result: &GenerateVariantsResult) {
    println!("=== Variant Batch ===");
    for variant in &result.results {
        let detail = match (&variant.output_path, &variant.error) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        println!(
            "  {:<16} {:<4} {:>10}  {}",
            variant.name,
            if variant.success { "ok" } else { "FAIL" },
            format_duration(variant.processing_time),
            detail
        );
    }
    println!(
        "{}/{} variants succeeded in {}",
        result.successful_variants,
        result.total_variants,
        format_duration(result.total_time)
    );
}
