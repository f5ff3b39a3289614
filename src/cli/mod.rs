//! CLI module for ReelForge
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_initialization::SettingsLayer;
use crate::utils::logging::LogLevel;

pub mod args;
pub mod commands;

pub use args::{EffectsArgs, PresetsArgs, RunArgs, VariantsArgs};

/// ReelForge
///
/// Runs staged ffmpeg pipelines over a source video and generates batches of
/// platform-ready variants for A/B testing.
#[derive(Parser, Debug)]
#[command(name = "reelforge")]
#[command(about = "ReelForge - Staged short-form video pipelines and variant batches")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Settings file with a [reelforge] table
    #[arg(long, global = true, env = "REELFORGE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// ffmpeg binary
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary
    #[arg(long, global = true)]
    pub ffprobe: Option<PathBuf>,

    /// Time budget per stage, in seconds
    #[arg(long, global = true, value_parser = args::parse_stage_timeout)]
    pub stage_timeout: Option<u64>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings given on the command line, the top layer of the hierarchy
    pub fn settings_layer(&self) -> SettingsLayer {
        let max_concurrent_variants = match &self.command {
            Commands::Variants(args) => args.concurrency,
            _ => None,
        };
        SettingsLayer {
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            stage_timeout_secs: self.stage_timeout,
            max_concurrent_variants,
            output_dir: None,
            temp_root: None,
            log_level: self.log_level,
            log_json: self.log_json.then_some(true),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one pipeline described by a job file
    Run(args::RunArgs),
    /// Generate a batch of variants from one source
    Variants(args::VariantsArgs),
    /// List the platform presets
    Presets(args::PresetsArgs),
    /// Show the filters an effect list maps to
    Effects(args::EffectsArgs),
    /// Print the effective settings as TOML
    Settings,
}
