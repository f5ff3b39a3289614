//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::model::{EffectName, Intensity};

/// Most variants a batch may run at once from the command line
pub const MAX_CLI_CONCURRENCY: usize = 64;

/// Stage timeouts from one second up to a day
pub fn parse_stage_timeout(s: &str) -> Result<u64, String> {
    number_range(s, 1, 86_400)
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    number_range(s, 1, MAX_CLI_CONCURRENCY)
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline job file (.json, .yaml, .yml or .toml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Source video, overriding the job file's inputPath
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory, overriding the job file's outputDir
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the variants command
#[derive(Args, Debug)]
pub struct VariantsArgs {
    /// Source video shared by every variant
    #[arg(short, long)]
    pub input: PathBuf,

    /// Variant list file (.json, .yaml, .yml or .toml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Batch output directory; each variant writes into a subdirectory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Variants processed at once
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the presets command
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the effects command
#[derive(Args, Debug)]
pub struct EffectsArgs {
    /// Effect to map; repeat for several
    #[arg(short, long = "effect", required = true)]
    pub effects: Vec<EffectName>,

    /// Intensity level (light, medium, heavy)
    #[arg(long, default_value = "medium")]
    pub intensity: Intensity,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
