//! ReelForge CLI
//!
//! Runs staged ffmpeg pipelines over a source video and generates batches of
//! platform-ready variants.
//!
//! # Usage
//!
//! ```bash
//! reelforge run --config job.yaml
//! reelforge variants --input source.mp4 --config variants.json --concurrency 2
//! reelforge presets
//! reelforge effects --effect vintage --effect camera_shake --intensity heavy
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use reelforge_cli::app::container::DefaultAppContainer;
use reelforge_cli::cli::{commands, Cli, Commands};
use reelforge_cli::config_initialization::initialize_settings;
use reelforge_cli::utils::logging::{init_logging, log_system_info};

/// Main entry point for the ReelForge CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = initialize_settings(cli.settings.as_deref(), &cli.settings_layer())
        .context("Failed to resolve settings")?;
    init_logging(settings.log_level, settings.log_json)?;
    log_system_info();

    let container = DefaultAppContainer::new(&settings);

    let succeeded = match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            commands::run(&container, args).await?
        }
        Commands::Variants(args) => {
            info!("Executing variants command");
            commands::variants(&container, &settings, args).await?
        }
        Commands::Presets(args) => {
            commands::presets(args)?;
            true
        }
        Commands::Effects(args) => {
            commands::effects(args)?;
            true
        }
        Commands::Settings => {
            commands::settings(&settings)?;
            true
        }
    };

    if succeeded {
        info!("ReelForge completed successfully");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("ReelForge finished with failures");
        Ok(ExitCode::FAILURE)
    }
}
