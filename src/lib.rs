//! ReelForge Library
//!
//! Staged ffmpeg pipelines over a single source video (effects, trim, merge,
//! subtitles, platform encode, thumbnail) and concurrent batches of named
//! variants built on top of them.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod effects;
pub mod engine;
pub mod error;
pub mod ports;
pub mod presets;
pub mod utils;

// Re-export commonly used types
pub use app::container::{AppContainer, DefaultAppContainer};
pub use app::{PipelineInteractor, PipelineOptions, VariantInteractor};
pub use config_initialization::{initialize_settings, Settings};
pub use domain::errors::DomainError;
pub use domain::model::{
    GenerateVariantsResult, MediaMetadata, PipelineConfig, PipelineResult, PipelineStage,
    VariantConfig, VariantResult,
};
pub use engine::{ProgressEvent, ProgressSink};
pub use error::{ReelForgeError, ReelForgeResult};
