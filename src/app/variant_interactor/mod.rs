// Variant interactor - Runs several recipes over one source and aggregates outcomes

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::app::pipeline_interactor::PipelineInteractor;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::VariantRules;
use crate::engine::progress::{ProgressSink, VariantProgressSink};
use crate::presets;

/// Interactor for the batch variant use case
pub struct VariantInteractor {
    pipeline: Arc<PipelineInteractor>,
    max_concurrent: usize,
}

fn failed_result(name: &str, error: impl Into<String>, elapsed: Duration) -> VariantResult {
    VariantResult {
        name: name.to_string(),
        success: false,
        output_path: None,
        thumbnail_path: None,
        error: Some(error.into()),
        processing_time: elapsed,
    }
}

impl VariantInteractor {
    /// `max_concurrent` of 1 processes variants one after another
    pub fn new(pipeline: Arc<PipelineInteractor>, max_concurrent: usize) -> Self {
        Self {
            pipeline,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Pipeline config for one variant, writing into `<output_dir>/<name>`
    pub fn build_config(
        input: &Path,
        output_dir: &Path,
        variant: &VariantConfig,
    ) -> Result<PipelineConfig, DomainError> {
        VariantRules::validate_name(&variant.name)?;

        let optimize = match &variant.platform {
            Some(identifier) => Some(OptimizeStage::new(presets::lookup(identifier)?.platform)),
            None => None,
        };

        Ok(PipelineConfig {
            input_path: input.to_path_buf(),
            output_dir: Some(output_dir.join(variant.name.trim())),
            effects: variant.effects.clone(),
            trim: variant.trim.clone(),
            merge: None,
            subtitles: variant.subtitles.clone(),
            optimize,
            compress: variant.compress.then(CompressStage::default),
            thumbnail: Some(variant.thumbnail.clone().unwrap_or_default()),
        })
    }

    /// Run every variant and report each outcome in input order. Individual
    /// failures, including panics, never abort the batch.
    pub async fn generate(
        &self,
        input: &Path,
        output_dir: &Path,
        variants: &[VariantConfig],
        sink: Arc<dyn ProgressSink>,
    ) -> GenerateVariantsResult {
        let started = Instant::now();
        info!(
            variants = variants.len(),
            concurrency = self.max_concurrent,
            "Generating variants"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for (index, variant) in variants.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let pipeline = Arc::clone(&self.pipeline);
            let sink = Arc::clone(&sink);
            let input = input.to_path_buf();
            let output_dir = output_dir.to_path_buf();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let task_started = Instant::now();
                let name = variant.name.clone();
                // A nested task turns a panic into a JoinError we can attribute
                let handle = tokio::spawn(run_variant(pipeline, input, output_dir, variant, sink));
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(variant = %name, "Variant task aborted: {}", e);
                        failed_result(
                            &name,
                            format!("variant task aborted: {}", e),
                            task_started.elapsed(),
                        )
                    }
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<VariantResult>> = vec![None; variants.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => error!("Variant worker failed: {}", e),
            }
        }

        let results: Vec<VariantResult> = slots
            .into_iter()
            .zip(variants)
            .map(|(slot, variant)| {
                slot.unwrap_or_else(|| {
                    failed_result(&variant.name, "variant worker was lost", Duration::ZERO)
                })
            })
            .collect();
        let successful_variants = results.iter().filter(|r| r.success).count();

        info!(
            successful = successful_variants,
            total = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Variant batch complete"
        );

        GenerateVariantsResult {
            total_variants: results.len(),
            successful_variants,
            results,
            total_time: started.elapsed(),
        }
    }
}

async fn run_variant(
    pipeline: Arc<PipelineInteractor>,
    input: PathBuf,
    output_dir: PathBuf,
    variant: VariantConfig,
    sink: Arc<dyn ProgressSink>,
) -> VariantResult {
    let started = Instant::now();
    info!(variant = %variant.name, "Processing variant");

    let config = match VariantInteractor::build_config(&input, &output_dir, &variant) {
        Ok(config) => config,
        Err(e) => {
            warn!(variant = %variant.name, "Invalid variant: {}", e);
            return failed_result(&variant.name, e.to_string(), started.elapsed());
        }
    };

    let tagged = VariantProgressSink::new(variant.name.clone(), sink);
    let result = pipeline.run(&config, &tagged).await;

    VariantResult {
        name: variant.name,
        success: result.success,
        output_path: result.output_path,
        thumbnail_path: result.thumbnail_path,
        error: result.error,
        processing_time: started.elapsed(),
    }
}
