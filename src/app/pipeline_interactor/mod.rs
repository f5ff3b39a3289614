// Pipeline interactor - Runs the configured stages over one input

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::engine::merge::MergeRequest;
use crate::engine::progress::{ProgressEvent, ProgressSink};
use crate::engine::{EncodeTarget, StageExecutor};
use crate::ports::*;
use crate::utils::path::{
    extension_or_mp4, final_output_path, output_timestamp, thumbnail_output_path, WorkArena,
};

/// One executed step of a run, in state machine order
#[derive(Debug, Clone, PartialEq)]
pub enum StagePlan {
    Effects(EffectsStage),
    Trim(TrimStage),
    Merge(MergeStage),
    Subtitles(SubtitleStage),
    Encode(EncodeTarget),
    Thumbnail(ThumbnailStage),
}

impl StagePlan {
    pub fn stage(&self) -> PipelineStage {
        match self {
            StagePlan::Effects(_) => PipelineStage::Effects,
            StagePlan::Trim(_) => PipelineStage::Trim,
            StagePlan::Merge(_) => PipelineStage::Merge,
            StagePlan::Subtitles(_) => PipelineStage::Subtitles,
            StagePlan::Encode(_) => PipelineStage::Optimize,
            StagePlan::Thumbnail(_) => PipelineStage::Thumbnail,
        }
    }

    /// Whether the stage output replaces the current file
    fn advances_current(&self) -> bool {
        !matches!(self, StagePlan::Thumbnail(_))
    }

    fn extension(&self) -> &'static str {
        match self {
            StagePlan::Thumbnail(_) => "jpg",
            _ => "mp4",
        }
    }

    /// Fold the enabled blocks of a config into the ordered plan
    pub fn from_config(config: &PipelineConfig) -> Vec<StagePlan> {
        let mut plans = Vec::new();
        if let Some(stage) = config.effects.as_ref().filter(|s| s.enabled) {
            plans.push(StagePlan::Effects(stage.clone()));
        }
        if let Some(stage) = config.trim.as_ref().filter(|s| s.enabled) {
            plans.push(StagePlan::Trim(stage.clone()));
        }
        if let Some(stage) = config.merge.as_ref().filter(|s| s.enabled) {
            plans.push(StagePlan::Merge(stage.clone()));
        }
        if let Some(stage) = config.subtitles.as_ref().filter(|s| s.enabled) {
            plans.push(StagePlan::Subtitles(stage.clone()));
        }
        if let Some(target) = OutputTargetSelector::select(config) {
            plans.push(StagePlan::Encode(target.into()));
        }
        if let Some(stage) = config.thumbnail.as_ref().filter(|s| s.enabled) {
            plans.push(StagePlan::Thumbnail(stage.clone()));
        }
        plans
    }
}

/// Runtime knobs of the sequencer
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub stage_timeout: Duration,
    /// Parent of work arenas; the run's output directory when unset
    pub temp_root: Option<PathBuf>,
    /// Used when the config names no output directory
    pub default_output_dir: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(crate::config_initialization::DEFAULT_STAGE_TIMEOUT_SECS),
            temp_root: None,
            default_output_dir: None,
        }
    }
}

/// Failure of a run, tagged with the stage it happened in
struct StageFailure {
    stage: PipelineStage,
    error: DomainError,
}

impl StageFailure {
    fn new(stage: PipelineStage, error: DomainError) -> Self {
        Self { stage, error }
    }

    fn message(&self) -> String {
        format!("{} stage failed: {}", self.stage, self.error)
    }
}

/// Progress emitter that never reports a lower percentage than before
struct ProgressTracker<'a> {
    sink: &'a dyn ProgressSink,
    last_percent: u8,
}

impl<'a> ProgressTracker<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last_percent: 0,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        let event = ProgressEvent::for_stage(stage);
        self.last_percent = event.percent;
        self.sink.emit(event);
    }

    fn fail(&self, message: &str) {
        self.sink.emit(ProgressEvent {
            variant: None,
            stage: PipelineStage::Error,
            percent: self.last_percent,
            message: message.to_string(),
        });
    }
}

/// Interactor for the staged pipeline use case
pub struct PipelineInteractor {
    executor: StageExecutor,
    probe_port: Arc<dyn ProbePort>,
    options: PipelineOptions,
}

impl PipelineInteractor {
    /// Create new pipeline interactor with injected ports
    pub fn new(
        execute_port: Arc<dyn ExecutePort>,
        probe_port: Arc<dyn ProbePort>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            executor: StageExecutor::new(execute_port, Arc::clone(&probe_port)),
            probe_port,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every enabled stage. Never fails: errors become a failed result.
    pub async fn run(&self, config: &PipelineConfig, sink: &dyn ProgressSink) -> PipelineResult {
        let started = Instant::now();
        let mut progress = ProgressTracker::new(sink);
        let mut stages = Vec::new();
        progress.enter(PipelineStage::Init);
        info!(input = %config.input_path.display(), "Starting pipeline");

        let outcome = self.run_stages(config, &mut progress, &mut stages).await;
        match outcome {
            Ok(mut result) => {
                result.stages = stages;
                progress.enter(PipelineStage::Complete);
                info!(
                    output = ?result.output_path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline complete"
                );
                result
            }
            Err(failure) => {
                let message = failure.message();
                if failure.error.is_validation() {
                    warn!(stage = %failure.stage, "{}", message);
                } else {
                    error!(stage = %failure.stage, "{}", message);
                }
                progress.fail(&message);
                PipelineResult::failure(stages, message)
            }
        }
    }

    fn output_dir_for(&self, config: &PipelineConfig) -> PathBuf {
        config
            .output_dir
            .clone()
            .or_else(|| self.options.default_output_dir.clone())
            .or_else(|| {
                config
                    .input_path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| PathBuf::from("."))
    }

    async fn run_stages(
        &self,
        config: &PipelineConfig,
        progress: &mut ProgressTracker<'_>,
        stages: &mut Vec<StageOutcome>,
    ) -> Result<PipelineResult, StageFailure> {
        // Validation stats the input and clip files
        let validated = config.clone();
        tokio::task::spawn_blocking(move || PipelineRules::validate(&validated))
            .await
            .map_err(|e| DomainError::InternalError(format!("validation task failed: {}", e)))
            .and_then(|checked| checked)
            .map_err(|e| StageFailure::new(PipelineStage::Init, e))?;

        let output_dir = self.output_dir_for(config);
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            StageFailure::new(
                PipelineStage::Init,
                DomainError::FsFail(format!("Cannot create {}: {}", output_dir.display(), e)),
            )
        })?;
        let arena_parent = self.options.temp_root.clone().unwrap_or_else(|| output_dir.clone());
        let mut arena = WorkArena::create(arena_parent)
            .await
            .map_err(|e| StageFailure::new(PipelineStage::Init, e))?;

        let plans = StagePlan::from_config(config);
        debug!(stages = ?plans.iter().map(StagePlan::stage).collect::<Vec<_>>(), "Planned stages");

        let mut current = config.input_path.clone();
        let mut thumbnail = None;
        for plan in &plans {
            let stage = plan.stage();
            progress.enter(stage);
            let output = arena.stage_path(stage.as_str(), plan.extension());

            let stage_started = Instant::now();
            let result = self.execute_with_timeout(plan, &current, &output).await;
            stages.push(StageOutcome {
                stage,
                success: result.is_ok(),
                elapsed: stage_started.elapsed(),
            });
            if let Err(e) = result {
                arena.close();
                return Err(StageFailure::new(stage, e));
            }

            if plan.advances_current() {
                current = output;
            } else {
                thumbnail = Some(output);
            }
        }

        let finalized = self
            .finalize(config, &output_dir, &current, thumbnail.as_deref())
            .await;
        arena.close();
        finalized
    }

    async fn execute_with_timeout(
        &self,
        plan: &StagePlan,
        input: &Path,
        output: &Path,
    ) -> Result<(), DomainError> {
        let budget = self.options.stage_timeout;
        match tokio::time::timeout(budget, self.execute(plan, input, output)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(stage = %plan.stage(), "Stage timed out");
                Err(DomainError::Timeout(format!(
                    "exceeded {:.1}s budget",
                    budget.as_secs_f64()
                )))
            }
        }
    }

    async fn execute(
        &self,
        plan: &StagePlan,
        input: &Path,
        output: &Path,
    ) -> Result<(), DomainError> {
        match plan {
            StagePlan::Effects(stage) => self.executor.apply_effects(input, output, stage).await,
            StagePlan::Trim(stage) => self.executor.trim(input, output, stage).await,
            StagePlan::Merge(stage) => {
                let mut inputs = Vec::with_capacity(stage.clips.len() + 1);
                inputs.push(input.to_path_buf());
                inputs.extend(stage.clips.iter().cloned());
                let request = MergeRequest {
                    inputs,
                    transition: stage.transition,
                    transition_duration: stage.transition_duration,
                };
                self.executor.merge(&request, output).await
            }
            StagePlan::Subtitles(stage) => self.executor.burn_subtitles(input, output, stage).await,
            StagePlan::Encode(target) => self.executor.encode(input, output, target).await,
            StagePlan::Thumbnail(stage) => {
                self.executor.thumbnail(input, output, stage.timestamp).await
            }
        }
    }

    /// Copy artifacts out of the arena and probe the result. Anything copied
    /// is removed again if a later step fails.
    async fn finalize(
        &self,
        config: &PipelineConfig,
        output_dir: &Path,
        current: &Path,
        thumbnail: Option<&Path>,
    ) -> Result<PipelineResult, StageFailure> {
        let timestamp = output_timestamp();
        let final_path = final_output_path(
            output_dir,
            &config.input_path,
            &extension_or_mp4(current),
            &timestamp,
        );
        let thumbnail_path =
            thumbnail.map(|_| thumbnail_output_path(output_dir, &config.input_path, &timestamp));

        let mut artifacts = vec![(current, final_path.as_path())];
        if let (Some(thumb), Some(target)) = (thumbnail, thumbnail_path.as_deref()) {
            artifacts.push((thumb, target));
        }
        copy_artifacts(&artifacts)
            .await
            .map_err(|e| StageFailure::new(PipelineStage::Complete, e))?;

        let metadata = match self.probe_port.probe_media(&final_path).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = %final_path.display(), "Could not probe final output: {}", e);
                None
            }
        };

        Ok(PipelineResult {
            success: true,
            output_path: Some(final_path),
            thumbnail_path,
            metadata,
            stages: Vec::new(),
            error: None,
        })
    }
}

/// Copy each `(from, to)` pair in order. On failure every target touched so
/// far is removed, including one a failed copy may have left half written.
async fn copy_artifacts(artifacts: &[(&Path, &Path)]) -> Result<(), DomainError> {
    let mut touched: Vec<&Path> = Vec::with_capacity(artifacts.len());
    for &(from, to) in artifacts {
        touched.push(to);
        if let Err(e) = tokio::fs::copy(from, to).await {
            remove_partial_outputs(&touched).await;
            return Err(DomainError::FsFail(format!(
                "Cannot copy {} to {}: {}",
                from.display(),
                to.display(),
                e
            )));
        }
    }
    Ok(())
}

async fn remove_partial_outputs(paths: &[&Path]) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), "Failed to remove partial output: {}", e),
        }
    }
}

#[cfg(test)]
mod tests;
