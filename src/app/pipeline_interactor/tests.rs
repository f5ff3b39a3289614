use std::sync::Mutex;

use tempfile::TempDir;

use super::*;
use crate::engine::progress::NullProgressSink;
use crate::engine::testing::{RecordingEngine, StaticProbe};
use crate::utils::path::count_files;

fn source(dir: &TempDir) -> PathBuf {
    let input = dir.path().join("source.mp4");
    std::fs::write(&input, b"source-bytes").unwrap();
    input
}

fn interactor(engine: Arc<RecordingEngine>) -> PipelineInteractor {
    PipelineInteractor::new(
        engine,
        Arc::new(StaticProbe::new(10.0, true)),
        PipelineOptions::default(),
    )
}

#[test]
fn test_plan_follows_state_machine_order() {
    let mut config = PipelineConfig::new("in.mp4");
    config.thumbnail = Some(ThumbnailStage::default());
    config.compress = Some(CompressStage::default());
    config.trim = Some(TrimStage::range(0.0, 2.0));
    config.effects = Some(EffectsStage::new(vec![EffectName::Vintage], Intensity::Light));

    let stages: Vec<PipelineStage> = StagePlan::from_config(&config)
        .iter()
        .map(StagePlan::stage)
        .collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Effects,
            PipelineStage::Trim,
            PipelineStage::Optimize,
            PipelineStage::Thumbnail
        ]
    );
}

#[test]
fn test_plan_skips_disabled_blocks() {
    let mut config = PipelineConfig::new("in.mp4");
    let mut trim = TrimStage::range(0.0, 2.0);
    trim.enabled = false;
    config.trim = Some(trim);
    config.compress = Some(CompressStage { enabled: false });

    assert!(StagePlan::from_config(&config).is_empty());
}

#[test]
fn test_plan_prefers_optimize_over_compress() {
    let mut config = PipelineConfig::new("in.mp4");
    config.optimize = Some(OptimizeStage::new(Platform::Instagram));
    config.compress = Some(CompressStage::default());

    let plans = StagePlan::from_config(&config);
    assert_eq!(plans.len(), 1);
    match &plans[0] {
        StagePlan::Encode(EncodeTarget::Platform(preset)) => {
            assert_eq!(preset.platform, Platform::Instagram)
        }
        other => panic!("unexpected plan {:?}", other),
    }
}

#[tokio::test]
async fn test_stages_chain_through_the_arena() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(RecordingEngine::default());
    let mut config = PipelineConfig::new(source(&dir)).with_output_dir(dir.path().join("out"));
    config.effects = Some(EffectsStage::new(vec![EffectName::FilmGrain], Intensity::Heavy));
    config.trim = Some(TrimStage::range(1.0, 3.0));
    config.thumbnail = Some(ThumbnailStage::default());

    let result = interactor(engine.clone()).run(&config, &NullProgressSink).await;

    assert!(result.success, "{:?}", result.error);
    let calls = engine.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].inputs(), vec![config.input_path.clone()]);
    assert_eq!(calls[1].inputs(), vec![calls[0].output_path.clone()]);
    assert_eq!(calls[2].inputs(), vec![calls[1].output_path.clone()]);

    let output = result.output_path.unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), b"trim");
    assert!(result.thumbnail_path.unwrap().exists());
    assert_eq!(result.stages.len(), 3);
    assert!(result.stages.iter().all(|s| s.success));
    assert!(result.metadata.is_some());
    // Only the final video and the thumbnail remain
    assert_eq!(count_files(&dir.path().join("out")), 2);
}

#[tokio::test]
async fn test_failed_stage_names_stage_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(RecordingEngine::failing_on("subtitles"));
    let mut config = PipelineConfig::new(source(&dir)).with_output_dir(dir.path().join("out"));
    config.trim = Some(TrimStage::range(0.0, 2.0));
    config.subtitles = Some(SubtitleStage::with_overlay("Hello"));

    let events = Mutex::new(Vec::new());
    let sink = |event: ProgressEvent| events.lock().unwrap().push(event);
    let result = interactor(engine).run(&config, &sink).await;

    assert!(!result.success);
    assert!(result.output_path.is_none());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("subtitles stage failed:"));
    assert_eq!(result.stages.len(), 2);
    assert!(result.stages[0].success);
    assert!(!result.stages[1].success);
    assert_eq!(count_files(&dir.path().join("out")), 0);

    let events = events.into_inner().unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.stage, PipelineStage::Error);
    assert_eq!(last.percent, PipelineStage::Subtitles.checkpoint());
}

#[tokio::test]
async fn test_validation_failure_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(RecordingEngine::default());
    let config = PipelineConfig::new(dir.path().join("missing.mp4"));

    let result = interactor(engine.clone()).run(&config, &NullProgressSink).await;

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("init stage failed: File not found"));
    assert!(result.stages.is_empty());
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_output_dir_defaults_to_input_directory() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(RecordingEngine::default());
    let config = PipelineConfig::new(source(&dir));

    let result = interactor(engine).run(&config, &NullProgressSink).await;

    let output = result.output_path.unwrap();
    assert_eq!(output.parent().unwrap(), dir.path());
    assert!(output
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("source_final_"));
}

#[tokio::test]
async fn test_temp_root_hosts_the_arena() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let engine = Arc::new(RecordingEngine::default());
    let options = PipelineOptions {
        temp_root: Some(scratch.path().to_path_buf()),
        ..Default::default()
    };
    let pipeline = PipelineInteractor::new(engine.clone(), Arc::new(StaticProbe::new(5.0, true)), options);
    let mut config = PipelineConfig::new(source(&dir)).with_output_dir(dir.path().join("out"));
    config.compress = Some(CompressStage::default());

    let result = pipeline.run(&config, &NullProgressSink).await;

    assert!(result.success);
    assert!(engine.calls()[0].output_path.starts_with(scratch.path()));
    assert_eq!(count_files(scratch.path()), 0);
}

#[tokio::test]
async fn test_final_copy_failure_is_attributed_to_complete() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let engine = Arc::new(RecordingEngine::silent_on("trim"));
    let mut config = PipelineConfig::new(source(&dir)).with_output_dir(&out);
    config.trim = Some(TrimStage::range(0.0, 2.0));

    let result = interactor(engine).run(&config, &NullProgressSink).await;

    assert!(!result.success);
    assert!(result.output_path.is_none());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("complete stage failed:"));
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn test_thumbnail_copy_failure_removes_final_artifact() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let engine = Arc::new(RecordingEngine::silent_on("thumbnail"));
    let mut config = PipelineConfig::new(source(&dir)).with_output_dir(&out);
    config.trim = Some(TrimStage::range(0.0, 2.0));
    config.thumbnail = Some(ThumbnailStage::default());

    let result = interactor(engine.clone()).run(&config, &NullProgressSink).await;

    assert_eq!(engine.calls().len(), 2);
    assert!(!result.success);
    assert!(result.thumbnail_path.is_none());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("complete stage failed:"));
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
}

#[tokio::test]
async fn test_copy_artifacts_removes_every_touched_target() {
    let dir = TempDir::new().unwrap();
    let video = source(&dir);
    let final_path = dir.path().join("final.mp4");
    let thumb_target = dir.path().join("thumb.jpg");
    // Stands in for a destination a failed copy left half written
    std::fs::write(&thumb_target, b"trunc").unwrap();
    let missing = dir.path().join("missing.jpg");

    let err = copy_artifacts(&[
        (video.as_path(), final_path.as_path()),
        (missing.as_path(), thumb_target.as_path()),
    ])
    .await
    .unwrap_err();

    assert!(matches!(err, DomainError::FsFail(_)));
    assert!(!final_path.exists());
    assert!(!thumb_target.exists());
    assert!(video.exists());
}
