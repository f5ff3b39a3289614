//! Port doubles and helpers shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use reelforge_cli::domain::errors::DomainError;
use reelforge_cli::domain::model::MediaMetadata;
use reelforge_cli::ports::{EngineInvocation, ExecutePort, ProbePort};
use reelforge_cli::{PipelineInteractor, PipelineOptions, ProgressEvent, ProgressSink};

/// Writes each invocation's label to its output path and remembers the call
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<EngineInvocation>>,
    fail_label: Option<String>,
    silent_label: Option<String>,
    delay: Option<Duration>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(label: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_label: Some(label.to_string()),
            ..Default::default()
        })
    }

    /// Reports success for `label` without producing its output
    pub fn silent_on(label: &str) -> Arc<Self> {
        Arc::new(Self {
            silent_label: Some(label.to_string()),
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.label.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutePort for FakeEngine {
    async fn execute(&self, invocation: &EngineInvocation) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_label.as_deref() == Some(invocation.label.as_str()) {
            return Err(DomainError::EngineFailed(format!(
                "{} exited with status 1",
                invocation.label
            )));
        }
        if self.silent_label.as_deref() != Some(invocation.label.as_str()) {
            std::fs::write(&invocation.output_path, invocation.label.as_bytes())?;
        }
        Ok(())
    }
}

/// Reports the same metadata for every path
pub struct FakeProbe {
    metadata: MediaMetadata,
    calls: Mutex<usize>,
}

impl FakeProbe {
    pub fn new(duration: f64) -> Arc<Self> {
        Arc::new(Self {
            metadata: MediaMetadata {
                duration,
                width: 1920,
                height: 1080,
                file_size: 2048,
                codec: "h264".to_string(),
                fps: 30.0,
                has_audio: true,
            },
            calls: Mutex::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn probe_media(&self, _file_path: &Path) -> Result<MediaMetadata, DomainError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.metadata.clone())
    }
}

/// Collects every progress event
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn pipeline(
    engine: Arc<FakeEngine>,
    probe: Arc<FakeProbe>,
    options: PipelineOptions,
) -> PipelineInteractor {
    PipelineInteractor::new(engine, probe, options)
}

/// Write a stand-in source file and return its path
pub fn write_source(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Names of the work arenas left under `dir`
pub fn leftover_arenas(dir: &Path) -> Vec<String> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".reelforge-work-"))
        .collect()
}
