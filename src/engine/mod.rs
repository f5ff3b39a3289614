//! Stage executors
//!
//! Each executor checks its input, prepares the output directory, turns its
//! request into one engine invocation and runs it through the execute port.
//! Scratch files an executor needs (subtitle tracks, concat lists) are written
//! next to its output, which the sequencer places inside the run's work arena.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::ports::{EngineInvocation, ExecutePort, ProbePort};

pub mod effect;
pub mod encode;
pub mod merge;
pub mod progress;
pub mod subtitle;
pub mod thumbnail;
pub mod trim;

pub use encode::EncodeTarget;
pub use progress::{
    ChannelProgressSink, NullProgressSink, ProgressEvent, ProgressSink, VariantProgressSink,
};

/// Frame rate every cross-faded input is normalised to
pub const MERGE_FPS: u32 = 30;

/// Video codec arguments shared by every video-producing stage
pub(crate) fn baseline_video_args() -> [&'static str; 8] {
    [
        "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p",
    ]
}

/// Audio codec arguments shared by every video-producing stage
pub(crate) fn baseline_audio_args() -> [&'static str; 4] {
    ["-c:a", "aac", "-b:a", "128k"]
}

pub(crate) fn faststart_args() -> [&'static str; 2] {
    ["-movflags", "+faststart"]
}

/// Escape a value for the filter option parser (`\`, `:` and `'`)
pub(crate) fn escape_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote a value for the filtergraph parser so commas and brackets survive
pub(crate) fn quote_graph_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Both escaping levels for free text or paths inside a filter argument
pub(crate) fn filter_literal(value: &str) -> String {
    quote_graph_value(&escape_option_value(value))
}

/// Runs pipeline stages against the external media engine
#[derive(Clone)]
pub struct StageExecutor {
    engine: Arc<dyn ExecutePort>,
    probe: Arc<dyn ProbePort>,
}

impl StageExecutor {
    pub fn new(engine: Arc<dyn ExecutePort>, probe: Arc<dyn ProbePort>) -> Self {
        Self { engine, probe }
    }

    /// Input must be an existing regular file
    async fn ensure_input(&self, input: &Path) -> Result<(), DomainError> {
        match tokio::fs::metadata(input).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(DomainError::FileNotFound(input.display().to_string())),
        }
    }

    async fn ensure_output_dir(&self, output: &Path) -> Result<(), DomainError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::FsFail(format!(
                    "Cannot create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    async fn run(&self, invocation: EngineInvocation) -> Result<(), DomainError> {
        debug!(label = %invocation.label, output = %invocation.output_path.display(), "Running stage invocation");
        self.engine.execute(&invocation).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Port doubles shared by executor and sequencer unit tests

    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::errors::DomainError;
    use crate::domain::model::MediaMetadata;
    use crate::ports::{EngineInvocation, ExecutePort, ProbePort};

    /// Records every invocation and writes a small file at its output path
    #[derive(Default)]
    pub struct RecordingEngine {
        pub calls: Mutex<Vec<EngineInvocation>>,
        pub fail_label: Option<String>,
        /// Label that reports success without writing its output
        pub silent_label: Option<String>,
    }

    impl RecordingEngine {
        pub fn failing_on(label: &str) -> Self {
            Self {
                fail_label: Some(label.to_string()),
                ..Default::default()
            }
        }

        pub fn silent_on(label: &str) -> Self {
            Self {
                silent_label: Some(label.to_string()),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<EngineInvocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutePort for RecordingEngine {
        async fn execute(&self, invocation: &EngineInvocation) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail_label.as_deref() == Some(invocation.label.as_str()) {
                return Err(DomainError::EngineFailed(format!(
                    "{}: simulated failure",
                    invocation.label
                )));
            }
            if self.silent_label.as_deref() != Some(invocation.label.as_str()) {
                std::fs::write(&invocation.output_path, invocation.label.as_bytes())?;
            }
            Ok(())
        }
    }

    /// Answers probes from a fixed table, falling back to a default
    pub struct StaticProbe {
        pub default: MediaMetadata,
        pub by_path: HashMap<PathBuf, MediaMetadata>,
        pub calls: Mutex<usize>,
    }

    impl StaticProbe {
        pub fn new(duration: f64, has_audio: bool) -> Self {
            Self {
                default: metadata(duration, has_audio),
                by_path: HashMap::new(),
                calls: Mutex::new(0),
            }
        }

        pub fn with(mut self, path: &Path, meta: MediaMetadata) -> Self {
            self.by_path.insert(path.to_path_buf(), meta);
            self
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    pub fn metadata(duration: f64, has_audio: bool) -> MediaMetadata {
        MediaMetadata {
            duration,
            width: 1280,
            height: 720,
            file_size: 1024,
            codec: "h264".to_string(),
            fps: 30.0,
            has_audio,
        }
    }

    #[async_trait]
    impl ProbePort for StaticProbe {
        async fn probe_media(&self, file_path: &Path) -> Result<MediaMetadata, DomainError> {
            *self.calls.lock().unwrap() += 1;
            Ok(self
                .by_path
                .get(file_path)
                .cloned()
                .unwrap_or_else(|| self.default.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_option_value() {
        assert_eq!(escape_option_value("C:\\clips\\a.srt"), "C\\:\\\\clips\\\\a.srt");
        assert_eq!(escape_option_value("it's"), "it\\'s");
    }

    #[test]
    fn test_quote_graph_value() {
        assert_eq!(quote_graph_value("between(t,1,2)"), "'between(t,1,2)'");
        assert_eq!(quote_graph_value("a'b"), "'a'\\''b'");
    }

    #[test]
    fn test_filter_literal_with_colon() {
        assert_eq!(filter_literal("/tmp/x:y.srt"), "'/tmp/x\\:y.srt'");
    }
}
