//! FFmpeg execution adapter
//!
//! Runs each engine invocation as an `ffmpeg` child process. The child is
//! killed if the awaiting future is dropped, so a caller-side timeout also
//! stops the process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::ports::*;

/// Lines of stderr kept in error messages
const STDERR_TAIL_LINES: usize = 12;

/// FFmpeg-based execution adapter
#[derive(Debug, Clone)]
pub struct FFmpegAdapter {
    binary: PathBuf,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FFmpegAdapter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Keep the last lines of engine stderr
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl ExecutePort for FFmpegAdapter {
    async fn execute(&self, invocation: &EngineInvocation) -> Result<(), DomainError> {
        let argv = invocation.to_argv();
        debug!(label = %invocation.label, args = ?argv, "Spawning ffmpeg");
        let started = Instant::now();

        let output = Command::new(&self.binary)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::EngineFailed(format!(
                    "{}: failed to start {}: {}",
                    invocation.label,
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr);
            warn!(
                label = %invocation.label,
                code = ?output.status.code(),
                "ffmpeg exited with failure"
            );
            return Err(DomainError::EngineFailed(format!(
                "{}: ffmpeg exited with code {}: {}",
                invocation.label,
                output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                tail
            )));
        }

        let produced = tokio::fs::metadata(&invocation.output_path)
            .await
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(DomainError::EngineFailed(format!(
                "{}: ffmpeg reported success but produced no output at {}",
                invocation.label,
                invocation.output_path.display()
            )));
        }

        info!(
            label = %invocation.label,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg invocation completed"
        );
        Ok(())
    }
}
