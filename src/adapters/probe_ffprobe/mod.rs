//! FFprobe adapter for media file probing
//!
//! This module provides FFprobe-based media file analysis capabilities.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::adapters::exec_ffmpeg::stderr_tail;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    binary: PathBuf,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FFprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

/// Parse an ffprobe rational such as "30000/1001"
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/').unwrap_or((rate, "1"));
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Build metadata from `ffprobe -print_format json -show_format -show_streams` output
pub(crate) fn parse_probe_json(json: &str, fallback_size: u64) -> Result<MediaMetadata, DomainError> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| DomainError::ProbeFail(format!("Unreadable ffprobe output: {}", e)))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| DomainError::ProbeFail("No video stream found".to_string()))?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let format_duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    let duration = format_duration
        .or_else(|| video.duration.as_deref().and_then(|d| d.parse::<f64>().ok()))
        .ok_or_else(|| DomainError::ProbeFail("Could not determine media duration".to_string()))?;

    let file_size = probe
        .format
        .as_ref()
        .and_then(|f| f.size.as_deref())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(fallback_size);

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(0.0);

    Ok(MediaMetadata {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        file_size,
        codec: video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
        fps,
        has_audio,
    })
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaMetadata, DomainError> {
        let size = tokio::fs::metadata(file_path)
            .await
            .map_err(|_| DomainError::FileNotFound(file_path.display().to_string()))?
            .len();

        debug!(path = %file_path.display(), "Probing media");
        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::ProbeFail(format!("failed to start {}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(DomainError::ProbeFail(format!(
                "{}: {}",
                file_path.display(),
                stderr_tail(&output.stderr)
            )));
        }

        parse_probe_json(&String::from_utf8_lossy(&output.stdout), size)
    }
}
