//! Thumbnail stage

use std::path::Path;

use tracing::{info, warn};

use super::encode::fit_filter;
use super::StageExecutor;
use crate::domain::errors::DomainError;
use crate::domain::model::TimeSpec;
use crate::ports::EngineInvocation;

pub const THUMBNAIL_WIDTH: u32 = 1080;
pub const THUMBNAIL_HEIGHT: u32 = 1920;

/// Timestamp actually grabbed: past the end falls back to the midpoint
pub fn clamp_timestamp(requested: f64, duration: f64) -> f64 {
    if requested >= duration {
        (duration / 2.0).max(0.0)
    } else {
        requested.max(0.0)
    }
}

impl StageExecutor {
    /// Extract one JPEG frame of `input` at `timestamp` seconds
    pub async fn thumbnail(
        &self,
        input: &Path,
        output: &Path,
        timestamp: f64,
    ) -> Result<(), DomainError> {
        self.ensure_input(input).await?;
        self.ensure_output_dir(output).await?;

        let duration = self.probe.probe_duration(input).await?;
        let at = clamp_timestamp(timestamp, duration);
        if at != timestamp {
            warn!(
                requested = timestamp,
                used = at,
                duration,
                "Thumbnail timestamp is past the end of the clip"
            );
        }

        info!(at, "Extracting thumbnail");
        let invocation = EngineInvocation::new("thumbnail", output)
            .arg("-ss")
            .arg(TimeSpec::from_seconds(at).format_hms())
            .input(input)
            .args(["-frames:v", "1"])
            .arg("-vf")
            .arg(fit_filter(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT))
            .args(["-q:v", "2"]);
        self.run(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::engine::testing::{RecordingEngine, StaticProbe};

    use super::*;

    #[test]
    fn test_clamp_timestamp() {
        assert_eq!(clamp_timestamp(1.0, 10.0), 1.0);
        assert_eq!(clamp_timestamp(12.0, 10.0), 5.0);
        assert_eq!(clamp_timestamp(10.0, 10.0), 5.0);
    }

    #[tokio::test]
    async fn test_thumbnail_invocation() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"video").unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let executor = StageExecutor::new(engine.clone(), Arc::new(StaticProbe::new(0.8, true)));

        executor
            .thumbnail(&input, &dir.path().join("thumb.jpg"), 1.0)
            .await
            .unwrap();

        let call = &engine.calls()[0];
        assert_eq!(call.label, "thumbnail");
        assert_eq!(call.value_of("-ss"), Some("00:00:00.400"));
        assert_eq!(call.value_of("-frames:v"), Some("1"));
        assert!(call.value_of("-vf").unwrap().contains("pad=1080:1920"));
        assert!(call.output_path.ends_with("thumb.jpg"));
    }
}
