//! Optimize/compress stage

use std::path::Path;

use tracing::info;

use super::{faststart_args, StageExecutor};
use crate::domain::errors::DomainError;
use crate::domain::rules::OutputTarget;
use crate::ports::EngineInvocation;
use crate::presets::{self, PlatformPreset};

/// Re-encode target of the optimize stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    Platform(&'static PlatformPreset),
    Compress,
}

impl From<OutputTarget> for EncodeTarget {
    fn from(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Platform(platform) => EncodeTarget::Platform(presets::preset(platform)),
            OutputTarget::Compress => EncodeTarget::Compress,
        }
    }
}

/// Letterbox into the frame without distorting the picture
pub(crate) fn fit_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1"
    )
}

/// Arguments after the input for the given target
pub fn encode_args(target: &EncodeTarget) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    match target {
        EncodeTarget::Platform(preset) => {
            args.extend(["-vf".to_string(), fit_filter(preset.width, preset.height)]);
            args.extend(["-r".to_string(), preset.fps.to_string()]);
            args.extend(
                [
                    "-c:v",
                    preset.encoder(),
                    "-preset",
                    "medium",
                    "-pix_fmt",
                    "yuv420p",
                ]
                .map(String::from),
            );
            args.extend([
                "-b:v".to_string(),
                format!("{}k", preset.video_bitrate),
                "-maxrate".to_string(),
                format!("{}k", preset.video_bitrate),
                "-bufsize".to_string(),
                format!("{}k", preset.video_bitrate * 2),
            ]);
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", preset.audio_bitrate),
                "-ar".to_string(),
                "44100".to_string(),
            ]);
        }
        EncodeTarget::Compress => {
            args.extend(
                [
                    "-c:v", "libx264", "-preset", "slow", "-crf", "28", "-pix_fmt", "yuv420p",
                    "-c:a", "aac", "-b:a", "96k",
                ]
                .map(String::from),
            );
        }
    }
    args.extend(faststart_args().map(String::from));
    args
}

impl StageExecutor {
    /// Re-encode `input` for a platform preset or for size
    pub async fn encode(
        &self,
        input: &Path,
        output: &Path,
        target: &EncodeTarget,
    ) -> Result<(), DomainError> {
        self.ensure_input(input).await?;
        self.ensure_output_dir(output).await?;

        match target {
            EncodeTarget::Platform(preset) => {
                info!(platform = %preset.platform, "Encoding for platform")
            }
            EncodeTarget::Compress => info!("Compressing output"),
        }

        let invocation = EngineInvocation::new("optimize", output)
            .input(input)
            .args(encode_args(target));
        self.run(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::domain::model::Platform;
    use crate::engine::testing::{RecordingEngine, StaticProbe};

    use super::*;

    #[test]
    fn test_platform_args() {
        let args = encode_args(&EncodeTarget::Platform(presets::preset(Platform::YoutubeShorts)));
        let joined = args.join(" ");
        assert!(joined.contains("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(joined.contains("-r 60"));
        assert!(joined.contains("-b:v 8000k -maxrate 8000k -bufsize 16000k"));
        assert!(joined.contains("-b:a 192k"));
        assert!(joined.ends_with("-movflags +faststart"));
    }

    #[test]
    fn test_compress_args() {
        let joined = encode_args(&EncodeTarget::Compress).join(" ");
        assert!(joined.contains("-preset slow -crf 28"));
        assert!(joined.contains("-b:a 96k"));
        assert!(!joined.contains("-vf"));
    }

    #[test]
    fn test_output_target_conversion() {
        let target: EncodeTarget = OutputTarget::Platform(Platform::Facebook).into();
        match target {
            EncodeTarget::Platform(preset) => assert_eq!(preset.video_bitrate, 2500),
            EncodeTarget::Compress => panic!("expected platform target"),
        }
        assert_eq!(EncodeTarget::from(OutputTarget::Compress), EncodeTarget::Compress);
    }

    #[tokio::test]
    async fn test_encode_invocation() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"video").unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let executor = StageExecutor::new(engine.clone(), Arc::new(StaticProbe::new(5.0, true)));

        executor
            .encode(
                &input,
                &dir.path().join("out/final.mp4"),
                &EncodeTarget::Platform(presets::preset(Platform::Tiktok)),
            )
            .await
            .unwrap();

        let call = &engine.calls()[0];
        assert_eq!(call.label, "optimize");
        assert_eq!(call.value_of("-r"), Some("30"));
        assert_eq!(call.value_of("-b:v"), Some("4000k"));
        assert!(dir.path().join("out/final.mp4").exists());
    }
}
