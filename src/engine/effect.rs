//! Effects stage

use std::path::Path;

use tracing::info;

use super::{baseline_audio_args, baseline_video_args, faststart_args, StageExecutor};
use crate::domain::errors::DomainError;
use crate::domain::model::EffectsStage;
use crate::effects::map_effects;
use crate::ports::EngineInvocation;

impl StageExecutor {
    /// Apply the visual effects of `stage` to `input`, writing `output`
    pub async fn apply_effects(
        &self,
        input: &Path,
        output: &Path,
        stage: &EffectsStage,
    ) -> Result<(), DomainError> {
        if stage.effects.is_empty() {
            return Err(DomainError::ValidationFailed(
                "At least one effect is required".to_string(),
            ));
        }
        self.ensure_input(input).await?;
        self.ensure_output_dir(output).await?;

        let mapping = map_effects(&stage.effects, stage.intensity);
        let video_chain = mapping.video_chain().ok_or_else(|| {
            DomainError::InternalError("Effect mapping produced no video filters".to_string())
        })?;

        let mut invocation = EngineInvocation::new("effects", output)
            .input(input)
            .arg("-vf")
            .arg(video_chain);

        if let Some(audio_chain) = mapping.audio_chain() {
            if self.probe.probe_media(input).await?.has_audio {
                invocation = invocation.arg("-af").arg(audio_chain);
            }
        }

        let invocation = invocation
            .args(baseline_video_args())
            .args(baseline_audio_args())
            .args(faststart_args());

        info!(
            effects = ?stage.effects,
            intensity = ?stage.intensity,
            "Applying effects"
        );
        self.run(invocation).await
    }
}
