//! Trim stage

use std::path::Path;

use tracing::info;

use super::{baseline_audio_args, baseline_video_args, faststart_args, StageExecutor};
use crate::domain::errors::DomainError;
use crate::domain::model::{TimeSpec, TrimStage};
use crate::domain::rules::{TrimPlan, TrimRules};
use crate::ports::EngineInvocation;

impl StageExecutor {
    /// Cut `input` down to the range described by `stage`
    ///
    /// The cut is re-encoded with the seek placed after the input so it lands
    /// on the exact requested frame.
    pub async fn trim(
        &self,
        input: &Path,
        output: &Path,
        stage: &TrimStage,
    ) -> Result<(), DomainError> {
        let plan = TrimRules::plan(stage)?;
        self.ensure_input(input).await?;
        self.ensure_output_dir(output).await?;

        let (start, duration) = match plan {
            TrimPlan::Range { .. } => plan.resolve(0.0),
            TrimPlan::Tail { .. } => {
                let total = self.probe.probe_duration(input).await?;
                plan.resolve(total)
            }
        };
        if duration <= 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "Trim of {} produces an empty clip",
                input.display()
            )));
        }

        info!(start, duration, "Trimming");
        let invocation = EngineInvocation::new("trim", output)
            .input(input)
            .arg("-ss")
            .arg(TimeSpec::from_seconds(start).format_hms())
            .arg("-t")
            .arg(TimeSpec::from_seconds(duration).format_hms())
            .args(baseline_video_args())
            .args(baseline_audio_args())
            .args(["-avoid_negative_ts", "make_zero"])
            .args(faststart_args());

        self.run(invocation).await
    }
}
