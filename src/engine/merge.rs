//! Merge stage

use std::path::{Path, PathBuf};

use tracing::info;

use super::{
    baseline_audio_args, baseline_video_args, faststart_args, StageExecutor, MERGE_FPS,
};
use crate::domain::errors::DomainError;
use crate::domain::model::{MediaMetadata, TransitionMode};
use crate::domain::rules::MergeRules;
use crate::ports::EngineInvocation;

/// Merge request: `inputs` are joined in order
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    pub inputs: Vec<PathBuf>,
    pub transition: TransitionMode,
    pub transition_duration: f64,
}

/// One line of a concat demuxer list
fn concat_entry(path: &Path) -> String {
    format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

/// Offsets at which each xfade starts: sum of preceding durations minus the
/// overlaps consumed so far
pub fn xfade_offsets(durations: &[f64], transition_duration: f64) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(durations.len().saturating_sub(1));
    let mut cumulative = 0.0;
    for duration in durations.iter().take(durations.len().saturating_sub(1)) {
        cumulative += duration - transition_duration;
        offsets.push(cumulative);
    }
    offsets
}

/// Filter graph for a cross-faded merge. Returns the graph and whether it
/// produces an `[aout]` audio label.
pub fn build_crossfade_graph(
    inputs: &[MediaMetadata],
    transition: TransitionMode,
    transition_duration: f64,
) -> Result<(String, bool), DomainError> {
    let name = transition.xfade_name().ok_or_else(|| {
        DomainError::InternalError("Cross-fade graph requested without a transition".to_string())
    })?;
    let first = inputs
        .first()
        .ok_or_else(|| DomainError::InternalError("No merge inputs".to_string()))?;
    // libx264 with yuv420p needs even dimensions
    let width = (first.width / 2 * 2).max(2);
    let height = (first.height / 2 * 2).max(2);

    let mut filters = Vec::new();
    for i in 0..inputs.len() {
        filters.push(format!(
            "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={MERGE_FPS},format=yuv420p[v{i}]"
        ));
    }

    let durations: Vec<f64> = inputs.iter().map(|m| m.duration).collect();
    let mut prev = "[v0]".to_string();
    for (i, offset) in xfade_offsets(&durations, transition_duration)
        .into_iter()
        .enumerate()
    {
        let out = if i + 2 == inputs.len() {
            "[vout]".to_string()
        } else {
            format!("[x{}]", i + 1)
        };
        filters.push(format!(
            "{prev}[v{}]xfade=transition={name}:duration={transition_duration:.3}:offset={offset:.3}{out}",
            i + 1
        ));
        prev = out;
    }

    let with_audio = inputs.iter().all(|m| m.has_audio);
    if with_audio {
        for i in 0..inputs.len() {
            filters.push(format!(
                "[{i}:a]aresample=44100,aformat=channel_layouts=stereo[a{i}]"
            ));
        }
        let mut prev = "[a0]".to_string();
        for i in 1..inputs.len() {
            let out = if i + 1 == inputs.len() {
                "[aout]".to_string()
            } else {
                format!("[ax{}]", i)
            };
            filters.push(format!(
                "{prev}[a{i}]acrossfade=d={transition_duration:.3}{out}"
            ));
            prev = out;
        }
    }

    Ok((filters.join(";"), with_audio))
}

impl StageExecutor {
    /// Join the request inputs into `output`
    pub async fn merge(&self, request: &MergeRequest, output: &Path) -> Result<(), DomainError> {
        MergeRules::validate(
            request.inputs.len(),
            request.transition,
            request.transition_duration,
        )?;
        for input in &request.inputs {
            self.ensure_input(input).await?;
        }
        self.ensure_output_dir(output).await?;

        info!(
            clips = request.inputs.len(),
            transition = ?request.transition,
            "Merging clips"
        );

        if request.transition.is_crossfade() {
            self.merge_crossfade(request, output).await
        } else {
            self.merge_concat(request, output).await
        }
    }

    async fn merge_concat(&self, request: &MergeRequest, output: &Path) -> Result<(), DomainError> {
        let mut list = String::new();
        for input in &request.inputs {
            let absolute = tokio::fs::canonicalize(input).await.map_err(|e| {
                DomainError::FsFail(format!("Cannot resolve {}: {}", input.display(), e))
            })?;
            list.push_str(&concat_entry(&absolute));
            list.push('\n');
        }

        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, list).await.map_err(|e| {
            DomainError::FsFail(format!(
                "Cannot write concat list {}: {}",
                list_path.display(),
                e
            ))
        })?;

        let invocation = EngineInvocation::new("merge", output)
            .args(["-f", "concat", "-safe", "0"])
            .input(&list_path)
            .args(["-c", "copy"])
            .args(faststart_args());
        self.run(invocation).await
    }

    async fn merge_crossfade(
        &self,
        request: &MergeRequest,
        output: &Path,
    ) -> Result<(), DomainError> {
        let mut metadata = Vec::with_capacity(request.inputs.len());
        for input in &request.inputs {
            let meta = self.probe.probe_media(input).await?;
            if meta.duration <= request.transition_duration {
                return Err(DomainError::ValidationFailed(format!(
                    "Transition of {:.2}s is not shorter than clip {} ({:.2}s)",
                    request.transition_duration,
                    input.display(),
                    meta.duration
                )));
            }
            metadata.push(meta);
        }

        let (graph, with_audio) = build_crossfade_graph(
            &metadata,
            request.transition,
            request.transition_duration,
        )?;

        let mut invocation = EngineInvocation::new("merge", output);
        for input in &request.inputs {
            invocation = invocation.input(input);
        }
        invocation = invocation
            .arg("-filter_complex")
            .arg(graph)
            .args(["-map", "[vout]"]);
        if with_audio {
            invocation = invocation.args(["-map", "[aout]"]);
        }
        let invocation = invocation
            .args(baseline_video_args())
            .args(baseline_audio_args())
            .args(faststart_args());

        self.run(invocation).await
    }
}
