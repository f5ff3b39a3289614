// Domain rules - Validation policies applied before any engine invocation

use crate::domain::errors::*;
use crate::domain::model::*;

/// Most inputs a cross-fade merge accepts; the filter graph grows with every pair
pub const MAX_TRANSITION_CLIPS: usize = 5;

/// Resolved re-encode target of the optimize/compress block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Platform(Platform),
    Compress,
}

/// Business rules for choosing the encode target
pub struct OutputTargetSelector;

impl OutputTargetSelector {
    /// Optimize wins when both optimize and compress are enabled
    pub fn select(config: &PipelineConfig) -> Option<OutputTarget> {
        let optimize = config.optimize.as_ref().filter(|stage| stage.enabled);
        let compress = config.compress.as_ref().filter(|stage| stage.enabled);

        match (optimize, compress) {
            (Some(optimize), Some(_)) => {
                tracing::warn!(
                    platform = %optimize.platform,
                    "Both optimize and compress are enabled; honoring optimize"
                );
                Some(OutputTarget::Platform(optimize.platform))
            }
            (Some(optimize), None) => Some(OutputTarget::Platform(optimize.platform)),
            (None, Some(_)) => Some(OutputTarget::Compress),
            (None, None) => None,
        }
    }
}

/// Concrete cut derived from a trim block
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrimPlan {
    /// Cut `duration` seconds from `start`
    Range { start: f64, duration: f64 },
    /// Keep the last `seconds`; the start needs the probed input duration
    Tail { seconds: f64 },
}

impl TrimPlan {
    /// Resolve a tail plan against the total input duration
    pub fn resolve(&self, total_duration: f64) -> (f64, f64) {
        match *self {
            TrimPlan::Range { start, duration } => (start, duration),
            TrimPlan::Tail { seconds } => {
                let start = (total_duration - seconds).max(0.0);
                (start, total_duration - start)
            }
        }
    }
}

/// Business rules for trim blocks
pub struct TrimRules;

impl TrimRules {
    pub fn plan(stage: &TrimStage) -> Result<TrimPlan, DomainError> {
        if let Some(seconds) = stage.last_seconds {
            if stage.start.is_some() || stage.end.is_some() || stage.duration.is_some() {
                return Err(DomainError::ValidationFailed(
                    "lastSeconds cannot be combined with start, end or duration".to_string(),
                ));
            }
            if seconds <= 0.0 || !seconds.is_finite() {
                return Err(DomainError::ValidationFailed(format!(
                    "lastSeconds must be positive, got {}",
                    seconds
                )));
            }
            return Ok(TrimPlan::Tail { seconds });
        }

        let start = stage.start.map(|t| t.seconds).unwrap_or(0.0);
        let duration = match (stage.end, stage.duration) {
            (Some(_), Some(_)) => {
                return Err(DomainError::ValidationFailed(
                    "Trim accepts either end or duration, not both".to_string(),
                ))
            }
            (Some(end), None) => {
                if end.seconds <= start {
                    return Err(DomainError::ValidationFailed(format!(
                        "Trim end ({}) must be after start ({})",
                        end,
                        TimeSpec::from_seconds(start)
                    )));
                }
                end.seconds - start
            }
            (None, Some(duration)) => {
                if duration.seconds <= 0.0 {
                    return Err(DomainError::ValidationFailed(
                        "Trim duration must be positive".to_string(),
                    ));
                }
                duration.seconds
            }
            (None, None) => {
                return Err(DomainError::ValidationFailed(
                    "Trim requires an end time, a duration, or lastSeconds".to_string(),
                ))
            }
        };

        Ok(TrimPlan::Range { start, duration })
    }
}

/// Business rules for merge requests
pub struct MergeRules;

impl MergeRules {
    /// Checks that need no probing: input count, cap, transition duration
    pub fn validate(
        input_count: usize,
        transition: TransitionMode,
        transition_duration: f64,
    ) -> Result<(), DomainError> {
        if input_count < 2 {
            return Err(DomainError::ValidationFailed(format!(
                "Merge requires at least 2 clips, got {}",
                input_count
            )));
        }

        if transition.is_crossfade() {
            if input_count > MAX_TRANSITION_CLIPS {
                return Err(DomainError::ValidationFailed(format!(
                    "Transition merges support at most {} clips, got {}",
                    MAX_TRANSITION_CLIPS, input_count
                )));
            }
            if transition_duration <= 0.0 || !transition_duration.is_finite() {
                return Err(DomainError::ValidationFailed(format!(
                    "Transition duration must be positive, got {}",
                    transition_duration
                )));
            }
        }

        Ok(())
    }
}

/// Business rules for subtitle blocks
pub struct SubtitleRules;

impl SubtitleRules {
    /// Validate cues and return them sorted by start time
    pub fn normalize_entries(entries: &[SubtitleEntry]) -> Result<Vec<SubtitleEntry>, DomainError> {
        let mut sorted = entries.to_vec();
        for entry in &sorted {
            if entry.text.trim().is_empty() {
                return Err(DomainError::ValidationFailed(
                    "Subtitle text cannot be empty".to_string(),
                ));
            }
            if entry.start < 0.0 || entry.end <= entry.start {
                return Err(DomainError::ValidationFailed(format!(
                    "Subtitle '{}' has invalid timing {}..{}",
                    entry.text, entry.start, entry.end
                )));
            }
        }

        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));
        for pair in sorted.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(DomainError::ValidationFailed(format!(
                    "Subtitles '{}' and '{}' overlap",
                    pair[0].text, pair[1].text
                )));
            }
        }

        Ok(sorted)
    }

    pub fn validate(stage: &SubtitleStage) -> Result<(), DomainError> {
        match (&stage.overlay, stage.entries.is_empty()) {
            (Some(_), false) => Err(DomainError::ValidationFailed(
                "Subtitles accept either timed entries or a text overlay, not both".to_string(),
            )),
            (None, true) => Err(DomainError::ValidationFailed(
                "Subtitles require at least one entry or a text overlay".to_string(),
            )),
            (Some(overlay), true) => {
                if overlay.text.trim().is_empty() {
                    return Err(DomainError::ValidationFailed(
                        "Overlay text cannot be empty".to_string(),
                    ));
                }
                if let (Some(start), Some(end)) = (overlay.start, overlay.end) {
                    if end <= start {
                        return Err(DomainError::ValidationFailed(format!(
                            "Overlay end ({}) must be after start ({})",
                            end, start
                        )));
                    }
                }
                Ok(())
            }
            (None, false) => Self::normalize_entries(&stage.entries).map(|_| ()),
        }
    }
}

/// Whole-config validation run by the sequencer before the first stage
pub struct PipelineRules;

impl PipelineRules {
    pub fn validate(config: &PipelineConfig) -> Result<(), DomainError> {
        if !config.input_path.is_file() {
            return Err(DomainError::FileNotFound(
                config.input_path.display().to_string(),
            ));
        }

        if let Some(effects) = config.effects.as_ref().filter(|s| s.enabled) {
            if effects.effects.is_empty() {
                return Err(DomainError::ValidationFailed(
                    "Effects stage is enabled but lists no effects".to_string(),
                ));
            }
        }

        if let Some(trim) = config.trim.as_ref().filter(|s| s.enabled) {
            TrimRules::plan(trim)?;
        }

        if let Some(merge) = config.merge.as_ref().filter(|s| s.enabled) {
            MergeRules::validate(
                merge.clips.len() + 1,
                merge.transition,
                merge.transition_duration,
            )?;
            if let Some(missing) = merge.clips.iter().find(|clip| !clip.is_file()) {
                return Err(DomainError::FileNotFound(missing.display().to_string()));
            }
        }

        if let Some(subtitles) = config.subtitles.as_ref().filter(|s| s.enabled) {
            SubtitleRules::validate(subtitles)?;
        }

        if let Some(thumbnail) = config.thumbnail.as_ref().filter(|s| s.enabled) {
            if thumbnail.timestamp < 0.0 || !thumbnail.timestamp.is_finite() {
                return Err(DomainError::ValidationFailed(format!(
                    "Thumbnail timestamp must be non-negative, got {}",
                    thumbnail.timestamp
                )));
            }
        }

        Ok(())
    }
}

/// Business rules for variant names
pub struct VariantRules;

impl VariantRules {
    /// Names become output directory names
    pub fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::BadArgs("Variant name cannot be empty".to_string()));
        }
        if trimmed == "." || trimmed == ".." || trimmed.contains(|c| c == '/' || c == '\\') {
            return Err(DomainError::BadArgs(format!(
                "Variant name '{}' cannot be used as a directory name",
                name
            )));
        }
        Ok(())
    }
}
