// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::DomainError;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Convert to Duration
    pub fn to_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds.max(0.0))
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(DomainError::BadArgs(format!(
                    "Time must be a non-negative number: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds_part) = match parts.as_slice() {
            [m, s] => (0u32, *m, *s),
            [h, m, s] => {
                let hours = h
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs(format!("Invalid hours in '{}'", trimmed)))?;
                (hours, *m, *s)
            }
            _ => {
                return Err(DomainError::BadArgs(format!(
                    "Invalid time format '{}'. Supported formats: seconds (e.g., 12.5), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                    trimmed
                )))
            }
        };

        let minutes = minutes
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid minutes in '{}'", trimmed)))?;
        let seconds_part = seconds_part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid seconds in '{}'", trimmed)))?;

        if minutes >= 60 {
            return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
        }
        if !(0.0..60.0).contains(&seconds_part) {
            return Err(DomainError::BadArgs("Seconds must be within [0, 60)".to_string()));
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds_part,
        ))
    }

    /// Format as HH:MM:SS.mmm, the form ffmpeg accepts for -ss/-t
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

impl Serialize for TimeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.seconds)
    }
}

impl<'de> Deserialize<'de> for TimeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Seconds(seconds) if seconds >= 0.0 => Ok(TimeSpec::from_seconds(seconds)),
            Raw::Seconds(seconds) => Err(serde::de::Error::custom(format!(
                "time cannot be negative: {}",
                seconds
            ))),
            Raw::Text(text) => TimeSpec::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// Visual effect applied by the effects stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectName {
    CameraShake,
    FilmGrain,
    Vintage,
    PhoneQuality,
    SelfieMode,
}

impl EffectName {
    pub const ALL: [EffectName; 5] = [
        EffectName::CameraShake,
        EffectName::FilmGrain,
        EffectName::Vintage,
        EffectName::PhoneQuality,
        EffectName::SelfieMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectName::CameraShake => "camera-shake",
            EffectName::FilmGrain => "film-grain",
            EffectName::Vintage => "vintage",
            EffectName::PhoneQuality => "phone-quality",
            EffectName::SelfieMode => "selfie-mode",
        }
    }
}

impl fmt::Display for EffectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        EffectName::ALL
            .into_iter()
            .find(|effect| effect.as_str() == normalized)
            .ok_or_else(|| {
                DomainError::BadArgs(format!(
                    "Invalid effect: {}. Valid effects: camera-shake, film-grain, vintage, phone-quality, selfie-mode",
                    s
                ))
            })
    }
}

/// Closed three-level ordinal scaling every effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Light, Intensity::Medium, Intensity::Heavy];

    /// Numeric factor applied to effect magnitudes
    pub fn factor(&self) -> f64 {
        match self {
            Intensity::Light => 0.3,
            Intensity::Medium => 0.6,
            Intensity::Heavy => 1.0,
        }
    }
}

impl FromStr for Intensity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Intensity::Light),
            "medium" => Ok(Intensity::Medium),
            "heavy" => Ok(Intensity::Heavy),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid intensity: {}. Valid levels: light, medium, heavy",
                s
            ))),
        }
    }
}

/// How merged clips are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionMode {
    #[default]
    None,
    Fade,
    Dissolve,
}

impl TransitionMode {
    /// Whether this mode renders a cross-fade filter graph
    pub fn is_crossfade(&self) -> bool {
        !matches!(self, TransitionMode::None)
    }

    /// xfade transition name
    pub fn xfade_name(&self) -> Option<&'static str> {
        match self {
            TransitionMode::None => None,
            TransitionMode::Fade => Some("fade"),
            TransitionMode::Dissolve => Some("dissolve"),
        }
    }
}

/// Vertical anchor for burned-in text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Target distribution platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Tiktok,
    Instagram,
    YoutubeShorts,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::YoutubeShorts,
        Platform::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::YoutubeShorts => "youtube-shorts",
            Platform::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Platform::ALL
            .into_iter()
            .find(|platform| platform.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownPlatform(s.to_string()))
    }
}

fn default_true() -> bool {
    true
}

fn default_transition_duration() -> f64 {
    0.5
}

fn default_thumbnail_timestamp() -> f64 {
    1.0
}

/// Effects stage block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub effects: Vec<EffectName>,
    #[serde(default)]
    pub intensity: Intensity,
}

impl EffectsStage {
    pub fn new(effects: Vec<EffectName>, intensity: Intensity) -> Self {
        Self {
            enabled: true,
            effects,
            intensity,
        }
    }
}

/// Trim stage block. Either `end` or `duration` bounds the cut, or
/// `last_seconds` alone keeps the tail of the clip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub start: Option<TimeSpec>,
    #[serde(default)]
    pub end: Option<TimeSpec>,
    #[serde(default)]
    pub duration: Option<TimeSpec>,
    #[serde(default)]
    pub last_seconds: Option<f64>,
}

impl TrimStage {
    /// Cut `duration` seconds starting at `start`
    pub fn range(start: f64, duration: f64) -> Self {
        Self {
            enabled: true,
            start: Some(TimeSpec::from_seconds(start)),
            duration: Some(TimeSpec::from_seconds(duration)),
            ..Default::default()
        }
    }

    /// Keep only the last `seconds` of the input
    pub fn last(seconds: f64) -> Self {
        Self {
            enabled: true,
            last_seconds: Some(seconds),
            ..Default::default()
        }
    }
}

/// Merge stage block. The pipeline's current file is the first input and
/// `clips` follow it in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub clips: Vec<PathBuf>,
    #[serde(default)]
    pub transition: TransitionMode,
    #[serde(default = "default_transition_duration")]
    pub transition_duration: f64,
}

impl MergeStage {
    pub fn new(clips: Vec<PathBuf>, transition: TransitionMode) -> Self {
        Self {
            enabled: true,
            clips,
            transition,
            transition_duration: default_transition_duration(),
        }
    }
}

/// One timed subtitle cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Single drawn text, visible for the whole clip unless bounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
}

/// Flat style record shared by subtitle tracks and text overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtitleStyle {
    pub font: String,
    pub font_size: u32,
    pub color: String,
    pub outline_color: String,
    pub outline_width: u32,
    pub background: Option<String>,
    pub position: SubtitlePosition,
    pub margin_v: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_size: 24,
            color: "white".to_string(),
            outline_color: "black".to_string(),
            outline_width: 2,
            background: None,
            position: SubtitlePosition::Bottom,
            margin_v: 50,
        }
    }
}

/// Subtitle stage block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub entries: Vec<SubtitleEntry>,
    #[serde(default)]
    pub overlay: Option<TextOverlay>,
    #[serde(default)]
    pub style: SubtitleStyle,
}

impl SubtitleStage {
    pub fn with_entries(entries: Vec<SubtitleEntry>) -> Self {
        Self {
            enabled: true,
            entries,
            ..Default::default()
        }
    }

    pub fn with_overlay(text: impl Into<String>) -> Self {
        Self {
            enabled: true,
            overlay: Some(TextOverlay {
                text: text.into(),
                start: None,
                end: None,
            }),
            ..Default::default()
        }
    }
}

/// Platform re-encode block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub platform: Platform,
}

impl OptimizeStage {
    pub fn new(platform: Platform) -> Self {
        Self {
            enabled: true,
            platform,
        }
    }
}

/// Generic compression block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CompressStage {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Thumbnail block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailStage {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_thumbnail_timestamp")]
    pub timestamp: f64,
}

impl Default for ThumbnailStage {
    fn default() -> Self {
        Self {
            enabled: true,
            timestamp: default_thumbnail_timestamp(),
        }
    }
}

/// Full configuration of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub effects: Option<EffectsStage>,
    #[serde(default)]
    pub trim: Option<TrimStage>,
    #[serde(default)]
    pub merge: Option<MergeStage>,
    #[serde(default)]
    pub subtitles: Option<SubtitleStage>,
    #[serde(default)]
    pub optimize: Option<OptimizeStage>,
    #[serde(default)]
    pub compress: Option<CompressStage>,
    #[serde(default)]
    pub thumbnail: Option<ThumbnailStage>,
}

impl PipelineConfig {
    /// Config with no stage blocks
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: None,
            effects: None,
            trim: None,
            merge: None,
            subtitles: None,
            optimize: None,
            compress: None,
            thumbnail: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }
}

/// Pipeline state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Init,
    Effects,
    Trim,
    Merge,
    Subtitles,
    Optimize,
    Thumbnail,
    Complete,
    Error,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::Effects => "effects",
            PipelineStage::Trim => "trim",
            PipelineStage::Merge => "merge",
            PipelineStage::Subtitles => "subtitles",
            PipelineStage::Optimize => "optimize",
            PipelineStage::Thumbnail => "thumbnail",
            PipelineStage::Complete => "complete",
            PipelineStage::Error => "error",
        }
    }

    /// Fixed progress checkpoint reported on entry
    pub fn checkpoint(&self) -> u8 {
        match self {
            PipelineStage::Init => 0,
            PipelineStage::Effects => 10,
            PipelineStage::Trim => 25,
            PipelineStage::Merge => 40,
            PipelineStage::Subtitles => 55,
            PipelineStage::Optimize => 70,
            PipelineStage::Thumbnail => 85,
            PipelineStage::Complete => 100,
            PipelineStage::Error => 100,
        }
    }

    /// Short human-readable message reported on entry
    pub fn message(&self) -> &'static str {
        match self {
            PipelineStage::Init => "Preparing pipeline",
            PipelineStage::Effects => "Applying visual effects",
            PipelineStage::Trim => "Trimming video",
            PipelineStage::Merge => "Merging clips",
            PipelineStage::Subtitles => "Burning in subtitles",
            PipelineStage::Optimize => "Encoding for target output",
            PipelineStage::Thumbnail => "Extracting thumbnail",
            PipelineStage::Complete => "Pipeline complete",
            PipelineStage::Error => "Pipeline failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize `Duration` fields as whole milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Record of one executed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub stage: PipelineStage,
    pub success: bool,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

/// Probed properties of a media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub codec: String,
    #[serde(default)]
    pub fps: f64,
    #[serde(default)]
    pub has_audio: bool,
}

/// Terminal record of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub thumbnail_path: Option<PathBuf>,
    pub metadata: Option<MediaMetadata>,
    pub stages: Vec<StageOutcome>,
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn failure(stages: Vec<StageOutcome>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            thumbnail_path: None,
            metadata: None,
            stages,
            error: Some(error.into()),
        }
    }
}

/// One named recipe in a batch. The input path comes from the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Option<EffectsStage>,
    #[serde(default)]
    pub trim: Option<TrimStage>,
    #[serde(default)]
    pub subtitles: Option<SubtitleStage>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub thumbnail: Option<ThumbnailStage>,
}

impl VariantConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            effects: None,
            trim: None,
            subtitles: None,
            platform: None,
            compress: false,
            thumbnail: None,
        }
    }
}

/// Outcome of one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantResult {
    pub name: String,
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub thumbnail_path: Option<PathBuf>,
    pub error: Option<String>,
    #[serde(with = "duration_ms")]
    pub processing_time: Duration,
}

/// Aggregate outcome of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVariantsResult {
    pub total_variants: usize,
    pub successful_variants: usize,
    pub results: Vec<VariantResult>,
    #[serde(with = "duration_ms")]
    pub total_time: Duration,
}
