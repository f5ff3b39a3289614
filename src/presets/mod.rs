//! Platform preset table

use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::model::Platform;

/// Output constraints for one distribution platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPreset {
    pub platform: Platform,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Video bitrate in kbit/s
    pub video_bitrate: u32,
    /// Audio bitrate in kbit/s
    pub audio_bitrate: u32,
    pub codec: &'static str,
}

impl PlatformPreset {
    /// ffmpeg encoder for the preset codec
    pub fn encoder(&self) -> &'static str {
        match self.codec {
            "h265" | "hevc" => "libx265",
            _ => "libx264",
        }
    }
}

static PRESETS: [PlatformPreset; 4] = [
    PlatformPreset {
        platform: Platform::Tiktok,
        width: 1080,
        height: 1920,
        fps: 30,
        video_bitrate: 4000,
        audio_bitrate: 128,
        codec: "h264",
    },
    PlatformPreset {
        platform: Platform::Instagram,
        width: 1080,
        height: 1920,
        fps: 30,
        video_bitrate: 3500,
        audio_bitrate: 128,
        codec: "h264",
    },
    PlatformPreset {
        platform: Platform::YoutubeShorts,
        width: 1080,
        height: 1920,
        fps: 60,
        video_bitrate: 8000,
        audio_bitrate: 192,
        codec: "h264",
    },
    PlatformPreset {
        platform: Platform::Facebook,
        width: 1080,
        height: 1920,
        fps: 30,
        video_bitrate: 2500,
        audio_bitrate: 128,
        codec: "h264",
    },
];

/// Preset for a known platform
pub fn preset(platform: Platform) -> &'static PlatformPreset {
    PRESETS
        .iter()
        .find(|preset| preset.platform == platform)
        .unwrap_or(&PRESETS[0])
}

/// Preset for a platform identifier; unknown identifiers are an error
pub fn lookup(identifier: &str) -> Result<&'static PlatformPreset, DomainError> {
    let platform: Platform = identifier.parse()?;
    Ok(preset(platform))
}

/// Every preset, in table order
pub fn all() -> &'static [PlatformPreset] {
    &PRESETS
}
