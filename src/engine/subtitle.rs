//! Subtitle stage: SubRip tracks burned in with libass, or a drawtext overlay

use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use super::{
    baseline_audio_args, baseline_video_args, faststart_args, filter_literal, quote_graph_value,
    StageExecutor,
};
use crate::domain::errors::DomainError;
use crate::domain::model::{
    SubtitleEntry, SubtitlePosition, SubtitleStage, SubtitleStyle, TextOverlay,
};
use crate::domain::rules::SubtitleRules;
use crate::ports::EngineInvocation;

/// SubRip timestamp, `HH:MM:SS,mmm`
pub fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Render cues as a SubRip document, numbered from 1
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    let mut srt = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(srt, "{}", i + 1);
        let _ = writeln!(
            srt,
            "{} --> {}",
            srt_timestamp(entry.start),
            srt_timestamp(entry.end)
        );
        let _ = writeln!(srt, "{}", entry.text.trim());
        srt.push('\n');
    }
    srt
}

/// Resolve a named colour or `#RRGGBB` to its RGB components
pub fn parse_color(color: &str) -> Result<(u8, u8, u8), DomainError> {
    let normalized = color.trim().to_lowercase();
    let rgb = match normalized.as_str() {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        hex if hex.len() == 7 && hex.starts_with('#') && hex.is_ascii() => {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| {
                    DomainError::ValidationFailed(format!("Invalid colour '{}'", color))
                })
            };
            (channel(1..3)?, channel(3..5)?, channel(5..7)?)
        }
        _ => {
            return Err(DomainError::ValidationFailed(format!(
                "Unsupported colour '{}'. Use a colour name or #RRGGBB",
                color
            )))
        }
    };
    Ok(rgb)
}

/// ASS colour literal `&HAABBGGRR`
fn ass_color(color: &str) -> Result<String, DomainError> {
    let (r, g, b) = parse_color(color)?;
    Ok(format!("&H00{:02X}{:02X}{:02X}", b, g, r))
}

/// Colour literal accepted by drawtext
fn drawtext_color(color: &str) -> Result<String, DomainError> {
    let (r, g, b) = parse_color(color)?;
    Ok(format!("0x{:02X}{:02X}{:02X}", r, g, b))
}

/// libass `force_style` override for the style record
pub fn force_style(style: &SubtitleStyle) -> Result<String, DomainError> {
    // Numpad alignment: 2 bottom centre, 5 middle, 8 top
    let alignment = match style.position {
        SubtitlePosition::Bottom => 2,
        SubtitlePosition::Center => 5,
        SubtitlePosition::Top => 8,
    };
    let mut fields = vec![
        format!("FontName={}", style.font),
        format!("FontSize={}", style.font_size),
        format!("PrimaryColour={}", ass_color(&style.color)?),
        format!("OutlineColour={}", ass_color(&style.outline_color)?),
        format!("Outline={}", style.outline_width),
        format!("Alignment={}", alignment),
        format!("MarginV={}", style.margin_v),
    ];
    match &style.background {
        Some(background) => {
            fields.push("BorderStyle=3".to_string());
            fields.push(format!("BackColour={}", ass_color(background)?));
        }
        None => fields.push("BorderStyle=1".to_string()),
    }
    Ok(fields.join(","))
}

/// `subtitles` filter burning the track at `srt_path`
pub fn subtitles_filter(srt_path: &Path, style: &SubtitleStyle) -> Result<String, DomainError> {
    Ok(format!(
        "subtitles=filename={}:force_style={}",
        filter_literal(&srt_path.to_string_lossy()),
        quote_graph_value(&force_style(style)?)
    ))
}

/// Enable expression for an overlay window `[start, end)`
fn overlay_window(overlay: &TextOverlay) -> Option<String> {
    match (overlay.start, overlay.end) {
        (Some(start), Some(end)) => Some(format!("gte(t,{start:.3})*lt(t,{end:.3})")),
        (Some(start), None) => Some(format!("gte(t,{start:.3})")),
        (None, Some(end)) => Some(format!("lt(t,{end:.3})")),
        (None, None) => None,
    }
}

/// `drawtext` filter for a single overlay
pub fn drawtext_filter(overlay: &TextOverlay, style: &SubtitleStyle) -> Result<String, DomainError> {
    let y = match style.position {
        SubtitlePosition::Top => format!("{}", style.margin_v),
        SubtitlePosition::Center => "(h-text_h)/2".to_string(),
        SubtitlePosition::Bottom => format!("h-text_h-{}", style.margin_v),
    };

    let mut filter = format!(
        "drawtext=text={}:expansion=none:font={}:fontsize={}:fontcolor={}:bordercolor={}:borderw={}:x=(w-text_w)/2:y={}",
        filter_literal(overlay.text.trim()),
        filter_literal(&style.font),
        style.font_size,
        drawtext_color(&style.color)?,
        drawtext_color(&style.outline_color)?,
        style.outline_width,
        y
    );
    if let Some(background) = &style.background {
        let _ = write!(
            filter,
            ":box=1:boxcolor={}:boxborderw=10",
            drawtext_color(background)?
        );
    }
    if let Some(window) = overlay_window(overlay) {
        let _ = write!(filter, ":enable={}", quote_graph_value(&window));
    }
    Ok(filter)
}

impl StageExecutor {
    /// Burn the subtitle block into `input`, writing `output`
    pub async fn burn_subtitles(
        &self,
        input: &Path,
        output: &Path,
        stage: &SubtitleStage,
    ) -> Result<(), DomainError> {
        SubtitleRules::validate(stage)?;
        self.ensure_input(input).await?;
        self.ensure_output_dir(output).await?;

        let filter = match &stage.overlay {
            Some(overlay) => {
                info!(text = %overlay.text, "Drawing text overlay");
                drawtext_filter(overlay, &stage.style)?
            }
            None => {
                let entries = SubtitleRules::normalize_entries(&stage.entries)?;
                let srt_path = output.with_extension("srt");
                tokio::fs::write(&srt_path, render_srt(&entries))
                    .await
                    .map_err(|e| {
                        DomainError::FsFail(format!(
                            "Cannot write subtitle track {}: {}",
                            srt_path.display(),
                            e
                        ))
                    })?;
                info!(cues = entries.len(), "Burning subtitle track");
                subtitles_filter(&srt_path, &stage.style)?
            }
        };

        let invocation = EngineInvocation::new("subtitles", output)
            .input(input)
            .arg("-vf")
            .arg(filter)
            .args(baseline_video_args())
            .args(baseline_audio_args())
            .args(faststart_args());
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
    fn test_srt_rendering() {
        let srt = render_srt(&[
            SubtitleEntry::new(0.0, 2.0, "Hello"),
            SubtitleEntry::new(2.0, 4.25, " World "),
        ]);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,000 --> 00:00:04,250\nWorld\n\n"
        );
    }

    #[test]
    fn test_srt_timestamp_rolls_over_hours() {
        assert_eq!(srt_timestamp(3723.5), "01:02:03,500");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("White").unwrap(), (255, 255, 255));
        assert_eq!(parse_color("#FF8000").unwrap(), (255, 128, 0));
        assert!(parse_color("#GG0000").is_err());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_force_style_defaults() {
        let style = force_style(&SubtitleStyle::default()).unwrap();
        assert_eq!(
            style,
            "FontName=Arial,FontSize=24,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,Outline=2,Alignment=2,MarginV=50,BorderStyle=1"
        );
    }

    #[test]
    fn test_force_style_uses_bgr_order_and_background() {
        let style = SubtitleStyle {
            color: "#FF8000".to_string(),
            background: Some("black".to_string()),
            position: SubtitlePosition::Top,
            ..Default::default()
        };
        let rendered = force_style(&style).unwrap();
        assert!(rendered.contains("PrimaryColour=&H000080FF"));
        assert!(rendered.contains("Alignment=8"));
        assert!(rendered.contains("BorderStyle=3"));
        assert!(rendered.contains("BackColour=&H00000000"));
    }

    #[test]
    fn test_subtitles_filter_quotes_path_and_style() {
        let filter =
            subtitles_filter(Path::new("/work/04-subtitles.srt"), &SubtitleStyle::default())
                .unwrap();
        assert!(filter.starts_with("subtitles=filename='/work/04-subtitles.srt':force_style='"));
        assert!(filter.ends_with("BorderStyle=1'"));
    }

    #[test]
    fn test_drawtext_window_and_escaping() {
        let overlay = TextOverlay {
            text: "Wait: it's live".to_string(),
            start: Some(1.0),
            end: Some(3.5),
        };
        let filter = drawtext_filter(&overlay, &SubtitleStyle::default()).unwrap();
        assert!(filter.starts_with("drawtext=text='Wait\\: it\\'\\''s live'"));
        assert!(filter.contains("fontcolor=0xFFFFFF"));
        assert!(filter.contains("y=h-text_h-50"));
        assert!(filter.ends_with(":enable='gte(t,1.000)*lt(t,3.500)'"));
    }

    #[test]
    fn test_drawtext_without_window_is_always_visible() {
        let overlay = TextOverlay {
            text: "Always".to_string(),
            start: None,
            end: None,
        };
        let filter = drawtext_filter(&overlay, &SubtitleStyle::default()).unwrap();
        assert!(!filter.contains("enable="));
    }

    #[tokio::test]
    async fn test_burn_entries_writes_srt_beside_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"video").unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let executor = StageExecutor::new(engine.clone(), Arc::new(StaticProbe::new(5.0, true)));
        let stage = SubtitleStage::with_entries(vec![
            SubtitleEntry::new(2.0, 4.0, "second"),
            SubtitleEntry::new(0.0, 2.0, "first"),
        ]);
        let output = dir.path().join("subbed.mp4");

        executor.burn_subtitles(&input, &output, &stage).await.unwrap();

        let srt = std::fs::read_to_string(output.with_extension("srt")).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\nfirst"));
        let call = &engine.calls()[0];
        assert!(call.value_of("-vf").unwrap().starts_with("subtitles=filename="));
    }

    #[tokio::test]
    async fn test_overlapping_entries_fail_before_engine() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"video").unwrap();
        let engine = Arc::new(RecordingEngine::default());
        let executor = StageExecutor::new(engine.clone(), Arc::new(StaticProbe::new(5.0, true)));
        let stage = SubtitleStage::with_entries(vec![
            SubtitleEntry::new(0.0, 3.0, "a"),
            SubtitleEntry::new(2.0, 4.0, "b"),
        ]);

        let err = executor
            .burn_subtitles(&input, &dir.path().join("out.mp4"), &stage)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
        assert!(engine.calls().is_empty());
    }
}
