//! Effect parameter mapping
//!
//! Turns an (effect, intensity) pair into concrete numeric parameters and the
//! ffmpeg filter operations that realise them. Everything here is pure: the
//! same inputs always produce the same mapping.

use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

use crate::domain::model::{EffectName, Intensity};

/// Crop jitter at full intensity, in pixels
pub const MAX_SHAKE_PX: f64 = 5.0;
/// Additive noise strength at full intensity
pub const MAX_GRAIN_STRENGTH: f64 = 15.0;
/// Share of saturation removed by vintage at full intensity
pub const MAX_VINTAGE_DESATURATION: f64 = 0.3;
pub const MAX_PHONE_BLUR_SIGMA: f64 = 1.5;
pub const MAX_PHONE_SHARPEN: f64 = 1.0;
pub const MAX_SELFIE_BRIGHTNESS: f64 = 0.08;
pub const MAX_SELFIE_SATURATION_LIFT: f64 = 0.2;

/// One filter in an ffmpeg filter chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOp {
    pub name: &'static str,
    pub args: Vec<(&'static str, String)>,
}

impl FilterOp {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            let sep = if i == 0 { '=' } else { ':' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Render a list of filter ops as a comma-separated chain
pub fn render_chain(ops: &[FilterOp]) -> Option<String> {
    if ops.is_empty() {
        return None;
    }
    Some(
        ops.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}

/// Numeric parameters computed for one effect
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum EffectParams {
    CameraShake { jitter_px: u32 },
    FilmGrain { noise_strength: u32 },
    Vintage { desaturation: f64, vignette_angle: f64 },
    PhoneQuality { blur_sigma: f64, sharpen_amount: f64 },
    SelfieMode { brightness: f64, saturation_lift: f64 },
}

impl EffectParams {
    /// Parameter magnitudes, each growing with effect strength
    pub fn magnitudes(&self) -> Vec<f64> {
        match *self {
            EffectParams::CameraShake { jitter_px } => vec![jitter_px as f64],
            EffectParams::FilmGrain { noise_strength } => vec![noise_strength as f64],
            EffectParams::Vintage {
                desaturation,
                vignette_angle,
            } => vec![desaturation, vignette_angle],
            EffectParams::PhoneQuality {
                blur_sigma,
                sharpen_amount,
            } => vec![blur_sigma, sharpen_amount],
            EffectParams::SelfieMode {
                brightness,
                saturation_lift,
            } => vec![brightness, saturation_lift],
        }
    }
}

/// Mapped output for one or more effects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectMapping {
    pub params: Vec<EffectParams>,
    pub filter_ops: Vec<FilterOp>,
    pub audio_filter_ops: Vec<FilterOp>,
}

impl EffectMapping {
    pub fn video_chain(&self) -> Option<String> {
        render_chain(&self.filter_ops)
    }

    pub fn audio_chain(&self) -> Option<String> {
        render_chain(&self.audio_filter_ops)
    }
}

fn num(value: f64) -> String {
    format!("{:.3}", value)
}

/// Compute the parameters of a single effect at the given intensity
pub fn effect_params(effect: EffectName, intensity: Intensity) -> EffectParams {
    let factor = intensity.factor();
    match effect {
        EffectName::CameraShake => EffectParams::CameraShake {
            jitter_px: ((MAX_SHAKE_PX * factor).round() as u32).max(1),
        },
        EffectName::FilmGrain => EffectParams::FilmGrain {
            noise_strength: (MAX_GRAIN_STRENGTH * factor).round() as u32,
        },
        // A larger vignette angle darkens more of the frame, so the angle grows
        // with intensity.
        EffectName::Vintage => EffectParams::Vintage {
            desaturation: MAX_VINTAGE_DESATURATION * factor,
            vignette_angle: PI / (5.0 - factor),
        },
        EffectName::PhoneQuality => EffectParams::PhoneQuality {
            blur_sigma: MAX_PHONE_BLUR_SIGMA * factor,
            sharpen_amount: MAX_PHONE_SHARPEN * factor,
        },
        EffectName::SelfieMode => EffectParams::SelfieMode {
            brightness: MAX_SELFIE_BRIGHTNESS * factor,
            saturation_lift: MAX_SELFIE_SATURATION_LIFT * factor,
        },
    }
}

fn video_ops(params: &EffectParams) -> Vec<FilterOp> {
    match *params {
        EffectParams::CameraShake { jitter_px } => {
            let j = jitter_px;
            vec![
                FilterOp::new("crop")
                    .arg("w", format!("iw-{}", 2 * j))
                    .arg("h", format!("ih-{}", 2 * j))
                    .arg("x", format!("{j}+{j}*sin(t*12)"))
                    .arg("y", format!("{j}+{j}*cos(t*9)")),
                FilterOp::new("scale")
                    .arg("w", format!("iw+{}", 2 * j))
                    .arg("h", format!("ih+{}", 2 * j)),
            ]
        }
        EffectParams::FilmGrain { noise_strength } => vec![FilterOp::new("noise")
            .arg("alls", noise_strength.to_string())
            .arg("allf", "t+u")],
        EffectParams::Vintage {
            desaturation,
            vignette_angle,
        } => vec![
            FilterOp::new("eq").arg("saturation", num(1.0 - desaturation)),
            FilterOp::new("colorbalance")
                .arg("rs", "0.1")
                .arg("gs", "0.05")
                .arg("bs", "-0.1"),
            FilterOp::new("vignette").arg("angle", num(vignette_angle)),
        ],
        EffectParams::PhoneQuality {
            blur_sigma,
            sharpen_amount,
        } => vec![
            FilterOp::new("gblur").arg("sigma", num(blur_sigma)),
            FilterOp::new("unsharp")
                .arg("luma_msize_x", "5")
                .arg("luma_msize_y", "5")
                .arg("luma_amount", num(sharpen_amount)),
            FilterOp::new("format").arg("pix_fmts", "yuv420p"),
        ],
        EffectParams::SelfieMode {
            brightness,
            saturation_lift,
        } => vec![
            FilterOp::new("hflip"),
            FilterOp::new("eq")
                .arg("brightness", num(brightness))
                .arg("saturation", num(1.0 + saturation_lift)),
        ],
    }
}

/// Audio filters implied by the set of requested effects, in a fixed order
pub fn audio_ops(effects: &[EffectName]) -> Vec<FilterOp> {
    let set: BTreeSet<EffectName> = effects.iter().copied().collect();
    let mut ops = Vec::new();

    if set.contains(&EffectName::Vintage) {
        ops.push(FilterOp::new("volume").arg("volume", "0.9"));
    }
    if set.contains(&EffectName::PhoneQuality) {
        ops.push(FilterOp::new("highpass").arg("f", "300"));
        ops.push(FilterOp::new("lowpass").arg("f", "3400"));
    }

    ops
}

/// Map a single effect
pub fn map_effect(effect: EffectName, intensity: Intensity) -> EffectMapping {
    map_effects(&[effect], intensity)
}

/// Map several effects; video ops concatenate in the order given
pub fn map_effects(effects: &[EffectName], intensity: Intensity) -> EffectMapping {
    let params: Vec<EffectParams> = effects
        .iter()
        .map(|&effect| effect_params(effect, intensity))
        .collect();
    let filter_ops = params.iter().flat_map(video_ops).collect();

    EffectMapping {
        params,
        filter_ops,
        audio_filter_ops: audio_ops(effects),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_camera_shake_heavy() {
        let mapping = map_effect(EffectName::CameraShake, Intensity::Heavy);
        assert_eq!(mapping.params, vec![EffectParams::CameraShake { jitter_px: 5 }]);
        assert_eq!(
            mapping.video_chain().unwrap(),
            "crop=w=iw-10:h=ih-10:x=5+5*sin(t*12):y=5+5*cos(t*9),scale=w=iw+10:h=ih+10"
        );
        assert!(mapping.audio_chain().is_none());
    }

    #[test]
    fn test_film_grain_scales_linearly() {
        let strengths: Vec<EffectParams> = Intensity::ALL
            .iter()
            .map(|&i| effect_params(EffectName::FilmGrain, i))
            .collect();
        assert_eq!(
            strengths,
            vec![
                EffectParams::FilmGrain { noise_strength: 5 },
                EffectParams::FilmGrain { noise_strength: 9 },
                EffectParams::FilmGrain { noise_strength: 15 },
            ]
        );
    }

    #[test]
    fn test_vintage_filters_and_audio() {
        let mapping = map_effect(EffectName::Vintage, Intensity::Heavy);
        assert_eq!(
            mapping.video_chain().unwrap(),
            "eq=saturation=0.700,colorbalance=rs=0.1:gs=0.05:bs=-0.1,vignette=angle=0.785"
        );
        assert_eq!(mapping.audio_chain().unwrap(), "volume=volume=0.9");
    }

    #[test]
    fn test_vintage_vignette_angle_grows_with_intensity() {
        let angles: Vec<f64> = Intensity::ALL
            .iter()
            .map(|&i| match effect_params(EffectName::Vintage, i) {
                EffectParams::Vintage { vignette_angle, .. } => vignette_angle,
                other => panic!("unexpected params {:?}", other),
            })
            .collect();
        assert!(angles.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", angles);
        assert!((angles[2] - PI / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_phone_quality_forces_pixel_format() {
        let mapping = map_effect(EffectName::PhoneQuality, Intensity::Light);
        let names: Vec<&str> = mapping.filter_ops.iter().map(|op| op.name).collect();
        assert_eq!(names, vec!["gblur", "unsharp", "format"]);
        assert_eq!(mapping.filter_ops[2].to_string(), "format=pix_fmts=yuv420p");
        assert_eq!(
            mapping.audio_chain().unwrap(),
            "highpass=f=300,lowpass=f=3400"
        );
    }

    #[test]
    fn test_selfie_mode_mirrors_first() {
        let mapping = map_effect(EffectName::SelfieMode, Intensity::Medium);
        assert_eq!(mapping.filter_ops[0].to_string(), "hflip");
        assert_eq!(
            mapping.filter_ops[1].to_string(),
            "eq=brightness=0.048:saturation=1.120"
        );
    }

    #[test]
    fn test_empty_effect_list() {
        let mapping = map_effects(&[], Intensity::Heavy);
        assert!(mapping.video_chain().is_none());
        assert!(mapping.audio_chain().is_none());
    }

    fn any_effect() -> impl Strategy<Value = EffectName> {
        prop::sample::select(EffectName::ALL.to_vec())
    }

    fn any_intensity() -> impl Strategy<Value = Intensity> {
        prop::sample::select(Intensity::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_magnitudes_non_decreasing(effect in any_effect()) {
            let light = effect_params(effect, Intensity::Light).magnitudes();
            let medium = effect_params(effect, Intensity::Medium).magnitudes();
            let heavy = effect_params(effect, Intensity::Heavy).magnitudes();
            for i in 0..light.len() {
                prop_assert!(light[i] <= medium[i]);
                prop_assert!(medium[i] <= heavy[i]);
            }
        }

        #[test]
        fn prop_mapping_is_idempotent(
            effects in prop::collection::vec(any_effect(), 0..6),
            intensity in any_intensity(),
        ) {
            prop_assert_eq!(map_effects(&effects, intensity), map_effects(&effects, intensity));
        }

        #[test]
        fn prop_video_ops_concatenate_in_order(
            effects in prop::collection::vec(any_effect(), 1..6),
            intensity in any_intensity(),
        ) {
            let combined = map_effects(&effects, intensity);
            let separate: Vec<FilterOp> = effects
                .iter()
                .flat_map(|&e| map_effect(e, intensity).filter_ops)
                .collect();
            prop_assert_eq!(combined.filter_ops, separate);
        }

        #[test]
        fn prop_audio_ops_ignore_order(
            effects in prop::collection::vec(any_effect(), 0..6),
            intensity in any_intensity(),
        ) {
            let mut reversed = effects.clone();
            reversed.reverse();
            prop_assert_eq!(
                map_effects(&effects, intensity).audio_filter_ops,
                map_effects(&reversed, intensity).audio_filter_ops
            );
        }
    }
}
