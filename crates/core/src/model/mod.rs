//! Discrete orb state and the constant tables behind it.
//!
//! [`Mode`], [`Feeling`] and [`Palette`] are closed enumerations. Each maps to
//! fixed data: a [`Snapshot`] for feelings, multipliers plus a default colour
//! triplet for modes, and an optional colour override for palettes. The layer
//! algorithms in [`crate::render`] are tuned to the ranges in these tables.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    color::{ColorTriplet, Rgb},
    OrbError,
};

/// The agent's live activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
}

/// Per-mode scaling applied on top of a feeling's snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeMultipliers {
    pub fog: f32,
    pub star: f32,
    pub morph: f32,
    pub morph_speed: f32,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Idle, Mode::Listening, Mode::Thinking, Mode::Speaking];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }

    pub fn multipliers(self) -> ModeMultipliers {
        match self {
            Self::Idle => ModeMultipliers {
                fog: 0.9,
                star: 0.8,
                morph: 0.8,
                morph_speed: 0.8,
            },
            Self::Listening => ModeMultipliers {
                fog: 1.0,
                star: 1.0,
                morph: 1.1,
                morph_speed: 1.0,
            },
            Self::Thinking => ModeMultipliers {
                fog: 1.2,
                star: 0.7,
                morph: 1.3,
                morph_speed: 1.4,
            },
            Self::Speaking => ModeMultipliers {
                fog: 1.1,
                star: 1.2,
                morph: 1.5,
                morph_speed: 1.25,
            },
        }
    }

    /// Colours used while the palette is [`Palette::ModeDefault`].
    pub fn default_colors(self) -> ColorTriplet {
        match self {
            Self::Idle => [
                Rgb::new(0.40, 0.55, 0.78),
                Rgb::new(0.55, 0.48, 0.80),
                Rgb::new(0.30, 0.38, 0.60),
            ],
            Self::Listening => [
                Rgb::new(0.30, 0.72, 0.78),
                Rgb::new(0.42, 0.85, 0.70),
                Rgb::new(0.25, 0.50, 0.70),
            ],
            Self::Thinking => [
                Rgb::new(0.62, 0.45, 0.88),
                Rgb::new(0.85, 0.55, 0.80),
                Rgb::new(0.42, 0.35, 0.75),
            ],
            Self::Speaking => [
                Rgb::new(0.95, 0.70, 0.40),
                Rgb::new(0.98, 0.55, 0.45),
                Rgb::new(0.80, 0.45, 0.60),
            ],
        }
    }
}

/// Emotional overlay chosen from the conversation's tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feeling {
    #[default]
    Neutral,
    Calm,
    Curiosity,
    Warmth,
    Concern,
    Delight,
    Focus,
    Playful,
}

impl Feeling {
    pub const ALL: [Feeling; 8] = [
        Feeling::Neutral,
        Feeling::Calm,
        Feeling::Curiosity,
        Feeling::Warmth,
        Feeling::Concern,
        Feeling::Delight,
        Feeling::Focus,
        Feeling::Playful,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Curiosity => "curiosity",
            Self::Warmth => "warmth",
            Self::Concern => "concern",
            Self::Delight => "delight",
            Self::Focus => "focus",
            Self::Playful => "playful",
        }
    }

    /// Base visual tuning for this feeling before mode scaling.
    pub fn properties(self) -> Snapshot {
        match self {
            Self::Neutral => Snapshot {
                hue_shift: 0.0,
                speed_scale: 1.0,
                breath_amplitude: 0.04,
                fog_density: 0.55,
                morph_amplitude: 0.06,
                morph_frequency: 2.0,
                morph_speed: 0.35,
                shimmer: 0.0,
                asymmetry: 0.0,
                star_alpha: 0.6,
                outer_star_alpha: 0.35,
                wisp_size: 0.16,
                wisp_alpha: 0.35,
                blob_alpha: 0.45,
                inner_glow: 0.35,
            },
            Self::Calm => Snapshot {
                hue_shift: -8.0,
                speed_scale: 0.7,
                breath_amplitude: 0.06,
                fog_density: 0.65,
                morph_amplitude: 0.04,
                morph_frequency: 1.6,
                morph_speed: 0.22,
                shimmer: 0.0,
                asymmetry: 0.0,
                star_alpha: 0.5,
                outer_star_alpha: 0.3,
                wisp_size: 0.18,
                wisp_alpha: 0.3,
                blob_alpha: 0.4,
                inner_glow: 0.4,
            },
            Self::Curiosity => Snapshot {
                hue_shift: 12.0,
                speed_scale: 1.15,
                breath_amplitude: 0.04,
                fog_density: 0.5,
                morph_amplitude: 0.08,
                morph_frequency: 2.6,
                morph_speed: 0.45,
                shimmer: 0.15,
                asymmetry: 0.15,
                star_alpha: 0.75,
                outer_star_alpha: 0.45,
                wisp_size: 0.15,
                wisp_alpha: 0.4,
                blob_alpha: 0.5,
                inner_glow: 0.38,
            },
            Self::Warmth => Snapshot {
                hue_shift: -20.0,
                speed_scale: 0.85,
                breath_amplitude: 0.05,
                fog_density: 0.6,
                morph_amplitude: 0.05,
                morph_frequency: 1.8,
                morph_speed: 0.3,
                shimmer: 0.05,
                asymmetry: 0.05,
                star_alpha: 0.55,
                outer_star_alpha: 0.3,
                wisp_size: 0.2,
                wisp_alpha: 0.38,
                blob_alpha: 0.55,
                inner_glow: 0.5,
            },
            Self::Concern => Snapshot {
                hue_shift: 8.0,
                speed_scale: 0.9,
                breath_amplitude: 0.03,
                fog_density: 0.7,
                morph_amplitude: 0.07,
                morph_frequency: 3.0,
                morph_speed: 0.3,
                shimmer: 0.1,
                asymmetry: 0.35,
                star_alpha: 0.4,
                outer_star_alpha: 0.2,
                wisp_size: 0.14,
                wisp_alpha: 0.3,
                blob_alpha: 0.4,
                inner_glow: 0.28,
            },
            Self::Delight => Snapshot {
                hue_shift: 25.0,
                speed_scale: 1.3,
                breath_amplitude: 0.07,
                fog_density: 0.5,
                morph_amplitude: 0.1,
                morph_frequency: 2.4,
                morph_speed: 0.55,
                shimmer: 0.3,
                asymmetry: 0.1,
                star_alpha: 0.9,
                outer_star_alpha: 0.6,
                wisp_size: 0.18,
                wisp_alpha: 0.45,
                blob_alpha: 0.6,
                inner_glow: 0.5,
            },
            Self::Focus => Snapshot {
                hue_shift: -5.0,
                speed_scale: 0.95,
                breath_amplitude: 0.02,
                fog_density: 0.45,
                morph_amplitude: 0.03,
                morph_frequency: 2.2,
                morph_speed: 0.25,
                shimmer: 0.0,
                asymmetry: 0.0,
                star_alpha: 0.65,
                outer_star_alpha: 0.25,
                wisp_size: 0.12,
                wisp_alpha: 0.28,
                blob_alpha: 0.35,
                inner_glow: 0.45,
            },
            Self::Playful => Snapshot {
                hue_shift: 35.0,
                speed_scale: 1.4,
                breath_amplitude: 0.08,
                fog_density: 0.5,
                morph_amplitude: 0.12,
                morph_frequency: 3.2,
                morph_speed: 0.6,
                shimmer: 0.25,
                asymmetry: 0.25,
                star_alpha: 0.8,
                outer_star_alpha: 0.55,
                wisp_size: 0.2,
                wisp_alpha: 0.42,
                blob_alpha: 0.58,
                inner_glow: 0.42,
            },
        }
    }
}

/// Colour theme; [`Palette::ModeDefault`] defers to the mode's own colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Palette {
    #[default]
    ModeDefault,
    HeatherMist,
    GlenGreen,
    LochGreyGreen,
    AutumnBracken,
    SilverMist,
    RowanBerry,
    MossStone,
    DawnLight,
    PeatEarth,
}

impl Palette {
    pub const ALL: [Palette; 10] = [
        Palette::ModeDefault,
        Palette::HeatherMist,
        Palette::GlenGreen,
        Palette::LochGreyGreen,
        Palette::AutumnBracken,
        Palette::SilverMist,
        Palette::RowanBerry,
        Palette::MossStone,
        Palette::DawnLight,
        Palette::PeatEarth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModeDefault => "mode-default",
            Self::HeatherMist => "heather-mist",
            Self::GlenGreen => "glen-green",
            Self::LochGreyGreen => "loch-grey-green",
            Self::AutumnBracken => "autumn-bracken",
            Self::SilverMist => "silver-mist",
            Self::RowanBerry => "rowan-berry",
            Self::MossStone => "moss-stone",
            Self::DawnLight => "dawn-light",
            Self::PeatEarth => "peat-earth",
        }
    }

    /// Fixed override colours, or `None` for [`Palette::ModeDefault`].
    pub fn colors(self) -> Option<ColorTriplet> {
        let colors = match self {
            Self::ModeDefault => return None,
            Self::HeatherMist => [
                Rgb::new(0.63, 0.52, 0.70),
                Rgb::new(0.78, 0.66, 0.80),
                Rgb::new(0.45, 0.40, 0.60),
            ],
            Self::GlenGreen => [
                Rgb::new(0.35, 0.62, 0.42),
                Rgb::new(0.55, 0.75, 0.50),
                Rgb::new(0.22, 0.45, 0.35),
            ],
            Self::LochGreyGreen => [
                Rgb::new(0.42, 0.52, 0.50),
                Rgb::new(0.58, 0.66, 0.62),
                Rgb::new(0.30, 0.40, 0.42),
            ],
            Self::AutumnBracken => [
                Rgb::new(0.80, 0.45, 0.22),
                Rgb::new(0.90, 0.62, 0.30),
                Rgb::new(0.58, 0.30, 0.18),
            ],
            Self::SilverMist => [
                Rgb::new(0.72, 0.76, 0.82),
                Rgb::new(0.86, 0.88, 0.92),
                Rgb::new(0.55, 0.60, 0.68),
            ],
            Self::RowanBerry => [
                Rgb::new(0.78, 0.22, 0.28),
                Rgb::new(0.90, 0.42, 0.36),
                Rgb::new(0.55, 0.16, 0.24),
            ],
            Self::MossStone => [
                Rgb::new(0.45, 0.52, 0.34),
                Rgb::new(0.62, 0.64, 0.52),
                Rgb::new(0.34, 0.38, 0.30),
            ],
            Self::DawnLight => [
                Rgb::new(0.98, 0.78, 0.55),
                Rgb::new(0.96, 0.60, 0.58),
                Rgb::new(0.80, 0.70, 0.90),
            ],
            Self::PeatEarth => [
                Rgb::new(0.50, 0.36, 0.26),
                Rgb::new(0.66, 0.50, 0.36),
                Rgb::new(0.34, 0.26, 0.22),
            ],
        };
        Some(colors)
    }

    /// Resolves the colours actually shown for `mode` under this palette.
    pub fn resolve(self, mode: Mode) -> ColorTriplet {
        self.colors().unwrap_or_else(|| mode.default_colors())
    }
}

/// Continuous visual tuning of the orb.
///
/// `hue_shift` is in degrees; every other field is a unitless scale tuned for
/// the render layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub hue_shift: f32,
    pub speed_scale: f32,
    pub breath_amplitude: f32,
    pub fog_density: f32,
    pub morph_amplitude: f32,
    pub morph_frequency: f32,
    pub morph_speed: f32,
    pub shimmer: f32,
    pub asymmetry: f32,
    pub star_alpha: f32,
    pub outer_star_alpha: f32,
    pub wisp_size: f32,
    pub wisp_alpha: f32,
    pub blob_alpha: f32,
    pub inner_glow: f32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Feeling::Neutral.properties()
    }
}

impl Snapshot {
    /// Builds the render target for a feeling under a mode.
    pub fn target(mode: Mode, feeling: Feeling) -> Self {
        feeling.properties().with_mode_multipliers(mode)
    }

    pub fn with_mode_multipliers(self, mode: Mode) -> Self {
        let m = mode.multipliers();
        Self {
            fog_density: self.fog_density * m.fog,
            morph_amplitude: self.morph_amplitude * m.morph,
            morph_speed: self.morph_speed * m.morph_speed,
            star_alpha: self.star_alpha * m.star,
            ..self
        }
    }

    /// Field-wise linear interpolation; `lerp(a, a, t)` is exactly `a` and
    /// `t == 1` lands exactly on `to`. Eased `t` may overshoot past one.
    pub fn lerp(&self, to: &Snapshot, t: f32) -> Snapshot {
        #[inline]
        fn mix(a: f32, b: f32, t: f32) -> f32 {
            a + (b - a) * t
        }

        if t == 1.0 {
            return *to;
        }
        Snapshot {
            hue_shift: mix(self.hue_shift, to.hue_shift, t),
            speed_scale: mix(self.speed_scale, to.speed_scale, t),
            breath_amplitude: mix(self.breath_amplitude, to.breath_amplitude, t),
            fog_density: mix(self.fog_density, to.fog_density, t),
            morph_amplitude: mix(self.morph_amplitude, to.morph_amplitude, t),
            morph_frequency: mix(self.morph_frequency, to.morph_frequency, t),
            morph_speed: mix(self.morph_speed, to.morph_speed, t),
            shimmer: mix(self.shimmer, to.shimmer, t),
            asymmetry: mix(self.asymmetry, to.asymmetry, t),
            star_alpha: mix(self.star_alpha, to.star_alpha, t),
            outer_star_alpha: mix(self.outer_star_alpha, to.outer_star_alpha, t),
            wisp_size: mix(self.wisp_size, to.wisp_size, t),
            wisp_alpha: mix(self.wisp_alpha, to.wisp_alpha, t),
            blob_alpha: mix(self.blob_alpha, to.blob_alpha, t),
            inner_glow: mix(self.inner_glow, to.inner_glow, t),
        }
    }
}

macro_rules! canonical_names {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = OrbError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| OrbError::unknown($kind, s))
            }
        }
    };
}

canonical_names!(Mode, "mode");
canonical_names!(Feeling, "feeling");
canonical_names!(Palette, "palette");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mode_multipliers_scale_only_their_fields() {
        let base = Feeling::Calm.properties();
        let scaled = base.with_mode_multipliers(Mode::Thinking);
        let m = Mode::Thinking.multipliers();

        assert_eq!(scaled.fog_density, base.fog_density * m.fog);
        assert_eq!(scaled.morph_amplitude, base.morph_amplitude * m.morph);
        assert_eq!(scaled.morph_speed, base.morph_speed * m.morph_speed);
        assert_eq!(scaled.star_alpha, base.star_alpha * m.star);
        assert_eq!(scaled.outer_star_alpha, base.outer_star_alpha);
        assert_eq!(scaled.hue_shift, base.hue_shift);
        assert_eq!(scaled.inner_glow, base.inner_glow);
    }

    #[test]
    fn mode_default_palette_defers_to_mode() {
        for mode in Mode::ALL {
            assert_eq!(Palette::ModeDefault.resolve(mode), mode.default_colors());
        }
        assert_eq!(
            Palette::MossStone.resolve(Mode::Speaking),
            Palette::MossStone.colors().unwrap()
        );
    }

    #[test]
    fn every_named_palette_has_colors() {
        for palette in Palette::ALL.into_iter().skip(1) {
            assert!(palette.colors().is_some(), "{palette} missing colours");
        }
    }

    #[test]
    fn canonical_names_round_trip() {
        for palette in Palette::ALL {
            assert_eq!(palette.as_str().parse::<Palette>().unwrap(), palette);
        }
        for feeling in Feeling::ALL {
            assert_eq!(feeling.to_string().parse::<Feeling>().unwrap(), feeling);
        }
        assert_eq!("Loch_Grey_Green".parse::<Palette>().unwrap(), Palette::LochGreyGreen);
        assert_eq!(" Thinking ".parse::<Mode>().unwrap(), Mode::Thinking);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "tartan".parse::<Palette>().unwrap_err();
        assert!(format!("{err}").contains("tartan"));
        assert!("rage".parse::<Feeling>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Palette::LochGreyGreen).unwrap();
        assert_eq!(json, "\"loch-grey-green\"");
        let mode: Mode = serde_json::from_str("\"speaking\"").unwrap();
        assert_eq!(mode, Mode::Speaking);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Snapshot::target(Mode::Idle, Feeling::Neutral);
        let b = Snapshot::target(Mode::Speaking, Feeling::Playful);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        // Spring overshoot carries through.
        let past = a.lerp(&b, 1.002);
        assert!(past.speed_scale > b.speed_scale);
    }

    fn any_snapshot() -> impl Strategy<Value = Snapshot> {
        (
            prop::sample::select(Mode::ALL.to_vec()),
            prop::sample::select(Feeling::ALL.to_vec()),
        )
            .prop_map(|(mode, feeling)| Snapshot::target(mode, feeling))
    }

    proptest! {
        #[test]
        fn lerp_with_itself_is_identity(a in any_snapshot(), t in 0.0f32..=1.0) {
            prop_assert_eq!(a.lerp(&a, t), a);
        }

        #[test]
        fn lerp_stays_between_endpoints(
            a in any_snapshot(),
            b in any_snapshot(),
            t in 0.0f32..=1.0,
        ) {
            let m = a.lerp(&b, t);
            let lo = a.fog_density.min(b.fog_density) - 1e-6;
            let hi = a.fog_density.max(b.fog_density) + 1e-6;
            prop_assert!(m.fog_density >= lo && m.fog_density <= hi);
            let lo = a.hue_shift.min(b.hue_shift) - 1e-4;
            let hi = a.hue_shift.max(b.hue_shift) + 1e-4;
            prop_assert!(m.hue_shift >= lo && m.hue_shift <= hi);
        }
    }
}
