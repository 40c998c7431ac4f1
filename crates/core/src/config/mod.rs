use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    color::Rgb,
    model::{Feeling, Mode, Palette},
    Result,
};

/// Top-level configuration for an orb session.
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    pub surface: SurfaceConfig,
    pub frame_rate: u32,
    pub initial: InitialState,
    pub audio: AudioConfig,
    pub recording: RecordingSettings,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            frame_rate: 60,
            initial: InitialState::default(),
            audio: AudioConfig::default(),
            recording: RecordingSettings::default(),
        }
    }
}

impl OrbConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "loading orb config");
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Seconds between frames, guarding against a zero frame rate.
    pub fn frame_interval(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
        }
    }
}

/// State the orb settles on before the first frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub mode: Mode,
    pub feeling: Feeling,
    pub palette: Palette,
}

/// Level meter tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub gain: f32,
    pub attack_seconds: f32,
    pub release_seconds: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            gain: 4.0,
            attack_seconds: 0.03,
            release_seconds: 0.25,
        }
    }
}

/// Configuration options for the PNG frame recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub output_dir: String,
    pub fps: u32,
    pub background: Rgb,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            output_dir: "frames".to_string(),
            fps: 30,
            background: Rgb::from_u8(12, 14, 20),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrbError;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OrbConfig::from_json_str(
            r#"{ "surface": { "width": 640 }, "initial": { "mode": "thinking", "palette": "glen-green" } }"#,
        )
        .unwrap();
        assert_eq!(config.surface.width, 640);
        assert_eq!(config.surface.height, SurfaceConfig::default().height);
        assert_eq!(config.initial.mode, Mode::Thinking);
        assert_eq!(config.initial.feeling, Feeling::Neutral);
        assert_eq!(config.initial.palette, Palette::GlenGreen);
        assert_eq!(config.frame_rate, 60);
    }

    #[test]
    fn unknown_palette_name_is_rejected() {
        let err = OrbConfig::from_json_str(r#"{ "initial": { "palette": "tartan" } }"#).unwrap_err();
        assert!(matches!(err, OrbError::Json(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orb.json");
        let mut config = OrbConfig::default();
        config.frame_rate = 24;
        config.recording.output_dir = "out".into();
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(OrbConfig::load(&path).unwrap(), config);
        assert!(OrbConfig::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn frame_interval_survives_zero_rate() {
        let config = OrbConfig {
            frame_rate: 0,
            ..OrbConfig::default()
        };
        assert_eq!(config.frame_interval(), 1.0);
    }
}
