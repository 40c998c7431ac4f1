//! Core library for the animated agent orb.
//!
//! The orb is a soft, living sphere that mirrors what an assistant is doing
//! (its [`Mode`]), how the conversation feels ([`Feeling`]) and which colour
//! theme is active ([`Palette`]). State changes are eased by the
//! [`AnimationController`]; every frame the render engine turns the resulting
//! [`Snapshot`] into per-pixel colour and opacity.
//!
//! [`OrbScene`] ties the pieces together for a host: it accepts commands,
//! sentiment, audio level and pointer input and produces [`FrameInputs`] for
//! [`render_frame`].

pub mod animation;
pub mod audio;
pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod noise;
pub mod record;
pub mod render;
pub mod scene;
pub mod sentiment;
pub mod timeline;

pub use animation::{AnimationController, AnticipationKind, FlashKind, FlashState};
pub use audio::AudioLevelMeter;
pub use color::{ColorTriplet, Hsl, Rgb};
pub use command::{match_feeling, match_mode, match_palette};
pub use config::{AudioConfig, OrbConfig, RecordingSettings};
pub use error::{OrbError, Result};
pub use model::{Feeling, Mode, Palette, Snapshot};
pub use record::Recorder;
pub use render::{render_frame, FrameBuffer, FrameInputs, FrameParams, Pointer, Shade};
pub use scene::{CommandOutcome, OrbScene};
pub use sentiment::{classify, SentimentResult};
pub use timeline::{PlaybackClock, ScheduledEvent, Scheduler};
