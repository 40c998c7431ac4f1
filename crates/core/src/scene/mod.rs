//! The orb as a host embeds it: one animation controller plus the latest
//! external inputs, turned into [`FrameInputs`] once per frame.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    animation::{AnimationController, FlashKind},
    command::{match_feeling, match_mode, match_palette},
    model::{Feeling, Mode, Palette},
    render::{FrameInputs, Pointer},
    sentiment::{self, SentimentResult},
};

/// Which parts of the state a command or sentiment changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub mode: Option<Mode>,
    pub feeling: Option<Feeling>,
    pub palette: Option<Palette>,
}

impl CommandOutcome {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.feeling.is_none() && self.palette.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct OrbScene {
    controller: AnimationController,
    audio_level: f32,
    pointer: Pointer,
    width: u32,
    height: u32,
    clock: SceneClock,
}

/// Frame clocks kept in `f64` and rebased to the first frame, so the `f32`
/// values handed to the renderer stay precise on long-running hosts.
#[derive(Debug, Clone, Copy, Default)]
struct SceneClock {
    epoch: Option<f64>,
    last: Option<f64>,
    anim_phase: f64,
    morph_phase: f64,
}

impl SceneClock {
    /// Advances to `now`, integrating the phases at the given speeds, and
    /// returns seconds since the first frame.
    fn advance(&mut self, now: f64, speed_scale: f32, morph_speed: f32) -> f64 {
        let epoch = *self.epoch.get_or_insert(now);
        let dt = self.last.map_or(0.0, |last| (now - last).max(0.0));
        self.last = Some(now);

        let speed = f64::from(speed_scale);
        self.anim_phase += dt * speed;
        self.morph_phase += dt * speed * f64::from(morph_speed);
        (now - epoch).max(0.0)
    }
}

impl OrbScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_controller(AnimationController::default(), width, height)
    }

    pub fn with_controller(controller: AnimationController, width: u32, height: u32) -> Self {
        Self {
            controller,
            audio_level: 0.0,
            pointer: Pointer::default(),
            width,
            height,
            clock: SceneClock::default(),
        }
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController {
        &mut self.controller
    }

    pub fn audio_level(&self) -> f32 {
        self.audio_level
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_audio_level(&mut self, level: f32) {
        self.audio_level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
    }

    pub fn set_pointer(&mut self, x: f32, y: f32, hovering: bool) {
        let unit = |v: f32| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        self.pointer = Pointer {
            x: unit(x),
            y: unit(y),
            hovering,
        };
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!(width, height, "orb surface has no area");
        }
        self.width = width;
        self.height = height;
    }

    pub fn set_target(&mut self, mode: Mode, feeling: Feeling, palette: Palette, now: f64) -> bool {
        self.controller.set_target(mode, feeling, palette, now)
    }

    pub fn flash(&mut self, kind: FlashKind, now: f64) {
        self.controller.flash(kind, now);
    }

    /// Applies a free-text command, trying palette, then feeling, then mode.
    ///
    /// Each matcher updates only its own component. Text that none of them
    /// recognise leaves the orb untouched and yields an empty outcome.
    pub fn apply_command(&mut self, text: &str, now: f64) -> CommandOutcome {
        let outcome = CommandOutcome {
            palette: match_palette(text),
            feeling: match_feeling(text),
            mode: match_mode(text),
        };
        if outcome.is_empty() {
            debug!(text, "command did not match");
            return outcome;
        }

        let c = &self.controller;
        let mode = outcome.mode.unwrap_or(c.mode());
        let feeling = outcome.feeling.unwrap_or(c.feeling());
        let palette = outcome.palette.unwrap_or(c.palette());
        self.controller.set_target(mode, feeling, palette, now);
        debug!(text, ?outcome, "command applied");
        outcome
    }

    /// Classifies `text` and adopts its feeling (and palette) when confident.
    pub fn apply_sentiment(&mut self, text: &str, now: f64) -> SentimentResult {
        let result = sentiment::classify(text);
        if !result.is_confident() {
            debug!(confidence = result.confidence, "sentiment below threshold");
            return result;
        }

        let palette = result.palette.unwrap_or(self.controller.palette());
        self.controller
            .set_target(self.controller.mode(), result.feeling, palette, now);
        result
    }

    /// Advances animation to `now` and bundles the renderer's inputs.
    ///
    /// The first call fixes the scene's epoch; `FrameInputs::time` counts
    /// from there. Motion clocks advance by the elapsed time scaled by the
    /// snapshot's current speed, so easing between feelings changes how fast
    /// the orb moves without skipping ahead.
    pub fn frame(&mut self, now: f64) -> FrameInputs {
        self.controller.update(now);
        let anticipation = self.controller.anticipation_scale(now);
        let flash = self.controller.flash_state(now);
        let snapshot = *self.controller.current();
        let elapsed = self
            .clock
            .advance(now, snapshot.speed_scale, snapshot.morph_speed);
        FrameInputs {
            time: elapsed as f32,
            anim_time: self.clock.anim_phase as f32,
            morph_phase: self.clock.morph_phase as f32,
            width: self.width,
            height: self.height,
            audio_level: self.audio_level,
            pointer: self.pointer,
            snapshot,
            colors: *self.controller.colors(),
            anticipation,
            flash,
        }
    }
}
