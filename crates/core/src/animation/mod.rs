//! Time-driven interpolation between orb states.
//!
//! [`AnimationController`] owns the interpolated [`Snapshot`] and colour
//! triplet shown on screen. A state change freezes whatever is currently
//! displayed as the origin of a fixed-length spring-eased transition, so
//! redirecting mid-flight never jumps. Mode changes additionally arm a short
//! anticipation pulse, and flashes are tracked here so the renderer only ever
//! sees plain per-frame values.
//!
//! All timestamps are monotonic seconds supplied by the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    color::{lerp_triplet_via_hsl, ColorTriplet},
    model::{Feeling, Mode, Palette, Snapshot},
};

/// Length of every state transition, in seconds.
pub const TRANSITION_DURATION: f64 = 0.5;
/// Length of an error/success flash, in seconds.
pub const FLASH_DURATION: f64 = 0.6;

/// Slack for deciding a timed effect has run its full length.
const END_TOLERANCE: f64 = 1e-9;

/// Critically damped spring response with a slight overshoot.
///
/// `spring_ease(0) == 0`; `spring_ease(1)` lands within a few thousandths of
/// one, which is fine because transitions pin to the target at the end.
#[inline]
pub fn spring_ease(t: f32) -> f32 {
    1.0 - (-6.0 * t).exp() * (2.5 * t).cos()
}

/// Shape of the micro-animation played when the mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnticipationKind {
    Contract,
    Pause,
    Burst,
}

impl AnticipationKind {
    pub fn for_mode(mode: Mode) -> Option<Self> {
        match mode {
            Mode::Thinking => Some(Self::Contract),
            Mode::Listening => Some(Self::Pause),
            Mode::Speaking => Some(Self::Burst),
            Mode::Idle => None,
        }
    }

    pub fn duration(self) -> f64 {
        match self {
            Self::Contract => 0.22,
            Self::Pause => 0.28,
            Self::Burst => 0.18,
        }
    }

    pub fn amplitude(self) -> f32 {
        match self {
            Self::Contract => -0.04,
            Self::Pause => -0.015,
            Self::Burst => 0.06,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anticipation {
    pub kind: AnticipationKind,
    pub start: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashKind {
    Error,
    Success,
}

impl std::str::FromStr for FlashKind {
    type Err = crate::OrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "success" => Ok(Self::Success),
            _ => Err(crate::OrbError::unknown("flash type", s)),
        }
    }
}

/// A flash as seen by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashState {
    pub kind: FlashKind,
    /// Fraction of the flash elapsed, in `[0, 1)`.
    pub progress: f32,
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    kind: FlashKind,
    start: f64,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    from: Snapshot,
    to: Snapshot,
    from_colors: ColorTriplet,
    to_colors: ColorTriplet,
    start: f64,
    active: bool,
}

#[derive(Debug, Clone)]
pub struct AnimationController {
    mode: Mode,
    feeling: Feeling,
    palette: Palette,
    current: Snapshot,
    colors: ColorTriplet,
    transition: Transition,
    anticipation: Option<Anticipation>,
    flash: Option<Flash>,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new(Mode::default(), Feeling::default(), Palette::default())
    }
}

impl AnimationController {
    /// Creates a controller already settled on the given state.
    pub fn new(mode: Mode, feeling: Feeling, palette: Palette) -> Self {
        let snapshot = Snapshot::target(mode, feeling);
        let colors = palette.resolve(mode);
        Self {
            mode,
            feeling,
            palette,
            current: snapshot,
            colors,
            transition: Transition {
                from: snapshot,
                to: snapshot,
                from_colors: colors,
                to_colors: colors,
                start: 0.0,
                active: false,
            },
            anticipation: None,
            flash: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn feeling(&self) -> Feeling {
        self.feeling
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Interpolated snapshot as of the last [`update`](Self::update).
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Interpolated colours as of the last [`update`](Self::update).
    pub fn colors(&self) -> &ColorTriplet {
        &self.colors
    }

    pub fn target(&self) -> &Snapshot {
        &self.transition.to
    }

    pub fn target_colors(&self) -> &ColorTriplet {
        &self.transition.to_colors
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.active
    }

    pub fn anticipation(&self) -> Option<Anticipation> {
        self.anticipation
    }

    /// Starts a transition toward `(mode, feeling, palette)`.
    ///
    /// Returns `false` when the combination is already the target.
    pub fn set_target(&mut self, mode: Mode, feeling: Feeling, palette: Palette, now: f64) -> bool {
        if mode == self.mode && feeling == self.feeling && palette == self.palette {
            return false;
        }

        let previous_mode = self.mode;
        self.transition = Transition {
            from: self.current,
            to: Snapshot::target(mode, feeling),
            from_colors: self.colors,
            to_colors: palette.resolve(mode),
            start: now,
            active: true,
        };
        self.mode = mode;
        self.feeling = feeling;
        self.palette = palette;
        debug!(%mode, %feeling, %palette, now, "orb transition started");

        if mode != previous_mode {
            if let Some(kind) = AnticipationKind::for_mode(mode) {
                debug!(?kind, from = %previous_mode, to = %mode, "anticipation armed");
                self.anticipation = Some(Anticipation { kind, start: now });
            }
        }
        true
    }

    pub fn set_mode(&mut self, mode: Mode, now: f64) -> bool {
        self.set_target(mode, self.feeling, self.palette, now)
    }

    pub fn set_feeling(&mut self, feeling: Feeling, now: f64) -> bool {
        self.set_target(self.mode, feeling, self.palette, now)
    }

    pub fn set_palette(&mut self, palette: Palette, now: f64) -> bool {
        self.set_target(self.mode, self.feeling, palette, now)
    }

    /// Advances the active transition to `now`.
    pub fn update(&mut self, now: f64) {
        let transition = &mut self.transition;
        if !transition.active {
            return;
        }

        let elapsed = now - transition.start;
        if elapsed >= TRANSITION_DURATION - END_TOLERANCE {
            transition.active = false;
            self.current = transition.to;
            self.colors = transition.to_colors;
            return;
        }

        let progress = (elapsed / TRANSITION_DURATION).clamp(0.0, 1.0);
        let t = spring_ease(progress as f32);
        self.current = transition.from.lerp(&transition.to, t);
        self.colors = lerp_triplet_via_hsl(&transition.from_colors, &transition.to_colors, t);
    }

    /// Multiplicative scale from the active anticipation pulse, or `1.0`.
    ///
    /// An expired pulse is cleared on the call that observes its end.
    pub fn anticipation_scale(&mut self, now: f64) -> f32 {
        let Some(pulse) = self.anticipation else {
            return 1.0;
        };

        let elapsed = now - pulse.start;
        let duration = pulse.kind.duration();
        if elapsed >= duration - END_TOLERANCE {
            self.anticipation = None;
            return 1.0;
        }
        let t = (elapsed / duration).clamp(0.0, 1.0);
        1.0 + pulse.kind.amplitude() * (t as f32 * std::f32::consts::PI).sin()
    }

    pub fn flash(&mut self, kind: FlashKind, now: f64) {
        debug!(?kind, now, "flash armed");
        self.flash = Some(Flash { kind, start: now });
    }

    /// Current flash, if one is still running at `now`.
    pub fn flash_state(&mut self, now: f64) -> Option<FlashState> {
        let flash = self.flash?;
        let elapsed = now - flash.start;
        if elapsed >= FLASH_DURATION - END_TOLERANCE {
            self.flash = None;
            return None;
        }
        let progress = (elapsed / FLASH_DURATION).clamp(0.0, 1.0);
        Some(FlashState {
            kind: flash.kind,
            progress: progress as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_ease_endpoints() {
        assert_eq!(spring_ease(0.0), 0.0);
        let end = spring_ease(1.0);
        assert!((end - 1.0).abs() < 2.5e-3, "ease(1) = {end}");
    }

    #[test]
    fn spring_ease_rises_quickly() {
        assert!(spring_ease(0.25) > 0.7);
        assert!(spring_ease(0.1) < spring_ease(0.2));
    }

    #[test]
    fn transition_pins_exactly_to_target() {
        let mut orb = AnimationController::new(Mode::Idle, Feeling::Neutral, Palette::ModeDefault);
        orb.set_target(Mode::Speaking, Feeling::Delight, Palette::DawnLight, 10.0);
        orb.update(10.2);
        assert!(orb.is_transitioning());
        assert_ne!(*orb.current(), *orb.target());

        orb.update(10.0 + TRANSITION_DURATION + 1e-6);
        assert!(!orb.is_transitioning());
        assert_eq!(*orb.current(), Snapshot::target(Mode::Speaking, Feeling::Delight));
        assert_eq!(*orb.colors(), Palette::DawnLight.colors().unwrap());
    }

    #[test]
    fn redirect_starts_from_interpolated_values() {
        let mut orb = AnimationController::default();
        orb.set_target(Mode::Thinking, Feeling::Focus, Palette::ModeDefault, 0.0);
        orb.update(0.1);
        let mid = *orb.current();
        let mid_colors = *orb.colors();

        orb.set_target(Mode::Listening, Feeling::Calm, Palette::GlenGreen, 0.1);
        // Sampling at the new start shows exactly what was on screen.
        orb.update(0.1);
        assert_eq!(*orb.current(), mid);
        for (now, before) in orb.colors().iter().zip(mid_colors) {
            assert!((now.r - before.r).abs() < 1e-4);
            assert!((now.g - before.g).abs() < 1e-4);
            assert!((now.b - before.b).abs() < 1e-4);
        }
    }

    #[test]
    fn unchanged_target_is_a_no_op() {
        let mut orb = AnimationController::default();
        assert!(!orb.set_target(Mode::Idle, Feeling::Neutral, Palette::ModeDefault, 1.0));
        assert!(!orb.is_transitioning());
        assert!(orb.anticipation().is_none());
    }

    #[test]
    fn thinking_arms_a_contract_pulse() {
        let mut orb = AnimationController::default();
        orb.set_mode(Mode::Thinking, 5.0);
        let pulse = orb.anticipation().expect("pulse armed");
        assert_eq!(pulse.kind, AnticipationKind::Contract);

        let duration = AnticipationKind::Contract.duration();
        assert_eq!(orb.anticipation_scale(5.0), 1.0);
        assert!(orb.anticipation_scale(5.0 + duration * 0.5) < 1.0);
        assert_eq!(orb.anticipation_scale(5.0 + duration), 1.0);
        assert!(orb.anticipation().is_none(), "expired pulse is cleared");
    }

    #[test]
    fn effects_end_exactly_at_their_duration() {
        for (kind, start) in [
            (AnticipationKind::Contract, 5.0),
            (AnticipationKind::Pause, 0.1),
            (AnticipationKind::Burst, 1234.567),
        ] {
            let mut orb = AnimationController::default();
            orb.anticipation = Some(Anticipation { kind, start });
            assert_eq!(orb.anticipation_scale(start + kind.duration()), 1.0);
            assert!(orb.anticipation().is_none(), "{kind:?} pulse not cleared");
        }

        let mut orb = AnimationController::default();
        for start in [0.7, 3.3, 987.654] {
            orb.flash(FlashKind::Success, start);
            assert!(orb.flash_state(start + FLASH_DURATION).is_none());
        }

        orb.set_target(Mode::Thinking, Feeling::Focus, Palette::ModeDefault, 0.1);
        orb.update(0.1 + TRANSITION_DURATION);
        assert!(!orb.is_transitioning());
        assert_eq!(*orb.current(), *orb.target());
    }

    #[test]
    fn pulse_kinds_follow_the_new_mode() {
        let mut orb = AnimationController::default();
        orb.set_mode(Mode::Listening, 0.0);
        assert_eq!(orb.anticipation().unwrap().kind, AnticipationKind::Pause);
        orb.set_mode(Mode::Speaking, 0.1);
        assert_eq!(orb.anticipation().unwrap().kind, AnticipationKind::Burst);
        let peak = orb.anticipation_scale(0.1 + AnticipationKind::Burst.duration() * 0.5);
        assert!((peak - 1.06).abs() < 1e-4);
    }

    #[test]
    fn idle_and_feeling_changes_do_not_arm_pulses() {
        let mut orb = AnimationController::new(Mode::Speaking, Feeling::Neutral, Palette::ModeDefault);
        orb.set_mode(Mode::Idle, 0.0);
        assert!(orb.anticipation().is_none());
        orb.set_feeling(Feeling::Warmth, 0.1);
        orb.set_palette(Palette::PeatEarth, 0.2);
        assert!(orb.anticipation().is_none());
    }

    #[test]
    fn flash_runs_then_clears() {
        let mut orb = AnimationController::default();
        assert!(orb.flash_state(0.0).is_none());

        orb.flash(FlashKind::Error, 2.0);
        let state = orb.flash_state(2.0 + FLASH_DURATION * 0.5).unwrap();
        assert_eq!(state.kind, FlashKind::Error);
        assert!((state.progress - 0.5).abs() < 1e-5);

        assert!(orb.flash_state(2.0 + FLASH_DURATION).is_none());
        assert!(orb.flash_state(2.0).is_none(), "cleared flash stays cleared");
    }

    #[test]
    fn flash_kind_parses() {
        assert_eq!("Success".parse::<FlashKind>().unwrap(), FlashKind::Success);
        assert!("warning".parse::<FlashKind>().is_err());
    }
}
