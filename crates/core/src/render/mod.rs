//! Per-pixel orb rendering.
//!
//! Rendering is split into a once-per-frame [`FrameParams::prepare`] step and
//! a pure [`FrameParams::shade`] step. The first resolves everything that does
//! not depend on the pixel (breathing, drift, hue-shifted colours, sprite
//! placement); the second composites the eight layers for one pixel centre.
//! Neither step keeps state between frames.

mod layers;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use layers::{
    flash_alpha, flash_envelope, morph_field, smoothstep, star_state, Sprite, StarState,
    BLOB_COUNT, FOG_LAYERS, INNER_STARS, OUTER_STARS, STAR_COUNT, WISP_COUNT,
};

use crate::{
    animation::FlashState,
    color::{shift_triplet, ColorTriplet, Rgb},
    model::{Mode, Snapshot},
    noise::noise2d,
};

/// How far a hovering pointer pulls the orb, as a fraction of its radius.
pub const POINTER_INFLUENCE: f32 = 0.08;

pub(crate) const EPSILON: f32 = 1e-4;

const RADIUS_FRACTION: f32 = 1.0 / 3.0;
const BREATH_RATE: f32 = 0.42;
const DRIFT_RATE: f32 = 0.08;
const DRIFT_SCALE: f32 = 0.06;

const AUDIO_MORPH_GAIN: f32 = 1.5;
const AUDIO_BLOB_GAIN: f32 = 0.3;
const AUDIO_GLOW_GAIN: f32 = 0.6;

/// Normalised pointer position; `(0, 0)` is the top-left of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub x: f32,
    pub y: f32,
    pub hovering: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            hovering: false,
        }
    }
}

/// Everything the renderer reads for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Elapsed seconds.
    pub time: f32,
    /// Motion clock: elapsed seconds accumulated at the snapshot's speed
    /// scale, so easing the speed never jumps the animation.
    pub anim_time: f32,
    /// Rim drift for the morph field, `anim_time` further scaled by the
    /// snapshot's morph speed.
    pub morph_phase: f32,
    pub width: u32,
    pub height: u32,
    pub audio_level: f32,
    pub pointer: Pointer,
    pub snapshot: Snapshot,
    pub colors: ColorTriplet,
    pub anticipation: f32,
    pub flash: Option<FlashState>,
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            time: 0.0,
            anim_time: 0.0,
            morph_phase: 0.0,
            width: 0,
            height: 0,
            audio_level: 0.0,
            pointer: Pointer::default(),
            snapshot: Snapshot::default(),
            colors: Mode::default().default_colors(),
            anticipation: 1.0,
            flash: None,
        }
    }
}

impl FrameInputs {
    /// Sets every clock to `time`, as if the current snapshot had been held
    /// since zero. Handy for stills and tests; live hosts get accumulated
    /// clocks from [`OrbScene::frame`](crate::OrbScene::frame).
    pub fn at_time(mut self, time: f32) -> Self {
        self.time = time;
        self.anim_time = time * self.snapshot.speed_scale;
        self.morph_phase = self.anim_time * self.snapshot.morph_speed;
        self
    }
}

/// Colour and opacity of one pixel.
///
/// `color` is premultiplied by opacity and both are clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shade {
    pub color: Vec3,
    pub alpha: f32,
}

impl Shade {
    /// Composites this premultiplied shade over an opaque background.
    pub fn over(self, background: Rgb) -> Rgb {
        let out = self.color + background.to_vec3() * (1.0 - self.alpha);
        Rgb::from_vec3(out.clamp(Vec3::ZERO, Vec3::ONE))
    }
}

/// Running composite for one pixel: colour adds up weighted by each layer's
/// opacity, opacity keeps the maximum seen so far.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    pub(crate) color: Vec3,
    pub(crate) alpha: f32,
}

impl Accumulator {
    #[inline]
    pub(crate) fn add(&mut self, color: Vec3, alpha: f32) {
        if alpha <= 0.0 {
            return;
        }
        self.color += color * alpha;
        self.alpha = self.alpha.max(alpha);
    }

    fn finish(self) -> Shade {
        let color = if self.color.is_finite() {
            self.color.clamp(Vec3::ZERO, Vec3::ONE)
        } else {
            Vec3::ZERO
        };
        let alpha = if self.alpha.is_finite() {
            self.alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Shade { color, alpha }
    }
}

/// Frame-constant values shared by every pixel.
#[derive(Debug, Clone)]
pub struct FrameParams {
    center: Vec2,
    drift: Vec2,
    inv_throb: f32,
    pub(crate) radius: f32,
    pub(crate) time: f32,
    pub(crate) anim_time: f32,
    pub(crate) morph_phase: f32,
    pub(crate) snapshot: Snapshot,
    pub(crate) colors: [Vec3; 3],
    pub(crate) glow_color: Vec3,
    pub(crate) flash: Option<(Vec3, f32)>,
    pub(crate) wisps: [Sprite; WISP_COUNT],
    pub(crate) blobs: [Sprite; BLOB_COUNT],
    pub(crate) stars: [Sprite; STAR_COUNT],
}

impl FrameParams {
    pub fn prepare(inputs: &FrameInputs) -> Self {
        let size = Vec2::new(inputs.width as f32, inputs.height as f32);
        let radius = (size.min_element() * RADIUS_FRACTION).max(EPSILON);
        let center = size * 0.5;
        let time = finite_or(inputs.time, 0.0);
        let audio = finite_or(inputs.audio_level, 0.0).clamp(0.0, 1.0);

        let mut snapshot = inputs.snapshot;
        snapshot.morph_amplitude *= 1.0 + audio * AUDIO_MORPH_GAIN;
        snapshot.inner_glow *= 1.0 + audio * AUDIO_GLOW_GAIN;
        let blob_scale = 1.0 + audio * AUDIO_BLOB_GAIN;

        let throb = (1.0 + (time * BREATH_RATE).sin() * snapshot.breath_amplitude)
            * finite_or(inputs.anticipation, 1.0);

        let mut drift = Vec2::new(
            noise2d(time * DRIFT_RATE, 0.0),
            noise2d(0.0, time * DRIFT_RATE + 50.0),
        ) * radius
            * DRIFT_SCALE;
        if inputs.pointer.hovering {
            let pointer = Vec2::new(inputs.pointer.x, inputs.pointer.y).clamp(Vec2::ZERO, Vec2::ONE);
            drift += (pointer - Vec2::splat(0.5)) * 2.0 * radius * POINTER_INFLUENCE;
        }

        let colors = shift_triplet(&inputs.colors, snapshot.hue_shift).map(Rgb::to_vec3);
        let anim_time = finite_or(inputs.anim_time, 0.0);
        let morph_phase = finite_or(inputs.morph_phase, 0.0);

        Self {
            center,
            drift,
            inv_throb: 1.0 / throb.max(EPSILON),
            radius,
            time,
            anim_time,
            morph_phase,
            snapshot,
            colors,
            glow_color: colors[1].lerp(Vec3::ONE, 0.3),
            flash: inputs
                .flash
                .map(|f| (layers::flash_color(f.kind), flash_alpha(f.progress))),
            wisps: layers::place_wisps(anim_time, morph_phase, radius, &snapshot),
            blobs: layers::place_blobs(anim_time, radius, &snapshot, blob_scale),
            stars: layers::place_stars(anim_time, radius, &snapshot),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Orb centre in surface pixels, including drift.
    pub fn center(&self) -> Vec2 {
        self.center + self.drift
    }

    /// The snapshot after audio coupling.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Composites all layers for the pixel centre at `pixel`.
    pub fn shade(&self, pixel: Vec2) -> Shade {
        let local = (pixel - self.center - self.drift) * self.inv_throb;
        let r = local.length();
        let angle = local.y.atan2(local.x);
        let morph = layers::morph_at(angle, self.anim_time, self.morph_phase, &self.snapshot);
        let outline = (self.radius * morph).max(EPSILON);
        let rn = r / outline;

        let mut acc = Accumulator::default();
        layers::wisps(self, local, &mut acc);
        layers::fog(self, angle, rn, &mut acc);
        layers::blobs(self, local, &mut acc);
        layers::inner_glow(self, r, &mut acc);
        layers::stars(self, local, &mut acc);
        layers::grain(self, pixel, &mut acc);
        layers::flash(self, r / self.radius, &mut acc);
        layers::edge_mask(rn, &mut acc);
        acc.finish()
    }
}

#[inline]
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Row-major grid of shaded pixels.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Shade>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Shade::default(); width as usize * height as usize],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels
            .resize(width as usize * height as usize, Shade::default());
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Shade] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Shade> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Renders every pixel centre of a `width × height` frame into `buffer`,
/// resizing it when the surface size changed.
pub fn render_frame(inputs: &FrameInputs, buffer: &mut FrameBuffer) {
    if buffer.width != inputs.width || buffer.height != inputs.height {
        buffer.resize(inputs.width, inputs.height);
    }

    let params = FrameParams::prepare(inputs);
    let width = inputs.width as usize;
    for (index, pixel) in buffer.pixels.iter_mut().enumerate() {
        let x = (index % width) as f32 + 0.5;
        let y = (index / width) as f32 + 0.5;
        *pixel = params.shade(Vec2::new(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::FlashKind,
        model::{Feeling, Palette},
    };
    use proptest::prelude::*;

    fn inputs(width: u32, height: u32) -> FrameInputs {
        FrameInputs {
            width,
            height,
            ..FrameInputs::default()
        }
        .at_time(3.7)
    }

    #[test]
    fn degenerate_surfaces_render() {
        for (w, h) in [(0, 0), (1, 0), (0, 1), (1, 1), (2, 1)] {
            let mut buffer = FrameBuffer::default();
            render_frame(&inputs(w, h), &mut buffer);
            assert_eq!(buffer.pixels().len(), (w * h) as usize);
            for shade in buffer.pixels() {
                assert!(shade.color.is_finite() && shade.alpha.is_finite());
            }
        }

        // Shading an arbitrary point of an empty surface is still well defined.
        let params = FrameParams::prepare(&inputs(0, 0));
        let shade = params.shade(Vec2::new(3.0, -2.0));
        assert!(shade.color.is_finite());
        assert!((0.0..=1.0).contains(&shade.alpha));
    }

    #[test]
    fn orb_is_opaque_in_the_middle_and_clear_in_the_corners() {
        let mut buffer = FrameBuffer::new(64, 64);
        render_frame(&inputs(64, 64), &mut buffer);

        let middle = buffer.get(32, 32).unwrap();
        assert!(middle.alpha > 0.2, "centre alpha {}", middle.alpha);

        for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
            let corner = buffer.get(x, y).unwrap();
            assert_eq!(corner.alpha, 0.0);
            assert_eq!(corner.color, Vec3::ZERO);
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let frame = FrameInputs {
            audio_level: 0.4,
            pointer: Pointer {
                x: 0.8,
                y: 0.3,
                hovering: true,
            },
            ..inputs(24, 16)
        };
        let mut a = FrameBuffer::default();
        let mut b = FrameBuffer::default();
        render_frame(&frame, &mut a);
        render_frame(&frame, &mut b);
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn buffer_follows_surface_size() {
        let mut buffer = FrameBuffer::new(4, 4);
        render_frame(&inputs(10, 3), &mut buffer);
        assert_eq!((buffer.width(), buffer.height()), (10, 3));
        assert_eq!(buffer.pixels().len(), 30);
        assert!(buffer.get(10, 0).is_none());
    }

    #[test]
    fn audio_boosts_motion_and_glow() {
        let quiet = FrameParams::prepare(&inputs(32, 32));
        let loud = FrameParams::prepare(&FrameInputs {
            audio_level: 1.0,
            ..inputs(32, 32)
        });
        assert!(loud.snapshot().morph_amplitude > quiet.snapshot().morph_amplitude);
        assert!(loud.snapshot().inner_glow > quiet.snapshot().inner_glow);
        assert_eq!(quiet.snapshot(), &Snapshot::default());
    }

    #[test]
    fn hover_pulls_the_orb_toward_the_pointer() {
        let resting = FrameParams::prepare(&inputs(100, 100));
        let hovered = FrameParams::prepare(&FrameInputs {
            pointer: Pointer {
                x: 1.0,
                y: 0.5,
                hovering: true,
            },
            ..inputs(100, 100)
        });
        let shift = hovered.center() - resting.center();
        let expected = resting.radius() * POINTER_INFLUENCE;
        assert!((shift.x - expected).abs() < 1e-3);
        assert!(shift.y.abs() < 1e-4);
    }

    #[test]
    fn flash_tints_the_centre() {
        let base = inputs(48, 48);
        let flashed = FrameInputs {
            flash: Some(FlashState {
                kind: FlashKind::Error,
                progress: 0.3,
            }),
            ..base
        };
        let centre = Vec2::new(24.5, 24.5);
        let plain = FrameParams::prepare(&base).shade(centre);
        let tinted = FrameParams::prepare(&flashed).shade(centre);
        assert!(tinted.color.x > plain.color.x || tinted.color.x == 1.0);
    }

    #[test]
    fn layers_add_weighted_colour_and_keep_peak_opacity() {
        let mut acc = Accumulator::default();
        acc.add(Vec3::new(1.0, 0.0, 0.0), 0.5);
        acc.add(Vec3::new(0.0, 1.0, 0.0), 0.25);
        assert_eq!(acc.alpha, 0.5);
        assert_eq!(acc.color, Vec3::new(0.5, 0.25, 0.0));

        acc.add(Vec3::ONE, 0.0);
        acc.add(Vec3::ONE, -0.3);
        assert_eq!(acc.alpha, 0.5);
        assert_eq!(acc.color, Vec3::new(0.5, 0.25, 0.0));

        acc.add(Vec3::new(0.0, 0.0, 1.0), 0.75);
        assert_eq!(acc.alpha, 0.75);
        assert_eq!(acc.color, Vec3::new(0.5, 0.25, 0.75));
    }

    #[test]
    fn motion_follows_the_supplied_clocks() {
        let base = inputs(40, 40);
        let paused = FrameInputs {
            time: base.time + 20.0,
            ..base
        };
        // Only the wall clock moved: sprites stay put.
        let a = FrameParams::prepare(&base);
        let b = FrameParams::prepare(&paused);
        assert_eq!(a.wisps, b.wisps);
        assert_eq!(a.blobs, b.blobs);
        assert_eq!(a.stars, b.stars);

        let moved = FrameParams::prepare(&FrameInputs {
            anim_time: base.anim_time + 0.5,
            ..base
        });
        assert_ne!(a.blobs, moved.blobs);
    }

    #[test]
    fn composite_over_background() {
        let clear = Shade::default();
        assert_eq!(clear.over(Rgb::new(0.1, 0.2, 0.3)), Rgb::new(0.1, 0.2, 0.3));
        let solid = Shade {
            color: Vec3::new(0.5, 0.5, 0.5),
            alpha: 1.0,
        };
        assert_eq!(solid.over(Rgb::WHITE), Rgb::new(0.5, 0.5, 0.5));
    }

    fn any_frame() -> impl Strategy<Value = FrameInputs> {
        (
            prop::sample::select(Mode::ALL.to_vec()),
            prop::sample::select(Feeling::ALL.to_vec()),
            prop::sample::select(Palette::ALL.to_vec()),
            0.0f32..600.0,
            -0.5f32..1.5,
            (0.0f32..1.0, 0.0f32..1.0, any::<bool>()),
            0.9f32..1.1,
            prop::option::of(0.0f32..1.0),
        )
            .prop_map(
                |(mode, feeling, palette, time, audio, (x, y, hovering), anticipation, flash)| {
                    FrameInputs {
                        width: 12,
                        height: 9,
                        audio_level: audio,
                        pointer: Pointer { x, y, hovering },
                        snapshot: Snapshot::target(mode, feeling),
                        colors: palette.resolve(mode),
                        anticipation,
                        flash: flash.map(|progress| FlashState {
                            kind: FlashKind::Success,
                            progress,
                        }),
                        ..FrameInputs::default()
                    }
                    .at_time(time)
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn output_stays_in_unit_range(frame in any_frame()) {
            let mut buffer = FrameBuffer::default();
            render_frame(&frame, &mut buffer);
            for shade in buffer.pixels() {
                prop_assert!((0.0..=1.0).contains(&shade.alpha));
                prop_assert!(shade.color.cmpge(Vec3::ZERO).all());
                prop_assert!(shade.color.cmple(Vec3::ONE).all());
            }
        }
    }
}
