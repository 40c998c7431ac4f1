//! The eight compositing layers.
//!
//! Element placement (wisps, blobs, stars) depends only on the element index
//! and time, so it is resolved once per frame into [`Sprite`]s. The per-pixel
//! functions below then only measure distances to those sprites and sample
//! the noise field for the fog bands.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use super::{Accumulator, FrameParams, EPSILON};
use crate::{
    animation::FlashKind,
    model::Snapshot,
    noise::{hash11, hash21, noise2d},
};

pub const WISP_COUNT: usize = 8;
pub const FOG_LAYERS: usize = 6;
pub const BLOB_COUNT: usize = 14;
pub const INNER_STARS: usize = 100;
pub const OUTER_STARS: usize = 20;
pub const STAR_COUNT: usize = INNER_STARS + OUTER_STARS;

const FLASH_PEAK: f32 = 0.3;
const FLASH_MAX_ALPHA: f32 = 0.35;
const FLASH_REACH: f32 = 1.3;

const GRAIN_TILE: f32 = 128.0;
const GRAIN_RATE: f32 = 24.0;
const GRAIN_AMOUNT: f32 = 0.02;

const EDGE_START: f32 = 1.2;
const EDGE_END: f32 = 1.5;

const WISP_SWAY: f32 = 0.8;

const BRIGHT_STAR_CHANCE: f32 = 0.06;
const STAR_HALO_SCALE: f32 = 4.0;

/// A placed element for one frame, in orb-local pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sprite {
    pub center: Vec2,
    pub size: f32,
    pub alpha: f32,
    pub slot: usize,
    pub halo: bool,
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0).max(EPSILON)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Radial scale of the orb outline at `angle`.
///
/// Two noise octaves travel around the rim, an optional high-frequency
/// shimmer rides on top, and the whole displacement is skewed by a slowly
/// rotating asymmetry term. Returns `1.0` when both amplitude and asymmetry
/// are zero.
pub fn morph_field(angle: f32, time: f32, snapshot: &Snapshot) -> f32 {
    morph_at(angle, time, time * snapshot.morph_speed, snapshot)
}

/// [`morph_field`] with the rim drift given directly rather than derived
/// from `time`, for callers that accumulate it across speed changes.
pub(crate) fn morph_at(angle: f32, time: f32, drift: f32, snapshot: &Snapshot) -> f32 {
    let (sin, cos) = angle.sin_cos();
    let freq = snapshot.morph_frequency;

    let n1 = noise2d(cos * freq + drift, sin * freq + drift * 0.7);
    let n2 = noise2d(
        cos * freq * 0.5 + drift / 3.0 + 17.0,
        sin * freq * 0.5 + drift * 0.7 / 3.0 - 9.0,
    );
    let mut displacement = 0.65 * n1 + 0.35 * n2;
    if snapshot.shimmer > 0.0 {
        displacement += snapshot.shimmer
            * 0.15
            * noise2d(cos * freq * 4.0 + drift * 3.0, sin * freq * 4.0 - drift * 2.0);
    }

    let asymmetry = 1.0 + snapshot.asymmetry * 0.12 * (angle + time * 0.21).sin();
    (1.0 + displacement * snapshot.morph_amplitude) * asymmetry
}

/// Triangular flash envelope in `[0, 1]`, peaking at 30% progress.
pub fn flash_envelope(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    if p < FLASH_PEAK {
        p / FLASH_PEAK
    } else {
        (1.0 - p) / (1.0 - FLASH_PEAK)
    }
}

/// Peak opacity of the flash overlay at `progress`.
pub fn flash_alpha(progress: f32) -> f32 {
    flash_envelope(progress) * FLASH_MAX_ALPHA
}

pub fn flash_color(kind: FlashKind) -> Vec3 {
    match kind {
        FlashKind::Error => Vec3::new(0.95, 0.32, 0.30),
        FlashKind::Success => Vec3::new(0.35, 0.9, 0.55),
    }
}

/// One star at one instant, before snapshot alpha scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarState {
    /// Offset from the orb centre, in pixels.
    pub position: Vec2,
    pub size: f32,
    /// Lifecycle envelope times twinkle, in `[0, 1]`.
    pub alpha: f32,
    pub bright: bool,
    pub outer: bool,
    pub slot: usize,
    pub lifespan: f32,
    pub generation: u32,
}

/// Resolves star `index` at `time` for an orb of `radius` pixels.
///
/// A star respawns at a new spot every `lifespan` seconds; everything about
/// its placement is derived from the index and the generation count.
pub fn star_state(index: usize, time: f32, radius: f32) -> StarState {
    let seed = index as f32 * 17.13 + 0.5;
    let outer = index >= INNER_STARS;

    let speed = 0.02 + 0.06 * hash11(seed + 0.1);
    let bright = hash11(seed + 0.2) < BRIGHT_STAR_CHANCE;
    let size_hash = hash11(seed + 0.3);
    let size = if bright {
        radius * (0.014 + 0.008 * size_hash)
    } else {
        radius * (0.006 + 0.006 * size_hash)
    };
    let lifespan = 4.0 + 6.0 * hash11(seed + 0.4);
    let twinkle_rate = 1.5 + 3.0 * hash11(seed + 0.8);
    let twinkle_phase = hash11(seed + 0.9) * TAU;
    let slot = ((hash11(seed + 1.1) * 3.0) as usize).min(2);

    let cycles = time.max(0.0) / lifespan;
    let generation = cycles.floor();
    let life = cycles - generation;
    let gen_seed = seed + generation * 100.0;

    let angle = hash11(gen_seed + 0.6) * TAU + time * speed;
    let distance = if outer {
        1.0 + 0.3 * hash11(gen_seed + 0.7)
    } else {
        hash11(gen_seed + 0.7).sqrt() * 0.95
    };

    let envelope = if life < 0.1 {
        life / 0.1
    } else if life < 0.8 {
        1.0
    } else {
        (1.0 - life) / 0.2
    };
    let twinkle = (0.4 + 0.6 * (time * twinkle_rate + twinkle_phase).sin()).max(0.0);
    let boundary = if outer {
        1.0
    } else {
        1.0 - smoothstep(0.75, 1.0, distance)
    };

    StarState {
        position: Vec2::from_angle(angle) * distance * radius,
        size,
        alpha: (envelope * twinkle * boundary).clamp(0.0, 1.0),
        bright,
        outer,
        slot,
        lifespan,
        generation: generation as u32,
    }
}

/// Wisps ride just inside the rim. Each angle wanders with its own noise and
/// sways with the morph field at its home angle; the reach follows the
/// outline at the resulting angle.
pub(crate) fn place_wisps(
    time: f32,
    morph_phase: f32,
    radius: f32,
    snapshot: &Snapshot,
) -> [Sprite; WISP_COUNT] {
    std::array::from_fn(|i| {
        let seed = i as f32 * 7.31 + 1.0;
        let base_angle = hash11(seed) * TAU;
        let distance = 0.25 + 0.35 * hash11(seed + 1.3);
        let size = snapshot.wisp_size * (0.7 + 0.6 * hash11(seed + 2.7));
        let direction = if hash11(seed + 3.7) < 0.5 { -1.0 } else { 1.0 };
        let speed = (0.05 + 0.1 * hash11(seed + 3.1)) * direction;
        let brightness = 0.6 + 0.4 * hash11(seed + 4.9);
        let slot = ((hash11(seed + 5.3) * 3.0) as usize).min(2);

        let wander = noise2d(i as f32 * 3.1, time * 0.1) * 0.6;
        let sway = morph_at(base_angle, time, morph_phase, snapshot) - 1.0;
        let angle = base_angle + time * speed + wander + sway * WISP_SWAY;
        let reach = distance * radius * morph_at(angle, time, morph_phase, snapshot);
        let pulse = 0.75 + 0.25 * (time * (0.5 + hash11(seed + 6.1)) + seed).sin();

        Sprite {
            center: Vec2::from_angle(angle) * reach,
            size: size * radius,
            alpha: snapshot.wisp_alpha * brightness * pulse,
            slot,
            halo: false,
        }
    })
}

pub(crate) fn place_blobs(
    time: f32,
    radius: f32,
    snapshot: &Snapshot,
    size_scale: f32,
) -> [Sprite; BLOB_COUNT] {
    std::array::from_fn(|i| {
        let seed = i as f32 * 13.7 + 3.0;
        let orbit = 0.15 + 0.55 * hash11(seed);
        let phase = hash11(seed + 0.5) * TAU;
        let direction = if hash11(seed + 0.9) < 0.5 { -1.0 } else { 1.0 };
        let speed = (0.08 + 0.22 * hash11(seed + 1.7)) * direction;
        let base_size = 0.18 + 0.14 * hash11(seed + 2.3);
        let wobble_rate = 0.3 + 0.4 * hash11(seed + 2.9);

        let angle = phase + time * speed + noise2d(seed, time * 0.15) * 0.5;
        let distance = orbit * (1.0 + 0.15 * noise2d(time * 0.12, seed + 31.0));
        let size = base_size * (1.0 + 0.2 * (time * wobble_rate + phase).sin()) * size_scale;
        let edge = (1.0 - distance.clamp(0.0, 1.0)).powf(1.5);

        Sprite {
            center: Vec2::from_angle(angle) * distance * radius,
            size: size * radius,
            alpha: snapshot.blob_alpha * edge,
            slot: i % 3,
            halo: false,
        }
    })
}

pub(crate) fn place_stars(time: f32, radius: f32, snapshot: &Snapshot) -> [Sprite; STAR_COUNT] {
    std::array::from_fn(|i| {
        let star = star_state(i, time, radius);
        let class_alpha = if star.outer {
            snapshot.outer_star_alpha
        } else {
            snapshot.star_alpha
        };
        Sprite {
            center: star.position,
            size: star.size,
            alpha: star.alpha * class_alpha,
            slot: star.slot,
            halo: star.bright,
        }
    })
}

pub(crate) fn wisps(params: &FrameParams, local: Vec2, acc: &mut Accumulator) {
    for wisp in &params.wisps {
        let d = local.distance(wisp.center) / wisp.size.max(EPSILON);
        // Flat core out to half the size, then a linear fade over the next 40%.
        let falloff = if d <= 0.5 {
            1.0
        } else {
            (1.0 - (d - 0.5) / 0.4).max(0.0)
        };
        acc.add(params.colors[wisp.slot], wisp.alpha * falloff);
    }
}

pub(crate) fn fog(params: &FrameParams, angle: f32, rn: f32, acc: &mut Accumulator) {
    let (sin, cos) = angle.sin_cos();
    let t = params.anim_time;
    for i in 0..FOG_LAYERS {
        let layer = i as f32;
        let base = 0.35 + 0.12 * layer;
        let n = noise2d(
            cos * 1.5 + layer * 4.7 + t * 0.05,
            sin * 1.5 + t * 0.04 * (layer + 1.0),
        );
        let band = (base * (1.0 + 0.08 * n)).max(EPSILON);
        let x = rn / band;
        let gradient = if x <= 0.6 {
            1.0
        } else {
            (1.0 - (x - 0.6) / 0.4).clamp(0.0, 1.0)
        };
        let alpha = gradient * params.snapshot.fog_density * (0.32 - 0.04 * layer);
        acc.add(params.colors[i % 3], alpha);
    }
}

pub(crate) fn blobs(params: &FrameParams, local: Vec2, acc: &mut Accumulator) {
    for blob in &params.blobs {
        let d = local.distance(blob.center) / blob.size.max(EPSILON);
        let falloff = (1.0 - d).max(0.0);
        acc.add(params.colors[blob.slot], blob.alpha * falloff * falloff);
    }
}

pub(crate) fn inner_glow(params: &FrameParams, r: f32, acc: &mut Accumulator) {
    let d = r / (params.radius * 0.55).max(EPSILON);
    let falloff = (1.0 - d).max(0.0);
    acc.add(params.glow_color, falloff * falloff * params.snapshot.inner_glow);
}

pub(crate) fn stars(params: &FrameParams, local: Vec2, acc: &mut Accumulator) {
    for star in &params.stars {
        if star.alpha <= 0.0 {
            continue;
        }
        let size = star.size.max(EPSILON);
        let reach = if star.halo { size * STAR_HALO_SCALE } else { size };
        let dist2 = local.distance_squared(star.center);
        if dist2 > reach * reach {
            continue;
        }

        let dist = dist2.sqrt();
        let core = (1.0 - dist / size).max(0.0);
        let mut intensity = core * core;
        if star.halo {
            let halo = (1.0 - dist / reach).max(0.0);
            intensity = intensity.max(halo * halo * 0.35);
        }
        let color = params.colors[star.slot].lerp(Vec3::ONE, 0.6);
        acc.add(color, star.alpha * intensity);
    }
}

/// Film grain: a hashed offset per tiled pixel, reseeded `GRAIN_RATE` times a
/// second. It touches colour only. Colour here is premultiplied, so the
/// offset is scaled by the running opacity; fully clear pixels stay clear.
pub(crate) fn grain(params: &FrameParams, pixel: Vec2, acc: &mut Accumulator) {
    let tile = Vec2::new(
        pixel.x.floor().rem_euclid(GRAIN_TILE),
        pixel.y.floor().rem_euclid(GRAIN_TILE),
    );
    let shift = (params.time * GRAIN_RATE).floor();
    let h = hash21(tile + Vec2::new(shift * 17.0, shift * 31.0));
    acc.color += Vec3::splat((h - 0.5) * 2.0 * GRAIN_AMOUNT * acc.alpha);
}

pub(crate) fn flash(params: &FrameParams, r_norm: f32, acc: &mut Accumulator) {
    let Some((color, alpha)) = params.flash else {
        return;
    };
    let falloff = (1.0 - r_norm / FLASH_REACH).clamp(0.0, 1.0);
    acc.add(color, alpha * falloff);
}

pub(crate) fn edge_mask(rn: f32, acc: &mut Accumulator) {
    let mask = 1.0 - smoothstep(EDGE_START, EDGE_END, rn);
    acc.color *= mask;
    acc.alpha *= mask;
}
