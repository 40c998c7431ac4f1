//! Colour conversion helpers.
//!
//! Everything here is a pure function over `f32` channels in `[0, 1]`. Hue is
//! stored as a fraction of a full turn (`0.0..1.0`) rather than degrees so
//! that wrapping is a single `rem_euclid`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB colour with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from 8-bit channels.
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    pub fn from_vec3(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self)
    }
}

/// HSL colour. `h` is a fraction of a turn in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        hsl_to_rgb(self)
    }
}

/// The three colours every palette and mode default supplies.
pub type ColorTriplet = [Rgb; 3];

/// Hue shifts smaller than this (in degrees) are treated as no-ops.
const HUE_SHIFT_EPSILON_DEG: f32 = 0.01;

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let Rgb { r, g, b } = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) * 0.5;
    let delta = max - min;

    if delta <= f32::EPSILON {
        return Hsl::new(0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsl::new(wrap_unit(h / 6.0), s, l)
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let Hsl { h, s, l } = hsl;
    if s <= f32::EPSILON {
        return Rgb::new(l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Rgb::new(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = wrap_unit(t);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Rotates the hue of `rgb` by `degrees`. Tiny shifts return the input
/// untouched so unshifted palettes keep their exact values.
pub fn apply_hue_shift(rgb: Rgb, degrees: f32) -> Rgb {
    if degrees.abs() < HUE_SHIFT_EPSILON_DEG {
        return rgb;
    }
    let mut hsl = rgb_to_hsl(rgb);
    hsl.h = wrap_unit(hsl.h + degrees / 360.0);
    hsl_to_rgb(hsl)
}

/// Interpolates between two hues along the shorter arc of the colour wheel.
pub fn lerp_hue_shortest_path(h1: f32, h2: f32, t: f32) -> f32 {
    let mut delta = h2 - h1;
    if delta > 0.5 {
        delta -= 1.0;
    } else if delta < -0.5 {
        delta += 1.0;
    }
    wrap_unit(h1 + delta * t)
}

/// Blends two colours in HSL space so saturated endpoints do not pass
/// through grey.
pub fn lerp_color_via_hsl(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let ha = rgb_to_hsl(a);
    let hb = rgb_to_hsl(b);
    // An achromatic endpoint has no meaningful hue; borrow the other one.
    let (from_h, to_h) = match (ha.s <= f32::EPSILON, hb.s <= f32::EPSILON) {
        (true, false) => (hb.h, hb.h),
        (false, true) => (ha.h, ha.h),
        _ => (ha.h, hb.h),
    };
    hsl_to_rgb(Hsl::new(
        lerp_hue_shortest_path(from_h, to_h, t),
        (ha.s + (hb.s - ha.s) * t).clamp(0.0, 1.0),
        (ha.l + (hb.l - ha.l) * t).clamp(0.0, 1.0),
    ))
}

pub fn lerp_triplet_via_hsl(a: &ColorTriplet, b: &ColorTriplet, t: f32) -> ColorTriplet {
    [
        lerp_color_via_hsl(a[0], b[0], t),
        lerp_color_via_hsl(a[1], b[1], t),
        lerp_color_via_hsl(a[2], b[2], t),
    ]
}

pub fn shift_triplet(colors: &ColorTriplet, degrees: f32) -> ColorTriplet {
    colors.map(|c| apply_hue_shift(c, degrees))
}

#[inline]
fn wrap_unit(v: f32) -> f32 {
    let w = v.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}
