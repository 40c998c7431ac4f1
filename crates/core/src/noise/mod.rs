//! Stateless randomness for the render layers.
//!
//! Every function here is a pure function of its arguments: no permutation
//! tables, no seeded generators. Lattice gradients are picked by hashing the
//! integer cell coordinates, which keeps the noise reproducible frame to frame
//! and trivially portable to a shader.

use glam::Vec2;

/// Skewing factor for 2D, `(sqrt(3) - 1) / 2`.
const F2: f32 = 0.366_025_42;
/// Unskewing factor for 2D, `(3 - sqrt(3)) / 6`.
const G2: f32 = 0.211_324_87;

const GRAD2: [[f32; 2]; 12] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// Integer avalanche hash (lowbias32).
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Maps the top 24 bits of a hash into `[0, 1)`.
#[inline]
fn unit(h: u32) -> f32 {
    (h >> 8) as f32 * (1.0 / 16_777_216.0)
}

/// Hashes a scalar seed into `[0, 1)`.
#[inline]
pub fn hash11(seed: f32) -> f32 {
    unit(hash_u32(seed.to_bits()))
}

/// Hashes a 2D seed into `[0, 1)`.
#[inline]
pub fn hash21(p: Vec2) -> f32 {
    unit(hash_u32(
        p.x.to_bits() ^ hash_u32(p.y.to_bits()).wrapping_add(0x9e37_79b9),
    ))
}

#[inline]
fn lattice_gradient(i: i32, j: i32, x: f32, y: f32) -> f32 {
    let h = hash_u32((i as u32) ^ hash_u32(j as u32).wrapping_add(0x9e37_79b9));
    let g = GRAD2[(h % 12) as usize];
    g[0] * x + g[1] * y
}

#[inline]
fn corner(i: i32, j: i32, x: f32, y: f32) -> f32 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let t2 = t * t;
        t2 * t2 * lattice_gradient(i, j, x, y)
    }
}

/// 2D simplex noise, roughly in `[-1, 1]` and continuous everywhere.
pub fn noise2d(x: f32, y: f32) -> f32 {
    let s = (x + y) * F2;
    let i = (x + s).floor();
    let j = (y + s).floor();

    let t = (i + j) * G2;
    let x0 = x - (i - t);
    let y0 = y - (j - t);

    let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

    let x1 = x0 - i1 as f32 + G2;
    let y1 = y0 - j1 as f32 + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let (ii, jj) = (i as i32, j as i32);
    let n0 = corner(ii, jj, x0, y0);
    let n1 = corner(ii + i1, jj + j1, x1, y1);
    let n2 = corner(ii + 1, jj + 1, x2, y2);

    70.0 * (n0 + n1 + n2)
}

#[inline]
pub fn noise(p: Vec2) -> f32 {
    noise2d(p.x, p.y)
}
