//! Analog-noise distortion ("bad TV").
//!
//! The shader displaces each row horizontally by two layers of simplex noise
//! scrolling with time, and optionally rolls the image vertically. It only
//! moves sample coordinates, so it never changes the set of colours present.

use glam::{Vec2, Vec3, Vec4};

use crate::config::BadTvConfig;

/// Time added per frame, independent of wall-clock delta.
pub const TIME_STEP: f32 = 0.01;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BadTvUniforms {
    pub time: f32,
    pub distortion: f32,
    pub distortion2: f32,
    pub speed: f32,
    pub roll_speed: f32,
    pub _padding: [f32; 3],
}

impl Default for BadTvUniforms {
    fn default() -> Self {
        Self::from_config(&BadTvConfig::default())
    }
}

impl BadTvUniforms {
    pub fn from_config(config: &BadTvConfig) -> Self {
        Self {
            time: 0.0,
            distortion: config.distortion,
            distortion2: config.distortion2,
            speed: config.speed,
            roll_speed: config.roll_speed,
            _padding: [0.0; 3],
        }
    }

    /// Advances the noise clock by one frame.
    pub fn advance(&mut self) {
        self.time += TIME_STEP;
    }
}

// Skew and unskew factors of the 2D simplex grid, then 1/41 for gradients.
const C: [f32; 4] = [
    0.211_324_87,
    0.366_025_42,
    -0.577_350_26,
    0.024_390_243,
];

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mod289_2(x: Vec2) -> Vec2 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: Vec3) -> Vec3 {
    mod289_3(((x * 34.0) + 1.0) * x)
}

/// 2D simplex noise in roughly `[-1, 1]`, as evaluated by the shader.
pub fn snoise(v: Vec2) -> f32 {
    let mut i = (v + Vec2::splat(v.dot(Vec2::splat(C[1])))).floor();
    let x0 = v - i + Vec2::splat(i.dot(Vec2::splat(C[0])));

    let i1 = if x0.x > x0.y { Vec2::X } else { Vec2::Y };
    let x12_xy = x0 + Vec2::splat(C[0]) - i1;
    let x12_zw = x0 + Vec2::splat(C[2]);

    i = mod289_2(i);
    let p = permute(
        permute(Vec3::splat(i.y) + Vec3::new(0.0, i1.y, 1.0))
            + Vec3::splat(i.x)
            + Vec3::new(0.0, i1.x, 1.0),
    );

    let mut m = (Vec3::splat(0.5)
        - Vec3::new(x0.dot(x0), x12_xy.dot(x12_xy), x12_zw.dot(x12_zw)))
    .max(Vec3::ZERO);
    m = m * m;
    m = m * m;

    let scaled = p * C[3];
    let x = 2.0 * (scaled - scaled.floor()) - Vec3::ONE;
    let h = x.abs() - Vec3::splat(0.5);
    let a0 = x - (x + Vec3::splat(0.5)).floor();

    m *= Vec3::splat(1.792_842_9) - 0.853_734_7 * (a0 * a0 + h * h);

    let g = Vec3::new(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x12_xy.x + h.y * x12_xy.y,
        a0.z * x12_zw.x + h.z * x12_zw.y,
    );
    130.0 * m.dot(g)
}

/// Horizontal displacement of the row at `y`.
pub fn row_offset(uniforms: &BadTvUniforms, y: f32) -> f32 {
    let yt = y - uniforms.time * uniforms.speed;

    let mut offset = snoise(Vec2::new(yt * 3.0, 0.0)) * 0.2;
    offset = offset * uniforms.distortion * offset * uniforms.distortion * offset;
    offset + snoise(Vec2::new(yt * 50.0, 0.0)) * uniforms.distortion2 * 0.001
}

/// Where the pixel at `uv` samples its colour from.
pub fn distort(uniforms: &BadTvUniforms, uv: Vec2) -> Vec2 {
    Vec2::new(
        fract(uv.x + row_offset(uniforms, uv.y)),
        fract(uv.y - uniforms.time * uniforms.roll_speed),
    )
}

/// CPU evaluation of the fragment shader.
pub fn shade(uniforms: &BadTvUniforms, uv: Vec2, mut sample: impl FnMut(Vec2) -> Vec4) -> Vec4 {
    sample(distort(uniforms, uv))
}
