//! Film grain and scanlines.

use glam::{Vec2, Vec3, Vec4};

use crate::clock::FrameTick;
use crate::config::FilmConfig;

/// Weights used when `grayscale` is set.
pub const GRAYSCALE: Vec3 = Vec3::new(0.3, 0.59, 0.11);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FilmUniforms {
    pub time: f32,
    pub noise_intensity: f32,
    pub scanline_intensity: f32,
    pub scanline_count: f32,
    /// Non-zero for grayscale output.
    pub grayscale: u32,
    pub _padding: [u32; 3],
}

impl Default for FilmUniforms {
    fn default() -> Self {
        Self::from_config(&FilmConfig::default())
    }
}

impl FilmUniforms {
    pub fn from_config(config: &FilmConfig) -> Self {
        Self {
            time: 0.0,
            noise_intensity: config.noise_intensity,
            scanline_intensity: config.scanline_intensity,
            scanline_count: config.scanline_count,
            grayscale: config.grayscale as u32,
            _padding: [0; 3],
        }
    }

    /// Film time follows wall-clock time.
    pub fn advance(&mut self, tick: FrameTick) {
        self.time += tick.delta;
    }
}

/// Hash used for grain, identical to the shader's `rand`.
pub fn rand(co: Vec2) -> f32 {
    let x = co.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.5453;
    x - x.floor()
}

/// CPU evaluation of the fragment shader.
pub fn shade(uniforms: &FilmUniforms, uv: Vec2, color: Vec4) -> Vec4 {
    let source = color.truncate();

    let dx = rand(uv + Vec2::splat(uniforms.time));
    let mut result = source + source * (0.1 + dx).clamp(0.0, 1.0);

    let angle = uv.y * uniforms.scanline_count;
    let (sin, cos) = angle.sin_cos();
    result += source * Vec3::new(sin, cos, sin) * uniforms.scanline_intensity;

    result = source + uniforms.noise_intensity.clamp(0.0, 1.0) * (result - source);

    if uniforms.grayscale != 0 {
        result = Vec3::splat(result.dot(GRAYSCALE));
    }

    result.extend(color.w)
}
