//! Mip-chain bloom: luminance high-pass, five blurred levels, weighted composite.
//!
//! The GPU side lives in `render_graph::bloom_pass`; this module holds the
//! parameters, uniform layouts and CPU evaluations of the three shaders.

use glam::{Vec2, Vec3, Vec4};

use crate::config::BloomConfig;

/// Number of blurred mip levels.
pub const MIP_LEVELS: usize = 5;
/// Gaussian kernel radius per level; sigma equals the radius.
pub const KERNEL_RADII: [u32; MIP_LEVELS] = [3, 5, 7, 9, 11];
/// Base contribution of each level before `radius` interpolation.
pub const BLOOM_FACTORS: [f32; MIP_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];
/// Width of the high-pass soft edge above `threshold`.
pub const SMOOTH_WIDTH: f32 = 0.01;
/// Luma weights used by the high-pass.
pub const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self::from_config(&BloomConfig::default())
    }
}

impl BloomSettings {
    pub fn from_config(config: &BloomConfig) -> Self {
        Self {
            strength: config.strength,
            radius: config.radius,
            threshold: config.threshold,
        }
    }

    pub fn high_pass_uniforms(&self) -> HighPassUniforms {
        HighPassUniforms {
            threshold: self.threshold,
            smooth_width: SMOOTH_WIDTH,
            _padding: [0.0; 2],
        }
    }

    /// Final per-level weights, `strength` already folded in.
    pub fn level_weights(&self) -> [f32; MIP_LEVELS] {
        BLOOM_FACTORS.map(|factor| self.strength * lerp_bloom_factor(factor, self.radius))
    }

    pub fn composite_uniforms(&self) -> CompositeUniforms {
        let w = self.level_weights();
        CompositeUniforms {
            weights: [w[0], w[1], w[2], w[3]],
            last_weight: w[4],
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HighPassUniforms {
    pub threshold: f32,
    pub smooth_width: f32,
    pub _padding: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MipBlurUniforms {
    pub direction: [f32; 2],
    /// Reciprocal of the level's size.
    pub texel_size: [f32; 2],
    pub kernel_radius: u32,
    pub sigma: f32,
    pub _padding: [f32; 2],
}

impl MipBlurUniforms {
    pub fn new(level: usize, direction: Vec2, level_size: (u32, u32)) -> Self {
        let radius = KERNEL_RADII[level];
        Self {
            direction: direction.into(),
            texel_size: [
                1.0 / level_size.0.max(1) as f32,
                1.0 / level_size.1.max(1) as f32,
            ],
            kernel_radius: radius,
            sigma: radius as f32,
            _padding: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    /// Weights of levels 0..4.
    pub weights: [f32; 4],
    pub last_weight: f32,
    pub _padding: [f32; 3],
}

/// `mix(factor, 1.2 - factor, radius)`.
pub fn lerp_bloom_factor(factor: f32, radius: f32) -> f32 {
    let mirror = 1.2 - factor;
    factor + (mirror - factor) * radius
}

/// Sizes of the five blur levels; the first is half the input, each next half again.
pub fn mip_sizes(width: u32, height: u32) -> [(u32, u32); MIP_LEVELS] {
    let mut size = (width, height);
    std::array::from_fn(|_| {
        size = ((size.0 / 2).max(1), (size.1 / 2).max(1));
        size
    })
}

/// CPU evaluation of the high-pass shader.
pub fn high_pass(uniforms: &HighPassUniforms, color: Vec4) -> Vec4 {
    let luma = color.truncate().dot(LUMA);
    let alpha = smoothstep(
        uniforms.threshold,
        uniforms.threshold + uniforms.smooth_width,
        luma,
    );
    Vec4::ZERO.lerp(color, alpha)
}

pub fn gaussian_pdf(x: f32, sigma: f32) -> f32 {
    0.39894 * (-0.5 * x * x / (sigma * sigma)).exp() / sigma
}

/// CPU evaluation of one separable blur step. Output alpha is always 1.
pub fn blur(uniforms: &MipBlurUniforms, uv: Vec2, mut sample: impl FnMut(Vec2) -> Vec4) -> Vec4 {
    let step = Vec2::from(uniforms.direction) * Vec2::from(uniforms.texel_size);
    let mut weight_sum = gaussian_pdf(0.0, uniforms.sigma);
    let mut sum = sample(uv).truncate() * weight_sum;

    for i in 1..uniforms.kernel_radius {
        let x = i as f32;
        let w = gaussian_pdf(x, uniforms.sigma);
        let offset = step * x;
        sum += (sample(uv + offset).truncate() + sample(uv - offset).truncate()) * w;
        weight_sum += 2.0 * w;
    }

    (sum / weight_sum).extend(1.0)
}

/// CPU evaluation of the composite shader: weighted levels added onto `base`.
pub fn composite(uniforms: &CompositeUniforms, base: Vec4, levels: [Vec4; MIP_LEVELS]) -> Vec4 {
    let weights = [
        uniforms.weights[0],
        uniforms.weights[1],
        uniforms.weights[2],
        uniforms.weights[3],
        uniforms.last_weight,
    ];
    let bloom = weights
        .iter()
        .zip(levels)
        .fold(Vec4::ZERO, |acc, (w, level)| acc + level * *w)
        .clamp(Vec4::ZERO, Vec4::ONE);

    (base + bloom * bloom.w).clamp(Vec4::ZERO, Vec4::ONE)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_pass_drops_everything_below_default_threshold() {
        let uniforms = BloomSettings::default().high_pass_uniforms();
        // Luma never exceeds 1 for 8-bit input, and the threshold is 3.3.
        for color in [Vec4::ZERO, Vec4::ONE, Vec4::new(0.0, 0.73, 1.0, 0.7)] {
            assert_eq!(high_pass(&uniforms, color), Vec4::ZERO);
        }
    }

    #[test]
    fn high_pass_keeps_bright_pixels() {
        let uniforms = HighPassUniforms {
            threshold: 0.5,
            smooth_width: SMOOTH_WIDTH,
            _padding: [0.0; 2],
        };
        let color = Vec4::new(1.0, 1.0, 1.0, 0.8);
        assert_eq!(high_pass(&uniforms, color), color);
    }

    #[test]
    fn blur_output_is_opaque_and_preserves_flat_colour() {
        let uniforms = MipBlurUniforms::new(2, Vec2::X, (200, 250));
        let out = blur(&uniforms, Vec2::splat(0.5), |_| Vec4::new(0.2, 0.4, 0.6, 0.0));
        assert!((out.truncate() - Vec3::new(0.2, 0.4, 0.6)).abs().max_element() < 1e-5);
        assert_eq!(out.w, 1.0);
    }

    #[test]
    fn blur_reads_two_taps_per_kernel_step() {
        let uniforms = MipBlurUniforms::new(0, Vec2::Y, (100, 100));
        let mut reads = 0;
        blur(&uniforms, Vec2::ZERO, |_| {
            reads += 1;
            Vec4::ZERO
        });
        assert_eq!(reads, 1 + 2 * (KERNEL_RADII[0] as usize - 1));
    }

    #[test]
    fn mip_chain_halves_each_level() {
        assert_eq!(
            mip_sizes(400, 500),
            [(200, 250), (100, 125), (50, 62), (25, 31), (12, 15)]
        );
        assert_eq!(mip_sizes(2, 2)[4], (1, 1));
    }

    #[test]
    fn radius_mirrors_factors() {
        assert_eq!(lerp_bloom_factor(0.8, 0.0), 0.8);
        assert!((lerp_bloom_factor(0.8, 1.0) - 0.4).abs() < 1e-6);
        assert!((lerp_bloom_factor(1.0, 2.8) + 1.24).abs() < 1e-5);
        assert!((lerp_bloom_factor(0.6, 2.8) - 0.6).abs() < 1e-5);
    }

    #[test]
    fn black_input_saturates_alpha_but_not_colour() {
        let settings = BloomSettings::default();
        let high = high_pass(&settings.high_pass_uniforms(), Vec4::new(0.0, 0.0, 0.0, 1.0));
        let level = blur(&MipBlurUniforms::new(0, Vec2::X, (200, 250)), Vec2::ZERO, |_| high);

        let out = composite(&settings.composite_uniforms(), Vec4::ZERO, [level; MIP_LEVELS]);
        assert_eq!(out.truncate(), Vec3::ZERO);
        assert_eq!(out.w, 1.0);
    }
}
