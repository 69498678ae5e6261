//! Luminance key that turns near-black pixels transparent.

use glam::{Vec3, Vec4};

use crate::config::BlackKeyConfig;
use crate::effects::premultiply;

/// Rec. 709 luma weights.
pub const LUMA: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlackKeyUniforms {
    pub threshold: f32,
    pub threshold_end: f32,
    /// Non-zero when the surface composites premultiplied colour.
    pub premultiply: u32,
    pub _padding: f32,
}

impl Default for BlackKeyUniforms {
    fn default() -> Self {
        Self::from_config(&BlackKeyConfig::default())
    }
}

impl BlackKeyUniforms {
    pub fn from_config(config: &BlackKeyConfig) -> Self {
        Self {
            threshold: config.low,
            threshold_end: config.high,
            premultiply: 0,
            _padding: 0.0,
        }
    }

    /// Alpha assigned to a pixel of the given luminance.
    pub fn alpha(&self, luminance: f32) -> f32 {
        smoothstep(self.threshold, self.threshold_end, luminance).powf(0.5)
    }
}

pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(LUMA)
}

/// GLSL/WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// CPU evaluation of the fragment shader: colour kept, alpha re-derived.
pub fn shade(uniforms: &BlackKeyUniforms, color: Vec4) -> Vec4 {
    let rgb = color.truncate();
    let keyed = rgb.extend(uniforms.alpha(luminance(rgb)));
    if uniforms.premultiply != 0 {
        premultiply(keyed)
    } else {
        keyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_is_fully_transparent() {
        let key = BlackKeyUniforms::default();
        let out = shade(&key, Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(out, Vec4::ZERO);
    }

    #[test]
    fn bright_pixels_are_opaque() {
        let key = BlackKeyUniforms::default();
        assert_eq!(key.alpha(0.2), 1.0);
        assert_eq!(key.alpha(0.15), 1.0);
        assert_eq!(shade(&key, Vec4::ONE).w, 1.0);
    }

    #[test]
    fn at_or_below_low_threshold_is_transparent() {
        let key = BlackKeyUniforms::default();
        for l in [0.0, 0.01, 0.049, 0.05] {
            assert_eq!(key.alpha(l), 0.0, "luminance {l}");
        }
    }

    #[test]
    fn alpha_is_monotonic_between_thresholds() {
        let key = BlackKeyUniforms::default();
        let mut previous = 0.0;
        for step in 0..=200 {
            let l = 0.04 + step as f32 * 0.0006;
            let alpha = key.alpha(l);
            assert!(alpha >= previous, "alpha dropped at luminance {l}");
            assert!((0.0..=1.0).contains(&alpha));
            previous = alpha;
        }
    }

    #[test]
    fn midpoint_is_softened_by_square_root() {
        let key = BlackKeyUniforms::default();
        // smoothstep is 0.5 at the midpoint, then sqrt.
        assert!((key.alpha(0.1) - 0.5_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn colour_channels_pass_through() {
        let key = BlackKeyUniforms::default();
        let out = shade(&key, Vec4::new(0.9, 0.2, 0.4, 0.1));
        assert_eq!(out.truncate(), Vec3::new(0.9, 0.2, 0.4));
    }

    #[test]
    fn premultiplied_output_scales_colour_by_alpha() {
        let key = BlackKeyUniforms {
            premultiply: 1,
            ..Default::default()
        };
        let out = shade(&key, Vec4::new(0.1, 0.1, 0.1, 1.0));

        let alpha = 0.5_f32.sqrt();
        assert!((out.w - alpha).abs() < 1e-6);
        for channel in out.truncate().to_array() {
            assert!((channel - 0.1 * alpha).abs() < 1e-6);
            assert!(channel <= out.w);
        }
    }

    #[test]
    fn straight_output_keeps_colour_unscaled() {
        let key = BlackKeyUniforms::default();
        let out = shade(&key, Vec4::new(0.1, 0.1, 0.1, 1.0));

        assert_eq!(out.truncate(), Vec3::splat(0.1));
        assert!((out.w - 0.5_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn premultiplied_black_is_still_transparent() {
        let key = BlackKeyUniforms {
            premultiply: 1,
            ..Default::default()
        };
        assert_eq!(shade(&key, Vec4::new(0.0, 0.0, 0.0, 1.0)), Vec4::ZERO);
        assert_eq!(shade(&key, Vec4::ONE), Vec4::ONE);
    }

    #[test]
    fn luminance_uses_rec709_weights() {
        assert!((luminance(Vec3::ONE) - 1.0).abs() < 1e-6);
        assert_eq!(luminance(Vec3::Y), 0.7152);
    }
}
