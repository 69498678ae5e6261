//! Light shafts radiating from a screen-space light position.
//!
//! Each pixel walks from its own UV towards the light, summing decayed,
//! weighted samples onto its original colour. The walk is bounded by
//! [`MAX_SAMPLES`] in the shader, so any larger `samples` value is truncated.

use glam::{Vec2, Vec3, Vec4};

use crate::config::VolumetricLightConfig;

/// Compile-time bound of the accumulation loop in `volumetric_light.wgsl`.
pub const MAX_SAMPLES: u32 = 100;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumetricLightUniforms {
    /// Light position in UV space, origin bottom-left, `+y` up.
    pub light_position: [f32; 2],
    pub exposure: f32,
    pub decay: f32,
    pub density: f32,
    pub weight: f32,
    pub samples: i32,
    pub _padding: f32,
}

impl Default for VolumetricLightUniforms {
    fn default() -> Self {
        Self::from_config(&VolumetricLightConfig::default())
    }
}

impl VolumetricLightUniforms {
    pub fn from_config(config: &VolumetricLightConfig) -> Self {
        Self {
            light_position: [0.5, 0.5],
            exposure: config.exposure,
            decay: config.decay,
            density: config.density,
            weight: config.weight,
            samples: config.samples.min(i32::MAX as u32) as i32,
            _padding: 0.0,
        }
    }

    /// Stores a projected light position, remapped from NDC to UV space.
    pub fn set_light_from_ndc(&mut self, ndc: Vec3) {
        self.light_position = light_position_from_ndc(ndc);
    }
}

/// Maps NDC `[-1, 1]²` to the `[0, 1]²` light-position uniform.
pub fn light_position_from_ndc(ndc: Vec3) -> [f32; 2] {
    [(ndc.x + 1.0) / 2.0, (ndc.y + 1.0) / 2.0]
}

/// CPU evaluation of the fragment shader for one pixel.
///
/// `sample` reads the input texture at a UV in the same bottom-left space as
/// `uv` and `light_position`.
pub fn shade(
    uniforms: &VolumetricLightUniforms,
    uv: Vec2,
    mut sample: impl FnMut(Vec2) -> Vec4,
) -> Vec4 {
    let light = Vec2::from(uniforms.light_position);
    let delta = (light - uv) * (1.0 / uniforms.samples as f32 * uniforms.density);

    let mut coord = uv;
    let mut color = sample(coord);
    let mut illumination_decay = 1.0;

    for i in 0..MAX_SAMPLES as i32 {
        if i == uniforms.samples {
            break;
        }
        coord += delta;
        color += sample(coord) * illumination_decay * uniforms.weight;
        illumination_decay *= uniforms.decay;
    }

    color * uniforms.exposure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_samples(samples: u32) -> VolumetricLightUniforms {
        VolumetricLightUniforms::from_config(&VolumetricLightConfig {
            samples,
            ..VolumetricLightConfig::default()
        })
    }

    fn steps_taken(uniforms: &VolumetricLightUniforms) -> u32 {
        let mut reads = 0;
        shade(uniforms, Vec2::splat(0.25), |_| {
            reads += 1;
            Vec4::ZERO
        });
        // The first read is the pixel's own colour.
        reads - 1
    }

    #[test]
    fn takes_exactly_samples_steps_up_to_the_bound() {
        for samples in [0, 1, 3, 17, 99, 100] {
            assert_eq!(steps_taken(&with_samples(samples)), samples);
        }
    }

    #[test]
    fn oversized_sample_counts_are_truncated() {
        for samples in [101, 250, 10_000, u32::MAX] {
            assert_eq!(steps_taken(&with_samples(samples)), MAX_SAMPLES);
        }
    }

    #[test]
    fn default_parameters_add_three_weighted_copies() {
        let uniforms = VolumetricLightUniforms::default();
        let input = Vec4::new(0.2, 0.4, 0.6, 1.0);

        // density 0 keeps every sample on the pixel; weight 0.1, decay 1.
        let out = shade(&uniforms, Vec2::new(0.3, 0.7), |_| input);
        let expected = input * (1.0 + 3.0 * 0.1);
        assert!((out - expected).abs().max_element() < 1e-6);
    }

    #[test]
    fn decay_and_exposure_scale_the_sum() {
        let uniforms = VolumetricLightUniforms {
            decay: 0.5,
            exposure: 2.0,
            weight: 1.0,
            samples: 3,
            ..VolumetricLightUniforms::default()
        };

        let out = shade(&uniforms, Vec2::ZERO, |_| Vec4::ONE);
        // (1 + 1 + 0.5 + 0.25) * 2
        assert!((out.x - 5.5).abs() < 1e-6);
    }

    #[test]
    fn samples_walk_towards_the_light() {
        let uniforms = VolumetricLightUniforms {
            light_position: [1.0, 1.0],
            density: 1.0,
            samples: 4,
            ..VolumetricLightUniforms::default()
        };

        let mut coords = Vec::new();
        shade(&uniforms, Vec2::ZERO, |uv| {
            coords.push(uv);
            Vec4::ZERO
        });

        assert_eq!(coords.len(), 5);
        assert!((coords[4] - Vec2::ONE).length() < 1e-6);
        for pair in coords.windows(2) {
            assert!(pair[1].x > pair[0].x && pair[1].y > pair[0].y);
        }
    }

    #[test]
    fn ndc_is_remapped_to_unit_square() {
        assert_eq!(light_position_from_ndc(Vec3::new(-1.0, -1.0, 0.3)), [0.0, 0.0]);
        assert_eq!(light_position_from_ndc(Vec3::new(1.0, 1.0, 0.3)), [1.0, 1.0]);
        assert_eq!(light_position_from_ndc(Vec3::ZERO), [0.5, 0.5]);

        for (x, y) in [(-0.75_f32, 0.2_f32), (0.33, -0.9), (0.999, -0.001)] {
            let [u, v] = light_position_from_ndc(Vec3::new(x, y, 0.0));
            assert_eq!(u, (x + 1.0) / 2.0);
            assert_eq!(v, (y + 1.0) / 2.0);
        }
    }
}
