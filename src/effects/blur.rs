//! Nine-tap separable Gaussian blur used by the occlusion pipeline.

use glam::{Vec2, Vec4};

/// Tap weights from the outermost tap inwards; the last entry is the centre.
pub const WEIGHTS: [f32; 5] = [0.051, 0.0918, 0.12245, 0.1531, 0.1633];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    /// UV distance between neighbouring taps.
    pub step: [f32; 2],
    pub _padding: [f32; 2],
}

impl BlurUniforms {
    /// Taps spaced `radius` pixels apart along X.
    pub fn horizontal(radius: f32, width: u32) -> Self {
        Self {
            step: [radius / width.max(1) as f32, 0.0],
            _padding: [0.0; 2],
        }
    }

    /// Taps spaced `radius` pixels apart along Y.
    pub fn vertical(radius: f32, height: u32) -> Self {
        Self {
            step: [0.0, radius / height.max(1) as f32],
            _padding: [0.0; 2],
        }
    }
}

/// CPU evaluation of the fragment shader.
pub fn shade(uniforms: &BlurUniforms, uv: Vec2, mut sample: impl FnMut(Vec2) -> Vec4) -> Vec4 {
    let step = Vec2::from(uniforms.step);
    let mut sum = sample(uv) * WEIGHTS[4];
    for (i, weight) in WEIGHTS[..4].iter().enumerate() {
        let distance = (4 - i) as f32;
        sum += sample(uv - step * distance) * *weight;
        sum += sample(uv + step * distance) * *weight;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let total = WEIGHTS[4] + 2.0 * WEIGHTS[..4].iter().sum::<f32>();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn flat_input_is_preserved() {
        let blur = BlurUniforms::horizontal(7.0, 400);
        let colour = Vec4::new(0.3, 0.6, 0.9, 1.0);
        let out = shade(&blur, Vec2::splat(0.5), |_| colour);
        assert!((out - colour).abs().max_element() < 1e-4);
    }

    #[test]
    fn step_is_radius_over_dimension() {
        let h = BlurUniforms::horizontal(7.0, 400);
        let v = BlurUniforms::vertical(7.0, 500);
        assert_eq!(h.step, [7.0 / 400.0, 0.0]);
        assert_eq!(v.step, [0.0, 7.0 / 500.0]);
    }

    #[test]
    fn taps_reach_four_steps_each_side() {
        let blur = BlurUniforms::horizontal(1.0, 10);
        let mut xs = Vec::new();
        shade(&blur, Vec2::splat(0.5), |uv| {
            xs.push(uv.x);
            Vec4::ZERO
        });

        assert_eq!(xs.len(), 9);
        let min = xs.iter().cloned().fold(f32::MAX, f32::min);
        let max = xs.iter().cloned().fold(f32::MIN, f32::max);
        assert!((min - 0.1).abs() < 1e-6);
        assert!((max - 0.9).abs() < 1e-6);
    }
}
