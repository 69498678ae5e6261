//! Adds the captured glow onto the main image.
//!
//! Colour is summed without clamping; the 8-bit target clamps on write.
//! Alpha keeps whichever input is more opaque.

use glam::Vec4;

/// CPU evaluation of the fragment shader.
pub fn shade(base: Vec4, add: Vec4) -> Vec4 {
    (base.truncate() + add.truncate()).extend(base.w.max(add.w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_the_max_of_both_inputs() {
        let alphas = [0.0, 0.1, 0.35, 0.5, 0.7, 0.99, 1.0];
        for &a in &alphas {
            for &b in &alphas {
                let out = shade(Vec4::new(0.1, 0.2, 0.3, a), Vec4::new(0.3, 0.2, 0.1, b));
                assert_eq!(out.w, a.max(b));
            }
        }
    }

    #[test]
    fn transparent_input_leaves_other_alpha_unchanged() {
        let base = Vec4::new(0.4, 0.4, 0.4, 0.0);
        let add = Vec4::new(0.1, 0.5, 0.9, 0.63);
        assert_eq!(shade(base, add).w, 0.63);
        assert_eq!(shade(add, base).w, 0.63);
    }

    #[test]
    fn colour_is_summed_unclamped() {
        let out = shade(Vec4::new(0.8, 0.5, 0.0, 1.0), Vec4::new(0.7, 0.25, 0.0, 1.0));
        assert!((out.x - 1.5).abs() < 1e-6);
        assert!((out.y - 0.75).abs() < 1e-6);
        assert_eq!(out.z, 0.0);
    }
}
