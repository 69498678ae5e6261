//! Per-shader uniform layouts, parameter defaults and CPU evaluations.
//!
//! Every effect has a `#[repr(C)]` uniform struct matching its WGSL block and
//! a `shade` function that mirrors the fragment shader on the CPU, which is
//! what the tests exercise.

pub mod additive_blend;
pub mod bad_tv;
pub mod black_key;
pub mod bloom;
pub mod blur;
pub mod film;
pub mod volumetric_light;

use glam::Vec4;

use crate::clock::FrameTick;
use crate::config::HologramConfig;

pub use bad_tv::BadTvUniforms;
pub use black_key::BlackKeyUniforms;
pub use bloom::BloomSettings;
pub use blur::BlurUniforms;
pub use film::FilmUniforms;
pub use volumetric_light::VolumetricLightUniforms;

/// Placeholder block for shaders without parameters.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NoUniforms {
    pub _padding: [f32; 4],
}

/// Uniforms of the pass-through shader, which may write the surface.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PassThroughUniforms {
    /// Non-zero when the surface composites premultiplied colour.
    pub premultiply: u32,
    pub _padding: [u32; 3],
}

/// Scales colour by alpha, for surfaces that expect premultiplied output.
pub fn premultiply(color: Vec4) -> Vec4 {
    (color.truncate() * color.w).extend(color.w)
}

/// Pass-through shader: identity copy, premultiplied if requested.
pub fn pass_through(uniforms: &PassThroughUniforms, color: Vec4) -> Vec4 {
    if uniforms.premultiply != 0 {
        premultiply(color)
    } else {
        color
    }
}

/// Current uniform values of every effect.
///
/// Owned by the compositor, written by the scene driver, uploaded by each
/// pass during `prepare`. Passes only ever read it.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectUniforms {
    pub volumetric_light: VolumetricLightUniforms,
    pub black_key: BlackKeyUniforms,
    pub pass_through: PassThroughUniforms,
    pub bad_tv: BadTvUniforms,
    pub film: FilmUniforms,
    pub horizontal_blur: BlurUniforms,
    pub vertical_blur: BlurUniforms,
    pub bloom: BloomSettings,
}

impl Default for EffectUniforms {
    fn default() -> Self {
        Self::from_config(&HologramConfig::default())
    }
}

impl EffectUniforms {
    /// Initial values from `config`.
    ///
    /// Blur spacing is `radius` over the logical output size, so it stays the
    /// same fraction of the image whatever `render_scale`, pixel density or
    /// window size the targets end up with.
    pub fn from_config(config: &HologramConfig) -> Self {
        let radius = config.blur.radius;
        Self {
            volumetric_light: VolumetricLightUniforms::from_config(&config.volumetric_light),
            black_key: BlackKeyUniforms::from_config(&config.black_key),
            pass_through: PassThroughUniforms::default(),
            bad_tv: BadTvUniforms::from_config(&config.bad_tv),
            film: FilmUniforms::from_config(&config.film),
            horizontal_blur: BlurUniforms::horizontal(radius, config.output.width),
            vertical_blur: BlurUniforms::vertical(radius, config.output.height),
            bloom: BloomSettings::from_config(&config.bloom),
        }
    }

    /// Makes the passes that write the surface emit premultiplied colour.
    pub fn set_premultiplied_output(&mut self, premultiplied: bool) {
        self.black_key.premultiply = premultiplied as u32;
        self.pass_through.premultiply = premultiplied as u32;
    }

    /// Advances the time-driven uniforms by one tick.
    pub fn advance(&mut self, tick: FrameTick) {
        self.film.advance(tick);
        self.bad_tv.advance();
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;

    #[test]
    fn tick_advances_film_by_delta_and_bad_tv_by_fixed_step() {
        let mut uniforms = EffectUniforms::default();
        uniforms.advance(FrameTick::new(0.5, 0.5));
        uniforms.advance(FrameTick::new(0.6, 0.1));

        assert!((uniforms.film.time - 0.6).abs() < 1e-6);
        assert!((uniforms.bad_tv.time - 2.0 * bad_tv::TIME_STEP).abs() < 1e-6);
    }

    #[test]
    fn blur_spacing_ignores_render_scale() {
        let mut config = HologramConfig::default();
        config.output.render_scale = 0.5;

        let uniforms = EffectUniforms::from_config(&config);
        assert_eq!(uniforms.horizontal_blur.step, [7.0 / 400.0, 0.0]);
        assert_eq!(uniforms.vertical_blur.step, [0.0, 7.0 / 500.0]);
    }

    #[test]
    fn blur_spacing_follows_output_size() {
        let mut config = HologramConfig::default();
        config.output.width = 800;
        config.output.height = 1000;

        let uniforms = EffectUniforms::from_config(&config);
        assert_eq!(uniforms.horizontal_blur.step, [7.0 / 800.0, 0.0]);
        assert_eq!(uniforms.vertical_blur.step, [0.0, 7.0 / 1000.0]);
    }

    #[test]
    fn premultiplied_output_reaches_both_surface_passes() {
        let mut uniforms = EffectUniforms::default();
        assert_eq!(uniforms.black_key.premultiply, 0);
        assert_eq!(uniforms.pass_through.premultiply, 0);

        uniforms.set_premultiplied_output(true);
        assert_eq!(uniforms.black_key.premultiply, 1);
        assert_eq!(uniforms.pass_through.premultiply, 1);

        uniforms.set_premultiplied_output(false);
        assert_eq!(uniforms.black_key.premultiply, 0);
        assert_eq!(uniforms.pass_through.premultiply, 0);
    }

    #[test]
    fn pass_through_premultiplies_on_request() {
        let color = Vec4::new(0.8, 0.4, 0.2, 0.5);
        let straight = PassThroughUniforms::default();
        let premultiplied = PassThroughUniforms {
            premultiply: 1,
            ..Default::default()
        };

        assert_eq!(pass_through(&straight, color), color);
        assert_eq!(
            pass_through(&premultiplied, color),
            Vec4::new(0.4, 0.2, 0.1, 0.5)
        );
    }

    #[test]
    fn uniform_blocks_are_sixteen_byte_multiples() {
        use std::mem::size_of;

        assert_eq!(size_of::<NoUniforms>(), 16);
        assert_eq!(size_of::<PassThroughUniforms>(), 16);
        assert_eq!(size_of::<BlurUniforms>(), 16);
        assert_eq!(size_of::<BlackKeyUniforms>(), 16);
        assert_eq!(size_of::<VolumetricLightUniforms>(), 32);
        assert_eq!(size_of::<BadTvUniforms>(), 32);
        assert_eq!(size_of::<FilmUniforms>(), 32);
        assert_eq!(size_of::<bloom::HighPassUniforms>(), 16);
        assert_eq!(size_of::<bloom::MipBlurUniforms>(), 32);
        assert_eq!(size_of::<bloom::CompositeUniforms>(), 32);
    }

    /// A black video frame must end up fully transparent on screen.
    #[test]
    fn black_frame_is_keyed_out_end_to_end() {
        let uniforms = EffectUniforms::default();
        let black = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let uv = Vec2::new(0.37, 0.61);

        // Occlusion: blur, distortion, light shafts of a black frame stay black.
        let blurred = blur::shade(&uniforms.horizontal_blur, uv, |_| black);
        let distorted = bad_tv::shade(&uniforms.bad_tv, uv, |_| blurred);
        let glow = volumetric_light::shade(&uniforms.volumetric_light, uv, |_| distorted);
        assert!(glow.truncate().abs().max_element() < 1e-6);

        // Main: bloom, distortion, film, blend, key.
        let settings = uniforms.bloom;
        let high = bloom::high_pass(&settings.high_pass_uniforms(), black);
        let level = bloom::blur(
            &bloom::MipBlurUniforms::new(0, Vec2::X, (200, 250)),
            uv,
            |_| high,
        );
        let bloomed = bloom::composite(&settings.composite_uniforms(), black, [level; 5]);
        let distorted = bad_tv::shade(&uniforms.bad_tv, uv, |_| bloomed);
        let filmed = film::shade(&uniforms.film, uv, distorted);
        let blended = additive_blend::shade(filmed, glow);
        let keyed = black_key::shade(&uniforms.black_key, blended);

        assert_eq!(keyed.truncate(), Vec3::ZERO);
        assert_eq!(keyed.w, 0.0);
    }
}
