//! Fixed numeric parameters of the hologram effect stack.
//!
//! Every field has the reference default, so an empty (or absent) TOML file
//! yields the stock look. Values are read once at startup; nothing here is
//! editable while the frame loop runs.
//!
//! ```toml
//! [output]
//! width = 400
//! height = 500
//!
//! [black_key]
//! low = 0.05
//! high = 0.15
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Complete parameter set for the compositor.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HologramConfig {
    pub output: OutputConfig,
    pub volumetric_light: VolumetricLightConfig,
    pub black_key: BlackKeyConfig,
    pub bad_tv: BadTvConfig,
    pub film: FilmConfig,
    pub bloom: BloomConfig,
    pub blur: BlurConfig,
}

/// Logical output size and the occlusion pipeline's internal resolution factor.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub render_scale: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 500,
            render_scale: 1.0,
        }
    }
}

impl OutputConfig {
    /// Output size scaled by `render_scale`, never below one pixel.
    pub fn occlusion_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            ((width as f32 * self.render_scale).round() as u32).max(1),
            ((height as f32 * self.render_scale).round() as u32).max(1),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumetricLightConfig {
    pub exposure: f32,
    pub decay: f32,
    pub density: f32,
    pub weight: f32,
    /// Accumulation steps. Values above 100 are truncated by the shader.
    pub samples: u32,
}

impl Default for VolumetricLightConfig {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            decay: 1.0,
            density: 0.0,
            weight: 0.1,
            samples: 3,
        }
    }
}

/// Luminance band over which the black key fades from transparent to opaque.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlackKeyConfig {
    pub low: f32,
    pub high: f32,
}

impl Default for BlackKeyConfig {
    fn default() -> Self {
        Self {
            low: 0.05,
            high: 0.15,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadTvConfig {
    pub distortion: f32,
    pub distortion2: f32,
    pub speed: f32,
    pub roll_speed: f32,
}

impl Default for BadTvConfig {
    fn default() -> Self {
        Self {
            distortion: 1.7,
            distortion2: 2.7,
            speed: 0.25,
            roll_speed: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilmConfig {
    pub scanline_count: f32,
    pub grayscale: bool,
    pub scanline_intensity: f32,
    pub noise_intensity: f32,
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            scanline_count: 1200.0,
            grayscale: false,
            scanline_intensity: 1.5,
            noise_intensity: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BloomConfig {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 2.5,
            radius: 2.8,
            threshold: 3.3,
        }
    }
}

/// Blur tap spacing in pixels; divided by the output width/height per axis.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlurConfig {
    pub radius: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self { radius: 7.0 }
    }
}

impl HologramConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded hologram config");
        Ok(config)
    }

    /// Rejects parameter sets that cannot form a working pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.width == 0 || self.output.height == 0 {
            return Err(invalid("output", "width and height must be non-zero"));
        }
        if !(self.output.render_scale.is_finite() && self.output.render_scale > 0.0) {
            return Err(invalid("output.render_scale", "must be a positive number"));
        }

        let finite = [
            ("volumetric_light.exposure", self.volumetric_light.exposure),
            ("volumetric_light.decay", self.volumetric_light.decay),
            ("volumetric_light.density", self.volumetric_light.density),
            ("volumetric_light.weight", self.volumetric_light.weight),
            ("black_key.low", self.black_key.low),
            ("black_key.high", self.black_key.high),
            ("bad_tv.distortion", self.bad_tv.distortion),
            ("bad_tv.distortion2", self.bad_tv.distortion2),
            ("bad_tv.speed", self.bad_tv.speed),
            ("bad_tv.roll_speed", self.bad_tv.roll_speed),
            ("film.scanline_count", self.film.scanline_count),
            ("film.scanline_intensity", self.film.scanline_intensity),
            ("film.noise_intensity", self.film.noise_intensity),
            ("bloom.strength", self.bloom.strength),
            ("bloom.radius", self.bloom.radius),
            ("bloom.threshold", self.bloom.threshold),
            ("blur.radius", self.blur.radius),
        ];
        if let Some((field, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(*field, "must be finite"));
        }

        if self.black_key.low >= self.black_key.high {
            return Err(invalid(
                "black_key",
                format!(
                    "low ({}) must be below high ({})",
                    self.black_key.low, self.black_key.high
                ),
            ));
        }
        if self.blur.radius < 0.0 {
            return Err(invalid("blur.radius", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
