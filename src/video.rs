//! Looping frame sources and the GPU texture they feed.
//!
//! A [`FrameSource`] maps elapsed time to a frame index and yields RGBA
//! frames. [`VideoTexture`] uploads a frame only when the index changes; if a
//! source cannot produce a frame, the previous one (or the initial blank
//! texture) stays bound.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use crate::error::FrameSourceError;
use crate::gpu::GpuContext;

/// A looping sequence of RGBA frames.
pub trait FrameSource {
    /// Width and height of every frame.
    fn dimensions(&self) -> (u32, u32);

    /// Index of the frame to show `elapsed` seconds after start.
    fn frame_index(&self, elapsed: f32) -> usize;

    /// The frame at `index`, or `None` if it is not available yet.
    fn frame(&mut self, index: usize) -> Option<&RgbaImage>;
}

/// Frame shown at `elapsed` seconds for a clip of `count` frames at `fps`.
pub fn looping_index(elapsed: f32, fps: f32, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    (elapsed.max(0.0) * fps).floor() as usize % count
}

fn check_rate(fps: f32) -> Result<f32, FrameSourceError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(FrameSourceError::InvalidRate(fps))
    }
}

/// Decoded frames played back at a fixed rate.
///
/// Opened from a single image (a still) or from a directory whose PNG and
/// JPEG files, sorted by name, form the clip.
pub struct ImageSequence {
    frames: Vec<RgbaImage>,
    fps: f32,
}

impl ImageSequence {
    pub fn open(path: &Path, fps: f32) -> Result<Self, FrameSourceError> {
        let fps = check_rate(fps)?;

        let paths = if path.is_dir() {
            frame_paths(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let mut frames: Vec<RgbaImage> = Vec::with_capacity(paths.len());
        for frame_path in &paths {
            let frame = image::open(frame_path)?.to_rgba8();
            if let Some(first) = frames.first() {
                if frame.dimensions() != first.dimensions() {
                    return Err(FrameSourceError::SizeMismatch {
                        path: frame_path.clone(),
                        expected: first.dimensions(),
                        actual: frame.dimensions(),
                    });
                }
            }
            frames.push(frame);
        }

        if frames.is_empty() {
            return Err(FrameSourceError::Empty(path.to_path_buf()));
        }

        let (width, height) = frames[0].dimensions();
        tracing::info!(
            path = %path.display(),
            frames = frames.len(),
            width,
            height,
            fps,
            "loaded frame sequence"
        );
        Ok(Self { frames, fps })
    }

    /// Wraps already decoded frames.
    pub fn from_frames(frames: Vec<RgbaImage>, fps: f32) -> Result<Self, FrameSourceError> {
        let fps = check_rate(fps)?;
        if frames.is_empty() {
            return Err(FrameSourceError::Empty(PathBuf::new()));
        }
        Ok(Self { frames, fps })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn dimensions(&self) -> (u32, u32) {
        self.frames[0].dimensions()
    }

    fn frame_index(&self, elapsed: f32) -> usize {
        looping_index(elapsed, self.fps, self.frames.len())
    }

    fn frame(&mut self, index: usize) -> Option<&RgbaImage> {
        self.frames.get(index)
    }
}

fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>, FrameSourceError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg")
            });
        if is_frame {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Procedural stand-in clip: a pulsing ring and a sweeping scan band on black.
pub struct TestPattern {
    width: u32,
    height: u32,
    fps: f32,
    frame_count: usize,
    buffer: RgbaImage,
    rendered: Option<usize>,
}

impl TestPattern {
    pub fn new(width: u32, height: u32, fps: f32) -> Result<Self, FrameSourceError> {
        let fps = check_rate(fps)?;
        Ok(Self {
            width,
            height,
            fps,
            frame_count: (fps * 4.0).round().max(1.0) as usize,
            buffer: RgbaImage::new(width, height),
            rendered: None,
        })
    }

    fn render(&mut self, index: usize) {
        let phase = index as f32 / self.frame_count as f32 * std::f32::consts::TAU;
        let ring_radius = 0.3 + 0.05 * phase.sin();
        let band = 0.5 + 0.5 * phase.cos();
        let (w, h) = (self.width as f32, self.height as f32);

        for (x, y, pixel) in self.buffer.enumerate_pixels_mut() {
            let u = (x as f32 + 0.5) / w;
            let v = (y as f32 + 0.5) / h;
            let distance = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();

            let ring = (1.0 - (distance - ring_radius).abs() / 0.03).clamp(0.0, 1.0);
            let scan = (1.0 - (v - band).abs() / 0.02).clamp(0.0, 1.0) * 0.6;
            let level = ring.max(scan);

            *pixel = Rgba([
                (level * 200.0) as u8,
                (level * 240.0) as u8,
                (level * 255.0) as u8,
                255,
            ]);
        }
        self.rendered = Some(index);
    }
}

impl FrameSource for TestPattern {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_index(&self, elapsed: f32) -> usize {
        looping_index(elapsed, self.fps, self.frame_count)
    }

    fn frame(&mut self, index: usize) -> Option<&RgbaImage> {
        if index >= self.frame_count {
            return None;
        }
        if self.rendered != Some(index) {
            self.render(index);
        }
        Some(&self.buffer)
    }
}

/// The scene's video texture.
pub struct VideoTexture {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    size: (u32, u32),
    current: Option<usize>,
}

impl VideoTexture {
    /// Creates a blank (transparent black) texture of the given size.
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Video Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Video Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
            current: None,
        }
    }

    /// Sized to match `source`.
    pub fn for_source(gpu: &GpuContext, source: &dyn FrameSource) -> Self {
        let (width, height) = source.dimensions();
        Self::new(gpu, width, height)
    }

    /// Uploads the source's frame for `elapsed` if it differs from the one bound.
    ///
    /// Returns `true` when new pixels were written.
    pub fn update(&mut self, gpu: &GpuContext, source: &mut dyn FrameSource, elapsed: f32) -> bool {
        let index = source.frame_index(elapsed);
        if self.current == Some(index) {
            return false;
        }

        let Some(frame) = source.frame(index) else {
            tracing::trace!(index, "frame not ready, keeping previous texture");
            return false;
        };
        if frame.dimensions() != self.size {
            tracing::warn!(
                index,
                expected = ?self.size,
                actual = ?frame.dimensions(),
                "frame size does not match video texture, skipping"
            );
            return false;
        }

        let (width, height) = self.size;
        gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.current = Some(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_index_wraps_around() {
        assert_eq!(looping_index(0.0, 30.0, 10), 0);
        assert_eq!(looping_index(0.1, 30.0, 10), 3);
        assert_eq!(looping_index(0.5, 30.0, 10), 5);
        assert_eq!(looping_index(1.0, 30.0, 10), 0);
        assert_eq!(looping_index(-3.0, 30.0, 10), 0);
        assert_eq!(looping_index(5.0, 30.0, 0), 0);
    }

    #[test]
    fn sequence_rejects_bad_rates() {
        let frames = vec![RgbaImage::new(2, 2)];
        assert!(matches!(
            ImageSequence::from_frames(frames.clone(), 0.0),
            Err(FrameSourceError::InvalidRate(_))
        ));
        assert!(ImageSequence::from_frames(frames, f32::NAN).is_err());
    }

    #[test]
    fn empty_sequence_is_an_error() {
        assert!(matches!(
            ImageSequence::from_frames(Vec::new(), 30.0),
            Err(FrameSourceError::Empty(_))
        ));
    }

    #[test]
    fn sequence_serves_frames_by_time() {
        let frames = (0..4u8)
            .map(|i| RgbaImage::from_pixel(1, 1, Rgba([i, 0, 0, 255])))
            .collect();
        let mut sequence = ImageSequence::from_frames(frames, 2.0).unwrap();

        let index = sequence.frame_index(1.6);
        assert_eq!(index, 3);
        assert_eq!(sequence.frame(index).unwrap().get_pixel(0, 0)[0], 3);
        assert_eq!(sequence.frame_index(2.0), 0);
        assert!(sequence.frame(9).is_none());
    }

    #[test]
    fn test_pattern_is_mostly_black() {
        let mut pattern = TestPattern::new(64, 80, 30.0).unwrap();
        let frame = pattern.frame(0).unwrap();
        assert_eq!(frame.dimensions(), (64, 80));

        let black = frame.pixels().filter(|p| p[0] == 0 && p[1] == 0 && p[2] == 0).count();
        assert!(black > (64 * 80) / 2);
    }

    #[test]
    fn test_pattern_loops() {
        let pattern = TestPattern::new(8, 8, 30.0).unwrap();
        assert_eq!(pattern.frame_index(0.0), pattern.frame_index(4.0));
        assert_ne!(pattern.frame_index(0.0), pattern.frame_index(1.0));
    }

    #[test]
    fn opens_a_directory_of_frames_in_name_order() {
        let dir = std::env::temp_dir().join(format!("holoframe-frames-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, value) in [("b.png", 20u8), ("a.png", 10u8), ("notes.txt", 0u8)] {
            let path = dir.join(name);
            if name.ends_with(".png") {
                RgbaImage::from_pixel(3, 2, Rgba([value, 0, 0, 255])).save(&path).unwrap();
            } else {
                std::fs::write(&path, "not a frame").unwrap();
            }
        }

        let mut sequence = ImageSequence::open(&dir, 1.0).unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.dimensions(), (3, 2));
        assert_eq!(sequence.frame(0).unwrap().get_pixel(0, 0)[0], 10);
        assert_eq!(sequence.frame(1).unwrap().get_pixel(0, 0)[0], 20);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
