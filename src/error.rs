//! Error types for setup, per-frame rendering, and configuration.
//!
//! Setup failures are fatal: nothing in the compositor retries an allocation or
//! a shader compile. The frame loop only fails on conditions the next frame
//! cannot heal (running out of GPU memory); everything else degrades to a
//! skipped or stale frame.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building the GPU context, passes, or pipelines.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to find a suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats on this adapter")]
    UnsupportedSurface,

    #[error("GPU validation failed while creating {what}: {message}")]
    Validation { what: &'static str, message: String },

    #[error("pipeline `{pipeline}` is malformed: {reason}")]
    InvalidPipeline {
        pipeline: &'static str,
        reason: String,
    },

    #[error("frame source error: {0}")]
    FrameSource(#[from] FrameSourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Unrecoverable errors raised while rendering a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("GPU ran out of memory while acquiring the surface texture")]
    OutOfMemory,
}

/// Errors raised while loading or validating [`HologramConfig`](crate::HologramConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid parameter `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised while opening or decoding a video frame source.
#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("no frames found in {0}")]
    Empty(PathBuf),

    #[error("frame {path} is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("playback rate must be positive, got {0}")]
    InvalidRate(f32),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to start the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create the window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
