//! # Holoframe
//!
//! **A looping video, rendered as a Pepper's-ghost hologram.**
//!
//! One scene holding a single video quad is rendered twice per frame:
//!
//! - the **occlusion** pipeline blurs, distorts and light-shafts a tinted twin
//!   of the quad into a glow texture;
//! - the **main** pipeline blooms, distorts and grains the visible quad, adds
//!   the glow back in, and keys dark pixels out so only the bright hologram
//!   remains on a transparent window.
//!
//! ## Quick Start
//!
//! ```no_run
//! use holoframe::{CompositeView, HologramConfig, ImageSequence};
//!
//! let config = HologramConfig::default();
//! let frames = ImageSequence::open("frames/".as_ref(), 30.0)?;
//! holoframe::run(config, Box::new(frames), CompositeView::Composite)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The compositor can also be driven from an existing event loop through
//! [`GpuContext`], [`Compositor`] and [`VideoTexture`].

mod app;
mod camera;
mod clock;
mod compositor;
mod config;
pub mod driver;
pub mod effects;
mod error;
mod gpu;
mod mesh;
pub mod render_graph;
mod scene;
mod video;

pub use app::run;
pub use camera::{Camera, Layer};
pub use clock::{FrameClock, FrameTick};
pub use compositor::{
    CompositeView, Compositor, FRAME_PHASES, Phase, main_pipeline, occlusion_pipeline,
};
pub use config::{
    BadTvConfig, BlackKeyConfig, BloomConfig, BlurConfig, FilmConfig, HologramConfig,
    OutputConfig, VolumetricLightConfig,
};
pub use effects::EffectUniforms;
pub use error::{AppError, ConfigError, FrameError, FrameSourceError, SetupError};
pub use gpu::GpuContext;
pub use mesh::{Mesh, Transform, Vertex3d};
pub use render_graph::{FrameContext, RenderContext, RenderNode, RenderTarget};
pub use scene::{Scene, SceneObject};
pub use video::{FrameSource, ImageSequence, TestPattern, VideoTexture, looping_index};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
