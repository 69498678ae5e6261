//! The two-phase hologram compositor.
//!
//! Every frame renders the occlusion pipeline first, capturing its result in
//! the glow target, then the main pipeline, whose blend step adds the glow
//! back in before the black key writes the surface. Both phases are recorded
//! into one command encoder and submitted together, so the capture always
//! lands before the blend samples it.

use crate::camera::{Camera, Layer};
use crate::clock::FrameTick;
use crate::config::HologramConfig;
use crate::driver;
use crate::effects::EffectUniforms;
use crate::error::{FrameError, SetupError};
use crate::gpu::GpuContext;
use crate::render_graph::{
    FrameContext, FrameState, PassId, PassRegistry, Pipeline, RenderContext, Step, TargetId,
    TargetPool, Terminal,
};
use crate::scene::Scene;
use crate::video::VideoTexture;

/// What the main phase puts on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeView {
    /// The finished hologram.
    #[default]
    Composite,
    /// The captured glow, copied to the screen unkeyed.
    Glow,
}

/// One half of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Occlusion,
    Main,
}

impl Phase {
    /// The scene layer this phase rasterizes.
    pub fn layer(self) -> Layer {
        match self {
            Phase::Occlusion => Layer::Occlusion,
            Phase::Main => Layer::Default,
        }
    }

    /// Per-phase context for the frame at `tick`.
    pub fn frame(self, tick: FrameTick) -> FrameContext {
        FrameContext {
            layer: self.layer(),
            tick,
        }
    }
}

/// Phases in the order they are recorded each frame.
pub const FRAME_PHASES: [Phase; 2] = [Phase::Occlusion, Phase::Main];

/// Blurs, distorts and light-shafts the occlusion layer into the glow target.
pub fn occlusion_pipeline() -> Result<Pipeline, SetupError> {
    Pipeline::new(
        "occlusion",
        vec![
            Step::scene(),
            Step::effect(PassId::HorizontalBlur),
            Step::effect(PassId::VerticalBlur),
            Step::effect(PassId::HorizontalBlur),
            Step::effect(PassId::VerticalBlur),
            Step::effect(PassId::HorizontalBlur),
            Step::effect(PassId::BadTv),
            Step::effect(PassId::VolumetricLight).capture(),
        ],
        TargetId::OcclusionPing,
        TargetId::OcclusionPong,
        Terminal::Capture(TargetId::Glow),
    )
}

/// The visible pipeline for `view`.
pub fn main_pipeline(view: CompositeView) -> Result<Pipeline, SetupError> {
    let steps = match view {
        CompositeView::Composite => vec![
            Step::scene(),
            Step::effect(PassId::Bloom),
            Step::effect(PassId::BadTv),
            Step::effect(PassId::Film),
            Step::effect(PassId::AdditiveBlend).with_glow(),
            Step::effect(PassId::BlackKey),
        ],
        CompositeView::Glow => vec![Step::reading_glow(PassId::PassThrough)],
    };
    Pipeline::new(
        "main",
        steps,
        TargetId::MainPing,
        TargetId::MainPong,
        Terminal::Screen,
    )
}

/// Whether the surface expects colour already scaled by alpha.
pub fn premultiplies(alpha_mode: wgpu::CompositeAlphaMode) -> bool {
    alpha_mode == wgpu::CompositeAlphaMode::PreMultiplied
}

pub struct Compositor {
    registry: PassRegistry,
    targets: TargetPool,
    occlusion: Pipeline,
    main: Pipeline,
    uniforms: EffectUniforms,
}

impl Compositor {
    /// Builds every pass, target and pipeline.
    ///
    /// GPU validation errors raised while creating passes are returned as
    /// [`SetupError::Validation`] instead of reaching the device's error handler.
    pub fn new(
        gpu: &GpuContext,
        config: &HologramConfig,
        video: &VideoTexture,
        scene: &Scene,
        view: CompositeView,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let occlusion = occlusion_pipeline()?;
        let main = main_pipeline(view)?;

        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let targets = TargetPool::new(gpu, &config.output);
        let registry = PassRegistry::new(gpu, video, scene);
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            tracing::error!(%error, "render pass creation failed validation");
            return Err(SetupError::Validation {
                what: "render passes",
                message: error.to_string(),
            });
        }

        let mut uniforms = EffectUniforms::from_config(config);
        uniforms.set_premultiplied_output(premultiplies(gpu.config.alpha_mode));

        tracing::info!(?view, width = gpu.width(), height = gpu.height(), "compositor ready");

        Ok(Self {
            registry,
            targets,
            occlusion,
            main,
            uniforms,
        })
    }

    pub fn uniforms(&self) -> &EffectUniforms {
        &self.uniforms
    }

    fn pipeline(&self, phase: Phase) -> &Pipeline {
        match phase {
            Phase::Occlusion => &self.occlusion,
            Phase::Main => &self.main,
        }
    }

    /// Runs the scene driver for `tick`.
    pub fn update(&mut self, tick: FrameTick, scene: &mut Scene, camera: &Camera) {
        driver::update(tick, scene, camera, &mut self.uniforms);
    }

    /// Renders one frame: occlusion phase, then main phase, one submit.
    ///
    /// A lost, outdated or timed-out surface skips the frame. Only running
    /// out of GPU memory is an error.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &Scene,
        camera: &Camera,
        tick: FrameTick,
    ) -> Result<(), FrameError> {
        if self.targets.ensure_size(gpu) {
            let (width, height) = self.targets.main_size();
            self.registry.resize(gpu, width, height);
        }

        self.registry.prepare(
            gpu,
            &FrameState {
                uniforms: &self.uniforms,
                scene,
                camera,
            },
        );

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                tracing::warn!(%error, "reconfiguring surface, skipping frame");
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                return Err(FrameError::OutOfMemory);
            }
            Err(error) => {
                tracing::warn!(%error, "surface unavailable, skipping frame");
                return Ok(());
            }
        };
        let screen = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Compositor Encoder"),
            });

        for phase in FRAME_PHASES {
            let mut ctx = RenderContext {
                gpu,
                encoder: &mut encoder,
                frame: phase.frame(tick),
            };
            self.pipeline(phase)
                .encode(&self.registry, &self.targets, &mut ctx, &screen);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
