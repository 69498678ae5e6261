//! Off-screen targets and the per-frame execution context.

use crate::camera::Layer;
use crate::clock::FrameTick;
use crate::config::OutputConfig;
use crate::gpu::GpuContext;

/// Format of every intermediate target. Straight (non-premultiplied) alpha.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// An off-screen render target used for intermediate pass results.
///
/// Render targets can be both rendered to (as a color attachment) and sampled
/// from (as a texture binding), which is what lets one pass write target A
/// while the next reads it and writes target B.
pub struct RenderTarget {
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    /// A view into the texture, used for render pass attachments and shader sampling.
    pub view: wgpu::TextureView,
    label: &'static str,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, label: &'static str, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            label,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reallocates the texture if the requested size differs.
    ///
    /// Returns `true` if a new texture was created. Contents are not preserved.
    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32) -> bool {
        if (self.width, self.height) == (width.max(1), height.max(1)) {
            return false;
        }
        *self = Self::new(gpu, self.label, width, height);
        true
    }
}

/// Names of the pooled targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetId {
    OcclusionPing,
    OcclusionPong,
    /// Output of the occlusion pipeline, read by the main pipeline's blend step.
    Glow,
    MainPing,
    MainPong,
}

/// Every intermediate target the two pipelines use.
///
/// Occlusion targets (including the glow) are sized `output × render_scale`;
/// main targets match the surface.
pub struct TargetPool {
    output: OutputConfig,
    occlusion_ping: RenderTarget,
    occlusion_pong: RenderTarget,
    glow: RenderTarget,
    main_ping: RenderTarget,
    main_pong: RenderTarget,
}

impl TargetPool {
    pub fn new(gpu: &GpuContext, output: &OutputConfig) -> Self {
        let (width, height) = (gpu.width(), gpu.height());
        let (ow, oh) = output.occlusion_size(width, height);
        tracing::debug!(width, height, occlusion_width = ow, occlusion_height = oh, "allocating render targets");

        Self {
            output: output.clone(),
            occlusion_ping: RenderTarget::new(gpu, "Occlusion Ping", ow, oh),
            occlusion_pong: RenderTarget::new(gpu, "Occlusion Pong", ow, oh),
            glow: RenderTarget::new(gpu, "Glow", ow, oh),
            main_ping: RenderTarget::new(gpu, "Main Ping", width, height),
            main_pong: RenderTarget::new(gpu, "Main Pong", width, height),
        }
    }

    pub fn get(&self, id: TargetId) -> &RenderTarget {
        match id {
            TargetId::OcclusionPing => &self.occlusion_ping,
            TargetId::OcclusionPong => &self.occlusion_pong,
            TargetId::Glow => &self.glow,
            TargetId::MainPing => &self.main_ping,
            TargetId::MainPong => &self.main_pong,
        }
    }

    pub fn view(&self, id: TargetId) -> &wgpu::TextureView {
        &self.get(id).view
    }

    pub fn main_size(&self) -> (u32, u32) {
        self.main_ping.size()
    }

    /// Follows the surface size. Returns `true` if anything was reallocated.
    pub fn ensure_size(&mut self, gpu: &GpuContext) -> bool {
        let (width, height) = (gpu.width(), gpu.height());
        let (ow, oh) = self.output.occlusion_size(width, height);

        let mut resized = false;
        for target in [&mut self.occlusion_ping, &mut self.occlusion_pong, &mut self.glow] {
            resized |= target.ensure_size(gpu, ow, oh);
        }
        for target in [&mut self.main_ping, &mut self.main_pong] {
            resized |= target.ensure_size(gpu, width, height);
        }

        if resized {
            tracing::debug!(width, height, "resized render targets");
        }
        resized
    }
}

/// What a single phase of the frame is rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Scene objects on this layer are drawn by the scene pass.
    pub layer: Layer,
    pub tick: FrameTick,
}

/// Execution context passed to each render node.
///
/// The `'a` lifetime ties all references to the frame's scope, so nodes cannot
/// hold onto resources beyond the current frame.
pub struct RenderContext<'a> {
    pub gpu: &'a GpuContext,
    /// Command encoder shared by both phases of the frame.
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub frame: FrameContext,
}
