//! The core render node trait for the render graph.

use crate::camera::Camera;
use crate::effects::EffectUniforms;
use crate::gpu::GpuContext;
use crate::render_graph::RenderContext;
use crate::scene::Scene;

/// Textures a node samples from for one execution.
#[derive(Clone, Copy, Default)]
pub struct PassInputs<'a> {
    /// Output of the previous step, or the glow when a pipeline starts from it.
    /// `None` for the scene pass.
    pub primary: Option<&'a wgpu::TextureView>,
    /// The captured glow, bound only for the blend step.
    pub secondary: Option<&'a wgpu::TextureView>,
}

/// Everything a node may read while uploading its per-tick uniforms.
pub struct FrameState<'a> {
    pub uniforms: &'a EffectUniforms,
    pub scene: &'a Scene,
    pub camera: &'a Camera,
}

/// A render pass the pipelines can schedule.
///
/// Each tick the compositor calls [`prepare`](Self::prepare) once per node,
/// then [`execute`](Self::execute) once for every step that references it.
/// A node shared by both pipelines therefore sees the same uniform values in
/// both phases of a frame.
///
/// ```ignore
/// impl RenderNode for MyNode {
///     fn label(&self) -> &'static str { "My Node" }
///
///     fn execute(&self, ctx: &mut RenderContext, target: &wgpu::TextureView, inputs: PassInputs) {
///         let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
///             color_attachments: &[Some(wgpu::RenderPassColorAttachment {
///                 view: target,
///                 // ... configure load/store ops
///             })],
///             // ...
///         });
///         pass.set_pipeline(&self.pipeline);
///         pass.draw(0..3, 0..1);  // Full-screen triangle
///     }
/// }
/// ```
pub trait RenderNode {
    /// Name used in GPU debug labels and log messages.
    fn label(&self) -> &'static str;

    /// Records this node's draw into `ctx.encoder`, writing `target`.
    fn execute(&self, ctx: &mut RenderContext, target: &wgpu::TextureView, inputs: PassInputs);

    /// Uploads uniforms for the coming tick.
    fn prepare(&mut self, _gpu: &GpuContext, _frame: &FrameState) {}

    /// Called after the main targets were reallocated at `width` x `height`.
    fn resize(&mut self, _gpu: &GpuContext, _width: u32, _height: u32) {}
}
