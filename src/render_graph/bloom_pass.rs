//! Mip-chain bloom on the GPU.
//!
//! ```text
//! input ──high-pass──▶ bright
//! bright ──H──▶ h0 ──V──▶ v0 ──H──▶ h1 ──V──▶ v1 ... v4
//! input + Σ wᵢ·vᵢ ──composite──▶ target
//! ```
//!
//! Each level is half the size of the previous one, starting at half the main
//! target. Internal targets are owned here and follow the main target size.

use glam::Vec2;

use crate::effects::bloom::{self, MIP_LEVELS, MipBlurUniforms};
use crate::gpu::GpuContext;
use crate::render_graph::shader_pass::{FullscreenProgram, linear_sampler};
use crate::render_graph::{
    FrameState, PassInputs, RenderContext, RenderNode, RenderTarget, TARGET_FORMAT,
};

struct MipLevel {
    horizontal: RenderTarget,
    vertical: RenderTarget,
    horizontal_uniforms: wgpu::Buffer,
    vertical_uniforms: wgpu::Buffer,
}

pub struct BloomPass {
    high_pass: FullscreenProgram,
    blur: FullscreenProgram,
    composite: FullscreenProgram,
    high_pass_uniforms: wgpu::Buffer,
    composite_uniforms: wgpu::Buffer,
    sampler: wgpu::Sampler,
    bright: RenderTarget,
    levels: Vec<MipLevel>,
}

impl BloomPass {
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let high_pass = FullscreenProgram::new(
            gpu,
            "Bloom High Pass",
            include_str!("../shaders/bloom_high_pass.wgsl"),
            TARGET_FORMAT,
            0,
        );
        let blur = FullscreenProgram::new(
            gpu,
            "Bloom Blur",
            include_str!("../shaders/bloom_blur.wgsl"),
            TARGET_FORMAT,
            0,
        );
        let composite = FullscreenProgram::new(
            gpu,
            "Bloom Composite",
            include_str!("../shaders/bloom_composite.wgsl"),
            TARGET_FORMAT,
            MIP_LEVELS as u32,
        );

        let high_pass_uniforms =
            uniform_buffer::<bloom::HighPassUniforms>(gpu, "Bloom High Pass Uniforms");
        let composite_uniforms =
            uniform_buffer::<bloom::CompositeUniforms>(gpu, "Bloom Composite Uniforms");

        let levels = bloom::mip_sizes(width, height)
            .into_iter()
            .enumerate()
            .map(|(level, (w, h))| {
                let mip = MipLevel {
                    horizontal: RenderTarget::new(gpu, "Bloom Horizontal", w, h),
                    vertical: RenderTarget::new(gpu, "Bloom Vertical", w, h),
                    horizontal_uniforms: uniform_buffer::<MipBlurUniforms>(gpu, "Bloom Blur H"),
                    vertical_uniforms: uniform_buffer::<MipBlurUniforms>(gpu, "Bloom Blur V"),
                };
                write_blur_uniforms(gpu, &mip, level);
                mip
            })
            .collect();

        Self {
            high_pass,
            blur,
            composite,
            high_pass_uniforms,
            composite_uniforms,
            sampler: linear_sampler(&gpu.device, "Bloom Sampler"),
            bright: RenderTarget::new(gpu, "Bloom Bright", width, height),
            levels,
        }
    }

    fn bind(
        &self,
        gpu: &GpuContext,
        program: &FullscreenProgram,
        uniforms: &wgpu::Buffer,
        source: &wgpu::TextureView,
        extras: &[&wgpu::TextureView],
    ) -> wgpu::BindGroup {
        program.bind_group(gpu, uniforms, source, &self.sampler, extras)
    }
}

fn uniform_buffer<U>(gpu: &GpuContext, label: &str) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<U>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn write_blur_uniforms(gpu: &GpuContext, mip: &MipLevel, level: usize) {
    let size = mip.horizontal.size();
    let horizontal = MipBlurUniforms::new(level, Vec2::X, size);
    let vertical = MipBlurUniforms::new(level, Vec2::Y, size);
    gpu.queue
        .write_buffer(&mip.horizontal_uniforms, 0, bytemuck::bytes_of(&horizontal));
    gpu.queue
        .write_buffer(&mip.vertical_uniforms, 0, bytemuck::bytes_of(&vertical));
}

impl RenderNode for BloomPass {
    fn label(&self) -> &'static str {
        "Bloom"
    }

    fn prepare(&mut self, gpu: &GpuContext, frame: &FrameState) {
        let settings = frame.uniforms.bloom;
        gpu.queue.write_buffer(
            &self.high_pass_uniforms,
            0,
            bytemuck::bytes_of(&settings.high_pass_uniforms()),
        );
        gpu.queue.write_buffer(
            &self.composite_uniforms,
            0,
            bytemuck::bytes_of(&settings.composite_uniforms()),
        );
    }

    fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        self.bright.ensure_size(gpu, width, height);
        for (level, (mip, (w, h))) in self
            .levels
            .iter_mut()
            .zip(bloom::mip_sizes(width, height))
            .enumerate()
        {
            let resized_h = mip.horizontal.ensure_size(gpu, w, h);
            let resized_v = mip.vertical.ensure_size(gpu, w, h);
            if resized_h || resized_v {
                write_blur_uniforms(gpu, mip, level);
            }
        }
        tracing::debug!(width, height, "resized bloom mip chain");
    }

    fn execute(&self, ctx: &mut RenderContext, target: &wgpu::TextureView, inputs: PassInputs) {
        let Some(input) = inputs.primary else {
            tracing::warn!(pass = self.label(), "no input texture, skipping pass");
            return;
        };

        let gpu = ctx.gpu;
        let bright = self.bind(gpu, &self.high_pass, &self.high_pass_uniforms, input, &[]);
        self.high_pass.draw(ctx.encoder, &self.bright.view, &bright);

        let mut source = &self.bright.view;
        for mip in &self.levels {
            let h = self.bind(gpu, &self.blur, &mip.horizontal_uniforms, source, &[]);
            self.blur.draw(ctx.encoder, &mip.horizontal.view, &h);

            let v = self.bind(gpu, &self.blur, &mip.vertical_uniforms, &mip.horizontal.view, &[]);
            self.blur.draw(ctx.encoder, &mip.vertical.view, &v);

            source = &mip.vertical.view;
        }

        let levels: Vec<&wgpu::TextureView> =
            self.levels.iter().map(|mip| &mip.vertical.view).collect();
        let composite = self.bind(gpu, &self.composite, &self.composite_uniforms, input, &levels);
        self.composite.draw(ctx.encoder, target, &composite);
    }
}
