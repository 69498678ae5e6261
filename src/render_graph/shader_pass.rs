//! Fullscreen-triangle shader passes.
//!
//! Every post-process shader shares the same binding scheme:
//!
//! ```wgsl
//! @group(0) @binding(0) var<uniform> u: Uniforms;
//! @group(0) @binding(1) var input_texture: texture_2d<f32>;
//! @group(0) @binding(2) var input_sampler: sampler;
//! // optional extra textures from binding 3 on, sampled with input_sampler
//! ```
//!
//! and gets the vertex stage from `shaders/fullscreen.wgsl`, which is
//! prepended to the fragment source.

use crate::effects::EffectUniforms;
use crate::gpu::GpuContext;
use crate::render_graph::{FrameState, PassInputs, RenderContext, RenderNode};

const FULLSCREEN_WGSL: &str = include_str!("../shaders/fullscreen.wgsl");

/// Joins the shared vertex stage with a fragment shader.
pub fn fullscreen_source(fragment: &str) -> String {
    format!("{FULLSCREEN_WGSL}\n{fragment}")
}

/// Linear, clamp-to-edge sampler used by every fullscreen pass.
pub fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// A compiled fullscreen shader and its bind group layout.
pub struct FullscreenProgram {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    extra_textures: u32,
}

impl FullscreenProgram {
    /// Compiles `fragment` (without the vertex stage) for a `format` target.
    ///
    /// `extra_textures` additional textures are bound from binding 3 onwards.
    pub fn new(
        gpu: &GpuContext,
        label: &'static str,
        fragment: &str,
        format: wgpu::TextureFormat,
        extra_textures: u32,
    ) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(fullscreen_source(fragment).into()),
        });

        let mut entries = vec![
            // Uniforms
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(1),
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        entries.extend((0..extra_textures).map(|i| texture_entry(3 + i)));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            label,
            pipeline,
            bind_group_layout,
            extra_textures,
        }
    }

    pub fn extra_textures(&self) -> u32 {
        self.extra_textures
    }

    /// Binds `uniforms`, the primary `input`, `sampler` and the extra textures.
    pub fn bind_group(
        &self,
        gpu: &GpuContext,
        uniforms: &wgpu::Buffer,
        input: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        extras: &[&wgpu::TextureView],
    ) -> wgpu::BindGroup {
        debug_assert_eq!(extras.len() as u32, self.extra_textures);

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];
        entries.extend(extras.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: 3 + i as u32,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.label),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    /// Clears `target` to transparent black and draws the fullscreen triangle.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// A single-shader post-process pass with typed uniforms `U`.
///
/// `U` is taken from [`EffectUniforms`] by the `select` function during
/// `prepare`; the pass itself never changes uniform values.
pub struct ShaderPass<U> {
    program: FullscreenProgram,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    select: fn(&EffectUniforms) -> U,
}

impl<U: bytemuck::Pod> ShaderPass<U> {
    /// A pass sampling only its primary input.
    pub fn new(
        gpu: &GpuContext,
        label: &'static str,
        fragment: &str,
        format: wgpu::TextureFormat,
        select: fn(&EffectUniforms) -> U,
    ) -> Self {
        Self::build(gpu, label, fragment, format, select, 0)
    }

    /// A pass that also samples a secondary texture at binding 3.
    pub fn with_secondary(
        gpu: &GpuContext,
        label: &'static str,
        fragment: &str,
        format: wgpu::TextureFormat,
        select: fn(&EffectUniforms) -> U,
    ) -> Self {
        Self::build(gpu, label, fragment, format, select, 1)
    }

    fn build(
        gpu: &GpuContext,
        label: &'static str,
        fragment: &str,
        format: wgpu::TextureFormat,
        select: fn(&EffectUniforms) -> U,
        extra_textures: u32,
    ) -> Self {
        let program = FullscreenProgram::new(gpu, label, fragment, format, extra_textures);

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<U>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            program,
            uniform_buffer,
            sampler: linear_sampler(&gpu.device, label),
            select,
        }
    }
}

impl<U: bytemuck::Pod> RenderNode for ShaderPass<U> {
    fn label(&self) -> &'static str {
        self.program.label
    }

    fn prepare(&mut self, gpu: &GpuContext, frame: &FrameState) {
        let uniforms = (self.select)(frame.uniforms);
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    fn execute(&self, ctx: &mut RenderContext, target: &wgpu::TextureView, inputs: PassInputs) {
        let Some(input) = inputs.primary else {
            tracing::warn!(pass = self.label(), "no input texture, skipping pass");
            return;
        };

        let secondary = match (self.program.extra_textures(), inputs.secondary) {
            (0, _) => None,
            (_, Some(view)) => Some(view),
            (_, None) => {
                tracing::warn!(pass = self.label(), "no secondary texture, skipping pass");
                return;
            }
        };

        let extras: Vec<&wgpu::TextureView> = secondary.into_iter().collect();
        let bind_group =
            self.program
                .bind_group(ctx.gpu, &self.uniform_buffer, input, &self.sampler, &extras);
        self.program.draw(ctx.encoder, target, &bind_group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_appended_after_vertex_stage() {
        let source = fullscreen_source("@fragment fn fs() {}");
        let vs = source.find("fn vs").unwrap();
        let fs = source.find("fn fs").unwrap();
        assert!(vs < fs);
        assert!(source.contains("fn tex_uv"));
    }
}
