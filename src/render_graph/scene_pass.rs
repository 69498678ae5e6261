//! Rasterizes the scene's video quads for the current layer.
//!
//! Three bind groups:
//! - **Group 0**: camera (view-projection matrix)
//! - **Group 1**: per-object model matrix and tint
//! - **Group 2**: video texture and sampler
//!
//! There is no depth buffer: each layer holds a single quad. Faces are not
//! culled, so the quad stays visible while it sways.

use crate::camera::Layer;
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::render_graph::{FrameState, PassInputs, RenderContext, RenderNode, TARGET_FORMAT};
use crate::scene::{QUAD_SIZE, Scene};
use crate::video::VideoTexture;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    /// RGB tint and opacity multiplied into the sampled video colour.
    pub color: [f32; 4],
}

struct ObjectSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layer: Layer,
    transparent: bool,
}

pub struct ScenePass {
    blended_pipeline: wgpu::RenderPipeline,
    opaque_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    objects: Vec<ObjectSlot>,
    texture_bind_group: wgpu::BindGroup,
    quad: Mesh,
}

impl ScenePass {
    /// Creates the pass with one uniform slot per object in `scene`.
    pub fn new(gpu: &GpuContext, video: &VideoTexture, scene: &Scene) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
        });

        // Camera uniform buffer (group 0)
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniforms"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group_layout = uniform_layout(device, "Camera Bind Group Layout");
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Object uniform buffers (group 1), one per object
        let object_bind_group_layout = uniform_layout(device, "Object Bind Group Layout");
        let objects = scene
            .objects()
            .iter()
            .map(|object| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Object Uniforms"),
                    size: std::mem::size_of::<ObjectUniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Object Bind Group"),
                    layout: &object_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                ObjectSlot {
                    buffer,
                    bind_group,
                    layer: object.layer,
                    transparent: object.transparent,
                }
            })
            .collect();

        // Video texture (group 2)
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Video Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Video Bind Group"),
            layout: &texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&video.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&video.sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &object_bind_group_layout,
                &texture_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let blended_pipeline = pipeline("Scene Blended Pipeline", wgpu::BlendState::ALPHA_BLENDING);
        let opaque_pipeline = pipeline("Scene Opaque Pipeline", wgpu::BlendState::REPLACE);

        Self {
            blended_pipeline,
            opaque_pipeline,
            camera_buffer,
            camera_bind_group,
            objects,
            texture_bind_group,
            quad: Mesh::quad(gpu, QUAD_SIZE.0, QUAD_SIZE.1),
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

impl RenderNode for ScenePass {
    fn label(&self) -> &'static str {
        "Scene Pass"
    }

    fn prepare(&mut self, gpu: &GpuContext, frame: &FrameState) {
        let camera = CameraUniforms {
            view_proj: frame.camera.view_projection().to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));

        for (slot, object) in self.objects.iter_mut().zip(frame.scene.objects()) {
            let uniforms = ObjectUniforms {
                model: object.transform.matrix().to_cols_array_2d(),
                color: object.color,
            };
            gpu.queue
                .write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&[uniforms]));
            slot.layer = object.layer;
            slot.transparent = object.transparent;
        }
    }

    fn execute(&self, ctx: &mut RenderContext, target: &wgpu::TextureView, _inputs: PassInputs) {
        let layer = ctx.frame.layer;
        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
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

        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(2, &self.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.vertex_buffer.slice(..));
        pass.set_index_buffer(self.quad.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for slot in self.objects.iter().filter(|slot| slot.layer == layer) {
            let pipeline = if slot.transparent {
                &self.blended_pipeline
            } else {
                &self.opaque_pipeline
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, &slot.bind_group, &[]);
            pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
        }
    }
}
