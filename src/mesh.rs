//! Quad geometry and transforms for the hologram scene.
//!
//! The scene only ever draws flat, video-textured quads, so the vertex format
//! carries a position and a texture coordinate and nothing else.
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | uv        | Float32x2 | 12     | 1               |

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::gpu::GpuContext;

/// A vertex with a model-space position and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    /// Texture coordinates with `v = 0` on the top row of the image.
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout matching `scene.wgsl`.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Vertices and indices of a `width` × `height` quad in the XY plane,
/// centred on the origin and facing +Z.
pub fn quad_geometry(width: f32, height: f32) -> ([Vertex3d; 4], [u32; 6]) {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let vertices = [
        Vertex3d::new([-hw, -hh, 0.0], [0.0, 1.0]),
        Vertex3d::new([hw, -hh, 0.0], [1.0, 1.0]),
        Vertex3d::new([hw, hh, 0.0], [1.0, 0.0]),
        Vertex3d::new([-hw, hh, 0.0], [0.0, 0.0]),
    ];
    (vertices, [0, 1, 2, 0, 2, 3])
}

/// GPU-resident geometry with vertex and index buffers.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data to GPU buffers.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Creates a textured quad. See [`quad_geometry`].
    pub fn quad(gpu: &GpuContext, width: f32, height: f32) -> Self {
        let (vertices, indices) = quad_geometry(width, height);
        Self::new(gpu, &vertices, &indices)
    }
}

/// Position, Euler rotation, and scale of a scene object.
///
/// Rotation is stored as XYZ Euler angles in radians so the frame driver can
/// set individual axes directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_spans_requested_size() {
        let (vertices, indices) = quad_geometry(9.0, 8.0);

        let xs: Vec<f32> = vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 4.5);
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -4.5);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 4.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -4.0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn quad_maps_top_of_image_to_top_edge() {
        let (vertices, _) = quad_geometry(2.0, 2.0);
        for vertex in vertices {
            let expected_v = if vertex.position[1] > 0.0 { 0.0 } else { 1.0 };
            assert_eq!(vertex.uv[1], expected_v);
        }
    }

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::new().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn y_rotation_turns_x_axis_towards_minus_z() {
        let transform = Transform {
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Transform::default()
        };
        let rotated = transform.matrix().transform_vector3(Vec3::X);
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }
}
