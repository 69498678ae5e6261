//! The hologram scene: one video quad, its glow-source twin, and a light.
//!
//! Both quads share geometry and the video texture. The item quad is drawn by
//! the main pipeline; the occlusion twin is tinted with the light colour and
//! drawn only by the occlusion pipeline, where it becomes the glow.

use glam::Vec3;

use crate::camera::Layer;
use crate::mesh::Transform;

/// Width and height of the video quad in world units.
pub const QUAD_SIZE: (f32, f32) = (9.0, 8.0);
/// Tint of the glow-source quad (`0x00baff`).
pub const LIGHT_COLOR: [f32; 3] = [0.0, 186.0 / 255.0, 1.0];
/// Opacity of the visible quad.
pub const ITEM_OPACITY: f32 = 0.7;
/// World position the light shafts radiate from.
pub const LIGHT_SOURCE: Vec3 = Vec3::new(0.0, -15.0, -15.0);

/// A textured quad on one visibility layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObject {
    pub transform: Transform,
    pub layer: Layer,
    /// RGB tint multiplied into the video texture, alpha is opacity.
    pub color: [f32; 4],
    /// Alpha-blended over the target instead of replacing it.
    pub transparent: bool,
}

/// Everything the scene pass rasterizes and the driver animates.
#[derive(Clone, Debug)]
pub struct Scene {
    pub item: SceneObject,
    pub occlusion: SceneObject,
    pub light_source: Vec3,
}

impl Default for Scene {
    fn default() -> Self {
        Self::hologram()
    }
}

impl Scene {
    pub fn hologram() -> Self {
        Self {
            item: SceneObject {
                transform: Transform::new(),
                layer: Layer::Default,
                color: [1.0, 1.0, 1.0, ITEM_OPACITY],
                transparent: true,
            },
            occlusion: SceneObject {
                transform: Transform::new(),
                layer: Layer::Occlusion,
                color: [LIGHT_COLOR[0], LIGHT_COLOR[1], LIGHT_COLOR[2], 1.0],
                transparent: false,
            },
            light_source: LIGHT_SOURCE,
        }
    }

    /// Objects in draw order.
    pub fn objects(&self) -> [&SceneObject; 2] {
        [&self.item, &self.occlusion]
    }

    /// Sways the item quad and copies its rotation onto the occlusion twin.
    pub fn animate(&mut self, elapsed: f32) {
        let rotation = &mut self.item.transform.rotation;
        rotation.y = (elapsed / 2.0).sin() / 15.0;
        rotation.z = (elapsed / 2.0).cos() / 50.0;
        self.occlusion.transform.rotation = self.item.transform.rotation;
    }
}
