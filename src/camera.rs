//! Perspective camera shared by both pipelines.
//!
//! The camera never stores which visibility layer is active. Each pipeline
//! receives the layer through its [`FrameContext`](crate::FrameContext), so
//! rendering the occlusion pass cannot leak state into the main pass.

use glam::{Mat4, Vec3};

/// Which group of scene objects a pipeline draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Geometry seen by the main pipeline.
    #[default]
    Default,
    /// Glow-source geometry seen only by the occlusion pipeline.
    Occlusion,
}

/// Camera distance used when the window is at least [`NARROW_WIDTH`] wide.
pub const WIDE_DISTANCE: f32 = 5.0;
/// Camera distance used on narrow windows, so the quad still fits.
pub const NARROW_DISTANCE: f32 = 6.7;
/// Logical window width below which the camera pulls back.
pub const NARROW_WIDTH: f32 = 768.0;

/// A perspective camera looking down -Z from its position.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, WIDE_DISTANCE),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 75.0_f32.to_radians(),
            aspect: 400.0 / 500.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    /// Projection into wgpu clip space (depth in `[0, 1]`).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world-space point to normalized device coordinates.
    ///
    /// `x` and `y` are in `[-1, 1]` for points inside the frustum, with `+y`
    /// pointing up the screen.
    pub fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }

    /// Pulls the camera back on narrow windows.
    pub fn fit_to_window(&mut self, logical_width: f32) {
        self.position.z = if logical_width < NARROW_WIDTH {
            NARROW_DISTANCE
        } else {
            WIDE_DISTANCE
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn point_on_axis_projects_to_centre() {
        let camera = Camera::new();
        let ndc = camera.project(Vec3::new(0.0, 0.0, -10.0));

        assert!(ndc.x.abs() < EPSILON);
        assert!(ndc.y.abs() < EPSILON);
    }

    #[test]
    fn point_below_camera_projects_below_centre() {
        let camera = Camera::new();
        let ndc = camera.project(Vec3::new(0.0, -15.0, -15.0));

        assert!(ndc.x.abs() < EPSILON);
        assert!(ndc.y < 0.0);

        // tan(fov/2) sets the vertical extent of the frustum at unit depth.
        let depth = 20.0;
        let expected = -15.0 / (depth * (camera.fov / 2.0).tan());
        assert!((ndc.y - expected).abs() < 1e-4);
    }

    #[test]
    fn horizontal_projection_uses_aspect() {
        let camera = Camera::new();
        let ndc = camera.project(Vec3::new(1.0, 0.0, 0.0));

        let expected = 1.0 / (5.0 * camera.aspect * (camera.fov / 2.0).tan());
        assert!((ndc.x - expected).abs() < 1e-4);
    }

    #[test]
    fn narrow_windows_pull_the_camera_back() {
        let mut camera = Camera::new();

        camera.fit_to_window(500.0);
        assert_eq!(camera.position.z, NARROW_DISTANCE);

        camera.fit_to_window(1024.0);
        assert_eq!(camera.position.z, WIDE_DISTANCE);

        camera.fit_to_window(NARROW_WIDTH);
        assert_eq!(camera.position.z, WIDE_DISTANCE);
    }
}
