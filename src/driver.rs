//! Per-tick scene and uniform updates, run before every render.

use crate::camera::Camera;
use crate::clock::FrameTick;
use crate::effects::EffectUniforms;
use crate::scene::Scene;

/// Advances everything time-driven for one tick.
///
/// - film time by the measured delta, bad-TV time by its fixed step
/// - the quads' sway from the elapsed time
/// - the volumetric light position from the projected light source
pub fn update(tick: FrameTick, scene: &mut Scene, camera: &Camera, uniforms: &mut EffectUniforms) {
    uniforms.advance(tick);
    scene.animate(tick.elapsed);

    let ndc = camera.project(scene.light_source);
    uniforms.volumetric_light.set_light_from_ndc(ndc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::bad_tv;

    #[test]
    fn light_position_is_projected_into_uv_space() {
        let mut scene = Scene::hologram();
        let camera = Camera::new();
        let mut uniforms = EffectUniforms::default();

        update(FrameTick::new(0.0, 0.0), &mut scene, &camera, &mut uniforms);

        let ndc = camera.project(scene.light_source);
        let [x, y] = uniforms.volumetric_light.light_position;
        assert!((x - 0.5).abs() < 1e-5);
        assert!((y - (ndc.y + 1.0) / 2.0).abs() < 1e-6);
        // The light sits below the camera, so shafts come from the lower half.
        assert!(y < 0.5);
    }

    #[test]
    fn times_advance_independently() {
        let mut scene = Scene::hologram();
        let camera = Camera::new();
        let mut uniforms = EffectUniforms::default();

        let ticks = [
            FrameTick::new(0.016, 0.016),
            FrameTick::new(0.050, 0.034),
            FrameTick::new(0.066, 0.016),
        ];
        for tick in ticks {
            update(tick, &mut scene, &camera, &mut uniforms);
        }

        assert!((uniforms.film.time - 0.066).abs() < 1e-6);
        assert!((uniforms.bad_tv.time - 3.0 * bad_tv::TIME_STEP).abs() < 1e-6);
    }

    #[test]
    fn scene_follows_elapsed_time() {
        let mut scene = Scene::hologram();
        let camera = Camera::new();
        let mut uniforms = EffectUniforms::default();

        update(FrameTick::new(2.0, 0.016), &mut scene, &camera, &mut uniforms);

        let rotation = scene.item.transform.rotation;
        assert_eq!(rotation.y, 1.0_f32.sin() / 15.0);
        assert_eq!(rotation.z, 1.0_f32.cos() / 50.0);
        assert_eq!(scene.occlusion.transform.rotation, rotation);
    }

    #[test]
    fn moving_the_camera_moves_the_light() {
        let mut scene = Scene::hologram();
        let mut camera = Camera::new();
        let mut uniforms = EffectUniforms::default();

        update(FrameTick::default(), &mut scene, &camera, &mut uniforms);
        let wide = uniforms.volumetric_light.light_position;

        camera.fit_to_window(400.0);
        update(FrameTick::default(), &mut scene, &camera, &mut uniforms);
        let narrow = uniforms.volumetric_light.light_position;

        // Further away, the light projects closer to the centre.
        assert!(narrow[1] > wide[1]);
    }
}
