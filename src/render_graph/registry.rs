//! The compositor's set of passes, addressed by [`PassId`].
//!
//! Each pass exists once. The bad-TV pass is referenced by both pipelines and
//! so uploads its uniforms once per tick for both phases.

use crate::effects::{self, EffectUniforms, NoUniforms, PassThroughUniforms};
use crate::gpu::GpuContext;
use crate::render_graph::{BloomPass, FrameState, RenderNode, ScenePass, ShaderPass, TARGET_FORMAT};
use crate::scene::Scene;
use crate::video::VideoTexture;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassId {
    Scene,
    HorizontalBlur,
    VerticalBlur,
    BadTv,
    VolumetricLight,
    Bloom,
    Film,
    AdditiveBlend,
    BlackKey,
    PassThrough,
}

pub struct PassRegistry {
    scene: ScenePass,
    horizontal_blur: ShaderPass<effects::BlurUniforms>,
    vertical_blur: ShaderPass<effects::BlurUniforms>,
    bad_tv: ShaderPass<effects::BadTvUniforms>,
    volumetric_light: ShaderPass<effects::VolumetricLightUniforms>,
    bloom: BloomPass,
    film: ShaderPass<effects::FilmUniforms>,
    additive_blend: ShaderPass<NoUniforms>,
    black_key: ShaderPass<effects::BlackKeyUniforms>,
    pass_through: ShaderPass<PassThroughUniforms>,
}

impl PassRegistry {
    /// Builds every pass. Passes that write the surface use its format.
    pub fn new(gpu: &GpuContext, video: &VideoTexture, scene: &Scene) -> Self {
        let surface_format = gpu.config.format;
        let blur = include_str!("../shaders/blur.wgsl");

        Self {
            scene: ScenePass::new(gpu, video, scene),
            horizontal_blur: ShaderPass::new(
                gpu,
                "Horizontal Blur",
                blur,
                TARGET_FORMAT,
                |u: &EffectUniforms| u.horizontal_blur,
            ),
            vertical_blur: ShaderPass::new(
                gpu,
                "Vertical Blur",
                blur,
                TARGET_FORMAT,
                |u: &EffectUniforms| u.vertical_blur,
            ),
            bad_tv: ShaderPass::new(
                gpu,
                "Bad TV",
                include_str!("../shaders/bad_tv.wgsl"),
                TARGET_FORMAT,
                |u: &EffectUniforms| u.bad_tv,
            ),
            volumetric_light: ShaderPass::new(
                gpu,
                "Volumetric Light",
                include_str!("../shaders/volumetric_light.wgsl"),
                TARGET_FORMAT,
                |u: &EffectUniforms| u.volumetric_light,
            ),
            bloom: BloomPass::new(gpu, gpu.width(), gpu.height()),
            film: ShaderPass::new(
                gpu,
                "Film",
                include_str!("../shaders/film.wgsl"),
                TARGET_FORMAT,
                |u: &EffectUniforms| u.film,
            ),
            additive_blend: ShaderPass::with_secondary(
                gpu,
                "Additive Blend",
                include_str!("../shaders/additive_blend.wgsl"),
                TARGET_FORMAT,
                |_: &EffectUniforms| NoUniforms::default(),
            ),
            black_key: ShaderPass::new(
                gpu,
                "Black Key",
                include_str!("../shaders/black_key.wgsl"),
                surface_format,
                |u: &EffectUniforms| u.black_key,
            ),
            pass_through: ShaderPass::new(
                gpu,
                "Pass Through",
                include_str!("../shaders/pass_through.wgsl"),
                surface_format,
                |u: &EffectUniforms| u.pass_through,
            ),
        }
    }

    pub fn get(&self, id: PassId) -> &dyn RenderNode {
        match id {
            PassId::Scene => &self.scene,
            PassId::HorizontalBlur => &self.horizontal_blur,
            PassId::VerticalBlur => &self.vertical_blur,
            PassId::BadTv => &self.bad_tv,
            PassId::VolumetricLight => &self.volumetric_light,
            PassId::Bloom => &self.bloom,
            PassId::Film => &self.film,
            PassId::AdditiveBlend => &self.additive_blend,
            PassId::BlackKey => &self.black_key,
            PassId::PassThrough => &self.pass_through,
        }
    }

    fn nodes_mut(&mut self) -> [&mut dyn RenderNode; 10] {
        [
            &mut self.scene,
            &mut self.horizontal_blur,
            &mut self.vertical_blur,
            &mut self.bad_tv,
            &mut self.volumetric_light,
            &mut self.bloom,
            &mut self.film,
            &mut self.additive_blend,
            &mut self.black_key,
            &mut self.pass_through,
        ]
    }

    /// Uploads this tick's uniforms, once per pass.
    pub fn prepare(&mut self, gpu: &GpuContext, frame: &FrameState) {
        for node in self.nodes_mut() {
            node.prepare(gpu, frame);
        }
    }

    /// Propagates a main-target resize to every pass.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) {
        for node in self.nodes_mut() {
            node.resize(gpu, width, height);
        }
    }
}
