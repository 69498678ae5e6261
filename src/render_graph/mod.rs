//! Multi-pass rendering: passes, targets and the pipelines that order them.
//!
//! Every pass lives once in the [`PassRegistry`]. A [`Pipeline`] is an
//! ordered list of [`PassId`]s resolved at setup into a plan that says which
//! texture each step reads and which target it writes:
//!
//! ```text
//!  occlusion:  Scene ─▶ H ─▶ V ─▶ H ─▶ V ─▶ H ─▶ Bad TV ─▶ Volumetric ─▶ [Glow]
//!                                                                         │
//!  main:       Scene ─▶ Bloom ─▶ Bad TV ─▶ Film ─▶ Additive Blend ◀───────┘
//!                                                        │
//!                                                        ▼
//!                                                    Black Key ─▶ Screen
//! ```
//!
//! Each pipeline ping-pongs between its own pair of [`RenderTarget`]s. Only
//! the glow target is shared.

mod bloom_pass;
mod pipeline;
mod registry;
mod render_node;
mod render_target;
mod scene_pass;
mod shader_pass;

pub use bloom_pass::BloomPass;
pub use pipeline::{Destination, Pipeline, PlannedStep, Source, Step, StepInput, Terminal};
pub use registry::{PassId, PassRegistry};
pub use render_node::{FrameState, PassInputs, RenderNode};
pub use render_target::{
    FrameContext, RenderContext, RenderTarget, TARGET_FORMAT, TargetId, TargetPool,
};
pub use scene_pass::{CameraUniforms, ObjectUniforms, ScenePass};
pub use shader_pass::{FullscreenProgram, ShaderPass, fullscreen_source};
