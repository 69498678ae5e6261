//! Ordered pass sequences with explicit texture threading.
//!
//! A [`Pipeline`] is validated once at setup and resolved into a plan: for
//! every step, which texture it samples and which target it writes. Steps that
//! forward their output swap the ping-pong pair so the next step reads what
//! was just written; the last step always writes the pipeline's [`Terminal`].
//!
//! ```text
//! scene ──▶ ping ──▶ pong ──▶ ping ──▶ ... ──▶ terminal (screen or capture)
//! ```

use crate::error::SetupError;
use crate::render_graph::{PassId, PassInputs, PassRegistry, RenderContext, TargetId, TargetPool};

/// What a step samples as its primary input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepInput {
    /// Nothing; the step rasterizes the scene. Only valid for the first step.
    Scene,
    /// The output of the previous forwarding step.
    Previous,
    /// The occlusion pipeline's captured glow.
    Glow,
}

/// One entry of a pipeline definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub pass: PassId,
    pub input: StepInput,
    /// Whether the next step reads this step's output.
    pub forwards_output: bool,
    /// Whether the captured glow is bound as the secondary texture.
    pub glow: bool,
}

impl Step {
    /// Scene render for the phase's layer.
    pub fn scene() -> Self {
        Self {
            pass: PassId::Scene,
            input: StepInput::Scene,
            forwards_output: true,
            glow: false,
        }
    }

    /// A post-process pass reading the previous output.
    pub fn effect(pass: PassId) -> Self {
        Self {
            pass,
            input: StepInput::Previous,
            forwards_output: true,
            glow: false,
        }
    }

    /// A pass whose primary input is the captured glow.
    pub fn reading_glow(pass: PassId) -> Self {
        Self {
            input: StepInput::Glow,
            ..Self::effect(pass)
        }
    }

    /// Also bind the captured glow as the secondary texture.
    pub fn with_glow(self) -> Self {
        Self { glow: true, ..self }
    }

    /// The step's output is not read by a following step.
    pub fn capture(self) -> Self {
        Self {
            forwards_output: false,
            ..self
        }
    }

    fn reads_glow(&self) -> bool {
        self.glow || self.input == StepInput::Glow
    }
}

/// Where a planned step samples its primary input from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Scene,
    Target(TargetId),
}

/// Where a planned step writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    Target(TargetId),
    Screen,
}

/// Where the last step of a pipeline writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    Screen,
    Capture(TargetId),
}

impl From<Terminal> for Destination {
    fn from(terminal: Terminal) -> Self {
        match terminal {
            Terminal::Screen => Destination::Screen,
            Terminal::Capture(id) => Destination::Target(id),
        }
    }
}

/// A resolved step: pass, input and output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannedStep {
    pub pass: PassId,
    pub input: Source,
    pub output: Destination,
    pub glow: Option<TargetId>,
}

#[derive(Debug)]
pub struct Pipeline {
    name: &'static str,
    plan: Vec<PlannedStep>,
}

impl Pipeline {
    /// Validates `steps` and resolves the plan.
    ///
    /// The first step must render the scene or read the glow, and only the
    /// first step may render the scene. `ping` and `pong` must be distinct
    /// targets, and a pipeline may not read the target it captures into.
    pub fn new(
        name: &'static str,
        steps: Vec<Step>,
        ping: TargetId,
        pong: TargetId,
        terminal: Terminal,
    ) -> Result<Self, SetupError> {
        let invalid = |reason: String| SetupError::InvalidPipeline {
            pipeline: name,
            reason,
        };

        let Some(first) = steps.first() else {
            return Err(invalid("pipeline has no steps".into()));
        };
        if first.input == StepInput::Previous {
            return Err(invalid(format!(
                "first step {:?} has no previous output to read",
                first.pass
            )));
        }
        for (index, step) in steps.iter().enumerate() {
            if (step.pass == PassId::Scene) != (step.input == StepInput::Scene) {
                return Err(invalid(format!(
                    "step {index} ({:?}) pairs the scene pass with a non-scene input",
                    step.pass
                )));
            }
            if index > 0 && step.input == StepInput::Scene {
                return Err(invalid(format!(
                    "scene render at step {index}; only the first step may render the scene"
                )));
            }
        }
        if ping == pong {
            return Err(invalid(format!("ping and pong are both {ping:?}")));
        }
        if let Terminal::Capture(id) = terminal {
            if id == ping || id == pong {
                return Err(invalid(format!("capture target {id:?} is also a ping-pong target")));
            }
            if id == TargetId::Glow && steps.iter().any(Step::reads_glow) {
                return Err(invalid("pipeline reads the glow it captures".into()));
            }
        }

        let plan = resolve(&steps, ping, pong, terminal);
        tracing::debug!(pipeline = name, ?plan, "resolved pipeline plan");
        Ok(Self { name, plan })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn plan(&self) -> &[PlannedStep] {
        &self.plan
    }

    /// Records every step into `ctx.encoder`, in order.
    pub fn encode(
        &self,
        registry: &PassRegistry,
        targets: &TargetPool,
        ctx: &mut RenderContext,
        screen: &wgpu::TextureView,
    ) {
        let _span = tracing::trace_span!(
            "pipeline",
            name = self.name,
            layer = ?ctx.frame.layer,
            elapsed = ctx.frame.tick.elapsed,
        )
        .entered();

        for step in &self.plan {
            let inputs = PassInputs {
                primary: match step.input {
                    Source::Scene => None,
                    Source::Target(id) => Some(targets.view(id)),
                },
                secondary: step.glow.map(|id| targets.view(id)),
            };
            let target = match step.output {
                Destination::Target(id) => targets.view(id),
                Destination::Screen => screen,
            };
            registry.get(step.pass).execute(ctx, target, inputs);
        }
    }
}

fn resolve(steps: &[Step], ping: TargetId, pong: TargetId, terminal: Terminal) -> Vec<PlannedStep> {
    let (mut read, mut write) = (pong, ping);
    let last = steps.len() - 1;

    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            let input = match step.input {
                StepInput::Scene => Source::Scene,
                StepInput::Previous => Source::Target(read),
                StepInput::Glow => Source::Target(TargetId::Glow),
            };
            let output = if index == last {
                terminal.into()
            } else {
                Destination::Target(write)
            };
            if index != last && step.forwards_output {
                std::mem::swap(&mut read, &mut write);
            }
            PlannedStep {
                pass: step.pass,
                input,
                output,
                glow: step.glow.then_some(TargetId::Glow),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(steps: Vec<Step>, terminal: Terminal) -> Result<Pipeline, SetupError> {
        Pipeline::new(
            "test",
            steps,
            TargetId::MainPing,
            TargetId::MainPong,
            terminal,
        )
    }

    fn reason(result: Result<Pipeline, SetupError>) -> String {
        match result {
            Err(SetupError::InvalidPipeline { reason, .. }) => reason,
            other => panic!("expected an invalid pipeline, got {other:?}"),
        }
    }

    #[test]
    fn forwarding_steps_alternate_targets() {
        let p = pipeline(
            vec![
                Step::scene(),
                Step::effect(PassId::Film),
                Step::effect(PassId::BadTv),
                Step::effect(PassId::BlackKey),
            ],
            Terminal::Screen,
        )
        .unwrap();

        let io: Vec<_> = p.plan().iter().map(|s| (s.input, s.output)).collect();
        assert_eq!(
            io,
            vec![
                (Source::Scene, Destination::Target(TargetId::MainPing)),
                (
                    Source::Target(TargetId::MainPing),
                    Destination::Target(TargetId::MainPong)
                ),
                (
                    Source::Target(TargetId::MainPong),
                    Destination::Target(TargetId::MainPing)
                ),
                (Source::Target(TargetId::MainPing), Destination::Screen),
            ]
        );
    }

    #[test]
    fn non_forwarding_step_keeps_the_read_target() {
        let p = pipeline(
            vec![
                Step::scene(),
                Step::effect(PassId::Film).capture(),
                Step::effect(PassId::BlackKey),
            ],
            Terminal::Screen,
        )
        .unwrap();

        assert_eq!(p.plan()[1].output, Destination::Target(TargetId::MainPong));
        assert_eq!(p.plan()[2].input, Source::Target(TargetId::MainPing));
    }

    #[test]
    fn single_step_writes_terminal() {
        let p = pipeline(
            vec![Step::reading_glow(PassId::PassThrough)],
            Terminal::Screen,
        )
        .unwrap();

        assert_eq!(
            p.plan(),
            &[PlannedStep {
                pass: PassId::PassThrough,
                input: Source::Target(TargetId::Glow),
                output: Destination::Screen,
                glow: None,
            }]
        );
    }

    #[test]
    fn glow_is_bound_only_where_requested() {
        let p = pipeline(
            vec![
                Step::scene(),
                Step::effect(PassId::AdditiveBlend).with_glow(),
                Step::effect(PassId::BlackKey),
            ],
            Terminal::Screen,
        )
        .unwrap();

        let glow: Vec<_> = p.plan().iter().map(|s| s.glow).collect();
        assert_eq!(glow, vec![None, Some(TargetId::Glow), None]);
    }

    #[test]
    fn rejects_empty_pipeline() {
        assert!(reason(pipeline(vec![], Terminal::Screen)).contains("no steps"));
    }

    #[test]
    fn rejects_effect_as_first_step() {
        let result = pipeline(vec![Step::effect(PassId::Film)], Terminal::Screen);
        assert!(reason(result).contains("first step"));
    }

    #[test]
    fn rejects_late_scene_render() {
        let result = pipeline(
            vec![Step::scene(), Step::effect(PassId::Film), Step::scene()],
            Terminal::Screen,
        );
        assert!(reason(result).contains("only the first step"));
    }

    #[test]
    fn rejects_scene_pass_reading_a_texture() {
        let result = pipeline(
            vec![Step::scene(), Step::effect(PassId::Scene)],
            Terminal::Screen,
        );
        assert!(reason(result).contains("scene pass"));
    }

    #[test]
    fn rejects_shared_ping_pong() {
        let result = Pipeline::new(
            "test",
            vec![Step::scene()],
            TargetId::MainPing,
            TargetId::MainPing,
            Terminal::Screen,
        );
        assert!(reason(result).contains("ping and pong"));
    }

    #[test]
    fn rejects_reading_the_capture_target() {
        let result = Pipeline::new(
            "test",
            vec![Step::scene(), Step::effect(PassId::AdditiveBlend).with_glow()],
            TargetId::OcclusionPing,
            TargetId::OcclusionPong,
            Terminal::Capture(TargetId::Glow),
        );
        assert!(reason(result).contains("reads the glow"));
    }
}
