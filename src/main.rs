use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use holoframe::{CompositeView, FrameSource, HologramConfig, ImageSequence, TestPattern};

/// Plays a looping video as a holographic projection in a transparent window.
#[derive(Debug, Parser)]
#[command(name = "holoframe", version, about)]
struct Args {
    /// TOML file overriding the effect parameters.
    #[arg(long, env = "HOLOFRAME_CONFIG")]
    config: Option<PathBuf>,

    /// Image file or directory of frames. Plays a test pattern when omitted.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Playback rate of the frame source.
    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    /// Which image ends up on screen.
    #[arg(long, value_enum, default_value_t = View::Composite)]
    view: View,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum View {
    /// The finished hologram.
    Composite,
    /// The occlusion glow on its own.
    Glow,
}

impl From<View> for CompositeView {
    fn from(view: View) -> Self {
        match view {
            View::Composite => CompositeView::Composite,
            View::Glow => CompositeView::Glow,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => HologramConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HologramConfig::default(),
    };

    let source: Box<dyn FrameSource> = match &args.frames {
        Some(path) => Box::new(
            ImageSequence::open(path, args.fps)
                .with_context(|| format!("opening frames at {}", path.display()))?,
        ),
        None => {
            tracing::info!("no frames given, playing the test pattern");
            Box::new(
                TestPattern::new(config.output.width, config.output.height, args.fps)
                    .context("creating the test pattern")?,
            )
        }
    };

    holoframe::run(config, source, args.view.into()).context("running the hologram")
}
