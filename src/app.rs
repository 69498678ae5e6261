//! Window and event loop that play a frame source as a hologram.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::clock::FrameClock;
use crate::compositor::{CompositeView, Compositor};
use crate::config::HologramConfig;
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::scene::Scene;
use crate::video::{FrameSource, VideoTexture};

/// Opens a transparent window and plays `source` as a hologram until closed.
///
/// Returns the first fatal setup or frame error, after the window has closed.
///
/// # Example
/// ```no_run
/// use holoframe::{CompositeView, HologramConfig, TestPattern};
///
/// let source = TestPattern::new(400, 500, 30.0)?;
/// holoframe::run(HologramConfig::default(), Box::new(source), CompositeView::Composite)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run(
    config: HologramConfig,
    source: Box<dyn FrameSource>,
    view: CompositeView,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = HoloApp {
        state: AppState::Pending {
            config,
            source: Some(source),
            view,
        },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

struct HoloApp {
    state: AppState,
    error: Option<AppError>,
}

enum AppState {
    Pending {
        config: HologramConfig,
        source: Option<Box<dyn FrameSource>>,
        view: CompositeView,
    },
    Running(Box<Running>),
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    video: VideoTexture,
    source: Box<dyn FrameSource>,
    compositor: Compositor,
    scene: Scene,
    camera: Camera,
    clock: FrameClock,
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &HologramConfig,
        source: Box<dyn FrameSource>,
        view: CompositeView,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title("holoframe")
            .with_transparent(true)
            .with_inner_size(LogicalSize::new(config.output.width, config.output.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let video = VideoTexture::for_source(&gpu, source.as_ref());
        let scene = Scene::hologram();
        let compositor = Compositor::new(&gpu, config, &video, &scene, view)?;

        let mut running = Self {
            window,
            gpu,
            video,
            source,
            compositor,
            scene,
            camera: Camera::new(),
            clock: FrameClock::new(),
        };
        running.fit_camera();

        let (width, height) = running.source.dimensions();
        tracing::info!(video_width = width, video_height = height, "hologram started");
        Ok(running)
    }

    fn fit_camera(&mut self) {
        let logical = self
            .window
            .inner_size()
            .to_logical::<f32>(self.window.scale_factor());
        self.camera.fit_to_window(logical.width);
        self.camera.aspect = self.gpu.aspect();
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.fit_camera();
    }

    fn redraw(&mut self) -> Result<(), AppError> {
        let tick = self.clock.tick();

        self.video
            .update(&self.gpu, self.source.as_mut(), tick.elapsed);
        self.compositor
            .update(tick, &mut self.scene, &self.camera);
        self.compositor
            .render(&self.gpu, &self.scene, &self.camera, tick)?;

        self.window.request_redraw();
        Ok(())
    }
}

impl HoloApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!(%error, "stopping");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for HoloApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending {
            config,
            source,
            view,
        } = &mut self.state
        else {
            return;
        };
        let Some(source) = source.take() else {
            return;
        };

        match Running::start(event_loop, config, source, *view) {
            Ok(running) => self.state = AppState::Running(Box::new(running)),
            Err(error) => self.fail(event_loop, error),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                running.fit_camera();
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = running.redraw() {
                    self.fail(event_loop, error);
                }
            }
            _ => {}
        }
    }
}
