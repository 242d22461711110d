//! ISE demo - spinning textured model
//!
//! Keys: `A` rebuilds the renderer on a new window and device, `Escape` quits.
//! Usage: `ise_demo [ASSET_DIR]`

mod assets;
mod obj_loader;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ise_engine::glam::Mat4;
use ise_engine::ise::event::{EventPump, EventPumpConfig, WindowEvent as PumpEvent};
use ise_engine::ise::{Error, Projection, Renderer, RendererConfig, Result};
use ise_engine::{engine_error, engine_info, engine_warn};
use ise_engine_renderer_vulkan::ise::{validation_stats, vulkan_device_factory};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::assets::{asset_dir, DemoAssets};

/// Window event drains per second on the event thread
const EVENT_PUMP_RATE: u32 = 2000;

/// How often the window thread checks the pump's latched requests
const REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct DemoApp {
    assets: DemoAssets,
    config: RendererConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    pump: Option<EventPump>,
    failure: Option<Error>,
}

impl DemoApp {
    fn new(assets: DemoAssets) -> Self {
        let config = RendererConfig {
            app_name: "ISE Demo".to_string(),
            projection: Projection::Perspective { fov_y_degrees: 45.0 },
            ..RendererConfig::default()
        };
        Self { assets, config, window: None, renderer: None, pump: None, failure: None }
    }

    fn launch(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = create_window(event_loop)?;

        let mut renderer = Renderer::new(
            vulkan_device_factory(Arc::clone(&window)),
            self.assets.shaders.clone(),
            self.config.clone(),
        )?;
        let pump = EventPump::spawn(
            EventPumpConfig { max_pumps_per_second: EVENT_PUMP_RATE },
            renderer.resize_handle(),
        )?;

        populate_scene(&renderer, &self.assets)?;
        renderer.start()?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.pump = Some(pump);
        Ok(())
    }

    /// Full teardown and setup on a new window and device; the scene is
    /// loaded again
    ///
    /// The old window lives until the old device (which holds its surface)
    /// is dropped by `Renderer::recreate`.
    fn recreate(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let window = create_window(event_loop)?;
        self.window = Some(Arc::clone(&window));
        renderer.recreate(Some(vulkan_device_factory(window)))?;
        populate_scene(renderer, &self.assets)
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut pump) = self.pump.take() {
            pump.shutdown();
        }
        if let Some(mut renderer) = self.renderer.take() {
            let stats = renderer.stats();
            if let Err(e) = renderer.stop() {
                engine_error!("ise::demo", "Renderer stopped with an error: {}", e);
                self.failure.get_or_insert(e);
            }
            engine_info!(
                "ise::demo",
                "{} frames presented, {} swapchain recreations",
                stats.frames_presented,
                stats.swapchain_recreations
            );
        }

        let validation = validation_stats();
        if validation.errors > 0 || validation.warnings > 0 {
            engine_warn!(
                "ise::demo",
                "Validation reported {} errors and {} warnings",
                validation.errors,
                validation.warnings
            );
        }
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        engine_error!("ise::demo", "{}", error);
        self.failure = Some(error);
        self.shutdown(event_loop);
    }
}

fn create_window(event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
    let attributes = Window::default_attributes()
        .with_title("ISE Demo")
        .with_inner_size(LogicalSize::new(800.0, 600.0))
        .with_min_inner_size(LogicalSize::new(250.0, 250.0));
    event_loop
        .create_window(attributes)
        .map(Arc::new)
        .map_err(|e| Error::InitializationFailed(format!("cannot create window: {}", e)))
}

fn populate_scene(renderer: &Renderer, assets: &DemoAssets) -> Result<()> {
    renderer.create_texture("model_texture", &assets.texture)?;
    let object = renderer.create_render_object("model")?;
    renderer.set_object_textures(object, &["model_texture"])?;
    renderer.bind_object_textures(object)?;
    renderer.load_geometry(object, &assets.mesh, Mat4::IDENTITY)
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.launch(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(pump) = self.pump.as_ref() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => pump.push(PumpEvent::Resized { width: size.width, height: size.height }),
            WindowEvent::CloseRequested => pump.push(PumpEvent::CloseRequested),
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state: ElementState::Pressed, repeat: false, .. },
                ..
            } => match code {
                KeyCode::KeyA => pump.push(PumpEvent::RecreateRequested),
                KeyCode::Escape => pump.push(PumpEvent::CloseRequested),
                _ => {}
            },
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(pump) = self.pump.as_ref() else {
            return;
        };

        if pump.take_quit_request() {
            engine_info!("ise::demo", "Quit requested");
            self.shutdown(event_loop);
            return;
        }

        if pump.take_recreate_request() {
            if let Err(e) = self.recreate(event_loop) {
                self.fail(event_loop, e);
                return;
            }
        }

        // The render thread ended on its own: a fatal error
        if let Some(renderer) = self.renderer.as_ref() {
            if !renderer.is_rendering() {
                let error = match renderer.wait_until_stopped() {
                    Err(e) => e,
                    Ok(()) => Error::InvalidState("render thread exited unexpectedly".to_string()),
                };
                self.fail(event_loop, error);
                return;
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + REQUEST_POLL_INTERVAL));
    }
}

fn main() -> ExitCode {
    let assets = match DemoAssets::load(&asset_dir()) {
        Ok(assets) => assets,
        Err(e) => {
            engine_error!("ise::demo", "{}", e);
            return ExitCode::FAILURE;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            engine_error!("ise::demo", "Cannot create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = DemoApp::new(assets);
    if let Err(e) = event_loop.run_app(&mut app) {
        engine_error!("ise::demo", "Event loop error: {}", e);
        return ExitCode::FAILURE;
    }

    match app.failure {
        Some(_) => ExitCode::FAILURE,
        None => ExitCode::SUCCESS,
    }
}
