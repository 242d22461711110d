/// Renderer - lifecycle controller of a rendering session
///
/// Owns the renderer state behind one mutex and the render thread that
/// draws frames with it. The owning thread constructs, starts, stops and
/// recreates the renderer; any thread holding a reference may mutate
/// resources through the same mutex while frames are being drawn.
///
/// States: Uninitialized -> Running -> Stopping -> Stopped, with
/// Recreating returning to Running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use glam::Mat4;

use crate::clock::{pacing_delay, Clock, SystemClock};
use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::graphics_device::DeviceFactory;
use crate::renderer::{FrameStats, RendererState, ShaderSources};
use crate::resource::{ImageData, MeshData, RenderObjectKey};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Lifecycle of a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Set up, render thread not started yet
    Uninitialized,
    Running,
    /// Waiting for the render thread to finish its frame
    Stopping,
    /// GPU state released
    Stopped,
    /// Full stop + setup in progress
    Recreating,
}

/// Thread-safe handle setting the edge-triggered resize flag
///
/// Several notifications before the render thread consumes the flag
/// coalesce into one swapchain recreation.
#[derive(Debug, Clone)]
pub struct ResizeHandle {
    flag: Arc<AtomicBool>,
}

impl ResizeHandle {
    pub fn new() -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)) }
    }

    pub fn notify(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// A notification has not been consumed yet
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

impl Default for ResizeHandle {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    lifecycle: LifecycleState,
    /// Render thread keeps drawing while true
    accepting: bool,
    /// Render thread left its loop
    render_done: bool,
    fatal_error: Option<Error>,
    state: Option<RendererState>,
    /// Last stats published by the render thread
    stats: FrameStats,
}

struct Shared {
    inner: Mutex<Inner>,
    finished: Condvar,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::BackendError("renderer lock poisoned".to_string()))
    }
}

/// Signals the completion condition exactly once when the render loop
/// returns (or unwinds)
struct CompletionSignal {
    shared: Arc<Shared>,
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        let mut inner = match self.shared.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.render_done = true;
        inner.accepting = false;
        drop(inner);
        self.shared.finished.notify_all();
    }
}

pub struct Renderer {
    shared: Arc<Shared>,
    resize: ResizeHandle,
    factory: DeviceFactory,
    shaders: ShaderSources,
    config: RendererConfig,
    clock: Arc<dyn Clock>,
    render_thread: Option<JoinHandle<()>>,
    render_thread_id: Option<ThreadId>,
}

impl Renderer {
    /// Validate `config` and run the one-time setup on a device from
    /// `factory`
    pub fn new(factory: DeviceFactory, shaders: ShaderSources, config: RendererConfig) -> Result<Self> {
        Self::with_clock(factory, shaders, config, Arc::new(SystemClock::new()))
    }

    /// Same as `new` with an explicit animation/pacing clock
    pub fn with_clock(
        mut factory: DeviceFactory,
        shaders: ShaderSources,
        config: RendererConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let state = Self::setup(&mut factory, &shaders, &config)?;

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    lifecycle: LifecycleState::Uninitialized,
                    accepting: false,
                    render_done: false,
                    fatal_error: None,
                    state: Some(state),
                    stats: FrameStats::default(),
                }),
                finished: Condvar::new(),
            }),
            resize: ResizeHandle::new(),
            factory,
            shaders,
            config,
            clock,
            render_thread: None,
            render_thread_id: None,
        })
    }

    fn setup(
        factory: &mut DeviceFactory,
        shaders: &ShaderSources,
        config: &RendererConfig,
    ) -> Result<RendererState> {
        let device = factory(config)?;
        RendererState::new(device, shaders, config)
    }

    // ===== LIFECYCLE =====

    /// Spawn the render thread
    ///
    /// No-op when already running. From `Stopped` the full setup runs again
    /// with the stored device factory first.
    pub fn start(&mut self) -> Result<()> {
        let lifecycle = self.shared.lock()?.lifecycle;
        match lifecycle {
            LifecycleState::Running => return Ok(()),
            LifecycleState::Stopping => {
                return Err(Error::InvalidState("cannot start while stopping".to_string()));
            }
            LifecycleState::Stopped | LifecycleState::Recreating => {
                let state = Self::setup(&mut self.factory, &self.shaders, &self.config)?;
                self.shared.lock()?.state = Some(state);
            }
            LifecycleState::Uninitialized => {}
        }

        {
            let mut inner = self.shared.lock()?;
            inner.accepting = true;
            inner.render_done = false;
            inner.fatal_error = None;
            inner.lifecycle = LifecycleState::Running;
        }

        let shared = Arc::clone(&self.shared);
        let resize = self.resize.clone();
        let clock = Arc::clone(&self.clock);
        let target_fps = self.config.target_fps;
        let spawned = thread::Builder::new()
            .name("ise-render".to_string())
            .spawn(move || render_loop(shared, resize, clock, target_fps));

        match spawned {
            Ok(handle) => {
                self.render_thread_id = Some(handle.thread().id());
                self.render_thread = Some(handle);
                engine_info!("ise::Renderer", "Render thread started");
                Ok(())
            }
            Err(err) => {
                let mut inner = self.shared.lock()?;
                inner.accepting = false;
                inner.render_done = true;
                inner.lifecycle = LifecycleState::Uninitialized;
                Err(Error::InitializationFailed(format!("failed to spawn render thread: {}", err)))
            }
        }
    }

    /// Stop drawing and release every GPU resource
    ///
    /// Idempotent. When the render thread ended on a fatal error, that
    /// error is returned (once) after the cleanup.
    pub fn stop(&mut self) -> Result<()> {
        let state = {
            let mut inner = self.shared.lock()?;
            if inner.lifecycle == LifecycleState::Stopped {
                return Ok(());
            }
            inner.accepting = false;
            if self.render_thread.is_some() {
                inner.lifecycle = LifecycleState::Stopping;
                inner = self
                    .shared
                    .finished
                    .wait_while(inner, |inner| !inner.render_done)
                    .map_err(|_| Error::BackendError("renderer lock poisoned".to_string()))?;
            }
            inner.state.take()
        };

        let teardown = match state {
            Some(state) => state.teardown(),
            None => Ok(()),
        };

        if let Some(handle) = self.render_thread.take() {
            if handle.join().is_err() {
                engine_error!("ise::Renderer", "Render thread panicked");
            }
        }
        self.render_thread_id = None;

        let fatal = {
            let mut inner = self.shared.lock()?;
            inner.lifecycle = LifecycleState::Stopped;
            inner.fatal_error.take()
        };
        engine_info!("ise::Renderer", "Renderer stopped");

        match fatal {
            Some(err) => Err(err),
            None => teardown,
        }
    }

    /// Tear everything down and set up again, optionally on a new device
    /// factory (e.g. for a new native window)
    ///
    /// Must be called from the thread that owns the renderer.
    pub fn recreate(&mut self, factory: Option<DeviceFactory>) -> Result<()> {
        if self.render_thread_id == Some(thread::current().id()) {
            return Err(Error::InvalidState(
                "recreate called from the render thread".to_string(),
            ));
        }

        engine_info!("ise::Renderer", "Recreating renderer");
        if let Err(err) = self.stop() {
            engine_warn!("ise::Renderer", "Previous session ended with an error: {}", err);
        }
        self.shared.lock()?.lifecycle = LifecycleState::Recreating;

        if let Some(factory) = factory {
            self.factory = factory;
        }
        if let Err(err) = self.start() {
            self.shared.lock()?.lifecycle = LifecycleState::Stopped;
            return Err(err);
        }
        Ok(())
    }

    /// Block until the render thread has exited
    ///
    /// Returns the fatal error that ended it, if any (the error is still
    /// reported by the next `stop`).
    pub fn wait_until_stopped(&self) -> Result<()> {
        let inner = self.shared.lock()?;
        if inner.lifecycle == LifecycleState::Uninitialized {
            return Err(Error::InvalidState(
                "wait_until_stopped called before start".to_string(),
            ));
        }
        if self.render_thread.is_none() {
            return Ok(());
        }
        let inner = self
            .shared
            .finished
            .wait_while(inner, |inner| !inner.render_done)
            .map_err(|_| Error::BackendError("renderer lock poisoned".to_string()))?;
        match &inner.fatal_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Whether the render thread is alive and drawing
    pub fn is_rendering(&self) -> bool {
        self.shared
            .lock()
            .map(|inner| inner.lifecycle == LifecycleState::Running && !inner.render_done)
            .unwrap_or(false)
    }

    /// Request a swapchain recreation (window resized, or a forced refresh)
    pub fn handle_window_resize(&self) {
        self.resize.notify();
    }

    /// Handle for the event layer to request swapchain recreation
    pub fn resize_handle(&self) -> ResizeHandle {
        self.resize.clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared
            .lock()
            .map(|inner| inner.lifecycle)
            .unwrap_or(LifecycleState::Stopped)
    }

    /// Frame counters of the current (or last) session
    pub fn stats(&self) -> FrameStats {
        self.shared.lock().map(|inner| inner.stats).unwrap_or_default()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    // ===== RESOURCES =====

    fn with_state<T>(&self, f: impl FnOnce(&mut RendererState) -> Result<T>) -> Result<T> {
        let mut inner = self.shared.lock()?;
        match inner.state.as_mut() {
            Some(state) => f(state),
            None => Err(Error::InvalidState("renderer is stopped".to_string())),
        }
    }

    /// Upload an RGBA8 image under `key`, replacing any previous texture
    pub fn create_texture(&self, key: &str, image: &ImageData) -> Result<()> {
        self.with_state(|state| state.create_texture(key, image))
    }

    /// Returns false when no texture is registered under `key`
    pub fn destroy_texture(&self, key: &str) -> Result<bool> {
        self.with_state(|state| state.destroy_texture(key))
    }

    pub fn create_render_object(&self, name: &str) -> Result<RenderObjectKey> {
        self.with_state(|state| Ok(state.create_render_object(name)))
    }

    /// Returns false when the key is stale
    pub fn destroy_render_object(&self, key: RenderObjectKey) -> Result<bool> {
        self.with_state(|state| state.destroy_render_object(key))
    }

    pub fn set_object_textures(&self, key: RenderObjectKey, textures: &[&str]) -> Result<()> {
        self.with_state(|state| state.set_object_textures(key, textures))
    }

    pub fn bind_object_textures(&self, key: RenderObjectKey) -> Result<()> {
        self.with_state(|state| state.bind_object_textures(key))
    }

    pub fn load_geometry(&self, key: RenderObjectKey, mesh: &MeshData, offset: Mat4) -> Result<()> {
        self.with_state(|state| state.load_geometry(key, mesh, offset))
    }

    pub fn vertex_count(&self) -> Result<usize> {
        self.with_state(|state| Ok(state.geometry().vertex_count()))
    }

    pub fn index_count(&self) -> Result<usize> {
        self.with_state(|state| Ok(state.geometry().index_count()))
    }

    pub fn texture_count(&self) -> Result<usize> {
        self.with_state(|state| Ok(state.resources().texture_count()))
    }

    pub fn render_object_count(&self) -> Result<usize> {
        self.with_state(|state| Ok(state.resources().render_object_count()))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            engine_error!("ise::Renderer", "Error while stopping renderer: {}", err);
        }
    }
}

/// Body of the render thread: draw frames until told to stop
fn render_loop(shared: Arc<Shared>, resize: ResizeHandle, clock: Arc<dyn Clock>, target_fps: u32) {
    let _completion = CompletionSignal { shared: Arc::clone(&shared) };

    loop {
        let frame_start = clock.elapsed();
        {
            let Ok(mut inner) = shared.lock() else {
                engine_error!("ise::Renderer", "Renderer lock poisoned, render thread exiting");
                break;
            };
            if !inner.accepting {
                break;
            }
            let Some(state) = inner.state.as_mut() else {
                break;
            };

            let result = state
                .draw_frame(frame_start, resize.take())
                .map(|_| state.stats());
            match result {
                Ok(stats) => inner.stats = stats,
                Err(err) => {
                    engine_error!("ise::Renderer", "Fatal error in render thread: {}", err);
                    inner.fatal_error = Some(err);
                    inner.accepting = false;
                    break;
                }
            }
        }

        if let Some(delay) = pacing_delay(target_fps, clock.elapsed().saturating_sub(frame_start)) {
            clock.sleep(delay);
        }
    }

    engine_debug!("ise::Renderer", "Render thread finished");
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
