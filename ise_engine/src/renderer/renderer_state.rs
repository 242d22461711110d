/// Renderer state - every GPU object of a rendering session
///
/// Built in dependency order by `new`, torn down in reverse by `teardown`.
/// Owned by the lifecycle controller behind its mutex.

use std::sync::Arc;
use std::time::Duration;

use glam::Mat4;

use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, Pipeline, PipelineDesc, RenderPass, Shader, ShaderDesc, ShaderStage,
};
use crate::renderer::{FrameContext, FrameOutcome, FrameScheduler, FrameStats, SwapchainManager};
use crate::resource::{
    BufferSynchronizer, ImageData, MeshData, RenderObjectKey, ResourceManager, Vertex,
};
use crate::{engine_debug, engine_info};

/// Pre-compiled SPIR-V for the single graphics pipeline
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
    /// Entry point of both stages
    pub entry_point: String,
}

impl ShaderSources {
    pub fn new(vertex: Vec<u8>, fragment: Vec<u8>) -> Self {
        Self { vertex, fragment, entry_point: "main".to_string() }
    }
}

pub struct RendererState {
    frames: FrameScheduler,
    geometry: BufferSynchronizer,
    resources: ResourceManager,
    swapchain: SwapchainManager,
    pipeline: Arc<dyn Pipeline>,
    vertex_shader: Arc<dyn Shader>,
    fragment_shader: Arc<dyn Shader>,
    render_pass: Arc<dyn RenderPass>,
    config: RendererConfig,
    device: Box<dyn GraphicsDevice>,
}

impl RendererState {
    /// Full setup on a freshly created device
    pub fn new(
        mut device: Box<dyn GraphicsDevice>,
        shaders: &ShaderSources,
        config: &RendererConfig,
    ) -> Result<Self> {
        let mut swapchain = SwapchainManager::new(device.as_mut(), config)?;
        let render_pass = device.create_render_pass(&swapchain.render_pass_desc())?;

        let vertex_shader = device.create_shader(&ShaderDesc {
            code: &shaders.vertex,
            stage: ShaderStage::Vertex,
            entry_point: &shaders.entry_point,
        })?;
        let fragment_shader = device.create_shader(&ShaderDesc {
            code: &shaders.fragment,
            stage: ShaderStage::Fragment,
            entry_point: &shaders.entry_point,
        })?;

        let textures_per_set = ResourceManager::texture_limit_for(config, device.limits());
        let pipeline = device.create_pipeline(&PipelineDesc {
            vertex_shader: vertex_shader.as_ref(),
            fragment_shader: fragment_shader.as_ref(),
            render_pass: render_pass.as_ref(),
            vertex_layout: Vertex::layout(),
            samples: swapchain.samples(),
            textures_per_set,
        })?;

        swapchain.build_targets(device.as_mut(), render_pass.as_ref())?;
        let frames = FrameScheduler::new(device.as_mut(), pipeline.as_ref(), &swapchain, config)?;
        let resources = ResourceManager::new(config, device.limits());

        engine_info!(
            "ise::RendererState",
            "Renderer ready: {} frames in flight, {} textures per object",
            frames.slot_count(),
            textures_per_set
        );

        Ok(Self {
            frames,
            geometry: BufferSynchronizer::new(),
            resources,
            swapchain,
            pipeline,
            vertex_shader,
            fragment_shader,
            render_pass,
            config: config.clone(),
            device,
        })
    }

    /// Run one frame at animation time `time`
    pub fn draw_frame(&mut self, time: Duration, resize_requested: bool) -> Result<FrameOutcome> {
        self.frames.draw_frame(FrameContext {
            device: self.device.as_mut(),
            swapchain: &mut self.swapchain,
            render_pass: self.render_pass.as_ref(),
            pipeline: self.pipeline.as_ref(),
            resources: &self.resources,
            geometry: &self.geometry,
            config: &self.config,
            time,
            resize_requested,
        })
    }

    // ===== RESOURCES =====

    pub fn create_texture(&mut self, key: &str, image: &ImageData) -> Result<()> {
        self.resources
            .create_texture(self.device.as_mut(), self.pipeline.as_ref(), key, image)
    }

    pub fn destroy_texture(&mut self, key: &str) -> Result<bool> {
        self.resources.destroy_texture(self.device.as_ref(), key)
    }

    pub fn create_render_object(&mut self, name: &str) -> RenderObjectKey {
        self.resources.create_render_object(name)
    }

    pub fn destroy_render_object(&mut self, key: RenderObjectKey) -> Result<bool> {
        self.resources.destroy_render_object(self.device.as_ref(), key)
    }

    pub fn set_object_textures(&mut self, key: RenderObjectKey, textures: &[&str]) -> Result<()> {
        self.resources.set_object_textures(key, textures)
    }

    pub fn bind_object_textures(&mut self, key: RenderObjectKey) -> Result<()> {
        self.resources
            .bind_object_textures(self.device.as_mut(), self.pipeline.as_ref(), key)
    }

    /// Append `mesh` (transformed by `offset`) to the shared buffers and
    /// make `key` draw it
    pub fn load_geometry(&mut self, key: RenderObjectKey, mesh: &MeshData, offset: Mat4) -> Result<()> {
        if self.resources.render_object(key).is_none() {
            return Err(Error::InvalidResource("load_geometry: unknown render object".to_string()));
        }
        let range = self.geometry.load_geometry(self.device.as_mut(), mesh, offset)?;
        self.resources.add_draw_range(key, range)
    }

    // ===== ACCESSORS =====

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn geometry(&self) -> &BufferSynchronizer {
        &self.geometry
    }

    pub fn swapchain(&self) -> &SwapchainManager {
        &self.swapchain
    }

    pub fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    pub fn stats(&self) -> FrameStats {
        self.frames.stats()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    // ===== TEARDOWN =====

    /// Wait for the device, then release everything in reverse dependency
    /// order: swapchain set, pipeline, render pass, frame slots, buffers,
    /// textures and object sets, device
    ///
    /// Everything is released even when the idle wait fails; that error is
    /// returned afterwards.
    pub fn teardown(self) -> Result<()> {
        let idle = self.device.wait_idle();

        let Self {
            frames,
            mut geometry,
            mut resources,
            swapchain,
            pipeline,
            vertex_shader,
            fragment_shader,
            render_pass,
            config: _,
            device,
        } = self;

        drop(swapchain);
        drop(pipeline);
        drop(fragment_shader);
        drop(vertex_shader);
        drop(render_pass);
        drop(frames);
        geometry.clear();
        resources.clear();
        drop(device);

        engine_debug!("ise::RendererState", "Renderer state released");
        idle
    }
}

#[cfg(test)]
#[path = "renderer_state_tests.rs"]
mod tests;
