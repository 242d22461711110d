/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every mock object registers itself in a shared `MockState` on creation and
/// unregisters on drop, so tests can assert live counts per resource kind
/// after a device has been moved into the renderer (and even after the
/// renderer recreated it through its factory). Acquire and present results
/// can be scripted to simulate stale swapchains.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{
    AcquireResult, Buffer, BufferDesc, BufferUsage, ClearValue, ColorSpace, CommandList,
    DescriptorSet, DeviceLimits, Extent2D, Framebuffer, FramebufferDesc, FrameSync,
    GraphicsDevice, IndexType, MemoryLocation, Pipeline, PipelineDesc, PresentMode, PresentResult,
    Rect2D, RenderPass, RenderPassDesc, Sampler, SamplerDesc, Shader, ShaderDesc, ShaderStage,
    SurfaceCapabilities, SurfaceFormat, SurfaceSupport, Swapchain, SwapchainDesc, Texture,
    TextureBinding, TextureDesc, TextureFormat, TextureInfo, TextureUsage, Viewport,
};

// ============================================================================
// Shared state
// ============================================================================

/// State shared by a mock device, every object it created, and the test
pub struct MockState {
    live: FxHashMap<&'static str, usize>,
    created: FxHashMap<&'static str, usize>,
    events: Vec<String>,
    acquire_script: VecDeque<AcquireResult>,
    present_script: VecDeque<PresentResult>,
    drawable_extent: Extent2D,
    limits: DeviceLimits,
    surface_formats: Vec<SurfaceFormat>,
    present_modes: Vec<PresentMode>,
    outstanding: FxHashMap<u64, u32>,
    max_outstanding_at_wait: u32,
    next_sync_id: u64,
    submitted: Vec<Vec<String>>,
    uniform_writes: usize,
    fail_device_creation: bool,
    fail_submit: bool,
    fail_buffer_usage: Option<(BufferUsage, MemoryLocation)>,
    fail_texture_creation: bool,
}

impl MockState {
    fn new() -> Self {
        Self {
            live: FxHashMap::default(),
            created: FxHashMap::default(),
            events: Vec::new(),
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            drawable_extent: Extent2D::new(800, 600),
            limits: DeviceLimits {
                max_sampler_anisotropy: 16.0,
                max_per_stage_descriptor_samplers: 16,
                framebuffer_color_sample_counts: 0b1111,
                framebuffer_depth_sample_counts: 0b0111,
                supported_depth_formats: vec![TextureFormat::D32_FLOAT],
            },
            surface_formats: vec![
                SurfaceFormat {
                    format: TextureFormat::R8G8B8A8_UNORM,
                    color_space: ColorSpace::SrgbNonlinear,
                },
                SurfaceFormat {
                    format: TextureFormat::B8G8R8A8_SRGB,
                    color_space: ColorSpace::SrgbNonlinear,
                },
            ],
            present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate],
            outstanding: FxHashMap::default(),
            max_outstanding_at_wait: 0,
            next_sync_id: 0,
            submitted: Vec::new(),
            uniform_writes: 0,
            fail_device_creation: false,
            fail_submit: false,
            fail_buffer_usage: None,
            fail_texture_creation: false,
        }
    }

    fn track(&mut self, kind: &'static str) {
        *self.live.entry(kind).or_insert(0) += 1;
        *self.created.entry(kind).or_insert(0) += 1;
    }

    fn untrack(&mut self, kind: &'static str) {
        match self.live.get_mut(kind) {
            Some(count) if *count > 0 => *count -= 1,
            _ => self.events.push(format!("double_free:{}", kind)),
        }
    }
}

fn lock(state: &Arc<Mutex<MockState>>) -> MutexGuard<'_, MockState> {
    // Poisoning only happens when a test already panicked
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Test-side view of the mock state
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(MockState::new())) }
    }

    /// Create a device sharing this handle's state
    pub fn device(&self) -> Result<MockGraphicsDevice> {
        MockGraphicsDevice::with_handle(self.clone())
    }

    /// Live objects of one kind ("buffer", "texture", "framebuffer", ...)
    pub fn live(&self, kind: &str) -> usize {
        lock(&self.state).live.get(kind).copied().unwrap_or(0)
    }

    /// Objects of one kind ever created
    pub fn created(&self, kind: &str) -> usize {
        lock(&self.state).created.get(kind).copied().unwrap_or(0)
    }

    /// Sum of live objects over every kind
    pub fn total_live(&self) -> usize {
        lock(&self.state).live.values().sum()
    }

    /// Device-level calls in order ("acquire", "submit", "present", "wait_idle", ...)
    pub fn events(&self) -> Vec<String> {
        lock(&self.state).events.clone()
    }

    pub fn count_events(&self, name: &str) -> usize {
        lock(&self.state).events.iter().filter(|event| event.as_str() == name).count()
    }

    /// Queue a result for the next acquire calls (default: acquired)
    pub fn push_acquire(&self, result: AcquireResult) {
        lock(&self.state).acquire_script.push_back(result);
    }

    /// Queue a result for the next present calls (default: presented)
    pub fn push_present(&self, result: PresentResult) {
        lock(&self.state).present_script.push_back(result);
    }

    pub fn set_drawable_extent(&self, extent: Extent2D) {
        lock(&self.state).drawable_extent = extent;
    }

    pub fn set_limits(&self, limits: DeviceLimits) {
        lock(&self.state).limits = limits;
    }

    pub fn set_surface_formats(&self, formats: Vec<SurfaceFormat>) {
        lock(&self.state).surface_formats = formats;
    }

    pub fn set_present_modes(&self, modes: Vec<PresentMode>) {
        lock(&self.state).present_modes = modes;
    }

    /// Make the next device creation fail
    pub fn fail_device_creation(&self, fail: bool) {
        lock(&self.state).fail_device_creation = fail;
    }

    /// Make every submission fail as if the device was lost
    pub fn fail_submit(&self, fail: bool) {
        lock(&self.state).fail_submit = fail;
    }

    /// Make every buffer creation with this usage and location run out of
    /// memory (`None` disarms)
    pub fn fail_buffer_creation(&self, target: Option<(BufferUsage, MemoryLocation)>) {
        lock(&self.state).fail_buffer_usage = target;
    }

    /// Make every sampled texture creation run out of memory
    pub fn fail_texture_creation(&self, fail: bool) {
        lock(&self.state).fail_texture_creation = fail;
    }

    /// Highest number of pending submissions any fence wait observed
    pub fn max_outstanding_at_wait(&self) -> u32 {
        lock(&self.state).max_outstanding_at_wait
    }

    /// Command names of every submitted command list, in submission order
    pub fn submitted(&self) -> Vec<Vec<String>> {
        lock(&self.state).submitted.clone()
    }

    /// Number of writes into uniform buffers
    pub fn uniform_writes(&self) -> usize {
        lock(&self.state).uniform_writes
    }
}

/// Registers an object on creation, unregisters on drop
struct Tracked {
    kind: &'static str,
    state: Arc<Mutex<MockState>>,
}

impl Tracked {
    fn new(kind: &'static str, state: &Arc<Mutex<MockState>>) -> Self {
        lock(state).track(kind);
        Self { kind, state: Arc::clone(state) }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        lock(&self.state).untrack(self.kind);
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub desc: BufferDesc,
    pub data: Mutex<Vec<u8>>,
    state: Arc<Mutex<MockState>>,
    _tracked: Tracked,
}

impl MockBuffer {
    /// Copy of the buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().map(|data| data.clone()).unwrap_or_default()
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.desc.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset as usize + data.len();
        let mut contents = match self.data.lock() {
            Ok(contents) => contents,
            Err(_) => engine_bail!("ise::mock", "buffer data lock poisoned"),
        };
        if end > contents.len() {
            engine_bail!("ise::mock", "buffer update out of range ({} > {})", end, contents.len());
        }
        contents[offset as usize..end].copy_from_slice(data);
        if self.desc.usage == BufferUsage::Uniform {
            lock(&self.state).uniform_writes += 1;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Texture / Sampler
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    _tracked: Tracked,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockSampler {
    pub desc: SamplerDesc,
    _tracked: Tracked,
}

impl Sampler for MockSampler {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer
// ============================================================================

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
    _tracked: Tracked,
}

impl RenderPass for MockRenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    pub extent: Extent2D,
    pub image_index: u32,
    pub has_color_attachment: bool,
    _tracked: Tracked,
}

impl Framebuffer for MockFramebuffer {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Shader / Pipeline / DescriptorSet
// ============================================================================

pub struct MockShader {
    pub stage: ShaderStage,
    _tracked: Tracked,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipeline {
    pub textures_per_set: u32,
    pub samples: u32,
    _tracked: Tracked,
}

impl Pipeline for MockPipeline {
    fn textures_per_set(&self) -> u32 {
        self.textures_per_set
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockDescriptorSet {
    pub binding_count: u32,
    _tracked: Tracked,
}

impl DescriptorSet for MockDescriptorSet {
    fn binding_count(&self) -> u32 {
        self.binding_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock FrameSync
// ============================================================================

pub struct MockFrameSync {
    pub id: u64,
    state: Arc<Mutex<MockState>>,
    _tracked: Tracked,
}

impl FrameSync for MockFrameSync {
    fn wait(&self) -> Result<()> {
        let mut state = lock(&self.state);
        let pending = state.outstanding.insert(self.id, 0).unwrap_or(0);
        state.max_outstanding_at_wait = state.max_outstanding_at_wait.max(pending);
        state.events.push("fence_wait".to_string());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        lock(&self.state).events.push("fence_reset".to_string());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    pub commands: Vec<String>,
    _tracked: Tracked,
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.commands.clear();
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.commands.push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &dyn RenderPass,
        _framebuffer: &dyn Framebuffer,
        _clear_values: &[ClearValue],
    ) -> Result<()> {
        self.commands.push("begin_render_pass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: Viewport) -> Result<()> {
        self.commands.push("set_viewport".to_string());
        Ok(())
    }

    fn set_scissor(&mut self, _scissor: Rect2D) -> Result<()> {
        self.commands.push("set_scissor".to_string());
        Ok(())
    }

    fn bind_pipeline(&mut self, _pipeline: &dyn Pipeline) -> Result<()> {
        self.commands.push("bind_pipeline".to_string());
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, _buffer: &dyn Buffer, _offset: u64) -> Result<()> {
        self.commands.push("bind_vertex_buffer".to_string());
        Ok(())
    }

    fn bind_index_buffer(&mut self, _buffer: &dyn Buffer, _offset: u64, _index_type: IndexType) -> Result<()> {
        self.commands.push("bind_index_buffer".to_string());
        Ok(())
    }

    fn bind_descriptor_set(
        &mut self,
        _pipeline: &dyn Pipeline,
        set_index: u32,
        _set: &dyn DescriptorSet,
    ) -> Result<()> {
        self.commands.push(format!("bind_descriptor_set:{}", set_index));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.commands.push(format!("draw_indexed:{}:{}", first_index, index_count));
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchain {
    pub desc: SwapchainDesc,
    next_image: u32,
    image_views: Vec<Tracked>,
    state: Arc<Mutex<MockState>>,
    _tracked: Tracked,
}

impl MockSwapchain {
    fn build_views(state: &Arc<Mutex<MockState>>, count: u32) -> Vec<Tracked> {
        (0..count).map(|_| Tracked::new("swapchain_image_view", state)).collect()
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, _sync: &dyn FrameSync) -> Result<AcquireResult> {
        let scripted = {
            let mut state = lock(&self.state);
            state.events.push("acquire".to_string());
            state.acquire_script.pop_front()
        };
        match scripted {
            Some(result) => Ok(result),
            None => {
                let image_index = self.next_image;
                self.next_image = (self.next_image + 1) % self.desc.image_count;
                Ok(AcquireResult::Acquired { image_index, suboptimal: false })
            }
        }
    }

    fn present(&mut self, _sync: &dyn FrameSync, image_index: u32) -> Result<PresentResult> {
        if image_index >= self.desc.image_count {
            engine_bail!("ise::mock", "present: image index {} out of range", image_index);
        }
        let mut state = lock(&self.state);
        state.events.push("present".to_string());
        Ok(state.present_script.pop_front().unwrap_or(PresentResult::Presented))
    }

    fn recreate(&mut self, desc: &SwapchainDesc) -> Result<()> {
        lock(&self.state).events.push("recreate_swapchain".to_string());
        self.image_views.clear();
        self.desc = *desc;
        self.next_image = 0;
        self.image_views = Self::build_views(&self.state, desc.image_count);
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.desc.image_count as usize
    }

    fn extent(&self) -> Extent2D {
        self.desc.extent
    }

    fn format(&self) -> TextureFormat {
        self.desc.surface_format.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    limits: DeviceLimits,
    state: Arc<Mutex<MockState>>,
    _tracked: Tracked,
}

impl MockGraphicsDevice {
    /// Create a device with its own fresh state
    pub fn new() -> Result<(Self, MockHandle)> {
        let handle = MockHandle::new();
        let device = Self::with_handle(handle.clone())?;
        Ok((device, handle))
    }

    /// Create a device sharing `handle`'s state
    pub fn with_handle(handle: MockHandle) -> Result<Self> {
        let limits = {
            let mut state = lock(&handle.state);
            if state.fail_device_creation {
                state.events.push("device_creation_failed".to_string());
                return Err(crate::error::Error::Status {
                    message: "mock device creation".to_string(),
                    code: -3,
                });
            }
            state.events.push("create_device".to_string());
            state.limits.clone()
        };
        let tracked = Tracked::new("device", &handle.state);
        Ok(Self { limits, state: handle.state, _tracked: tracked })
    }

    fn event(&self, name: &str) {
        lock(&self.state).events.push(name.to_string());
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn drawable_extent(&self) -> Extent2D {
        lock(&self.state).drawable_extent
    }

    fn surface_support(&self) -> Result<SurfaceSupport> {
        let state = lock(&self.state);
        Ok(SurfaceSupport {
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: state.drawable_extent,
                min_extent: Extent2D::new(1, 1),
                max_extent: Extent2D::new(16384, 16384),
            },
            formats: state.surface_formats.clone(),
            present_modes: state.present_modes.clone(),
        })
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Box<dyn Swapchain>> {
        if desc.extent.is_empty() {
            engine_bail!("ise::mock", "cannot create a swapchain with an empty extent");
        }
        Ok(Box::new(MockSwapchain {
            desc: *desc,
            next_image: 0,
            image_views: MockSwapchain::build_views(&self.state, desc.image_count),
            state: Arc::clone(&self.state),
            _tracked: Tracked::new("swapchain", &self.state),
        }))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        Ok(Arc::new(MockRenderPass { desc: *desc, _tracked: Tracked::new("render_pass", &self.state) }))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        if desc.image_index as usize >= desc.swapchain.image_count() {
            engine_bail!("ise::mock", "framebuffer image index {} out of range", desc.image_index);
        }
        if desc.render_pass.desc().needs_color_attachment() != desc.color_attachment.is_some() {
            engine_bail!("ise::mock", "framebuffer attachments do not match the render pass");
        }
        Ok(Arc::new(MockFramebuffer {
            extent: desc.extent,
            image_index: desc.image_index,
            has_color_attachment: desc.color_attachment.is_some(),
            _tracked: Tracked::new("framebuffer", &self.state),
        }))
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        if let Some(data) = desc.data {
            let expected = desc.width as usize * desc.height as usize * 4;
            if data.len() != expected {
                engine_bail!("ise::mock", "texture data is {} bytes, expected {}", data.len(), expected);
            }
        }
        if desc.usage == TextureUsage::Sampled {
            let mut state = lock(&self.state);
            if state.fail_texture_creation {
                state.events.push("texture_creation_failed".to_string());
                return Err(crate::error::Error::OutOfMemory);
            }
        }
        let kind = match desc.usage {
            TextureUsage::Sampled => "texture",
            TextureUsage::ColorAttachment => "color_attachment",
            TextureUsage::DepthAttachment => "depth_attachment",
        };
        Ok(Arc::new(MockTexture {
            info: TextureInfo::from_desc(desc),
            _tracked: Tracked::new(kind, &self.state),
        }))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>> {
        Ok(Arc::new(MockSampler { desc: desc.clone(), _tracked: Tracked::new("sampler", &self.state) }))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            engine_bail!("ise::mock", "cannot create an empty buffer");
        }
        {
            let mut state = lock(&self.state);
            if state.fail_buffer_usage == Some((desc.usage, desc.location)) {
                state.events.push("buffer_creation_failed".to_string());
                return Err(crate::error::Error::OutOfMemory);
            }
        }
        Ok(Arc::new(MockBuffer {
            desc: desc.clone(),
            data: Mutex::new(vec![0; desc.size as usize]),
            state: Arc::clone(&self.state),
            _tracked: Tracked::new("buffer", &self.state),
        }))
    }

    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()> {
        let (Some(src), Some(dst)) = (
            src.as_any().downcast_ref::<MockBuffer>(),
            dst.as_any().downcast_ref::<MockBuffer>(),
        ) else {
            engine_bail!("ise::mock", "copy_buffer: foreign buffer type");
        };
        if size > src.desc.size || size > dst.desc.size {
            engine_bail!("ise::mock", "copy_buffer: {} bytes exceeds buffer size", size);
        }
        let bytes = src.contents();
        if let Ok(mut target) = dst.data.lock() {
            target[..size as usize].copy_from_slice(&bytes[..size as usize]);
        }
        self.event("copy_buffer");
        Ok(())
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        if desc.code.len() % 4 != 0 {
            engine_bail!("ise::mock", "shader code not 4-byte aligned ({} bytes)", desc.code.len());
        }
        Ok(Arc::new(MockShader { stage: desc.stage, _tracked: Tracked::new("shader", &self.state) }))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        if desc.samples != desc.render_pass.desc().samples() {
            engine_bail!("ise::mock", "pipeline sample count does not match the render pass");
        }
        Ok(Arc::new(MockPipeline {
            textures_per_set: desc.textures_per_set,
            samples: desc.samples,
            _tracked: Tracked::new("pipeline", &self.state),
        }))
    }

    fn create_uniform_set(
        &mut self,
        _pipeline: &dyn Pipeline,
        _buffer: &dyn Buffer,
    ) -> Result<Arc<dyn DescriptorSet>> {
        Ok(Arc::new(MockDescriptorSet {
            binding_count: 1,
            _tracked: Tracked::new("descriptor_set", &self.state),
        }))
    }

    fn create_texture_set(
        &mut self,
        pipeline: &dyn Pipeline,
        textures: &[TextureBinding<'_>],
    ) -> Result<Arc<dyn DescriptorSet>> {
        if textures.is_empty() || textures.len() as u32 > pipeline.textures_per_set() {
            engine_bail!("ise::mock", "texture set size {} not supported", textures.len());
        }
        Ok(Arc::new(MockDescriptorSet {
            binding_count: textures.len() as u32,
            _tracked: Tracked::new("descriptor_set", &self.state),
        }))
    }

    fn create_frame_sync(&mut self) -> Result<Box<dyn FrameSync>> {
        let id = {
            let mut state = lock(&self.state);
            state.next_sync_id += 1;
            state.next_sync_id
        };
        Ok(Box::new(MockFrameSync {
            id,
            state: Arc::clone(&self.state),
            _tracked: Tracked::new("frame_sync", &self.state),
        }))
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            commands: Vec::new(),
            _tracked: Tracked::new("command_list", &self.state),
        }))
    }

    fn submit(&mut self, commands: &dyn CommandList, sync: &dyn FrameSync) -> Result<()> {
        let Some(sync) = sync.as_any().downcast_ref::<MockFrameSync>() else {
            engine_bail!("ise::mock", "submit: foreign frame sync type");
        };
        let Some(commands) = commands.as_any().downcast_ref::<MockCommandList>() else {
            engine_bail!("ise::mock", "submit: foreign command list type");
        };
        let mut state = lock(&self.state);
        if state.fail_submit {
            state.events.push("submit_failed".to_string());
            return Err(crate::error::Error::Status {
                message: "mock submit".to_string(),
                code: -4,
            });
        }
        *state.outstanding.entry(sync.id).or_insert(0) += 1;
        state.submitted.push(commands.commands.clone());
        state.events.push("submit".to_string());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        let mut state = lock(&self.state);
        for pending in state.outstanding.values_mut() {
            *pending = 0;
        }
        state.events.push("wait_idle".to_string());
        Ok(())
    }
}

impl Drop for MockGraphicsDevice {
    fn drop(&mut self) {
        lock(&self.state).events.push("destroy_device".to_string());
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
