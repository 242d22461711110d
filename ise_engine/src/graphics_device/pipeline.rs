/// Shader and Pipeline traits

use std::any::Any;

use crate::graphics_device::RenderPass;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// SPIR-V bytecode
    pub code: &'a [u8],
    pub stage: ShaderStage,
    pub entry_point: &'a str,
}

/// Shader module resource
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn as_any(&self) -> &dyn Any;
}

/// Vertex attribute component layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float2,
    Float3,
}

/// One vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

/// Interleaved single-binding vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Descriptor set index of the per-frame uniform block
pub const UNIFORM_SET_INDEX: u32 = 0;

/// Descriptor set index of the per-object texture array
pub const TEXTURE_SET_INDEX: u32 = 1;

/// Descriptor for the graphics pipeline
///
/// Set 0 holds one uniform buffer (vertex stage), set 1 holds an array of
/// `textures_per_set` combined image samplers (fragment stage). Viewport and
/// scissor are dynamic, depth testing is on.
pub struct PipelineDesc<'a> {
    pub vertex_shader: &'a dyn Shader,
    pub fragment_shader: &'a dyn Shader,
    pub render_pass: &'a dyn RenderPass,
    pub vertex_layout: VertexLayout,
    pub samples: u32,
    pub textures_per_set: u32,
}

/// Graphics pipeline resource
pub trait Pipeline: Send + Sync {
    /// Size of the texture array in set 1
    fn textures_per_set(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}
