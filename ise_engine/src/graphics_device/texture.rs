/// Texture and sampler traits and descriptors

use std::any::Any;

/// Pixel formats used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    D32_FLOAT,
    D32_FLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Whether this is a depth (or depth/stencil) format
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D32_FLOAT | TextureFormat::D32_FLOAT_S8_UINT | TextureFormat::D24_UNORM_S8_UINT
        )
    }

    /// Whether the format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D32_FLOAT_S8_UINT | TextureFormat::D24_UNORM_S8_UINT)
    }
}

/// How a texture is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled by shaders (uploaded from CPU data)
    Sampled,
    /// Transient multisampled color attachment
    ColorAttachment,
    /// Depth attachment
    DepthAttachment,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    /// Sample count (1 for sampled textures)
    pub samples: u32,
    /// Number of mip levels (1 for attachments)
    pub mip_levels: u32,
    /// Tightly packed level-0 pixels (sampled textures only)
    pub data: Option<&'a [u8]>,
}

/// Read-only texture properties
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub samples: u32,
    pub mip_levels: u32,
}

impl TextureInfo {
    pub fn from_desc(desc: &TextureDesc<'_>) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            samples: desc.samples,
            mip_levels: desc.mip_levels,
        }
    }
}

/// Texture resource trait (image + view)
pub trait Texture: Send + Sync {
    fn info(&self) -> &TextureInfo;

    fn as_any(&self) -> &dyn Any;
}

/// Full mip chain length for a `width` x `height` image
///
/// `floor(log2(max(width, height))) + 1`
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    32 - largest.leading_zeros()
}

/// Texel filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Filter between mip levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipmapFilter {
    Nearest,
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

/// Descriptor for creating a sampler
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: MipmapFilter,
    pub address_mode: AddressMode,
    /// `None` disables anisotropic filtering
    pub anisotropy: Option<f32>,
    pub min_lod: f32,
    pub max_lod: f32,
}

/// Sampler resource trait
pub trait Sampler: Send + Sync {
    fn desc(&self) -> &SamplerDesc;

    fn as_any(&self) -> &dyn Any;
}
