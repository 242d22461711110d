/// Render texture: GPU image + view + sampler registered under a key,
/// and the sampler policy derived from the renderer configuration

use std::sync::Arc;

use crate::config::TextureFiltering;
use crate::graphics_device::{
    AddressMode, FilterMode, MipmapFilter, Sampler, SamplerDesc, Texture,
};

/// Anisotropy actually applied to samplers
///
/// A request of 0 disables anisotropic filtering; any other request is
/// clamped to the device limit.
pub fn effective_anisotropy(requested: f32, device_limit: f32) -> Option<f32> {
    if requested <= 0.0 {
        None
    } else {
        Some(requested.min(device_limit))
    }
}

/// How every renderer-created sampler filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerPolicy {
    filtering: TextureFiltering,
    anisotropy: Option<f32>,
}

impl SamplerPolicy {
    pub fn new(filtering: TextureFiltering, requested_anisotropy: f32, device_limit: f32) -> Self {
        Self {
            filtering,
            anisotropy: effective_anisotropy(requested_anisotropy, device_limit),
        }
    }

    pub fn filtering(&self) -> TextureFiltering {
        self.filtering
    }

    pub fn anisotropy(&self) -> Option<f32> {
        self.anisotropy
    }

    /// Sampler descriptor for a texture with `mip_levels` levels
    pub fn sampler_desc(&self, mip_levels: u32) -> SamplerDesc {
        let max_lod = mip_levels as f32;
        match self.filtering {
            TextureFiltering::Nearest => Self::nearest(self.anisotropy, max_lod),
            TextureFiltering::Bilinear => Self::bilinear(self.anisotropy, max_lod),
            TextureFiltering::Trilinear => Self::trilinear(self.anisotropy, max_lod),
            TextureFiltering::HybridNearBilinear => Self::hybrid_near_bilinear(self.anisotropy, max_lod),
            TextureFiltering::HybridNearTrilinear => Self::hybrid_near_trilinear(self.anisotropy, max_lod),
        }
    }

    fn nearest(anisotropy: Option<f32>, max_lod: f32) -> SamplerDesc {
        Self::build(FilterMode::Nearest, FilterMode::Nearest, MipmapFilter::Nearest, anisotropy, max_lod)
    }

    fn bilinear(anisotropy: Option<f32>, max_lod: f32) -> SamplerDesc {
        Self::build(FilterMode::Linear, FilterMode::Linear, MipmapFilter::Nearest, anisotropy, max_lod)
    }

    fn trilinear(anisotropy: Option<f32>, max_lod: f32) -> SamplerDesc {
        Self::build(FilterMode::Linear, FilterMode::Linear, MipmapFilter::Linear, anisotropy, max_lod)
    }

    fn hybrid_near_bilinear(anisotropy: Option<f32>, max_lod: f32) -> SamplerDesc {
        Self::build(FilterMode::Nearest, FilterMode::Linear, MipmapFilter::Nearest, anisotropy, max_lod)
    }

    fn hybrid_near_trilinear(anisotropy: Option<f32>, max_lod: f32) -> SamplerDesc {
        Self::build(FilterMode::Nearest, FilterMode::Linear, MipmapFilter::Linear, anisotropy, max_lod)
    }

    fn build(
        mag_filter: FilterMode,
        min_filter: FilterMode,
        mipmap_filter: MipmapFilter,
        anisotropy: Option<f32>,
        max_lod: f32,
    ) -> SamplerDesc {
        SamplerDesc {
            mag_filter,
            min_filter,
            mipmap_filter,
            address_mode: AddressMode::Repeat,
            anisotropy,
            min_lod: 0.0,
            max_lod,
        }
    }
}

/// Texture registered in the resource manager
pub struct RenderTexture {
    pub(crate) texture: Arc<dyn Texture>,
    pub(crate) sampler: Arc<dyn Sampler>,
}

impl RenderTexture {
    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn sampler(&self) -> &Arc<dyn Sampler> {
        &self.sampler
    }

    pub fn mip_levels(&self) -> u32 {
        self.texture.info().mip_levels
    }
}

#[cfg(test)]
#[path = "render_texture_tests.rs"]
mod tests;
