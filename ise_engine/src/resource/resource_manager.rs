/// Keyed textures and render objects owned by the renderer
///
/// Textures live in a map keyed by string, render objects in a slot map.
/// Every operation that releases a GPU object an in-flight frame may still
/// reference waits for device idle first. The caller holds the renderer
/// mutex, so no frame is being recorded concurrently.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::graphics_device::{
    mip_level_count, DescriptorSet, DeviceLimits, GraphicsDevice, Pipeline, TextureBinding,
    TextureDesc, TextureFormat, TextureUsage,
};
use crate::resource::{
    DrawRange, ImageData, RenderObject, RenderObjectKey, RenderTexture, SamplerPolicy,
};
use crate::{engine_debug, engine_info};

pub struct ResourceManager {
    objects: SlotMap<RenderObjectKey, RenderObject>,
    textures: FxHashMap<String, RenderTexture>,
    sampler_policy: SamplerPolicy,
    texture_limit: u32,
}

impl ResourceManager {
    pub fn new(config: &RendererConfig, limits: &DeviceLimits) -> Self {
        Self {
            objects: SlotMap::with_key(),
            textures: FxHashMap::default(),
            sampler_policy: SamplerPolicy::new(
                config.texture_filtering,
                config.max_anisotropy,
                limits.max_sampler_anisotropy,
            ),
            texture_limit: Self::texture_limit_for(config, limits),
        }
    }

    /// Textures a single object may bind: the configured maximum clamped by
    /// the per-stage sampler limit of the device
    pub fn texture_limit_for(config: &RendererConfig, limits: &DeviceLimits) -> u32 {
        config.max_textures_per_object.min(limits.max_per_stage_descriptor_samplers).max(1)
    }

    pub fn texture_limit(&self) -> u32 {
        self.texture_limit
    }

    pub fn sampler_policy(&self) -> &SamplerPolicy {
        &self.sampler_policy
    }

    // ===== TEXTURES =====

    /// Upload `image` under `key`, replacing any texture already registered
    ///
    /// Objects referencing `key` that were bound get rebound to the new
    /// texture.
    pub fn create_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pipeline: &dyn Pipeline,
        key: &str,
        image: &ImageData,
    ) -> Result<()> {
        image.validate()?;

        // Build the replacement first so a failed upload leaves the old
        // texture and its bindings in place
        let mip_levels = mip_level_count(image.width, image.height);
        let texture = device.create_texture(&TextureDesc {
            width: image.width,
            height: image.height,
            format: TextureFormat::R8G8B8A8_SRGB,
            usage: TextureUsage::Sampled,
            samples: 1,
            mip_levels,
            data: Some(&image.pixels),
        })?;
        let sampler = device.create_sampler(&self.sampler_policy.sampler_desc(mip_levels))?;

        let dependents = self.unbind_dependents(device, key)?;
        if self.textures.contains_key(key) {
            device.wait_idle()?;
            self.textures.remove(key);
            engine_debug!("ise::ResourceManager", "Replacing texture '{}'", key);
        }

        self.textures.insert(key.to_string(), RenderTexture { texture, sampler });
        engine_info!(
            "ise::ResourceManager",
            "Texture '{}' created ({}x{}, {} mip levels)",
            key, image.width, image.height, mip_levels
        );

        for object in dependents {
            self.bind_object_textures(device, pipeline, object)?;
        }
        Ok(())
    }

    /// Destroy the texture under `key`; returns false when absent
    ///
    /// Objects sampling it lose their texture set and stop drawing until
    /// they are bound again.
    pub fn destroy_texture(&mut self, device: &dyn GraphicsDevice, key: &str) -> Result<bool> {
        if !self.textures.contains_key(key) {
            return Ok(false);
        }
        self.unbind_dependents(device, key)?;
        device.wait_idle()?;
        self.textures.remove(key);
        engine_debug!("ise::ResourceManager", "Texture '{}' destroyed", key);
        Ok(true)
    }

    pub fn texture(&self, key: &str) -> Option<&RenderTexture> {
        self.textures.get(key)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Drop the texture sets of bound objects referencing `key` and
    /// return those objects
    fn unbind_dependents(
        &mut self,
        device: &dyn GraphicsDevice,
        key: &str,
    ) -> Result<Vec<RenderObjectKey>> {
        let dependents: Vec<RenderObjectKey> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_bound() && object.references(key))
            .map(|(object_key, _)| object_key)
            .collect();
        if dependents.is_empty() {
            return Ok(dependents);
        }
        device.wait_idle()?;
        for object_key in &dependents {
            if let Some(object) = self.objects.get_mut(*object_key) {
                object.texture_set = None;
            }
        }
        Ok(dependents)
    }

    // ===== RENDER OBJECTS =====

    pub fn create_render_object(&mut self, name: &str) -> RenderObjectKey {
        let key = self.objects.insert(RenderObject::new(name));
        engine_debug!("ise::ResourceManager", "Render object '{}' created", name);
        key
    }

    /// Destroy a render object; returns false when the key is stale
    ///
    /// Its geometry stays in the shared buffers; only its draw ranges go.
    pub fn destroy_render_object(
        &mut self,
        device: &dyn GraphicsDevice,
        key: RenderObjectKey,
    ) -> Result<bool> {
        match self.objects.get(key) {
            None => Ok(false),
            Some(object) => {
                if object.is_bound() {
                    device.wait_idle()?;
                }
                self.objects.remove(key);
                Ok(true)
            }
        }
    }

    pub fn render_object(&self, key: RenderObjectKey) -> Option<&RenderObject> {
        self.objects.get(key)
    }

    pub fn render_objects(&self) -> impl Iterator<Item = &RenderObject> {
        self.objects.values()
    }

    pub fn render_object_count(&self) -> usize {
        self.objects.len()
    }

    /// Set the ordered texture keys an object samples
    ///
    /// Takes effect at the next `bind_object_textures`.
    pub fn set_object_textures(&mut self, key: RenderObjectKey, textures: &[&str]) -> Result<()> {
        let object = self.objects.get_mut(key).ok_or_else(|| {
            Error::InvalidResource("set_object_textures: unknown render object".to_string())
        })?;
        object.texture_keys = textures.iter().map(|key| key.to_string()).collect();
        Ok(())
    }

    /// Allocate the object's texture descriptor set
    ///
    /// One combined image-sampler per texture key, in order.
    pub fn bind_object_textures(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pipeline: &dyn Pipeline,
        key: RenderObjectKey,
    ) -> Result<()> {
        let object = self.objects.get(key).ok_or_else(|| {
            Error::InvalidResource("bind_object_textures: unknown render object".to_string())
        })?;

        let requested = object.texture_keys.len() as u32;
        if requested == 0 {
            return Err(Error::InvalidResource(format!(
                "render object '{}' has no textures to bind",
                object.name()
            )));
        }
        let limit = self.texture_limit.min(pipeline.textures_per_set());
        if requested > limit {
            return Err(Error::ResourceLimitExceeded {
                resource: "textures per render object".to_string(),
                requested,
                limit,
            });
        }

        let mut bindings = Vec::with_capacity(object.texture_keys.len());
        for texture_key in &object.texture_keys {
            let texture = self.textures.get(texture_key).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "render object '{}' references unknown texture '{}'",
                    object.name(),
                    texture_key
                ))
            })?;
            bindings.push(TextureBinding {
                texture: texture.texture.as_ref(),
                sampler: texture.sampler.as_ref(),
            });
        }

        let set: Arc<dyn DescriptorSet> = device.create_texture_set(pipeline, &bindings)?;
        let had_set = object.is_bound();
        drop(bindings);

        if had_set {
            device.wait_idle()?;
        }
        if let Some(object) = self.objects.get_mut(key) {
            object.texture_set = Some(set);
        }
        Ok(())
    }

    /// Record a geometry range drawn by an object
    pub(crate) fn add_draw_range(&mut self, key: RenderObjectKey, range: DrawRange) -> Result<()> {
        let object = self.objects.get_mut(key).ok_or_else(|| {
            Error::InvalidResource("load_geometry: unknown render object".to_string())
        })?;
        object.draw_ranges.push(range);
        Ok(())
    }

    /// Release every object set and texture (objects first)
    pub(crate) fn clear(&mut self) {
        self.objects.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
