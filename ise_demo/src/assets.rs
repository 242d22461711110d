/// Demo assets: model, texture and pre-compiled shaders
///
/// The model and texture fall back to a built-in quad and checkerboard when
/// their files are missing. Shaders have no fallback: compile
/// `assets/shaders/shader.vert` and `shader.frag` to `vert.spv` and
/// `frag.spv` first (e.g. with `glslc`).

use std::path::{Path, PathBuf};

use ise_engine::glam::{Vec2, Vec3};
use ise_engine::ise::resource::{ImageData, MeshData, Vertex};
use ise_engine::ise::{Error, Result, ShaderSources};
use ise_engine::{engine_info, engine_warn};

use crate::obj_loader::load_obj;

/// Everything the demo scene needs, loaded once and replayed after every
/// renderer recreation
pub struct DemoAssets {
    pub mesh: MeshData,
    pub texture: ImageData,
    pub shaders: ShaderSources,
}

impl DemoAssets {
    /// Load from an asset directory laid out as
    /// `model.obj`, `texture.png`, `shaders/vert.spv`, `shaders/frag.spv`
    pub fn load(dir: &Path) -> Result<Self> {
        let shaders = load_shaders(&dir.join("shaders"))?;

        let model_path = dir.join("model.obj");
        let mesh = if model_path.exists() {
            load_obj(&model_path)?
        } else {
            engine_warn!("ise::demo", "{} not found, using a built-in quad", model_path.display());
            fallback_quad()
        };

        let texture_path = dir.join("texture.png");
        let texture = if texture_path.exists() {
            load_texture(&texture_path)?
        } else {
            engine_warn!("ise::demo", "{} not found, using a checkerboard", texture_path.display());
            checkerboard(256, 32)
        };

        engine_info!(
            "ise::demo",
            "Assets loaded: {} vertices, {} indices, {}x{} texture",
            mesh.vertices.len(),
            mesh.indices.len(),
            texture.width,
            texture.height
        );
        Ok(Self { mesh, texture, shaders })
    }
}

/// Asset directory: first command-line argument, else the crate's `assets/`
pub fn asset_dir() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"))
}

/// Decode any PNG/JPEG file into tightly packed RGBA8
pub fn load_texture(path: &Path) -> Result<ImageData> {
    let image = image::open(path)
        .map_err(|e| Error::Load(format!("cannot decode texture {}: {}", path.display(), e)))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(ImageData::new(width, height, image.into_raw()))
}

pub fn load_shaders(dir: &Path) -> Result<ShaderSources> {
    let read = |name: &str| {
        let path = dir.join(name);
        std::fs::read(&path).map_err(|e| {
            Error::Load(format!(
                "cannot read shader {} ({}); compile the GLSL sources in {} to SPIR-V first",
                path.display(),
                e,
                dir.display()
            ))
        })
    };
    Ok(ShaderSources::new(read("vert.spv")?, read("frag.spv")?))
}

/// Two-tone checkerboard with `cell`-pixel squares
pub fn checkerboard(size: u32, cell: u32) -> ImageData {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let value = if light { 220 } else { 60 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    ImageData::new(size, size, pixels)
}

/// Unit quad in the XY plane, facing +Z
pub fn fallback_quad() -> MeshData {
    let white = Vec3::ONE;
    MeshData::new(
        vec![
            Vertex::new(Vec3::new(-0.5, -0.5, 0.0), white, Vec2::new(0.0, 1.0)),
            Vertex::new(Vec3::new(0.5, -0.5, 0.0), white, Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(0.5, 0.5, 0.0), white, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(-0.5, 0.5, 0.0), white, Vec2::new(0.0, 0.0)),
        ],
        vec![0, 1, 2, 2, 3, 0],
    )
}

#[cfg(test)]
#[path = "assets_tests.rs"]
mod tests;
