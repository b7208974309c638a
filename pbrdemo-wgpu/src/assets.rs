//! Asset providers backed by files under an asset root directory.

use std::fmt::Display;
use std::path::PathBuf;

use pbrdemo_gpu_shared::uniforms::MeshVertex;
use pbrdemo_render::assets::{EmbeddedShaders, BUILTIN_SKYBOX, SKYBOX_HALF_EXTENT};
use pbrdemo_render::{
    Image, ImagePixels, ImageProvider, Mesh, MeshProvider, RendererError, Result, ShaderSourceProvider,
};

fn asset_error(id: &str, reason: impl Display) -> RendererError {
    RendererError::AssetLoad { id: id.to_owned(), reason: reason.to_string() }
}

/// Meshes from glTF files, images through the `image` crate, shaders from the
/// embedded table unless an override directory holds `<id>.wgsl`.
#[derive(Debug, Clone)]
pub struct FileAssets {
    root: PathBuf,
    shader_dir: Option<PathBuf>,
}

impl FileAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), shader_dir: None }
    }

    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    fn path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl MeshProvider for FileAssets {
    fn load_mesh(&self, id: &str) -> Result<Mesh> {
        if id == BUILTIN_SKYBOX {
            return Ok(Mesh::cube(SKYBOX_HALF_EXTENT));
        }
        let (document, buffers, _) = gltf::import(self.path(id)).map_err(|e| asset_error(id, e))?;
        let primitive = document
            .meshes()
            .next()
            .and_then(|mesh| mesh.primitives().next())
            .ok_or_else(|| asset_error(id, "file contains no mesh primitive"))?;
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            return Err(asset_error(id, format!("unsupported primitive mode {:?}", primitive.mode())));
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| asset_error(id, "mesh has no positions"))?
            .collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .ok_or_else(|| asset_error(id, "mesh has no normals"))?
            .collect();
        let texcoords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|uvs| uvs.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0; 2]; positions.len()]);
        if normals.len() != positions.len() || texcoords.len() != positions.len() {
            return Err(asset_error(id, "vertex attribute counts differ"));
        }

        // glTF puts the texture origin top-left; meshes carry bottom-left coordinates.
        let vertices = positions
            .iter()
            .zip(&normals)
            .zip(&texcoords)
            .map(|((&position, &normal), &[u, v])| MeshVertex {
                position,
                normal,
                texcoord: [u, 1.0 - v],
                ..Default::default()
            })
            .collect::<Vec<_>>();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(asset_error(id, "index count is not a multiple of 3"));
        }
        let faces = indices.chunks_exact(3).map(|f| [f[0], f[1], f[2]]).collect();

        let mut mesh = Mesh::new(vertices, faces)?;
        mesh.generate_tangents();
        log::info!("Loaded mesh {id}: {} vertices, {} faces", mesh.vertices.len(), mesh.faces.len());
        Ok(mesh)
    }
}

impl ImageProvider for FileAssets {
    fn load_image(&self, id: &str, channels: u32) -> Result<Image> {
        let decoded = image::open(self.path(id)).map_err(|e| asset_error(id, e))?;
        let (width, height) = (decoded.width(), decoded.height());
        let hdr = matches!(
            decoded,
            image::DynamicImage::ImageRgb32F(_) | image::DynamicImage::ImageRgba32F(_)
        );

        let pixels = if hdr {
            let rgba = decoded.to_rgba32f().into_raw();
            let channels = channels as usize;
            if !(1..=4).contains(&channels) {
                return Err(asset_error(id, format!("cannot convert to {channels} channels")));
            }
            ImagePixels::Hdr(rgba.chunks_exact(4).flat_map(|texel| texel[..channels].to_vec()).collect())
        } else {
            ImagePixels::Ldr(match channels {
                1 => decoded.to_luma8().into_raw(),
                2 => decoded.to_luma_alpha8().into_raw(),
                3 => decoded.to_rgb8().into_raw(),
                4 => decoded.to_rgba8().into_raw(),
                n => return Err(asset_error(id, format!("cannot convert to {n} channels"))),
            })
        };

        log::info!("Loaded image {id}: {width}x{height}, {channels} channels{}", if hdr { ", HDR" } else { "" });
        Image::new(width, height, channels, pixels)
    }
}

impl ShaderSourceProvider for FileAssets {
    fn shader_source(&self, id: &str) -> Option<String> {
        if let Some(dir) = &self.shader_dir {
            let path = dir.join(format!("{id}.wgsl"));
            if let Ok(text) = std::fs::read_to_string(&path) {
                log::info!("Using shader override {}", path.display());
                return Some(text);
            }
        }
        EmbeddedShaders.shader_source(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pbrdemo-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_builtin_skybox_needs_no_file() {
        let assets = FileAssets::new("/nonexistent");
        let mesh = assets.load_mesh(BUILTIN_SKYBOX).unwrap();
        assert_eq!(mesh.faces.len(), 12);
    }

    #[test]
    fn test_missing_file_is_asset_error() {
        let assets = FileAssets::new("/nonexistent");
        let err = assets.load_image("textures/missing.png", 3).unwrap_err();
        assert!(matches!(err, RendererError::AssetLoad { ref id, .. } if id == "textures/missing.png"));
        assert!(assets.load_mesh("meshes/missing.glb").is_err());
    }

    #[test]
    fn test_png_converted_to_requested_channels() {
        let dir = scratch_dir("png");
        let mut source = image::RgbaImage::new(4, 2);
        for pixel in source.pixels_mut() {
            *pixel = image::Rgba([200, 100, 50, 255]);
        }
        source.save(dir.join("albedo.png")).unwrap();

        let assets = FileAssets::new(&dir);
        let rgb = assets.load_image("albedo.png", 3).unwrap();
        assert_eq!((rgb.width, rgb.height, rgb.channels), (4, 2, 3));
        assert!(!rgb.is_hdr());
        match &rgb.pixels {
            ImagePixels::Ldr(bytes) => assert_eq!(&bytes[..3], &[200, 100, 50]),
            ImagePixels::Hdr(_) => unreachable!(),
        }

        let gray = assets.load_image("albedo.png", 1).unwrap();
        match &gray.pixels {
            ImagePixels::Ldr(bytes) => assert_eq!(bytes.len(), 8),
            ImagePixels::Hdr(_) => unreachable!(),
        }
    }

    #[test]
    fn test_shader_override_directory() {
        let dir = scratch_dir("shaders");
        std::fs::write(dir.join("tonemap_fs.wgsl"), "// custom").unwrap();

        let assets = FileAssets::new("/nonexistent").with_shader_dir(&dir);
        assert_eq!(assets.shader_source("tonemap_fs").as_deref(), Some("// custom"));
        assert!(assets.shader_source("pbr_fs").is_some_and(|s| s.contains("fs_main")));
        assert!(assets.shader_source("unknown").is_none());
    }
}
