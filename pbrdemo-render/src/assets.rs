//! Asset interfaces the renderer consumes: triangle meshes, decoded images, and
//! shader source text. Loading and decoding live behind the provider traits;
//! the core only sees the in-memory forms defined here.

use glam::{Vec2, Vec3};
use pbrdemo_gpu_shared::shaders;
use pbrdemo_gpu_shared::uniforms::MeshVertex;

use crate::error::{RendererError, Result};

/// Mesh id providers are expected to resolve to [`Mesh::cube`] with [`SKYBOX_HALF_EXTENT`].
pub const BUILTIN_SKYBOX: &str = "builtin:skybox";

/// Half extent of the built-in skybox cube. Comfortably outside the near plane
/// (1.0) for any field of view, and well inside the far plane.
pub const SKYBOX_HALF_EXTENT: f32 = 10.0;

/// Triangle mesh with the fixed vertex layout of [`MeshVertex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Validates that every face references an existing vertex.
    pub fn new(vertices: Vec<MeshVertex>, faces: Vec<[u32; 3]>) -> Result<Self> {
        let count = vertices.len() as u32;
        if let Some(face) = faces.iter().find(|f| f.iter().any(|&i| i >= count)) {
            return Err(RendererError::AssetLoad {
                id: "mesh".into(),
                reason: format!("face {face:?} references a vertex beyond {count}"),
            });
        }
        Ok(Self { vertices, faces })
    }

    /// Axis-aligned cube centered at the origin, counter-clockwise when seen from outside.
    pub fn cube(half_extent: f32) -> Self {
        // (normal, tangent); bitangent = normal x tangent keeps every face right-handed.
        const FACES: [(Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_X, Vec3::Z),
            (Vec3::Y, Vec3::X),
            (Vec3::NEG_Y, Vec3::X),
            (Vec3::Z, Vec3::X),
            (Vec3::NEG_Z, Vec3::NEG_X),
        ];
        const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut faces = Vec::with_capacity(12);
        for (normal, tangent) in FACES {
            let bitangent = normal.cross(tangent);
            let base = vertices.len() as u32;
            for (s, t) in CORNERS {
                let position = (normal + tangent * s + bitangent * t) * half_extent;
                vertices.push(MeshVertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    tangent: tangent.to_array(),
                    bitangent: bitangent.to_array(),
                    texcoord: [(s + 1.0) * 0.5, (t + 1.0) * 0.5],
                });
            }
            faces.push([base, base + 1, base + 2]);
            faces.push([base, base + 2, base + 3]);
        }
        Self { vertices, faces }
    }

    /// Flattened triangle index list.
    pub fn indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.faces)
    }

    /// Derives per-vertex tangents and bitangents from positions and texcoords,
    /// orthonormalized against the existing normals.
    pub fn generate_tangents(&mut self) {
        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];

        for face in &self.faces {
            let [a, b, c] = face.map(|i| &self.vertices[i as usize]);
            let e1 = Vec3::from(b.position) - Vec3::from(a.position);
            let e2 = Vec3::from(c.position) - Vec3::from(a.position);
            let d1 = Vec2::from(b.texcoord) - Vec2::from(a.texcoord);
            let d2 = Vec2::from(c.texcoord) - Vec2::from(a.texcoord);

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let t = (e1 * d2.y - e2 * d1.y) * r;
            let b = (e2 * d1.x - e1 * d2.x) * r;
            for &i in face {
                tangents[i as usize] += t;
                bitangents[i as usize] += b;
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            let n = Vec3::from(vertex.normal).normalize_or_zero();
            let t = tangents[i] - n * n.dot(tangents[i]);
            let t = if t.length_squared() > f32::EPSILON {
                t.normalize()
            } else {
                n.any_orthonormal_vector()
            };
            let handedness = if n.cross(t).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
            vertex.tangent = t.to_array();
            vertex.bitangent = (n.cross(t) * handedness).to_array();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixels {
    /// 8-bit unsigned normalized channels.
    Ldr(Vec<u8>),
    /// 32-bit float channels (radiance images).
    Hdr(Vec<f32>),
}

/// Decoded image, rows top to bottom, channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub pixels: ImagePixels,
}

impl Image {
    pub fn new(width: u32, height: u32, channels: u32, pixels: ImagePixels) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        let actual = match &pixels {
            ImagePixels::Ldr(p) => p.len(),
            ImagePixels::Hdr(p) => p.len(),
        };
        if width == 0 || height == 0 || !(1..=4).contains(&channels) || actual != expected {
            return Err(RendererError::AssetLoad {
                id: "image".into(),
                reason: format!(
                    "{width}x{height}x{channels} image with {actual} values (expected {expected})"
                ),
            });
        }
        Ok(Self { width, height, channels, pixels })
    }

    /// Uniform HDR image.
    pub fn solid_hdr(width: u32, height: u32, channels: u32, value: f32) -> Result<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, ImagePixels::Hdr(vec![value; len]))
    }

    /// Uniform LDR image.
    pub fn solid_ldr(width: u32, height: u32, channels: u32, value: u8) -> Result<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, ImagePixels::Ldr(vec![value; len]))
    }

    pub fn is_hdr(&self) -> bool {
        matches!(self.pixels, ImagePixels::Hdr(_))
    }
}

pub trait MeshProvider {
    fn load_mesh(&self, id: &str) -> Result<Mesh>;
}

pub trait ImageProvider {
    /// Loads `id`, converted to `channels` channels per pixel.
    fn load_image(&self, id: &str, channels: u32) -> Result<Image>;
}

pub trait ShaderSourceProvider {
    /// Source text for a logical shader id. `None` or empty text means missing.
    fn shader_source(&self, id: &str) -> Option<String>;
}

/// Everything the setup stage needs from the host.
pub trait Assets: MeshProvider + ImageProvider + ShaderSourceProvider {}

impl<T: MeshProvider + ImageProvider + ShaderSourceProvider> Assets for T {}

/// Shader sources compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedShaders;

impl ShaderSourceProvider for EmbeddedShaders {
    fn shader_source(&self, id: &str) -> Option<String> {
        shaders::lookup(id).map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_topology() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.faces.len(), 12);
        assert_eq!(cube.indices().len(), 36);
        assert!(Mesh::new(cube.vertices.clone(), cube.faces.clone()).is_ok());
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = Mesh::cube(2.0);
        for face in &cube.faces {
            let [a, b, c] = face.map(|i| Vec3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let vertex_normal = Vec3::from(cube.vertices[face[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(vertex_normal, 1e-6));
        }
    }

    #[test]
    fn test_generated_tangents_match_cube_basis() {
        let cube = Mesh::cube(1.0);
        let mut regenerated = cube.clone();
        regenerated.generate_tangents();
        for (expected, actual) in cube.vertices.iter().zip(&regenerated.vertices) {
            assert!(Vec3::from(expected.tangent).abs_diff_eq(Vec3::from(actual.tangent), 1e-5));
            assert!(Vec3::from(expected.bitangent).abs_diff_eq(Vec3::from(actual.bitangent), 1e-5));
        }
    }

    #[test]
    fn test_mesh_rejects_out_of_range_index() {
        let cube = Mesh::cube(1.0);
        let err = Mesh::new(cube.vertices, vec![[0, 1, 24]]).unwrap_err();
        assert!(matches!(err, RendererError::AssetLoad { .. }));
    }

    #[test]
    fn test_image_length_validation() {
        assert!(Image::new(2, 2, 3, ImagePixels::Ldr(vec![0; 12])).is_ok());
        assert!(Image::new(2, 2, 3, ImagePixels::Ldr(vec![0; 11])).is_err());
        assert!(Image::new(2, 2, 5, ImagePixels::Hdr(vec![0.0; 20])).is_err());
        assert!(Image::solid_hdr(4, 2, 3, 0.5).unwrap().is_hdr());
    }

    #[test]
    fn test_solid_image_channel_range() {
        assert!(matches!(Image::solid_ldr(4, 4, 0, 128), Err(RendererError::AssetLoad { .. })));
        assert!(Image::solid_hdr(4, 4, 5, 1.0).is_err());
        assert!(Image::solid_ldr(0, 4, 3, 0).is_err());
        assert_eq!(Image::solid_ldr(2, 2, 1, 7).unwrap().pixels, ImagePixels::Ldr(vec![7; 4]));
    }

    #[test]
    fn test_embedded_shader_lookup() {
        assert!(EmbeddedShaders.shader_source("pbr_fs").is_some());
        assert!(EmbeddedShaders.shader_source("nonexistent").is_none());
    }
}
