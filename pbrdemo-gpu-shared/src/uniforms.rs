use bytemuck::{Pod, Zeroable};

/// One mesh vertex as consumed by the skybox and PBR vertex stages.
/// Attribute `i` of the first four lives at byte offset `12 * i`; the texcoord closes the record.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub texcoord: [f32; 2],
}

/// Interleaved clip-space position + texcoord for the full-screen quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

/// Full-screen quad in triangle-strip order.
pub const CLIP_SPACE_QUAD: [QuadVertex; 4] = [
    QuadVertex { position: [1.0, 1.0], texcoord: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0], texcoord: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], texcoord: [1.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0], texcoord: [0.0, 0.0] },
];

/// `mat4x4<f32>` uniform (view-projection matrices).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MatrixUniform {
    pub value: [[f32; 4]; 4],
}

/// `vec3<f32>` uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vec3Uniform {
    pub value: [f32; 3],
    pub _pad: f32,
}

impl Vec3Uniform {
    pub fn new(value: [f32; 3]) -> Self {
        Self { value, _pad: 0.0 }
    }
}

/// Scalar `f32` uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FloatUniform {
    pub value: f32,
    pub _pad: [f32; 3],
}

impl FloatUniform {
    pub fn new(value: f32) -> Self {
        Self { value, _pad: [0.0; 3] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_mesh_vertex_layout() {
        assert_eq!(size_of::<MeshVertex>(), 56);
        assert_eq!(offset_of!(MeshVertex, normal), 12);
        assert_eq!(offset_of!(MeshVertex, tangent), 24);
        assert_eq!(offset_of!(MeshVertex, bitangent), 36);
        assert_eq!(offset_of!(MeshVertex, texcoord), 48);
    }

    #[test]
    fn test_quad_covers_clip_space() {
        assert_eq!(size_of::<QuadVertex>(), 16);
        for v in CLIP_SPACE_QUAD {
            assert_eq!(v.position[0].abs(), 1.0);
            assert_eq!(v.position[1].abs(), 1.0);
            assert_eq!(v.texcoord[0], (v.position[0] + 1.0) * 0.5);
            assert_eq!(v.texcoord[1], (v.position[1] + 1.0) * 0.5);
        }
    }

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(size_of::<MatrixUniform>(), 64);
        assert_eq!(size_of::<Vec3Uniform>(), 16);
        assert_eq!(size_of::<FloatUniform>(), 16);
    }
}
