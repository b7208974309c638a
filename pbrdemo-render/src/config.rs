//! Renderer configuration: surface size, multisampling, environment map sizes,
//! and the asset ids the setup stage asks its providers for.

use crate::error::{RendererError, Result};
use crate::ibl::WORKGROUP_SIZE;

/// Texture format of the HDR scene and all environment cubemaps.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth-stencil format of the offscreen framebuffer.
pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
/// Format of the split-sum BRDF lookup table.
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    /// Multisample count of the offscreen framebuffer. 0 means single-sampled.
    pub samples: u32,
    pub vsync: bool,
    /// Enables backend validation and routes uncaptured device errors to the log.
    pub debug: bool,
    pub environment: EnvironmentConfig,
    pub assets: SceneAssets,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            samples: 0,
            vsync: true,
            debug: false,
            environment: EnvironmentConfig::default(),
            assets: SceneAssets::default(),
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RendererError::ResourceCreationFailed {
                resource: "framebuffer",
                reason: format!("invalid size {}x{}", self.width, self.height),
            });
        }
        self.environment.validate()
    }
}

/// Edge lengths of the precomputed environment textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Environment and pre-filtered specular cubemaps.
    pub cubemap_size: u32,
    /// Diffuse irradiance cubemap.
    pub irradiance_size: u32,
    /// Split-sum BRDF lookup table.
    pub brdf_lut_size: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            cubemap_size: 1024,
            irradiance_size: 32,
            brdf_lut_size: 256,
        }
    }
}

impl EnvironmentConfig {
    /// Every size must be a whole number of compute workgroups.
    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("cubemap", self.cubemap_size),
            ("irradiance", self.irradiance_size),
            ("BRDF lookup table", self.brdf_lut_size),
        ] {
            if size == 0 || size % WORKGROUP_SIZE != 0 {
                return Err(RendererError::ResourceCreationFailed {
                    resource: "environment map",
                    reason: format!(
                        "{name} size {size} is not a positive multiple of {WORKGROUP_SIZE}"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// An image asset plus the texture it becomes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub id: String,
    /// Channel count requested from the image provider.
    pub channels: u32,
    pub format: wgpu::TextureFormat,
}

impl ImageAsset {
    pub fn new(id: impl Into<String>, channels: u32, format: wgpu::TextureFormat) -> Self {
        Self { id: id.into(), channels, format }
    }
}

/// Logical source ids of the shaders the setup stage compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderIds {
    pub passthrough_vs: String,
    pub tonemap_fs: String,
    pub skybox_vs: String,
    pub skybox_fs: String,
    pub pbr_vs: String,
    pub pbr_fs: String,
    pub equirect_to_cube_cs: String,
    pub irradiance_map_cs: String,
    pub specular_map_cs: String,
    pub specular_brdf_cs: String,
}

impl Default for ShaderIds {
    fn default() -> Self {
        Self {
            passthrough_vs: "passthrough_vs".into(),
            tonemap_fs: "tonemap_fs".into(),
            skybox_vs: "skybox_vs".into(),
            skybox_fs: "skybox_fs".into(),
            pbr_vs: "pbr_vs".into(),
            pbr_fs: "pbr_fs".into(),
            equirect_to_cube_cs: "equirect2cube_cs".into(),
            irradiance_map_cs: "irmap_cs".into(),
            specular_map_cs: "spmap_cs".into(),
            specular_brdf_cs: "spbrdf_cs".into(),
        }
    }
}

/// Everything the setup stage loads through its providers.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAssets {
    pub skybox_mesh: String,
    pub model_mesh: String,
    pub albedo: ImageAsset,
    pub normal: ImageAsset,
    pub metalness: ImageAsset,
    pub roughness: ImageAsset,
    /// Equirectangular HDR environment.
    pub environment: String,
    pub shaders: ShaderIds,
}

impl Default for SceneAssets {
    fn default() -> Self {
        Self {
            skybox_mesh: crate::assets::BUILTIN_SKYBOX.into(),
            model_mesh: "meshes/cerberus.glb".into(),
            albedo: ImageAsset::new(
                "textures/cerberus_A.png",
                3,
                wgpu::TextureFormat::Rgba8UnormSrgb,
            ),
            normal: ImageAsset::new("textures/cerberus_N.png", 3, wgpu::TextureFormat::Rgba8Unorm),
            metalness: ImageAsset::new("textures/cerberus_M.png", 1, wgpu::TextureFormat::R8Unorm),
            roughness: ImageAsset::new("textures/cerberus_R.png", 1, wgpu::TextureFormat::R8Unorm),
            environment: "environment.hdr".into(),
            shaders: ShaderIds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_environment_sizes() {
        let env = EnvironmentConfig::default();
        assert_eq!(env.cubemap_size, 1024);
        assert_eq!(env.irradiance_size, 32);
        assert_eq!(env.brdf_lut_size, 256);
        assert!(env.validate().is_ok());
    }

    #[rstest]
    #[case(0, 32, 256)]
    #[case(1000, 32, 256)]
    #[case(1024, 16, 256)]
    #[case(1024, 32, 100)]
    fn test_environment_sizes_must_fill_workgroups(
        #[case] cubemap_size: u32,
        #[case] irradiance_size: u32,
        #[case] brdf_lut_size: u32,
    ) {
        let env = EnvironmentConfig { cubemap_size, irradiance_size, brdf_lut_size };
        assert!(matches!(
            env.validate(),
            Err(RendererError::ResourceCreationFailed { resource: "environment map", .. })
        ));
    }

    #[test]
    fn test_zero_sized_surface_rejected() {
        let config = RendererConfig { width: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_material_formats() {
        let assets = SceneAssets::default();
        assert!(assets.albedo.format.is_srgb());
        assert!(!assets.normal.format.is_srgb());
        assert_eq!(assets.metalness.channels, 1);
        assert_eq!(assets.roughness.format, wgpu::TextureFormat::R8Unorm);
    }
}
