//! Shared setup for GPU integration tests.
//!
//! Tests that need a device call [`headless_context`] or [`headless_renderer`]
//! and return early when no adapter with the required capabilities exists.
//! With `PBRDEMO_REQUIRE_GPU` set (to anything but `0`), a missing adapter or
//! capability fails the test instead.

#![allow(dead_code)]

use std::collections::HashMap;

use half::f16;
use pbrdemo_render::assets::{EmbeddedShaders, BUILTIN_SKYBOX, SKYBOX_HALF_EXTENT};
use pbrdemo_render::context::GpuContext;
use pbrdemo_render::resources::FramebufferStatus;
use pbrdemo_render::{
    EnvironmentConfig, Image, ImageProvider, Mesh, MeshProvider, Renderer, RendererConfig,
    RendererError, Result, ShaderSourceProvider,
};

pub const GRAY: f32 = 0.5;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const REQUIRE_GPU_VAR: &str = "PBRDEMO_REQUIRE_GPU";

pub fn gpu_required() -> bool {
    std::env::var(REQUIRE_GPU_VAR).is_ok_and(|value| !value.is_empty() && value != "0")
}

/// `None` when the adapter lacks what the renderer needs, unless `required`.
pub fn skip_unavailable<T>(result: Result<T>, required: bool) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(
            e @ (RendererError::ContextCreationFailed(_)
            | RendererError::ExtensionLoadFailed(_)
            | RendererError::FramebufferIncomplete { status: FramebufferStatus::UnsupportedSampleCount }),
        ) => {
            if required {
                panic!("{REQUIRE_GPU_VAR} is set but the GPU is unusable: {e}");
            }
            eprintln!("Skipping GPU test: {e} (set {REQUIRE_GPU_VAR}=1 to fail instead)");
            None
        }
        Err(e) => panic!("unexpected initialization failure: {e}"),
    }
}

pub fn headless_context() -> Option<GpuContext> {
    init_logging();
    skip_unavailable(GpuContext::headless(true), gpu_required())
}

pub fn headless_renderer(config: &RendererConfig) -> Option<Renderer> {
    init_logging();
    skip_unavailable(Renderer::initialize_headless(config), gpu_required())
}

/// Small framebuffers and environment maps so the full pipeline runs quickly.
pub fn small_config(samples: u32) -> RendererConfig {
    RendererConfig {
        width: 64,
        height: 64,
        samples,
        environment: EnvironmentConfig {
            cubemap_size: 64,
            irradiance_size: 32,
            brdf_lut_size: 32,
        },
        ..Default::default()
    }
}

/// In-memory assets: a uniform gray environment, cube meshes, and flat material maps.
pub struct TestAssets {
    pub environment_id: String,
    pub environment: Image,
    /// Replaces embedded shader sources by id.
    pub shader_overrides: HashMap<String, String>,
}

impl TestAssets {
    pub fn gray(config: &RendererConfig) -> Self {
        Self {
            environment_id: config.assets.environment.clone(),
            environment: Image::solid_hdr(128, 64, 3, GRAY).expect("gray environment"),
            shader_overrides: HashMap::new(),
        }
    }

    pub fn with_shader(mut self, id: &str, source: &str) -> Self {
        self.shader_overrides.insert(id.to_owned(), source.to_owned());
        self
    }
}

impl MeshProvider for TestAssets {
    fn load_mesh(&self, id: &str) -> Result<Mesh> {
        if id == BUILTIN_SKYBOX {
            Ok(Mesh::cube(SKYBOX_HALF_EXTENT))
        } else {
            Ok(Mesh::cube(30.0))
        }
    }
}

impl ImageProvider for TestAssets {
    fn load_image(&self, id: &str, channels: u32) -> Result<Image> {
        if id == self.environment_id {
            Ok(self.environment.clone())
        } else {
            Image::solid_ldr(4, 4, channels, 128)
        }
    }
}

impl ShaderSourceProvider for TestAssets {
    fn shader_source(&self, id: &str) -> Option<String> {
        self.shader_overrides
            .get(id)
            .cloned()
            .or_else(|| EmbeddedShaders.shader_source(id))
    }
}

/// Decode little-endian f16 texels.
pub fn f16_texels(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
        .collect()
}

/// Assert every RGBA texel has `expected` in its color channels.
pub fn assert_uniform_rgba(texels: &[f32], expected: f32, tolerance: f32, what: &str) {
    for (i, texel) in texels.chunks_exact(4).enumerate() {
        for &channel in &texel[..3] {
            assert!(
                (channel - expected).abs() <= tolerance,
                "{what}: texel {i} is {texel:?}, expected {expected}"
            );
        }
    }
}
