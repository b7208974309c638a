//! Image-based-lighting PBR renderer on wgpu.
//!
//! Converts an equirectangular HDR environment into a cubemap, an irradiance
//! map, a prefiltered specular map, and a split-sum BRDF lookup table, then
//! renders a single PBR-textured model lit by them under a skybox with
//! tonemapped output.

pub mod assets;
pub mod compositor;
pub mod config;
pub mod context;
pub mod error;
pub mod ibl;
pub mod mipmap;
pub mod renderer;
pub mod resources;
pub mod shader;
pub mod view;

pub use assets::{Assets, Image, ImagePixels, ImageProvider, Mesh, MeshProvider, ShaderSourceProvider};
pub use config::{EnvironmentConfig, RendererConfig, SceneAssets};
pub use error::{RendererError, Result};
pub use renderer::{ConfiguredRenderer, Renderer};
pub use view::ViewSettings;
