//! GPU-side assets shared by the renderer core and its native host:
//! embedded WGSL sources and `#[repr(C)]` layouts of the data the shaders read.

pub mod shaders;
pub mod uniforms;
