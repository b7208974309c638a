//! Renderer lifecycle: `initialize` -> `setup` -> `render`* -> `shutdown`.
//!
//! The two configured states are separate types, so rendering before setup or
//! setting up twice does not compile.

use crate::assets::Assets;
use crate::compositor::{compose_frame, SceneResources};
use crate::config::{RendererConfig, DEPTH_STENCIL_FORMAT, HDR_FORMAT};
use crate::context::GpuContext;
use crate::error::{RendererError, Result};
use crate::ibl::{precompute_environment, EnvironmentMaps};
use crate::mipmap::MipmapGenerator;
use crate::resources::{create_framebuffer, create_texture, read_texture, FrameBuffer, Texture, TextureTarget};
use crate::view::ViewSettings;

/// Format of the headless presentation target.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Where the resolved color of a frame lives.
#[derive(Debug, Default)]
pub enum ResolveTarget {
    /// Single-sampled rendering: the offscreen framebuffer is sampled directly.
    #[default]
    Aliased,
    Distinct(FrameBuffer),
}

impl ResolveTarget {
    pub fn is_aliased(&self) -> bool {
        matches!(self, ResolveTarget::Aliased)
    }

    /// The framebuffer the tonemap pass samples.
    pub fn framebuffer<'a>(&'a self, offscreen: &'a FrameBuffer) -> &'a FrameBuffer {
        match self {
            ResolveTarget::Aliased => offscreen,
            ResolveTarget::Distinct(framebuffer) => framebuffer,
        }
    }
}

/// The HDR offscreen framebuffer and its resolve target.
#[derive(Debug, Default)]
pub struct Framebuffers {
    pub offscreen: FrameBuffer,
    pub resolve: ResolveTarget,
}

impl Framebuffers {
    pub fn create(ctx: &GpuContext, width: u32, height: u32, samples: u32) -> Result<Self> {
        let offscreen = create_framebuffer(
            ctx,
            width,
            height,
            samples,
            Some(HDR_FORMAT),
            Some(DEPTH_STENCIL_FORMAT),
        )?;
        let resolve = if samples > 0 {
            ResolveTarget::Distinct(create_framebuffer(ctx, width, height, 0, Some(HDR_FORMAT), None)?)
        } else {
            ResolveTarget::Aliased
        };
        Ok(Self { offscreen, resolve })
    }

    pub fn resolved(&self) -> &FrameBuffer {
        self.resolve.framebuffer(&self.offscreen)
    }

    pub fn delete(&mut self) {
        self.offscreen.delete();
        if let ResolveTarget::Distinct(framebuffer) = &mut self.resolve {
            framebuffer.delete();
        }
        self.resolve = ResolveTarget::Aliased;
    }
}

/// The final color target of each frame.
pub enum PresentTarget {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Headless(Texture),
}

impl PresentTarget {
    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            PresentTarget::Surface { config, .. } => config.format,
            PresentTarget::Headless(_) => HEADLESS_FORMAT,
        }
    }
}

/// Present mode for the requested vertical sync among those the surface supports.
pub fn select_present_mode(vsync: bool, supported: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else if supported.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Surface format to render into; the tonemap shader applies gamma itself.
pub fn select_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// A renderer with a device, a presentation target, and framebuffers, but no scene yet.
pub struct Renderer {
    ctx: GpuContext,
    present: PresentTarget,
    framebuffers: Framebuffers,
    config: RendererConfig,
}

impl Renderer {
    /// Create a device presenting to `window`.
    pub fn initialize(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        config: &RendererConfig,
    ) -> Result<Self> {
        config.validate()?;
        let instance = GpuContext::create_instance(config.debug);
        let surface = instance.create_surface(window).map_err(|e| {
            RendererError::ContextCreationFailed(format!("failed to create surface: {e}"))
        })?;
        let ctx = GpuContext::new(&instance, Some(&surface), config.debug)?;

        let caps = surface.get_capabilities(&ctx.adapter);
        let format = select_surface_format(&caps.formats).ok_or_else(|| {
            RendererError::ContextCreationFailed("surface is not supported by the adapter".into())
        })?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: config.width,
            height: config.height,
            present_mode: select_present_mode(config.vsync, &caps.present_modes),
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let (_, error) = ctx.capture_errors(|device| surface.configure(device, &surface_config));
        if let Some(error) = error {
            return Err(RendererError::ContextCreationFailed(format!(
                "failed to configure surface: {error}"
            )));
        }
        log::info!(
            "Surface configured: {}x{} {:?} {:?}",
            config.width,
            config.height,
            format,
            surface_config.present_mode
        );

        Self::with_target(
            ctx,
            PresentTarget::Surface { surface, config: surface_config },
            config,
        )
    }

    /// Create a device rendering into an offscreen texture instead of a window.
    pub fn initialize_headless(config: &RendererConfig) -> Result<Self> {
        config.validate()?;
        let ctx = GpuContext::headless(config.debug)?;
        let target = create_texture(
            &ctx,
            TextureTarget::D2,
            config.width,
            config.height,
            HEADLESS_FORMAT,
            1,
        )?;
        Self::with_target(ctx, PresentTarget::Headless(target), config)
    }

    fn with_target(ctx: GpuContext, present: PresentTarget, config: &RendererConfig) -> Result<Self> {
        let framebuffers = Framebuffers::create(&ctx, config.width, config.height, config.samples)?;
        log::info!(
            "Renderer initialized: {}x{}, {} samples, resolve {}",
            config.width,
            config.height,
            config.samples,
            if framebuffers.resolve.is_aliased() { "aliased" } else { "distinct" }
        );
        Ok(Self { ctx, present, framebuffers, config: config.clone() })
    }

    /// Build every static resource and precompute the environment maps.
    ///
    /// Blocks until the GPU has finished the precomputation.
    pub fn setup<A: Assets + ?Sized>(mut self, assets: &A) -> Result<ConfiguredRenderer> {
        let mut mipmaps = MipmapGenerator::new(&self.ctx.device);
        let scene = SceneResources::load(
            &mut self.ctx,
            &mut mipmaps,
            assets,
            &self.config,
            self.present.format(),
        )?;
        let environment = precompute_environment(
            &mut self.ctx,
            &mut mipmaps,
            assets,
            &self.config.environment,
            &self.config.assets,
        )?;
        self.ctx.finish();
        log::info!("Renderer setup complete");

        Ok(ConfiguredRenderer {
            ctx: self.ctx,
            present: self.present,
            framebuffers: self.framebuffers,
            scene,
            environment,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn framebuffers(&self) -> &Framebuffers {
        &self.framebuffers
    }

    pub fn shutdown(mut self) {
        self.framebuffers.delete();
        if let PresentTarget::Headless(texture) = &mut self.present {
            texture.delete();
        }
        self.ctx.finish();
        log::info!("Renderer shut down");
    }
}

/// A renderer with its scene and environment maps built, ready to draw frames.
pub struct ConfiguredRenderer {
    ctx: GpuContext,
    present: PresentTarget,
    framebuffers: Framebuffers,
    scene: SceneResources,
    environment: EnvironmentMaps,
}

impl ConfiguredRenderer {
    /// Draw and present one frame.
    ///
    /// Frames the surface cannot provide are skipped; failures are logged.
    pub fn render(&mut self, view: &ViewSettings) {
        let offscreen = &self.framebuffers.offscreen;
        let resolved = self.framebuffers.resolved();
        match &mut self.present {
            PresentTarget::Headless(texture) => {
                let Some(output) = texture.view.as_ref() else {
                    log::warn!("Frame skipped: output texture has been released");
                    return;
                };
                if let Err(e) = compose_frame(
                    &mut self.ctx,
                    &self.scene,
                    &self.environment,
                    offscreen,
                    resolved,
                    view,
                    output,
                ) {
                    log::error!("Frame failed: {e}");
                }
            }
            PresentTarget::Surface { surface, config } => {
                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                        log::warn!("Frame skipped: surface outdated, reconfiguring");
                        surface.configure(&self.ctx.device, config);
                        return;
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Frame skipped: surface timeout");
                        return;
                    }
                    Err(e) => {
                        log::error!("Failed to acquire surface texture: {e}");
                        return;
                    }
                };
                let output = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
                if let Err(e) = compose_frame(
                    &mut self.ctx,
                    &self.scene,
                    &self.environment,
                    offscreen,
                    resolved,
                    view,
                    &output,
                ) {
                    log::error!("Frame failed: {e}");
                }
                frame.present();
            }
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn environment(&self) -> &EnvironmentMaps {
        &self.environment
    }

    pub fn framebuffers(&self) -> &Framebuffers {
        &self.framebuffers
    }

    /// The headless output texture, if rendering without a surface.
    pub fn output_texture(&self) -> Option<&Texture> {
        match &self.present {
            PresentTarget::Headless(texture) => Some(texture),
            PresentTarget::Surface { .. } => None,
        }
    }

    /// Read back the last headless frame as RGBA8 rows.
    pub fn read_output(&mut self) -> Result<Vec<u8>> {
        let PresentTarget::Headless(texture) = &self.present else {
            return Err(RendererError::ResourceCreationFailed {
                resource: "readback",
                reason: "surface frames cannot be read back".into(),
            });
        };
        read_texture(&mut self.ctx, texture, 0, 0)
    }

    /// Release every GPU resource. The offscreen framebuffer is destroyed once even when aliased.
    pub fn shutdown(mut self) {
        // Recorded work may still reference the resources.
        self.ctx.finish();
        self.environment.delete();
        self.scene.delete();
        self.framebuffers.delete();
        if let PresentTarget::Headless(texture) = &mut self.present {
            texture.delete();
        }
        self.ctx.finish();
        log::info!("Renderer shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliased_resolve_is_offscreen() {
        let offscreen = FrameBuffer::default();
        let resolve = ResolveTarget::Aliased;
        assert!(resolve.is_aliased());
        assert!(std::ptr::eq(resolve.framebuffer(&offscreen), &offscreen));
    }

    #[test]
    fn test_distinct_resolve_is_separate() {
        let offscreen = FrameBuffer::default();
        let resolve = ResolveTarget::Distinct(FrameBuffer { width: 8, height: 8, ..Default::default() });
        assert!(!resolve.is_aliased());
        let target = resolve.framebuffer(&offscreen);
        assert!(!std::ptr::eq(target, &offscreen));
        assert_eq!(target.width, 8);
    }

    #[test]
    fn test_framebuffers_delete_twice() {
        let mut framebuffers = Framebuffers {
            offscreen: FrameBuffer::default(),
            resolve: ResolveTarget::Distinct(FrameBuffer::default()),
        };
        framebuffers.delete();
        assert!(framebuffers.resolve.is_aliased());
        framebuffers.delete();
        assert!(framebuffers.offscreen.is_empty());
    }

    #[test]
    fn test_present_mode_selection() {
        use wgpu::PresentMode as P;
        assert_eq!(select_present_mode(true, &[P::Fifo, P::Immediate]), P::Fifo);
        assert_eq!(select_present_mode(false, &[P::Fifo, P::Immediate]), P::Immediate);
        assert_eq!(select_present_mode(false, &[P::Fifo]), P::AutoNoVsync);
    }

    #[test]
    fn test_surface_format_prefers_linear() {
        use wgpu::TextureFormat as F;
        assert_eq!(select_surface_format(&[F::Bgra8UnormSrgb, F::Bgra8Unorm]), Some(F::Bgra8Unorm));
        assert_eq!(select_surface_format(&[F::Bgra8UnormSrgb]), Some(F::Bgra8UnormSrgb));
        assert_eq!(select_surface_format(&[]), None);
    }
}
