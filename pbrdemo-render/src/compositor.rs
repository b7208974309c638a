//! Frame composition: skybox and PBR model into the HDR framebuffer, multisample
//! resolve, then tonemapping onto the presentation target.

use pbrdemo_gpu_shared::uniforms::{MatrixUniform, Vec3Uniform};

use crate::assets::Assets;
use crate::config::{RendererConfig, HDR_FORMAT};
use crate::context::GpuContext;
use crate::error::{RendererError, Result};
use crate::ibl::EnvironmentMaps;
use crate::mipmap::MipmapGenerator;
use crate::resources::{
    create_clip_space_quad, create_texture_from_image, create_vertex_buffer, resolve_framebuffer,
    FrameBuffer, Texture, TextureTarget, VertexBuffer, VertexLayout,
};
use crate::shader::{
    compile_shader, link_program, DepthMode, PipelineKind, Program, ProgramInterface, RasterState,
    ShaderStage, TextureBinding, TextureUnit, UniformSlot,
};
use crate::view::{FrameMatrices, ViewSettings};

pub const ALBEDO_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const METALNESS_UNIT: u32 = 2;
pub const ROUGHNESS_UNIT: u32 = 3;
pub const IRRADIANCE_UNIT: u32 = 4;
pub const SPECULAR_UNIT: u32 = 5;
pub const BRDF_LUT_UNIT: u32 = 6;

pub static TONEMAP_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Tonemap",
    uniforms: &[],
    textures: &[TextureUnit { unit: 0, target: TextureTarget::D2 }],
    images: &[],
};

pub static SKYBOX_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Skybox",
    uniforms: &[UniformSlot::ViewProjectionMatrix],
    textures: &[TextureUnit { unit: 0, target: TextureTarget::Cube }],
    images: &[],
};

pub static PBR_INTERFACE: ProgramInterface = ProgramInterface {
    label: "PBR",
    uniforms: &[UniformSlot::ViewProjectionMatrix, UniformSlot::EyePosition],
    textures: &[
        TextureUnit { unit: ALBEDO_UNIT, target: TextureTarget::D2 },
        TextureUnit { unit: NORMAL_UNIT, target: TextureTarget::D2 },
        TextureUnit { unit: METALNESS_UNIT, target: TextureTarget::D2 },
        TextureUnit { unit: ROUGHNESS_UNIT, target: TextureTarget::D2 },
        TextureUnit { unit: IRRADIANCE_UNIT, target: TextureTarget::Cube },
        TextureUnit { unit: SPECULAR_UNIT, target: TextureTarget::Cube },
        TextureUnit { unit: BRDF_LUT_UNIT, target: TextureTarget::D2 },
    ],
    images: &[],
};

/// Meshes, material textures, and programs the frame is drawn with.
#[derive(Default)]
pub struct SceneResources {
    pub screen_quad: VertexBuffer,
    pub skybox: VertexBuffer,
    pub model: VertexBuffer,
    pub albedo: Texture,
    pub normal: Texture,
    pub metalness: Texture,
    pub roughness: Texture,
    pub tonemap_program: Option<Program>,
    pub skybox_program: Option<Program>,
    pub pbr_program: Option<Program>,
}

impl SceneResources {
    /// Build everything but the environment maps.
    ///
    /// `output_format` is the format of the presentation target the tonemap pass writes.
    pub fn load<A: Assets + ?Sized>(
        ctx: &mut GpuContext,
        mipmaps: &mut MipmapGenerator,
        assets: &A,
        config: &RendererConfig,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let ids = &config.assets;
        let shaders = &ids.shaders;
        let mut scene = SceneResources::default();

        scene.screen_quad = create_clip_space_quad(ctx)?;
        scene.tonemap_program = Some(link_program(
            ctx,
            vec![
                compile_shader(ctx, assets, &shaders.passthrough_vs, ShaderStage::Vertex)?,
                compile_shader(ctx, assets, &shaders.tonemap_fs, ShaderStage::Fragment)?,
            ],
            &TONEMAP_INTERFACE,
            PipelineKind::Graphics(RasterState {
                vertex_layout: VertexLayout::ClipSpaceQuad,
                cull_mode: None,
                depth: DepthMode::Detached,
                samples: 0,
                color_format: output_format,
            }),
        )?);

        scene.skybox = create_vertex_buffer(ctx, &assets.load_mesh(&ids.skybox_mesh)?)?;
        scene.skybox_program = Some(link_program(
            ctx,
            vec![
                compile_shader(ctx, assets, &shaders.skybox_vs, ShaderStage::Vertex)?,
                compile_shader(ctx, assets, &shaders.skybox_fs, ShaderStage::Fragment)?,
            ],
            &SKYBOX_INTERFACE,
            // Seen from inside, so both windings must pass.
            PipelineKind::Graphics(RasterState {
                vertex_layout: VertexLayout::Mesh,
                cull_mode: None,
                depth: DepthMode::Ignore,
                samples: config.samples,
                color_format: HDR_FORMAT,
            }),
        )?);

        scene.model = create_vertex_buffer(ctx, &assets.load_mesh(&ids.model_mesh)?)?;
        scene.pbr_program = Some(link_program(
            ctx,
            vec![
                compile_shader(ctx, assets, &shaders.pbr_vs, ShaderStage::Vertex)?,
                compile_shader(ctx, assets, &shaders.pbr_fs, ShaderStage::Fragment)?,
            ],
            &PBR_INTERFACE,
            PipelineKind::Graphics(RasterState {
                vertex_layout: VertexLayout::Mesh,
                cull_mode: Some(wgpu::Face::Back),
                depth: DepthMode::TestAndWrite,
                samples: config.samples,
                color_format: HDR_FORMAT,
            }),
        )?);

        let mut material = |asset: &crate::config::ImageAsset| -> Result<Texture> {
            let image = assets.load_image(&asset.id, asset.channels)?;
            create_texture_from_image(ctx, mipmaps, &image, asset.format, 0)
        };
        scene.albedo = material(&ids.albedo)?;
        scene.normal = material(&ids.normal)?;
        scene.metalness = material(&ids.metalness)?;
        scene.roughness = material(&ids.roughness)?;

        log::info!(
            "Scene loaded: model {} indices, skybox {} indices",
            scene.model.index_count,
            scene.skybox.index_count
        );
        Ok(scene)
    }

    pub fn delete(&mut self) {
        self.screen_quad.delete();
        self.skybox.delete();
        self.model.delete();
        self.albedo.delete();
        self.normal.delete();
        self.metalness.delete();
        self.roughness.delete();
        self.tonemap_program = None;
        self.skybox_program = None;
        self.pbr_program = None;
    }
}

/// Record and submit one frame.
///
/// `resolve` may be the same framebuffer as `offscreen`, in which case no resolve is recorded.
pub fn compose_frame(
    ctx: &mut GpuContext,
    scene: &SceneResources,
    environment: &EnvironmentMaps,
    offscreen: &FrameBuffer,
    resolve: &FrameBuffer,
    view: &ViewSettings,
    output: &wgpu::TextureView,
) -> Result<()> {
    let released = |what: &str| RendererError::ResourceCreationFailed {
        resource: "frame",
        reason: format!("{what} has been released"),
    };
    let (Some(tonemap), Some(skybox), Some(pbr)) =
        (&scene.tonemap_program, &scene.skybox_program, &scene.pbr_program)
    else {
        return Err(released("scene program"));
    };

    let matrices = FrameMatrices::new(view, offscreen.width, offscreen.height);
    skybox.set_uniform(
        ctx,
        UniformSlot::ViewProjectionMatrix,
        bytemuck::bytes_of(&MatrixUniform { value: matrices.skybox_view_projection().to_cols_array_2d() }),
    );
    pbr.set_uniform(
        ctx,
        UniformSlot::ViewProjectionMatrix,
        bytemuck::bytes_of(&MatrixUniform { value: matrices.scene_view_projection().to_cols_array_2d() }),
    );
    pbr.set_uniform(
        ctx,
        UniformSlot::EyePosition,
        bytemuck::bytes_of(&Vec3Uniform::new(matrices.eye_position.to_array())),
    );

    let skybox_bindings =
        skybox.bind_resources(ctx, &[TextureBinding::new(0, &environment.environment)], &[])?;
    let pbr_bindings = pbr.bind_resources(
        ctx,
        &[
            TextureBinding::new(ALBEDO_UNIT, &scene.albedo),
            TextureBinding::new(NORMAL_UNIT, &scene.normal),
            TextureBinding::new(METALNESS_UNIT, &scene.metalness),
            TextureBinding::new(ROUGHNESS_UNIT, &scene.roughness),
            TextureBinding::new(IRRADIANCE_UNIT, &environment.irradiance),
            TextureBinding::new(SPECULAR_UNIT, &environment.specular),
            TextureBinding::new(BRDF_LUT_UNIT, &environment.brdf_lut),
        ],
        &[],
    )?;

    let (Some(color), Some(depth_stencil)) = (offscreen.color_view(), offscreen.depth_stencil_view())
    else {
        return Err(released("offscreen framebuffer"));
    };
    {
        let mut pass = ctx.encoder().begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                // The skybox overwrites every pixel. Clearing keeps the previous
                // frame from being loaded; depth alone would give the same image.
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_stencil,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        skybox.draw(&mut pass, &skybox_bindings, &scene.skybox);
        pbr.draw(&mut pass, &pbr_bindings, &scene.model);
    }

    resolve_framebuffer(ctx, offscreen, resolve);

    let resolved = resolve.color_texture().ok_or_else(|| released("resolved color"))?;
    let tonemap_bindings = tonemap.bind_resources(ctx, &[TextureBinding::new(0, resolved)], &[])?;
    {
        let mut pass = ctx.encoder().begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Tonemap Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        tonemap.draw(&mut pass, &tonemap_bindings, &scene.screen_quad);
    }

    ctx.submit();
    Ok(())
}
