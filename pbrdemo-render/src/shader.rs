//! Shader compilation, program linking, and resource binding.
//!
//! Sources are WGSL addressed by logical id. Each source is parsed and
//! validated with naga before the device sees it, so compile errors carry a
//! readable diagnostic. Linking checks every stage's resource bindings against
//! the [`ProgramInterface`] the caller declares and builds the pipeline from it.
//!
//! Binding conventions shared by all shaders:
//! - `@group(0)`: uniforms, one binding per [`UniformSlot`].
//! - `@group(1)`: sampled textures; unit `u` is the texture at binding `2u`
//!   and its sampler at `2u + 1`.
//! - `@group(2)`: write-only storage images; unit `u` is binding `u`.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::assets::ShaderSourceProvider;
use crate::config::DEPTH_STENCIL_FORMAT;
use crate::context::GpuContext;
use crate::error::{RendererError, Result};
use crate::resources::{Texture, TextureTarget, VertexBuffer, VertexLayout};

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;
pub const IMAGE_GROUP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
            ShaderStage::Compute => "cs_main",
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
            ShaderStage::Compute => naga::ShaderStage::Compute,
        }
    }
}

/// Named uniform locations shared by all programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    ViewProjectionMatrix,
    EyePosition,
    SpecularMapRoughness,
}

impl UniformSlot {
    pub fn binding(self) -> u32 {
        match self {
            UniformSlot::ViewProjectionMatrix => 0,
            UniformSlot::EyePosition => 1,
            UniformSlot::SpecularMapRoughness => 0,
        }
    }

    /// Size of the WGSL type in bytes.
    pub fn size(self) -> u64 {
        match self {
            UniformSlot::ViewProjectionMatrix => 64,
            UniformSlot::EyePosition => 12,
            UniformSlot::SpecularMapRoughness => 4,
        }
    }

    /// Backing buffer size, padded to the 16-byte uniform alignment.
    pub fn buffer_size(self) -> u64 {
        self.size().div_ceil(16) * 16
    }

    fn matches(self, inner: &naga::TypeInner) -> bool {
        use naga::{Scalar, TypeInner, VectorSize};
        match (self, inner) {
            (
                UniformSlot::ViewProjectionMatrix,
                TypeInner::Matrix { columns: VectorSize::Quad, rows: VectorSize::Quad, scalar },
            ) => *scalar == Scalar::F32,
            (UniformSlot::EyePosition, TypeInner::Vector { size: VectorSize::Tri, scalar }) => {
                *scalar == Scalar::F32
            }
            (UniformSlot::SpecularMapRoughness, TypeInner::Scalar(scalar)) => *scalar == Scalar::F32,
            _ => false,
        }
    }
}

pub fn texture_binding(unit: u32) -> u32 {
    unit * 2
}

pub fn sampler_binding(unit: u32) -> u32 {
    unit * 2 + 1
}

/// A sampled texture unit and the kind of texture bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureUnit {
    pub unit: u32,
    pub target: TextureTarget,
}

/// A write-only storage image unit. Cube targets are bound one level at a time as 2-D arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageUnit {
    pub unit: u32,
    pub target: TextureTarget,
    pub format: wgpu::TextureFormat,
}

/// The resources a program reads and writes.
#[derive(Debug)]
pub struct ProgramInterface {
    pub label: &'static str,
    pub uniforms: &'static [UniformSlot],
    pub textures: &'static [TextureUnit],
    pub images: &'static [ImageUnit],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// No depth attachment.
    Detached,
    /// Attachment present; every fragment passes and depth is left untouched.
    Ignore,
    /// Depth test `Less` with writes.
    TestAndWrite,
}

/// Fixed-function state of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub vertex_layout: VertexLayout,
    pub cull_mode: Option<wgpu::Face>,
    pub depth: DepthMode,
    pub samples: u32,
    pub color_format: wgpu::TextureFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Graphics(RasterState),
    Compute,
}

// ============================================================
// Compilation
// ============================================================

/// A compiled stage. Consumed by [`link_program`].
#[derive(Debug)]
pub struct CompiledShader {
    pub source_id: String,
    pub stage: ShaderStage,
    module: wgpu::ShaderModule,
    reflection: naga::Module,
}

/// Fetch source text, treating empty text as missing.
pub fn load_shader_source<S: ShaderSourceProvider + ?Sized>(sources: &S, source_id: &str) -> Result<String> {
    match sources.shader_source(source_id) {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(RendererError::ShaderSourceMissing { source_id: source_id.to_owned() }),
    }
}

/// Parse and validate WGSL, and require the stage's entry point.
pub fn parse_shader(source_id: &str, text: &str, stage: ShaderStage) -> Result<naga::Module> {
    let compile_failed = |log: String| RendererError::ShaderCompileFailed {
        source_id: source_id.to_owned(),
        log,
    };

    let module = naga::front::wgsl::parse_str(text).map_err(|e| compile_failed(e.emit_to_string(text)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_failed(e.emit_to_string(text)))?;

    let entry = stage.entry_point();
    let found = module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry && ep.stage == stage.naga_stage());
    if !found {
        return Err(compile_failed(format!("no {stage:?} entry point named '{entry}'")));
    }
    Ok(module)
}

/// Compile one stage from the source registered under `source_id`.
pub fn compile_shader<S: ShaderSourceProvider + ?Sized>(
    ctx: &GpuContext,
    sources: &S,
    source_id: &str,
    stage: ShaderStage,
) -> Result<CompiledShader> {
    let text = load_shader_source(sources, source_id)?;
    log::debug!("Compiling {stage:?} shader '{source_id}'");
    let reflection = parse_shader(source_id, &text, stage)?;

    let (module, error) = ctx.capture_errors(|device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source_id),
            source: wgpu::ShaderSource::Wgsl(text.as_str().into()),
        })
    });
    if let Some(error) = error {
        return Err(RendererError::ShaderCompileFailed {
            source_id: source_id.to_owned(),
            log: error.to_string(),
        });
    }

    Ok(CompiledShader {
        source_id: source_id.to_owned(),
        stage,
        module,
        reflection,
    })
}

// ============================================================
// Interface validation
// ============================================================

/// Check every resource binding declared by `module` against `interface`.
pub fn validate_interface(
    source_id: &str,
    module: &naga::Module,
    interface: &ProgramInterface,
) -> std::result::Result<(), String> {
    use naga::{AddressSpace, ImageClass, ImageDimension, StorageAccess, TypeInner};

    for (_, global) in module.global_variables.iter() {
        let Some(binding) = &global.binding else {
            continue;
        };
        let name = global.name.as_deref().unwrap_or("<unnamed>");
        let inner = &module.types[global.ty].inner;
        let at = format!("{source_id}: '{name}' @group({}) @binding({})", binding.group, binding.binding);

        match binding.group {
            UNIFORM_GROUP => {
                let slot = interface
                    .uniforms
                    .iter()
                    .find(|slot| slot.binding() == binding.binding)
                    .ok_or_else(|| format!("{at} is not a declared uniform"))?;
                if global.space != AddressSpace::Uniform || !slot.matches(inner) {
                    return Err(format!("{at} does not match uniform {slot:?}"));
                }
            }
            TEXTURE_GROUP => {
                let unit = interface
                    .textures
                    .iter()
                    .find(|t| {
                        texture_binding(t.unit) == binding.binding
                            || sampler_binding(t.unit) == binding.binding
                    })
                    .ok_or_else(|| format!("{at} is not a declared texture unit"))?;
                let ok = if binding.binding == texture_binding(unit.unit) {
                    let dim = match unit.target {
                        TextureTarget::D2 => ImageDimension::D2,
                        TextureTarget::Cube => ImageDimension::Cube,
                    };
                    matches!(
                        inner,
                        TypeInner::Image {
                            dim: d,
                            arrayed: false,
                            class: ImageClass::Sampled { kind: naga::ScalarKind::Float, multi: false },
                        } if *d == dim
                    )
                } else {
                    matches!(inner, TypeInner::Sampler { comparison: false })
                };
                if !ok {
                    return Err(format!("{at} does not match texture unit {}", unit.unit));
                }
            }
            IMAGE_GROUP => {
                let unit = interface
                    .images
                    .iter()
                    .find(|i| i.unit == binding.binding)
                    .ok_or_else(|| format!("{at} is not a declared image unit"))?;
                let arrayed = unit.target == TextureTarget::Cube;
                let ok = matches!(
                    inner,
                    TypeInner::Image {
                        dim: ImageDimension::D2,
                        arrayed: a,
                        class: ImageClass::Storage { format, access },
                    } if *a == arrayed
                        && access.contains(StorageAccess::STORE)
                        && storage_format(*format) == Some(unit.format)
                );
                if !ok {
                    return Err(format!("{at} does not match image unit {}", unit.unit));
                }
            }
            _ => return Err(format!("{at} uses an unsupported bind group")),
        }
    }
    Ok(())
}

fn storage_format(format: naga::StorageFormat) -> Option<wgpu::TextureFormat> {
    use naga::StorageFormat as S;
    use wgpu::TextureFormat as F;
    Some(match format {
        S::Rgba16Float => F::Rgba16Float,
        S::Rg16Float => F::Rg16Float,
        S::R16Float => F::R16Float,
        S::Rgba32Float => F::Rgba32Float,
        S::Rg32Float => F::Rg32Float,
        S::R32Float => F::R32Float,
        S::Rgba8Unorm => F::Rgba8Unorm,
        _ => return None,
    })
}

// ============================================================
// Linking
// ============================================================

enum ProgramPipeline {
    Graphics(wgpu::RenderPipeline),
    Compute(wgpu::ComputePipeline),
}

/// A linked pipeline with its uniform storage and binding layouts.
pub struct Program {
    label: &'static str,
    interface: &'static ProgramInterface,
    pipeline: ProgramPipeline,
    layouts: [wgpu::BindGroupLayout; 3],
    uniform_buffers: Vec<(UniformSlot, wgpu::Buffer)>,
    uniform_group: wgpu::BindGroup,
}

/// Texture bound to a sampled unit.
#[derive(Clone, Copy)]
pub struct TextureBinding<'a> {
    pub unit: u32,
    pub texture: &'a Texture,
}

impl<'a> TextureBinding<'a> {
    pub fn new(unit: u32, texture: &'a Texture) -> Self {
        Self { unit, texture }
    }
}

/// One mip level of a texture bound to a storage image unit.
#[derive(Clone, Copy)]
pub struct ImageBinding<'a> {
    pub unit: u32,
    pub texture: &'a Texture,
    pub level: u32,
}

impl<'a> ImageBinding<'a> {
    pub fn new(unit: u32, texture: &'a Texture, level: u32) -> Self {
        Self { unit, texture, level }
    }
}

/// Per-draw bind groups for texture and image units.
pub struct ResourceBindings {
    textures: wgpu::BindGroup,
    images: wgpu::BindGroup,
}

/// Stage combinations a pipeline kind accepts.
fn check_stages(stages: &[ShaderStage], kind: &PipelineKind) -> std::result::Result<(), String> {
    let count = |stage| stages.iter().filter(|&&s| s == stage).count();
    let ok = match kind {
        PipelineKind::Graphics(_) => {
            count(ShaderStage::Vertex) == 1 && count(ShaderStage::Fragment) == 1 && stages.len() == 2
        }
        PipelineKind::Compute => count(ShaderStage::Compute) == 1 && stages.len() == 1,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("invalid stage combination {stages:?} for {kind:?}"))
    }
}

fn bind_group_layouts(
    device: &wgpu::Device,
    interface: &ProgramInterface,
    visibility: wgpu::ShaderStages,
) -> [wgpu::BindGroupLayout; 3] {
    let uniforms: Vec<_> = interface
        .uniforms
        .iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding(),
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    let textures: Vec<_> = interface
        .textures
        .iter()
        .flat_map(|unit| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: texture_binding(unit.unit),
                    visibility,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: unit.target.view_dimension(),
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: sampler_binding(unit.unit),
                    visibility,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();

    let images: Vec<_> = interface
        .images
        .iter()
        .map(|unit| wgpu::BindGroupLayoutEntry {
            binding: unit.unit,
            visibility,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: unit.format,
                view_dimension: unit.target.storage_view_dimension(),
            },
            count: None,
        })
        .collect();

    let layout = |label, entries: &[wgpu::BindGroupLayoutEntry]| {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries,
        })
    };
    [
        layout("Uniforms BGL", &uniforms),
        layout("Textures BGL", &textures),
        layout("Images BGL", &images),
    ]
}

fn depth_stencil_state(depth: DepthMode) -> Option<wgpu::DepthStencilState> {
    let (depth_write_enabled, depth_compare) = match depth {
        DepthMode::Detached => return None,
        DepthMode::Ignore => (false, wgpu::CompareFunction::Always),
        DepthMode::TestAndWrite => (true, wgpu::CompareFunction::Less),
    };
    Some(wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

/// Link compiled stages into a program. The stages are consumed whether or not linking succeeds.
pub fn link_program(
    ctx: &GpuContext,
    shaders: Vec<CompiledShader>,
    interface: &'static ProgramInterface,
    kind: PipelineKind,
) -> Result<Program> {
    let link_failed = |log: String| RendererError::ProgramLinkFailed {
        log: format!("{}: {log}", interface.label),
    };

    let stages: Vec<ShaderStage> = shaders.iter().map(|s| s.stage).collect();
    check_stages(&stages, &kind).map_err(link_failed)?;
    for shader in &shaders {
        validate_interface(&shader.source_id, &shader.reflection, interface).map_err(link_failed)?;
    }
    let module = |stage| shaders.iter().find(|s| s.stage == stage).map(|s| &s.module);

    let visibility = match kind {
        PipelineKind::Graphics(_) => wgpu::ShaderStages::VERTEX_FRAGMENT,
        PipelineKind::Compute => wgpu::ShaderStages::COMPUTE,
    };

    let (built, error) = ctx.capture_errors(|device| {
        let layouts = bind_group_layouts(device, interface, visibility);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(interface.label),
            bind_group_layouts: &[&layouts[0], &layouts[1], &layouts[2]],
            push_constant_ranges: &[],
        });

        let pipeline = match (kind, module(ShaderStage::Compute)) {
            (PipelineKind::Compute, Some(compute)) => {
                Some(ProgramPipeline::Compute(device.create_compute_pipeline(
                    &wgpu::ComputePipelineDescriptor {
                        label: Some(interface.label),
                        layout: Some(&pipeline_layout),
                        module: compute,
                        entry_point: Some(ShaderStage::Compute.entry_point()),
                        compilation_options: Default::default(),
                        cache: None,
                    },
                )))
            }
            (PipelineKind::Graphics(raster), _) => {
                match (module(ShaderStage::Vertex), module(ShaderStage::Fragment)) {
                    (Some(vertex), Some(fragment)) => Some(ProgramPipeline::Graphics(
                        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                            label: Some(interface.label),
                            layout: Some(&pipeline_layout),
                            vertex: wgpu::VertexState {
                                module: vertex,
                                entry_point: Some(ShaderStage::Vertex.entry_point()),
                                compilation_options: Default::default(),
                                buffers: &[raster.vertex_layout.buffer_layout()],
                            },
                            primitive: wgpu::PrimitiveState {
                                topology: raster.vertex_layout.topology(),
                                front_face: wgpu::FrontFace::Ccw,
                                cull_mode: raster.cull_mode,
                                ..Default::default()
                            },
                            depth_stencil: depth_stencil_state(raster.depth),
                            multisample: wgpu::MultisampleState {
                                count: raster.samples.max(1),
                                ..Default::default()
                            },
                            fragment: Some(wgpu::FragmentState {
                                module: fragment,
                                entry_point: Some(ShaderStage::Fragment.entry_point()),
                                compilation_options: Default::default(),
                                targets: &[Some(wgpu::ColorTargetState {
                                    format: raster.color_format,
                                    blend: None,
                                    write_mask: wgpu::ColorWrites::ALL,
                                })],
                            }),
                            multiview: None,
                            cache: None,
                        }),
                    )),
                    _ => None,
                }
            }
            _ => None,
        };

        let uniform_buffers: Vec<(UniformSlot, wgpu::Buffer)> = interface
            .uniforms
            .iter()
            .map(|&slot| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Program Uniform"),
                    size: slot.buffer_size(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (slot, buffer)
            })
            .collect();
        let entries: Vec<_> = uniform_buffers
            .iter()
            .map(|(slot, buffer)| wgpu::BindGroupEntry {
                binding: slot.binding(),
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms Bind Group"),
            layout: &layouts[0],
            entries: &entries,
        });

        pipeline.map(|pipeline| (pipeline, layouts, uniform_buffers, uniform_group))
    });

    // The stage modules are no longer needed once the pipeline holds them.
    drop(shaders);

    if let Some(error) = error {
        return Err(link_failed(error.to_string()));
    }
    let (pipeline, layouts, uniform_buffers, uniform_group) =
        built.ok_or_else(|| link_failed("missing shader stage".into()))?;

    log::debug!("Linked program '{}'", interface.label);
    Ok(Program {
        label: interface.label,
        interface,
        pipeline,
        layouts,
        uniform_buffers,
        uniform_group,
    })
}

impl Program {
    /// Update a uniform. Commands recorded before the call observe the previous value.
    pub fn set_uniform(&self, ctx: &mut GpuContext, slot: UniformSlot, data: &[u8]) {
        match self.uniform_buffers.iter().find(|(s, _)| *s == slot) {
            Some((_, buffer)) => ctx.write_buffer(buffer, data),
            None => log::error!("Program '{}' has no uniform {slot:?}", self.label),
        }
    }

    /// Build the bind groups for one draw or dispatch. Every declared unit must be bound.
    pub fn bind_resources(
        &self,
        ctx: &GpuContext,
        textures: &[TextureBinding<'_>],
        images: &[ImageBinding<'_>],
    ) -> Result<ResourceBindings> {
        let unbound = |kind: &str, unit: u32| RendererError::ResourceCreationFailed {
            resource: "bind group",
            reason: format!("{} {kind} unit {unit} has nothing bound", self.label),
        };

        let mut texture_parts = Vec::with_capacity(self.interface.textures.len());
        for declared in self.interface.textures {
            let (view, sampler) = textures
                .iter()
                .find(|b| b.unit == declared.unit)
                .and_then(|b| Some((b.texture.view.as_ref()?, b.texture.sampler.as_ref()?)))
                .ok_or_else(|| unbound("texture", declared.unit))?;
            texture_parts.push((declared.unit, view, sampler));
        }
        let mut image_views = Vec::with_capacity(self.interface.images.len());
        for declared in self.interface.images {
            let view = images
                .iter()
                .find(|b| b.unit == declared.unit)
                .and_then(|b| b.texture.storage_view(b.level))
                .ok_or_else(|| unbound("image", declared.unit))?;
            image_views.push((declared.unit, view));
        }

        let texture_entries: Vec<_> = texture_parts
            .iter()
            .flat_map(|(unit, view, sampler)| {
                [
                    wgpu::BindGroupEntry {
                        binding: texture_binding(*unit),
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: sampler_binding(*unit),
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ]
            })
            .collect();
        let image_entries: Vec<_> = image_views
            .iter()
            .map(|(unit, view)| wgpu::BindGroupEntry {
                binding: *unit,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();

        ctx.create_resource("bind group", |device| ResourceBindings {
            textures: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Textures Bind Group"),
                layout: &self.layouts[1],
                entries: &texture_entries,
            }),
            images: device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Images Bind Group"),
                layout: &self.layouts[2],
                entries: &image_entries,
            }),
        })
    }

    /// Record a draw of `mesh` into `pass`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, bindings: &ResourceBindings, mesh: &VertexBuffer) {
        let ProgramPipeline::Graphics(pipeline) = &self.pipeline else {
            log::error!("Program '{}' is not a graphics program", self.label);
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(UNIFORM_GROUP, &self.uniform_group, &[]);
        pass.set_bind_group(TEXTURE_GROUP, &bindings.textures, &[]);
        pass.set_bind_group(IMAGE_GROUP, &bindings.images, &[]);
        mesh.draw(pass);
    }

    /// Record a compute dispatch of `groups` workgroups.
    pub fn dispatch(
        &self,
        ctx: &mut GpuContext,
        textures: &[TextureBinding<'_>],
        images: &[ImageBinding<'_>],
        groups: [u32; 3],
    ) -> Result<()> {
        let ProgramPipeline::Compute(pipeline) = &self.pipeline else {
            return Err(RendererError::ProgramLinkFailed {
                log: format!("{} is not a compute program", self.label),
            });
        };
        let bindings = self.bind_resources(ctx, textures, images)?;

        let mut pass = ctx.encoder().begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(self.label),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(UNIFORM_GROUP, &self.uniform_group, &[]);
        pass.set_bind_group(TEXTURE_GROUP, &bindings.textures, &[]);
        pass.set_bind_group(IMAGE_GROUP, &bindings.images, &[]);
        pass.dispatch_workgroups(groups[0], groups[1], groups[2]);
        Ok(())
    }
}
