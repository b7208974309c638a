//! GPU resource factory: textures, renderbuffers, framebuffers, and vertex buffers.
//!
//! Every resource type derives `Default` as its empty state. Deleting a resource
//! destroys the GPU object and resets the handle to empty, so deleting twice is a no-op.

use half::f16;
use pbrdemo_gpu_shared::uniforms::{MeshVertex, QuadVertex, CLIP_SPACE_QUAD};
use wgpu::util::DeviceExt;

use crate::assets::{Image, ImagePixels, Mesh};
use crate::context::GpuContext;
use crate::error::{RendererError, Result};
use crate::mipmap::MipmapGenerator;

// ============================================================
// Textures
// ============================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureTarget {
    #[default]
    D2,
    Cube,
}

impl TextureTarget {
    pub fn layer_count(self) -> u32 {
        match self {
            TextureTarget::D2 => 1,
            TextureTarget::Cube => 6,
        }
    }

    /// Dimension of the sampling view.
    pub fn view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            TextureTarget::D2 => wgpu::TextureViewDimension::D2,
            TextureTarget::Cube => wgpu::TextureViewDimension::Cube,
        }
    }

    /// Dimension of the per-level storage view. Cube faces are written as array layers.
    pub fn storage_view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            TextureTarget::D2 => wgpu::TextureViewDimension::D2,
            TextureTarget::Cube => wgpu::TextureViewDimension::D2Array,
        }
    }
}

/// Length of the full mip chain of a `width` x `height` image: floor(log2(max)) + 1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let size = width.max(height).max(1);
    u32::BITS - size.leading_zeros()
}

/// `levels > 0` is taken as-is; anything else requests the full chain.
pub fn resolve_levels(levels: i32, width: u32, height: u32) -> u32 {
    if levels > 0 {
        levels as u32
    } else {
        mip_level_count(width, height)
    }
}

/// Trilinear minification for mipmapped textures, bilinear otherwise.
pub fn mipmap_filter(levels: u32) -> wgpu::FilterMode {
    if levels > 1 {
        wgpu::FilterMode::Linear
    } else {
        wgpu::FilterMode::Nearest
    }
}

#[derive(Debug, Default)]
pub struct Texture {
    pub texture: Option<wgpu::Texture>,
    /// Sampling view over every level (and every face for cubemaps).
    pub view: Option<wgpu::TextureView>,
    pub sampler: Option<wgpu::Sampler>,
    pub target: TextureTarget,
    pub width: u32,
    pub height: u32,
    pub levels: u32,
}

impl Texture {
    pub fn is_empty(&self) -> bool {
        self.texture.is_none()
    }

    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.texture.as_ref().map(|t| t.format())
    }

    /// Writable view of one mip level, or `None` past the end of the chain.
    pub fn storage_view(&self, level: u32) -> Option<wgpu::TextureView> {
        if level >= self.levels {
            return None;
        }
        let texture = self.texture.as_ref()?;
        Some(texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Storage Level View"),
            dimension: Some(self.target.storage_view_dimension()),
            base_mip_level: level,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(self.target.layer_count()),
            ..Default::default()
        }))
    }

    /// View of a single level of a single layer, used as a render target or blit source.
    pub fn level_view(&self, level: u32, layer: u32) -> Option<wgpu::TextureView> {
        let texture = self.texture.as_ref()?;
        Some(texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Level View"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_mip_level: level,
            mip_level_count: Some(1),
            base_array_layer: layer,
            array_layer_count: Some(1),
            ..Default::default()
        }))
    }

    pub fn delete(&mut self) {
        if let Some(texture) = self.texture.take() {
            texture.destroy();
        }
        *self = Texture::default();
    }
}

/// Allocate immutable texture storage (all faces for cubemaps) plus its sampler.
pub fn create_texture(
    ctx: &GpuContext,
    target: TextureTarget,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    levels: i32,
) -> Result<Texture> {
    let levels = resolve_levels(levels, width, height);
    let wanted = wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_DST
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::STORAGE_BINDING
        | wgpu::TextureUsages::RENDER_ATTACHMENT;
    let usage = wanted & ctx.adapter.get_texture_format_features(format).allowed_usages;

    let texture = ctx.create_resource("texture", |device| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(match target {
                TextureTarget::D2 => "Texture 2D",
                TextureTarget::Cube => "Texture Cube",
            }),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: target.layer_count(),
            },
            mip_level_count: levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    })?;

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Texture View"),
        dimension: Some(target.view_dimension()),
        ..Default::default()
    });

    let address_mode = match target {
        TextureTarget::D2 => wgpu::AddressMode::Repeat,
        TextureTarget::Cube => wgpu::AddressMode::ClampToEdge,
    };
    let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Texture Sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: mipmap_filter(levels),
        ..Default::default()
    });

    log::debug!("Created {target:?} texture {width}x{height} {format:?} with {levels} levels");

    Ok(Texture {
        texture: Some(texture),
        view: Some(view),
        sampler: Some(sampler),
        target,
        width,
        height,
        levels,
    })
}

/// Upload `image` into a new 2-D texture and fill the mip chain when it has more than one level.
pub fn create_texture_from_image(
    ctx: &mut GpuContext,
    mipmaps: &mut MipmapGenerator,
    image: &Image,
    format: wgpu::TextureFormat,
    levels: i32,
) -> Result<Texture> {
    let texels = pack_texels(image, format)?;
    let texture = create_texture(ctx, TextureTarget::D2, image.width, image.height, format, levels)?;
    let bytes_per_texel = format.block_copy_size(None).unwrap_or(4);

    if let Some(gpu_texture) = &texture.texture {
        // Keep recorded-but-unsubmitted work ahead of the upload.
        ctx.submit();
        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.width * bytes_per_texel),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );
    }

    if texture.levels > 1 {
        mipmaps.generate(ctx, &texture)?;
    }
    Ok(texture)
}

/// Copy one mip level of one layer of `texture` back to host memory, rows tightly packed.
pub fn read_texture(ctx: &mut GpuContext, texture: &Texture, level: u32, layer: u32) -> Result<Vec<u8>> {
    let failed = |reason: String| RendererError::ResourceCreationFailed { resource: "readback", reason };
    let Some(gpu_texture) = &texture.texture else {
        return Err(failed("texture has been deleted".into()));
    };
    let format = gpu_texture.format();
    let bytes_per_texel = format
        .block_copy_size(None)
        .ok_or_else(|| failed(format!("{format:?} cannot be copied")))?;
    let width = (texture.width >> level).max(1);
    let height = (texture.height >> level).max(1);
    let unpadded_row = width * bytes_per_texel;
    let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let staging = ctx.create_resource("readback buffer", |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    })?;
    ctx.encoder().copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: gpu_texture,
            mip_level: level,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    ctx.submit();

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(failed(e.to_string())),
        Err(_) => return Err(failed("map callback dropped".into())),
    }

    let data = {
        let mapped = slice.get_mapped_range();
        mapped
            .chunks(padded_row as usize)
            .flat_map(|row| &row[..unpadded_row as usize])
            .copied()
            .collect()
    };
    staging.unmap();
    Ok(data)
}

/// Channel count of the texel layout `format` stores, for the formats images can be uploaded to.
pub fn texel_channels(format: wgpu::TextureFormat) -> Option<u32> {
    use wgpu::TextureFormat as F;
    match format {
        F::R8Unorm | F::R16Float | F::R32Float => Some(1),
        F::Rg8Unorm | F::Rg16Float | F::Rg32Float => Some(2),
        F::Rgba8Unorm | F::Rgba8UnormSrgb | F::Rgba16Float | F::Rgba32Float => Some(4),
        _ => None,
    }
}

/// Convert decoded pixels into the byte layout of `format`.
///
/// Extra source channels are dropped. Missing color channels read as zero and
/// a missing alpha channel as one.
pub fn pack_texels(image: &Image, format: wgpu::TextureFormat) -> Result<Vec<u8>> {
    use wgpu::TextureFormat as F;

    let unsupported = || RendererError::ResourceCreationFailed {
        resource: "texture",
        reason: format!(
            "cannot upload {} {}-channel image as {format:?}",
            if image.is_hdr() { "HDR" } else { "LDR" },
            image.channels
        ),
    };
    let dst_channels = texel_channels(format).ok_or_else(unsupported)?;
    let src_channels = image.channels;
    if !(1..=4).contains(&src_channels) {
        return Err(unsupported());
    }

    match (&image.pixels, format) {
        (ImagePixels::Ldr(pixels), F::R8Unorm | F::Rg8Unorm | F::Rgba8Unorm | F::Rgba8UnormSrgb) => {
            Ok(expand_channels(pixels, src_channels, dst_channels, u8::MAX))
        }
        (ImagePixels::Hdr(pixels), F::R16Float | F::Rg16Float | F::Rgba16Float) => {
            let halves: Vec<f16> = expand_channels(pixels, src_channels, dst_channels, 1.0)
                .into_iter()
                .map(f16::from_f32)
                .collect();
            Ok(bytemuck::cast_slice(&halves).to_vec())
        }
        (ImagePixels::Hdr(pixels), F::R32Float | F::Rg32Float | F::Rgba32Float) => {
            let floats = expand_channels(pixels, src_channels, dst_channels, 1.0);
            Ok(bytemuck::cast_slice(&floats).to_vec())
        }
        _ => Err(unsupported()),
    }
}

fn expand_channels<T: Copy + Default>(src: &[T], src_channels: u32, dst_channels: u32, one: T) -> Vec<T> {
    let (src_channels, dst_channels) = (src_channels as usize, dst_channels as usize);
    let mut out = Vec::with_capacity(src.len() / src_channels * dst_channels);
    for pixel in src.chunks_exact(src_channels) {
        for channel in 0..dst_channels {
            out.push(match pixel.get(channel) {
                Some(&value) => value,
                None if channel == 3 => one,
                None => T::default(),
            });
        }
    }
    out
}

// ============================================================
// Framebuffers
// ============================================================

/// Render-only multisample-capable storage. Never sampled.
#[derive(Debug, Default)]
pub struct Renderbuffer {
    pub texture: Option<wgpu::Texture>,
    pub view: Option<wgpu::TextureView>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl Renderbuffer {
    pub fn delete(&mut self) {
        if let Some(texture) = self.texture.take() {
            texture.destroy();
        }
        *self = Renderbuffer::default();
    }
}

fn create_renderbuffer(
    ctx: &GpuContext,
    width: u32,
    height: u32,
    samples: u32,
    format: wgpu::TextureFormat,
) -> Result<Renderbuffer> {
    let texture = ctx.create_resource("renderbuffer", |device| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Renderbuffer"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: samples.max(1),
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    })?;
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Ok(Renderbuffer {
        texture: Some(texture),
        view: Some(view),
        width,
        height,
        samples,
    })
}

/// Color attachment storage. Multisampled framebuffers render into a renderbuffer,
/// single-sampled ones into a texture later passes can sample.
#[derive(Debug)]
pub enum ColorTarget {
    Texture(Texture),
    Renderbuffer(Renderbuffer),
}

impl ColorTarget {
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        match self {
            ColorTarget::Texture(t) => t.view.as_ref(),
            ColorTarget::Renderbuffer(r) => r.view.as_ref(),
        }
    }

    fn gpu_texture(&self) -> Option<&wgpu::Texture> {
        match self {
            ColorTarget::Texture(t) => t.texture.as_ref(),
            ColorTarget::Renderbuffer(r) => r.texture.as_ref(),
        }
    }
}

/// Result of the completeness check run before a framebuffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    ZeroSize,
    ExceedsMaxDimension,
    MissingAttachment,
    UnsupportedColorFormat,
    UnsupportedDepthStencilFormat,
    UnsupportedSampleCount,
    UnsupportedResolve,
}

/// Completeness of a framebuffer with the given attachment capabilities.
pub fn framebuffer_status(
    width: u32,
    height: u32,
    samples: u32,
    max_dimension: u32,
    color: Option<wgpu::TextureFormatFeatures>,
    depth_stencil: Option<wgpu::TextureFormatFeatures>,
) -> FramebufferStatus {
    if width == 0 || height == 0 {
        return FramebufferStatus::ZeroSize;
    }
    if width > max_dimension || height > max_dimension {
        return FramebufferStatus::ExceedsMaxDimension;
    }
    if color.is_none() && depth_stencil.is_none() {
        return FramebufferStatus::MissingAttachment;
    }
    let renderable = |f: &wgpu::TextureFormatFeatures| {
        f.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    };
    let multisampled = samples > 1;
    if let Some(color) = &color {
        if !renderable(color) {
            return FramebufferStatus::UnsupportedColorFormat;
        }
        if multisampled && !color.flags.sample_count_supported(samples) {
            return FramebufferStatus::UnsupportedSampleCount;
        }
        if multisampled
            && !color.flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            return FramebufferStatus::UnsupportedResolve;
        }
    }
    if let Some(depth_stencil) = &depth_stencil {
        if !renderable(depth_stencil) {
            return FramebufferStatus::UnsupportedDepthStencilFormat;
        }
        if multisampled && !depth_stencil.flags.sample_count_supported(samples) {
            return FramebufferStatus::UnsupportedSampleCount;
        }
    }
    FramebufferStatus::Complete
}

#[derive(Debug, Default)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub color_target: Option<ColorTarget>,
    pub depth_stencil_target: Option<Renderbuffer>,
}

impl FrameBuffer {
    pub fn is_empty(&self) -> bool {
        self.color_target.is_none() && self.depth_stencil_target.is_none()
    }

    /// Sample count attachments and pipelines must agree on.
    pub fn sample_count(&self) -> u32 {
        self.samples.max(1)
    }

    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color_target.as_ref().and_then(ColorTarget::view)
    }

    pub fn depth_stencil_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_stencil_target.as_ref().and_then(|r| r.view.as_ref())
    }

    /// The sampleable color texture, if the color target is one.
    pub fn color_texture(&self) -> Option<&Texture> {
        match &self.color_target {
            Some(ColorTarget::Texture(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn delete(&mut self) {
        match &mut self.color_target {
            Some(ColorTarget::Texture(texture)) => texture.delete(),
            Some(ColorTarget::Renderbuffer(renderbuffer)) => renderbuffer.delete(),
            None => {}
        }
        if let Some(depth_stencil) = &mut self.depth_stencil_target {
            depth_stencil.delete();
        }
        *self = FrameBuffer::default();
    }
}

/// Create a framebuffer with an optional color and an optional depth-stencil attachment.
///
/// `samples == 0` gives a sampleable color texture; `samples > 0` gives multisampled
/// renderbuffers. The depth-stencil attachment is always a renderbuffer.
pub fn create_framebuffer(
    ctx: &GpuContext,
    width: u32,
    height: u32,
    samples: u32,
    color_format: Option<wgpu::TextureFormat>,
    depth_stencil_format: Option<wgpu::TextureFormat>,
) -> Result<FrameBuffer> {
    let status = framebuffer_status(
        width,
        height,
        samples,
        ctx.device.limits().max_texture_dimension_2d,
        color_format.map(|f| ctx.adapter.get_texture_format_features(f)),
        depth_stencil_format.map(|f| ctx.adapter.get_texture_format_features(f)),
    );
    if status != FramebufferStatus::Complete {
        return Err(RendererError::FramebufferIncomplete { status });
    }

    let color_target = match color_format {
        Some(format) if samples > 0 => Some(ColorTarget::Renderbuffer(create_renderbuffer(
            ctx, width, height, samples, format,
        )?)),
        Some(format) => Some(ColorTarget::Texture(create_texture(
            ctx,
            TextureTarget::D2,
            width,
            height,
            format,
            1,
        )?)),
        None => None,
    };
    let depth_stencil_target = depth_stencil_format
        .map(|format| create_renderbuffer(ctx, width, height, samples, format))
        .transpose()?;

    log::debug!(
        "Created framebuffer {width}x{height}, {samples} samples, color {color_format:?}, depth {depth_stencil_format:?}"
    );

    Ok(FrameBuffer {
        width,
        height,
        samples,
        color_target,
        depth_stencil_target,
    })
}

/// Keep the attachment contents for the pass, drop them afterwards.
fn discard_after_load<V>() -> wgpu::Operations<V> {
    wgpu::Operations {
        load: wgpu::LoadOp::Load,
        store: wgpu::StoreOp::Discard,
    }
}

/// Resolve the color contents of `src` into `dst` and invalidate `src`.
///
/// Returns `false` without recording anything when both name the same framebuffer.
pub fn resolve_framebuffer(ctx: &mut GpuContext, src: &FrameBuffer, dst: &FrameBuffer) -> bool {
    if std::ptr::eq(src, dst) {
        return false;
    }
    let (Some(src_color), Some(dst_color)) = (&src.color_target, &dst.color_target) else {
        log::warn!("Resolve skipped: framebuffer without color attachment");
        return false;
    };

    if src.sample_count() > 1 {
        let (Some(src_view), Some(dst_view)) = (src_color.view(), dst_color.view()) else {
            return false;
        };
        let encoder = ctx.encoder();
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Resolve Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: src_view,
                resolve_target: Some(dst_view),
                ops: discard_after_load(),
            })],
            depth_stencil_attachment: src.depth_stencil_target.as_ref().and_then(|depth| {
                let has_stencil = depth
                    .texture
                    .as_ref()
                    .is_some_and(|t| t.format().has_stencil_aspect());
                Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth.view.as_ref()?,
                    depth_ops: Some(discard_after_load()),
                    stencil_ops: has_stencil.then(discard_after_load),
                })
            }),
            ..Default::default()
        });
    } else {
        let (Some(from), Some(to)) = (src_color.gpu_texture(), dst_color.gpu_texture()) else {
            return false;
        };
        ctx.encoder().copy_texture_to_texture(
            from.as_image_copy(),
            to.as_image_copy(),
            wgpu::Extent3d {
                width: src.width.min(dst.width),
                height: src.height.min(dst.height),
                depth_or_array_layers: 1,
            },
        );
    }
    true
}

// ============================================================
// Vertex buffers
// ============================================================

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x3,
    3 => Float32x3,
    4 => Float32x2
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2
];

/// Vertex input layout of a buffer; applied to pipelines at link time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VertexLayout {
    #[default]
    Mesh,
    ClipSpaceQuad,
}

impl VertexLayout {
    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexLayout::Mesh => wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &MESH_ATTRIBUTES,
            },
            VertexLayout::ClipSpaceQuad => wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &QUAD_ATTRIBUTES,
            },
        }
    }

    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            VertexLayout::Mesh => wgpu::PrimitiveTopology::TriangleList,
            VertexLayout::ClipSpaceQuad => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

#[derive(Debug, Default)]
pub struct VertexBuffer {
    pub vertex_buffer: Option<wgpu::Buffer>,
    pub index_buffer: Option<wgpu::Buffer>,
    pub vertex_count: u32,
    pub index_count: u32,
    pub layout: VertexLayout,
}

impl VertexBuffer {
    /// Record the draw of the whole buffer into `pass`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(vertices) = &self.vertex_buffer else {
            return;
        };
        pass.set_vertex_buffer(0, vertices.slice(..));
        match &self.index_buffer {
            Some(indices) => {
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            None => pass.draw(0..self.vertex_count, 0..1),
        }
    }

    pub fn delete(&mut self) {
        if let Some(buffer) = self.vertex_buffer.take() {
            buffer.destroy();
        }
        if let Some(buffer) = self.index_buffer.take() {
            buffer.destroy();
        }
        *self = VertexBuffer::default();
    }
}

/// Upload a mesh's vertices and triangle indices as immutable buffers.
pub fn create_vertex_buffer(ctx: &GpuContext, mesh: &Mesh) -> Result<VertexBuffer> {
    let (vertex_buffer, index_buffer) = ctx.create_resource("vertex buffer", |device| {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        (vertices, indices)
    })?;
    Ok(VertexBuffer {
        vertex_buffer: Some(vertex_buffer),
        index_buffer: Some(index_buffer),
        vertex_count: mesh.vertices.len() as u32,
        index_count: mesh.indices().len() as u32,
        layout: VertexLayout::Mesh,
    })
}

/// Four-vertex triangle strip covering clip space.
pub fn create_clip_space_quad(ctx: &GpuContext) -> Result<VertexBuffer> {
    let vertex_buffer = ctx.create_resource("vertex buffer", |device| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Clip Space Quad"),
            contents: bytemuck::cast_slice(&CLIP_SPACE_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        })
    })?;
    Ok(VertexBuffer {
        vertex_buffer: Some(vertex_buffer),
        index_buffer: None,
        vertex_count: CLIP_SPACE_QUAD.len() as u32,
        index_count: 0,
        layout: VertexLayout::ClipSpaceQuad,
    })
}
