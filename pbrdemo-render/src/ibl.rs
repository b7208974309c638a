//! Image-based-lighting precomputation.
//!
//! Four compute stages run once during setup, in order:
//! 1. equirectangular HDR image -> environment cubemap (full mip chain),
//! 2. environment -> diffuse irradiance cubemap,
//! 3. environment -> pre-filtered specular cubemap, one roughness per mip level,
//! 4. split-sum BRDF lookup table.

use glam::{Vec2, Vec3};
use pbrdemo_gpu_shared::uniforms::FloatUniform;

use crate::assets::Assets;
use crate::config::{EnvironmentConfig, SceneAssets, BRDF_LUT_FORMAT, HDR_FORMAT};
use crate::context::GpuContext;
use crate::error::Result;
use crate::mipmap::MipmapGenerator;
use crate::resources::{create_texture, create_texture_from_image, Texture, TextureTarget};
use crate::shader::{
    compile_shader, link_program, ImageBinding, ImageUnit, PipelineKind, ProgramInterface,
    ShaderStage, TextureBinding, TextureUnit, UniformSlot,
};

/// Edge length of the square compute workgroups every kernel uses.
pub const WORKGROUP_SIZE: u32 = 32;

/// Hammersley sample count of the BRDF kernel.
pub const BRDF_SAMPLES: u32 = 1024;

const SOURCE_UNIT: u32 = 0;
const OUTPUT_UNIT: u32 = 0;

pub static EQUIRECT_TO_CUBE_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Equirect To Cube",
    uniforms: &[],
    textures: &[TextureUnit { unit: SOURCE_UNIT, target: TextureTarget::D2 }],
    images: &[ImageUnit { unit: OUTPUT_UNIT, target: TextureTarget::Cube, format: HDR_FORMAT }],
};

pub static IRRADIANCE_MAP_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Irradiance Map",
    uniforms: &[],
    textures: &[TextureUnit { unit: SOURCE_UNIT, target: TextureTarget::Cube }],
    images: &[ImageUnit { unit: OUTPUT_UNIT, target: TextureTarget::Cube, format: HDR_FORMAT }],
};

pub static SPECULAR_MAP_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Specular Map",
    uniforms: &[UniformSlot::SpecularMapRoughness],
    textures: &[TextureUnit { unit: SOURCE_UNIT, target: TextureTarget::Cube }],
    images: &[ImageUnit { unit: OUTPUT_UNIT, target: TextureTarget::Cube, format: HDR_FORMAT }],
};

pub static BRDF_LUT_INTERFACE: ProgramInterface = ProgramInterface {
    label: "Specular BRDF LUT",
    uniforms: &[],
    textures: &[],
    images: &[ImageUnit { unit: OUTPUT_UNIT, target: TextureTarget::D2, format: BRDF_LUT_FORMAT }],
};

/// The lighting inputs the PBR pass samples.
#[derive(Debug, Default)]
pub struct EnvironmentMaps {
    pub environment: Texture,
    pub irradiance: Texture,
    pub specular: Texture,
    pub brdf_lut: Texture,
}

impl EnvironmentMaps {
    pub fn delete(&mut self) {
        self.environment.delete();
        self.irradiance.delete();
        self.specular.delete();
        self.brdf_lut.delete();
    }
}

/// Workgroups per axis for a `size`-texel edge, never fewer than one.
pub fn dispatch_groups(size: u32) -> u32 {
    (size / WORKGROUP_SIZE).max(1)
}

/// One dispatch of the specular pre-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefilterStep {
    pub level: u32,
    pub size: u32,
    pub roughness: f32,
    pub groups: u32,
}

/// Pre-filter dispatches for a chain of `levels` mips starting at `base_size`.
///
/// Roughness rises linearly from 0 at level 0 to 1 at level `levels - 1`. The
/// schedule runs one step past the last level (`levels + 1` steps in total);
/// that step has no storage to write and the caller skips it.
pub fn prefilter_schedule(levels: u32, base_size: u32) -> Vec<PrefilterStep> {
    let delta_roughness = 1.0 / levels.saturating_sub(1).max(1) as f32;
    (0..=levels)
        .map(|level| {
            let size = base_size.checked_shr(level).unwrap_or(0);
            PrefilterStep {
                level,
                size,
                roughness: level as f32 * delta_roughness,
                groups: dispatch_groups(size),
            }
        })
        .collect()
}

/// The schedule steps that have a mip level to write.
pub fn prefilter_dispatches(levels: u32, base_size: u32) -> Vec<PrefilterStep> {
    prefilter_schedule(levels, base_size)
        .into_iter()
        .filter(|step| {
            let in_chain = step.level < levels;
            if !in_chain {
                log::debug!("Specular pre-filter step {} is past the mip chain, skipped", step.level);
            }
            in_chain
        })
        .collect()
}

/// Run the four precomputation stages. Ends with a memory barrier; blocking
/// until the device is done is left to the caller.
pub fn precompute_environment<A: Assets + ?Sized>(
    ctx: &mut GpuContext,
    mipmaps: &mut MipmapGenerator,
    assets: &A,
    config: &EnvironmentConfig,
    scene: &SceneAssets,
) -> Result<EnvironmentMaps> {
    config.validate()?;
    let shaders = &scene.shaders;
    let cubemap_size = config.cubemap_size;

    // Equirectangular projection to cubemap.
    let environment = {
        let program = link_program(
            ctx,
            vec![compile_shader(ctx, assets, &shaders.equirect_to_cube_cs, ShaderStage::Compute)?],
            &EQUIRECT_TO_CUBE_INTERFACE,
            PipelineKind::Compute,
        )?;

        let image = assets.load_image(&scene.environment, 3)?;
        let mut equirect = create_texture_from_image(ctx, mipmaps, &image, HDR_FORMAT, 1)?;
        let environment = create_texture(ctx, TextureTarget::Cube, cubemap_size, cubemap_size, HDR_FORMAT, 0)?;

        let groups = cubemap_size / WORKGROUP_SIZE;
        program.dispatch(
            ctx,
            &[TextureBinding::new(SOURCE_UNIT, &equirect)],
            &[ImageBinding::new(OUTPUT_UNIT, &environment, 0)],
            [groups, groups, 6],
        )?;
        // The source must stay alive until the dispatch reading it is submitted.
        ctx.submit();
        equirect.delete();

        mipmaps.generate(ctx, &environment)?;
        environment
    };
    log::info!("Environment cubemap ready ({cubemap_size}x{cubemap_size}, {} levels)", environment.levels);

    // Diffuse irradiance.
    let irradiance = {
        let program = link_program(
            ctx,
            vec![compile_shader(ctx, assets, &shaders.irradiance_map_cs, ShaderStage::Compute)?],
            &IRRADIANCE_MAP_INTERFACE,
            PipelineKind::Compute,
        )?;
        let size = config.irradiance_size;
        let irradiance = create_texture(ctx, TextureTarget::Cube, size, size, HDR_FORMAT, 1)?;

        let groups = size / WORKGROUP_SIZE;
        program.dispatch(
            ctx,
            &[TextureBinding::new(SOURCE_UNIT, &environment)],
            &[ImageBinding::new(OUTPUT_UNIT, &irradiance, 0)],
            [groups, groups, 6],
        )?;
        irradiance
    };

    // Pre-filtered specular.
    let specular = {
        let program = link_program(
            ctx,
            vec![compile_shader(ctx, assets, &shaders.specular_map_cs, ShaderStage::Compute)?],
            &SPECULAR_MAP_INTERFACE,
            PipelineKind::Compute,
        )?;
        let specular = create_texture(ctx, TextureTarget::Cube, cubemap_size, cubemap_size, HDR_FORMAT, 0)?;

        for step in prefilter_dispatches(specular.levels, cubemap_size) {
            program.set_uniform(
                ctx,
                UniformSlot::SpecularMapRoughness,
                bytemuck::bytes_of(&FloatUniform::new(step.roughness)),
            );
            program.dispatch(
                ctx,
                &[TextureBinding::new(SOURCE_UNIT, &environment)],
                &[ImageBinding::new(OUTPUT_UNIT, &specular, step.level)],
                [step.groups, step.groups, 6],
            )?;
        }
        specular
    };

    // Split-sum BRDF lookup table.
    let brdf_lut = {
        let program = link_program(
            ctx,
            vec![compile_shader(ctx, assets, &shaders.specular_brdf_cs, ShaderStage::Compute)?],
            &BRDF_LUT_INTERFACE,
            PipelineKind::Compute,
        )?;
        let size = config.brdf_lut_size;
        let lut = create_texture(ctx, TextureTarget::D2, size, size, BRDF_LUT_FORMAT, 1)?;

        let groups = size / WORKGROUP_SIZE;
        program.dispatch(ctx, &[], &[ImageBinding::new(OUTPUT_UNIT, &lut, 0)], [groups, groups, 1])?;
        lut
    };

    ctx.memory_barrier();
    log::info!("Image-based lighting precomputed");

    Ok(EnvironmentMaps { environment, irradiance, specular, brdf_lut })
}

// ---- CPU reference of the BRDF integration ----

/// Van der Corput radical inverse in base 2.
pub fn radical_inverse_vdc(bits: u32) -> f32 {
    bits.reverse_bits() as f32 * 2.328_306_4e-10
}

pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n as f32, radical_inverse_vdc(i))
}

/// GGX half-vector sample in tangent space (+Z is the normal).
pub fn importance_sample_ggx(xi: Vec2, roughness: f32) -> Vec3 {
    let alpha = roughness * roughness;
    let phi = std::f32::consts::TAU * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (alpha * alpha - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Schlick-GGX geometry term with the image-based-lighting remapping k = roughness^2 / 2.
pub fn geometry_smith_ibl(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let k = roughness * roughness / 2.0;
    let g1 = |cos_theta: f32| cos_theta / (cos_theta * (1.0 - k) + k);
    g1(n_dot_v) * g1(n_dot_l)
}

/// Split-sum (scale, bias) for one lookup-table texel, as the BRDF kernel computes it.
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, sample_count: u32) -> Vec2 {
    let n_dot_v = n_dot_v.max(0.001);
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);

    let mut sum = Vec2::ZERO;
    for i in 0..sample_count {
        let h = importance_sample_ggx(hammersley(i, sample_count), roughness);
        let l = 2.0 * v.dot(h) * h - v;

        let n_dot_l = l.z;
        let n_dot_h = h.z;
        let v_dot_h = v.dot(h).max(0.0);

        if n_dot_l > 0.0 {
            let g = geometry_smith_ibl(n_dot_v, n_dot_l, roughness);
            let g_vis = g * v_dot_h / (n_dot_h * n_dot_v);
            let fc = (1.0 - v_dot_h).powi(5);
            sum += Vec2::new((1.0 - fc) * g_vis, fc * g_vis);
        }
    }
    sum / sample_count as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::resolve_levels;
    use rstest::rstest;

    #[test]
    fn test_prefilter_schedule_for_full_chain() {
        let schedule = prefilter_schedule(11, 1024);
        assert_eq!(schedule.len(), 12);

        assert_eq!(schedule[0].roughness, 0.0);
        assert_eq!(schedule[0].groups, 32);
        assert!((schedule[10].roughness - 1.0).abs() < 1e-6);
        assert_eq!(schedule[10].size, 1);
        assert_eq!(schedule[10].groups, 1);

        // One step past the chain.
        assert_eq!(schedule[11].level, 11);
        assert_eq!(schedule[11].size, 0);
        assert_eq!(schedule[11].groups, 1);
    }

    #[test]
    fn test_default_environment_dispatches() {
        let config = EnvironmentConfig::default();
        let levels = resolve_levels(0, config.cubemap_size, config.cubemap_size);
        assert_eq!(levels, 11);

        let steps = prefilter_dispatches(levels, config.cubemap_size);
        let groups: Vec<u32> = steps.iter().map(|step| step.groups).collect();
        assert_eq!(groups, [32, 16, 8, 4, 2, 1, 1, 1, 1, 1, 1]);
        for (level, step) in steps.iter().enumerate() {
            assert_eq!(step.level, level as u32);
            assert!((step.roughness - level as f32 / 10.0).abs() < 1e-6);
        }

        assert_eq!(dispatch_groups(config.irradiance_size), 1);
        assert_eq!(dispatch_groups(config.brdf_lut_size), 8);
    }

    #[test]
    fn test_prefilter_schedule_roughness_increases() {
        let schedule = prefilter_schedule(7, 64);
        for pair in schedule.windows(2) {
            assert!(pair[1].roughness > pair[0].roughness);
            assert_eq!(pair[1].size, pair[0].size / 2);
        }
    }

    #[test]
    fn test_single_level_schedule() {
        let schedule = prefilter_schedule(1, 32);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].roughness, 0.0);
        assert_eq!(schedule[1].roughness, 1.0);
    }

    #[rstest]
    #[case(1024, 32)]
    #[case(256, 8)]
    #[case(32, 1)]
    #[case(16, 1)]
    #[case(0, 1)]
    fn test_dispatch_groups(#[case] size: u32, #[case] expected: u32) {
        assert_eq!(dispatch_groups(size), expected);
    }

    #[test]
    fn test_radical_inverse() {
        assert_eq!(radical_inverse_vdc(0), 0.0);
        assert_eq!(radical_inverse_vdc(1), 0.5);
        assert_eq!(radical_inverse_vdc(2), 0.25);
        assert_eq!(radical_inverse_vdc(3), 0.75);
    }

    #[test]
    fn test_ggx_samples_are_unit_and_upper_hemisphere() {
        for i in 0..64 {
            let h = importance_sample_ggx(hammersley(i, 64), 0.5);
            assert!((h.length() - 1.0).abs() < 1e-5);
            assert!(h.z >= 0.0);
        }
    }

    #[test]
    fn test_brdf_lut_bounds() {
        for &(n_dot_v, roughness) in &[(0.1, 0.1), (0.5, 0.5), (0.9, 0.9), (1.0, 0.3)] {
            let lut = integrate_brdf(n_dot_v, roughness, BRDF_SAMPLES);
            assert!(lut.x >= 0.0 && lut.y >= 0.0);
            assert!(lut.x + lut.y <= 1.0 + 1e-2, "{lut:?} at ({n_dot_v}, {roughness})");
        }
    }

    #[test]
    fn test_smooth_head_on_brdf_reflects_everything() {
        let lut = integrate_brdf(1.0, 0.0, BRDF_SAMPLES);
        assert!((lut.x - 1.0).abs() < 1e-3);
        assert!(lut.y.abs() < 1e-3);
    }
}
