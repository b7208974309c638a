//! End-to-end tests against a real adapter. Each test returns early when none is available.

mod common;

use common::*;
use pbrdemo_render::config::{BRDF_LUT_FORMAT, DEPTH_STENCIL_FORMAT, HDR_FORMAT};
use pbrdemo_render::ibl::{integrate_brdf, precompute_environment, prefilter_dispatches, BRDF_SAMPLES};
use pbrdemo_render::renderer::HEADLESS_FORMAT;
use pbrdemo_render::mipmap::MipmapGenerator;
use pbrdemo_render::resources::{
    create_framebuffer, create_texture, create_vertex_buffer, read_texture, resolve_framebuffer,
    ColorTarget, TextureTarget,
};
use pbrdemo_render::shader::{compile_shader, ShaderStage};
use pbrdemo_render::{Mesh, RendererError, ViewSettings};

#[test]
fn test_uniform_environment_stays_uniform() {
    let config = small_config(0);
    let Some(mut ctx) = headless_context() else { return };
    let assets = TestAssets::gray(&config);
    let mut mipmaps = MipmapGenerator::new(&ctx.device);

    let maps = precompute_environment(&mut ctx, &mut mipmaps, &assets, &config.environment, &config.assets)
        .expect("precompute");
    ctx.finish();

    assert_eq!(maps.environment.levels, 7);
    assert_eq!(maps.specular.levels, 7);
    assert_eq!(maps.irradiance.levels, 1);
    assert_eq!(prefilter_dispatches(maps.specular.levels, config.environment.cubemap_size).len(), 7);
    assert_eq!(maps.environment.format(), Some(HDR_FORMAT));
    assert_eq!(maps.brdf_lut.format(), Some(BRDF_LUT_FORMAT));

    for face in 0..6 {
        for level in 0..maps.environment.levels {
            let texels = f16_texels(&read_texture(&mut ctx, &maps.environment, level, face).unwrap());
            assert_uniform_rgba(&texels, GRAY, 2e-3, &format!("environment face {face} level {level}"));

            let texels = f16_texels(&read_texture(&mut ctx, &maps.specular, level, face).unwrap());
            assert_uniform_rgba(&texels, GRAY, 1e-2, &format!("specular face {face} level {level}"));
        }
        let texels = f16_texels(&read_texture(&mut ctx, &maps.irradiance, 0, face).unwrap());
        assert_uniform_rgba(&texels, GRAY, 1e-2, &format!("irradiance face {face}"));
    }
}

#[test]
fn test_brdf_lut_matches_cpu_integration() {
    let config = small_config(0);
    let Some(mut ctx) = headless_context() else { return };
    let assets = TestAssets::gray(&config);
    let mut mipmaps = MipmapGenerator::new(&ctx.device);

    let maps = precompute_environment(&mut ctx, &mut mipmaps, &assets, &config.environment, &config.assets)
        .expect("precompute");
    ctx.finish();

    let size = config.environment.brdf_lut_size;
    let texels = f16_texels(&read_texture(&mut ctx, &maps.brdf_lut, 0, 0).unwrap());
    assert_eq!(texels.len(), (size * size * 2) as usize);

    for (x, y) in [(4, 8), (16, 16), (31, 8), (8, 31), (24, 24)] {
        let expected = integrate_brdf(x as f32 / size as f32, y as f32 / size as f32, BRDF_SAMPLES);
        let index = ((y * size + x) * 2) as usize;
        let (scale, bias) = (texels[index], texels[index + 1]);
        assert!((scale - expected.x).abs() < 2e-2, "scale at ({x}, {y}): {scale} vs {}", expected.x);
        assert!((bias - expected.y).abs() < 2e-2, "bias at ({x}, {y}): {bias} vs {}", expected.y);
    }
}

#[test]
fn test_render_is_deterministic() {
    let config = small_config(0);
    let Some(renderer) = headless_renderer(&config) else { return };
    let mut renderer = renderer.setup(&TestAssets::gray(&config)).expect("setup");
    let output = renderer.output_texture().expect("headless output");
    assert_eq!(output.format(), Some(HEADLESS_FORMAT));
    assert_eq!((output.width, output.height), (config.width, config.height));
    let view = ViewSettings { pitch: 20.0, yaw: -35.0, ..Default::default() };

    renderer.render(&view);
    let first = renderer.read_output().unwrap();
    renderer.render(&view);
    let second = renderer.read_output().unwrap();

    assert_eq!(first.len(), (config.width * config.height * 4) as usize);
    assert!(first == second, "identical view settings produced different frames");
    renderer.shutdown();
}

#[test]
fn test_multisampled_render_is_deterministic() {
    let config = small_config(4);
    let Some(renderer) = headless_renderer(&config) else { return };
    assert!(!renderer.framebuffers().resolve.is_aliased());
    let mut renderer = renderer.setup(&TestAssets::gray(&config)).expect("setup");
    let view = ViewSettings::default();

    renderer.render(&view);
    let first = renderer.read_output().unwrap();
    renderer.render(&view);
    assert!(first == renderer.read_output().unwrap());
    renderer.shutdown();
}

#[test]
fn test_zero_distance_renders() {
    let config = small_config(0);
    let Some(renderer) = headless_renderer(&config) else { return };
    let mut renderer = renderer.setup(&TestAssets::gray(&config)).expect("setup");

    renderer.render(&ViewSettings { distance: 0.0, ..Default::default() });
    let frame = renderer.read_output().unwrap();
    // The model's faces are culled from inside; the skybox still covers the frame.
    assert!(frame.chunks_exact(4).any(|texel| texel[..3] != [0, 0, 0]));
    renderer.shutdown();
}

#[test]
fn test_skybox_shows_tonemapped_environment() {
    let config = small_config(0);
    let Some(renderer) = headless_renderer(&config) else { return };
    let mut renderer = renderer.setup(&TestAssets::gray(&config)).expect("setup");

    // Far enough that the model covers only the center of the frame.
    renderer.render(&ViewSettings { distance: 900.0, ..Default::default() });
    let frame = renderer.read_output().unwrap();

    // Reinhard with a white point of 1 leaves 0.5 unchanged; only gamma applies.
    let expected = (GRAY.powf(1.0 / 2.2) * 255.0).round();
    let corner = &frame[..4];
    for &channel in &corner[..3] {
        assert!((f32::from(channel) - expected).abs() <= 2.0, "corner texel {corner:?}, expected {expected}");
    }
    renderer.shutdown();
}

#[test]
fn test_empty_shader_source_is_missing() {
    let config = small_config(0);
    let Some(renderer) = headless_renderer(&config) else { return };
    let assets = TestAssets::gray(&config).with_shader("tonemap_fs", "");

    match renderer.setup(&assets) {
        Err(RendererError::ShaderSourceMissing { source_id }) => assert_eq!(source_id, "tonemap_fs"),
        Err(e) => panic!("expected a missing shader source, got {e}"),
        Ok(_) => panic!("setup succeeded without a tonemap shader"),
    }
}

#[test]
fn test_compile_reports_missing_and_broken_sources() {
    let config = small_config(0);
    let Some(ctx) = headless_context() else { return };
    let assets = TestAssets::gray(&config).with_shader("broken_fs", "@fragment fn fs_main( -> {");

    let err = compile_shader(&ctx, &assets, "unknown_vs", ShaderStage::Vertex).unwrap_err();
    assert!(matches!(err, RendererError::ShaderSourceMissing { ref source_id } if source_id == "unknown_vs"));

    let err = compile_shader(&ctx, &assets, "broken_fs", ShaderStage::Fragment).unwrap_err();
    assert!(matches!(err, RendererError::ShaderCompileFailed { ref source_id, .. } if source_id == "broken_fs"));

    assert!(compile_shader(&ctx, &assets, "pbr_fs", ShaderStage::Fragment).is_ok());
}

#[test]
fn test_framebuffer_color_target_kinds() {
    let Some(ctx) = headless_context() else { return };

    let single = create_framebuffer(&ctx, 32, 32, 0, Some(HDR_FORMAT), Some(DEPTH_STENCIL_FORMAT)).unwrap();
    assert!(matches!(single.color_target, Some(ColorTarget::Texture(_))));
    assert!(single.color_texture().is_some());
    assert!(single.depth_stencil_view().is_some());

    let supports_msaa = ctx
        .adapter
        .get_texture_format_features(HDR_FORMAT)
        .flags
        .sample_count_supported(4);
    if supports_msaa {
        let multi = create_framebuffer(&ctx, 32, 32, 4, Some(HDR_FORMAT), Some(DEPTH_STENCIL_FORMAT)).unwrap();
        assert!(matches!(multi.color_target, Some(ColorTarget::Renderbuffer(_))));
        assert!(multi.color_texture().is_none());
        assert_eq!(multi.sample_count(), 4);
    }

    let err = create_framebuffer(&ctx, 0, 32, 0, Some(HDR_FORMAT), None).unwrap_err();
    assert!(matches!(err, RendererError::FramebufferIncomplete { .. }));
}

#[test]
fn test_resolve_skipped_when_aliased() {
    let Some(mut ctx) = headless_context() else { return };
    let offscreen = create_framebuffer(&ctx, 16, 16, 0, Some(HDR_FORMAT), Some(DEPTH_STENCIL_FORMAT)).unwrap();
    let other = create_framebuffer(&ctx, 16, 16, 0, Some(HDR_FORMAT), None).unwrap();

    assert!(!resolve_framebuffer(&mut ctx, &offscreen, &offscreen));
    assert!(resolve_framebuffer(&mut ctx, &offscreen, &other));
    ctx.finish();
}

#[test]
fn test_multisampled_resolve_discards_depth_stencil() {
    let Some(mut ctx) = headless_context() else { return };
    let Some(multi) = skip_unavailable(
        create_framebuffer(&ctx, 16, 16, 4, Some(HDR_FORMAT), Some(DEPTH_STENCIL_FORMAT)),
        false,
    ) else {
        return;
    };
    let single = create_framebuffer(&ctx, 16, 16, 0, Some(HDR_FORMAT), None).unwrap();

    assert!(resolve_framebuffer(&mut ctx, &multi, &single));
    ctx.finish();
}

#[test]
fn test_resources_delete_twice() {
    let Some(mut ctx) = headless_context() else { return };

    let mut texture = create_texture(&ctx, TextureTarget::Cube, 32, 32, HDR_FORMAT, 0).unwrap();
    assert_eq!(texture.levels, 6);
    texture.delete();
    assert!(texture.is_empty());
    texture.delete();
    assert!(texture.is_empty());

    let mut framebuffer =
        create_framebuffer(&ctx, 16, 16, 0, Some(HDR_FORMAT), Some(DEPTH_STENCIL_FORMAT)).unwrap();
    framebuffer.delete();
    framebuffer.delete();
    assert!(framebuffer.is_empty());

    let mut mesh = create_vertex_buffer(&ctx, &Mesh::cube(1.0)).unwrap();
    assert_eq!(mesh.index_count, 36);
    mesh.delete();
    mesh.delete();
    assert!(mesh.vertex_buffer.is_none() && mesh.index_buffer.is_none());
    ctx.finish();
}

#[test]
fn test_shutdown_without_setup() {
    let config = small_config(0);
    let Some(renderer) = headless_renderer(&config) else { return };
    assert!(renderer.framebuffers().resolve.is_aliased());
    renderer.shutdown();
}

#[test]
fn test_unavailable_gpu_is_skipped_unless_required() {
    let unavailable = || Err::<(), _>(RendererError::ExtensionLoadFailed("Rg16Float storage".into()));
    assert!(skip_unavailable(unavailable(), false).is_none());
    assert_eq!(skip_unavailable(Ok(7), true), Some(7));
}

#[test]
#[should_panic(expected = "PBRDEMO_REQUIRE_GPU")]
fn test_required_gpu_fails_instead_of_skipping() {
    skip_unavailable(Err::<(), _>(RendererError::ContextCreationFailed("no adapter".into())), true);
}
