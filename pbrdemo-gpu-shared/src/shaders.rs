/// Embedded WGSL shader sources for the image-based-lighting pipeline.
/// The renderer addresses them by logical source id (see [`lookup`]), so a
/// host may substitute its own text for any id without touching the core.

pub const PASSTHROUGH_VS: &str = include_str!("../shaders/passthrough_vs.wgsl");
pub const TONEMAP_FS: &str = include_str!("../shaders/tonemap_fs.wgsl");
pub const SKYBOX_VS: &str = include_str!("../shaders/skybox_vs.wgsl");
pub const SKYBOX_FS: &str = include_str!("../shaders/skybox_fs.wgsl");
pub const PBR_VS: &str = include_str!("../shaders/pbr_vs.wgsl");
pub const PBR_FS: &str = include_str!("../shaders/pbr_fs.wgsl");
pub const EQUIRECT_TO_CUBE_CS: &str = include_str!("../shaders/equirect2cube_cs.wgsl");
pub const IRRADIANCE_MAP_CS: &str = include_str!("../shaders/irmap_cs.wgsl");
pub const SPECULAR_MAP_CS: &str = include_str!("../shaders/spmap_cs.wgsl");
pub const SPECULAR_BRDF_CS: &str = include_str!("../shaders/spbrdf_cs.wgsl");

/// Internal mip-chain downsampler. Not addressable by source id.
pub const MIPMAP: &str = include_str!("../shaders/mipmap.wgsl");

/// Logical source ids of every replaceable shader, paired with its embedded text.
pub const SOURCES: &[(&str, &str)] = &[
    ("passthrough_vs", PASSTHROUGH_VS),
    ("tonemap_fs", TONEMAP_FS),
    ("skybox_vs", SKYBOX_VS),
    ("skybox_fs", SKYBOX_FS),
    ("pbr_vs", PBR_VS),
    ("pbr_fs", PBR_FS),
    ("equirect2cube_cs", EQUIRECT_TO_CUBE_CS),
    ("irmap_cs", IRRADIANCE_MAP_CS),
    ("spmap_cs", SPECULAR_MAP_CS),
    ("spbrdf_cs", SPECULAR_BRDF_CS),
];

/// Resolve a logical source id to its embedded WGSL text.
pub fn lookup(source_id: &str) -> Option<&'static str> {
    SOURCES
        .iter()
        .find(|(id, _)| *id == source_id)
        .map(|(_, text)| *text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_source_id_resolves_to_non_empty_text() {
        for (id, _) in SOURCES {
            let text = lookup(id).unwrap();
            assert!(!text.trim().is_empty(), "{id} is empty");
        }
    }

    #[test]
    fn test_unknown_source_id() {
        assert!(lookup("bloom_fs").is_none());
    }

    #[test]
    fn test_stage_entry_points_match_suffix() {
        for (id, text) in SOURCES {
            let entry = match &id[id.len() - 2..] {
                "vs" => "fn vs_main",
                "fs" => "fn fs_main",
                "cs" => "fn cs_main",
                other => panic!("unexpected stage suffix {other}"),
            };
            assert!(text.contains(entry), "{id} lacks {entry}");
        }
    }
}
