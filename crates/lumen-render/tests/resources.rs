//! Resource lifecycle against the recording backend.
//!
//! Covers texture, framebuffer, program and vertex-buffer creation and
//! deletion, stale-key handling after re-initialization, and the failure
//! paths (bad sizes, exhausted memory, missing capabilities).

use lumen_render::coords::{IRect, ISize};
use lumen_render::gpu::format;
use lumen_render::gpu::{
    DefaultShader, ExternalHandle, Features, GpuCommand, HeadlessBackend, HeadlessConfig,
    HeadlessProbe, PixelFormat, PixelType, TextureFilter, TextureOrigin, TextureSpec, TextureWrap,
};
use lumen_render::{EngineConfig, RenderEngine, RenderError};

const FRAGMENT: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
const VERTEX: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";

fn engine_with(config: HeadlessConfig) -> (RenderEngine<HeadlessBackend>, HeadlessProbe) {
    let backend = HeadlessBackend::new(config);
    let probe = backend.probe();
    let engine = RenderEngine::new(backend, EngineConfig::default());
    engine.init().expect("headless init");
    (engine, probe)
}

fn engine() -> (RenderEngine<HeadlessBackend>, HeadlessProbe) {
    engine_with(HeadlessConfig::default())
}

// ── textures ──────────────────────────────────────────────────────────────

#[test]
fn full_hd_texture_lifecycle() {
    let (engine, probe) = engine();
    let size = ISize::new(1920, 1080);

    let key = engine.create_texture(&TextureSpec::new(size)).unwrap();
    let info = engine.texture_info(key).unwrap();
    assert_eq!(info.size, size);
    assert_eq!(info.total_size, size);
    assert_eq!(info.origin, TextureOrigin::Owned);
    assert_eq!(engine.texture_data_size(key), Some(1920 * 4 * 1080));
    assert_eq!(probe.live().textures, 1);
    assert_eq!(probe.live().texture_bytes, 1920 * 1080 * 4);

    let frame = vec![0x80u8; 1920 * 4 * 1080];
    engine.update_texture(key, &frame).unwrap();
    assert_eq!(
        probe.count(|c| matches!(c, GpuCommand::UploadTexture { bytes, .. } if *bytes == frame.len())),
        1
    );

    assert!(engine.delete_texture(key));
    assert!(!engine.delete_texture(key), "second delete must be a no-op");
    assert!(engine.texture_info(key).is_none());
    assert_eq!(probe.live().textures, 0);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::DeleteTexture(_))), 1);
}

#[test]
fn short_upload_is_rejected() {
    let (engine, _probe) = engine();
    let key = engine.create_texture(&TextureSpec::new(ISize::new(16, 16))).unwrap();
    let err = engine.update_texture(key, &[0u8; 16]).unwrap_err();
    assert!(matches!(err, RenderError::Backend(_)));
    assert!(engine.texture_info(key).is_some());
}

#[test]
fn invalid_sizes_allocate_nothing() {
    let (engine, probe) = engine_with(HeadlessConfig::default().with_max_texture_size(4096));

    let empty = engine.create_texture(&TextureSpec::new(ISize::new(0, 64)));
    assert!(matches!(empty, Err(RenderError::InvalidSize { width: 0, height: 64, max: 4096 })));

    let huge = engine.create_texture(&TextureSpec::new(ISize::new(4097, 16)));
    assert!(matches!(huge, Err(RenderError::InvalidSize { .. })));
    assert!(huge.unwrap_err().is_recoverable());

    assert_eq!(probe.live().textures, 0);
}

#[test]
fn pot_only_backend_pads_allocations() {
    let features = Features::all() - Features::NPOT_TEXTURES;
    let (engine, _probe) = engine_with(HeadlessConfig::default().with_features(features));

    let key = engine.create_texture(&TextureSpec::new(ISize::new(720, 480))).unwrap();
    let info = engine.texture_info(key).unwrap();
    assert_eq!(info.size, ISize::new(720, 480));
    assert_eq!(info.total_size, ISize::new(1024, 512));
    let floor = format::MIN_POT_TEXTURE;
    assert_eq!(engine.texture_size(ISize::new(3, 3)), ISize::new(floor, floor));
}

#[test]
fn huge_sizes_are_rejected_without_padding() {
    let features = Features::all() - Features::NPOT_TEXTURES;
    let (engine, probe) = engine_with(HeadlessConfig::default().with_features(features));

    for size in [ISize::new(3_000_000_000, 16), ISize::new(16, u32::MAX)] {
        let err = engine.create_texture(&TextureSpec::new(size)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSize { .. }));
    }
    assert_eq!(probe.live().textures, 0);
    assert_eq!(engine.texture_size(ISize::new(3_000_000_000, 16)), ISize::new(u32::MAX, 64));
}

#[test]
fn exhausted_texture_memory_is_recoverable() {
    let (engine, probe) = engine_with(HeadlessConfig::default().with_texture_budget(1024 * 1024));

    let small = engine.create_texture(&TextureSpec::new(ISize::new(256, 256))).unwrap();
    let err = engine.create_texture(&TextureSpec::new(ISize::new(1920, 1080))).unwrap_err();
    assert!(matches!(err, RenderError::Allocation(_)));
    assert!(err.is_recoverable());

    assert!(engine.texture_info(small).is_some());
    assert_eq!(probe.live().textures, 1);
}

#[test]
fn missing_capabilities_reject_deep_formats() {
    let features = Features::all() - Features::RGBA16 - Features::FLOAT_TEXTURES;
    let (engine, _probe) = engine_with(HeadlessConfig::default().with_features(features));

    let deep = TextureSpec::new(ISize::new(8, 8)).format(PixelFormat::Rgba, PixelType::UInt16);
    assert!(matches!(engine.create_texture(&deep), Err(RenderError::CapabilityMissing(_))));
    assert!(matches!(engine.create_helper_texture(), Err(RenderError::CapabilityMissing(_))));
}

#[test]
fn helper_texture_holds_weights() {
    let (engine, probe) = engine();
    let key = engine.create_helper_texture().unwrap();
    let info = engine.texture_info(key).unwrap();
    assert_eq!(info.size, ISize::new(256, 1));
    assert_eq!(info.wrap, TextureWrap::Repeat);
    assert_eq!(
        probe.count(|c| matches!(c, GpuCommand::UploadTexture { bytes, .. } if *bytes == 256 * 16)),
        1
    );
}

#[test]
fn texture_from_image_converts_to_rgba() {
    let (engine, probe) = engine();
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 2, image::Rgb([255, 0, 0])));

    let key = engine.create_texture_from_image(&image).unwrap();
    let info = engine.texture_info(key).unwrap();
    assert_eq!(info.size, ISize::new(4, 2));
    assert_eq!(info.pixel_format, PixelFormat::Rgba);
    assert_eq!(
        probe.count(|c| matches!(c, GpuCommand::UploadTexture { bytes: 32, .. })),
        1
    );
}

#[test]
fn staging_buffer_is_uploaded_after_the_closure() {
    let (engine, probe) = engine();
    let spec = TextureSpec::new(ISize::new(8, 4)).with_staging();
    let key = engine.create_texture(&spec).unwrap();
    probe.clear_log();

    let len = engine
        .with_texture_buffer(key, |pixels| {
            pixels.fill(0xff);
            // The engine stays usable from inside the closure.
            assert!(engine.texture_info(key).is_some_and(|i| !i.has_staging));
            pixels.len()
        })
        .unwrap();

    assert_eq!(len, 8 * 4 * 4);
    assert!(engine.texture_info(key).unwrap().has_staging);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::UploadTexture { .. })), 1);
}

#[test]
fn staging_requires_a_staging_texture() {
    let (engine, _probe) = engine();
    let key = engine.create_texture(&TextureSpec::new(ISize::new(8, 8))).unwrap();
    let result = engine.with_texture_buffer(key, |_| ());
    assert!(matches!(result, Err(RenderError::NoStorage)));
}

#[test]
fn filter_changes_are_elided() {
    let (engine, probe) = engine();
    let key = engine.create_texture(&TextureSpec::new(ISize::new(8, 8))).unwrap();
    probe.clear_log();

    engine.set_texture_filters(key, TextureFilter::Linear, TextureWrap::ClampToEdge).unwrap();
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::SetSampling { .. })), 0);

    engine.set_texture_filters(key, TextureFilter::Nearest, TextureWrap::ClampToEdge).unwrap();
    engine.set_texture_filters(key, TextureFilter::Nearest, TextureWrap::ClampToEdge).unwrap();
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::SetSampling { .. })), 1);
}

#[test]
fn external_textures_bind_decoder_surfaces() {
    let (engine, probe) = engine();
    let key = engine.create_external_texture(ISize::new(64, 32)).unwrap();
    assert_eq!(engine.texture_info(key).unwrap().origin, TextureOrigin::External);
    assert_eq!(probe.live().textures, 0, "nothing is allocated before a surface is bound");

    engine.bind_external_texture(key, &ExternalHandle::Native { id: 7, plane: 0 }).unwrap();
    engine.bind_external_texture(key, &ExternalHandle::Native { id: 8, plane: 0 }).unwrap();
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::ImportExternal { .. })), 2);
    assert_eq!(probe.live().textures, 1, "rebinding releases the previous import");

    assert!(matches!(engine.update_texture(key, &[0u8; 64 * 32 * 4]), Err(RenderError::NoStorage)));

    let owned = engine.create_texture(&TextureSpec::new(ISize::new(4, 4))).unwrap();
    let wrong = engine.bind_external_texture(owned, &ExternalHandle::Native { id: 9, plane: 0 });
    assert!(wrong.is_err());
}

#[test]
fn external_textures_need_the_capability() {
    let features = Features::all() - Features::EXTERNAL_TEXTURE;
    let (engine, _probe) = engine_with(HeadlessConfig::default().with_features(features));
    let result = engine.create_external_texture(ISize::new(64, 32));
    assert!(matches!(result, Err(RenderError::CapabilityMissing(_))));
}

// ── lifecycle ─────────────────────────────────────────────────────────────

#[test]
fn calls_before_init_are_rejected() {
    let engine = RenderEngine::new(HeadlessBackend::default(), EngineConfig::default());
    assert!(!engine.is_initialized());
    assert!(engine.capabilities().is_none());

    let result = engine.create_texture(&TextureSpec::new(ISize::new(4, 4)));
    assert!(matches!(result, Err(RenderError::NotInitialized)));
    assert!(matches!(engine.create_framebuffer(ISize::new(4, 4)), Err(RenderError::NotInitialized)));
    assert!(matches!(engine.create_vbo(&[0.0; 16]), Err(RenderError::NotInitialized)));
}

#[test]
fn reinit_invalidates_outstanding_keys() {
    let (engine, probe) = engine();
    let texture = engine.create_texture(&TextureSpec::new(ISize::new(32, 32))).unwrap();
    let fb = engine.create_framebuffer(ISize::new(32, 32)).unwrap();
    let program = engine.create_shader_program(VERTEX, FRAGMENT).unwrap();

    engine.init().unwrap();

    assert!(engine.texture_info(texture).is_none());
    assert!(!engine.delete_texture(texture));
    assert!(!engine.delete_framebuffer(fb));
    assert!(matches!(engine.enable_shader_program(program), Err(RenderError::StaleHandle(_))));

    let draw = engine.draw_bitmap(
        texture,
        None,
        IRect::new(0, 0, 32, 32),
        IRect::new(0, 0, 32, 32),
        None,
        255,
        (255, 255, 255),
    );
    assert!(matches!(draw, Err(RenderError::StaleHandle(_))));

    let live = probe.live();
    assert_eq!(live.textures, 0);
    assert_eq!(live.framebuffers, 0);
    assert_eq!(live.programs, DefaultShader::ALL.len());
}

#[test]
fn release_deletes_everything() {
    let (engine, probe) = engine();
    engine.create_texture(&TextureSpec::new(ISize::new(32, 32))).unwrap();
    engine.create_framebuffer(ISize::new(16, 16)).unwrap();
    engine.create_vbo(&[0.0; 16]).unwrap();
    engine.set_fence();

    engine.release();
    assert!(!engine.is_initialized());
    assert_eq!(probe.live(), Default::default());
}

#[test]
fn dropping_the_engine_releases_resources() {
    let backend = HeadlessBackend::default();
    let probe = backend.probe();
    {
        let engine = RenderEngine::new(backend, EngineConfig::default());
        engine.init().unwrap();
        engine.create_texture(&TextureSpec::new(ISize::new(32, 32))).unwrap();
    }
    assert_eq!(probe.live(), Default::default());
}

#[test]
fn failed_builtin_compile_leaves_engine_uninitialized() {
    let backend = HeadlessBackend::new(HeadlessConfig { fail_program_compile: true, ..Default::default() });
    let probe = backend.probe();
    let engine = RenderEngine::new(backend, EngineConfig::default());

    assert!(engine.init().is_err());
    assert!(!engine.is_initialized());
    assert_eq!(probe.live().programs, 0);
}

// ── framebuffers ──────────────────────────────────────────────────────────

#[test]
fn framebuffer_owns_its_colour_texture() {
    let (engine, probe) = engine();
    let fb = engine.create_framebuffer(ISize::new(256, 256)).unwrap();
    let color = engine.framebuffer_texture(fb).unwrap();

    assert_eq!(engine.texture_info(color).unwrap().origin, TextureOrigin::Framebuffer(fb));
    assert!(!engine.delete_texture(color), "colour texture lives as long as its framebuffer");

    engine.bind_framebuffer(Some(fb)).unwrap();
    probe.clear_log();

    assert!(engine.delete_framebuffer(fb));
    assert_eq!(probe.commands().first(), Some(&GpuCommand::BindFramebuffer(None)));
    assert!(engine.texture_info(color).is_none());
    assert!(!engine.delete_framebuffer(fb));

    let live = probe.live();
    assert_eq!(live.framebuffers, 0);
    assert_eq!(live.textures, 0);
}

#[test]
fn binding_a_stale_framebuffer_fails() {
    let (engine, _probe) = engine();
    let fb = engine.create_framebuffer(ISize::new(16, 16)).unwrap();
    engine.delete_framebuffer(fb);
    assert!(matches!(engine.bind_framebuffer(Some(fb)), Err(RenderError::StaleHandle(_))));
}

#[test]
fn discard_is_skipped_without_support() {
    let features = Features::all() - Features::FB_DISCARD;
    let (engine, probe) = engine_with(HeadlessConfig::default().with_features(features));
    let fb = engine.create_framebuffer(ISize::new(16, 16)).unwrap();

    engine.discard_framebuffer(fb);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::DiscardFramebuffer(_))), 0);
    assert!(engine.framebuffer_texture(fb).is_some());
}

// ── programs ──────────────────────────────────────────────────────────────

#[test]
fn builtin_programs_exist_after_init() {
    let (engine, probe) = engine();
    for shader in DefaultShader::ALL {
        assert!(engine.default_shader(shader).is_some(), "{} missing", shader.name());
    }
    assert_eq!(probe.live().programs, DefaultShader::ALL.len());
}

#[test]
fn builtin_programs_cannot_be_deleted() {
    let (engine, probe) = engine();
    let simple = engine.default_shader(DefaultShader::Simple).unwrap();
    assert!(!engine.delete_shader_program(simple));
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::DeleteProgram(_))), 0);
}

#[test]
fn custom_program_lifecycle() {
    let (engine, probe) = engine();
    let program = engine.create_shader_program(VERTEX, FRAGMENT).unwrap();
    assert_eq!(probe.live().programs, DefaultShader::ALL.len() + 1);

    engine.enable_shader_program(program).unwrap();
    assert!(engine.delete_shader_program(program));
    assert!(!engine.delete_shader_program(program));
    assert_eq!(probe.live().programs, DefaultShader::ALL.len());

    let broken = engine.create_shader_program(VERTEX, "fn main() {}");
    assert!(matches!(broken, Err(RenderError::Backend(_))));
}

// ── vertex buffers ────────────────────────────────────────────────────────

#[test]
fn vbo_lifecycle() {
    let (engine, probe) = engine();
    let vbo = engine.create_vbo(&[0.0; 16]).unwrap();
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::CreateBuffer { floats: 16, .. })), 1);

    assert!(engine.delete_vbo(vbo));
    assert!(!engine.delete_vbo(vbo));
    assert_eq!(probe.live().buffers, 0);
}

#[test]
fn vbo_requires_buffer_objects() {
    let features = Features::all() - Features::BUFFER_OBJECTS;
    let (engine, _probe) = engine_with(HeadlessConfig::default().with_features(features));
    assert!(matches!(engine.create_vbo(&[0.0; 16]), Err(RenderError::CapabilityMissing(_))));
}
