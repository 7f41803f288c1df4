//! Video interop: strategy selection, the adapter registry, and the copy and
//! zero-copy acquire paths.

use std::sync::Arc;

use lumen_render::coords::ISize;
use lumen_render::gpu::{
    Capabilities, ExternalHandle, Features, GpuCommand, HeadlessBackend, HeadlessConfig, HeadlessProbe,
    TextureFilter, TextureKey,
};
use lumen_render::interop::{
    get_interop_type, CodecId, ColourMatrix, ColourMetadata, ColourRange, FrameData, FrameFormat, FramePlane,
    FrameScanType, Interop, InteropRegistry, InteropType, SharedSurface, VideoCodec, VideoColourSpace,
    VideoFrame,
};
use lumen_render::{EngineConfig, RenderEngine};

fn engine_with(backend: HeadlessConfig, config: EngineConfig) -> (RenderEngine<HeadlessBackend>, HeadlessProbe) {
    let backend = HeadlessBackend::new(backend);
    let probe = backend.probe();
    let engine = RenderEngine::new(backend, config);
    engine.init().expect("headless init");
    probe.clear_log();
    (engine, probe)
}

fn engine() -> (RenderEngine<HeadlessBackend>, HeadlessProbe) {
    engine_with(HeadlessConfig::default(), EngineConfig::default())
}

fn caps(features: Features) -> Capabilities {
    HeadlessConfig::default().with_features(features).capabilities
}

/// CPU frame with every plane row padded by `pad` bytes.
fn cpu_frame(codec: CodecId, format: FrameFormat, size: ISize, pad: u32) -> VideoFrame {
    let planes = format
        .planes(size)
        .iter()
        .map(|layout| {
            let pitch = layout.size.width * layout.format.channels() + pad;
            let data: Arc<[u8]> = vec![0x80u8; (pitch * layout.size.height) as usize].into();
            FramePlane { data, pitch }
        })
        .collect();
    VideoFrame {
        codec,
        format,
        size,
        colour: ColourMetadata::default(),
        data: FrameData::Cpu(planes),
    }
}

fn shared_frame(surface: u64, size: ISize) -> VideoFrame {
    let planes = (0..2).map(|plane| ExternalHandle::Native { id: surface, plane }).collect();
    VideoFrame {
        codec: CodecId::HardwareSurface(VideoCodec::Hevc),
        format: FrameFormat::Nv12,
        size,
        colour: ColourMetadata::default(),
        data: FrameData::Shared(SharedSurface { id: surface, planes }),
    }
}

fn copy_adapter(engine: &RenderEngine<HeadlessBackend>) -> Interop {
    InteropRegistry::default()
        .create(engine, InteropType::GenericCopy)
        .expect("copy interop is always available")
}

fn sizes(engine: &RenderEngine<HeadlessBackend>, keys: &[TextureKey]) -> Vec<ISize> {
    keys.iter().map(|k| engine.texture_info(*k).unwrap().size).collect()
}

// ── strategy selection ────────────────────────────────────────────────────

#[test]
fn interop_type_follows_codec_and_capabilities() {
    let full = caps(Features::all());
    let no_external = caps(Features::all() - Features::EXTERNAL_TEXTURE);

    assert_eq!(get_interop_type(CodecId::Unknown(0xdead), &full), InteropType::Unsupported);
    assert_eq!(get_interop_type(CodecId::Software(VideoCodec::H264), &full), InteropType::GenericCopy);
    assert_eq!(get_interop_type(CodecId::HardwareCopy(VideoCodec::Vp9), &full), InteropType::GenericCopy);
    assert_eq!(
        get_interop_type(CodecId::HardwareSurface(VideoCodec::Av1), &full),
        InteropType::ZeroCopyShared
    );
    assert_eq!(
        get_interop_type(CodecId::HardwareSurface(VideoCodec::Av1), &no_external),
        InteropType::GenericCopy
    );
}

#[test]
fn registry_lists_what_the_backend_can_run() {
    let registry = InteropRegistry::default();
    assert_eq!(
        registry.available(&caps(Features::all())),
        [InteropType::ZeroCopyShared, InteropType::GenericCopy]
    );
    assert_eq!(
        registry.available(&caps(Features::all() - Features::EXTERNAL_TEXTURE)),
        [InteropType::GenericCopy]
    );
}

#[test]
fn registry_refuses_unusable_adapters() {
    let registry = InteropRegistry::default();

    let uninitialized = RenderEngine::new(HeadlessBackend::default(), EngineConfig::default());
    assert!(registry.create(&uninitialized, InteropType::GenericCopy).is_none());

    let features = Features::all() - Features::EXTERNAL_TEXTURE;
    let (engine, _probe) = engine_with(HeadlessConfig::default().with_features(features), EngineConfig::default());
    assert!(registry.create(&engine, InteropType::Unsupported).is_none());
    assert!(registry.create(&engine, InteropType::ZeroCopyShared).is_none());
    assert!(registry.create(&engine, InteropType::GenericCopy).is_some());

    let copy_only = InteropRegistry::from_table(&registry.entries()[1..]);
    let (engine, _probe) = self::engine();
    assert!(copy_only.create(&engine, InteropType::ZeroCopyShared).is_none());
}

// ── copy path ─────────────────────────────────────────────────────────────

#[test]
fn copy_uploads_every_plane() {
    let (engine, probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);
    let frame = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Yv12, size, 16);

    let planes = interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive);
    assert_eq!(sizes(&engine, &planes), [size, ISize::new(32, 16), ISize::new(32, 16)]);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::CreateTexture { .. })), 3);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::UploadTexture { .. })), 3);

    // Same geometry: textures are reused.
    let again = interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive);
    assert_eq!(again, planes);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::CreateTexture { .. })), 3);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::UploadTexture { .. })), 6);
}

#[test]
fn copy_reallocates_on_geometry_change() {
    let (engine, probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let codec = CodecId::Software(VideoCodec::Mpeg2);

    let sd = interop.acquire(
        &engine,
        &mut colourspace,
        &cpu_frame(codec, FrameFormat::Yv12, ISize::new(720, 576), 0),
        FrameScanType::Progressive,
    );
    let hd = interop.acquire(
        &engine,
        &mut colourspace,
        &cpu_frame(codec, FrameFormat::Nv12, ISize::new(1280, 720), 0),
        FrameScanType::Progressive,
    );

    assert_eq!(hd.len(), 2);
    assert!(sd.iter().all(|k| engine.texture_info(*k).is_none()));
    assert_eq!(probe.live().textures, 2);
}

#[test]
fn interlaced_frames_sample_nearest() {
    let (engine, _probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let frame = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Yv12, ISize::new(64, 32), 0);

    let planes = interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Interlaced);
    assert!(planes.iter().all(|k| engine.texture_info(*k).unwrap().filter == TextureFilter::Nearest));

    let planes = interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive);
    assert!(planes.iter().all(|k| engine.texture_info(*k).unwrap().filter == TextureFilter::Linear));
}

#[test]
fn acquire_tracks_frame_colour() {
    let (engine, _probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    colourspace.mark_uploaded();

    let mut frame = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Rgba, ISize::new(16, 16), 0);
    frame.colour = ColourMetadata { matrix: ColourMatrix::Bt601, range: ColourRange::Full };

    assert_eq!(interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive).len(), 1);
    assert_eq!(colourspace.colour_matrix, ColourMatrix::Bt601);
    assert_eq!(colourspace.range, ColourRange::Full);
    assert!(colourspace.is_changed());
}

// ── failures leave earlier textures alone ─────────────────────────────────

#[test]
fn unsupported_codec_returns_nothing() {
    let (engine, probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    let good = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Yv12, size, 0);
    let previous = interop.acquire(&engine, &mut colourspace, &good, FrameScanType::Progressive);
    assert_eq!(previous.len(), 3);
    probe.clear_log();

    let unknown = cpu_frame(CodecId::Unknown(42), FrameFormat::Yv12, size, 0);
    assert!(interop.acquire(&engine, &mut colourspace, &unknown, FrameScanType::Progressive).is_empty());

    assert!(previous.iter().all(|k| engine.texture_info(*k).is_some()));
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::DeleteTexture(_) | GpuCommand::UploadTexture { .. })), 0);
}

#[test]
fn copy_adapter_rejects_shared_frames() {
    let (engine, probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();

    let planes = interop.acquire(
        &engine,
        &mut colourspace,
        &shared_frame(1, ISize::new(64, 32)),
        FrameScanType::Progressive,
    );
    assert!(planes.is_empty());
    assert_eq!(probe.live().textures, 0);
}

#[test]
fn failed_reallocation_keeps_the_previous_set() {
    let (engine, probe) = engine_with(HeadlessConfig::default().with_texture_budget(8 * 1024), EngineConfig::default());
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let codec = CodecId::Software(VideoCodec::H264);

    let small = cpu_frame(codec, FrameFormat::Yv12, ISize::new(64, 32), 0);
    let previous = interop.acquire(&engine, &mut colourspace, &small, FrameScanType::Progressive);
    assert_eq!(previous.len(), 3);

    let large = cpu_frame(codec, FrameFormat::Yv12, ISize::new(256, 256), 0);
    assert!(interop.acquire(&engine, &mut colourspace, &large, FrameScanType::Progressive).is_empty());

    assert!(previous.iter().all(|k| engine.texture_info(*k).is_some()));
    assert_eq!(probe.live().textures, 3, "partial allocations are rolled back");

    // The old geometry still works afterwards.
    let again = interop.acquire(&engine, &mut colourspace, &small, FrameScanType::Progressive);
    assert_eq!(again, previous);
}

#[test]
fn short_pitch_is_rejected() {
    let (engine, _probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();

    let mut frame = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Rgba, ISize::new(16, 16), 0);
    if let FrameData::Cpu(planes) = &mut frame.data {
        planes[0].pitch = 8;
    }
    assert!(interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive).is_empty());
}

#[test]
fn bad_plane_leaves_previous_frame_untouched() {
    let (engine, probe) = engine();
    let mut interop = copy_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let good = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Yv12, ISize::new(64, 32), 0);
    let previous = interop.acquire(&engine, &mut colourspace, &good, FrameScanType::Progressive);
    assert_eq!(previous.len(), 3);

    // Last plane has a short pitch: nothing may be uploaded into the earlier planes.
    let mut short_pitch = good.clone();
    if let FrameData::Cpu(planes) = &mut short_pitch.data {
        planes[2].pitch = 1;
    }
    probe.clear_log();
    assert!(interop.acquire(&engine, &mut colourspace, &short_pitch, FrameScanType::Interlaced).is_empty());
    let touches = |c: &GpuCommand| matches!(c, GpuCommand::UploadTexture { .. } | GpuCommand::SetSampling { .. });
    assert_eq!(probe.count(touches), 0);

    // Same for a truncated buffer.
    let mut truncated = good.clone();
    if let FrameData::Cpu(planes) = &mut truncated.data {
        let short: Arc<[u8]> = planes[2].data[..planes[2].data.len() - 1].into();
        planes[2].data = short;
    }
    assert!(interop.acquire(&engine, &mut colourspace, &truncated, FrameScanType::Progressive).is_empty());
    assert_eq!(probe.count(touches), 0);

    assert!(previous.iter().all(|k| engine.texture_info(*k).is_some()));
    let again = interop.acquire(&engine, &mut colourspace, &good, FrameScanType::Progressive);
    assert_eq!(again, previous);
}

#[test]
fn acquire_before_init_returns_nothing() {
    let (engine, _probe) = engine();
    let mut interop = copy_adapter(&engine);
    engine.release();

    let frame = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Rgba, ISize::new(16, 16), 0);
    let mut colourspace = VideoColourSpace::default();
    assert!(interop.acquire(&engine, &mut colourspace, &frame, FrameScanType::Progressive).is_empty());
}

// ── zero-copy path ────────────────────────────────────────────────────────

fn shared_adapter(engine: &RenderEngine<HeadlessBackend>) -> Interop {
    InteropRegistry::default()
        .create(engine, InteropType::ZeroCopyShared)
        .expect("headless backend imports external textures")
}

#[test]
fn shared_surfaces_are_bound_once() {
    let (engine, probe) = engine();
    let mut interop = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    let planes = interop.acquire(&engine, &mut colourspace, &shared_frame(5, size), FrameScanType::Progressive);
    assert_eq!(sizes(&engine, &planes), [size, ISize::new(32, 16)]);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::ImportExternal { surface: 5, .. })), 2);

    let again = interop.acquire(&engine, &mut colourspace, &shared_frame(5, size), FrameScanType::Progressive);
    assert_eq!(again, planes);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::ImportExternal { .. })), 2);
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::UploadTexture { .. })), 0);
}

#[test]
fn shared_surface_cache_evicts_oldest() {
    let config = EngineConfig { shared_surface_cache: 2, ..EngineConfig::default() };
    let (engine, probe) = engine_with(HeadlessConfig::default(), config);
    let mut interop = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    let first = interop.acquire(&engine, &mut colourspace, &shared_frame(1, size), FrameScanType::Progressive);
    interop.acquire(&engine, &mut colourspace, &shared_frame(2, size), FrameScanType::Progressive);
    interop.acquire(&engine, &mut colourspace, &shared_frame(3, size), FrameScanType::Progressive);

    assert!(first.iter().all(|k| engine.texture_info(*k).is_none()));
    assert_eq!(probe.live().textures, 4);
    let Interop::ZeroCopyShared(shared) = &interop else {
        panic!("expected the zero-copy adapter");
    };
    assert_eq!(shared.cached_surfaces(), 2);
}

#[test]
fn reused_surface_at_a_new_size_is_rebound() {
    let (engine, probe) = engine();
    let mut interop = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();

    let before = interop.acquire(&engine, &mut colourspace, &shared_frame(9, ISize::new(64, 32)), FrameScanType::Progressive);
    let after = interop.acquire(&engine, &mut colourspace, &shared_frame(9, ISize::new(128, 64)), FrameScanType::Progressive);

    assert_ne!(before, after);
    assert_eq!(sizes(&engine, &after)[0], ISize::new(128, 64));
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::ImportExternal { .. })), 4);
    assert_eq!(probe.live().textures, 2);
}

#[test]
fn shared_adapter_rejects_cpu_frames_and_short_surfaces() {
    let (engine, probe) = engine();
    let mut interop = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    let cpu = cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Nv12, size, 0);
    assert!(interop.acquire(&engine, &mut colourspace, &cpu, FrameScanType::Progressive).is_empty());

    let mut short = shared_frame(3, size);
    if let FrameData::Shared(surface) = &mut short.data {
        surface.planes.truncate(1);
    }
    assert!(interop.acquire(&engine, &mut colourspace, &short, FrameScanType::Progressive).is_empty());
    assert_eq!(probe.live().textures, 0);
}

#[test]
fn context_loss_rebinds_cached_surfaces() {
    let (engine, probe) = engine();
    let mut interop = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    let before = interop.acquire(&engine, &mut colourspace, &shared_frame(4, size), FrameScanType::Progressive);
    engine.context_lost();
    engine.init().unwrap();

    let after = interop.acquire(&engine, &mut colourspace, &shared_frame(4, size), FrameScanType::Progressive);
    assert_eq!(after.len(), 2);
    assert!(before.iter().all(|k| engine.texture_info(*k).is_none()));
    assert_eq!(probe.count(|c| matches!(c, GpuCommand::ImportExternal { .. })), 4);
}

#[test]
fn release_deletes_adapter_textures() {
    let (engine, probe) = engine();
    let mut copy = copy_adapter(&engine);
    let mut shared = shared_adapter(&engine);
    let mut colourspace = VideoColourSpace::default();
    let size = ISize::new(64, 32);

    copy.acquire(
        &engine,
        &mut colourspace,
        &cpu_frame(CodecId::Software(VideoCodec::H264), FrameFormat::Yv12, size, 0),
        FrameScanType::Progressive,
    );
    shared.acquire(&engine, &mut colourspace, &shared_frame(1, size), FrameScanType::Progressive);
    assert_eq!(probe.live().textures, 5);

    copy.release(&engine);
    shared.release(&engine);
    assert_eq!(probe.live().textures, 0);
}
