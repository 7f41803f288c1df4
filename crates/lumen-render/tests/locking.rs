//! Engine lock behaviour: nesting, context currency and cross-thread batches.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use lumen_render::gpu::{GpuCommand, HeadlessBackend, HeadlessProbe};
use lumen_render::{EngineConfig, RenderEngine};

fn engine(config: EngineConfig) -> (RenderEngine<HeadlessBackend>, HeadlessProbe) {
    let backend = HeadlessBackend::default();
    let probe = backend.probe();
    let engine = RenderEngine::new(backend, config);
    engine.init().expect("headless init");
    (engine, probe)
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RenderEngine<HeadlessBackend>>();
}

#[test]
fn nested_lockers_track_depth() {
    let (engine, probe) = engine(EngineConfig::default());
    assert!(!probe.is_current());

    let outer = engine.lock();
    assert_eq!(outer.depth(), 1);
    assert!(probe.is_current());
    {
        let inner = engine.lock();
        assert_eq!(inner.depth(), 2);
    }
    assert_eq!(outer.depth(), 1);
    assert!(probe.is_current());

    drop(outer);
    assert!(!probe.is_current());
}

#[test]
fn only_the_outermost_locker_makes_current() {
    let (engine, probe) = engine(EngineConfig::default());
    let before = probe.make_current_calls();

    {
        let _batch = engine.lock();
        engine.set_background(10, 20, 30, 255);
        engine.set_blend(false);
        engine.clear_framebuffer();
        engine.flush(false);
    }
    assert_eq!(probe.make_current_calls(), before + 1);

    // Unbatched calls each take and release the context.
    engine.clear_framebuffer();
    engine.clear_framebuffer();
    assert_eq!(probe.make_current_calls(), before + 3);
}

#[test]
fn currency_calls_stay_balanced() {
    let (engine, probe) = engine(EngineConfig::default());
    {
        let _a = engine.lock();
        let _b = engine.lock();
        engine.clear_framebuffer();
    }
    let transitions = probe.commands_matching(|c| matches!(c, GpuCommand::MakeCurrent | GpuCommand::DoneCurrent));
    let makes = transitions.iter().filter(|c| **c == GpuCommand::MakeCurrent).count();
    assert_eq!(makes * 2, transitions.len());
    for pair in transitions.chunks(2) {
        assert_eq!(pair, [GpuCommand::MakeCurrent, GpuCommand::DoneCurrent]);
    }
}

#[test]
fn panicking_holder_releases_the_lock() {
    let (engine, probe) = engine(EngineConfig::default());

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _outer = engine.lock();
        let _inner = engine.lock();
        engine.clear_framebuffer();
        panic!("decoder thread blew up");
    }));
    assert!(result.is_err());
    assert!(!probe.is_current());

    let locker = engine.lock();
    assert_eq!(locker.depth(), 1);
    drop(locker);

    // The engine is still usable from another thread.
    thread::scope(|s| {
        s.spawn(|| engine.clear_framebuffer()).join().unwrap();
    });
}

#[test]
fn with_backend_reaches_the_backend() {
    let (engine, probe) = engine(EngineConfig::default());
    let locker = engine.lock();
    let from_inside = locker.with_backend(|backend| backend.probe());
    drop(locker);
    assert_eq!(from_inside.live(), probe.live());
}

#[test]
fn batches_from_two_threads_do_not_interleave() {
    let config = EngineConfig { debug_markers: true, ..EngineConfig::default() };
    let (engine, probe) = engine(config);
    let engine = Arc::new(engine);
    probe.clear_log();

    let workers: Vec<_> = ["ui", "video"]
        .into_iter()
        .map(|name| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    let _batch = engine.lock();
                    engine.log_debug_marker(&format!("{name}:begin"));
                    engine.clear_framebuffer();
                    engine.set_blend(true);
                    engine.log_debug_marker(&format!("{name}:end"));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let markers: Vec<String> = probe
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            GpuCommand::DebugMarker(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(markers.len(), 200);
    for pair in markers.chunks(2) {
        let (begin, end) = (&pair[0], &pair[1]);
        let name = begin.strip_suffix(":begin").expect("batch starts with its begin marker");
        assert_eq!(end, &format!("{name}:end"), "batch was interleaved");
    }

    // Each batch is bracketed by exactly one context acquisition.
    assert_eq!(probe.count(|c| *c == GpuCommand::MakeCurrent), 100);
    assert!(!probe.is_current());
}

#[test]
fn engine_calls_from_inside_a_batch_are_ordered() {
    let (engine, probe) = engine(EngineConfig { debug_markers: true, ..EngineConfig::default() });
    probe.clear_log();

    {
        let _batch = engine.lock();
        engine.log_debug_marker("first");
        engine.set_background(1, 2, 3, 255);
        engine.log_debug_marker("second");
    }

    let commands = probe.commands();
    let position = |pred: &dyn Fn(&GpuCommand) -> bool| commands.iter().position(pred).unwrap();
    let first = position(&|c| *c == GpuCommand::DebugMarker("first".into()));
    let clear = position(&|c| matches!(c, GpuCommand::SetClearColor(_)));
    let second = position(&|c| *c == GpuCommand::DebugMarker("second".into()));
    assert!(first < clear && clear < second);
}
