use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rusframe::mockd3d12::{EMockEvent, EMockGpuMode, SMockBackend, SMockFactory, SMockGpu};
use rusframe::niced3d12::BACK_BUFFER_COUNT;
use rusframe::typeyd3d12 as t12;
use rusframe::{EError, SRender, SRenderConfig};

fn surface() -> t12::SSurface {
    t12::SSurface {
        handle: 0,
        width: 320,
        height: 180,
    }
}

fn engine(gpu: &SMockGpu, config: SRenderConfig) -> SRender<SMockBackend> {
    let _ = env_logger::builder().is_test(true).try_init();
    SRender::new(SMockFactory::new(gpu), surface(), config).unwrap()
}

fn run_frames(render: &mut SRender<SMockBackend>, frames: usize) {
    for _ in 0..frames {
        let mut frame = render.begin_frame().unwrap();
        frame.list().draw_instanced(6, 1, 0, 0);
        frame.end().unwrap();
    }
}

#[test]
fn no_allocator_reset_while_in_flight() {
    let gpu = SMockGpu::new(EMockGpuMode::Delayed(Duration::from_millis(3)));
    let mut render = engine(&gpu, SRenderConfig::default());

    run_frames(&mut render, 20);
    render.flush().unwrap();

    assert!(gpu.violations().is_empty(), "{:?}", gpu.violations());

    // -- every reset after the first lap saw the slot's previous fence value retired
    let resets: Vec<u64> = gpu
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EMockEvent::AllocatorReset {
                fence_completed, ..
            } => Some(fence_completed),
            _ => None,
        })
        .collect();
    assert_eq!(resets.len(), 20);
    for (frame, completed) in resets.iter().enumerate().skip(BACK_BUFFER_COUNT) {
        assert!(*completed >= (frame - 1) as u64, "frame {} reset at {}", frame, completed);
    }
}

#[test]
fn back_buffer_index_alternates() {
    let gpu = SMockGpu::new(EMockGpuMode::Delayed(Duration::from_millis(1)));
    let mut render = engine(&gpu, SRenderConfig::default());

    let mut indices = Vec::new();
    for _ in 0..8 {
        let frame = render.begin_frame().unwrap();
        indices.push(frame.context().back_buffer_index);
        frame.end().unwrap();
    }
    render.flush().unwrap();

    for pair in indices.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }

    let presented: Vec<usize> = gpu
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EMockEvent::Presented { buffer_index } => Some(buffer_index),
            _ => None,
        })
        .collect();
    assert_eq!(presented, indices);
}

#[test]
fn back_buffers_are_render_targets_only_while_recording() {
    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let mut render = engine(&gpu, SRenderConfig::default());

    for _ in 0..4 {
        let frame = render.begin_frame().unwrap();
        let idx = frame.context().back_buffer_index;
        frame.end().unwrap();
        assert_eq!(
            render.transitions().back_buffer_state(idx),
            t12::EResourceStates::Present
        );
        gpu.retire_all();
    }

    for idx in 0..BACK_BUFFER_COUNT {
        assert_eq!(
            gpu.resource_state(render.presenter().back_buffer(idx)),
            t12::EResourceStates::Present
        );
    }
    assert_eq!(render.transitions().barriers_emitted(), 8);
    assert!(gpu.violations().is_empty(), "{:?}", gpu.violations());
}

#[test]
fn third_frame_waits_only_for_first() {
    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let mut render = engine(&gpu, SRenderConfig::default());

    run_frames(&mut render, 2);
    assert_eq!(render.frame_fence_value(0), 1);
    assert_eq!(render.frame_fence_value(1), 2);
    assert_eq!(render.fence().completed_value(), 0);

    let returned = AtomicBool::new(false);
    let context = thread::scope(|scope| {
        let handle = scope.spawn(|| {
            let frame = render.begin_frame().unwrap();
            returned.store(true, Ordering::SeqCst);
            let context = frame.context().clone();
            frame.end().unwrap();
            context
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!returned.load(Ordering::SeqCst), "frame 3 didn't wait for frame 1");

        gpu.retire_through_fence_value(1);
        handle.join().unwrap()
    });

    assert_eq!(context.frame_number, 2);
    assert_eq!(context.back_buffer_index, 0);
    // -- frame 2 is still queued, only frame 1 had to retire
    assert_eq!(context.retired_fence_value, 1);
    assert_eq!(render.frame_fence_value(0), 3);

    gpu.retire_all();
    assert_eq!(render.fence().completed_value(), 3);
    assert!(gpu.violations().is_empty(), "{:?}", gpu.violations());
}

#[test]
fn device_removal_surfaces_from_end() {
    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let mut render = engine(&gpu, SRenderConfig::default());

    run_frames(&mut render, 1);
    gpu.retire_all();

    let frame = render.begin_frame().unwrap();
    gpu.remove_device();
    match frame.end() {
        Err(e) => {
            assert!(matches!(e, EError::DeviceLost(_)));
            assert!(e.is_device_fatal());
        }
        Ok(()) => panic!("present succeeded on a removed device"),
    }
}

fn draw_with_missing_texture(render: &mut SRender<SMockBackend>) -> Result<(), EError> {
    let mut frame = render.begin_frame()?;
    frame.list().draw_instanced(6, 1, 0, 0);
    let texture_table = frame.srv_gpu_handle(render_srv_capacity())?;
    frame.list().set_graphics_root_descriptor_table(0, texture_table);
    frame.end()
}

fn render_srv_capacity() -> usize {
    SRenderConfig::default().srv_heap_capacity
}

#[test]
fn early_return_mid_frame_leaves_engine_usable() {
    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let mut render = engine(&gpu, SRenderConfig::default());

    run_frames(&mut render, 1);
    assert!(matches!(
        draw_with_missing_texture(&mut render),
        Err(EError::DescriptorIndexOutOfRange { .. })
    ));
    gpu.retire_all();

    let results: Vec<_> = (0..3)
        .map(|_| {
            let mut frame = render.begin_frame()?;
            frame.list().draw_instanced(6, 1, 0, 0);
            let ended = frame.end();
            gpu.retire_all();
            ended
        })
        .collect();
    assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);

    // -- the dropped frame recorded draws, none of them reached the GPU
    assert_eq!(gpu.executed_commands().len(), 4);
    assert_eq!(render.frame_number(), 4);
    assert!(gpu.violations().is_empty(), "{:?}", gpu.violations());
}

#[test]
fn fence_wait_times_out_when_configured() {
    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let config = SRenderConfig {
        fence_wait_timeout_ms: Some(20),
        ..SRenderConfig::default()
    };
    let mut render = engine(&gpu, config);

    // -- nothing retires, so the third frame can't get slot 0 back
    run_frames(&mut render, 2);
    match render.begin_frame() {
        Err(EError::FenceTimeout { value, completed }) => {
            assert_eq!(value, 1);
            assert_eq!(completed, 0);
        }
        _ => panic!("expected FenceTimeout"),
    }

    gpu.retire_all();
}

#[test]
fn config_file_drives_engine() {
    let path = std::env::temp_dir().join(format!("rusframe_config_{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "srv_heap_capacity": 2, "sync_interval": 0 }"#).unwrap();
    let config = SRenderConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let gpu = SMockGpu::new(EMockGpuMode::Manual);
    let mut render = engine(&gpu, config);
    assert_eq!(render.srv_heap().capacity(), 2);
    assert_eq!(render.alloc_srv().unwrap(), 0);
    assert_eq!(render.alloc_srv().unwrap(), 1);
    assert!(render.alloc_srv().is_err());
}
