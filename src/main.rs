// -- Headless frame loop against the mock GPU. Usage: rusframe [config.json] [frames]

use std::ffi::CStr;
use std::time::{Duration, Instant};

use log::{error, info, warn};

use rusframe::mockd3d12::{EMockGpuMode, SMockBackend, SMockFactory, SMockGpu};
use rusframe::typeyd3d12 as t12;
use rusframe::{EError, SRender, SRenderConfig};

const DEFAULT_FRAMES: u64 = 120;
const INSTANCE_COUNT: usize = 10;

// -- stand ins for compiled bytecode, the mock only checks they aren't empty
const ROOT_SIGNATURE_BLOB: &[u8] = b"DXBC-root-signature";
const VERTEX_SHADER_BLOB: &[u8] = b"DXBC-vs";
const PIXEL_SHADER_BLOB: &[u8] = b"DXBC-ps";

#[repr(C)]
#[derive(Copy, Clone)]
struct SVertex {
    position: [f32; 4],
    texcoord: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone)]
struct SMaterial {
    colour: [f32; 4],
    enable_lighting: u32,
    padding: [u32; 3],
}

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

fn run(config: SRenderConfig, frames: u64) -> Result<(), EError> {
    let gpu = SMockGpu::new(EMockGpuMode::Delayed(Duration::from_millis(4)));
    let surface = t12::SSurface {
        handle: 0,
        width: 1280,
        height: 720,
    };

    let depth_format = config.depth_format;
    let back_buffer_format = config.back_buffer_format;
    let mut render = SRender::<SMockBackend>::new(SMockFactory::new(&gpu), surface, config)?;

    let root_signature = render.create_root_signature(ROOT_SIGNATURE_BLOB)?;
    let position = CStr::from_bytes_with_nul(b"POSITION\0")
        .map_err(|_| EError::Initialization("bad semantic name"))?;
    let texcoord = CStr::from_bytes_with_nul(b"TEXCOORD\0")
        .map_err(|_| EError::Initialization("bad semantic name"))?;
    let input_layout = [
        t12::SInputElementDesc {
            semantic_name: position,
            semantic_index: 0,
            format: t12::EDXGIFormat::R32G32B32A32Float,
            input_slot: 0,
            aligned_byte_offset: t12::APPEND_ALIGNED_ELEMENT,
        },
        t12::SInputElementDesc {
            semantic_name: texcoord,
            semantic_index: 0,
            format: t12::EDXGIFormat::R32G32Float,
            input_slot: 0,
            aligned_byte_offset: t12::APPEND_ALIGNED_ELEMENT,
        },
    ];
    let pipeline_state = render.create_graphics_pipeline_state(&t12::SGraphicsPipelineStateDesc {
        root_signature: &root_signature,
        vertex_shader: VERTEX_SHADER_BLOB,
        pixel_shader: PIXEL_SHADER_BLOB,
        input_layout: &input_layout,
        rtv_format: back_buffer_format,
        dsv_format: Some(depth_format),
        cull_mode: t12::ECullMode::Back,
        depth_enable: true,
        blend_mode: t12::EBlendMode::None,
    })?;

    let mut vertices = render.create_upload_buffer::<SVertex>(4)?;
    vertices.copy_to_map(&[
        SVertex { position: [0.0, 360.0, 0.0, 1.0], texcoord: [0.0, 1.0] },
        SVertex { position: [0.0, 0.0, 0.0, 1.0], texcoord: [0.0, 0.0] },
        SVertex { position: [640.0, 360.0, 0.0, 1.0], texcoord: [1.0, 1.0] },
        SVertex { position: [640.0, 0.0, 0.0, 1.0], texcoord: [1.0, 0.0] },
    ])?;
    let mut indices = render.create_upload_buffer::<u32>(6)?;
    indices.copy_to_map(&[0, 1, 2, 1, 3, 2])?;
    let mut material = render.create_upload_buffer::<SMaterial>(1)?;
    material.copy_to_map(&[SMaterial {
        colour: [1.0; 4],
        enable_lighting: 0,
        padding: [0; 3],
    }])?;

    // -- per instance transforms, rewritten every frame into that frame's half
    let mut instances = render.create_upload_buffer::<[f32; 16]>(INSTANCE_COUNT * 2)?;
    instances.copy_to_map(&[IDENTITY; INSTANCE_COUNT * 2])?;
    let mut instance_srvs = [0; 2];
    for (half, srv) in instance_srvs.iter_mut().enumerate() {
        *srv = render.alloc_srv()?;
        let desc = t12::SShaderResourceViewDesc {
            format: t12::EDXGIFormat::Unknown,
            view: t12::ESRV::Buffer {
                first_element: (half * INSTANCE_COUNT) as u64,
                num_elements: INSTANCE_COUNT as u32,
                structure_byte_stride: std::mem::size_of::<[f32; 16]>() as u32,
            },
        };
        render.create_srv(*srv, instances.raw(), &desc)?;
    }

    let start = Instant::now();
    for _ in 0..frames {
        let mut frame = render.begin_frame()?;
        let half = frame.context().back_buffer_index;

        // -- begin_frame waited for this slot, so its half is no longer read by the GPU
        let mut transforms = [IDENTITY; INSTANCE_COUNT];
        for (i, transform) in transforms.iter_mut().enumerate() {
            transform[12] = i as f32 * 0.1 * (frame.context().frame_number % 60) as f32;
        }
        instances.copy_to_map_segment(&transforms, half * INSTANCE_COUNT)?;

        let instance_table = frame.srv_gpu_handle(instance_srvs[half])?;
        let list = frame.list();
        list.set_pipeline_state(&pipeline_state);
        list.set_graphics_root_signature(&root_signature);
        list.set_graphics_root_constant_buffer_view(0, material.gpu_virtual_address());
        list.set_graphics_root_descriptor_table(1, instance_table);
        list.ia_set_primitive_topology(t12::EPrimitiveTopology::TriangleList);
        list.ia_set_vertex_buffers(0, &[vertices.vertex_buffer_view()]);
        list.ia_set_index_buffer(&indices.index_buffer_view()?);
        list.draw_indexed_instanced(6, INSTANCE_COUNT as u32, 0, 0, 0);

        let frame_number = frame.context().frame_number;
        frame.end()?;

        if frame_number % 30 == 0 {
            info!(
                "Frame {}: signalled {}, completed {}",
                frame_number,
                render.fence().last_signalled_value(),
                render.fence().completed_value()
            );
        }
    }

    render.flush()?;
    let elapsed = start.elapsed();
    info!(
        "Rendered {} frames in {:.1} ms ({:.2} ms/frame)",
        frames,
        elapsed.as_secs_f64() * 1000.0,
        elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64
    );

    for violation in gpu.violations() {
        warn!("GPU timeline violation: {}", violation);
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match SRenderConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Couldn't load config '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => SRenderConfig::default(),
    };
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);

    if let Err(e) = run(config, frames) {
        if e.is_device_fatal() {
            error!("Fatal device error: {}", e);
        } else {
            error!("Render loop failed: {}", e);
        }
        std::process::exit(1);
    }
}
