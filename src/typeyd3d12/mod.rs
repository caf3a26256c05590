// -- Typed D3D12 values plus the seam every backend implements. The niced3d12 layer is
// -- written only against these traits, so it runs the same on the real device and on
// -- the mock GPU.

mod adapter;
mod descriptor;
mod pipelinestate;
mod resource;
mod view;

use std::time::Duration;

use crate::errors::Result;

pub use self::adapter::*;
pub use self::descriptor::*;
pub use self::pipelinestate::*;
pub use self::resource::*;
pub use self::view::*;

// -- D3D12 binding limits
pub const MAX_RENDER_TARGETS: usize = 8;
pub const MAX_BOUND_DESCRIPTOR_HEAPS: usize = 2;
pub const MAX_VIEWPORTS: usize = 16;
pub const MAX_VERTEX_BUFFERS: usize = 32;

pub trait TBackend: Sized + 'static {
    type Factory: TFactory<Self>;
    type Adapter: TAdapter<Self>;
    type Device: TDevice<Self>;
    type CommandQueue: TCommandQueue<Self>;
    type CommandAllocator: TCommandAllocator;
    type CommandList: TCommandList<Self>;
    type Fence: TFence<Self>;
    type Event: TEvent;
    type DescriptorHeap: TDescriptorHeap;
    type Resource: TResource;
    type SwapChain: TSwapChain<Self>;
    type RootSignature;
    type PipelineState;
}

pub trait TFactory<B: TBackend> {
    // -- None once adapteridx runs past the last adapter
    fn enumadapters(&self, adapteridx: u32) -> Option<B::Adapter>;

    // -- must happen before the first device is created
    fn enabledebuglayer(&self) -> Result<()>;

    fn createswapchainforsurface(
        &self,
        commandqueue: &B::CommandQueue,
        surface: &SSurface,
        buffercount: u32,
        format: EDXGIFormat,
    ) -> Result<B::SwapChain>;
}

pub trait TAdapter<B: TBackend> {
    fn getdesc(&self) -> SAdapterDesc;
    fn d3d12createdevice(&self, minfeaturelevel: EFeatureLevel) -> Result<B::Device>;
}

pub trait TDevice<B: TBackend> {
    fn createcommandqueue(&self) -> Result<B::CommandQueue>;
    fn createcommandallocator(&self) -> Result<B::CommandAllocator>;

    // -- the returned list is open and bound to allocator
    fn createcommandlist(&self, allocator: &B::CommandAllocator) -> Result<B::CommandList>;

    fn createfence(&self, initialvalue: u64) -> Result<B::Fence>;
    fn create_descriptor_heap(&self, desc: &SDescriptorHeapDesc) -> Result<B::DescriptorHeap>;
    fn getdescriptorhandleincrementsize(&self, type_: EDescriptorHeapType) -> usize;

    fn createrendertargetview(&self, resource: &B::Resource, destdescriptor: SCPUDescriptorHandle);
    fn create_depth_stencil_view(
        &self,
        resource: &B::Resource,
        format: EDXGIFormat,
        destdescriptor: SCPUDescriptorHandle,
    );

    fn create_committed_depth_texture(
        &self,
        width: u32,
        height: u32,
        format: EDXGIFormat,
        clear_depth: f32,
    ) -> Result<B::Resource>;

    // -- CPU writable, GPU readable, created in GenericRead
    fn create_committed_upload_buffer(&self, size_in_bytes: usize) -> Result<B::Resource>;
    fn create_shader_resource_view(
        &self,
        resource: &B::Resource,
        desc: &SShaderResourceViewDesc,
        destdescriptor: SCPUDescriptorHandle,
    );

    fn create_root_signature(&self, serialized_blob: &[u8]) -> Result<B::RootSignature>;
    fn create_graphics_pipeline_state(
        &self,
        desc: &SGraphicsPipelineStateDesc<'_, B>,
    ) -> Result<B::PipelineState>;
}

pub trait TCommandQueue<B: TBackend> {
    fn executecommandlist(&self, list: &B::CommandList) -> Result<()>;
    fn signal(&self, fence: &B::Fence, val: u64) -> Result<u64>;
}

pub trait TCommandAllocator {
    fn reset(&self) -> Result<()>;
}

// -- recording calls aren't checked against the GPU. Callers own an open list.
pub trait TCommandList<B: TBackend> {
    fn reset(&self, commandallocator: &B::CommandAllocator) -> Result<()>;
    fn close(&self) -> Result<()>;

    fn resourcebarrier(
        &self,
        resource: &B::Resource,
        beforestate: EResourceStates,
        afterstate: EResourceStates,
    );

    fn clearrendertargetview(&self, descriptor: SCPUDescriptorHandle, colour: &[f32; 4]);
    fn clear_depth_stencil_view(
        &self,
        descriptor: SCPUDescriptorHandle,
        flags: SClearFlags,
        depth: f32,
        stencil: u8,
    );

    fn om_set_render_targets(
        &self,
        render_target_descriptors: &[SCPUDescriptorHandle],
        depth_target_descriptor: Option<SCPUDescriptorHandle>,
    );
    fn rs_set_viewports(&self, viewports: &[SViewport]);
    fn rs_set_scissor_rects(&self, scissor_rects: &[SRect]);
    fn set_descriptor_heaps(&self, heaps: &[&B::DescriptorHeap]);

    fn set_pipeline_state(&self, pipeline_state: &B::PipelineState);
    fn set_graphics_root_signature(&self, root_signature: &B::RootSignature);
    fn set_graphics_root_descriptor_table(&self, root_parameter_index: u32, base: SGPUDescriptorHandle);
    fn set_graphics_root_constant_buffer_view(&self, root_parameter_index: u32, buffer_location: u64);

    fn ia_set_primitive_topology(&self, primitive_topology: EPrimitiveTopology);
    fn ia_set_vertex_buffers(&self, start_slot: u32, vertex_buffers: &[SVertexBufferView]);
    fn ia_set_index_buffer(&self, index_buffer: &SIndexBufferView);
    fn draw_instanced(
        &self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    );
    fn draw_indexed_instanced(
        &self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    );
}

pub trait TResource {
    fn getgpuvirtualaddress(&self) -> u64;

    // -- upload heap buffers only. The caller keeps offset + data.len() inside the buffer.
    fn writebytes(&self, offset: usize, data: &[u8]) -> Result<()>;
}

pub trait TFence<B: TBackend> {
    fn getcompletedvalue(&self) -> u64;
    fn seteventoncompletion(&self, val: u64, event: &B::Event) -> Result<()>;
}

pub trait TEvent: Sized {
    fn create() -> Result<Self>;

    // -- false when the timeout expired before the event was signalled
    fn waitforsingleobject(&self, timeout: Option<Duration>) -> bool;
}

pub trait TDescriptorHeap {
    fn getcpudescriptorhandleforheapstart(&self) -> SCPUDescriptorHandle;

    // -- only meaningful for shader visible heaps
    fn getgpudescriptorhandleforheapstart(&self) -> SGPUDescriptorHandle;
}

pub trait TSwapChain<B: TBackend> {
    fn currentbackbufferindex(&self) -> usize;
    fn getbuffer(&self, idx: usize) -> Result<B::Resource>;

    // -- a removed device comes back as EError::DeviceLost
    fn present(&self, syncinterval: u32, flags: u32) -> Result<()>;
}
