use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::{Condvar, Mutex};

use super::*;
use crate::errors::{EError, Result};
use crate::typeyd3d12::{
    TAdapter, TCommandAllocator, TCommandQueue, TDescriptorHeap, TDevice, TEvent, TFactory, TFence,
    TResource,
};

const CBV_SRV_UAV_INCREMENT: usize = 32;
const RTV_INCREMENT: usize = 32;
const DSV_INCREMENT: usize = 8;
pub(super) const GPU_HANDLE_BASE: u64 = 0x1_0000_0000;
pub(super) const BUFFER_ADDRESS_BASE: u64 = 0x40_0000_0000;
// -- D3D12_DEFAULT_RESOURCE_PLACEMENT_ALIGNMENT
const BUFFER_PLACEMENT_ALIGNMENT: u64 = 64 * 1024;

#[derive(Clone, Debug)]
pub struct SMockAdapterInfo {
    pub description: String,
    pub software: bool,
    pub max_feature_level: t12::EFeatureLevel,
    pub dedicated_video_memory: usize,
}

impl Default for SMockAdapterInfo {
    fn default() -> Self {
        Self {
            description: "Mock Hardware Adapter".to_string(),
            software: false,
            max_feature_level: t12::EFeatureLevel::Level12_1,
            dedicated_video_memory: 2048 * 1024 * 1024,
        }
    }
}

pub struct SMockFactory {
    pub(super) gpu: SMockGpu,
    adapters: Vec<SMockAdapterInfo>,
}

impl SMockFactory {
    pub fn new(gpu: &SMockGpu) -> Self {
        Self::with_adapters(gpu, vec![SMockAdapterInfo::default()])
    }

    pub fn with_adapters(gpu: &SMockGpu, adapters: Vec<SMockAdapterInfo>) -> Self {
        Self {
            gpu: gpu.clone(),
            adapters,
        }
    }

    pub fn gpu(&self) -> &SMockGpu {
        &self.gpu
    }
}

impl TFactory<SMockBackend> for SMockFactory {
    fn enumadapters(&self, adapteridx: u32) -> Option<SMockAdapter> {
        self.adapters.get(adapteridx as usize).map(|info| SMockAdapter {
            gpu: self.gpu.clone(),
            info: info.clone(),
        })
    }

    fn enabledebuglayer(&self) -> Result<()> {
        self.gpu.lock().debug_layer = true;
        Ok(())
    }

    fn createswapchainforsurface(
        &self,
        _commandqueue: &SMockCommandQueue,
        surface: &t12::SSurface,
        buffercount: u32,
        format: t12::EDXGIFormat,
    ) -> Result<SMockSwapChain> {
        if buffercount < 2 {
            return Err(EError::Backend("flip model swap chains need at least two buffers"));
        }
        if format.is_depth() {
            return Err(EError::Backend("swap chain format can't be a depth format"));
        }
        if surface.width == 0 || surface.height == 0 {
            return Err(EError::Backend("zero sized surface"));
        }

        Ok(SMockSwapChain::new(&self.gpu, buffercount as usize))
    }
}

pub struct SMockAdapter {
    gpu: SMockGpu,
    info: SMockAdapterInfo,
}

impl TAdapter<SMockBackend> for SMockAdapter {
    fn getdesc(&self) -> t12::SAdapterDesc {
        t12::SAdapterDesc {
            description: self.info.description.clone(),
            dedicated_video_memory: self.info.dedicated_video_memory,
            software: self.info.software,
        }
    }

    fn d3d12createdevice(&self, minfeaturelevel: t12::EFeatureLevel) -> Result<SMockDevice> {
        if minfeaturelevel > self.info.max_feature_level {
            return Err(EError::Backend("adapter doesn't support the requested feature level"));
        }
        Ok(SMockDevice {
            gpu: self.gpu.clone(),
        })
    }
}

pub struct SMockDevice {
    gpu: SMockGpu,
}

impl TDevice<SMockBackend> for SMockDevice {
    fn createcommandqueue(&self) -> Result<SMockCommandQueue> {
        Ok(SMockCommandQueue {
            gpu: self.gpu.clone(),
        })
    }

    fn createcommandallocator(&self) -> Result<SMockCommandAllocator> {
        let mut state = self.gpu.lock();
        state.allocator_inflight.push(0);
        Ok(SMockCommandAllocator {
            gpu: self.gpu.clone(),
            id: state.allocator_inflight.len() - 1,
        })
    }

    fn createcommandlist(&self, allocator: &SMockCommandAllocator) -> Result<SMockCommandList> {
        Ok(SMockCommandList::new(&self.gpu, allocator.id))
    }

    fn createfence(&self, initialvalue: u64) -> Result<SMockFence> {
        let mut state = self.gpu.lock();
        state.fences.push(initialvalue);
        Ok(SMockFence {
            gpu: self.gpu.clone(),
            id: state.fences.len() - 1,
        })
    }

    fn create_descriptor_heap(&self, desc: &t12::SDescriptorHeapDesc) -> Result<SMockDescriptorHeap> {
        if desc.num_descriptors == 0 {
            return Err(EError::Backend("descriptor heap with no descriptors"));
        }

        let mut state = self.gpu.lock();
        let base = state.next_heap_base;
        let size = desc.num_descriptors * self.getdescriptorhandleincrementsize(desc.type_);
        // -- page aligned and gapped so neighbouring heaps never touch
        state.next_heap_base = (base + size + 0x1fff) & !0xfff;

        let shader_visible = desc.flags.contains(t12::SDescriptorHeapFlags::SHADER_VISIBLE);
        Ok(SMockDescriptorHeap {
            id: state.alloc_object_id(),
            cpu_start: t12::SCPUDescriptorHandle { ptr: base },
            gpu_start: if shader_visible {
                t12::SGPUDescriptorHandle {
                    ptr: GPU_HANDLE_BASE + base as u64,
                }
            } else {
                t12::SGPUDescriptorHandle { ptr: 0 }
            },
        })
    }

    fn getdescriptorhandleincrementsize(&self, type_: t12::EDescriptorHeapType) -> usize {
        match type_ {
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess => {
                CBV_SRV_UAV_INCREMENT
            }
            t12::EDescriptorHeapType::RenderTarget => RTV_INCREMENT,
            t12::EDescriptorHeapType::DepthStencil => DSV_INCREMENT,
        }
    }

    fn createrendertargetview(&self, resource: &SMockResource, destdescriptor: t12::SCPUDescriptorHandle) {
        self.gpu.lock().views.insert(destdescriptor.ptr, resource.id);
    }

    fn create_depth_stencil_view(
        &self,
        resource: &SMockResource,
        _format: t12::EDXGIFormat,
        destdescriptor: t12::SCPUDescriptorHandle,
    ) {
        self.gpu.lock().views.insert(destdescriptor.ptr, resource.id);
    }

    fn create_committed_depth_texture(
        &self,
        width: u32,
        height: u32,
        format: t12::EDXGIFormat,
        _clear_depth: f32,
    ) -> Result<SMockResource> {
        if !format.is_depth() {
            return Err(EError::Backend("depth texture needs a depth format"));
        }
        debug!("Mock depth texture {}x{}", width, height);

        let id = self.gpu.lock().add_resource(t12::EResourceStates::DepthWrite);
        Ok(SMockResource {
            gpu: self.gpu.clone(),
            id,
        })
    }

    fn create_committed_upload_buffer(&self, size_in_bytes: usize) -> Result<SMockResource> {
        if size_in_bytes == 0 {
            return Err(EError::Backend("zero sized buffer"));
        }

        let mut state = self.gpu.lock();
        let gpu_address = state.next_buffer_address;
        let span = (size_in_bytes as u64 + BUFFER_PLACEMENT_ALIGNMENT - 1)
            & !(BUFFER_PLACEMENT_ALIGNMENT - 1);
        state.next_buffer_address += span;

        let id = state.add_resource(t12::EResourceStates::GenericRead);
        state.buffers.insert(
            id,
            SMockBuffer {
                gpu_address,
                bytes: vec![0; size_in_bytes],
            },
        );
        debug!("Mock upload buffer {} at {:#x}, {} bytes", id, gpu_address, size_in_bytes);

        Ok(SMockResource {
            gpu: self.gpu.clone(),
            id,
        })
    }

    fn create_shader_resource_view(
        &self,
        resource: &SMockResource,
        desc: &t12::SShaderResourceViewDesc,
        destdescriptor: t12::SCPUDescriptorHandle,
    ) {
        let mut state = self.gpu.lock();
        let buffer_len = state.buffers.get(&resource.id).map(|buffer| buffer.bytes.len());

        match (desc.view, buffer_len) {
            (
                t12::ESRV::Buffer {
                    first_element,
                    num_elements,
                    structure_byte_stride,
                },
                Some(len),
            ) => {
                let end = (first_element + num_elements as u64) * structure_byte_stride as u64;
                if desc.format != t12::EDXGIFormat::Unknown || end > len as u64 {
                    state.violation(format!(
                        "structured buffer view of {} bytes over a {} byte buffer",
                        end, len
                    ));
                }
            }
            (t12::ESRV::Buffer { .. }, None) => {
                state.violation(format!("buffer view of non-buffer resource {}", resource.id));
            }
            (t12::ESRV::Texture2D { .. }, Some(_)) => {
                state.violation(format!("texture view of buffer resource {}", resource.id));
            }
            (t12::ESRV::Texture2D { .. }, None) => {}
        }

        state.views.insert(destdescriptor.ptr, resource.id);
    }

    fn create_root_signature(&self, serialized_blob: &[u8]) -> Result<SMockRootSignature> {
        if serialized_blob.is_empty() {
            return Err(EError::Backend("empty root signature blob"));
        }
        Ok(SMockRootSignature {
            id: self.gpu.lock().alloc_object_id(),
        })
    }

    fn create_graphics_pipeline_state(
        &self,
        desc: &t12::SGraphicsPipelineStateDesc<'_, SMockBackend>,
    ) -> Result<SMockPipelineState> {
        if desc.vertex_shader.is_empty() {
            return Err(EError::Backend("pipeline state without vertex shader"));
        }
        if desc.depth_enable && desc.dsv_format.is_none() {
            return Err(EError::Backend("depth enabled without a depth format"));
        }
        Ok(SMockPipelineState {
            id: self.gpu.lock().alloc_object_id(),
            root_signature: desc.root_signature.id,
        })
    }
}

pub struct SMockCommandQueue {
    gpu: SMockGpu,
}

impl TCommandQueue<SMockBackend> for SMockCommandQueue {
    fn executecommandlist(&self, list: &SMockCommandList) -> Result<()> {
        let (allocator, commands) = list.submission()?;

        let mut state = self.gpu.lock();
        if state.device_removed {
            return Err(EError::DeviceLost("execute after device removal"));
        }

        state.allocator_inflight[allocator] += 1;
        state.submit(EMockWork::Execute {
            allocator,
            commands,
        });
        self.gpu.shared.work_available.notify_all();
        Ok(())
    }

    fn signal(&self, fence: &SMockFence, val: u64) -> Result<u64> {
        let mut state = self.gpu.lock();
        if state.device_removed {
            return Err(EError::DeviceLost("signal after device removal"));
        }

        state.submit(EMockWork::Signal {
            fence: fence.id,
            value: val,
        });
        self.gpu.shared.work_available.notify_all();
        Ok(val)
    }
}

pub struct SMockCommandAllocator {
    gpu: SMockGpu,
    pub(super) id: usize,
}

impl TCommandAllocator for SMockCommandAllocator {
    fn reset(&self) -> Result<()> {
        let mut state = self.gpu.lock();

        let inflight = state.allocator_inflight[self.id];
        if inflight > 0 {
            state.violation(format!(
                "allocator {} reset with {} submissions still on the GPU",
                self.id, inflight
            ));
        }

        let fence_completed = state.last_retired_signal;
        state.events.push(EMockEvent::AllocatorReset {
            allocator: self.id,
            fence_completed,
        });
        Ok(())
    }
}

pub struct SMockFence {
    gpu: SMockGpu,
    pub(super) id: usize,
}

impl TFence<SMockBackend> for SMockFence {
    fn getcompletedvalue(&self) -> u64 {
        self.gpu.lock().fences[self.id]
    }

    fn seteventoncompletion(&self, val: u64, event: &SMockEvent) -> Result<()> {
        let mut state = self.gpu.lock();
        if state.fences[self.id] >= val {
            event.set();
        } else {
            state.fence_waiters.push(SMockFenceWaiter {
                fence: self.id,
                value: val,
                event: event.clone(),
            });
        }
        Ok(())
    }
}

// -- auto reset, like the events the real fence wait uses
#[derive(Clone)]
pub struct SMockEvent {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl SMockEvent {
    pub(super) fn set(&self) {
        let (signalled, cvar) = &*self.inner;
        *signalled.lock() = true;
        cvar.notify_all();
    }
}

impl TEvent for SMockEvent {
    fn create() -> Result<Self> {
        Ok(Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        })
    }

    fn waitforsingleobject(&self, timeout: Option<Duration>) -> bool {
        let (signalled, cvar) = &*self.inner;
        let mut signalled = signalled.lock();

        while !*signalled {
            match timeout {
                Some(t) => {
                    if cvar.wait_for(&mut signalled, t).timed_out() {
                        if !*signalled {
                            return false;
                        }
                        break;
                    }
                }
                None => cvar.wait(&mut signalled),
            }
        }

        *signalled = false;
        true
    }
}

pub struct SMockDescriptorHeap {
    pub(super) id: usize,
    cpu_start: t12::SCPUDescriptorHandle,
    gpu_start: t12::SGPUDescriptorHandle,
}

impl TDescriptorHeap for SMockDescriptorHeap {
    fn getcpudescriptorhandleforheapstart(&self) -> t12::SCPUDescriptorHandle {
        self.cpu_start
    }

    fn getgpudescriptorhandleforheapstart(&self) -> t12::SGPUDescriptorHandle {
        self.gpu_start
    }
}

#[derive(Clone)]
pub struct SMockResource {
    pub(super) gpu: SMockGpu,
    pub(super) id: usize,
}

impl SMockResource {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl PartialEq for SMockResource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SMockResource {}

impl std::fmt::Debug for SMockResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SMockResource").field("id", &self.id).finish()
    }
}

impl TResource for SMockResource {
    fn getgpuvirtualaddress(&self) -> u64 {
        // -- like d3d, textures have no address
        self.gpu
            .lock()
            .buffers
            .get(&self.id)
            .map_or(0, |buffer| buffer.gpu_address)
    }

    fn writebytes(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut state = self.gpu.lock();
        match state.buffers.get_mut(&self.id) {
            Some(buffer) if offset + data.len() <= buffer.bytes.len() => {
                buffer.bytes[offset..offset + data.len()].copy_from_slice(data);
                Ok(())
            }
            Some(_) => Err(EError::Backend("write past the end of a mapped buffer")),
            None => Err(EError::Backend("only upload buffers can be mapped")),
        }
    }
}

pub struct SMockRootSignature {
    pub(super) id: usize,
}

impl SMockRootSignature {
    pub fn id(&self) -> usize {
        self.id
    }
}

pub struct SMockPipelineState {
    pub(super) id: usize,
    pub(super) root_signature: usize,
}

impl SMockPipelineState {
    pub fn root_signature_id(&self) -> usize {
        self.root_signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_times_out_then_auto_resets() {
        let event = SMockEvent::create().unwrap();
        assert!(!event.waitforsingleobject(Some(Duration::from_millis(5))));

        event.set();
        assert!(event.waitforsingleobject(Some(Duration::from_millis(5))));
        assert!(!event.waitforsingleobject(Some(Duration::from_millis(5))));
    }

    #[test]
    fn test_fence_wakes_waiter_on_retire() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu: gpu.clone() };
        let queue = device.createcommandqueue().unwrap();
        let fence = device.createfence(0).unwrap();
        let event = SMockEvent::create().unwrap();

        queue.signal(&fence, 1).unwrap();
        fence.seteventoncompletion(1, &event).unwrap();
        assert!(!event.waitforsingleobject(Some(Duration::from_millis(1))));

        assert!(gpu.retire_next());
        assert!(event.waitforsingleobject(Some(Duration::from_millis(1))));
        assert_eq!(gpu.fence_completed_value(&fence), 1);
    }

    #[test]
    fn test_worker_follows_mode_changes() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu: gpu.clone() };
        let queue = device.createcommandqueue().unwrap();
        let fence = device.createfence(0).unwrap();
        let event = SMockEvent::create().unwrap();

        queue.signal(&fence, 1).unwrap();
        fence.seteventoncompletion(1, &event).unwrap();
        assert!(!event.waitforsingleobject(Some(Duration::from_millis(5))));

        gpu.set_mode(EMockGpuMode::Delayed(Duration::from_millis(1)));
        assert!(event.waitforsingleobject(Some(Duration::from_secs(5))));

        // -- the running worker picks up the new interval
        gpu.set_mode(EMockGpuMode::Delayed(Duration::from_millis(3)));
        assert_eq!(gpu.mode(), EMockGpuMode::Delayed(Duration::from_millis(3)));
        queue.signal(&fence, 2).unwrap();
        fence.seteventoncompletion(2, &event).unwrap();
        assert!(event.waitforsingleobject(Some(Duration::from_secs(5))));
        assert_eq!(fence.getcompletedvalue(), 2);
    }

    #[test]
    fn test_device_removal_completes_fences() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu: gpu.clone() };
        let queue = device.createcommandqueue().unwrap();
        let fence = device.createfence(0).unwrap();

        queue.signal(&fence, 1).unwrap();
        gpu.remove_device();

        assert_eq!(fence.getcompletedvalue(), u64::MAX);
        assert_eq!(gpu.pending_work(), 0);
        assert!(matches!(queue.signal(&fence, 2), Err(EError::DeviceLost(_))));
    }

    #[test]
    fn test_upload_buffers_are_disjoint_and_writable() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu: gpu.clone() };

        let a = device.create_committed_upload_buffer(16).unwrap();
        let b = device.create_committed_upload_buffer(100_000).unwrap();
        let c = device.create_committed_upload_buffer(4).unwrap();
        assert_eq!(a.getgpuvirtualaddress() % BUFFER_PLACEMENT_ALIGNMENT, 0);
        assert!(b.getgpuvirtualaddress() >= a.getgpuvirtualaddress() + 16);
        assert!(c.getgpuvirtualaddress() >= b.getgpuvirtualaddress() + 100_000);
        assert_eq!(gpu.resource_state(&a), t12::EResourceStates::GenericRead);

        a.writebytes(4, &[1, 2, 3]).unwrap();
        assert_eq!(gpu.buffer_contents(&a).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(a.writebytes(14, &[1, 2, 3]).is_err());
        assert!(device.create_committed_upload_buffer(0).is_err());

        let depth = device
            .create_committed_depth_texture(4, 4, t12::EDXGIFormat::D32Float, 1.0)
            .unwrap();
        assert_eq!(depth.getgpuvirtualaddress(), 0);
        assert!(depth.writebytes(0, &[1]).is_err());
        assert!(gpu.buffer_contents(&depth).is_none());
    }

    #[test]
    fn test_shader_resource_view_must_fit_resource() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu: gpu.clone() };
        let buffer = device.create_committed_upload_buffer(64).unwrap();
        let slot = t12::SCPUDescriptorHandle { ptr: 0x1000 };

        let fits = t12::SShaderResourceViewDesc {
            format: t12::EDXGIFormat::Unknown,
            view: t12::ESRV::Buffer {
                first_element: 0,
                num_elements: 4,
                structure_byte_stride: 16,
            },
        };
        device.create_shader_resource_view(&buffer, &fits, slot);
        assert!(gpu.violations().is_empty());
        assert_eq!(gpu.view_resource_id(slot), Some(buffer.id()));

        let overruns = t12::SShaderResourceViewDesc {
            view: t12::ESRV::Buffer {
                first_element: 1,
                num_elements: 4,
                structure_byte_stride: 16,
            },
            ..fits
        };
        device.create_shader_resource_view(&buffer, &overruns, slot);
        assert_eq!(gpu.violations().len(), 1);

        let as_texture = t12::SShaderResourceViewDesc {
            format: t12::EDXGIFormat::R8G8B8A8UNorm,
            view: t12::ESRV::Texture2D { mip_levels: 1 },
        };
        device.create_shader_resource_view(&buffer, &as_texture, slot);
        assert_eq!(gpu.violations().len(), 2);
    }

    #[test]
    fn test_root_signature_needs_blob() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let device = SMockDevice { gpu };
        assert!(device.create_root_signature(&[]).is_err());
        assert!(device.create_root_signature(&[1, 2, 3]).is_ok());
    }
}
