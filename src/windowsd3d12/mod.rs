// -- D3D12 over winapi. Thin: each type owns one COM pointer and each trait method is one
// -- API call plus HRESULT checking. Conversions from the typed values live at the bottom.

macro_rules! returnerrifwinerror {
    ($hn:expr, $err:expr) => {
        if !winerror::SUCCEEDED($hn) {
            return Err($err);
        }
    };
}

mod commandlist;
mod commandqueue;
mod descriptor;
mod device;
mod factory;
mod fence;
mod pipelinestate;
mod swapchain;

use std::{mem, ptr};

use winapi::ctypes::c_void;
use winapi::shared::{dxgiformat, dxgitype, winerror};
use winapi::um::d3d12::*;
use winapi::um::{d3dcommon, unknwnbase};
use winapi::Interface;

use wio::com::ComPtr;

use crate::errors::{EError, Result};
use crate::typeyd3d12 as t12;
use crate::typeyd3d12::TBackend;

pub use self::commandlist::SCommandList;
pub use self::commandqueue::{SCommandAllocator, SCommandQueue};
pub use self::descriptor::SDescriptorHeap;
pub use self::device::SDevice;
pub use self::factory::{SAdapter, SFactory};
pub use self::fence::{SEventHandle, SFence};
pub use self::pipelinestate::{SPipelineState, SRootSignature};
pub use self::swapchain::SSwapChain;

trait ComPtrPtrs<T> {
    unsafe fn asunknownptr(&self) -> *mut unknwnbase::IUnknown;
}

impl<T> ComPtrPtrs<T> for ComPtr<T>
where
    T: Interface,
{
    unsafe fn asunknownptr(&self) -> *mut unknwnbase::IUnknown {
        self.as_raw() as *mut unknwnbase::IUnknown
    }
}

pub struct SWindowsBackend;

impl TBackend for SWindowsBackend {
    type Factory = SFactory;
    type Adapter = SAdapter;
    type Device = SDevice;
    type CommandQueue = SCommandQueue;
    type CommandAllocator = SCommandAllocator;
    type CommandList = SCommandList;
    type Fence = SFence;
    type Event = SEventHandle;
    type DescriptorHeap = SDescriptorHeap;
    type Resource = SResource;
    type SwapChain = SSwapChain;
    type RootSignature = SRootSignature;
    type PipelineState = SPipelineState;
}

pub struct SResource {
    resource: ComPtr<ID3D12Resource>,
}

impl SResource {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12Resource>) -> Self {
        Self { resource: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12Resource> {
        &self.resource
    }
}

impl t12::TResource for SResource {
    fn getgpuvirtualaddress(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }

    fn writebytes(&self, offset: usize, data: &[u8]) -> Result<()> {
        // -- nothing is read back on the CPU
        let readrange = D3D12_RANGE { Begin: 0, End: 0 };
        let writtenrange = D3D12_RANGE {
            Begin: offset,
            End: offset + data.len(),
        };

        unsafe {
            let mut mapped: *mut c_void = ptr::null_mut();
            let hn = self.resource.Map(0, &readrange, &mut mapped);
            returnerrifwinerror!(hn, EError::Backend("Could not map resource."));

            ptr::copy_nonoverlapping(data.as_ptr(), (mapped as *mut u8).add(offset), data.len());
            self.resource.Unmap(0, &writtenrange);
        }
        Ok(())
    }
}

// -- winapi has no constant for 12_2
const D3D_FEATURE_LEVEL_12_2: d3dcommon::D3D_FEATURE_LEVEL = 0xc200;

fn featureleveld3dtype(level: t12::EFeatureLevel) -> d3dcommon::D3D_FEATURE_LEVEL {
    match level {
        t12::EFeatureLevel::Level11_0 => d3dcommon::D3D_FEATURE_LEVEL_11_0,
        t12::EFeatureLevel::Level11_1 => d3dcommon::D3D_FEATURE_LEVEL_11_1,
        t12::EFeatureLevel::Level12_0 => d3dcommon::D3D_FEATURE_LEVEL_12_0,
        t12::EFeatureLevel::Level12_1 => d3dcommon::D3D_FEATURE_LEVEL_12_1,
        t12::EFeatureLevel::Level12_2 => D3D_FEATURE_LEVEL_12_2,
    }
}

fn formatd3dtype(format: t12::EDXGIFormat) -> dxgiformat::DXGI_FORMAT {
    match format {
        t12::EDXGIFormat::Unknown => dxgiformat::DXGI_FORMAT_UNKNOWN,
        t12::EDXGIFormat::R8G8B8A8UNorm => dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM,
        t12::EDXGIFormat::R8G8B8A8UNormSRGB => dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
        t12::EDXGIFormat::R32G32B32A32Float => dxgiformat::DXGI_FORMAT_R32G32B32A32_FLOAT,
        t12::EDXGIFormat::R32G32B32Float => dxgiformat::DXGI_FORMAT_R32G32B32_FLOAT,
        t12::EDXGIFormat::R32G32Float => dxgiformat::DXGI_FORMAT_R32G32_FLOAT,
        t12::EDXGIFormat::R16UInt => dxgiformat::DXGI_FORMAT_R16_UINT,
        t12::EDXGIFormat::R32UInt => dxgiformat::DXGI_FORMAT_R32_UINT,
        t12::EDXGIFormat::D32Float => dxgiformat::DXGI_FORMAT_D32_FLOAT,
        t12::EDXGIFormat::D24UNormS8UInt => dxgiformat::DXGI_FORMAT_D24_UNORM_S8_UINT,
    }
}

fn resourcestated3dtype(state: t12::EResourceStates) -> D3D12_RESOURCE_STATES {
    match state {
        t12::EResourceStates::Present => D3D12_RESOURCE_STATE_PRESENT,
        t12::EResourceStates::RenderTarget => D3D12_RESOURCE_STATE_RENDER_TARGET,
        t12::EResourceStates::DepthWrite => D3D12_RESOURCE_STATE_DEPTH_WRITE,
        t12::EResourceStates::GenericRead => D3D12_RESOURCE_STATE_GENERIC_READ,
    }
}

fn descriptorheaptyped3dtype(type_: t12::EDescriptorHeapType) -> D3D12_DESCRIPTOR_HEAP_TYPE {
    match type_ {
        t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess => {
            D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV
        }
        t12::EDescriptorHeapType::RenderTarget => D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
        t12::EDescriptorHeapType::DepthStencil => D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
    }
}

fn cpuhandled3dtype(handle: t12::SCPUDescriptorHandle) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    D3D12_CPU_DESCRIPTOR_HANDLE { ptr: handle.ptr }
}

fn gpuhandled3dtype(handle: t12::SGPUDescriptorHandle) -> D3D12_GPU_DESCRIPTOR_HANDLE {
    D3D12_GPU_DESCRIPTOR_HANDLE { ptr: handle.ptr }
}

fn sampledescd3dtype() -> dxgitype::DXGI_SAMPLE_DESC {
    dxgitype::DXGI_SAMPLE_DESC {
        Count: 1,
        Quality: 0,
    }
}

// -- removal shows up as one of these from present/signal
fn isdeviceremoved(hn: winerror::HRESULT) -> bool {
    hn == winerror::DXGI_ERROR_DEVICE_REMOVED
        || hn == winerror::DXGI_ERROR_DEVICE_RESET
        || hn == winerror::DXGI_ERROR_DEVICE_HUNG
}
