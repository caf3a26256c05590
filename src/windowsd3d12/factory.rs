use super::*;

use winapi::shared::dxgi::{IDXGIAdapter1, DXGI_ADAPTER_DESC1, DXGI_ADAPTER_FLAG_SOFTWARE, DXGI_SWAP_EFFECT_FLIP_DISCARD};
use winapi::shared::dxgi1_2::{IDXGISwapChain1, DXGI_ALPHA_MODE_UNSPECIFIED, DXGI_SCALING_STRETCH, DXGI_SWAP_CHAIN_DESC1};
use winapi::shared::dxgi1_3::{CreateDXGIFactory2, DXGI_CREATE_FACTORY_DEBUG};
use winapi::shared::dxgi1_4::{IDXGIFactory4, IDXGISwapChain3};
use winapi::shared::minwindef::FALSE;
use winapi::shared::windef::HWND;
use winapi::um::d3d12sdklayers::ID3D12Debug;

pub struct SFactory {
    factory: ComPtr<IDXGIFactory4>,
}

impl SFactory {
    pub fn new(debug: bool) -> Result<Self> {
        let mut rawfactory: *mut IDXGIFactory4 = ptr::null_mut();
        let flags = if debug { DXGI_CREATE_FACTORY_DEBUG } else { 0 };
        let createfactoryresult = unsafe {
            CreateDXGIFactory2(
                flags,
                &IDXGIFactory4::uuidof(),
                &mut rawfactory as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(
            createfactoryresult,
            EError::Initialization("Couldn't get D3D12 factory.")
        );

        Ok(Self {
            factory: unsafe { ComPtr::from_raw(rawfactory) },
        })
    }
}

impl t12::TFactory<SWindowsBackend> for SFactory {
    fn enumadapters(&self, adapteridx: u32) -> Option<SAdapter> {
        let mut rawadapter1: *mut IDXGIAdapter1 = ptr::null_mut();

        let hn = unsafe { self.factory.EnumAdapters1(adapteridx, &mut rawadapter1) };
        if hn == winerror::DXGI_ERROR_NOT_FOUND || !winerror::SUCCEEDED(hn) {
            return None;
        }

        Some(SAdapter {
            adapter: unsafe { ComPtr::from_raw(rawadapter1) },
        })
    }

    fn enabledebuglayer(&self) -> Result<()> {
        let mut rawdebug: *mut ID3D12Debug = ptr::null_mut();
        let hn = unsafe {
            D3D12GetDebugInterface(
                &ID3D12Debug::uuidof(),
                &mut rawdebug as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Initialization("D3D12GetDebugInterface gave an error."));

        let debuginterface: ComPtr<ID3D12Debug> = unsafe { ComPtr::from_raw(rawdebug) };
        unsafe { debuginterface.EnableDebugLayer() };
        Ok(())
    }

    fn createswapchainforsurface(
        &self,
        commandqueue: &SCommandQueue,
        surface: &t12::SSurface,
        buffercount: u32,
        format: t12::EDXGIFormat,
    ) -> Result<SSwapChain> {
        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: surface.width,
            Height: surface.height,
            Format: formatd3dtype(format),
            Stereo: FALSE,
            SampleDesc: sampledescd3dtype(),
            BufferUsage: dxgitype::DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: buffercount,
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: 0,
        };
        let mut rawswapchain: *mut IDXGISwapChain1 = ptr::null_mut();

        let hr = unsafe {
            self.factory.CreateSwapChainForHwnd(
                commandqueue.raw().asunknownptr(),
                surface.handle as HWND,
                &desc,
                ptr::null(),
                ptr::null_mut(),
                &mut rawswapchain,
            )
        };
        returnerrifwinerror!(hr, EError::Initialization("Failed to create swap chain"));

        let swapchain = unsafe { ComPtr::from_raw(rawswapchain) };
        match swapchain.cast::<IDXGISwapChain3>() {
            Ok(sc3) => Ok(unsafe { SSwapChain::new_from_raw(sc3) }),
            Err(_) => Err(EError::Initialization("Swap chain could not be cast to SwapChain3")),
        }
    }
}

pub struct SAdapter {
    adapter: ComPtr<IDXGIAdapter1>,
}

impl t12::TAdapter<SWindowsBackend> for SAdapter {
    fn getdesc(&self) -> t12::SAdapterDesc {
        let mut desc: DXGI_ADAPTER_DESC1 = unsafe { mem::zeroed() };
        let hn = unsafe { self.adapter.GetDesc1(&mut desc) };
        if !winerror::SUCCEEDED(hn) {
            // -- unreadable adapters are treated as unusable
            return t12::SAdapterDesc {
                description: String::new(),
                dedicated_video_memory: 0,
                software: true,
            };
        }

        let namelen = desc.Description.iter().position(|c| *c == 0).unwrap_or(desc.Description.len());
        t12::SAdapterDesc {
            description: String::from_utf16_lossy(&desc.Description[..namelen]),
            dedicated_video_memory: desc.DedicatedVideoMemory,
            software: (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE) != 0,
        }
    }

    fn d3d12createdevice(&self, minfeaturelevel: t12::EFeatureLevel) -> Result<SDevice> {
        let mut rawdevice: *mut ID3D12Device = ptr::null_mut();
        let hn = unsafe {
            D3D12CreateDevice(
                self.adapter.asunknownptr(),
                featureleveld3dtype(minfeaturelevel),
                &ID3D12Device::uuidof(),
                &mut rawdevice as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Initialization("Could not create device on adapter."));

        Ok(unsafe { SDevice::new_from_raw(ComPtr::from_raw(rawdevice)) })
    }
}
