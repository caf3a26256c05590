use super::*;

use winapi::shared::dxgi1_4::IDXGISwapChain3;

pub struct SSwapChain {
    swapchain: ComPtr<IDXGISwapChain3>,
}

impl SSwapChain {
    pub unsafe fn new_from_raw(raw: ComPtr<IDXGISwapChain3>) -> Self {
        Self { swapchain: raw }
    }
}

impl t12::TSwapChain<SWindowsBackend> for SSwapChain {
    fn currentbackbufferindex(&self) -> usize {
        unsafe { self.swapchain.GetCurrentBackBufferIndex() as usize }
    }

    fn getbuffer(&self, idx: usize) -> Result<SResource> {
        let mut rawbuf: *mut ID3D12Resource = ptr::null_mut();
        let hn = unsafe {
            self.swapchain.GetBuffer(
                idx as u32,
                &ID3D12Resource::uuidof(),
                &mut rawbuf as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(
            hn,
            EError::Initialization("Couldn't get ID3D12Resource for backbuffer from swapchain.")
        );

        Ok(unsafe { SResource::new_from_raw(ComPtr::from_raw(rawbuf)) })
    }

    fn present(&self, syncinterval: u32, flags: u32) -> Result<()> {
        let hr = unsafe { self.swapchain.Present(syncinterval, flags) };
        if isdeviceremoved(hr) {
            return Err(EError::DeviceLost("Present failed, device removed."));
        }
        returnerrifwinerror!(hr, EError::Backend("Couldn't present to swap chain."));
        Ok(())
    }
}
