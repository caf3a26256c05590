use super::*;

pub struct SCommandQueue {
    queue: ComPtr<ID3D12CommandQueue>,
}

impl SCommandQueue {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12CommandQueue>) -> Self {
        Self { queue: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12CommandQueue> {
        &self.queue
    }
}

impl t12::TCommandQueue<SWindowsBackend> for SCommandQueue {
    fn executecommandlist(&self, list: &SCommandList) -> Result<()> {
        unsafe {
            self.queue
                .ExecuteCommandLists(1, &(list.raw().as_raw() as *mut ID3D12CommandList));
        }
        Ok(())
    }

    fn signal(&self, fence: &SFence, val: u64) -> Result<u64> {
        let hn = unsafe { self.queue.Signal(fence.raw().as_raw(), val) };
        if isdeviceremoved(hn) {
            return Err(EError::DeviceLost("Signal failed, device removed."));
        }
        returnerrifwinerror!(hn, EError::Backend("Could not push signal."));

        Ok(val)
    }
}

pub struct SCommandAllocator {
    commandallocator: ComPtr<ID3D12CommandAllocator>,
}

impl SCommandAllocator {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12CommandAllocator>) -> Self {
        Self {
            commandallocator: raw,
        }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12CommandAllocator> {
        &self.commandallocator
    }
}

impl t12::TCommandAllocator for SCommandAllocator {
    fn reset(&self) -> Result<()> {
        let hn = unsafe { self.commandallocator.Reset() };
        returnerrifwinerror!(hn, EError::Backend("Could not reset command allocator."));
        Ok(())
    }
}
