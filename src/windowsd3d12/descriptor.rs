use super::*;

pub struct SDescriptorHeap {
    heap: ComPtr<ID3D12DescriptorHeap>,
}

impl SDescriptorHeap {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12DescriptorHeap>) -> Self {
        Self { heap: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12DescriptorHeap> {
        &self.heap
    }
}

impl t12::TDescriptorHeap for SDescriptorHeap {
    fn getcpudescriptorhandleforheapstart(&self) -> t12::SCPUDescriptorHandle {
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        t12::SCPUDescriptorHandle { ptr: start.ptr }
    }

    fn getgpudescriptorhandleforheapstart(&self) -> t12::SGPUDescriptorHandle {
        let start = unsafe { self.heap.GetGPUDescriptorHandleForHeapStart() };
        t12::SGPUDescriptorHandle { ptr: start.ptr }
    }
}
