use super::*;

use arrayvec::ArrayVec;
use log::{debug, error};

struct SBackBuffer<B: TBackend> {
    resource: B::Resource,
    rtv: t12::SCPUDescriptorHandle,
}

// -- Owns the swap chain, its back buffers and the RTV heap that views them, slot i viewing
// -- buffer i.
pub struct SSwapChainPresenter<B: TBackend> {
    backbuffers: ArrayVec<SBackBuffer<B>, BACK_BUFFER_COUNT>,
    rtvheap: SDescriptorHeap<B>,
    raw: B::SwapChain,

    format: t12::EDXGIFormat,
    sync_interval: u32,
}

impl<B: TBackend> SSwapChainPresenter<B> {
    pub fn new(
        ctx: &SDeviceContext<B>,
        queue: &B::CommandQueue,
        surface: &t12::SSurface,
        format: t12::EDXGIFormat,
        sync_interval: u32,
    ) -> Result<Self> {
        let raw = ctx.factory().createswapchainforsurface(
            queue,
            surface,
            BACK_BUFFER_COUNT as u32,
            format,
        )?;

        let rtvheap = SDescriptorHeap::create(
            ctx,
            t12::EDescriptorHeapType::RenderTarget,
            BACK_BUFFER_COUNT,
            false,
        )?;

        let mut backbuffers = ArrayVec::new();
        for backbuffidx in 0..BACK_BUFFER_COUNT {
            let resource = raw.getbuffer(backbuffidx)?;
            let rtv = rtvheap.cpu_handle(backbuffidx)?;
            ctx.device().createrendertargetview(&resource, rtv);
            backbuffers.push(SBackBuffer { resource, rtv });
        }

        debug!(
            "Created {}x{} {:?} swap chain with {} buffers",
            surface.width, surface.height, format, BACK_BUFFER_COUNT
        );

        Ok(Self {
            backbuffers,
            rtvheap,
            raw,
            format,
            sync_interval,
        })
    }

    pub fn raw(&self) -> &B::SwapChain {
        &self.raw
    }

    pub fn format(&self) -> t12::EDXGIFormat {
        self.format
    }

    pub fn rtv_heap(&self) -> &SDescriptorHeap<B> {
        &self.rtvheap
    }

    // -- always asked of the swap chain, never predicted
    pub fn current_back_buffer_index(&self) -> usize {
        self.raw.currentbackbufferindex()
    }

    pub fn back_buffer(&self, idx: usize) -> &B::Resource {
        &self.backbuffers[idx].resource
    }

    pub fn render_target_view(&self, idx: usize) -> t12::SCPUDescriptorHandle {
        self.backbuffers[idx].rtv
    }

    // -- returns the index of the buffer that is now current
    pub fn present(&mut self, frame: &SFrameContext) -> Result<usize> {
        debug_assert_eq!(frame.back_buffer_index, self.current_back_buffer_index());

        if let Err(e) = self.raw.present(self.sync_interval, 0) {
            error!("Present failed on frame {}: {}", frame.frame_number, e);
            return Err(e);
        }

        let next = self.current_back_buffer_index();
        debug_assert_ne!(next, frame.back_buffer_index, "swap chain didn't advance");
        Ok(next)
    }
}
