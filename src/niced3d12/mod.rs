mod buffer;
mod commandlist;
mod commandqueue;
mod depthbuffer;
mod descriptor;
mod descriptorallocator;
mod device;
mod fence;
mod frame;
mod swapchain;
mod transition;

use crate::errors::{EError, Result};
use crate::typeyd3d12 as t12;
use crate::typeyd3d12::{
    TAdapter, TBackend, TCommandAllocator, TCommandList, TCommandQueue, TDescriptorHeap, TDevice,
    TEvent, TFactory, TFence, TResource, TSwapChain,
};

// -- the swap chain ring depth, and so the number of frames that can be in flight
pub const BACK_BUFFER_COUNT: usize = 2;

pub use self::buffer::SBufferResource;
pub use self::commandlist::SCommandList;
pub use self::commandqueue::SCommandSubmissionUnit;
pub use self::depthbuffer::SDepthBuffer;
pub use self::descriptor::{SDescriptorHandlePair, SDescriptorHeap};
pub use self::descriptorallocator::SDescriptorAllocator;
pub use self::device::SDeviceContext;
pub use self::fence::{EFenceState, SFrameFence};
pub use self::frame::SFrameContext;
pub use self::swapchain::SSwapChainPresenter;
pub use self::transition::SResourceTransitionTracker;

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::mockd3d12::{EMockGpuMode, SMockBackend, SMockFactory, SMockGpu};
    use crate::typeyd3d12::EFeatureLevel;

    use super::SDeviceContext;

    pub fn mock_context(mode: EMockGpuMode) -> (SMockGpu, SDeviceContext<SMockBackend>) {
        let _ = env_logger::builder().is_test(true).try_init();

        let gpu = SMockGpu::new(mode);
        let ctx = SDeviceContext::initialize(SMockFactory::new(&gpu), EFeatureLevel::Level12_0, false)
            .unwrap();
        (gpu, ctx)
    }
}
