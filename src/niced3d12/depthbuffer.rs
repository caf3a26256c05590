use super::*;

use log::debug;

pub struct SDepthBuffer<B: TBackend> {
    resource: B::Resource,
    dsvheap: SDescriptorHeap<B>,
    dsv: t12::SCPUDescriptorHandle,

    format: t12::EDXGIFormat,
    width: u32,
    height: u32,
    clear_depth: f32,
}

impl<B: TBackend> SDepthBuffer<B> {
    pub fn new(
        ctx: &SDeviceContext<B>,
        width: u32,
        height: u32,
        format: t12::EDXGIFormat,
        clear_depth: f32,
    ) -> Result<Self> {
        if !format.is_depth() {
            return Err(EError::Initialization("depth buffer format isn't a depth format"));
        }

        let resource = ctx
            .device()
            .create_committed_depth_texture(width, height, format, clear_depth)?;

        let dsvheap = SDescriptorHeap::create(ctx, t12::EDescriptorHeapType::DepthStencil, 1, false)?;
        let dsv = dsvheap.cpu_handle(0)?;
        ctx.device().create_depth_stencil_view(&resource, format, dsv);

        debug!("Created {}x{} {:?} depth buffer", width, height, format);

        Ok(Self {
            resource,
            dsvheap,
            dsv,
            format,
            width,
            height,
            clear_depth,
        })
    }

    pub fn resource(&self) -> &B::Resource {
        &self.resource
    }

    pub fn dsv(&self) -> t12::SCPUDescriptorHandle {
        self.dsv
    }

    pub fn dsv_heap(&self) -> &SDescriptorHeap<B> {
        &self.dsvheap
    }

    pub fn format(&self) -> t12::EDXGIFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    pub fn clear(&self, list: &mut SCommandList<B>) {
        list.clear_depth_stencil_view(self.dsv, t12::SClearFlags::DEPTH, self.clear_depth, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::EMockGpuMode;

    #[test]
    fn test_depth_buffer_starts_writable() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let depth = SDepthBuffer::new(&ctx, 640, 480, t12::EDXGIFormat::D32Float, 1.0).unwrap();

        assert_eq!(depth.dsv(), depth.dsv_heap().cpu_handle(0).unwrap());
        assert_eq!(
            gpu.resource_state(depth.resource()),
            t12::EResourceStates::DepthWrite
        );
        assert_eq!(depth.clear_depth(), 1.0);
    }

    #[test]
    fn test_colour_format_rejected() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let result = SDepthBuffer::new(&ctx, 64, 64, t12::EDXGIFormat::R8G8B8A8UNorm, 1.0);
        assert!(matches!(result, Err(EError::Initialization(_))));
    }
}
