use super::*;

use log::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SDescriptorHandlePair {
    pub cpu: t12::SCPUDescriptorHandle,
    pub gpu: Option<t12::SGPUDescriptorHandle>,
}

// -- Fixed capacity pool of views. Slot handles are base + index * stride, with the stride
// -- read once from the device context. The heap doesn't know which slots are in use, see
// -- SDescriptorAllocator for that.
pub struct SDescriptorHeap<B: TBackend> {
    raw: B::DescriptorHeap,

    type_: t12::EDescriptorHeapType,
    numdescriptors: usize,
    descriptorsize: usize,
    cpu_start: t12::SCPUDescriptorHandle,
    gpu_start: Option<t12::SGPUDescriptorHandle>,
}

impl<B: TBackend> SDescriptorHeap<B> {
    pub fn create(
        ctx: &SDeviceContext<B>,
        type_: t12::EDescriptorHeapType,
        numdescriptors: usize,
        shader_visible: bool,
    ) -> Result<Self> {
        if shader_visible && !type_.can_be_shader_visible() {
            return Err(EError::InvalidHeapVisibility(type_));
        }
        debug_assert!(numdescriptors > 0, "empty descriptor heap");

        let flags = if shader_visible {
            t12::SDescriptorHeapFlags::SHADER_VISIBLE
        } else {
            t12::SDescriptorHeapFlags::empty()
        };

        let desc = t12::SDescriptorHeapDesc {
            type_,
            num_descriptors: numdescriptors,
            flags,
        };

        let raw = ctx.device().create_descriptor_heap(&desc)?;
        let cpu_start = raw.getcpudescriptorhandleforheapstart();
        let gpu_start = if shader_visible {
            Some(raw.getgpudescriptorhandleforheapstart())
        } else {
            None
        };

        debug!(
            "Created {:?} descriptor heap with {} slots (shader visible: {})",
            type_, numdescriptors, shader_visible
        );

        Ok(Self {
            raw,
            type_,
            numdescriptors,
            descriptorsize: ctx.descriptor_increment_size(type_),
            cpu_start,
            gpu_start,
        })
    }

    pub fn raw(&self) -> &B::DescriptorHeap {
        &self.raw
    }

    pub fn type_(&self) -> t12::EDescriptorHeapType {
        self.type_
    }

    pub fn capacity(&self) -> usize {
        self.numdescriptors
    }

    pub fn descriptor_size(&self) -> usize {
        self.descriptorsize
    }

    pub fn is_shader_visible(&self) -> bool {
        self.gpu_start.is_some()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.numdescriptors {
            Ok(())
        } else {
            Err(EError::DescriptorIndexOutOfRange {
                type_: self.type_,
                index,
                capacity: self.numdescriptors,
            })
        }
    }

    pub fn cpu_handle(&self, index: usize) -> Result<t12::SCPUDescriptorHandle> {
        self.check_index(index)?;
        Ok(self.cpu_start.offset(index * self.descriptorsize))
    }

    pub fn gpu_handle(&self, index: usize) -> Result<t12::SGPUDescriptorHandle> {
        self.check_index(index)?;
        match self.gpu_start {
            Some(start) => Ok(start.offset(index * self.descriptorsize)),
            None => Err(EError::HeapNotShaderVisible(self.type_)),
        }
    }

    pub fn handle_at(&self, index: usize) -> Result<SDescriptorHandlePair> {
        self.check_index(index)?;
        Ok(SDescriptorHandlePair {
            cpu: self.cpu_start.offset(index * self.descriptorsize),
            gpu: self.gpu_start.map(|start| start.offset(index * self.descriptorsize)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::mockd3d12::EMockGpuMode;

    #[test]
    fn test_handles_injective_and_stable() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let heap = SDescriptorHeap::create(
            &ctx,
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            64,
            true,
        )
        .unwrap();

        let mut cpu_seen = HashSet::new();
        let mut gpu_seen = HashSet::new();
        for i in 0..heap.capacity() {
            let pair = heap.handle_at(i).unwrap();
            assert!(cpu_seen.insert(pair.cpu));
            assert!(gpu_seen.insert(pair.gpu.unwrap()));

            assert_eq!(heap.handle_at(i).unwrap(), pair);
            assert_eq!(heap.cpu_handle(i).unwrap(), pair.cpu);
            assert_eq!(heap.gpu_handle(i).unwrap(), pair.gpu.unwrap());
        }
    }

    #[test]
    fn test_stride_matches_device_increment() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let heap =
            SDescriptorHeap::create(&ctx, t12::EDescriptorHeapType::DepthStencil, 3, false).unwrap();

        let stride = ctx.descriptor_increment_size(t12::EDescriptorHeapType::DepthStencil);
        let start = heap.cpu_handle(0).unwrap();
        assert_eq!(heap.cpu_handle(2).unwrap().ptr, start.ptr + 2 * stride);
    }

    #[test]
    fn test_index_past_capacity_fails() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let heap = SDescriptorHeap::create(
            &ctx,
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            4,
            true,
        )
        .unwrap();

        assert!(heap.handle_at(3).is_ok());
        match heap.handle_at(4) {
            Err(EError::DescriptorIndexOutOfRange { index, capacity, .. }) => {
                assert_eq!(index, 4);
                assert_eq!(capacity, 4);
            }
            _ => panic!("expected DescriptorIndexOutOfRange"),
        }
        assert!(heap.cpu_handle(4).is_err());
        assert!(heap.gpu_handle(4).is_err());
    }

    #[test]
    fn test_rtv_and_dsv_never_shader_visible() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);

        for type_ in [
            t12::EDescriptorHeapType::RenderTarget,
            t12::EDescriptorHeapType::DepthStencil,
        ]
        .iter()
        {
            match SDescriptorHeap::create(&ctx, *type_, 2, true) {
                Err(EError::InvalidHeapVisibility(t)) => assert_eq!(t, *type_),
                _ => panic!("expected InvalidHeapVisibility"),
            }

            let heap = SDescriptorHeap::create(&ctx, *type_, 2, false).unwrap();
            assert!(!heap.is_shader_visible());
            assert!(heap.handle_at(1).unwrap().gpu.is_none());
            assert!(matches!(heap.gpu_handle(1), Err(EError::HeapNotShaderVisible(_))));
        }
    }

    #[test]
    fn test_heaps_do_not_overlap() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let a = SDescriptorHeap::create(&ctx, t12::EDescriptorHeapType::RenderTarget, 8, false)
            .unwrap();
        let b = SDescriptorHeap::create(&ctx, t12::EDescriptorHeapType::RenderTarget, 8, false)
            .unwrap();

        let a_handles: HashSet<_> = (0..8).map(|i| a.cpu_handle(i).unwrap()).collect();
        assert!((0..8).all(|i| !a_handles.contains(&b.cpu_handle(i).unwrap())));
    }
}
