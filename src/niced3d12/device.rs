use super::*;

use log::{debug, info, warn};

// -- Owns the factory, the chosen adapter and the logical device. Everything else borrows the
// -- device from here and it is never mutated after initialize().
pub struct SDeviceContext<B: TBackend> {
    device: B::Device,
    adapter: B::Adapter,
    adapter_desc: t12::SAdapterDesc,
    feature_level: t12::EFeatureLevel,
    descriptor_sizes: [usize; t12::EDescriptorHeapType::COUNT],
    factory: B::Factory,
}

impl<B: TBackend> SDeviceContext<B> {
    pub fn initialize(
        factory: B::Factory,
        min_feature_level: t12::EFeatureLevel,
        debug_layer: bool,
    ) -> Result<Self> {
        if debug_layer {
            factory.enabledebuglayer()?;
            info!("Enabled debug layer");
        }

        let mut adapteridx = 0;
        while let Some(adapter) = factory.enumadapters(adapteridx) {
            adapteridx += 1;

            let adapter_desc = adapter.getdesc();
            if adapter_desc.software {
                debug!("Skipping software adapter '{}'", adapter_desc.description);
                continue;
            }

            let device = match adapter.d3d12createdevice(min_feature_level) {
                Ok(device) => device,
                Err(e) => {
                    debug!(
                        "Adapter '{}' can't create a {:?} device: {}",
                        adapter_desc.description, min_feature_level, e
                    );
                    continue;
                }
            };

            let mut descriptor_sizes = [0; t12::EDescriptorHeapType::COUNT];
            for type_ in t12::EDescriptorHeapType::all().iter() {
                descriptor_sizes[type_.index()] = device.getdescriptorhandleincrementsize(*type_);
            }

            info!(
                "Created {:?} device on adapter '{}' ({} MB dedicated)",
                min_feature_level,
                adapter_desc.description,
                adapter_desc.dedicated_video_memory / (1024 * 1024)
            );

            return Ok(Self {
                device,
                adapter,
                adapter_desc,
                feature_level: min_feature_level,
                descriptor_sizes,
                factory,
            });
        }

        warn!(
            "None of {} adapters supports {:?}",
            adapteridx, min_feature_level
        );
        Err(EError::NoQualifyingAdapter(min_feature_level))
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn adapter(&self) -> &B::Adapter {
        &self.adapter
    }

    pub fn adapter_desc(&self) -> &t12::SAdapterDesc {
        &self.adapter_desc
    }

    pub fn feature_level(&self) -> t12::EFeatureLevel {
        self.feature_level
    }

    // -- only swap chain creation needs this
    pub fn factory(&self) -> &B::Factory {
        &self.factory
    }

    pub fn descriptor_increment_size(&self, type_: t12::EDescriptorHeapType) -> usize {
        self.descriptor_sizes[type_.index()]
    }

    pub fn create_shader_resource_view(
        &self,
        resource: &B::Resource,
        desc: &t12::SShaderResourceViewDesc,
        heap: &SDescriptorHeap<B>,
        index: usize,
    ) -> Result<()> {
        if heap.type_() != t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess {
            return Err(EError::Backend("shader resource views go in a CBV/SRV/UAV heap"));
        }
        let destdescriptor = heap.cpu_handle(index)?;
        self.device
            .create_shader_resource_view(resource, desc, destdescriptor);
        Ok(())
    }

    pub fn create_root_signature(&self, serialized_blob: &[u8]) -> Result<B::RootSignature> {
        self.device.create_root_signature(serialized_blob)
    }

    pub fn create_graphics_pipeline_state(
        &self,
        desc: &t12::SGraphicsPipelineStateDesc<'_, B>,
    ) -> Result<B::PipelineState> {
        debug_assert!(!desc.vertex_shader.is_empty(), "pipeline state without vertex shader");
        self.device.create_graphics_pipeline_state(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockGpuMode, SMockAdapterInfo, SMockBackend, SMockFactory, SMockGpu};

    fn adapter(description: &str, software: bool, level: t12::EFeatureLevel) -> SMockAdapterInfo {
        SMockAdapterInfo {
            description: description.to_string(),
            software,
            max_feature_level: level,
            dedicated_video_memory: 256 * 1024 * 1024,
        }
    }

    #[test]
    fn test_picks_first_qualifying_hardware_adapter() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let factory = SMockFactory::with_adapters(
            &gpu,
            vec![
                adapter("warp", true, t12::EFeatureLevel::Level12_2),
                adapter("old", false, t12::EFeatureLevel::Level11_1),
                adapter("first good", false, t12::EFeatureLevel::Level12_1),
                adapter("second good", false, t12::EFeatureLevel::Level12_2),
            ],
        );

        let ctx =
            SDeviceContext::<SMockBackend>::initialize(factory, t12::EFeatureLevel::Level12_0, false)
                .unwrap();
        assert_eq!(ctx.adapter_desc().description, "first good");
        assert_eq!(ctx.feature_level(), t12::EFeatureLevel::Level12_0);
    }

    #[test]
    fn test_no_qualifying_adapter_is_fatal() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let factory = SMockFactory::with_adapters(
            &gpu,
            vec![
                adapter("warp", true, t12::EFeatureLevel::Level12_2),
                adapter("old", false, t12::EFeatureLevel::Level11_0),
            ],
        );

        let result =
            SDeviceContext::<SMockBackend>::initialize(factory, t12::EFeatureLevel::Level12_0, false);
        match result {
            Err(EError::NoQualifyingAdapter(level)) => {
                assert_eq!(level, t12::EFeatureLevel::Level12_0)
            }
            _ => panic!("expected NoQualifyingAdapter"),
        }
    }

    #[test]
    fn test_descriptor_sizes_cached_per_type() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        for type_ in t12::EDescriptorHeapType::all().iter() {
            assert_eq!(
                ctx.descriptor_increment_size(*type_),
                ctx.device().getdescriptorhandleincrementsize(*type_)
            );
            assert!(ctx.descriptor_increment_size(*type_) > 0);
        }
    }

    #[test]
    fn test_debug_layer_enabled_before_device() {
        let gpu = SMockGpu::new(EMockGpuMode::Manual);
        let _ctx = SDeviceContext::<SMockBackend>::initialize(
            SMockFactory::new(&gpu),
            t12::EFeatureLevel::Level12_0,
            true,
        )
        .unwrap();
        assert!(gpu.debug_layer_enabled());
    }
}
