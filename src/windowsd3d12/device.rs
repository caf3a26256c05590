use super::*;

// -- D3D12_ENCODE_SHADER_4_COMPONENT_MAPPING(0, 1, 2, 3)
const DEFAULT_SHADER_4_COMPONENT_MAPPING: u32 = 0x1688;

pub struct SDevice {
    device: ComPtr<ID3D12Device>,
}

impl SDevice {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12Device>) -> Self {
        Self { device: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12Device> {
        &self.device
    }
}

impl t12::TDevice<SWindowsBackend> for SDevice {
    fn createcommandqueue(&self) -> Result<SCommandQueue> {
        let desc = D3D12_COMMAND_QUEUE_DESC {
            Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
            Priority: D3D12_COMMAND_QUEUE_PRIORITY_NORMAL as i32,
            Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
            NodeMask: 0,
        };

        let mut rawqueue: *mut ID3D12CommandQueue = ptr::null_mut();
        let hr = unsafe {
            self.device.CreateCommandQueue(
                &desc,
                &ID3D12CommandQueue::uuidof(),
                &mut rawqueue as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hr, EError::Initialization("Could not create command queue"));

        Ok(unsafe { SCommandQueue::new_from_raw(ComPtr::from_raw(rawqueue)) })
    }

    fn createcommandallocator(&self) -> Result<SCommandAllocator> {
        let mut rawca: *mut ID3D12CommandAllocator = ptr::null_mut();
        let hn = unsafe {
            self.device.CreateCommandAllocator(
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &ID3D12CommandAllocator::uuidof(),
                &mut rawca as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Initialization("Could not create command allocator."));

        Ok(unsafe { SCommandAllocator::new_from_raw(ComPtr::from_raw(rawca)) })
    }

    fn createcommandlist(&self, allocator: &SCommandAllocator) -> Result<SCommandList> {
        let mut rawcl: *mut ID3D12GraphicsCommandList = ptr::null_mut();
        let hn = unsafe {
            self.device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                allocator.raw().as_raw(),
                ptr::null_mut(),
                &ID3D12GraphicsCommandList::uuidof(),
                &mut rawcl as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Initialization("Could not create command list."));

        Ok(unsafe { SCommandList::new_from_raw(ComPtr::from_raw(rawcl)) })
    }

    fn createfence(&self, initialvalue: u64) -> Result<SFence> {
        let mut rawf: *mut ID3D12Fence = ptr::null_mut();
        let hn = unsafe {
            self.device.CreateFence(
                initialvalue,
                D3D12_FENCE_FLAG_NONE,
                &ID3D12Fence::uuidof(),
                &mut rawf as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Initialization("Could not create fence."));

        Ok(unsafe { SFence::new_from_raw(ComPtr::from_raw(rawf)) })
    }

    fn create_descriptor_heap(&self, desc: &t12::SDescriptorHeapDesc) -> Result<SDescriptorHeap> {
        let d3ddesc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: descriptorheaptyped3dtype(desc.type_),
            NumDescriptors: desc.num_descriptors as u32,
            Flags: if desc.flags.contains(t12::SDescriptorHeapFlags::SHADER_VISIBLE) {
                D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            },
            NodeMask: 0,
        };

        let mut rawheap: *mut ID3D12DescriptorHeap = ptr::null_mut();
        let hr = unsafe {
            self.device.CreateDescriptorHeap(
                &d3ddesc,
                &ID3D12DescriptorHeap::uuidof(),
                &mut rawheap as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hr, EError::Backend("Failed to create descriptor heap"));

        Ok(unsafe { SDescriptorHeap::new_from_raw(ComPtr::from_raw(rawheap)) })
    }

    fn getdescriptorhandleincrementsize(&self, type_: t12::EDescriptorHeapType) -> usize {
        unsafe {
            self.device
                .GetDescriptorHandleIncrementSize(descriptorheaptyped3dtype(type_)) as usize
        }
    }

    fn createrendertargetview(&self, resource: &SResource, destdescriptor: t12::SCPUDescriptorHandle) {
        unsafe {
            self.device.CreateRenderTargetView(
                resource.raw().as_raw(),
                ptr::null(),
                cpuhandled3dtype(destdescriptor),
            );
        }
    }

    fn create_depth_stencil_view(
        &self,
        resource: &SResource,
        format: t12::EDXGIFormat,
        destdescriptor: t12::SCPUDescriptorHandle,
    ) {
        unsafe {
            let mut d3ddesc = D3D12_DEPTH_STENCIL_VIEW_DESC {
                Format: formatd3dtype(format),
                ViewDimension: D3D12_DSV_DIMENSION_TEXTURE2D,
                Flags: D3D12_DSV_FLAG_NONE,
                u: mem::zeroed(),
            };
            *d3ddesc.u.Texture2D_mut() = D3D12_TEX2D_DSV { MipSlice: 0 };

            self.device.CreateDepthStencilView(
                resource.raw().as_raw(),
                &d3ddesc,
                cpuhandled3dtype(destdescriptor),
            );
        }
    }

    fn create_committed_depth_texture(
        &self,
        width: u32,
        height: u32,
        format: t12::EDXGIFormat,
        clear_depth: f32,
    ) -> Result<SResource> {
        let heapproperties = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
            MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
        };

        let resourcedesc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
            Alignment: 0,
            Width: width as u64,
            Height: height,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: formatd3dtype(format),
            SampleDesc: sampledescd3dtype(),
            Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
        };

        unsafe {
            let mut clearvalue = D3D12_CLEAR_VALUE {
                Format: formatd3dtype(format),
                u: mem::zeroed(),
            };
            *clearvalue.u.DepthStencil_mut() = D3D12_DEPTH_STENCIL_VALUE {
                Depth: clear_depth,
                Stencil: 0,
            };

            let mut rawresource: *mut ID3D12Resource = ptr::null_mut();
            let hn = self.device.CreateCommittedResource(
                &heapproperties,
                D3D12_HEAP_FLAG_NONE,
                &resourcedesc,
                D3D12_RESOURCE_STATE_DEPTH_WRITE,
                &clearvalue,
                &ID3D12Resource::uuidof(),
                &mut rawresource as *mut *mut _ as *mut *mut c_void,
            );
            returnerrifwinerror!(hn, EError::Backend("Could not create committed resource."));

            Ok(SResource::new_from_raw(ComPtr::from_raw(rawresource)))
        }
    }

    fn create_committed_upload_buffer(&self, size_in_bytes: usize) -> Result<SResource> {
        let heapproperties = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_UPLOAD,
            CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
            MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
        };

        let resourcedesc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: size_in_bytes as u64,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: dxgiformat::DXGI_FORMAT_UNKNOWN,
            SampleDesc: sampledescd3dtype(),
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };

        let mut rawresource: *mut ID3D12Resource = ptr::null_mut();
        let hn = unsafe {
            self.device.CreateCommittedResource(
                &heapproperties,
                D3D12_HEAP_FLAG_NONE,
                &resourcedesc,
                D3D12_RESOURCE_STATE_GENERIC_READ,
                ptr::null(),
                &ID3D12Resource::uuidof(),
                &mut rawresource as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hn, EError::Backend("Could not create upload buffer."));

        Ok(unsafe { SResource::new_from_raw(ComPtr::from_raw(rawresource)) })
    }

    fn create_shader_resource_view(
        &self,
        resource: &SResource,
        desc: &t12::SShaderResourceViewDesc,
        destdescriptor: t12::SCPUDescriptorHandle,
    ) {
        unsafe {
            let mut d3ddesc = D3D12_SHADER_RESOURCE_VIEW_DESC {
                Format: formatd3dtype(desc.format),
                ViewDimension: D3D12_SRV_DIMENSION_UNKNOWN,
                Shader4ComponentMapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
                u: mem::zeroed(),
            };

            match desc.view {
                t12::ESRV::Texture2D { mip_levels } => {
                    d3ddesc.ViewDimension = D3D12_SRV_DIMENSION_TEXTURE2D;
                    *d3ddesc.u.Texture2D_mut() = D3D12_TEX2D_SRV {
                        MostDetailedMip: 0,
                        MipLevels: mip_levels,
                        PlaneSlice: 0,
                        ResourceMinLODClamp: 0.0,
                    };
                }
                t12::ESRV::Buffer {
                    first_element,
                    num_elements,
                    structure_byte_stride,
                } => {
                    d3ddesc.ViewDimension = D3D12_SRV_DIMENSION_BUFFER;
                    *d3ddesc.u.Buffer_mut() = D3D12_BUFFER_SRV {
                        FirstElement: first_element,
                        NumElements: num_elements,
                        StructureByteStride: structure_byte_stride,
                        Flags: D3D12_BUFFER_SRV_FLAG_NONE,
                    };
                }
            }

            self.device.CreateShaderResourceView(
                resource.raw().as_raw(),
                &d3ddesc,
                cpuhandled3dtype(destdescriptor),
            );
        }
    }

    fn create_root_signature(&self, serialized_blob: &[u8]) -> Result<SRootSignature> {
        let mut rawrs: *mut ID3D12RootSignature = ptr::null_mut();
        let hr = unsafe {
            self.device.CreateRootSignature(
                0,
                serialized_blob.as_ptr() as *const c_void,
                serialized_blob.len(),
                &ID3D12RootSignature::uuidof(),
                &mut rawrs as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hr, EError::Backend("Could not create root signature"));

        Ok(unsafe { SRootSignature::new_from_raw(ComPtr::from_raw(rawrs)) })
    }

    fn create_graphics_pipeline_state(
        &self,
        desc: &t12::SGraphicsPipelineStateDesc<'_, SWindowsBackend>,
    ) -> Result<SPipelineState> {
        let (d3ddesc, _input_elements) = pipelinestate::graphicspipelinestatedesc(desc);

        let mut rawpso: *mut ID3D12PipelineState = ptr::null_mut();
        let hr = unsafe {
            self.device.CreateGraphicsPipelineState(
                &d3ddesc,
                &ID3D12PipelineState::uuidof(),
                &mut rawpso as *mut *mut _ as *mut *mut c_void,
            )
        };
        returnerrifwinerror!(hr, EError::Backend("Could not create pipeline state"));

        Ok(unsafe { SPipelineState::new_from_raw(ComPtr::from_raw(rawpso)) })
    }
}
