use super::*;

use arrayvec::ArrayVec;
use winapi::shared::minwindef::FALSE;
use winapi::shared::windef::RECT;

pub struct SCommandList {
    commandlist: ComPtr<ID3D12GraphicsCommandList>,
}

impl SCommandList {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12GraphicsCommandList>) -> Self {
        Self { commandlist: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12GraphicsCommandList> {
        &self.commandlist
    }
}

impl t12::TCommandList<SWindowsBackend> for SCommandList {
    fn reset(&self, commandallocator: &SCommandAllocator) -> Result<()> {
        let hn = unsafe {
            self.commandlist
                .Reset(commandallocator.raw().as_raw(), ptr::null_mut())
        };
        returnerrifwinerror!(hn, EError::Backend("Could not reset command list."));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let hn = unsafe { self.commandlist.Close() };
        returnerrifwinerror!(hn, EError::Backend("Could not close command list."));
        Ok(())
    }

    fn resourcebarrier(
        &self,
        resource: &SResource,
        beforestate: t12::EResourceStates,
        afterstate: t12::EResourceStates,
    ) {
        unsafe {
            let mut barrier = D3D12_RESOURCE_BARRIER {
                Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
                Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
                u: mem::zeroed(),
            };

            *barrier.u.Transition_mut() = D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: resource.raw().as_raw(),
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: resourcestated3dtype(beforestate),
                StateAfter: resourcestated3dtype(afterstate),
            };

            self.commandlist.ResourceBarrier(1, &barrier);
        }
    }

    fn clearrendertargetview(&self, descriptor: t12::SCPUDescriptorHandle, colour: &[f32; 4]) {
        unsafe {
            self.commandlist.ClearRenderTargetView(
                cpuhandled3dtype(descriptor),
                colour.as_ptr(),
                0,
                ptr::null(),
            );
        }
    }

    fn clear_depth_stencil_view(
        &self,
        descriptor: t12::SCPUDescriptorHandle,
        flags: t12::SClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        let mut d3dflags = 0;
        if flags.contains(t12::SClearFlags::DEPTH) {
            d3dflags |= D3D12_CLEAR_FLAG_DEPTH;
        }
        if flags.contains(t12::SClearFlags::STENCIL) {
            d3dflags |= D3D12_CLEAR_FLAG_STENCIL;
        }

        unsafe {
            self.commandlist.ClearDepthStencilView(
                cpuhandled3dtype(descriptor),
                d3dflags,
                depth,
                stencil,
                0,
                ptr::null(),
            );
        }
    }

    fn om_set_render_targets(
        &self,
        render_target_descriptors: &[t12::SCPUDescriptorHandle],
        depth_target_descriptor: Option<t12::SCPUDescriptorHandle>,
    ) {
        let rtvs: ArrayVec<D3D12_CPU_DESCRIPTOR_HANDLE, { t12::MAX_RENDER_TARGETS }> = render_target_descriptors
            .iter()
            .map(|handle| cpuhandled3dtype(*handle))
            .collect();
        let dsv = depth_target_descriptor.map(cpuhandled3dtype);
        let dsv_ptr = dsv.as_ref().map_or(ptr::null(), |handle| handle as *const _);

        unsafe {
            self.commandlist.OMSetRenderTargets(
                rtvs.len() as u32,
                rtvs.as_ptr(),
                FALSE,
                dsv_ptr,
            );
        }
    }

    fn rs_set_viewports(&self, viewports: &[t12::SViewport]) {
        let d3dviewports: ArrayVec<D3D12_VIEWPORT, { t12::MAX_VIEWPORTS }> = viewports
            .iter()
            .map(|vp| D3D12_VIEWPORT {
                TopLeftX: vp.top_left_x,
                TopLeftY: vp.top_left_y,
                Width: vp.width,
                Height: vp.height,
                MinDepth: vp.min_depth,
                MaxDepth: vp.max_depth,
            })
            .collect();

        unsafe {
            self.commandlist
                .RSSetViewports(d3dviewports.len() as u32, d3dviewports.as_ptr());
        }
    }

    fn rs_set_scissor_rects(&self, scissor_rects: &[t12::SRect]) {
        let d3drects: ArrayVec<RECT, { t12::MAX_VIEWPORTS }> = scissor_rects
            .iter()
            .map(|rect| RECT {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
            })
            .collect();

        unsafe {
            self.commandlist
                .RSSetScissorRects(d3drects.len() as u32, d3drects.as_ptr());
        }
    }

    fn set_descriptor_heaps(&self, heaps: &[&SDescriptorHeap]) {
        let rawheaps: ArrayVec<*mut ID3D12DescriptorHeap, { t12::MAX_BOUND_DESCRIPTOR_HEAPS }> =
            heaps.iter().map(|heap| unsafe { heap.raw().as_raw() }).collect();

        unsafe {
            self.commandlist
                .SetDescriptorHeaps(rawheaps.len() as u32, rawheaps.as_ptr());
        }
    }

    fn set_pipeline_state(&self, pipeline_state: &SPipelineState) {
        unsafe {
            self.commandlist.SetPipelineState(pipeline_state.raw().as_raw());
        }
    }

    fn set_graphics_root_signature(&self, root_signature: &SRootSignature) {
        unsafe {
            self.commandlist
                .SetGraphicsRootSignature(root_signature.raw().as_raw());
        }
    }

    fn set_graphics_root_descriptor_table(
        &self,
        root_parameter_index: u32,
        base: t12::SGPUDescriptorHandle,
    ) {
        unsafe {
            self.commandlist
                .SetGraphicsRootDescriptorTable(root_parameter_index, gpuhandled3dtype(base));
        }
    }

    fn set_graphics_root_constant_buffer_view(&self, root_parameter_index: u32, buffer_location: u64) {
        unsafe {
            self.commandlist
                .SetGraphicsRootConstantBufferView(root_parameter_index, buffer_location);
        }
    }

    fn ia_set_primitive_topology(&self, primitive_topology: t12::EPrimitiveTopology) {
        let d3dtopology = match primitive_topology {
            t12::EPrimitiveTopology::PointList => d3dcommon::D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
            t12::EPrimitiveTopology::LineList => d3dcommon::D3D_PRIMITIVE_TOPOLOGY_LINELIST,
            t12::EPrimitiveTopology::TriangleList => d3dcommon::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
            t12::EPrimitiveTopology::TriangleStrip => d3dcommon::D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        };

        unsafe {
            self.commandlist.IASetPrimitiveTopology(d3dtopology);
        }
    }

    fn ia_set_vertex_buffers(&self, start_slot: u32, vertex_buffers: &[t12::SVertexBufferView]) {
        let d3dviews: ArrayVec<D3D12_VERTEX_BUFFER_VIEW, { t12::MAX_VERTEX_BUFFERS }> = vertex_buffers
            .iter()
            .map(|vbv| D3D12_VERTEX_BUFFER_VIEW {
                BufferLocation: vbv.buffer_location,
                SizeInBytes: vbv.size_in_bytes,
                StrideInBytes: vbv.stride_in_bytes,
            })
            .collect();

        unsafe {
            self.commandlist
                .IASetVertexBuffers(start_slot, d3dviews.len() as u32, d3dviews.as_ptr());
        }
    }

    fn ia_set_index_buffer(&self, index_buffer: &t12::SIndexBufferView) {
        let d3dview = D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: index_buffer.buffer_location,
            SizeInBytes: index_buffer.size_in_bytes,
            Format: formatd3dtype(index_buffer.format),
        };

        unsafe {
            self.commandlist.IASetIndexBuffer(&d3dview);
        }
    }

    fn draw_instanced(
        &self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    ) {
        unsafe {
            self.commandlist.DrawInstanced(
                vertex_count_per_instance,
                instance_count,
                start_vertex_location,
                start_instance_location,
            );
        }
    }

    fn draw_indexed_instanced(
        &self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) {
        unsafe {
            self.commandlist.DrawIndexedInstanced(
                index_count_per_instance,
                instance_count,
                start_index_location,
                base_vertex_location,
                start_instance_location,
            );
        }
    }
}
