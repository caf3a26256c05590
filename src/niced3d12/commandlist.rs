use super::*;

use arrayvec::ArrayVec;

// -- Recording handle. Calls are forwarded unchecked; the only thing tracked here is whether
// -- the list is open, since recording into a closed list is a programmer error.
pub struct SCommandList<B: TBackend> {
    raw: B::CommandList,
    open: bool,
}

impl<B: TBackend> SCommandList<B> {
    // -- lists come out of the device open
    pub fn new_from_raw(raw: B::CommandList) -> Self {
        Self { raw, open: true }
    }

    pub fn raw(&self) -> &B::CommandList {
        &self.raw
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    #[inline]
    fn assert_recording(&self) {
        debug_assert!(self.open, "recording into a closed command list");
    }

    pub fn reset(&mut self, allocator: &B::CommandAllocator) -> Result<()> {
        debug_assert!(!self.open, "resetting a command list that is still recording");
        self.raw.reset(allocator)?;
        self.open = true;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        debug_assert!(self.open, "closing a command list twice");
        self.raw.close()?;
        self.open = false;
        Ok(())
    }

    pub fn resource_barrier(
        &mut self,
        resource: &B::Resource,
        beforestate: t12::EResourceStates,
        afterstate: t12::EResourceStates,
    ) {
        self.assert_recording();
        self.raw.resourcebarrier(resource, beforestate, afterstate);
    }

    pub fn clear_render_target_view(
        &mut self,
        rtvdescriptor: t12::SCPUDescriptorHandle,
        colour: &[f32; 4],
    ) {
        self.assert_recording();
        self.raw.clearrendertargetview(rtvdescriptor, colour);
    }

    pub fn clear_depth_stencil_view(
        &mut self,
        dsv_descriptor: t12::SCPUDescriptorHandle,
        flags: t12::SClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.assert_recording();
        self.raw.clear_depth_stencil_view(dsv_descriptor, flags, depth, stencil);
    }

    pub fn om_set_render_targets(
        &mut self,
        render_target_descriptors: &[t12::SCPUDescriptorHandle],
        depth_target_descriptor: Option<t12::SCPUDescriptorHandle>,
    ) {
        self.assert_recording();
        debug_assert!(
            render_target_descriptors.len() <= t12::MAX_RENDER_TARGETS,
            "at most {} render targets can be bound, got {}",
            t12::MAX_RENDER_TARGETS,
            render_target_descriptors.len()
        );
        self.raw
            .om_set_render_targets(render_target_descriptors, depth_target_descriptor);
    }

    pub fn rs_set_viewports(&mut self, viewports: &[t12::SViewport]) {
        self.assert_recording();
        debug_assert!(
            viewports.len() <= t12::MAX_VIEWPORTS,
            "at most {} viewports can be bound, got {}",
            t12::MAX_VIEWPORTS,
            viewports.len()
        );
        self.raw.rs_set_viewports(viewports);
    }

    pub fn rs_set_scissor_rects(&mut self, scissor_rects: &[t12::SRect]) {
        self.assert_recording();
        debug_assert!(
            scissor_rects.len() <= t12::MAX_VIEWPORTS,
            "at most {} scissor rects can be bound, got {}",
            t12::MAX_VIEWPORTS,
            scissor_rects.len()
        );
        self.raw.rs_set_scissor_rects(scissor_rects);
    }

    pub fn set_descriptor_heaps(&mut self, heaps: &[&SDescriptorHeap<B>]) {
        self.assert_recording();
        debug_assert!(
            heaps.iter().all(|heap| heap.is_shader_visible()),
            "only shader visible heaps can be bound"
        );
        // -- one CBV/SRV/UAV heap and one sampler heap
        debug_assert!(
            heaps.len() <= t12::MAX_BOUND_DESCRIPTOR_HEAPS,
            "at most {} descriptor heaps can be bound, got {}",
            t12::MAX_BOUND_DESCRIPTOR_HEAPS,
            heaps.len()
        );

        let mut raw_heaps = ArrayVec::<&B::DescriptorHeap, { t12::MAX_BOUND_DESCRIPTOR_HEAPS }>::new();
        for heap in heaps {
            raw_heaps.push(heap.raw());
        }

        self.raw.set_descriptor_heaps(&raw_heaps[..]);
    }

    pub fn set_pipeline_state(&mut self, pipeline_state: &B::PipelineState) {
        self.assert_recording();
        self.raw.set_pipeline_state(pipeline_state);
    }

    pub fn set_graphics_root_signature(&mut self, root_signature: &B::RootSignature) {
        self.assert_recording();
        self.raw.set_graphics_root_signature(root_signature);
    }

    pub fn set_graphics_root_descriptor_table(
        &mut self,
        root_parameter_index: u32,
        base_descriptor: t12::SGPUDescriptorHandle,
    ) {
        self.assert_recording();
        self.raw
            .set_graphics_root_descriptor_table(root_parameter_index, base_descriptor);
    }

    pub fn set_graphics_root_constant_buffer_view(
        &mut self,
        root_parameter_index: u32,
        buffer_location: u64,
    ) {
        self.assert_recording();
        self.raw
            .set_graphics_root_constant_buffer_view(root_parameter_index, buffer_location);
    }

    pub fn ia_set_primitive_topology(&mut self, primitive_topology: t12::EPrimitiveTopology) {
        self.assert_recording();
        self.raw.ia_set_primitive_topology(primitive_topology);
    }

    pub fn ia_set_vertex_buffers(&mut self, start_slot: u32, vertex_buffers: &[t12::SVertexBufferView]) {
        self.assert_recording();
        debug_assert!(
            start_slot as usize + vertex_buffers.len() <= t12::MAX_VERTEX_BUFFERS,
            "vertex buffer slots end at {}, got {} from slot {}",
            t12::MAX_VERTEX_BUFFERS,
            vertex_buffers.len(),
            start_slot
        );
        self.raw.ia_set_vertex_buffers(start_slot, vertex_buffers);
    }

    pub fn ia_set_index_buffer(&mut self, index_buffer: &t12::SIndexBufferView) {
        self.assert_recording();
        debug_assert!(
            index_buffer.format.index_size_in_bytes().is_some(),
            "{:?} isn't an index format",
            index_buffer.format
        );
        self.raw.ia_set_index_buffer(index_buffer);
    }

    pub fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    ) {
        self.assert_recording();
        self.raw.draw_instanced(
            vertex_count_per_instance,
            instance_count,
            start_vertex_location,
            start_instance_location,
        );
    }

    pub fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) {
        self.assert_recording();
        self.raw.draw_indexed_instanced(
            index_count_per_instance,
            instance_count,
            start_index_location,
            base_vertex_location,
            start_instance_location,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockCommand, EMockGpuMode, SMockBackend};

    fn open_unit(ctx: &SDeviceContext<SMockBackend>) -> SCommandSubmissionUnit<SMockBackend> {
        let mut unit = SCommandSubmissionUnit::new(ctx).unwrap();
        unit.begin_frame(&SFrameContext {
            frame_number: 0,
            back_buffer_index: 0,
            retired_fence_value: 0,
        })
        .unwrap();
        unit
    }

    #[test]
    fn test_render_target_limit_binds() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = open_unit(&ctx);

        let rtvs = [t12::SCPUDescriptorHandle { ptr: 0x10 }; t12::MAX_RENDER_TARGETS];
        unit.list().om_set_render_targets(&rtvs, None);
        assert!(matches!(
            &unit.list().raw().recorded()[..],
            [EMockCommand::SetRenderTargets { rtvs, dsv: None }] if rtvs.len() == t12::MAX_RENDER_TARGETS
        ));
    }

    #[test]
    #[should_panic(expected = "at most 8 render targets can be bound, got 9")]
    fn test_too_many_render_targets_names_limit() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = open_unit(&ctx);

        let rtvs = [t12::SCPUDescriptorHandle { ptr: 0x10 }; t12::MAX_RENDER_TARGETS + 1];
        unit.list().om_set_render_targets(&rtvs, None);
    }

    #[test]
    #[should_panic(expected = "at most 2 descriptor heaps can be bound, got 3")]
    fn test_too_many_descriptor_heaps_names_limit() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = open_unit(&ctx);

        let heap = SDescriptorHeap::create(
            &ctx,
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            1,
            true,
        )
        .unwrap();
        unit.list().set_descriptor_heaps(&[&heap, &heap, &heap]);
    }
}
