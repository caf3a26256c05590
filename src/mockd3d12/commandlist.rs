use log::trace;

use super::*;
use crate::errors::{EError, Result};
use crate::typeyd3d12::TCommandList;

#[derive(Clone, Debug, PartialEq)]
pub enum EMockCommand {
    ResourceBarrier {
        resource: usize,
        before: t12::EResourceStates,
        after: t12::EResourceStates,
    },
    ClearRenderTargetView {
        rtv: t12::SCPUDescriptorHandle,
        colour: [f32; 4],
    },
    ClearDepthStencilView {
        dsv: t12::SCPUDescriptorHandle,
        flags: t12::SClearFlags,
        depth: f32,
        stencil: u8,
    },
    SetRenderTargets {
        rtvs: Vec<t12::SCPUDescriptorHandle>,
        dsv: Option<t12::SCPUDescriptorHandle>,
    },
    SetViewports(Vec<t12::SViewport>),
    SetScissorRects(Vec<t12::SRect>),
    SetDescriptorHeaps(Vec<usize>),
    SetPipelineState(usize),
    SetGraphicsRootSignature(usize),
    SetGraphicsRootDescriptorTable {
        root_parameter_index: u32,
        base: t12::SGPUDescriptorHandle,
    },
    SetGraphicsRootConstantBufferView {
        root_parameter_index: u32,
        buffer_location: u64,
    },
    SetPrimitiveTopology(t12::EPrimitiveTopology),
    SetVertexBuffers {
        start_slot: u32,
        views: Vec<t12::SVertexBufferView>,
    },
    SetIndexBuffer(t12::SIndexBufferView),
    DrawInstanced {
        vertex_count: u32,
        instance_count: u32,
        start_vertex: u32,
        start_instance: u32,
    },
    DrawIndexedInstanced {
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    },
}

struct SMockCommandListState {
    allocator: usize,
    open: bool,
    commands: Vec<EMockCommand>,
}

pub struct SMockCommandList {
    gpu: SMockGpu,
    state: Mutex<SMockCommandListState>,
}

impl SMockCommandList {
    pub(super) fn new(gpu: &SMockGpu, allocator: usize) -> Self {
        Self {
            gpu: gpu.clone(),
            state: Mutex::new(SMockCommandListState {
                allocator,
                open: true,
                commands: Vec::new(),
            }),
        }
    }

    pub(super) fn submission(&self) -> Result<(usize, Vec<EMockCommand>)> {
        let state = self.state.lock();
        if state.open {
            self.gpu
                .lock()
                .violation("executed a command list that was never closed".to_string());
            return Err(EError::Backend("command list still open"));
        }
        Ok((state.allocator, state.commands.clone()))
    }

    pub fn recorded(&self) -> Vec<EMockCommand> {
        self.state.lock().commands.clone()
    }

    fn record(&self, command: EMockCommand) {
        let mut state = self.state.lock();
        if !state.open {
            self.gpu
                .lock()
                .violation(format!("recorded {:?} into a closed command list", command));
            return;
        }
        trace!("Recorded {:?}", command);
        state.commands.push(command);
    }
}

impl TCommandList<SMockBackend> for SMockCommandList {
    fn reset(&self, commandallocator: &SMockCommandAllocator) -> Result<()> {
        let mut state = self.state.lock();
        if state.open {
            self.gpu
                .lock()
                .violation("reset a command list that is still recording".to_string());
        }

        state.allocator = commandallocator.id;
        state.open = true;
        state.commands.clear();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(EError::Backend("closing a command list that isn't recording"));
        }
        state.open = false;
        Ok(())
    }

    fn resourcebarrier(
        &self,
        resource: &SMockResource,
        beforestate: t12::EResourceStates,
        afterstate: t12::EResourceStates,
    ) {
        self.record(EMockCommand::ResourceBarrier {
            resource: resource.id,
            before: beforestate,
            after: afterstate,
        });
    }

    fn clearrendertargetview(&self, descriptor: t12::SCPUDescriptorHandle, colour: &[f32; 4]) {
        self.record(EMockCommand::ClearRenderTargetView {
            rtv: descriptor,
            colour: *colour,
        });
    }

    fn clear_depth_stencil_view(
        &self,
        descriptor: t12::SCPUDescriptorHandle,
        flags: t12::SClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.record(EMockCommand::ClearDepthStencilView {
            dsv: descriptor,
            flags,
            depth,
            stencil,
        });
    }

    fn om_set_render_targets(
        &self,
        render_target_descriptors: &[t12::SCPUDescriptorHandle],
        depth_target_descriptor: Option<t12::SCPUDescriptorHandle>,
    ) {
        self.record(EMockCommand::SetRenderTargets {
            rtvs: render_target_descriptors.to_vec(),
            dsv: depth_target_descriptor,
        });
    }

    fn rs_set_viewports(&self, viewports: &[t12::SViewport]) {
        self.record(EMockCommand::SetViewports(viewports.to_vec()));
    }

    fn rs_set_scissor_rects(&self, scissor_rects: &[t12::SRect]) {
        self.record(EMockCommand::SetScissorRects(scissor_rects.to_vec()));
    }

    fn set_descriptor_heaps(&self, heaps: &[&SMockDescriptorHeap]) {
        self.record(EMockCommand::SetDescriptorHeaps(
            heaps.iter().map(|heap| heap.id).collect(),
        ));
    }

    fn set_pipeline_state(&self, pipeline_state: &SMockPipelineState) {
        self.record(EMockCommand::SetPipelineState(pipeline_state.id));
    }

    fn set_graphics_root_signature(&self, root_signature: &SMockRootSignature) {
        self.record(EMockCommand::SetGraphicsRootSignature(root_signature.id));
    }

    fn set_graphics_root_descriptor_table(
        &self,
        root_parameter_index: u32,
        base: t12::SGPUDescriptorHandle,
    ) {
        self.record(EMockCommand::SetGraphicsRootDescriptorTable {
            root_parameter_index,
            base,
        });
    }

    fn set_graphics_root_constant_buffer_view(&self, root_parameter_index: u32, buffer_location: u64) {
        self.record(EMockCommand::SetGraphicsRootConstantBufferView {
            root_parameter_index,
            buffer_location,
        });
    }

    fn ia_set_primitive_topology(&self, primitive_topology: t12::EPrimitiveTopology) {
        self.record(EMockCommand::SetPrimitiveTopology(primitive_topology));
    }

    fn ia_set_vertex_buffers(&self, start_slot: u32, vertex_buffers: &[t12::SVertexBufferView]) {
        self.record(EMockCommand::SetVertexBuffers {
            start_slot,
            views: vertex_buffers.to_vec(),
        });
    }

    fn ia_set_index_buffer(&self, index_buffer: &t12::SIndexBufferView) {
        self.record(EMockCommand::SetIndexBuffer(*index_buffer));
    }

    fn draw_instanced(
        &self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex_location: u32,
        start_instance_location: u32,
    ) {
        self.record(EMockCommand::DrawInstanced {
            vertex_count: vertex_count_per_instance,
            instance_count,
            start_vertex: start_vertex_location,
            start_instance: start_instance_location,
        });
    }

    fn draw_indexed_instanced(
        &self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index_location: u32,
        base_vertex_location: i32,
        start_instance_location: u32,
    ) {
        self.record(EMockCommand::DrawIndexedInstanced {
            index_count: index_count_per_instance,
            instance_count,
            start_index: start_index_location,
            base_vertex: base_vertex_location,
            start_instance: start_instance_location,
        });
    }
}
