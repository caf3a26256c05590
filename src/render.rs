// -- The frame engine. Drives one queue and a two deep swap chain:
// --   begin_frame: wait for this slot's last fence value, reset its allocator, open the
// --                list, move the back buffer to RenderTarget, bind and clear
// --   end:         move the back buffer back to Present, submit, present, signal
// -- At most one frame is on the GPU while the next is recorded.

use log::{debug, error, info, trace, warn};

use crate::config::SRenderConfig;
use crate::errors::{EError, Result};
use crate::niced3d12 as n12;
use crate::niced3d12::BACK_BUFFER_COUNT;
use crate::typeyd3d12 as t12;
use crate::typeyd3d12::TBackend;

// -- field order is drop order, everything created from the device goes before it
pub struct SRender<B: TBackend> {
    config: SRenderConfig,
    surface: t12::SSurface,
    viewport: t12::SViewport,
    scissorrect: t12::SRect,

    frame_fence_values: [u64; BACK_BUFFER_COUNT],
    frame_number: u64,
    recording: bool,

    transitions: n12::SResourceTransitionTracker,
    depth_buffer: n12::SDepthBuffer<B>,
    srv_heap: n12::SDescriptorAllocator<B>,
    presenter: n12::SSwapChainPresenter<B>,
    fence: n12::SFrameFence<B>,
    command_unit: n12::SCommandSubmissionUnit<B>,
    device: n12::SDeviceContext<B>,
}

impl<B: TBackend> SRender<B> {
    pub fn new(factory: B::Factory, surface: t12::SSurface, config: SRenderConfig) -> Result<Self> {
        config.validate()?;

        let device =
            n12::SDeviceContext::initialize(factory, config.min_feature_level, config.debug_layer)?;
        let command_unit = n12::SCommandSubmissionUnit::new(&device)?;
        let fence = n12::SFrameFence::new(&device, config.fence_wait_timeout())?;

        let presenter = n12::SSwapChainPresenter::new(
            &device,
            command_unit.queue(),
            &surface,
            config.back_buffer_format,
            config.sync_interval,
        )?;

        let srv_heap = n12::SDescriptorAllocator::new(n12::SDescriptorHeap::create(
            &device,
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            config.srv_heap_capacity,
            true,
        )?);

        let depth_buffer = n12::SDepthBuffer::new(
            &device,
            surface.width,
            surface.height,
            config.depth_format,
            config.depth_clear_value,
        )?;

        info!(
            "Render engine ready: {}x{}, sync interval {}, fence timeout {:?}",
            surface.width,
            surface.height,
            config.sync_interval,
            config.fence_wait_timeout()
        );

        Ok(Self {
            viewport: surface.full_viewport(),
            scissorrect: surface.full_scissor_rect(),
            config,
            surface,
            frame_fence_values: [0; BACK_BUFFER_COUNT],
            frame_number: 0,
            recording: false,
            transitions: n12::SResourceTransitionTracker::new(),
            depth_buffer,
            srv_heap,
            presenter,
            fence,
            command_unit,
            device,
        })
    }

    pub fn begin_frame(&mut self) -> Result<SRenderFrame<'_, B>> {
        if self.recording {
            return Err(EError::FrameNotEnded);
        }

        let back_buffer_index = self.presenter.current_back_buffer_index();

        // -- wait for buffer to be available
        self.fence
            .wait_for_value(self.frame_fence_values[back_buffer_index])?;
        let retired_fence_value = self.fence.completed_value();
        self.srv_heap.signal(retired_fence_value);

        let context = n12::SFrameContext {
            frame_number: self.frame_number,
            back_buffer_index,
            retired_fence_value,
        };
        debug!(
            "Begin frame {} on back buffer {} (retired {})",
            context.frame_number, back_buffer_index, retired_fence_value
        );

        self.command_unit.begin_frame(&context)?;
        self.recording = true;

        let list = self.command_unit.list();
        self.transitions.transition_back_buffer(
            list,
            back_buffer_index,
            self.presenter.back_buffer(back_buffer_index),
            t12::EResourceStates::RenderTarget,
        );

        let rtv = self.presenter.render_target_view(back_buffer_index);
        list.om_set_render_targets(&[rtv], Some(self.depth_buffer.dsv()));
        list.clear_render_target_view(rtv, &self.config.clear_colour);
        self.depth_buffer.clear(list);

        list.rs_set_viewports(&[self.viewport]);
        list.rs_set_scissor_rects(&[self.scissorrect]);
        list.set_descriptor_heaps(&[self.srv_heap.heap()]);

        Ok(SRenderFrame {
            render: self,
            context,
        })
    }

    fn end_frame(&mut self, context: &n12::SFrameContext) -> Result<()> {
        let back_buffer_index = context.back_buffer_index;

        self.transitions.transition_back_buffer(
            self.command_unit.list(),
            back_buffer_index,
            self.presenter.back_buffer(back_buffer_index),
            t12::EResourceStates::Present,
        );

        let submitted = self.command_unit.end_frame(context);
        self.recording = self.command_unit.is_recording();
        submitted?;

        // -- present the swap chain and switch to next buffer in swap chain
        self.presenter.present(context)?;

        self.frame_fence_values[back_buffer_index] = self.fence.signal(self.command_unit.queue())?;
        trace!(
            "Frame {} fenced at {}",
            context.frame_number,
            self.frame_fence_values[back_buffer_index]
        );

        self.frame_number += 1;
        Ok(())
    }

    // -- the frame's list is closed and dropped on the floor, so nothing it recorded (its
    // -- barriers included) reaches the GPU and the back buffer is still in Present
    fn abandon_frame(&mut self, context: &n12::SFrameContext) {
        warn!(
            "Frame {} dropped without end(), discarding its commands",
            context.frame_number
        );

        if let Err(e) = self.command_unit.abandon_frame(context) {
            error!("Failed to close the abandoned command list: {}", e);
        }
        self.transitions
            .discard_back_buffer_transitions(context.back_buffer_index);
        self.recording = self.command_unit.is_recording();
    }

    // -- blocks until everything submitted so far has finished on the GPU
    pub fn flush(&mut self) -> Result<()> {
        self.command_unit.flush_blocking(&mut self.fence)?;
        self.srv_heap.signal(self.fence.completed_value());
        Ok(())
    }

    pub fn config(&self) -> &SRenderConfig {
        &self.config
    }

    pub fn surface(&self) -> &t12::SSurface {
        &self.surface
    }

    pub fn device(&self) -> &n12::SDeviceContext<B> {
        &self.device
    }

    pub fn fence(&self) -> &n12::SFrameFence<B> {
        &self.fence
    }

    pub fn presenter(&self) -> &n12::SSwapChainPresenter<B> {
        &self.presenter
    }

    pub fn transitions(&self) -> &n12::SResourceTransitionTracker {
        &self.transitions
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn frame_fence_value(&self, back_buffer_index: usize) -> u64 {
        self.frame_fence_values[back_buffer_index]
    }

    pub fn depth_stencil_view(&self) -> t12::SCPUDescriptorHandle {
        self.depth_buffer.dsv()
    }

    pub fn srv_heap(&self) -> &n12::SDescriptorHeap<B> {
        self.srv_heap.heap()
    }

    pub fn alloc_srv(&mut self) -> Result<usize> {
        self.srv_heap.alloc()
    }

    // -- the slot comes back once fence value `signal` has retired
    pub fn free_srv_on_signal(&mut self, index: usize, signal: u64) {
        self.srv_heap.free_on_signal(index, signal);
    }

    pub fn srv_cpu_handle(&self, index: usize) -> Result<t12::SCPUDescriptorHandle> {
        self.srv_heap.heap().cpu_handle(index)
    }

    pub fn srv_gpu_handle(&self, index: usize) -> Result<t12::SGPUDescriptorHandle> {
        self.srv_heap.heap().gpu_handle(index)
    }

    // -- view `resource` through SRV slot `index`, which the caller got from alloc_srv
    pub fn create_srv(
        &self,
        index: usize,
        resource: &B::Resource,
        desc: &t12::SShaderResourceViewDesc,
    ) -> Result<()> {
        self.device
            .create_shader_resource_view(resource, desc, self.srv_heap.heap(), index)
    }

    pub fn create_upload_buffer<T: Copy>(&self, count: usize) -> Result<n12::SBufferResource<B, T>> {
        n12::SBufferResource::new_upload(&self.device, count)
    }

    pub fn create_root_signature(&self, serialized_blob: &[u8]) -> Result<B::RootSignature> {
        self.device.create_root_signature(serialized_blob)
    }

    pub fn create_graphics_pipeline_state(
        &self,
        desc: &t12::SGraphicsPipelineStateDesc<'_, B>,
    ) -> Result<B::PipelineState> {
        self.device.create_graphics_pipeline_state(desc)
    }
}

impl<B: TBackend> Drop for SRender<B> {
    fn drop(&mut self) {
        debug!(
            "Shutting down, waiting for fence value {}",
            self.fence.last_signalled_value()
        );
        if let Err(e) = self.fence.wait_for_last_signalled() {
            error!("Failed to drain the GPU on shutdown: {}", e);
        }
    }
}

// -- A frame between begin_frame and end. The list is open and the back buffer is a bound
// -- and cleared render target. Dropping it without end() throws the frame away.
pub struct SRenderFrame<'a, B: TBackend> {
    render: &'a mut SRender<B>,
    context: n12::SFrameContext,
}

impl<'a, B: TBackend> SRenderFrame<'a, B> {
    pub fn context(&self) -> &n12::SFrameContext {
        &self.context
    }

    pub fn list(&mut self) -> &mut n12::SCommandList<B> {
        self.render.command_unit.list()
    }

    pub fn render_target_view(&self) -> t12::SCPUDescriptorHandle {
        self.render
            .presenter
            .render_target_view(self.context.back_buffer_index)
    }

    pub fn depth_stencil_view(&self) -> t12::SCPUDescriptorHandle {
        self.render.depth_buffer.dsv()
    }

    pub fn srv_gpu_handle(&self, index: usize) -> Result<t12::SGPUDescriptorHandle> {
        self.render.srv_gpu_handle(index)
    }

    pub fn end(self) -> Result<()> {
        self.render.end_frame(&self.context)
    }
}

impl<'a, B: TBackend> Drop for SRenderFrame<'a, B> {
    fn drop(&mut self) {
        // -- end() leaves the list closed, even when submission failed
        if self.render.recording {
            self.render.abandon_frame(&self.context);
        }
    }
}
