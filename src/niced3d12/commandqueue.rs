use super::*;

use arrayvec::ArrayVec;
use log::trace;

// -- One queue, one command list and an allocator per back buffer slot. An allocator is only
// -- reset once the fence value covering its last submission has retired, which the caller
// -- guarantees by waiting before begin_frame.
pub struct SCommandSubmissionUnit<B: TBackend> {
    list: SCommandList<B>,
    allocators: ArrayVec<B::CommandAllocator, BACK_BUFFER_COUNT>,
    queue: B::CommandQueue,
}

impl<B: TBackend> SCommandSubmissionUnit<B> {
    pub fn new(ctx: &SDeviceContext<B>) -> Result<Self> {
        let queue = ctx.device().createcommandqueue()?;

        let mut allocators = ArrayVec::new();
        for _ in 0..BACK_BUFFER_COUNT {
            allocators.push(ctx.device().createcommandallocator()?);
        }

        let mut list = SCommandList::new_from_raw(ctx.device().createcommandlist(&allocators[0])?);
        // -- begin_frame expects a closed list
        list.close()?;

        Ok(Self {
            list,
            allocators,
            queue,
        })
    }

    pub fn queue(&self) -> &B::CommandQueue {
        &self.queue
    }

    pub fn list(&mut self) -> &mut SCommandList<B> {
        &mut self.list
    }

    pub fn is_recording(&self) -> bool {
        self.list.is_open()
    }

    pub fn begin_frame(&mut self, frame: &SFrameContext) -> Result<()> {
        let allocator = &self.allocators[frame.back_buffer_index];
        trace!(
            "Frame {}: resetting allocator {} (retired fence value {})",
            frame.frame_number,
            frame.back_buffer_index,
            frame.retired_fence_value
        );

        allocator.reset()?;
        self.list.reset(allocator)
    }

    pub fn end_frame(&mut self, frame: &SFrameContext) -> Result<()> {
        self.list.close()?;
        self.queue.executecommandlist(self.list.raw())?;
        trace!("Frame {}: submitted command list", frame.frame_number);
        Ok(())
    }

    // -- closes the list without executing it. The allocator has nothing new in flight, so
    // -- the slot can begin again straight away.
    pub fn abandon_frame(&mut self, frame: &SFrameContext) -> Result<()> {
        self.list.close()?;
        trace!("Frame {}: command list discarded", frame.frame_number);
        Ok(())
    }

    // -- signals a fresh value and blocks until the GPU gets there
    pub fn flush_blocking(&self, fence: &mut SFrameFence<B>) -> Result<u64> {
        let value = fence.signal(&self.queue)?;
        fence.wait_for_value(value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockCommand, EMockEvent, EMockGpuMode};

    fn frame(frame_number: u64, back_buffer_index: usize) -> SFrameContext {
        SFrameContext {
            frame_number,
            back_buffer_index,
            retired_fence_value: 0,
        }
    }

    #[test]
    fn test_new_list_starts_closed() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let unit = SCommandSubmissionUnit::new(&ctx).unwrap();
        assert!(!unit.is_recording());
    }

    #[test]
    fn test_begin_record_end_executes() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();

        let f = frame(0, 0);
        unit.begin_frame(&f).unwrap();
        assert!(unit.is_recording());
        unit.list().draw_instanced(3, 1, 0, 0);
        unit.end_frame(&f).unwrap();
        assert!(!unit.is_recording());

        gpu.retire_all();
        let executed = gpu.executed_commands();
        assert_eq!(executed.len(), 1);
        assert!(matches!(executed[0][..], [EMockCommand::DrawInstanced { vertex_count: 3, .. }]));
        assert!(gpu.violations().is_empty());
    }

    #[test]
    fn test_slots_use_separate_allocators() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();
        let mut fence = SFrameFence::new(&ctx, None).unwrap();

        // -- slot 1 can be recorded while slot 0's work is still queued
        unit.begin_frame(&frame(0, 0)).unwrap();
        unit.end_frame(&frame(0, 0)).unwrap();
        fence.signal(unit.queue()).unwrap();

        unit.begin_frame(&frame(1, 1)).unwrap();
        unit.end_frame(&frame(1, 1)).unwrap();
        assert!(gpu.violations().is_empty());

        let resets: Vec<_> = gpu
            .events()
            .into_iter()
            .filter_map(|e| match e {
                EMockEvent::AllocatorReset { allocator, .. } => Some(allocator),
                _ => None,
            })
            .collect();
        assert_eq!(resets.len(), 2);
        assert_ne!(resets[0], resets[1]);

        gpu.retire_all();
    }

    #[test]
    fn test_reset_of_inflight_allocator_is_caught() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();

        unit.begin_frame(&frame(0, 0)).unwrap();
        unit.end_frame(&frame(0, 0)).unwrap();

        // -- nothing waited, slot 0's allocator is still owned by the GPU
        unit.begin_frame(&frame(2, 0)).unwrap();
        assert_eq!(gpu.violations().len(), 1);

        unit.end_frame(&frame(2, 0)).unwrap();
        gpu.retire_all();
    }

    #[test]
    fn test_abandoned_frame_never_executes() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();

        unit.begin_frame(&frame(0, 0)).unwrap();
        unit.list().draw_instanced(3, 1, 0, 0);
        unit.abandon_frame(&frame(0, 0)).unwrap();
        assert!(!unit.is_recording());
        assert_eq!(gpu.pending_work(), 0);

        // -- same slot again, no wait needed
        unit.begin_frame(&frame(1, 0)).unwrap();
        unit.end_frame(&frame(1, 0)).unwrap();
        gpu.retire_all();

        assert_eq!(gpu.executed_commands().len(), 1);
        assert!(gpu.executed_commands()[0].is_empty());
        assert!(gpu.violations().is_empty());
    }

    #[test]
    fn test_flush_blocking_waits_for_gpu() {
        let (gpu, ctx) =
            test_utils::mock_context(EMockGpuMode::Delayed(std::time::Duration::from_millis(5)));
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();
        let mut fence = SFrameFence::new(&ctx, None).unwrap();

        unit.begin_frame(&frame(0, 0)).unwrap();
        unit.end_frame(&frame(0, 0)).unwrap();

        let value = unit.flush_blocking(&mut fence).unwrap();
        assert_eq!(value, 1);
        assert!(fence.completed_value() >= 1);
        assert_eq!(gpu.pending_work(), 0);
    }
}
