use super::*;

use log::trace;

// -- Mirrors the state of each back buffer so barriers always name the state the resource is
// -- really in. Nothing here talks to the GPU beyond recording barriers.
pub struct SResourceTransitionTracker {
    back_buffer_states: [t12::EResourceStates; BACK_BUFFER_COUNT],
    barriers_emitted: u64,
}

impl SResourceTransitionTracker {
    pub fn new() -> Self {
        Self {
            // -- swap chain buffers are created ready to present
            back_buffer_states: [t12::EResourceStates::Present; BACK_BUFFER_COUNT],
            barriers_emitted: 0,
        }
    }

    pub fn back_buffer_state(&self, back_buffer_index: usize) -> t12::EResourceStates {
        self.back_buffer_states[back_buffer_index]
    }

    pub fn barriers_emitted(&self) -> u64 {
        self.barriers_emitted
    }

    pub fn transition<B: TBackend>(
        &mut self,
        list: &mut SCommandList<B>,
        resource: &B::Resource,
        beforestate: t12::EResourceStates,
        afterstate: t12::EResourceStates,
    ) {
        debug_assert!(beforestate != afterstate, "no-op transition");
        list.resource_barrier(resource, beforestate, afterstate);
        self.barriers_emitted += 1;
    }

    pub fn transition_back_buffer<B: TBackend>(
        &mut self,
        list: &mut SCommandList<B>,
        back_buffer_index: usize,
        resource: &B::Resource,
        afterstate: t12::EResourceStates,
    ) {
        let beforestate = self.back_buffer_states[back_buffer_index];
        trace!(
            "Back buffer {}: {:?} -> {:?}",
            back_buffer_index,
            beforestate,
            afterstate
        );

        self.transition(list, resource, beforestate, afterstate);
        self.back_buffer_states[back_buffer_index] = afterstate;
    }

    // -- for lists that are closed but never executed: their barriers never reach the GPU
    pub fn discard_back_buffer_transitions(&mut self, back_buffer_index: usize) {
        trace!("Back buffer {}: barriers discarded, back in Present", back_buffer_index);
        self.back_buffer_states[back_buffer_index] = t12::EResourceStates::Present;
    }
}

impl Default for SResourceTransitionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockCommand, EMockGpuMode};

    #[test]
    fn test_one_barrier_per_transition() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();
        let texture = ctx
            .device()
            .create_committed_depth_texture(4, 4, t12::EDXGIFormat::D32Float, 1.0)
            .unwrap();
        let mut tracker = SResourceTransitionTracker::new();

        let frame = SFrameContext {
            frame_number: 0,
            back_buffer_index: 0,
            retired_fence_value: 0,
        };
        unit.begin_frame(&frame).unwrap();
        tracker.transition(
            unit.list(),
            &texture,
            t12::EResourceStates::DepthWrite,
            t12::EResourceStates::RenderTarget,
        );
        unit.end_frame(&frame).unwrap();
        gpu.retire_all();

        assert_eq!(tracker.barriers_emitted(), 1);
        let commands = &gpu.executed_commands()[0];
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands[0],
            EMockCommand::ResourceBarrier {
                before: t12::EResourceStates::DepthWrite,
                after: t12::EResourceStates::RenderTarget,
                ..
            }
        ));
        assert!(gpu.violations().is_empty());
    }

    #[test]
    fn test_discarded_transition_returns_to_present() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut unit = SCommandSubmissionUnit::new(&ctx).unwrap();
        let texture = ctx
            .device()
            .create_committed_depth_texture(4, 4, t12::EDXGIFormat::D32Float, 1.0)
            .unwrap();
        let mut tracker = SResourceTransitionTracker::new();

        let frame = SFrameContext {
            frame_number: 0,
            back_buffer_index: 1,
            retired_fence_value: 0,
        };
        unit.begin_frame(&frame).unwrap();
        tracker.transition_back_buffer(unit.list(), 1, &texture, t12::EResourceStates::RenderTarget);
        assert_eq!(tracker.back_buffer_state(1), t12::EResourceStates::RenderTarget);

        unit.abandon_frame(&frame).unwrap();
        tracker.discard_back_buffer_transitions(1);
        assert_eq!(tracker.back_buffer_state(1), t12::EResourceStates::Present);
        assert_eq!(tracker.barriers_emitted(), 1);
    }

    #[test]
    fn test_back_buffer_states_tracked_per_slot() {
        let tracker = SResourceTransitionTracker::default();
        for idx in 0..BACK_BUFFER_COUNT {
            assert_eq!(tracker.back_buffer_state(idx), t12::EResourceStates::Present);
        }
    }
}
