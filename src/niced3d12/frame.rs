// -- Per-frame state handed to every component's per-frame call instead of living in shared
// -- fields. One of these exists between SRender::begin_frame and the matching end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SFrameContext {
    pub frame_number: u64,
    pub back_buffer_index: usize,

    // -- fence value that had retired before this slot's allocator was reset
    pub retired_fence_value: u64,
}
