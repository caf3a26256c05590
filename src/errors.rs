use thiserror::Error;

use crate::typeyd3d12::{EDescriptorHeapType, EFeatureLevel};

#[derive(Error, Debug)]
pub enum EError {
    #[error("no hardware adapter supports feature level {0:?}")]
    NoQualifyingAdapter(EFeatureLevel),

    #[error("initialization failed: {0}")]
    Initialization(&'static str),

    #[error("device lost: {0}")]
    DeviceLost(&'static str),

    #[error("descriptor index {index} out of range for {type_:?} heap of capacity {capacity}")]
    DescriptorIndexOutOfRange {
        type_: EDescriptorHeapType,
        index: usize,
        capacity: usize,
    },

    #[error("{type_:?} descriptor heap exhausted (capacity {capacity})")]
    DescriptorHeapExhausted {
        type_: EDescriptorHeapType,
        capacity: usize,
    },

    #[error("{0:?} descriptor heaps can't be shader visible")]
    InvalidHeapVisibility(EDescriptorHeapType),

    #[error("{0:?} descriptor heap has no GPU handles, it isn't shader visible")]
    HeapNotShaderVisible(EDescriptorHeapType),

    #[error("writing {count} elements at {start} overruns a buffer of {capacity}")]
    BufferRangeOutOfBounds {
        start: usize,
        count: usize,
        capacity: usize,
    },

    #[error("{0} byte elements can't be indices, only 2 or 4")]
    InvalidIndexStride(usize),

    #[error("timed out waiting for fence value {value} (completed {completed})")]
    FenceTimeout { value: u64, completed: u64 },

    #[error("the previous frame's command list is still open")]
    FrameNotEnded,

    #[error("{0}")]
    Backend(&'static str),

    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EError {
    // -- the render loop can't continue past any of these
    pub fn is_device_fatal(&self) -> bool {
        matches!(
            self,
            EError::NoQualifyingAdapter(_)
                | EError::Initialization(_)
                | EError::DeviceLost(_)
                | EError::FenceTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EError>;
