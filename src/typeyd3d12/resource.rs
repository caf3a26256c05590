use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// -- only the states this core ever moves resources through
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EResourceStates {
    Present,
    RenderTarget,
    DepthWrite,
    // -- upload heap resources are created in and never leave this state
    GenericRead,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EDXGIFormat {
    Unknown,
    R8G8B8A8UNorm,
    R8G8B8A8UNormSRGB,
    R32G32B32A32Float,
    R32G32B32Float,
    R32G32Float,
    R16UInt,
    R32UInt,
    D32Float,
    D24UNormS8UInt,
}

impl EDXGIFormat {
    pub fn is_depth(&self) -> bool {
        matches!(self, EDXGIFormat::D32Float | EDXGIFormat::D24UNormS8UInt)
    }

    // -- None for anything that can't be an index buffer format
    pub fn index_size_in_bytes(&self) -> Option<usize> {
        match self {
            EDXGIFormat::R16UInt => Some(2),
            EDXGIFormat::R32UInt => Some(4),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SClearFlags: u32 {
        const DEPTH = 0x1;
        const STENCIL = 0x2;
    }
}
