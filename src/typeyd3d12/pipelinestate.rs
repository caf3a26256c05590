use std::ffi::CStr;

use super::{EDXGIFormat, TBackend};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EPrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SVertexBufferView {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
    pub stride_in_bytes: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SIndexBufferView {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
    pub format: EDXGIFormat,
}

pub const APPEND_ALIGNED_ELEMENT: u32 = 0xffff_ffff;

#[derive(Copy, Clone, Debug)]
pub struct SInputElementDesc<'a> {
    pub semantic_name: &'a CStr,
    pub semantic_index: u32,
    pub format: EDXGIFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ECullMode {
    None,
    Front,
    Back,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EBlendMode {
    None,
    // -- Src * SrcA + Dest * (1 - SrcA)
    Normal,
    // -- Src * SrcA + Dest
    Add,
    // -- Dest - Src * SrcA
    Subtract,
    // -- Dest * Src
    Multiply,
    // -- Src * (1 - Dest) + Dest
    Screen,
}

pub struct SGraphicsPipelineStateDesc<'a, B: TBackend> {
    pub root_signature: &'a B::RootSignature,
    pub vertex_shader: &'a [u8],
    pub pixel_shader: &'a [u8],
    pub input_layout: &'a [SInputElementDesc<'a>],
    pub rtv_format: EDXGIFormat,
    pub dsv_format: Option<EDXGIFormat>,
    pub cull_mode: ECullMode,
    pub depth_enable: bool,
    pub blend_mode: EBlendMode,
}
