use super::EDXGIFormat;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SViewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl SViewport {
    pub fn new(
        topleftx: f32,
        toplefty: f32,
        width: f32,
        height: f32,
        mindepth: Option<f32>,
        maxdepth: Option<f32>,
    ) -> Self {
        Self {
            top_left_x: topleftx,
            top_left_y: toplefty,
            width,
            height,
            min_depth: mindepth.unwrap_or(0.0),
            max_depth: maxdepth.unwrap_or(1.0),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SRect {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

// -- what window management hands us. The handle is an HWND on windows and opaque elsewhere.
#[derive(Copy, Clone, Debug)]
pub struct SSurface {
    pub handle: usize,
    pub width: u32,
    pub height: u32,
}

impl SSurface {
    pub fn full_viewport(&self) -> SViewport {
        SViewport::new(0.0, 0.0, self.width as f32, self.height as f32, None, None)
    }

    pub fn full_scissor_rect(&self) -> SRect {
        SRect {
            left: 0,
            right: self.width as i32,
            top: 0,
            bottom: self.height as i32,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ESRV {
    Texture2D {
        mip_levels: u32,
    },
    // -- structured buffer, format must be Unknown
    Buffer {
        first_element: u64,
        num_elements: u32,
        structure_byte_stride: u32,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SShaderResourceViewDesc {
    pub format: EDXGIFormat,
    pub view: ESRV,
}
