use bitflags::bitflags;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EDescriptorHeapType {
    ConstantBufferShaderResourceUnorderedAccess,
    RenderTarget,
    DepthStencil,
}

impl EDescriptorHeapType {
    pub const COUNT: usize = 3;

    pub fn index(&self) -> usize {
        match self {
            EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess => 0,
            EDescriptorHeapType::RenderTarget => 1,
            EDescriptorHeapType::DepthStencil => 2,
        }
    }

    pub fn all() -> [EDescriptorHeapType; Self::COUNT] {
        [
            EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            EDescriptorHeapType::RenderTarget,
            EDescriptorHeapType::DepthStencil,
        ]
    }

    // -- views of these types are only ever written by the CPU
    pub fn can_be_shader_visible(&self) -> bool {
        matches!(self, EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess)
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct SDescriptorHeapFlags: u32 {
        const SHADER_VISIBLE = 0x1;
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SDescriptorHeapDesc {
    pub type_: EDescriptorHeapType,
    pub num_descriptors: usize,
    pub flags: SDescriptorHeapFlags,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SCPUDescriptorHandle {
    pub ptr: usize,
}

impl SCPUDescriptorHandle {
    pub fn offset(&self, bytes: usize) -> Self {
        Self {
            ptr: self.ptr + bytes,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SGPUDescriptorHandle {
    pub ptr: u64,
}

impl SGPUDescriptorHandle {
    pub fn offset(&self, bytes: usize) -> Self {
        Self {
            ptr: self.ptr + (bytes as u64),
        }
    }
}
