use super::*;

use std::marker::PhantomData;
use std::mem;

use log::debug;

// -- A typed upload heap buffer of `count` elements. It stays in GenericRead and is read by
// -- the GPU straight from upload memory, so a write is only safe once no queued frame still
// -- reads the elements being overwritten.
pub struct SBufferResource<B: TBackend, T: Copy> {
    raw: B::Resource,
    count: usize,
    gpu_virtual_address: u64,
    phantom: PhantomData<T>,
}

impl<B: TBackend, T: Copy> SBufferResource<B, T> {
    pub fn new_upload(ctx: &SDeviceContext<B>, count: usize) -> Result<Self> {
        if count == 0 || mem::size_of::<T>() == 0 {
            return Err(EError::Initialization("upload buffer with no storage"));
        }

        let raw = ctx
            .device()
            .create_committed_upload_buffer(count * mem::size_of::<T>())?;
        let gpu_virtual_address = raw.getgpuvirtualaddress();
        debug!(
            "Created upload buffer of {} x {} bytes at {:#x}",
            count,
            mem::size_of::<T>(),
            gpu_virtual_address
        );

        Ok(Self {
            raw,
            count,
            gpu_virtual_address,
            phantom: PhantomData,
        })
    }

    pub fn raw(&self) -> &B::Resource {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stride(&self) -> usize {
        mem::size_of::<T>()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.count * mem::size_of::<T>()
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        self.gpu_virtual_address
    }

    // -- for root constant buffer views on one element
    pub fn element_gpu_virtual_address(&self, index: usize) -> Result<u64> {
        if index >= self.count {
            return Err(EError::BufferRangeOutOfBounds {
                start: index,
                count: 1,
                capacity: self.count,
            });
        }
        Ok(self.gpu_virtual_address + (index * mem::size_of::<T>()) as u64)
    }

    pub fn copy_to_map(&mut self, data: &[T]) -> Result<()> {
        self.copy_to_map_segment(data, 0)
    }

    pub fn copy_to_map_segment(&mut self, data: &[T], start_offset: usize) -> Result<()> {
        if start_offset + data.len() > self.count {
            return Err(EError::BufferRangeOutOfBounds {
                start: start_offset,
                count: data.len(),
                capacity: self.count,
            });
        }

        let bytes = unsafe {
            std::slice::from_raw_parts(data.as_ptr() as *const u8, mem::size_of_val(data))
        };
        self.raw
            .writebytes(start_offset * mem::size_of::<T>(), bytes)
    }

    pub fn vertex_buffer_view(&self) -> t12::SVertexBufferView {
        t12::SVertexBufferView {
            buffer_location: self.gpu_virtual_address,
            size_in_bytes: self.size_in_bytes() as u32,
            stride_in_bytes: mem::size_of::<T>() as u32,
        }
    }

    pub fn index_buffer_view(&self) -> Result<t12::SIndexBufferView> {
        let format = match mem::size_of::<T>() {
            2 => t12::EDXGIFormat::R16UInt,
            4 => t12::EDXGIFormat::R32UInt,
            size => return Err(EError::InvalidIndexStride(size)),
        };

        Ok(t12::SIndexBufferView {
            buffer_location: self.gpu_virtual_address,
            size_in_bytes: self.size_in_bytes() as u32,
            format,
        })
    }

    // -- the whole buffer as a StructuredBuffer<T>
    pub fn srv_desc(&self) -> t12::SShaderResourceViewDesc {
        t12::SShaderResourceViewDesc {
            format: t12::EDXGIFormat::Unknown,
            view: t12::ESRV::Buffer {
                first_element: 0,
                num_elements: self.count as u32,
                structure_byte_stride: mem::size_of::<T>() as u32,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockGpuMode, SMockBackend};

    #[repr(C)]
    #[derive(Copy, Clone)]
    struct SVertex {
        position: [f32; 4],
        texcoord: [f32; 2],
    }

    #[test]
    fn test_write_lands_in_buffer() {
        let (gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut indices = SBufferResource::<SMockBackend, u32>::new_upload(&ctx, 6).unwrap();

        indices.copy_to_map(&[0, 1, 2, 1, 3, 2]).unwrap();
        indices.copy_to_map_segment(&[7], 5).unwrap();

        let bytes = gpu.buffer_contents(indices.raw()).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[4..8], &1u32.to_ne_bytes());
        assert_eq!(&bytes[20..24], &7u32.to_ne_bytes());
    }

    #[test]
    fn test_write_past_end_fails() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let mut buffer = SBufferResource::<SMockBackend, u16>::new_upload(&ctx, 3).unwrap();

        match buffer.copy_to_map_segment(&[1, 2], 2) {
            Err(EError::BufferRangeOutOfBounds { start, count, capacity }) => {
                assert_eq!((start, count, capacity), (2, 2, 3));
            }
            _ => panic!("expected BufferRangeOutOfBounds"),
        }
        assert!(buffer.copy_to_map(&[1, 2, 3, 4]).is_err());
        assert!(buffer.element_gpu_virtual_address(3).is_err());
    }

    #[test]
    fn test_views_describe_buffer() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let vertices = SBufferResource::<SMockBackend, SVertex>::new_upload(&ctx, 4).unwrap();

        let vbv = vertices.vertex_buffer_view();
        assert_eq!(vbv.buffer_location, vertices.gpu_virtual_address());
        assert_eq!(vbv.stride_in_bytes, 24);
        assert_eq!(vbv.size_in_bytes, 96);
        assert_eq!(vertices.element_gpu_virtual_address(2).unwrap(), vbv.buffer_location + 48);

        assert!(matches!(vertices.index_buffer_view(), Err(EError::InvalidIndexStride(24))));
        assert!(matches!(
            vertices.srv_desc().view,
            t12::ESRV::Buffer { num_elements: 4, structure_byte_stride: 24, .. }
        ));

        let short_indices = SBufferResource::<SMockBackend, u16>::new_upload(&ctx, 6).unwrap();
        let ibv = short_indices.index_buffer_view().unwrap();
        assert_eq!(ibv.format, t12::EDXGIFormat::R16UInt);
        assert_eq!(ibv.size_in_bytes, 12);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        assert!(matches!(
            SBufferResource::<SMockBackend, u32>::new_upload(&ctx, 0),
            Err(EError::Initialization(_))
        ));
    }
}
