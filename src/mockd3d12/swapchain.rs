use super::*;
use crate::errors::{EError, Result};
use crate::typeyd3d12::TSwapChain;

// -- flip model: the current index moves on as soon as present is queued
pub struct SMockSwapChain {
    gpu: SMockGpu,
    buffers: Vec<usize>,
    current: Mutex<usize>,
}

impl SMockSwapChain {
    pub(super) fn new(gpu: &SMockGpu, buffercount: usize) -> Self {
        let mut state = gpu.lock();
        let buffers = (0..buffercount)
            .map(|_| state.add_resource(t12::EResourceStates::Present))
            .collect();
        drop(state);

        Self {
            gpu: gpu.clone(),
            buffers,
            current: Mutex::new(0),
        }
    }
}

impl TSwapChain<SMockBackend> for SMockSwapChain {
    fn currentbackbufferindex(&self) -> usize {
        *self.current.lock()
    }

    fn getbuffer(&self, idx: usize) -> Result<SMockResource> {
        match self.buffers.get(idx) {
            Some(id) => Ok(SMockResource {
                gpu: self.gpu.clone(),
                id: *id,
            }),
            None => Err(EError::Backend("swap chain buffer index out of range")),
        }
    }

    fn present(&self, _syncinterval: u32, _flags: u32) -> Result<()> {
        let mut state = self.gpu.lock();
        if state.device_removed {
            return Err(EError::DeviceLost("present after device removal"));
        }

        let mut current = self.current.lock();
        state.submit(EMockWork::Present {
            resource: self.buffers[*current],
            buffer_index: *current,
        });
        self.gpu.shared.work_available.notify_all();

        *current = (*current + 1) % self.buffers.len();
        Ok(())
    }
}
