use super::*;

use log::{debug, error};

struct SDescriptorAllocatorPendingFree {
    index: usize,
    signal: u64,
}

// -- Hands out slots of one heap. Slots are bump allocated, and a freed slot only comes back
// -- once the fence value it was freed against has retired, so the GPU never reads a view
// -- that was rewritten under it.
pub struct SDescriptorAllocator<B: TBackend> {
    descriptor_heap: SDescriptorHeap<B>,

    next_unused: usize,
    free_indices: Vec<usize>,

    pending_frees: Vec<SDescriptorAllocatorPendingFree>,
    last_signal: Option<u64>,
}

impl<B: TBackend> SDescriptorAllocator<B> {
    pub fn new(descriptor_heap: SDescriptorHeap<B>) -> Self {
        Self {
            descriptor_heap,
            next_unused: 0,
            free_indices: Vec::new(),
            pending_frees: Vec::new(),
            last_signal: None,
        }
    }

    pub fn heap(&self) -> &SDescriptorHeap<B> {
        &self.descriptor_heap
    }

    pub fn num_allocated(&self) -> usize {
        self.next_unused - self.free_indices.len()
    }

    pub fn alloc(&mut self) -> Result<usize> {
        if let Some(index) = self.free_indices.pop() {
            return Ok(index);
        }

        if self.next_unused < self.descriptor_heap.capacity() {
            let index = self.next_unused;
            self.next_unused += 1;
            return Ok(index);
        }

        error!(
            "{:?} descriptor heap out of slots ({})",
            self.descriptor_heap.type_(),
            self.descriptor_heap.capacity()
        );
        Err(EError::DescriptorHeapExhausted {
            type_: self.descriptor_heap.type_(),
            capacity: self.descriptor_heap.capacity(),
        })
    }

    pub fn free_on_signal(&mut self, index: usize, signal: u64) {
        debug_assert!(index < self.next_unused, "freeing descriptor {} that was never allocated", index);
        debug_assert!(
            !self.free_indices.contains(&index) && self.pending_frees.iter().all(|pf| pf.index != index),
            "descriptor {} freed twice",
            index
        );

        if let Some(s) = self.last_signal {
            if signal <= s {
                self.free_indices.push(index);
                return;
            }
        }

        self.pending_frees.push(SDescriptorAllocatorPendingFree { index, signal });
    }

    // -- signal is the fence's completed value
    pub fn signal(&mut self, signal: u64) {
        assert!(signal >= self.last_signal.unwrap_or(0));

        let mut idx = 0;
        while idx < self.pending_frees.len() {
            if self.pending_frees[idx].signal <= signal {
                let freed = self.pending_frees.swap_remove(idx);
                debug!("Descriptor {} reclaimed at fence value {}", freed.index, signal);
                self.free_indices.push(freed.index);
            } else {
                idx += 1;
            }
        }

        self.last_signal = Some(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockd3d12::{EMockGpuMode, SMockBackend};

    fn srv_allocator(capacity: usize) -> SDescriptorAllocator<SMockBackend> {
        let (_gpu, ctx) = test_utils::mock_context(EMockGpuMode::Manual);
        let heap = SDescriptorHeap::create(
            &ctx,
            t12::EDescriptorHeapType::ConstantBufferShaderResourceUnorderedAccess,
            capacity,
            true,
        )
        .unwrap();
        SDescriptorAllocator::new(heap)
    }

    #[test]
    fn test_bump_then_exhausted() {
        let mut allocator = srv_allocator(3);

        assert_eq!(allocator.alloc().unwrap(), 0);
        assert_eq!(allocator.alloc().unwrap(), 1);
        assert_eq!(allocator.alloc().unwrap(), 2);

        match allocator.alloc() {
            Err(EError::DescriptorHeapExhausted { capacity, .. }) => assert_eq!(capacity, 3),
            _ => panic!("expected DescriptorHeapExhausted"),
        }
        // -- still exhausted, no wrap around to 0
        assert!(allocator.alloc().is_err());
        assert_eq!(allocator.num_allocated(), 3);
    }

    #[test]
    fn test_free_waits_for_signal() {
        let mut allocator = srv_allocator(2);
        let a = allocator.alloc().unwrap();
        let _b = allocator.alloc().unwrap();

        allocator.free_on_signal(a, 5);
        allocator.signal(4);
        assert!(allocator.alloc().is_err());

        allocator.signal(5);
        assert_eq!(allocator.alloc().unwrap(), a);
    }

    #[test]
    fn test_free_against_retired_value_is_immediate() {
        let mut allocator = srv_allocator(1);
        let a = allocator.alloc().unwrap();

        allocator.signal(10);
        allocator.free_on_signal(a, 7);
        assert_eq!(allocator.num_allocated(), 0);
        assert_eq!(allocator.alloc().unwrap(), a);
    }
}
