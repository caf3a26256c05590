// -- In-memory backend. Work submitted to a queue sits on a simulated GPU timeline until the
// -- test retires it (Manual) or a worker thread does (Delayed). Every barrier, clear, draw,
// -- present and allocator reset is checked against the state the GPU would really see, and
// -- mismatches are collected as violations instead of crashing the driver.

mod commandlist;
mod device;
mod swapchain;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use log::{trace, warn};
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::typeyd3d12 as t12;
use crate::typeyd3d12::TBackend;

pub use self::commandlist::{EMockCommand, SMockCommandList};
pub use self::device::{
    SMockAdapter, SMockAdapterInfo, SMockCommandAllocator, SMockCommandQueue, SMockDescriptorHeap,
    SMockDevice, SMockEvent, SMockFactory, SMockFence, SMockPipelineState, SMockResource,
    SMockRootSignature,
};
pub use self::swapchain::SMockSwapChain;

pub struct SMockBackend;

impl TBackend for SMockBackend {
    type Factory = SMockFactory;
    type Adapter = SMockAdapter;
    type Device = SMockDevice;
    type CommandQueue = SMockCommandQueue;
    type CommandAllocator = SMockCommandAllocator;
    type CommandList = SMockCommandList;
    type Fence = SMockFence;
    type Event = SMockEvent;
    type DescriptorHeap = SMockDescriptorHeap;
    type Resource = SMockResource;
    type SwapChain = SMockSwapChain;
    type RootSignature = SMockRootSignature;
    type PipelineState = SMockPipelineState;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EMockGpuMode {
    // -- nothing retires until retire_* is called
    Manual,
    // -- a worker retires one work item per interval
    Delayed(Duration),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EMockEvent {
    AllocatorReset { allocator: usize, fence_completed: u64 },
    Executed { allocator: usize },
    FenceSignalled { value: u64 },
    Presented { buffer_index: usize },
}

enum EMockWork {
    Execute {
        allocator: usize,
        commands: Vec<EMockCommand>,
    },
    Signal {
        fence: usize,
        value: u64,
    },
    Present {
        resource: usize,
        buffer_index: usize,
    },
}

struct SMockFenceWaiter {
    fence: usize,
    value: u64,
    event: SMockEvent,
}

struct SMockBuffer {
    gpu_address: u64,
    bytes: Vec<u8>,
}

impl SMockBuffer {
    fn contains(&self, location: u64, size: u64) -> bool {
        location >= self.gpu_address
            && location + size <= self.gpu_address + self.bytes.len() as u64
    }
}

struct SMockGpuState {
    mode: EMockGpuMode,
    worker_running: bool,
    device_removed: bool,
    debug_layer: bool,

    queue: VecDeque<EMockWork>,

    fences: Vec<u64>,
    fence_waiters: Vec<SMockFenceWaiter>,
    last_retired_signal: u64,

    resource_states: Vec<t12::EResourceStates>,
    // -- descriptor cpu ptr -> resource id
    views: HashMap<usize, usize>,
    // -- resource id -> upload buffer
    buffers: HashMap<usize, SMockBuffer>,
    next_buffer_address: u64,
    allocator_inflight: Vec<u32>,

    next_heap_base: usize,
    next_object_id: usize,

    events: Vec<EMockEvent>,
    violations: Vec<String>,
    executed: Vec<Vec<EMockCommand>>,
}

struct SMockShared {
    state: Mutex<SMockGpuState>,
    work_available: Condvar,
}

#[derive(Clone)]
pub struct SMockGpu {
    shared: Arc<SMockShared>,
}

impl SMockGpu {
    pub fn new(mode: EMockGpuMode) -> Self {
        let gpu = Self {
            shared: Arc::new(SMockShared {
                state: Mutex::new(SMockGpuState {
                    mode: EMockGpuMode::Manual,
                    worker_running: false,
                    device_removed: false,
                    debug_layer: false,
                    queue: VecDeque::new(),
                    fences: Vec::new(),
                    fence_waiters: Vec::new(),
                    last_retired_signal: 0,
                    resource_states: Vec::new(),
                    views: HashMap::new(),
                    buffers: HashMap::new(),
                    next_buffer_address: device::BUFFER_ADDRESS_BASE,
                    allocator_inflight: Vec::new(),
                    next_heap_base: 0x1000,
                    next_object_id: 0,
                    events: Vec::new(),
                    violations: Vec::new(),
                    executed: Vec::new(),
                }),
                work_available: Condvar::new(),
            }),
        };
        gpu.set_mode(mode);
        gpu
    }

    fn lock(&self) -> MutexGuard<'_, SMockGpuState> {
        self.shared.state.lock()
    }

    pub fn set_mode(&self, mode: EMockGpuMode) {
        let mut state = self.lock();
        state.mode = mode;

        if let EMockGpuMode::Delayed(_) = mode {
            if !state.worker_running {
                state.worker_running = true;
                let weak = Arc::downgrade(&self.shared);
                thread::spawn(move || run_worker(weak));
            }
        }
        self.shared.work_available.notify_all();
    }

    pub fn mode(&self) -> EMockGpuMode {
        self.lock().mode
    }

    // -- returns false when there was nothing queued
    pub fn retire_next(&self) -> bool {
        let mut state = self.lock();
        state.retire_next().is_some()
    }

    // -- retires work in order until fence value `value` has been written
    pub fn retire_through_fence_value(&self, value: u64) {
        let mut state = self.lock();
        while let Some(signalled) = state.retire_next() {
            if matches!(signalled, Some(v) if v >= value) {
                break;
            }
        }
    }

    pub fn retire_all(&self) {
        let mut state = self.lock();
        while state.retire_next().is_some() {}
    }

    pub fn pending_work(&self) -> usize {
        self.lock().queue.len()
    }

    // -- every fence reads as complete from now on, and presents and signals fail
    pub fn remove_device(&self) {
        let mut state = self.lock();
        warn!("Mock device removed with {} work items queued", state.queue.len());

        state.device_removed = true;
        state.queue.clear();
        for inflight in state.allocator_inflight.iter_mut() {
            *inflight = 0;
        }
        for value in state.fences.iter_mut() {
            *value = u64::MAX;
        }
        for waiter in state.fence_waiters.drain(..) {
            waiter.event.set();
        }
    }

    pub fn device_removed(&self) -> bool {
        self.lock().device_removed
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.lock().debug_layer
    }

    pub fn events(&self) -> Vec<EMockEvent> {
        self.lock().events.clone()
    }

    pub fn violations(&self) -> Vec<String> {
        self.lock().violations.clone()
    }

    // -- command lists in the order the GPU finished them
    pub fn executed_commands(&self) -> Vec<Vec<EMockCommand>> {
        self.lock().executed.clone()
    }

    pub fn resource_state(&self, resource: &SMockResource) -> t12::EResourceStates {
        self.lock().resource_states[resource.id]
    }

    pub fn fence_completed_value(&self, fence: &SMockFence) -> u64 {
        self.lock().fences[fence.id]
    }

    // -- None for anything that isn't an upload buffer
    pub fn buffer_contents(&self, resource: &SMockResource) -> Option<Vec<u8>> {
        self.lock()
            .buffers
            .get(&resource.id)
            .map(|buffer| buffer.bytes.clone())
    }

    // -- which resource the view at this descriptor was created for
    pub fn view_resource_id(&self, descriptor: t12::SCPUDescriptorHandle) -> Option<usize> {
        self.lock().views.get(&descriptor.ptr).copied()
    }
}

fn run_worker(weak: Weak<SMockShared>) {
    trace!("Mock GPU worker started");

    loop {
        let shared = match weak.upgrade() {
            Some(shared) => shared,
            None => break,
        };

        let mut state = shared.state.lock();
        let interval = match state.mode {
            EMockGpuMode::Manual => {
                state.worker_running = false;
                break;
            }
            EMockGpuMode::Delayed(interval) => interval,
        };

        if state.queue.is_empty() {
            // -- bounded so a dropped gpu is noticed
            shared
                .work_available
                .wait_for(&mut state, Duration::from_millis(20));
            continue;
        }

        drop(state);
        drop(shared);
        thread::sleep(interval);

        match weak.upgrade() {
            Some(shared) => {
                shared.state.lock().retire_next();
            }
            None => break,
        }
    }

    trace!("Mock GPU worker stopped");
}

impl SMockGpuState {
    fn violation(&mut self, message: String) {
        warn!("Mock GPU violation: {}", message);
        self.violations.push(message);
    }

    fn alloc_object_id(&mut self) -> usize {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    fn add_resource(&mut self, initial: t12::EResourceStates) -> usize {
        self.resource_states.push(initial);
        self.resource_states.len() - 1
    }

    fn submit(&mut self, work: EMockWork) {
        self.queue.push_back(work);
    }

    // -- None when the queue was empty, otherwise Some(fence value written, if any)
    fn retire_next(&mut self) -> Option<Option<u64>> {
        let work = self.queue.pop_front()?;

        match work {
            EMockWork::Execute {
                allocator,
                commands,
            } => {
                self.validate_commands(&commands);
                self.allocator_inflight[allocator] -= 1;
                self.events.push(EMockEvent::Executed { allocator });
                self.executed.push(commands);
                Some(None)
            }
            EMockWork::Signal { fence, value } => {
                self.fences[fence] = value;
                self.last_retired_signal = self.last_retired_signal.max(value);
                self.events.push(EMockEvent::FenceSignalled { value });

                let mut idx = 0;
                while idx < self.fence_waiters.len() {
                    let waiter = &self.fence_waiters[idx];
                    if waiter.fence == fence && waiter.value <= value {
                        self.fence_waiters.swap_remove(idx).event.set();
                    } else {
                        idx += 1;
                    }
                }
                Some(Some(value))
            }
            EMockWork::Present {
                resource,
                buffer_index,
            } => {
                let actual = self.resource_states[resource];
                if actual != t12::EResourceStates::Present {
                    self.violation(format!(
                        "presented back buffer {} while in {:?}",
                        buffer_index, actual
                    ));
                }
                self.events.push(EMockEvent::Presented { buffer_index });
                Some(None)
            }
        }
    }

    fn view_resource(&mut self, descriptor: t12::SCPUDescriptorHandle) -> Option<usize> {
        let resource = self.views.get(&descriptor.ptr).copied();
        if resource.is_none() {
            self.violation(format!("descriptor {:#x} has no view", descriptor.ptr));
        }
        resource
    }

    fn expect_state(&mut self, resource: usize, expected: t12::EResourceStates, what: &str) {
        let actual = self.resource_states[resource];
        if actual != expected {
            self.violation(format!(
                "{} on resource {} in {:?}, needs {:?}",
                what, resource, actual, expected
            ));
        }
    }

    fn expect_buffer_range(&mut self, location: u64, size: u64, what: &str) {
        if !self.buffers.values().any(|buffer| buffer.contains(location, size)) {
            self.violation(format!(
                "{} at {:#x} (+{} bytes) isn't inside any buffer",
                what, location, size
            ));
        }
    }

    fn expect_render_targets(&mut self, bound_rtvs: &[t12::SCPUDescriptorHandle]) {
        for rtv in bound_rtvs.iter() {
            if let Some(resource) = self.view_resource(*rtv) {
                self.expect_state(resource, t12::EResourceStates::RenderTarget, "draw");
            }
        }
    }

    fn validate_commands(&mut self, commands: &[EMockCommand]) {
        let mut bound_rtvs: Vec<t12::SCPUDescriptorHandle> = Vec::new();
        let mut bound_index_buffer: Option<t12::SIndexBufferView> = None;

        for command in commands {
            match command {
                EMockCommand::ResourceBarrier {
                    resource,
                    before,
                    after,
                } => {
                    let actual = self.resource_states[*resource];
                    if actual != *before {
                        self.violation(format!(
                            "barrier on resource {} claims {:?} but it is in {:?}",
                            resource, before, actual
                        ));
                    }
                    self.resource_states[*resource] = *after;
                }
                EMockCommand::ClearRenderTargetView { rtv, .. } => {
                    if let Some(resource) = self.view_resource(*rtv) {
                        self.expect_state(resource, t12::EResourceStates::RenderTarget, "clear");
                    }
                }
                EMockCommand::ClearDepthStencilView { dsv, .. } => {
                    if let Some(resource) = self.view_resource(*dsv) {
                        self.expect_state(resource, t12::EResourceStates::DepthWrite, "depth clear");
                    }
                }
                EMockCommand::SetRenderTargets { rtvs, .. } => {
                    bound_rtvs = rtvs.clone();
                }
                EMockCommand::SetVertexBuffers { views, .. } => {
                    for view in views.iter() {
                        self.expect_buffer_range(
                            view.buffer_location,
                            view.size_in_bytes as u64,
                            "vertex buffer view",
                        );
                    }
                }
                EMockCommand::SetIndexBuffer(view) => {
                    self.expect_buffer_range(
                        view.buffer_location,
                        view.size_in_bytes as u64,
                        "index buffer view",
                    );
                    bound_index_buffer = Some(*view);
                }
                EMockCommand::SetGraphicsRootConstantBufferView {
                    buffer_location, ..
                } => {
                    self.expect_buffer_range(*buffer_location, 1, "constant buffer view");
                }
                EMockCommand::SetGraphicsRootDescriptorTable { base, .. } => {
                    let cpu = t12::SCPUDescriptorHandle {
                        ptr: base.ptr.wrapping_sub(device::GPU_HANDLE_BASE) as usize,
                    };
                    self.view_resource(cpu);
                }
                EMockCommand::DrawInstanced { .. } => {
                    self.expect_render_targets(&bound_rtvs);
                }
                EMockCommand::DrawIndexedInstanced {
                    index_count,
                    start_index,
                    ..
                } => {
                    self.expect_render_targets(&bound_rtvs);
                    match bound_index_buffer {
                        Some(view) => {
                            let index_size = view.format.index_size_in_bytes().unwrap_or(0) as u64;
                            let end = (*start_index as u64 + *index_count as u64) * index_size;
                            if index_size == 0 || end > view.size_in_bytes as u64 {
                                self.violation(format!(
                                    "indexed draw reads {} bytes of a {} byte {:?} index buffer",
                                    end, view.size_in_bytes, view.format
                                ));
                            }
                        }
                        None => self.violation("indexed draw with no index buffer bound".to_string()),
                    }
                }
                _ => {}
            }
        }
    }
}
