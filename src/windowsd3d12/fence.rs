use super::*;

use std::time::Duration;

use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::shared::ntdef;
use winapi::um::winnt::HANDLE;
use winapi::um::{handleapi, synchapi, winbase};

pub struct SFence {
    fence: ComPtr<ID3D12Fence>,
}

impl SFence {
    pub unsafe fn new_from_raw(raw: ComPtr<ID3D12Fence>) -> Self {
        Self { fence: raw }
    }

    pub unsafe fn raw(&self) -> &ComPtr<ID3D12Fence> {
        &self.fence
    }
}

impl t12::TFence<SWindowsBackend> for SFence {
    fn getcompletedvalue(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn seteventoncompletion(&self, val: u64, event: &SEventHandle) -> Result<()> {
        let hn = unsafe { self.fence.SetEventOnCompletion(val, event.event) };
        returnerrifwinerror!(hn, EError::Backend("Could not set fence event on completion"));
        Ok(())
    }
}

pub struct SEventHandle {
    event: HANDLE,
}

impl t12::TEvent for SEventHandle {
    fn create() -> Result<Self> {
        let event = unsafe { synchapi::CreateEventW(ptr::null_mut(), FALSE, FALSE, ptr::null()) };

        if event == ntdef::NULL {
            return Err(EError::Initialization("Couldn't create event."));
        }

        Ok(Self { event })
    }

    fn waitforsingleobject(&self, timeout: Option<Duration>) -> bool {
        let duration: DWORD = match timeout {
            Some(t) => t.as_millis().min((winbase::INFINITE - 1) as u128) as DWORD,
            None => winbase::INFINITE,
        };
        let result = unsafe { synchapi::WaitForSingleObject(self.event, duration) };
        result == winbase::WAIT_OBJECT_0
    }
}

impl Drop for SEventHandle {
    fn drop(&mut self) {
        unsafe { handleapi::CloseHandle(self.event) };
    }
}
