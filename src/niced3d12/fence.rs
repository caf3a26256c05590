use super::*;

use std::time::Duration;

use log::{error, trace};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EFenceState {
    Idle,
    Pending(u64),
    Retired(u64),
}

// -- The only way the CPU learns the GPU is done with something. Values only go up: signal()
// -- hands out 1, 2, 3... in submission order.
pub struct SFrameFence<B: TBackend> {
    raw: B::Fence,

    fenceevent: B::Event,
    nextfencevalue: u64,
    wait_timeout: Option<Duration>,
}

impl<B: TBackend> SFrameFence<B> {
    pub fn new(ctx: &SDeviceContext<B>, wait_timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            raw: ctx.device().createfence(0)?,
            fenceevent: B::Event::create()?,
            nextfencevalue: 1,
            wait_timeout,
        })
    }

    pub fn raw(&self) -> &B::Fence {
        &self.raw
    }

    pub fn last_signalled_value(&self) -> u64 {
        self.nextfencevalue - 1
    }

    pub fn completed_value(&self) -> u64 {
        self.raw.getcompletedvalue()
    }

    pub fn state(&self) -> EFenceState {
        let last = self.last_signalled_value();
        if last == 0 {
            EFenceState::Idle
        } else if self.completed_value() >= last {
            EFenceState::Retired(last)
        } else {
            EFenceState::Pending(last)
        }
    }

    // -- doesn't block, the queue writes the value once everything before it has executed
    pub fn signal(&mut self, queue: &B::CommandQueue) -> Result<u64> {
        let result = self.nextfencevalue;
        queue.signal(&self.raw, result)?;
        self.nextfencevalue += 1;
        trace!("Signalled fence value {}", result);
        Ok(result)
    }

    pub fn wait_for_value(&self, val: u64) -> Result<()> {
        debug_assert!(
            val <= self.last_signalled_value(),
            "waiting on fence value {} that was never signalled",
            val
        );

        while self.raw.getcompletedvalue() < val {
            trace!(
                "Blocking on fence value {} (completed {})",
                val,
                self.raw.getcompletedvalue()
            );

            self.raw.seteventoncompletion(val, &self.fenceevent)?;
            if !self.fenceevent.waitforsingleobject(self.wait_timeout) {
                let completed = self.raw.getcompletedvalue();
                error!(
                    "Gave up on fence value {} after {:?}, completed {}",
                    val, self.wait_timeout, completed
                );
                return Err(EError::FenceTimeout {
                    value: val,
                    completed,
                });
            }
        }

        Ok(())
    }

    pub fn wait_for_last_signalled(&self) -> Result<()> {
        self.wait_for_value(self.last_signalled_value())
    }
}
