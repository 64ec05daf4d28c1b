// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame-in-flight pacing.
//!
//! Each slot owns a fence and the last value submissions of that slot signaled
//! it to. Before the CPU reuses a slot, [`FramePacer::begin_frame`] blocks
//! until the GPU has reached that value, and only then lets the backend
//! recycle the slot's command memory and per-frame buffers.

use crate::renderer::error::RenderError;
use crate::renderer::traits::{GpuFence, RenderBackend};
use std::time::{Duration, Instant};

/// Busy-yield iterations before a fence wait starts sleeping.
const SPIN_LIMIT: u32 = 64;
const SLEEP_STEP: Duration = Duration::from_micros(200);

struct FrameSlot<F> {
    fence: F,
    last_signaled: u64,
    resets: u64,
}

/// Rotates through the frame-in-flight slots.
pub struct FramePacer<F: GpuFence> {
    slots: Vec<FrameSlot<F>>,
    current: usize,
    timeout: Duration,
    frame_count: u64,
}

/// Blocks until `fence` reaches `value`, failing with
/// [`RenderError::DeviceLost`] after `timeout`.
pub fn wait_for_fence<F: GpuFence>(
    fence: &F,
    value: u64,
    timeout: Duration,
) -> Result<(), RenderError> {
    if fence.completed_value() >= value {
        return Ok(());
    }
    let start = Instant::now();
    let mut spins = 0;
    loop {
        fence.poll();
        let completed = fence.completed_value();
        if completed >= value {
            log::trace!(
                "FramePacer: Fence reached {value} after {:?}",
                start.elapsed()
            );
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(RenderError::DeviceLost {
                reason: format!(
                    "fence stuck at {completed}, waited {:?} for {value}",
                    timeout
                ),
            });
        }
        if spins < SPIN_LIMIT {
            spins += 1;
            std::thread::yield_now();
        } else {
            std::thread::sleep(SLEEP_STEP);
        }
    }
}

impl<F: GpuFence> FramePacer<F> {
    /// Creates `frames_in_flight` slots, each with a fresh fence.
    pub fn new<B>(
        backend: &mut B,
        frames_in_flight: u32,
        timeout: Duration,
    ) -> Result<Self, RenderError>
    where
        B: RenderBackend<Fence = F>,
    {
        let slots = (0..frames_in_flight.max(1))
            .map(|_| {
                Ok(FrameSlot {
                    fence: backend.create_fence()?,
                    last_signaled: 0,
                    resets: 0,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;
        Ok(Self {
            slots,
            current: 0,
            timeout,
            frame_count: 0,
        })
    }

    /// The slot the current frame records into.
    pub fn frame_index(&self) -> usize {
        self.current
    }

    /// Number of slots.
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Number of frames ended so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The last value submissions of `slot` signaled.
    pub fn last_signaled(&self, slot: usize) -> Option<u64> {
        self.slots.get(slot).map(|s| s.last_signaled)
    }

    /// How many times `slot` was recycled.
    pub fn reset_count(&self, slot: usize) -> Option<u64> {
        self.slots.get(slot).map(|s| s.resets)
    }

    /// Waits for the GPU to finish the current slot's previous work, then
    /// recycles the slot.
    ///
    /// # Errors
    ///
    /// [`RenderError::DeviceLost`] if the fence does not advance in time; the
    /// slot is left untouched.
    pub fn begin_frame<B>(&mut self, backend: &mut B) -> Result<(), RenderError>
    where
        B: RenderBackend<Fence = F>,
    {
        let index = self.current;
        let slot = &mut self.slots[index];
        if let Err(err) = wait_for_fence(&slot.fence, slot.last_signaled, self.timeout) {
            log::error!("FramePacer: Frame slot {index} never completed: {err}");
            return Err(err);
        }
        backend.reset_frame_slot(index)?;
        slot.resets += 1;
        Ok(())
    }

    /// The current slot's fence and the value the next submission signals.
    ///
    /// The value only counts as signaled once [`FramePacer::commit_signal`]
    /// records it, so a list that fails before reaching the queue leaves the
    /// slot waiting on nothing.
    pub fn next_signal(&self) -> (&F, u64) {
        let slot = &self.slots[self.current];
        (&slot.fence, slot.last_signaled + 1)
    }

    /// Records that a submission of the current slot will signal `value`.
    pub fn commit_signal(&mut self, value: u64) {
        let slot = &mut self.slots[self.current];
        slot.last_signaled = slot.last_signaled.max(value);
    }

    /// Moves on to the next slot.
    pub fn end_frame(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
        self.frame_count += 1;
    }

    /// Blocks until every slot's submitted work is complete.
    pub fn wait_idle(&self) -> Result<(), RenderError> {
        for slot in &self.slots {
            wait_for_fence(&slot.fence, slot.last_signaled, self.timeout)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StepFence {
        completed: Cell<u64>,
        step_on_poll: u64,
    }

    impl GpuFence for StepFence {
        fn completed_value(&self) -> u64 {
            self.completed.get()
        }

        fn poll(&self) {
            self.completed.set(self.completed.get() + self.step_on_poll);
        }
    }

    #[test]
    fn completed_fence_returns_immediately() {
        let fence = StepFence {
            completed: Cell::new(5),
            step_on_poll: 0,
        };
        assert!(wait_for_fence(&fence, 5, Duration::ZERO).is_ok());
    }

    #[test]
    fn polling_advances_the_fence() {
        let fence = StepFence {
            completed: Cell::new(0),
            step_on_poll: 1,
        };
        assert!(wait_for_fence(&fence, 3, Duration::from_secs(5)).is_ok());
        assert_eq!(fence.completed_value(), 3);
    }

    #[test]
    fn stuck_fence_times_out_as_device_lost() {
        let fence = StepFence {
            completed: Cell::new(1),
            step_on_poll: 0,
        };
        let err = wait_for_fence(&fence, 2, Duration::from_millis(10)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, RenderError::DeviceLost { .. }));
    }
}
