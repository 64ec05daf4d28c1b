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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_core::renderer::GpuFence;

/// A completion counter driven by queue submission callbacks.
///
/// wgpu has no timeline fences. Each submission registers an
/// `on_submitted_work_done` callback that raises the counter to the value
/// the submission signals; [`GpuFence::poll`] lets the device run those
/// callbacks.
#[derive(Debug, Clone)]
pub struct WgpuFence {
    completed: Arc<AtomicU64>,
    device: wgpu::Device,
}

impl WgpuFence {
    pub(crate) fn new(device: wgpu::Device) -> Self {
        Self {
            completed: Arc::new(AtomicU64::new(0)),
            device,
        }
    }

    /// Raises the counter to `value` once everything submitted so far on
    /// `queue` has executed.
    pub(crate) fn signal_on_completion(&self, queue: &wgpu::Queue, value: u64) {
        let completed = Arc::clone(&self.completed);
        queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
    }
}

impl GpuFence for WgpuFence {
    fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn poll(&self) {
        // PollType::Poll is non-blocking. It processes any completed work
        // and fires the matching callbacks.
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("WgpuFence: device poll failed: {e}");
        }
    }
}
