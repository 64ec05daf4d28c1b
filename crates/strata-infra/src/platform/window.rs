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
use strata_core::renderer::{Window, WindowHandle};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// A window without an OS surface.
///
/// The backend renders its back buffers offscreen; their content is read back
/// through `WgpuBackend::read_back`.
#[derive(Debug, Clone)]
pub struct OffscreenWindow {
    handle: WindowHandle,
    size: (u32, u32),
    frame_buffers: u32,
}

impl OffscreenWindow {
    /// Creates a window of `width` x `height` pixels with `frame_buffers` back buffers.
    pub fn new(width: u32, height: u32, frame_buffers: u32) -> Self {
        Self {
            handle: WindowHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)),
            size: (width, height),
            frame_buffers,
        }
    }
}

impl Window for OffscreenWindow {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn frame_buffer_count(&self) -> u32 {
        self.frame_buffers
    }

    fn is_full_screen(&self) -> bool {
        false
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }
}
