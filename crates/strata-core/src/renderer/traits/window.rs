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

use std::fmt;

/// An opaque identifier of a native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window#{}", self.0)
    }
}

/// A surface the renderer presents images to.
pub trait Window {
    /// The native handle of the window.
    fn handle(&self) -> WindowHandle;

    /// The number of back buffers of the swap chain.
    fn frame_buffer_count(&self) -> u32;

    /// Returns `true` if the window covers the whole screen.
    fn is_full_screen(&self) -> bool;

    /// The client area size in pixels.
    fn dimensions(&self) -> (u32, u32);
}
