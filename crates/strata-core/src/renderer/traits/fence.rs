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

/// A monotonically increasing completion counter signaled by the GPU.
///
/// Submissions signal the fence to a value; the CPU observes progress through
/// [`GpuFence::completed_value`].
pub trait GpuFence {
    /// The highest value the GPU has signaled so far.
    fn completed_value(&self) -> u64;

    /// Gives the backend a chance to process completion callbacks.
    ///
    /// Called repeatedly while the CPU waits on the fence.
    fn poll(&self);
}
