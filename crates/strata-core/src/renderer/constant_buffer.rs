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

//! Typed CPU-side constant buffer values.

use crate::handle::ConstantBufferId;
use bytemuck::Pod;

/// The size and type name recorded for each constant buffer the renderer hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBufferInfo {
    /// Size of the value in bytes.
    pub size: usize,
    /// Rust type name of the value, for diagnostics.
    pub type_name: &'static str,
}

/// A shader-visible value of type `T`.
///
/// The value lives on the CPU. Recording a `SetConstantBuffer` command copies
/// its current bytes into the command, so the buffer can be rewritten between
/// draws: every draw sees the value as it was when its command was recorded.
/// Created through [`Renderer::create_constant_buffer`](crate::renderer::Renderer::create_constant_buffer).
#[derive(Debug, Clone)]
pub struct ConstantBuffer<T: Pod> {
    id: ConstantBufferId,
    resource: T,
}

impl<T: Pod> ConstantBuffer<T> {
    pub(crate) fn new(id: ConstantBufferId, resource: T) -> Self {
        Self { id, resource }
    }

    /// The id of the buffer.
    pub fn id(&self) -> ConstantBufferId {
        self.id
    }

    /// The current value.
    pub fn resource(&self) -> &T {
        &self.resource
    }

    /// The current value, for in-place updates.
    pub fn resource_mut(&mut self) -> &mut T {
        &mut self.resource
    }

    /// Replaces the current value.
    pub fn set(&mut self, value: T) {
        self.resource = value;
    }

    /// The current value as bytes.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.resource)
    }

    /// Size of `T` in bytes.
    pub const fn size() -> usize {
        std::mem::size_of::<T>()
    }
}
