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

//! The wgpu render backend.

mod backend;
mod command;
mod constants;
mod context;
mod conversions;
mod fence;
mod present;
mod resources;

pub use self::backend::{WgpuBackend, SAMPLER_BINDING_BASE};
pub use self::command::WgpuCommandList;
pub use self::constants::MAX_CONSTANT_BUFFER_SIZE;
pub use self::context::WgpuContext;
pub use self::conversions::IntoWgpu;
pub use self::fence::WgpuFence;
pub use self::present::BACK_BUFFER_FORMAT;
pub use self::resources::*;
