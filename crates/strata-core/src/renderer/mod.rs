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

//! The renderer, its resource handlers and the backend contract.

pub mod api;
pub mod command_list;
pub mod constant_buffer;
pub mod error;
pub mod frame_pacing;
pub mod material_handler;
pub mod model_handler;
pub mod pipeline_cache;
pub mod render_layer;
pub mod resource_handler;
pub mod shader_handler;
pub mod traits;

mod frontend;

pub use self::api::*;
pub use self::command_list::{Command, CommandList, ScopedMarker};
pub use self::constant_buffer::ConstantBuffer;
pub use self::error::{RenderError, TextureError};
pub use self::frame_pacing::FramePacer;
pub use self::frontend::Renderer;
pub use self::render_layer::{InstanceData, RenderLayer};
pub use self::traits::{GpuFence, ModelLoader, RenderBackend, Window, WindowHandle};
