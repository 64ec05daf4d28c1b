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

//! Defines the contracts between the render core and its collaborators.
//!
//! - [`RenderBackend`]: creates native GPU objects and records native commands.
//! - [`Window`]: the surface images are presented to.
//! - [`ModelLoader`]: turns a content path into vertex and index data.
//! - [`GpuFence`]: the completion counter frame pacing waits on.

mod backend;
mod fence;
mod model_loader;
mod window;

pub use self::backend::*;
pub use self::fence::GpuFence;
pub use self::model_loader::ModelLoader;
pub use self::window::{Window, WindowHandle};
