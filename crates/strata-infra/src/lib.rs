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

//! # Strata Infra
//!
//! Concrete implementations of the contracts defined in `strata-core`.
//!
//! - [`graphics::wgpu`]: the wgpu [`RenderBackend`](strata_core::renderer::RenderBackend).
//! - [`platform`]: an offscreen [`Window`](strata_core::renderer::Window).
//! - [`loaders`]: a binary [`ModelLoader`](strata_core::renderer::ModelLoader).

pub mod graphics;
pub mod loaders;
pub mod platform;

pub use graphics::wgpu::{WgpuBackend, WgpuContext, WgpuFence};
pub use loaders::BinaryModelLoader;
pub use platform::OffscreenWindow;
