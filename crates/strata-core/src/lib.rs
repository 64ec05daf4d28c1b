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

//! # Strata Core
//!
//! The backend-agnostic half of the Strata renderer.
//!
//! - [`handle`]: typed `u16` handles and the registries that issue them.
//! - [`renderer`]: resource handlers, materials, the pipeline cache, command lists, render
//!   layers, frame pacing and the [`RenderBackend`](renderer::RenderBackend)
//!   contract a GPU backend implements.
//! - [`render_graph`]: the per-frame pass graph.
//! - [`graph`]: generic graph algorithms.

#![warn(missing_docs)]

pub mod graph;
pub mod handle;
pub mod render_graph;
pub mod renderer;

pub use handle::{
    ComputePipelineId, ComputeShaderId, ConstantBufferId, DepthImageId, GraphicsPipelineId, Handle,
    ImageId, MaterialId, ModelId, PixelShaderId, TextureId, VertexShaderId,
};
pub use render_graph::{PassContext, RenderGraph, RenderPassBuilder};
pub use renderer::{RenderError, Renderer};
