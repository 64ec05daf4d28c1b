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

//! Pipeline descriptions as declared by render passes.

use super::layout::enabled_prefix;
use super::state::*;
use super::{MAX_BOUND_TEXTURES, MAX_CONSTANT_BUFFERS, MAX_INPUT_LAYOUTS, MAX_RENDER_TARGETS};
use crate::handle::{ComputeShaderId, PixelShaderId, VertexShaderId};
use crate::render_graph::{RenderPassMutableResource, RenderPassResource};
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// Shaders and fixed-function state of a graphics pipeline.
///
/// Hashing covers the shaders, the fixed-function states and the enabled
/// prefix of each slot array; slots after the first disabled one are ignored
/// by the layout builder and so are not part of the pipeline cache key.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GraphicsPipelineStates {
    /// The vertex shader.
    pub vertex_shader: VertexShaderId,
    /// The pixel shader. An invalid id builds a depth-only pipeline.
    pub pixel_shader: PixelShaderId,
    /// Rasterizer configuration.
    pub rasterizer_state: RasterizerState,
    /// Depth and stencil testing.
    pub depth_stencil_state: DepthStencilState,
    /// Color blending.
    pub blend_state: BlendState,
    /// Constant buffer slots, register `i` at index `i`.
    pub constant_buffer_states: [ConstantBufferState; MAX_CONSTANT_BUFFERS],
    /// Vertex attributes.
    pub input_layouts: [InputLayout; MAX_INPUT_LAYOUTS],
    /// Static samplers, register `i` at index `i`.
    pub samplers: [SamplerState; MAX_BOUND_TEXTURES],
}

impl GraphicsPipelineStates {
    /// The leading enabled constant buffer slots.
    pub fn active_constant_buffers(&self) -> &[ConstantBufferState] {
        active_constant_buffers(&self.constant_buffer_states)
    }

    /// The leading enabled vertex attributes.
    pub fn active_input_layouts(&self) -> &[InputLayout] {
        &self.input_layouts[..enabled_prefix(&self.input_layouts, |slot| slot.enabled)]
    }

    /// The leading enabled static samplers.
    pub fn active_samplers(&self) -> &[SamplerState] {
        &self.samplers[..enabled_prefix(&self.samplers, |slot| slot.enabled)]
    }
}

impl Hash for GraphicsPipelineStates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertex_shader.hash(state);
        self.pixel_shader.hash(state);
        self.rasterizer_state.hash(state);
        self.depth_stencil_state.hash(state);
        self.blend_state.hash(state);
        self.active_constant_buffers().hash(state);
        self.active_input_layouts().hash(state);
        self.active_samplers().hash(state);
    }
}

fn active_constant_buffers(slots: &[ConstantBufferState]) -> &[ConstantBufferState] {
    &slots[..enabled_prefix(slots, |slot| slot.enabled)]
}

/// Describes a graphics pipeline in terms of render pass tokens.
///
/// Targets and bound textures are tokens obtained from a
/// [`RenderPassBuilder`](crate::render_graph::RenderPassBuilder); the pipeline
/// cache resolves them back to images when the pipeline is created. In each
/// array the first invalid token ends the list.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDesc {
    /// Name shown in debuggers and logs. Not part of the cache key.
    pub debug_name: Cow<'static, str>,
    /// Shaders and fixed-function state.
    pub states: GraphicsPipelineStates,
    /// Textures read by the pixel shader, register `i` at index `i`.
    pub textures: [RenderPassResource; MAX_BOUND_TEXTURES],
    /// Color targets.
    pub render_targets: [RenderPassMutableResource; MAX_RENDER_TARGETS],
    /// Depth target.
    pub depth_stencil: RenderPassMutableResource,
}

impl Default for GraphicsPipelineDesc {
    fn default() -> Self {
        Self {
            debug_name: Cow::Borrowed("GraphicsPipeline"),
            states: GraphicsPipelineStates::default(),
            textures: [RenderPassResource::INVALID; MAX_BOUND_TEXTURES],
            render_targets: [RenderPassMutableResource::INVALID; MAX_RENDER_TARGETS],
            depth_stencil: RenderPassMutableResource::INVALID,
        }
    }
}

impl GraphicsPipelineDesc {
    /// A description with the given name and shaders and default state.
    pub fn new(
        debug_name: impl Into<Cow<'static, str>>,
        vertex_shader: VertexShaderId,
        pixel_shader: PixelShaderId,
    ) -> Self {
        let mut desc = Self {
            debug_name: debug_name.into(),
            ..Default::default()
        };
        desc.states.vertex_shader = vertex_shader;
        desc.states.pixel_shader = pixel_shader;
        desc
    }

    /// The leading valid render target tokens.
    pub fn active_render_targets(&self) -> &[RenderPassMutableResource] {
        &self.render_targets[..enabled_prefix(&self.render_targets, |rt| rt.is_valid())]
    }

    /// The leading valid bound texture tokens.
    pub fn active_textures(&self) -> &[RenderPassResource] {
        &self.textures[..enabled_prefix(&self.textures, |t| t.is_valid())]
    }
}

/// Describes a compute pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputePipelineDesc {
    /// Name shown in debuggers and logs. Not part of the cache key.
    pub debug_name: Cow<'static, str>,
    /// The compute shader.
    pub compute_shader: ComputeShaderId,
    /// Constant buffer slots, register `i` at index `i`.
    pub constant_buffer_states: [ConstantBufferState; MAX_CONSTANT_BUFFERS],
}

impl ComputePipelineDesc {
    /// A description with the given name and shader and no constant buffers.
    pub fn new(debug_name: impl Into<Cow<'static, str>>, compute_shader: ComputeShaderId) -> Self {
        Self {
            debug_name: debug_name.into(),
            compute_shader,
            constant_buffer_states: Default::default(),
        }
    }

    /// The leading enabled constant buffer slots.
    pub fn active_constant_buffers(&self) -> &[ConstantBufferState] {
        active_constant_buffers(&self.constant_buffer_states)
    }
}
