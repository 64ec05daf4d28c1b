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

//! Materials: shaders and per-material state bundled under one id.
//!
//! A material supplies everything of a graphics pipeline except the
//! rasterizer, depth-stencil and target setup, which the pass drawing it
//! provides through a [`MaterialPipelineDesc`].

use super::pipeline::*;
use crate::handle::{MaterialId, PixelShaderId, TextureId, VertexShaderId};
use crate::render_graph::RenderPassMutableResource;
use crate::renderer::error::RenderError;
use std::borrow::Cow;

/// Shaders, blending, slot layouts and textures of a material.
///
/// The slot lists are dense: entry `i` lands in register `i` of the
/// pipeline built from the material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDesc {
    /// Name shown in logs.
    pub debug_name: Cow<'static, str>,
    /// The vertex shader.
    pub vertex_shader: VertexShaderId,
    /// The pixel shader. An invalid id makes depth-only pipelines.
    pub pixel_shader: PixelShaderId,
    /// Color blending of the material's outputs.
    pub blend_state: BlendState,
    /// Constant buffer slots.
    pub constant_buffer_states: Vec<ConstantBufferState>,
    /// Vertex attributes.
    pub input_layouts: Vec<InputLayout>,
    /// Static samplers.
    pub samplers: Vec<SamplerState>,
    /// Textures bound in order to the pixel shader.
    pub textures: Vec<TextureId>,
}

impl MaterialDesc {
    /// A material with the given shaders and no slots.
    pub fn new(
        debug_name: impl Into<Cow<'static, str>>,
        vertex_shader: VertexShaderId,
        pixel_shader: PixelShaderId,
    ) -> Self {
        Self {
            debug_name: debug_name.into(),
            vertex_shader,
            pixel_shader,
            ..Default::default()
        }
    }

    /// Checks the slot lists against the pipeline limits and that every
    /// listed slot is enabled.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |reason: String| RenderError::ResourceCreationFailed {
            kind: "Material",
            reason: format!("'{}': {reason}", self.debug_name),
        };
        let check = |what: &str, len: usize, max: usize, all_enabled: bool| {
            if len > max {
                return Err(invalid(format!("{len} {what}, at most {max} allowed")));
            }
            if !all_enabled {
                return Err(invalid(format!("{what} must list enabled slots only")));
            }
            Ok(())
        };

        if !self.vertex_shader.is_valid() {
            return Err(invalid("no vertex shader".to_string()));
        }
        check(
            "constant buffers",
            self.constant_buffer_states.len(),
            MAX_CONSTANT_BUFFERS,
            self.constant_buffer_states.iter().all(|cb| cb.enabled),
        )?;
        check(
            "input layouts",
            self.input_layouts.len(),
            MAX_INPUT_LAYOUTS,
            self.input_layouts.iter().all(|input| input.enabled),
        )?;
        check(
            "samplers",
            self.samplers.len(),
            MAX_BOUND_TEXTURES,
            self.samplers.iter().all(|sampler| sampler.enabled),
        )?;
        check(
            "textures",
            self.textures.len(),
            MAX_BOUND_TEXTURES,
            self.textures.iter().all(|texture| texture.is_valid()),
        )
    }

    /// The pipeline states of this material combined with the pass-provided
    /// rasterizer and depth-stencil state.
    pub fn pipeline_states(
        &self,
        rasterizer_state: RasterizerState,
        depth_stencil_state: DepthStencilState,
    ) -> GraphicsPipelineStates {
        let mut states = GraphicsPipelineStates {
            vertex_shader: self.vertex_shader,
            pixel_shader: self.pixel_shader,
            rasterizer_state,
            depth_stencil_state,
            blend_state: self.blend_state,
            ..Default::default()
        };
        for (slot, cb) in states
            .constant_buffer_states
            .iter_mut()
            .zip(&self.constant_buffer_states)
        {
            *slot = *cb;
        }
        for (slot, input) in states.input_layouts.iter_mut().zip(&self.input_layouts) {
            *slot = *input;
        }
        for (slot, sampler) in states.samplers.iter_mut().zip(&self.samplers) {
            *slot = *sampler;
        }
        states
    }
}

/// A graphics pipeline built from a material and the drawing pass's state.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPipelineDesc {
    /// Name shown in debuggers and logs. Not part of the cache key.
    pub debug_name: Cow<'static, str>,
    /// The material providing shaders, blending, slots and textures.
    pub material: MaterialId,
    /// Rasterizer configuration.
    pub rasterizer_state: RasterizerState,
    /// Depth and stencil testing.
    pub depth_stencil_state: DepthStencilState,
    /// Color targets; the first invalid token ends the list.
    pub render_targets: [RenderPassMutableResource; MAX_RENDER_TARGETS],
    /// Depth target.
    pub depth_stencil: RenderPassMutableResource,
}

impl MaterialPipelineDesc {
    /// A description drawing `material` with default state and no targets.
    pub fn new(debug_name: impl Into<Cow<'static, str>>, material: MaterialId) -> Self {
        Self {
            debug_name: debug_name.into(),
            material,
            rasterizer_state: RasterizerState::default(),
            depth_stencil_state: DepthStencilState::default(),
            render_targets: [RenderPassMutableResource::INVALID; MAX_RENDER_TARGETS],
            depth_stencil: RenderPassMutableResource::INVALID,
        }
    }

    /// The leading valid render target tokens.
    pub fn active_render_targets(&self) -> &[RenderPassMutableResource] {
        &self.render_targets[..enabled_prefix(&self.render_targets, |rt| rt.is_valid())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_material() -> MaterialDesc {
        let mut desc = MaterialDesc::new("Lit", VertexShaderId::new(0), PixelShaderId::new(0));
        desc.constant_buffer_states = vec![
            ConstantBufferState {
                enabled: true,
                shader_visibility: ShaderVisibility::Vertex,
            },
            ConstantBufferState {
                enabled: true,
                shader_visibility: ShaderVisibility::Pixel,
            },
        ];
        desc.input_layouts = vec![InputLayout::per_vertex(
            "POSITION",
            InputFormat::R32G32B32Float,
            0,
        )];
        desc
    }

    #[test]
    fn pipeline_states_place_slots_in_order() {
        let material = lit_material();
        let mut depth = DepthStencilState::default();
        depth.depth_enable = true;

        let states = material.pipeline_states(RasterizerState::default(), depth);
        assert_eq!(states.vertex_shader, material.vertex_shader);
        assert_eq!(states.depth_stencil_state, depth);
        assert_eq!(states.active_constant_buffers(), &material.constant_buffer_states[..]);
        assert_eq!(states.active_input_layouts(), &material.input_layouts[..]);
        assert!(states.active_samplers().is_empty());
    }

    #[test]
    fn disabled_slots_and_overflow_are_rejected() {
        assert!(lit_material().validate().is_ok());

        let mut gap = lit_material();
        gap.constant_buffer_states[0].enabled = false;
        assert!(gap.validate().is_err());

        let mut crowded = lit_material();
        crowded.textures = vec![TextureId::new(0); MAX_BOUND_TEXTURES + 1];
        assert!(crowded.validate().is_err());

        let no_shader = MaterialDesc::new("Empty", VertexShaderId::INVALID, PixelShaderId::INVALID);
        assert!(no_shader.validate().is_err());
    }
}
