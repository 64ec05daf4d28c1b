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

//! Fixed-function state blocks of a pipeline description.
//!
//! `Hash` is implemented by hand on every block that carries floats: each
//! field is fed explicitly (floats by their bit pattern), so the pipeline
//! cache key only ever depends on meaningful values.

use super::enums::*;
use super::MAX_RENDER_TARGETS;
use std::hash::{Hash, Hasher};

/// Rasterizer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerState {
    /// Which faces are culled.
    pub cull_mode: CullMode,
    /// Winding order of front faces.
    pub front_face: FrontFace,
    /// Solid or wireframe.
    pub fill_mode: FillMode,
    /// If `false`, the three depth bias fields are ignored.
    pub depth_bias_enabled: bool,
    /// Constant depth bias.
    pub depth_bias: i32,
    /// Maximum depth bias.
    pub depth_bias_clamp: f32,
    /// Slope-scaled depth bias.
    pub depth_bias_slope_factor: f32,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            fill_mode: FillMode::Solid,
            depth_bias_enabled: false,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 0.0,
        }
    }
}

impl Hash for RasterizerState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cull_mode.hash(state);
        self.front_face.hash(state);
        self.fill_mode.hash(state);
        self.depth_bias_enabled.hash(state);
        if self.depth_bias_enabled {
            self.depth_bias.hash(state);
            self.depth_bias_clamp.to_bits().hash(state);
            self.depth_bias_slope_factor.to_bits().hash(state);
        }
    }
}

/// Stencil operations for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthStencilOpDesc {
    /// Applied when the stencil test fails.
    pub stencil_fail_op: StencilOp,
    /// Applied when the stencil test passes and the depth test fails.
    pub stencil_depth_fail_op: StencilOp,
    /// Applied when both tests pass.
    pub stencil_pass_op: StencilOp,
    /// The stencil comparison.
    pub stencil_func: ComparisonFunc,
}

/// Depth and stencil test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Enables the depth test.
    pub depth_enable: bool,
    /// Enables depth writes.
    pub depth_write_enable: bool,
    /// The depth comparison.
    pub depth_func: ComparisonFunc,
    /// Enables the stencil test.
    pub stencil_enable: bool,
    /// Mask applied when reading stencil.
    pub stencil_read_mask: u8,
    /// Mask applied when writing stencil.
    pub stencil_write_mask: u8,
    /// Operations for front-facing triangles.
    pub front_face: DepthStencilOpDesc,
    /// Operations for back-facing triangles.
    pub back_face: DepthStencilOpDesc,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_enable: false,
            depth_write_enable: false,
            depth_func: ComparisonFunc::Less,
            stencil_enable: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            front_face: DepthStencilOpDesc::default(),
            back_face: DepthStencilOpDesc::default(),
        }
    }
}

/// Bit mask of the color channels a render target writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorWriteMask(pub u8);

impl ColorWriteMask {
    /// Red channel.
    pub const RED: Self = Self(1);
    /// Green channel.
    pub const GREEN: Self = Self(2);
    /// Blue channel.
    pub const BLUE: Self = Self(4);
    /// Alpha channel.
    pub const ALPHA: Self = Self(8);
    /// All channels.
    pub const ALL: Self = Self(15);

    /// Returns `true` if every channel of `other` is in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blending of one render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetBlendState {
    /// Enables blending; when `false` the source color replaces the destination.
    pub blend_enable: bool,
    /// Source color factor.
    pub src_blend: BlendFactor,
    /// Destination color factor.
    pub dest_blend: BlendFactor,
    /// Color combine operation.
    pub blend_op: BlendOp,
    /// Source alpha factor.
    pub src_blend_alpha: BlendFactor,
    /// Destination alpha factor.
    pub dest_blend_alpha: BlendFactor,
    /// Alpha combine operation.
    pub blend_op_alpha: BlendOp,
    /// Channels written.
    pub render_target_write_mask: ColorWriteMask,
}

impl Default for RenderTargetBlendState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_blend: BlendFactor::One,
            dest_blend: BlendFactor::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dest_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOp::Add,
            render_target_write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Blending of every render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendState {
    /// Use alpha as a coverage mask.
    pub alpha_to_coverage_enable: bool,
    /// If `false`, `render_targets[0]` applies to every target.
    pub independent_blend_enable: bool,
    /// Per-target blending.
    pub render_targets: [RenderTargetBlendState; MAX_RENDER_TARGETS],
}

impl BlendState {
    /// The blend state that applies to render target `index`.
    pub fn for_target(&self, index: usize) -> &RenderTargetBlendState {
        if self.independent_blend_enable {
            &self.render_targets[index]
        } else {
            &self.render_targets[0]
        }
    }
}

/// One constant buffer binding slot.
///
/// Slots are scanned in order and the first disabled slot ends the scan, so
/// slots after a gap are never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConstantBufferState {
    /// Whether the slot is used.
    pub enabled: bool,
    /// The stages that read the buffer.
    pub shader_visibility: ShaderVisibility,
}

/// One vertex attribute slot. The same first-disabled-ends-the-scan rule as
/// [`ConstantBufferState`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InputLayout {
    /// Whether the slot is used.
    pub enabled: bool,
    /// Semantic name, e.g. `"POSITION"`.
    pub semantic: &'static str,
    /// Semantic index.
    pub index: u32,
    /// Attribute format.
    pub format: InputFormat,
    /// Vertex buffer slot the attribute is read from.
    pub slot: u32,
    /// Byte offset inside the vertex.
    pub aligned_byte_offset: u32,
    /// Per-vertex or per-instance.
    pub input_classification: InputClassification,
    /// Instances drawn before advancing a per-instance attribute.
    pub instance_data_step_rate: u32,
}

impl InputLayout {
    /// An enabled per-vertex attribute.
    pub fn per_vertex(semantic: &'static str, format: InputFormat, offset: u32) -> Self {
        Self {
            enabled: true,
            semantic,
            index: 0,
            format,
            slot: 0,
            aligned_byte_offset: offset,
            input_classification: InputClassification::PerVertex,
            instance_data_step_rate: 0,
        }
    }
}

/// A static sampler. The first disabled sampler ends the scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    /// Whether the sampler is used.
    pub enabled: bool,
    /// Filtering.
    pub filter: SamplerFilter,
    /// Addressing along U.
    pub address_u: TextureAddressMode,
    /// Addressing along V.
    pub address_v: TextureAddressMode,
    /// Addressing along W.
    pub address_w: TextureAddressMode,
    /// Bias added to the computed mip level.
    pub mip_lod_bias: f32,
    /// Anisotropy clamp for [`SamplerFilter::Anisotropic`].
    pub max_anisotropy: u32,
    /// Comparison used by comparison filters.
    pub comparison_func: ComparisonFunc,
    /// Border color for [`TextureAddressMode::Border`].
    pub border_color: StaticBorderColor,
    /// Lowest mip level.
    pub min_lod: f32,
    /// Highest mip level.
    pub max_lod: f32,
    /// The stages that sample with it.
    pub shader_visibility: ShaderVisibility,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: SamplerFilter::Linear,
            address_u: TextureAddressMode::Wrap,
            address_v: TextureAddressMode::Wrap,
            address_w: TextureAddressMode::Wrap,
            mip_lod_bias: 0.0,
            max_anisotropy: 1,
            comparison_func: ComparisonFunc::Never,
            border_color: StaticBorderColor::TransparentBlack,
            min_lod: 0.0,
            max_lod: f32::MAX,
            shader_visibility: ShaderVisibility::Pixel,
        }
    }
}

impl Hash for SamplerState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.enabled.hash(state);
        self.filter.hash(state);
        self.address_u.hash(state);
        self.address_v.hash(state);
        self.address_w.hash(state);
        self.mip_lod_bias.to_bits().hash(state);
        self.max_anisotropy.hash(state);
        self.comparison_func.hash(state);
        self.border_color.hash(state);
        self.min_lod.to_bits().hash(state);
        self.max_lod.to_bits().hash(state);
        self.shader_visibility.hash(state);
    }
}
