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

//! Enums for pipeline configuration.

/// Which triangle faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

/// The winding order that makes a triangle front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Clockwise triangles are front-facing.
    Clockwise,
    /// Counter-clockwise triangles are front-facing.
    #[default]
    CounterClockwise,
}

/// How polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    /// Fill the triangle interior.
    #[default]
    Solid,
    /// Draw triangle edges only.
    Wireframe,
}

/// A comparison function for depth, stencil and sampler tests.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// The operation applied to a stencil value.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementSaturate,
    DecrementSaturate,
    Invert,
    Increment,
    Decrement,
}

/// A blend factor.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSaturate,
    BlendFactor,
    InvBlendFactor,
}

/// How source and destination blend terms are combined.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    RevSubtract,
    Min,
    Max,
}

/// The format of one vertex attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFormat {
    #[default]
    Unknown,
    R32G32B32A32Float,
    R32G32B32Float,
    R32G32Float,
    R32Float,
    R32G32B32A32Uint,
    R32Uint,
    R8G8B8A8Unorm,
}

impl InputFormat {
    /// Size of the attribute in bytes.
    pub fn size(self) -> u32 {
        match self {
            InputFormat::Unknown => 0,
            InputFormat::R32G32B32A32Float | InputFormat::R32G32B32A32Uint => 16,
            InputFormat::R32G32B32Float => 12,
            InputFormat::R32G32Float => 8,
            InputFormat::R32Float | InputFormat::R32Uint | InputFormat::R8G8B8A8Unorm => 4,
        }
    }
}

/// Whether a vertex attribute advances per vertex or per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputClassification {
    /// Advance once per vertex.
    #[default]
    PerVertex,
    /// Advance once per instance.
    PerInstance,
}

/// The shader stages a bound parameter is visible to.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderVisibility {
    #[default]
    All,
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

/// Texture filtering of a static sampler.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerFilter {
    Point,
    #[default]
    Linear,
    Anisotropic,
    ComparisonPoint,
    ComparisonLinear,
}

/// How a sampler resolves coordinates outside `[0, 1]`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAddressMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// The border color of a sampler using [`TextureAddressMode::Border`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StaticBorderColor {
    #[default]
    TransparentBlack,
    OpaqueBlack,
    OpaqueWhite,
}
