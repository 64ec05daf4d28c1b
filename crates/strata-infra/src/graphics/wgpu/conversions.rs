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

use strata_core::renderer::api::{
    BlendFactor, BlendOp, ComparisonFunc, CullMode, DepthImageFormat, FillMode, FrontFace,
    ImageFormat, InputClassification, InputFormat, SampleCount, SamplerFilter, SamplerState,
    ShaderVisibility, StaticBorderColor, StencilOp, TextureAddressMode,
};

/// A local extension trait to convert the render core's types into wgpu types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a wgpu-compatible type.
    fn into_wgpu(self) -> T;
}

// --- Formats ---

/// `None` for [`ImageFormat::Unknown`].
impl IntoWgpu<Option<wgpu::TextureFormat>> for ImageFormat {
    fn into_wgpu(self) -> Option<wgpu::TextureFormat> {
        use wgpu::TextureFormat as T;
        let format = match self {
            ImageFormat::Unknown => return None,
            ImageFormat::R32G32B32A32Float => T::Rgba32Float,
            ImageFormat::R32G32B32A32Uint => T::Rgba32Uint,
            ImageFormat::R32G32B32A32Sint => T::Rgba32Sint,
            ImageFormat::R16G16B16A16Float => T::Rgba16Float,
            ImageFormat::R16G16B16A16Unorm => T::Rgba16Unorm,
            ImageFormat::R16G16B16A16Uint => T::Rgba16Uint,
            ImageFormat::R16G16B16A16Snorm => T::Rgba16Snorm,
            ImageFormat::R16G16B16A16Sint => T::Rgba16Sint,
            ImageFormat::R32G32Float => T::Rg32Float,
            ImageFormat::R32G32Uint => T::Rg32Uint,
            ImageFormat::R32G32Sint => T::Rg32Sint,
            ImageFormat::R10G10B10A2Unorm => T::Rgb10a2Unorm,
            ImageFormat::R10G10B10A2Uint => T::Rgb10a2Uint,
            ImageFormat::R11G11B10Float => T::Rg11b10Ufloat,
            ImageFormat::R8G8B8A8Unorm => T::Rgba8Unorm,
            ImageFormat::R8G8B8A8UnormSrgb => T::Rgba8UnormSrgb,
            ImageFormat::R8G8B8A8Uint => T::Rgba8Uint,
            ImageFormat::R8G8B8A8Snorm => T::Rgba8Snorm,
            ImageFormat::R8G8B8A8Sint => T::Rgba8Sint,
            ImageFormat::B8G8R8A8Unorm => T::Bgra8Unorm,
            ImageFormat::B8G8R8A8UnormSrgb => T::Bgra8UnormSrgb,
            ImageFormat::R16G16Float => T::Rg16Float,
            ImageFormat::R16G16Unorm => T::Rg16Unorm,
            ImageFormat::R16G16Uint => T::Rg16Uint,
            ImageFormat::R16G16Snorm => T::Rg16Snorm,
            ImageFormat::R16G16Sint => T::Rg16Sint,
            ImageFormat::R32Float => T::R32Float,
            ImageFormat::R32Uint => T::R32Uint,
            ImageFormat::R32Sint => T::R32Sint,
            ImageFormat::R8G8Unorm => T::Rg8Unorm,
            ImageFormat::R8G8Uint => T::Rg8Uint,
            ImageFormat::R8G8Snorm => T::Rg8Snorm,
            ImageFormat::R8G8Sint => T::Rg8Sint,
            ImageFormat::R16Float => T::R16Float,
            ImageFormat::R16Unorm => T::R16Unorm,
            ImageFormat::R16Uint => T::R16Uint,
            ImageFormat::R16Snorm => T::R16Snorm,
            ImageFormat::R16Sint => T::R16Sint,
            ImageFormat::R8Unorm => T::R8Unorm,
            ImageFormat::R8Uint => T::R8Uint,
            ImageFormat::R8Snorm => T::R8Snorm,
            ImageFormat::R8Sint => T::R8Sint,
        };
        Some(format)
    }
}

/// Maps any member of a depth family to the wgpu format of its depth-stencil view.
///
/// wgpu has no typeless formats: the storage, attachment and read views of a
/// depth texture all share this format and differ only by aspect.
impl IntoWgpu<Option<wgpu::TextureFormat>> for DepthImageFormat {
    fn into_wgpu(self) -> Option<wgpu::TextureFormat> {
        let format = match self.split()?.view {
            DepthImageFormat::D32FloatS8X24Uint => wgpu::TextureFormat::Depth32FloatStencil8,
            DepthImageFormat::D32Float => wgpu::TextureFormat::Depth32Float,
            DepthImageFormat::D24UnormS8Uint => wgpu::TextureFormat::Depth24PlusStencil8,
            DepthImageFormat::D16Unorm => wgpu::TextureFormat::Depth16Unorm,
            _ => return None,
        };
        Some(format)
    }
}

impl IntoWgpu<u32> for SampleCount {
    fn into_wgpu(self) -> u32 {
        self.count()
    }
}

/// `None` for [`InputFormat::Unknown`].
impl IntoWgpu<Option<wgpu::VertexFormat>> for InputFormat {
    fn into_wgpu(self) -> Option<wgpu::VertexFormat> {
        let format = match self {
            InputFormat::Unknown => return None,
            InputFormat::R32G32B32A32Float => wgpu::VertexFormat::Float32x4,
            InputFormat::R32G32B32Float => wgpu::VertexFormat::Float32x3,
            InputFormat::R32G32Float => wgpu::VertexFormat::Float32x2,
            InputFormat::R32Float => wgpu::VertexFormat::Float32,
            InputFormat::R32G32B32A32Uint => wgpu::VertexFormat::Uint32x4,
            InputFormat::R32Uint => wgpu::VertexFormat::Uint32,
            InputFormat::R8G8B8A8Unorm => wgpu::VertexFormat::Unorm8x4,
        };
        Some(format)
    }
}

impl IntoWgpu<wgpu::VertexStepMode> for InputClassification {
    fn into_wgpu(self) -> wgpu::VertexStepMode {
        match self {
            InputClassification::PerVertex => wgpu::VertexStepMode::Vertex,
            InputClassification::PerInstance => wgpu::VertexStepMode::Instance,
        }
    }
}

// --- Rasterizer ---

impl IntoWgpu<Option<wgpu::Face>> for CullMode {
    fn into_wgpu(self) -> Option<wgpu::Face> {
        match self {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        }
    }
}

impl IntoWgpu<wgpu::FrontFace> for FrontFace {
    fn into_wgpu(self) -> wgpu::FrontFace {
        match self {
            FrontFace::Clockwise => wgpu::FrontFace::Cw,
            FrontFace::CounterClockwise => wgpu::FrontFace::Ccw,
        }
    }
}

impl IntoWgpu<wgpu::PolygonMode> for FillMode {
    fn into_wgpu(self) -> wgpu::PolygonMode {
        match self {
            FillMode::Solid => wgpu::PolygonMode::Fill,
            FillMode::Wireframe => wgpu::PolygonMode::Line,
        }
    }
}

// --- Depth, stencil and blending ---

impl IntoWgpu<wgpu::CompareFunction> for ComparisonFunc {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            ComparisonFunc::Never => wgpu::CompareFunction::Never,
            ComparisonFunc::Less => wgpu::CompareFunction::Less,
            ComparisonFunc::Equal => wgpu::CompareFunction::Equal,
            ComparisonFunc::LessEqual => wgpu::CompareFunction::LessEqual,
            ComparisonFunc::Greater => wgpu::CompareFunction::Greater,
            ComparisonFunc::NotEqual => wgpu::CompareFunction::NotEqual,
            ComparisonFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            ComparisonFunc::Always => wgpu::CompareFunction::Always,
        }
    }
}

impl IntoWgpu<wgpu::StencilOperation> for StencilOp {
    fn into_wgpu(self) -> wgpu::StencilOperation {
        match self {
            StencilOp::Keep => wgpu::StencilOperation::Keep,
            StencilOp::Zero => wgpu::StencilOperation::Zero,
            StencilOp::Replace => wgpu::StencilOperation::Replace,
            StencilOp::IncrementSaturate => wgpu::StencilOperation::IncrementClamp,
            StencilOp::DecrementSaturate => wgpu::StencilOperation::DecrementClamp,
            StencilOp::Invert => wgpu::StencilOperation::Invert,
            StencilOp::Increment => wgpu::StencilOperation::IncrementWrap,
            StencilOp::Decrement => wgpu::StencilOperation::DecrementWrap,
        }
    }
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFactor {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::SrcColor => wgpu::BlendFactor::Src,
            BlendFactor::InvSrcColor => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::InvSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DestAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::InvDestAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
            BlendFactor::DestColor => wgpu::BlendFactor::Dst,
            BlendFactor::InvDestColor => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::SrcAlphaSaturate => wgpu::BlendFactor::SrcAlphaSaturated,
            BlendFactor::BlendFactor => wgpu::BlendFactor::Constant,
            BlendFactor::InvBlendFactor => wgpu::BlendFactor::OneMinusConstant,
        }
    }
}

impl IntoWgpu<wgpu::BlendOperation> for BlendOp {
    fn into_wgpu(self) -> wgpu::BlendOperation {
        match self {
            BlendOp::Add => wgpu::BlendOperation::Add,
            BlendOp::Subtract => wgpu::BlendOperation::Subtract,
            BlendOp::RevSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOp::Min => wgpu::BlendOperation::Min,
            BlendOp::Max => wgpu::BlendOperation::Max,
        }
    }
}

// --- Binding ---

/// wgpu only knows vertex, fragment and compute stages. The tessellation and
/// geometry stages fold into the vertex stage.
impl IntoWgpu<wgpu::ShaderStages> for ShaderVisibility {
    fn into_wgpu(self) -> wgpu::ShaderStages {
        match self {
            ShaderVisibility::All => wgpu::ShaderStages::VERTEX_FRAGMENT,
            ShaderVisibility::Vertex
            | ShaderVisibility::Hull
            | ShaderVisibility::Domain
            | ShaderVisibility::Geometry => wgpu::ShaderStages::VERTEX,
            ShaderVisibility::Pixel => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl IntoWgpu<wgpu::AddressMode> for TextureAddressMode {
    fn into_wgpu(self) -> wgpu::AddressMode {
        match self {
            TextureAddressMode::Wrap => wgpu::AddressMode::Repeat,
            TextureAddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
            TextureAddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
            TextureAddressMode::Border => wgpu::AddressMode::ClampToBorder,
        }
    }
}

impl IntoWgpu<wgpu::SamplerBorderColor> for StaticBorderColor {
    fn into_wgpu(self) -> wgpu::SamplerBorderColor {
        match self {
            StaticBorderColor::TransparentBlack => wgpu::SamplerBorderColor::TransparentBlack,
            StaticBorderColor::OpaqueBlack => wgpu::SamplerBorderColor::OpaqueBlack,
            StaticBorderColor::OpaqueWhite => wgpu::SamplerBorderColor::OpaqueWhite,
        }
    }
}

impl IntoWgpu<wgpu::SamplerBindingType> for SamplerFilter {
    fn into_wgpu(self) -> wgpu::SamplerBindingType {
        match self {
            SamplerFilter::Point => wgpu::SamplerBindingType::NonFiltering,
            SamplerFilter::Linear | SamplerFilter::Anisotropic => {
                wgpu::SamplerBindingType::Filtering
            }
            SamplerFilter::ComparisonPoint | SamplerFilter::ComparisonLinear => {
                wgpu::SamplerBindingType::Comparison
            }
        }
    }
}

/// Builds the sampler descriptor of a static sampler.
///
/// `clamp_to_border` tells whether the device supports border addressing;
/// without it, border addressing falls back to clamping to the edge.
pub fn sampler_descriptor<'a>(
    label: Option<&'a str>,
    state: &SamplerState,
    clamp_to_border: bool,
) -> wgpu::SamplerDescriptor<'a> {
    let address = |mode: TextureAddressMode| match mode.into_wgpu() {
        wgpu::AddressMode::ClampToBorder if !clamp_to_border => wgpu::AddressMode::ClampToEdge,
        other => other,
    };
    let (filter, anisotropy_clamp) = match state.filter {
        SamplerFilter::Point | SamplerFilter::ComparisonPoint => (wgpu::FilterMode::Nearest, 1),
        SamplerFilter::Linear | SamplerFilter::ComparisonLinear => (wgpu::FilterMode::Linear, 1),
        SamplerFilter::Anisotropic => (
            wgpu::FilterMode::Linear,
            state.max_anisotropy.clamp(1, 16) as u16,
        ),
    };
    let compare = matches!(
        state.filter,
        SamplerFilter::ComparisonPoint | SamplerFilter::ComparisonLinear
    )
    .then(|| state.comparison_func.into_wgpu());
    let border_color = (address(state.address_u) == wgpu::AddressMode::ClampToBorder
        || address(state.address_v) == wgpu::AddressMode::ClampToBorder
        || address(state.address_w) == wgpu::AddressMode::ClampToBorder)
        .then(|| state.border_color.into_wgpu());
    let lod_min_clamp = state.min_lod.max(0.0);

    wgpu::SamplerDescriptor {
        label,
        address_mode_u: address(state.address_u),
        address_mode_v: address(state.address_v),
        address_mode_w: address(state.address_w),
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: filter,
        lod_min_clamp,
        lod_max_clamp: state.max_lod.clamp(lod_min_clamp, 32.0),
        compare,
        anisotropy_clamp,
        border_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_formats_have_no_wgpu_equivalent() {
        let color: Option<wgpu::TextureFormat> = ImageFormat::Unknown.into_wgpu();
        let depth: Option<wgpu::TextureFormat> = DepthImageFormat::Unknown.into_wgpu();
        let vertex: Option<wgpu::VertexFormat> = InputFormat::Unknown.into_wgpu();
        assert!(color.is_none());
        assert!(depth.is_none());
        assert!(vertex.is_none());
    }

    #[test]
    fn test_every_depth_family_member_maps_to_the_view_format() {
        for format in [
            DepthImageFormat::R24G8Typeless,
            DepthImageFormat::D24UnormS8Uint,
            DepthImageFormat::R24UnormX8Typeless,
            DepthImageFormat::X24TypelessG8Uint,
        ] {
            assert_eq!(
                Some(wgpu::TextureFormat::Depth24PlusStencil8),
                format.into_wgpu()
            );
        }
        assert_eq!(
            Some(wgpu::TextureFormat::Depth32Float),
            DepthImageFormat::R32Typeless.into_wgpu()
        );
        assert_eq!(
            Some(wgpu::TextureFormat::Depth16Unorm),
            DepthImageFormat::R16Unorm.into_wgpu()
        );
    }

    #[test]
    fn test_texel_sizes_agree_with_wgpu() {
        for format in [
            ImageFormat::R32G32B32A32Float,
            ImageFormat::R16G16B16A16Float,
            ImageFormat::R8G8B8A8Unorm,
            ImageFormat::R16G16Unorm,
            ImageFormat::R8Unorm,
        ] {
            let native: Option<wgpu::TextureFormat> = format.into_wgpu();
            assert_eq!(
                native.and_then(|f| f.block_copy_size(None)),
                format.bytes_per_pixel(),
                "{format:?}"
            );
        }
    }

    #[test]
    fn test_cull_mode_none_disables_culling() {
        let none: Option<wgpu::Face> = CullMode::None.into_wgpu();
        let back: Option<wgpu::Face> = CullMode::Back.into_wgpu();
        assert_eq!(none, None);
        assert_eq!(back, Some(wgpu::Face::Back));
    }

    #[test]
    fn test_saturating_stencil_ops_clamp() {
        assert_eq!(
            wgpu::StencilOperation::IncrementClamp,
            StencilOp::IncrementSaturate.into_wgpu()
        );
        assert_eq!(
            wgpu::StencilOperation::IncrementWrap,
            StencilOp::Increment.into_wgpu()
        );
    }

    #[test]
    fn test_geometry_stages_fold_into_vertex() {
        let stages: wgpu::ShaderStages = ShaderVisibility::Geometry.into_wgpu();
        assert_eq!(stages, wgpu::ShaderStages::VERTEX);
        let all: wgpu::ShaderStages = ShaderVisibility::All.into_wgpu();
        assert!(all.contains(wgpu::ShaderStages::FRAGMENT));
    }

    #[test]
    fn test_border_addressing_falls_back_without_device_support() {
        let state = SamplerState {
            enabled: true,
            address_u: TextureAddressMode::Border,
            ..Default::default()
        };
        let supported = sampler_descriptor(None, &state, true);
        assert_eq!(supported.address_mode_u, wgpu::AddressMode::ClampToBorder);
        assert!(supported.border_color.is_some());

        let fallback = sampler_descriptor(None, &state, false);
        assert_eq!(fallback.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert!(fallback.border_color.is_none());
    }

    #[test]
    fn test_comparison_samplers_carry_their_function() {
        let state = SamplerState {
            enabled: true,
            filter: SamplerFilter::ComparisonLinear,
            comparison_func: ComparisonFunc::LessEqual,
            ..Default::default()
        };
        let desc = sampler_descriptor(None, &state, false);
        assert_eq!(desc.compare, Some(wgpu::CompareFunction::LessEqual));
        assert_eq!(desc.lod_max_clamp, 32.0);
        let binding: wgpu::SamplerBindingType = state.filter.into_wgpu();
        assert_eq!(binding, wgpu::SamplerBindingType::Comparison);
    }
}
