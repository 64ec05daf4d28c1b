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

//! The native objects the wgpu backend hands to the render core.

use strata_core::renderer::api::ShaderType;

/// A render-target capable color image.
#[derive(Debug, Clone)]
pub struct WgpuImage {
    pub(crate) id: u64,
    pub(crate) texture: wgpu::Texture,
    pub(crate) target_view: wgpu::TextureView,
    pub(crate) read_view: wgpu::TextureView,
    pub(crate) storage_view: Option<wgpu::TextureView>,
    pub(crate) format: wgpu::TextureFormat,
    pub(crate) extent: (u32, u32),
    pub(crate) sample_count: u32,
}

impl WgpuImage {
    /// The underlying texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// The unordered-access view, if the format supports storage binding.
    pub fn storage_view(&self) -> Option<&wgpu::TextureView> {
        self.storage_view.as_ref()
    }

    /// The native format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Width and height in pixels.
    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }
}

/// A depth (and optionally stencil) image.
#[derive(Debug, Clone)]
pub struct WgpuDepthImage {
    pub(crate) id: u64,
    pub(crate) texture: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) depth_read_view: wgpu::TextureView,
    pub(crate) stencil_read_view: Option<wgpu::TextureView>,
    pub(crate) format: wgpu::TextureFormat,
    pub(crate) extent: (u32, u32),
    pub(crate) sample_count: u32,
}

impl WgpuDepthImage {
    /// The underlying texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// The stencil-only read view, for formats that carry stencil.
    pub fn stencil_read_view(&self) -> Option<&wgpu::TextureView> {
        self.stencil_read_view.as_ref()
    }

    pub(crate) fn has_stencil(&self) -> bool {
        self.stencil_read_view.is_some()
    }
}

/// A read-only texture.
#[derive(Debug, Clone)]
pub struct WgpuTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) format: wgpu::TextureFormat,
}

impl WgpuTexture {
    /// The underlying texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

/// A WGSL module and the stage it was loaded for.
#[derive(Debug, Clone)]
pub struct WgpuShader {
    pub(crate) module: wgpu::ShaderModule,
    pub(crate) stage: ShaderType,
}

/// A model's vertex and index buffers.
#[derive(Debug, Clone)]
pub struct WgpuModel {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl WgpuModel {
    /// The number of indices uploaded.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// The depth attachment a graphics pipeline renders into.
#[derive(Debug, Clone)]
pub(crate) struct DepthAttachment {
    pub(crate) view: wgpu::TextureView,
    pub(crate) has_stencil: bool,
}

/// A compiled graphics pipeline together with the targets it was declared
/// against and its binding groups.
///
/// Group 0 holds one dynamic uniform binding per constant buffer slot; group 1
/// holds bound textures at `binding = i` and static samplers at
/// `binding = 8 + i`.
#[derive(Debug, Clone)]
pub struct WgpuGraphicsPipeline {
    pub(crate) label: String,
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) constant_group: wgpu::BindGroup,
    pub(crate) constant_buffer_count: usize,
    pub(crate) texture_group: Option<wgpu::BindGroup>,
    pub(crate) color_targets: Vec<wgpu::TextureView>,
    pub(crate) depth_target: Option<DepthAttachment>,
    /// Identifies the attachment set, so consecutive pipelines sharing it
    /// share a render pass.
    pub(crate) target_key: Vec<u64>,
    pub(crate) target_extent: (u32, u32),
}

/// A compiled compute pipeline and its constant buffer group.
#[derive(Debug, Clone)]
pub struct WgpuComputePipeline {
    pub(crate) label: String,
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) constant_group: wgpu::BindGroup,
    pub(crate) constant_buffer_count: usize,
}

impl WgpuComputePipeline {
    /// The native pipeline.
    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// The bind group of the constant buffer slots, bound with dynamic offsets.
    pub fn constant_group(&self) -> &wgpu::BindGroup {
        &self.constant_group
    }

    /// The number of dynamic offsets [`Self::constant_group`] expects.
    pub fn constant_buffer_count(&self) -> usize {
        self.constant_buffer_count
    }
}
