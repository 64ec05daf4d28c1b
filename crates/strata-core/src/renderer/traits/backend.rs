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

use super::{GpuFence, Window, WindowHandle};
use crate::renderer::api::*;
use crate::renderer::error::RenderError;

/// A texture-like resource bound to a pipeline for shader reads.
pub enum BoundTexture<'a, B: RenderBackend> {
    /// The shader-read view of a render-target image.
    Image(&'a B::Image),
    /// The depth-read view of a depth image.
    DepthImage(&'a B::DepthImage),
    /// A read-only texture.
    Texture(&'a B::Texture),
}

/// Everything a backend needs to compile a graphics pipeline.
///
/// Produced by the pipeline cache once render-target tokens have been
/// resolved and the binding layout derived.
pub struct GraphicsPipelineBuildInfo<'a, B: RenderBackend> {
    /// Name shown in debuggers and logs.
    pub debug_name: &'a str,
    /// The derived binding layout.
    pub layout: &'a RootLayout,
    /// The enabled vertex attributes.
    pub input_layout: &'a [InputLayout],
    /// Rasterizer configuration.
    pub rasterizer: &'a RasterizerState,
    /// Depth and stencil testing.
    pub depth_stencil: &'a DepthStencilState,
    /// Color blending.
    pub blend: &'a BlendState,
    /// The compiled vertex shader.
    pub vertex_shader: &'a B::Shader,
    /// The compiled pixel shader, `None` for depth-only pipelines.
    pub pixel_shader: Option<&'a B::Shader>,
    /// The color targets the pipeline renders into, in slot order.
    pub render_targets: &'a [&'a B::Image],
    /// Formats of the color targets, in slot order.
    pub render_target_formats: &'a [ImageFormat],
    /// The depth target, if any.
    pub depth_target: Option<&'a B::DepthImage>,
    /// The depth-stencil-view format of the depth target, if any.
    pub depth_stencil_format: Option<DepthImageFormat>,
    /// The sample count shared by every target.
    pub sample_count: SampleCount,
    /// Resources bound to the texture table, register `i` at index `i`.
    pub bound_textures: &'a [BoundTexture<'a, B>],
}

/// Everything a backend needs to compile a compute pipeline.
pub struct ComputePipelineBuildInfo<'a, B: RenderBackend> {
    /// Name shown in debuggers and logs.
    pub debug_name: &'a str,
    /// The derived binding layout.
    pub layout: &'a RootLayout,
    /// The compiled compute shader.
    pub compute_shader: &'a B::Shader,
}

/// The graphics API abstraction the render core drives.
///
/// A backend owns every native object; the core refers to them through the
/// associated types and keeps them in its own registries. All methods are
/// called from the render thread only.
pub trait RenderBackend: Sized {
    /// A render-target capable image with render-target, shader-read and
    /// unordered-access views.
    type Image;
    /// A depth image with a depth-stencil view and depth (and stencil) read views.
    type DepthImage;
    /// A read-only texture with a shader-read view.
    type Texture;
    /// A compiled shader module.
    type Shader;
    /// A model's vertex and index buffers.
    type Model;
    /// A compiled graphics pipeline and its binding layout.
    type GraphicsPipeline;
    /// A compiled compute pipeline and its binding layout.
    type ComputePipeline;
    /// A command list being recorded.
    type CommandList;
    /// The fence submissions signal.
    type Fence: GpuFence;

    /// Allocates storage for an image and creates its views.
    /// ## Arguments
    /// * `desc` - The validated image description.
    /// * `extent` - The resolved size in pixels.
    /// ## Errors
    /// * `RenderError::ResourceCreationFailed` - If the backend cannot allocate the image.
    fn create_image(
        &mut self,
        desc: &ImageDesc,
        extent: (u32, u32),
    ) -> Result<Self::Image, RenderError>;

    /// Allocates storage for a depth image and creates its views.
    /// ## Arguments
    /// * `desc` - The validated depth image description.
    /// * `extent` - The resolved size in pixels.
    /// * `formats` - The storage, view and read formats of the depth family.
    /// ## Errors
    /// * `RenderError::ResourceCreationFailed` - If the backend cannot allocate the image.
    fn create_depth_image(
        &mut self,
        desc: &DepthImageDesc,
        extent: (u32, u32),
        formats: DepthFormatSet,
    ) -> Result<Self::DepthImage, RenderError>;

    /// Uploads decoded pixels into a new read-only texture.
    fn create_texture(&mut self, data: &TextureData) -> Result<Self::Texture, RenderError>;

    /// Loads and compiles a shader module.
    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<Self::Shader, RenderError>;

    /// Uploads a model's vertices and indices.
    fn create_model(&mut self, data: &ModelData) -> Result<Self::Model, RenderError>;

    /// Compiles a graphics pipeline.
    /// ## Errors
    /// * `RenderError::PipelineCompilationFailed` - If the backend rejects the description.
    fn compile_graphics_pipeline(
        &mut self,
        info: &GraphicsPipelineBuildInfo<'_, Self>,
    ) -> Result<Self::GraphicsPipeline, RenderError>;

    /// Compiles a compute pipeline.
    /// ## Errors
    /// * `RenderError::PipelineCompilationFailed` - If the backend rejects the description.
    fn compile_compute_pipeline(
        &mut self,
        info: &ComputePipelineBuildInfo<'_, Self>,
    ) -> Result<Self::ComputePipeline, RenderError>;

    /// Creates the swap chain of a window.
    fn init_window(&mut self, window: &dyn Window) -> Result<(), RenderError>;

    /// Creates a fence whose completed value starts at zero.
    fn create_fence(&mut self) -> Result<Self::Fence, RenderError>;

    /// Recycles the command memory and per-frame buffers of a frame slot.
    ///
    /// Only called once the slot's fence shows that the GPU is done with it.
    fn reset_frame_slot(&mut self, slot: usize) -> Result<(), RenderError>;

    /// Starts recording a new command list.
    fn begin_command_list(&mut self, debug_name: &str) -> Result<Self::CommandList, RenderError>;

    /// Closes a command list, submits it and signals `fence` to `value` once
    /// the GPU has executed it.
    fn end_command_list(
        &mut self,
        list: Self::CommandList,
        fence: &Self::Fence,
        value: u64,
    ) -> Result<(), RenderError>;

    /// Binds a graphics pipeline and its layout.
    fn set_graphics_pipeline(
        &mut self,
        list: &mut Self::CommandList,
        pipeline: &Self::GraphicsPipeline,
    ) -> Result<(), RenderError>;

    /// Binds a compute pipeline and its layout.
    fn set_compute_pipeline(
        &mut self,
        list: &mut Self::CommandList,
        pipeline: &Self::ComputePipeline,
    ) -> Result<(), RenderError>;

    /// Uploads `data` and binds it to constant buffer register `slot`.
    ///
    /// The bytes are consumed by the next draw, so consecutive
    /// upload-then-draw pairs each see their own data.
    fn set_constant_buffer(
        &mut self,
        list: &mut Self::CommandList,
        slot: u32,
        data: &[u8],
    ) -> Result<(), RenderError>;

    /// Sets the viewport.
    fn set_viewport(
        &mut self,
        list: &mut Self::CommandList,
        viewport: &Viewport,
    ) -> Result<(), RenderError>;

    /// Sets the scissor rectangle.
    fn set_scissor_rect(
        &mut self,
        list: &mut Self::CommandList,
        rect: &ScissorRect,
    ) -> Result<(), RenderError>;

    /// Clears an image through its render-target view.
    fn clear_image(
        &mut self,
        list: &mut Self::CommandList,
        image: &Self::Image,
        color: [f32; 4],
    ) -> Result<(), RenderError>;

    /// Clears the selected aspects of a depth image.
    fn clear_depth_image(
        &mut self,
        list: &mut Self::CommandList,
        image: &Self::DepthImage,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<(), RenderError>;

    /// Binds a model's buffers and issues an indexed draw.
    fn draw_indexed(
        &mut self,
        list: &mut Self::CommandList,
        model: &Self::Model,
        index_count: u32,
        instance_count: u32,
    ) -> Result<(), RenderError>;

    /// Opens a named debug region.
    fn push_marker(
        &mut self,
        list: &mut Self::CommandList,
        color: [f32; 4],
        label: &str,
    ) -> Result<(), RenderError>;

    /// Closes the innermost debug region.
    fn pop_marker(&mut self, list: &mut Self::CommandList) -> Result<(), RenderError>;

    /// Hands an image to a window's swap chain.
    fn present_image(
        &mut self,
        list: &mut Self::CommandList,
        window: WindowHandle,
        image: &Self::Image,
    ) -> Result<(), RenderError>;

    /// Hands the depth of a depth image to a window's swap chain.
    fn present_depth_image(
        &mut self,
        list: &mut Self::CommandList,
        window: WindowHandle,
        image: &Self::DepthImage,
    ) -> Result<(), RenderError>;
}
