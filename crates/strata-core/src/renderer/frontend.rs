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

//! The renderer: the owner of the backend and of every resource registry.

use crate::handle::{
    ComputePipelineId, ComputeShaderId, ConstantBufferKind, DepthImageId, GraphicsPipelineId,
    ImageId, MaterialId, ModelId, PixelShaderId, Registry, TextureId, VertexShaderId,
};
use crate::render_graph::ResourceResolver;
use crate::renderer::api::*;
use crate::renderer::command_list::{CommandList, Submission};
use crate::renderer::constant_buffer::{ConstantBuffer, ConstantBufferInfo};
use crate::renderer::error::RenderError;
use crate::renderer::frame_pacing::FramePacer;
use crate::renderer::material_handler::MaterialHandler;
use crate::renderer::model_handler::ModelHandler;
use crate::renderer::pipeline_cache::PipelineCache;
use crate::renderer::render_layer::RenderLayer;
use crate::renderer::resource_handler::ResourceHandler;
use crate::renderer::shader_handler::ShaderHandler;
use crate::renderer::traits::{ModelLoader, RenderBackend, Window};
use ahash::AHashMap;
use bytemuck::Pod;

/// Owns a [`RenderBackend`] and everything created through it.
///
/// A frame is bracketed by [`Renderer::begin_frame`] and
/// [`Renderer::end_frame`]; command lists submitted in between signal the
/// current frame slot's fence.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    settings: RenderSettings,
    window_extent: (u32, u32),
    resources: ResourceHandler<B>,
    shaders: ShaderHandler<B>,
    models: ModelHandler<B>,
    materials: MaterialHandler,
    pipelines: PipelineCache<B>,
    constant_buffers: Registry<ConstantBufferKind, ConstantBufferInfo>,
    layers: AHashMap<String, RenderLayer>,
    pacer: FramePacer<B::Fence>,
}

impl<B: RenderBackend> Renderer<B> {
    /// Creates a renderer over `backend`.
    ///
    /// # Errors
    ///
    /// Fails if `settings` are invalid or the backend cannot create the frame
    /// slot fences.
    pub fn new(mut backend: B, settings: RenderSettings) -> Result<Self, RenderError> {
        settings.validate()?;
        let pacer = FramePacer::new(
            &mut backend,
            settings.frames_in_flight,
            settings.fence_timeout(),
        )?;
        log::info!(
            "Renderer: Initialized with {} frames in flight",
            settings.frames_in_flight
        );
        Ok(Self {
            backend,
            window_extent: (settings.window_width, settings.window_height),
            settings,
            resources: ResourceHandler::new(),
            shaders: ShaderHandler::new(),
            models: ModelHandler::new(),
            materials: MaterialHandler::new(),
            pipelines: PipelineCache::new(),
            constant_buffers: Registry::new(),
            layers: AHashMap::new(),
            pacer,
        })
    }

    /// The settings the renderer was created with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Images, depth images and textures.
    pub fn resources(&self) -> &ResourceHandler<B> {
        &self.resources
    }

    /// Loaded shaders.
    pub fn shaders(&self) -> &ShaderHandler<B> {
        &self.shaders
    }

    /// Uploaded models.
    pub fn models(&self) -> &ModelHandler<B> {
        &self.models
    }

    /// Registered materials.
    pub fn materials(&self) -> &MaterialHandler {
        &self.materials
    }

    /// Compiled pipelines.
    pub fn pipelines(&self) -> &PipelineCache<B> {
        &self.pipelines
    }

    /// The size window-relative images are scaled from.
    pub fn window_extent(&self) -> (u32, u32) {
        self.window_extent
    }

    /// Creates the swap chain of `window`. Window-relative images created
    /// afterwards are sized from it.
    pub fn init_window(&mut self, window: &dyn Window) -> Result<(), RenderError> {
        let count = window.frame_buffer_count();
        if count == 0 {
            return Err(RenderError::creation_failed(
                "SwapChain",
                format!("{} has no frame buffers", window.handle()),
            ));
        }
        self.backend.init_window(window)?;
        self.window_extent = window.dimensions();
        log::info!(
            "Renderer: Initialized {} ({}x{}, {} buffers{})",
            window.handle(),
            self.window_extent.0,
            self.window_extent.1,
            count,
            if window.is_full_screen() { ", full screen" } else { "" }
        );
        Ok(())
    }

    /// Creates a render-target image.
    pub fn create_image(&mut self, desc: ImageDesc) -> Result<ImageId, RenderError> {
        self.resources
            .create_image(&mut self.backend, desc, self.window_extent)
    }

    /// Creates a depth image.
    pub fn create_depth_image(&mut self, desc: DepthImageDesc) -> Result<DepthImageId, RenderError> {
        self.resources
            .create_depth_image(&mut self.backend, desc, self.window_extent)
    }

    /// Loads a texture from an image file.
    pub fn load_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError> {
        self.resources.load_texture(&mut self.backend, desc)
    }

    /// Creates a texture from decoded pixels.
    pub fn create_texture(&mut self, data: TextureData) -> Result<TextureId, RenderError> {
        self.resources
            .create_texture_from_data(&mut self.backend, data)
    }

    /// Loads a vertex shader. The same path always yields the same id.
    pub fn load_vertex_shader(&mut self, path: &str) -> Result<VertexShaderId, RenderError> {
        self.shaders.load_vertex_shader(&mut self.backend, path)
    }

    /// Loads a pixel shader. The same path always yields the same id.
    pub fn load_pixel_shader(&mut self, path: &str) -> Result<PixelShaderId, RenderError> {
        self.shaders.load_pixel_shader(&mut self.backend, path)
    }

    /// Loads a compute shader. The same path always yields the same id.
    pub fn load_compute_shader(&mut self, path: &str) -> Result<ComputeShaderId, RenderError> {
        self.shaders.load_compute_shader(&mut self.backend, path)
    }

    /// Loads a model through `loader`.
    pub fn load_model(
        &mut self,
        loader: &dyn ModelLoader,
        desc: &ModelDesc,
    ) -> Result<ModelId, RenderError> {
        self.models.load_model(&mut self.backend, loader, desc)
    }

    /// Uploads in-memory model data.
    pub fn create_model(&mut self, data: &ModelData) -> Result<ModelId, RenderError> {
        self.models.create_model(&mut self.backend, data)
    }

    /// Creates a constant buffer holding `initial`.
    pub fn create_constant_buffer<T: Pod>(
        &mut self,
        initial: T,
    ) -> Result<ConstantBuffer<T>, RenderError> {
        let id = self.constant_buffers.insert(ConstantBufferInfo {
            size: std::mem::size_of::<T>(),
            type_name: std::any::type_name::<T>(),
        })?;
        log::debug!(
            "Renderer: Created constant buffer {:?} of {}",
            id,
            std::any::type_name::<T>()
        );
        Ok(ConstantBuffer::new(id, initial))
    }

    /// Registers a material built from already loaded shaders and textures.
    pub fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId, RenderError> {
        self.materials.create(&self.shaders, &self.resources, desc)
    }

    /// Returns the graphics pipeline for `desc`, compiling it on first use.
    ///
    /// Tokens in `desc` are resolved through `resolver`; inside a pass use
    /// [`PassContext::create_graphics_pipeline`](crate::render_graph::PassContext::create_graphics_pipeline).
    pub fn create_graphics_pipeline(
        &mut self,
        resolver: &dyn ResourceResolver,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        self.pipelines.create_graphics_pipeline(
            &mut self.backend,
            &self.shaders,
            &self.resources,
            resolver,
            desc,
        )
    }

    /// Returns the pipeline drawing the material of `desc`, compiling it on
    /// first use. Target tokens are resolved through `resolver`.
    pub fn create_material_pipeline(
        &mut self,
        resolver: &dyn ResourceResolver,
        desc: &MaterialPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        self.pipelines.create_material_pipeline(
            &mut self.backend,
            &self.shaders,
            &self.resources,
            &self.materials,
            resolver,
            desc,
        )
    }

    /// Returns the compute pipeline for `desc`, compiling it on first use.
    pub fn create_compute_pipeline(
        &mut self,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineId, RenderError> {
        self.pipelines
            .create_compute_pipeline(&mut self.backend, &self.shaders, desc)
    }

    /// The render layer called `name`, created empty on first use.
    pub fn render_layer(&mut self, name: &str) -> &mut RenderLayer {
        self.layers.entry(name.to_owned()).or_default()
    }

    /// The render layer called `name`, if it was ever used.
    pub fn find_render_layer(&self, name: &str) -> Option<&RenderLayer> {
        self.layers.get(name)
    }

    /// Waits until the GPU is done with the current frame slot, then recycles it.
    ///
    /// # Errors
    ///
    /// [`RenderError::DeviceLost`] if the slot's fence does not complete within
    /// the configured timeout.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.pacer.begin_frame(&mut self.backend)
    }

    /// Replays `list` on the backend, submits it and signals the current slot.
    ///
    /// The slot's fence value is only advanced once the backend accepted the
    /// list; a list that is rejected or fails while replaying leaves the slot
    /// as it was.
    pub fn submit(&mut self, list: CommandList) -> Result<(), RenderError> {
        list.validate_markers()?;
        let (fence, signal_value) = self.pacer.next_signal();
        list.execute(Submission {
            backend: &mut self.backend,
            resources: &self.resources,
            models: &self.models,
            pipelines: &self.pipelines,
            fence,
            signal_value,
            debug_markers: self.settings.debug_markers,
        })?;
        self.pacer.commit_signal(signal_value);
        Ok(())
    }

    /// Resets every render layer and moves to the next frame slot.
    pub fn end_frame(&mut self) {
        for layer in self.layers.values_mut() {
            layer.reset();
        }
        self.pacer.end_frame();
    }

    /// Blocks until the GPU has finished all submitted work.
    pub fn wait_idle(&self) -> Result<(), RenderError> {
        self.pacer.wait_idle()
    }

    /// The frame slot currently recorded into.
    pub fn frame_index(&self) -> usize {
        self.pacer.frame_index()
    }

    /// The frame pacer.
    pub fn pacer(&self) -> &FramePacer<B::Fence> {
        &self.pacer
    }
}
