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

//! The context a pass's execute callback records into.

use super::resource::{
    BoundResource, RenderPassMutableResource, RenderPassResource, ResourceClass, ResourceLookup,
    ResourceResolver,
};
use crate::handle::{ComputePipelineId, DepthImageId, GraphicsPipelineId, ImageId};
use crate::renderer::api::{
    ComputePipelineDesc, GraphicsPipelineDesc, MaterialPipelineDesc, ScissorRect, Viewport,
};
use crate::renderer::command_list::CommandList;
use crate::renderer::constant_buffer::ConstantBuffer;
use crate::renderer::error::RenderError;
use crate::renderer::render_layer::{InstanceData, RenderLayer};
use crate::renderer::traits::RenderBackend;
use crate::renderer::Renderer;

/// Everything an execute callback can touch: the pass's command list, the
/// renderer, and the graph's token tables.
///
/// Tokens obtained from the [`RenderPassBuilder`](super::RenderPassBuilder)
/// during setup are resolved here back to the resources they stand for.
pub struct PassContext<'a, B: RenderBackend> {
    renderer: &'a mut Renderer<B>,
    lookup: &'a ResourceLookup,
    pass_name: &'a str,
    commands: CommandList,
}

impl<'a, B: RenderBackend> PassContext<'a, B> {
    pub(crate) fn new(
        renderer: &'a mut Renderer<B>,
        lookup: &'a ResourceLookup,
        pass_name: &'a str,
        commands: CommandList,
    ) -> Self {
        Self {
            renderer,
            lookup,
            pass_name,
            commands,
        }
    }

    pub(crate) fn into_commands(self) -> CommandList {
        self.commands
    }

    /// The name of the executing pass.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// The command list of the pass.
    pub fn commands(&mut self) -> &mut CommandList {
        &mut self.commands
    }

    /// The renderer, read-only.
    pub fn renderer(&self) -> &Renderer<B> {
        self.renderer
    }

    /// Borrows the renderer and the command list at the same time, e.g. to walk
    /// a render layer while recording draws.
    pub fn split(&mut self) -> (&Renderer<B>, &mut CommandList) {
        (self.renderer, &mut self.commands)
    }

    /// Resolves a written image token.
    pub fn image(&self, token: RenderPassMutableResource) -> Result<ImageId, RenderError> {
        self.lookup.resolve_image(token)
    }

    /// Resolves a written depth image token.
    pub fn depth_image(&self, token: RenderPassMutableResource) -> Result<DepthImageId, RenderError> {
        self.lookup.resolve_depth_image(token)
    }

    /// Resolves a read token.
    pub fn read_resource(&self, token: RenderPassResource) -> Result<BoundResource, RenderError> {
        self.lookup.resolve_read(token)
    }

    /// The size in pixels of a written image or depth image.
    pub fn extent(&self, token: RenderPassMutableResource) -> Result<(u32, u32), RenderError> {
        let resources = self.renderer.resources();
        match token.class() {
            ResourceClass::DepthImage => {
                Ok(resources.depth_image(self.lookup.resolve_depth_image(token)?)?.extent)
            }
            _ => Ok(resources.image(self.lookup.resolve_image(token)?)?.extent),
        }
    }

    /// Records a viewport and a scissor rectangle covering the whole of `token`.
    pub fn set_full_viewport(&mut self, token: RenderPassMutableResource) -> Result<(), RenderError> {
        let extent = self.extent(token)?;
        self.commands.set_viewport(Viewport::from_extent(extent));
        self.commands.set_scissor_rect(ScissorRect::from_extent(extent));
        Ok(())
    }

    /// Returns the graphics pipeline for `desc`, compiling it on first use.
    ///
    /// The tokens in `desc` are resolved through this frame's tables.
    ///
    /// ## Errors
    ///
    /// [`RenderError::PipelineCompilationFailed`] makes the graph skip the pass
    /// when propagated out of the callback.
    pub fn create_graphics_pipeline(
        &mut self,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        self.renderer.create_graphics_pipeline(self.lookup, desc)
    }

    /// Returns the pipeline drawing `desc`'s material into the pass targets,
    /// compiling it on first use. Failures propagate like
    /// [`PassContext::create_graphics_pipeline`].
    pub fn create_material_pipeline(
        &mut self,
        desc: &MaterialPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        self.renderer.create_material_pipeline(self.lookup, desc)
    }

    /// Returns the compute pipeline for `desc`, compiling it on first use.
    pub fn create_compute_pipeline(
        &mut self,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineId, RenderError> {
        self.renderer.create_compute_pipeline(desc)
    }

    /// The render layer called `name`, if the frame registered anything under it.
    pub fn render_layer(&self, name: &str) -> Option<&RenderLayer> {
        self.renderer.find_render_layer(name)
    }

    /// Records one `SetConstantBuffer` and `Draw` pair per instance of the
    /// layer called `name`, rewriting `buffer` before every draw.
    ///
    /// Returns the number of draws recorded; an unknown layer records nothing.
    pub fn draw_render_layer(
        &mut self,
        name: &str,
        slot: u32,
        buffer: &mut ConstantBuffer<InstanceData>,
    ) -> usize {
        let Some(layer) = self.renderer.find_render_layer(name) else {
            return 0;
        };
        let mut draws = 0;
        for (model, instances) in layer.models() {
            for instance in instances {
                buffer.set(*instance);
                self.commands.set_constant_buffer(slot, buffer);
                self.commands.draw(model);
                draws += 1;
            }
        }
        draws
    }
}
