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

//! Recording and dispatch of GPU commands.
//!
//! A [`CommandList`] is plain data: a vector of [`Command`] values recorded by
//! a pass. [`CommandList::execute`] replays it against a [`RenderBackend`] in
//! insertion order, then submits it and signals the frame slot's fence.

use crate::handle::{
    ComputePipelineId, ConstantBufferId, DepthImageId, GraphicsPipelineId, ImageId, ModelId,
};
use crate::renderer::api::{DepthClearFlags, ScissorRect, Viewport};
use crate::renderer::constant_buffer::ConstantBuffer;
use crate::renderer::error::RenderError;
use crate::renderer::model_handler::ModelHandler;
use crate::renderer::pipeline_cache::PipelineCache;
use crate::renderer::resource_handler::ResourceHandler;
use crate::renderer::traits::{RenderBackend, WindowHandle};
use bytemuck::Pod;
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

/// Binds a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetGraphicsPipeline {
    /// The pipeline to bind.
    pub pipeline: GraphicsPipelineId,
}

/// Binds a compute pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetComputePipeline {
    /// The pipeline to bind.
    pub pipeline: ComputePipelineId,
}

/// Uploads a constant buffer value and binds it to a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetConstantBuffer {
    /// The register (`b{slot}`) to bind to.
    pub slot: u32,
    /// The buffer the bytes were taken from.
    pub buffer: ConstantBufferId,
    /// The value at record time.
    pub data: Vec<u8>,
}

/// Sets the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetViewport {
    /// The new viewport.
    pub viewport: Viewport,
}

/// Sets the scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetScissorRect {
    /// The new rectangle.
    pub rect: ScissorRect,
}

/// Clears an image to a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearImage {
    /// The image to clear.
    pub image: ImageId,
    /// RGBA clear value.
    pub color: [f32; 4],
}

/// Clears the depth and/or stencil of a depth image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearDepthImage {
    /// The image to clear.
    pub image: DepthImageId,
    /// The aspects to clear.
    pub flags: DepthClearFlags,
    /// Depth clear value.
    pub depth: f32,
    /// Stencil clear value.
    pub stencil: u8,
}

/// Draws a whole model once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    /// The model to draw.
    pub model: ModelId,
}

/// Opens a named debug region.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMarker {
    /// Display color of the region.
    pub color: [f32; 4],
    /// Display name of the region.
    pub label: Cow<'static, str>,
}

/// Closes the innermost debug region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopMarker;

/// Presents an image to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentImage {
    /// The target window.
    pub window: WindowHandle,
    /// The image to present.
    pub image: ImageId,
}

/// Presents the depth of a depth image to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentDepthImage {
    /// The target window.
    pub window: WindowHandle,
    /// The depth image to present.
    pub image: DepthImageId,
}

/// Every command a list can hold. Each variant wraps the payload of the same name.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetGraphicsPipeline(SetGraphicsPipeline),
    SetComputePipeline(SetComputePipeline),
    SetConstantBuffer(SetConstantBuffer),
    SetViewport(SetViewport),
    SetScissorRect(SetScissorRect),
    ClearImage(ClearImage),
    ClearDepthImage(ClearDepthImage),
    Draw(Draw),
    PushMarker(PushMarker),
    PopMarker(PopMarker),
    PresentImage(PresentImage),
    PresentDepthImage(PresentDepthImage),
}

macro_rules! impl_into_command {
    ($($payload:ident),* $(,)?) => {
        $(
            impl From<$payload> for Command {
                fn from(payload: $payload) -> Self {
                    Command::$payload(payload)
                }
            }
        )*
    };
}

impl_into_command!(
    SetGraphicsPipeline,
    SetComputePipeline,
    SetConstantBuffer,
    SetViewport,
    SetScissorRect,
    ClearImage,
    ClearDepthImage,
    Draw,
    PushMarker,
    PopMarker,
    PresentImage,
    PresentDepthImage,
);

/// Borrowed state a command list is replayed against.
pub struct Submission<'a, B: RenderBackend> {
    /// The backend recording native commands.
    pub backend: &'a mut B,
    /// Images, depth images and textures.
    pub resources: &'a ResourceHandler<B>,
    /// Models.
    pub models: &'a ModelHandler<B>,
    /// Compiled pipelines.
    pub pipelines: &'a PipelineCache<B>,
    /// The fence of the current frame slot.
    pub fence: &'a B::Fence,
    /// The value the fence is signaled to once the list has executed.
    pub signal_value: u64,
    /// If `false`, markers are validated but not sent to the backend.
    pub debug_markers: bool,
}

/// An ordered list of commands recorded by one pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandList {
    debug_name: Cow<'static, str>,
    commands: Vec<Command>,
}

impl CommandList {
    /// Creates an empty list.
    pub fn new(debug_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            debug_name: debug_name.into(),
            commands: Vec::new(),
        }
    }

    /// The name of the list.
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Appends a command.
    pub fn add_command(&mut self, command: impl Into<Command>) -> &mut Command {
        self.commands.push(command.into());
        let last = self.commands.len() - 1;
        &mut self.commands[last]
    }

    /// The recorded commands, in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Records [`SetGraphicsPipeline`].
    pub fn set_graphics_pipeline(&mut self, pipeline: GraphicsPipelineId) {
        self.add_command(SetGraphicsPipeline { pipeline });
    }

    /// Records [`SetComputePipeline`].
    pub fn set_compute_pipeline(&mut self, pipeline: ComputePipelineId) {
        self.add_command(SetComputePipeline { pipeline });
    }

    /// Records [`SetConstantBuffer`] with the current value of `buffer`.
    pub fn set_constant_buffer<T: Pod>(&mut self, slot: u32, buffer: &ConstantBuffer<T>) {
        self.add_command(SetConstantBuffer {
            slot,
            buffer: buffer.id(),
            data: buffer.bytes().to_vec(),
        });
    }

    /// Records [`SetViewport`].
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.add_command(SetViewport { viewport });
    }

    /// Records [`SetScissorRect`].
    pub fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.add_command(SetScissorRect { rect });
    }

    /// Records [`ClearImage`].
    pub fn clear_image(&mut self, image: ImageId, color: [f32; 4]) {
        self.add_command(ClearImage { image, color });
    }

    /// Records [`ClearDepthImage`].
    pub fn clear_depth_image(
        &mut self,
        image: DepthImageId,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.add_command(ClearDepthImage {
            image,
            flags,
            depth,
            stencil,
        });
    }

    /// Records [`Draw`].
    pub fn draw(&mut self, model: ModelId) {
        self.add_command(Draw { model });
    }

    /// Records [`PushMarker`].
    pub fn push_marker(&mut self, color: [f32; 4], label: impl Into<Cow<'static, str>>) {
        self.add_command(PushMarker {
            color,
            label: label.into(),
        });
    }

    /// Records [`PopMarker`].
    pub fn pop_marker(&mut self) {
        self.add_command(PopMarker);
    }

    /// Records [`PresentImage`].
    pub fn present_image(&mut self, window: WindowHandle, image: ImageId) {
        self.add_command(PresentImage { window, image });
    }

    /// Records [`PresentDepthImage`].
    pub fn present_depth_image(&mut self, window: WindowHandle, image: DepthImageId) {
        self.add_command(PresentDepthImage { window, image });
    }

    /// Pushes a marker now and pops it when the returned guard is dropped.
    pub fn scoped_marker(
        &mut self,
        color: [f32; 4],
        label: impl Into<Cow<'static, str>>,
    ) -> ScopedMarker<'_> {
        self.push_marker(color, label);
        ScopedMarker { list: self }
    }

    /// Checks that every `PushMarker` has a matching later `PopMarker`.
    pub fn validate_markers(&self) -> Result<(), RenderError> {
        let mut depth: i32 = 0;
        for command in &self.commands {
            match command {
                Command::PushMarker(_) => depth += 1,
                Command::PopMarker(_) => {
                    depth -= 1;
                    if depth < 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(RenderError::UnbalancedMarkers {
                list: self.debug_name.to_string(),
                depth,
            });
        }
        Ok(())
    }

    /// Replays the list against the backend, submits it and signals the fence.
    ///
    /// Marker nesting is validated first; an unbalanced list fails with
    /// [`RenderError::UnbalancedMarkers`] before the backend sees anything.
    pub fn execute<B: RenderBackend>(self, submission: Submission<'_, B>) -> Result<(), RenderError> {
        self.validate_markers()?;

        let Submission {
            backend,
            resources,
            models,
            pipelines,
            fence,
            signal_value,
            debug_markers,
        } = submission;

        let mut native = backend.begin_command_list(&self.debug_name)?;
        for command in &self.commands {
            log::trace!("CommandList '{}': {:?}", self.debug_name, command);
            match command {
                Command::SetGraphicsPipeline(cmd) => {
                    let pipeline = pipelines.graphics_pipeline(cmd.pipeline)?;
                    backend.set_graphics_pipeline(&mut native, &pipeline.native)?;
                }
                Command::SetComputePipeline(cmd) => {
                    let pipeline = pipelines.compute_pipeline(cmd.pipeline)?;
                    backend.set_compute_pipeline(&mut native, &pipeline.native)?;
                }
                Command::SetConstantBuffer(cmd) => {
                    backend.set_constant_buffer(&mut native, cmd.slot, &cmd.data)?;
                }
                Command::SetViewport(cmd) => backend.set_viewport(&mut native, &cmd.viewport)?,
                Command::SetScissorRect(cmd) => backend.set_scissor_rect(&mut native, &cmd.rect)?,
                Command::ClearImage(cmd) => {
                    let image = resources.image(cmd.image)?;
                    backend.clear_image(&mut native, &image.native, cmd.color)?;
                }
                Command::ClearDepthImage(cmd) => {
                    let image = resources.depth_image(cmd.image)?;
                    backend.clear_depth_image(
                        &mut native,
                        &image.native,
                        cmd.flags,
                        cmd.depth,
                        cmd.stencil,
                    )?;
                }
                Command::Draw(cmd) => {
                    let model = models.model(cmd.model)?;
                    backend.draw_indexed(&mut native, &model.native, model.index_count, 1)?;
                }
                Command::PushMarker(cmd) => {
                    if debug_markers {
                        backend.push_marker(&mut native, cmd.color, &cmd.label)?;
                    }
                }
                Command::PopMarker(_) => {
                    if debug_markers {
                        backend.pop_marker(&mut native)?;
                    }
                }
                Command::PresentImage(cmd) => {
                    let image = resources.image(cmd.image)?;
                    backend.present_image(&mut native, cmd.window, &image.native)?;
                }
                Command::PresentDepthImage(cmd) => {
                    let image = resources.depth_image(cmd.image)?;
                    backend.present_depth_image(&mut native, cmd.window, &image.native)?;
                }
            }
        }
        backend.end_command_list(native, fence, signal_value)
    }
}

/// Keeps a debug region open for its lifetime.
///
/// Dereferences to the [`CommandList`] so commands can be recorded inside the
/// region through the guard.
pub struct ScopedMarker<'a> {
    list: &'a mut CommandList,
}

impl Deref for ScopedMarker<'_> {
    type Target = CommandList;

    fn deref(&self) -> &CommandList {
        self.list
    }
}

impl DerefMut for ScopedMarker<'_> {
    fn deref_mut(&mut self) -> &mut CommandList {
        self.list
    }
}

impl Drop for ScopedMarker<'_> {
    fn drop(&mut self) {
        self.list.pop_marker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_insertion_order() {
        let mut list = CommandList::new("Test");
        list.push_marker([1.0, 0.0, 0.0, 1.0], "Region");
        list.draw(ModelId::new(3));
        list.pop_marker();

        assert_eq!(list.len(), 3);
        assert!(matches!(list.commands()[0], Command::PushMarker(_)));
        assert_eq!(list.commands()[1], Command::Draw(Draw { model: ModelId::new(3) }));
        assert_eq!(list.commands()[2], Command::PopMarker(PopMarker));
    }

    #[test]
    fn scoped_marker_pops_on_drop() {
        let mut list = CommandList::new("Scoped");
        {
            let mut scope = list.scoped_marker([0.0; 4], "Outer");
            scope.draw(ModelId::new(0));
            let mut inner = scope.scoped_marker([0.0; 4], "Inner");
            inner.draw(ModelId::new(1));
        }
        assert_eq!(list.len(), 6);
        assert!(list.validate_markers().is_ok());
        assert_eq!(list.commands()[5], Command::PopMarker(PopMarker));
    }

    #[test]
    fn unmatched_push_is_rejected() {
        let mut list = CommandList::new("Unbalanced");
        list.push_marker([0.0; 4], "Open");
        list.draw(ModelId::new(0));
        match list.validate_markers() {
            Err(RenderError::UnbalancedMarkers { list, depth }) => {
                assert_eq!(list, "Unbalanced");
                assert_eq!(depth, 1);
            }
            other => panic!("expected UnbalancedMarkers, got {other:?}"),
        }
    }

    #[test]
    fn pop_before_push_is_rejected() {
        let mut list = CommandList::new("Reversed");
        list.pop_marker();
        list.push_marker([0.0; 4], "Late");
        assert!(matches!(
            list.validate_markers(),
            Err(RenderError::UnbalancedMarkers { depth: -1, .. })
        ));
    }

    #[test]
    fn add_command_returns_the_recorded_command() {
        let mut list = CommandList::default();
        if let Command::ClearImage(clear) = list.add_command(ClearImage {
            image: ImageId::new(0),
            color: [0.0; 4],
        }) {
            clear.color = [1.0, 1.0, 1.0, 1.0];
        }
        assert_eq!(
            list.commands()[0],
            Command::ClearImage(ClearImage {
                image: ImageId::new(0),
                color: [1.0; 4],
            })
        );
    }
}
