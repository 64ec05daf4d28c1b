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

use strata_core::renderer::api::{DepthClearFlags, ScissorRect, Viewport, MAX_CONSTANT_BUFFERS};
use strata_core::renderer::RenderError;

use super::resources::{WgpuComputePipeline, WgpuGraphicsPipeline, WgpuModel};

fn load_store<V>() -> wgpu::Operations<V> {
    wgpu::Operations {
        load: wgpu::LoadOp::Load,
        store: wgpu::StoreOp::Store,
    }
}

/// Clamps a scissor rectangle to the extent of the attachments.
fn clamp_scissor(rect: &ScissorRect, extent: (u32, u32)) -> (u32, u32, u32, u32) {
    let x = rect.x.min(extent.0);
    let y = rect.y.min(extent.1);
    let width = rect.width.min(extent.0 - x);
    let height = rect.height.min(extent.1 - y);
    (x, y, width, height)
}

/// A command list being recorded for the wgpu backend.
///
/// Render passes are opened lazily: the first draw after a pipeline change
/// opens a pass over the pipeline's attachments, and the pass stays open for
/// as long as pipelines sharing those attachments are bound. Clears, markers,
/// presents and compute binds close it.
pub struct WgpuCommandList {
    label: String,
    encoder: wgpu::CommandEncoder,
    pass: Option<wgpu::RenderPass<'static>>,
    pass_targets: Vec<u64>,
    graphics: Option<WgpuGraphicsPipeline>,
    compute: Option<WgpuComputePipeline>,
    constant_offsets: [u32; MAX_CONSTANT_BUFFERS],
    constants_dirty: bool,
    viewport: Option<Viewport>,
    scissor: Option<ScissorRect>,
    marker_depth: u32,
}

impl WgpuCommandList {
    pub(crate) fn new(device: &wgpu::Device, label: &str) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
        Self {
            label: label.to_string(),
            encoder,
            pass: None,
            pass_targets: Vec::new(),
            graphics: None,
            compute: None,
            constant_offsets: [0; MAX_CONSTANT_BUFFERS],
            constants_dirty: true,
            viewport: None,
            scissor: None,
            marker_depth: 0,
        }
    }

    /// The debug name the list was opened with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The compute pipeline bound last, if any.
    pub fn compute_pipeline(&self) -> Option<&WgpuComputePipeline> {
        self.compute.as_ref()
    }

    pub(crate) fn end_pass(&mut self) {
        self.pass = None;
        self.pass_targets.clear();
    }

    fn open_pass(&mut self) -> Result<(), RenderError> {
        let pipeline = self.graphics.as_ref().ok_or_else(|| {
            RenderError::Backend(format!(
                "'{}': draw recorded before a graphics pipeline was set",
                self.label
            ))
        })?;
        if pipeline.color_targets.is_empty() && pipeline.depth_target.is_none() {
            return Err(RenderError::Backend(format!(
                "pipeline '{}' has no attachments to render into",
                pipeline.label
            )));
        }

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = pipeline
            .color_targets
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: load_store(),
                })
            })
            .collect();
        let depth_stencil_attachment =
            pipeline
                .depth_target
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(load_store::<f32>()),
                    stencil_ops: depth.has_stencil.then(load_store::<u32>),
                });

        let mut pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&self.label),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        pass.set_pipeline(&pipeline.pipeline);
        if let Some(group) = &pipeline.texture_group {
            pass.set_bind_group(1, group, &[]);
        }
        if let Some(v) = &self.viewport {
            pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
        }
        if let Some(rect) = &self.scissor {
            let (x, y, width, height) = clamp_scissor(rect, pipeline.target_extent);
            pass.set_scissor_rect(x, y, width, height);
        }

        self.pass_targets = pipeline.target_key.clone();
        self.constants_dirty = true;
        self.pass = Some(pass);
        Ok(())
    }

    pub(crate) fn bind_graphics(&mut self, pipeline: &WgpuGraphicsPipeline) {
        if self.pass.is_some() && self.pass_targets != pipeline.target_key {
            self.end_pass();
        }
        if let Some(pass) = self.pass.as_mut() {
            pass.set_pipeline(&pipeline.pipeline);
            if let Some(group) = &pipeline.texture_group {
                pass.set_bind_group(1, group, &[]);
            }
        }
        self.constants_dirty = true;
        self.graphics = Some(pipeline.clone());
    }

    pub(crate) fn bind_compute(&mut self, pipeline: &WgpuComputePipeline) {
        self.end_pass();
        log::trace!("'{}': compute pipeline '{}' bound", self.label, pipeline.label);
        self.compute = Some(pipeline.clone());
    }

    pub(crate) fn set_constant_offset(&mut self, slot: u32, offset: u32) -> Result<(), RenderError> {
        let entry = self
            .constant_offsets
            .get_mut(slot as usize)
            .ok_or_else(|| {
                RenderError::Backend(format!(
                    "constant buffer slot {slot} is out of range (max {MAX_CONSTANT_BUFFERS})"
                ))
            })?;
        *entry = offset;
        self.constants_dirty = true;
        Ok(())
    }

    pub(crate) fn set_viewport(&mut self, viewport: &Viewport) {
        if let Some(pass) = self.pass.as_mut() {
            pass.set_viewport(
                viewport.x,
                viewport.y,
                viewport.width,
                viewport.height,
                viewport.min_depth,
                viewport.max_depth,
            );
        }
        self.viewport = Some(*viewport);
    }

    pub(crate) fn set_scissor_rect(&mut self, rect: &ScissorRect) {
        if let (Some(pass), Some(pipeline)) = (self.pass.as_mut(), self.graphics.as_ref()) {
            let (x, y, width, height) = clamp_scissor(rect, pipeline.target_extent);
            pass.set_scissor_rect(x, y, width, height);
        }
        self.scissor = Some(*rect);
    }

    pub(crate) fn draw_indexed(
        &mut self,
        model: &WgpuModel,
        index_count: u32,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        if index_count > model.index_count {
            return Err(RenderError::Backend(format!(
                "'{}': draw of {index_count} indices from a model holding {}",
                self.label, model.index_count
            )));
        }
        if self.pass.is_none() {
            self.open_pass()?;
        }
        let (Some(pass), Some(pipeline)) = (self.pass.as_mut(), self.graphics.as_ref()) else {
            return Err(RenderError::Backend(format!(
                "'{}': no render pass is open",
                self.label
            )));
        };

        if self.constants_dirty {
            pass.set_bind_group(
                0,
                &pipeline.constant_group,
                &self.constant_offsets[..pipeline.constant_buffer_count],
            );
            self.constants_dirty = false;
        }
        pass.set_vertex_buffer(0, model.vertex_buffer.slice(..));
        pass.set_index_buffer(model.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..instance_count);
        Ok(())
    }

    pub(crate) fn clear_color(&mut self, view: &wgpu::TextureView, color: [f32; 4]) {
        self.end_pass();
        let [r, g, b, a] = color.map(f64::from);
        drop(self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Image"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        }));
    }

    pub(crate) fn clear_depth(
        &mut self,
        view: &wgpu::TextureView,
        has_stencil: bool,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.end_pass();
        let depth_ops = wgpu::Operations {
            load: if flags.depth {
                wgpu::LoadOp::Clear(depth)
            } else {
                wgpu::LoadOp::Load
            },
            store: wgpu::StoreOp::Store,
        };
        let stencil_ops = has_stencil.then(|| wgpu::Operations {
            load: if flags.stencil {
                wgpu::LoadOp::Clear(u32::from(stencil))
            } else {
                wgpu::LoadOp::Load
            },
            store: wgpu::StoreOp::Store,
        });
        drop(self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Depth Image"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(depth_ops),
                stencil_ops,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        }));
    }

    /// Debug groups live on the encoder, so they may span several passes.
    pub(crate) fn push_marker(&mut self, label: &str) {
        self.end_pass();
        self.encoder.push_debug_group(label);
        self.marker_depth += 1;
    }

    pub(crate) fn pop_marker(&mut self) -> Result<(), RenderError> {
        if self.marker_depth == 0 {
            return Err(RenderError::UnbalancedMarkers {
                list: self.label.clone(),
                depth: -1,
            });
        }
        self.end_pass();
        self.encoder.pop_debug_group();
        self.marker_depth -= 1;
        Ok(())
    }

    /// Draws a fullscreen triangle into `target` with `pipeline`.
    pub(crate) fn blit(
        &mut self,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        source: &wgpu::BindGroup,
    ) {
        self.end_pass();
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, source, &[]);
        pass.draw(0..3, 0..1);
    }

    pub(crate) fn finish(mut self) -> wgpu::CommandBuffer {
        self.end_pass();
        if self.marker_depth > 0 {
            log::warn!(
                "'{}': closing {} debug group(s) left open",
                self.label,
                self.marker_depth
            );
            for _ in 0..self.marker_depth {
                self.encoder.pop_debug_group();
            }
        }
        self.encoder.finish()
    }
}
