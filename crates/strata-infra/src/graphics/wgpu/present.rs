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

//! Offscreen swap chains and the blit that presents images into them.

use std::sync::mpsc;
use strata_core::renderer::{RenderError, WindowHandle};

/// The format of every window back buffer.
pub const BACK_BUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const PRESENT_SHADER: &str = include_str!("present.wgsl");

/// The back buffers of one window, used round-robin.
pub(crate) struct SwapChain {
    buffers: Vec<(wgpu::Texture, wgpu::TextureView)>,
    extent: (u32, u32),
    next: usize,
    last_presented: Option<usize>,
}

impl SwapChain {
    pub(crate) fn new(
        device: &wgpu::Device,
        window: WindowHandle,
        extent: (u32, u32),
        count: u32,
    ) -> Self {
        let buffers = (0..count)
            .map(|index| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("{window} Back Buffer {index}")),
                    size: wgpu::Extent3d {
                        width: extent.0,
                        height: extent.1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: BACK_BUFFER_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                (texture, view)
            })
            .collect();
        Self {
            buffers,
            extent,
            next: 0,
            last_presented: None,
        }
    }

    /// Takes the next back buffer and records it as the one shown.
    pub(crate) fn acquire(&mut self) -> Result<&wgpu::TextureView, RenderError> {
        let index = self.next;
        let (_, view) = self
            .buffers
            .get(index)
            .ok_or_else(|| RenderError::Backend("swap chain has no back buffers".to_string()))?;
        self.next = (index + 1) % self.buffers.len();
        self.last_presented = Some(index);
        Ok(view)
    }

    pub(crate) fn last_presented(&self) -> Option<&wgpu::Texture> {
        self.last_presented
            .and_then(|index| self.buffers.get(index))
            .map(|(texture, _)| texture)
    }

    pub(crate) fn extent(&self) -> (u32, u32) {
        self.extent
    }
}

/// Which kind of image is being presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PresentSource {
    Color,
    Depth,
}

/// The two blit pipelines, one per source kind.
pub(crate) struct Presenter {
    color_layout: wgpu::BindGroupLayout,
    depth_layout: wgpu::BindGroupLayout,
    color_pipeline: wgpu::RenderPipeline,
    depth_pipeline: wgpu::RenderPipeline,
}

impl Presenter {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(PRESENT_SHADER.into()),
        });
        let source_layout = |binding: u32, sample_type: wgpu::TextureSampleType| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Present Source Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            })
        };
        let color_layout = source_layout(0, wgpu::TextureSampleType::Float { filterable: false });
        let depth_layout = source_layout(1, wgpu::TextureSampleType::Depth);

        let pipeline = |layout: &wgpu::BindGroupLayout, entry_point: &str| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Present Pipeline Layout"),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(entry_point),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: BACK_BUFFER_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        let color_pipeline = pipeline(&color_layout, "ps_color");
        let depth_pipeline = pipeline(&depth_layout, "ps_depth");

        Self {
            color_layout,
            depth_layout,
            color_pipeline,
            depth_pipeline,
        }
    }

    pub(crate) fn pipeline(&self, source: PresentSource) -> &wgpu::RenderPipeline {
        match source {
            PresentSource::Color => &self.color_pipeline,
            PresentSource::Depth => &self.depth_pipeline,
        }
    }

    pub(crate) fn bind(
        &self,
        device: &wgpu::Device,
        source: PresentSource,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let (layout, binding) = match source {
            PresentSource::Color => (&self.color_layout, 0),
            PresentSource::Depth => (&self.depth_layout, 1),
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Present Source"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(view),
            }],
        })
    }
}

/// Copies an RGBA8 texture back to the CPU, blocking until the GPU is done.
///
/// Returns tightly packed rows.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    extent: (u32, u32),
) -> Result<Vec<u8>, RenderError> {
    let (width, height) = extent;
    let unpadded = width * 4;
    let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Read Back Buffer"),
        size: u64::from(padded) * u64::from(height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Read Back"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver outlives the poll below; a send failure means nobody waits.
        let _ = tx.send(result);
    });
    // PollType::Wait is blocking and will wait for the queue to be empty
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| RenderError::DeviceLost {
            reason: format!("read back poll failed: {e}"),
        })?;
    rx.recv()
        .map_err(|_| RenderError::Backend("read back callback never ran".to_string()))?
        .map_err(|e| RenderError::Backend(format!("read back mapping failed: {e}")))?;

    let mut pixels = Vec::with_capacity((unpadded * height) as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks(padded as usize) {
            pixels.extend_from_slice(&row[..unpadded as usize]);
        }
    }
    buffer.unmap();
    Ok(pixels)
}
