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

use std::collections::HashMap;
use std::num::NonZeroU64;

use strata_core::renderer::api::{
    DepthClearFlags, DepthFormatSet, DepthImageDesc, DepthStencilOpDesc, ImageDesc,
    InputClassification, ModelData, RenderSettings, ScissorRect, ShaderDesc, ShaderType,
    TextureData, Vertex, Viewport,
};
use strata_core::renderer::traits::{
    BoundTexture, ComputePipelineBuildInfo, GraphicsPipelineBuildInfo, RenderBackend, Window,
    WindowHandle,
};
use strata_core::renderer::RenderError;
use wgpu::util::DeviceExt;

use super::command::WgpuCommandList;
use super::constants::{ConstantRing, MAX_CONSTANT_BUFFER_SIZE};
use super::context::WgpuContext;
use super::conversions::{sampler_descriptor, IntoWgpu};
use super::fence::WgpuFence;
use super::present::{self, PresentSource, Presenter, SwapChain};
use super::resources::*;

/// Binding index of the first static sampler in group 1.
pub const SAMPLER_BINDING_BASE: u32 = 8;

fn extent3d((width, height): (u32, u32)) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn uniform_layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: None,
        },
        count: None,
    }
}

/// The sample type a shader sees for a color texture.
///
/// Multisampled float textures can never be filtered.
fn color_sample_type(
    format: wgpu::TextureFormat,
    sample_count: u32,
    features: wgpu::Features,
) -> wgpu::TextureSampleType {
    match format.sample_type(None, Some(features)) {
        Some(wgpu::TextureSampleType::Float { .. }) if sample_count > 1 => {
            wgpu::TextureSampleType::Float { filterable: false }
        }
        Some(sample_type) => sample_type,
        None => wgpu::TextureSampleType::Float { filterable: false },
    }
}

fn stencil_face(op: &DepthStencilOpDesc) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: op.stencil_func.into_wgpu(),
        fail_op: op.stencil_fail_op.into_wgpu(),
        depth_fail_op: op.stencil_depth_fail_op.into_wgpu(),
        pass_op: op.stencil_pass_op.into_wgpu(),
    }
}

/// The wgpu implementation of [`RenderBackend`].
///
/// Presentation is offscreen: every initialized window owns a ring of RGBA8
/// back buffers, and [`WgpuBackend::read_back`] returns the last image
/// presented to it.
pub struct WgpuBackend {
    context: WgpuContext,
    constants: ConstantRing,
    presenter: Presenter,
    swap_chains: HashMap<WindowHandle, SwapChain>,
    next_target_id: u64,
}

impl WgpuBackend {
    /// Opens a device on the adapter the settings prefer.
    ///
    /// ## Returns
    /// * `Result<Self>` - The backend, or an error if no adapter or device is available.
    pub fn new(settings: &RenderSettings) -> anyhow::Result<Self> {
        let context = pollster::block_on(WgpuContext::new(settings.adapter_preference))?;
        Ok(Self::with_context(context, settings.frames_in_flight as usize))
    }

    /// Builds the backend over an existing context.
    pub fn with_context(context: WgpuContext, frames_in_flight: usize) -> Self {
        let alignment = context.device_limits.min_uniform_buffer_offset_alignment;
        let constants = ConstantRing::new(&context.device, frames_in_flight, alignment);
        let presenter = Presenter::new(&context.device);
        log::info!(
            "WgpuBackend: Ready on \"{}\" ({:?}) with {} frame slot(s)",
            context.adapter_name,
            context.adapter_backend,
            frames_in_flight
        );
        Self {
            context,
            constants,
            presenter,
            swap_chains: HashMap::new(),
            next_target_id: 0,
        }
    }

    /// The device context.
    pub fn context(&self) -> &WgpuContext {
        &self.context
    }

    /// The name of the adapter in use.
    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_name
    }

    /// Copies the image last presented to `window` back to the CPU.
    ///
    /// Blocks until the GPU has finished every submitted command list.
    pub fn read_back(&self, window: WindowHandle) -> Result<image::RgbaImage, RenderError> {
        let chain = self.swap_chains.get(&window).ok_or_else(|| {
            RenderError::Backend(format!("{window} has no swap chain, call init_window first"))
        })?;
        let texture = chain
            .last_presented()
            .ok_or_else(|| RenderError::Backend(format!("nothing was presented to {window}")))?;
        let (width, height) = chain.extent();
        let pixels = present::read_texture(
            &self.context.device,
            &self.context.queue,
            texture,
            (width, height),
        )?;
        image::RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            RenderError::Backend(format!("read back of {window} returned a short buffer"))
        })
    }

    fn next_id(&mut self) -> u64 {
        self.next_target_id += 1;
        self.next_target_id
    }

    fn constant_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        count: usize,
    ) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry> = (0..count as u32)
            .map(|binding| wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: self.constants.buffer(),
                    offset: 0,
                    size: NonZeroU64::new(MAX_CONSTANT_BUFFER_SIZE),
                }),
            })
            .collect();
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Constants")),
            layout,
            entries: &entries,
        })
    }

    fn present(
        &mut self,
        list: &mut WgpuCommandList,
        window: WindowHandle,
        source: PresentSource,
        view: &wgpu::TextureView,
        sample_count: u32,
    ) -> Result<(), RenderError> {
        if sample_count > 1 {
            return Err(RenderError::Backend(format!(
                "cannot present a multisampled image to {window}"
            )));
        }
        let chain = self.swap_chains.get_mut(&window).ok_or_else(|| {
            RenderError::Backend(format!("{window} has no swap chain, call init_window first"))
        })?;
        let group = self.presenter.bind(&self.context.device, source, view);
        let target = chain.acquire()?;
        list.blit(target, self.presenter.pipeline(source), &group);
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    type Image = WgpuImage;
    type DepthImage = WgpuDepthImage;
    type Texture = WgpuTexture;
    type Shader = WgpuShader;
    type Model = WgpuModel;
    type GraphicsPipeline = WgpuGraphicsPipeline;
    type ComputePipeline = WgpuComputePipeline;
    type CommandList = WgpuCommandList;
    type Fence = WgpuFence;

    fn create_image(
        &mut self,
        desc: &ImageDesc,
        extent: (u32, u32),
    ) -> Result<Self::Image, RenderError> {
        let name = desc.debug_name.as_ref();
        let format: wgpu::TextureFormat = desc.format.into_wgpu().ok_or_else(|| {
            RenderError::creation_failed("Image", format!("'{name}' has no wgpu format"))
        })?;
        let sample_count: u32 = desc.sample_count.into_wgpu();

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;
        let storage = sample_count == 1
            && self
                .context
                .format_features(format)
                .allowed_usages
                .contains(wgpu::TextureUsages::STORAGE_BINDING);
        if storage {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }

        let texture = self
            .context
            .capture(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(name),
                    size: extent3d(extent),
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
            })
            .map_err(|reason| RenderError::creation_failed("Image", format!("'{name}': {reason}")))?;

        let target_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{name} RTV")),
            ..Default::default()
        });
        let read_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{name} SRV")),
            ..Default::default()
        });
        let storage_view = storage.then(|| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{name} UAV")),
                ..Default::default()
            })
        });

        log::debug!(
            "WgpuBackend: Created image '{name}' {}x{} {format:?} x{sample_count}",
            extent.0,
            extent.1
        );
        Ok(WgpuImage {
            id: self.next_id(),
            texture,
            target_view,
            read_view,
            storage_view,
            format,
            extent,
            sample_count,
        })
    }

    fn create_depth_image(
        &mut self,
        desc: &DepthImageDesc,
        extent: (u32, u32),
        formats: DepthFormatSet,
    ) -> Result<Self::DepthImage, RenderError> {
        let name = desc.debug_name.as_ref();
        let format: wgpu::TextureFormat = formats.view.into_wgpu().ok_or_else(|| {
            RenderError::creation_failed("DepthImage", format!("'{name}' has no wgpu format"))
        })?;
        let sample_count: u32 = desc.sample_count.into_wgpu();

        let texture = self
            .context
            .capture(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(name),
                    size: extent3d(extent),
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
            })
            .map_err(|reason| {
                RenderError::creation_failed("DepthImage", format!("'{name}': {reason}"))
            })?;

        let depth_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{name} DSV")),
            ..Default::default()
        });
        let depth_read_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{name} Depth SRV")),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });
        let stencil_read_view = formats.stencil_read.map(|_| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{name} Stencil SRV")),
                aspect: wgpu::TextureAspect::StencilOnly,
                ..Default::default()
            })
        });

        log::debug!(
            "WgpuBackend: Created depth image '{name}' {}x{} {format:?}",
            extent.0,
            extent.1
        );
        Ok(WgpuDepthImage {
            id: self.next_id(),
            texture,
            depth_view,
            depth_read_view,
            stencil_read_view,
            format,
            extent,
            sample_count,
        })
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<Self::Texture, RenderError> {
        let name = data.debug_name.as_str();
        let format: wgpu::TextureFormat = data.format.into_wgpu().ok_or_else(|| {
            RenderError::creation_failed("Texture", format!("'{name}' has no wgpu format"))
        })?;
        let bytes_per_row = data.bytes_per_row();
        let expected = bytes_per_row as usize * data.extent.1 as usize;
        if data.pixels.len() != expected {
            return Err(RenderError::creation_failed(
                "Texture",
                format!(
                    "'{name}' holds {} bytes, {expected} expected",
                    data.pixels.len()
                ),
            ));
        }

        let texture = self
            .context
            .capture(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(name),
                    size: extent3d(data.extent),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            })
            .map_err(|reason| {
                RenderError::creation_failed("Texture", format!("'{name}': {reason}"))
            })?;

        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(data.extent.1),
            },
            extent3d(data.extent),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!(
            "WgpuBackend: Uploaded texture '{name}' {}x{} {format:?}",
            data.extent.0,
            data.extent.1
        );
        Ok(WgpuTexture {
            texture,
            view,
            format,
        })
    }

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<Self::Shader, RenderError> {
        let source = std::fs::read_to_string(&desc.path).map_err(|e| {
            RenderError::creation_failed("Shader", format!("cannot read '{}': {e}", desc.path))
        })?;
        let module = self
            .context
            .capture(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&desc.path),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            })
            .map_err(|reason| {
                RenderError::creation_failed("Shader", format!("'{}': {reason}", desc.path))
            })?;
        Ok(WgpuShader {
            module,
            stage: desc.shader_type,
        })
    }

    fn create_model(&mut self, data: &ModelData) -> Result<Self::Model, RenderError> {
        let name = data.debug_name.as_str();
        if data.vertices.is_empty() || data.indices.is_empty() {
            return Err(RenderError::creation_failed(
                "Model",
                format!("'{name}' has no vertices or no indices"),
            ));
        }
        let (vertex_buffer, index_buffer) = self
            .context
            .capture(|device| {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{name} Vertices")),
                    contents: bytemuck::cast_slice(&data.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{name} Indices")),
                    contents: bytemuck::cast_slice(&data.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (vertex_buffer, index_buffer)
            })
            .map_err(|reason| RenderError::creation_failed("Model", format!("'{name}': {reason}")))?;
        Ok(WgpuModel {
            vertex_buffer,
            index_buffer,
            index_count: data.index_count(),
        })
    }

    fn compile_graphics_pipeline(
        &mut self,
        info: &GraphicsPipelineBuildInfo<'_, Self>,
    ) -> Result<Self::GraphicsPipeline, RenderError> {
        let label = info.debug_name;
        let failed = |details: String| RenderError::PipelineCompilationFailed {
            label: label.to_string(),
            details,
        };

        // 1. Check the shader stages
        if info.vertex_shader.stage != ShaderType::Vertex {
            return Err(failed(format!(
                "a {} shader was bound as the vertex shader",
                info.vertex_shader.stage
            )));
        }
        if let Some(pixel) = info.pixel_shader {
            if pixel.stage != ShaderType::Pixel {
                return Err(failed(format!(
                    "a {} shader was bound as the pixel shader",
                    pixel.stage
                )));
            }
        } else if !info.render_targets.is_empty() {
            return Err(failed(
                "color render targets require a pixel shader".to_string(),
            ));
        }

        // 2. Convert the vertex attributes; models provide a single per-vertex stream
        let mut attributes = Vec::with_capacity(info.input_layout.len());
        for (location, input) in info.input_layout.iter().enumerate() {
            if input.slot != 0 || input.input_classification != InputClassification::PerVertex {
                return Err(failed(format!(
                    "attribute '{}{}' must read the per-vertex stream 0",
                    input.semantic, input.index
                )));
            }
            let format = input.format.into_wgpu().ok_or_else(|| {
                failed(format!("attribute '{}' has an UNKNOWN format", input.semantic))
            })?;
            attributes.push(wgpu::VertexAttribute {
                format,
                offset: u64::from(input.aligned_byte_offset),
                shader_location: location as u32,
            });
        }
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: Vertex::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];
        let buffers: &[wgpu::VertexBufferLayout] = if attributes.is_empty() {
            &[]
        } else {
            &vertex_buffers
        };

        // 3. Convert color target states
        let color_targets = info
            .render_target_formats
            .iter()
            .enumerate()
            .map(|(index, format)| {
                let format: wgpu::TextureFormat = format
                    .into_wgpu()
                    .ok_or_else(|| failed(format!("render target {index} has no wgpu format")))?;
                let blend = info.blend.for_target(index);
                Ok(Some(wgpu::ColorTargetState {
                    format,
                    blend: blend.blend_enable.then(|| wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: blend.src_blend.into_wgpu(),
                            dst_factor: blend.dest_blend.into_wgpu(),
                            operation: blend.blend_op.into_wgpu(),
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: blend.src_blend_alpha.into_wgpu(),
                            dst_factor: blend.dest_blend_alpha.into_wgpu(),
                            operation: blend.blend_op_alpha.into_wgpu(),
                        },
                    }),
                    write_mask: wgpu::ColorWrites::from_bits_truncate(u32::from(
                        blend.render_target_write_mask.0,
                    )),
                }))
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        // 4. Convert depth stencil state
        let depth_stencil = match info.depth_stencil_format {
            Some(format) => {
                let format: wgpu::TextureFormat = format
                    .into_wgpu()
                    .ok_or_else(|| failed("depth target has no wgpu format".to_string()))?;
                let ds = info.depth_stencil;
                let rasterizer = info.rasterizer;
                Some(wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: ds.depth_enable && ds.depth_write_enable,
                    depth_compare: if ds.depth_enable {
                        ds.depth_func.into_wgpu()
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: if ds.stencil_enable {
                        wgpu::StencilState {
                            front: stencil_face(&ds.front_face),
                            back: stencil_face(&ds.back_face),
                            read_mask: u32::from(ds.stencil_read_mask),
                            write_mask: u32::from(ds.stencil_write_mask),
                        }
                    } else {
                        wgpu::StencilState::default()
                    },
                    bias: if rasterizer.depth_bias_enabled {
                        wgpu::DepthBiasState {
                            constant: rasterizer.depth_bias,
                            slope_scale: rasterizer.depth_bias_slope_factor,
                            clamp: rasterizer.depth_bias_clamp,
                        }
                    } else {
                        wgpu::DepthBiasState::default()
                    },
                })
            }
            None => None,
        };

        // 5. Describe the bind group layouts
        let constant_entries: Vec<wgpu::BindGroupLayoutEntry> = info
            .layout
            .constant_buffers
            .iter()
            .map(|param| uniform_layout_entry(param.register, param.visibility.into_wgpu()))
            .collect();

        let features = self.context.active_device_features;
        let mut texture_entries = Vec::new();
        let mut texture_views = Vec::new();
        for (index, bound) in info.bound_textures.iter().enumerate() {
            let (sample_type, multisampled, view) = match bound {
                BoundTexture::Image(image) => (
                    color_sample_type(image.format, image.sample_count, features),
                    image.sample_count > 1,
                    &image.read_view,
                ),
                BoundTexture::DepthImage(depth) => (
                    wgpu::TextureSampleType::Depth,
                    depth.sample_count > 1,
                    &depth.depth_read_view,
                ),
                BoundTexture::Texture(texture) => (
                    color_sample_type(texture.format, 1, features),
                    false,
                    &texture.view,
                ),
            };
            let visibility = info
                .layout
                .texture_table
                .map_or(wgpu::ShaderStages::FRAGMENT, |table| {
                    table.visibility.into_wgpu()
                });
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: index as u32,
                visibility,
                ty: wgpu::BindingType::Texture {
                    sample_type,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled,
                },
                count: None,
            });
            texture_views.push(view);
        }
        for (index, sampler) in info.layout.samplers.iter().enumerate() {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING_BASE + index as u32,
                visibility: sampler.shader_visibility.into_wgpu(),
                ty: wgpu::BindingType::Sampler(sampler.filter.into_wgpu()),
                count: None,
            });
        }
        let clamp_to_border = self
            .context
            .has_feature(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let sample_count: u32 = info.sample_count.into_wgpu();

        // 6. Create the layouts, bind groups and render pipeline
        let created = self.context.capture(|device| {
            let constant_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Constants Layout")),
                entries: &constant_entries,
            });
            let constant_group =
                self.constant_group(device, label, &constant_layout, constant_entries.len());

            let texture_binding = (!texture_entries.is_empty()).then(|| {
                let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{label} Textures Layout")),
                    entries: &texture_entries,
                });
                let samplers: Vec<wgpu::Sampler> = info
                    .layout
                    .samplers
                    .iter()
                    .map(|state| {
                        device.create_sampler(&sampler_descriptor(
                            Some(label),
                            state,
                            clamp_to_border,
                        ))
                    })
                    .collect();
                let entries: Vec<wgpu::BindGroupEntry> = texture_views
                    .iter()
                    .enumerate()
                    .map(|(index, view)| wgpu::BindGroupEntry {
                        binding: index as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
                    .chain(samplers.iter().enumerate().map(|(index, sampler)| {
                        wgpu::BindGroupEntry {
                            binding: SAMPLER_BINDING_BASE + index as u32,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        }
                    }))
                    .collect();
                let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} Textures")),
                    layout: &layout,
                    entries: &entries,
                });
                (layout, group)
            });

            let mut bind_group_layouts = vec![&constant_layout];
            if let Some((layout, _)) = &texture_binding {
                bind_group_layouts.push(layout);
            }
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label} Layout")),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &info.vertex_shader.module,
                    entry_point: Some(ShaderType::Vertex.entry_point()),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: info.pixel_shader.map(|pixel| wgpu::FragmentState {
                    module: &pixel.module,
                    entry_point: Some(ShaderType::Pixel.entry_point()),
                    targets: &color_targets,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: info.rasterizer.front_face.into_wgpu(),
                    cull_mode: info.rasterizer.cull_mode.into_wgpu(),
                    polygon_mode: info.rasterizer.fill_mode.into_wgpu(),
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState {
                    count: sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: info.blend.alpha_to_coverage_enable,
                },
                multiview: None,
                cache: None,
            });
            (pipeline, constant_group, texture_binding.map(|(_, group)| group))
        });
        let (pipeline, constant_group, texture_group) = created.map_err(failed)?;

        let mut target_key: Vec<u64> = info.render_targets.iter().map(|image| image.id).collect();
        target_key.extend(info.depth_target.map(|depth| depth.id));
        let target_extent = info
            .render_targets
            .first()
            .map(|image| image.extent)
            .or(info.depth_target.map(|depth| depth.extent))
            .unwrap_or_default();

        log::info!(
            "WgpuBackend: Compiled graphics pipeline '{label}' ({} target(s), {} constant buffer(s), {} texture(s))",
            info.render_targets.len(),
            constant_entries.len(),
            info.bound_textures.len()
        );
        Ok(WgpuGraphicsPipeline {
            label: label.to_string(),
            pipeline,
            constant_group,
            constant_buffer_count: constant_entries.len(),
            texture_group,
            color_targets: info
                .render_targets
                .iter()
                .map(|image| image.target_view.clone())
                .collect(),
            depth_target: info.depth_target.map(|depth| DepthAttachment {
                view: depth.depth_view.clone(),
                has_stencil: depth.has_stencil(),
            }),
            target_key,
            target_extent,
        })
    }

    fn compile_compute_pipeline(
        &mut self,
        info: &ComputePipelineBuildInfo<'_, Self>,
    ) -> Result<Self::ComputePipeline, RenderError> {
        let label = info.debug_name;
        let failed = |details: String| RenderError::PipelineCompilationFailed {
            label: label.to_string(),
            details,
        };
        if info.compute_shader.stage != ShaderType::Compute {
            return Err(failed(format!(
                "a {} shader was bound as the compute shader",
                info.compute_shader.stage
            )));
        }

        let constant_entries: Vec<wgpu::BindGroupLayoutEntry> = info
            .layout
            .constant_buffers
            .iter()
            .map(|param| uniform_layout_entry(param.register, wgpu::ShaderStages::COMPUTE))
            .collect();

        let created = self.context.capture(|device| {
            let constant_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Constants Layout")),
                entries: &constant_entries,
            });
            let constant_group =
                self.constant_group(device, label, &constant_layout, constant_entries.len());
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label} Layout")),
                bind_group_layouts: &[&constant_layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &info.compute_shader.module,
                entry_point: Some(ShaderType::Compute.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            });
            (pipeline, constant_group)
        });
        let (pipeline, constant_group) = created.map_err(failed)?;

        log::info!("WgpuBackend: Compiled compute pipeline '{label}'");
        Ok(WgpuComputePipeline {
            label: label.to_string(),
            pipeline,
            constant_group,
            constant_buffer_count: constant_entries.len(),
        })
    }

    fn init_window(&mut self, window: &dyn Window) -> Result<(), RenderError> {
        let handle = window.handle();
        let extent = window.dimensions();
        if extent.0 == 0 || extent.1 == 0 {
            return Err(RenderError::Backend(format!(
                "{handle} has an empty client area"
            )));
        }
        let count = window.frame_buffer_count();
        let chain = SwapChain::new(&self.context.device, handle, extent, count);
        if self.swap_chains.insert(handle, chain).is_some() {
            log::warn!("WgpuBackend: Replaced the swap chain of {handle}");
        }
        log::info!(
            "WgpuBackend: {handle} initialized with {count} back buffer(s) of {}x{}",
            extent.0,
            extent.1
        );
        Ok(())
    }

    fn create_fence(&mut self) -> Result<Self::Fence, RenderError> {
        Ok(WgpuFence::new(self.context.device.clone()))
    }

    fn reset_frame_slot(&mut self, slot: usize) -> Result<(), RenderError> {
        self.constants.begin_region(slot);
        Ok(())
    }

    fn begin_command_list(&mut self, debug_name: &str) -> Result<Self::CommandList, RenderError> {
        Ok(WgpuCommandList::new(&self.context.device, debug_name))
    }

    fn end_command_list(
        &mut self,
        list: Self::CommandList,
        fence: &Self::Fence,
        value: u64,
    ) -> Result<(), RenderError> {
        let label = list.label().to_string();
        let commands = list.finish();
        self.constants.flush(&self.context.queue);
        self.context.queue.submit(Some(commands));
        fence.signal_on_completion(&self.context.queue, value);
        log::trace!("WgpuBackend: Submitted '{label}', signals {value}");
        Ok(())
    }

    fn set_graphics_pipeline(
        &mut self,
        list: &mut Self::CommandList,
        pipeline: &Self::GraphicsPipeline,
    ) -> Result<(), RenderError> {
        list.bind_graphics(pipeline);
        Ok(())
    }

    fn set_compute_pipeline(
        &mut self,
        list: &mut Self::CommandList,
        pipeline: &Self::ComputePipeline,
    ) -> Result<(), RenderError> {
        list.bind_compute(pipeline);
        Ok(())
    }

    fn set_constant_buffer(
        &mut self,
        list: &mut Self::CommandList,
        slot: u32,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let offset = self.constants.push(data)?;
        list.set_constant_offset(slot, offset)
    }

    fn set_viewport(
        &mut self,
        list: &mut Self::CommandList,
        viewport: &Viewport,
    ) -> Result<(), RenderError> {
        list.set_viewport(viewport);
        Ok(())
    }

    fn set_scissor_rect(
        &mut self,
        list: &mut Self::CommandList,
        rect: &ScissorRect,
    ) -> Result<(), RenderError> {
        list.set_scissor_rect(rect);
        Ok(())
    }

    fn clear_image(
        &mut self,
        list: &mut Self::CommandList,
        image: &Self::Image,
        color: [f32; 4],
    ) -> Result<(), RenderError> {
        list.clear_color(&image.target_view, color);
        Ok(())
    }

    fn clear_depth_image(
        &mut self,
        list: &mut Self::CommandList,
        image: &Self::DepthImage,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<(), RenderError> {
        list.clear_depth(&image.depth_view, image.has_stencil(), flags, depth, stencil);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        list: &mut Self::CommandList,
        model: &Self::Model,
        index_count: u32,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        list.draw_indexed(model, index_count, instance_count)
    }

    fn push_marker(
        &mut self,
        list: &mut Self::CommandList,
        _color: [f32; 4],
        label: &str,
    ) -> Result<(), RenderError> {
        list.push_marker(label);
        Ok(())
    }

    fn pop_marker(&mut self, list: &mut Self::CommandList) -> Result<(), RenderError> {
        list.pop_marker()
    }

    fn present_image(
        &mut self,
        list: &mut Self::CommandList,
        window: WindowHandle,
        image: &Self::Image,
    ) -> Result<(), RenderError> {
        let float = matches!(
            image.format.sample_type(None, None),
            Some(wgpu::TextureSampleType::Float { .. })
        );
        if !float {
            return Err(RenderError::Backend(format!(
                "cannot present integer image format {:?}",
                image.format
            )));
        }
        self.present(
            list,
            window,
            PresentSource::Color,
            &image.read_view,
            image.sample_count,
        )
    }

    fn present_depth_image(
        &mut self,
        list: &mut Self::CommandList,
        window: WindowHandle,
        image: &Self::DepthImage,
    ) -> Result<(), RenderError> {
        self.present(
            list,
            window,
            PresentSource::Depth,
            &image.depth_read_view,
            image.sample_count,
        )
    }
}
