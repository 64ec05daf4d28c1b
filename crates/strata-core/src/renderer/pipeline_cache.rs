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

//! Deduplicating creation of graphics and compute pipelines.
//!
//! Passes re-declare their pipeline description every frame. The cache keys
//! each description by a hash over its meaningful fields (shaders, states,
//! and the resources its tokens resolve to) and only asks the backend to
//! compile descriptions it has not seen before.

use crate::handle::{
    ComputePipelineId, ComputePipelineKind, ComputeShaderId, DepthImageId, GraphicsPipelineId,
    GraphicsPipelineKind, ImageId, Registry,
};
use crate::render_graph::{BoundResource, RenderPassMutableResource, ResourceResolver};
use crate::renderer::api::*;
use crate::renderer::error::RenderError;
use crate::renderer::material_handler::MaterialHandler;
use crate::renderer::resource_handler::ResourceHandler;
use crate::renderer::shader_handler::ShaderHandler;
use crate::renderer::traits::{
    BoundTexture, ComputePipelineBuildInfo, GraphicsPipelineBuildInfo, RenderBackend,
};
use ahash::{AHashMap, RandomState};
use std::hash::Hash;

/// Seeds of the cache key hasher. Fixed so keys are stable between runs.
const CACHE_KEY_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Hash)]
struct GraphicsPipelineKey<'a> {
    states: &'a GraphicsPipelineStates,
    render_targets: &'a [ImageId],
    depth_stencil: Option<DepthImageId>,
    textures: &'a [BoundResource],
}

#[derive(Hash)]
struct ComputePipelineKey<'a> {
    compute_shader: ComputeShaderId,
    constant_buffer_states: &'a [ConstantBufferState],
}

/// A compiled graphics pipeline.
pub struct GraphicsPipelineEntry<N> {
    /// Name shown in debuggers and logs.
    pub debug_name: String,
    /// The cache key it was stored under.
    pub key: u64,
    /// Its binding layout.
    pub layout: RootLayout,
    /// The sample count of its targets.
    pub sample_count: SampleCount,
    /// The backend object.
    pub native: N,
}

/// A compiled compute pipeline.
pub struct ComputePipelineEntry<N> {
    /// Name shown in debuggers and logs.
    pub debug_name: String,
    /// The cache key it was stored under.
    pub key: u64,
    /// Its binding layout.
    pub layout: RootLayout,
    /// The backend object.
    pub native: N,
}

/// The resources a graphics pipeline description resolves to.
struct ResolvedTargets {
    render_targets: Vec<ImageId>,
    depth_stencil: Option<DepthImageId>,
    textures: Vec<BoundResource>,
}

/// Creates pipelines and remembers them by description.
pub struct PipelineCache<B: RenderBackend> {
    hasher: RandomState,
    graphics: Registry<GraphicsPipelineKind, GraphicsPipelineEntry<B::GraphicsPipeline>>,
    graphics_by_key: AHashMap<u64, GraphicsPipelineId>,
    compute: Registry<ComputePipelineKind, ComputePipelineEntry<B::ComputePipeline>>,
    compute_by_key: AHashMap<u64, ComputePipelineId>,
}

impl<B: RenderBackend> Default for PipelineCache<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> PipelineCache<B> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        let [k0, k1, k2, k3] = CACHE_KEY_SEEDS;
        Self {
            hasher: RandomState::with_seeds(k0, k1, k2, k3),
            graphics: Registry::new(),
            graphics_by_key: AHashMap::new(),
            compute: Registry::new(),
            compute_by_key: AHashMap::new(),
        }
    }

    fn key_of(&self, value: impl Hash) -> u64 {
        self.hasher.hash_one(value)
    }

    fn resolve_targets(
        resolver: &dyn ResourceResolver,
        render_targets: &[RenderPassMutableResource],
        depth_stencil: RenderPassMutableResource,
    ) -> Result<ResolvedTargets, RenderError> {
        let render_targets = render_targets
            .iter()
            .map(|&token| resolver.resolve_image(token))
            .collect::<Result<Vec<_>, _>>()?;
        let depth_stencil = if depth_stencil.is_valid() {
            Some(resolver.resolve_depth_image(depth_stencil)?)
        } else {
            None
        };
        Ok(ResolvedTargets {
            render_targets,
            depth_stencil,
            textures: Vec::new(),
        })
    }

    /// Returns the pipeline for `desc`, compiling it on first use.
    ///
    /// Render target and texture tokens of `desc` are resolved through
    /// `resolver`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::InvalidHandle`] if a token or shader id does not resolve.
    /// - [`RenderError::PipelineCompilationFailed`] if the targets disagree on
    ///   their sample count or the backend rejects the pipeline.
    pub fn create_graphics_pipeline(
        &mut self,
        backend: &mut B,
        shaders: &ShaderHandler<B>,
        resources: &ResourceHandler<B>,
        resolver: &dyn ResourceResolver,
        desc: &GraphicsPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        let mut resolved = Self::resolve_targets(
            resolver,
            desc.active_render_targets(),
            desc.depth_stencil,
        )?;
        resolved.textures = desc
            .active_textures()
            .iter()
            .map(|&token| resolver.resolve_read(token))
            .collect::<Result<Vec<_>, _>>()?;
        self.get_or_compile(
            backend,
            shaders,
            resources,
            &desc.debug_name,
            &desc.states,
            &resolved,
        )
    }

    /// Returns the pipeline drawing the material of `desc` into its targets,
    /// compiling it on first use.
    ///
    /// The material supplies shaders, blending, slot layouts and textures;
    /// `desc` supplies rasterizer and depth-stencil state and the targets,
    /// resolved through `resolver`. The result lives in the same cache as
    /// plain graphics pipelines, so a material and an equivalent
    /// [`GraphicsPipelineDesc`] share one pipeline.
    ///
    /// # Errors
    ///
    /// As [`PipelineCache::create_graphics_pipeline`], plus
    /// [`RenderError::InvalidHandle`] for an unknown material.
    pub fn create_material_pipeline(
        &mut self,
        backend: &mut B,
        shaders: &ShaderHandler<B>,
        resources: &ResourceHandler<B>,
        materials: &MaterialHandler,
        resolver: &dyn ResourceResolver,
        desc: &MaterialPipelineDesc,
    ) -> Result<GraphicsPipelineId, RenderError> {
        let material = materials.material(desc.material)?;
        let states = material.pipeline_states(desc.rasterizer_state, desc.depth_stencil_state);
        let mut resolved = Self::resolve_targets(
            resolver,
            desc.active_render_targets(),
            desc.depth_stencil,
        )?;
        resolved.textures = material
            .textures
            .iter()
            .map(|&texture| BoundResource::Texture(texture))
            .collect();
        self.get_or_compile(
            backend,
            shaders,
            resources,
            &desc.debug_name,
            &states,
            &resolved,
        )
    }

    fn get_or_compile(
        &mut self,
        backend: &mut B,
        shaders: &ShaderHandler<B>,
        resources: &ResourceHandler<B>,
        debug_name: &str,
        states: &GraphicsPipelineStates,
        resolved: &ResolvedTargets,
    ) -> Result<GraphicsPipelineId, RenderError> {
        let key = self.key_of(GraphicsPipelineKey {
            states,
            render_targets: &resolved.render_targets,
            depth_stencil: resolved.depth_stencil,
            textures: &resolved.textures,
        });
        if let Some(&id) = self.graphics_by_key.get(&key) {
            log::debug!(
                "PipelineCache: Cache hit for '{}' ({:?})",
                debug_name,
                id
            );
            return Ok(id);
        }

        let compilation_failed = |details: String| RenderError::PipelineCompilationFailed {
            label: debug_name.to_string(),
            details,
        };

        let layout = RootLayout::build(
            &states.constant_buffer_states,
            resolved.textures.len(),
            &states.samplers,
        );
        let input_layout = build_input_layout(&states.input_layouts);

        let mut sample_counts = Vec::with_capacity(resolved.render_targets.len() + 1);
        let mut render_targets = Vec::with_capacity(resolved.render_targets.len());
        let mut render_target_formats = Vec::with_capacity(resolved.render_targets.len());
        for &id in &resolved.render_targets {
            let image = resources.image(id)?;
            render_targets.push(&image.native);
            render_target_formats.push(image.desc.format);
            sample_counts.push(image.desc.sample_count);
        }
        let (depth_target, depth_stencil_format) = match resolved.depth_stencil {
            Some(id) => {
                let depth = resources.depth_image(id)?;
                sample_counts.push(depth.desc.sample_count);
                (Some(&depth.native), Some(depth.formats.view))
            }
            None => (None, None),
        };
        let sample_count = sample_counts.first().copied().unwrap_or_default();
        if sample_counts.iter().any(|&count| count != sample_count) {
            return Err(compilation_failed(format!(
                "targets mix sample counts {:?}",
                sample_counts
            )));
        }

        if !states.vertex_shader.is_valid() {
            return Err(compilation_failed("no vertex shader".to_string()));
        }
        let vertex_shader = shaders.vertex_shader(states.vertex_shader)?;
        let pixel_shader = if states.pixel_shader.is_valid() {
            Some(shaders.pixel_shader(states.pixel_shader)?)
        } else {
            None
        };

        let bound_textures = resolved
            .textures
            .iter()
            .map(|bound| {
                Ok(match *bound {
                    BoundResource::Image(id) => BoundTexture::Image(&resources.image(id)?.native),
                    BoundResource::DepthImage(id) => {
                        BoundTexture::DepthImage(&resources.depth_image(id)?.native)
                    }
                    BoundResource::Texture(id) => {
                        BoundTexture::Texture(&resources.texture(id)?.native)
                    }
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        self.graphics.check_capacity()?;
        let native = backend
            .compile_graphics_pipeline(&GraphicsPipelineBuildInfo {
                debug_name,
                layout: &layout,
                input_layout: &input_layout,
                rasterizer: &states.rasterizer_state,
                depth_stencil: &states.depth_stencil_state,
                blend: &states.blend_state,
                vertex_shader,
                pixel_shader,
                render_targets: &render_targets,
                render_target_formats: &render_target_formats,
                depth_target,
                depth_stencil_format,
                sample_count,
                bound_textures: &bound_textures,
            })
            .map_err(|err| match err {
                RenderError::PipelineCompilationFailed { .. } => err,
                other => compilation_failed(other.to_string()),
            })?;

        let id = self.graphics.insert(GraphicsPipelineEntry {
            debug_name: debug_name.to_string(),
            key,
            layout,
            sample_count,
            native,
        })?;
        self.graphics_by_key.insert(key, id);
        log::info!(
            "PipelineCache: Compiled graphics pipeline '{}' as {:?} (key {:#018x})",
            debug_name,
            id,
            key
        );
        Ok(id)
    }

    /// Returns the compute pipeline for `desc`, compiling it on first use.
    pub fn create_compute_pipeline(
        &mut self,
        backend: &mut B,
        shaders: &ShaderHandler<B>,
        desc: &ComputePipelineDesc,
    ) -> Result<ComputePipelineId, RenderError> {
        let key = self.key_of(ComputePipelineKey {
            compute_shader: desc.compute_shader,
            constant_buffer_states: desc.active_constant_buffers(),
        });
        if let Some(&id) = self.compute_by_key.get(&key) {
            log::debug!(
                "PipelineCache: Cache hit for '{}' ({:?})",
                desc.debug_name,
                id
            );
            return Ok(id);
        }

        if !desc.compute_shader.is_valid() {
            return Err(RenderError::PipelineCompilationFailed {
                label: desc.debug_name.to_string(),
                details: "no compute shader".to_string(),
            });
        }
        let compute_shader = shaders.compute_shader(desc.compute_shader)?;
        let layout = RootLayout::build(&desc.constant_buffer_states, 0, &[]);

        self.compute.check_capacity()?;
        let native = backend
            .compile_compute_pipeline(&ComputePipelineBuildInfo {
                debug_name: &desc.debug_name,
                layout: &layout,
                compute_shader,
            })
            .map_err(|err| match err {
                RenderError::PipelineCompilationFailed { .. } => err,
                other => RenderError::PipelineCompilationFailed {
                    label: desc.debug_name.to_string(),
                    details: other.to_string(),
                },
            })?;

        let id = self.compute.insert(ComputePipelineEntry {
            debug_name: desc.debug_name.to_string(),
            key,
            layout,
            native,
        })?;
        self.compute_by_key.insert(key, id);
        log::info!(
            "PipelineCache: Compiled compute pipeline '{}' as {:?}",
            desc.debug_name,
            id
        );
        Ok(id)
    }

    /// The entry of a graphics pipeline.
    pub fn graphics_pipeline(
        &self,
        id: GraphicsPipelineId,
    ) -> Result<&GraphicsPipelineEntry<B::GraphicsPipeline>, RenderError> {
        self.graphics.get(id)
    }

    /// The entry of a compute pipeline.
    pub fn compute_pipeline(
        &self,
        id: ComputePipelineId,
    ) -> Result<&ComputePipelineEntry<B::ComputePipeline>, RenderError> {
        self.compute.get(id)
    }

    /// Number of distinct graphics pipelines compiled.
    pub fn graphics_pipeline_count(&self) -> usize {
        self.graphics.len()
    }

    /// Number of distinct compute pipelines compiled.
    pub fn compute_pipeline_count(&self) -> usize {
        self.compute.len()
    }
}
