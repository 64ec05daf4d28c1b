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

//! Shader module loading, deduplicated by path.

use crate::handle::{
    ComputeShaderId, ComputeShaderKind, Handle, HandleKind, PixelShaderId, PixelShaderKind,
    Registry, VertexShaderId, VertexShaderKind,
};
use crate::renderer::api::{ShaderDesc, ShaderType};
use crate::renderer::error::RenderError;
use crate::renderer::traits::RenderBackend;
use ahash::AHashMap;

/// A loaded shader and the path it came from.
pub struct ShaderEntry<N> {
    /// The path the module was loaded from.
    pub path: String,
    /// The backend object.
    pub native: N,
}

struct ShaderTable<K: HandleKind, N> {
    registry: Registry<K, ShaderEntry<N>>,
    by_path: AHashMap<String, Handle<K>>,
}

impl<K: HandleKind, N> ShaderTable<K, N> {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            by_path: AHashMap::new(),
        }
    }

    fn load<B>(&mut self, backend: &mut B, desc: ShaderDesc) -> Result<Handle<K>, RenderError>
    where
        B: RenderBackend<Shader = N>,
    {
        if let Some(&id) = self.by_path.get(&desc.path) {
            log::debug!("ShaderHandler: '{}' already loaded as {:?}", desc.path, id);
            return Ok(id);
        }
        self.registry.check_capacity()?;
        let native = backend.load_shader(&desc)?;
        let id = self.registry.insert(ShaderEntry {
            path: desc.path.clone(),
            native,
        })?;
        log::info!(
            "ShaderHandler: Loaded {} shader '{}' as {:?}",
            desc.shader_type,
            desc.path,
            id
        );
        self.by_path.insert(desc.path, id);
        Ok(id)
    }
}

/// Loads shader modules and hands out typed ids per stage.
///
/// Loading the same path twice for the same stage returns the first id.
pub struct ShaderHandler<B: RenderBackend> {
    vertex: ShaderTable<VertexShaderKind, B::Shader>,
    pixel: ShaderTable<PixelShaderKind, B::Shader>,
    compute: ShaderTable<ComputeShaderKind, B::Shader>,
}

impl<B: RenderBackend> Default for ShaderHandler<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> ShaderHandler<B> {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self {
            vertex: ShaderTable::new(),
            pixel: ShaderTable::new(),
            compute: ShaderTable::new(),
        }
    }

    /// Loads a vertex shader.
    pub fn load_vertex_shader(
        &mut self,
        backend: &mut B,
        path: &str,
    ) -> Result<VertexShaderId, RenderError> {
        self.vertex.load(backend, ShaderDesc::vertex(path))
    }

    /// Loads a pixel shader.
    pub fn load_pixel_shader(
        &mut self,
        backend: &mut B,
        path: &str,
    ) -> Result<PixelShaderId, RenderError> {
        self.pixel.load(backend, ShaderDesc::pixel(path))
    }

    /// Loads a compute shader.
    pub fn load_compute_shader(
        &mut self,
        backend: &mut B,
        path: &str,
    ) -> Result<ComputeShaderId, RenderError> {
        self.compute.load(backend, ShaderDesc::compute(path))
    }

    /// Loads the shader described by `desc`, returning its raw index.
    ///
    /// Prefer the typed loaders; this exists for data-driven callers.
    pub fn load(&mut self, backend: &mut B, desc: ShaderDesc) -> Result<u16, RenderError> {
        match desc.shader_type {
            ShaderType::Vertex => self.vertex.load(backend, desc).map(Handle::index),
            ShaderType::Pixel => self.pixel.load(backend, desc).map(Handle::index),
            ShaderType::Compute => self.compute.load(backend, desc).map(Handle::index),
        }
    }

    /// The backend object of a vertex shader.
    pub fn vertex_shader(&self, id: VertexShaderId) -> Result<&B::Shader, RenderError> {
        self.vertex.registry.get(id).map(|entry| &entry.native)
    }

    /// The backend object of a pixel shader.
    pub fn pixel_shader(&self, id: PixelShaderId) -> Result<&B::Shader, RenderError> {
        self.pixel.registry.get(id).map(|entry| &entry.native)
    }

    /// The backend object of a compute shader.
    pub fn compute_shader(&self, id: ComputeShaderId) -> Result<&B::Shader, RenderError> {
        self.compute.registry.get(id).map(|entry| &entry.native)
    }

    /// Number of distinct shaders loaded, over all stages.
    pub fn len(&self) -> usize {
        self.vertex.registry.len() + self.pixel.registry.len() + self.compute.registry.len()
    }

    /// Returns `true` if no shader was loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
