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

//! Material registry.

use crate::handle::{MaterialId, MaterialKind, Registry};
use crate::renderer::api::MaterialDesc;
use crate::renderer::error::RenderError;
use crate::renderer::resource_handler::ResourceHandler;
use crate::renderer::shader_handler::ShaderHandler;
use crate::renderer::traits::RenderBackend;

/// Stores validated materials and hands out their ids.
#[derive(Default)]
pub struct MaterialHandler {
    materials: Registry<MaterialKind, MaterialDesc>,
}

impl MaterialHandler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `desc` after checking that its shaders and textures exist.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ResourceCreationFailed`] if the slot lists are invalid
    ///   or the material id space is exhausted.
    /// - [`RenderError::InvalidHandle`] if a shader or texture does not resolve.
    pub fn create<B: RenderBackend>(
        &mut self,
        shaders: &ShaderHandler<B>,
        resources: &ResourceHandler<B>,
        desc: MaterialDesc,
    ) -> Result<MaterialId, RenderError> {
        desc.validate()?;
        shaders.vertex_shader(desc.vertex_shader)?;
        if desc.pixel_shader.is_valid() {
            shaders.pixel_shader(desc.pixel_shader)?;
        }
        for &texture in &desc.textures {
            resources.texture(texture)?;
        }

        let name = desc.debug_name.clone();
        let id = self.materials.insert(desc)?;
        log::info!("MaterialHandler: Created material '{}' as {:?}", name, id);
        Ok(id)
    }

    /// The description of a material.
    pub fn material(&self, id: MaterialId) -> Result<&MaterialDesc, RenderError> {
        if !id.is_valid() {
            return Err(RenderError::InvalidHandle {
                kind: "Material",
                index: id.index(),
            });
        }
        self.materials.get(id)
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns `true` if no material was created yet.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
