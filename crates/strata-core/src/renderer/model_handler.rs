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

//! Model ownership.

use crate::handle::{ModelId, ModelKind, Registry};
use crate::renderer::api::{ModelData, ModelDesc};
use crate::renderer::error::RenderError;
use crate::renderer::traits::{ModelLoader, RenderBackend};

/// An uploaded model.
pub struct ModelEntry<N> {
    /// Name shown in debuggers and logs.
    pub debug_name: String,
    /// Number of indices drawn by a full draw.
    pub index_count: u32,
    /// The backend object.
    pub native: N,
}

/// Uploads models and hands out their ids.
pub struct ModelHandler<B: RenderBackend> {
    models: Registry<ModelKind, ModelEntry<B::Model>>,
}

impl<B: RenderBackend> Default for ModelHandler<B> {
    fn default() -> Self {
        Self {
            models: Registry::new(),
        }
    }
}

impl<B: RenderBackend> ModelHandler<B> {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the model at `desc.path` through `loader` and uploads it.
    pub fn load_model(
        &mut self,
        backend: &mut B,
        loader: &dyn ModelLoader,
        desc: &ModelDesc,
    ) -> Result<ModelId, RenderError> {
        let mut data = loader.load(&desc.path)?;
        if data.debug_name.is_empty() {
            data.debug_name = desc.path.clone();
        }
        self.create_model(backend, &data)
    }

    /// Uploads in-memory model data.
    pub fn create_model(&mut self, backend: &mut B, data: &ModelData) -> Result<ModelId, RenderError> {
        if data.vertices.is_empty() || data.indices.is_empty() {
            return Err(RenderError::creation_failed(
                "Model",
                format!("'{}' has no geometry", data.debug_name),
            ));
        }
        if let Some(&bad) = data
            .indices
            .iter()
            .find(|&&index| index as usize >= data.vertices.len())
        {
            return Err(RenderError::creation_failed(
                "Model",
                format!(
                    "'{}' references vertex {bad} but has {} vertices",
                    data.debug_name,
                    data.vertices.len()
                ),
            ));
        }
        self.models.check_capacity()?;
        let native = backend.create_model(data)?;
        let id = self.models.insert(ModelEntry {
            debug_name: data.debug_name.clone(),
            index_count: data.index_count(),
            native,
        })?;
        log::info!(
            "ModelHandler: Created model '{}' ({} vertices, {} indices) as {:?}",
            data.debug_name,
            data.vertices.len(),
            data.indices.len(),
            id
        );
        Ok(id)
    }

    /// The entry of a model.
    pub fn model(&self, id: ModelId) -> Result<&ModelEntry<B::Model>, RenderError> {
        self.models.get(id)
    }

    /// Number of indices of a model.
    pub fn index_count(&self, id: ModelId) -> Result<u32, RenderError> {
        self.models.get(id).map(|entry| entry.index_count)
    }

    /// Number of models created so far.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if no model was created yet.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
