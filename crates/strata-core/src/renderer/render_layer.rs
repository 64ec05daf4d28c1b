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

//! Per-frame collections of model instances.

use crate::handle::ModelId;
use ahash::AHashMap;
use bytemuck::{Pod, Zeroable};

/// Per-instance shader data, laid out for a 256-byte constant buffer slot.
#[repr(C, align(256))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Multiplied with the surface color.
    pub color_multiplier: [f32; 4],
    /// Object-to-world transform, column-major.
    pub model_matrix: [[f32; 4]; 4],
    _padding: [[f32; 4]; 11],
}

impl InstanceData {
    /// The identity transform.
    pub const IDENTITY: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];

    /// Instance data with the given tint and transform.
    pub fn new(color_multiplier: [f32; 4], model_matrix: [[f32; 4]; 4]) -> Self {
        Self {
            color_multiplier,
            model_matrix,
            _padding: [[0.0; 4]; 11],
        }
    }

    /// An untinted instance translated by `offset`.
    pub fn at(offset: [f32; 3]) -> Self {
        let mut model_matrix = Self::IDENTITY;
        model_matrix[3] = [offset[0], offset[1], offset[2], 1.0];
        Self::new([1.0; 4], model_matrix)
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self::new([1.0; 4], Self::IDENTITY)
    }
}

/// The instances of every model registered for the current frame.
///
/// Models are kept in first-registration order so passes draw them
/// deterministically.
#[derive(Debug, Default, Clone)]
pub struct RenderLayer {
    entries: Vec<(ModelId, Vec<InstanceData>)>,
    slots: AHashMap<ModelId, usize>,
}

impl RenderLayer {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one instance of `model`. Repeated calls accumulate instances.
    pub fn register_model(&mut self, model: ModelId, instance: InstanceData) {
        match self.slots.get(&model) {
            Some(&slot) => self.entries[slot].1.push(instance),
            None => {
                self.slots.insert(model, self.entries.len());
                self.entries.push((model, vec![instance]));
            }
        }
    }

    /// Removes every model and instance.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    /// Iterates over models and their instances.
    pub fn models(&self) -> impl Iterator<Item = (ModelId, &[InstanceData])> {
        self.entries
            .iter()
            .map(|(model, instances)| (*model, instances.as_slice()))
    }

    /// The instances of one model, empty if it was not registered.
    pub fn instances(&self, model: ModelId) -> &[InstanceData] {
        match self.slots.get(&model) {
            Some(&slot) => &self.entries[slot].1,
            None => &[],
        }
    }

    /// Number of distinct models.
    pub fn model_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of instances over all models.
    pub fn instance_count(&self) -> usize {
        self.entries.iter().map(|(_, instances)| instances.len()).sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn instance_data_fills_a_constant_buffer_slot() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 256);
        assert_eq!(std::mem::align_of::<InstanceData>(), 256);
    }

    #[test]
    fn translation_is_in_the_last_column() {
        let instance = InstanceData::at([1.0, 2.0, 3.0]);
        assert_relative_eq!(instance.model_matrix[3][0], 1.0);
        assert_relative_eq!(instance.model_matrix[3][2], 3.0);
        assert_relative_eq!(instance.model_matrix[0][0], 1.0);
    }

    #[test]
    fn models_keep_first_registration_order() {
        let mut layer = RenderLayer::new();
        layer.register_model(ModelId::new(5), InstanceData::default());
        layer.register_model(ModelId::new(1), InstanceData::default());
        layer.register_model(ModelId::new(5), InstanceData::default());

        let order: Vec<_> = layer.models().map(|(model, _)| model).collect();
        assert_eq!(order, vec![ModelId::new(5), ModelId::new(1)]);
        assert_eq!(layer.instances(ModelId::new(5)).len(), 2);
        assert!(layer.instances(ModelId::new(9)).is_empty());
    }
}
