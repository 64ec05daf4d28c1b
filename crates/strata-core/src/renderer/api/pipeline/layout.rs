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

//! The binding layout derived from a pipeline description.
//!
//! This is the backend-neutral equivalent of a root signature: one constant
//! buffer parameter per enabled slot, one descriptor table for bound
//! textures, static samplers, and the set of stages denied root access.

use super::enums::ShaderVisibility;
use super::state::{ConstantBufferState, InputLayout, SamplerState};

/// Returns the length of the leading run of enabled slots.
///
/// The first disabled slot ends the scan; anything after it is ignored.
pub fn enabled_prefix<T>(slots: &[T], enabled: impl Fn(&T) -> bool) -> usize {
    slots.iter().take_while(|slot| enabled(slot)).count()
}

/// A constant buffer bound directly in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootParameter {
    /// The shader register (`b0`, `b1`, ...) the buffer is bound to.
    pub register: u32,
    /// The stages that can read it.
    pub visibility: ShaderVisibility,
}

/// A table of shader-readable textures bound together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorTable {
    /// Number of textures (`t0..tN`).
    pub count: u32,
    /// The stages that can read them.
    pub visibility: ShaderVisibility,
}

/// Which shader stages reference at least one layout parameter.
///
/// A stage that references nothing can be denied root access, which lets the
/// backend skip binding work for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StageAccess {
    /// The vertex stage uses a parameter.
    pub vertex: bool,
    /// The hull stage uses a parameter.
    pub hull: bool,
    /// The domain stage uses a parameter.
    pub domain: bool,
    /// The geometry stage uses a parameter.
    pub geometry: bool,
    /// The pixel stage uses a parameter.
    pub pixel: bool,
}

impl StageAccess {
    /// Every stage has access.
    pub const ALL: Self = Self {
        vertex: true,
        hull: true,
        domain: true,
        geometry: true,
        pixel: true,
    };

    /// Scans parameter visibilities; any `All` grants access to every stage.
    pub fn from_visibilities(visibilities: impl IntoIterator<Item = ShaderVisibility>) -> Self {
        let mut access = Self::default();
        for visibility in visibilities {
            match visibility {
                ShaderVisibility::All => return Self::ALL,
                ShaderVisibility::Vertex => access.vertex = true,
                ShaderVisibility::Hull => access.hull = true,
                ShaderVisibility::Domain => access.domain = true,
                ShaderVisibility::Geometry => access.geometry = true,
                ShaderVisibility::Pixel => access.pixel = true,
            }
        }
        access
    }

    /// The stages denied access, in pipeline order.
    pub fn denied(&self) -> Vec<ShaderVisibility> {
        [
            (self.vertex, ShaderVisibility::Vertex),
            (self.hull, ShaderVisibility::Hull),
            (self.domain, ShaderVisibility::Domain),
            (self.geometry, ShaderVisibility::Geometry),
            (self.pixel, ShaderVisibility::Pixel),
        ]
        .into_iter()
        .filter(|(used, _)| !used)
        .map(|(_, stage)| stage)
        .collect()
    }
}

/// The complete binding layout of a pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RootLayout {
    /// Constant buffer parameters, register `i` at index `i`.
    pub constant_buffers: Vec<RootParameter>,
    /// The bound texture table, if any texture is bound.
    pub texture_table: Option<DescriptorTable>,
    /// Static samplers, register `i` at index `i`.
    pub samplers: Vec<SamplerState>,
    /// Stages that reference at least one parameter.
    pub stage_access: StageAccess,
}

impl RootLayout {
    /// Builds the layout from the slots of a pipeline description.
    ///
    /// `texture_count` is the number of leading bound textures. Bound textures
    /// are always visible to the pixel stage only.
    pub fn build(
        constant_buffers: &[ConstantBufferState],
        texture_count: usize,
        samplers: &[SamplerState],
    ) -> Self {
        let cb_count = enabled_prefix(constant_buffers, |cb| cb.enabled);
        let constant_buffers: Vec<RootParameter> = constant_buffers[..cb_count]
            .iter()
            .enumerate()
            .map(|(register, cb)| RootParameter {
                register: register as u32,
                visibility: cb.shader_visibility,
            })
            .collect();

        let texture_table = (texture_count > 0).then_some(DescriptorTable {
            count: texture_count as u32,
            visibility: ShaderVisibility::Pixel,
        });

        let sampler_count = enabled_prefix(samplers, |s| s.enabled);
        let samplers = samplers[..sampler_count].to_vec();

        let stage_access = StageAccess::from_visibilities(
            constant_buffers
                .iter()
                .map(|p| p.visibility)
                .chain(texture_table.iter().map(|t| t.visibility)),
        );

        Self {
            constant_buffers,
            texture_table,
            samplers,
            stage_access,
        }
    }
}

/// Collects the leading run of enabled vertex attributes.
pub fn build_input_layout(slots: &[InputLayout]) -> Vec<InputLayout> {
    slots[..enabled_prefix(slots, |slot| slot.enabled)].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cb(visibility: ShaderVisibility) -> ConstantBufferState {
        ConstantBufferState {
            enabled: true,
            shader_visibility: visibility,
        }
    }

    #[test]
    fn first_disabled_slot_ends_the_scan() {
        let slots = [
            cb(ShaderVisibility::Vertex),
            ConstantBufferState::default(),
            cb(ShaderVisibility::Pixel),
        ];
        let layout = RootLayout::build(&slots, 0, &[]);
        assert_eq!(layout.constant_buffers.len(), 1);
        assert_eq!(layout.constant_buffers[0].register, 0);
    }

    #[test]
    fn unreferenced_stages_are_denied() {
        let layout = RootLayout::build(&[cb(ShaderVisibility::Vertex)], 0, &[]);
        assert_eq!(
            layout.stage_access.denied(),
            vec![
                ShaderVisibility::Hull,
                ShaderVisibility::Domain,
                ShaderVisibility::Geometry,
                ShaderVisibility::Pixel,
            ]
        );
    }

    #[test]
    fn textures_grant_pixel_access() {
        let layout = RootLayout::build(&[cb(ShaderVisibility::Vertex)], 2, &[]);
        assert!(layout.stage_access.pixel);
        assert_eq!(layout.texture_table.unwrap().count, 2);
    }

    #[test]
    fn visibility_all_grants_every_stage() {
        let layout = RootLayout::build(
            &[cb(ShaderVisibility::Pixel), cb(ShaderVisibility::All)],
            0,
            &[],
        );
        assert_eq!(layout.stage_access, StageAccess::ALL);
        assert!(layout.stage_access.denied().is_empty());
    }

    #[test]
    fn empty_layout_denies_everything() {
        let layout = RootLayout::build(&[], 0, &[]);
        assert_eq!(layout.stage_access.denied().len(), 5);
    }

    #[test]
    fn input_layout_stops_at_first_gap() {
        let slots = [
            InputLayout::per_vertex("POSITION", super::super::InputFormat::R32G32B32Float, 0),
            InputLayout::default(),
            InputLayout::per_vertex("TEXCOORD", super::super::InputFormat::R32G32Float, 24),
        ];
        assert_eq!(build_input_layout(&slots).len(), 1);
    }
}
