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

//! The builder passes declare their resource usage through.

use super::resource::{
    RenderPassMutableResource, RenderPassResource, ResourceClass, ResourceLookup,
};
use crate::handle::{DepthImageId, ImageId, TextureId};
use crate::renderer::error::RenderError;

/// The shader stages that read a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderStage {
    bits: u8,
}

impl ShaderStage {
    /// No stage.
    pub const NONE: Self = Self { bits: 0 };
    /// The vertex stage.
    pub const VERTEX: Self = Self { bits: 1 << 0 };
    /// The pixel stage.
    pub const PIXEL: Self = Self { bits: 1 << 1 };
    /// The compute stage.
    pub const COMPUTE: Self = Self { bits: 1 << 2 };

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Combines two sets of stages.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every stage of `other` is in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Checks if no stage is set.
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ShaderStage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ShaderStage {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// How a pass writes a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// As a color or depth target of the rasterizer.
    RenderTarget,
    /// Through unordered (storage) access from shaders.
    UnorderedAccess,
}

/// What a pass expects a written resource to contain when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// The previous contents are preserved.
    Load,
    /// The previous contents may be discarded.
    Discard,
    /// The resource is cleared to its clear value before the pass runs.
    Clear,
}

/// A read declared by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRead {
    /// The token handed back to the pass.
    pub resource: RenderPassResource,
    /// The stages that read it.
    pub stages: ShaderStage,
}

/// A write declared by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceWrite {
    /// The token handed back to the pass.
    pub resource: RenderPassMutableResource,
    /// How it is written.
    pub write_mode: WriteMode,
    /// What it must contain when the pass starts.
    pub load_mode: LoadMode,
}

/// Everything a pass declared during setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResourceUsage {
    /// Declared reads, in call order.
    pub reads: Vec<ResourceRead>,
    /// Declared writes, in call order.
    pub writes: Vec<ResourceWrite>,
}

/// Existence checks for the resources a pass names.
pub trait ResourceCatalog {
    /// Returns `true` if a resource of `class` with handle index `index` exists.
    fn contains(&self, class: ResourceClass, index: u16) -> bool;
}

/// A resource handle a pass can declare a read of.
pub trait PassReadable: Copy + std::fmt::Debug {
    /// The class of resource the handle refers to.
    const CLASS: ResourceClass;

    /// The raw handle index.
    fn raw_index(self) -> u16;

    /// Whether the handle is the invalid sentinel.
    fn is_valid_handle(self) -> bool;

    #[doc(hidden)]
    fn track(self, lookup: &mut ResourceLookup) -> Result<u16, RenderError>;
}

/// A resource handle a pass can declare a write of.
pub trait PassWritable: PassReadable {}

impl PassReadable for ImageId {
    const CLASS: ResourceClass = ResourceClass::Image;

    fn raw_index(self) -> u16 {
        self.index()
    }

    fn is_valid_handle(self) -> bool {
        self.is_valid()
    }

    fn track(self, lookup: &mut ResourceLookup) -> Result<u16, RenderError> {
        lookup.track_image(self)
    }
}

impl PassReadable for DepthImageId {
    const CLASS: ResourceClass = ResourceClass::DepthImage;

    fn raw_index(self) -> u16 {
        self.index()
    }

    fn is_valid_handle(self) -> bool {
        self.is_valid()
    }

    fn track(self, lookup: &mut ResourceLookup) -> Result<u16, RenderError> {
        lookup.track_depth_image(self)
    }
}

impl PassReadable for TextureId {
    const CLASS: ResourceClass = ResourceClass::Texture;

    fn raw_index(self) -> u16 {
        self.index()
    }

    fn is_valid_handle(self) -> bool {
        self.is_valid()
    }

    fn track(self, lookup: &mut ResourceLookup) -> Result<u16, RenderError> {
        lookup.track_texture(self)
    }
}

impl PassWritable for ImageId {}
impl PassWritable for DepthImageId {}

/// Handed to a pass's setup callback to declare what it reads and writes.
///
/// Declaring an invalid or unknown handle returns an invalid token and records
/// an error; the error fails the pass's setup once the callback returns.
pub struct RenderPassBuilder<'a> {
    pass_name: &'a str,
    lookup: &'a mut ResourceLookup,
    catalog: &'a dyn ResourceCatalog,
    usage: PassResourceUsage,
    errors: Vec<RenderError>,
}

impl<'a> RenderPassBuilder<'a> {
    pub(crate) fn new(
        pass_name: &'a str,
        lookup: &'a mut ResourceLookup,
        catalog: &'a dyn ResourceCatalog,
    ) -> Self {
        Self {
            pass_name,
            lookup,
            catalog,
            usage: PassResourceUsage::default(),
            errors: Vec::new(),
        }
    }

    /// The name of the pass being set up.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    fn slot_of<R: PassReadable>(&mut self, resource: R) -> Option<u16> {
        if !resource.is_valid_handle() || !self.catalog.contains(R::CLASS, resource.raw_index()) {
            log::warn!(
                "RenderPassBuilder: Pass '{}' declared unknown resource {:?}",
                self.pass_name,
                resource
            );
            self.errors.push(RenderError::InvalidHandle {
                kind: match R::CLASS {
                    ResourceClass::Image => "Image",
                    ResourceClass::DepthImage => "DepthImage",
                    ResourceClass::Texture => "Texture",
                },
                index: resource.raw_index(),
            });
            return None;
        }
        match resource.track(self.lookup) {
            Ok(slot) => Some(slot),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    /// Declares that the pass reads `resource` from `stages`.
    pub fn read<R: PassReadable>(&mut self, resource: R, stages: ShaderStage) -> RenderPassResource {
        let Some(slot) = self.slot_of(resource) else {
            return RenderPassResource::INVALID;
        };
        let token = RenderPassResource::new(R::CLASS, slot);
        self.usage.reads.push(ResourceRead {
            resource: token,
            stages,
        });
        token
    }

    /// Declares that the pass writes `resource`.
    pub fn write<R: PassWritable>(
        &mut self,
        resource: R,
        write_mode: WriteMode,
        load_mode: LoadMode,
    ) -> RenderPassMutableResource {
        let Some(slot) = self.slot_of(resource) else {
            return RenderPassMutableResource::INVALID;
        };
        let token = RenderPassMutableResource::new(R::CLASS, slot);
        self.usage.writes.push(ResourceWrite {
            resource: token,
            write_mode,
            load_mode,
        });
        token
    }

    /// Consumes the builder, returning the declared usage or the first error.
    pub(crate) fn finish(self) -> Result<PassResourceUsage, RenderError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.usage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_graph::resource::ResourceResolver;

    struct Everything;

    impl ResourceCatalog for Everything {
        fn contains(&self, _class: ResourceClass, _index: u16) -> bool {
            true
        }
    }

    #[test]
    fn stages_combine() {
        let stages = ShaderStage::VERTEX | ShaderStage::PIXEL;
        assert!(stages.contains(ShaderStage::PIXEL));
        assert!(!stages.contains(ShaderStage::COMPUTE));
        assert!(ShaderStage::NONE.is_empty());
    }

    #[test]
    fn declared_usage_is_recorded_in_order() {
        let mut lookup = ResourceLookup::default();
        let mut builder = RenderPassBuilder::new("Main", &mut lookup, &Everything);
        let depth = builder.read(DepthImageId::new(0), ShaderStage::PIXEL);
        let color = builder.write(ImageId::new(0), WriteMode::RenderTarget, LoadMode::Clear);
        let usage = builder.finish().unwrap();

        assert_eq!(usage.reads.len(), 1);
        assert_eq!(usage.reads[0].resource, depth);
        assert_eq!(usage.writes[0].resource, color);
        assert_eq!(usage.writes[0].load_mode, LoadMode::Clear);
        assert_eq!(lookup.resolve_image(color).unwrap(), ImageId::new(0));
    }

    #[test]
    fn invalid_handle_fails_the_setup() {
        let mut lookup = ResourceLookup::default();
        let mut builder = RenderPassBuilder::new("Broken", &mut lookup, &Everything);
        let token = builder.write(
            ImageId::INVALID,
            WriteMode::RenderTarget,
            LoadMode::Load,
        );
        assert!(!token.is_valid());
        assert!(matches!(
            builder.finish(),
            Err(RenderError::InvalidHandle { kind: "Image", .. })
        ));
    }
}
