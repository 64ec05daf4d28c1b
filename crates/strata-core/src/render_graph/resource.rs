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

//! Resource tokens handed out to passes and the tables that resolve them.

use crate::handle::{DepthImageId, ImageId, TextureId};
use crate::renderer::error::RenderError;
use ahash::AHashMap;

/// The class of resource a token refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// A render-target capable image.
    Image,
    /// A depth/stencil image.
    DepthImage,
    /// A read-only texture.
    Texture,
}

impl ResourceClass {
    fn name(self) -> &'static str {
        match self {
            ResourceClass::Image => "Image",
            ResourceClass::DepthImage => "DepthImage",
            ResourceClass::Texture => "Texture",
        }
    }
}

/// A read-only reference to a resource, valid for one frame's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPassResource {
    class: ResourceClass,
    index: u16,
}

impl RenderPassResource {
    /// The token that refers to nothing.
    pub const INVALID: Self = Self {
        class: ResourceClass::Image,
        index: u16::MAX,
    };

    pub(crate) const fn new(class: ResourceClass, index: u16) -> Self {
        Self { class, index }
    }

    /// Returns `false` for [`RenderPassResource::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.index != u16::MAX
    }

    /// The class of the referenced resource.
    pub const fn class(self) -> ResourceClass {
        self.class
    }

    /// The index in the graph's lookup table for that class.
    pub const fn index(self) -> u16 {
        self.index
    }
}

impl Default for RenderPassResource {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A writable reference to an image or depth image, valid for one frame's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPassMutableResource {
    class: ResourceClass,
    index: u16,
}

impl RenderPassMutableResource {
    /// The token that refers to nothing.
    pub const INVALID: Self = Self {
        class: ResourceClass::Image,
        index: u16::MAX,
    };

    pub(crate) const fn new(class: ResourceClass, index: u16) -> Self {
        Self { class, index }
    }

    /// Returns `false` for [`RenderPassMutableResource::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.index != u16::MAX
    }

    /// The class of the referenced resource.
    pub const fn class(self) -> ResourceClass {
        self.class
    }

    /// The index in the graph's lookup table for that class.
    pub const fn index(self) -> u16 {
        self.index
    }

    /// The same resource viewed as read-only.
    pub const fn as_read(self) -> RenderPassResource {
        RenderPassResource::new(self.class, self.index)
    }
}

impl Default for RenderPassMutableResource {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A concrete resource a read token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundResource {
    /// A render-target capable image.
    Image(ImageId),
    /// A depth image, sampled through its depth-read view.
    DepthImage(DepthImageId),
    /// A read-only texture.
    Texture(TextureId),
}

/// Resolves pass tokens back to resource handles.
pub trait ResourceResolver {
    /// Resolves a writable token that must refer to an image.
    fn resolve_image(&self, token: RenderPassMutableResource) -> Result<ImageId, RenderError>;

    /// Resolves a writable token that must refer to a depth image.
    fn resolve_depth_image(
        &self,
        token: RenderPassMutableResource,
    ) -> Result<DepthImageId, RenderError>;

    /// Resolves a read token of any class.
    fn resolve_read(&self, token: RenderPassResource) -> Result<BoundResource, RenderError>;
}

fn invalid_token(class: ResourceClass, index: u16) -> RenderError {
    RenderError::InvalidHandle {
        kind: class.name(),
        index,
    }
}

/// One class of lookup table: a dense list of ids plus the reverse map.
#[derive(Debug)]
struct Table<T> {
    ids: Vec<T>,
    slots: AHashMap<T, u16>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            slots: AHashMap::new(),
        }
    }
}

impl<T: Copy + Eq + std::hash::Hash> Table<T> {
    fn track(&mut self, class: ResourceClass, id: T) -> Result<u16, RenderError> {
        if let Some(&slot) = self.slots.get(&id) {
            return Ok(slot);
        }
        if self.ids.len() >= u16::MAX as usize {
            return Err(RenderError::creation_failed(
                class.name(),
                "render graph lookup table is full",
            ));
        }
        let slot = self.ids.len() as u16;
        self.ids.push(id);
        self.slots.insert(id, slot);
        Ok(slot)
    }

    fn get(&self, class: ResourceClass, index: u16) -> Result<T, RenderError> {
        self.ids
            .get(index as usize)
            .copied()
            .ok_or_else(|| invalid_token(class, index))
    }
}

/// The graph-held tables every token of a frame indexes into.
///
/// Tracking the same id twice yields the same slot, so two passes that touch
/// the same image see equal tokens.
#[derive(Debug, Default)]
pub struct ResourceLookup {
    images: Table<ImageId>,
    depth_images: Table<DepthImageId>,
    textures: Table<TextureId>,
}

impl ResourceLookup {
    pub(crate) fn track_image(&mut self, id: ImageId) -> Result<u16, RenderError> {
        self.images.track(ResourceClass::Image, id)
    }

    pub(crate) fn track_depth_image(&mut self, id: DepthImageId) -> Result<u16, RenderError> {
        self.depth_images.track(ResourceClass::DepthImage, id)
    }

    pub(crate) fn track_texture(&mut self, id: TextureId) -> Result<u16, RenderError> {
        self.textures.track(ResourceClass::Texture, id)
    }

    /// Number of distinct resources tracked, over all classes.
    pub fn len(&self) -> usize {
        self.images.ids.len() + self.depth_images.ids.len() + self.textures.ids.len()
    }

    /// Returns `true` if no resource has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceResolver for ResourceLookup {
    fn resolve_image(&self, token: RenderPassMutableResource) -> Result<ImageId, RenderError> {
        match token.class() {
            ResourceClass::Image if token.is_valid() => {
                self.images.get(ResourceClass::Image, token.index())
            }
            class => Err(invalid_token(class, token.index())),
        }
    }

    fn resolve_depth_image(
        &self,
        token: RenderPassMutableResource,
    ) -> Result<DepthImageId, RenderError> {
        match token.class() {
            ResourceClass::DepthImage if token.is_valid() => {
                self.depth_images.get(ResourceClass::DepthImage, token.index())
            }
            class => Err(invalid_token(class, token.index())),
        }
    }

    fn resolve_read(&self, token: RenderPassResource) -> Result<BoundResource, RenderError> {
        if !token.is_valid() {
            return Err(invalid_token(token.class(), token.index()));
        }
        let index = token.index();
        Ok(match token.class() {
            ResourceClass::Image => BoundResource::Image(self.images.get(token.class(), index)?),
            ResourceClass::DepthImage => {
                BoundResource::DepthImage(self.depth_images.get(token.class(), index)?)
            }
            ResourceClass::Texture => {
                BoundResource::Texture(self.textures.get(token.class(), index)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_yields_same_slot() {
        let mut lookup = ResourceLookup::default();
        let a = lookup.track_image(ImageId::new(4)).unwrap();
        let b = lookup.track_image(ImageId::new(9)).unwrap();
        let c = lookup.track_image(ImageId::new(4)).unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn resolve_checks_class() {
        let mut lookup = ResourceLookup::default();
        let slot = lookup.track_depth_image(DepthImageId::new(0)).unwrap();
        let token = RenderPassMutableResource::new(ResourceClass::DepthImage, slot);

        assert_eq!(lookup.resolve_depth_image(token).unwrap(), DepthImageId::new(0));
        assert!(matches!(
            lookup.resolve_image(token),
            Err(RenderError::InvalidHandle {
                kind: "DepthImage",
                ..
            })
        ));
    }

    #[test]
    fn invalid_tokens_do_not_resolve() {
        let lookup = ResourceLookup::default();
        assert!(lookup
            .resolve_image(RenderPassMutableResource::INVALID)
            .is_err());
        assert!(lookup.resolve_read(RenderPassResource::INVALID).is_err());
    }

    #[test]
    fn read_view_of_a_write_token_resolves_to_the_same_resource() {
        let mut lookup = ResourceLookup::default();
        let slot = lookup.track_image(ImageId::new(2)).unwrap();
        let token = RenderPassMutableResource::new(ResourceClass::Image, slot);
        assert_eq!(
            lookup.resolve_read(token.as_read()).unwrap(),
            BoundResource::Image(ImageId::new(2))
        );
    }
}
