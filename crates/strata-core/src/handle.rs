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

//! Strongly-typed resource handles and the dense registries that issue them.
//!
//! A [`Handle`] is a thin `u16` index tagged with a zero-sized resource kind,
//! so an `ImageId` can never be passed where a `DepthImageId` is expected.
//! Handles are issued by a [`Registry`] in strictly increasing order and are
//! never recycled: the registry has no removal operation.

use crate::renderer::error::RenderError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker trait for the zero-sized types that tag a [`Handle`].
pub trait HandleKind: 'static {
    /// A human-readable name used in diagnostics and errors.
    const NAME: &'static str;
}

/// An opaque, typed index into a [`Registry`].
pub struct Handle<K: HandleKind> {
    index: u16,
    _kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind> Handle<K> {
    /// The reserved sentinel value denoting "no resource".
    pub const INVALID: Self = Self::new(u16::MAX);

    /// Wraps a raw index. Mostly useful for tests and backends.
    pub const fn new(index: u16) -> Self {
        Self {
            index,
            _kind: PhantomData,
        }
    }

    /// Returns the sentinel handle.
    pub const fn invalid() -> Self {
        Self::INVALID
    }

    /// Returns `true` unless this is the sentinel handle.
    pub const fn is_valid(self) -> bool {
        self.index != u16::MAX
    }

    /// The raw index of the handle.
    pub const fn index(self) -> u16 {
        self.index
    }

    /// The largest number of live handles of a kind.
    pub const fn max_count() -> usize {
        u16::MAX as usize
    }
}

// Manual impls: derives would put bounds on `K`.
impl<K: HandleKind> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: HandleKind> Copy for Handle<K> {}

impl<K: HandleKind> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<K: HandleKind> Eq for Handle<K> {}

impl<K: HandleKind> PartialOrd for Handle<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: HandleKind> Ord for Handle<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<K: HandleKind> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<K: HandleKind> Default for Handle<K> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<K: HandleKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}({})", K::NAME, self.index)
        } else {
            write!(f, "{}(Invalid)", K::NAME)
        }
    }
}

macro_rules! handle_kinds {
    ($($(#[$meta:meta])* $kind:ident => $alias:ident;)*) => {
        $(
            #[doc = concat!("Resource kind tag for [`", stringify!($alias), "`].")]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $kind {}

            impl HandleKind for $kind {
                const NAME: &'static str = stringify!($alias);
            }

            $(#[$meta])*
            pub type $alias = Handle<$kind>;
        )*
    };
}

handle_kinds! {
    /// A render-target capable image (RTV + SRV + UAV).
    ImageKind => ImageId;
    /// A depth/stencil image (DSV + depth SRV + optional stencil SRV).
    DepthImageKind => DepthImageId;
    /// A read-only texture loaded from a file or uploaded from memory.
    TextureKind => TextureId;
    /// A cached graphics pipeline.
    GraphicsPipelineKind => GraphicsPipelineId;
    /// A cached compute pipeline.
    ComputePipelineKind => ComputePipelineId;
    /// A model with vertex and index buffers.
    ModelKind => ModelId;
    /// A vertex shader module.
    VertexShaderKind => VertexShaderId;
    /// A pixel (fragment) shader module.
    PixelShaderKind => PixelShaderId;
    /// A compute shader module.
    ComputeShaderKind => ComputeShaderId;
    /// A material.
    MaterialKind => MaterialId;
    /// A per-frame constant buffer.
    ConstantBufferKind => ConstantBufferId;
}

/// A dense, append-only store of resource state indexed by [`Handle`].
#[derive(Debug)]
pub struct Registry<K: HandleKind, T> {
    entries: Vec<T>,
    limit: usize,
    _kind: PhantomData<fn() -> K>,
}

impl<K: HandleKind, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HandleKind, T> Registry<K, T> {
    /// Creates an empty registry spanning the whole handle space.
    pub fn new() -> Self {
        Self::with_capacity_limit(Handle::<K>::max_count())
    }

    /// Creates an empty registry that refuses to grow past `limit` entries.
    ///
    /// The limit is clamped to the representable handle range.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.min(Handle::<K>::max_count()),
            _kind: PhantomData,
        }
    }

    /// Stores `value` under the next dense index.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ResourceCreationFailed`] when the handle space is
    /// exhausted.
    pub fn insert(&mut self, value: T) -> Result<Handle<K>, RenderError> {
        self.check_capacity()?;
        let next = self.entries.len();
        self.entries.push(value);
        Ok(Handle::new(next as u16))
    }

    /// Fails with [`RenderError::ResourceCreationFailed`] if one more entry
    /// would not fit.
    ///
    /// Callers that allocate native objects check this first, so no object is
    /// created that could not be registered.
    pub fn check_capacity(&self) -> Result<(), RenderError> {
        if self.entries.len() >= self.limit {
            return Err(RenderError::creation_failed(
                K::NAME,
                format!("handle space exhausted ({} entries)", self.limit),
            ));
        }
        Ok(())
    }

    /// Returns the state stored for `handle`.
    pub fn get(&self, handle: Handle<K>) -> Result<&T, RenderError> {
        debug_assert!(
            handle.is_valid(),
            "{} used an invalid handle",
            K::NAME
        );
        self.entries
            .get(handle.index() as usize)
            .ok_or(RenderError::InvalidHandle {
                kind: K::NAME,
                index: handle.index(),
            })
    }

    /// Returns the state stored for `handle`, mutably.
    pub fn get_mut(&mut self, handle: Handle<K>) -> Result<&mut T, RenderError> {
        debug_assert!(
            handle.is_valid(),
            "{} used an invalid handle",
            K::NAME
        );
        self.entries
            .get_mut(handle.index() as usize)
            .ok_or(RenderError::InvalidHandle {
                kind: K::NAME,
                index: handle.index(),
            })
    }

    /// Returns `true` if `handle` refers to a stored entry.
    pub fn contains(&self, handle: Handle<K>) -> bool {
        (handle.index() as usize) < self.entries.len()
    }

    /// The number of entries ever inserted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was inserted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(handle, state)` pairs in issue order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<K>, &T)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, value)| (Handle::new(index as u16), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_dense_and_monotonic() {
        let mut registry: Registry<ImageKind, &str> = Registry::new();
        let ids: Vec<ImageId> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|v| registry.insert(v).unwrap())
            .collect();

        for (expected, id) in ids.iter().enumerate() {
            assert_eq!(id.index() as usize, expected);
        }
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn insert_fails_when_handle_space_is_exhausted() {
        let mut registry: Registry<ModelKind, u32> = Registry::with_capacity_limit(2);
        registry.insert(1).unwrap();
        registry.insert(2).unwrap();

        let err = registry.insert(3).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceCreationFailed { kind: "ModelId", .. }
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn out_of_range_lookup_is_an_error() {
        let registry: Registry<TextureKind, u32> = Registry::new();
        let err = registry.get(TextureId::new(3)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidHandle {
                kind: "TextureId",
                index: 3
            }
        ));
    }

    #[test]
    fn invalid_handle_is_distinct_and_debug_printed() {
        let id = DepthImageId::invalid();
        assert!(!id.is_valid());
        assert_eq!(id, DepthImageId::default());
        assert_eq!(format!("{id:?}"), "DepthImageId(Invalid)");
        assert_eq!(format!("{:?}", DepthImageId::new(2)), "DepthImageId(2)");
    }
}
