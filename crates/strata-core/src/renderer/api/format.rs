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

//! Abstract pixel formats for images and depth images.

use serde::{Deserialize, Serialize};

/// The pixel format of a color image or texture.
///
/// `Unknown` exists so that a zeroed descriptor is detectably invalid; it is
/// rejected by every creation call.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Unknown,
    // 128 bits per pixel
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    // 64 bits per pixel
    R16G16B16A16Float,
    R16G16B16A16Unorm,
    R16G16B16A16Uint,
    R16G16B16A16Snorm,
    R16G16B16A16Sint,
    R32G32Float,
    R32G32Uint,
    R32G32Sint,
    // 32 bits per pixel
    R10G10B10A2Unorm,
    R10G10B10A2Uint,
    R11G11B10Float,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    R8G8B8A8Uint,
    R8G8B8A8Snorm,
    R8G8B8A8Sint,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    R16G16Float,
    R16G16Unorm,
    R16G16Uint,
    R16G16Snorm,
    R16G16Sint,
    R32Float,
    R32Uint,
    R32Sint,
    // 16 bits per pixel
    R8G8Unorm,
    R8G8Uint,
    R8G8Snorm,
    R8G8Sint,
    R16Float,
    R16Unorm,
    R16Uint,
    R16Snorm,
    R16Sint,
    // 8 bits per pixel
    R8Unorm,
    R8Uint,
    R8Snorm,
    R8Sint,
}

impl ImageFormat {
    /// Size of one pixel in bytes, or `None` for [`ImageFormat::Unknown`].
    pub fn bytes_per_pixel(self) -> Option<u32> {
        use ImageFormat::*;
        let size = match self {
            Unknown => return None,
            R32G32B32A32Float | R32G32B32A32Uint | R32G32B32A32Sint => 16,
            R16G16B16A16Float | R16G16B16A16Unorm | R16G16B16A16Uint | R16G16B16A16Snorm
            | R16G16B16A16Sint | R32G32Float | R32G32Uint | R32G32Sint => 8,
            R10G10B10A2Unorm | R10G10B10A2Uint | R11G11B10Float | R8G8B8A8Unorm
            | R8G8B8A8UnormSrgb | R8G8B8A8Uint | R8G8B8A8Snorm | R8G8B8A8Sint | B8G8R8A8Unorm
            | B8G8R8A8UnormSrgb | R16G16Float | R16G16Unorm | R16G16Uint | R16G16Snorm
            | R16G16Sint | R32Float | R32Uint | R32Sint => 4,
            R8G8Unorm | R8G8Uint | R8G8Snorm | R8G8Sint | R16Float | R16Unorm | R16Uint
            | R16Snorm | R16Sint => 2,
            R8Unorm | R8Uint | R8Snorm | R8Sint => 1,
        };
        Some(size)
    }
}

/// The format of a depth image.
///
/// Every depth family (32-bit with stencil, 32-bit, 24-bit with stencil,
/// 16-bit) has a typeless storage member, a depth-stencil-view member and
/// shader-read members. Any member of a family may be used to create a depth
/// image; [`DepthImageFormat::split`] yields the three formats the backend
/// actually needs.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthImageFormat {
    #[default]
    Unknown,

    // 32-bit Z with stencil
    R32G8X24Typeless,
    D32FloatS8X24Uint,
    R32FloatX8X24Typeless,
    X32TypelessG8X24Uint,

    // 32-bit Z without stencil
    R32Typeless,
    D32Float,
    R32Float,

    // 24-bit Z with stencil
    R24G8Typeless,
    D24UnormS8Uint,
    R24UnormX8Typeless,
    X24TypelessG8Uint,

    // 16-bit Z without stencil
    R16Typeless,
    D16Unorm,
    R16Unorm,
}

/// The storage/view/read formats derived from a [`DepthImageFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthFormatSet {
    /// Typeless storage format of the resource.
    pub base: DepthImageFormat,
    /// Typed format used by the depth-stencil view.
    pub view: DepthImageFormat,
    /// Typed format used when sampling depth from a shader.
    pub read: DepthImageFormat,
    /// Typed format used when sampling stencil, for families that have one.
    pub stencil_read: Option<DepthImageFormat>,
}

impl DepthImageFormat {
    /// Splits the format into the members of its family.
    ///
    /// Returns `None` for [`DepthImageFormat::Unknown`].
    pub fn split(self) -> Option<DepthFormatSet> {
        use DepthImageFormat::*;
        let set = match self {
            Unknown => return None,
            R32G8X24Typeless | D32FloatS8X24Uint | R32FloatX8X24Typeless
            | X32TypelessG8X24Uint => DepthFormatSet {
                base: R32G8X24Typeless,
                view: D32FloatS8X24Uint,
                read: R32FloatX8X24Typeless,
                stencil_read: Some(X32TypelessG8X24Uint),
            },
            R32Typeless | D32Float | R32Float => DepthFormatSet {
                base: R32Typeless,
                view: D32Float,
                read: R32Float,
                stencil_read: None,
            },
            R24G8Typeless | D24UnormS8Uint | R24UnormX8Typeless | X24TypelessG8Uint => {
                DepthFormatSet {
                    base: R24G8Typeless,
                    view: D24UnormS8Uint,
                    read: R24UnormX8Typeless,
                    stencil_read: Some(X24TypelessG8Uint),
                }
            }
            R16Typeless | D16Unorm | R16Unorm => DepthFormatSet {
                base: R16Typeless,
                view: D16Unorm,
                read: R16Unorm,
                stencil_read: None,
            },
        };
        Some(set)
    }

    /// Returns `true` if the family carries a stencil component.
    pub fn has_stencil(self) -> bool {
        self.split()
            .is_some_and(|set| set.stencil_read.is_some())
    }
}

/// The number of samples per pixel of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleCount {
    /// One sample (no multisampling).
    #[default]
    X1,
    /// Two samples.
    X2,
    /// Four samples.
    X4,
    /// Eight samples.
    X8,
}

impl SampleCount {
    /// The sample count as an integer.
    pub fn count(self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_member_of_a_family_splits_the_same_way() {
        let family = [
            DepthImageFormat::R24G8Typeless,
            DepthImageFormat::D24UnormS8Uint,
            DepthImageFormat::R24UnormX8Typeless,
            DepthImageFormat::X24TypelessG8Uint,
        ];
        let expected = DepthImageFormat::D24UnormS8Uint.split().unwrap();
        for format in family {
            assert_eq!(format.split().unwrap(), expected);
        }
        assert_eq!(expected.base, DepthImageFormat::R24G8Typeless);
        assert_eq!(expected.view, DepthImageFormat::D24UnormS8Uint);
        assert_eq!(expected.read, DepthImageFormat::R24UnormX8Typeless);
    }

    #[test]
    fn stencil_detection() {
        assert!(DepthImageFormat::D32FloatS8X24Uint.has_stencil());
        assert!(!DepthImageFormat::R32Float.has_stencil());
        assert!(!DepthImageFormat::D16Unorm.has_stencil());
        assert!(!DepthImageFormat::Unknown.has_stencil());
    }

    #[test]
    fn unknown_formats_have_no_layout() {
        assert!(DepthImageFormat::Unknown.split().is_none());
        assert!(ImageFormat::Unknown.bytes_per_pixel().is_none());
        assert_eq!(ImageFormat::R16G16B16A16Float.bytes_per_pixel(), Some(8));
    }
}
