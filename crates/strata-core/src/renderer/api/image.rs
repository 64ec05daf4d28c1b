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

//! Descriptors for images, depth images and textures.

use super::format::{DepthImageFormat, ImageFormat, SampleCount};
use crate::renderer::error::RenderError;
use std::borrow::Cow;

/// How the `dimensions` of an image descriptor are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ImageDimensionType {
    /// `dimensions` are in pixels.
    #[default]
    Absolute,
    /// `dimensions` are a scale of the window size (`(1.0, 1.0)` is full size).
    ScaleOfWindow,
}

/// Describes a render-target capable image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDesc {
    /// Name shown in debuggers and logs.
    pub debug_name: Cow<'static, str>,
    /// Width and height, interpreted according to `dimension_type`.
    pub dimensions: (f32, f32),
    /// How `dimensions` are interpreted.
    pub dimension_type: ImageDimensionType,
    /// Pixel format. Must not be [`ImageFormat::Unknown`].
    pub format: ImageFormat,
    /// Samples per pixel.
    pub sample_count: SampleCount,
    /// RGBA value the image is cleared to.
    pub clear_color: [f32; 4],
}

impl Default for ImageDesc {
    fn default() -> Self {
        Self {
            debug_name: Cow::Borrowed("Image"),
            dimensions: (0.0, 0.0),
            dimension_type: ImageDimensionType::Absolute,
            format: ImageFormat::Unknown,
            sample_count: SampleCount::X1,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Describes a depth/stencil image.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImageDesc {
    /// Name shown in debuggers and logs.
    pub debug_name: Cow<'static, str>,
    /// Width and height, interpreted according to `dimension_type`.
    pub dimensions: (f32, f32),
    /// How `dimensions` are interpreted.
    pub dimension_type: ImageDimensionType,
    /// Depth format. Must not be [`DepthImageFormat::Unknown`].
    pub format: DepthImageFormat,
    /// Samples per pixel.
    pub sample_count: SampleCount,
    /// Depth value the image is cleared to.
    pub depth_clear_value: f32,
    /// Stencil value the image is cleared to.
    pub stencil_clear_value: u8,
}

impl Default for DepthImageDesc {
    fn default() -> Self {
        Self {
            debug_name: Cow::Borrowed("DepthImage"),
            dimensions: (0.0, 0.0),
            dimension_type: ImageDimensionType::Absolute,
            format: DepthImageFormat::Unknown,
            sample_count: SampleCount::X1,
            depth_clear_value: 1.0,
            stencil_clear_value: 0,
        }
    }
}

fn resolve_extent(
    kind: &'static str,
    name: &str,
    dimensions: (f32, f32),
    dimension_type: ImageDimensionType,
    window: (u32, u32),
) -> Result<(u32, u32), RenderError> {
    let (w, h) = match dimension_type {
        ImageDimensionType::Absolute => dimensions,
        ImageDimensionType::ScaleOfWindow => (
            dimensions.0 * window.0 as f32,
            dimensions.1 * window.1 as f32,
        ),
    };
    let (w, h) = (w.round(), h.round());
    if !(w >= 1.0 && h >= 1.0) {
        return Err(RenderError::creation_failed(
            kind,
            format!("'{name}' has invalid dimensions {w}x{h}, both must be > 0"),
        ));
    }
    Ok((w as u32, h as u32))
}

impl ImageDesc {
    /// Validates the descriptor and returns its extent in pixels.
    ///
    /// # Errors
    ///
    /// [`RenderError::ResourceCreationFailed`] if a dimension is zero or the
    /// format is unknown.
    pub fn resolve_extent(&self, window: (u32, u32)) -> Result<(u32, u32), RenderError> {
        if self.format == ImageFormat::Unknown {
            return Err(RenderError::creation_failed(
                "Image",
                format!("'{}' has an UNKNOWN format", self.debug_name),
            ));
        }
        resolve_extent(
            "Image",
            &self.debug_name,
            self.dimensions,
            self.dimension_type,
            window,
        )
    }
}

impl DepthImageDesc {
    /// Validates the descriptor and returns its extent in pixels.
    ///
    /// # Errors
    ///
    /// [`RenderError::ResourceCreationFailed`] if a dimension is zero or the
    /// format is unknown.
    pub fn resolve_extent(&self, window: (u32, u32)) -> Result<(u32, u32), RenderError> {
        if self.format == DepthImageFormat::Unknown {
            return Err(RenderError::creation_failed(
                "DepthImage",
                format!("'{}' has an UNKNOWN format", self.debug_name),
            ));
        }
        resolve_extent(
            "DepthImage",
            &self.debug_name,
            self.dimensions,
            self.dimension_type,
            window,
        )
    }
}

/// Describes a texture to load from disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Path of the encoded image file.
    pub path: String,
}

/// Decoded texture pixels, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Name shown in debuggers and logs.
    pub debug_name: String,
    /// Width and height in pixels.
    pub extent: (u32, u32),
    /// Pixel format of `pixels`.
    pub format: ImageFormat,
    /// Tightly packed rows of pixels.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// The number of bytes in one row of pixels.
    pub fn bytes_per_row(&self) -> u32 {
        self.extent.0 * self.format.bytes_per_pixel().unwrap_or(0)
    }
}

/// Which aspects of a depth image a clear touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthClearFlags {
    /// Clear the depth component.
    pub depth: bool,
    /// Clear the stencil component.
    pub stencil: bool,
}

impl DepthClearFlags {
    /// Clear depth only.
    pub const DEPTH: Self = Self {
        depth: true,
        stencil: false,
    };
    /// Clear stencil only.
    pub const STENCIL: Self = Self {
        depth: false,
        stencil: true,
    };
    /// Clear both components.
    pub const BOTH: Self = Self {
        depth: true,
        stencil: true,
    };
}
