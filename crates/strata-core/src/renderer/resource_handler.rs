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

//! Ownership of images, depth images and textures.
//!
//! Render-target images, depth images and read-only textures live in three
//! separate registries; the creation call used decides the class, and the
//! handle type carries it from then on.

use crate::handle::{
    DepthImageId, DepthImageKind, ImageId, ImageKind, Registry, TextureId, TextureKind,
};
use crate::render_graph::{ResourceCatalog, ResourceClass};
use crate::renderer::api::{
    DepthFormatSet, DepthImageDesc, ImageDesc, ImageFormat, TextureData, TextureDesc,
};
use crate::renderer::error::{RenderError, TextureError};
use crate::renderer::traits::RenderBackend;
use ::image::DynamicImage;

/// A render-target image and the description it was created from.
pub struct ImageEntry<N> {
    /// The creation description.
    pub desc: ImageDesc,
    /// The resolved size in pixels.
    pub extent: (u32, u32),
    /// The backend object.
    pub native: N,
}

/// A depth image and the description it was created from.
pub struct DepthImageEntry<N> {
    /// The creation description.
    pub desc: DepthImageDesc,
    /// The resolved size in pixels.
    pub extent: (u32, u32),
    /// The storage, view and read formats of the image.
    pub formats: DepthFormatSet,
    /// The backend object.
    pub native: N,
}

/// A read-only texture.
pub struct TextureEntry<N> {
    /// The name it was created under (the file path for loaded textures).
    pub debug_name: String,
    /// Size in pixels.
    pub extent: (u32, u32),
    /// The upload format.
    pub format: ImageFormat,
    /// The backend object.
    pub native: N,
}

/// Creates and owns every image-like resource.
pub struct ResourceHandler<B: RenderBackend> {
    images: Registry<ImageKind, ImageEntry<B::Image>>,
    depth_images: Registry<DepthImageKind, DepthImageEntry<B::DepthImage>>,
    textures: Registry<TextureKind, TextureEntry<B::Texture>>,
}

impl<B: RenderBackend> Default for ResourceHandler<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> ResourceHandler<B> {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self {
            images: Registry::new(),
            depth_images: Registry::new(),
            textures: Registry::new(),
        }
    }

    /// Creates a handler whose registries hold at most `limit` entries each.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            images: Registry::with_capacity_limit(limit),
            depth_images: Registry::with_capacity_limit(limit),
            textures: Registry::with_capacity_limit(limit),
        }
    }

    /// Validates `desc` and creates an image with render-target, shader-read
    /// and unordered-access views.
    ///
    /// `window` is the size `ScaleOfWindow` dimensions are relative to.
    pub fn create_image(
        &mut self,
        backend: &mut B,
        desc: ImageDesc,
        window: (u32, u32),
    ) -> Result<ImageId, RenderError> {
        let extent = desc.resolve_extent(window)?;
        self.images.check_capacity()?;
        let native = backend.create_image(&desc, extent)?;
        log::info!(
            "ResourceHandler: Created image '{}' ({}x{}, {:?}, {} samples)",
            desc.debug_name,
            extent.0,
            extent.1,
            desc.format,
            desc.sample_count.count()
        );
        self.images.insert(ImageEntry {
            desc,
            extent,
            native,
        })
    }

    /// Validates `desc` and creates a depth image with depth-stencil and
    /// depth-read views, plus a stencil-read view when the format has stencil.
    pub fn create_depth_image(
        &mut self,
        backend: &mut B,
        desc: DepthImageDesc,
        window: (u32, u32),
    ) -> Result<DepthImageId, RenderError> {
        let extent = desc.resolve_extent(window)?;
        let formats = desc.format.split().ok_or_else(|| {
            RenderError::creation_failed("DepthImage", "format has no depth family")
        })?;
        self.depth_images.check_capacity()?;
        let native = backend.create_depth_image(&desc, extent, formats)?;
        log::info!(
            "ResourceHandler: Created depth image '{}' ({}x{}, storage {:?}, view {:?})",
            desc.debug_name,
            extent.0,
            extent.1,
            formats.base,
            formats.view
        );
        self.depth_images.insert(DepthImageEntry {
            desc,
            extent,
            formats,
            native,
        })
    }

    /// Reads and decodes the image file at `desc.path` and uploads it as a
    /// read-only texture.
    pub fn load_texture(
        &mut self,
        backend: &mut B,
        desc: &TextureDesc,
    ) -> Result<TextureId, RenderError> {
        let data = decode_texture(&desc.path)?;
        self.create_texture_from_data(backend, data)
    }

    /// Uploads already decoded pixels as a read-only texture.
    pub fn create_texture_from_data(
        &mut self,
        backend: &mut B,
        data: TextureData,
    ) -> Result<TextureId, RenderError> {
        let expected = data.bytes_per_row() as usize * data.extent.1 as usize;
        if data.extent.0 == 0 || data.extent.1 == 0 || data.pixels.len() != expected {
            return Err(RenderError::creation_failed(
                "Texture",
                format!(
                    "'{}' has {} bytes of pixels for {}x{} {:?}",
                    data.debug_name,
                    data.pixels.len(),
                    data.extent.0,
                    data.extent.1,
                    data.format
                ),
            ));
        }
        self.textures.check_capacity()?;
        let native = backend.create_texture(&data)?;
        log::info!(
            "ResourceHandler: Created texture '{}' ({}x{}, {:?})",
            data.debug_name,
            data.extent.0,
            data.extent.1,
            data.format
        );
        self.textures.insert(TextureEntry {
            debug_name: data.debug_name,
            extent: data.extent,
            format: data.format,
            native,
        })
    }

    /// The entry of an image.
    pub fn image(&self, id: ImageId) -> Result<&ImageEntry<B::Image>, RenderError> {
        self.images.get(id)
    }

    /// The entry of a depth image.
    pub fn depth_image(
        &self,
        id: DepthImageId,
    ) -> Result<&DepthImageEntry<B::DepthImage>, RenderError> {
        self.depth_images.get(id)
    }

    /// The entry of a texture.
    pub fn texture(&self, id: TextureId) -> Result<&TextureEntry<B::Texture>, RenderError> {
        self.textures.get(id)
    }

    /// The description an image was created from.
    pub fn image_desc(&self, id: ImageId) -> Result<&ImageDesc, RenderError> {
        self.images.get(id).map(|entry| &entry.desc)
    }

    /// The description a depth image was created from.
    pub fn depth_image_desc(&self, id: DepthImageId) -> Result<&DepthImageDesc, RenderError> {
        self.depth_images.get(id).map(|entry| &entry.desc)
    }

    /// Number of images created so far.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of depth images created so far.
    pub fn depth_image_count(&self) -> usize {
        self.depth_images.len()
    }

    /// Number of textures created so far.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl<B: RenderBackend> ResourceCatalog for ResourceHandler<B> {
    fn contains(&self, class: ResourceClass, index: u16) -> bool {
        match class {
            ResourceClass::Image => self.images.contains(ImageId::new(index)),
            ResourceClass::DepthImage => self.depth_images.contains(DepthImageId::new(index)),
            ResourceClass::Texture => self.textures.contains(TextureId::new(index)),
        }
    }
}

/// Reads and decodes an image file into uploadable pixels.
///
/// 8-bit sources become [`ImageFormat::R8G8B8A8Unorm`], 16-bit sources
/// [`ImageFormat::R16G16B16A16Unorm`] and float sources
/// [`ImageFormat::R32G32B32A32Float`]; channels missing from the source are
/// filled in.
pub fn decode_texture(path: &str) -> Result<TextureData, TextureError> {
    let decoded = ::image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_string(),
        source,
    })?;
    convert_texture(path, decoded)
}

fn convert_texture(path: &str, decoded: DynamicImage) -> Result<TextureData, TextureError> {
    let extent = (decoded.width(), decoded.height());
    let (format, pixels) = match decoded {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => {
            (ImageFormat::R8G8B8A8Unorm, decoded.to_rgba8().into_raw())
        }
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => {
            let texels = decoded.to_rgba16().into_raw();
            (
                ImageFormat::R16G16B16A16Unorm,
                bytemuck::cast_slice(&texels).to_vec(),
            )
        }
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            let texels = decoded.to_rgba32f().into_raw();
            (
                ImageFormat::R32G32B32A32Float,
                bytemuck::cast_slice(&texels).to_vec(),
            )
        }
        other => {
            return Err(TextureError::UnsupportedLayout {
                path: path.to_string(),
                color_type: format!("{:?}", other.color()),
            })
        }
    };
    log::debug!(
        "decode_texture: '{path}' decoded to {}x{} {format:?}",
        extent.0,
        extent.1
    );
    Ok(TextureData {
        debug_name: path.to_string(),
        extent,
        format,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Luma, Rgb};

    #[test]
    fn rgb8_is_expanded_to_rgba8() {
        let source = ImageBuffer::from_pixel(3, 2, Rgb([10u8, 20, 30]));
        let data = convert_texture("mem.png", DynamicImage::ImageRgb8(source)).unwrap();
        assert_eq!(data.format, ImageFormat::R8G8B8A8Unorm);
        assert_eq!(data.extent, (3, 2));
        assert_eq!(data.pixels.len(), 3 * 2 * 4);
        assert_eq!(&data.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn sixteen_bit_sources_keep_their_precision() {
        let source = ImageBuffer::from_pixel(2, 2, Luma([40_000u16]));
        let data = convert_texture("mem.png", DynamicImage::ImageLuma16(source)).unwrap();
        assert_eq!(data.format, ImageFormat::R16G16B16A16Unorm);
        assert_eq!(data.pixels.len(), data.bytes_per_row() as usize * 2);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = decode_texture("does/not/exist.png").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn decodes_a_file_written_to_disk() {
        let path = std::env::temp_dir().join("strata_decode_texture_test.png");
        ImageBuffer::from_pixel(4, 4, Rgb([255u8, 0, 0]))
            .save(&path)
            .unwrap();
        let data = decode_texture(path.to_str().unwrap()).unwrap();
        assert_eq!(data.extent, (4, 4));
        assert_eq!(&data.pixels[..4], &[255, 0, 0, 255]);
        let _ = std::fs::remove_file(path);
    }
}
