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

//! A compact binary model format.
//!
//! Layout, all little-endian:
//!
//! | bytes | content |
//! |-------|---------|
//! | 4     | magic `STRM` |
//! | 4     | format version (`u32`, currently 1) |
//! | 4     | vertex count (`u32`) |
//! | 4     | index count (`u32`) |
//! | 32 x vertex count | vertices, 8 `f32` each: position, normal, uv |
//! | 4 x index count | indices (`u32`) |

use std::path::{Path, PathBuf};
use strata_core::renderer::api::{ModelData, Vertex};
use strata_core::renderer::{ModelLoader, RenderError};

const MAGIC: &[u8; 4] = b"STRM";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 16;
const FLOATS_PER_VERTEX: usize = std::mem::size_of::<Vertex>() / 4;

fn invalid(name: &str, reason: impl std::fmt::Display) -> RenderError {
    RenderError::creation_failed("Model", format!("'{name}': {reason}"))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Serializes a model into the binary format.
pub fn encode(model: &ModelData) -> Vec<u8> {
    let floats: &[f32] = bytemuck::cast_slice(&model.vertices);
    let mut bytes = Vec::with_capacity(HEADER_SIZE + floats.len() * 4 + model.indices.len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&(model.vertices.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(model.indices.len() as u32).to_le_bytes());
    for value in floats {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in &model.indices {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes
}

/// Parses a model from the binary format.
///
/// # Errors
///
/// [`RenderError::ResourceCreationFailed`] if the header is wrong, the
/// payload is truncated or an index points past the last vertex.
pub fn decode(name: &str, bytes: &[u8]) -> Result<ModelData, RenderError> {
    if bytes.len() < HEADER_SIZE || &bytes[..4] != MAGIC {
        return Err(invalid(name, "not a strata model file"));
    }
    let version = read_u32(bytes, 4);
    if version != VERSION {
        return Err(invalid(name, format!("unsupported version {version}")));
    }
    let vertex_count = read_u32(bytes, 8) as usize;
    let index_count = read_u32(bytes, 12) as usize;

    let vertex_bytes = vertex_count
        .checked_mul(FLOATS_PER_VERTEX * 4)
        .ok_or_else(|| invalid(name, "vertex count overflows"))?;
    let index_bytes = index_count
        .checked_mul(4)
        .ok_or_else(|| invalid(name, "index count overflows"))?;
    let expected = HEADER_SIZE + vertex_bytes + index_bytes;
    if bytes.len() != expected {
        return Err(invalid(
            name,
            format!("expected {expected} bytes, found {}", bytes.len()),
        ));
    }

    let (vertex_data, index_data) = bytes[HEADER_SIZE..].split_at(vertex_bytes);
    let floats: Vec<f32> = vertex_data
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let vertices: Vec<Vertex> = bytemuck::cast_slice(&floats).to_vec();
    let indices: Vec<u32> = index_data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(invalid(
            name,
            format!("index {bad} is out of range for {vertex_count} vertices"),
        ));
    }

    Ok(ModelData {
        debug_name: name.to_string(),
        vertices,
        indices,
    })
}

/// Loads `.strm` model files relative to a content root.
#[derive(Debug, Clone)]
pub struct BinaryModelLoader {
    root: PathBuf,
}

impl BinaryModelLoader {
    /// A loader resolving paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The content root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModelLoader for BinaryModelLoader {
    fn load(&self, path: &str) -> Result<ModelData, RenderError> {
        let full = self.root.join(path);
        let bytes = std::fs::read(&full)
            .map_err(|e| invalid(path, format!("cannot read {}: {e}", full.display())))?;
        let model = decode(path, &bytes)?;
        log::debug!(
            "BinaryModelLoader: '{path}' holds {} vertices and {} indices",
            model.vertices.len(),
            model.indices.len()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::renderer::api::PrimitiveModel;

    fn plane() -> ModelData {
        PrimitiveModel::Plane {
            width: 1.0,
            depth: 1.0,
        }
        .build()
    }

    #[test]
    fn test_cube_survives_a_file_round_trip() {
        let cube = PrimitiveModel::Cube { size: 2.0 }.build();
        let dir = std::env::temp_dir().join(format!("strata-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cube.strm"), encode(&cube)).unwrap();

        let loaded = BinaryModelLoader::new(&dir).load("cube.strm").unwrap();
        assert_eq!(loaded.vertices, cube.vertices);
        assert_eq!(loaded.indices, cube.indices);
        assert_eq!(loaded.debug_name, "cube.strm");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_header_is_little_endian() {
        let bytes = encode(&plane());
        assert_eq!(&bytes[..4], b"STRM");
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[4, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[6, 0, 0, 0]);
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let mut bytes = encode(&plane());
        bytes.pop();
        let err = decode("plane", &bytes).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceCreationFailed { kind: "Model", .. }
        ));
    }

    #[test]
    fn test_wrong_magic_or_version_is_rejected() {
        let mut bytes = encode(&plane());
        bytes[0] = b'X';
        assert!(decode("plane", &bytes).is_err());

        let mut bytes = encode(&plane());
        bytes[4] = 2;
        assert!(decode("plane", &bytes).is_err());
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut model = plane();
        model.indices[2] = 4;
        assert!(decode("plane", &encode(&model)).is_err());
    }

    #[test]
    fn test_missing_file_reports_the_path() {
        let err = BinaryModelLoader::new("/nonexistent")
            .load("ghost.strm")
            .unwrap_err();
        assert!(err.to_string().contains("ghost.strm"));
    }
}
