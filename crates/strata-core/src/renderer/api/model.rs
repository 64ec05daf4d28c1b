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

//! CPU-side model data and the built-in primitive models.

use bytemuck::{Pod, Zeroable};

/// The vertex layout every model is uploaded with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;
}

/// Vertices and indices of a model, ready for upload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelData {
    /// Name shown in debuggers and logs.
    pub debug_name: String,
    /// The vertex buffer contents.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl ModelData {
    /// The number of indices an indexed draw of the whole model uses.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Describes a model to load through a [`ModelLoader`](crate::renderer::traits::ModelLoader).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelDesc {
    /// Content path of the model file.
    pub path: String,
}

/// Models that can be generated without any file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveModel {
    /// An axis-aligned cube centered on the origin with the given edge length.
    Cube {
        /// The edge length.
        size: f32,
    },
    /// A plane in the XZ plane centered on the origin, facing +Y.
    Plane {
        /// Extent along X.
        width: f32,
        /// Extent along Z.
        depth: f32,
    },
}

impl PrimitiveModel {
    /// Generates the vertices and indices of the primitive.
    pub fn build(self) -> ModelData {
        match self {
            PrimitiveModel::Cube { size } => cube(size),
            PrimitiveModel::Plane { width, depth } => plane(width, depth),
        }
    }
}

fn cube(size: f32) -> ModelData {
    let h = size * 0.5;
    // (normal, tangent u, tangent v) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (n, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = [
                (n[0] + u[0] * su + v[0] * sv) * h,
                (n[1] + u[1] * su + v[1] * sv) * h,
                (n[2] + u[2] * su + v[2] * sv) * h,
            ];
            vertices.push(Vertex {
                position,
                normal: n,
                uv: [(su + 1.0) * 0.5, (1.0 - sv) * 0.5],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    ModelData {
        debug_name: "Cube".to_string(),
        vertices,
        indices,
    }
}

fn plane(width: f32, depth: f32) -> ModelData {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    let normal = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex { position: [-hw, 0.0, hd], normal, uv: [0.0, 1.0] },
        Vertex { position: [hw, 0.0, hd], normal, uv: [1.0, 1.0] },
        Vertex { position: [hw, 0.0, -hd], normal, uv: [1.0, 0.0] },
        Vertex { position: [-hw, 0.0, -hd], normal, uv: [0.0, 0.0] },
    ];
    ModelData {
        debug_name: "Plane".to_string(),
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(Vertex::STRIDE, 32);
    }

    #[test]
    fn cube_has_six_quads() {
        let cube = PrimitiveModel::Cube { size: 2.0 }.build();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        for vertex in &cube.vertices {
            for c in vertex.position {
                assert_relative_eq!(c.abs(), 1.0);
            }
        }
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn cube_faces_wind_counter_clockwise_around_their_normal() {
        let cube = PrimitiveModel::Cube { size: 1.0 }.build();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| cube.vertices[i as usize].position);
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let n = cube.vertices[tri[0] as usize].normal;
            let dot = cross[0] * n[0] + cross[1] * n[1] + cross[2] * n[2];
            assert!(dot > 0.0);
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = PrimitiveModel::Plane {
            width: 4.0,
            depth: 2.0,
        }
        .build();
        assert_eq!(plane.index_count(), 6);
        assert!(plane.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }
}
