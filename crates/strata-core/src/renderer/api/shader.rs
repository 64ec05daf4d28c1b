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

//! Shader module descriptors.

use std::fmt;

/// The pipeline stage a shader module is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// A vertex shader.
    Vertex,
    /// A pixel (fragment) shader.
    Pixel,
    /// A compute shader.
    Compute,
}

impl ShaderType {
    /// The entry point name backends look up in the module.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderType::Vertex => "vs_main",
            ShaderType::Pixel => "ps_main",
            ShaderType::Compute => "cs_main",
        }
    }
}

impl fmt::Display for ShaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderType::Vertex => "vertex",
            ShaderType::Pixel => "pixel",
            ShaderType::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// Describes a shader module to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderDesc {
    /// Path of the shader source or binary.
    pub path: String,
    /// The stage the module is used for.
    pub shader_type: ShaderType,
}

impl ShaderDesc {
    /// A vertex shader at `path`.
    pub fn vertex(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            shader_type: ShaderType::Vertex,
        }
    }

    /// A pixel shader at `path`.
    pub fn pixel(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            shader_type: ShaderType::Pixel,
        }
    }

    /// A compute shader at `path`.
    pub fn compute(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            shader_type: ShaderType::Compute,
        }
    }
}
