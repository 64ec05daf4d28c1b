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

//! Defines the hierarchy of error types for the render core.

use std::fmt;

/// An error produced while decoding or converting a texture file.
#[derive(Debug)]
pub enum TextureError {
    /// The file could not be read or decoded.
    Decode {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying decoder error.
        source: image::ImageError,
    },
    /// The decoded pixel layout has no compatible upload format.
    UnsupportedLayout {
        /// The path of the offending file.
        path: String,
        /// A description of the decoded color type.
        color_type: String,
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Decode { path, source } => {
                write!(f, "Failed to decode texture '{path}': {source}")
            }
            TextureError::UnsupportedLayout { path, color_type } => {
                write!(
                    f,
                    "Texture '{path}' has an unsupported pixel layout: {color_type}"
                )
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Decode { source, .. } => Some(source),
            TextureError::UnsupportedLayout { .. } => None,
        }
    }
}

/// The error type shared by every fallible operation of the render core.
#[derive(Debug)]
pub enum RenderError {
    /// A resource could not be created: the handle space is exhausted, the
    /// descriptor is invalid, or the backend failed to allocate it.
    ResourceCreationFailed {
        /// The kind of resource (e.g. `"Image"`).
        kind: &'static str,
        /// Why the creation failed.
        reason: String,
    },
    /// A handle was invalid, out of range, or of the wrong resource class.
    InvalidHandle {
        /// The kind of resource the handle refers to.
        kind: &'static str,
        /// The raw index carried by the handle.
        index: u16,
    },
    /// The backend rejected a pipeline, or its description is inconsistent.
    PipelineCompilationFailed {
        /// The debug name of the pipeline.
        label: String,
        /// Details reported by the backend or the validation step.
        details: String,
    },
    /// A render pass failed during setup; the whole frame was abandoned.
    PassSetupFailed {
        /// The name of the failing pass.
        pass: String,
        /// The underlying failure.
        source: Box<RenderError>,
    },
    /// The markers of a command list do not nest.
    UnbalancedMarkers {
        /// The debug name of the command list.
        list: String,
        /// The marker depth at the point of failure (negative when a pop had no push).
        depth: i32,
    },
    /// A render graph was executed without a successful setup.
    GraphNotCompiled,
    /// The device stopped responding or reported itself lost.
    DeviceLost {
        /// What was observed when the loss was detected.
        reason: String,
    },
    /// An error occurred while decoding a texture.
    Texture(TextureError),
    /// An error originating from the specific graphics backend implementation.
    Backend(String),
}

impl RenderError {
    /// Shorthand for a [`RenderError::ResourceCreationFailed`].
    pub fn creation_failed(kind: &'static str, reason: impl Into<String>) -> Self {
        RenderError::ResourceCreationFailed {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors after which the device cannot be used anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::DeviceLost { .. })
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ResourceCreationFailed { kind, reason } => {
                write!(f, "Failed to create {kind}: {reason}")
            }
            RenderError::InvalidHandle { kind, index } => {
                write!(f, "Invalid {kind} handle: {index}")
            }
            RenderError::PipelineCompilationFailed { label, details } => {
                write!(f, "Pipeline compilation failed for '{label}': {details}")
            }
            RenderError::PassSetupFailed { pass, source } => {
                write!(f, "Setup of render pass '{pass}' failed: {source}")
            }
            RenderError::UnbalancedMarkers { list, depth } => {
                write!(
                    f,
                    "Command list '{list}' has unbalanced markers (depth {depth})"
                )
            }
            RenderError::GraphNotCompiled => {
                write!(f, "The render graph was executed without a successful setup")
            }
            RenderError::DeviceLost { reason } => {
                write!(f, "The graphics device was lost: {reason}")
            }
            RenderError::Texture(err) => write!(f, "Texture error: {err}"),
            RenderError::Backend(msg) => write!(f, "Backend-specific error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::PassSetupFailed { source, .. } => Some(source.as_ref()),
            RenderError::Texture(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TextureError> for RenderError {
    fn from(err: TextureError) -> Self {
        RenderError::Texture(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn creation_failed_display() {
        let err = RenderError::creation_failed("Image", "width must be > 0");
        assert_eq!(format!("{err}"), "Failed to create Image: width must be > 0");
        assert!(err.source().is_none());
    }

    #[test]
    fn pass_setup_failed_wraps_source() {
        let err = RenderError::PassSetupFailed {
            pass: "DepthPrepass".to_string(),
            source: Box::new(RenderError::InvalidHandle {
                kind: "DepthImage",
                index: 7,
            }),
        };
        assert_eq!(
            format!("{err}"),
            "Setup of render pass 'DepthPrepass' failed: Invalid DepthImage handle: 7"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn only_device_lost_is_fatal() {
        assert!(RenderError::DeviceLost {
            reason: "fence timeout".into()
        }
        .is_fatal());
        assert!(!RenderError::Backend("oops".into()).is_fatal());
    }
}
