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

//! Global settings for the render core.

use crate::renderer::error::RenderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The kind of adapter the backend should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdapterPreference {
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

/// A collection of settings that affect the renderer and its backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Number of frame-in-flight slots (double or triple buffering).
    pub frames_in_flight: u32,
    /// How long the CPU may block on a frame slot's fence before the device is
    /// considered lost, in milliseconds.
    pub fence_timeout_ms: u64,
    /// If `false`, marker commands are recorded but never reach the backend.
    pub debug_markers: bool,
    /// The adapter the backend should pick when several are available.
    pub adapter_preference: AdapterPreference,
    /// Width of the main window in pixels.
    pub window_width: u32,
    /// Height of the main window in pixels.
    pub window_height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            fence_timeout_ms: 2000,
            debug_markers: true,
            adapter_preference: AdapterPreference::HighPerformance,
            window_width: 1280,
            window_height: 720,
        }
    }
}

impl RenderSettings {
    /// The largest supported number of frames in flight.
    pub const MAX_FRAMES_IN_FLIGHT: u32 = 3;

    /// Parses settings from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| RenderError::Backend(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the settings for values the renderer cannot work with.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.frames_in_flight == 0 || self.frames_in_flight > Self::MAX_FRAMES_IN_FLIGHT {
            return Err(RenderError::Backend(format!(
                "invalid settings: frames_in_flight must be in 1..={}, got {}",
                Self::MAX_FRAMES_IN_FLIGHT,
                self.frames_in_flight
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(RenderError::Backend(
                "invalid settings: window dimensions must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The fence timeout as a [`Duration`].
    pub fn fence_timeout(&self) -> Duration {
        Duration::from_millis(self.fence_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = RenderSettings::from_json_str(r#"{ "frames_in_flight": 3 }"#).unwrap();
        assert_eq!(settings.frames_in_flight, 3);
        assert_eq!(settings.fence_timeout(), Duration::from_secs(2));
        assert!(settings.debug_markers);
    }

    #[test]
    fn out_of_range_frames_in_flight_is_rejected() {
        assert!(RenderSettings::from_json_str(r#"{ "frames_in_flight": 0 }"#).is_err());
        assert!(RenderSettings::from_json_str(r#"{ "frames_in_flight": 4 }"#).is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RenderSettings::from_json_str("{ frames_in_flight").is_err());
    }
}
