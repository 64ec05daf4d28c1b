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

use anyhow::anyhow;
use anyhow::Result;
use strata_core::renderer::api::AdapterPreference;
use wgpu::{Adapter, Features, Instance};

/// Features the backend enables whenever the adapter offers them.
///
/// - 16-bit normalized color formats (`R16G16B16A16Unorm` and friends).
/// - The 32-bit float depth format with stencil.
/// - Border addressing for static samplers.
/// - Wireframe fill mode.
/// - Adapter-specific format capabilities (MSAA and storage on more formats).
fn optional_features() -> Features {
    Features::TEXTURE_FORMAT_16BIT_NORM
        | Features::DEPTH32FLOAT_STENCIL8
        | Features::ADDRESS_MODE_CLAMP_TO_BORDER
        | Features::POLYGON_MODE_LINE
        | Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
}

/// Holds the core wgpu state objects required for rendering.
///
/// The context is headless: presentation goes to offscreen back buffers owned
/// by the backend, so no surface is created here.
#[derive(Debug)]
pub struct WgpuContext {
    #[allow(dead_code)]
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_device_type: wgpu::DeviceType,
    pub active_device_features: Features,
    pub device_limits: wgpu::Limits,
}

impl WgpuContext {
    /// Asynchronously picks an adapter and opens a logical device on it.
    ///
    /// ## Arguments
    /// * `preference` - Which kind of adapter to favor when several are present.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or an error if no adapter or
    ///   device could be obtained.
    pub async fn new(preference: AdapterPreference) -> Result<Self> {
        log::info!("Initializing wgpu context...");

        // --- 1. Pick an adapter ---
        let instance = Instance::new(&wgpu::InstanceDescriptor::default());
        let power_preference = match preference {
            AdapterPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            AdapterPreference::LowPower => wgpu::PowerPreference::LowPower,
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("No suitable graphics adapter: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?}, Type: {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        // --- 2. Create Logical Device and Command Queue from Adapter ---
        let features_to_enable = adapter.features() & optional_features();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Strata Logical Device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e:?}");
        }));

        let active_device_features = device.features();
        let device_limits = device.limits();
        log::debug!("Active device features: {active_device_features:?}");

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            active_device_features,
            device_limits,
        })
    }

    /// Returns `true` if `feature` was enabled on the device.
    pub fn has_feature(&self, feature: Features) -> bool {
        self.active_device_features.contains(feature)
    }

    /// The capabilities of `format` on this device.
    pub fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        if self.has_feature(Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            self.adapter.get_texture_format_features(format)
        } else {
            format.guaranteed_format_features(self.active_device_features)
        }
    }

    /// Runs `operation` inside validation and out-of-memory error scopes.
    ///
    /// wgpu reports most creation failures asynchronously; the scopes turn
    /// them into a synchronous `Err` carrying the error message.
    pub fn capture<R>(&self, operation: impl FnOnce(&wgpu::Device) -> R) -> Result<R, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = operation(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(out_of_memory) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }
}
