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

//! A recording backend shared by the integration tests.
//!
//! Every backend call is appended to a shared event log. How fences advance is
//! controlled by [`FenceMode`].

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use strata_core::renderer::api::*;
use strata_core::renderer::traits::*;
use strata_core::renderer::{RenderError, RenderSettings, Renderer};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateImage(String),
    CreateDepthImage(String),
    CreateTexture(String),
    LoadShader(String),
    CreateModel(String),
    CompileGraphicsPipeline(String),
    CompileComputePipeline(String),
    InitWindow(WindowHandle),
    CreateFence,
    ResetFrameSlot {
        slot: usize,
        completed: u64,
        signaled: u64,
    },
    Begin(String),
    End {
        list: String,
        value: u64,
    },
    SetGraphicsPipeline(String),
    SetComputePipeline(String),
    SetConstantBuffer {
        slot: u32,
        data: Vec<u8>,
    },
    SetViewport,
    SetScissorRect,
    ClearImage {
        image: String,
        color: [f32; 4],
    },
    ClearDepthImage {
        image: String,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    },
    Draw {
        model: String,
        index_count: u32,
        instance_count: u32,
    },
    PushMarker(String),
    PopMarker,
    Present {
        window: WindowHandle,
        image: String,
    },
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceMode {
    /// Fences complete as soon as they are signaled.
    Immediate,
    /// Fences advance by one per `poll`.
    OnPoll,
    /// Fences never advance.
    Hung,
}

#[derive(Debug, Default)]
struct FenceState {
    completed: Cell<u64>,
    signaled: Cell<u64>,
    polls: Cell<u64>,
}

#[derive(Debug, Clone)]
pub struct FakeFence {
    state: Rc<FenceState>,
    mode: Rc<Cell<FenceMode>>,
}

impl FakeFence {
    pub fn completed(&self) -> u64 {
        self.state.completed.get()
    }

    pub fn signaled(&self) -> u64 {
        self.state.signaled.get()
    }

    pub fn polls(&self) -> u64 {
        self.state.polls.get()
    }
}

impl GpuFence for FakeFence {
    fn completed_value(&self) -> u64 {
        self.state.completed.get()
    }

    fn poll(&self) {
        let state = &self.state;
        state.polls.set(state.polls.get() + 1);
        if self.mode.get() == FenceMode::OnPoll && state.completed.get() < state.signaled.get() {
            state.completed.set(state.completed.get() + 1);
        }
    }
}

pub struct FakeList {
    name: String,
}

pub struct FakeBackend {
    pub log: EventLog,
    pub fences: Vec<FakeFence>,
    pub fence_mode: Rc<Cell<FenceMode>>,
    /// Debug names of pipelines the backend refuses to compile.
    pub rejected_pipelines: HashSet<String>,
    /// Makes every allocation fail.
    pub out_of_memory: bool,
}

impl FakeBackend {
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::default();
        let backend = Self {
            log: log.clone(),
            fences: Vec::new(),
            fence_mode: Rc::new(Cell::new(FenceMode::Immediate)),
            rejected_pipelines: HashSet::new(),
            out_of_memory: false,
        };
        (backend, log)
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn allocate(&self, kind: &'static str) -> Result<(), RenderError> {
        if self.out_of_memory {
            return Err(RenderError::creation_failed(kind, "out of device memory"));
        }
        Ok(())
    }
}

impl RenderBackend for FakeBackend {
    type Image = String;
    type DepthImage = String;
    type Texture = String;
    type Shader = String;
    type Model = String;
    type GraphicsPipeline = String;
    type ComputePipeline = String;
    type CommandList = FakeList;
    type Fence = FakeFence;

    fn create_image(&mut self, desc: &ImageDesc, _extent: (u32, u32)) -> Result<String, RenderError> {
        self.allocate("Image")?;
        self.push(Event::CreateImage(desc.debug_name.to_string()));
        Ok(desc.debug_name.to_string())
    }

    fn create_depth_image(
        &mut self,
        desc: &DepthImageDesc,
        _extent: (u32, u32),
        _formats: DepthFormatSet,
    ) -> Result<String, RenderError> {
        self.allocate("DepthImage")?;
        self.push(Event::CreateDepthImage(desc.debug_name.to_string()));
        Ok(desc.debug_name.to_string())
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<String, RenderError> {
        self.allocate("Texture")?;
        self.push(Event::CreateTexture(data.debug_name.clone()));
        Ok(data.debug_name.clone())
    }

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<String, RenderError> {
        self.push(Event::LoadShader(desc.path.clone()));
        Ok(desc.path.clone())
    }

    fn create_model(&mut self, data: &ModelData) -> Result<String, RenderError> {
        self.allocate("Model")?;
        self.push(Event::CreateModel(data.debug_name.clone()));
        Ok(data.debug_name.clone())
    }

    fn compile_graphics_pipeline(
        &mut self,
        info: &GraphicsPipelineBuildInfo<'_, Self>,
    ) -> Result<String, RenderError> {
        if self.rejected_pipelines.contains(info.debug_name) {
            return Err(RenderError::PipelineCompilationFailed {
                label: info.debug_name.to_string(),
                details: "rejected by the fake backend".to_string(),
            });
        }
        self.push(Event::CompileGraphicsPipeline(info.debug_name.to_string()));
        Ok(info.debug_name.to_string())
    }

    fn compile_compute_pipeline(
        &mut self,
        info: &ComputePipelineBuildInfo<'_, Self>,
    ) -> Result<String, RenderError> {
        self.push(Event::CompileComputePipeline(info.debug_name.to_string()));
        Ok(info.debug_name.to_string())
    }

    fn init_window(&mut self, window: &dyn Window) -> Result<(), RenderError> {
        self.push(Event::InitWindow(window.handle()));
        Ok(())
    }

    fn create_fence(&mut self) -> Result<FakeFence, RenderError> {
        let fence = FakeFence {
            state: Rc::new(FenceState::default()),
            mode: self.fence_mode.clone(),
        };
        self.fences.push(fence.clone());
        self.push(Event::CreateFence);
        Ok(fence)
    }

    fn reset_frame_slot(&mut self, slot: usize) -> Result<(), RenderError> {
        let fence = &self.fences[slot];
        self.push(Event::ResetFrameSlot {
            slot,
            completed: fence.completed(),
            signaled: fence.signaled(),
        });
        Ok(())
    }

    fn begin_command_list(&mut self, debug_name: &str) -> Result<FakeList, RenderError> {
        self.push(Event::Begin(debug_name.to_string()));
        Ok(FakeList {
            name: debug_name.to_string(),
        })
    }

    fn end_command_list(
        &mut self,
        list: FakeList,
        fence: &FakeFence,
        value: u64,
    ) -> Result<(), RenderError> {
        fence.state.signaled.set(value);
        if fence.mode.get() == FenceMode::Immediate {
            fence.state.completed.set(value);
        }
        self.push(Event::End {
            list: list.name,
            value,
        });
        Ok(())
    }

    fn set_graphics_pipeline(&mut self, _list: &mut FakeList, pipeline: &String) -> Result<(), RenderError> {
        self.push(Event::SetGraphicsPipeline(pipeline.clone()));
        Ok(())
    }

    fn set_compute_pipeline(&mut self, _list: &mut FakeList, pipeline: &String) -> Result<(), RenderError> {
        self.push(Event::SetComputePipeline(pipeline.clone()));
        Ok(())
    }

    fn set_constant_buffer(&mut self, _list: &mut FakeList, slot: u32, data: &[u8]) -> Result<(), RenderError> {
        self.push(Event::SetConstantBuffer {
            slot,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn set_viewport(&mut self, _list: &mut FakeList, _viewport: &Viewport) -> Result<(), RenderError> {
        self.push(Event::SetViewport);
        Ok(())
    }

    fn set_scissor_rect(&mut self, _list: &mut FakeList, _rect: &ScissorRect) -> Result<(), RenderError> {
        self.push(Event::SetScissorRect);
        Ok(())
    }

    fn clear_image(&mut self, _list: &mut FakeList, image: &String, color: [f32; 4]) -> Result<(), RenderError> {
        self.push(Event::ClearImage {
            image: image.clone(),
            color,
        });
        Ok(())
    }

    fn clear_depth_image(
        &mut self,
        _list: &mut FakeList,
        image: &String,
        flags: DepthClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<(), RenderError> {
        self.push(Event::ClearDepthImage {
            image: image.clone(),
            flags,
            depth,
            stencil,
        });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        _list: &mut FakeList,
        model: &String,
        index_count: u32,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        self.push(Event::Draw {
            model: model.clone(),
            index_count,
            instance_count,
        });
        Ok(())
    }

    fn push_marker(&mut self, _list: &mut FakeList, _color: [f32; 4], label: &str) -> Result<(), RenderError> {
        self.push(Event::PushMarker(label.to_string()));
        Ok(())
    }

    fn pop_marker(&mut self, _list: &mut FakeList) -> Result<(), RenderError> {
        self.push(Event::PopMarker);
        Ok(())
    }

    fn present_image(
        &mut self,
        _list: &mut FakeList,
        window: WindowHandle,
        image: &String,
    ) -> Result<(), RenderError> {
        self.push(Event::Present {
            window,
            image: image.clone(),
        });
        Ok(())
    }

    fn present_depth_image(
        &mut self,
        _list: &mut FakeList,
        window: WindowHandle,
        image: &String,
    ) -> Result<(), RenderError> {
        self.push(Event::Present {
            window,
            image: image.clone(),
        });
        Ok(())
    }
}

pub struct FakeWindow {
    pub handle: WindowHandle,
    pub size: (u32, u32),
}

impl Window for FakeWindow {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn frame_buffer_count(&self) -> u32 {
        2
    }

    fn is_full_screen(&self) -> bool {
        false
    }

    fn dimensions(&self) -> (u32, u32) {
        self.size
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn renderer() -> (Renderer<FakeBackend>, EventLog) {
    init_logging();
    let (backend, log) = FakeBackend::new();
    let settings = RenderSettings {
        frames_in_flight: 2,
        fence_timeout_ms: 200,
        ..Default::default()
    };
    let renderer = Renderer::new(backend, settings).expect("renderer creation");
    log.borrow_mut().clear();
    (renderer, log)
}

pub fn color_desc(name: &'static str, size: (f32, f32)) -> ImageDesc {
    ImageDesc {
        debug_name: name.into(),
        dimensions: size,
        format: ImageFormat::R16G16B16A16Float,
        clear_color: [0.1, 0.2, 0.3, 1.0],
        ..Default::default()
    }
}

pub fn depth_desc(name: &'static str, size: (f32, f32)) -> DepthImageDesc {
    DepthImageDesc {
        debug_name: name.into(),
        dimensions: size,
        format: DepthImageFormat::R32Typeless,
        depth_clear_value: 1.0,
        ..Default::default()
    }
}

/// Drains the event log.
pub fn take_events(log: &EventLog) -> Vec<Event> {
    std::mem::take(&mut *log.borrow_mut())
}
