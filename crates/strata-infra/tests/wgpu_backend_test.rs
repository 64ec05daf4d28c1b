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

//! End-to-end tests of the wgpu backend through the renderer frontend.
//!
//! These need a GPU adapter (a software one is fine) and skip when none is found.

use strata_core::render_graph::{
    LoadMode, RenderGraph, RenderPassMutableResource, ShaderStage, WriteMode,
};
use strata_core::renderer::api::{
    ConstantBufferState, CullMode, GraphicsPipelineDesc, ImageDesc, ImageFormat, InputFormat,
    InputLayout, PrimitiveModel, RenderSettings, ShaderVisibility,
};
use strata_core::renderer::{CommandList, InstanceData, RenderError, Renderer, Window};
use strata_infra::{OffscreenWindow, WgpuBackend};

const SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/shaders/flat.wgsl");

fn settings() -> RenderSettings {
    RenderSettings {
        frames_in_flight: 2,
        window_width: 64,
        window_height: 48,
        ..Default::default()
    }
}

fn create_test_renderer() -> Option<(Renderer<WgpuBackend>, OffscreenWindow)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let settings = settings();
    let backend = match WgpuBackend::new(&settings) {
        Ok(backend) => backend,
        Err(err) => {
            println!("Skipping wgpu backend test: {err:#}");
            return None;
        }
    };
    let mut renderer = Renderer::new(backend, settings).ok()?;
    let window = OffscreenWindow::new(64, 48, 2);
    renderer.init_window(&window).ok()?;
    Some((renderer, window))
}

fn color_target(name: &'static str) -> ImageDesc {
    ImageDesc {
        debug_name: name.into(),
        dimensions: (64.0, 48.0),
        format: ImageFormat::R8G8B8A8Unorm,
        clear_color: [0.0, 0.0, 1.0, 1.0],
        ..Default::default()
    }
}

#[test]
fn test_cleared_image_is_presented_to_the_window() {
    let Some((mut renderer, window)) = create_test_renderer() else {
        return;
    };
    let color = renderer.create_image(color_target("Color")).unwrap();

    renderer.begin_frame().unwrap();
    let mut list = CommandList::new("ClearAndPresent");
    list.clear_image(color, [1.0, 0.0, 0.0, 1.0]);
    list.present_image(window.handle(), color);
    renderer.submit(list).unwrap();
    renderer.end_frame();
    renderer.wait_idle().unwrap();

    let pixels = renderer.backend().read_back(window.handle()).unwrap();
    assert_eq!(pixels.dimensions(), (64, 48));
    assert_eq!(pixels.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(pixels.get_pixel(63, 47).0, [255, 0, 0, 255]);
}

#[test]
fn test_read_back_before_any_present_fails() {
    let Some((renderer, window)) = create_test_renderer() else {
        return;
    };
    let err = renderer.backend().read_back(window.handle()).unwrap_err();
    assert!(matches!(err, RenderError::Backend(_)));
}

#[test]
fn test_unbalanced_markers_never_reach_the_queue() {
    let Some((mut renderer, _window)) = create_test_renderer() else {
        return;
    };
    renderer.begin_frame().unwrap();
    let mut list = CommandList::new("Unbalanced");
    list.push_marker([1.0, 1.0, 0.0, 1.0], "Open");
    let err = renderer.submit(list).unwrap_err();
    assert!(matches!(err, RenderError::UnbalancedMarkers { depth: 1, .. }));
    assert_eq!(renderer.pacer().last_signaled(renderer.frame_index()), Some(0));
}

#[test]
fn test_render_graph_draws_a_render_layer() {
    let Some((mut renderer, window)) = create_test_renderer() else {
        return;
    };
    let color = renderer.create_image(color_target("Scene")).unwrap();
    let cube = renderer
        .create_model(&PrimitiveModel::Cube { size: 1.0 }.build())
        .unwrap();
    let vertex_shader = renderer.load_vertex_shader(SHADER).unwrap();
    let pixel_shader = renderer.load_pixel_shader(SHADER).unwrap();
    let mut instance_buffer = renderer
        .create_constant_buffer(InstanceData::default())
        .unwrap();

    let tint = [0.0, 1.0, 0.0, 1.0];
    renderer
        .render_layer("Opaque")
        .register_model(cube, InstanceData::new(tint, InstanceData::IDENTITY));

    let mut desc = GraphicsPipelineDesc::new("Flat", vertex_shader, pixel_shader);
    desc.states.rasterizer_state.cull_mode = CullMode::None;
    desc.states.input_layouts[0] =
        InputLayout::per_vertex("POSITION", InputFormat::R32G32B32Float, 0);
    desc.states.constant_buffer_states[0] = ConstantBufferState {
        enabled: true,
        shader_visibility: ShaderVisibility::All,
    };

    #[derive(Default)]
    struct SceneData {
        color: RenderPassMutableResource,
    }

    let mut graph = RenderGraph::<WgpuBackend>::new();
    graph.add_pass(
        "Scene",
        move |data: &mut SceneData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Clear);
            Ok(true)
        },
        move |data: &SceneData, ctx| {
            let mut desc = desc.clone();
            desc.render_targets[0] = data.color;
            let pipeline = ctx.create_graphics_pipeline(&desc)?;
            ctx.set_full_viewport(data.color)?;
            ctx.commands().set_graphics_pipeline(pipeline);
            let draws = ctx.draw_render_layer("Opaque", 0, &mut instance_buffer);
            assert_eq!(draws, 1);
            Ok(())
        },
    );
    let handle = window.handle();
    graph.add_pass(
        "Present",
        move |_: &mut (), builder| {
            builder.read(color, ShaderStage::PIXEL);
            Ok(true)
        },
        move |_: &(), ctx| {
            ctx.commands().present_image(handle, color);
            Ok(())
        },
    );

    renderer.begin_frame().unwrap();
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();
    renderer.end_frame();
    renderer.wait_idle().unwrap();

    let pixels = renderer.backend().read_back(handle).unwrap();
    // The cube covers the middle half of the target; the corners keep the clear color.
    assert_eq!(pixels.get_pixel(32, 24).0, [0, 255, 0, 255]);
    assert_eq!(pixels.get_pixel(1, 1).0, [0, 0, 255, 255]);
}
