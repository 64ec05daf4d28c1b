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

// Strata Sandbox
// Renders a few frames of a small scene offscreen and writes the last one to disk.

mod math;

use anyhow::{Context, Result};
use clap::{value_parser, Parser};
use std::path::PathBuf;
use strata_core::render_graph::{
    LoadMode, RenderGraph, RenderPassMutableResource, ShaderStage, WriteMode,
};
use strata_core::renderer::api::{
    ComparisonFunc, ConstantBufferState, DepthImageDesc, DepthImageFormat, DepthStencilState,
    GraphicsPipelineDesc, GraphicsPipelineStates, ImageDesc, ImageDimensionType, ImageFormat,
    InputFormat, InputLayout, MaterialDesc, MaterialPipelineDesc, PrimitiveModel,
    RasterizerState, RenderSettings, ShaderVisibility,
};
use strata_core::renderer::{ConstantBuffer, InstanceData, Renderer, Window};
use strata_core::{DepthImageId, ImageId, MaterialId, ModelId, PixelShaderId, VertexShaderId};
use strata_infra::{OffscreenWindow, WgpuBackend};

const LIT_SHADER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/lit.wgsl");
const OPAQUE_LAYER: &str = "Opaque";
const SCENE_SLOT: u32 = 0;
const INSTANCE_SLOT: u32 = 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneConstants {
    view_projection: [[f32; 4]; 4],
    light_direction: [f32; 4],
}

#[derive(Parser, Debug)]
#[command(name = "sandbox")]
#[command(about = "Renders a small scene offscreen and writes the last frame to disk")]
struct Options {
    /// Number of frames to render.
    #[arg(long, default_value_t = 8)]
    frames: u32,

    /// Where the last presented frame is written, as PNG.
    #[arg(long, default_value = "strata_sandbox.png")]
    output: PathBuf,

    /// Present the depth buffer instead of the lit color image.
    #[arg(long = "depth")]
    show_depth: bool,

    /// Width of the offscreen window in pixels.
    #[arg(long, default_value_t = 800, value_parser = value_parser!(u32).range(1..))]
    width: u32,

    /// Height of the offscreen window in pixels.
    #[arg(long, default_value_t = 600, value_parser = value_parser!(u32).range(1..))]
    height: u32,
}

/// Resources created once and reused by every frame.
struct Scene {
    color: ImageId,
    depth: DepthImageId,
    cube: ModelId,
    ground: ModelId,
    material: MaterialId,
    prepass_states: GraphicsPipelineStates,
    scene_constants: ConstantBuffer<SceneConstants>,
    prepass_instances: ConstantBuffer<InstanceData>,
    main_instances: ConstantBuffer<InstanceData>,
}

impl Scene {
    fn create(renderer: &mut Renderer<WgpuBackend>) -> Result<Self> {
        let color = renderer.create_image(ImageDesc {
            debug_name: "SceneColor".into(),
            dimensions: (1.0, 1.0),
            dimension_type: ImageDimensionType::ScaleOfWindow,
            format: ImageFormat::R8G8B8A8Unorm,
            clear_color: [0.05, 0.06, 0.09, 1.0],
            ..Default::default()
        })?;
        let depth = renderer.create_depth_image(DepthImageDesc {
            debug_name: "SceneDepth".into(),
            dimensions: (1.0, 1.0),
            dimension_type: ImageDimensionType::ScaleOfWindow,
            format: DepthImageFormat::R32Typeless,
            depth_clear_value: 1.0,
            ..Default::default()
        })?;
        let cube = renderer.create_model(&PrimitiveModel::Cube { size: 1.0 }.build())?;
        let ground = renderer.create_model(
            &PrimitiveModel::Plane {
                width: 12.0,
                depth: 12.0,
            }
            .build(),
        )?;
        let vertex_shader = renderer.load_vertex_shader(LIT_SHADER)?;
        let pixel_shader = renderer.load_pixel_shader(LIT_SHADER)?;
        let lit = lit_material(vertex_shader, pixel_shader);

        let depth_write = DepthStencilState {
            depth_enable: true,
            depth_write_enable: true,
            ..Default::default()
        };
        let mut prepass_states = lit.pipeline_states(RasterizerState::default(), depth_write);
        prepass_states.pixel_shader = PixelShaderId::INVALID;
        let material = renderer.create_material(lit)?;

        let scene_constants = renderer.create_constant_buffer(SceneConstants {
            view_projection: math::IDENTITY,
            light_direction: [-0.4, -1.0, -0.3, 0.0],
        })?;
        let prepass_instances = renderer.create_constant_buffer(InstanceData::default())?;
        let main_instances = renderer.create_constant_buffer(InstanceData::default())?;
        Ok(Self {
            color,
            depth,
            cube,
            ground,
            material,
            prepass_states,
            scene_constants,
            prepass_instances,
            main_instances,
        })
    }

    /// Fills the opaque layer and camera for frame `frame`.
    fn update(&mut self, renderer: &mut Renderer<WgpuBackend>, frame: u32) {
        let (width, height) = renderer.window_extent();
        let aspect = width as f32 / height.max(1) as f32;
        let projection = math::perspective(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0);
        let view = math::look_at([0.0, 4.0, 9.0], [0.0, 0.5, 0.0], [0.0, 1.0, 0.0]);
        self.scene_constants.resource_mut().view_projection = math::mul(&projection, &view);

        let angle = frame as f32 * 0.1;
        let layer = renderer.render_layer(OPAQUE_LAYER);
        layer.register_model(
            self.ground,
            InstanceData::new([0.6, 0.6, 0.6, 1.0], InstanceData::IDENTITY),
        );
        let tints = [
            [0.9, 0.3, 0.2, 1.0],
            [0.3, 0.8, 0.3, 1.0],
            [0.2, 0.4, 0.9, 1.0],
        ];
        for (i, tint) in tints.into_iter().enumerate() {
            let x = (i as f32 - 1.0) * 2.0;
            let transform = math::rotation_y(angle + i as f32, [x, 0.5, 0.0]);
            layer.register_model(self.cube, InstanceData::new(tint, transform));
        }
    }
}

/// Lambert-lit material with a scene and an instance constant buffer.
fn lit_material(vertex_shader: VertexShaderId, pixel_shader: PixelShaderId) -> MaterialDesc {
    let mut material = MaterialDesc::new("Lit", vertex_shader, pixel_shader);
    material.input_layouts = vec![
        InputLayout::per_vertex("POSITION", InputFormat::R32G32B32Float, 0),
        InputLayout::per_vertex("NORMAL", InputFormat::R32G32B32Float, 12),
    ];
    material.constant_buffer_states = vec![
        ConstantBufferState {
            enabled: true,
            shader_visibility: ShaderVisibility::All,
        };
        2
    ];
    material
}

#[derive(Default)]
struct DepthPassData {
    depth: RenderPassMutableResource,
}

#[derive(Default)]
struct MainPassData {
    color: RenderPassMutableResource,
    depth: RenderPassMutableResource,
}

/// Records depth prepass, main pass and present for one frame.
fn render_frame(
    renderer: &mut Renderer<WgpuBackend>,
    scene: &mut Scene,
    window: &dyn Window,
    show_depth: bool,
) -> Result<()> {
    let prepass_desc = GraphicsPipelineDesc {
        debug_name: "DepthPrepass".into(),
        states: scene.prepass_states,
        ..Default::default()
    };

    let mut main_desc = MaterialPipelineDesc::new("Lit", scene.material);
    main_desc.depth_stencil_state.depth_enable = true;
    main_desc.depth_stencil_state.depth_func = ComparisonFunc::LessEqual;

    let Scene {
        color,
        depth,
        scene_constants,
        prepass_instances,
        main_instances,
        ..
    } = scene;
    let (color, depth) = (*color, *depth);

    let window_handle = window.handle();
    let scene_constants = &*scene_constants;
    let mut graph = RenderGraph::<WgpuBackend>::new();

    graph.add_pass(
        "DepthPrepass",
        move |data: &mut DepthPassData, builder| {
            data.depth = builder.write(depth, WriteMode::RenderTarget, LoadMode::Clear);
            Ok(true)
        },
        move |data: &DepthPassData, ctx| {
            let mut desc = prepass_desc.clone();
            desc.depth_stencil = data.depth;
            let pipeline = ctx.create_graphics_pipeline(&desc)?;
            ctx.set_full_viewport(data.depth)?;
            let commands = ctx.commands();
            commands.set_graphics_pipeline(pipeline);
            commands.set_constant_buffer(SCENE_SLOT, scene_constants);
            ctx.draw_render_layer(OPAQUE_LAYER, INSTANCE_SLOT, prepass_instances);
            Ok(())
        },
    );

    graph.add_pass(
        "Main",
        move |data: &mut MainPassData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Clear);
            data.depth = builder.write(depth, WriteMode::RenderTarget, LoadMode::Load);
            Ok(true)
        },
        move |data: &MainPassData, ctx| {
            let mut desc = main_desc.clone();
            desc.render_targets[0] = data.color;
            desc.depth_stencil = data.depth;
            let pipeline = ctx.create_material_pipeline(&desc)?;
            ctx.set_full_viewport(data.color)?;
            let commands = ctx.commands();
            commands.push_marker([0.2, 0.6, 1.0, 1.0], "Opaque");
            commands.set_graphics_pipeline(pipeline);
            commands.set_constant_buffer(SCENE_SLOT, scene_constants);
            ctx.draw_render_layer(OPAQUE_LAYER, INSTANCE_SLOT, main_instances);
            ctx.commands().pop_marker();
            Ok(())
        },
    );

    graph.add_pass(
        "Present",
        move |_: &mut (), builder| {
            if show_depth {
                builder.read(depth, ShaderStage::PIXEL);
            } else {
                builder.read(color, ShaderStage::PIXEL);
            }
            Ok(true)
        },
        move |_: &(), ctx| {
            if show_depth {
                ctx.commands().present_depth_image(window_handle, depth);
            } else {
                ctx.commands().present_image(window_handle, color);
            }
            Ok(())
        },
    );

    renderer.begin_frame()?;
    graph.setup(renderer)?;
    graph.execute(renderer)?;
    renderer.end_frame();
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();

    let options = Options::parse();
    let settings = RenderSettings {
        window_width: options.width,
        window_height: options.height,
        ..Default::default()
    };
    let backend = WgpuBackend::new(&settings)?;
    log::info!("Sandbox: Running on {}", backend.adapter_name());

    let frame_buffers = settings.frames_in_flight;
    let window = OffscreenWindow::new(settings.window_width, settings.window_height, frame_buffers);
    let mut renderer = Renderer::new(backend, settings)?;
    renderer.init_window(&window)?;

    let mut scene = Scene::create(&mut renderer)?;
    for frame in 0..options.frames {
        scene.update(&mut renderer, frame);
        render_frame(&mut renderer, &mut scene, &window, options.show_depth)?;
    }
    renderer.wait_idle()?;

    log::info!(
        "Sandbox: Rendered {} frames with {} graphics pipelines",
        options.frames,
        renderer.pipelines().graphics_pipeline_count()
    );

    let capture: image::RgbaImage = renderer.backend().read_back(window.handle())?;
    capture
        .save_with_format(&options.output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", options.output.display()))?;
    log::info!("Sandbox: Wrote {}", options.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn options_definition_is_consistent() {
        Options::command().debug_assert();
    }

    #[test]
    fn options_default_and_override() {
        let defaults = Options::try_parse_from(["sandbox"]).unwrap();
        assert_eq!(defaults.frames, 8);
        assert!(!defaults.show_depth);
        assert_eq!((defaults.width, defaults.height), (800, 600));

        let options =
            Options::try_parse_from(["sandbox", "--frames", "2", "--depth", "--output", "d.png"])
                .unwrap();
        assert_eq!(options.frames, 2);
        assert!(options.show_depth);
        assert_eq!(options.output, PathBuf::from("d.png"));
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        assert!(Options::try_parse_from(["sandbox", "--width", "0"]).is_err());
        assert!(Options::try_parse_from(["sandbox", "--frames", "many"]).is_err());
    }
}
