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

//! Integration tests for the render graph's setup and execute cycle.

mod common;

use common::{color_desc, depth_desc, renderer, take_events, Event, FakeBackend};
use std::cell::RefCell;
use strata_core::handle::ImageId;
use strata_core::render_graph::{
    DependencyKind, LoadMode, RenderGraph, RenderPassMutableResource, RenderPassResource,
    ResourceClass, ShaderStage, WriteMode,
};
use strata_core::renderer::api::{DepthClearFlags, GraphicsPipelineDesc, PrimitiveModel};
use strata_core::renderer::RenderError;

#[derive(Default)]
struct TargetData {
    color: RenderPassMutableResource,
    depth: RenderPassMutableResource,
}

#[derive(Default)]
struct ReadData {
    depth: RenderPassResource,
    color: RenderPassMutableResource,
}

fn count(log: &[Event], pred: impl Fn(&Event) -> bool) -> usize {
    log.iter().filter(|e| pred(e)).count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Enable / disable and ordering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_disabled_pass_never_executes() {
    let (mut renderer, log) = renderer();
    let executed = RefCell::new(Vec::new());

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Skipped",
        |_: &mut (), _builder| Ok(false),
        |_: &(), _ctx| {
            executed.borrow_mut().push("Skipped");
            Ok(())
        },
    );
    graph.add_pass(
        "Enabled",
        |_: &mut (), _builder| Ok(true),
        |_: &(), _ctx| {
            executed.borrow_mut().push("Enabled");
            Ok(())
        },
    );

    graph.setup(&renderer).unwrap();
    assert_eq!(graph.enabled_passes().collect::<Vec<_>>(), vec!["Enabled"]);
    graph.execute(&mut renderer).unwrap();

    assert_eq!(*executed.borrow(), vec!["Enabled"]);
    let events = take_events(&log);
    assert!(!events.contains(&Event::Begin("Skipped".to_string())));
    assert!(events.contains(&Event::Begin("Enabled".to_string())));
}

#[test]
fn test_enabled_passes_run_in_declaration_order() {
    let (mut renderer, log) = renderer();
    let executed = RefCell::new(Vec::new());

    let mut graph = RenderGraph::<FakeBackend>::new();
    for name in ["Shadow", "Depth", "Main", "Present"] {
        let executed = &executed;
        graph.add_pass(
            name,
            |_: &mut (), _builder| Ok(true),
            move |_: &(), ctx| {
                executed.borrow_mut().push(ctx.pass_name().to_string());
                Ok(())
            },
        );
    }
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    assert_eq!(*executed.borrow(), vec!["Shadow", "Depth", "Main", "Present"]);

    let submitted: Vec<String> = take_events(&log)
        .into_iter()
        .filter_map(|e| match e {
            Event::End { list, .. } => Some(list),
            _ => None,
        })
        .collect();
    assert_eq!(submitted, vec!["Shadow", "Depth", "Main", "Present"]);
}

#[test]
fn test_enabled_pass_runs_once_per_execute() {
    let (mut renderer, _log) = renderer();
    let runs = RefCell::new(0);

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Counted",
        |_: &mut (), _builder| Ok(true),
        |_: &(), _ctx| {
            *runs.borrow_mut() += 1;
            Ok(())
        },
    );
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();
    assert_eq!(*runs.borrow(), 1);
    graph.execute(&mut renderer).unwrap();
    assert_eq!(*runs.borrow(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure semantics
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_execute_without_setup_is_rejected() {
    let (mut renderer, log) = renderer();
    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass("Pass", |_: &mut (), _b| Ok(true), |_: &(), _ctx| Ok(()));

    assert!(matches!(
        graph.execute(&mut renderer),
        Err(RenderError::GraphNotCompiled)
    ));
    assert!(take_events(&log).is_empty());
}

#[test]
fn test_setup_failure_abandons_the_whole_frame() {
    let (mut renderer, log) = renderer();
    let executed = RefCell::new(0);

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "First",
        |_: &mut (), _b| Ok(true),
        |_: &(), _ctx| {
            *executed.borrow_mut() += 1;
            Ok(())
        },
    );
    graph.add_pass(
        "Broken",
        |_: &mut (), _b| Err(RenderError::Backend("setup exploded".to_string())),
        |_: &(), _ctx| {
            *executed.borrow_mut() += 1;
            Ok(())
        },
    );

    match graph.setup(&renderer) {
        Err(RenderError::PassSetupFailed { pass, .. }) => assert_eq!(pass, "Broken"),
        other => panic!("expected PassSetupFailed, got {other:?}"),
    }
    assert_eq!(graph.enabled_passes().count(), 0);
    assert!(graph.execute(&mut renderer).is_err());
    assert_eq!(*executed.borrow(), 0);
    assert!(take_events(&log).is_empty());
}

#[test]
fn test_declaring_an_unknown_image_fails_setup() {
    let (renderer, _log) = renderer();
    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Main",
        |data: &mut TargetData, builder| {
            data.color = builder.write(ImageId::new(42), WriteMode::RenderTarget, LoadMode::Load);
            assert!(!data.color.is_valid());
            Ok(true)
        },
        |_: &TargetData, _ctx| Ok(()),
    );

    let err = graph.setup(&renderer).unwrap_err();
    match err {
        RenderError::PassSetupFailed { pass, source } => {
            assert_eq!(pass, "Main");
            assert!(matches!(*source, RenderError::InvalidHandle { index: 42, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_pipeline_failure_skips_only_the_failing_pass() {
    let (mut renderer, log) = renderer();
    renderer
        .backend_mut()
        .rejected_pipelines
        .insert("Broken".to_string());
    let color = renderer.create_image(color_desc("Color", (64.0, 64.0))).unwrap();
    let vs = renderer.load_vertex_shader("shaders/mesh.vs").unwrap();
    let ps = renderer.load_pixel_shader("shaders/mesh.ps").unwrap();
    take_events(&log);

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Broken",
        move |data: &mut TargetData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Load);
            Ok(true)
        },
        move |data: &TargetData, ctx| {
            let mut desc = GraphicsPipelineDesc::new("Broken", vs, ps);
            desc.render_targets[0] = data.color;
            let pipeline = ctx.create_graphics_pipeline(&desc)?;
            ctx.commands().set_graphics_pipeline(pipeline);
            Ok(())
        },
    );
    graph.add_pass(
        "Healthy",
        move |data: &mut TargetData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Load);
            Ok(true)
        },
        |_: &TargetData, _ctx| Ok(()),
    );

    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    let events = take_events(&log);
    assert!(!events.contains(&Event::Begin("Broken".to_string())));
    assert!(events.contains(&Event::Begin("Healthy".to_string())));
}

#[test]
fn test_other_execute_errors_abort_the_frame() {
    let (mut renderer, log) = renderer();
    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Failing",
        |_: &mut (), _b| Ok(true),
        |_: &(), _ctx| Err(RenderError::Backend("lost track".to_string())),
    );
    graph.add_pass("Never", |_: &mut (), _b| Ok(true), |_: &(), _ctx| Ok(()));

    graph.setup(&renderer).unwrap();
    assert!(matches!(
        graph.execute(&mut renderer),
        Err(RenderError::Backend(_))
    ));
    assert!(!take_events(&log).contains(&Event::Begin("Never".to_string())));
}

#[test]
fn test_aborted_frame_submits_none_of_its_passes() {
    let (mut renderer, log) = renderer();
    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass("First", |_: &mut (), _b| Ok(true), |_: &(), _ctx| Ok(()));
    graph.add_pass(
        "Second",
        |_: &mut (), _b| Ok(true),
        |_: &(), _ctx| Err(RenderError::Backend("boom".to_string())),
    );

    graph.setup(&renderer).unwrap();
    renderer.begin_frame().unwrap();
    take_events(&log);
    assert!(matches!(
        graph.execute(&mut renderer),
        Err(RenderError::Backend(_))
    ));

    let events = take_events(&log);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::Begin(_) | Event::End { .. })),
        "aborted frame reached the queue: {events:?}"
    );
    assert_eq!(renderer.pacer().last_signaled(renderer.frame_index()), Some(0));

    // The slot is still usable once the frame is abandoned.
    renderer.end_frame();
    renderer.begin_frame().unwrap();
    renderer.end_frame();
    renderer.begin_frame().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Load modes and tokens
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_clear_load_mode_clears_before_the_pass_commands() {
    let (mut renderer, log) = renderer();
    let color = renderer.create_image(color_desc("Color", (32.0, 32.0))).unwrap();
    let depth = renderer
        .create_depth_image(depth_desc("Depth", (32.0, 32.0)))
        .unwrap();
    let model = renderer
        .create_model(&PrimitiveModel::Cube { size: 1.0 }.build())
        .unwrap();
    take_events(&log);

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Main",
        move |data: &mut TargetData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Clear);
            data.depth = builder.write(depth, WriteMode::RenderTarget, LoadMode::Clear);
            Ok(true)
        },
        move |_: &TargetData, ctx| {
            ctx.commands().draw(model);
            Ok(())
        },
    );
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    let events = take_events(&log);
    assert_eq!(events[0], Event::Begin("Main".to_string()));
    assert_eq!(
        events[1],
        Event::ClearImage {
            image: "Color".to_string(),
            color: [0.1, 0.2, 0.3, 1.0],
        }
    );
    assert_eq!(
        events[2],
        Event::ClearDepthImage {
            image: "Depth".to_string(),
            flags: DepthClearFlags::DEPTH,
            depth: 1.0,
            stencil: 0,
        }
    );
    assert!(matches!(events[3], Event::Draw { index_count: 36, .. }));
}

#[test]
fn test_load_mode_load_inserts_nothing() {
    let (mut renderer, log) = renderer();
    let color = renderer.create_image(color_desc("Color", (32.0, 32.0))).unwrap();
    take_events(&log);

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "Overlay",
        move |data: &mut TargetData, builder| {
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Load);
            Ok(true)
        },
        |_: &TargetData, _ctx| Ok(()),
    );
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    let events = take_events(&log);
    assert_eq!(count(&events, |e| matches!(e, Event::ClearImage { .. })), 0);
}

#[test]
fn test_same_image_yields_equal_tokens_across_passes() {
    let (mut renderer, _log) = renderer();
    let color = renderer.create_image(color_desc("Color", (8.0, 8.0))).unwrap();
    let tokens = RefCell::new(Vec::new());

    let mut graph = RenderGraph::<FakeBackend>::new();
    for name in ["Writer", "Reader"] {
        let tokens = &tokens;
        graph.add_pass(
            name,
            move |_: &mut (), builder| {
                let token = builder.write(color, WriteMode::RenderTarget, LoadMode::Load);
                tokens.borrow_mut().push(token);
                Ok(true)
            },
            move |_: &(), ctx| {
                let token = tokens.borrow()[0];
                assert_eq!(ctx.image(token).unwrap(), color);
                assert_eq!(ctx.extent(token).unwrap(), (8, 8));
                Ok(())
            },
        );
    }
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    let tokens = tokens.borrow();
    assert_eq!(tokens[0], tokens[1]);
    assert_eq!(graph.lookup().len(), 1);
}

#[test]
fn test_dependencies_group_independent_passes() {
    let (mut renderer, _log) = renderer();
    let color = renderer.create_image(color_desc("Color", (8.0, 8.0))).unwrap();
    let overlay = renderer.create_image(color_desc("Overlay", (8.0, 8.0))).unwrap();
    let depth = renderer
        .create_depth_image(depth_desc("Depth", (8.0, 8.0)))
        .unwrap();

    let mut graph = RenderGraph::<FakeBackend>::new();
    graph.add_pass(
        "DepthPrepass",
        move |data: &mut TargetData, builder| {
            data.depth = builder.write(depth, WriteMode::RenderTarget, LoadMode::Clear);
            Ok(true)
        },
        |_: &TargetData, _ctx| Ok(()),
    );
    graph.add_pass(
        "Overlay",
        move |data: &mut TargetData, builder| {
            data.color = builder.write(overlay, WriteMode::UnorderedAccess, LoadMode::Discard);
            Ok(true)
        },
        |_: &TargetData, _ctx| Ok(()),
    );
    graph.add_pass(
        "Main",
        move |data: &mut ReadData, builder| {
            data.depth = builder.read(depth, ShaderStage::PIXEL);
            data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Clear);
            Ok(true)
        },
        |_: &ReadData, _ctx| Ok(()),
    );
    graph.setup(&renderer).unwrap();

    let deps = graph.dependencies();
    assert_eq!(deps.len(), 1);
    assert_eq!((deps[0].from, deps[0].to), (0, 2));
    assert_eq!(deps[0].class, ResourceClass::DepthImage);
    assert_eq!(deps[0].kind, DependencyKind::ReadAfterWrite);

    let batches = graph.parallel_batches().unwrap();
    assert_eq!(batches, vec![vec![0, 1], vec![2]]);
}

#[test]
fn test_pipeline_created_in_two_passes_is_compiled_once() {
    let (mut renderer, log) = renderer();
    let color = renderer.create_image(color_desc("Color", (8.0, 8.0))).unwrap();
    let vs = renderer.load_vertex_shader("shaders/mesh.vs").unwrap();
    let ps = renderer.load_pixel_shader("shaders/mesh.ps").unwrap();
    let ids = RefCell::new(Vec::new());
    take_events(&log);

    let mut graph = RenderGraph::<FakeBackend>::new();
    for name in ["First", "Second"] {
        let ids = &ids;
        graph.add_pass(
            name,
            move |data: &mut TargetData, builder| {
                data.color = builder.write(color, WriteMode::RenderTarget, LoadMode::Load);
                Ok(true)
            },
            move |data: &TargetData, ctx| {
                let mut desc = GraphicsPipelineDesc::new(ctx.pass_name().to_string(), vs, ps);
                desc.render_targets[0] = data.color;
                ids.borrow_mut().push(ctx.create_graphics_pipeline(&desc)?);
                Ok(())
            },
        );
    }
    graph.setup(&renderer).unwrap();
    graph.execute(&mut renderer).unwrap();

    let ids = ids.borrow();
    assert_eq!(ids[0], ids[1]);
    let events = take_events(&log);
    assert_eq!(
        count(&events, |e| matches!(e, Event::CompileGraphicsPipeline(_))),
        1
    );
}
