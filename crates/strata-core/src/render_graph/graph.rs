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

//! The frame-scoped render graph.
//!
//! A graph goes through three states each frame:
//!
//! ```text
//! add_pass()*  →  setup(renderer)  →  [ execute(renderer) ]*
//! ```
//!
//! `setup` runs every declared pass's setup callback in declaration order and
//! keeps the passes that asked to run. `execute` replays those passes, still in
//! declaration order, each into its own command list.

use super::builder::{LoadMode, PassResourceUsage, RenderPassBuilder, ResourceCatalog};
use super::context::PassContext;
use super::dependency::{analyze_dependencies, parallel_batches, PassDependency};
use super::resource::{ResourceClass, ResourceLookup, ResourceResolver};
use crate::graph::CycleError;
use crate::renderer::api::DepthClearFlags;
use crate::renderer::command_list::CommandList;
use crate::renderer::error::RenderError;
use crate::renderer::resource_handler::ResourceHandler;
use crate::renderer::traits::RenderBackend;
use crate::renderer::Renderer;

/// The type-erased callbacks and data of one pass.
trait PassNode<B: RenderBackend> {
    fn setup(&mut self, builder: &mut RenderPassBuilder<'_>) -> Result<bool, RenderError>;

    fn execute(&mut self, context: &mut PassContext<'_, B>) -> Result<(), RenderError>;
}

struct CallbackPass<D, S, E> {
    data: D,
    setup: S,
    execute: E,
}

impl<B, D, S, E> PassNode<B> for CallbackPass<D, S, E>
where
    B: RenderBackend,
    S: FnMut(&mut D, &mut RenderPassBuilder<'_>) -> Result<bool, RenderError>,
    E: FnMut(&D, &mut PassContext<'_, B>) -> Result<(), RenderError>,
{
    fn setup(&mut self, builder: &mut RenderPassBuilder<'_>) -> Result<bool, RenderError> {
        (self.setup)(&mut self.data, builder)
    }

    fn execute(&mut self, context: &mut PassContext<'_, B>) -> Result<(), RenderError> {
        (self.execute)(&self.data, context)
    }
}

struct PassSlot<'frame, B: RenderBackend> {
    name: String,
    node: Box<dyn PassNode<B> + 'frame>,
    usage: PassResourceUsage,
    enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphState {
    Declared,
    Compiled,
    Abandoned,
}

/// A list of passes for one frame.
///
/// Pass callbacks may borrow anything that outlives `'frame`; the graph and all
/// pass data are dropped together at the end of the frame.
pub struct RenderGraph<'frame, B: RenderBackend> {
    passes: Vec<PassSlot<'frame, B>>,
    lookup: ResourceLookup,
    state: GraphState,
}

impl<'frame, B: RenderBackend> Default for RenderGraph<'frame, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'frame, B: RenderBackend> RenderGraph<'frame, B> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            lookup: ResourceLookup::default(),
            state: GraphState::Declared,
        }
    }

    /// Declares a pass.
    ///
    /// ## Arguments
    ///
    /// * `name`: used in logs and errors only.
    /// * `setup`: declares the pass's reads and writes; returns whether the pass
    ///   runs this frame.
    /// * `execute`: records the pass's commands.
    ///
    /// Declaring a pass after [`RenderGraph::setup`] requires setting up again.
    pub fn add_pass<D, S, E>(&mut self, name: impl Into<String>, setup: S, execute: E)
    where
        D: Default + 'frame,
        S: FnMut(&mut D, &mut RenderPassBuilder<'_>) -> Result<bool, RenderError> + 'frame,
        E: FnMut(&D, &mut PassContext<'_, B>) -> Result<(), RenderError> + 'frame,
    {
        self.passes.push(PassSlot {
            name: name.into(),
            node: Box::new(CallbackPass {
                data: D::default(),
                setup,
                execute,
            }),
            usage: PassResourceUsage::default(),
            enabled: false,
        });
        self.state = GraphState::Declared;
    }

    /// Runs every setup callback against the renderer's resources.
    ///
    /// ## Errors
    ///
    /// [`RenderError::PassSetupFailed`] naming the first pass whose callback
    /// failed or declared an unknown resource. No pass is enabled afterwards.
    pub fn setup(&mut self, renderer: &Renderer<B>) -> Result<(), RenderError> {
        self.setup_with_catalog(renderer.resources())
    }

    /// [`RenderGraph::setup`] against any set of known resources.
    pub fn setup_with_catalog(&mut self, catalog: &dyn ResourceCatalog) -> Result<(), RenderError> {
        self.lookup = ResourceLookup::default();
        for index in 0..self.passes.len() {
            let slot = &mut self.passes[index];
            let mut builder = RenderPassBuilder::new(&slot.name, &mut self.lookup, catalog);
            let outcome = slot
                .node
                .setup(&mut builder)
                .and_then(|enabled| builder.finish().map(|usage| (enabled, usage)));
            match outcome {
                Ok((enabled, usage)) => {
                    log::debug!(
                        "RenderGraph: Pass '{}' {} ({} reads, {} writes)",
                        slot.name,
                        if enabled { "enabled" } else { "skipped" },
                        usage.reads.len(),
                        usage.writes.len()
                    );
                    slot.enabled = enabled;
                    slot.usage = usage;
                }
                Err(source) => {
                    log::error!("RenderGraph: Setup of pass '{}' failed: {}", slot.name, source);
                    let pass = slot.name.clone();
                    for slot in &mut self.passes {
                        slot.enabled = false;
                    }
                    self.state = GraphState::Abandoned;
                    return Err(RenderError::PassSetupFailed {
                        pass,
                        source: Box::new(source),
                    });
                }
            }
        }
        self.state = GraphState::Compiled;
        Ok(())
    }

    /// Records every enabled pass, then submits the recorded lists in
    /// declaration order.
    ///
    /// A pass failing with [`RenderError::PipelineCompilationFailed`] is skipped
    /// with a warning; any other error aborts the frame before anything is
    /// submitted.
    pub fn execute(&mut self, renderer: &mut Renderer<B>) -> Result<(), RenderError> {
        if self.state != GraphState::Compiled {
            return Err(RenderError::GraphNotCompiled);
        }
        let Self { passes, lookup, .. } = self;
        let mut recorded = Vec::with_capacity(passes.len());
        for slot in passes.iter_mut().filter(|slot| slot.enabled) {
            let mut commands = CommandList::new(slot.name.clone());
            record_clears(&slot.usage, lookup, renderer.resources(), &mut commands)?;

            let mut context = PassContext::new(renderer, lookup, &slot.name, commands);
            let outcome = slot.node.execute(&mut context);
            let commands = context.into_commands();

            match outcome {
                Ok(()) => {
                    if let Err(err) = commands.validate_markers() {
                        log::error!("RenderGraph: Pass '{}' failed: {}", slot.name, err);
                        return Err(err);
                    }
                    recorded.push(commands);
                }
                Err(RenderError::PipelineCompilationFailed { label, details }) => {
                    log::warn!(
                        "RenderGraph: Skipping pass '{}', pipeline '{}' failed to compile: {}",
                        slot.name,
                        label,
                        details
                    );
                }
                Err(err) => {
                    log::error!("RenderGraph: Pass '{}' failed: {}", slot.name, err);
                    return Err(err);
                }
            }
        }

        for commands in recorded {
            renderer.submit(commands)?;
        }
        Ok(())
    }

    /// Number of declared passes.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Whether the graph was set up successfully since the last declaration.
    pub fn is_compiled(&self) -> bool {
        self.state == GraphState::Compiled
    }

    /// Names of the passes enabled by the last setup, in execution order.
    pub fn enabled_passes(&self) -> impl Iterator<Item = &str> {
        self.passes
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.name.as_str())
    }

    /// The resources the pass at `index` declared during setup.
    pub fn usage(&self, index: usize) -> Option<&PassResourceUsage> {
        self.passes.get(index).map(|slot| &slot.usage)
    }

    /// The token tables filled by the last setup.
    pub fn lookup(&self) -> &ResourceLookup {
        &self.lookup
    }

    /// Hazards between enabled passes. Pass indices count enabled passes only.
    pub fn dependencies(&self) -> Vec<PassDependency> {
        analyze_dependencies(
            self.passes
                .iter()
                .filter(|slot| slot.enabled)
                .map(|slot| &slot.usage),
        )
    }

    /// Enabled passes grouped into batches that do not depend on each other.
    pub fn parallel_batches(&self) -> Result<Vec<Vec<usize>>, CycleError> {
        let count = self.passes.iter().filter(|slot| slot.enabled).count();
        parallel_batches(count, &self.dependencies())
    }
}

/// Records the clears a pass asked for with [`LoadMode::Clear`].
fn record_clears<B: RenderBackend>(
    usage: &PassResourceUsage,
    lookup: &ResourceLookup,
    resources: &ResourceHandler<B>,
    commands: &mut CommandList,
) -> Result<(), RenderError> {
    for write in usage
        .writes
        .iter()
        .filter(|write| write.load_mode == LoadMode::Clear)
    {
        match write.resource.class() {
            ResourceClass::DepthImage => {
                let id = lookup.resolve_depth_image(write.resource)?;
                let desc = resources.depth_image_desc(id)?;
                let flags = if desc.format.has_stencil() {
                    DepthClearFlags::BOTH
                } else {
                    DepthClearFlags::DEPTH
                };
                commands.clear_depth_image(
                    id,
                    flags,
                    desc.depth_clear_value,
                    desc.stencil_clear_value,
                );
            }
            _ => {
                let id = lookup.resolve_image(write.resource)?;
                commands.clear_image(id, resources.image_desc(id)?.clear_color);
            }
        }
    }
    Ok(())
}
