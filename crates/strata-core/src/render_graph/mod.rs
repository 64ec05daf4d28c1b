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

//! Frame-scoped render graph: passes declare their resource usage during setup
//! and record commands during execution.

mod builder;
mod context;
mod dependency;
mod graph;
mod resource;

pub use self::builder::{
    LoadMode, PassReadable, PassResourceUsage, PassWritable, RenderPassBuilder, ResourceCatalog,
    ResourceRead, ResourceWrite, ShaderStage, WriteMode,
};
pub use self::context::PassContext;
pub use self::dependency::{analyze_dependencies, parallel_batches, DependencyKind, PassDependency};
pub use self::graph::RenderGraph;
pub use self::resource::{
    BoundResource, RenderPassMutableResource, RenderPassResource, ResourceClass, ResourceLookup,
    ResourceResolver,
};
