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

//! Read/write dependencies between passes.
//!
//! Passes still execute in declaration order; the dependency graph exposes
//! which of them could run concurrently.

use super::builder::PassResourceUsage;
use super::resource::ResourceClass;
use crate::graph::{topological_levels, CycleError};
use ahash::AHashMap;

/// The hazard that orders two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// The later pass reads what the earlier one wrote.
    ReadAfterWrite,
    /// The later pass overwrites what the earlier one read.
    WriteAfterRead,
    /// Both passes write the same resource.
    WriteAfterWrite,
}

/// An ordering constraint between two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassDependency {
    /// Index of the pass that must run first.
    pub from: usize,
    /// Index of the pass that must run after it.
    pub to: usize,
    /// The class of the shared resource.
    pub class: ResourceClass,
    /// The lookup slot of the shared resource.
    pub slot: u16,
    /// The hazard.
    pub kind: DependencyKind,
}

#[derive(Default)]
struct ResourceHistory {
    last_writer: Option<usize>,
    readers_since_write: Vec<usize>,
}

/// Derives the dependencies between passes from their declared usage.
///
/// `usages[i]` is the usage of pass `i`; passes are assumed to run in index
/// order. Reads of a pass are considered before its writes.
pub fn analyze_dependencies<'a>(
    usages: impl IntoIterator<Item = &'a PassResourceUsage>,
) -> Vec<PassDependency> {
    let mut history: AHashMap<(ResourceClass, u16), ResourceHistory> = AHashMap::new();
    let mut dependencies = Vec::new();
    let mut push = |from: usize, to: usize, key: (ResourceClass, u16), kind| {
        let dependency = PassDependency {
            from,
            to,
            class: key.0,
            slot: key.1,
            kind,
        };
        if from != to && !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    };

    for (pass, usage) in usages.into_iter().enumerate() {
        for read in &usage.reads {
            let key = (read.resource.class(), read.resource.index());
            let entry = history.entry(key).or_default();
            if let Some(writer) = entry.last_writer {
                push(writer, pass, key, DependencyKind::ReadAfterWrite);
            }
            entry.readers_since_write.push(pass);
        }
        for write in &usage.writes {
            let key = (write.resource.class(), write.resource.index());
            let entry = history.entry(key).or_default();
            for &reader in &entry.readers_since_write {
                push(reader, pass, key, DependencyKind::WriteAfterRead);
            }
            if let Some(writer) = entry.last_writer {
                push(writer, pass, key, DependencyKind::WriteAfterWrite);
            }
            entry.last_writer = Some(pass);
            entry.readers_since_write.clear();
        }
    }
    dependencies
}

/// Groups `pass_count` passes into batches whose members are independent.
///
/// Every pass of batch `n + 1` depends on some pass of batch `n`.
pub fn parallel_batches(
    pass_count: usize,
    dependencies: &[PassDependency],
) -> Result<Vec<Vec<usize>>, CycleError> {
    topological_levels(
        0..pass_count,
        dependencies.iter().map(|dep| (dep.from, dep.to)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_graph::builder::{LoadMode, ResourceRead, ResourceWrite, ShaderStage, WriteMode};
    use crate::render_graph::resource::{RenderPassMutableResource, RenderPassResource};

    fn writes(class: ResourceClass, slot: u16) -> ResourceWrite {
        ResourceWrite {
            resource: RenderPassMutableResource::new(class, slot),
            write_mode: WriteMode::RenderTarget,
            load_mode: LoadMode::Load,
        }
    }

    fn reads(class: ResourceClass, slot: u16) -> ResourceRead {
        ResourceRead {
            resource: RenderPassResource::new(class, slot),
            stages: ShaderStage::PIXEL,
        }
    }

    #[test]
    fn prepass_then_main_then_present() {
        let depth = ResourceClass::DepthImage;
        let color = ResourceClass::Image;
        let usages = vec![
            PassResourceUsage {
                reads: vec![],
                writes: vec![writes(depth, 0)],
            },
            PassResourceUsage {
                reads: vec![reads(depth, 0)],
                writes: vec![writes(color, 0)],
            },
            PassResourceUsage {
                reads: vec![reads(color, 0)],
                writes: vec![],
            },
        ];
        let deps = analyze_dependencies(&usages);
        assert!(deps.iter().any(|d| d.from == 0
            && d.to == 1
            && d.kind == DependencyKind::ReadAfterWrite));
        assert!(deps.iter().any(|d| d.from == 1 && d.to == 2));
        assert_eq!(
            parallel_batches(3, &deps).unwrap(),
            vec![vec![0], vec![1], vec![2]]
        );
    }

    #[test]
    fn overwriting_a_read_resource_orders_the_passes() {
        let color = ResourceClass::Image;
        let usages = vec![
            PassResourceUsage {
                reads: vec![reads(color, 0)],
                writes: vec![],
            },
            PassResourceUsage {
                reads: vec![],
                writes: vec![writes(color, 0)],
            },
        ];
        let deps = analyze_dependencies(&usages);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].kind, DependencyKind::WriteAfterRead);
    }

    #[test]
    fn disjoint_passes_share_a_batch() {
        let usages = vec![
            PassResourceUsage {
                reads: vec![],
                writes: vec![writes(ResourceClass::Image, 0)],
            },
            PassResourceUsage {
                reads: vec![],
                writes: vec![writes(ResourceClass::Image, 1)],
            },
            PassResourceUsage {
                reads: vec![],
                writes: vec![writes(ResourceClass::Image, 0)],
            },
        ];
        let deps = analyze_dependencies(&usages);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].kind, DependencyKind::WriteAfterWrite);
        assert_eq!(
            parallel_batches(3, &deps).unwrap(),
            vec![vec![0, 1], vec![2]]
        );
    }
}
