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

//! Kahn's algorithm over a generic directed graph.
//!
//! The grouping is stable: among nodes that become ready at the same time, the
//! one that appeared first in `nodes` comes first. The render graph relies on
//! this so that batches derived from dependencies never permute passes that
//! had no reason to move.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// An error indicating that a cycle was detected in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError;

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the dependency graph contains a cycle")
    }
}

impl std::error::Error for CycleError {}

struct Prepared<T> {
    nodes: Vec<T>,
    children: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

fn prepare<T>(
    nodes: impl IntoIterator<Item = T>,
    edges: impl IntoIterator<Item = (T, T)>,
) -> Prepared<T>
where
    T: Copy + Eq + Hash,
{
    let nodes: Vec<T> = nodes.into_iter().collect();
    let position: HashMap<T, usize> = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut children = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for (parent, child) in edges {
        // Edges touching unknown nodes are ignored.
        if let (Some(&p), Some(&c)) = (position.get(&parent), position.get(&child)) {
            children[p].push(c);
            in_degree[c] += 1;
        }
    }

    Prepared {
        nodes,
        children,
        in_degree,
    }
}

/// Groups the nodes into levels: every node of level `n + 1` depends on at
/// least one node of level `n`, and nodes inside one level are independent.
///
/// Each level keeps the input order of its nodes.
pub fn topological_levels<T>(
    nodes: impl IntoIterator<Item = T>,
    edges: impl IntoIterator<Item = (T, T)>,
) -> Result<Vec<Vec<T>>, CycleError>
where
    T: Copy + Eq + Hash,
{
    let Prepared {
        nodes,
        children,
        mut in_degree,
    } = prepare(nodes, edges);

    let mut current: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut levels = Vec::new();
    let mut visited = 0;

    while !current.is_empty() {
        visited += current.len();
        let mut next = Vec::new();
        for &node in &current {
            for &child in &children[node] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    next.push(child);
                }
            }
        }
        next.sort_unstable();
        levels.push(current.iter().map(|&i| nodes[i]).collect());
        current = next;
    }

    if visited != nodes.len() {
        Err(CycleError)
    } else {
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_nodes_keep_their_order() {
        let levels = topological_levels([3, 1, 2], []).unwrap();
        assert_eq!(levels, vec![vec![3, 1, 2]]);
    }

    #[test]
    fn dependencies_move_children_after_parents() {
        let levels = topological_levels(["b", "a", "c"], [("a", "b")]).unwrap();
        assert_eq!(levels, vec![vec!["a", "c"], vec!["b"]]);
    }

    #[test]
    fn cycles_are_reported() {
        assert_eq!(
            topological_levels([1, 2, 3], [(1, 2), (2, 3), (3, 1)]),
            Err(CycleError)
        );
        assert_eq!(topological_levels([1, 2], [(1, 2), (2, 1)]), Err(CycleError));
    }

    #[test]
    fn levels_group_independent_nodes() {
        // 0 -> 2, 1 -> 2, 2 -> 3
        let levels = topological_levels([0, 1, 2, 3], [(0, 2), (1, 2), (2, 3)]).unwrap();
        assert_eq!(levels, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn empty_graph_is_fine() {
        assert!(topological_levels::<u8>([], []).unwrap().is_empty());
    }
}
