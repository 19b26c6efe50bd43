//! Topological sort over named nodes.
//!
//! The graph maps each node to the set of nodes it depends on. Output is
//! dependency-first: a node never appears before any of its dependencies.
//! Among nodes that are ready at the same time, the one ranked first by the
//! caller's preferred order wins; unranked nodes follow by name.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use tracing::warn;

use crate::error::CycleError;

/// Node name -> names of the nodes it depends on.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Sorts `graph` into a single dependency-first order, breaking ties by name.
///
/// Dependencies that are not keys of `graph` are treated as leaf nodes and are
/// included in the output.
///
/// # Errors
///
/// Returns a [`CycleError`] naming every node that could not be ordered.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>, CycleError> {
    topological_sort_by(graph, &[])
}

/// Sorts `graph` like [`topological_sort`], breaking ties by position in
/// `preferred`.
///
/// Names in `preferred` that are not part of the graph are ignored; graph
/// nodes missing from `preferred` rank after every listed node.
pub fn topological_sort_by(
    graph: &DependencyGraph,
    preferred: &[String],
) -> Result<Vec<String>, CycleError> {
    let mut all: BTreeSet<&str> = graph.keys().map(String::as_str).collect();
    for deps in graph.values() {
        all.extend(deps.iter().map(String::as_str));
    }

    // Index == rank, so the heap below pops the preferred node first.
    let mut names: Vec<&str> = Vec::with_capacity(all.len());
    for name in preferred {
        if all.remove(name.as_str()) {
            names.push(name.as_str());
        }
    }
    names.extend(all);
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let n = names.len();

    // Build adjacency / in-degree tables.
    let mut in_degree: Vec<usize> = vec![0; n];
    let mut dependents: Vec<Vec<usize>> = vec![vec![]; n];

    for (node, deps) in graph {
        let i = index[node.as_str()];
        for dep in deps {
            let d = index[dep.as_str()];
            if d == i {
                warn!(node = %node, "Node depends on itself, edge ignored");
                continue;
            }
            dependents[d].push(i);
            in_degree[i] += 1;
        }
    }

    // Kahn's algorithm, always taking the lowest-ranked ready node.
    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..n).filter(|&i| in_degree[i] == 0).map(Reverse).collect();
    let mut order: Vec<String> = Vec::with_capacity(n);

    while let Some(Reverse(i)) = ready.pop() {
        order.push(names[i].to_string());
        for &j in &dependents[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }

    if order.len() != n {
        let mut nodes: Vec<String> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| names[i].to_string())
            .collect();
        nodes.sort();
        return Err(CycleError { nodes });
    }

    Ok(order)
}
