//! Happens-before relations graph.
//!
//! The execution engine records one edge per causal relation it commits
//! (a read observing a write, a synchronization edge, the position of an
//! action in the sequential-consistency order). After the detector has
//! confirmed a race, the graph answers "how far apart were the two
//! accesses causally" — a number for the report, and optionally the
//! concrete short paths for a verbose explanation.
//!
//! Both queries run only after a race is confirmed, never per access, so
//! they are written for clarity rather than throughput. In particular the
//! path enumeration copies its visited set and partial path at every
//! branch on purpose: enumerating *all* simple paths is what the output
//! format needs, and the call volume is a handful per finding.

use crate::action::ActionRef;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Why one action is ordered before another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// The target read observed the source write.
    ReadFrom,
    /// A synchronizes-with / happens-before edge.
    HappensBefore,
    /// Adjacency in the sequential-consistency order.
    SequentialConsistency,
}

/// A directed, typed edge out of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationEdge {
    pub kind: RelationKind,
    pub to: ActionRef,
}

/// A path through the graph: `nodes` from source to destination inclusive,
/// with `kinds[i]` labeling the edge from `nodes[i]` to `nodes[i + 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPath {
    pub nodes: Vec<ActionRef>,
    pub kinds: Vec<RelationKind>,
}

impl RelationPath {
    /// Number of edges on the path.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Append-only graph of causal relations between committed actions.
#[derive(Debug, Default)]
pub struct RelationsGraph {
    edges: HashMap<ActionRef, Vec<RelationEdge>>,
}

impl RelationsGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directed edge. Safe to call for a source node that has no
    /// prior edges.
    pub fn add_edge(&mut self, from: ActionRef, edge: RelationEdge) {
        self.edges.entry(from).or_default().push(edge);
    }

    /// Number of nodes with at least one outgoing edge.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of edges recorded.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Length of the shortest edge path from `from` to `to`, or `None` if
    /// no path exists. The distance from a node to itself is 0.
    ///
    /// Dijkstra over unit-weight edges with a min-heap keyed by
    /// accumulated distance.
    pub fn min_distance_between(&self, from: ActionRef, to: ActionRef) -> Option<usize> {
        let mut best: HashMap<ActionRef, usize> = HashMap::new();
        let mut heap = BinaryHeap::new();
        heap.push(Reverse((0usize, from)));

        while let Some(Reverse((dist, node))) = heap.pop() {
            if node == to {
                return Some(dist);
            }
            if let Some(&known) = best.get(&node) {
                if dist > known {
                    continue;
                }
            }
            let edges = match self.edges.get(&node) {
                Some(edges) => edges,
                None => continue,
            };
            for edge in edges {
                let next = dist + 1;
                let entry = best.entry(edge.to).or_insert(usize::MAX);
                if next < *entry {
                    *entry = next;
                    heap.push(Reverse((next, edge.to)));
                }
            }
        }

        None
    }

    /// All simple paths from `from` to `to` with at most `k` edges.
    pub fn all_paths_shorter_than(
        &self,
        from: ActionRef,
        to: ActionRef,
        k: usize,
    ) -> Vec<RelationPath> {
        let mut result = Vec::new();
        self.collect_paths(from, to, k, HashSet::new(), RelationPath::default(), &mut result);
        result
    }

    /// Depth-first enumeration. `visited` and `path` are owned copies per
    /// branch; `path.nodes` holds the nodes strictly before `from`.
    fn collect_paths(
        &self,
        from: ActionRef,
        to: ActionRef,
        k: usize,
        mut visited: HashSet<ActionRef>,
        mut path: RelationPath,
        result: &mut Vec<RelationPath>,
    ) {
        if from == to {
            path.nodes.push(to);
            result.push(path);
            return;
        }
        if path.nodes.len() == k {
            return;
        }

        visited.insert(from);
        path.nodes.push(from);

        let edges = match self.edges.get(&from) {
            Some(edges) => edges,
            None => return,
        };
        for edge in edges {
            if visited.contains(&edge.to) {
                continue;
            }
            let mut branch = path.clone();
            branch.kinds.push(edge.kind);
            self.collect_paths(edge.to, to, k, visited.clone(), branch, result);
        }
    }
}
