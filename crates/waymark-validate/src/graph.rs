//! Dependency graph validation
//!
//! Logic units depend on each other through `invokes` and `composed_of`
//! references. [`DependencyGraph`] holds those edges by name and answers
//! cycle and ordering queries on demand.

use crate::error::GraphError;
use indexmap::{IndexMap, IndexSet};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashSet;

/// Directed "depends on" graph over named nodes
///
/// Edges to names that were never added as nodes are dangling: they are
/// kept, but traversal treats the target as a leaf.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    adjacency: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its outgoing edges
    ///
    /// Re-adding a node replaces its edges.
    pub fn add_node<I, S>(&mut self, name: impl Into<String>, depends_on: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adjacency
            .insert(name.into(), depends_on.into_iter().map(Into::into).collect());
    }

    /// Check whether a node was added
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Outgoing edges of a node (empty for dangling or unknown names)
    #[must_use]
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.adjacency.get(name).map_or(&[], Vec::as_slice)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges, dangling included
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Edges whose target was never added
    #[must_use]
    pub fn dangling_edges(&self) -> Vec<(String, String)> {
        self.adjacency
            .iter()
            .flat_map(|(from, deps)| {
                deps.iter()
                    .filter(|to| !self.adjacency.contains_key(to.as_str()))
                    .map(move |to| (from.clone(), to.clone()))
            })
            .collect()
    }

    /// Check whether a cycle is reachable from `start`
    #[inline]
    #[must_use]
    pub fn has_cycle(&self, start: &str) -> bool {
        self.find_cycle(start).is_some()
    }

    /// First cycle reachable from `start`, as a path that ends where it began
    ///
    /// Depth-first search with two sets: `path` holds the nodes on the current
    /// search stack, `visited` the nodes fully explored without finding a
    /// cycle. Reaching a node on `path` closes a cycle.
    #[must_use]
    pub fn find_cycle(&self, start: &str) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = IndexSet::new();
        self.visit(start, &mut visited, &mut path)
    }

    // Explicit stack of (node, next dependency index); depth is bounded by
    // the heap, not the thread stack.
    fn visit<'a>(
        &'a self,
        start: &'a str,
        visited: &mut HashSet<&'a str>,
        path: &mut IndexSet<&'a str>,
    ) -> Option<Vec<String>> {
        if visited.contains(start) {
            return None;
        }

        let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];
        path.insert(start);

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            let Some(dependency) = self.dependencies(node).get(*next) else {
                stack.pop();
                path.pop();
                visited.insert(node);
                continue;
            };
            *next += 1;
            let dependency = dependency.as_str();

            if let Some(position) = path.get_index_of(dependency) {
                let mut cycle: Vec<String> = path
                    .iter()
                    .skip(position)
                    .map(|n| (*n).to_string())
                    .collect();
                cycle.push(dependency.to_string());
                return Some(cycle);
            }
            if visited.contains(dependency) {
                continue;
            }

            path.insert(dependency);
            stack.push((dependency, 0));
        }

        None
    }

    /// Fail with the first cycle found from any node
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] with the cycle path.
    pub fn ensure_acyclic(&self) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        for node in self.adjacency.keys() {
            let mut path = IndexSet::new();
            if let Some(cycle) = self.visit(node, &mut visited, &mut path) {
                return Err(GraphError::CycleDetected { path: cycle });
            }
        }
        Ok(())
    }

    /// Every added node lying on some cycle
    #[must_use]
    pub fn nodes_on_cycles(&self) -> Vec<String> {
        self.adjacency
            .keys()
            .filter(|node| self.reaches(node, node))
            .cloned()
            .collect()
    }

    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack: Vec<&str> = self.dependencies(from).iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if seen.insert(node) {
                stack.extend(self.dependencies(node).iter().map(String::as_str));
            }
        }

        false
    }

    /// Nodes ordered so every dependency precedes its dependents
    ///
    /// Dangling edges are ignored.
    ///
    /// # Errors
    /// Returns [`GraphError::CycleDetected`] if the graph is cyclic.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for index in 0..self.adjacency.len() {
            graph.add_node(index);
        }
        for (index, deps) in self.adjacency.values().enumerate() {
            for dep in deps {
                if let Some(dep_index) = self.adjacency.get_index_of(dep.as_str()) {
                    graph.add_edge(dep_index, index, ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|i| self.adjacency.get_index(i).map(|(name, _)| name.clone()))
                .collect()),
            Err(_) => {
                let path = self
                    .ensure_acyclic()
                    .err()
                    .map(|GraphError::CycleDetected { path }| path)
                    .unwrap_or_default();
                Err(GraphError::CycleDetected { path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.add_node("a", ["b"]);
        graph.add_node("b", ["c"]);
        graph.add_node("c", Vec::<String>::new());
        graph
    }

    #[test]
    fn acyclic_chain_has_no_cycle() {
        let graph = chain();
        for node in ["a", "b", "c"] {
            assert!(!graph.has_cycle(node));
        }
        assert!(graph.ensure_acyclic().is_ok());
    }

    #[test]
    fn back_edge_creates_cycle_for_every_member() {
        let mut graph = chain();
        graph.add_node("c", ["a"]);

        for node in ["a", "b", "c"] {
            assert!(graph.has_cycle(node), "{node} should be on the cycle");
        }
        assert_eq!(graph.find_cycle("a").unwrap(), ["a", "b", "c", "a"]);
    }

    fn long_chain(len: usize) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for i in 0..len {
            graph.add_node(format!("n{i}"), [format!("n{}", i + 1)]);
        }
        graph.add_node(format!("n{len}"), Vec::<String>::new());
        graph
    }

    #[test]
    fn deep_chain_does_not_exhaust_the_stack() {
        let mut graph = long_chain(150_000);
        assert!(!graph.has_cycle("n0"));
        assert!(graph.ensure_acyclic().is_ok());
        assert_eq!(graph.topological_order().unwrap().len(), 150_001);

        graph.add_node("n150000", ["n0"]);
        let cycle = graph.find_cycle("n0").unwrap();
        assert_eq!(cycle.len(), 150_002);
        assert_eq!(cycle.first(), cycle.last());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a", ["a"]);
        assert_eq!(graph.find_cycle("a").unwrap(), ["a", "a"]);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_node("top", ["left", "right"]);
        graph.add_node("left", ["bottom"]);
        graph.add_node("right", ["bottom"]);
        graph.add_node("bottom", Vec::<String>::new());

        assert!(!graph.has_cycle("top"));
    }

    #[test]
    fn dangling_reference_is_a_leaf() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a", ["ghost"]);

        assert!(!graph.has_cycle("a"));
        assert_eq!(graph.dangling_edges(), [("a".to_string(), "ghost".to_string())]);
    }

    #[test]
    fn unknown_start_has_no_cycle() {
        assert!(!chain().has_cycle("missing"));
    }

    #[test]
    fn nodes_on_cycles_excludes_upstream_nodes() {
        let mut graph = DependencyGraph::new();
        graph.add_node("entry", ["x"]);
        graph.add_node("x", ["y"]);
        graph.add_node("y", ["x"]);

        assert!(graph.has_cycle("entry"));
        assert_eq!(graph.nodes_on_cycles(), ["x", "y"]);
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let order = chain().topological_order().unwrap();
        let position = |n: &str| order.iter().position(|o| o == n).unwrap();

        assert!(position("c") < position("b"));
        assert!(position("b") < position("a"));
    }

    #[test]
    fn topological_order_rejects_cycles() {
        let mut graph = chain();
        graph.add_node("c", ["a"]);

        let result = graph.topological_order();
        assert!(matches!(result, Err(GraphError::CycleDetected { ref path }) if !path.is_empty()));
    }

    #[test]
    fn counts() {
        let graph = chain();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains("a"));
    }
}
