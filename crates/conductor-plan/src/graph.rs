use std::collections::{HashMap, HashSet};

use crate::error::PlanError;

/// Directed graph over subtask ids, edges pointing from dependency to dependent.
///
/// Node insertion order is kept so that phase contents are deterministic.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
  /// Nodes in insertion order.
  order: Vec<String>,
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Number of distinct incoming edges per node.
  in_degree: HashMap<String, usize>,
  edges: HashSet<(String, String)>,
}

impl DependencyGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a graph from a node list and `(from, to)` edges.
  pub fn from_edges<'a>(
    nodes: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
  ) -> Self {
    let mut graph = Self::new();
    for node in nodes {
      graph.add_node(node);
    }
    for (from, to) in edges {
      graph.add_edge(from, to);
    }
    graph
  }

  /// Ensure a node exists. New nodes start with in-degree 0.
  pub fn add_node(&mut self, id: &str) {
    if self.in_degree.contains_key(id) {
      return;
    }
    self.order.push(id.to_string());
    self.in_degree.insert(id.to_string(), 0);
    self.adjacency.insert(id.to_string(), Vec::new());
    self.reverse_adjacency.insert(id.to_string(), Vec::new());
  }

  /// Add an edge `from -> to`. Duplicate edges are ignored.
  pub fn add_edge(&mut self, from: &str, to: &str) {
    self.add_node(from);
    self.add_node(to);

    if !self.edges.insert((from.to_string(), to.to_string())) {
      return;
    }

    self
      .adjacency
      .entry(from.to_string())
      .or_default()
      .push(to.to_string());
    self
      .reverse_adjacency
      .entry(to.to_string())
      .or_default()
      .push(from.to_string());
    *self.in_degree.entry(to.to_string()).or_default() += 1;
  }

  /// Partition the nodes into phases using Kahn's algorithm.
  ///
  /// Each phase holds every node whose incoming edges all come from earlier
  /// phases, in node insertion order. Nodes left over once no zero in-degree
  /// node remains sit on or behind a cycle.
  pub fn to_phases(&self) -> Result<Vec<Vec<String>>, PlanError> {
    let mut in_degree = self.in_degree.clone();
    let mut resolved: HashSet<&str> = HashSet::with_capacity(self.order.len());
    let mut phases = Vec::new();

    let mut current: Vec<&str> = self
      .order
      .iter()
      .filter(|id| in_degree.get(*id).copied() == Some(0))
      .map(String::as_str)
      .collect();

    while !current.is_empty() {
      for id in &current {
        resolved.insert(*id);
        for next in self.downstream(id) {
          if let Some(degree) = in_degree.get_mut(next) {
            *degree = degree.saturating_sub(1);
          }
        }
      }

      let next_phase: Vec<&str> = self
        .order
        .iter()
        .map(String::as_str)
        .filter(|id| !resolved.contains(id))
        .filter(|id| in_degree.get(*id).copied() == Some(0))
        .collect();

      phases.push(current.iter().map(|id| id.to_string()).collect());
      current = next_phase;
    }

    if resolved.len() < self.order.len() {
      let mut nodes: Vec<String> = self
        .order
        .iter()
        .filter(|id| !resolved.contains(id.as_str()))
        .cloned()
        .collect();
      nodes.sort();
      return Err(PlanError::Cycle { nodes });
    }

    Ok(phases)
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, id: &str) -> &[String] {
    self
      .adjacency
      .get(id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn phase_index(phases: &[Vec<String>], id: &str) -> usize {
    phases
      .iter()
      .position(|phase| phase.iter().any(|n| n == id))
      .unwrap_or_else(|| panic!("node {} missing from phases", id))
  }

  #[test]
  fn test_add_node_is_idempotent() {
    let mut graph = DependencyGraph::new();
    graph.add_node("a");
    graph.add_edge("b", "a");
    graph.add_node("a");

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.upstream("a"), &["b".to_string()]);
  }

  #[test]
  fn test_duplicate_edge_counts_once() {
    let mut graph = DependencyGraph::new();
    graph.add_edge("a", "b");
    graph.add_edge("a", "b");

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.downstream("a").len(), 1);

    // A doubled in-degree would leave `b` unresolved and report a cycle.
    let phases = graph.to_phases().unwrap();
    assert_eq!(phases, vec![vec!["a".to_string()], vec!["b".to_string()]]);
  }

  #[test]
  fn test_diamond_phases() {
    let graph = DependencyGraph::from_edges(
      ["a", "b", "c", "d"],
      [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );

    let phases = graph.to_phases().unwrap();
    assert_eq!(
      phases,
      vec![
        vec!["a".to_string()],
        vec!["b".to_string(), "c".to_string()],
        vec!["d".to_string()],
      ]
    );
  }

  #[test]
  fn test_phases_respect_every_edge() {
    let edges = [
      ("n1", "n4"),
      ("n2", "n4"),
      ("n4", "n6"),
      ("n3", "n5"),
      ("n5", "n6"),
      ("n1", "n6"),
      ("n6", "n7"),
      ("n2", "n7"),
    ];
    let graph =
      DependencyGraph::from_edges(["n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8"], edges);

    let phases = graph.to_phases().unwrap();

    for (from, to) in edges {
      assert!(phase_index(&phases, from) < phase_index(&phases, to));
    }

    let mut all: Vec<&String> = phases.iter().flatten().collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 8);
    assert_eq!(phases.iter().map(Vec::len).sum::<usize>(), 8);
  }

  #[test]
  fn test_isolated_nodes_share_first_phase() {
    let graph = DependencyGraph::from_edges(["x", "y", "z"], []);
    let phases = graph.to_phases().unwrap();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0], vec!["x", "y", "z"]);
  }

  #[test]
  fn test_empty_graph_has_no_phases() {
    let graph = DependencyGraph::new();
    assert!(graph.to_phases().unwrap().is_empty());
  }

  #[test]
  fn test_cycle_names_unresolved_nodes() {
    let graph = DependencyGraph::from_edges(
      ["root", "a", "b", "c", "after"],
      [("root", "a"), ("a", "b"), ("b", "c"), ("c", "a"), ("c", "after")],
    );

    let result = graph.to_phases();
    match result {
      Err(PlanError::Cycle { nodes }) => {
        assert!(nodes.contains(&"a".to_string()));
        assert!(nodes.contains(&"b".to_string()));
        assert!(nodes.contains(&"c".to_string()));
        assert!(!nodes.contains(&"root".to_string()));
      }
      other => panic!("expected cycle error, got {:?}", other),
    }
  }

  #[test]
  fn test_self_loop_is_cycle() {
    let graph = DependencyGraph::from_edges(["a"], [("a", "a")]);
    assert_eq!(
      graph.to_phases(),
      Err(PlanError::Cycle {
        nodes: vec!["a".to_string()]
      })
    );
  }

  #[test]
  fn test_rebuild_from_same_edges_is_deterministic() {
    let nodes = ["t1", "t2", "t3", "t4", "t5"];
    let edges = [("t1", "t3"), ("t2", "t3"), ("t3", "t5"), ("t4", "t5")];

    let first = DependencyGraph::from_edges(nodes, edges).to_phases().unwrap();
    let second = DependencyGraph::from_edges(nodes, edges).to_phases().unwrap();

    assert_eq!(first, second);
  }
}
