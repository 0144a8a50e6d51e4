//! Dependency graph between artifact generators.
//!
//! Every node has at most one predecessor and one successor, so the graph
//! decomposes into independent linear branches. Branches can run concurrently;
//! nodes inside a branch run in order and feed their aggregate payload forward.

use crate::{ArtifactType, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGraph {
    nodes: Vec<ArtifactType>,
    /// `(predecessor, successor)` pairs.
    edges: Vec<(ArtifactType, ArtifactType)>,
}

impl TaskGraph {
    /// HTML → Markdown → Text as one chain, JSON and PDF as independent roots.
    pub fn standard() -> Self {
        Self {
            nodes: ArtifactType::ALL.to_vec(),
            edges: vec![
                (ArtifactType::Html, ArtifactType::Markdown),
                (ArtifactType::Markdown, ArtifactType::Text),
            ],
        }
    }

    /// Build a custom graph; rejects unknown nodes, fan-in/fan-out, and cycles.
    pub fn new(
        nodes: Vec<ArtifactType>,
        edges: Vec<(ArtifactType, ArtifactType)>,
    ) -> Result<Self, PipelineError> {
        for (idx, node) in nodes.iter().enumerate() {
            if nodes[..idx].contains(node) {
                return Err(PipelineError::invalid_input(format!(
                    "duplicate graph node {node}"
                )));
            }
        }
        for (from, to) in &edges {
            if !nodes.contains(from) || !nodes.contains(to) {
                return Err(PipelineError::invalid_input(format!(
                    "edge {from} -> {to} references an unknown node"
                )));
            }
            if edges.iter().filter(|(_, t)| t == to).count() > 1 {
                return Err(PipelineError::invalid_input(format!(
                    "{to} has more than one predecessor"
                )));
            }
            if edges.iter().filter(|(f, _)| f == from).count() > 1 {
                return Err(PipelineError::invalid_input(format!(
                    "{from} has more than one successor"
                )));
            }
        }
        let graph = Self { nodes, edges };
        let reachable: usize = graph.branches().iter().map(Vec::len).sum();
        if reachable != graph.nodes.len() {
            return Err(PipelineError::invalid_input("task graph contains a cycle"));
        }
        Ok(graph)
    }

    pub fn nodes(&self) -> &[ArtifactType] {
        &self.nodes
    }

    pub fn predecessor(&self, node: ArtifactType) -> Option<ArtifactType> {
        self.edges
            .iter()
            .find(|(_, to)| *to == node)
            .map(|(from, _)| *from)
    }

    pub fn successor(&self, node: ArtifactType) -> Option<ArtifactType> {
        self.edges
            .iter()
            .find(|(from, _)| *from == node)
            .map(|(_, to)| *to)
    }

    /// Nodes without a predecessor, in node order.
    pub fn roots(&self) -> Vec<ArtifactType> {
        self.nodes
            .iter()
            .copied()
            .filter(|node| self.predecessor(*node).is_none())
            .collect()
    }

    /// Each root followed by its chain of successors.
    pub fn branches(&self) -> Vec<Vec<ArtifactType>> {
        self.roots()
            .into_iter()
            .map(|root| {
                let mut branch = vec![root];
                let mut current = root;
                while let Some(next) = self.successor(current) {
                    if branch.contains(&next) {
                        break;
                    }
                    branch.push(next);
                    current = next;
                }
                branch
            })
            .collect()
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::standard()
    }
}
