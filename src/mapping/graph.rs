//! The mapping graph: formats as nodes, directional mappings as edges.

use std::collections::HashMap;

use log::debug;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};

use super::format::Format;
use super::types::{DirectionalMapping, MappingSpec};
use crate::error::RecastError;

/// Directed graph of format-to-format conversions.
///
/// Built by iterating specs in reverse declaration order, so that on a
/// duplicate ordered (input, output) pair the first-declared spec ends up
/// owning the edge.
pub struct MappingGraph {
    graph: DiGraph<Format, DirectionalMapping>,
    nodes: HashMap<Format, NodeIndex>,
}

impl MappingGraph {
    /// Builds the graph from declared specs.
    pub fn build(specs: &[MappingSpec]) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<Format, NodeIndex> = HashMap::new();

        let mut node_of = |graph: &mut DiGraph<Format, DirectionalMapping>, format: &Format| {
            *nodes
                .entry(format.clone())
                .or_insert_with(|| graph.add_node(format.clone()))
        };

        for spec in specs.iter().rev() {
            for direction in [spec.forward.as_ref(), spec.reverse.as_ref()]
                .into_iter()
                .flatten()
            {
                if direction.transformations.is_empty() {
                    continue;
                }
                let from = node_of(&mut graph, &direction.input_format);
                let to = node_of(&mut graph, &direction.output_format);
                graph.update_edge(from, to, direction.clone());
            }
        }

        debug!(
            "mapping graph built: {} formats, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph, nodes }
    }

    /// True when the format is a known node.
    pub fn contains(&self, format: &Format) -> bool {
        self.nodes.contains_key(format)
    }

    /// Finds the shortest conversion path (by edge count) and returns the
    /// directional mappings along it, in application order.
    ///
    /// # Errors
    ///
    /// [`RecastError::NoConversionPath`] when either format is unknown or no
    /// route exists.
    pub fn resolve(
        &self,
        input: &Format,
        output: &Format,
    ) -> Result<Vec<&DirectionalMapping>, RecastError> {
        let no_path = || RecastError::NoConversionPath {
            input: input.clone(),
            output: output.clone(),
        };

        let from = *self.nodes.get(input).ok_or_else(no_path)?;
        let to = *self.nodes.get(output).ok_or_else(no_path)?;

        let (_, path) = astar(&self.graph, from, |node| node == to, |_| 1usize, |_| 0usize)
            .ok_or_else(no_path)?;

        path.windows(2)
            .map(|pair| {
                self.graph
                    .find_edge(pair[0], pair[1])
                    .map(|edge| &self.graph[edge])
                    .ok_or_else(no_path)
            })
            .collect()
    }
}
