//! Mapping declarations, inheritance, and the format conversion graph.

pub mod format;
pub mod graph;
pub mod loader;
pub mod types;

use once_cell::sync::OnceCell;

use crate::error::RecastResult;
use format::Format;
use graph::MappingGraph;
use types::{DirectionalMapping, MappingSpec};

pub use loader::MappingLoader;

/// The full set of declared mappings for a run.
///
/// Owns the specs in declaration order and the graph built from them. The
/// graph is built lazily on first resolution and cached for the lifetime of
/// this object; independent `Mapping` instances share nothing, which keeps
/// runs (and tests) isolated.
pub struct Mapping {
    specs: Vec<MappingSpec>,
    graph: OnceCell<MappingGraph>,
}

impl Mapping {
    pub fn new(specs: Vec<MappingSpec>) -> Self {
        Self {
            specs,
            graph: OnceCell::new(),
        }
    }

    /// Declared specs in declaration order.
    pub fn specs(&self) -> &[MappingSpec] {
        &self.specs
    }

    /// The conversion graph, built on first access.
    pub fn graph(&self) -> &MappingGraph {
        self.graph.get_or_init(|| MappingGraph::build(&self.specs))
    }

    /// Finds the ordered directional mappings converting `input` to `output`.
    pub fn resolve_path(
        &self,
        input: &Format,
        output: &Format,
    ) -> RecastResult<Vec<&DirectionalMapping>> {
        self.graph().resolve(input, output)
    }
}
