use crate::core::CourseId;
use crate::error::GraphError;
use crate::graph::{EdgeId, FlowGraph};

/// Wires `id` to every other course it shares a prerequisite relation with.
///
/// Prerequisite lists live on the dependent course only, so both sides are
/// scanned: an edge `other -> id` when `id` requires `other`, and an edge
/// `id -> other` when `other` requires `id`. Both can fire for the same pair.
///
/// Edges are upserted by their derived id, so running this again only
/// refreshes the state hints. Returns every edge created or refreshed.
pub fn synthesize(id: &CourseId, graph: &mut FlowGraph) -> Result<Vec<EdgeId>, GraphError> {
    let node = graph
        .node(id.as_str())
        .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

    let mut pairs = Vec::new();

    for other in graph.nodes() {
        if other.id == *id {
            continue;
        }

        if node.requires(&other.id) {
            pairs.push((other.id.clone(), id.clone()));
        }

        if other.requires(id) {
            pairs.push((id.clone(), other.id.clone()));
        }
    }

    let mut touched = Vec::with_capacity(pairs.len());
    for (source, target) in pairs {
        touched.push(graph.upsert_edge(&source, &target)?);
    }

    tracing::debug!(course = %id, edges = touched.len(), "synthesized prerequisite edges");

    Ok(touched)
}
