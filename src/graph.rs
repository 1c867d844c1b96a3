//! The flow graph: course nodes connected by prerequisite edges.
//!
//! Nodes and edges live in a `petgraph` [`StableDiGraph`], so removing a
//! course never shifts the indices of the others. A side table maps course ids
//! to those indices. Every edge points from a prerequisite to the course that
//! requires it, and an edge is identified by that pair of courses. Its
//! [`EdgeId`] is a derived name and two pairs can share one (`A-B -> C` and
//! `A -> B-C` are both `A-B-C`).
//!
//! The graph itself has no opinion about eligibility. It stores whatever state
//! it is given, and the [`engine`](crate::engine) keeps the states consistent.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::catalog::CourseRecord;
use crate::core::{CourseId, EligibilityState, Metadata, Position};
use crate::error::GraphError;

/// A single course in the flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: CourseId,
    pub state: EligibilityState,
    pub position: Position,
    pub label: String,
    /// Prerequisites as listed by the catalog, in catalog order. Only the ones
    /// present in the flow take part in classification.
    pub prerequisites: Vec<CourseId>,
    pub metadata: Metadata,
}

impl Node {
    pub fn new(id: impl Into<CourseId>, state: EligibilityState) -> Self {
        let id = id.into();

        Self {
            label: id.to_string(),
            id,
            state,
            position: Position::default(),
            prerequisites: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_prerequisites<I, T>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CourseId>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    /// Builds a node from a catalog record.
    pub fn from_record(record: CourseRecord, state: EligibilityState) -> Self {
        Self {
            label: record.label().to_string(),
            id: record.id,
            state,
            position: Position::default(),
            prerequisites: record.prerequisites,
            metadata: record.info,
        }
    }

    pub fn requires(&self, id: &CourseId) -> bool {
        self.prerequisites.contains(id)
    }
}

/// Identifier of an edge, derived from its endpoints as `<source>-<target>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn between(source: &CourseId, target: &CourseId) -> Self {
        Self(format!("{source}-{target}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A prerequisite relation, pointing from the prerequisite to the dependent
/// course. The two states are copies of the endpoint states, kept as hints for
/// rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: CourseId,
    pub target: CourseId,
    pub source_state: EligibilityState,
    pub target_state: EligibilityState,
}

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: StableDiGraph<Node, Edge>,
    nodes: HashMap<CourseId, NodeIndex>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of courses in the flow.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(|&index| &self.graph[index])
    }

    /// First edge named `id`, in edge order. Prefer
    /// [`edge_between`](Self::edge_between) when the endpoints are known.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index(id).map(|index| &self.graph[index])
    }

    pub fn edge_between(&self, source: &str, target: &str) -> Option<&Edge> {
        let a = *self.nodes.get(source)?;
        let b = *self.nodes.get(target)?;
        self.graph.find_edge(a, b).map(|index| &self.graph[index])
    }

    /// Courses in insertion order (index order once courses were removed).
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_indices().map(|index| &self.graph[index])
    }

    /// Read access to the underlying graph, for layout engines and other
    /// algorithms that want to walk the topology directly.
    pub fn topology(&self) -> &StableDiGraph<Node, Edge> {
        &self.graph
    }

    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }

        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.nodes.insert(id, index);

        Ok(())
    }

    /// Removes a course together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<Node, GraphError> {
        let index = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))?;

        // `remove_node` drops the incident edges as well.
        self.graph
            .remove_node(index)
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    /// Creates the edge `source -> target`, or refreshes it if it already
    /// exists. Both courses must already be in the flow.
    pub fn upsert_edge(
        &mut self,
        source: &CourseId,
        target: &CourseId,
    ) -> Result<EdgeId, GraphError> {
        let a = self.index_of(source.as_str())?;
        let b = self.index_of(target.as_str())?;

        let edge = Edge {
            id: EdgeId::between(source, target),
            source: source.clone(),
            target: target.clone(),
            source_state: self.graph[a].state,
            target_state: self.graph[b].state,
        };
        let id = edge.id.clone();

        match self.graph.find_edge(a, b) {
            Some(index) => self.graph[index] = edge,
            None => {
                self.graph.add_edge(a, b, edge);
            }
        }

        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let index = self.edge_index(id)?;
        self.graph.remove_edge(index)
    }

    pub fn remove_edge_between(&mut self, source: &str, target: &str) -> Option<Edge> {
        let a = *self.nodes.get(source)?;
        let b = *self.nodes.get(target)?;
        let index = self.graph.find_edge(a, b)?;
        self.graph.remove_edge(index)
    }

    /// Courses that list `id` as a prerequisite and are connected to it, in
    /// edge order.
    pub fn successors(&self, id: &str) -> Vec<CourseId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Prerequisites of `id` that are connected to it, in edge order.
    pub fn predecessors(&self, id: &str) -> Vec<CourseId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Overwrites the state of a course and returns the previous one.
    ///
    /// This is a raw setter: it refreshes the hints on the course's own edges
    /// but does not touch any other course. Follow it with
    /// [`propagate`](crate::engine::propagate) to bring dependents up to date.
    pub fn set_state(
        &mut self,
        id: &str,
        state: EligibilityState,
    ) -> Result<EligibilityState, GraphError> {
        let index = self.index_of(id)?;
        let old = std::mem::replace(&mut self.graph[index].state, state);
        self.refresh_edges(id);
        Ok(old)
    }

    pub fn set_position(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        let index = self.index_of(id)?;
        self.graph[index].position = position;
        Ok(())
    }

    /// Copies the current endpoint states into the hints of every edge touching
    /// `id`. Returns the ids of the edges that were rewritten.
    pub fn refresh_edges(&mut self, id: &str) -> Vec<EdgeId> {
        let Some(&index) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut touched = Vec::new();

        for edge in self.incident_edges(index) {
            let Some((a, b)) = self.graph.edge_endpoints(edge) else {
                continue;
            };

            let source_state = self.graph[a].state;
            let target_state = self.graph[b].state;

            let weight = &mut self.graph[edge];
            if weight.source_state != source_state || weight.target_state != target_state {
                weight.source_state = source_state;
                weight.target_state = target_state;
                touched.push(weight.id.clone());
            }
        }

        touched
    }

    pub(crate) fn node_at_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.graph.node_weight_mut(index)
    }

    fn edge_index(&self, id: &str) -> Option<EdgeIndex> {
        self.graph
            .edge_indices()
            .find(|&index| self.graph[index].id.as_str() == id)
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex, GraphError> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.into()))
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<CourseId> {
        let Some(&index) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| match direction {
                Direction::Outgoing => (edge.id(), edge.target()),
                Direction::Incoming => (edge.id(), edge.source()),
            })
            .collect();

        // petgraph walks adjacency lists newest first
        edges.sort_by_key(|(edge, _)| edge.index());
        edges
            .into_iter()
            .map(|(_, node)| self.graph[node].id.clone())
            .collect()
    }

    fn incident_edges(&self, index: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.id())
            .collect();

        // a self-loop shows up in both directions
        edges.sort_by_key(|edge| edge.index());
        edges.dedup();
        edges
    }
}

impl PartialEq for FlowGraph {
    /// Two flows are equal when they hold the same courses and edges,
    /// regardless of the order they were inserted in.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.edge_count() == other.edge_count()
            && self.nodes().all(|node| other.node(node.id.as_str()) == Some(node))
            && self.edges().all(|edge| {
                other.edge_between(edge.source.as_str(), edge.target.as_str()) == Some(edge)
            })
    }
}
