//! The flat element format saved flows are stored in.
//!
//! A saved flow is a single JSON array mixing nodes and edges:
//!
//! ```json
//! [
//!   {"id": "CS101", "type": "courseTaken", "position": {"x": 0, "y": 0},
//!    "data": {"label": "CS101", "prerequisites": [], "description": "Intro"}},
//!   {"id": "CS101-CS201", "source": "CS101", "target": "CS201",
//!    "sourceType": "courseTaken", "targetType": "courseCanTake"}
//! ]
//! ```
//!
//! [`FlowGraph`] serializes through this format. Loading checks the graph
//! invariants, so a stored flow with duplicate courses or dangling edges is
//! rejected instead of silently repaired.

use serde::{Deserialize, Serialize};

use crate::core::{CourseId, EligibilityState, Metadata, Position};
use crate::error::GraphError;
use crate::graph::{EdgeId, FlowGraph, Node};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Edge(EdgeElement),
    Node(NodeElement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    pub id: EdgeId,
    pub source: CourseId,
    pub target: CourseId,
    #[serde(default)]
    pub source_type: EligibilityState,
    #[serde(default)]
    pub target_type: EligibilityState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    pub id: CourseId,
    #[serde(rename = "type")]
    pub state: EligibilityState,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
    #[serde(flatten)]
    pub info: Metadata,
}

impl From<&Node> for NodeElement {
    fn from(node: &Node) -> Self {
        NodeElement {
            id: node.id.clone(),
            state: node.state,
            position: node.position,
            data: NodeData {
                label: node.label.clone(),
                prerequisites: node.prerequisites.clone(),
                info: node.metadata.clone(),
            },
        }
    }
}

impl From<NodeElement> for Node {
    fn from(element: NodeElement) -> Self {
        Node {
            id: element.id,
            state: element.state,
            position: element.position,
            label: element.data.label,
            prerequisites: element.data.prerequisites,
            metadata: element.data.info,
        }
    }
}

impl FlowGraph {
    /// Nodes first, then edges, each in graph order.
    pub fn to_elements(&self) -> Vec<Element> {
        let nodes = self
            .nodes()
            .map(|node| Element::Node(NodeElement::from(node)));

        let edges = self.edges().map(|edge| {
            Element::Edge(EdgeElement {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_type: edge.source_state,
                target_type: edge.target_state,
            })
        });

        nodes.chain(edges).collect()
    }

    /// Rebuilds a flow from stored elements.
    ///
    /// Node states are taken as stored. Edge hints are recomputed from the
    /// node states rather than trusted.
    pub fn from_elements(
        elements: impl IntoIterator<Item = Element>,
    ) -> Result<FlowGraph, GraphError> {
        let mut graph = FlowGraph::new();
        let mut edges = Vec::new();

        for element in elements {
            match element {
                Element::Node(node) => graph.insert_node(node.into())?,
                Element::Edge(edge) => edges.push(edge),
            }
        }

        for edge in edges {
            for endpoint in [&edge.source, &edge.target] {
                if !graph.contains(endpoint.as_str()) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id,
                        missing: endpoint.clone(),
                    });
                }
            }

            let expected = EdgeId::between(&edge.source, &edge.target);
            if edge.id != expected {
                return Err(GraphError::EdgeIdMismatch {
                    edge: edge.id,
                    expected,
                });
            }

            if graph
                .edge_between(edge.source.as_str(), edge.target.as_str())
                .is_some()
            {
                return Err(GraphError::DuplicateEdge(edge.id));
            }

            graph.upsert_edge(&edge.source, &edge.target)?;
        }

        Ok(graph)
    }
}

impl From<FlowGraph> for Vec<Element> {
    fn from(graph: FlowGraph) -> Self {
        graph.to_elements()
    }
}

impl TryFrom<Vec<Element>> for FlowGraph {
    type Error = GraphError;

    fn try_from(elements: Vec<Element>) -> Result<Self, Self::Error> {
        FlowGraph::from_elements(elements)
    }
}

impl Serialize for FlowGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_elements().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FlowGraph {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = Vec::<Element>::deserialize(deserializer)?;
        FlowGraph::from_elements(elements).map_err(serde::de::Error::custom)
    }
}
