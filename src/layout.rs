//! Node placement.
//!
//! Layout is cosmetic: it writes positions and nothing else. The planner runs
//! it after every mutation.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::core::{CourseId, Position};
use crate::graph::FlowGraph;

/// Assigns coordinates to the courses of a flow.
pub trait Layout {
    fn layout(&mut self, graph: &mut FlowGraph);
}

/// Leaves positions untouched.
impl Layout for () {
    fn layout(&mut self, _: &mut FlowGraph) {}
}

/// Direction prerequisites flow in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Prerequisites above their dependents.
    #[default]
    #[serde(rename = "TB")]
    TopBottom,
    /// Prerequisites left of their dependents.
    #[serde(rename = "LR")]
    LeftRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub orientation: Orientation,
    pub node_width: f64,
    pub node_height: f64,
    /// Space between neighbours within a rank.
    pub node_gap: f64,
    /// Space between consecutive ranks.
    pub rank_gap: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::TopBottom,
            node_width: 105.0,
            node_height: 45.0,
            node_gap: 50.0,
            rank_gap: 50.0,
        }
    }
}

/// Places every course on a rank one past its deepest prerequisite.
///
/// Ranks are computed over the strongly connected components of the flow, so
/// courses that require each other (bad catalog data, but it happens) end up
/// side by side instead of breaking the layout. Within a rank courses are
/// ordered by id and centered on the axis.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    options: LayoutOptions,
}

impl LayeredLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Rank of every course, keyed by id.
    pub fn ranks(graph: &FlowGraph) -> HashMap<CourseId, usize> {
        let topology = graph.topology();

        Self::rank_indices(graph)
            .into_iter()
            .map(|(index, rank)| (topology[index].id.clone(), rank))
            .collect()
    }

    fn rank_indices(graph: &FlowGraph) -> HashMap<NodeIndex, usize> {
        let topology = graph.topology();
        let mut ranks: HashMap<NodeIndex, usize> = HashMap::new();

        // tarjan_scc yields components in reverse topological order
        for component in tarjan_scc(topology).into_iter().rev() {
            let members: HashSet<NodeIndex> = component.iter().copied().collect();

            let rank = component
                .iter()
                .flat_map(|&index| topology.neighbors_directed(index, Direction::Incoming))
                .filter(|parent| !members.contains(parent))
                .filter_map(|parent| ranks.get(&parent))
                .map(|rank| rank + 1)
                .max()
                .unwrap_or(0);

            for index in component {
                ranks.insert(index, rank);
            }
        }

        ranks
    }
}

impl Layout for LayeredLayout {
    fn layout(&mut self, graph: &mut FlowGraph) {
        let mut layers: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        for (index, rank) in Self::rank_indices(graph) {
            layers.entry(rank).or_default().push(index);
        }

        let LayoutOptions {
            orientation,
            node_width,
            node_height,
            node_gap,
            rank_gap,
        } = self.options;

        for (rank, mut layer) in layers {
            layer.sort_by(|&a, &b| graph.topology()[a].id.cmp(&graph.topology()[b].id));
            let center = (layer.len() as f64 - 1.0) / 2.0;

            for (slot, &index) in layer.iter().enumerate() {
                let offset = slot as f64 - center;
                let rank = rank as f64;

                let position = match orientation {
                    Orientation::TopBottom => Position::new(
                        offset * (node_width + node_gap) - node_width / 2.0,
                        rank * (node_height + rank_gap),
                    ),
                    Orientation::LeftRight => Position::new(
                        rank * (node_width + rank_gap),
                        offset * (node_height + node_gap) - node_height / 2.0,
                    ),
                };

                if let Some(node) = graph.node_at_mut(index) {
                    node.position = position;
                }
            }
        }

        tracing::trace!(courses = graph.len(), "layout applied");
    }
}
