use std::collections::{HashSet, VecDeque};

use crate::core::CourseId;
use crate::engine::classify::classify;
use crate::graph::FlowGraph;

/// What a propagation pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Courses re-examined, in breadth-first order. The root is not included.
    pub visited: Vec<CourseId>,
    /// The subset of `visited` whose state actually changed.
    pub changed: Vec<CourseId>,
}

/// Re-derives the state of every course reachable from `root`.
///
/// The walk is breadth-first along prerequisite edges, siblings in edge order.
/// Each reachable course is reclassified once (courses marked `Taken` keep
/// their mark) and the hints on its edges are refreshed. Visited courses are
/// tracked by id.
///
/// Classification only looks at which prerequisites are `Taken`, and this pass
/// never changes that, so visiting each course once reaches the fixed point.
///
/// Does nothing when `root` is not in the flow.
pub fn propagate(root: &CourseId, graph: &mut FlowGraph) -> Propagation {
    let mut report = Propagation::default();

    if !graph.contains(root.as_str()) {
        return report;
    }

    graph.refresh_edges(root.as_str());

    let mut visited = HashSet::from([root.clone()]);
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(current) = queue.pop_front() {
        for successor in graph.successors(current.as_str()) {
            if !visited.insert(successor.clone()) {
                continue;
            }

            if let Some(node) = graph.node(successor.as_str())
                && !node.state.is_taken()
            {
                let new = classify(node, graph);

                if new != node.state
                    && let Ok(old) = graph.set_state(successor.as_str(), new)
                {
                    tracing::debug!(course = %successor, from = %old, to = %new, "eligibility changed");
                    report.changed.push(successor.clone());
                }
            }

            graph.refresh_edges(successor.as_str());
            report.visited.push(successor.clone());
            queue.push_back(successor);
        }
    }

    report
}
