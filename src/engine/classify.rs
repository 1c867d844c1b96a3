use crate::core::{CourseId, EligibilityState};
use crate::graph::{FlowGraph, Node};

/// Decides whether a course can be taken given the flow it sits in.
///
/// A course is blocked when one of its prerequisites is in the flow and has not
/// been taken. Prerequisites that are not in the flow are treated as satisfied:
/// the planner only reasons about what the user can see. A course listing
/// itself is ignored for the same reason.
///
/// `Taken` is set by the user and is returned unchanged.
pub fn classify(node: &Node, graph: &FlowGraph) -> EligibilityState {
    if node.state.is_taken() {
        return EligibilityState::Taken;
    }

    eligibility(&node.id, &node.prerequisites, graph)
}

/// Classification from the prerequisite list alone, ignoring whatever state
/// the course currently has. Used when a course is being (re)derived, for
/// example after its `Taken` mark was cleared.
pub(crate) fn eligibility(
    id: &CourseId,
    prerequisites: &[CourseId],
    graph: &FlowGraph,
) -> EligibilityState {
    let blocked = prerequisites
        .iter()
        .filter(|prerequisite| *prerequisite != id)
        .filter_map(|prerequisite| graph.node(prerequisite.as_str()))
        .any(|prerequisite| !prerequisite.state.is_taken());

    if blocked {
        EligibilityState::CannotTake
    } else {
        EligibilityState::CanTake
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EligibilityState::*;

    fn graph(nodes: &[(&str, EligibilityState)]) -> FlowGraph {
        let mut graph = FlowGraph::new();
        for (id, state) in nodes {
            graph.insert_node(Node::new(*id, *state)).unwrap();
        }
        graph
    }

    #[test]
    fn test_all_taken() {
        let graph = graph(&[("A", Taken), ("B", Taken)]);
        let node = Node::new("C", CannotTake).with_prerequisites(["A", "B"]);
        assert_eq!(classify(&node, &graph), CanTake);
    }

    #[test]
    fn test_one_blocking() {
        let graph = graph(&[("A", Taken), ("B", CanTake)]);
        let node = Node::new("C", CanTake).with_prerequisites(["A", "B"]);
        assert_eq!(classify(&node, &graph), CannotTake);
    }

    #[test]
    fn test_blocked_by_blocked() {
        let graph = graph(&[("A", CannotTake)]);
        let node = Node::new("C", CanTake).with_prerequisites(["A"]);
        assert_eq!(classify(&node, &graph), CannotTake);
    }

    #[test]
    fn test_absent_prerequisites_ignored() {
        let graph = graph(&[("A", Taken)]);
        let node = Node::new("C", CannotTake).with_prerequisites(["A", "MISSING"]);
        assert_eq!(classify(&node, &graph), CanTake);

        let empty = FlowGraph::new();
        assert_eq!(classify(&node, &empty), CanTake);
    }

    #[test]
    fn test_no_prerequisites() {
        let graph = graph(&[("A", CannotTake)]);
        let node = Node::new("C", CannotTake);
        assert_eq!(classify(&node, &graph), CanTake);
    }

    #[test]
    fn test_taken_is_kept() {
        let graph = graph(&[("A", CannotTake)]);
        let node = Node::new("C", Taken).with_prerequisites(["A"]);
        assert_eq!(classify(&node, &graph), Taken);
        assert_eq!(eligibility(&node.id, &node.prerequisites, &graph), CannotTake);
    }

    #[test]
    fn test_self_reference_ignored() {
        let graph = graph(&[("C", CanTake)]);
        let node = Node::new("C", CanTake).with_prerequisites(["C"]);
        assert_eq!(classify(&node, &graph), CanTake);
    }
}
