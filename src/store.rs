use std::future::Future;

use serde::Deserialize;
use serde_json::Value;

use crate::graph::FlowGraph;

/// Persists a flow after each mutation.
///
/// Implementations are free to fail, the planner logs the failure and moves
/// on. The flow in memory is the source of truth.
pub trait FlowStore {
    fn save(&mut self, graph: &FlowGraph) -> impl Future<Output = anyhow::Result<()>>;
}

/// No autosave.
impl FlowStore for () {
    fn save(&mut self, _: &FlowGraph) -> impl Future<Output = anyhow::Result<()>> {
        std::future::ready(Ok(()))
    }
}

/// Keeps the last saved element array of one flow in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    flow_id: String,
    saved: Option<Value>,
    saves: usize,
}

impl MemoryStore {
    pub fn new(flow_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            saved: None,
            saves: 0,
        }
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    /// The elements as last saved.
    pub fn saved(&self) -> Option<&Value> {
        self.saved.as_ref()
    }

    /// Number of successful saves so far.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Reads the saved flow back.
    pub fn load(&self) -> anyhow::Result<Option<FlowGraph>> {
        match &self.saved {
            Some(value) => Ok(Some(FlowGraph::deserialize(value)?)),
            None => Ok(None),
        }
    }
}

impl FlowStore for MemoryStore {
    async fn save(&mut self, graph: &FlowGraph) -> anyhow::Result<()> {
        let value = serde_json::to_value(graph)?;

        tracing::trace!(flow = %self.flow_id, "flow saved");
        self.saved = Some(value);
        self.saves += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EligibilityState::*;
    use crate::graph::Node;

    #[tokio::test]
    async fn test_save_and_load() {
        let mut graph = FlowGraph::new();
        graph.insert_node(Node::new("CS101", Taken)).unwrap();

        let mut store = MemoryStore::new("fall-plan");
        assert!(store.load().unwrap().is_none());

        store.save(&graph).await.unwrap();
        store.save(&graph).await.unwrap();

        assert_eq!(store.flow_id(), "fall-plan");
        assert_eq!(store.saves(), 2);
        assert_eq!(store.saved().unwrap()[0]["type"], "courseTaken");
        assert_eq!(store.load().unwrap(), Some(graph));
    }
}
