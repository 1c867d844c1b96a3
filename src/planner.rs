//! The mutation entry points.
//!
//! A [`Planner`] owns the collaborators a flow is edited with: the course
//! catalog, the layout engine, the undo stack and the store. Every mutation
//! follows the same sequence: change the graph, synthesize edges, propagate
//! eligibility, then commit (layout, snapshot, autosave). A mutation that fails
//! before it touches the graph leaves it exactly as it was.

use tracing::Instrument;

use crate::catalog::CourseCatalog;
use crate::core::{CourseId, EligibilityState};
use crate::engine::{Propagation, classify, eligibility, propagate, synthesize};
use crate::error::{GraphError, InsertError, PartialSubtreeFailure, PlannerError};
use crate::graph::{FlowGraph, Node};
use crate::history::{SnapshotHistory, UndoStack};
use crate::layout::{LayeredLayout, Layout};
use crate::store::FlowStore;

/// Outcome of [`Planner::insert_prerequisite_subtree`].
#[derive(Debug)]
pub struct SubtreeImport {
    pub course: CourseId,
    /// Prerequisites added to the flow, in catalog order.
    pub inserted: Vec<CourseId>,
    /// Prerequisites that were already in the flow.
    pub skipped: Vec<CourseId>,
    pub failed: Vec<(CourseId, InsertError)>,
}

impl SubtreeImport {
    fn new(course: CourseId) -> Self {
        Self {
            course,
            inserted: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<CourseId>, PartialSubtreeFailure> {
        if self.failed.is_empty() {
            return Ok(self.inserted);
        }

        Err(PartialSubtreeFailure {
            course: self.course,
            inserted: self.inserted,
            failures: self.failed,
        })
    }
}

/// Edits flows against a course catalog.
///
/// ```rust,no_run
/// use courseflow::{CourseRecord, FlowGraph, MemoryStore, Planner, StaticCatalog};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = StaticCatalog::new()
///     .with(CourseRecord::new("CS101"))
///     .with(CourseRecord::new("CS201").with_prerequisites(["CS101"]));
///
/// let mut planner = Planner::new(catalog).with_store(MemoryStore::new("my-plan"));
/// let mut flow = FlowGraph::new();
///
/// planner.insert_course(&mut flow, "CS101", true).await?;
/// planner.insert_course(&mut flow, "CS201", false).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Planner<C, L = LayeredLayout, H = SnapshotHistory, S = ()> {
    catalog: C,
    layout: L,
    history: H,
    store: S,
}

impl<C> Planner<C> {
    /// A planner with the default layered layout, an undo history of
    /// [`SnapshotHistory::DEFAULT_LIMIT`] steps and no autosave.
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            layout: LayeredLayout::default(),
            history: SnapshotHistory::default(),
            store: (),
        }
    }
}

impl<C, L, H, S> Planner<C, L, H, S> {
    pub fn with_layout<T: Layout>(self, layout: T) -> Planner<C, T, H, S> {
        Planner {
            catalog: self.catalog,
            layout,
            history: self.history,
            store: self.store,
        }
    }

    pub fn with_history<T: UndoStack>(self, history: T) -> Planner<C, L, T, S> {
        Planner {
            catalog: self.catalog,
            layout: self.layout,
            history,
            store: self.store,
        }
    }

    pub fn with_store<T: FlowStore>(self, store: T) -> Planner<C, L, H, T> {
        Planner {
            catalog: self.catalog,
            layout: self.layout,
            history: self.history,
            store,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<C, L, H, S> Planner<C, L, H, S>
where
    L: Layout,
    H: UndoStack,
    S: FlowStore,
{
    /// Runs layout, records an undo snapshot and autosaves.
    async fn commit(&mut self, graph: &mut FlowGraph) {
        self.layout.layout(graph);
        self.history.record_snapshot(graph);
        self.autosave(graph).await;
    }
}

impl<C, L, H, S> Planner<C, L, H, S>
where
    S: FlowStore,
{
    async fn autosave(&mut self, graph: &FlowGraph) {
        if let Err(err) = self.store.save(graph).await {
            tracing::warn!("autosave failed: {err:#}");
        }
    }
}

impl<C, L, H, S> Planner<C, L, H, S>
where
    C: CourseCatalog,
    L: Layout,
    H: UndoStack,
    S: FlowStore,
{
    /// Adds a course to the flow.
    ///
    /// A course marked as `taken` enters as [`EligibilityState::Taken`],
    /// anything else is classified against the courses already in the flow.
    /// The new course is then wired to the rest of the flow and its dependents
    /// are reclassified.
    ///
    /// Fails with [`InsertError::DuplicateCourse`] before consulting the
    /// catalog if the course is already in the flow, and with
    /// [`InsertError::UnknownCourse`] if the catalog doesn't know it. The flow
    /// is unchanged on error.
    pub async fn insert_course(
        &mut self,
        graph: &mut FlowGraph,
        id: impl Into<CourseId>,
        taken: bool,
    ) -> Result<(), InsertError> {
        let id = id.into();
        let span = tracing::info_span!("insert_course", course = %id);

        async {
            self.insert(graph, &id, taken).await?;
            self.commit(graph).await;
            Ok::<_, InsertError>(())
        }
        .instrument(span)
        .await
    }

    /// Adds the direct prerequisites of a course that are not in the flow yet.
    ///
    /// The prerequisite list comes from the course in the flow, or from the
    /// catalog if the course isn't there. Every missing prerequisite is
    /// inserted as not taken. A prerequisite that fails to import is logged and
    /// recorded in [`SubtreeImport::failed`], the others are still imported.
    ///
    /// Unlike calling [`insert_course`](Self::insert_course) once per
    /// prerequisite, the whole import is committed once: layout runs once, one
    /// undo snapshot is recorded and the flow is saved once. A single
    /// [`undo`](Self::undo) removes every imported prerequisite together. Nothing
    /// is committed when no prerequisite was inserted.
    pub async fn insert_prerequisite_subtree(
        &mut self,
        graph: &mut FlowGraph,
        id: impl Into<CourseId>,
    ) -> SubtreeImport {
        let id = id.into();
        let span = tracing::info_span!("insert_prerequisite_subtree", course = %id);

        async {
            let mut import = SubtreeImport::new(id.clone());

            let prerequisites = match graph.node(id.as_str()) {
                Some(node) => node.prerequisites.clone(),
                None => match self.catalog.fetch_course(&id).await {
                    Ok(record) => record.prerequisites,
                    Err(err) => {
                        let err = InsertError::from_catalog(&id, err);
                        tracing::warn!("couldn't look up prerequisites: {err}");
                        import.failed.push((id.clone(), err));
                        return import;
                    }
                },
            };

            for prerequisite in prerequisites {
                if prerequisite == id || graph.contains(prerequisite.as_str()) {
                    import.skipped.push(prerequisite);
                    continue;
                }

                match self.insert(graph, &prerequisite, false).await {
                    Ok(()) => import.inserted.push(prerequisite),
                    Err(err) => {
                        tracing::warn!(prerequisite = %prerequisite, "skipping prerequisite: {err}");
                        import.failed.push((prerequisite, err));
                    }
                }
            }

            if !import.inserted.is_empty() {
                self.commit(graph).await;
            }

            tracing::info!(
                inserted = import.inserted.len(),
                failed = import.failed.len(),
                "prerequisites imported"
            );

            import
        }
        .instrument(span)
        .await
    }

    async fn insert(
        &mut self,
        graph: &mut FlowGraph,
        id: &CourseId,
        taken: bool,
    ) -> Result<(), InsertError> {
        if graph.contains(id.as_str()) {
            return Err(InsertError::DuplicateCourse(id.clone()));
        }

        let record = self
            .catalog
            .fetch_course(id)
            .await
            .map_err(|err| InsertError::from_catalog(id, err))?;

        let state = if taken {
            EligibilityState::Taken
        } else {
            eligibility(id, &record.prerequisites, graph)
        };

        let mut node = Node::from_record(record, state);
        // the flow is keyed by the id the user asked for
        node.id = id.clone();

        graph.insert_node(node)?;
        synthesize(id, graph)?;
        let report = propagate(id, graph);

        tracing::info!(
            state = %state,
            reclassified = report.changed.len(),
            "course added"
        );

        Ok(())
    }
}

impl<C, L, H, S> Planner<C, L, H, S>
where
    L: Layout,
    H: UndoStack,
    S: FlowStore,
{
    /// Marks a course as taken, or clears the mark and lets the course be
    /// classified again. Dependents are reclassified either way.
    ///
    /// Setting the state a course already has changes nothing and commits
    /// nothing.
    pub async fn set_taken(
        &mut self,
        graph: &mut FlowGraph,
        id: impl Into<CourseId>,
        taken: bool,
    ) -> Result<Propagation, PlannerError> {
        let id = id.into();
        let span = tracing::info_span!("set_taken", course = %id, taken);

        async {
            let node = graph
                .node(id.as_str())
                .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

            let state = if taken {
                EligibilityState::Taken
            } else {
                eligibility(&node.id, &node.prerequisites, graph)
            };

            if state == node.state {
                return Ok(Propagation::default());
            }

            graph.set_state(id.as_str(), state)?;
            let report = propagate(&id, graph);
            self.commit(graph).await;

            tracing::info!(
                state = %state,
                reclassified = report.changed.len(),
                "course updated"
            );

            Ok::<_, PlannerError>(report)
        }
        .instrument(span)
        .await
    }

    /// Removes a course and every edge touching it, then reclassifies the
    /// courses that required it.
    pub async fn remove_course(
        &mut self,
        graph: &mut FlowGraph,
        id: impl Into<CourseId>,
    ) -> Result<Node, PlannerError> {
        let id = id.into();
        let span = tracing::info_span!("remove_course", course = %id);

        async {
            let dependents = graph.successors(id.as_str());
            let removed = graph.remove_node(id.as_str())?;

            for dependent in &dependents {
                let Some(node) = graph.node(dependent.as_str()) else {
                    continue;
                };

                let state = classify(node, graph);
                if state != node.state {
                    graph.set_state(dependent.as_str(), state)?;
                }

                propagate(dependent, graph);
            }

            self.commit(graph).await;
            tracing::info!(dependents = dependents.len(), "course removed");

            Ok::<_, PlannerError>(removed)
        }
        .instrument(span)
        .await
    }
}

impl<C, L, S> Planner<C, L, SnapshotHistory, S>
where
    S: FlowStore,
{
    /// Restores the flow to the previous snapshot. Returns `false` when there
    /// is nothing to undo.
    pub async fn undo(&mut self, graph: &mut FlowGraph) -> Result<bool, PlannerError> {
        let Some(previous) = self.history.undo()? else {
            return Ok(false);
        };

        *graph = previous;
        self.autosave(graph).await;
        tracing::info!("undo");

        Ok(true)
    }

    /// Re-applies the last undone snapshot. Returns `false` when there is
    /// nothing to redo.
    pub async fn redo(&mut self, graph: &mut FlowGraph) -> Result<bool, PlannerError> {
        let Some(next) = self.history.redo()? else {
            return Ok(false);
        };

        *graph = next;
        self.autosave(graph).await;
        tracing::info!("redo");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;
    use crate::catalog::{CourseRecord, StaticCatalog};
    use crate::core::EligibilityState::*;
    use crate::error::CatalogError;
    use crate::store::MemoryStore;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with(CourseRecord::new("CS101").with_label("Intro to CS"))
            .with(CourseRecord::new("CS201").with_prerequisites(["CS101"]))
            .with(CourseRecord::new("CS202").with_prerequisites(["CS101"]))
            .with(CourseRecord::new("CS301").with_prerequisites(["CS201", "CS202", "MATH9"]))
    }

    fn state(graph: &FlowGraph, id: &str) -> EligibilityState {
        graph.node(id).unwrap().state
    }

    struct BrokenCatalog;

    impl CourseCatalog for BrokenCatalog {
        fn fetch_course(
            &self,
            _: &CourseId,
        ) -> impl Future<Output = Result<CourseRecord, CatalogError>> {
            std::future::ready(Err(CatalogError::Backend(anyhow::anyhow!("timed out"))))
        }
    }

    struct BrokenStore;

    impl FlowStore for BrokenStore {
        async fn save(&mut self, _: &FlowGraph) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn test_scenario() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();

        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();
        assert_eq!(state(&graph, "CS201"), CanTake);

        let edge = graph.edge("CS101-CS201").unwrap();
        assert_eq!(edge.source_state, Taken);
        assert_eq!(edge.target_state, CanTake);

        planner.insert_course(&mut graph, "CS301", false).await.unwrap();
        assert_eq!(state(&graph, "CS301"), CannotTake);
        assert!(graph.edge("CS201-CS301").is_some());

        let report = planner.set_taken(&mut graph, "CS201", true).await.unwrap();
        assert_eq!(state(&graph, "CS301"), CanTake);
        assert_eq!(report.changed, vec![CourseId::from("CS301")]);
        assert_eq!(graph.edge("CS201-CS301").unwrap().source_state, Taken);

        assert_eq!(graph.node("CS101").unwrap().label, "Intro to CS");
        assert_eq!(graph.node("CS101").unwrap().position.y, 0.0);
        assert_eq!(graph.node("CS301").unwrap().position.y, 190.0);
    }

    #[tokio::test]
    async fn test_insert_before_prerequisite() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();

        planner.insert_course(&mut graph, "CS201", false).await.unwrap();
        assert_eq!(state(&graph, "CS201"), CanTake);

        planner.insert_course(&mut graph, "CS101", false).await.unwrap();
        assert_eq!(state(&graph, "CS101"), CanTake);
        assert_eq!(state(&graph, "CS201"), CannotTake);
        assert!(graph.edge("CS101-CS201").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_is_atomic() {
        let mut planner = Planner::new(BrokenCatalog).with_store(MemoryStore::new("plan"));
        let mut graph = FlowGraph::new();
        graph.insert_node(Node::new("CS101", Taken)).unwrap();
        let before = graph.clone();

        // the catalog is never consulted
        let err = planner
            .insert_course(&mut graph, "CS101", false)
            .await
            .unwrap_err();

        assert!(matches!(err, InsertError::DuplicateCourse(id) if id == "CS101"));
        assert_eq!(graph, before);
        assert_eq!(planner.store().saves(), 0);
    }

    #[tokio::test]
    async fn test_unknown_is_atomic() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        let before = graph.clone();

        let err = planner
            .insert_course(&mut graph, "CS999", false)
            .await
            .unwrap_err();

        assert!(matches!(err, InsertError::UnknownCourse(id) if id == "CS999"));
        assert_eq!(graph, before);
        assert_eq!(planner.history().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure() {
        let mut planner = Planner::new(BrokenCatalog);
        let mut graph = FlowGraph::new();

        let err = planner
            .insert_course(&mut graph, "CS101", false)
            .await
            .unwrap_err();

        assert!(matches!(err, InsertError::Catalog(id, CatalogError::Backend(_)) if id == "CS101"));
        assert!(graph.is_empty());
    }

    #[tokio::test]
    async fn test_partial_subtree() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS202", false).await.unwrap();
        planner.insert_course(&mut graph, "CS301", false).await.unwrap();

        let import = planner.insert_prerequisite_subtree(&mut graph, "CS301").await;

        assert_eq!(import.inserted, vec![CourseId::from("CS201")]);
        assert_eq!(import.skipped, vec![CourseId::from("CS202")]);
        assert_eq!(import.failed.len(), 1);
        assert!(matches!(&import.failed[0], (id, InsertError::UnknownCourse(_)) if id == "MATH9"));
        assert!(!import.is_complete());

        assert_eq!(state(&graph, "CS201"), CanTake);
        assert_eq!(state(&graph, "CS301"), CannotTake);
        assert!(graph.edge("CS201-CS301").is_some());
        assert_eq!(planner.history().len(), 3);

        let failure = import.into_result().unwrap_err();
        assert_eq!(failure.course, "CS301");
        assert!(failure.to_string().contains("MATH9"));
    }

    #[tokio::test]
    async fn test_subtree_of_absent_course() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();

        let import = planner.insert_prerequisite_subtree(&mut graph, "CS201").await;

        assert_eq!(import.into_result().unwrap(), vec![CourseId::from("CS101")]);
        assert!(!graph.contains("CS201"));
        assert_eq!(state(&graph, "CS101"), CanTake);
    }

    #[tokio::test]
    async fn test_set_taken() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();

        let report = planner.set_taken(&mut graph, "CS101", false).await.unwrap();
        assert_eq!(state(&graph, "CS101"), CanTake);
        assert_eq!(state(&graph, "CS201"), CannotTake);
        assert_eq!(report.changed.len(), 1);

        let report = planner.set_taken(&mut graph, "CS101", false).await.unwrap();
        assert_eq!(report, Propagation::default());

        let err = planner.set_taken(&mut graph, "CS999", true).await.unwrap_err();
        assert!(matches!(err, PlannerError::Graph(GraphError::NodeNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_course() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS101", false).await.unwrap();
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();
        planner.insert_course(&mut graph, "CS202", false).await.unwrap();
        assert_eq!(state(&graph, "CS201"), CannotTake);

        let removed = planner.remove_course(&mut graph, "CS101").await.unwrap();

        assert_eq!(removed.id, "CS101");
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(state(&graph, "CS201"), CanTake);
        assert_eq!(state(&graph, "CS202"), CanTake);

        let err = planner.remove_course(&mut graph, "CS101").await.unwrap_err();
        assert!(matches!(err, PlannerError::Graph(GraphError::NodeNotFound(_))));
    }

    #[tokio::test]
    async fn test_undo_redo() {
        let mut planner = Planner::new(catalog()).with_store(MemoryStore::new("plan"));
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();
        let after = graph.clone();

        assert!(planner.undo(&mut graph).await.unwrap());
        assert_eq!(graph.len(), 1);
        assert!(!graph.contains("CS201"));
        assert!(!planner.undo(&mut graph).await.unwrap());

        assert!(planner.redo(&mut graph).await.unwrap());
        assert_eq!(graph, after);
        assert!(!planner.redo(&mut graph).await.unwrap());

        assert_eq!(planner.store().saves(), 4);
        assert_eq!(planner.store().load().unwrap(), Some(after));
    }

    #[tokio::test]
    async fn test_subtree_is_one_undo_step() {
        let mut planner = Planner::new(catalog());
        let mut graph = FlowGraph::new();
        planner.insert_course(&mut graph, "CS301", false).await.unwrap();

        let import = planner.insert_prerequisite_subtree(&mut graph, "CS301").await;
        assert_eq!(import.inserted.len(), 2);
        assert_eq!(planner.history().len(), 2);

        assert!(planner.undo(&mut graph).await.unwrap());
        assert_eq!(graph.len(), 1);
        assert!(graph.contains("CS301"));
    }

    #[tokio::test]
    async fn test_colliding_edge_ids_reload() {
        let catalog = StaticCatalog::new()
            .with(CourseRecord::new("A-B"))
            .with(CourseRecord::new("C").with_prerequisites(["A-B"]))
            .with(CourseRecord::new("A"))
            .with(CourseRecord::new("B-C").with_prerequisites(["A"]));
        let mut planner = Planner::new(catalog).with_store(MemoryStore::new("plan"));
        let mut graph = FlowGraph::new();

        for id in ["A-B", "C", "A", "B-C"] {
            planner.insert_course(&mut graph, id, false).await.unwrap();
        }

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(planner.store().load().unwrap(), Some(graph.clone()));

        assert!(planner.undo(&mut graph).await.unwrap());
        assert!(!graph.contains("B-C"));
        assert_eq!(graph.edge_count(), 1);

        assert!(planner.redo(&mut graph).await.unwrap());
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(state(&graph, "B-C"), CannotTake);
    }

    #[tokio::test]
    async fn test_autosave() {
        let mut planner = Planner::new(catalog()).with_store(MemoryStore::new("plan"));
        let mut graph = FlowGraph::new();

        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        assert_eq!(planner.store().saves(), 1);
        assert_eq!(planner.store().load().unwrap(), Some(graph.clone()));

        let mut planner = Planner::new(catalog()).with_store(BrokenStore);
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();
        assert!(graph.contains("CS201"));
    }

    #[tokio::test]
    async fn test_without_collaborators() {
        let mut planner = Planner::new(catalog()).with_layout(()).with_history(());
        let mut graph = FlowGraph::new();

        planner.insert_course(&mut graph, "CS101", true).await.unwrap();
        planner.insert_course(&mut graph, "CS201", false).await.unwrap();

        assert_eq!(graph.node("CS201").unwrap().position, Default::default());
        assert_eq!(state(&graph, "CS201"), CanTake);
    }
}
