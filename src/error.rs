use std::fmt;

use thiserror::Error;

use crate::core::CourseId;
use crate::graph::EdgeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Course '{0}' is not present in the flow")]
    NodeNotFound(CourseId),

    #[error("Course '{0}' is already present in the flow")]
    DuplicateNode(CourseId),

    #[error("Edge '{edge}' points at course '{missing}' which is not in the flow")]
    DanglingEdge { edge: EdgeId, missing: CourseId },

    #[error("Edge '{edge}' should be named '{expected}' after its endpoints")]
    EdgeIdMismatch { edge: EdgeId, expected: EdgeId },

    #[error("Edge '{0}' appears more than once")]
    DuplicateEdge(EdgeId),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Course '{0}' does not exist")]
    NotFound(CourseId),

    #[error("Couldn't parse course data.\n{0}")]
    Parse(#[from] serde_json::Error),

    #[error("Couldn't read course data.\n{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("Course '{0}' is already present in the flow, it cannot be added")]
    DuplicateCourse(CourseId),

    #[error("Course '{0}' does not exist")]
    UnknownCourse(CourseId),

    #[error("Catalog lookup for '{0}' failed:\n{1}")]
    Catalog(CourseId, CatalogError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl InsertError {
    pub(crate) fn from_catalog(id: &CourseId, err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => InsertError::UnknownCourse(id.clone()),
            err => InsertError::Catalog(id.clone(), err),
        }
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Couldn't encode flow snapshot.\n{0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("Couldn't decode flow snapshot.\n{0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("Flow snapshot is inconsistent.\n{0}")]
    Graph(#[from] GraphError),
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// One or more prerequisites of a course could not be imported. The courses
/// that did import are still in the flow.
#[derive(Debug)]
pub struct PartialSubtreeFailure {
    pub course: CourseId,
    pub inserted: Vec<CourseId>,
    pub failures: Vec<(CourseId, InsertError)>,
}

impl fmt::Display for PartialSubtreeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} prerequisite(s) of '{}' could not be imported:",
            self.failures.len(),
            self.course
        )?;

        for (id, err) in &self.failures {
            write!(f, "\n  {id}: {err}")?;
        }

        Ok(())
    }
}

impl std::error::Error for PartialSubtreeFailure {}
