#![forbid(unsafe_code)]
//! Course flows: graphs of courses whose eligibility follows from the courses
//! marked as taken.
//!
//! A [`FlowGraph`] holds the courses of one plan and the prerequisite edges
//! between them. Every course is either [`Taken`](EligibilityState::Taken),
//! [`CanTake`](EligibilityState::CanTake) or
//! [`CannotTake`](EligibilityState::CannotTake). Only prerequisites that are in
//! the flow count: a course whose prerequisites were never added is takeable.
//!
//! Flows are edited through a [`Planner`], which fetches course data from a
//! [`CourseCatalog`], keeps every state consistent after each mutation and
//! hands the result to a [`Layout`], an [`UndoStack`] and a [`FlowStore`].
//! The [`engine`] module exposes the synchronous building blocks for callers
//! that manage the graph themselves.

mod catalog;
mod core;
mod element;
pub mod engine;
mod error;
mod graph;
mod history;
mod layout;
mod planner;
mod store;
mod utils;

pub use crate::catalog::{CourseCatalog, CourseRecord, StaticCatalog};
pub use crate::core::{CourseId, EligibilityState, Metadata, Position};
pub use crate::element::{EdgeElement, Element, NodeData, NodeElement};
pub use crate::error::*;
pub use crate::graph::{Edge, EdgeId, FlowGraph, Node};
pub use crate::history::{SnapshotHistory, UndoStack};
pub use crate::layout::{LayeredLayout, Layout, LayoutOptions, Orientation};
pub use crate::planner::{Planner, SubtreeImport};
pub use crate::store::{FlowStore, MemoryStore};
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;
