//! The synchronous core of the planner.
//!
//! Three operations keep a [`FlowGraph`](crate::FlowGraph) consistent:
//!
//! * [`classify`] derives the eligibility of one course from the courses in
//!   the flow.
//! * [`synthesize`] materializes prerequisite edges between a course and the
//!   rest of the flow.
//! * [`propagate`] walks outward from a changed course and reclassifies
//!   everything downstream of it.
//!
//! None of them fail on a well-formed graph and none of them suspend. The
//! [`Planner`](crate::Planner) sequences them around the asynchronous catalog
//! lookup.

mod classify;
mod propagate;
mod synthesize;

pub(crate) use crate::engine::classify::eligibility;
pub use crate::engine::classify::classify;
pub use crate::engine::propagate::{Propagation, propagate};
pub use crate::engine::synthesize::synthesize;
