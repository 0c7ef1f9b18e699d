//! Answer-revision planning.
//!
//! When the user asks to change a previous reply, the planner decides how
//! invasive the edit is: patch one value in place, or invalidate
//! everything that may have depended on it and re-walk the graph.

pub mod planner;

pub use planner::{is_edit_trigger, EditMenu, EditPlan, MenuEntry, Selection};
