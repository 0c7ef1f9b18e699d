//! Form definition types and loading.
//!
//! A form definition is an ordered list of question specifications,
//! possibly with nested field groups, repeatable groups and conditional
//! follow-ups. Definitions are data files (JSON or YAML) loaded once and
//! shared read-only across sessions.

pub mod definition;
pub mod loader;

pub use definition::{Constraints, QuestionKind, QuestionSpec};
pub use loader::QuestionGraph;
