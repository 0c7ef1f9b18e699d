//! formwalk: a conversational form-filling engine.
//!
//! A form is declared as a graph of typed questions (JSON or YAML) and
//! walked one question at a time. Each user reply is validated against
//! the question's type and constraints; failures re-ask the question,
//! successes advance a cursor through groups, repeatable groups, and
//! conditional follow-ups until the walk completes. At any point the
//! user can type an edit phrase ("change answer") to revise a previous
//! reply, with downstream answers discarded only when the revision
//! changes the path taken.
//!
//! The engine is presentation-agnostic: it consumes strings and emits
//! [`session::Prompt`] descriptors, so the same session drives a
//! console, a chat bot, or a web form. All mutable progress lives in
//! [`session::SessionState`], which serializes as the checkpoint.
//!
//! ```
//! use formwalk::schema::QuestionGraph;
//! use formwalk::session::{Session, SubmitOutcome};
//!
//! let graph = QuestionGraph::from_json_str(r#"{
//!     "title": "Quick check",
//!     "questions": [
//!         { "id": "injured", "question": "Was anyone injured?", "type": "boolean" },
//!         { "id": "summary", "question": "What happened?", "type": "text" }
//!     ]
//! }"#)?;
//!
//! let mut session = Session::new(graph);
//! session.submit_answer("no")?;
//! match session.submit_answer("A shelf fell over.")? {
//!     SubmitOutcome::Complete { form } => {
//!         assert_eq!(form.answers.len(), 2);
//!     }
//!     other => panic!("expected completion, got {other:?}"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod navigation;
pub mod schema;
pub mod session;
pub mod validate;

pub use error::{EngineError, NavigationError, SchemaError, ValidationError};
pub use schema::{QuestionGraph, QuestionKind, QuestionSpec};
pub use session::{CompletedForm, Prompt, Session, SessionState, SubmitOutcome};
pub use validate::AnswerValue;
