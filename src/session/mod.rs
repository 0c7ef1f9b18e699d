//! Session state and the conversational state machine.
//!
//! One `Session` is one user's walk through a loaded question graph. The
//! graph is read-only and shared; all mutable progress lives in
//! [`SessionState`], which is owned by exactly one session and mutated by
//! at most one caller at a time. `SessionState` is the checkpoint:
//! serialize it to persist a session, deserialize and reattach it to the
//! same graph to resume.

pub mod engine;
pub mod prompt;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::{AnswerValue, GroupValue};

pub use engine::{CompletedAnswer, CompletedForm, Session, SubmitOutcome};
pub use prompt::{Progress, Prompt};

/// One accepted answer. Created when validation succeeds; patched in
/// place on a simple edit; discarded past the edit point on a branching
/// edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub value: AnswerValue,
    /// Original user input, kept for audit and edit prefill.
    pub raw_input: String,
    /// Position in the completed-order list.
    pub sequence_index: usize,
}

/// Where inside the current top-level question the cursor sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Slot {
    /// Asking the top-level question itself (scalar kinds).
    Question,
    /// Asking field `field` of a plain group.
    GroupField { field: usize },
    /// Asking field `field` of repeat instance `instance` (0-based).
    RepeatField { instance: usize, field: usize },
    /// Asking "add another?" after instance `instance` completed.
    RepeatContinue { instance: usize },
    /// Asking a conditionally inserted follow-up question.
    FollowUp { id: String },
}

/// Cursor over the question graph: current top-level index plus the
/// position inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub top_index: usize,
    pub slot: Slot,
}

/// What the engine expects from the next `submit_answer` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    /// Normal walking: the next input answers the question at the cursor.
    Answering,
    /// The edit menu is showing: the next input selects an answer or
    /// cancels. `was_complete` restores the terminal state on cancel.
    SelectingEdit { was_complete: bool },
    /// Re-asking an edited question: the next input is its new answer.
    EditingAnswer {
        target_seq: usize,
        branching: bool,
        was_complete: bool,
    },
    /// Terminal. Ordinary answers are rejected; edit triggers still open
    /// the menu.
    Done,
}

/// The mutable heart of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub(crate) cursor: Cursor,
    pub(crate) mode: Mode,
    /// Insertion order doubles as the edit-navigation history.
    pub(crate) completed: Vec<AnswerRecord>,
    /// Field answers for the plain group currently being walked.
    pub(crate) group_buffer: GroupValue,
    /// Field answers for the repeat instance currently being filled.
    pub(crate) instance_buffer: GroupValue,
    /// Completed instances of the repeat group currently being walked.
    pub(crate) instances: Vec<GroupValue>,
    pub(crate) retry_count: u32,
    pub(crate) last_error: Option<String>,
}

impl SessionState {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            cursor,
            mode: Mode::Answering,
            completed: Vec::new(),
            group_buffer: BTreeMap::new(),
            instance_buffer: BTreeMap::new(),
            instances: Vec::new(),
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn completed_answers(&self) -> &[AnswerRecord] {
        &self.completed
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.mode, Mode::Done)
    }

    /// Append an accepted answer, assigning the next sequence index.
    pub(crate) fn push_record(&mut self, question_id: &str, value: AnswerValue, raw_input: &str) {
        let sequence_index = self.completed.len();
        self.completed.push(AnswerRecord {
            question_id: question_id.to_string(),
            value,
            raw_input: raw_input.to_string(),
            sequence_index,
        });
    }

    /// Drop every record with a sequence index greater than `seq`.
    pub(crate) fn truncate_after(&mut self, seq: usize) {
        self.completed.truncate(seq + 1);
    }

    pub(crate) fn clear_buffers(&mut self) {
        self.group_buffer.clear();
        self.instance_buffer.clear();
        self.instances.clear();
        self.retry_count = 0;
        self.last_error = None;
    }
}
