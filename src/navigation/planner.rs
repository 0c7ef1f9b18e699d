//! Edit menu construction and Simple/Branching classification.
//!
//! An edit is Simple when nothing downstream can depend on the answer:
//! patch the record in place and resume where the session was. It is
//! Branching when the answer chose a path (a boolean with a follow-up)
//! or shaped a structure (a group / repeat-group record): then every
//! later answer is discarded and the walk resumes from the edited point.
//! The most recently completed answer is always Simple, since nothing
//! downstream exists yet.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NavigationError, NavigationResult};
use crate::schema::QuestionGraph;
use crate::session::AnswerRecord;

/// Phrases that open the edit menu instead of answering the current
/// question. Matched exactly, case-insensitively.
const EDIT_TRIGGERS: &[&str] = &[
    "change reply",
    "change answer",
    "edit reply",
    "edit answer",
    "modify reply",
    "modify answer",
];

pub fn is_edit_trigger(input: &str) -> bool {
    let trimmed = input.trim();
    EDIT_TRIGGERS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// One line of the edit menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    /// 1-based, in completion order.
    pub index: usize,
    pub question_id: String,
    pub question: String,
    /// Current normalized value, canonical stringification.
    pub current: String,
}

/// The ordered list of completed answers offered for revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMenu {
    pub entries: Vec<MenuEntry>,
    /// Set when the previous selection attempt failed.
    pub note: Option<String>,
}

impl EditMenu {
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(note) = &self.note {
            lines.push(note.clone());
        }
        lines.push("Which answer would you like to change?".to_string());
        for entry in &self.entries {
            lines.push(format!("  {}. {} = {}", entry.index, entry.question, entry.current));
        }
        lines.push("Type a number, or \"cancel\" to keep everything as it is.".to_string());
        lines.join("\n")
    }
}

/// Build the menu from the session's completion history.
pub fn build_menu(graph: &QuestionGraph, completed: &[AnswerRecord], note: Option<String>) -> EditMenu {
    let entries = completed
        .iter()
        .enumerate()
        .map(|(i, record)| MenuEntry {
            index: i + 1,
            question_id: record.question_id.clone(),
            question: graph
                .spec(&record.question_id)
                .map(|s| s.prompt.clone())
                .unwrap_or_else(|| record.question_id.clone()),
            current: truncate(&record.value.canonical_text(), 60),
        })
        .collect();
    EditMenu { entries, note }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// What the user picked from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Cancel,
    /// 0-based sequence index of the chosen record.
    Index(usize),
}

/// Parse a menu reply. `count` is the number of menu entries.
pub fn parse_selection(input: &str, count: usize) -> NavigationResult<Selection> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("cancel") || trimmed.eq_ignore_ascii_case("back") {
        return Ok(Selection::Cancel);
    }
    let n: usize = trimmed
        .parse()
        .map_err(|_| NavigationError::SelectionUnparsable)?;
    if n < 1 || n > count {
        return Err(NavigationError::SelectionOutOfRange { max: count });
    }
    Ok(Selection::Index(n - 1))
}

/// How to apply an edit to the selected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum EditPlan {
    /// Re-validate the new input, patch the record, keep position.
    Simple { target_seq: usize },
    /// Re-validate, patch, discard every later record, resume the walk
    /// immediately after the edited question.
    Branching { target_seq: usize },
    /// Discard the record and everything after it, and re-ask the whole
    /// question from its first field (group / repeat-group targets).
    ReAsk { target_seq: usize, top_index: usize },
}

/// Classify the edit target.
pub fn plan(graph: &QuestionGraph, completed: &[AnswerRecord], target_seq: usize) -> EditPlan {
    let record = &completed[target_seq];
    let spec = graph.spec(&record.question_id);

    // The most recent answer has no downstream to invalidate, except
    // that composite records are still cheaper to re-walk than to patch
    // through a structured payload.
    let most_recent = target_seq + 1 == completed.len();

    let plan = match spec {
        Some(spec) if spec.kind.is_composite() => {
            let top_index = graph
                .top_index_of(&spec.id)
                .unwrap_or(0);
            EditPlan::ReAsk { target_seq, top_index }
        }
        Some(spec) if spec.follow_up_when_true.is_some() && !most_recent => {
            EditPlan::Branching { target_seq }
        }
        _ => EditPlan::Simple { target_seq },
    };

    debug!(
        target = %record.question_id,
        ?plan,
        "edit planned"
    );
    plan
}
