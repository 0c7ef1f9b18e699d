//! Render-ready prompt descriptors.
//!
//! The engine never exposes raw `QuestionSpec`s to the presentation
//! layer: it hands out a `Prompt`, which carries everything an adapter
//! needs to render the current question (text, choice affordances,
//! format hint, edit prefill, progress). `render()` produces plain text
//! using only the descriptor's own fields.

use serde::Serialize;

use crate::schema::{QuestionGraph, QuestionKind, QuestionSpec};
use crate::session::{AnswerRecord, SessionState, Slot};

/// How far through the form the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Completed top-level answers.
    pub answered: usize,
    /// Total top-level questions.
    pub total: usize,
}

/// A render-ready description of the question currently being asked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub question_id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub allow_multiple: bool,
    pub allow_other: bool,
    pub hint: Option<String>,
    /// Current value when re-asking an edited question.
    pub prefill: Option<String>,
    pub progress: Progress,
}

impl Prompt {
    fn for_spec(spec: &QuestionSpec, text: String, progress: Progress) -> Self {
        Self {
            question_id: spec.id.clone(),
            text,
            kind: spec.kind,
            options: spec.options.clone(),
            allow_multiple: spec.kind == QuestionKind::MultipleChoice,
            allow_other: spec.allow_other,
            hint: kind_hint(spec.kind).map(str::to_string),
            prefill: None,
            progress,
        }
    }

    pub fn with_prefill(mut self, prefill: String) -> Self {
        self.prefill = Some(prefill);
        self
    }

    /// Plain-text rendering for console-style adapters.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Question {}/{}",
            self.progress.answered + 1,
            self.progress.total
        ));
        lines.push(self.text.clone());
        if !self.options.is_empty() {
            lines.push("Options:".to_string());
            for (i, option) in self.options.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, option));
            }
            if self.allow_other {
                lines.push("  (you can also answer \"Other: ...\")".to_string());
            }
            if self.allow_multiple {
                lines.push("  (separate multiple answers with commas)".to_string());
            }
        }
        if let Some(hint) = &self.hint {
            lines.push(format!("({})", hint));
        }
        if let Some(prefill) = &self.prefill {
            lines.push(format!("Current answer: {}", prefill));
        }
        lines.join("\n")
    }
}

fn kind_hint(kind: QuestionKind) -> Option<&'static str> {
    match kind {
        QuestionKind::Date => Some("Format: YYYY-MM-DD, e.g. 2025-06-12"),
        QuestionKind::Time => Some("Format: HH:MM, e.g. 14:35"),
        QuestionKind::Number => Some("Please enter a number"),
        QuestionKind::Boolean => Some("Please answer yes or no"),
        QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
            Some("Pick a number or type the option")
        }
        _ => None,
    }
}

/// Build the prompt for the session's current cursor position.
pub(crate) fn for_cursor(graph: &QuestionGraph, state: &SessionState) -> Option<Prompt> {
    let question = graph.question_at(state.cursor.top_index)?;
    // Record counts overshoot once follow-ups land; the header tracks
    // the top-level position.
    let progress = Progress {
        answered: state.cursor.top_index,
        total: graph.len(),
    };

    let prompt = match &state.cursor.slot {
        Slot::Question => Prompt::for_spec(question, question.prompt.clone(), progress),
        Slot::FollowUp { id } => {
            let follow_up = graph.spec(id)?;
            Prompt::for_spec(follow_up, follow_up.prompt.clone(), progress)
        }
        Slot::GroupField { field } => {
            let field_spec = question.fields.get(*field)?;
            let text = if *field == 0 {
                // Announce the group before its first part.
                format!(
                    "{}\nI'll ask each part of this one step at a time.\n{}",
                    question.prompt, field_spec.prompt
                )
            } else {
                format!("{} (part {}/{})", field_spec.prompt, field + 1, question.fields.len())
            };
            Prompt::for_spec(field_spec, text, progress)
        }
        Slot::RepeatField { instance, field } => {
            let field_spec = question.fields.get(*field)?;
            let label = question.item_label();
            let text = if *instance == 0 && *field == 0 {
                format!(
                    "{}\nI'll ask about each {} separately, one question at a time.\n{} {} - {}",
                    question.prompt,
                    label.to_lowercase(),
                    label,
                    instance + 1,
                    field_spec.prompt
                )
            } else {
                format!("{} {} - {}", label, instance + 1, field_spec.prompt)
            };
            Prompt::for_spec(field_spec, text, progress)
        }
        Slot::RepeatContinue { instance } => {
            let label = question.item_label();
            let text = format!(
                "{} {} recorded. Add another {}?",
                label,
                instance + 1,
                label.to_lowercase()
            );
            Prompt {
                question_id: question.id.clone(),
                text,
                kind: QuestionKind::Boolean,
                options: Vec::new(),
                allow_multiple: false,
                allow_other: false,
                hint: kind_hint(QuestionKind::Boolean).map(str::to_string),
                prefill: None,
                progress,
            }
        }
    };
    Some(prompt)
}

/// Re-ask prompt for an answer being revised, with the recorded input
/// prefilled.
pub(crate) fn for_edit(graph: &QuestionGraph, record: &AnswerRecord) -> Option<Prompt> {
    let spec = graph.spec(&record.question_id)?;
    let progress = Progress {
        answered: graph.top_index_of(&record.question_id).unwrap_or(0),
        total: graph.len(),
    };
    let text = format!("Changing your answer to: {}", spec.prompt);
    Some(Prompt::for_spec(spec, text, progress).with_prefill(record.raw_input.clone()))
}
