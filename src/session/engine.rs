//! The session engine: a hand-rolled finite-state machine that walks a
//! question graph one reply at a time.
//!
//! ## Routing
//!
//! ```text
//! Asking ──► AwaitingInput ──► Validating ──► AdvancingOrBranching ──► ...
//!                 │                  │
//!                 │ edit trigger     └── failure ──► Retrying (same question)
//!                 ▼
//!            Edit menu ──► Simple / Branching edit (navigation planner)
//! ```
//!
//! After each accepted answer, routing precedence is: remaining fields of
//! the current repeat instance, the "add another?" prompt, remaining
//! fields of the current group, the follow-up of a just-answered true
//! boolean, then the next top-level question or completion. Validation
//! failures re-ask the same question with no retry limit. `Complete` is
//! terminal for ordinary answers but still honors edit triggers.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult, NavigationError};
use crate::navigation::planner::{self, EditMenu, EditPlan, Selection};
use crate::schema::{QuestionGraph, QuestionKind, QuestionSpec};
use crate::session::prompt::{self, Prompt};
use crate::session::{Cursor, Mode, SessionState, Slot};
use crate::validate::{self, scalar, AnswerValue};

/// The result of feeding one user reply into the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The answer was recorded; here is what to ask next.
    Accepted { prompt: Prompt },
    /// Validation failed; re-ask the same question with the error.
    Retry { error: String, prompt: Prompt },
    /// The user asked to revise a previous answer; render the menu.
    EditMenu { menu: EditMenu },
    /// The walk reached the end of the graph.
    Complete { form: CompletedForm },
}

/// One entry of the completed form, in completion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedAnswer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// The finished form: every accepted answer keyed by question id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedForm {
    pub title: String,
    pub answers: Vec<CompletedAnswer>,
}

impl CompletedForm {
    pub fn value_of(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| &a.value)
    }

    /// Natural JSON export: `{ "form_title": ..., "responses": {...} }`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut responses = serde_json::Map::new();
        for answer in &self.answers {
            responses.insert(answer.question_id.clone(), answer.value.to_json());
        }
        serde_json::json!({
            "form_title": self.title,
            "responses": responses,
        })
    }
}

/// One user's walk through a question graph.
pub struct Session {
    graph: Arc<QuestionGraph>,
    state: SessionState,
}

impl Session {
    /// Fresh session positioned at the first question.
    pub fn new(graph: Arc<QuestionGraph>) -> Self {
        let state = SessionState::new(enter(&graph, 0));
        info!(session_id = %state.session_id, form = %graph.title(), "session started");
        Self { graph, state }
    }

    /// Reattach a checkpointed state to its graph.
    pub fn resume(graph: Arc<QuestionGraph>, state: SessionState) -> Self {
        Self { graph, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Render-ready descriptor of the question currently being asked.
    /// `None` when the form is complete or the edit menu is showing
    /// (see [`Session::edit_menu`]).
    pub fn current_prompt(&self) -> Option<Prompt> {
        match &self.state.mode {
            Mode::Answering => prompt::for_cursor(&self.graph, &self.state),
            Mode::EditingAnswer { target_seq, .. } => {
                let record = self.state.completed.get(*target_seq)?;
                prompt::for_edit(&self.graph, record)
            }
            Mode::SelectingEdit { .. } | Mode::Done => None,
        }
    }

    /// The edit menu, when one is showing.
    pub fn edit_menu(&self) -> Option<EditMenu> {
        match self.state.mode {
            Mode::SelectingEdit { .. } => {
                Some(planner::build_menu(&self.graph, &self.state.completed, None))
            }
            _ => None,
        }
    }

    /// The finished form. Callable only once the walk is complete.
    pub fn completed_form(&self) -> EngineResult<CompletedForm> {
        if !self.is_complete() {
            return Err(EngineError::FormNotComplete);
        }
        Ok(self.build_form())
    }

    /// Open the edit menu programmatically, exactly as the trigger
    /// phrases do.
    pub fn request_edit(&mut self) -> EngineResult<SubmitOutcome> {
        match self.state.mode.clone() {
            Mode::Done => self.open_edit_menu(true),
            Mode::Answering => self.open_edit_menu(false),
            Mode::SelectingEdit { .. } => Ok(SubmitOutcome::EditMenu {
                menu: planner::build_menu(&self.graph, &self.state.completed, None),
            }),
            Mode::EditingAnswer { was_complete, .. } => self.open_edit_menu(was_complete),
        }
    }

    /// Feed one user reply into the state machine.
    pub fn submit_answer(&mut self, raw: &str) -> EngineResult<SubmitOutcome> {
        match self.state.mode.clone() {
            Mode::Done => {
                if planner::is_edit_trigger(raw) {
                    self.open_edit_menu(true)
                } else {
                    Err(EngineError::FormAlreadyComplete)
                }
            }
            Mode::Answering => {
                if planner::is_edit_trigger(raw) {
                    self.open_edit_menu(false)
                } else {
                    self.handle_answer(raw)
                }
            }
            Mode::SelectingEdit { was_complete } => self.handle_selection(raw, was_complete),
            Mode::EditingAnswer {
                target_seq,
                branching,
                was_complete,
            } => {
                if planner::is_edit_trigger(raw) {
                    self.open_edit_menu(was_complete)
                } else {
                    self.handle_edit_answer(raw, target_seq, branching, was_complete)
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Normal walking
    // -----------------------------------------------------------------

    fn handle_answer(&mut self, raw: &str) -> EngineResult<SubmitOutcome> {
        let cursor = self.state.cursor.clone();
        let question = self
            .graph
            .question_at(cursor.top_index)
            .ok_or_else(|| EngineError::UnknownQuestion {
                id: format!("top-level #{}", cursor.top_index),
            })?
            .clone();

        match cursor.slot {
            Slot::Question => self.answer_scalar(&question, raw),
            Slot::FollowUp { id } => {
                let follow_up = self
                    .graph
                    .spec(&id)
                    .ok_or(EngineError::UnknownQuestion { id })?
                    .clone();
                self.answer_scalar(&follow_up, raw)
            }
            Slot::GroupField { field } => self.answer_group_field(&question, field, raw),
            Slot::RepeatField { instance, field } => {
                self.answer_repeat_field(&question, instance, field, raw)
            }
            Slot::RepeatContinue { instance } => {
                self.answer_repeat_continue(&question, instance, raw)
            }
        }
    }

    fn answer_scalar(&mut self, spec: &QuestionSpec, raw: &str) -> EngineResult<SubmitOutcome> {
        let value = match validate::validate(spec, raw) {
            Ok(value) => value,
            Err(e) => return self.retry(e.to_string()),
        };
        self.accept();
        self.state.push_record(&spec.id, value.clone(), raw.trim());
        debug!(question = %spec.id, "answer accepted");

        // A true boolean with a follow-up inserts a virtual next step.
        if let Some(follow_up) = &spec.follow_up_when_true {
            if value.as_bool() == Some(true) {
                self.state.cursor.slot = Slot::FollowUp {
                    id: follow_up.id.clone(),
                };
                return self.accepted();
            }
        }
        self.advance_top()
    }

    fn answer_group_field(
        &mut self,
        question: &QuestionSpec,
        field: usize,
        raw: &str,
    ) -> EngineResult<SubmitOutcome> {
        let field_spec =
            question
                .fields
                .get(field)
                .ok_or_else(|| EngineError::UnknownQuestion {
                    id: format!("{}[{}]", question.id, field),
                })?;
        let value = match validate::validate(field_spec, raw) {
            Ok(value) => value,
            Err(e) => return self.retry(e.to_string()),
        };
        self.accept();
        self.state.group_buffer.insert(field_spec.id.clone(), value);

        if field + 1 < question.fields.len() {
            self.state.cursor.slot = Slot::GroupField { field: field + 1 };
            return self.accepted();
        }

        // Last field: aggregate the whole group into one record.
        let map = std::mem::take(&mut self.state.group_buffer);
        let value = AnswerValue::Group(map);
        let canonical = value.canonical_text();
        self.state.push_record(&question.id, value, &canonical);
        debug!(question = %question.id, "group completed");
        self.advance_top()
    }

    fn answer_repeat_field(
        &mut self,
        question: &QuestionSpec,
        instance: usize,
        field: usize,
        raw: &str,
    ) -> EngineResult<SubmitOutcome> {
        let field_spec =
            question
                .fields
                .get(field)
                .ok_or_else(|| EngineError::UnknownQuestion {
                    id: format!("{}[{}]", question.id, field),
                })?;
        let value = match validate::validate(field_spec, raw) {
            Ok(value) => value,
            Err(e) => return self.retry(e.to_string()),
        };
        self.accept();
        self.state
            .instance_buffer
            .insert(field_spec.id.clone(), value);

        if field + 1 < question.fields.len() {
            self.state.cursor.slot = Slot::RepeatField {
                instance,
                field: field + 1,
            };
            return self.accepted();
        }

        // Instance finished; ask whether to add another.
        let done = std::mem::take(&mut self.state.instance_buffer);
        self.state.instances.push(done);
        debug!(question = %question.id, instance, "repeat instance completed");
        self.state.cursor.slot = Slot::RepeatContinue { instance };
        self.accepted()
    }

    fn answer_repeat_continue(
        &mut self,
        question: &QuestionSpec,
        instance: usize,
        raw: &str,
    ) -> EngineResult<SubmitOutcome> {
        let more = match scalar::parse_boolean(raw) {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(e) => return self.retry(e.to_string()),
        };
        self.accept();

        if more {
            self.state.cursor.slot = Slot::RepeatField {
                instance: instance + 1,
                field: 0,
            };
            return self.accepted();
        }

        // Flatten all instances into one record for the repeat-group id.
        let list = std::mem::take(&mut self.state.instances);
        let value = AnswerValue::Instances(list);
        let canonical = value.canonical_text();
        self.state.push_record(&question.id, value, &canonical);
        debug!(question = %question.id, "repeat group completed");
        self.advance_top()
    }

    /// Move past the current top-level question.
    fn advance_top(&mut self) -> EngineResult<SubmitOutcome> {
        let next = self.state.cursor.top_index + 1;
        if next >= self.graph.len() {
            self.state.mode = Mode::Done;
            info!(
                session_id = %self.state.session_id,
                answers = self.state.completed.len(),
                "form complete"
            );
            return Ok(SubmitOutcome::Complete {
                form: self.build_form(),
            });
        }
        self.state.cursor = enter(&self.graph, next);
        self.accepted()
    }

    // -----------------------------------------------------------------
    // Edit flow
    // -----------------------------------------------------------------

    fn open_edit_menu(&mut self, was_complete: bool) -> EngineResult<SubmitOutcome> {
        if self.state.completed.is_empty() {
            let prompt = self.current_question_prompt()?;
            return Ok(SubmitOutcome::Retry {
                error: NavigationError::NothingToEdit.to_string(),
                prompt,
            });
        }
        self.state.mode = Mode::SelectingEdit { was_complete };
        Ok(SubmitOutcome::EditMenu {
            menu: planner::build_menu(&self.graph, &self.state.completed, None),
        })
    }

    fn handle_selection(&mut self, raw: &str, was_complete: bool) -> EngineResult<SubmitOutcome> {
        let selection = match planner::parse_selection(raw, self.state.completed.len()) {
            Ok(selection) => selection,
            Err(nav) => {
                // Recoverable: re-present the menu with the problem noted.
                return Ok(SubmitOutcome::EditMenu {
                    menu: planner::build_menu(
                        &self.graph,
                        &self.state.completed,
                        Some(nav.to_string()),
                    ),
                });
            }
        };

        match selection {
            Selection::Cancel => {
                // Resume exactly where the session was.
                if was_complete {
                    self.state.mode = Mode::Done;
                    Ok(SubmitOutcome::Complete {
                        form: self.build_form(),
                    })
                } else {
                    self.state.mode = Mode::Answering;
                    self.accepted()
                }
            }
            Selection::Index(target_seq) => {
                match planner::plan(&self.graph, &self.state.completed, target_seq) {
                    EditPlan::ReAsk {
                        target_seq,
                        top_index,
                    } => {
                        // Drop the record and everything after it, then
                        // re-walk from the question's first field.
                        self.state.completed.truncate(target_seq);
                        self.state.clear_buffers();
                        self.state.cursor = enter(&self.graph, top_index);
                        self.state.mode = Mode::Answering;
                        self.accepted()
                    }
                    EditPlan::Simple { target_seq } => {
                        self.state.mode = Mode::EditingAnswer {
                            target_seq,
                            branching: false,
                            was_complete,
                        };
                        self.edit_target_prompt(target_seq)
                    }
                    EditPlan::Branching { target_seq } => {
                        self.state.mode = Mode::EditingAnswer {
                            target_seq,
                            branching: true,
                            was_complete,
                        };
                        self.edit_target_prompt(target_seq)
                    }
                }
            }
        }
    }

    fn handle_edit_answer(
        &mut self,
        raw: &str,
        target_seq: usize,
        branching: bool,
        was_complete: bool,
    ) -> EngineResult<SubmitOutcome> {
        let record = self
            .state
            .completed
            .get(target_seq)
            .cloned()
            .ok_or_else(|| EngineError::UnknownQuestion {
                id: format!("answer #{}", target_seq + 1),
            })?;
        let spec = self
            .graph
            .spec(&record.question_id)
            .ok_or_else(|| EngineError::UnknownQuestion {
                id: record.question_id.clone(),
            })?
            .clone();

        let value = match validate::validate(&spec, raw) {
            Ok(value) => value,
            Err(e) => {
                self.state.retry_count += 1;
                self.state.last_error = Some(e.to_string());
                let prompt = self.edit_prompt_for(target_seq)?;
                return Ok(SubmitOutcome::Retry {
                    error: e.to_string(),
                    prompt,
                });
            }
        };
        self.accept();

        let patched = &mut self.state.completed[target_seq];
        patched.value = value.clone();
        patched.raw_input = raw.trim().to_string();
        info!(question = %spec.id, branching, "answer revised");

        if branching {
            // Everything after the edited answer may have depended on it.
            self.state.truncate_after(target_seq);
            self.state.clear_buffers();
            self.state.mode = Mode::Answering;
            let top_index = self.graph.top_index_of(&spec.id).unwrap_or(0);
            self.state.cursor = Cursor {
                top_index,
                slot: Slot::Question,
            };
            if let Some(follow_up) = &spec.follow_up_when_true {
                if value.as_bool() == Some(true) {
                    self.state.cursor.slot = Slot::FollowUp {
                        id: follow_up.id.clone(),
                    };
                    return self.accepted();
                }
            }
            return self.advance_top();
        }

        // Simple edit: keep position. Two wrinkles around a boolean's
        // own follow-up. When the cursor sits on it and the new value is
        // false, the follow-up no longer applies.
        if let Some(follow_up) = &spec.follow_up_when_true {
            if let Slot::FollowUp { id } = &self.state.cursor.slot {
                if *id == follow_up.id && value.as_bool() == Some(false) {
                    self.state.mode = Mode::Answering;
                    return self.advance_top();
                }
            }
        }

        // And a flip to true must insert the not-yet-answered follow-up
        // before anything else is asked (or before the form stays
        // complete).
        if let Some(follow_up) = &spec.follow_up_when_true {
            let answered = self
                .state
                .completed
                .iter()
                .any(|r| r.question_id == follow_up.id);
            if value.as_bool() == Some(true) && !answered {
                let top_index = self.graph.top_index_of(&spec.id).unwrap_or(0);
                self.state.cursor = Cursor {
                    top_index,
                    slot: Slot::FollowUp {
                        id: follow_up.id.clone(),
                    },
                };
                self.state.mode = Mode::Answering;
                return self.accepted();
            }
        }

        if was_complete {
            self.state.mode = Mode::Done;
            Ok(SubmitOutcome::Complete {
                form: self.build_form(),
            })
        } else {
            self.state.mode = Mode::Answering;
            self.accepted()
        }
    }

    fn edit_target_prompt(&self, target_seq: usize) -> EngineResult<SubmitOutcome> {
        let prompt = self.edit_prompt_for(target_seq)?;
        Ok(SubmitOutcome::Accepted { prompt })
    }

    fn edit_prompt_for(&self, target_seq: usize) -> EngineResult<Prompt> {
        let record =
            self.state
                .completed
                .get(target_seq)
                .ok_or_else(|| EngineError::UnknownQuestion {
                    id: format!("answer #{}", target_seq + 1),
                })?;
        prompt::for_edit(&self.graph, record).ok_or_else(|| {
            EngineError::UnknownQuestion {
                id: record.question_id.clone(),
            }
        })
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    fn accept(&mut self) {
        self.state.retry_count = 0;
        self.state.last_error = None;
    }

    fn retry(&mut self, error: String) -> EngineResult<SubmitOutcome> {
        self.state.retry_count += 1;
        self.state.last_error = Some(error.clone());
        debug!(retry = self.state.retry_count, %error, "validation failed");
        let prompt = self.current_question_prompt()?;
        Ok(SubmitOutcome::Retry { error, prompt })
    }

    fn accepted(&self) -> EngineResult<SubmitOutcome> {
        Ok(SubmitOutcome::Accepted {
            prompt: self.current_question_prompt()?,
        })
    }

    fn current_question_prompt(&self) -> EngineResult<Prompt> {
        prompt::for_cursor(&self.graph, &self.state).ok_or_else(|| EngineError::UnknownQuestion {
            id: format!("top-level #{}", self.state.cursor.top_index),
        })
    }

    fn build_form(&self) -> CompletedForm {
        CompletedForm {
            title: self.graph.title().to_string(),
            answers: self
                .state
                .completed
                .iter()
                .map(|r| CompletedAnswer {
                    question_id: r.question_id.clone(),
                    value: r.value.clone(),
                })
                .collect(),
        }
    }
}

/// Entry cursor for a top-level question: composites start at their
/// first field.
fn enter(graph: &QuestionGraph, top_index: usize) -> Cursor {
    let slot = match graph.question_at(top_index).map(|q| q.kind) {
        Some(QuestionKind::Group) => Slot::GroupField { field: 0 },
        Some(QuestionKind::RepeatGroup) => Slot::RepeatField {
            instance: 0,
            field: 0,
        },
        _ => Slot::Question,
    };
    Cursor { top_index, slot }
}
