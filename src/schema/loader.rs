//! Schema loading and structural validation.
//!
//! `QuestionGraph::load` runs the structural checks that make the graph
//! safe to walk at runtime: unique ids everywhere, non-empty options on
//! choice questions, non-empty scalar-only fields on groups, follow-ups
//! only on booleans. A graph that loads never produces a schema error
//! during a session.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::definition::{QuestionKind, QuestionSpec};

/// On-disk shape of a form definition file.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    title: String,
    questions: Vec<QuestionSpec>,
}

/// A loaded, validated form definition. Read-only and safely shared
/// across sessions (wrap in `Arc`).
#[derive(Debug)]
pub struct QuestionGraph {
    title: String,
    questions: Vec<QuestionSpec>,
    /// id -> spec, covering nested fields and follow-ups.
    index: HashMap<String, QuestionSpec>,
    /// id -> index of the top-level question containing it.
    top_of: HashMap<String, usize>,
}

impl QuestionGraph {
    /// Validate an ordered question list and build the lookup indexes.
    pub fn load(title: impl Into<String>, questions: Vec<QuestionSpec>) -> SchemaResult<Arc<Self>> {
        if questions.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::new();
        let mut top_of = HashMap::new();
        for (top, question) in questions.iter().enumerate() {
            check_top_level(question)?;
            register(question, top, &mut index, &mut top_of)?;
        }

        let graph = Self {
            title: title.into(),
            questions,
            index,
            top_of,
        };
        info!(
            title = %graph.title,
            questions = graph.questions.len(),
            ids = graph.index.len(),
            "form schema loaded"
        );
        Ok(Arc::new(graph))
    }

    /// Load from a JSON definition string.
    pub fn from_json_str(json: &str) -> SchemaResult<Arc<Self>> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Self::load(file.title, file.questions)
    }

    /// Load from a YAML definition string.
    pub fn from_yaml_str(yaml: &str) -> SchemaResult<Arc<Self>> {
        let file: SchemaFile = serde_yaml::from_str(yaml)?;
        Self::load(file.title, file.questions)
    }

    /// Load a definition file, dispatching on the extension.
    pub fn from_file(path: &Path) -> SchemaResult<Arc<Self>> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(SchemaError::UnsupportedExtension {
                extension: other.unwrap_or("").to_string(),
            }),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of top-level questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Top-level question at `index`.
    pub fn question_at(&self, index: usize) -> Option<&QuestionSpec> {
        self.questions.get(index)
    }

    /// Any question (top-level, nested field or follow-up) by id.
    pub fn spec(&self, id: &str) -> Option<&QuestionSpec> {
        self.index.get(id)
    }

    /// Index of the top-level question containing `id`.
    pub fn top_index_of(&self, id: &str) -> Option<usize> {
        self.top_of.get(id).copied()
    }

    pub fn questions(&self) -> impl Iterator<Item = &QuestionSpec> {
        self.questions.iter()
    }
}

/// Structural checks valid only for top-level questions.
fn check_top_level(question: &QuestionSpec) -> SchemaResult<()> {
    if question.kind.is_composite() && question.fields.is_empty() {
        return Err(SchemaError::EmptyFields {
            id: question.id.clone(),
        });
    }
    Ok(())
}

/// Recursively validate one question and register it in the indexes.
fn register(
    question: &QuestionSpec,
    top: usize,
    index: &mut HashMap<String, QuestionSpec>,
    top_of: &mut HashMap<String, usize>,
) -> SchemaResult<()> {
    if index.contains_key(&question.id) {
        return Err(SchemaError::DuplicateId {
            id: question.id.clone(),
        });
    }

    if question.kind.is_choice() && question.options.is_empty() {
        return Err(SchemaError::EmptyOptions {
            id: question.id.clone(),
        });
    }

    if question.follow_up_when_true.is_some() && question.kind != QuestionKind::Boolean {
        return Err(SchemaError::FollowUpOnNonBoolean {
            id: question.id.clone(),
        });
    }

    check_constraints(question)?;

    index.insert(question.id.clone(), question.clone());
    top_of.insert(question.id.clone(), top);

    for field in &question.fields {
        if field.kind.is_composite() {
            return Err(SchemaError::InvalidNesting {
                id: question.id.clone(),
                detail: format!(
                    "field '{}' is a {}; groups may only contain scalar fields",
                    field.id,
                    field.kind.label()
                ),
            });
        }
        register(field, top, index, top_of)?;
    }

    if let Some(follow_up) = &question.follow_up_when_true {
        if follow_up.kind.is_composite() {
            return Err(SchemaError::InvalidNesting {
                id: question.id.clone(),
                detail: format!(
                    "follow-up '{}' is a {}; follow-ups must be scalar questions",
                    follow_up.id,
                    follow_up.kind.label()
                ),
            });
        }
        register(follow_up, top, index, top_of)?;
    }

    Ok(())
}

fn check_constraints(question: &QuestionSpec) -> SchemaResult<()> {
    let c = &question.constraints;
    if let (Some(min), Some(max)) = (c.min, c.max) {
        if min > max {
            return Err(SchemaError::InvalidConstraint {
                id: question.id.clone(),
                detail: format!("min {} is greater than max {}", min, max),
            });
        }
    }
    if let (Some(min), Some(max)) = (c.min_date, c.max_date) {
        if min > max {
            return Err(SchemaError::InvalidConstraint {
                id: question.id.clone(),
                detail: format!("min_date {} is after max_date {}", min, max),
            });
        }
    }
    Ok(())
}
