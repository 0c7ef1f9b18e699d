//! Per-field answer validation and normalization.
//!
//! `validate` is a pure function from (question spec, raw input) to a
//! typed normalized value or a recoverable [`ValidationError`]. The same
//! pair always yields the same result; nothing here touches I/O or
//! session state.

pub mod choice;
pub mod composite;
pub mod scalar;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationResult;
use crate::schema::{QuestionKind, QuestionSpec};

/// Aggregated answers for one group (or one repeat-group instance).
pub type GroupValue = BTreeMap<String, AnswerValue>;

/// A single-choice answer: the canonical option, plus the free-text
/// specification when the option is "Other".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceValue {
    pub choice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// A multiple-choice answer: matched options in specification order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChoiceValue {
    pub selected: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// The typed, validated representation of a raw user answer. The shape
/// is fixed per question kind; there is no open/dynamic map at this
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Time(NaiveTime),
    Bool(bool),
    Choice(ChoiceValue),
    MultiChoice(MultiChoiceValue),
    Group(GroupValue),
    /// One record per completed repeat-group instance, in entry order.
    Instances(Vec<GroupValue>),
}

impl AnswerValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Canonical stringification: `validate(spec, canonical_text(v))`
    /// yields `v` back for every kind. Used for edit prefill.
    pub fn canonical_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Time(t) => t.format("%H:%M").to_string(),
            Self::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
            Self::Choice(c) => match &c.other {
                Some(other) => format!("Other: {}", other),
                None => c.choice.clone(),
            },
            Self::MultiChoice(m) => {
                let mut parts = m.selected.clone();
                if let Some(other) = &m.other {
                    parts.push(format!("Other: {}", other));
                }
                parts.join(", ")
            }
            Self::Group(_) | Self::Instances(_) => self.to_json().to_string(),
        }
    }

    /// Natural JSON shape for form export: scalars stay scalar, a plain
    /// choice is its option string, an "Other" choice is an object.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Value::from(*n)
                }
            }
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => serde_json::Value::String(t.format("%H:%M").to_string()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Choice(c) => match &c.other {
                Some(other) => serde_json::json!({ "choice": c.choice, "other": other }),
                None => serde_json::Value::String(c.choice.clone()),
            },
            Self::MultiChoice(m) => match &m.other {
                Some(other) => serde_json::json!({ "choices": m.selected, "other": other }),
                None => serde_json::Value::from(m.selected.clone()),
            },
            Self::Group(map) => group_to_json(map),
            Self::Instances(list) => {
                serde_json::Value::Array(list.iter().map(group_to_json).collect())
            }
        }
    }
}

fn group_to_json(map: &GroupValue) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (id, value) in map {
        obj.insert(id.clone(), value.to_json());
    }
    serde_json::Value::Object(obj)
}

/// Render an f64 without a trailing ".0" for whole numbers.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Validate one raw reply against one question spec.
pub fn validate(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    match spec.kind {
        QuestionKind::Text | QuestionKind::MultilineText => scalar::parse_text(spec, raw),
        QuestionKind::Number => scalar::parse_number(spec, raw),
        QuestionKind::Date => scalar::parse_date(spec, raw),
        QuestionKind::Time => scalar::parse_time(raw),
        QuestionKind::Boolean => scalar::parse_boolean(raw),
        QuestionKind::SingleChoice => choice::parse_single(spec, raw),
        QuestionKind::MultipleChoice => choice::parse_multiple(spec, raw),
        QuestionKind::Group => composite::parse_group(spec, raw),
        QuestionKind::RepeatGroup => composite::parse_instances(spec, raw),
    }
}
