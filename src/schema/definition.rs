//! Question specification types.
//!
//! These mirror the persisted definition format: each question object has
//! an `id`, a `question` text, a `type`, and optionally `options`,
//! `other_specify`, `fields` (nested) and `followup_if_yes`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The kind of answer a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    /// Free text that may span several lines. Legacy `table` follow-ups
    /// are downgraded to this kind, as the original questionnaire did.
    #[serde(alias = "table")]
    MultilineText,
    Number,
    Date,
    Time,
    Boolean,
    SingleChoice,
    MultipleChoice,
    Group,
    RepeatGroup,
}

impl QuestionKind {
    /// Choice kinds carry an options list.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }

    /// Composite kinds carry nested fields and are walked field by field.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Group | Self::RepeatGroup)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultilineText => "multiline_text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Boolean => "boolean",
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Group => "group",
            Self::RepeatGroup => "repeat_group",
        }
    }
}

/// Validation constraints attached to a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Minimum numeric value (number questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum numeric value (number questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Earliest acceptable date (date questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    /// Latest acceptable date (date questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
    /// Maximum answer length in characters (text questions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_date.is_none()
            && self.max_date.is_none()
            && self.max_length.is_none()
    }
}

/// One question definition. Immutable once loaded; sessions reference
/// questions by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Unique across the whole graph, including nested fields.
    pub id: String,

    /// Prompt text shown to the user.
    #[serde(rename = "question")]
    pub prompt: String,

    #[serde(rename = "type")]
    pub kind: QuestionKind,

    /// Explicit required flag. When absent, the question is required
    /// unless its prompt ends with "(optional)".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Ordered options for choice kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Whether an "Other: ..." answer is accepted for choice kinds.
    #[serde(default, rename = "other_specify", skip_serializing_if = "std::ops::Not::not")]
    pub allow_other: bool,

    /// Nested fields for group / repeat_group kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<QuestionSpec>,

    /// Conditionally inserted question when a boolean answer is true.
    #[serde(default, rename = "followup_if_yes", skip_serializing_if = "Option::is_none")]
    pub follow_up_when_true: Option<Box<QuestionSpec>>,

    /// Label for one repetition of a repeat_group ("Vehicle"). Defaults
    /// to "Entry".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,

    #[serde(flatten)]
    pub constraints: Constraints,
}

impl QuestionSpec {
    /// Whether a blank answer is rejected for this question.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or_else(|| {
            !self
                .prompt
                .trim_end()
                .to_lowercase()
                .ends_with("(optional)")
        })
    }

    /// Label used for one repeat-group instance in prompts.
    pub fn item_label(&self) -> &str {
        self.item_label.as_deref().unwrap_or("Entry")
    }

    /// Minimal constructor for programmatic schemas (tests, adapters).
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            required: None,
            options: Vec::new(),
            allow_other: false,
            fields: Vec::new(),
            follow_up_when_true: None,
            item_label: None,
            constraints: Constraints::default(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_other(mut self) -> Self {
        self.allow_other = true;
        self
    }

    pub fn with_fields(mut self, fields: Vec<QuestionSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_follow_up(mut self, follow_up: QuestionSpec) -> Self {
        self.follow_up_when_true = Some(Box::new(follow_up));
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }
}
