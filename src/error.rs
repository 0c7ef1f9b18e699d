//! Error types for the form-filling engine.
//!
//! Each concern gets its own thiserror enum: schema problems are fatal at
//! load time and surfaced to the operator; validation and navigation
//! problems are recoverable and surfaced to the end user as retry text;
//! engine errors mark caller misuse of a session.

use thiserror::Error;

/// Fatal errors raised while loading a form definition. These never occur
/// at runtime: a graph that loads is safe to walk.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("schema contains no questions")]
    Empty,

    #[error("duplicate question id '{id}'")]
    DuplicateId { id: String },

    #[error("question '{id}': choice questions need a non-empty options list")]
    EmptyOptions { id: String },

    #[error("question '{id}': group questions need a non-empty fields list")]
    EmptyFields { id: String },

    #[error("question '{id}': {detail}")]
    InvalidNesting { id: String, detail: String },

    #[error("question '{id}': follow-up questions are only valid on boolean questions")]
    FollowUpOnNonBoolean { id: String },

    #[error("question '{id}': {detail}")]
    InvalidConstraint { id: String, detail: String },

    #[error("unsupported schema file extension '{extension}' (expected .json, .yaml or .yml)")]
    UnsupportedExtension { extension: String },

    #[error("failed to parse JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML schema: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable per-answer validation failures. The display strings are
/// shown verbatim to the end user as the retry message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("an answer is required here")]
    EmptyRequired,

    #[error("answer is too long ({len} characters, at most {max} allowed)")]
    TooLong { len: usize, max: usize },

    #[error("could not find a number in \"{input}\"")]
    NotANumber { input: String },

    #[error("{value} is out of range: {detail}")]
    OutOfRange { value: String, detail: String },

    #[error("could not understand \"{input}\" as a date (try YYYY-MM-DD, e.g. 2025-06-12)")]
    UnparsableDate { input: String },

    #[error("time format unclear, please use HH:MM (e.g. 14:35 or 02:00)")]
    InvalidTimeFormat,

    #[error("expected yes/no or true/false")]
    NotABoolean,

    #[error("{}", choice_message(.input, .valid, .suggestion))]
    InvalidChoice {
        input: String,
        valid: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("please specify what \"other\" means (e.g. \"other: heavy blizzard\")")]
    OtherNeedsDetail,

    #[error("structured answer is malformed: {0}")]
    MalformedPayload(String),

    #[error("{}", field_errors_message(.0))]
    FieldErrors(Vec<(String, ValidationError)>),
}

fn choice_message(input: &str, valid: &[String], suggestion: &Option<String>) -> String {
    let mut msg = format!(
        "\"{}\" is not a valid option; valid options: {}",
        input,
        valid.join(", ")
    );
    if let Some(s) = suggestion {
        msg.push_str(&format!(" (did you mean \"{}\"?)", s));
    }
    msg
}

fn field_errors_message(errors: &[(String, ValidationError)]) -> String {
    let parts: Vec<String> = errors
        .iter()
        .map(|(field, err)| format!("{}: {}", field, err))
        .collect();
    parts.join("; ")
}

/// Recoverable failures while selecting an answer to edit. The edit menu
/// is re-presented with the display string prefixed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("pick a number between 1 and {max}, or type \"cancel\"")]
    SelectionOutOfRange { max: usize },

    #[error("type the number of the answer you want to change, or \"cancel\"")]
    SelectionUnparsable,

    #[error("there are no completed answers to change yet")]
    NothingToEdit,
}

/// Caller misuse of a session. These propagate out of `submit_answer` /
/// `completed_form` so the presentation adapter can stop sending input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("the form is already complete; no further answers are accepted")]
    FormAlreadyComplete,

    #[error("the form is not complete yet")]
    FormNotComplete,

    #[error("question '{id}' not found in the graph")]
    UnknownQuestion { id: String },
}

/// Result type aliases for convenience
pub type SchemaResult<T> = Result<T, SchemaError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type NavigationResult<T> = Result<T, NavigationError>;
pub type EngineResult<T> = Result<T, EngineError>;
