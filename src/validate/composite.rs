//! Structured payload validation for group and repeat-group questions.
//!
//! The session engine normally walks composite questions field by field,
//! so these paths only see one scalar at a time. The bulk entry points
//! below accept a whole structured payload (JSON object / array) in one
//! call, as edit-prefill and programmatic adapters produce. Child errors
//! are aggregated, never fail-fast.

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::QuestionSpec;
use crate::validate::{self, AnswerValue, GroupValue};

/// Validate a JSON-object payload covering all child fields of a group.
pub fn parse_group(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|_| ValidationError::MalformedPayload("group answers must be a JSON object".to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ValidationError::MalformedPayload("group answers must be a JSON object".to_string()))?;

    let mut errors: Vec<(String, ValidationError)> = Vec::new();
    let mut parsed = GroupValue::new();
    for field in &spec.fields {
        let raw_field = obj.get(&field.id).map(raw_text).unwrap_or_default();
        match validate::validate(field, &raw_field) {
            Ok(v) => {
                parsed.insert(field.id.clone(), v);
            }
            Err(e) => errors.push((field.id.clone(), e)),
        }
    }

    if errors.is_empty() {
        Ok(AnswerValue::Group(parsed))
    } else {
        Err(ValidationError::FieldErrors(errors))
    }
}

/// Validate a JSON-array payload of repeat-group instances.
pub fn parse_instances(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|_| ValidationError::MalformedPayload("repeat-group answers must be a JSON list".to_string()))?;
    let list = value
        .as_array()
        .ok_or_else(|| ValidationError::MalformedPayload("repeat-group answers must be a JSON list".to_string()))?;

    let mut errors: Vec<(String, ValidationError)> = Vec::new();
    let mut instances: Vec<GroupValue> = Vec::new();
    for (i, elem) in list.iter().enumerate() {
        match parse_group(spec, &elem.to_string()) {
            Ok(AnswerValue::Group(map)) => instances.push(map),
            Ok(_) => unreachable!("parse_group returns Group"),
            Err(ValidationError::FieldErrors(field_errors)) => {
                for (field, err) in field_errors {
                    errors.push((format!("{} {}: {}", spec.item_label(), i + 1, field), err));
                }
            }
            Err(other) => errors.push((format!("{} {}", spec.item_label(), i + 1), other)),
        }
    }

    if errors.is_empty() {
        Ok(AnswerValue::Instances(instances))
    } else {
        Err(ValidationError::FieldErrors(errors))
    }
}

/// Raw text for re-validating one field out of a structured payload.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
