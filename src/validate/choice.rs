//! Choice answer matching.
//!
//! Matching is case-insensitive exact or unambiguous-prefix against the
//! option list, after normalizing unicode dashes/quotes and spacing
//! around `/` and `-` (so "snow / ice" matches "Snow/Ice"). A bare
//! number selects the Nth option. Multiple-choice input is split on
//! commas and semicolons and the result is returned in specification
//! order, not input order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::QuestionSpec;
use crate::validate::{AnswerValue, ChoiceValue, MultiChoiceValue};

static SLASH_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").expect("slash regex"));
static DASH_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").expect("dash regex"));
static MULTI_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]").expect("split regex"));
static OTHER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^other\s*[:\-]?\s+(.+)$|(?i)^other:\s*(.+)$").expect("other regex"));
static OTHER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(.+)\s+other$").expect("other regex"));

/// Words that mean "other" on their own and need a specification.
const BARE_OTHER: &[&str] = &["other", "else", "different", "something else", "misc", "miscellaneous"];

/// Normalize text for comparison: lowercase, unify dash and quote
/// variants, tighten spacing around separators.
pub fn normalize(text: &str) -> String {
    let mut t = text.trim().to_lowercase();
    for dash in ['\u{2013}', '\u{2014}', '\u{2212}'] {
        t = t.replace(dash, "-");
    }
    for quote in ['\u{2018}', '\u{2019}'] {
        t = t.replace(quote, "'");
    }
    for quote in ['\u{201c}', '\u{201d}'] {
        t = t.replace(quote, "\"");
    }
    let t = SLASH_SPACING.replace_all(&t, "/");
    let t = DASH_SPACING.replace_all(&t, "-");
    t.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word-set comparison with flexible separators: "snow ice" matches
/// "Snow/Ice".
fn words_match(a: &str, b: &str) -> bool {
    let split = |s: &str| {
        let mut words: Vec<String> = s
            .split(|c: char| c == '-' || c == '/' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        words.sort();
        words
    };
    split(a) == split(b)
}

enum OptionMatch {
    Matched(String),
    Ambiguous,
    None,
}

/// Match one token against the option list.
fn match_option(token: &str, options: &[String]) -> OptionMatch {
    let key = normalize(token.trim_end_matches('.'));
    if key.is_empty() {
        return OptionMatch::None;
    }

    // Exact normalized match
    for option in options {
        if normalize(option) == key {
            return OptionMatch::Matched(option.clone());
        }
    }

    // 1-based index selection
    if key.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = key.parse::<usize>() {
            if n >= 1 && n <= options.len() {
                return OptionMatch::Matched(options[n - 1].clone());
            }
        }
        return OptionMatch::None;
    }

    // Flexible word-set match
    for option in options {
        if words_match(&key, &normalize(option)) {
            return OptionMatch::Matched(option.clone());
        }
    }

    // Unambiguous prefix
    let prefixed: Vec<&String> = options
        .iter()
        .filter(|o| normalize(o).starts_with(&key))
        .collect();
    match prefixed.len() {
        1 => OptionMatch::Matched(prefixed[0].clone()),
        0 => OptionMatch::None,
        _ => OptionMatch::Ambiguous,
    }
}

/// Extract an "Other" specification from patterns like "other: fog",
/// "other - fog", "other fog" or "fog other".
fn other_specification(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if let Some(caps) = OTHER_PREFIX.captures(trimmed) {
        let spec = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
        if !spec.is_empty() {
            return Some(spec.to_string());
        }
    }
    if let Some(caps) = OTHER_SUFFIX.captures(trimmed) {
        let spec = caps.get(1)?.as_str().trim();
        if !spec.is_empty() {
            return Some(spec.to_string());
        }
    }
    None
}

fn is_bare_other(token: &str) -> bool {
    BARE_OTHER.contains(&normalize(token).as_str())
}

fn invalid_choice(token: &str, spec: &QuestionSpec) -> ValidationError {
    let key = normalize(token);
    let suggestion = spec
        .options
        .iter()
        .map(|o| (o, strsim::jaro_winkler(&key, &normalize(o))))
        .filter(|(_, score)| *score >= 0.84)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o.clone());
    ValidationError::InvalidChoice {
        input: token.trim().to_string(),
        valid: spec.options.clone(),
        suggestion,
    }
}

pub fn parse_single(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(ValidationError::EmptyRequired);
    }

    if spec.allow_other {
        if let Some(other) = other_specification(token) {
            return Ok(AnswerValue::Choice(ChoiceValue {
                choice: "Other".to_string(),
                other: Some(other),
            }));
        }
        if is_bare_other(token) {
            return Err(ValidationError::OtherNeedsDetail);
        }
    }

    match match_option(token, &spec.options) {
        OptionMatch::Matched(option) => Ok(AnswerValue::Choice(ChoiceValue {
            choice: option,
            other: None,
        })),
        OptionMatch::Ambiguous | OptionMatch::None => Err(invalid_choice(token, spec)),
    }
}

pub fn parse_multiple(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let tokens: Vec<&str> = MULTI_SPLIT
        .split(raw)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(ValidationError::EmptyRequired);
    }

    let mut matched: Vec<String> = Vec::new();
    let mut other: Option<String> = None;

    for token in tokens {
        if spec.allow_other {
            if let Some(detail) = other_specification(token) {
                other = Some(detail);
                continue;
            }
            if is_bare_other(token) {
                return Err(ValidationError::OtherNeedsDetail);
            }
        }
        match match_option(token, &spec.options) {
            OptionMatch::Matched(option) => {
                if !matched.contains(&option) {
                    matched.push(option);
                }
            }
            // Report the first offender.
            OptionMatch::Ambiguous | OptionMatch::None => return Err(invalid_choice(token, spec)),
        }
    }

    // Specification order, not input order.
    let selected: Vec<String> = spec
        .options
        .iter()
        .filter(|o| matched.contains(o))
        .cloned()
        .collect();

    Ok(AnswerValue::MultiChoice(MultiChoiceValue { selected, other }))
}
