//! Scalar answer parsing: text, number, date, time, boolean.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ValidationError, ValidationResult};
use crate::schema::QuestionSpec;
use crate::validate::{format_number, AnswerValue};

static NUMERIC_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("numeric token regex"));

pub fn parse_text(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        if spec.is_required() {
            return Err(ValidationError::EmptyRequired);
        }
        return Ok(AnswerValue::Text(String::new()));
    }
    if let Some(max) = spec.constraints.max_length {
        let len = trimmed.chars().count();
        if len > max {
            return Err(ValidationError::TooLong { len, max });
        }
    }
    Ok(AnswerValue::Text(trimmed.to_string()))
}

/// Accepts "30", "-4.5", embedded tokens like "30 km/h", and written
/// numbers like "thirty".
pub fn parse_number(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let lowered = raw.trim().to_lowercase();

    let value = if let Some(n) = word_number(&lowered) {
        n
    } else if let Some(m) = NUMERIC_TOKEN.find(&lowered) {
        m.as_str()
            .parse::<f64>()
            .map_err(|_| ValidationError::NotANumber { input: raw.trim().to_string() })?
    } else {
        return Err(ValidationError::NotANumber { input: raw.trim().to_string() });
    };

    if let Some(min) = spec.constraints.min {
        if value < min {
            return Err(ValidationError::OutOfRange {
                value: format_number(value),
                detail: format!("must be at least {}", format_number(min)),
            });
        }
    }
    if let Some(max) = spec.constraints.max {
        if value > max {
            return Err(ValidationError::OutOfRange {
                value: format_number(value),
                detail: format!("must be at most {}", format_number(max)),
            });
        }
    }
    Ok(AnswerValue::Number(value))
}

fn word_number(s: &str) -> Option<f64> {
    let n = match s {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        "seventy" => 70,
        "eighty" => 80,
        "ninety" => 90,
        "hundred" => 100,
        _ => return None,
    };
    Some(n as f64)
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
];

/// Calendar-aware parse over ISO and the common day-first / month-first
/// and written-month forms. Day-first is tried before month-first for
/// slash dates.
pub fn parse_date(spec: &QuestionSpec, raw: &str) -> ValidationResult<AnswerValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::UnparsableDate { input: trimmed.to_string() });
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ValidationError::UnparsableDate { input: trimmed.to_string() })?;

    if let Some(min) = spec.constraints.min_date {
        if date < min {
            return Err(ValidationError::OutOfRange {
                value: date.format("%Y-%m-%d").to_string(),
                detail: format!("must not be before {}", min.format("%Y-%m-%d")),
            });
        }
    }
    if let Some(max) = spec.constraints.max_date {
        if date > max {
            return Err(ValidationError::OutOfRange {
                value: date.format("%Y-%m-%d").to_string(),
                detail: format!("must not be after {}", max.format("%Y-%m-%d")),
            });
        }
    }
    Ok(AnswerValue::Date(date))
}

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%H.%M"];
const TIME_FORMATS_AMPM: &[&str] = &["%I:%M %p", "%I:%M%p"];

// chrono refuses %I formats without minutes, so "2pm" needs its own
// pattern and a rewrite to "2:00 PM".
static BARE_HOUR_AMPM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})\s*(am|pm)$").expect("bare hour regex"));

/// Accepts `HH:MM` (24h) and common variants like "2pm". A bare one or
/// two digit number is rejected as ambiguous.
pub fn parse_time(raw: &str) -> ValidationResult<AnswerValue> {
    let trimmed = raw.trim();

    // "2" could be 02:00 or 14:00; make the user disambiguate.
    if trimmed.len() <= 2 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidTimeFormat);
    }

    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
            return Ok(AnswerValue::Time(t));
        }
    }

    // chrono's %p wants AM/PM; normalize case for the 12h attempts.
    let upper = trimmed.to_uppercase();
    for fmt in TIME_FORMATS_AMPM {
        if let Ok(t) = NaiveTime::parse_from_str(&upper, fmt) {
            return Ok(AnswerValue::Time(t));
        }
    }

    // Bare hour with a meridiem, "2pm" / "11 AM".
    if let Some(caps) = BARE_HOUR_AMPM.captures(trimmed) {
        let rewritten = format!("{}:00 {}", &caps[1], caps[2].to_uppercase());
        if let Ok(t) = NaiveTime::parse_from_str(&rewritten, "%I:%M %p") {
            return Ok(AnswerValue::Time(t));
        }
    }

    // Military style "1435"
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, "%H%M") {
            return Ok(AnswerValue::Time(t));
        }
    }

    Err(ValidationError::InvalidTimeFormat)
}

const BOOL_TRUE: &[&str] = &["yes", "y", "true", "t", "1"];
const BOOL_FALSE: &[&str] = &["no", "n", "false", "f", "0"];

pub fn parse_boolean(raw: &str) -> ValidationResult<AnswerValue> {
    let lowered = raw.trim().to_lowercase();
    if BOOL_TRUE.contains(&lowered.as_str()) {
        return Ok(AnswerValue::Bool(true));
    }
    if BOOL_FALSE.contains(&lowered.as_str()) {
        return Ok(AnswerValue::Bool(false));
    }
    Err(ValidationError::NotABoolean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::QuestionKind;

    fn text_spec() -> QuestionSpec {
        QuestionSpec::new("t", "Text?", QuestionKind::Text)
    }

    fn number_spec() -> QuestionSpec {
        QuestionSpec::new("n", "Number?", QuestionKind::Number)
    }

    fn date_spec() -> QuestionSpec {
        QuestionSpec::new("d", "Date?", QuestionKind::Date)
    }

    #[test]
    fn test_text_trims() {
        assert_eq!(
            parse_text(&text_spec(), "  hello  ").unwrap(),
            AnswerValue::Text("hello".to_string())
        );
    }

    #[test]
    fn test_blank_required_text_rejected() {
        assert_eq!(
            parse_text(&text_spec(), "   "),
            Err(ValidationError::EmptyRequired)
        );
    }

    #[test]
    fn test_blank_optional_text_accepted() {
        let spec = text_spec().optional();
        assert_eq!(parse_text(&spec, "").unwrap(), AnswerValue::Text(String::new()));
    }

    #[test]
    fn test_max_length() {
        let mut spec = text_spec();
        spec.constraints.max_length = Some(5);
        assert!(matches!(
            parse_text(&spec, "too long for sure"),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_number_plain_and_embedded() {
        assert_eq!(parse_number(&number_spec(), "30").unwrap(), AnswerValue::Number(30.0));
        assert_eq!(
            parse_number(&number_spec(), "30 km/h").unwrap(),
            AnswerValue::Number(30.0)
        );
        assert_eq!(
            parse_number(&number_spec(), "-4.5").unwrap(),
            AnswerValue::Number(-4.5)
        );
    }

    #[test]
    fn test_number_words() {
        assert_eq!(
            parse_number(&number_spec(), "thirty").unwrap(),
            AnswerValue::Number(30.0)
        );
    }

    #[test]
    fn test_not_a_number() {
        assert!(matches!(
            parse_number(&number_spec(), "fast"),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_number_range() {
        let mut spec = number_spec();
        spec.constraints.min = Some(0.0);
        spec.constraints.max = Some(300.0);
        assert!(parse_number(&spec, "120").is_ok());
        assert!(matches!(
            parse_number(&spec, "-5"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_number(&spec, "500"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_date_formats() {
        let expected = AnswerValue::Date(NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
        assert_eq!(parse_date(&date_spec(), "2025-06-12").unwrap(), expected);
        assert_eq!(parse_date(&date_spec(), "12/06/2025").unwrap(), expected);
        assert_eq!(parse_date(&date_spec(), "June 12, 2025").unwrap(), expected);
        assert_eq!(parse_date(&date_spec(), "12 Jun 2025").unwrap(), expected);
    }

    #[test]
    fn test_unparsable_date() {
        assert!(matches!(
            parse_date(&date_spec(), "yesterday-ish"),
            Err(ValidationError::UnparsableDate { .. })
        ));
    }

    #[test]
    fn test_date_bounds() {
        let mut spec = date_spec();
        spec.constraints.max_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert!(matches!(
            parse_date(&spec, "2025-06-12"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_time_formats() {
        let t = NaiveTime::from_hms_opt(14, 35, 0).unwrap();
        assert_eq!(parse_time("14:35").unwrap(), AnswerValue::Time(t));
        assert_eq!(parse_time("1435").unwrap(), AnswerValue::Time(t));
        assert_eq!(
            parse_time("2pm").unwrap(),
            AnswerValue::Time(NaiveTime::from_hms_opt(14, 0, 0).unwrap())
        );
        assert_eq!(
            parse_time("2:35 PM").unwrap(),
            AnswerValue::Time(NaiveTime::from_hms_opt(14, 35, 0).unwrap())
        );
    }

    #[test]
    fn test_bare_hour_meridiem() {
        assert_eq!(
            parse_time("11 am").unwrap(),
            AnswerValue::Time(NaiveTime::from_hms_opt(11, 0, 0).unwrap())
        );
        assert_eq!(
            parse_time("12AM").unwrap(),
            AnswerValue::Time(NaiveTime::from_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(parse_time("13pm"), Err(ValidationError::InvalidTimeFormat));
    }

    #[test]
    fn test_bare_digits_ambiguous() {
        assert_eq!(parse_time("2"), Err(ValidationError::InvalidTimeFormat));
        assert_eq!(parse_time("14"), Err(ValidationError::InvalidTimeFormat));
    }

    #[test]
    fn test_boolean_tokens() {
        for s in ["yes", "Y", "TRUE", "t", "1"] {
            assert_eq!(parse_boolean(s).unwrap(), AnswerValue::Bool(true), "input {s}");
        }
        for s in ["no", "N", "false", "f", "0"] {
            assert_eq!(parse_boolean(s).unwrap(), AnswerValue::Bool(false), "input {s}");
        }
        assert_eq!(parse_boolean("maybe"), Err(ValidationError::NotABoolean));
    }
}
