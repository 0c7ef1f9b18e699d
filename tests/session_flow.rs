//! End-to-end walks through multi-question forms.

use formwalk::schema::QuestionGraph;
use formwalk::session::{Session, SubmitOutcome};
use formwalk::validate::AnswerValue;
use formwalk::CompletedForm;

fn session_for(json: &str) -> Session {
    Session::new(QuestionGraph::from_json_str(json).expect("schema loads"))
}

/// Feed answers that must all be accepted, returning the final outcome.
fn drive(session: &mut Session, inputs: &[&str]) -> SubmitOutcome {
    let mut last = None;
    for input in inputs {
        let outcome = session.submit_answer(input).expect("engine accepts input");
        if let SubmitOutcome::Retry { error, .. } = &outcome {
            panic!("input {input:?} rejected: {error}");
        }
        last = Some(outcome);
    }
    last.expect("at least one input")
}

fn complete(session: &mut Session, inputs: &[&str]) -> CompletedForm {
    match drive(session, inputs) {
        SubmitOutcome::Complete { form } => form,
        other => panic!("form not complete after {inputs:?}: {other:?}"),
    }
}

// ---------------------------------------------------------------------
// Follow-up routing
// ---------------------------------------------------------------------

const INJURY_FORM: &str = r#"{
    "title": "Injury check",
    "questions": [
        {
            "id": "any_injuries",
            "question": "Was anyone injured?",
            "type": "boolean",
            "followup_if_yes": {
                "id": "injury_details",
                "question": "Please describe the injuries.",
                "type": "text"
            }
        },
        { "id": "summary", "question": "Anything else?", "type": "text" }
    ]
}"#;

#[test]
fn test_followup_asked_after_yes() {
    let mut session = session_for(INJURY_FORM);

    let outcome = session.submit_answer("yes").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert_eq!(prompt.question_id, "injury_details");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let form = complete(&mut session, &["Minor cuts", "Nothing else"]);
    assert_eq!(
        form.value_of("injury_details"),
        Some(&AnswerValue::Text("Minor cuts".to_string()))
    );
    assert_eq!(form.answers.len(), 3);
}

#[test]
fn test_followup_skipped_after_no() {
    let mut session = session_for(INJURY_FORM);

    let outcome = session.submit_answer("no").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert_eq!(prompt.question_id, "summary");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let form = complete(&mut session, &["All fine"]);
    assert_eq!(form.value_of("injury_details"), None);
    assert_eq!(form.answers.len(), 2);
}

#[test]
fn test_invalid_boolean_retries_then_followup_still_fires() {
    let mut session = session_for(INJURY_FORM);

    let outcome = session.submit_answer("maybe").unwrap();
    match outcome {
        SubmitOutcome::Retry { prompt, .. } => {
            assert_eq!(prompt.question_id, "any_injuries");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.state().retry_count(), 1);
    assert!(session.state().completed_answers().is_empty());

    let outcome = session.submit_answer("yes").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert_eq!(prompt.question_id, "injury_details");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.state().retry_count(), 0);
}

#[test]
fn test_progress_header_tracks_top_level_position() {
    let mut session = session_for(INJURY_FORM);

    // The follow-up belongs to question 1, and its answer must not
    // advance the header past it.
    let outcome = session.submit_answer("yes").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert_eq!(prompt.question_id, "injury_details");
            assert_eq!(prompt.progress.answered, 0);
            assert!(prompt.render().contains("Question 1/2"), "got: {}", prompt.render());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let outcome = session.submit_answer("Minor cuts").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert_eq!(prompt.question_id, "summary");
            assert_eq!(prompt.progress.answered, 1);
            assert!(prompt.render().contains("Question 2/2"), "got: {}", prompt.render());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

// ---------------------------------------------------------------------
// Choice questions with "Other"
// ---------------------------------------------------------------------

const WEATHER_FORM: &str = r#"{
    "title": "Weather check",
    "questions": [
        {
            "id": "weather",
            "question": "What was the weather like?",
            "type": "single_choice",
            "options": ["Clear", "Rain", "Snow"],
            "other_specify": true
        }
    ]
}"#;

#[test]
fn test_bare_other_needs_detail() {
    let mut session = session_for(WEATHER_FORM);
    let outcome = session.submit_answer("other").unwrap();
    match outcome {
        SubmitOutcome::Retry { error, .. } => {
            assert!(error.contains("specify"), "got: {error}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_other_with_detail_completes() {
    let mut session = session_for(WEATHER_FORM);
    let form = complete(&mut session, &["Other: Fog"]);
    match form.value_of("weather") {
        Some(AnswerValue::Choice(c)) => {
            assert_eq!(c.choice, "Other");
            assert_eq!(c.other.as_deref(), Some("Fog"));
        }
        other => panic!("unexpected value: {other:?}"),
    }
    assert_eq!(form.to_json()["responses"]["weather"]["other"], "Fog");
}

#[test]
fn test_index_selection_and_misspelling_suggestion() {
    let mut session = session_for(WEATHER_FORM);

    let outcome = session.submit_answer("rian").unwrap();
    match outcome {
        SubmitOutcome::Retry { error, .. } => {
            assert!(error.contains("did you mean \"Rain\"?"), "got: {error}");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let form = complete(&mut session, &["2"]);
    match form.value_of("weather") {
        Some(AnswerValue::Choice(c)) => assert_eq!(c.choice, "Rain"),
        other => panic!("unexpected value: {other:?}"),
    }
}

// ---------------------------------------------------------------------
// Groups and repeat groups
// ---------------------------------------------------------------------

const VEHICLE_FORM: &str = r#"{
    "title": "Vehicles",
    "questions": [
        {
            "id": "vehicles",
            "question": "Let's record the vehicles involved.",
            "type": "repeat_group",
            "item_label": "Vehicle",
            "fields": [
                { "id": "make", "question": "Make and model?", "type": "text" },
                { "id": "speed", "question": "Estimated speed?", "type": "number", "min": 0 }
            ]
        }
    ]
}"#;

#[test]
fn test_repeat_group_flattens_into_one_record() {
    let mut session = session_for(VEHICLE_FORM);
    let form = complete(
        &mut session,
        &[
            "Toyota Camry", "30", "yes",
            "Honda CR-V", "45", "yes",
            "Ford F-150", "60", "no",
        ],
    );

    assert_eq!(form.answers.len(), 1, "instances flatten into one record");
    match form.value_of("vehicles") {
        Some(AnswerValue::Instances(list)) => {
            assert_eq!(list.len(), 3);
            assert_eq!(
                list[0].get("make"),
                Some(&AnswerValue::Text("Toyota Camry".to_string()))
            );
            assert_eq!(list[2].get("speed"), Some(&AnswerValue::Number(60.0)));
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn test_repeat_group_prompts_carry_item_label() {
    let mut session = session_for(VEHICLE_FORM);

    let prompt = session.current_prompt().expect("first prompt");
    assert!(prompt.text.contains("Vehicle 1"), "got: {}", prompt.text);

    // Finish instance 1; the continue prompt names the item.
    let outcome = drive(&mut session, &["Toyota Camry", "30"]);
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert!(prompt.text.contains("Add another vehicle?"), "got: {}", prompt.text);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // "yes" moves to Vehicle 2, field 1.
    let outcome = session.submit_answer("yes").unwrap();
    match outcome {
        SubmitOutcome::Accepted { prompt } => {
            assert!(prompt.text.contains("Vehicle 2"), "got: {}", prompt.text);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_repeat_field_failure_does_not_lose_instance_progress() {
    let mut session = session_for(VEHICLE_FORM);
    drive(&mut session, &["Toyota Camry"]);

    // Bad speed: retry in place.
    let outcome = session.submit_answer("fast").unwrap();
    assert!(matches!(outcome, SubmitOutcome::Retry { .. }));

    let form = complete(&mut session, &["30", "no"]);
    match form.value_of("vehicles") {
        Some(AnswerValue::Instances(list)) => {
            assert_eq!(list.len(), 1);
            assert_eq!(
                list[0].get("make"),
                Some(&AnswerValue::Text("Toyota Camry".to_string()))
            );
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn test_group_aggregates_fields_into_one_record() {
    let mut session = session_for(
        r#"{
            "title": "Contact",
            "questions": [
                {
                    "id": "contact",
                    "question": "Your contact details.",
                    "type": "group",
                    "fields": [
                        { "id": "name", "question": "Name?", "type": "text" },
                        { "id": "phone", "question": "Phone?", "type": "text" }
                    ]
                }
            ]
        }"#,
    );

    let form = complete(&mut session, &["Ada Lovelace", "555-0100"]);
    assert_eq!(form.answers.len(), 1);
    match form.value_of("contact") {
        Some(AnswerValue::Group(map)) => {
            assert_eq!(
                map.get("name"),
                Some(&AnswerValue::Text("Ada Lovelace".to_string()))
            );
            assert_eq!(
                map.get("phone"),
                Some(&AnswerValue::Text("555-0100".to_string()))
            );
        }
        other => panic!("unexpected value: {other:?}"),
    }
}

// ---------------------------------------------------------------------
// Optional questions and scalar normalization
// ---------------------------------------------------------------------

#[test]
fn test_optional_question_accepts_blank() {
    let mut session = session_for(
        r#"{
            "title": "Comments",
            "questions": [
                {
                    "id": "comments",
                    "question": "Any additional comments? (optional)",
                    "type": "multiline_text"
                }
            ]
        }"#,
    );
    let form = complete(&mut session, &["   "]);
    assert_eq!(form.value_of("comments"), Some(&AnswerValue::Text(String::new())));
}

#[test]
fn test_number_words_and_date_formats_normalize() {
    let mut session = session_for(
        r#"{
            "title": "Mixed",
            "questions": [
                { "id": "count", "question": "How many?", "type": "number" },
                { "id": "when", "question": "What date?", "type": "date" },
                { "id": "at", "question": "What time?", "type": "time" }
            ]
        }"#,
    );
    let form = complete(&mut session, &["twenty", "12/06/2025", "2:35 PM"]);
    assert_eq!(form.value_of("count"), Some(&AnswerValue::Number(20.0)));
    assert_eq!(form.to_json()["responses"]["when"], "2025-06-12");
    assert_eq!(form.to_json()["responses"]["at"], "14:35");
}

// ---------------------------------------------------------------------
// The bundled accident report, end to end
// ---------------------------------------------------------------------

#[test]
fn test_bundled_accident_report_full_walk() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("schemas/accident_report.json");
    let graph = QuestionGraph::from_file(&path).expect("bundled schema loads");
    let mut session = Session::new(graph);

    let form = complete(
        &mut session,
        &[
            "2025-06-12",
            "14:35",
            "123 Main St, Springfield",
            "wet",
            "rain",
            "daylight",
            "intersection",
            "50",
            // Vehicle 1
            "Sedan / Toyota / Camry",
            "ABC-1234",
            "30",
            "Front fender dented",
            "yes",
            // Vehicle 2
            "SUV / Honda / CR-V",
            "XYZ-5678",
            "45",
            "Rear bumper cracked",
            "no",
            "Vehicle 1 turned left while vehicle 2 went straight",
            "failed to yield, weather/road",
            "yes",
            "Minor injuries to both drivers",
            "no",
            "yes",
            "Jane Smith saw everything",
            "Both vehicles towed",
        ],
    );

    let json = form.to_json();
    assert_eq!(json["form_title"], "Vehicle Accident Report");
    assert_eq!(json["responses"]["date_of_accident"], "2025-06-12");
    assert_eq!(json["responses"]["weather_conditions"], "Rain");
    assert_eq!(json["responses"]["speed_limit"], 50);
    assert_eq!(json["responses"]["vehicles"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["responses"]["vehicles"][1]["licence_plate"], "XYZ-5678");
    assert_eq!(json["responses"]["any_injuries"], true);
    assert_eq!(json["responses"]["injury_details"], "Minor injuries to both drivers");
    assert_eq!(json["responses"]["property_damage"], false);
    assert!(json["responses"].get("property_damage_details").is_none());
    assert_eq!(json["responses"]["witness_details"], "Jane Smith saw everything");

    let selected = &json["responses"]["contributing_circumstances"];
    assert_eq!(selected[0], "Failed to yield");
    assert_eq!(selected[1], "Weather/Road");
}
