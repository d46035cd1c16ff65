use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use survey_engine::navigation::NavigationError;
use survey_engine::{
    Bindings, EngineConfig, Error, NavigationDirection, NavigationMode, NavigationRequest,
    ScriptResultType, SurveyEngine, Value,
};

use super::{engine, group, question, request, slot, validated, values, AGE_SURVEY};

const SKIPPED_QUESTIONS: &str = r#"
{
    "code": "S1",
    "children": [
        {
            "code": "G1",
            "children": [
                {"code": "Q1", "instructions": [{"code": "relevance", "type": "simple_state", "text": "false", "target": "relevance"}]},
                {"code": "Q2", "instructions": [{"code": "relevance", "type": "simple_state", "text": "1 > 2", "target": "relevance"}]},
                {"code": "Q3", "instructions": [{"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false}]}
            ]
        }
    ]
}
"#;

fn boolean(value: bool) -> Option<Value> {
    Some(Value::Boolean(value))
}

fn codes(items: &[&str]) -> Option<Value> {
    Some(Value::List(items.iter().map(|code| Value::from(*code)).collect()))
}

#[test]
fn test_start_lands_on_first_group() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(None, NavigationDirection::Start, Bindings::new()),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G1"));
    assert!(output.failures.is_empty());
    // unanswered Q1 is invalid, Q2 is not asked yet
    assert_eq!(slot(&output, "Q1.validity"), boolean(false));
    assert_eq!(slot(&output, "Q2.relevance"), boolean(false));
    assert_eq!(slot(&output, "G1.validity"), boolean(false));
    assert_eq!(slot(&output, "S1.validity"), boolean(false));
    assert_eq!(slot(&output, "Q3.value"), Some(Value::Null));

    assert_eq!(slot(&output, "S1.show_errors"), boolean(false));
    assert_eq!(slot(&output, "S1.has_previous"), boolean(false));
    assert_eq!(slot(&output, "S1.has_next"), boolean(true));
    assert_eq!(slot(&output, "S1.before_navigation"), codes(&[]));
    assert_eq!(slot(&output, "S1.after_navigation"), codes(&["G2", "G3"]));

    assert_eq!(slot(&output, "G1.in_current_navigation"), boolean(true));
    assert_eq!(slot(&output, "Q2.in_current_navigation"), boolean(true));
    assert_eq!(slot(&output, "S1.in_current_navigation"), boolean(true));
    assert_eq!(slot(&output, "G2.in_current_navigation"), boolean(false));
    assert_eq!(slot(&output, "Q3.in_current_navigation"), boolean(false));
}

#[test]
fn test_next_is_blocked_on_invalid_step() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    // Q2 becomes relevant and is still empty
    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[("Q1.value", Value::Integer(20))]),
            ),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G1"));
    assert_eq!(slot(&output, "Q1.validity"), boolean(true));
    assert_eq!(slot(&output, "Q2.relevance"), boolean(true));
    assert_eq!(slot(&output, "Q2.validity"), boolean(false));
    assert_eq!(slot(&output, "G1.validity"), boolean(false));
    assert_eq!(slot(&output, "S1.show_errors"), boolean(true));
}

#[test]
fn test_next_is_allowed_when_blocking_disabled() {
    let mut config = EngineConfig::default();
    config.runtime.block_next_on_invalid = false;
    let engine = SurveyEngine::with_builtin_runtime(config).unwrap();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[("Q1.value", Value::Integer(20))]),
            ),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G2"));
    // the step that was left is still reported as failing
    assert_eq!(slot(&output, "S1.show_errors"), boolean(true));
}

#[test]
fn test_irrelevant_question_does_not_block() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[("Q1.value", Value::Integer(10))]),
            ),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G2"));
    assert_eq!(slot(&output, "Q2.relevance"), boolean(false));
    assert_eq!(slot(&output, "Q3.value"), Some(Value::Integer(20)));
    let summary: BTreeMap<String, Value> = BTreeMap::from([
        ("Q1.value".to_string(), Value::Integer(10)),
        ("Q3.value".to_string(), Value::Integer(20)),
    ]);
    assert_eq!(slot(&output, "Q3.summary"), Some(Value::Map(summary)));

    assert_eq!(slot(&output, "G2.validity"), boolean(true));
    assert_eq!(slot(&output, "S1.validity"), boolean(true));
    assert_eq!(slot(&output, "S1.show_errors"), boolean(false));
    assert_eq!(slot(&output, "S1.has_previous"), boolean(true));
    assert_eq!(slot(&output, "S1.has_next"), boolean(true));
    assert_eq!(slot(&output, "S1.before_navigation"), codes(&["G1"]));
    assert_eq!(slot(&output, "Q3.in_current_navigation"), boolean(true));
    assert_eq!(slot(&output, "Q1.in_current_navigation"), boolean(false));
}

#[test]
fn test_irrelevant_group_is_skipped() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[
                    ("Q1.value", Value::Integer(99)),
                    ("Q2.value", Value::from("yes")),
                ]),
            ),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G3"));
    assert_eq!(slot(&output, "G2.relevance"), boolean(false));
    // inherited from the group
    assert_eq!(slot(&output, "Q3.relevance"), boolean(false));
    assert_eq!(slot(&output, "S1.has_previous"), boolean(true));
    assert_eq!(slot(&output, "S1.has_next"), boolean(false));

    let back = engine
        .navigate(
            &survey,
            NavigationRequest {
                index: Some(group("G3")),
                direction: NavigationDirection::Previous,
                values: Bindings::new(),
                previous: Some(output.bindings),
            },
        )
        .unwrap();
    assert_eq!(back.navigation_index, group("G1"));
}

#[test]
fn test_jump_to_irrelevant_group_moves_forward() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Jump(group("G2")),
                values(&[
                    ("Q1.value", Value::Integer(99)),
                    ("Q2.value", Value::from("yes")),
                ]),
            ),
        )
        .unwrap();

    assert_eq!(slot(&output, "G2.relevance"), boolean(false));
    assert_eq!(output.navigation_index, group("G3"));
    assert_eq!(slot(&output, "G3.in_current_navigation"), boolean(true));
    assert_eq!(slot(&output, "G2.in_current_navigation"), boolean(false));
}

#[test]
fn test_flags_at_last_question_after_skipped_ones() {
    let config = EngineConfig {
        navigation_mode: NavigationMode::QuestionByQuestion,
        ..EngineConfig::default()
    };
    let engine = SurveyEngine::with_builtin_runtime(config).unwrap();
    let survey = validated(&engine, SKIPPED_QUESTIONS);

    let start = engine
        .navigate(
            &survey,
            request(None, NavigationDirection::Start, Bindings::new()),
        )
        .unwrap();
    assert_eq!(start.navigation_index, question("Q3"));
    assert_eq!(slot(&start, "S1.has_previous"), boolean(false));
    assert_eq!(slot(&start, "S1.has_next"), boolean(false));
    assert_eq!(slot(&start, "S1.before_navigation"), codes(&["Q1", "Q2"]));
    assert_eq!(slot(&start, "S1.after_navigation"), codes(&[]));

    // nothing relevant before Q3: stay put
    let back = engine
        .navigate(
            &survey,
            request(
                Some(question("Q3")),
                NavigationDirection::Previous,
                Bindings::new(),
            ),
        )
        .unwrap();
    assert_eq!(back.navigation_index, question("Q3"));
}

#[test]
fn test_submitted_values_for_computed_slots_are_ignored() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G2")),
                NavigationDirection::Resume,
                values(&[
                    ("Q1.value", Value::Integer(10)),
                    ("Q3.value", Value::Integer(1000)),
                    ("S1.show_errors", Value::Boolean(true)),
                ]),
            ),
        )
        .unwrap();

    assert_eq!(output.navigation_index, group("G2"));
    assert_eq!(slot(&output, "Q3.value"), Some(Value::Integer(20)));
    assert_eq!(slot(&output, "S1.show_errors"), boolean(false));
}

#[test]
fn test_incremental_pass_matches_full_pass() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let first = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[
                    ("Q1.value", Value::Integer(99)),
                    ("Q2.value", Value::from("yes")),
                ]),
            ),
        )
        .unwrap();
    assert_eq!(first.navigation_index, group("G3"));

    let incremental = engine
        .navigate(
            &survey,
            NavigationRequest {
                index: Some(group("G3")),
                direction: NavigationDirection::Resume,
                values: values(&[("Q1.value", Value::Integer(10))]),
                previous: Some(first.bindings),
            },
        )
        .unwrap();
    let full = engine
        .navigate(
            &survey,
            request(
                Some(group("G3")),
                NavigationDirection::Resume,
                values(&[
                    ("Q1.value", Value::Integer(10)),
                    ("Q2.value", Value::from("yes")),
                ]),
            ),
        )
        .unwrap();

    assert_eq!(slot(&incremental, "G2.relevance"), boolean(true));
    assert_eq!(slot(&incremental, "Q3.relevance"), boolean(true));
    assert_eq!(slot(&incremental, "Q3.value"), Some(Value::Integer(20)));
    assert_eq!(slot(&incremental, "Q2.relevance"), boolean(false));
    assert_eq!(incremental, full);
}

#[test]
fn test_runtime_failure_nulls_only_its_slot() {
    let engine = engine();
    let json = AGE_SURVEY.replace("Q1.value * 2", "100 / Q1.value");
    let survey = validated(&engine, &json);

    let output = engine
        .navigate(
            &survey,
            request(
                Some(group("G1")),
                NavigationDirection::Next,
                values(&[("Q1.value", Value::Integer(0))]),
            ),
        )
        .unwrap();

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].key.to_string(), "Q3.value");
    assert_eq!(output.failures[0].result_type, ScriptResultType::RuntimeError);
    assert_eq!(slot(&output, "Q3.value"), Some(Value::Null));
    // later statements still ran
    let summary = slot(&output, "Q3.summary").unwrap();
    assert_eq!(
        summary.as_map().unwrap().get("Q1.value"),
        Some(&Value::Integer(0))
    );
    assert_eq!(output.navigation_index, group("G2"));
}

#[test]
fn test_unknown_step_is_rejected() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    let jump = engine.navigate(
        &survey,
        request(
            None,
            NavigationDirection::Jump(group("G9")),
            Bindings::new(),
        ),
    );
    assert!(matches!(
        jump,
        Err(Error::Navigation(NavigationError::UnknownStep(index))) if index == group("G9")
    ));

    let from = engine.navigate(
        &survey,
        request(
            Some(question("Q1")),
            NavigationDirection::Next,
            Bindings::new(),
        ),
    );
    assert!(matches!(
        from,
        Err(Error::Navigation(NavigationError::UnknownStep(_)))
    ));
}
