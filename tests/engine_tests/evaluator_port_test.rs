use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use survey_engine::runtime::RuntimeError;
use survey_engine::script::{NavigateParams, ScriptCheck};
use survey_engine::{
    AuthoringError, BindingError, Bindings, CompiledProgram, Dependency, EngineConfig, Error,
    ExpressionRuntime, MockScriptEvaluator, NavigationDirection, ProgramRegistry,
    ScriptFailure, ScriptMethod, ScriptResultType, SurveyEngine, Value,
};

use super::{engine, group, load_survey, request, slot, validated, values, AGE_SURVEY};

/// Compiles anything and reports every script as fine, except `rejected`.
fn validating_mock(rejected: Option<&'static str>) -> MockScriptEvaluator {
    let mut mock = MockScriptEvaluator::new();
    mock.expect_compile()
        .returning(|bundle| Ok(CompiledProgram::new(bundle, ())));
    mock.expect_execute()
        .withf(|_, method, _| *method == ScriptMethod::Validate)
        .times(1)
        .returning(move |_, _, params| {
            let checks: Vec<ScriptCheck> = serde_json::from_str(params).unwrap();
            let reports: Vec<serde_json::Value> = checks
                .into_iter()
                .map(|check| {
                    if Some(check.key.as_str()) == rejected {
                        json!({"key": check.key, "resultType": "REFERENCE_ERROR", "message": "x is not defined"})
                    } else {
                        json!({"key": check.key, "resultType": "OK"})
                    }
                })
                .collect();
            Ok(serde_json::to_string(&reports).unwrap())
        });
    mock
}

fn mock_engine(mock: MockScriptEvaluator) -> SurveyEngine {
    SurveyEngine::new(
        EngineConfig::default(),
        Arc::new(mock),
        Arc::new(ProgramRegistry::new()),
    )
    .unwrap()
}

#[test]
fn test_evaluator_verdicts_are_attached() {
    let mut mock = MockScriptEvaluator::new();
    mock.expect_compile()
        .withf(|bundle| bundle.is_empty())
        .times(1)
        .returning(|bundle| Ok(CompiledProgram::new(bundle, ())));
    mock.expect_compile()
        .withf(|bundle| !bundle.is_empty())
        .times(1)
        .returning(|bundle| {
            assert!(bundle.contains("Q2.relevance = (Q1.value > 17);"));
            assert!(!bundle.contains("Q2.validity ="));
            Ok(CompiledProgram::new(bundle, ()))
        });
    mock.expect_execute()
        .withf(|_, method, _| *method == ScriptMethod::Validate)
        .times(1)
        .returning(|_, _, params| {
            let checks: Vec<ScriptCheck> = serde_json::from_str(params).unwrap();
            // inputs and references carry no script
            let keys: Vec<&str> = checks.iter().map(|check| check.key.as_str()).collect();
            assert_eq!(
                keys,
                vec!["Q1.validity", "Q2.relevance", "Q2.validity", "G2.relevance", "Q3.value"]
            );
            Ok(json!([
                {"key": "Q2.validity", "resultType": "REFERENCE_ERROR", "message": "x is not defined"},
                {"key": "Q9.value", "resultType": "SYNTAX_ERROR", "message": "ignored"}
            ])
            .to_string())
        });

    let engine = mock_engine(mock);
    let survey = engine.validate(load_survey(AGE_SURVEY)).unwrap();

    assert_eq!(
        survey.errors(),
        vec![AuthoringError::Instruction {
            component: "Q2".to_string(),
            instruction: "validity".to_string(),
            error: BindingError::ScriptFailure {
                result_type: ScriptResultType::ReferenceError,
                message: "x is not defined".to_string(),
            },
        }]
    );
    assert!(!survey.computed().contains(&Dependency::validity("Q2")));
    assert!(engine.registry().contains("S1"));
}

#[test]
fn test_navigate_coerces_boolean_slots() {
    let mut mock = validating_mock(None);
    mock.expect_execute()
        .withf(|_, method, _| *method == ScriptMethod::Navigate)
        .times(1)
        .returning(|_, _, params| {
            let params: NavigateParams = serde_json::from_str(params).unwrap();
            assert_eq!(params.targets, None);
            assert_eq!(
                params.values.get(&Dependency::value("Q1")),
                Some(&Value::Integer(10))
            );
            let mut bindings = params.values.to_json();
            let computed = json!({
                "Q1.validity": 1,
                "Q2.relevance": 0,
                "Q2.validity": null,
                "G2.relevance": "yes",
                "Q3.value": 20,
                "Q3.summary": {}
            });
            for (key, value) in computed.as_object().unwrap() {
                bindings[key] = value.clone();
            }
            Ok(json!({"bindings": bindings}).to_string())
        });

    let engine = mock_engine(mock);
    let survey = engine.validate(load_survey(AGE_SURVEY)).unwrap();
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

    assert_eq!(slot(&output, "Q1.validity"), Some(Value::Boolean(true)));
    assert_eq!(slot(&output, "Q2.relevance"), Some(Value::Boolean(false)));
    assert_eq!(slot(&output, "Q2.validity"), Some(Value::Boolean(false)));
    assert_eq!(slot(&output, "G2.relevance"), Some(Value::Boolean(true)));
    assert_eq!(slot(&output, "Q3.value"), Some(Value::Integer(20)));
    assert_eq!(output.navigation_index, group("G2"));
}

#[test]
fn test_missing_relevance_is_a_contract_violation() {
    let mut mock = validating_mock(None);
    mock.expect_execute()
        .withf(|_, method, _| *method == ScriptMethod::Navigate)
        .returning(|_, _, _| Ok(json!({"bindings": {}}).to_string()));

    let engine = mock_engine(mock);
    let survey = engine.validate(load_survey(AGE_SURVEY)).unwrap();
    let result = engine.navigate(
        &survey,
        request(None, NavigationDirection::Start, Bindings::new()),
    );

    assert!(matches!(
        result,
        Err(Error::Runtime(RuntimeError::MissingBinding(dependency)))
            if dependency == Dependency::relevance("G2")
    ));
}

#[test]
fn test_evaluator_failures_abort_the_use_case() {
    let mut mock = MockScriptEvaluator::new();
    mock.expect_compile()
        .withf(|bundle| bundle.is_empty())
        .returning(|bundle| Ok(CompiledProgram::new(bundle, ())));
    mock.expect_compile()
        .withf(|bundle| !bundle.is_empty())
        .returning(|_| Err(ScriptFailure::syntax("bundle rejected")));
    mock.expect_execute()
        .returning(|_, _, _| Ok("[]".to_string()));

    let engine = mock_engine(mock);
    let result = engine.validate(load_survey(AGE_SURVEY));
    assert!(matches!(
        result,
        Err(Error::Script(failure)) if failure == ScriptFailure::syntax("bundle rejected")
    ));

    let mut mock = validating_mock(None);
    mock.expect_execute()
        .withf(|_, method, _| *method == ScriptMethod::Navigate)
        .returning(|_, _, _| Err(ScriptFailure::runtime("sandbox crashed")));
    let engine = mock_engine(mock);
    let survey = engine.validate(load_survey(AGE_SURVEY)).unwrap();
    let result = engine.navigate(
        &survey,
        request(None, NavigationDirection::Start, Bindings::new()),
    );
    assert!(matches!(result, Err(Error::Script(_))));
}

#[test]
fn test_rejected_script_is_dropped_from_bundle() {
    let engine = mock_engine(validating_mock(Some("Q3.value")));
    let survey = engine.validate(load_survey(AGE_SURVEY)).unwrap();

    let errors = survey.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[1],
        AuthoringError::Instruction {
            component: "Q3".to_string(),
            instruction: "summary".to_string(),
            error: BindingError::BrokenDependency(Dependency::value("Q3")),
        }
    );
    let program = engine.registry().get("S1").unwrap();
    assert!(!program.source().contains("Q3.value ="));
    assert!(!program.source().contains("Q3.summary ="));
}

#[test]
fn test_navigate_requires_registered_program() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);
    engine.registry().remove(&survey.program_key);

    let result = engine.navigate(
        &survey,
        request(None, NavigationDirection::Start, Bindings::new()),
    );
    assert!(matches!(result, Err(Error::ProgramNotRegistered(key)) if key == "S1"));
}

#[test]
fn test_registry_is_shared_between_engines() {
    let config = EngineConfig::default();
    let registry = Arc::new(ProgramRegistry::new());
    let author = SurveyEngine::new(
        config.clone(),
        Arc::new(ExpressionRuntime::new(config.runtime.clone())),
        registry.clone(),
    )
    .unwrap();
    let respondent = SurveyEngine::new(
        config.clone(),
        Arc::new(ExpressionRuntime::new(config.runtime.clone())),
        registry.clone(),
    )
    .unwrap();

    let survey = validated(&author, AGE_SURVEY);
    let first = registry.get("S1").unwrap();
    let output = respondent
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

    // re-validating replaces the program under the same key
    validated(&author, AGE_SURVEY);
    let second = registry.get("S1").unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(!first.shares_payload_with(&second));
}
