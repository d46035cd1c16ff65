use pretty_assertions::assert_eq;
use survey_engine::{
    AuthoringError, BindingError, ComponentError, Dependency, Error, Property, ScriptResultType,
};

use super::{engine, load_survey, validated, AGE_SURVEY};

const FORWARD_SURVEY: &str = r#"
{
    "code": "S1",
    "children": [
        {
            "code": "G1",
            "children": [
                {
                    "code": "Q1",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false},
                        {"code": "echo", "type": "simple_state", "text": "Q2.value", "target": "echo"}
                    ]
                },
                {
                    "code": "Q2",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false},
                        {"code": "validity", "type": "simple_state", "text": "Q1.value != Q2.value", "target": "validity"}
                    ]
                }
            ]
        }
    ]
}
"#;

const BROKEN_SURVEY: &str = r#"
{
    "code": "S1",
    "children": [
        {
            "code": "G1",
            "children": [
                {
                    "code": "Q1",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false}
                    ]
                }
            ]
        },
        {
            "code": "G 2",
            "children": [
                {
                    "code": "Q5",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false}
                    ]
                }
            ]
        },
        {
            "code": "G3",
            "children": [
                {
                    "code": "Q4",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "Q1.value + 1", "target": "value"},
                        {"code": "note", "type": "simple_state", "text": "Q5.value", "target": "note"},
                        {"code": "missing", "type": "simple_state", "text": "Q9.value", "target": "missing"}
                    ]
                }
            ]
        }
    ]
}
"#;

const UNADDRESSABLE_SURVEY: &str = r#"
{
    "code": "S1",
    "children": [
        {
            "code": "G1",
            "children": [
                {
                    "code": "Q1",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false},
                        {"code": "2nd", "type": "simple_state", "text": "1", "target": "2nd"}
                    ]
                },
                {
                    "code": "null",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false}
                    ]
                },
                {
                    "code": "Q2",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "Q1.value + 1", "target": "value"}
                    ]
                }
            ]
        }
    ]
}
"#;

fn slots(names: &[&str]) -> Vec<Dependency> {
    names.iter().map(|name| name.parse().unwrap()).collect()
}

#[test]
fn test_valid_survey_has_no_errors() {
    let engine = engine();
    let survey = validated(&engine, AGE_SURVEY);

    assert!(survey.is_valid());
    assert!(survey.errors().is_empty());
    assert_eq!(survey.sanitized, survey.survey);
    assert_eq!(
        survey.computed(),
        slots(&[
            "Q1.validity",
            "Q2.relevance",
            "Q2.validity",
            "G2.relevance",
            "Q3.value",
            "Q3.summary",
        ])
        .as_slice()
    );
    assert_eq!(
        survey.inputs().iter().cloned().collect::<Vec<_>>(),
        slots(&["Q1.value", "Q2.value", "Q4.value"])
    );
    assert!(engine.registry().contains("S1"));
}

#[test]
fn test_forward_reference_is_reported_once() {
    let engine = engine();
    let survey = validated(&engine, FORWARD_SURVEY);

    assert_eq!(
        survey.errors(),
        vec![AuthoringError::Instruction {
            component: "Q1".to_string(),
            instruction: "echo".to_string(),
            error: BindingError::ForwardDependency(Dependency::value("Q2")),
        }]
    );
    // the backward reference from Q2 survives
    let q2 = survey.sanitized.find("Q2").unwrap();
    assert!(q2.instruction("validity").is_some());
    assert!(survey.sanitized.find("Q1").unwrap().instruction("echo").is_none());
}

#[test]
fn test_syntax_error_is_isolated_to_its_instruction() {
    let engine = engine();
    let json = AGE_SURVEY.replace("Q1.value != null && Q1.value >= 0", ";;;getdaSD dasd");
    let survey = validated(&engine, &json);

    let errors = survey.errors();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        AuthoringError::Instruction {
            component,
            instruction,
            error: BindingError::ScriptFailure { result_type, .. },
        } => {
            assert_eq!(component, "Q1");
            assert_eq!(instruction, "validity");
            assert_eq!(*result_type, ScriptResultType::SyntaxError);
        }
        other => panic!("unexpected error {:?}", other),
    }

    // every sibling instruction is still compiled
    assert_eq!(survey.computed().len(), 5);
    assert!(!survey.computed().contains(&Dependency::validity("Q1")));
}

#[test]
fn test_reference_error_breaks_dependents() {
    let engine = engine();
    let json = AGE_SURVEY.replace("Q1.value * 2", "nope(Q1.value)");
    let survey = validated(&engine, &json);

    let errors = survey.errors();
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        &errors[0],
        AuthoringError::Instruction {
            instruction,
            error: BindingError::ScriptFailure {
                result_type: ScriptResultType::ReferenceError,
                ..
            },
            ..
        } if instruction == "value"
    ));
    assert_eq!(
        errors[1],
        AuthoringError::Instruction {
            component: "Q3".to_string(),
            instruction: "summary".to_string(),
            error: BindingError::BrokenDependency(Dependency::value("Q3")),
        }
    );
}

#[test]
fn test_sanitizer_drops_errored_subtrees() {
    let engine = engine();
    let survey = validated(&engine, BROKEN_SURVEY);

    assert_eq!(
        survey.errors(),
        vec![
            AuthoringError::Component {
                component: "G 2".to_string(),
                error: ComponentError::InvalidCode("G 2".to_string()),
            },
            AuthoringError::Instruction {
                component: "Q4".to_string(),
                instruction: "note".to_string(),
                error: BindingError::BrokenDependency(Dependency::value("Q5")),
            },
            AuthoringError::Instruction {
                component: "Q4".to_string(),
                instruction: "missing".to_string(),
                error: BindingError::UnknownDependency(Dependency::value("Q9")),
            },
        ]
    );

    let children: Vec<&str> = survey
        .sanitized
        .children
        .iter()
        .map(|child| child.code.as_str())
        .collect();
    assert_eq!(children, vec!["G1", "G3"]);
    let q4: Vec<&str> = survey
        .sanitized
        .find("Q4")
        .unwrap()
        .instructions
        .iter()
        .map(|instruction| instruction.code.as_str())
        .collect();
    assert_eq!(q4, vec!["value"]);
    assert!(survey.components.get("Q5").is_none());
}

#[test]
fn test_unaddressable_codes_are_dropped_not_fatal() {
    let engine = engine();
    let survey = validated(&engine, UNADDRESSABLE_SURVEY);

    assert_eq!(
        survey.errors(),
        vec![
            AuthoringError::Instruction {
                component: "Q1".to_string(),
                instruction: "2nd".to_string(),
                error: BindingError::InvalidTarget(Property::Custom("2nd".to_string())),
            },
            AuthoringError::Component {
                component: "null".to_string(),
                error: ComponentError::InvalidCode("null".to_string()),
            },
        ]
    );
    assert!(survey.sanitized.find("null").is_none());
    assert!(survey.sanitized.find("Q1").unwrap().instruction("2nd").is_none());
    assert_eq!(survey.computed(), slots(&["Q2.value"]).as_slice());
    assert!(engine.registry().contains("S1"));
}

#[test]
fn test_revalidating_sanitized_tree_is_clean() {
    let engine = engine();
    for json in [AGE_SURVEY, FORWARD_SURVEY, BROKEN_SURVEY, UNADDRESSABLE_SURVEY] {
        let first = validated(&engine, json);
        let second = engine.validate(first.sanitized.clone()).unwrap();

        assert!(second.errors().is_empty(), "{:?}", second.errors());
        assert_eq!(second.sanitized, first.sanitized);
        assert_eq!(second.graph, first.graph);
        assert_eq!(second.computed(), first.computed());
    }
}

#[test]
fn test_errored_root_is_not_executable() {
    let engine = engine();
    let mut survey = load_survey(AGE_SURVEY);
    survey.code = "S 1".to_string();

    let result = engine.validate(survey);
    assert!(matches!(result, Err(Error::InvalidSurvey(code)) if code == "S 1"));
}
