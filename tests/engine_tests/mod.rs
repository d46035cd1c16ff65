mod evaluator_port_test;
mod graph_property_test;
mod navigation_test;
mod validation_test;

use survey_engine::{
    Bindings, Component, Dependency, EngineConfig, NavigationDirection, NavigationIndex,
    NavigationOutput, NavigationRequest, SurveyEngine, ValidatedSurvey, Value,
};

/// Two questions in G1 (Q2 only asked to adults), a computed question in G2 that is skipped
/// when Q1 is 99, and a plain input in G3.
pub const AGE_SURVEY: &str = r#"
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
                        {"code": "validity", "type": "simple_state", "text": "Q1.value != null && Q1.value >= 0", "target": "validity"}
                    ]
                },
                {
                    "code": "Q2",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false},
                        {"code": "relevance", "type": "simple_state", "text": "Q1.value > 17", "target": "relevance"},
                        {"code": "validity", "type": "simple_state", "text": "!is_empty(Q2.value)", "target": "validity"}
                    ]
                }
            ]
        },
        {
            "code": "G2",
            "instructions": [
                {"code": "relevance", "type": "simple_state", "text": "Q1.value != 99", "target": "relevance"}
            ],
            "children": [
                {
                    "code": "Q3",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "Q1.value * 2", "target": "value"},
                        {"code": "summary", "type": "reference", "references": ["Q1.value", "Q3.value"], "lang": "en", "target": "summary"}
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
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false}
                    ]
                }
            ]
        }
    ]
}
"#;

pub fn load_survey(json: &str) -> Component {
    serde_json::from_str(json).expect("fixture must deserialize")
}

pub fn engine() -> SurveyEngine {
    SurveyEngine::with_builtin_runtime(EngineConfig::default()).expect("default config is valid")
}

pub fn validated(engine: &SurveyEngine, json: &str) -> ValidatedSurvey {
    engine.validate(load_survey(json)).expect("survey must validate")
}

pub fn group(code: &str) -> NavigationIndex {
    NavigationIndex::Group(code.to_string())
}

pub fn question(code: &str) -> NavigationIndex {
    NavigationIndex::Question(code.to_string())
}

pub fn values(entries: &[(&str, Value)]) -> Bindings {
    entries
        .iter()
        .map(|(slot, value)| (slot.parse::<Dependency>().expect("valid slot"), value.clone()))
        .collect()
}

pub fn request(
    index: Option<NavigationIndex>,
    direction: NavigationDirection,
    submitted: Bindings,
) -> NavigationRequest {
    NavigationRequest {
        index,
        direction,
        values: submitted,
        previous: None,
    }
}

pub fn slot(output: &NavigationOutput, slot: &str) -> Option<Value> {
    let dependency: Dependency = slot.parse().expect("valid slot");
    output.bindings.get(&dependency).cloned()
}
