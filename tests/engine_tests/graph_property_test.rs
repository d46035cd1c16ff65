use proptest::prelude::*;
use survey_engine::graph::{DependencyGraph, EvaluationOrder};
use survey_engine::{Component, Instruction, Property, ReservedCode};

use super::engine;

/// One question: `(a, b, broken)` makes its validity compare Q{a} with Q{b} and its `calc`
/// read `Q{a}.calc`, so both forward and backward references show up.
fn arb_questions() -> impl Strategy<Value = Vec<(usize, usize, bool)>> {
    prop::collection::vec((0usize..8, 0usize..8, prop::bool::weighted(0.2)), 1..8)
}

fn build_survey(questions: &[(usize, usize, bool)]) -> Component {
    let count = questions.len();
    let mut groups = vec![Component::new("G1"), Component::new("G2")];
    for (i, (a, b, broken)) in questions.iter().enumerate() {
        let (a, b) = (a % count + 1, b % count + 1);
        let validity = if *broken {
            ";;".to_string()
        } else {
            format!("Q{}.value > Q{}.value", a, b)
        };
        let question = Component::new(format!("Q{}", i + 1))
            .with_instruction(Instruction::input(ReservedCode::Value))
            .with_instruction(Instruction::state_with_code(
                "calc",
                Property::Custom("calc".to_string()),
                format!("if_null(Q{}.calc, 0) + 1", a),
            ))
            .with_instruction(Instruction::state(ReservedCode::Validity, validity));
        groups[i % 2].children.push(question);
    }
    groups
        .into_iter()
        .fold(Component::new("S1"), |survey, group| survey.with_child(group))
}

proptest! {
    #[test]
    fn test_impact_map_mirrors_dependency_map(questions in arb_questions()) {
        let survey = build_survey(&questions);
        let graph = DependencyGraph::build(&survey).graph;

        prop_assert!(graph.is_consistent());
        for (dependent, dependencies) in graph.dependency_map() {
            for dependency in dependencies {
                prop_assert!(graph.impacted_by(dependency).any(|d| d == dependent));
            }
        }
        for (dependency, dependents) in graph.impact_map() {
            for dependent in dependents {
                prop_assert!(graph.dependencies_of(dependent).contains(dependency));
            }
        }
    }

    #[test]
    fn test_validation_is_idempotent(questions in arb_questions()) {
        let engine = engine();
        let first = engine.validate(build_survey(&questions)).unwrap();
        let second = engine.validate(first.sanitized.clone()).unwrap();

        prop_assert!(second.errors().is_empty(), "{:?}", second.errors());
        prop_assert_eq!(&second.sanitized, &first.sanitized);

        // every surviving dependency points strictly backwards
        let order = EvaluationOrder::build(&second.sanitized);
        for (dependent, dependencies) in second.graph.dependency_map() {
            let own = order.position_of(dependent).unwrap();
            for dependency in dependencies {
                prop_assert!(order.position(dependency).unwrap() < own);
            }
        }
    }
}
