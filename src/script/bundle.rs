//! Script bundle generation.
//!
//! A bundle is one statement per active instruction, in canonical evaluation order:
//!
//! ```text
//! Q1.relevance = (G1.relevance && Q0.value > 3);
//! Q1.label_ref = {"Q0.value": Q0.value};
//! ```

use std::collections::HashMap;

use crate::dependency::{Dependency, Dependent};
use crate::graph::EvaluationOrder;
use crate::survey::{Component, Instruction, InstructionKind};

/// Render the bundle for a sanitized tree. Inactive instructions are inputs and emit nothing.
pub fn generate(tree: &Component, order: &EvaluationOrder) -> String {
    let instructions: HashMap<Dependent, &Instruction> = tree
        .walk()
        .into_iter()
        .flat_map(|component| {
            component
                .instructions
                .iter()
                .map(move |instruction| (instruction.dependent(&component.code), instruction))
        })
        .collect();

    let mut bundle = String::new();
    for dependent in order.sequence() {
        let Some(instruction) = instructions.get(dependent) else {
            continue;
        };
        if !instruction.is_active {
            continue;
        }
        let target = instruction.produces(&dependent.component_code);
        let expression = match &instruction.kind {
            InstructionKind::SimpleState { text, .. } => format!("({})", text.trim()),
            InstructionKind::Reference { references, .. } => reference_map(references),
        };
        bundle.push_str(&format!("{} = {};\n", target, expression));
    }
    bundle
}

fn reference_map(references: &[String]) -> String {
    let entries: Vec<String> = references
        .iter()
        .filter_map(|reference| reference.parse::<Dependency>().ok())
        .map(|dependency| format!("\"{}\": {}", dependency, dependency))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
