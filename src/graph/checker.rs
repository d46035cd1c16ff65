use std::collections::HashSet;

use tracing::debug;

use super::{DependencyGraph, EvaluationOrder};
use crate::dependency::Dependent;
use crate::survey::{BindingError, Component};

/// Attach forward, unknown and broken dependency errors to the offending instructions.
///
/// Walks instructions in canonical order. A legal dependency always points backwards, so
/// by the time an instruction is checked every producer it may read has been checked too,
/// and one pass is enough to propagate breakage down a chain. Returns the number of
/// instructions that received new errors.
pub fn check(tree: &mut Component, graph: &DependencyGraph, order: &EvaluationOrder) -> usize {
    let mut errored_components = HashSet::new();
    collect_errored_components(tree, false, &mut errored_components);

    let mut errored: HashSet<Dependent> = HashSet::new();
    for component in tree.walk() {
        for instruction in &component.instructions {
            if instruction.has_errors() || errored_components.contains(&component.code) {
                errored.insert(instruction.dependent(&component.code));
            }
        }
    }

    let mut flagged = 0;
    for dependent in order.sequence() {
        let Some(own_position) = order.position_of(dependent) else {
            continue;
        };

        let mut errors = Vec::new();
        for dependency in graph.dependencies_of(dependent) {
            match order.position(dependency) {
                None => errors.push(BindingError::UnknownDependency(dependency.clone())),
                Some(position) if position >= own_position => {
                    errors.push(BindingError::ForwardDependency(dependency.clone()))
                }
                Some(_) => {
                    let producer_errored = graph
                        .producer_of(dependency)
                        .is_some_and(|producer| errored.contains(producer));
                    if producer_errored || errored_components.contains(&dependency.component_code) {
                        errors.push(BindingError::BrokenDependency(dependency.clone()));
                    }
                }
            }
        }

        if errors.is_empty() {
            continue;
        }
        debug!("instruction {} rejected: {:?}", dependent, errors);
        let instruction = tree
            .find_mut(&dependent.component_code)
            .and_then(|component| {
                component
                    .instructions
                    .iter_mut()
                    .find(|i| i.code == dependent.instruction_code)
            });
        if let Some(instruction) = instruction {
            for error in errors {
                instruction.add_error(error);
            }
            flagged += 1;
        }
        errored.insert(dependent.clone());
    }
    flagged
}

fn collect_errored_components(
    component: &Component,
    inherited: bool,
    out: &mut HashSet<String>,
) {
    let errored = inherited || component.has_errors();
    if errored {
        out.insert(component.code.clone());
    }
    for child in &component.children {
        collect_errored_components(child, errored, out);
    }
}
