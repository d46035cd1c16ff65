use std::collections::HashSet;

use tracing::debug;

use super::component::Component;
use super::error::{BindingError, ComponentError};
use crate::dependency::is_identifier;

/// Attach structural errors in place: component codes and targets that expressions cannot
/// address, duplicated component or instruction codes, and two instructions writing the
/// same slot.
///
/// The first occurrence of a duplicate stays clean; every later one is flagged.
pub fn attach_structural_errors(root: &mut Component) {
    let mut seen_components = HashSet::new();
    root.visit_mut(&mut |component: &mut Component| {
        if !is_identifier(&component.code) {
            push_component_error(component, ComponentError::InvalidCode(component.code.clone()));
        } else if !seen_components.insert(component.code.clone()) {
            push_component_error(component, ComponentError::DuplicateCode(component.code.clone()));
        }

        let code = component.code.clone();
        let mut seen_codes = HashSet::new();
        let mut seen_targets = HashSet::new();
        for instruction in &mut component.instructions {
            if !seen_codes.insert(instruction.code.clone()) {
                instruction.add_error(BindingError::DuplicateInstructionCode(
                    instruction.code.clone(),
                ));
                continue;
            }
            if !instruction.target().is_addressable() {
                instruction.add_error(BindingError::InvalidTarget(instruction.target().clone()));
                continue;
            }
            let target = instruction.produces(&code);
            if !seen_targets.insert(target.clone()) {
                instruction.add_error(BindingError::DuplicateTarget(target));
            }
        }
    });
}

fn push_component_error(component: &mut Component, error: ComponentError) {
    debug!("component {}: {}", component.code, error);
    if !component.errors.contains(&error) {
        component.errors.push(error);
    }
}
