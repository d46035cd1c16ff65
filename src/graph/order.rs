use std::collections::{HashMap, HashSet};

use crate::dependency::{Dependency, Dependent, Property, ReservedCode};
use crate::survey::{Component, Instruction};

/// Position of slots that exist without an instruction: a component's default relevance
/// and validity. They are seeded before anything runs.
pub const IMPLICIT_POSITION: usize = 0;

/// Position of runtime-derived slots, which are only written after every instruction ran.
pub const RUNTIME_DERIVED_POSITION: usize = usize::MAX;

/// Canonical single-pass evaluation order of a component tree.
///
/// The walk positions a component's `relevance` when it enters the component and every
/// other property when it leaves it, after all descendants, ranked
/// `value < custom (declaration order) < validity < runtime-derived`.
/// So a question may read the answers of earlier siblings and of its own children, a group
/// may aggregate its children, and relevance is decided before anything inside.
#[derive(Debug, Clone, Default)]
pub struct EvaluationOrder {
    sequence: Vec<Dependent>,
    dependents: HashMap<Dependent, usize>,
    slots: HashMap<Dependency, usize>,
    components: HashSet<String>,
}

impl EvaluationOrder {
    pub fn build(tree: &Component) -> Self {
        let mut order = Self::default();
        order.visit(tree);
        order
    }

    fn visit(&mut self, component: &Component) {
        self.components.insert(component.code.clone());

        for instruction in &component.instructions {
            if rank(instruction).is_none() {
                self.push(component, instruction);
            }
        }

        for child in &component.children {
            self.visit(child);
        }

        let mut leaving: Vec<(u8, &Instruction)> = component
            .instructions
            .iter()
            .filter_map(|instruction| rank(instruction).map(|r| (r, instruction)))
            .collect();
        leaving.sort_by_key(|(rank, _)| *rank);
        for (_, instruction) in leaving {
            self.push(component, instruction);
        }
    }

    fn push(&mut self, component: &Component, instruction: &Instruction) {
        let dependent = instruction.dependent(&component.code);
        if self.dependents.contains_key(&dependent) {
            return;
        }
        let position = self.sequence.len() + 1;
        let target = instruction.produces(&component.code);
        if !target.property.is_runtime_derived() {
            self.slots.entry(target).or_insert(position);
        }
        self.dependents.insert(dependent.clone(), position);
        self.sequence.push(dependent);
    }

    /// Instructions in evaluation order.
    pub fn sequence(&self) -> &[Dependent] {
        &self.sequence
    }

    pub fn position_of(&self, dependent: &Dependent) -> Option<usize> {
        self.dependents.get(dependent).copied()
    }

    /// Position at which `dependency` holds its final value, `None` when nothing declares it.
    pub fn position(&self, dependency: &Dependency) -> Option<usize> {
        if !self.components.contains(&dependency.component_code) {
            return None;
        }
        if dependency.property.is_runtime_derived() {
            return Some(RUNTIME_DERIVED_POSITION);
        }
        if let Some(position) = self.slots.get(dependency) {
            return Some(*position);
        }
        match dependency.property {
            Property::Reserved(ReservedCode::Relevance | ReservedCode::Validity) => {
                Some(IMPLICIT_POSITION)
            }
            _ => None,
        }
    }

    /// Slot explicitly declared by an instruction, as opposed to a default.
    pub fn is_declared(&self, dependency: &Dependency) -> bool {
        self.slots.contains_key(dependency)
    }
}

/// Rank among the properties positioned when leaving a component; `None` for relevance,
/// which is positioned on entry.
fn rank(instruction: &Instruction) -> Option<u8> {
    match instruction.target() {
        Property::Reserved(ReservedCode::Relevance) => None,
        Property::Reserved(ReservedCode::Value) => Some(0),
        Property::Custom(_) => Some(1),
        Property::Reserved(ReservedCode::Validity) => Some(2),
        Property::Reserved(_) => Some(3),
    }
}
