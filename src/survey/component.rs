use serde::{Deserialize, Serialize};

use super::error::{BindingError, ComponentError};
use crate::dependency::{Dependency, Dependent, Property};

/// Classification of a component, derived from its code and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ComponentKind {
    Survey,
    Group,
    Question,
    Answer,
    Other,
}

/// One node of the survey tree. Children are owned; there are no back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub code: String,

    #[serde(default)]
    pub instructions: Vec<Instruction>,

    #[serde(default)]
    pub children: Vec<Component>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ComponentError>,
}

impl Component {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            instructions: Vec::new(),
            children: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn instruction(&self, code: &str) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.code == code)
    }

    /// Pre-order walk over this component and all descendants.
    pub fn walk(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(component) = stack.pop() {
            out.push(component);
            stack.extend(component.children.iter().rev());
        }
        out
    }

    pub fn find(&self, code: &str) -> Option<&Component> {
        self.walk().into_iter().find(|c| c.code == code)
    }

    pub fn find_mut(&mut self, code: &str) -> Option<&mut Component> {
        if self.code == code {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(code))
    }

    /// Mutable pre-order visit, used to attach errors in place.
    pub fn visit_mut<F: FnMut(&mut Component)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Total number of errors on this subtree, components and instructions alike.
    pub fn error_count(&self) -> usize {
        self.walk()
            .iter()
            .map(|c| c.errors.len() + c.instructions.iter().map(|i| i.errors.len()).sum::<usize>())
            .sum()
    }
}

/// What an instruction computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstructionKind {
    /// Plain expression bound to a property.
    SimpleState { text: String, target: Property },

    /// Resolves `<component>.<property>` references for a piece of (translated) text.
    Reference {
        references: Vec<String>,
        #[serde(default)]
        lang: Option<String>,
        target: Property,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub code: String,

    #[serde(flatten)]
    pub kind: InstructionKind,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BindingError>,
}

fn default_true() -> bool {
    true
}

impl Instruction {
    /// Active expression instruction whose code is the target's name.
    pub fn state(target: impl Into<Property>, text: impl Into<String>) -> Self {
        let target = target.into();
        Self::state_with_code(target.to_string(), target, text)
    }

    pub fn state_with_code(
        code: impl Into<String>,
        target: impl Into<Property>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            kind: InstructionKind::SimpleState {
                text: text.into(),
                target: target.into(),
            },
            is_active: true,
            errors: Vec::new(),
        }
    }

    /// Inactive slot filled by submitted values rather than an expression.
    pub fn input(target: impl Into<Property>) -> Self {
        let target = target.into();
        Self {
            code: target.to_string(),
            kind: InstructionKind::SimpleState {
                text: String::new(),
                target,
            },
            is_active: false,
            errors: Vec::new(),
        }
    }

    pub fn reference(
        code: impl Into<String>,
        references: Vec<String>,
        lang: Option<String>,
    ) -> Self {
        let code = code.into();
        Self {
            kind: InstructionKind::Reference {
                references,
                lang,
                target: Property::Custom(code.clone()),
            },
            code,
            is_active: true,
            errors: Vec::new(),
        }
    }

    pub fn target(&self) -> &Property {
        match &self.kind {
            InstructionKind::SimpleState { target, .. } => target,
            InstructionKind::Reference { target, .. } => target,
        }
    }

    pub fn dependent(&self, component_code: &str) -> Dependent {
        Dependent::new(component_code, self.code.clone())
    }

    /// Slot written by this instruction.
    pub fn produces(&self, component_code: &str) -> Dependency {
        Dependency::new(component_code, self.target().clone())
    }

    /// Text handed to the script evaluator, `None` for inputs.
    pub fn script(&self) -> Option<&str> {
        match (&self.kind, self.is_active) {
            (InstructionKind::SimpleState { text, .. }, true) => Some(text),
            _ => None,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: BindingError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::ReservedCode;
    use serde_json::json;

    #[test]
    fn test_deserialize_tree() {
        let survey: Component = serde_json::from_value(json!({
            "code": "Survey",
            "children": [{
                "code": "G1",
                "children": [{
                    "code": "Q1",
                    "instructions": [
                        {"code": "value", "type": "simple_state", "text": "", "target": "value", "is_active": false},
                        {"code": "validity", "type": "simple_state", "text": "Q1.value > 3", "target": "validity"},
                        {"code": "label_ref", "type": "reference", "references": ["Q1.value"], "lang": "en", "target": "label_ref"}
                    ]
                }]
            }]
        }))
        .unwrap();

        let q1 = survey.find("Q1").unwrap();
        assert_eq!(q1.instructions.len(), 3);
        assert!(!q1.instructions[0].is_active);
        assert_eq!(q1.instructions[0].script(), None);
        assert_eq!(q1.instructions[1].script(), Some("Q1.value > 3"));
        assert_eq!(
            q1.instructions[1].produces("Q1"),
            Dependency::reserved("Q1", ReservedCode::Validity)
        );
        assert_eq!(
            q1.instructions[2].target(),
            &Property::Custom("label_ref".to_string())
        );
    }

    #[test]
    fn test_walk_is_document_order() {
        let survey = Component::new("Survey")
            .with_child(
                Component::new("G1")
                    .with_child(Component::new("Q1"))
                    .with_child(Component::new("Q2")),
            )
            .with_child(Component::new("G2").with_child(Component::new("Q3")));
        let codes: Vec<_> = survey.walk().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["Survey", "G1", "Q1", "Q2", "G2", "Q3"]);
    }

    #[test]
    fn test_add_error_deduplicates() {
        let mut instruction = Instruction::state(ReservedCode::Value, "Q2.value");
        instruction.add_error(BindingError::ForwardDependency(Dependency::value("Q2")));
        instruction.add_error(BindingError::ForwardDependency(Dependency::value("Q2")));
        assert_eq!(instruction.errors.len(), 1);
    }
}
