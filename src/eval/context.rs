use crate::dependency::Dependency;
use crate::value::{Bindings, Value};

/// Read-only view an expression is evaluated against.
///
/// A reference to a slot that has not been written yet reads as `null`; whether the
/// reference is legal at all is decided before anything runs.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    bindings: &'a Bindings,
    max_depth: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(bindings: &'a Bindings, max_depth: usize) -> Self {
        Self {
            bindings,
            max_depth,
        }
    }

    pub fn get(&self, dependency: &Dependency) -> Value {
        self.bindings.get(dependency).cloned().unwrap_or_default()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
