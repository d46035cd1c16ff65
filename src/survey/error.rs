use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::{Dependency, Property};
use crate::script::ScriptResultType;

/// Structural problem with a component. Attached to the component, never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum ComponentError {
    #[error("Duplicate component code: {0}")]
    DuplicateCode(String),

    #[error("Invalid component code: '{0}'")]
    InvalidCode(String),
}

/// Problem with one instruction. Attached to the instruction, never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum BindingError {
    #[error("Script failure ({result_type}): {message}")]
    ScriptFailure {
        result_type: ScriptResultType,
        message: String,
    },

    #[error("Forward dependency on {0}")]
    ForwardDependency(Dependency),

    #[error("Unknown dependency {0}")]
    UnknownDependency(Dependency),

    #[error("Dependency {0} is produced by an instruction with errors")]
    BrokenDependency(Dependency),

    #[error("Slot {0} is already produced by another instruction")]
    DuplicateTarget(Dependency),

    #[error("Duplicate instruction code: {0}")]
    DuplicateInstructionCode(String),

    #[error("Target '{0}' cannot be referenced from an expression")]
    InvalidTarget(Property),
}

impl BindingError {
    pub fn script_failure(result_type: ScriptResultType, message: impl Into<String>) -> Self {
        BindingError::ScriptFailure {
            result_type,
            message: message.into(),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::script_failure(ScriptResultType::SyntaxError, message)
    }
}
