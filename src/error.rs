use thiserror::Error;

use crate::config::ConfigError;
use crate::navigation::NavigationError;
use crate::runtime::RuntimeError;
use crate::script::ScriptFailure;

/// Failures that abort a use case. Problems in authored content are not errors here: they
/// are attached to the tree and reported through `ValidatedSurvey::errors`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),
    // script evaluator boundary
    #[error("Script evaluator error: {0}")]
    Script(#[from] ScriptFailure),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No compiled program registered for survey {0}")]
    ProgramNotRegistered(String),
    #[error("Survey {0} cannot be executed: its root component has errors")]
    InvalidSurvey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
