//! Navigation steps and index movement.

mod plan;

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::runtime::RuntimeError;

pub use plan::{NavigationPlan, NavigationStep};

/// How a survey is split into navigable steps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NavigationMode {
    /// One step showing every group.
    AllInOne,
    #[default]
    GroupByGroup,
    QuestionByQuestion,
}

/// The user's current step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "code", rename_all = "snake_case")]
pub enum NavigationIndex {
    Groups(Vec<String>),
    Group(String),
    Question(String),
}

impl NavigationIndex {
    /// Component codes that make up the step.
    pub fn codes(&self) -> Vec<&str> {
        match self {
            NavigationIndex::Groups(codes) => codes.iter().map(String::as_str).collect(),
            NavigationIndex::Group(code) | NavigationIndex::Question(code) => vec![code.as_str()],
        }
    }
}

impl fmt::Display for NavigationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationIndex::Groups(codes) => write!(f, "groups [{}]", codes.join(", ")),
            NavigationIndex::Group(code) => write!(f, "group {}", code),
            NavigationIndex::Question(code) => write!(f, "question {}", code),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "snake_case")]
pub enum NavigationDirection {
    #[default]
    Start,
    Next,
    Previous,
    Jump(NavigationIndex),
    /// Stay on the current step, moving forward if it is no longer relevant.
    Resume,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("No navigable steps in {0} mode")]
    NoSteps(NavigationMode),

    #[error("Unknown navigation step: {0}")]
    UnknownStep(NavigationIndex),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type NavigationResult<T> = Result<T, NavigationError>;
