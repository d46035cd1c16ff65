//! Script evaluator port.
//!
//! The engine hands surviving instructions to a [`ScriptEvaluator`] as one bundle, compiled
//! once per survey definition and executed many times through two JSON entry points:
//! `validate` (per-script checks) and `navigate` (evaluate the bundle over submitted values).
//! [`ExpressionRuntime`] is the built-in, sandboxed implementation.

pub mod bundle;
pub mod registry;
pub mod runtime;

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::Dependency;
use crate::value::Bindings;

pub use registry::ProgramRegistry;
pub use runtime::ExpressionRuntime;

/// Class of a script failure as reported across the evaluator boundary.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScriptResultType {
    SyntaxError,
    ReferenceError,
    RuntimeError,
}

/// Outcome of one script in a `validate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScriptStatus {
    Ok,
    SyntaxError,
    ReferenceError,
    RuntimeError,
}

impl ScriptStatus {
    pub fn failure(self) -> Option<ScriptResultType> {
        match self {
            ScriptStatus::Ok => None,
            ScriptStatus::SyntaxError => Some(ScriptResultType::SyntaxError),
            ScriptStatus::ReferenceError => Some(ScriptResultType::ReferenceError),
            ScriptStatus::RuntimeError => Some(ScriptResultType::RuntimeError),
        }
    }
}

impl From<ScriptResultType> for ScriptStatus {
    fn from(result_type: ScriptResultType) -> Self {
        match result_type {
            ScriptResultType::SyntaxError => ScriptStatus::SyntaxError,
            ScriptResultType::ReferenceError => ScriptStatus::ReferenceError,
            ScriptResultType::RuntimeError => ScriptStatus::RuntimeError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ScriptMethod {
    Validate,
    Navigate,
}

/// Structured failure crossing the evaluator boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{result_type}: {message}")]
pub struct ScriptFailure {
    pub result_type: ScriptResultType,
    pub message: String,
}

impl ScriptFailure {
    pub fn new(result_type: ScriptResultType, message: impl Into<String>) -> Self {
        Self {
            result_type,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ScriptResultType::SyntaxError, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ScriptResultType::RuntimeError, message)
    }
}

pub type ScriptResult<T> = Result<T, ScriptFailure>;

/// Opaque handle to a compiled bundle. Cloning shares the payload.
#[derive(Clone)]
pub struct CompiledProgram {
    payload: Arc<dyn Any + Send + Sync>,
    fingerprint: u64,
    source: Arc<str>,
}

impl CompiledProgram {
    pub fn new<T: Any + Send + Sync>(source: &str, payload: T) -> Self {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        Self {
            payload: Arc::new(payload),
            fingerprint: hasher.finish(),
            source: Arc::from(source),
        }
    }

    /// The evaluator-specific payload, if it was produced by an evaluator using `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shares_payload_with(&self, other: &CompiledProgram) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProgram")
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Capability to compile a bundle once and execute it many times.
///
/// Implementations must not touch the host system and must report script problems as
/// [`ScriptFailure`] values (or inside the JSON result) rather than panicking.
#[mockall::automock]
pub trait ScriptEvaluator: Send + Sync {
    fn compile(&self, bundle: &str) -> ScriptResult<CompiledProgram>;

    fn execute(
        &self,
        program: &CompiledProgram,
        method: ScriptMethod,
        params: &str,
    ) -> ScriptResult<String>;
}

/// One entry of the `validate` params array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptCheck {
    pub key: String,
    pub script: String,
}

/// One entry of the `validate` result array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub key: String,
    pub result_type: ScriptStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl ScriptReport {
    pub fn ok(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            result_type: ScriptStatus::Ok,
            message: None,
        }
    }

    pub fn failed(key: impl Into<String>, failure: ScriptFailure) -> Self {
        Self {
            key: key.into(),
            result_type: failure.result_type.into(),
            message: Some(failure.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigateParams {
    pub values: Bindings,
    /// Slots to recompute; `None` recomputes every statement.
    #[serde(default)]
    pub targets: Option<Vec<Dependency>>,
}

/// A statement that failed during `navigate`. Its slot was written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementFailure {
    pub key: Dependency,
    pub result_type: ScriptResultType,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigateResult {
    pub bindings: Bindings,
    #[serde(default)]
    pub failures: Vec<StatementFailure>,
}
