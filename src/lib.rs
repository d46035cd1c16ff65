pub mod analyzer;
pub mod ast;
pub mod config;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod eval;
pub mod graph;
pub mod navigation;
pub mod runtime;
pub mod script;
pub mod survey;
pub mod tokenizer;
pub mod value;

// Re-exports
pub use config::EngineConfig;
pub use dependency::{Dependency, Dependent, Property, ReservedCode};
pub use engine::{
    AuthoringError, NavigationOutput, NavigationRequest, SurveyEngine, ValidatedSurvey,
};
pub use error::*;
pub use navigation::{NavigationDirection, NavigationIndex, NavigationMode};
pub use script::{
    CompiledProgram, ExpressionRuntime, MockScriptEvaluator, ProgramRegistry, ScriptEvaluator,
    ScriptFailure, ScriptMethod, ScriptResultType,
};
pub use survey::{BindingError, Component, ComponentError, Instruction, InstructionKind};
pub use value::{Bindings, Value};
