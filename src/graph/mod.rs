//! Dependency/impact graph, canonical evaluation order, the forward-reference checker and the
//! sanitizer. Together they turn an authored tree into one that is safe to execute.

mod builder;
mod checker;
pub mod order;
mod sanitizer;

pub use builder::{DependencyGraph, GraphBuild};
pub use checker::check;
pub use order::EvaluationOrder;
pub use sanitizer::sanitize;
