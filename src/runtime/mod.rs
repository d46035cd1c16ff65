//! Runtime Context Builder: validity aggregation and navigation bindings.

mod context;

use thiserror::Error;

use crate::dependency::Dependency;
use crate::navigation::NavigationIndex;
use crate::value::ValueError;

pub use context::RuntimeContextBuilder;

/// Contract violation while deriving runtime bindings.
///
/// Every relevance and validity slot is seeded before the builder runs, so any of these
/// means the upstream graph or evaluation order is wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Missing binding for {0}")]
    MissingBinding(Dependency),

    #[error("Invalid binding for {dependency}: {source}")]
    InvalidBinding {
        dependency: Dependency,
        #[source]
        source: ValueError,
    },

    #[error("Navigation index {0} is not a step of this survey")]
    UnknownStep(NavigationIndex),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
