//! Survey component tree: components, instructions, and the author-time error taxonomy.

mod component;
mod error;
mod index;
mod structure;

pub use component::{Component, ComponentKind, Instruction, InstructionKind};
pub use error::{BindingError, ComponentError};
pub use index::{ComponentEntry, ComponentIndex};
pub use structure::attach_structural_errors;
