pub mod combinators;
pub mod core;
pub mod expression;
pub mod prelude;
pub mod references;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
pub use expression::{parse_expression_source, parse_program, SyntaxError};
pub use references::{collect_calls, collect_references, extract_dependencies};
