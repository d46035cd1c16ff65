//! nom-based lexer for instruction expressions and script bundles.

pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;

pub use token::{tokenize_significant, Span, Token, TokenSpan, Tokenizer, TokenizerError};
