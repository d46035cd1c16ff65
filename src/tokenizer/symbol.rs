//! Operators and delimiters of the instruction expression language.

use nom::error::{context, ErrorKind, ParseError, VerboseError};
use strum_macros::{AsRefStr, Display, EnumString};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Member access (`Q1.value`)
    #[strum(serialize = ".")]
    Dot,
    #[strum(serialize = "==")]
    EqualEqual,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "!")]
    Not,
    /// Conditional (`cond ? a : b`)
    #[strum(serialize = "?")]
    Question,
}

// strum's Display reads `serialize` as a format string and rejects a lone brace,
// so Delimiter prints through AsRefStr instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Delimiter {
    #[strum(serialize = "{")]
    OpenBrace,
    #[strum(serialize = "}")]
    CloseBrace,
    #[strum(serialize = "(")]
    OpenParen,
    #[strum(serialize = ")")]
    CloseParen,
    #[strum(serialize = "[")]
    OpenBracket,
    #[strum(serialize = "]")]
    CloseBracket,
    #[strum(serialize = ",")]
    Comma,
    /// Statement terminator in a script bundle
    #[strum(serialize = ";")]
    Semicolon,
    #[strum(serialize = ":")]
    Colon,
    /// Assignment in a script bundle
    #[strum(serialize = "=")]
    Equal,
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

// two-character symbols come first so `>=` is never read as `>` then `=`
const SYMBOLS: [(&str, Token); 26] = [
    ("==", Token::Operator(Operator::EqualEqual)),
    ("!=", Token::Operator(Operator::NotEqual)),
    (">=", Token::Operator(Operator::GreaterEqual)),
    ("<=", Token::Operator(Operator::LessEqual)),
    ("&&", Token::Operator(Operator::And)),
    ("||", Token::Operator(Operator::Or)),
    (".", Token::Operator(Operator::Dot)),
    (">", Token::Operator(Operator::Greater)),
    ("<", Token::Operator(Operator::Less)),
    ("+", Token::Operator(Operator::Plus)),
    ("-", Token::Operator(Operator::Minus)),
    ("*", Token::Operator(Operator::Multiply)),
    ("/", Token::Operator(Operator::Divide)),
    ("%", Token::Operator(Operator::Modulo)),
    ("!", Token::Operator(Operator::Not)),
    ("?", Token::Operator(Operator::Question)),
    ("{", Token::Delimiter(Delimiter::OpenBrace)),
    ("}", Token::Delimiter(Delimiter::CloseBrace)),
    ("(", Token::Delimiter(Delimiter::OpenParen)),
    (")", Token::Delimiter(Delimiter::CloseParen)),
    ("[", Token::Delimiter(Delimiter::OpenBracket)),
    ("]", Token::Delimiter(Delimiter::CloseBracket)),
    (",", Token::Delimiter(Delimiter::Comma)),
    (";", Token::Delimiter(Delimiter::Semicolon)),
    (":", Token::Delimiter(Delimiter::Colon)),
    ("=", Token::Delimiter(Delimiter::Equal)),
];

fn match_symbol(input: &str) -> ParserResult<Token> {
    SYMBOLS
        .iter()
        .find(|(text, _)| input.starts_with(text))
        .map(|(text, token)| (&input[text.len()..], token.clone()))
        .ok_or_else(|| nom::Err::Error(VerboseError::from_error_kind(input, ErrorKind::Tag)))
}

/// Operator or delimiter, longest match first.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_symbol(input: &str) -> ParserResult<Token> {
    context("symbol", match_symbol)(input)
}
