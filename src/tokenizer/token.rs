use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    combinator::{map, recognize},
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    keyword::Keyword,
    literal::{parse_literal, Literal},
    symbol::{parse_symbol, Delimiter, Operator},
};

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    Operator(Operator),
    Delimiter(Delimiter),
    Literal(Literal),
    // trivia
    Whitespace(String),
    Newline,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace(_) | Token::Newline)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(keyword) => write!(f, "{}", keyword),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(delimiter) => write!(f, "{}", delimiter),
            Token::Literal(Literal::String(s)) => write!(f, "{:?}", s),
            Token::Literal(Literal::Integer(i)) => write!(f, "{}", i),
            Token::Literal(Literal::Float(x)) => write!(f, "{}", x),
            Token::Whitespace(_) => write!(f, "<whitespace>"),
            Token::Newline => write!(f, "<newline>"),
        }
    }
}

/// A token with its byte range and 1-based line/column.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("{message} at {span}, found '{found}'")]
    ParseError {
        message: String,
        found: String,
        span: Span,
    },
}

/// Position tracker; lines and columns are 1-based, columns count chars.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Cursor {
    fn advance(&mut self, consumed: &str) {
        self.offset += consumed.len();
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    cursor: Cursor,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut spans = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start = self.cursor;
            let parsed = alt((
                parse_whitespace,
                parse_newline,
                parse_literal,
                parse_symbol,
                parse_identifier,
            ))(remaining);

            let (rest, token) = match parsed {
                Ok(parsed) => parsed,
                Err(e) => return Err(self.error_at(remaining, e)),
            };
            self.cursor.advance(&remaining[..remaining.len() - rest.len()]);
            spans.push(TokenSpan {
                token,
                start: start.offset,
                end: self.cursor.offset,
                line: start.line,
                column: start.column,
            });
            remaining = rest;
        }

        Ok(spans)
    }

    fn error_at(&self, remaining: &str, error: nom::Err<VerboseError<&str>>) -> TokenizerError {
        let message = match error {
            nom::Err::Incomplete(needed) => format!("Incomplete input, {:?}", needed),
            nom::Err::Failure(e) if !e.errors.is_empty() => {
                let what = e
                    .errors
                    .iter()
                    .rev()
                    .find_map(|(_, kind)| match kind {
                        nom::error::VerboseErrorKind::Context(what) => Some(*what),
                        _ => None,
                    })
                    .unwrap_or("token");
                format!("unterminated {}", what)
            }
            nom::Err::Error(_) | nom::Err::Failure(_) => "unrecognized input".to_string(),
        };
        let error = TokenizerError::ParseError {
            message,
            found: remaining.chars().take(20).collect(),
            span: Span {
                start: self.cursor.offset,
                end: self.cursor.offset + 1,
                line: self.cursor.line,
                column: self.cursor.column,
            },
        };
        tracing::debug!("{}", error);
        error
    }
}

/// Tokenize and drop whitespace/newlines, which carry no meaning in expressions.
pub fn tokenize_significant(input: &str) -> TokenizerResult<Vec<TokenSpan>> {
    let spans = Tokenizer::new().tokenize(input)?;
    Ok(spans.into_iter().filter(|span| !span.token.is_trivia()).collect())
}

/// Spaces and tabs. Newlines are separate tokens so positions stay line-accurate.
fn parse_whitespace(input: &str) -> ParserResult<Token> {
    map(take_while1(|c| c == ' ' || c == '\t'), |ws: &str| {
        Token::Whitespace(ws.to_string())
    })(input)
}

fn parse_newline(input: &str) -> ParserResult<Token> {
    map(alt((tag("\r\n"), tag("\n"))), |_| Token::Newline)(input)
}

/// Identifiers, with whole-word keywords split out so `trueish` stays an identifier.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, word) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
    )(input)?;

    let token = match word.parse::<Keyword>() {
        Ok(keyword) => Token::Keyword(keyword),
        Err(_) => Token::Identifier(word.to_string()),
    };
    Ok((input, token))
}
