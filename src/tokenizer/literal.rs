use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, digit1},
    combinator::{cut, map, map_res, opt, recognize, value},
    error::context,
    sequence::{pair, terminated},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
}

/// Body of a quoted string up to (not including) the closing `quote`.
fn string_body(quote: char) -> impl FnMut(&str) -> ParserResult<String> {
    let stop = if quote == '"' { "\\\"" } else { "\\'" };
    move |input| {
        let escapes = alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("'", tag("'")),
            value("\n", tag("n")),
            value("\t", tag("t")),
        ));
        map(opt(escaped_transform(is_not(stop), '\\', escapes)), |body| {
            body.unwrap_or_default()
        })(input)
    }
}

fn quoted(quote: char) -> impl FnMut(&str) -> ParserResult<String> {
    move |input| {
        let (input, _) = char(quote)(input)?;
        // past the opening quote an unterminated string is a hard error
        cut(terminated(string_body(quote), char(quote)))(input)
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(alt((quoted('"'), quoted('\''))), Literal::String),
    )(input)
}

/// `digits` or `digits.digits`. A dot not followed by a digit is left for member access.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            |text: &str| {
                if text.contains('.') {
                    text.parse::<f64>().map(Literal::Float).map_err(|e| e.to_string())
                } else {
                    text.parse::<i64>().map(Literal::Integer).map_err(|e| e.to_string())
                }
            },
        ),
    )(input)
}

/// Signs are not part of numeric literals; `-` is parsed as a unary operator.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    map(alt((parse_string_literal, parse_number_literal)), Token::Literal)(input)
}
