//! Expression and script bundle grammar.
//!
//! ```text
//! program     := statement*
//! statement   := reference '=' expression ';'
//! expression  := logical_or ('?' expression ':' expression)?
//! logical_or  := logical_and ('||' logical_and)*
//! logical_and := comparison ('&&' comparison)*
//! comparison  := additive (('=='|'!='|'<'|'<='|'>'|'>=') additive)*
//! additive    := term (('+'|'-') term)*
//! term        := unary (('*'|'/'|'%') unary)*
//! unary       := ('!'|'-') unary | primary
//! primary     := literal | list | map | call | reference | '(' expression ')'
//! reference   := identifier '.' identifier
//! ```

use thiserror::Error;

use super::{core::*, prelude::*};
use crate::ast::{self, BinaryOperator, Expression, Statement, UnaryOperator};
use crate::dependency::{Dependency, Property};
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    tokenize_significant, Token, TokenSpan, TokenizerError,
};

/// A script that does not parse. Positions are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<TokenizerError> for SyntaxError {
    fn from(error: TokenizerError) -> Self {
        let TokenizerError::ParseError {
            message,
            found,
            span,
        } = error;
        SyntaxError {
            message: format!("{} '{}'", message, found),
            line: span.line,
            column: span.column,
        }
    }
}

/// Parse a single instruction expression.
#[tracing::instrument(level = "debug", skip(source))]
pub fn parse_expression_source(source: &str) -> Result<Expression, SyntaxError> {
    let spans = tokenize_significant(source)?;
    if spans.is_empty() {
        return Err(SyntaxError {
            message: "empty expression".to_string(),
            line: 1,
            column: 1,
        });
    }
    parse_all(parse_expression(), &spans)
}

/// Parse a script bundle into its statements.
#[tracing::instrument(level = "debug", skip(source))]
pub fn parse_program(source: &str) -> Result<ast::Program, SyntaxError> {
    let spans = tokenize_significant(source)?;
    let statements = parse_all(many(parse_statement()), &spans)?;
    Ok(ast::Program { statements })
}

fn parse_all<O>(parser: impl Parser<Token, O>, spans: &[TokenSpan]) -> Result<O, SyntaxError> {
    let tokens: Vec<Token> = spans.iter().map(|span| span.token.clone()).collect();
    match parser.parse(&tokens, 0) {
        Ok((pos, output)) if pos == tokens.len() => Ok(output),
        Ok((pos, _)) => Err(syntax_error_at(spans, pos, None)),
        Err(e) => {
            tracing::debug!("parse failed: {}", e);
            Err(syntax_error_at(spans, e.position(), e.expected()))
        }
    }
}

fn syntax_error_at(spans: &[TokenSpan], pos: usize, expected: Option<&str>) -> SyntaxError {
    let expected = expected
        .map(|what| format!(", expected {}", what))
        .unwrap_or_default();
    match spans.get(pos) {
        Some(span) => SyntaxError {
            message: format!("Unexpected '{}'{}", span.token, expected),
            line: span.line,
            column: span.column,
        },
        None => {
            let (line, column) = spans
                .last()
                .map(|span| (span.line, span.column + (span.end - span.start)))
                .unwrap_or((1, 1));
            SyntaxError {
                message: format!("Unexpected end of input{}", expected),
                line,
                column,
            }
        }
    }
}

// statements

fn parse_statement() -> impl Parser<Token, Statement> {
    with_context(
        map(
            tuple3(
                parse_reference(),
                preceded(parse_delimiter(Delimiter::Equal), recursive_expression()),
                parse_delimiter(Delimiter::Semicolon),
            ),
            |(target, expression, _)| Statement { target, expression },
        ),
        "statement",
    )
}

// expressions

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(parse_conditional(), "expression")
}

fn recursive_expression() -> impl Parser<Token, Expression> {
    choice(vec![Box::new(lazy(parse_expression))])
}

fn parse_conditional() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_logical_or(),
            optional(tuple2(
                preceded(parse_operator(Operator::Question), recursive_expression()),
                preceded(parse_delimiter(Delimiter::Colon), recursive_expression()),
            )),
        ),
        |(condition, branches)| match branches {
            Some((then_branch, else_branch)) => Expression::Conditional {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            None => condition,
        },
    )
}

const OR: &[(Operator, BinaryOperator)] = &[(Operator::Or, BinaryOperator::Or)];
const AND: &[(Operator, BinaryOperator)] = &[(Operator::And, BinaryOperator::And)];
const COMPARISON: &[(Operator, BinaryOperator)] = &[
    (Operator::EqualEqual, BinaryOperator::Equal),
    (Operator::NotEqual, BinaryOperator::NotEqual),
    (Operator::Less, BinaryOperator::LessThan),
    (Operator::LessEqual, BinaryOperator::LessThanEqual),
    (Operator::Greater, BinaryOperator::GreaterThan),
    (Operator::GreaterEqual, BinaryOperator::GreaterThanEqual),
];
const ADDITIVE: &[(Operator, BinaryOperator)] = &[
    (Operator::Plus, BinaryOperator::Add),
    (Operator::Minus, BinaryOperator::Subtract),
];
const MULTIPLICATIVE: &[(Operator, BinaryOperator)] = &[
    (Operator::Multiply, BinaryOperator::Multiply),
    (Operator::Divide, BinaryOperator::Divide),
    (Operator::Modulo, BinaryOperator::Modulo),
];

fn parse_logical_or() -> impl Parser<Token, Expression> {
    binary_level(parse_logical_and, OR, "logical or")
}

fn parse_logical_and() -> impl Parser<Token, Expression> {
    binary_level(parse_comparison, AND, "logical and")
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    binary_level(parse_additive, COMPARISON, "comparison")
}

fn parse_additive() -> impl Parser<Token, Expression> {
    binary_level(parse_multiplicative, ADDITIVE, "additive")
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    binary_level(parse_unary, MULTIPLICATIVE, "multiplicative")
}

/// Left-associative `operand (op operand)*`.
fn binary_level<F, P>(
    operand: F,
    operators: &'static [(Operator, BinaryOperator)],
    context: &'static str,
) -> impl Parser<Token, Expression>
where
    F: Fn() -> P,
    P: Parser<Token, Expression>,
{
    with_context(
        map(
            tuple2(
                operand(),
                many(tuple2(parse_binary_operator(operators), operand())),
            ),
            |(first, rest)| {
                rest.into_iter()
                    .fold(first, |left, (op, right)| Expression::binary(op, left, right))
            },
        ),
        context,
    )
}

fn parse_binary_operator(
    operators: &'static [(Operator, BinaryOperator)],
) -> impl Parser<Token, BinaryOperator> {
    satisfy(move |token: &Token| match token {
        Token::Operator(op) => operators
            .iter()
            .find(|(candidate, _)| candidate == op)
            .map(|(_, binary)| *binary),
        _ => None,
    })
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple2(parse_unary_operator(), recursive_unary()),
                |(op, operand)| Expression::unary(op, operand),
            )),
            Box::new(parse_primary()),
        ]),
        "unary",
    )
}

fn recursive_unary() -> impl Parser<Token, Expression> {
    choice(vec![Box::new(lazy(parse_unary))])
}

fn parse_unary_operator() -> impl Parser<Token, UnaryOperator> {
    satisfy(|token: &Token| match token {
        Token::Operator(Operator::Not) => Some(UnaryOperator::Not),
        Token::Operator(Operator::Minus) => Some(UnaryOperator::Negate),
        _ => None,
    })
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(parse_literal(), Expression::Literal)),
            Box::new(parse_list()),
            Box::new(parse_map()),
            Box::new(parse_function_call()),
            Box::new(map(parse_reference(), Expression::Reference)),
            Box::new(parse_parenthesized()),
        ]),
        "operand",
    )
}

fn parse_parenthesized() -> impl Parser<Token, Expression> {
    delimited(
        parse_delimiter(Delimiter::OpenParen),
        recursive_expression(),
        parse_delimiter(Delimiter::CloseParen),
    )
}

fn parse_list() -> impl Parser<Token, Expression> {
    map(
        delimited(
            parse_delimiter(Delimiter::OpenBracket),
            separated_list(recursive_expression(), parse_delimiter(Delimiter::Comma)),
            parse_delimiter(Delimiter::CloseBracket),
        ),
        Expression::List,
    )
}

fn parse_map() -> impl Parser<Token, Expression> {
    map(
        delimited(
            parse_delimiter(Delimiter::OpenBrace),
            separated_list(parse_map_entry(), parse_delimiter(Delimiter::Comma)),
            parse_delimiter(Delimiter::CloseBrace),
        ),
        Expression::Map,
    )
}

fn parse_map_entry() -> impl Parser<Token, (String, Expression)> {
    map(
        tuple3(
            parse_string_key(),
            parse_delimiter(Delimiter::Colon),
            recursive_expression(),
        ),
        |(key, _, value)| (key, value),
    )
}

fn parse_function_call() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_identifier(),
            delimited(
                parse_delimiter(Delimiter::OpenParen),
                separated_list(recursive_expression(), parse_delimiter(Delimiter::Comma)),
                parse_delimiter(Delimiter::CloseParen),
            ),
        ),
        |(function, arguments)| Expression::FunctionCall {
            function,
            arguments,
        },
    )
}

// terminals

pub fn parse_reference() -> impl Parser<Token, Dependency> {
    with_context(
        map(
            tuple3(
                parse_identifier(),
                parse_operator(Operator::Dot),
                parse_property(),
            ),
            |(component, _, property)| Dependency::new(component, property),
        ),
        "reference",
    )
}

fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

fn parse_property() -> impl Parser<Token, Property> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Identifier(name) => name.parse::<Property>().ok(),
            _ => None,
        }),
        "property name",
    )
}

fn parse_string_key() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::String(s)) => Some(s.clone()),
            _ => None,
        }),
        "string key",
    )
}

fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        satisfy(|token: &Token| match token {
            Token::Literal(Literal::Integer(i)) => Some(ast::Literal::Integer(*i)),
            Token::Literal(Literal::Float(x)) => Some(ast::Literal::Float(*x)),
            Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
            Token::Keyword(Keyword::True) => Some(ast::Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => Some(ast::Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => Some(ast::Literal::Null),
            _ => None,
        }),
        "literal",
    )
}

fn parse_operator(op: Operator) -> impl Parser<Token, ()> {
    let label = format!("'{}'", op);
    with_context(as_unit(equal(Token::Operator(op))), label)
}

fn parse_delimiter(delimiter: Delimiter) -> impl Parser<Token, ()> {
    let label = format!("'{}'", delimiter);
    with_context(as_unit(equal(Token::Delimiter(delimiter))), label)
}
