//! Token-slice combinators. Built through the functions in `prelude`.

use std::marker::PhantomData;

use super::core::{ParseError, ParseResult, Parser};

fn end_or_unexpected<I>(input: &[I], pos: usize) -> ParseError {
    if pos >= input.len() {
        ParseError::EOF { position: pos }
    } else {
        ParseError::Unexpected { position: pos }
    }
}

// An alternative that failed after consuming input is committed: its error is reported
// instead of silently backing off.
fn committed(error: &ParseError, pos: usize) -> bool {
    error.position() > pos
}

#[derive(Clone)]
pub struct Equal<I> {
    pub(super) value: I,
}

impl<I: Clone + PartialEq> Parser<I, I> for Equal<I> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<I> {
        match input.get(pos) {
            Some(found) if *found == self.value => Ok((pos + 1, found.clone())),
            _ => Err(end_or_unexpected(input, pos)),
        }
    }
}

/// One item, mapped through `f`; `None` rejects it.
#[derive(Clone)]
pub struct Satisfy<I, O, F> {
    pub(super) f: F,
    pub(super) marker: PhantomData<(I, O)>,
}

impl<I, O, F> Parser<I, O> for Satisfy<I, O, F>
where
    F: Fn(&I) -> Option<O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        match input.get(pos).and_then(|item| (self.f)(item)) {
            Some(output) => Ok((pos + 1, output)),
            None => Err(end_or_unexpected(input, pos)),
        }
    }
}

/// First alternative that succeeds. When all fail, the error that got furthest wins.
pub struct Choice<I, O> {
    pub(super) alternatives: Vec<Box<dyn Parser<I, O>>>,
}

impl<I, O> Parser<I, O> for Choice<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let mut furthest: Option<ParseError> = None;
        for alternative in &self.alternatives {
            let error = match alternative.parse(input, pos) {
                Ok(parsed) => return Ok(parsed),
                Err(error) => error,
            };
            if furthest
                .as_ref()
                .map_or(true, |best| error.position() > best.position())
            {
                furthest = Some(error);
            }
        }
        Err(furthest.unwrap_or_else(|| end_or_unexpected(input, pos)))
    }
}

#[derive(Clone)]
pub struct Map<P, F, A> {
    pub(super) parser: P,
    pub(super) f: F,
    pub(super) marker: PhantomData<A>,
}

impl<I, A, B, P, F> Parser<I, B> for Map<P, F, A>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<B> {
        let (pos, output) = self.parser.parse(input, pos)?;
        Ok((pos, (self.f)(output)))
    }
}

/// Runs the inner parser and drops its output; separators and punctuation use this.
#[derive(Clone)]
pub struct Skip<P, O> {
    pub(super) parser: P,
    pub(super) marker: PhantomData<O>,
}

impl<I, P, O> Parser<I, ()> for Skip<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<()> {
        let (pos, _) = self.parser.parse(input, pos)?;
        Ok((pos, ()))
    }
}

/// Zero or more. Stops at the first failure that consumed nothing.
#[derive(Clone)]
pub struct Many<P, O> {
    pub(super) parser: P,
    pub(super) marker: PhantomData<O>,
}

impl<I, O, P> Parser<I, Vec<O>> for Many<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let mut items = Vec::new();
        let mut pos = pos;
        loop {
            match self.parser.parse(input, pos) {
                Ok((next, item)) if next > pos => {
                    items.push(item);
                    pos = next;
                }
                Ok(_) => return Ok((pos, items)),
                Err(error) if committed(&error, pos) => return Err(error),
                Err(_) => return Ok((pos, items)),
            }
        }
    }
}

/// `item (sep item)*`, possibly empty. A separator must be followed by an item.
pub struct SeparatedList<P, S, O> {
    pub(super) item: P,
    pub(super) separator: S,
    pub(super) marker: PhantomData<O>,
}

impl<I, O, P, S> Parser<I, Vec<O>> for SeparatedList<P, S, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Vec<O>> {
        let (mut pos, first) = match self.item.parse(input, pos) {
            Ok(parsed) => parsed,
            Err(error) if committed(&error, pos) => return Err(error),
            Err(_) => return Ok((pos, Vec::new())),
        };
        let mut items = vec![first];
        while let Ok((after_separator, _)) = self.separator.parse(input, pos) {
            let (next, item) = self.item.parse(input, after_separator)?;
            items.push(item);
            pos = next;
        }
        Ok((pos, items))
    }
}

#[derive(Clone)]
pub struct Optional<P, O> {
    pub(super) parser: P,
    pub(super) marker: PhantomData<O>,
}

impl<I, O, P> Parser<I, Option<O>> for Optional<P, O>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<Option<O>> {
        match self.parser.parse(input, pos) {
            Ok((next, output)) => Ok((next, Some(output))),
            Err(error) if committed(&error, pos) => Err(error),
            Err(_) => Ok((pos, None)),
        }
    }
}

/// Sequence of two or three parsers; outputs are collected into a tuple.
#[derive(Clone)]
pub struct Sequence<T, O> {
    pub(super) parsers: T,
    pub(super) marker: PhantomData<O>,
}

impl<I, P1, P2, O1, O2> Parser<I, (O1, O2)> for Sequence<(P1, P2), (O1, O2)>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2)> {
        let (first, second) = &self.parsers;
        let (pos, a) = first.parse(input, pos)?;
        let (pos, b) = second.parse(input, pos)?;
        Ok((pos, (a, b)))
    }
}

impl<I, P1, P2, P3, O1, O2, O3> Parser<I, (O1, O2, O3)> for Sequence<(P1, P2, P3), (O1, O2, O3)>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<(O1, O2, O3)> {
        let (first, second, third) = &self.parsers;
        let (pos, a) = first.parse(input, pos)?;
        let (pos, b) = second.parse(input, pos)?;
        let (pos, c) = third.parse(input, pos)?;
        Ok((pos, (a, b, c)))
    }
}

/// `left parser right`, keeping only the middle output.
#[derive(Clone)]
pub struct Between<L, P, R> {
    pub(super) left: L,
    pub(super) parser: P,
    pub(super) right: R,
}

impl<I, O, L, P, R> Parser<I, O> for Between<L, P, R>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        let (pos, _) = self.left.parse(input, pos)?;
        let (pos, output) = self.parser.parse(input, pos)?;
        let (pos, _) = self.right.parse(input, pos)?;
        Ok((pos, output))
    }
}

/// Labels failures with what was being parsed.
#[derive(Clone)]
pub struct Labeled<P, L> {
    pub(super) parser: P,
    pub(super) label: L,
}

impl<I, O, P, L: ToString> Parser<I, O> for Labeled<P, L>
where
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        self.parser
            .parse(input, pos)
            .map_err(|inner| ParseError::WithContext {
                message: self.label.to_string(),
                inner: Box::new(inner),
            })
    }
}

/// Builds the parser on use, which is how recursive grammars close the loop.
#[derive(Clone)]
pub struct Lazy<F> {
    pub(super) build: F,
}

impl<I, O, F, P> Parser<I, O> for Lazy<F>
where
    F: Fn() -> P,
    P: Parser<I, O>,
{
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O> {
        (self.build)().parse(input, pos)
    }
}
