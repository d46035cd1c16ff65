use std::marker::PhantomData;

use super::combinators::*;
use super::core::Parser;

pub fn equal<I: Clone + PartialEq>(value: I) -> Equal<I> {
    Equal { value }
}

pub fn satisfy<I, O, F>(f: F) -> Satisfy<I, O, F>
where
    F: Fn(&I) -> Option<O>,
{
    Satisfy {
        f,
        marker: PhantomData,
    }
}

pub fn choice<I, O>(alternatives: Vec<Box<dyn Parser<I, O>>>) -> Choice<I, O> {
    Choice { alternatives }
}

pub fn map<P, F, A, B, I>(parser: P, f: F) -> Map<P, F, A>
where
    P: Parser<I, A>,
    F: Fn(A) -> B,
{
    Map {
        parser,
        f,
        marker: PhantomData,
    }
}

pub fn as_unit<I, O, P>(parser: P) -> Skip<P, O>
where
    P: Parser<I, O>,
{
    Skip {
        parser,
        marker: PhantomData,
    }
}

pub fn many<P, I, O>(parser: P) -> Many<P, O>
where
    P: Parser<I, O>,
{
    Many {
        parser,
        marker: PhantomData,
    }
}

pub fn separated_list<P, S, I, O>(item: P, separator: S) -> SeparatedList<P, S, O>
where
    P: Parser<I, O>,
    S: Parser<I, ()>,
{
    SeparatedList {
        item,
        separator,
        marker: PhantomData,
    }
}

pub fn optional<P, I, O>(parser: P) -> Optional<P, O>
where
    P: Parser<I, O>,
{
    Optional {
        parser,
        marker: PhantomData,
    }
}

pub fn preceded<P1, P2, I, O>(prefix: P1, parser: P2) -> impl Parser<I, O>
where
    P1: Parser<I, ()>,
    P2: Parser<I, O>,
{
    map(tuple2(prefix, parser), |((), output): ((), O)| output)
}

pub fn delimited<L, P, R, I, O>(left: L, parser: P, right: R) -> Between<L, P, R>
where
    L: Parser<I, ()>,
    P: Parser<I, O>,
    R: Parser<I, ()>,
{
    Between {
        left,
        parser,
        right,
    }
}

pub fn tuple2<P1, P2, I, O1, O2>(first: P1, second: P2) -> Sequence<(P1, P2), (O1, O2)>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
{
    Sequence {
        parsers: (first, second),
        marker: PhantomData,
    }
}

pub fn tuple3<P1, P2, P3, I, O1, O2, O3>(
    first: P1,
    second: P2,
    third: P3,
) -> Sequence<(P1, P2, P3), (O1, O2, O3)>
where
    P1: Parser<I, O1>,
    P2: Parser<I, O2>,
    P3: Parser<I, O3>,
{
    Sequence {
        parsers: (first, second, third),
        marker: PhantomData,
    }
}

pub fn with_context<P, L: ToString>(parser: P, label: L) -> Labeled<P, L> {
    Labeled { parser, label }
}

pub fn lazy<F>(build: F) -> Lazy<F> {
    Lazy { build }
}
