use thiserror::Error;

/// A parser over a slice of already-tokenized input.
///
/// `pos` is the index of the next unread item. On success the parser returns the index
/// just past what it consumed, so parsers compose by threading positions.
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected input at {position}")]
    Unexpected { position: usize },

    #[error("Unexpected end of input")]
    EOF { position: usize },

    #[error("{message}")]
    Fail { message: String, position: usize },

    #[error("{message}: {inner}")]
    WithContext {
        message: String,
        inner: Box<ParseError>,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::Unexpected { position }
            | ParseError::EOF { position }
            | ParseError::Fail { position, .. } => *position,
            ParseError::WithContext { inner, .. } => inner.position(),
        }
    }

    /// The innermost context label, i.e. the most specific thing that was expected.
    pub fn expected(&self) -> Option<&str> {
        match self {
            ParseError::WithContext { message, inner } => inner.expected().or(Some(message)),
            _ => None,
        }
    }

    /// The error with every context layer removed.
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::WithContext { inner, .. } => inner.root_cause(),
            other => other,
        }
    }
}
