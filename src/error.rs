use crate::token::Position;
use strum_macros::Display;
use thiserror::Error;

/// The classification every failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    LexError,
    SyntaxError,
    NameError,
    TypeError,
    DivisionByZero,
    IndexError,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("[{position}] LexError: Unexpected character '{character}'.")]
    UnexpectedCharacter { character: char, position: Position },

    #[error("[{position}] LexError: Unterminated text literal.")]
    UnterminatedText { position: Position },

    #[error("[{position}] LexError: Number '{literal}' is too large.")]
    NumberOutOfRange { literal: String, position: Position },

    #[error("[{position}] SyntaxError: Expected {expected}, found {found}.")]
    Syntax {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("[{position}] SyntaxError: Nesting is deeper than {limit} levels.")]
    TooDeeplyNested { limit: usize, position: Position },

    #[error("[{position}] NameError: Undefined variable '{name}'.")]
    UndefinedVariable { name: String, position: Position },

    #[error("[{position}] NameError: Undefined function '{name}'.")]
    UndefinedFunction { name: String, position: Position },

    #[error("[{position}] TypeError: {message}")]
    Type { message: String, position: Position },

    #[error("[{position}] DivisionByZero: Right operand of '{operator}' is zero.")]
    DivisionByZero { operator: String, position: Position },

    #[error("[{position}] IndexError: Index {index} is out of bounds for '{name}' of length {length}.")]
    IndexOutOfBounds {
        name: String,
        index: f64,
        length: usize,
        position: Position,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter { .. }
            | Error::UnterminatedText { .. }
            | Error::NumberOutOfRange { .. } => ErrorKind::LexError,
            Error::Syntax { .. } | Error::TooDeeplyNested { .. } => ErrorKind::SyntaxError,
            Error::UndefinedVariable { .. } | Error::UndefinedFunction { .. } => {
                ErrorKind::NameError
            }
            Error::Type { .. } => ErrorKind::TypeError,
            Error::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            Error::IndexOutOfBounds { .. } => ErrorKind::IndexError,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Error::UnexpectedCharacter { position, .. }
            | Error::UnterminatedText { position }
            | Error::NumberOutOfRange { position, .. }
            | Error::Syntax { position, .. }
            | Error::TooDeeplyNested { position, .. }
            | Error::UndefinedVariable { position, .. }
            | Error::UndefinedFunction { position, .. }
            | Error::Type { position, .. }
            | Error::DivisionByZero { position, .. }
            | Error::IndexOutOfBounds { position, .. } => *position,
        }
    }

    /// Lex and syntax errors happen before anything runs.
    pub fn is_static(&self) -> bool {
        matches!(self.kind(), ErrorKind::LexError | ErrorKind::SyntaxError)
    }

    pub(crate) fn type_error(message: impl Into<String>, position: Position) -> Error {
        Error::Type {
            message: message.into(),
            position,
        }
    }
}
