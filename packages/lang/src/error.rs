//! Error types for the grammar adapters

use thiserror::Error;
use trellis_common::LineIndex;
use trellis_markup::AssembleError;

pub type LangResult<T> = Result<T, ParseError>;

/// A failure position: byte offset plus the 0-based line/column it maps
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl ErrorPos {
    pub fn at(index: &LineIndex, offset: usize) -> Self {
        let pos = index.pos(offset);
        Self {
            offset,
            line: pos.line,
            column: pos.column,
        }
    }
}

/// Parse error with location and context
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Unexpected token {found:?} at line {line}, column {column}", line = .pos.line + 1, column = .pos.column + 1)]
    UnexpectedToken { found: String, pos: ErrorPos },

    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Unrecognized character at line {line}, column {column}", line = .pos.line + 1, column = .pos.column + 1)]
    LexError { pos: ErrorPos },

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

impl ParseError {
    pub fn unexpected(found: impl Into<String>, pos: ErrorPos) -> Self {
        Self::UnexpectedToken {
            found: found.into(),
            pos,
        }
    }

    pub fn eof(expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
        }
    }

    /// Byte span of the failure, when the error carries one.
    pub fn pos(&self) -> Option<ErrorPos> {
        match self {
            ParseError::UnexpectedToken { pos, .. } => Some(*pos),
            ParseError::LexError { pos } => Some(*pos),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::Assemble(_) => None,
        }
    }
}
