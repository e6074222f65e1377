use serde::{Deserialize, Serialize};

use crate::token::{TokenId, TokenType};

/// An opaque, serializable handle to a position in the token chain.
///
/// Backed by the token's stable arena id rather than a raw index, so a
/// Location survives arbitrary edits elsewhere in the document. Tokens
/// detached by a removal forward lookups to the token that preceded the
/// removal point, so a stale Location resolves there instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(TokenId);

impl Location {
    pub fn new(id: TokenId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> TokenId {
        self.0
    }
}

/// A text-coordinate position: resolves against the document's current
/// stringification, so it is stable insofar as the text round-trips
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLocation {
    pub row: usize,
    pub col: usize,
    /// When set, only tokens of this type are candidates.
    pub kind: Option<TokenType>,
}

impl TextLocation {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            kind: None,
        }
    }

    pub fn of_kind(row: usize, col: usize, kind: TokenType) -> Self {
        Self {
            row,
            col,
            kind: Some(kind),
        }
    }
}
