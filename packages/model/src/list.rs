use serde::{Deserialize, Serialize};

use crate::token::TokenId;

/// A non-owning view onto a contiguous run of the token chain, inclusive
/// of both endpoints. Lists are the unit of structural mutation: remove,
/// insert and replace operate on Lists, never on individual tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub start: TokenId,
    pub end: TokenId,
}

impl List {
    pub fn new(start: TokenId, end: TokenId) -> Self {
        Self { start, end }
    }

    pub fn single(token: TokenId) -> Self {
        Self {
            start: token,
            end: token,
        }
    }
}
