use serde::{Deserialize, Serialize};

use crate::list::List;
use crate::location::Location;
use crate::token::TokenId;

/// Replay direction for [`Document::perform`].
///
/// [`Document::perform`]: crate::Document::perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Insert,
    Remove,
}

/// Immutable record of a single insert or remove, sufficient to exactly
/// replay or invert it later. The fragment is a detached clone held in the
/// document's arena; every replay splices a fresh clone of it, so the
/// operation stays reusable across arbitrarily long undo/redo chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OpKind,
    /// The token immediately preceding the affected run at the time of the
    /// edit.
    pub location: Location,
    /// Detached clone of the affected run, including any synthesized
    /// newline tokens.
    pub fragment: List,
    /// Token count of the affected run.
    pub length: usize,
    /// Ids of the live run this edit touched, in chain order. Replay uses
    /// them to forward stale references onto the restored clones, so
    /// Locations recorded by later operations keep resolving across
    /// undo/redo cycles.
    pub tokens: Vec<TokenId>,
}

/// Immutable record of an atomic list-for-list swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceOperation {
    pub location: Location,
    pub before: List,
    pub before_len: usize,
    /// Ids of the replaced run, in chain order.
    pub before_tokens: Vec<TokenId>,
    pub after: List,
    pub after_len: usize,
    /// Ids of the run spliced in by the original call, in chain order.
    pub after_tokens: Vec<TokenId>,
}

/// Either kind of recorded edit, as accepted by `Document::perform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EditOperation {
    Splice(Operation),
    Replace(ReplaceOperation),
}

impl From<Operation> for EditOperation {
    fn from(op: Operation) -> Self {
        EditOperation::Splice(op)
    }
}

impl From<ReplaceOperation> for EditOperation {
    fn from(op: ReplaceOperation) -> Self {
        EditOperation::Replace(op)
    }
}
