//! # Edit buffer
//!
//! The editing-session wrapper around a [`Document`]. Every structural
//! edit flows through here so it is recorded for undo, bumps the buffer
//! version, and keeps tracked cursors pointing at the right tokens.

use tracing::debug;
use trellis_model::{Document, EditOperation, List, Location, TokenId};

use crate::errors::EditResult;
use crate::undo_stack::UndoStack;

/// Identifies a cursor registered with [`EditBuffer::track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorId(usize);

pub struct EditBuffer {
    document: Document,
    history: UndoStack,
    /// Monotonic edit counter; bumped by every edit, undo and redo.
    version: u64,
    cursors: Vec<Location>,
}

impl EditBuffer {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            history: UndoStack::new(),
            version: 0,
            cursors: Vec::new(),
        }
    }

    pub fn with_history_depth(document: Document, max_levels: usize) -> Self {
        Self {
            history: UndoStack::with_max_levels(max_levels),
            ..Self::new(document)
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stringify(&self) -> String {
        self.document.stringify()
    }

    /// Register a location to be kept current across edits and replays.
    pub fn track(&mut self, location: Location) -> CursorId {
        self.cursors.push(location);
        CursorId(self.cursors.len() - 1)
    }

    /// The token a tracked cursor currently points at.
    pub fn cursor(&self, id: CursorId) -> EditResult<TokenId> {
        Ok(self.document.get_from_location(self.cursors[id.0])?)
    }

    /// Insert a detached fragment after `at`, recording the edit.
    pub fn insert(&mut self, at: TokenId, fragment: List) -> EditResult<()> {
        let op = self.document.insert(at, fragment, &mut self.cursors)?;
        self.committed(op.into());
        Ok(())
    }

    /// Remove a token run, recording the edit.
    pub fn remove(&mut self, list: List) -> EditResult<()> {
        let op = self.document.remove(list, &mut self.cursors)?;
        self.committed(op.into());
        Ok(())
    }

    /// Swap one run for another atomically, recording the edit.
    pub fn replace(&mut self, before: List, after: List) -> EditResult<()> {
        let op = self.document.replace(before, after, &mut self.cursors)?;
        self.committed(op.into());
        Ok(())
    }

    fn committed(&mut self, op: EditOperation) {
        self.history.record(op);
        self.version += 1;
        debug!(version = self.version, "edit committed");
    }

    /// Group subsequent edits into one undo step.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Undo the most recent edit or batch. Returns whether anything was
    /// undone.
    pub fn undo(&mut self) -> EditResult<bool> {
        let undone = self.history.undo(&mut self.document, &mut self.cursors)?;
        if undone {
            self.version += 1;
        }
        Ok(undone)
    }

    /// Redo the most recently undone edit or batch.
    pub fn redo(&mut self) -> EditResult<bool> {
        let redone = self.history.redo(&mut self.document, &mut self.cursors)?;
        if redone {
            self.version += 1;
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
