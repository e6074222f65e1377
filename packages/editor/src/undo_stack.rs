//! # Undo/Redo Stack
//!
//! Tracks edit history and replays it in either direction.
//!
//! ## Design
//!
//! - Every structural edit already returns a self-inverting operation
//!   record, so the stack stores the records themselves rather than
//!   separate inverse edits
//! - Undo replays the most recent batch backward and moves it to the
//!   redo stack; redo replays forward and moves it back
//! - New edits clear the redo stack
//! - Supports batched edits (group multiple operations as one undo step)

use trellis_model::{Direction, Document, EditOperation, Location};

use crate::errors::EditResult;

/// A group of operations undone/redone together.
#[derive(Debug, Clone)]
pub struct EditBatch {
    /// Operations in application order.
    pub ops: Vec<EditOperation>,
    /// Optional description of this batch.
    pub description: Option<String>,
}

impl EditBatch {
    pub fn single(op: EditOperation) -> Self {
        Self {
            ops: vec![op],
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo stack for document editing.
#[derive(Debug)]
pub struct UndoStack {
    /// Applied batches, most recent last.
    undo_stack: Vec<EditBatch>,
    /// Undone batches, most recent last.
    redo_stack: Vec<EditBatch>,
    /// Maximum number of undo levels (0 = unlimited).
    max_levels: usize,
    /// Currently building a batch.
    current_batch: Option<EditBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100).
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record an already-applied operation for undo.
    pub fn record(&mut self, op: EditOperation) {
        if let Some(batch) = &mut self.current_batch {
            batch.ops.push(op);
        } else {
            self.push_batch(EditBatch::single(op));
        }
    }

    /// Start a batch; everything recorded until [`end_batch`] is undone
    /// and redone as one step.
    ///
    /// [`end_batch`]: UndoStack::end_batch
    pub fn begin_batch(&mut self) {
        self.current_batch = Some(EditBatch {
            ops: Vec::new(),
            description: None,
        });
    }

    /// End the current batch and push it to the undo stack.
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.ops.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if let Some(batch) = &mut self.current_batch {
            batch.description = Some(description.into());
        }
    }

    fn push_batch(&mut self, batch: EditBatch) {
        self.undo_stack.push(batch);
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
        // a new edit invalidates any undone future
        self.redo_stack.clear();
    }

    /// Undo the most recent batch. Returns whether anything was undone.
    pub fn undo(
        &mut self,
        doc: &mut Document,
        locations: &mut [Location],
    ) -> EditResult<bool> {
        match self.undo_stack.pop() {
            Some(batch) => {
                for op in batch.ops.iter().rev() {
                    doc.perform(op, Direction::Backward, locations)?;
                }
                self.redo_stack.push(batch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Redo the most recently undone batch. Returns whether anything was
    /// redone.
    pub fn redo(
        &mut self,
        doc: &mut Document,
        locations: &mut [Location],
    ) -> EditResult<bool> {
        match self.redo_stack.pop() {
            Some(batch) => {
                for op in &batch.ops {
                    doc.perform(op, Direction::Forward, locations)?;
                }
                self.undo_stack.push(batch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_on_empty_stack_is_noop() {
        let mut stack = UndoStack::new();
        let mut doc = Document::default();
        assert!(!stack.undo(&mut doc, &mut []).unwrap());
        assert!(!stack.redo(&mut doc, &mut []).unwrap());
    }

    #[test]
    fn test_record_and_replay() {
        let mut doc = Document::default();
        let text = doc.add_text("hello");
        doc.splice_token_after(doc.start(), text);

        let mut stack = UndoStack::new();
        let list = trellis_model::List::new(text, text);
        let op = doc.remove(list, &mut []).unwrap();
        stack.record(op.into());
        assert_eq!(doc.stringify(), "");

        assert!(stack.undo(&mut doc, &mut []).unwrap());
        assert_eq!(doc.stringify(), "hello");
        assert!(stack.can_redo());

        assert!(stack.redo(&mut doc, &mut []).unwrap());
        assert_eq!(doc.stringify(), "");
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut doc = Document::default();
        let mut stack = UndoStack::with_max_levels(2);
        for word in ["a", "b", "c"] {
            let text = doc.add_text(word);
            doc.splice_token_after(doc.start(), text);
            let op = doc
                .remove(trellis_model::List::new(text, text), &mut [])
                .unwrap();
            stack.record(op.into());
        }
        assert_eq!(stack.undo_levels(), 2);
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut doc = Document::default();
        let mut stack = UndoStack::new();

        let a = doc.add_text("a");
        doc.splice_token_after(doc.start(), a);
        let op = doc
            .remove(trellis_model::List::new(a, a), &mut [])
            .unwrap();
        stack.record(op.into());
        stack.undo(&mut doc, &mut []).unwrap();
        assert_eq!(stack.redo_levels(), 1);

        let b = doc.add_text("b");
        doc.splice_token_after(doc.start(), b);
        let op = doc
            .remove(trellis_model::List::new(b, b), &mut [])
            .unwrap();
        stack.record(op.into());
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_batched_edits_undo_together() {
        let mut doc = Document::default();
        let mut stack = UndoStack::new();

        stack.begin_batch();
        stack.set_batch_description("remove both");
        for word in ["a", "b"] {
            let text = doc.add_text(word);
            doc.splice_token_after(doc.start(), text);
            let op = doc
                .remove(trellis_model::List::new(text, text), &mut [])
                .unwrap();
            stack.record(op.into());
        }
        stack.end_batch();

        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.undo_description(), Some("remove both"));
        stack.undo(&mut doc, &mut []).unwrap();
        assert_eq!(stack.undo_levels(), 0);
    }
}
