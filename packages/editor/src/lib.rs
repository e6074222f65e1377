//! # Trellis Editor
//!
//! The editing surface over the document model: a versioned
//! [`EditBuffer`] that records every structural edit, plus a bounded
//! [`UndoStack`] that replays recorded operations in either direction.
//! Tracked cursor locations stay valid across edits, undo and redo.

pub mod buffer;
pub mod errors;
pub mod undo_stack;

pub use buffer::{CursorId, EditBuffer};
pub use errors::{EditError, EditResult};
pub use undo_stack::{EditBatch, UndoStack};
