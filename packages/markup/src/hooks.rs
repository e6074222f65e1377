//! # Language hooks
//!
//! The assembler's view of a language adapter: how to classify and
//! decompose free text the grammar did not cover, plus the small text
//! policies the editing surface needs (selection ranges, string fixing).

use std::ops::Range;

use trellis_model::ButtonSpec;

pub trait LanguageHooks {
    /// Does this uncovered span read as a comment in the language?
    fn is_comment(&self, text: &str) -> bool {
        let _ = text;
        false
    }

    /// Byte sub-ranges of a comment that should become editable sockets,
    /// e.g. the payload after a line-comment marker. Ranges must be
    /// disjoint and in order.
    fn parse_comment(&self, text: &str) -> Vec<Range<usize>> {
        let _ = text;
        Vec::new()
    }

    /// Open/close markers of the language's multi-line comment form, if
    /// it has one.
    fn block_comment_markers(&self) -> Option<(&str, &str)> {
        None
    }

    /// Initial selection when a socket is first focused; lets a language
    /// exclude surrounding quote characters.
    fn default_selection_range(&self, text: &str) -> Range<usize> {
        0..text.len()
    }

    /// Normalize quoting of a literal on socket commit.
    fn fix_string(&self, text: &str) -> String {
        text.to_string()
    }

    /// Regenerate a block's source text in response to one of its
    /// structural buttons, e.g. appending an argument slot. `None` leaves
    /// the block unchanged.
    fn handle_button(&self, text: &str, button: &ButtonSpec) -> Option<String> {
        let _ = (text, button);
        None
    }

    /// Color for blocks synthesized around non-comment free text.
    fn handwritten_color(&self) -> &str {
        "command"
    }

    /// Color for blocks synthesized around comments.
    fn comment_color(&self) -> &str {
        "comment"
    }

    /// Color for synthesized empty-line marker blocks; `None` disables
    /// them.
    fn empty_line_color(&self) -> Option<&str> {
        None
    }
}

/// Hooks with every default: no comments, no markers, plain text
/// policies.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl LanguageHooks for DefaultHooks {}
