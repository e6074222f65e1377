//! # Adapter contract
//!
//! A language adapter parses source text into a [`Document`] by emitting
//! markup regions and handing them, with the raw text, to the assembler.
//! Adapters also implement [`LanguageHooks`] so the assembler can
//! classify the text their grammar leaves uncovered.

use trellis_markup::{AssembleOptions, LanguageHooks};
use trellis_model::Document;

use crate::error::ParseError;

/// Per-parse options, merged over adapter defaults.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Wrap top-level uncovered text in handwritten blocks.
    pub wrap_at_root: bool,
    /// Keep round-trip placeholder blocks instead of stripping them.
    pub preserve_empty: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            wrap_at_root: true,
            preserve_empty: false,
        }
    }
}

impl ParseOptions {
    pub(crate) fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            wrap_at_root: self.wrap_at_root,
            preserve_empty: self.preserve_empty,
            empty_line_color: None,
        }
    }
}

pub trait Adapter: LanguageHooks {
    fn name(&self) -> &'static str;

    fn parse(&self, text: &str, opts: &ParseOptions) -> Result<Document, ParseError>;
}
