//! # Trellis Lang
//!
//! Grammar adapters: each adapter parses one language's source text and
//! emits markup regions for the assembler, yielding a [`Document`] that
//! serializes back to the exact input.
//!
//! Two adapters ship here. [`ScriptAdapter`] handles an
//! indentation-structured command language with a line-oriented lexer;
//! [`CStyleAdapter`] handles a brace-structured expression language
//! through a recursive-descent parser and the generic [`treewalk`]
//! normalization tables. New languages plug in through the [`Adapter`]
//! trait.
//!
//! [`Document`]: trellis_model::Document

pub mod adapter;
pub mod cstyle;
pub mod emit;
pub mod error;
#[cfg(feature = "pretty-errors")]
pub mod report;
pub mod script;
pub mod treewalk;

pub use adapter::{Adapter, ParseOptions};
pub use cstyle::CStyleAdapter;
pub use emit::MarkupBuilder;
pub use error::{ErrorPos, LangResult, ParseError};
pub use script::{CommandSpec, ScriptAdapter};
pub use treewalk::{mark_tree, LanguageRules, TreeNode};
