//! # Trellis Common
//!
//! Small shared utilities: text positions and spans keyed by line and
//! byte column, and escaping for the XML fixture dialect.

pub mod escape;
pub mod text;

pub use escape::{escape_xml, unescape_xml};
pub use text::{is_blank, leading_whitespace, split_lines, LineIndex, TextPos, TextSpan};
