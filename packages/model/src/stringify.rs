//! # Stringify
//!
//! Serialization of the token chain back to source text.
//!
//! Two modes exist. Canonical [`Document::stringify`] reconstructs each
//! line's indentation from the active indent-prefix stack, honoring any
//! recorded `special_indent` override so untouched lines round-trip
//! byte-for-byte. [`Document::stringify_in_place`] ignores the overrides
//! and always applies the structural prefixes, which is what a fragment
//! needs when it is rendered at a new nesting depth.

use crate::document::Document;
use crate::list::List;
use crate::token::{TokenId, TokenKind};

impl Document {
    /// Canonical serialization of the whole document.
    pub fn stringify(&self) -> String {
        self.stringify_run(self.start(), Some(self.end()), true)
    }

    /// Serialization that re-derives every line's indentation from
    /// structure, discarding `special_indent` overrides.
    pub fn stringify_in_place(&self) -> String {
        self.stringify_run(self.start(), Some(self.end()), false)
    }

    /// Canonical serialization of a (possibly detached) run.
    pub fn stringify_list(&self, list: List) -> String {
        self.stringify_run(list.start, Some(list.end), true)
    }

    fn stringify_run(&self, first: TokenId, last: Option<TokenId>, honor_special: bool) -> String {
        let mut out = String::new();
        let mut prefixes: Vec<&str> = Vec::new();
        let mut cur = Some(first);
        while let Some(id) = cur {
            let tok = self.token(id);
            match &tok.kind {
                TokenKind::Text(s) => out.push_str(s),
                TokenKind::Newline { special_indent } => {
                    out.push('\n');
                    match special_indent {
                        Some(s) if honor_special => out.push_str(s),
                        _ => {
                            for p in &prefixes {
                                out.push_str(p);
                            }
                        }
                    }
                }
                TokenKind::IndentStart => {
                    if let Some(c) = tok.container {
                        if let Some(indent) = self.container(c).indent() {
                            prefixes.push(&indent.prefix);
                        }
                    }
                }
                TokenKind::IndentEnd => {
                    prefixes.pop();
                }
                _ => {}
            }
            if Some(id) == last {
                break;
            }
            cur = tok.next;
        }
        out
    }
}
