//! # Generic tree normalization
//!
//! The table-driven half of the adapter layer. A parser produces a
//! canonical [`TreeNode`] tree; [`mark_tree`] walks it against a set of
//! [`LanguageRules`] — node kinds bucketed into indents, skips, parens,
//! socket tokens and removals, plus color tables and predicates — and
//! emits markup regions through the shared builder.
//!
//! Walk semantics:
//! - a node with exactly one child (and not an indent kind) passes
//!   through to the child, absorbing grammars that wrap every rule in a
//!   redundant single-child production;
//! - a `parens` node wrapping exactly one non-trivial child is elided,
//!   with the child's block emitted over the parens' bounds;
//! - an `indent` node has its bounds trimmed to exclude leading/trailing
//!   childless punctuation, so the region starts right after the opening
//!   brace and ends at the last real child;
//! - a block nested under another block gets a connecting socket;
//! - leaves socket only when their kind is in `socket_tokens` and the
//!   `should_socket` predicate allows it.

use std::collections::{HashMap, HashSet};

use tracing::trace;
use trellis_common::{leading_whitespace, TextSpan};
use trellis_model::{Block, Indent, Socket};

use crate::emit::MarkupBuilder;

/// Canonical parse-tree shape every tree-driven adapter normalizes into.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: String,
    pub children: Vec<TreeNode>,
    pub bounds: TextSpan,
    /// Leaf payload, e.g. the literal token text.
    pub data: Option<String>,
}

impl TreeNode {
    pub fn branch(kind: impl Into<String>, bounds: TextSpan, children: Vec<TreeNode>) -> Self {
        Self {
            kind: kind.into(),
            children,
            bounds,
            data: None,
        }
    }

    pub fn leaf(kind: impl Into<String>, bounds: TextSpan, data: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            children: Vec::new(),
            bounds,
            data: Some(data.into()),
        }
    }

    pub fn text(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }
}

/// `(parent kind, leaf, child index) -> allow socket`.
pub type ShouldSocket = Box<dyn Fn(&str, &TreeNode, usize) -> bool>;
/// Per-node color override, consulted before the static tables.
pub type ColorFor = Box<dyn Fn(&TreeNode) -> Option<String>>;
/// Adjusts a fragment's leading/trailing text when it is re-serialized
/// into a new structural context.
pub type ParenRewrite = fn(&mut String, &mut String);

pub struct LanguageRules {
    pub indents: HashSet<String>,
    pub skips: HashSet<String>,
    pub parens: HashSet<String>,
    pub socket_tokens: HashSet<String>,
    /// Kinds emitted as `pending_removal` placeholder blocks.
    pub removals: HashSet<String>,
    /// Kinds emitted as error-recovery blocks: the mapped character
    /// counts are stripped from each side by the assembler, which also
    /// colors the enclosing block as an error.
    pub error_strips: HashMap<String, (usize, usize)>,
    pub colors_forward: HashMap<String, String>,
    pub colors_backward: HashMap<String, String>,
    pub default_color: String,
    pub should_socket: Option<ShouldSocket>,
    pub color_for: Option<ColorFor>,
    /// Keyed by `(parent kind, child kind)`.
    pub paren_rules: HashMap<(String, String), ParenRewrite>,
}

impl LanguageRules {
    pub fn new(default_color: impl Into<String>) -> Self {
        Self {
            indents: HashSet::new(),
            skips: HashSet::new(),
            parens: HashSet::new(),
            socket_tokens: HashSet::new(),
            removals: HashSet::new(),
            error_strips: HashMap::new(),
            colors_forward: HashMap::new(),
            colors_backward: HashMap::new(),
            default_color: default_color.into(),
            should_socket: None,
            color_for: None,
            paren_rules: HashMap::new(),
        }
    }

    fn color_of(&self, node: &TreeNode) -> String {
        if let Some(f) = &self.color_for {
            if let Some(color) = f(node) {
                return color;
            }
        }
        self.colors_forward
            .get(&node.kind)
            .or_else(|| self.colors_backward.get(&node.kind))
            .cloned()
            .unwrap_or_else(|| self.default_color.clone())
    }

    /// Apply the rewrite registered for this parent/child pairing, if
    /// any. Returns whether a rule fired.
    pub fn rewrite_parens(
        &self,
        parent_kind: &str,
        child_kind: &str,
        leading: &mut String,
        trailing: &mut String,
    ) -> bool {
        match self
            .paren_rules
            .get(&(parent_kind.to_string(), child_kind.to_string()))
        {
            Some(rule) => {
                rule(leading, trailing);
                true
            }
            None => false,
        }
    }
}

/// Walk a normalized tree and emit markup for it.
pub fn mark_tree(
    rules: &LanguageRules,
    source: &str,
    root: &TreeNode,
    builder: &mut MarkupBuilder,
) {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut walker = Walker {
        rules,
        lines,
        builder,
    };
    walker.walk(root, 0, 0, false, None);
}

struct Walker<'a, 'b> {
    rules: &'a LanguageRules,
    lines: Vec<&'a str>,
    builder: &'b mut MarkupBuilder,
}

impl<'a, 'b> Walker<'a, 'b> {
    fn walk(
        &mut self,
        node: &TreeNode,
        depth: usize,
        indent_chars: usize,
        inside_block: bool,
        bounds_override: Option<TextSpan>,
    ) {
        let kind = node.kind.as_str();
        trace!(kind, depth, "walk");

        if node.children.len() == 1 && !self.rules.indents.contains(kind) {
            return self.walk(
                &node.children[0],
                depth,
                indent_chars,
                inside_block,
                bounds_override,
            );
        }

        if self.rules.skips.contains(kind) {
            for (i, child) in node.children.iter().enumerate() {
                self.child(node, i, child, depth, indent_chars, inside_block);
            }
            return;
        }

        if self.rules.parens.contains(kind) {
            let nontrivial: Vec<usize> = node
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.children.is_empty())
                .map(|(i, _)| i)
                .collect();
            if nontrivial.len() == 1 {
                let bounds = bounds_override.unwrap_or(node.bounds);
                return self.walk(
                    &node.children[nontrivial[0]],
                    depth,
                    indent_chars,
                    inside_block,
                    Some(bounds),
                );
            }
            // parens wrapping something non-trivial: treat as a block
        } else if self.rules.indents.contains(kind) {
            return self.mark_indent(node, depth, indent_chars);
        } else if self.rules.removals.contains(kind) {
            let bounds = bounds_override.unwrap_or(node.bounds);
            return self.mark_removal(bounds, depth, inside_block);
        } else if node.children.is_empty() {
            // a bare leaf outside any block contributes no markup
            return;
        }

        let bounds = bounds_override.unwrap_or(node.bounds);
        if inside_block {
            self.builder.add_socket(Socket::new(), bounds, depth);
        }
        self.builder
            .add_block(Block::new(self.rules.color_of(node)), bounds, depth + 1);
        for (i, child) in node.children.iter().enumerate() {
            self.child(node, i, child, depth + 2, indent_chars, true);
        }
    }

    fn child(
        &mut self,
        parent: &TreeNode,
        idx: usize,
        child: &TreeNode,
        depth: usize,
        indent_chars: usize,
        inside_block: bool,
    ) {
        if !child.children.is_empty() {
            return self.walk(child, depth, indent_chars, inside_block, None);
        }
        let kind = child.kind.as_str();
        if self.rules.removals.contains(kind) {
            return self.mark_removal(child.bounds, depth, inside_block);
        }
        if let Some(&(left, right)) = self.rules.error_strips.get(kind) {
            if inside_block {
                self.builder.add_socket(Socket::new(), child.bounds, depth);
            }
            let mut block = Block::new(self.rules.color_of(child));
            block.error_strip = Some((left, right));
            self.builder.add_block(block, child.bounds, depth + 1);
            return;
        }
        if inside_block
            && self.rules.socket_tokens.contains(kind)
            && self
                .rules
                .should_socket
                .as_ref()
                .map_or(true, |f| f(parent.kind.as_str(), child, idx))
        {
            self.builder.add_socket(Socket::new(), child.bounds, depth);
        }
    }

    fn mark_removal(&mut self, bounds: TextSpan, depth: usize, inside_block: bool) {
        if inside_block {
            self.builder.add_socket(Socket::new(), bounds, depth);
        }
        self.builder.add_block(
            Block::new(self.rules.default_color.clone()).marked_for_removal(),
            bounds,
            depth + 1,
        );
    }

    fn mark_indent(&mut self, node: &TreeNode, depth: usize, indent_chars: usize) {
        if node.children.len() < 2 {
            for (i, child) in node.children.iter().enumerate() {
                self.child(node, i, child, depth, indent_chars, false);
            }
            return;
        }
        let first_nt = node.children.iter().position(|c| !c.children.is_empty());
        let last_nt = node.children.iter().rposition(|c| !c.children.is_empty());
        let (start, end) = match (first_nt, last_nt) {
            (Some(f), Some(l)) => {
                let start = if f > 0 {
                    node.children[f - 1].bounds.end
                } else {
                    node.bounds.start
                };
                (start, node.children[l].bounds.end)
            }
            // only punctuation: the region sits between the delimiters
            _ => (
                node.children.first().map(|c| c.bounds.end).unwrap(),
                node.children.last().map(|c| c.bounds.start).unwrap(),
            ),
        };
        let prefix = self.indent_prefix(start.line, end.line, indent_chars);
        let inner_chars = indent_chars + prefix.len();
        self.builder
            .add_indent(Indent::new(prefix), TextSpan::new(start, end), depth);
        for (i, child) in node.children.iter().enumerate() {
            if !child.children.is_empty() {
                self.child(node, i, child, depth + 1, inner_chars, false);
            }
        }
    }

    /// The literal prefix the enclosed lines add beyond the indentation
    /// already claimed by outer indents.
    fn indent_prefix(&self, start_line: usize, end_line: usize, indent_chars: usize) -> String {
        let last = end_line.min(self.lines.len().saturating_sub(1));
        for lineno in (start_line + 1)..=last {
            let line = self.lines[lineno];
            if line.trim().is_empty() {
                continue;
            }
            let lead = leading_whitespace(line);
            let cut = indent_chars.min(lead.len());
            return lead[cut..].to_string();
        }
        String::new()
    }
}
