//! # Script adapter
//!
//! An indentation-structured command language in the CoffeeScript family:
//! `name arg arg` calls, `for x in [a..b]` and `if cond` headers with
//! indented bodies, `#` line comments and `###` block comments. The
//! adapter lexes each line with logos, groups lines into a tree by
//! indentation, and marks the tree directly — no generic treewalk, since
//! the per-construct logic is small and specific.

use std::collections::HashMap;
use std::iter::Peekable;
use std::ops::Range;

use logos::Logos;
use tracing::debug;
use trellis_common::{leading_whitespace, LineIndex, TextPos, TextSpan};
use trellis_markup::{apply_markup, LanguageHooks};
use trellis_model::{Block, ButtonSpec, Document, Indent, Socket};

use crate::adapter::{Adapter, ParseOptions};
use crate::emit::MarkupBuilder;
use crate::error::{ErrorPos, ParseError};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t]+")]
enum ScriptTok {
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("if")]
    If,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_.]*")]
    Ident,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    // [a..b] ranges, kept as one editable token
    #[regex(r"\[[^\[\]\n]*\]")]
    Rng,

    #[regex(r"#[^\n]*")]
    Comment,
}

impl ScriptTok {
    fn socketable(self) -> bool {
        matches!(
            self,
            ScriptTok::Ident | ScriptTok::Number | ScriptTok::Str | ScriptTok::Rng
        )
    }
}

/// One recognized command: how it renders and what it accepts.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub color: String,
    /// Usable in value position.
    pub value: bool,
    /// Usable in statement position.
    pub statement: bool,
    /// Accepts any number of arguments; the block gets add/remove
    /// argument buttons.
    pub variadic: bool,
    /// Argument index -> enumerated choices.
    pub dropdowns: HashMap<usize, Vec<String>>,
}

impl CommandSpec {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            value: false,
            statement: true,
            variadic: false,
            dropdowns: HashMap::new(),
        }
    }

    pub fn value(mut self) -> Self {
        self.value = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn with_dropdown(mut self, arg: usize, choices: Vec<String>) -> Self {
        self.dropdowns.insert(arg, choices);
        self
    }
}

pub struct ScriptAdapter {
    commands: HashMap<String, CommandSpec>,
}

impl Default for ScriptAdapter {
    fn default() -> Self {
        Self {
            commands: builtin_commands(),
        }
    }
}

impl ScriptAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, name: impl Into<String>, spec: CommandSpec) -> Self {
        self.commands.insert(name.into(), spec);
        self
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }
}

fn builtin_commands() -> HashMap<String, CommandSpec> {
    let mut t = HashMap::new();
    t.insert(
        "console.log".to_string(),
        CommandSpec::new("command").variadic(),
    );
    t.insert("print".to_string(), CommandSpec::new("command").variadic());
    t.insert("say".to_string(), CommandSpec::new("command").variadic());
    t.insert("random".to_string(), CommandSpec::new("value").value());
    t.insert(
        "play".to_string(),
        CommandSpec::new("sound").with_dropdown(
            0,
            vec!["c4".into(), "d4".into(), "e4".into(), "g4".into()],
        ),
    );
    t
}

struct SrcLine<'a> {
    lineno: usize,
    indent: usize,
    text: &'a str,
    toks: Vec<(ScriptTok, Range<usize>)>,
    children: Vec<SrcLine<'a>>,
}

impl<'a> SrcLine<'a> {
    fn last_pos(&self) -> TextPos {
        match self.children.last() {
            Some(child) => child.last_pos(),
            None => TextPos::new(self.lineno, self.toks.last().map(|t| t.1.end).unwrap_or(0)),
        }
    }
}

/// Lines wholly inside `###` block comments carry no markup; the
/// assembler wraps them through the comment hooks instead.
fn mask_comment_lines(lines: &[&str]) -> Vec<bool> {
    let mut masked = vec![false; lines.len()];
    let mut open = false;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if open {
            masked[i] = true;
            if trimmed.contains("###") {
                open = false;
            }
        } else if trimmed.starts_with("###") {
            masked[i] = true;
            if !trimmed[3..].contains("###") {
                open = true;
            }
        }
    }
    masked
}

fn group_lines<'a, I>(iter: &mut Peekable<I>, parent_indent: Option<usize>) -> Vec<SrcLine<'a>>
where
    I: Iterator<Item = SrcLine<'a>>,
{
    let mut out: Vec<SrcLine<'a>> = Vec::new();
    while let Some(next_indent) = iter.peek().map(|l| l.indent) {
        if let Some(parent) = parent_indent {
            if next_indent <= parent {
                break;
            }
        }
        if let Some(prev) = out.last() {
            if next_indent > prev.indent {
                let children = group_lines(iter, Some(prev.indent));
                if let Some(prev) = out.last_mut() {
                    prev.children = children;
                }
                continue;
            }
        }
        if let Some(line) = iter.next() {
            out.push(line);
        }
    }
    out
}

impl ScriptAdapter {
    fn mark_line(&self, b: &mut MarkupBuilder, line: &SrcLine<'_>, depth: usize) {
        let bounds = TextSpan::new(TextPos::new(line.lineno, line.indent), line.last_pos());
        let header_end = line
            .toks
            .last()
            .map(|t| TextPos::new(line.lineno, t.1.end))
            .unwrap_or(bounds.start);

        match line.toks[0].0 {
            ScriptTok::For => {
                b.add_block(
                    Block::new("control").with_class("for"),
                    bounds,
                    depth,
                );
                if line.toks.len() > 1 {
                    let var = &line.toks[1];
                    b.add_socket(
                        Socket::new(),
                        TextSpan::from_coords(line.lineno, var.1.start, line.lineno, var.1.end),
                        depth + 1,
                    );
                }
                if line.toks.len() > 3 {
                    let from = line.toks[3].1.start;
                    let to = line.toks.last().map(|t| t.1.end).unwrap_or(from);
                    b.add_socket(
                        Socket::new(),
                        TextSpan::from_coords(line.lineno, from, line.lineno, to),
                        depth + 1,
                    );
                }
            }
            ScriptTok::If => {
                b.add_block(Block::new("control").with_class("if"), bounds, depth);
                if line.toks.len() > 1 {
                    let from = line.toks[1].1.start;
                    let to = line.toks.last().map(|t| t.1.end).unwrap_or(from);
                    b.add_socket(
                        Socket::new(),
                        TextSpan::from_coords(line.lineno, from, line.lineno, to),
                        depth + 1,
                    );
                }
            }
            _ => {
                let callee = &line.text[line.toks[0].1.clone()];
                let spec = self.commands.get(callee);
                let color = spec.map(|s| s.color.as_str()).unwrap_or("command");
                let mut block = Block::new(color);
                if spec.map_or(false, |s| s.variadic) {
                    block = block
                        .with_button(ButtonSpec::new("add-arg", "+"))
                        .with_button(ButtonSpec::new("remove-arg", "-"));
                }
                b.add_block(block, bounds, depth);

                // the callee of a recognized command is not socketed, so
                // it cannot be edited away
                let args: Box<dyn Iterator<Item = (usize, &(ScriptTok, Range<usize>))>> =
                    if spec.is_some() {
                        Box::new(line.toks.iter().skip(1).enumerate())
                    } else {
                        Box::new(line.toks.iter().enumerate())
                    };
                for (argi, (tok, span)) in args {
                    if !tok.socketable() {
                        continue;
                    }
                    let mut socket = Socket::new();
                    if let Some(choices) = spec.and_then(|s| s.dropdowns.get(&argi)) {
                        socket = socket.with_dropdown(choices.clone());
                    }
                    b.add_socket(
                        socket,
                        TextSpan::from_coords(line.lineno, span.start, line.lineno, span.end),
                        depth + 1,
                    );
                }
            }
        }

        if !line.children.is_empty() {
            let first_child = &line.children[0];
            let prefix = if first_child.indent > line.indent {
                first_child.text[line.indent..first_child.indent].to_string()
            } else {
                String::new()
            };
            b.add_indent(
                Indent::new(prefix),
                TextSpan::new(header_end, line.last_pos()),
                depth + 1,
            );
            for child in &line.children {
                self.mark_line(b, child, depth + 2);
            }
        }
    }
}

impl LanguageHooks for ScriptAdapter {
    fn is_comment(&self, text: &str) -> bool {
        text.trim_start().starts_with('#')
    }

    fn parse_comment(&self, text: &str) -> Vec<Range<usize>> {
        let trimmed = text.trim_start();
        let ws = text.len() - trimmed.len();
        let hashes = trimmed.len() - trimmed.trim_start_matches('#').len();
        let start = ws + hashes;
        if start < text.len() {
            vec![start..text.len()]
        } else {
            Vec::new()
        }
    }

    fn block_comment_markers(&self) -> Option<(&str, &str)> {
        Some(("###", "###"))
    }

    fn default_selection_range(&self, text: &str) -> Range<usize> {
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            1..text.len() - 1
        } else {
            0..text.len()
        }
    }

    fn fix_string(&self, text: &str) -> String {
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            let inner = &text[1..text.len() - 1];
            format!("\"{}\"", inner.replace('"', "\\\""))
        } else {
            text.to_string()
        }
    }

    fn handle_button(&self, text: &str, button: &ButtonSpec) -> Option<String> {
        match button.name.as_str() {
            "add-arg" => Some(format!("{} 0", text.trim_end())),
            "remove-arg" => {
                let trimmed = text.trim_end();
                let cut = trimmed.rfind(|c: char| c.is_whitespace())?;
                let head = trimmed[..cut].trim_end();
                // never drop the callee itself
                if head.is_empty() {
                    return None;
                }
                Some(head.to_string())
            }
            _ => None,
        }
    }
}

impl Adapter for ScriptAdapter {
    fn name(&self) -> &'static str {
        "script"
    }

    fn parse(&self, text: &str, opts: &ParseOptions) -> Result<Document, ParseError> {
        debug!(adapter = "script", bytes = text.len(), "parse");
        let index = LineIndex::new(text);
        let lines: Vec<&str> = text.split('\n').collect();
        let masked = mask_comment_lines(&lines);

        let mut code_lines = Vec::new();
        let mut line_start = 0usize;
        for (lineno, &line) in lines.iter().enumerate() {
            let start = line_start;
            line_start += line.len() + 1;
            if masked[lineno] || line.trim().is_empty() {
                continue;
            }
            let indent = leading_whitespace(line).len();
            let mut toks: Vec<(ScriptTok, Range<usize>)> = Vec::new();
            for (tok, span) in ScriptTok::lexer(&line[indent..]).spanned() {
                let cols = indent + span.start..indent + span.end;
                match tok {
                    Ok(ScriptTok::Comment) => break,
                    Ok(t) => toks.push((t, cols)),
                    Err(()) => {
                        return Err(ParseError::LexError {
                            pos: ErrorPos::at(&index, start + indent + span.start),
                        })
                    }
                }
            }
            if toks.is_empty() {
                continue;
            }
            code_lines.push(SrcLine {
                lineno,
                indent,
                text: line,
                toks,
                children: Vec::new(),
            });
        }

        let tree = group_lines(&mut code_lines.into_iter().peekable(), None);
        let mut builder = MarkupBuilder::new();
        for line in &tree {
            self.mark_line(&mut builder, line, 0);
        }
        let regions = builder.finish();
        Ok(apply_markup(text, &regions, self, &opts.assemble_options())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::ContainerPayload;

    fn parse(text: &str) -> Document {
        ScriptAdapter::new()
            .parse(text, &ParseOptions::default())
            .unwrap()
    }

    #[test]
    fn test_simple_command_round_trip() {
        let text = "console.log hello";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_known_callee_not_socketed() {
        let doc = parse("print x y");
        let sockets = doc
            .container_ids()
            .filter(|&id| doc.container(id).is_socket())
            .count();
        assert_eq!(sockets, 2);
    }

    #[test]
    fn test_unknown_callee_socketed() {
        let doc = parse("frobnicate x");
        let sockets = doc
            .container_ids()
            .filter(|&id| doc.container(id).is_socket())
            .count();
        assert_eq!(sockets, 2);
    }

    #[test]
    fn test_dropdown_from_command_table() {
        let doc = parse("play c4");
        let with_dropdown = doc
            .container_ids()
            .filter(|&id| {
                doc.container(id)
                    .socket()
                    .map_or(false, |s| s.dropdown.is_some())
            })
            .count();
        assert_eq!(with_dropdown, 1);
    }

    #[test]
    fn test_variadic_command_carries_buttons() {
        let doc = parse("print x");
        let button_counts: Vec<usize> = doc
            .container_ids()
            .filter_map(|id| doc.container(id).block().map(|b| b.buttons.len()))
            .filter(|&n| n > 0)
            .collect();
        assert_eq!(button_counts, vec![2]);
    }

    #[test]
    fn test_button_regenerates_command_text() {
        let adapter = ScriptAdapter::new();
        let add = ButtonSpec::new("add-arg", "+");
        let remove = ButtonSpec::new("remove-arg", "-");

        assert_eq!(
            adapter.handle_button("print x", &add).as_deref(),
            Some("print x 0")
        );
        assert_eq!(
            adapter.handle_button("print x 0", &remove).as_deref(),
            Some("print x")
        );
        assert_eq!(adapter.handle_button("print", &remove), None);

        // regenerated text still parses
        let doc = parse(&adapter.handle_button("print x", &add).unwrap());
        assert_eq!(doc.stringify(), "print x 0");
    }

    #[test]
    fn test_for_loop_round_trip_and_structure() {
        let text = "for x in [1..3]\n  print x";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let indents = doc
            .container_ids()
            .filter(|&id| doc.container(id).is_indent())
            .count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn test_nested_bodies_round_trip() {
        let text = "for x in [1..3]\n  if x\n    print x\n  say done";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_line_comment_wrapped_not_parsed() {
        let text = "# setup\nprint x";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let comment_blocks = doc
            .container_ids()
            .filter(|&id| {
                let c = doc.container(id);
                c.block().map_or(false, |b| b.classes.contains("comment"))
            })
            .count();
        assert_eq!(comment_blocks, 1);
    }

    #[test]
    fn test_block_comment_masked_and_amalgamated() {
        let text = "### notes\nthese are words\n###\nprint x";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
        let comment_blocks = doc
            .container_ids()
            .filter(|&id| {
                let c = doc.container(id);
                c.block().map_or(false, |b| b.classes.contains("comment"))
            })
            .count();
        assert_eq!(comment_blocks, 1);
    }

    #[test]
    fn test_trailing_comment_split_from_command() {
        let text = "print x # explain";
        let doc = parse(text);
        assert_eq!(doc.stringify(), text);
    }

    #[test]
    fn test_string_fixer_normalizes_single_quotes() {
        let adapter = ScriptAdapter::new();
        assert_eq!(adapter.fix_string("'hi'"), "\"hi\"");
        assert_eq!(adapter.fix_string("\"hi\""), "\"hi\"");
    }

    #[test]
    fn test_selection_range_excludes_quotes() {
        let adapter = ScriptAdapter::new();
        assert_eq!(adapter.default_selection_range("\"hi\""), 1..3);
        assert_eq!(adapter.default_selection_range("42"), 0..2);
    }

    #[test]
    fn test_regions_are_blocks_sockets_indents() {
        let text = "for x in [1..3]\n  play c4";
        let doc = parse(text);
        let mut blocks = 0;
        let mut indents = 0;
        for id in doc.container_ids() {
            match &doc.container(id).payload {
                ContainerPayload::Block(_) => blocks += 1,
                ContainerPayload::Indent(_) => indents += 1,
                _ => {}
            }
        }
        assert_eq!(blocks, 2);
        assert_eq!(indents, 1);
    }
}
