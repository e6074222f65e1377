//! # Assembler
//!
//! Threads sorted markup events and the raw source text into a fully
//! linked [`Document`]. The walk is line-by-line: structural indentation
//! is stripped from each line (irregular indentation is recorded on the
//! newline as a special indent), markup boundary tokens are spliced at
//! their columns, and any text the grammar left uncovered is wrapped in
//! synthesized handwritten blocks so it stays a first-class editable
//! unit.

use thiserror::Error;
use tracing::{debug, trace};
use trellis_common::leading_whitespace;
use trellis_model::{
    Block, ContainerId, ContainerPayload, Document, ModelError, Socket, TokenId,
};

use crate::hooks::LanguageHooks;
use crate::region::{sort_markup, EventKind, MarkupRegion};

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Wrap top-level free text in handwritten blocks; when false it is
    /// left as one bare span.
    pub wrap_at_root: bool,
    /// Keep blocks flagged `pending_removal` instead of stripping them
    /// after assembly.
    pub preserve_empty: bool,
    /// Overrides the adapter's empty-line marker color when set.
    pub empty_line_color: Option<String>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            wrap_at_root: true,
            preserve_empty: false,
            empty_line_color: None,
        }
    }
}

pub type AssembleResult<T> = Result<T, AssembleError>;

/// Structural failures while threading markup. These indicate adapter
/// bugs (overlapping or misnested regions), not bad user input.
#[derive(Error, Debug, Clone)]
pub enum AssembleError {
    #[error("Improper parser: {found} directly inside {inside} on line {line}")]
    ImproperNesting {
        found: &'static str,
        inside: &'static str,
        line: usize,
    },

    #[error("Region end without matching start on line {line}")]
    UnmatchedEnd { line: usize },

    #[error("{count} regions left unclosed at end of input")]
    Unclosed { count: usize },

    #[error("Region bounds outside the source text at line {line}, column {column}")]
    BadBounds { line: usize, column: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Assemble a document from source text plus the adapter's regions.
pub fn apply_markup(
    text: &str,
    regions: &[MarkupRegion],
    hooks: &dyn LanguageHooks,
    opts: &AssembleOptions,
) -> AssembleResult<Document> {
    debug!(regions = regions.len(), "apply_markup");
    Assembler::new(hooks, opts).run(text, regions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackKind {
    Root,
    Block,
    Socket,
    Indent,
}

impl StackKind {
    fn name(self) -> &'static str {
        match self {
            StackKind::Root => "document",
            StackKind::Block => "block",
            StackKind::Socket => "socket",
            StackKind::Indent => "indent",
        }
    }

    fn of(payload: &ContainerPayload) -> Self {
        match payload {
            ContainerPayload::Block(_) => StackKind::Block,
            ContainerPayload::Socket(_) => StackKind::Socket,
            ContainerPayload::Indent(_) => StackKind::Indent,
            ContainerPayload::Root => StackKind::Root,
        }
    }
}

struct OpenComment {
    close: String,
    socket_end: TokenId,
    block_end: TokenId,
}

struct Assembler<'a> {
    doc: Document,
    hooks: &'a dyn LanguageHooks,
    opts: &'a AssembleOptions,
    tail: TokenId,
    stack: Vec<(ContainerId, StackKind)>,
    prefixes: Vec<String>,
    comment: Option<OpenComment>,
    line_emitted: bool,
}

impl<'a> Assembler<'a> {
    fn new(hooks: &'a dyn LanguageHooks, opts: &'a AssembleOptions) -> Self {
        let doc = Document::new();
        let tail = doc.start();
        let root = doc.root();
        Self {
            doc,
            hooks,
            opts,
            tail,
            stack: vec![(root, StackKind::Root)],
            prefixes: Vec::new(),
            comment: None,
            line_emitted: false,
        }
    }

    fn run(mut self, text: &str, regions: &[MarkupRegion]) -> AssembleResult<Document> {
        for region in regions {
            if !region.bounds.is_ordered() {
                return Err(AssembleError::BadBounds {
                    line: region.bounds.end.line,
                    column: region.bounds.end.column,
                });
            }
        }
        let events = sort_markup(regions);
        let containers: Vec<ContainerId> = regions
            .iter()
            .map(|r| self.doc.add_container(r.payload.clone()))
            .collect();

        let lines: Vec<&str> = text.split('\n').collect();
        let last_solid = lines.iter().rposition(|l| !l.trim().is_empty());
        let mut next_event = 0usize;

        for (lineno, line) in lines.iter().enumerate() {
            trace!(lineno, "assemble line");
            let expected: String = self.prefixes.concat();
            let lead = leading_whitespace(line);
            let (consumed, special) = if lead == expected {
                (expected.len(), None)
            } else {
                (lead.len(), Some(lead.to_string()))
            };

            if lineno > 0 {
                let nl = self.doc.add_newline(special);
                self.splice(nl);
            }
            self.line_emitted = false;
            if lineno == 0 && !lead.is_empty() {
                // the first line has no newline to carry an irregular
                // lead, so keep it as a literal text token
                let t = self.doc.add_text(lead);
                self.splice(t);
                self.line_emitted = true;
            }

            let mut col = consumed;
            while next_event < events.len() && events[next_event].pos.line == lineno {
                let event = events[next_event];
                next_event += 1;
                if event.pos.column > line.len() {
                    return Err(AssembleError::BadBounds {
                        line: lineno,
                        column: event.pos.column,
                    });
                }
                if event.pos.column > col {
                    self.emit_text(&line[col..event.pos.column], lineno)?;
                    col = event.pos.column;
                }
                let container = containers[event.region];
                match event.kind {
                    EventKind::Start => self.open_region(container, lineno)?,
                    EventKind::End => self.close_region(container, lineno)?,
                }
            }
            if col < line.len() {
                self.emit_text(&line[col..], lineno)?;
            }

            let free = self.at_free_position();
            let marker_color = self
                .opts
                .empty_line_color
                .clone()
                .or_else(|| self.hooks.empty_line_color().map(str::to_string));
            if !self.line_emitted
                && free
                && self.comment.is_none()
                && last_solid.map_or(false, |solid| lineno < solid)
            {
                if let Some(color) = marker_color {
                    self.emit_empty_line_marker(&color);
                }
            }
        }

        if let Some(comment) = self.comment.take() {
            // unterminated block comment: close the synthesized containers
            // so the chain stays balanced
            self.splice(comment.socket_end);
            self.splice(comment.block_end);
        }
        if self.stack.len() != 1 {
            return Err(AssembleError::Unclosed {
                count: self.stack.len() - 1,
            });
        }

        self.doc.correct_parents();
        self.doc.validate()?;

        if !self.opts.preserve_empty {
            self.strip_pending_removal()?;
        }
        self.apply_error_strips();
        self.detect_paren_wrapped();
        self.doc.correct_parents();
        self.doc.validate()?;
        Ok(self.doc)
    }

    fn splice(&mut self, token: TokenId) {
        self.doc.splice_token_after(self.tail, token);
        self.tail = token;
    }

    fn top_kind(&self) -> StackKind {
        self.stack.last().map(|&(_, k)| k).unwrap_or(StackKind::Root)
    }

    fn at_free_position(&self) -> bool {
        matches!(self.top_kind(), StackKind::Root | StackKind::Indent)
    }

    fn open_region(&mut self, container: ContainerId, line: usize) -> AssembleResult<()> {
        if self.comment.is_some() {
            return Err(AssembleError::ImproperNesting {
                found: "region",
                inside: "comment",
                line,
            });
        }
        let kind = StackKind::of(&self.doc.container(container).payload);
        let top = self.top_kind();
        let legal = match kind {
            StackKind::Indent => top == StackKind::Block,
            StackKind::Block => top != StackKind::Block,
            StackKind::Socket => top == StackKind::Block,
            StackKind::Root => false,
        };
        if !legal {
            return Err(AssembleError::ImproperNesting {
                found: kind.name(),
                inside: top.name(),
                line,
            });
        }
        let start = self.doc.container(container).start;
        self.splice(start);
        self.stack.push((container, kind));
        if kind == StackKind::Indent {
            if let Some(indent) = self.doc.container(container).indent() {
                self.prefixes.push(indent.prefix.clone());
            }
        }
        self.line_emitted = true;
        Ok(())
    }

    fn close_region(&mut self, container: ContainerId, line: usize) -> AssembleResult<()> {
        match self.stack.last() {
            Some(&(top, kind)) if top == container => {
                let end = self.doc.container(container).end;
                self.splice(end);
                self.stack.pop();
                if kind == StackKind::Indent {
                    self.prefixes.pop();
                }
                Ok(())
            }
            _ => Err(AssembleError::UnmatchedEnd { line }),
        }
    }

    /// Step a literal span through the comment state machine, wrapping
    /// anything left over at a free position in a handwritten block.
    fn emit_text(&mut self, seg: &str, line: usize) -> AssembleResult<()> {
        let mut rest = seg;
        loop {
            if rest.is_empty() {
                return Ok(());
            }
            if let Some(open) = &self.comment {
                match rest.find(open.close.as_str()) {
                    Some(idx) => {
                        let upto = idx + open.close.len();
                        let t = self.doc.add_text(&rest[..upto]);
                        self.splice(t);
                        let OpenComment {
                            socket_end,
                            block_end,
                            ..
                        } = self.comment.take().unwrap();
                        self.splice(socket_end);
                        self.splice(block_end);
                        self.line_emitted = true;
                        rest = &rest[upto..];
                        continue;
                    }
                    None => {
                        let t = self.doc.add_text(rest);
                        self.splice(t);
                        self.line_emitted = true;
                        return Ok(());
                    }
                }
            }

            if !self.at_free_position() {
                let t = self.doc.add_text(rest);
                self.splice(t);
                self.line_emitted = true;
                return Ok(());
            }

            // free position: multi-line comment opener?
            if let Some((open, close)) = self.hooks.block_comment_markers() {
                let trimmed = rest.trim_start();
                let opens_here =
                    trimmed.starts_with(open) && !trimmed[open.len()..].contains(close);
                let close = close.to_string();
                if opens_here {
                    let block = self.doc.add_container(ContainerPayload::Block(
                        Block::new(self.hooks.comment_color()).with_class("comment"),
                    ));
                    let socket = self
                        .doc
                        .add_container(ContainerPayload::Socket(Socket::handwritten()));
                    let (bs, be) = boundary(&self.doc, block);
                    let (ss, se) = boundary(&self.doc, socket);
                    self.splice(bs);
                    self.splice(ss);
                    let t = self.doc.add_text(rest);
                    self.splice(t);
                    self.comment = Some(OpenComment {
                        close,
                        socket_end: se,
                        block_end: be,
                    });
                    self.line_emitted = true;
                    return Ok(());
                }
            }

            if !self.opts.wrap_at_root && self.top_kind() == StackKind::Root {
                let t = self.doc.add_text(rest);
                self.splice(t);
                self.line_emitted = true;
                return Ok(());
            }

            self.emit_handwritten(rest, line);
            return Ok(());
        }
    }

    /// Wrap uncovered free text as a synthetic block so it stays movable
    /// and removable.
    fn emit_handwritten(&mut self, seg: &str, line: usize) {
        trace!(line, text = seg, "handwritten block");
        if self.hooks.is_comment(seg) {
            let block = self.doc.add_container(ContainerPayload::Block(
                Block::new(self.hooks.comment_color()).with_class("comment"),
            ));
            let (bs, be) = boundary(&self.doc, block);
            self.splice(bs);
            let mut cursor = 0usize;
            for range in self.hooks.parse_comment(seg) {
                if range.start > cursor {
                    let t = self.doc.add_text(&seg[cursor..range.start]);
                    self.splice(t);
                }
                let socket = self
                    .doc
                    .add_container(ContainerPayload::Socket(Socket::handwritten()));
                let (ss, se) = boundary(&self.doc, socket);
                self.splice(ss);
                if range.end > range.start {
                    let t = self.doc.add_text(&seg[range.start..range.end]);
                    self.splice(t);
                }
                self.splice(se);
                cursor = range.end;
            }
            if cursor < seg.len() {
                let t = self.doc.add_text(&seg[cursor..]);
                self.splice(t);
            }
            self.splice(be);
        } else {
            let block = self.doc.add_container(ContainerPayload::Block(
                Block::new(self.hooks.handwritten_color()).with_class("handwritten"),
            ));
            let socket = self
                .doc
                .add_container(ContainerPayload::Socket(Socket::handwritten()));
            let (bs, be) = boundary(&self.doc, block);
            let (ss, se) = boundary(&self.doc, socket);
            self.splice(bs);
            self.splice(ss);
            let t = self.doc.add_text(seg);
            self.splice(t);
            self.splice(se);
            self.splice(be);
        }
        self.line_emitted = true;
    }

    /// A thin marker block keeping vertical rhythm on otherwise empty
    /// lines.
    fn emit_empty_line_marker(&mut self, color: &str) {
        let block = self.doc.add_container(ContainerPayload::Block(
            Block::new(color).with_class("empty-line"),
        ));
        let (bs, be) = boundary(&self.doc, block);
        self.splice(bs);
        self.splice(be);
    }

    // ---- post-assembly passes -----------------------------------------

    fn strip_pending_removal(&mut self) -> AssembleResult<()> {
        let doomed: Vec<ContainerId> = self
            .doc
            .container_ids()
            .filter(|&id| {
                let c = self.doc.container(id);
                c.block().map_or(false, |b| b.pending_removal) && self.attached(id)
            })
            .collect();
        for id in doomed {
            let list = self.doc.container_list(id);
            // remember the stripped text on the enclosing socket, so an
            // emptied socket can still render its placeholder
            let placeholder = self.doc.stringify_list(list);
            let parent = self.doc.token(self.doc.container(id).start).parent;
            self.doc.remove(list, &mut [])?;
            if let Some(p) = parent {
                if let Some(s) = self.doc.container_mut(p).socket_mut() {
                    s.empty = placeholder;
                }
            }
        }
        Ok(())
    }

    fn apply_error_strips(&mut self) {
        let flagged: Vec<ContainerId> = self
            .doc
            .container_ids()
            .filter(|&id| {
                let c = self.doc.container(id);
                c.block().map_or(false, |b| b.error_strip.is_some()) && self.attached(id)
            })
            .collect();
        for id in flagged {
            let (left, right) = match self.doc.container(id).block().and_then(|b| b.error_strip) {
                Some(pair) => pair,
                None => continue,
            };
            let texts: Vec<TokenId> = match self.doc.container_contents(id) {
                Some(list) => match self.doc.span_tokens(list) {
                    Ok(ids) => ids
                        .into_iter()
                        .filter(|&t| self.doc.token(t).kind.is_text())
                        .collect(),
                    Err(_) => continue,
                },
                None => continue,
            };
            if let Some(&first) = texts.first() {
                if let trellis_model::TokenKind::Text(s) = &mut self.doc.token_mut(first).kind {
                    let cut = left.min(s.len());
                    s.drain(..cut);
                }
            }
            if let Some(&last) = texts.last() {
                if let trellis_model::TokenKind::Text(s) = &mut self.doc.token_mut(last).kind {
                    let cut = right.min(s.len());
                    let keep = s.len() - cut;
                    s.truncate(keep);
                }
            }
            // color the nearest enclosing block as an error
            let mut parent = self.doc.token(self.doc.container(id).start).parent;
            while let Some(p) = parent {
                if self.doc.container(p).is_block() {
                    if let Some(b) = self.doc.container_mut(p).block_mut() {
                        b.color = "error".to_string();
                    }
                    break;
                }
                parent = self.doc.token(self.doc.container(p).start).parent;
            }
            if let Some(b) = self.doc.container_mut(id).block_mut() {
                b.error_strip = None;
            }
        }
    }

    fn detect_paren_wrapped(&mut self) {
        let blocks: Vec<ContainerId> = self
            .doc
            .container_ids()
            .filter(|&id| self.doc.container(id).is_block() && self.attached(id))
            .collect();
        for id in blocks {
            let c = self.doc.container(id);
            let first = self.doc.next(c.start);
            let last = self.doc.prev(c.end);
            let wrapped = match (first, last) {
                (Some(f), Some(l)) if f != l => {
                    self.doc.token(f).text().starts_with('(')
                        && self.doc.token(l).text().ends_with(')')
                }
                _ => false,
            };
            if wrapped {
                if let Some(b) = self.doc.container_mut(id).block_mut() {
                    b.paren_wrapped = true;
                }
            }
        }
    }

    fn attached(&self, id: ContainerId) -> bool {
        let c = self.doc.container(id);
        self.doc.token(c.start).prev.is_some() && self.doc.token(c.end).next.is_some()
    }
}

fn boundary(doc: &Document, id: ContainerId) -> (TokenId, TokenId) {
    let c = doc.container(id);
    (c.start, c.end)
}
