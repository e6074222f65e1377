//! # Document
//!
//! The persistent, editable linked-list document.
//!
//! Tokens live in an arena indexed by stable [`TokenId`]s; the chain is a
//! doubly linked list threaded through the arena. Slots are never reused,
//! which makes Locations cheap to serialize and removes any use-after-free
//! hazard when Lists are detached and later re-spliced.
//!
//! ## Lifecycle
//!
//! ```text
//! Parse → Assemble → Edit → Stringify
//!   ↓        ↓         ↓        ↓
//! markup   chain   Operations  text
//! ```
//!
//! Mutation is single-writer and synchronous: one call fully completes,
//! including Operation capture, before the next begins.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::container::{Container, ContainerPayload};
use crate::error::{ModelError, ModelResult};
use crate::list::List;
use crate::location::{Location, TextLocation};
use crate::operation::{Direction, EditOperation, OpKind, Operation, ReplaceOperation};
use crate::token::{ContainerId, Token, TokenId, TokenKind};

#[derive(Debug, Clone)]
pub struct Document {
    tokens: Vec<Token>,
    containers: Vec<Container>,
    root: ContainerId,
    start: TokenId,
    end: TokenId,
}

impl Document {
    /// An empty document: a root container whose start and end tokens are
    /// linked directly together.
    pub fn new() -> Self {
        let mut doc = Self {
            tokens: Vec::new(),
            containers: Vec::new(),
            root: ContainerId(0),
            start: TokenId(0),
            end: TokenId(0),
        };
        let start = doc.alloc_token(TokenKind::DocumentStart);
        let end = doc.alloc_token(TokenKind::DocumentEnd);
        let root = ContainerId(doc.containers.len() as u32);
        doc.containers.push(Container {
            start,
            end,
            payload: ContainerPayload::Root,
        });
        doc.tokens[start.index()].container = Some(root);
        doc.tokens[end.index()].container = Some(root);
        doc.link(start, end);
        doc.root = root;
        doc.start = start;
        doc.end = end;
        doc
    }

    pub fn start(&self) -> TokenId {
        self.start
    }

    pub fn end(&self) -> TokenId {
        self.end
    }

    pub fn root(&self) -> ContainerId {
        self.root
    }

    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    pub fn token_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.tokens[id.index()]
    }

    pub fn container(&self, id: ContainerId) -> &Container {
        &self.containers[id.index()]
    }

    pub fn container_mut(&mut self, id: ContainerId) -> &mut Container {
        &mut self.containers[id.index()]
    }

    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.tokens[id.index()].next
    }

    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        self.tokens[id.index()].prev
    }

    /// All container ids, in allocation order. Includes detached
    /// containers; callers filter by linkage where it matters.
    pub fn container_ids(&self) -> impl Iterator<Item = ContainerId> {
        (0..self.containers.len() as u32).map(ContainerId)
    }

    /// The inclusive list covering a container's boundary tokens.
    pub fn container_list(&self, id: ContainerId) -> List {
        let c = &self.containers[id.index()];
        List::new(c.start, c.end)
    }

    /// The list strictly between a container's boundary tokens, if any.
    pub fn container_contents(&self, id: ContainerId) -> Option<List> {
        let c = &self.containers[id.index()];
        let first = self.tokens[c.start.index()].next?;
        if first == c.end {
            return None;
        }
        let last = self.tokens[c.end.index()].prev?;
        Some(List::new(first, last))
    }

    /// Walk the chain forward from the document start.
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            doc: self,
            cur: Some(self.start),
        }
    }

    // ---- construction -------------------------------------------------

    fn alloc_token(&mut self, kind: TokenKind) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(Token::new(kind));
        id
    }

    /// Allocate a detached text token.
    pub fn add_text(&mut self, text: impl Into<String>) -> TokenId {
        self.alloc_token(TokenKind::Text(text.into()))
    }

    /// Allocate a detached newline token.
    pub fn add_newline(&mut self, special_indent: Option<String>) -> TokenId {
        self.alloc_token(TokenKind::Newline { special_indent })
    }

    /// Allocate a container plus its detached start/end boundary tokens.
    /// Root containers are created once by [`Document::new`] and never
    /// through this path.
    pub fn add_container(&mut self, payload: ContainerPayload) -> ContainerId {
        assert!(
            !matches!(payload, ContainerPayload::Root),
            "root containers are created by Document::new"
        );
        let (start_kind, end_kind) = payload.boundary_kinds();
        let start = self.alloc_token(start_kind);
        let end = self.alloc_token(end_kind);
        let id = ContainerId(self.containers.len() as u32);
        self.containers.push(Container {
            start,
            end,
            payload,
        });
        self.tokens[start.index()].container = Some(id);
        self.tokens[end.index()].container = Some(id);
        id
    }

    fn link(&mut self, a: TokenId, b: TokenId) {
        self.tokens[a.index()].next = Some(b);
        self.tokens[b.index()].prev = Some(a);
    }

    /// Splice the detached run `first..=last` into the chain immediately
    /// after `at`.
    pub fn splice_after(&mut self, at: TokenId, first: TokenId, last: TokenId) {
        let after = self.tokens[at.index()].next;
        self.link(at, first);
        if let Some(after) = after {
            self.link(last, after);
        } else {
            self.tokens[last.index()].next = None;
        }
        // a re-spliced token is live again
        let mut cur = Some(first);
        while let Some(id) = cur {
            self.tokens[id.index()].forwarded_to = None;
            cur = if id == last {
                None
            } else {
                self.tokens[id.index()].next
            };
        }
    }

    pub fn splice_token_after(&mut self, at: TokenId, token: TokenId) {
        self.splice_after(at, token, token);
    }

    /// Detach the run `first..=last`, leaving each detached token
    /// forwarding location lookups to the token that preceded the run.
    pub fn detach_span(&mut self, first: TokenId, last: TokenId) -> ModelResult<()> {
        let before = self.tokens[first.index()]
            .prev
            .ok_or(ModelError::InvalidList)?;
        let after = self.tokens[last.index()]
            .next
            .ok_or(ModelError::InvalidList)?;
        self.link(before, after);
        self.tokens[first.index()].prev = None;
        self.tokens[last.index()].next = None;
        let mut cur = Some(first);
        while let Some(id) = cur {
            self.tokens[id.index()].forwarded_to = Some(before);
            self.tokens[id.index()].parent = None;
            cur = if id == last {
                None
            } else {
                self.tokens[id.index()].next
            };
        }
        Ok(())
    }

    /// Remove a container's boundary tokens while keeping its contents in
    /// place. Used by post-assembly passes that dissolve marker blocks.
    pub fn unwrap_container(&mut self, id: ContainerId) -> ModelResult<()> {
        let (start, end) = {
            let c = &self.containers[id.index()];
            (c.start, c.end)
        };
        for boundary in [start, end] {
            let prev = self.tokens[boundary.index()]
                .prev
                .ok_or(ModelError::InvalidList)?;
            let next = self.tokens[boundary.index()]
                .next
                .ok_or(ModelError::InvalidList)?;
            self.link(prev, next);
            self.tokens[boundary.index()].prev = None;
            self.tokens[boundary.index()].next = None;
            self.tokens[boundary.index()].forwarded_to = Some(prev);
        }
        Ok(())
    }

    /// Collect the token ids of an attached or detached run.
    pub fn span_tokens(&self, list: List) -> ModelResult<Vec<TokenId>> {
        let mut ids = Vec::new();
        let mut cur = list.start;
        loop {
            ids.push(cur);
            if cur == list.end {
                return Ok(ids);
            }
            cur = self.tokens[cur.index()].next.ok_or(ModelError::InvalidList)?;
            if ids.len() > self.tokens.len() {
                return Err(ModelError::InvalidList);
            }
        }
    }

    fn count_span(&self, first: TokenId, last: TokenId) -> ModelResult<usize> {
        Ok(self.span_tokens(List::new(first, last))?.len())
    }

    // ---- cloning ------------------------------------------------------

    /// Deep-copy the run into fresh detached arena slots, cloning every
    /// container that lies fully inside it. Returns the clone and the
    /// old-token → new-token mapping.
    pub fn clone_span(&mut self, list: List) -> ModelResult<(List, HashMap<TokenId, TokenId>)> {
        let ids = self.span_tokens(list)?;
        let idset: HashSet<TokenId> = ids.iter().copied().collect();

        let mut container_map: HashMap<ContainerId, ContainerId> = HashMap::new();
        for &id in &ids {
            let tok = &self.tokens[id.index()];
            if tok.kind.is_start() {
                if let Some(cid) = tok.container {
                    let end = self.containers[cid.index()].end;
                    if idset.contains(&end) {
                        let payload = self.containers[cid.index()].payload.clone();
                        let new_cid = ContainerId(self.containers.len() as u32);
                        // boundary tokens patched below
                        self.containers.push(Container {
                            start: TokenId(0),
                            end: TokenId(0),
                            payload,
                        });
                        container_map.insert(cid, new_cid);
                    }
                }
            }
        }

        let mut token_map: HashMap<TokenId, TokenId> = HashMap::new();
        let mut first: Option<TokenId> = None;
        let mut prev: Option<TokenId> = None;
        for &id in &ids {
            let (kind, container) = {
                let t = &self.tokens[id.index()];
                (t.kind.clone(), t.container)
            };
            let mapped = match container {
                Some(c) => match container_map.get(&c) {
                    Some(&m) => Some(m),
                    // a boundary token whose partner lies outside the run
                    None if kind.is_start() || kind.is_end() => {
                        return Err(ModelError::SplitContainer)
                    }
                    None => None,
                },
                None => None,
            };
            let is_start = kind.is_start();
            let is_end = kind.is_end();
            let new_id = self.alloc_token(kind);
            self.tokens[new_id.index()].container = mapped;
            if let Some(m) = mapped {
                if is_start {
                    self.containers[m.index()].start = new_id;
                } else if is_end {
                    self.containers[m.index()].end = new_id;
                }
            }
            if let Some(p) = prev {
                self.link(p, new_id);
            }
            if first.is_none() {
                first = Some(new_id);
            }
            token_map.insert(id, new_id);
            prev = Some(new_id);
        }

        match (first, prev) {
            (Some(first), Some(last)) => Ok((List::new(first, last), token_map)),
            _ => Err(ModelError::InvalidList),
        }
    }

    /// Deep-copy a run, discarding the token mapping.
    pub fn clone_list(&mut self, list: List) -> ModelResult<List> {
        Ok(self.clone_span(list)?.0)
    }

    // ---- structural mutation ------------------------------------------

    /// Splice a clone of `list` immediately after `at`.
    ///
    /// Inserting at the very start of an indent or just after a block's
    /// end gets a leading newline so the fragment lands on its own line;
    /// inserting at the document start gets a trailing newline unless the
    /// document is empty. Locations in `update_locations` that pointed
    /// into the template list are rewritten to the spliced clone.
    pub fn insert(
        &mut self,
        at: TokenId,
        list: List,
        update_locations: &mut [Location],
    ) -> ModelResult<Operation> {
        debug!(at = at.raw(), "insert");
        let (frag, token_map) = self.clone_span(list)?;
        for loc in update_locations.iter_mut() {
            if let Some(&new_id) = token_map.get(&loc.id()) {
                *loc = Location::new(new_id);
            }
        }

        let mut first = frag.start;
        let mut last = frag.end;
        let at_kind = self.tokens[at.index()].kind.clone();
        match at_kind {
            TokenKind::IndentStart | TokenKind::BlockEnd => {
                if !self.tokens[first.index()].kind.is_newline() {
                    let nl = self.add_newline(None);
                    self.link(nl, first);
                    first = nl;
                }
            }
            TokenKind::DocumentStart => {
                if self.tokens[at.index()].next != Some(self.end)
                    && !self.tokens[last.index()].kind.is_newline()
                {
                    let nl = self.add_newline(None);
                    self.link(last, nl);
                    last = nl;
                }
            }
            _ => {}
        }

        self.splice_after(at, first, last);
        self.correct_parents();

        let tokens = self.span_tokens(List::new(first, last))?;
        let length = tokens.len();
        let (template, _) = self.clone_span(List::new(first, last))?;
        Ok(Operation {
            kind: OpKind::Insert,
            location: Location::new(at),
            fragment: template,
            length,
            tokens,
        })
    }

    /// Detach `list` from the chain.
    ///
    /// The boundary is first widened to swallow a single adjacent blank
    /// line where removal would otherwise leave two adjacent newlines, or
    /// a newline pressed against an indent/document boundary — but never
    /// so far that an enclosing indent collapses to zero content.
    /// Locations that pointed inside the removed run are rewritten to the
    /// token immediately preceding the removal point.
    pub fn remove(
        &mut self,
        list: List,
        update_locations: &mut [Location],
    ) -> ModelResult<Operation> {
        let (first, last) = self.widen_removal(list.start, list.end)?;
        debug!(
            first = first.raw(),
            last = last.raw(),
            "remove (after widening)"
        );
        let before = self.tokens[first.index()]
            .prev
            .ok_or(ModelError::InvalidList)?;
        let removed = self.span_tokens(List::new(first, last))?;
        let length = removed.len();
        let (template, _) = self.clone_span(List::new(first, last))?;
        self.detach_span(first, last)?;

        let removed_set: HashSet<TokenId> = removed.iter().copied().collect();
        for loc in update_locations.iter_mut() {
            if removed_set.contains(&loc.id()) {
                *loc = Location::new(before);
            }
        }

        self.correct_parents();
        Ok(Operation {
            kind: OpKind::Remove,
            location: Location::new(before),
            fragment: template,
            length,
            tokens: removed,
        })
    }

    fn widen_removal(&self, first: TokenId, last: TokenId) -> ModelResult<(TokenId, TokenId)> {
        let before = self.tokens[first.index()]
            .prev
            .ok_or(ModelError::InvalidList)?;
        let after = self.tokens[last.index()]
            .next
            .ok_or(ModelError::InvalidList)?;
        let before_tok = &self.tokens[before.index()];
        let after_tok = &self.tokens[after.index()];

        let before_is_newline = before_tok.kind.is_newline();
        let after_is_newline = after_tok.kind.is_newline();
        let after_closes = matches!(
            after_tok.kind,
            TokenKind::IndentEnd | TokenKind::DocumentEnd
        );
        let before_opens = matches!(
            before_tok.kind,
            TokenKind::IndentStart | TokenKind::DocumentStart
        );

        if before_is_newline && (after_is_newline || after_closes) {
            // removal would leave a doubled newline or one pressed against
            // a closing boundary; swallow the leading newline unless that
            // would empty the enclosing indent
            let empties_indent = matches!(after_tok.kind, TokenKind::IndentEnd)
                && before_tok
                    .prev
                    .map(|p| matches!(self.tokens[p.index()].kind, TokenKind::IndentStart))
                    .unwrap_or(false);
            if !empties_indent {
                return Ok((before, last));
            }
        } else if after_is_newline && before_opens {
            // removal at the very start would leave a leading blank line;
            // swallow the trailing newline unless that empties the indent
            let empties_indent = matches!(before_tok.kind, TokenKind::IndentStart)
                && after_tok
                    .next
                    .map(|n| matches!(self.tokens[n.index()].kind, TokenKind::IndentEnd))
                    .unwrap_or(false);
            if !empties_indent {
                return Ok((first, after));
            }
        }
        Ok((first, last))
    }

    /// Atomic swap of one contiguous list for another, preserving the
    /// surrounding parent.
    pub fn replace(
        &mut self,
        before: List,
        after: List,
        update_locations: &mut [Location],
    ) -> ModelResult<ReplaceOperation> {
        let anchor = self.tokens[before.start.index()]
            .prev
            .ok_or(ModelError::InvalidList)?;
        debug!(anchor = anchor.raw(), "replace");
        let removed = self.span_tokens(before)?;
        let before_len = removed.len();
        let (before_template, _) = self.clone_span(before)?;
        let (after_template, _) = self.clone_span(after)?;
        let (after_frag, token_map) = self.clone_span(after)?;
        let after_tokens = self.span_tokens(after_frag)?;
        let after_len = after_tokens.len();

        self.detach_span(before.start, before.end)?;
        self.splice_after(anchor, after_frag.start, after_frag.end);

        let removed_set: HashSet<TokenId> = removed.iter().copied().collect();
        for loc in update_locations.iter_mut() {
            if let Some(&new_id) = token_map.get(&loc.id()) {
                *loc = Location::new(new_id);
            } else if removed_set.contains(&loc.id()) {
                *loc = Location::new(anchor);
            }
        }

        self.correct_parents();
        Ok(ReplaceOperation {
            location: Location::new(anchor),
            before: before_template,
            before_len,
            before_tokens: removed,
            after: after_template,
            after_len,
            after_tokens,
        })
    }

    /// Replay or invert a previously recorded operation against the
    /// current state of the chain. Embedded Locations are re-resolved;
    /// token identity is never assumed to have survived.
    pub fn perform(
        &mut self,
        op: &EditOperation,
        direction: Direction,
        update_locations: &mut [Location],
    ) -> ModelResult<()> {
        match op {
            EditOperation::Splice(op) => {
                let at = self.resolve(op.location)?;
                let splice_in = matches!(
                    (op.kind, direction),
                    (OpKind::Insert, Direction::Forward) | (OpKind::Remove, Direction::Backward)
                );
                if splice_in {
                    let (frag, _) = self.clone_span(op.fragment)?;
                    self.splice_after(at, frag.start, frag.end);
                    self.forward_onto(&op.tokens, frag)?;
                } else {
                    self.detach_after(at, op.length, update_locations)?;
                }
                self.correct_parents();
                Ok(())
            }
            EditOperation::Replace(op) => {
                let at = self.resolve(op.location)?;
                let (out_len, template, restored) = match direction {
                    Direction::Forward => (op.before_len, op.after, &op.after_tokens),
                    Direction::Backward => (op.after_len, op.before, &op.before_tokens),
                };
                self.detach_after(at, out_len, update_locations)?;
                let (frag, _) = self.clone_span(template)?;
                self.splice_after(at, frag.start, frag.end);
                self.forward_onto(restored, frag)?;
                self.correct_parents();
                Ok(())
            }
        }
    }

    /// Point a detached run's tokens at their freshly spliced
    /// counterparts. Replay splices clones, so without this any operation
    /// whose location referenced the original run would resolve to the
    /// stale removal anchor instead of the restored position.
    fn forward_onto(&mut self, originals: &[TokenId], restored: List) -> ModelResult<()> {
        let ids = self.span_tokens(restored)?;
        for (&old, &new) in originals.iter().zip(ids.iter()) {
            if old != new && self.tokens[old.index()].forwarded_to.is_some() {
                self.tokens[old.index()].forwarded_to = Some(new);
            }
        }
        Ok(())
    }

    /// Detach `length` tokens following `at`, redirecting any tracked
    /// locations that fell inside the run.
    fn detach_after(
        &mut self,
        at: TokenId,
        length: usize,
        update_locations: &mut [Location],
    ) -> ModelResult<()> {
        if length == 0 {
            return Ok(());
        }
        let first = self.tokens[at.index()].next.ok_or(ModelError::StaleLocation)?;
        let mut last = first;
        for _ in 1..length {
            last = self.tokens[last.index()]
                .next
                .ok_or(ModelError::StaleLocation)?;
        }
        let removed = self.span_tokens(List::new(first, last))?;
        self.detach_span(first, last)?;
        let removed_set: HashSet<TokenId> = removed.into_iter().collect();
        for loc in update_locations.iter_mut() {
            if removed_set.contains(&loc.id()) {
                *loc = Location::new(at);
            }
        }
        Ok(())
    }

    // ---- locations ----------------------------------------------------

    /// Resolve a Location to a live token, following removal redirects.
    pub fn resolve(&self, location: Location) -> ModelResult<TokenId> {
        let mut id = location.id();
        let mut hops = 0usize;
        loop {
            let tok = self
                .tokens
                .get(id.index())
                .ok_or(ModelError::StaleLocation)?;
            match tok.forwarded_to {
                Some(next) => {
                    id = next;
                    hops += 1;
                    if hops > self.tokens.len() {
                        return Err(ModelError::StaleLocation);
                    }
                }
                None => return Ok(id),
            }
        }
    }

    pub fn get_from_location(&self, location: Location) -> ModelResult<TokenId> {
        self.resolve(location)
    }

    pub fn get_location(&self, id: TokenId) -> Location {
        Location::new(id)
    }

    /// Resolve a text-coordinate location against the current chain.
    /// Returns the last matching token that begins at or before the
    /// requested column on the requested row.
    pub fn get_from_text_location(&self, target: TextLocation) -> Option<TokenId> {
        let mut row = 0usize;
        let mut col = 0usize;
        let mut indents: Vec<usize> = Vec::new();
        let mut best: Option<TokenId> = None;

        let mut cur = Some(self.start);
        while let Some(id) = cur {
            if row > target.row {
                break;
            }
            let tok = &self.tokens[id.index()];
            if row == target.row && col <= target.col {
                let matches_kind = target
                    .kind
                    .map(|k| tok.kind.token_type() == k)
                    .unwrap_or(true);
                if matches_kind {
                    best = Some(id);
                }
            }
            match &tok.kind {
                TokenKind::Text(s) => col += s.len(),
                TokenKind::Newline { special_indent } => {
                    row += 1;
                    col = special_indent
                        .as_ref()
                        .map(|s| s.len())
                        .unwrap_or_else(|| indents.iter().sum());
                }
                TokenKind::IndentStart => {
                    if let Some(c) = tok.container {
                        if let Some(indent) = self.containers[c.index()].indent() {
                            indents.push(indent.prefix.len());
                        }
                    }
                }
                TokenKind::IndentEnd => {
                    indents.pop();
                }
                _ => {}
            }
            cur = tok.next;
        }
        best
    }

    // ---- tree correction and validation -------------------------------

    /// Whole-tree pass assigning every token's `parent` back-reference.
    /// Run after assembly and after every structural mutation; parents are
    /// never maintained incrementally at mutation sites.
    pub fn correct_parents(&mut self) {
        let mut stack: Vec<ContainerId> = Vec::new();
        let mut cur = Some(self.start);
        while let Some(id) = cur {
            let (is_start, is_end, container, next) = {
                let t = &self.tokens[id.index()];
                (t.kind.is_start(), t.kind.is_end(), t.container, t.next)
            };
            if is_start {
                self.tokens[id.index()].parent = stack.last().copied();
                if let Some(c) = container {
                    stack.push(c);
                }
            } else if is_end {
                stack.pop();
                self.tokens[id.index()].parent = stack.last().copied();
            } else {
                self.tokens[id.index()].parent = stack.last().copied();
            }
            cur = next;
        }
    }

    /// Diagnostic full-chain walk verifying link integrity and balanced
    /// container nesting. Not on any hot path; used by tests and debug
    /// builds.
    pub fn validate(&self) -> ModelResult<()> {
        let mut stack: Vec<ContainerId> = Vec::new();
        let mut count = 0usize;
        let mut prev: Option<TokenId> = None;
        let mut cur = Some(self.start);
        while let Some(id) = cur {
            let tok = &self.tokens[id.index()];
            if tok.prev != prev {
                return Err(ModelError::BrokenLink { at: id.0 });
            }
            if tok.kind.is_start() {
                stack.push(tok.container.ok_or(ModelError::MissingContainer { at: id.0 })?);
            } else if tok.kind.is_end() {
                let expected = stack.pop().ok_or(ModelError::StackMisaligned { at: id.0 })?;
                if tok.container != Some(expected) {
                    return Err(ModelError::StackMisaligned { at: id.0 });
                }
            }
            count += 1;
            if count > self.tokens.len() {
                return Err(ModelError::BrokenLink { at: id.0 });
            }
            prev = Some(id);
            cur = tok.next;
        }
        if prev != Some(self.end) {
            return Err(ModelError::Unterminated);
        }
        if !stack.is_empty() {
            return Err(ModelError::UnbalancedNesting);
        }

        // the chain must read identically backwards
        let mut back = 0usize;
        let mut cur = Some(self.end);
        while let Some(id) = cur {
            back += 1;
            if back > count {
                return Err(ModelError::BrokenLink { at: id.0 });
            }
            cur = self.tokens[id.index()].prev;
        }
        if back != count {
            return Err(ModelError::BrokenLink { at: self.start.0 });
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward iterator over the attached chain.
pub struct ChainIter<'a> {
    doc: &'a Document,
    cur: Option<TokenId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = TokenId;

    fn next(&mut self) -> Option<TokenId> {
        let id = self.cur?;
        self.cur = self.doc.token(id).next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Block, ContainerPayload, Socket};

    fn simple_doc() -> (Document, ContainerId) {
        // hello\nworld, with "world" wrapped in a block+socket
        let mut doc = Document::new();
        let tail = doc.start();
        let t1 = doc.add_text("hello");
        doc.splice_token_after(tail, t1);
        let nl = doc.add_newline(None);
        doc.splice_token_after(t1, nl);
        let block = doc.add_container(ContainerPayload::Block(Block::new("command")));
        let bs = doc.container(block).start;
        let be = doc.container(block).end;
        doc.splice_token_after(nl, bs);
        let socket = doc.add_container(ContainerPayload::Socket(Socket::new()));
        let ss = doc.container(socket).start;
        let se = doc.container(socket).end;
        doc.splice_token_after(bs, ss);
        let t2 = doc.add_text("world");
        doc.splice_token_after(ss, t2);
        doc.splice_token_after(t2, se);
        doc.splice_token_after(se, be);
        doc.correct_parents();
        (doc, block)
    }

    #[test]
    fn test_empty_document_is_valid() {
        let doc = Document::new();
        assert!(doc.validate().is_ok());
        assert_eq!(doc.stringify(), "");
    }

    #[test]
    fn test_simple_doc_valid_and_stringifies() {
        let (doc, _) = simple_doc();
        assert!(doc.validate().is_ok());
        assert_eq!(doc.stringify(), "hello\nworld");
    }

    #[test]
    fn test_parent_correction() {
        let (doc, block) = simple_doc();
        let socket_start = doc
            .iter()
            .find(|&id| matches!(doc.token(id).kind, TokenKind::SocketStart))
            .unwrap();
        assert_eq!(doc.token(socket_start).parent, Some(block));
        assert_eq!(doc.token(doc.start()).parent, None);
    }

    #[test]
    fn test_remove_and_undo_roundtrip() {
        let (mut doc, block) = simple_doc();
        let original = doc.stringify();
        let list = doc.container_list(block);
        let op = doc.remove(list, &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello");
        assert!(doc.validate().is_ok());

        let op = EditOperation::from(op);
        doc.perform(&op, Direction::Backward, &mut []).unwrap();
        assert_eq!(doc.stringify(), original);
        assert!(doc.validate().is_ok());

        doc.perform(&op, Direction::Forward, &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_location_redirect_after_removal() {
        let (mut doc, block) = simple_doc();
        let world = doc
            .iter()
            .find(|&id| doc.token(id).text() == "world")
            .unwrap();
        let loc = doc.get_location(world);
        let before = doc.prev(doc.container(block).start).unwrap();

        let list = doc.container_list(block);
        doc.remove(list, &mut []).unwrap();

        // untracked location forwards to the token preceding the removal
        let resolved = doc.get_from_location(loc).unwrap();
        assert_eq!(resolved, doc.resolve(Location::new(before)).unwrap());
    }

    #[test]
    fn test_location_stable_under_disjoint_edit() {
        let (mut doc, block) = simple_doc();
        let hello = doc
            .iter()
            .find(|&id| doc.token(id).text() == "hello")
            .unwrap();
        let loc = doc.get_location(hello);

        let list = doc.container_list(block);
        doc.remove(list, &mut []).unwrap();

        let resolved = doc.get_from_location(loc).unwrap();
        assert_eq!(doc.token(resolved).text(), "hello");
    }

    #[test]
    fn test_clone_split_container_rejected() {
        let (mut doc, block) = simple_doc();
        let bs = doc.container(block).start;
        // run that contains blockStart but not blockEnd
        let inner = doc.next(bs).unwrap();
        let err = doc.clone_span(List::new(bs, inner)).unwrap_err();
        assert_eq!(err, ModelError::SplitContainer);
    }

    #[test]
    fn test_insert_at_document_start_appends_newline() {
        let (mut doc, block) = simple_doc();
        let list = doc.container_list(block);
        let op = doc.remove(list, &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello");

        // the removed fragment includes the widened newline; re-insert
        // just the block at the document start
        let frag = op.fragment;
        let frag_tokens = doc.span_tokens(frag).unwrap();
        let bs = frag_tokens
            .iter()
            .copied()
            .find(|&id| matches!(doc.token(id).kind, TokenKind::BlockStart))
            .unwrap();
        let be = frag.end;
        doc.insert(doc.start(), List::new(bs, be), &mut []).unwrap();
        assert_eq!(doc.stringify(), "world\nhello");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_replace_and_perform() {
        let (mut doc, block) = simple_doc();
        // build a detached replacement fragment: plain text "mars"
        let t = doc.add_text("mars");
        let before = doc.container_list(block);
        let op = doc.replace(before, List::single(t), &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello\nmars");

        let op = EditOperation::from(op);
        doc.perform(&op, Direction::Backward, &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello\nworld");
        doc.perform(&op, Direction::Forward, &mut []).unwrap();
        assert_eq!(doc.stringify(), "hello\nmars");
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_text_location_lookup() {
        let (doc, _) = simple_doc();
        let tok = doc
            .get_from_text_location(TextLocation::of_kind(1, 0, crate::TokenType::Text))
            .unwrap();
        assert_eq!(doc.token(tok).text(), "world");
    }
}
