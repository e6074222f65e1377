//! # Markup emission builder
//!
//! The shared primitive every adapter emits through. A builder is
//! constructed fresh per parse; nothing is shared across calls, so
//! pooled adapter instances stay re-entrant.

use trellis_common::TextSpan;
use trellis_markup::MarkupRegion;
use trellis_model::{Block, ContainerPayload, Indent, Socket};

#[derive(Debug, Default)]
pub struct MarkupBuilder {
    regions: Vec<MarkupRegion>,
}

impl MarkupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, block: Block, bounds: TextSpan, depth: usize) {
        self.regions
            .push(MarkupRegion::new(ContainerPayload::Block(block), bounds, depth));
    }

    pub fn add_socket(&mut self, socket: Socket, bounds: TextSpan, depth: usize) {
        self.regions.push(MarkupRegion::new(
            ContainerPayload::Socket(socket),
            bounds,
            depth,
        ));
    }

    pub fn add_indent(&mut self, indent: Indent, bounds: TextSpan, depth: usize) {
        self.regions.push(MarkupRegion::new(
            ContainerPayload::Indent(indent),
            bounds,
            depth,
        ));
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn finish(self) -> Vec<MarkupRegion> {
        self.regions
    }
}
