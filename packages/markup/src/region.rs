//! # Markup regions and events
//!
//! Adapters describe structure as a flat, unordered set of regions: a
//! container payload anchored to absolute text bounds, plus the recursion
//! depth at which the adapter emitted it. The assembler splits each region
//! into a start and an end event and sorts the events into splice order.

use serde::{Deserialize, Serialize};
use trellis_common::{TextPos, TextSpan};
use trellis_model::ContainerPayload;

/// One container-to-be, anchored to source coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupRegion {
    pub payload: ContainerPayload,
    pub bounds: TextSpan,
    /// Adapter recursion depth; the tie-breaker for events at identical
    /// positions.
    pub depth: usize,
}

impl MarkupRegion {
    pub fn new(payload: ContainerPayload, bounds: TextSpan, depth: usize) -> Self {
        Self {
            payload,
            bounds,
            depth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Start,
    End,
}

/// Half of a region, positioned for sorting. `region` indexes the region
/// list handed to the assembler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkupEvent {
    pub region: usize,
    pub kind: EventKind,
    pub pos: TextPos,
    pub depth: usize,
}

/// Split regions into events and sort them into splice order.
///
/// Order is by `(line, column)`; at an identical position an End precedes
/// a Start so adjacent containers never cross, among Starts the lower
/// depth goes outermost, and among Ends the lower depth goes innermost
/// (closes last). The sort is stable, so events the comparator cannot
/// distinguish keep their emission order.
pub fn sort_markup(regions: &[MarkupRegion]) -> Vec<MarkupEvent> {
    let mut events = Vec::with_capacity(regions.len() * 2);
    for (i, region) in regions.iter().enumerate() {
        events.push(MarkupEvent {
            region: i,
            kind: EventKind::Start,
            pos: region.bounds.start,
            depth: region.depth,
        });
        events.push(MarkupEvent {
            region: i,
            kind: EventKind::End,
            pos: region.bounds.end,
            depth: region.depth,
        });
    }
    events.sort_by(|a, b| {
        (a.pos.line, a.pos.column)
            .cmp(&(b.pos.line, b.pos.column))
            .then_with(|| match (a.kind, b.kind) {
                (EventKind::End, EventKind::Start) => std::cmp::Ordering::Less,
                (EventKind::Start, EventKind::End) => std::cmp::Ordering::Greater,
                (EventKind::Start, EventKind::Start) => a.depth.cmp(&b.depth),
                (EventKind::End, EventKind::End) => b.depth.cmp(&a.depth),
            })
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_model::{Block, ContainerPayload, Socket};

    fn block_region(span: TextSpan, depth: usize) -> MarkupRegion {
        MarkupRegion::new(ContainerPayload::Block(Block::new("command")), span, depth)
    }

    fn socket_region(span: TextSpan, depth: usize) -> MarkupRegion {
        MarkupRegion::new(ContainerPayload::Socket(Socket::new()), span, depth)
    }

    #[test]
    fn test_same_position_starts_sort_outermost_first() {
        // socket at depth 1 registered before block at depth 0, both
        // starting at the same position: the depth-0 block must still
        // come out outermost
        let regions = vec![
            socket_region(TextSpan::from_coords(0, 0, 0, 5), 1),
            block_region(TextSpan::from_coords(0, 0, 0, 5), 0),
        ];
        let events = sort_markup(&regions);
        assert_eq!(events[0].kind, EventKind::Start);
        assert_eq!(events[0].depth, 0);
        assert_eq!(events[1].kind, EventKind::Start);
        assert_eq!(events[1].depth, 1);
        // ends: inner (depth 1) closes first
        assert_eq!(events[2].kind, EventKind::End);
        assert_eq!(events[2].depth, 1);
        assert_eq!(events[3].depth, 0);
    }

    #[test]
    fn test_end_precedes_start_at_same_position() {
        let regions = vec![
            block_region(TextSpan::from_coords(0, 0, 0, 3), 0),
            block_region(TextSpan::from_coords(0, 3, 0, 6), 0),
        ];
        let events = sort_markup(&regions);
        assert_eq!(
            events
                .iter()
                .map(|e| e.kind)
                .collect::<Vec<_>>(),
            vec![
                EventKind::Start,
                EventKind::End,
                EventKind::Start,
                EventKind::End
            ]
        );
        assert_eq!(events[1].region, 0);
        assert_eq!(events[2].region, 1);
    }
}
