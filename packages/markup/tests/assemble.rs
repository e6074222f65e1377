use std::ops::Range;

use trellis_common::TextSpan;
use trellis_markup::{
    apply_markup, AssembleError, AssembleOptions, DefaultHooks, LanguageHooks, MarkupRegion,
};
use trellis_model::{Block, ContainerPayload, Indent, Socket};

fn block(span: TextSpan, depth: usize) -> MarkupRegion {
    MarkupRegion::new(
        ContainerPayload::Block(Block::new("command")),
        span,
        depth,
    )
}

fn socket(span: TextSpan, depth: usize) -> MarkupRegion {
    MarkupRegion::new(ContainerPayload::Socket(Socket::new()), span, depth)
}

fn indent(prefix: &str, span: TextSpan, depth: usize) -> MarkupRegion {
    MarkupRegion::new(
        ContainerPayload::Indent(Indent::new(prefix)),
        span,
        depth,
    )
}

struct HashHooks;

impl LanguageHooks for HashHooks {
    fn is_comment(&self, text: &str) -> bool {
        text.trim_start().starts_with('#')
    }

    fn parse_comment(&self, text: &str) -> Vec<Range<usize>> {
        let trimmed = text.trim_start();
        let offset = text.len() - trimmed.len();
        let payload = trimmed.trim_start_matches('#');
        let start = offset + (trimmed.len() - payload.len());
        vec![start..text.len()]
    }

    fn block_comment_markers(&self) -> Option<(&str, &str)> {
        Some(("###", "###"))
    }
}

fn comment_blocks(doc: &trellis_model::Document) -> usize {
    doc.container_ids()
        .filter(|&id| {
            let c = doc.container(id);
            c.block().map_or(false, |b| b.classes.contains("comment"))
                && doc.token(c.start).prev.is_some()
        })
        .count()
}

#[test]
fn test_single_command_round_trips() {
    let text = "print x";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 0, 7), 0),
        socket(TextSpan::from_coords(0, 6, 0, 7), 1),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    assert!(doc.validate().is_ok());
    assert_eq!(doc.stringify(), text);
}

#[test]
fn test_first_line_lead_kept_as_text() {
    let text = "  print x";
    let regions = vec![
        block(TextSpan::from_coords(0, 2, 0, 9), 0),
        socket(TextSpan::from_coords(0, 8, 0, 9), 1),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), text);
    assert!(doc.validate().is_ok());
}

#[test]
fn test_indent_stripping_round_trips() {
    let text = "for i\n  go";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 1, 4), 0),
        indent("  ", TextSpan::from_coords(0, 5, 1, 4), 1),
        block(TextSpan::from_coords(1, 2, 1, 4), 2),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), text);
    // the indented line's text token carries no leading whitespace
    let go = doc
        .iter()
        .find(|&id| doc.token(id).text().contains("go"))
        .unwrap();
    assert_eq!(doc.token(go).text(), "go");
}

#[test]
fn test_irregular_indent_recorded_as_special() {
    let text = "for i\n    go";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 1, 6), 0),
        indent("  ", TextSpan::from_coords(0, 5, 1, 6), 1),
        block(TextSpan::from_coords(1, 4, 1, 6), 2),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), text);
    // in-place serialization re-derives the structural two-space indent
    assert_eq!(doc.stringify_in_place(), "for i\n  go");
}

#[test]
fn test_multi_line_comment_amalgamated_into_one_block() {
    let text = "### first\nsecond\nthird ###";
    let doc = apply_markup(text, &[], &HashHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), text);
    assert_eq!(comment_blocks(&doc), 1);
}

#[test]
fn test_line_comment_gets_payload_socket() {
    let text = "# hello";
    let doc = apply_markup(text, &[], &HashHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), text);
    assert_eq!(comment_blocks(&doc), 1);
    let handwritten_sockets = doc
        .container_ids()
        .filter(|&id| doc.container(id).socket().map_or(false, |s| s.handwritten))
        .count();
    assert_eq!(handwritten_sockets, 1);
}

#[test]
fn test_uncovered_text_wrapped_unless_wrap_at_root_disabled() {
    let text = "mystery text";
    let doc = apply_markup(text, &[], &DefaultHooks, &AssembleOptions::default()).unwrap();
    let blocks = doc
        .container_ids()
        .filter(|&id| doc.container(id).is_block())
        .count();
    assert_eq!(blocks, 1);
    assert_eq!(doc.stringify(), text);

    let opts = AssembleOptions {
        wrap_at_root: false,
        ..Default::default()
    };
    let doc = apply_markup(text, &[], &DefaultHooks, &opts).unwrap();
    let blocks = doc
        .container_ids()
        .filter(|&id| doc.container(id).is_block())
        .count();
    assert_eq!(blocks, 0);
    assert_eq!(doc.stringify(), text);
}

#[test]
fn test_empty_line_marker_blocks() {
    let text = "a\n\nb";
    let opts = AssembleOptions {
        empty_line_color: Some("lightgray".to_string()),
        ..Default::default()
    };
    let doc = apply_markup(text, &[], &DefaultHooks, &opts).unwrap();
    assert_eq!(doc.stringify(), text);
    let markers = doc
        .container_ids()
        .filter(|&id| {
            let c = doc.container(id);
            c.block().map_or(false, |b| b.classes.contains("empty-line"))
        })
        .count();
    assert_eq!(markers, 1);
}

#[test]
fn test_trailing_blank_lines_get_no_markers() {
    let text = "a\n\n";
    let opts = AssembleOptions {
        empty_line_color: Some("lightgray".to_string()),
        ..Default::default()
    };
    let doc = apply_markup(text, &[], &DefaultHooks, &opts).unwrap();
    assert_eq!(doc.stringify(), text);
    let markers = doc
        .container_ids()
        .filter(|&id| {
            let c = doc.container(id);
            c.block().map_or(false, |b| b.classes.contains("empty-line"))
        })
        .count();
    assert_eq!(markers, 0);
}

#[test]
fn test_socket_at_root_is_improper_nesting() {
    let text = "x";
    let regions = vec![socket(TextSpan::from_coords(0, 0, 0, 1), 0)];
    let err = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default())
        .unwrap_err();
    assert!(matches!(err, AssembleError::ImproperNesting { .. }));
}

#[test]
fn test_block_directly_inside_block_is_improper_nesting() {
    let text = "ab";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 0, 2), 0),
        block(TextSpan::from_coords(0, 1, 0, 2), 1),
    ];
    let err = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default())
        .unwrap_err();
    assert!(matches!(err, AssembleError::ImproperNesting { .. }));
}

#[test]
fn test_pending_removal_stripped_unless_preserved() {
    let text = "f(__)";
    let mk_regions = || {
        vec![
            block(TextSpan::from_coords(0, 0, 0, 5), 0),
            socket(TextSpan::from_coords(0, 2, 0, 4), 1),
            MarkupRegion::new(
                ContainerPayload::Block(Block::new("blank").marked_for_removal()),
                TextSpan::from_coords(0, 2, 0, 4),
                2,
            ),
        ]
    };
    let doc = apply_markup(text, &mk_regions(), &DefaultHooks, &AssembleOptions::default())
        .unwrap();
    assert_eq!(doc.stringify(), "f()");

    let opts = AssembleOptions {
        preserve_empty: true,
        ..Default::default()
    };
    let doc = apply_markup(text, &mk_regions(), &DefaultHooks, &opts).unwrap();
    assert_eq!(doc.stringify(), "f(__)");
}

#[test]
fn test_error_strip_trims_delimiters_and_colors_parent() {
    // inner block carries delimiters synthesized during parse recovery
    let text = "f `bad`";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 0, 7), 0),
        socket(TextSpan::from_coords(0, 2, 0, 7), 1),
        MarkupRegion::new(
            ContainerPayload::Block({
                let mut b = Block::new("command");
                b.error_strip = Some((1, 1));
                b
            }),
            TextSpan::from_coords(0, 2, 0, 7),
            2,
        ),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    assert_eq!(doc.stringify(), "f bad");
    let error_blocks = doc
        .container_ids()
        .filter(|&id| {
            let c = doc.container(id);
            c.block().map_or(false, |b| b.color == "error")
        })
        .count();
    assert_eq!(error_blocks, 1);
}

#[test]
fn test_paren_wrapped_detection() {
    let text = "(x+1)";
    let regions = vec![
        block(TextSpan::from_coords(0, 0, 0, 5), 0),
        socket(TextSpan::from_coords(0, 1, 0, 2), 1),
    ];
    let doc = apply_markup(text, &regions, &DefaultHooks, &AssembleOptions::default()).unwrap();
    let wrapped = doc
        .container_ids()
        .filter(|&id| {
            let c = doc.container(id);
            c.block().map_or(false, |b| b.paren_wrapped)
        })
        .count();
    assert_eq!(wrapped, 1);
    assert_eq!(doc.stringify(), text);
}
