use trellis_editor::EditBuffer;
use trellis_lang::{Adapter, ParseOptions, ScriptAdapter};
use trellis_model::{Document, List, Location};

fn parse(text: &str) -> Document {
    ScriptAdapter::new()
        .parse(text, &ParseOptions::default())
        .unwrap()
}

fn find_block(doc: &Document, needle: &str) -> List {
    for id in doc.container_ids() {
        let c = doc.container(id);
        if !c.is_block() {
            continue;
        }
        let list = doc.container_list(id);
        if doc.stringify_list(list).starts_with(needle) {
            return list;
        }
    }
    panic!("no block starting with {needle:?}");
}

// the callee of a known command and its socketed argument are separate
// tokens, so lookups target the argument text
fn find_text(doc: &Document, needle: &str) -> trellis_model::TokenId {
    doc.iter()
        .find(|&id| doc.token(id).text() == needle)
        .unwrap_or_else(|| panic!("no text token {needle:?}"))
}

#[test]
fn test_undo_redo_chain_restores_every_state() {
    let mut buf = EditBuffer::new(parse("print a\nprint b\nprint c\nprint d"));

    let mut states = vec![buf.stringify()];
    for needle in ["print d", "print b", "print a"] {
        let list = find_block(buf.document(), needle);
        buf.remove(list).unwrap();
        assert!(buf.document().validate().is_ok());
        states.push(buf.stringify());
    }

    for expected in states.iter().rev().skip(1) {
        assert!(buf.undo().unwrap());
        assert_eq!(&buf.stringify(), expected);
        assert!(buf.document().validate().is_ok());
    }
    assert!(!buf.undo().unwrap());

    for expected in states.iter().skip(1) {
        assert!(buf.redo().unwrap());
        assert_eq!(&buf.stringify(), expected);
        assert!(buf.document().validate().is_ok());
    }
    assert!(!buf.redo().unwrap());
}

#[test]
fn test_interleaved_undo_discards_redo_future() {
    let mut buf = EditBuffer::new(parse("print a\nprint b\nprint c"));

    let list = find_block(buf.document(), "print c");
    buf.remove(list).unwrap();
    buf.undo().unwrap();
    assert!(buf.can_redo());

    // a fresh edit forks history; the undone removal is unreachable now
    let list = find_block(buf.document(), "print a");
    buf.remove(list).unwrap();
    assert!(!buf.can_redo());
    assert_eq!(buf.stringify(), "print b\nprint c");
}

#[test]
fn test_cursor_stable_under_disjoint_edits() {
    let mut buf = EditBuffer::new(parse("print a\nprint b\nprint c"));
    let target = find_text(buf.document(), "c");
    let cursor = buf.track(Location::new(target));

    let list = find_block(buf.document(), "print a");
    buf.remove(list).unwrap();
    let resolved = buf.cursor(cursor).unwrap();
    assert_eq!(buf.document().token(resolved).text(), "c");

    buf.undo().unwrap();
    buf.redo().unwrap();
    let resolved = buf.cursor(cursor).unwrap();
    assert_eq!(buf.document().token(resolved).text(), "c");
}

#[test]
fn test_cursor_redirected_out_of_removed_region() {
    let mut buf = EditBuffer::new(parse("print a\nprint b"));
    let inside = find_text(buf.document(), "b");
    let cursor = buf.track(Location::new(inside));

    let removed = find_block(buf.document(), "print b");
    buf.remove(removed).unwrap();

    // the cursor lands on the token just before the removed run, which
    // is the closing boundary of the surviving block
    let resolved = buf.cursor(cursor).unwrap();
    let survivor = find_block(buf.document(), "print a");
    assert_eq!(resolved, survivor.end);
}

#[test]
fn test_replace_through_buffer_round_trips() {
    let mut doc = parse("print a\nprint b");
    let (fragment, _) = doc.clone_span(find_block(&doc, "print b")).unwrap();

    let mut buf = EditBuffer::new(doc);
    let before = find_block(buf.document(), "print a");
    buf.replace(before, fragment).unwrap();
    assert_eq!(buf.stringify(), "print b\nprint b");
    assert!(buf.document().validate().is_ok());

    buf.undo().unwrap();
    assert_eq!(buf.stringify(), "print a\nprint b");
    buf.redo().unwrap();
    assert_eq!(buf.stringify(), "print b\nprint b");
}

#[test]
fn test_batched_edits_undo_as_one_step() {
    let mut buf = EditBuffer::new(parse("print a\nprint b\nprint c"));

    buf.begin_batch();
    let list = find_block(buf.document(), "print a");
    buf.remove(list).unwrap();
    let list = find_block(buf.document(), "print c");
    buf.remove(list).unwrap();
    buf.end_batch();
    assert_eq!(buf.stringify(), "print b");

    assert!(buf.undo().unwrap());
    assert_eq!(buf.stringify(), "print a\nprint b\nprint c");
    assert!(!buf.can_undo());
}

#[test]
fn test_structural_move_inside_loop_body() {
    let mut buf = EditBuffer::new(parse(
        "for i in [1..3]\n  console.log hello\n  console.log world",
    ));

    let world = find_block(buf.document(), "console.log world");
    buf.remove(world).unwrap();
    assert_eq!(buf.stringify(), "for i in [1..3]\n  console.log hello");

    assert!(buf.undo().unwrap());
    assert_eq!(
        buf.stringify(),
        "for i in [1..3]\n  console.log hello\n  console.log world"
    );
    assert!(buf.document().validate().is_ok());
}
