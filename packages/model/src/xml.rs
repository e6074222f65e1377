//! # XML fixtures
//!
//! A small XML dialect used for golden tests and debug dumps. The writer
//! walks the chain in order; the reader is a hand-rolled scanner that
//! rebuilds an equivalent document, so fixtures checked into the tree can
//! be loaded back and diffed structurally.
//!
//! ```xml
//! <document>
//!   <block precedence="0" color="command" socketLevel="anyDrop">…</block>
//!   <socket precedence="0" handwritten="false">…</socket>
//!   <indent prefix="  ">…</indent>
//!   <br/>
//! </document>
//! ```

use trellis_common::{escape_xml, unescape_xml};

use crate::container::{Block, ContainerPayload, Indent, Socket, SocketLevel};
use crate::document::Document;
use crate::error::{ModelError, ModelResult};
use crate::token::{TokenId, TokenKind};

impl Document {
    /// Serialize the document structure as fixture XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let mut cur = Some(self.start());
        while let Some(id) = cur {
            let tok = self.token(id);
            match &tok.kind {
                TokenKind::Text(s) => out.push_str(&escape_xml(s)),
                TokenKind::Newline { special_indent } => match special_indent {
                    Some(s) => {
                        out.push_str("<br indent=\"");
                        out.push_str(&escape_xml(s));
                        out.push_str("\"/>");
                    }
                    None => out.push_str("<br/>"),
                },
                TokenKind::DocumentStart => out.push_str("<document>"),
                TokenKind::DocumentEnd => out.push_str("</document>"),
                TokenKind::BlockStart => {
                    let block = tok
                        .container
                        .and_then(|c| self.container(c).block().cloned())
                        .unwrap_or_else(|| Block::new(""));
                    out.push_str(&format!(
                        "<block precedence=\"{}\" color=\"{}\" socketLevel=\"{}\"",
                        block.precedence,
                        escape_xml(&block.color),
                        block.socket_level.as_str()
                    ));
                    push_classes(&mut out, &block.classes);
                    out.push('>');
                }
                TokenKind::BlockEnd => out.push_str("</block>"),
                TokenKind::SocketStart => {
                    let socket = tok
                        .container
                        .and_then(|c| self.container(c).socket().cloned())
                        .unwrap_or_default();
                    out.push_str(&format!(
                        "<socket precedence=\"{}\" handwritten=\"{}\"",
                        socket.precedence, socket.handwritten
                    ));
                    if !socket.empty.is_empty() {
                        out.push_str(&format!(" empty=\"{}\"", escape_xml(&socket.empty)));
                    }
                    push_classes(&mut out, &socket.classes);
                    out.push('>');
                }
                TokenKind::SocketEnd => out.push_str("</socket>"),
                TokenKind::IndentStart => {
                    let prefix = tok
                        .container
                        .and_then(|c| self.container(c).indent().map(|i| i.prefix.clone()))
                        .unwrap_or_default();
                    out.push_str(&format!("<indent prefix=\"{}\"", escape_xml(&prefix)));
                    if let Some(c) = tok.container {
                        if let Some(indent) = self.container(c).indent() {
                            push_classes(&mut out, &indent.classes);
                        }
                    }
                    out.push('>');
                }
                TokenKind::IndentEnd => out.push_str("</indent>"),
            }
            cur = tok.next;
        }
        out
    }

    /// Rebuild a document from fixture XML produced by [`Document::to_xml`].
    pub fn from_xml(input: &str) -> ModelResult<Document> {
        let mut reader = XmlReader::new(input);
        let mut doc = Document::new();
        let mut tail = doc.start();
        // stack of pending close tokens, innermost last
        let mut stack: Vec<(&'static str, TokenId)> = Vec::new();
        let mut seen_document = false;

        while let Some(event) = reader.next_event()? {
            match event {
                XmlEvent::Text(text) => {
                    let t = doc.add_text(text);
                    doc.splice_token_after(tail, t);
                    tail = t;
                }
                XmlEvent::Br { indent } => {
                    let nl = doc.add_newline(indent);
                    doc.splice_token_after(tail, nl);
                    tail = nl;
                }
                XmlEvent::Open { name, attrs, offset } => match name.as_str() {
                    "document" => {
                        if seen_document {
                            return Err(ModelError::xml(offset, "nested <document>"));
                        }
                        seen_document = true;
                    }
                    "block" => {
                        let mut block = Block::new(attr(&attrs, "color").unwrap_or_default());
                        if let Some(p) = attr(&attrs, "precedence") {
                            block.precedence = p
                                .parse()
                                .map_err(|_| ModelError::xml(offset, "bad precedence"))?;
                        }
                        if let Some(level) = attr(&attrs, "socketLevel") {
                            block.socket_level = SocketLevel::parse(&level)
                                .ok_or_else(|| ModelError::xml(offset, "bad socketLevel"))?;
                        }
                        if let Some(classes) = attr(&attrs, "classes") {
                            block.classes =
                                classes.split_whitespace().map(str::to_string).collect();
                        }
                        tail = open_container(
                            &mut doc,
                            &mut stack,
                            tail,
                            "block",
                            ContainerPayload::Block(block),
                        );
                    }
                    "socket" => {
                        let mut socket = Socket::new();
                        if let Some(p) = attr(&attrs, "precedence") {
                            socket.precedence = p
                                .parse()
                                .map_err(|_| ModelError::xml(offset, "bad precedence"))?;
                        }
                        socket.handwritten =
                            attr(&attrs, "handwritten").as_deref() == Some("true");
                        if let Some(placeholder) = attr(&attrs, "empty") {
                            socket.empty = placeholder;
                        }
                        if let Some(classes) = attr(&attrs, "classes") {
                            socket.classes =
                                classes.split_whitespace().map(str::to_string).collect();
                        }
                        tail = open_container(
                            &mut doc,
                            &mut stack,
                            tail,
                            "socket",
                            ContainerPayload::Socket(socket),
                        );
                    }
                    "indent" => {
                        let mut indent = Indent::new(attr(&attrs, "prefix").unwrap_or_default());
                        if let Some(classes) = attr(&attrs, "classes") {
                            indent.classes =
                                classes.split_whitespace().map(str::to_string).collect();
                        }
                        tail = open_container(
                            &mut doc,
                            &mut stack,
                            tail,
                            "indent",
                            ContainerPayload::Indent(indent),
                        );
                    }
                    other => {
                        return Err(ModelError::xml(offset, format!("unknown tag <{other}>")))
                    }
                },
                XmlEvent::Close { name, offset } => {
                    if name == "document" {
                        if !stack.is_empty() {
                            return Err(ModelError::xml(offset, "unclosed container"));
                        }
                        continue;
                    }
                    let (expected, end) = stack
                        .pop()
                        .ok_or_else(|| ModelError::xml(offset, "unmatched close tag"))?;
                    if expected != name {
                        return Err(ModelError::xml(
                            offset,
                            format!("expected </{expected}>, found </{name}>"),
                        ));
                    }
                    doc.splice_token_after(tail, end);
                    tail = end;
                }
            }
        }

        if !seen_document {
            return Err(ModelError::xml(0, "missing <document> root"));
        }
        if !stack.is_empty() {
            return Err(ModelError::xml(input.len(), "unclosed container"));
        }
        doc.correct_parents();
        doc.validate()?;
        Ok(doc)
    }
}

fn push_classes(out: &mut String, classes: &std::collections::BTreeSet<String>) {
    if !classes.is_empty() {
        let joined = classes.iter().cloned().collect::<Vec<_>>().join(" ");
        out.push_str(&format!(" classes=\"{}\"", escape_xml(&joined)));
    }
}

fn attr(attrs: &[(String, String)], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn open_container(
    doc: &mut Document,
    stack: &mut Vec<(&'static str, TokenId)>,
    tail: TokenId,
    name: &'static str,
    payload: ContainerPayload,
) -> TokenId {
    let id = doc.add_container(payload);
    let (start, end) = {
        let c = doc.container(id);
        (c.start, c.end)
    };
    doc.splice_token_after(tail, start);
    stack.push((name, end));
    start
}

enum XmlEvent {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        offset: usize,
    },
    Close {
        name: String,
        offset: usize,
    },
    Br {
        indent: Option<String>,
    },
    Text(String),
}

/// Minimal scanner over the fixture dialect. Not a general XML parser:
/// no processing instructions, comments, or CDATA.
struct XmlReader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> XmlReader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn next_event(&mut self) -> ModelResult<Option<XmlEvent>> {
        // skip inter-tag whitespace that carries no text meaning: fixture
        // files are written on one logical line, so only treat whitespace
        // directly between two tags as insignificant
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        if !self.rest().starts_with('<') {
            let end = self
                .rest()
                .find('<')
                .map(|i| self.pos + i)
                .unwrap_or(self.input.len());
            let raw = &self.input[self.pos..end];
            self.pos = end;
            if raw.chars().all(char::is_whitespace) {
                return self.next_event();
            }
            return Ok(Some(XmlEvent::Text(unescape_xml(raw))));
        }

        let offset = self.pos;
        let close = self
            .rest()
            .find('>')
            .ok_or_else(|| ModelError::xml(offset, "unterminated tag"))?;
        let tag = &self.rest()[1..close];
        self.pos += close + 1;

        if let Some(name) = tag.strip_prefix('/') {
            return Ok(Some(XmlEvent::Close {
                name: name.trim().to_string(),
                offset,
            }));
        }

        let self_closing = tag.ends_with('/');
        let body = tag.trim_end_matches('/').trim();
        let (name, attr_src) = match body.find(char::is_whitespace) {
            Some(i) => (&body[..i], body[i..].trim_start()),
            None => (body, ""),
        };
        let attrs = parse_attrs(attr_src, offset)?;

        if name == "br" {
            if !self_closing {
                return Err(ModelError::xml(offset, "<br> must be self-closing"));
            }
            return Ok(Some(XmlEvent::Br {
                indent: attr(&attrs, "indent"),
            }));
        }
        if self_closing {
            return Err(ModelError::xml(offset, format!("<{name}/> not allowed")));
        }
        Ok(Some(XmlEvent::Open {
            name: name.to_string(),
            attrs,
            offset,
        }))
    }
}

fn parse_attrs(src: &str, offset: usize) -> ModelResult<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    let mut rest = src.trim_start();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| ModelError::xml(offset, "attribute missing '='"))?;
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();
        if !rest.starts_with('"') {
            return Err(ModelError::xml(offset, "attribute value must be quoted"));
        }
        let end = rest[1..]
            .find('"')
            .ok_or_else(|| ModelError::xml(offset, "unterminated attribute value"))?;
        attrs.push((key, unescape_xml(&rest[1..end + 1])));
        rest = rest[end + 2..].trim_start();
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use crate::document::Document;

    #[test]
    fn test_xml_roundtrip() {
        let xml = "<document>hello<br/><block precedence=\"0\" color=\"command\" socketLevel=\"anyDrop\"><socket precedence=\"0\" handwritten=\"false\">world</socket></block></document>";
        let doc = Document::from_xml(xml).unwrap();
        assert_eq!(doc.stringify(), "hello\nworld");
        assert_eq!(doc.to_xml(), xml);
    }

    #[test]
    fn test_xml_special_indent_br() {
        let xml = "<document>a<indent prefix=\"  \"><br indent=\"    \"/>b</indent></document>";
        let doc = Document::from_xml(xml).unwrap();
        assert_eq!(doc.stringify(), "a\n    b");
        assert_eq!(doc.stringify_in_place(), "a\n  b");
        assert_eq!(doc.to_xml(), xml);
    }

    #[test]
    fn test_xml_socket_empty_placeholder() {
        let xml = "<document><block precedence=\"0\" color=\"command\" socketLevel=\"anyDrop\"><socket precedence=\"0\" handwritten=\"false\" empty=\"__\"></socket></block></document>";
        let doc = Document::from_xml(xml).unwrap();
        let remembered = doc
            .container_ids()
            .filter(|&id| {
                doc.container(id)
                    .socket()
                    .map_or(false, |s| s.empty == "__")
            })
            .count();
        assert_eq!(remembered, 1);
        assert_eq!(doc.to_xml(), xml);
    }

    #[test]
    fn test_xml_escaping() {
        let mut doc = Document::new();
        let t = doc.add_text("a < b && c > d");
        doc.splice_token_after(doc.start(), t);
        doc.correct_parents();
        let xml = doc.to_xml();
        assert!(xml.contains("a &lt; b &amp;&amp; c &gt; d"));
        let back = Document::from_xml(&xml).unwrap();
        assert_eq!(back.stringify(), "a < b && c > d");
    }

    #[test]
    fn test_xml_mismatched_close_rejected() {
        let xml = "<document><block precedence=\"0\" color=\"x\" socketLevel=\"anyDrop\"></socket></document>";
        assert!(Document::from_xml(xml).is_err());
    }
}
