use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::token::{TokenId, TokenKind};

/// How willing a block is to sit inside value sockets versus statement
/// positions. Drives drop-compatibility decisions in the editing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketLevel {
    AnyDrop,
    BlockOnly,
    MostlyBlock,
    MostlyValue,
    ValueOnly,
}

impl SocketLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SocketLevel::AnyDrop => "anyDrop",
            SocketLevel::BlockOnly => "blockOnly",
            SocketLevel::MostlyBlock => "mostlyBlock",
            SocketLevel::MostlyValue => "mostlyValue",
            SocketLevel::ValueOnly => "valueOnly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anyDrop" => Some(SocketLevel::AnyDrop),
            "blockOnly" => Some(SocketLevel::BlockOnly),
            "mostlyBlock" => Some(SocketLevel::MostlyBlock),
            "mostlyValue" => Some(SocketLevel::MostlyValue),
            "valueOnly" => Some(SocketLevel::ValueOnly),
            _ => None,
        }
    }
}

/// A structural button rendered on a block, e.g. "add argument".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub name: String,
    pub label: String,
}

impl ButtonSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Block metadata: a movable, droppable unit of code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Governs when surrounding parentheses are required on serialization.
    pub precedence: i32,
    /// Semantic category tag consumed by the (external) rendering layer.
    pub color: String,
    pub socket_level: SocketLevel,
    /// Free-form class tags used for drop-compatibility rules.
    pub classes: BTreeSet<String>,
    pub buttons: Vec<ButtonSpec>,
    /// Round-trip placeholder: stripped from the document after assembly
    /// unless the parse asked to preserve empties.
    pub pending_removal: bool,
    /// Parse-recovery artifact: strip this many characters from each side
    /// of the contained text and color the parent as an error.
    pub error_strip: Option<(usize, usize)>,
    /// Set when the block's literal first/last children are `(` and `)`,
    /// so the serializer never double-wraps.
    pub paren_wrapped: bool,
}

impl Block {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            precedence: 0,
            color: color.into(),
            socket_level: SocketLevel::AnyDrop,
            classes: BTreeSet::new(),
            buttons: Vec::new(),
            pending_removal: false,
            error_strip: None,
            paren_wrapped: false,
        }
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_socket_level(mut self, level: SocketLevel) -> Self {
        self.socket_level = level;
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_button(mut self, button: ButtonSpec) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn marked_for_removal(mut self) -> Self {
        self.pending_removal = true;
        self
    }
}

/// Socket metadata: a hole holding at most one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// Placeholder text rendered when the socket is empty.
    pub empty: String,
    pub precedence: i32,
    /// True when the socket was synthesized around free text rather than
    /// emitted by a grammar rule.
    pub handwritten: bool,
    pub classes: BTreeSet<String>,
    /// Enumerated literal choices presentable as a menu.
    pub dropdown: Option<Vec<String>>,
}

impl Socket {
    pub fn new() -> Self {
        Self {
            empty: String::new(),
            precedence: 0,
            handwritten: false,
            classes: BTreeSet::new(),
            dropdown: None,
        }
    }

    pub fn handwritten() -> Self {
        Self {
            handwritten: true,
            ..Self::new()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_dropdown(mut self, choices: Vec<String>) -> Self {
        self.dropdown = Some(choices);
        self
    }
}

impl Default for Socket {
    fn default() -> Self {
        Self::new()
    }
}

/// Indent metadata: a contiguous run of lines sharing one indentation
/// prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indent {
    /// The literal indentation prefix, a substring of the source.
    pub prefix: String,
    pub classes: BTreeSet<String>,
}

impl Indent {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            classes: BTreeSet::new(),
        }
    }
}

/// The four container variants, as a closed tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContainerPayload {
    Block(Block),
    Socket(Socket),
    Indent(Indent),
    Root,
}

impl ContainerPayload {
    /// The boundary token kinds this container is delimited by.
    pub fn boundary_kinds(&self) -> (TokenKind, TokenKind) {
        match self {
            ContainerPayload::Block(_) => (TokenKind::BlockStart, TokenKind::BlockEnd),
            ContainerPayload::Socket(_) => (TokenKind::SocketStart, TokenKind::SocketEnd),
            ContainerPayload::Indent(_) => (TokenKind::IndentStart, TokenKind::IndentEnd),
            ContainerPayload::Root => (TokenKind::DocumentStart, TokenKind::DocumentEnd),
        }
    }
}

/// A paired start/end token plus container-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub start: TokenId,
    pub end: TokenId,
    pub payload: ContainerPayload,
}

impl Container {
    pub fn block(&self) -> Option<&Block> {
        match &self.payload {
            ContainerPayload::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn block_mut(&mut self) -> Option<&mut Block> {
        match &mut self.payload {
            ContainerPayload::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn socket(&self) -> Option<&Socket> {
        match &self.payload {
            ContainerPayload::Socket(s) => Some(s),
            _ => None,
        }
    }

    pub fn socket_mut(&mut self) -> Option<&mut Socket> {
        match &mut self.payload {
            ContainerPayload::Socket(s) => Some(s),
            _ => None,
        }
    }

    pub fn indent(&self) -> Option<&Indent> {
        match &self.payload {
            ContainerPayload::Indent(i) => Some(i),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self.payload, ContainerPayload::Block(_))
    }

    pub fn is_socket(&self) -> bool {
        matches!(self.payload, ContainerPayload::Socket(_))
    }

    pub fn is_indent(&self) -> bool {
        matches!(self.payload, ContainerPayload::Indent(_))
    }

    pub fn is_root(&self) -> bool {
        matches!(self.payload, ContainerPayload::Root)
    }
}
