use serde::{Deserialize, Serialize};

/// Stable identity of a token within its document's arena.
///
/// Slots are never reused for the lifetime of a document, so an id taken
/// from a live token remains a valid handle even after the token has been
/// detached from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub(crate) u32);

impl TokenId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Identity of a container within its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub(crate) u32);

impl ContainerId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Payload-free discriminant of a token kind, used by text locations and
/// the XML fixture format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    Text,
    Newline,
    BlockStart,
    BlockEnd,
    SocketStart,
    SocketEnd,
    IndentStart,
    IndentEnd,
    DocumentStart,
    DocumentEnd,
}

/// The closed set of token kinds that make up the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A literal run of source text with no newline characters.
    Text(String),
    /// A line break. `special_indent` records a line whose actual leading
    /// whitespace did not match the structural indentation when parsed.
    Newline { special_indent: Option<String> },
    BlockStart,
    BlockEnd,
    SocketStart,
    SocketEnd,
    IndentStart,
    IndentEnd,
    DocumentStart,
    DocumentEnd,
}

impl TokenKind {
    pub fn newline() -> Self {
        TokenKind::Newline {
            special_indent: None,
        }
    }

    pub fn token_type(&self) -> TokenType {
        match self {
            TokenKind::Text(_) => TokenType::Text,
            TokenKind::Newline { .. } => TokenType::Newline,
            TokenKind::BlockStart => TokenType::BlockStart,
            TokenKind::BlockEnd => TokenType::BlockEnd,
            TokenKind::SocketStart => TokenType::SocketStart,
            TokenKind::SocketEnd => TokenType::SocketEnd,
            TokenKind::IndentStart => TokenType::IndentStart,
            TokenKind::IndentEnd => TokenType::IndentEnd,
            TokenKind::DocumentStart => TokenType::DocumentStart,
            TokenKind::DocumentEnd => TokenType::DocumentEnd,
        }
    }

    /// True for the opening half of a container pair.
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            TokenKind::BlockStart
                | TokenKind::SocketStart
                | TokenKind::IndentStart
                | TokenKind::DocumentStart
        )
    }

    /// True for the closing half of a container pair.
    pub fn is_end(&self) -> bool {
        matches!(
            self,
            TokenKind::BlockEnd
                | TokenKind::SocketEnd
                | TokenKind::IndentEnd
                | TokenKind::DocumentEnd
        )
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, TokenKind::Newline { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TokenKind::Text(_))
    }
}

/// One token in the chain.
///
/// `prev`/`next` belong to the document (the arena owns the chain, not the
/// neighbors). `parent` is a weak back-reference to the innermost enclosing
/// container, assigned only by [`Document::correct_parents`] — never set by
/// hand at a mutation site.
///
/// [`Document::correct_parents`]: crate::Document::correct_parents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub prev: Option<TokenId>,
    pub next: Option<TokenId>,
    pub parent: Option<ContainerId>,
    /// For container boundary tokens, the container this token opens or
    /// closes.
    pub container: Option<ContainerId>,
    /// Where a detached token forwards location lookups: the token that
    /// preceded its removal point.
    pub(crate) forwarded_to: Option<TokenId>,
}

impl Token {
    pub(crate) fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            prev: None,
            next: None,
            parent: None,
            container: None,
            forwarded_to: None,
        }
    }

    /// The literal text this token contributes to canonical serialization,
    /// ignoring indentation reconstruction.
    pub fn text(&self) -> &str {
        match &self.kind {
            TokenKind::Text(s) => s,
            _ => "",
        }
    }
}
