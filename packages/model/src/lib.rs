//! # Trellis Model
//!
//! The persistent document model: a doubly linked token chain threaded
//! through an arena, with containers (blocks, sockets, indents) delimited
//! by paired boundary tokens. All structural edits go through
//! [`Document::insert`], [`Document::remove`] and [`Document::replace`],
//! each of which returns an operation record that [`Document::perform`]
//! can replay or invert exactly.

pub mod container;
pub mod document;
pub mod error;
pub mod list;
pub mod location;
pub mod operation;
pub mod stringify;
pub mod token;
pub mod xml;

pub use container::{
    Block, ButtonSpec, Container, ContainerPayload, Indent, Socket, SocketLevel,
};
pub use document::Document;
pub use error::{ModelError, ModelResult};
pub use list::List;
pub use location::{Location, TextLocation};
pub use operation::{Direction, EditOperation, OpKind, Operation, ReplaceOperation};
pub use token::{ContainerId, Token, TokenId, TokenKind, TokenType};
