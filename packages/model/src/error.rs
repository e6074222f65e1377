use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Token chain link broken at token {at}")]
    BrokenLink { at: u32 },

    #[error("Stack does not align at token {at}")]
    StackMisaligned { at: u32 },

    #[error("Container nesting left unbalanced at end of chain")]
    UnbalancedNesting,

    #[error("Token chain does not terminate at the document end")]
    Unterminated,

    #[error("Boundary token {at} has no container")]
    MissingContainer { at: u32 },

    #[error("List does not describe a contiguous attached token run")]
    InvalidList,

    #[error("List splits a container across its boundary")]
    SplitContainer,

    #[error("Location no longer resolves to a live token")]
    StaleLocation,

    #[error("XML fixture error at offset {offset}: {message}")]
    Xml { offset: usize, message: String },
}

impl ModelError {
    pub fn xml(offset: usize, message: impl Into<String>) -> Self {
        Self::Xml {
            offset,
            message: message.into(),
        }
    }
}
