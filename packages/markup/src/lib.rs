//! # Trellis Markup
//!
//! The bridge between grammar adapters and the document model. Adapters
//! emit flat [`MarkupRegion`]s against text coordinates; [`sort_markup`]
//! orders their boundary events, and [`apply_markup`] threads the events
//! and the raw text into a validated linked [`trellis_model::Document`],
//! wrapping anything the grammar left uncovered in handwritten blocks.

pub mod assemble;
pub mod hooks;
pub mod region;

pub use assemble::{apply_markup, AssembleError, AssembleOptions, AssembleResult};
pub use hooks::{DefaultHooks, LanguageHooks};
pub use region::{sort_markup, EventKind, MarkupEvent, MarkupRegion};
