//! declmap_normalize: The declaration normalizer.
//!
//! Walks one file's declaration tree and extracts a canonical draft-symbol
//! model: names, members, and textual (still unresolved) type references.
//! Documentation never reaches this layer — the scanner drops it as trivia —
//! so version annotations cannot influence anything downstream. The transform
//! is pure: one tree in, one `Module` plus diagnostics out, no shared state.

pub mod module;
pub mod normalizer;

pub use module::{DraftSymbol, ImportTarget, Module};
pub use normalizer::normalize_source_file;
