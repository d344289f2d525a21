//! declmap_ast: Abstract syntax tree for ambient declaration files.
//!
//! Defines the declaration-only node types the parser produces: enums,
//! interfaces, classes, type aliases, ambient consts, imports, and the type
//! expression grammar they reference. Nodes are arena-allocated and live only
//! as long as normalization of their file.

pub mod node;
pub mod syntax_kind;
pub mod types;

// Re-export key types
pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
