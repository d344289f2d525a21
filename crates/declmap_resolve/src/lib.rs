//! declmap_resolve: The cross-file reference resolver.
//!
//! Two passes over the merged table: an index-build pass (pure aggregation,
//! run after the merge barrier) and a resolve pass that rewrites every
//! pending type reference to a symbol id, a type parameter, or an explicit
//! unresolved marker. Bare names resolve through the declaring module's
//! import table first and the global ambient scope second — ArkUI-style
//! declaration trees routinely omit imports for globally ambient names.

pub mod paths;
pub mod resolver;

pub use resolver::resolve_references;
