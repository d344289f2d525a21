//! declmap_merge: The overload and merge engine.
//!
//! Collapses every draft-symbol occurrence sharing one `(scope, name)` key
//! into a single logical symbol. Occurrences are sorted by source location
//! before reduction, so the result is identical for any ingestion order.
//! Disagreement is never resolved silently: a conflicting symbol is marked
//! tainted, both shapes land in the diagnostic, and the run continues.

pub mod merge;

pub use merge::merge_modules;
