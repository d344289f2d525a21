//! Hash collection aliases used throughout the resolver.
//!
//! Insertion-order-preserving maps matter here: merged member lists and the
//! symbol index must iterate in a deterministic, source-derived order.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

/// An insertion-ordered map with the fast FxHash hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// An insertion-ordered set with the fast FxHash hasher.
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Re-export FxHashMap for unordered lookups.
pub type FxMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Re-export FxHashSet for unordered membership tests.
pub type FxSet<T> = rustc_hash::FxHashSet<T>;
