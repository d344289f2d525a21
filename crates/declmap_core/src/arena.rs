//! Arena allocation for per-file syntax trees.
//!
//! Each ingested file gets its own bump arena; the tree lives only as long
//! as normalization needs it, then the whole arena is freed at once.

use bumpalo::Bump;

/// Wraps a bump allocator for one file's declaration tree.
pub struct DeclArena {
    bump: Bump,
}

impl DeclArena {
    /// Create a new arena with default capacity.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Get a reference to the underlying bump allocator.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }
}

impl Default for DeclArena {
    fn default() -> Self {
        Self::new()
    }
}
