//! Flag types shared by the scanner, parser, and normalizer.

bitflags::bitflags! {
    /// Flags attached to scanned tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u32 {
        const NONE                  = 0;
        const PRECEDING_LINE_BREAK  = 1 << 0;
        const HEX_SPECIFIER         = 1 << 1;
        const SCIENTIFIC            = 1 << 2;
        const UNTERMINATED          = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Modifier flags for declarations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u32 {
        const NONE      = 0;
        const DECLARE   = 1 << 0;
        const EXPORT    = 1 << 1;
        const CONST     = 1 << 2;
        const READONLY  = 1 << 3;
        const STATIC    = 1 << 4;
        const DEFAULT   = 1 << 5;
        const ABSTRACT  = 1 << 6;
    }
}
