//! declmap_parser: Recursive descent parser for ambient declaration files.
//!
//! Consumes tokens from the scanner and builds an arena-allocated declaration
//! tree. Only top-level ambient declarations and the type expression grammar
//! are understood; statements and expressions do not occur in the corpus and
//! are parse errors.

pub mod parser;

pub use parser::Parser;
