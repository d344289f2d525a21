//! declmap_scanner: Tokenizer for ambient declaration files.
//!
//! Converts `.d.ts` source text into the token stream the declaration parser
//! consumes. All comments — including the versioned JSDoc blocks that make up
//! most of an SDK surface — are trivia and never reach the parser, which is
//! what guarantees documentation can never influence merge decisions.

pub mod char_codes;
pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::TokenInfo;
