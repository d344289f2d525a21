//! declmap_table: The merged symbol model and its query index.
//!
//! This is the artifact the rest of the pipeline exists to produce: one
//! logical `Symbol` per declared name, member lists with resolved type
//! references, and a read-only lookup index for the downstream analyzer.
//! Mutation requires `&mut SymbolTable` and only the resolution pipeline
//! holds one; consumers receive shared references.

pub mod symbol;
pub mod table;
pub mod typeref;

pub use symbol::{
    merge_member, DeclKind, GenericParam, LiteralValue, Member, MemberKind, MemberMergeOutcome,
    ModuleId, Param, Scope, Signature, SourceLocation, Symbol, SymbolId,
};
pub use table::{ModuleInfo, ModuleKind, SymbolTable};
pub use typeref::{NamedRef, Primitive, RefTarget, TypeRef};
