//! The per-file normalization output: draft symbols and the import table.

use declmap_core::collections::{FxIndexMap, FxMap};
use declmap_core::intern::InternedString;
use declmap_table::{
    DeclKind, GenericParam, Member, ModuleId, ModuleKind, Scope, SourceLocation, TypeRef,
};

/// What a local import binding points at.
#[derive(Debug, Clone)]
pub struct ImportTarget {
    /// The module specifier as written in the source.
    pub module: String,
    /// The exported name in the target module. For default imports this is
    /// `default`; for namespace imports it is empty and `namespace` is set.
    pub exported: InternedString,
    /// `import * as NS` — the binding names the whole module.
    pub namespace: bool,
}

/// One ingested file after normalization. Immutable once built; a changed
/// file means a full re-ingestion run.
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    /// The path this file was ingested under, interned.
    pub path: InternedString,
    pub kind: ModuleKind,
    /// The scope this module's declarations land in.
    pub scope: Scope,
    /// Local alias → import target, from top-level import declarations.
    pub imports: FxMap<InternedString, ImportTarget>,
    /// Draft symbols in source order.
    pub drafts: Vec<DraftSymbol>,
}

/// A pre-merge symbol occurrence produced by the normalizer. Same shape as a
/// merged `Symbol` minus the id; the merge engine folds all drafts sharing a
/// `(scope, name)` key into one.
#[derive(Debug, Clone)]
pub struct DraftSymbol {
    pub scope: Scope,
    pub name: InternedString,
    pub kind: DeclKind,
    pub exported: bool,
    pub location: SourceLocation,
    pub generics: Vec<GenericParam>,
    pub members: FxIndexMap<InternedString, Member>,
    pub heritage: Vec<TypeRef>,
    pub ty: Option<TypeRef>,
    /// Set when this single occurrence is already internally ambiguous
    /// (e.g. one enum body declaring a member twice with different values).
    pub tainted: bool,
}
