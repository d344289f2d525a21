//! Symbol, member, and location definitions.

use crate::typeref::TypeRef;
use declmap_core::collections::FxIndexMap;
use declmap_core::intern::{InternedString, StringInterner};
use declmap_core::text::TextSpan;
use std::fmt;

/// Symbol ID for referencing merged symbols by index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const INVALID: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Module ID for referencing ingested files by index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ModuleId(pub u32);

impl ModuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a symbol's name lives. Ambient script files contribute to the
/// global scope; files with top-level import/export keep their names
/// module-scoped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Scope {
    Global,
    Module(InternedString),
}

/// One physical occurrence of a declaration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SourceLocation {
    pub module: ModuleId,
    pub span: TextSpan,
}

/// The kind of declaration a symbol came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeclKind {
    Enum,
    Interface,
    Class,
    TypeAlias,
    Const,
}

impl DeclKind {
    /// Phrase used in kind-conflict diagnostics.
    pub fn article_phrase(self) -> &'static str {
        match self {
            DeclKind::Enum => "an enum",
            DeclKind::Interface => "an interface",
            DeclKind::Class => "a class",
            DeclKind::TypeAlias => "a type alias",
            DeclKind::Const => "an ambient const",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Enum => "enum",
            DeclKind::Interface => "interface",
            DeclKind::Class => "class",
            DeclKind::TypeAlias => "type",
            DeclKind::Const => "const",
        };
        write!(f, "{}", s)
    }
}

/// A literal value carried by an enum member or a literal type.
#[derive(Debug, Clone)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Bit comparison keeps merge decisions deterministic for every
            // float, -0.0 and 0.0 included.
            (LiteralValue::Number(a), LiteralValue::Number(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::String(a), LiteralValue::String(b)) => a == b,
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::String(s) => write!(f, "'{}'", s),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A generic (type) parameter on a symbol or signature.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: InternedString,
    pub constraint: Option<TypeRef>,
    pub default: Option<TypeRef>,
}

/// A parameter of a function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: InternedString,
    pub ty: Option<TypeRef>,
    pub optional: bool,
    pub rest: bool,
}

/// One callable signature. Methods accumulate one of these per overload.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub type_params: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
}

/// What a member is, by declaration kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// An enum variant with an optional explicit literal value. Implicit
    /// ordinals are deliberately not synthesized: only explicit value
    /// disagreement is a conflict.
    EnumVariant { value: Option<LiteralValue> },
    /// An interface/class property.
    Property {
        ty: Option<TypeRef>,
        optional: bool,
        readonly: bool,
    },
    /// A method; overloads are additional signatures, never duplicates.
    Method { signatures: Vec<Signature> },
    /// A call signature (`(src: string): Attribute`), stored under `__call`.
    Call { signatures: Vec<Signature> },
    /// A construct signature, stored under `__new`.
    Construct { signatures: Vec<Signature> },
    /// An index signature, stored under `__index`.
    Index { key: Option<TypeRef>, ty: TypeRef },
}

/// A named member of a merged symbol.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: InternedString,
    pub kind: MemberKind,
    /// Every physical occurrence that contributed to this member.
    pub locations: Vec<SourceLocation>,
}

/// Equality is structural: two occurrences of the same member shape compare
/// equal no matter which files they came from.
impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

/// A merged symbol: exactly one per `(scope, name)` after the merge pass.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub scope: Scope,
    pub name: InternedString,
    pub kind: DeclKind,
    /// Whether any occurrence was exported.
    pub exported: bool,
    /// Set when occurrences disagreed incompatibly; consumers should treat
    /// the merged shape as unsound and widen.
    pub tainted: bool,
    /// One entry per physical occurrence, sorted by (module, position).
    pub locations: Vec<SourceLocation>,
    pub generics: Vec<GenericParam>,
    /// Members in first-seen source order.
    pub members: FxIndexMap<InternedString, Member>,
    /// Extends/implements clause references.
    pub heritage: Vec<TypeRef>,
    /// The right-hand side of a type alias, or the declared type of an
    /// ambient const.
    pub ty: Option<TypeRef>,
}

impl Symbol {
    pub fn new(id: SymbolId, scope: Scope, name: InternedString, kind: DeclKind) -> Self {
        Self {
            id,
            scope,
            name,
            kind,
            exported: false,
            tainted: false,
            locations: Vec::new(),
            generics: Vec::new(),
            members: FxIndexMap::default(),
            heritage: Vec::new(),
            ty: None,
        }
    }

    /// Render this symbol's qualified name, e.g. `units.d.ts::Length` for a
    /// module-scoped symbol or a bare `Length` for a global one.
    pub fn qualified_name(&self, interner: &StringInterner) -> String {
        match self.scope {
            Scope::Global => interner.resolve(self.name).to_string(),
            Scope::Module(path) => {
                format!("{}::{}", interner.resolve(path), interner.resolve(self.name))
            }
        }
    }
}

/// Result of folding one member occurrence into an already-collected member.
#[derive(Debug)]
pub enum MemberMergeOutcome {
    /// Deduplicated, widened, or accumulated as an overload.
    Merged,
    /// Incompatible redeclaration; both rendered shapes are retained for the
    /// diagnostic and the owning symbol must be tainted.
    Conflict { existing: String, incoming: String },
}

/// Fold `incoming` into `existing`, which must share its name.
///
/// These are the member-level merge rules: identical shapes deduplicate,
/// method overloads accumulate as extra signatures, an explicit enum value
/// meets an implicit one by adopting the explicit value, a property type that
/// strictly widens the other (a union gaining arms) adopts the wider form,
/// and anything else is a conflict. Last-wins is deliberately not an option.
pub fn merge_member(
    existing: &mut Member,
    incoming: Member,
    interner: &StringInterner,
) -> MemberMergeOutcome {
    debug_assert_eq!(existing.name, incoming.name);
    let outcome = match (&mut existing.kind, incoming.kind) {
        (
            MemberKind::EnumVariant { value: existing_value },
            MemberKind::EnumVariant { value: incoming_value },
        ) => match (existing_value.take(), incoming_value) {
            (Some(a), Some(b)) => {
                if a == b {
                    *existing_value = Some(a);
                    MemberMergeOutcome::Merged
                } else {
                    let conflict = MemberMergeOutcome::Conflict {
                        existing: a.to_string(),
                        incoming: b.to_string(),
                    };
                    *existing_value = Some(a);
                    conflict
                }
            }
            // An explicit value meeting an implicit occurrence adopts the
            // explicit value; that is addition, not conflict.
            (None, Some(b)) => {
                *existing_value = Some(b);
                MemberMergeOutcome::Merged
            }
            (a, None) => {
                *existing_value = a;
                MemberMergeOutcome::Merged
            }
        },
        (
            MemberKind::Property {
                ty: existing_ty,
                optional: existing_optional,
                readonly: existing_readonly,
            },
            MemberKind::Property {
                ty: incoming_ty,
                optional: incoming_optional,
                readonly: incoming_readonly,
            },
        ) => {
            let merged_ty = match (existing_ty.take(), incoming_ty) {
                (None, incoming) => Ok(incoming),
                (existing, None) => Ok(existing),
                (Some(a), Some(b)) => {
                    if a == b || b.is_widening_of(&a) {
                        Ok(Some(b))
                    } else if a.is_widening_of(&b) {
                        Ok(Some(a))
                    } else {
                        Err((a, b))
                    }
                }
            };
            match merged_ty {
                Ok(ty) => {
                    *existing_ty = ty;
                    *existing_optional |= incoming_optional;
                    *existing_readonly |= incoming_readonly;
                    MemberMergeOutcome::Merged
                }
                Err((a, b)) => {
                    let conflict = MemberMergeOutcome::Conflict {
                        existing: a.display(interner),
                        incoming: b.display(interner),
                    };
                    *existing_ty = Some(a);
                    conflict
                }
            }
        }
        (
            MemberKind::Method { signatures: existing_sigs },
            MemberKind::Method { signatures: incoming_sigs },
        )
        | (
            MemberKind::Call { signatures: existing_sigs },
            MemberKind::Call { signatures: incoming_sigs },
        )
        | (
            MemberKind::Construct { signatures: existing_sigs },
            MemberKind::Construct { signatures: incoming_sigs },
        ) => {
            for sig in incoming_sigs {
                if !existing_sigs.contains(&sig) {
                    existing_sigs.push(sig);
                }
            }
            MemberMergeOutcome::Merged
        }
        (
            MemberKind::Index { key: existing_key, ty: existing_ty },
            MemberKind::Index { key: incoming_key, ty: incoming_ty },
        ) => {
            if *existing_key == incoming_key && *existing_ty == incoming_ty {
                MemberMergeOutcome::Merged
            } else {
                MemberMergeOutcome::Conflict {
                    existing: existing_ty.display(interner),
                    incoming: incoming_ty.display(interner),
                }
            }
        }
        (existing_kind, incoming_kind) => MemberMergeOutcome::Conflict {
            existing: describe_member_kind(existing_kind),
            incoming: describe_member_kind(&incoming_kind),
        },
    };
    existing.locations.extend(incoming.locations);
    outcome
}

fn describe_member_kind(kind: &MemberKind) -> String {
    match kind {
        MemberKind::EnumVariant { .. } => "an enum member".to_string(),
        MemberKind::Property { .. } => "a property".to_string(),
        MemberKind::Method { .. } => "a method".to_string(),
        MemberKind::Call { .. } => "a call signature".to_string(),
        MemberKind::Construct { .. } => "a construct signature".to_string(),
        MemberKind::Index { .. } => "an index signature".to_string(),
    }
}
