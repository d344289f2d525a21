//! Type references: the edges of the resolved type graph.
//!
//! References point at symbols by `SymbolId`, never by inlining the referenced
//! type, so cyclic declaration graphs are plain cycles in an index space and
//! resolution cannot recurse forever.

use crate::symbol::{LiteralValue, Member, Param, SymbolId};
use declmap_core::intern::{InternedString, StringInterner};

/// A built-in primitive type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Number,
    String,
    Boolean,
    Void,
    Any,
    Unknown,
    Never,
    Null,
    Undefined,
    Object,
    BigInt,
    Symbol,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Void => "void",
            Primitive::Any => "any",
            Primitive::Unknown => "unknown",
            Primitive::Never => "never",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::Object => "object",
            Primitive::BigInt => "bigint",
            Primitive::Symbol => "symbol",
        }
    }
}

/// Resolution state of a named reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    /// Not yet visited by the resolver.
    Pending,
    /// Points at a merged symbol.
    Resolved(SymbolId),
    /// Names a generic parameter in scope.
    TypeParameter,
    /// Not found anywhere in the corpus; the textual form is retained for
    /// diagnostics and for consumers that want to degrade to `unknown`.
    Unresolved,
}

/// A reference to a declared name: `ResourceColor`, `drawing.Lattice`, or
/// `import('../api/graphics').default.ColorFilter<T>`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRef {
    /// Module specifier of an `import('...')` type, if any.
    pub import_from: Option<String>,
    /// Dotted name parts; always at least one.
    pub parts: Vec<InternedString>,
    pub type_args: Vec<TypeRef>,
    pub target: RefTarget,
}

impl NamedRef {
    pub fn new(parts: Vec<InternedString>) -> Self {
        Self {
            import_from: None,
            parts,
            type_args: Vec::new(),
            target: RefTarget::Pending,
        }
    }

    /// The textual form of the reference, for diagnostics.
    pub fn display(&self, interner: &StringInterner) -> String {
        let dotted = self
            .parts
            .iter()
            .map(|p| interner.resolve(*p))
            .collect::<Vec<_>>()
            .join(".");
        match &self.import_from {
            Some(module) => format!("import('{}').{}", module, dotted),
            None => dotted,
        }
    }
}

/// A type reference in a member, heritage clause, or alias right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(Primitive),
    Named(NamedRef),
    Literal(LiteralValue),
    Union(Vec<TypeRef>),
    Intersection(Vec<TypeRef>),
    Array(Box<TypeRef>),
    Tuple(Vec<TypeRef>),
    Function {
        params: Vec<Param>,
        return_type: Box<TypeRef>,
    },
    Constructor {
        params: Vec<Param>,
        return_type: Box<TypeRef>,
    },
    /// An inline object type: `{ top?: Length; bottom?: Length }`.
    Object(Vec<Member>),
    /// `typeof X.Y` — resolves like a named reference.
    Query(NamedRef),
    KeyOf(Box<TypeRef>),
    IndexedAccess {
        object: Box<TypeRef>,
        index: Box<TypeRef>,
    },
    /// A template literal type kept in raw form, e.g. `${number}px`.
    Template(String),
}

impl TypeRef {
    /// Render a compact textual form for diagnostics.
    pub fn display(&self, interner: &StringInterner) -> String {
        match self {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Named(named) => {
                let mut text = named.display(interner);
                if !named.type_args.is_empty() {
                    let args = named
                        .type_args
                        .iter()
                        .map(|a| a.display(interner))
                        .collect::<Vec<_>>()
                        .join(", ");
                    text.push('<');
                    text.push_str(&args);
                    text.push('>');
                }
                text
            }
            TypeRef::Literal(value) => value.to_string(),
            TypeRef::Union(types) => types
                .iter()
                .map(|t| t.display(interner))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeRef::Intersection(types) => types
                .iter()
                .map(|t| t.display(interner))
                .collect::<Vec<_>>()
                .join(" & "),
            TypeRef::Array(element) => format!("{}[]", element.display(interner)),
            TypeRef::Tuple(types) => {
                let inner = types
                    .iter()
                    .map(|t| t.display(interner))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", inner)
            }
            TypeRef::Function { params, return_type } => {
                format!(
                    "({}) => {}",
                    display_params(params, interner),
                    return_type.display(interner)
                )
            }
            TypeRef::Constructor { params, return_type } => {
                format!(
                    "new ({}) => {}",
                    display_params(params, interner),
                    return_type.display(interner)
                )
            }
            TypeRef::Object(members) => format!("{{ {} members }}", members.len()),
            TypeRef::Query(named) => format!("typeof {}", named.display(interner)),
            TypeRef::KeyOf(target) => format!("keyof {}", target.display(interner)),
            TypeRef::IndexedAccess { object, index } => {
                format!("{}[{}]", object.display(interner), index.display(interner))
            }
            TypeRef::Template(text) => format!("`{}`", text),
        }
    }

    /// Whether this reference is a union containing every arm of `other`
    /// (treating a non-union as a single arm). Used for alias widening.
    pub fn is_widening_of(&self, other: &TypeRef) -> bool {
        let self_arms = self.union_arms();
        let other_arms = other.union_arms();
        other_arms
            .iter()
            .all(|arm| self_arms.iter().any(|own| own == arm))
    }

    fn union_arms(&self) -> Vec<&TypeRef> {
        match self {
            TypeRef::Union(types) => types.iter().collect(),
            other => vec![other],
        }
    }
}

fn display_params(params: &[Param], interner: &StringInterner) -> String {
    params
        .iter()
        .map(|p| {
            let ty = p
                .ty
                .as_ref()
                .map(|t| t.display(interner))
                .unwrap_or_else(|| "any".to_string());
            format!("{}: {}", interner.resolve(p.name), ty)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use declmap_core::intern::StringInterner;

    #[test]
    fn test_display_named_with_import() {
        let interner = StringInterner::new();
        let mut named = NamedRef::new(vec![interner.intern("default"), interner.intern("Lattice")]);
        named.import_from = Some("../api/@ohos.graphics.drawing".to_string());
        assert_eq!(
            named.display(&interner),
            "import('../api/@ohos.graphics.drawing').default.Lattice"
        );
    }

    #[test]
    fn test_union_display() {
        let interner = StringInterner::new();
        let union = TypeRef::Union(vec![
            TypeRef::Primitive(Primitive::String),
            TypeRef::Primitive(Primitive::Number),
        ]);
        assert_eq!(union.display(&interner), "string | number");
    }

    #[test]
    fn test_widening() {
        let a = TypeRef::Union(vec![
            TypeRef::Primitive(Primitive::String),
            TypeRef::Primitive(Primitive::Number),
        ]);
        let b = TypeRef::Primitive(Primitive::String);
        assert!(a.is_widening_of(&b));
        assert!(!b.is_widening_of(&a));

        let c = TypeRef::Union(vec![
            TypeRef::Primitive(Primitive::String),
            TypeRef::Primitive(Primitive::Boolean),
        ]);
        assert!(!a.is_widening_of(&c));
    }
}
