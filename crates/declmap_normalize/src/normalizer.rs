//! The normalizer walk: one declaration tree in, one `Module` out.

use declmap_ast::node::*;
use declmap_ast::syntax_kind::SyntaxKind;
use declmap_ast::types::ModifierFlags;
use declmap_core::collections::{FxIndexMap, FxMap};
use declmap_core::intern::{InternedString, StringInterner};
use declmap_core::text::TextSpan;
use declmap_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use declmap_table::{
    merge_member, DeclKind, GenericParam, LiteralValue, Member, MemberKind, MemberMergeOutcome,
    ModuleId, ModuleKind, NamedRef, Param, Primitive, Scope, Signature, SourceLocation, TypeRef,
};

use crate::module::{DraftSymbol, ImportTarget, Module};

/// Reserved member names for unnamed signatures, following the TypeScript
/// binder's convention.
pub const CALL_MEMBER: &str = "__call";
pub const CONSTRUCT_MEMBER: &str = "__new";
pub const INDEX_MEMBER: &str = "__index";

/// Normalize one parsed file into its draft-symbol module.
pub fn normalize_source_file(
    source: &SourceFile<'_>,
    module_id: ModuleId,
    interner: &StringInterner,
) -> (Module, DiagnosticCollection) {
    let path = interner.intern(&source.file_name);
    let (kind, scope) = if source.is_external_module {
        (ModuleKind::ExternalModule, Scope::Module(path))
    } else {
        (ModuleKind::AmbientScript, Scope::Global)
    };

    let mut normalizer = Normalizer {
        interner,
        module_id,
        file_name: &source.file_name,
        scope,
        diagnostics: DiagnosticCollection::new(),
    };

    let mut imports: FxMap<InternedString, ImportTarget> = FxMap::default();
    let mut drafts: Vec<DraftSymbol> = Vec::new();
    let mut exported_names: Vec<InternedString> = Vec::new();

    for declaration in source.declarations {
        match declaration {
            Declaration::Enum(decl) => drafts.push(normalizer.normalize_enum(decl)),
            Declaration::Interface(decl) => drafts.push(normalizer.normalize_interface(decl)),
            Declaration::Class(decl) => drafts.push(normalizer.normalize_class(decl)),
            Declaration::TypeAlias(decl) => drafts.push(normalizer.normalize_type_alias(decl)),
            Declaration::Const(decl) => drafts.push(normalizer.normalize_const(decl)),
            Declaration::Import(decl) => normalizer.collect_imports(decl, &mut imports),
            Declaration::ExportList(decl) => {
                exported_names.extend(decl.names.iter().map(|n| n.text));
            }
        }
    }

    // `export { A };` marks the already-collected declaration exported.
    for draft in &mut drafts {
        if exported_names.contains(&draft.name) {
            draft.exported = true;
        }
    }

    let module = Module {
        id: module_id,
        path,
        kind,
        scope,
        imports,
        drafts,
    };
    (module, normalizer.diagnostics)
}

struct Normalizer<'n> {
    interner: &'n StringInterner,
    module_id: ModuleId,
    file_name: &'n str,
    scope: Scope,
    diagnostics: DiagnosticCollection,
}

impl<'n> Normalizer<'n> {
    fn location(&self, span: TextSpan) -> SourceLocation {
        SourceLocation {
            module: self.module_id,
            span,
        }
    }

    fn draft(
        &self,
        name: InternedString,
        kind: DeclKind,
        modifiers: ModifierFlags,
        span: TextSpan,
    ) -> DraftSymbol {
        DraftSymbol {
            scope: self.scope,
            name,
            kind,
            exported: modifiers.contains(ModifierFlags::EXPORT),
            location: self.location(span),
            generics: Vec::new(),
            members: FxIndexMap::default(),
            heritage: Vec::new(),
            ty: None,
            tainted: false,
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn normalize_enum(&mut self, decl: &EnumDeclaration<'_>) -> DraftSymbol {
        let mut draft = self.draft(decl.name.text, DeclKind::Enum, decl.modifiers, decl.data.span);

        for member in decl.members {
            let name = self.interner.intern(member.name.text());
            let value = member.initializer.as_ref().map(|init| match init {
                EnumInitializer::Number { value, .. } => LiteralValue::Number(*value),
                EnumInitializer::String { value, .. } => LiteralValue::String(value.clone()),
            });
            let incoming = Member {
                name,
                kind: MemberKind::EnumVariant { value },
                locations: vec![self.location(member.data.span)],
            };
            // The corpus re-declares the same member once per SDK version;
            // identical re-declarations collapse, value disagreement within
            // one body is already a fatal ambiguity for the symbol.
            if let Some(existing) = draft.members.get_mut(&name) {
                let first_span = existing.locations[0].span;
                match merge_member(existing, incoming, self.interner) {
                    MemberMergeOutcome::Merged => {}
                    MemberMergeOutcome::Conflict { .. } => {
                        draft.tainted = true;
                        let member_name = self.interner.resolve(name).to_string();
                        let diagnostic = Diagnostic::with_location(
                            self.file_name.to_string(),
                            member.data.span,
                            &messages::DUPLICATE_ENUM_MEMBER_0,
                            &[&member_name],
                        )
                        .with_related(Diagnostic::with_location(
                            self.file_name.to_string(),
                            first_span,
                            &messages::CONFLICTING_DECLARATION_HERE,
                            &[&member_name],
                        ));
                        self.diagnostics.add(diagnostic);
                    }
                }
            } else {
                draft.members.insert(name, incoming);
            }
        }
        draft
    }

    fn normalize_interface(&mut self, decl: &InterfaceDeclaration<'_>) -> DraftSymbol {
        let mut draft = self.draft(
            decl.name.text,
            DeclKind::Interface,
            decl.modifiers,
            decl.data.span,
        );
        draft.generics = self.convert_generics(decl.type_parameters);
        draft.heritage = decl.heritage.iter().map(|t| self.convert_type(t)).collect();

        for member in decl.members {
            if let Some(converted) = self.convert_type_member(member) {
                self.add_member(&mut draft.members, converted, &mut draft.tainted);
            }
        }
        draft
    }

    fn normalize_class(&mut self, decl: &ClassDeclaration<'_>) -> DraftSymbol {
        let mut draft = self.draft(
            decl.name.text,
            DeclKind::Class,
            decl.modifiers,
            decl.data.span,
        );
        draft.generics = self.convert_generics(decl.type_parameters);
        if let Some(extends) = decl.extends {
            draft.heritage.push(self.convert_type(extends));
        }
        for implemented in decl.implements {
            draft.heritage.push(self.convert_type(implemented));
        }

        for member in decl.members {
            let converted = match member {
                ClassMember::Property(prop) => Member {
                    name: self.interner.intern(prop.name.text()),
                    kind: MemberKind::Property {
                        ty: prop.type_annotation.map(|t| self.convert_type(t)),
                        optional: prop.optional,
                        readonly: prop.modifiers.contains(ModifierFlags::READONLY),
                    },
                    locations: vec![self.location(prop.data.span)],
                },
                ClassMember::Method(method) => Member {
                    name: self.interner.intern(method.name.text()),
                    kind: MemberKind::Method {
                        signatures: vec![self.convert_signature(
                            method.type_parameters,
                            method.parameters,
                            method.return_type,
                        )],
                    },
                    locations: vec![self.location(method.data.span)],
                },
                ClassMember::Constructor(ctor) => Member {
                    name: self.interner.intern(CONSTRUCT_MEMBER),
                    kind: MemberKind::Construct {
                        signatures: vec![self.convert_signature(None, ctor.parameters, None)],
                    },
                    locations: vec![self.location(ctor.data.span)],
                },
                ClassMember::IndexSignature(index) => self.convert_index_signature(index),
            };
            self.add_member(&mut draft.members, converted, &mut draft.tainted);
        }
        draft
    }

    fn normalize_type_alias(&mut self, decl: &TypeAliasDeclaration<'_>) -> DraftSymbol {
        let mut draft = self.draft(
            decl.name.text,
            DeclKind::TypeAlias,
            decl.modifiers,
            decl.data.span,
        );
        draft.generics = self.convert_generics(decl.type_parameters);
        draft.ty = Some(self.convert_type(decl.ty));
        draft
    }

    fn normalize_const(&mut self, decl: &ConstDeclaration<'_>) -> DraftSymbol {
        let mut draft = self.draft(
            decl.name.text,
            DeclKind::Const,
            decl.modifiers,
            decl.data.span,
        );
        draft.ty = decl.type_annotation.map(|t| self.convert_type(t));
        draft
    }

    fn collect_imports(
        &mut self,
        decl: &ImportDeclaration<'_>,
        imports: &mut FxMap<InternedString, ImportTarget>,
    ) {
        if let Some(default_name) = &decl.default_name {
            imports.insert(
                default_name.text,
                ImportTarget {
                    module: decl.module_specifier.clone(),
                    exported: self.interner.intern("default"),
                    namespace: false,
                },
            );
        }
        if let Some(namespace_name) = &decl.namespace_name {
            imports.insert(
                namespace_name.text,
                ImportTarget {
                    module: decl.module_specifier.clone(),
                    exported: self.interner.intern(""),
                    namespace: true,
                },
            );
        }
        for specifier in decl.named {
            let exported = specifier
                .property_name
                .as_ref()
                .map(|p| p.text)
                .unwrap_or(specifier.name.text);
            imports.insert(
                specifier.name.text,
                ImportTarget {
                    module: decl.module_specifier.clone(),
                    exported,
                    namespace: false,
                },
            );
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    fn add_member(
        &mut self,
        members: &mut FxIndexMap<InternedString, Member>,
        incoming: Member,
        tainted: &mut bool,
    ) {
        let name = incoming.name;
        if let Some(existing) = members.get_mut(&name) {
            let first_span = existing.locations[0].span;
            let incoming_span = incoming.locations[0].span;
            match merge_member(existing, incoming, self.interner) {
                MemberMergeOutcome::Merged => {}
                MemberMergeOutcome::Conflict {
                    existing: existing_text,
                    incoming: incoming_text,
                } => {
                    *tainted = true;
                    let member_name = self.interner.resolve(name).to_string();
                    let diagnostic = Diagnostic::with_location(
                        self.file_name.to_string(),
                        incoming_span,
                        &messages::PROPERTY_0_HAS_CONFLICTING_TYPES,
                        &[&member_name, &existing_text, &incoming_text],
                    )
                    .with_related(Diagnostic::with_location(
                        self.file_name.to_string(),
                        first_span,
                        &messages::CONFLICTING_DECLARATION_HERE,
                        &[&member_name],
                    ));
                    self.diagnostics.add(diagnostic);
                }
            }
        } else {
            members.insert(name, incoming);
        }
    }

    fn convert_type_member(&mut self, member: &TypeMember<'_>) -> Option<Member> {
        Some(match member {
            TypeMember::Property(prop) => Member {
                name: self.interner.intern(prop.name.text()),
                kind: MemberKind::Property {
                    ty: prop.type_annotation.map(|t| self.convert_type(t)),
                    optional: prop.optional,
                    readonly: prop.readonly,
                },
                locations: vec![self.location(prop.data.span)],
            },
            TypeMember::Method(method) => Member {
                name: self.interner.intern(method.name.text()),
                kind: MemberKind::Method {
                    signatures: vec![self.convert_signature(
                        method.type_parameters,
                        method.parameters,
                        method.return_type,
                    )],
                },
                locations: vec![self.location(method.data.span)],
            },
            TypeMember::CallSignature(sig) => Member {
                name: self.interner.intern(CALL_MEMBER),
                kind: MemberKind::Call {
                    signatures: vec![self.convert_signature(
                        sig.type_parameters,
                        sig.parameters,
                        sig.return_type,
                    )],
                },
                locations: vec![self.location(sig.data.span)],
            },
            TypeMember::ConstructSignature(sig) => Member {
                name: self.interner.intern(CONSTRUCT_MEMBER),
                kind: MemberKind::Construct {
                    signatures: vec![self.convert_signature(
                        sig.type_parameters,
                        sig.parameters,
                        sig.return_type,
                    )],
                },
                locations: vec![self.location(sig.data.span)],
            },
            TypeMember::IndexSignature(index) => self.convert_index_signature(index),
        })
    }

    fn convert_index_signature(&mut self, index: &IndexSignatureDeclaration<'_>) -> Member {
        Member {
            name: self.interner.intern(INDEX_MEMBER),
            kind: MemberKind::Index {
                key: index.parameter.type_annotation.map(|t| self.convert_type(t)),
                ty: self.convert_type(index.type_annotation),
            },
            locations: vec![self.location(index.data.span)],
        }
    }

    fn convert_signature(
        &mut self,
        type_parameters: Option<&[TypeParameterDeclaration<'_>]>,
        parameters: &[ParameterDeclaration<'_>],
        return_type: Option<&TypeNode<'_>>,
    ) -> Signature {
        Signature {
            type_params: self.convert_generics(type_parameters),
            params: parameters.iter().map(|p| self.convert_param(p)).collect(),
            return_type: return_type.map(|t| self.convert_type(t)),
        }
    }

    fn convert_param(&mut self, param: &ParameterDeclaration<'_>) -> Param {
        Param {
            name: param.name.text,
            ty: param.type_annotation.map(|t| self.convert_type(t)),
            optional: param.optional,
            rest: param.dot_dot_dot,
        }
    }

    fn convert_generics(
        &mut self,
        type_parameters: Option<&[TypeParameterDeclaration<'_>]>,
    ) -> Vec<GenericParam> {
        type_parameters
            .unwrap_or(&[])
            .iter()
            .map(|tp| GenericParam {
                name: tp.name.text,
                constraint: tp.constraint.map(|t| self.convert_type(t)),
                default: tp.default.map(|t| self.convert_type(t)),
            })
            .collect()
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn convert_type(&mut self, node: &TypeNode<'_>) -> TypeRef {
        match node {
            TypeNode::Keyword(keyword) => {
                TypeRef::Primitive(primitive_from_kind(keyword.data.kind))
            }
            TypeNode::TypeReference(reference) => {
                let mut named = NamedRef::new(
                    reference.name_parts.iter().map(|p| p.text).collect(),
                );
                named.type_args = reference
                    .type_arguments
                    .unwrap_or(&[])
                    .iter()
                    .map(|t| self.convert_type(t))
                    .collect();
                TypeRef::Named(named)
            }
            TypeNode::ImportType(import) => {
                let mut named =
                    NamedRef::new(import.qualifier.iter().map(|p| p.text).collect());
                named.import_from = Some(import.module_specifier.clone());
                named.type_args = import
                    .type_arguments
                    .unwrap_or(&[])
                    .iter()
                    .map(|t| self.convert_type(t))
                    .collect();
                TypeRef::Named(named)
            }
            TypeNode::LiteralType(literal) => TypeRef::Literal(match &literal.literal {
                TypeLiteralKind::String(s) => LiteralValue::String(s.clone()),
                TypeLiteralKind::Number(n) => LiteralValue::Number(*n),
                TypeLiteralKind::Boolean(b) => LiteralValue::Boolean(*b),
            }),
            TypeNode::Union(union) => {
                TypeRef::Union(union.types.iter().map(|t| self.convert_type(t)).collect())
            }
            TypeNode::Intersection(intersection) => TypeRef::Intersection(
                intersection
                    .types
                    .iter()
                    .map(|t| self.convert_type(t))
                    .collect(),
            ),
            TypeNode::Array(array) => {
                TypeRef::Array(Box::new(self.convert_type(array.element_type)))
            }
            TypeNode::Tuple(tuple) => TypeRef::Tuple(
                tuple
                    .element_types
                    .iter()
                    .map(|t| self.convert_type(t))
                    .collect(),
            ),
            TypeNode::Function(function) => TypeRef::Function {
                params: function
                    .parameters
                    .iter()
                    .map(|p| self.convert_param(p))
                    .collect(),
                return_type: Box::new(self.convert_type(function.return_type)),
            },
            TypeNode::Constructor(ctor) => TypeRef::Constructor {
                params: ctor
                    .parameters
                    .iter()
                    .map(|p| self.convert_param(p))
                    .collect(),
                return_type: Box::new(self.convert_type(ctor.return_type)),
            },
            TypeNode::TypeLiteral(literal) => {
                let mut members: Vec<Member> = Vec::new();
                for raw in literal.members {
                    let Some(converted) = self.convert_type_member(raw) else {
                        continue;
                    };
                    if let Some(existing) =
                        members.iter_mut().find(|m| m.name == converted.name)
                    {
                        // Inline object types never merge across files; fold
                        // overloads, ignore the rest.
                        let _ = merge_member(existing, converted, self.interner);
                    } else {
                        members.push(converted);
                    }
                }
                TypeRef::Object(members)
            }
            TypeNode::Parenthesized(paren) => self.convert_type(paren.inner),
            TypeNode::TypeQuery(query) => TypeRef::Query(NamedRef::new(
                query.expr_name.iter().map(|p| p.text).collect(),
            )),
            TypeNode::TypeOperator(operator) => {
                let target = self.convert_type(operator.target);
                if operator.operator == SyntaxKind::KeyofKeyword {
                    TypeRef::KeyOf(Box::new(target))
                } else {
                    // `readonly T[]` carries no extra type information here.
                    target
                }
            }
            TypeNode::IndexedAccess(access) => TypeRef::IndexedAccess {
                object: Box::new(self.convert_type(access.object_type)),
                index: Box::new(self.convert_type(access.index_type)),
            },
            TypeNode::TemplateLiteral(template) => TypeRef::Template(template.text.clone()),
        }
    }
}

fn primitive_from_kind(kind: SyntaxKind) -> Primitive {
    match kind {
        SyntaxKind::StringKeyword => Primitive::String,
        SyntaxKind::NumberKeyword => Primitive::Number,
        SyntaxKind::BooleanKeyword => Primitive::Boolean,
        SyntaxKind::VoidKeyword => Primitive::Void,
        SyntaxKind::UnknownKeyword => Primitive::Unknown,
        SyntaxKind::NeverKeyword => Primitive::Never,
        SyntaxKind::NullKeyword => Primitive::Null,
        SyntaxKind::UndefinedKeyword => Primitive::Undefined,
        SyntaxKind::ObjectKeyword => Primitive::Object,
        SyntaxKind::BigIntKeyword => Primitive::BigInt,
        SyntaxKind::SymbolKeyword => Primitive::Symbol,
        _ => Primitive::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use declmap_parser::Parser;

    fn normalize(src: &str) -> (Module, DiagnosticCollection, StringInterner) {
        let interner = StringInterner::new();
        let arena = Bump::new();
        let mut parser = Parser::new(&arena, interner.clone(), "test.d.ts", src);
        let sf = parser.parse_source_file();
        let (module, diags) = normalize_source_file(&sf, ModuleId(0), &interner);
        (module, diags, interner)
    }

    #[test]
    fn test_ambient_script_scope_is_global() {
        let (module, diags, _) = normalize("declare enum Color { White }");
        assert!(diags.is_empty());
        assert_eq!(module.kind, ModuleKind::AmbientScript);
        assert_eq!(module.drafts[0].scope, Scope::Global);
    }

    #[test]
    fn test_module_scope_with_import() {
        let (module, _, interner) = normalize(
            "import { Resource } from './resource';\nexport declare enum Color { White }",
        );
        assert_eq!(module.kind, ModuleKind::ExternalModule);
        assert!(matches!(module.drafts[0].scope, Scope::Module(_)));
        assert!(module.drafts[0].exported);
        let resource = interner.intern("Resource");
        assert_eq!(module.imports[&resource].module, "./resource");
    }

    #[test]
    fn test_duplicate_identical_enum_member_collapses() {
        let (module, diags, _) = normalize("declare enum E { A = 1, A = 1 }");
        assert!(diags.is_empty());
        assert_eq!(module.drafts[0].members.len(), 1);
        assert!(!module.drafts[0].tainted);
    }

    #[test]
    fn test_duplicate_conflicting_enum_member_taints() {
        let (module, diags, _) = normalize("declare enum E { A = 0, A = 1 }");
        assert_eq!(diags.len(), 1);
        assert!(module.drafts[0].tainted);
        let diagnostic = &diags.diagnostics()[0];
        assert_eq!(diagnostic.code, messages::DUPLICATE_ENUM_MEMBER_0.code);
        assert_eq!(diagnostic.related_information.len(), 1);
    }

    #[test]
    fn test_method_overloads_accumulate() {
        let (module, diags, interner) = normalize(
            "declare interface Attr { width(value: number): Attr; width(value: string): Attr; }",
        );
        assert!(diags.is_empty());
        let width = interner.intern("width");
        let member = &module.drafts[0].members[&width];
        let MemberKind::Method { signatures } = &member.kind else {
            panic!("expected method");
        };
        assert_eq!(signatures.len(), 2);
    }

    #[test]
    fn test_call_signature_reserved_name() {
        let (module, _, interner) =
            normalize("interface I { (src: string): number; }");
        let call = interner.intern(CALL_MEMBER);
        assert!(module.drafts[0].members.contains_key(&call));
    }

    #[test]
    fn test_const_carries_declared_type() {
        let (module, _, _) = normalize("declare const Image: ImageInterface;");
        let draft = &module.drafts[0];
        assert_eq!(draft.kind, DeclKind::Const);
        assert!(matches!(draft.ty, Some(TypeRef::Named(_))));
    }

    #[test]
    fn test_docs_do_not_reach_the_model() {
        let with_docs = "/** @since 7 */ declare enum E { /** @since 7 */ A }";
        let without_docs = "declare enum E { A }";
        let (a, _, _) = normalize(with_docs);
        let (b, _, _) = normalize(without_docs);
        assert_eq!(a.drafts[0].members.len(), b.drafts[0].members.len());
        assert_eq!(a.drafts[0].name, b.drafts[0].name);
    }
}
