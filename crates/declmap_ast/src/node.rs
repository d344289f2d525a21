//! AST node definitions for the ambient declaration grammar.
//!
//! Node lists are arena-allocated slices; the tree for one file is dropped
//! wholesale once normalization has extracted its draft symbols.

use crate::syntax_kind::SyntaxKind;
use crate::types::ModifierFlags;
use declmap_core::intern::InternedString;
use declmap_core::text::TextSpan;

// ============================================================================
// Core node wrapper
// ============================================================================

/// Common data shared by all AST nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeData {
    /// The kind of this node.
    pub kind: SyntaxKind,
    /// Source position span.
    pub span: TextSpan,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, pos: u32, end: u32) -> Self {
        Self {
            kind,
            span: TextSpan::from_bounds(pos, end),
        }
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

// ============================================================================
// Source file
// ============================================================================

#[derive(Debug)]
pub struct SourceFile<'a> {
    pub data: NodeData,
    pub declarations: NodeList<'a, Declaration<'a>>,
    pub file_name: String,
    /// Whether any top-level import/export makes this file a module rather
    /// than an ambient script.
    pub is_external_module: bool,
}

// ============================================================================
// Identifier
// ============================================================================

#[derive(Debug, Clone)]
pub struct Identifier {
    pub data: NodeData,
    /// The interned text of this identifier.
    pub text: InternedString,
    /// The actual text of this identifier as a plain string.
    pub text_name: String,
}

/// A declaration member name: a plain identifier or a quoted string.
#[derive(Debug, Clone)]
pub enum PropertyName {
    Identifier(Identifier),
    StringLiteral { data: NodeData, text: String },
}

impl PropertyName {
    pub fn text(&self) -> &str {
        match self {
            PropertyName::Identifier(id) => &id.text_name,
            PropertyName::StringLiteral { text, .. } => text,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            PropertyName::Identifier(id) => id.data.span,
            PropertyName::StringLiteral { data, .. } => data.span,
        }
    }
}

// ============================================================================
// Top-level declarations
// ============================================================================

#[derive(Debug)]
pub enum Declaration<'a> {
    Enum(EnumDeclaration<'a>),
    Interface(InterfaceDeclaration<'a>),
    Class(ClassDeclaration<'a>),
    TypeAlias(TypeAliasDeclaration<'a>),
    Const(ConstDeclaration<'a>),
    Import(ImportDeclaration<'a>),
    ExportList(ExportListDeclaration<'a>),
}

impl<'a> Declaration<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            Declaration::Enum(n) => n.data.span,
            Declaration::Interface(n) => n.data.span,
            Declaration::Class(n) => n.data.span,
            Declaration::TypeAlias(n) => n.data.span,
            Declaration::Const(n) => n.data.span,
            Declaration::Import(n) => n.data.span,
            Declaration::ExportList(n) => n.data.span,
        }
    }
}

#[derive(Debug)]
pub struct EnumDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: Identifier,
    pub members: NodeList<'a, EnumMember>,
}

/// A literal enum member initializer. Ambient enums only admit number and
/// string literal initializers.
#[derive(Debug, Clone)]
pub enum EnumInitializer {
    Number { span: TextSpan, value: f64 },
    String { span: TextSpan, value: String },
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub data: NodeData,
    pub name: PropertyName,
    pub initializer: Option<EnumInitializer>,
}

#[derive(Debug)]
pub struct InterfaceDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: Identifier,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    /// Extends clause entries (type references).
    pub heritage: NodeList<'a, TypeNode<'a>>,
    pub members: NodeList<'a, TypeMember<'a>>,
}

#[derive(Debug)]
pub struct ClassDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: Identifier,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub extends: Option<&'a TypeNode<'a>>,
    pub implements: NodeList<'a, TypeNode<'a>>,
    pub members: NodeList<'a, ClassMember<'a>>,
}

#[derive(Debug)]
pub struct TypeAliasDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: Identifier,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub ty: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct ConstDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: Identifier,
    pub type_annotation: Option<&'a TypeNode<'a>>,
}

#[derive(Debug)]
pub struct ImportDeclaration<'a> {
    pub data: NodeData,
    /// The quoted module specifier.
    pub module_specifier: String,
    /// `import Default from '...'`.
    pub default_name: Option<Identifier>,
    /// `import * as NS from '...'`.
    pub namespace_name: Option<Identifier>,
    /// `import { A, B as C } from '...'`.
    pub named: NodeList<'a, ImportSpecifier>,
    /// `import type ...`.
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct ImportSpecifier {
    pub data: NodeData,
    /// The exported name in the source module (`A` in `A as C`), if renamed.
    pub property_name: Option<Identifier>,
    /// The local binding name.
    pub name: Identifier,
}

/// `export { A, B };` — marks already-declared symbols as exported.
#[derive(Debug)]
pub struct ExportListDeclaration<'a> {
    pub data: NodeData,
    pub names: NodeList<'a, Identifier>,
}

#[derive(Debug)]
pub struct TypeParameterDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier,
    pub constraint: Option<&'a TypeNode<'a>>,
    pub default: Option<&'a TypeNode<'a>>,
}

// ============================================================================
// Interface / type-literal members
// ============================================================================

#[derive(Debug)]
pub enum TypeMember<'a> {
    Property(PropertySignature<'a>),
    Method(MethodSignature<'a>),
    CallSignature(SignatureDeclaration<'a>),
    ConstructSignature(SignatureDeclaration<'a>),
    IndexSignature(IndexSignatureDeclaration<'a>),
}

impl<'a> TypeMember<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            TypeMember::Property(n) => n.data.span,
            TypeMember::Method(n) => n.data.span,
            TypeMember::CallSignature(n) => n.data.span,
            TypeMember::ConstructSignature(n) => n.data.span,
            TypeMember::IndexSignature(n) => n.data.span,
        }
    }
}

#[derive(Debug)]
pub struct PropertySignature<'a> {
    pub data: NodeData,
    pub name: PropertyName,
    pub optional: bool,
    pub readonly: bool,
    pub type_annotation: Option<&'a TypeNode<'a>>,
}

#[derive(Debug)]
pub struct MethodSignature<'a> {
    pub data: NodeData,
    pub name: PropertyName,
    pub optional: bool,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
    pub return_type: Option<&'a TypeNode<'a>>,
}

/// A bare call or construct signature: `(src: string): Attribute;`.
#[derive(Debug)]
pub struct SignatureDeclaration<'a> {
    pub data: NodeData,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
    pub return_type: Option<&'a TypeNode<'a>>,
}

#[derive(Debug)]
pub struct IndexSignatureDeclaration<'a> {
    pub data: NodeData,
    pub parameter: &'a ParameterDeclaration<'a>,
    pub type_annotation: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct ParameterDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier,
    pub optional: bool,
    pub dot_dot_dot: bool,
    pub type_annotation: Option<&'a TypeNode<'a>>,
}

// ============================================================================
// Class members
// ============================================================================

#[derive(Debug)]
pub enum ClassMember<'a> {
    Property(PropertyDeclaration<'a>),
    Method(MethodDeclaration<'a>),
    Constructor(ConstructorDeclaration<'a>),
    IndexSignature(IndexSignatureDeclaration<'a>),
}

impl<'a> ClassMember<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            ClassMember::Property(n) => n.data.span,
            ClassMember::Method(n) => n.data.span,
            ClassMember::Constructor(n) => n.data.span,
            ClassMember::IndexSignature(n) => n.data.span,
        }
    }
}

#[derive(Debug)]
pub struct PropertyDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: PropertyName,
    pub optional: bool,
    pub type_annotation: Option<&'a TypeNode<'a>>,
}

#[derive(Debug)]
pub struct MethodDeclaration<'a> {
    pub data: NodeData,
    pub modifiers: ModifierFlags,
    pub name: PropertyName,
    pub optional: bool,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
    pub return_type: Option<&'a TypeNode<'a>>,
}

#[derive(Debug)]
pub struct ConstructorDeclaration<'a> {
    pub data: NodeData,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
}

// ============================================================================
// Type nodes
// ============================================================================

#[derive(Debug)]
pub enum TypeNode<'a> {
    Keyword(KeywordTypeNode),
    TypeReference(TypeReferenceNode<'a>),
    ImportType(ImportTypeNode<'a>),
    LiteralType(LiteralTypeNode),
    Union(UnionTypeNode<'a>),
    Intersection(IntersectionTypeNode<'a>),
    Array(ArrayTypeNode<'a>),
    Tuple(TupleTypeNode<'a>),
    Function(FunctionTypeNode<'a>),
    Constructor(ConstructorTypeNode<'a>),
    TypeLiteral(TypeLiteralNode<'a>),
    Parenthesized(ParenthesizedTypeNode<'a>),
    TypeQuery(TypeQueryNode<'a>),
    TypeOperator(TypeOperatorNode<'a>),
    IndexedAccess(IndexedAccessTypeNode<'a>),
    TemplateLiteral(TemplateLiteralTypeNode),
}

impl<'a> TypeNode<'a> {
    pub fn span(&self) -> TextSpan {
        match self {
            TypeNode::Keyword(n) => n.data.span,
            TypeNode::TypeReference(n) => n.data.span,
            TypeNode::ImportType(n) => n.data.span,
            TypeNode::LiteralType(n) => n.data.span,
            TypeNode::Union(n) => n.data.span,
            TypeNode::Intersection(n) => n.data.span,
            TypeNode::Array(n) => n.data.span,
            TypeNode::Tuple(n) => n.data.span,
            TypeNode::Function(n) => n.data.span,
            TypeNode::Constructor(n) => n.data.span,
            TypeNode::TypeLiteral(n) => n.data.span,
            TypeNode::Parenthesized(n) => n.data.span,
            TypeNode::TypeQuery(n) => n.data.span,
            TypeNode::TypeOperator(n) => n.data.span,
            TypeNode::IndexedAccess(n) => n.data.span,
            TypeNode::TemplateLiteral(n) => n.data.span,
        }
    }
}

/// A primitive keyword type; the primitive is identified by `data.kind`.
#[derive(Debug)]
pub struct KeywordTypeNode {
    pub data: NodeData,
}

#[derive(Debug)]
pub struct TypeReferenceNode<'a> {
    pub data: NodeData,
    /// Dotted name parts: `A.B.C` is three parts.
    pub name_parts: NodeList<'a, Identifier>,
    pub type_arguments: Option<NodeList<'a, TypeNode<'a>>>,
}

/// `import('module/path').A.B<T>`.
#[derive(Debug)]
pub struct ImportTypeNode<'a> {
    pub data: NodeData,
    pub module_specifier: String,
    pub qualifier: NodeList<'a, Identifier>,
    pub type_arguments: Option<NodeList<'a, TypeNode<'a>>>,
}

#[derive(Debug, Clone)]
pub enum TypeLiteralKind {
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Debug)]
pub struct LiteralTypeNode {
    pub data: NodeData,
    pub literal: TypeLiteralKind,
}

#[derive(Debug)]
pub struct UnionTypeNode<'a> {
    pub data: NodeData,
    pub types: NodeList<'a, TypeNode<'a>>,
}

#[derive(Debug)]
pub struct IntersectionTypeNode<'a> {
    pub data: NodeData,
    pub types: NodeList<'a, TypeNode<'a>>,
}

#[derive(Debug)]
pub struct ArrayTypeNode<'a> {
    pub data: NodeData,
    pub element_type: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct TupleTypeNode<'a> {
    pub data: NodeData,
    pub element_types: NodeList<'a, TypeNode<'a>>,
}

#[derive(Debug)]
pub struct FunctionTypeNode<'a> {
    pub data: NodeData,
    pub type_parameters: Option<NodeList<'a, TypeParameterDeclaration<'a>>>,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
    pub return_type: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct ConstructorTypeNode<'a> {
    pub data: NodeData,
    pub parameters: NodeList<'a, ParameterDeclaration<'a>>,
    pub return_type: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct TypeLiteralNode<'a> {
    pub data: NodeData,
    pub members: NodeList<'a, TypeMember<'a>>,
}

#[derive(Debug)]
pub struct ParenthesizedTypeNode<'a> {
    pub data: NodeData,
    pub inner: &'a TypeNode<'a>,
}

/// `typeof X.Y`.
#[derive(Debug)]
pub struct TypeQueryNode<'a> {
    pub data: NodeData,
    pub expr_name: NodeList<'a, Identifier>,
}

/// `keyof T` / `readonly T`.
#[derive(Debug)]
pub struct TypeOperatorNode<'a> {
    pub data: NodeData,
    pub operator: SyntaxKind,
    pub target: &'a TypeNode<'a>,
}

#[derive(Debug)]
pub struct IndexedAccessTypeNode<'a> {
    pub data: NodeData,
    pub object_type: &'a TypeNode<'a>,
    pub index_type: &'a TypeNode<'a>,
}

/// A template literal type such as `` `${number}px` ``, kept in raw form:
/// the corpus only uses these as opaque dimension brands.
#[derive(Debug)]
pub struct TemplateLiteralTypeNode {
    pub data: NodeData,
    pub text: String,
}
