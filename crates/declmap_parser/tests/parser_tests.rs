//! Parser integration tests over fixture-shaped declaration sources.

use bumpalo::Bump;
use declmap_ast::node::*;
use declmap_ast::types::ModifierFlags;
use declmap_core::intern::StringInterner;
use declmap_diagnostics::DiagnosticCollection;
use declmap_parser::Parser;

fn parse<'a>(arena: &'a Bump, source: &str) -> (SourceFile<'a>, DiagnosticCollection) {
    let mut parser = Parser::new(arena, StringInterner::new(), "test.d.ts", source);
    let sf = parser.parse_source_file();
    let diagnostics = parser.take_diagnostics();
    (sf, diagnostics)
}

fn parse_clean<'a>(arena: &'a Bump, source: &str) -> SourceFile<'a> {
    let (sf, diagnostics) = parse(arena, source);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        diagnostics.diagnostics()
    );
    sf
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn test_enum_with_versioned_doc_blocks() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        r#"
/**
 * @enum { number }
 * @since 7
 */
/**
 * @enum { number }
 * @form
 * @since 9
 */
declare enum ImageRenderMode {
    /**
     * @since 7
     */
    /**
     * @since 9
     */
    Original,
    Template,
}
"#,
    );
    let Declaration::Enum(e) = &sf.declarations[0] else {
        panic!("expected enum");
    };
    assert_eq!(e.name.text_name, "ImageRenderMode");
    assert!(e.modifiers.contains(ModifierFlags::DECLARE));
    let names: Vec<&str> = e.members.iter().map(|m| m.name.text()).collect();
    assert_eq!(names, vec!["Original", "Template"]);
}

#[test]
fn test_enum_string_and_hex_values() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare enum Mode { Name = 'invert', Mask = 0xff, Neg = -2 }",
    );
    let Declaration::Enum(e) = &sf.declarations[0] else {
        panic!()
    };
    assert!(matches!(
        &e.members[0].initializer,
        Some(EnumInitializer::String { value, .. }) if value == "invert"
    ));
    assert!(matches!(
        e.members[1].initializer,
        Some(EnumInitializer::Number { value, .. }) if value == 255.0
    ));
    assert!(matches!(
        e.members[2].initializer,
        Some(EnumInitializer::Number { value, .. }) if value == -2.0
    ));
}

#[test]
fn test_const_enum_modifier() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare const enum Flag { A }");
    let Declaration::Enum(e) = &sf.declarations[0] else {
        panic!()
    };
    assert!(e.modifiers.contains(ModifierFlags::CONST));
}

#[test]
fn test_enum_non_literal_initializer_reports() {
    let arena = Bump::new();
    let (sf, diagnostics) = parse(&arena, "declare enum E { A = 1 + 2, B }");
    assert!(!diagnostics.is_empty());
    // Recovery keeps the member list intact.
    let Declaration::Enum(e) = &sf.declarations[0] else {
        panic!()
    };
    assert_eq!(e.members.len(), 2);
}

// ============================================================================
// Interfaces
// ============================================================================

#[test]
fn test_interface_members() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        r#"
declare interface ImageError {
    componentWidth: number;
    componentHeight?: number;
    readonly message: string;
    colorFilter(value: ColorFilter): void;
}
"#,
    );
    let Declaration::Interface(i) = &sf.declarations[0] else {
        panic!()
    };
    assert_eq!(i.members.len(), 4);
    let TypeMember::Property(width) = &i.members[0] else {
        panic!()
    };
    assert!(!width.optional && !width.readonly);
    let TypeMember::Property(height) = &i.members[1] else {
        panic!()
    };
    assert!(height.optional);
    let TypeMember::Property(message) = &i.members[2] else {
        panic!()
    };
    assert!(message.readonly);
    assert!(matches!(i.members[3], TypeMember::Method(_)));
}

#[test]
fn test_interface_extends_generic_base() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare interface ImageAttribute extends CommonMethod<ImageAttribute> { alt(value: string): ImageAttribute; }",
    );
    let Declaration::Interface(i) = &sf.declarations[0] else {
        panic!()
    };
    assert_eq!(i.heritage.len(), 1);
    let TypeNode::TypeReference(base) = &i.heritage[0] else {
        panic!()
    };
    assert_eq!(base.name_parts[0].text_name, "CommonMethod");
    assert_eq!(base.type_arguments.unwrap().len(), 1);
}

#[test]
fn test_property_named_with_keyword() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare interface R { type: number; default?: string; }");
    let Declaration::Interface(i) = &sf.declarations[0] else {
        panic!()
    };
    let TypeMember::Property(first) = &i.members[0] else {
        panic!()
    };
    assert_eq!(first.name.text(), "type");
    let TypeMember::Property(second) = &i.members[1] else {
        panic!()
    };
    assert_eq!(second.name.text(), "default");
}

#[test]
fn test_index_signature() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare interface M { [key: string]: number; }");
    let Declaration::Interface(i) = &sf.declarations[0] else {
        panic!()
    };
    let TypeMember::IndexSignature(index) = &i.members[0] else {
        panic!()
    };
    assert_eq!(index.parameter.name.text_name, "key");
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_ambient_class() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        r#"
declare class ImageAttribute extends CommonMethod<ImageAttribute> {
    constructor(src: string);
    static of(src: string): ImageAttribute;
    readonly width: number;
    alt(value: string | Resource): ImageAttribute;
}
"#,
    );
    let Declaration::Class(c) = &sf.declarations[0] else {
        panic!()
    };
    assert!(c.extends.is_some());
    assert_eq!(c.members.len(), 4);
    assert!(matches!(c.members[0], ClassMember::Constructor(_)));
    let ClassMember::Method(of) = &c.members[1] else {
        panic!()
    };
    assert!(of.modifiers.contains(ModifierFlags::STATIC));
    let ClassMember::Property(width) = &c.members[2] else {
        panic!()
    };
    assert!(width.modifiers.contains(ModifierFlags::READONLY));
}

// ============================================================================
// Type aliases and the type grammar
// ============================================================================

#[test]
fn test_union_alias_with_literals() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type ImageFit = 'contain' | 'cover' | 'auto' | 0 | false;",
    );
    let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
        panic!()
    };
    let TypeNode::Union(union) = alias.ty else {
        panic!()
    };
    assert_eq!(union.types.len(), 5);
    assert!(matches!(
        union.types[0],
        TypeNode::LiteralType(LiteralTypeNode { literal: TypeLiteralKind::String(_), .. })
    ));
    assert!(matches!(
        union.types[4],
        TypeNode::LiteralType(LiteralTypeNode { literal: TypeLiteralKind::Boolean(false), .. })
    ));
}

#[test]
fn test_object_type_alias() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        r#"
declare type Padding = {
    top?: Length;
    right?: Length;
    bottom?: Length;
    left?: Length;
};
"#,
    );
    let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
        panic!()
    };
    let TypeNode::TypeLiteral(literal) = alias.ty else {
        panic!()
    };
    assert_eq!(literal.members.len(), 4);
}

#[test]
fn test_template_literal_alias() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare type PX = `${number}px`;");
    let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
        panic!()
    };
    assert!(matches!(alias.ty, TypeNode::TemplateLiteral(_)));
}

#[test]
fn test_array_and_tuple_types() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type Matrix = number[];\ndeclare type Pair = [number, string];",
    );
    let Declaration::TypeAlias(matrix) = &sf.declarations[0] else {
        panic!()
    };
    assert!(matches!(matrix.ty, TypeNode::Array(_)));
    let Declaration::TypeAlias(pair) = &sf.declarations[1] else {
        panic!()
    };
    let TypeNode::Tuple(tuple) = pair.ty else {
        panic!()
    };
    assert_eq!(tuple.element_types.len(), 2);
}

#[test]
fn test_function_type_with_parameters() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type ImageErrorCallback = (error: ImageError) => void;",
    );
    let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
        panic!()
    };
    let TypeNode::Function(function) = alias.ty else {
        panic!()
    };
    assert_eq!(function.parameters.len(), 1);
    assert!(matches!(function.return_type, TypeNode::Keyword(_)));
}

#[test]
fn test_typeof_and_keyof() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type K = keyof Padding;\ndeclare type Q = typeof Image;",
    );
    let Declaration::TypeAlias(k) = &sf.declarations[0] else {
        panic!()
    };
    assert!(matches!(k.ty, TypeNode::TypeOperator(_)));
    let Declaration::TypeAlias(q) = &sf.declarations[1] else {
        panic!()
    };
    assert!(matches!(q.ty, TypeNode::TypeQuery(_)));
}

#[test]
fn test_generic_alias_with_constraint_and_default() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type Wrap<T extends Length = number> = T | T[];",
    );
    let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
        panic!()
    };
    let params = alias.type_parameters.unwrap();
    assert_eq!(params.len(), 1);
    assert!(params[0].constraint.is_some());
    assert!(params[0].default.is_some());
}

// ============================================================================
// Imports, exports, consts
// ============================================================================

#[test]
fn test_import_forms() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        r#"
import drawing from '../api/@ohos.graphics.drawing';
import { Resource, Length as Len } from './units';
import * as common from './common';
import type { Callback } from './callback';
"#,
    );
    assert!(sf.is_external_module);
    assert_eq!(sf.declarations.len(), 4);
    let Declaration::Import(default_import) = &sf.declarations[0] else {
        panic!()
    };
    assert_eq!(
        default_import.default_name.as_ref().unwrap().text_name,
        "drawing"
    );
    let Declaration::Import(named) = &sf.declarations[1] else {
        panic!()
    };
    assert_eq!(named.named.len(), 2);
    assert_eq!(named.named[1].property_name.as_ref().unwrap().text_name, "Length");
    assert_eq!(named.named[1].name.text_name, "Len");
    let Declaration::Import(namespace) = &sf.declarations[2] else {
        panic!()
    };
    assert_eq!(namespace.namespace_name.as_ref().unwrap().text_name, "common");
    let Declaration::Import(type_only) = &sf.declarations[3] else {
        panic!()
    };
    assert!(type_only.type_only);
}

#[test]
fn test_export_list_and_ambient_script_detection() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare enum A { X }\nexport { A };");
    assert!(sf.is_external_module);
    let Declaration::ExportList(list) = &sf.declarations[1] else {
        panic!()
    };
    assert_eq!(list.names[0].text_name, "A");

    let arena2 = Bump::new();
    let ambient = parse_clean(&arena2, "declare enum A { X }");
    assert!(!ambient.is_external_module);
}

#[test]
fn test_declare_const_with_interface_type() {
    let arena = Bump::new();
    let sf = parse_clean(&arena, "declare const Image: ImageInterface;");
    let Declaration::Const(c) = &sf.declarations[0] else {
        panic!()
    };
    assert_eq!(c.name.text_name, "Image");
    assert!(matches!(
        c.type_annotation.unwrap(),
        TypeNode::TypeReference(_)
    ));
}

// ============================================================================
// Recovery
// ============================================================================

#[test]
fn test_statements_are_rejected_but_recovered() {
    let arena = Bump::new();
    let (sf, diagnostics) = parse(
        &arena,
        "function run() {}\ndeclare enum Ok { A }",
    );
    assert!(!diagnostics.is_empty());
    assert!(sf
        .declarations
        .iter()
        .any(|d| matches!(d, Declaration::Enum(_))));
}

#[test]
fn test_missing_semicolons_tolerated() {
    let arena = Bump::new();
    let sf = parse_clean(
        &arena,
        "declare type A = number\ndeclare type B = string\n",
    );
    assert_eq!(sf.declarations.len(), 2);
}
