//! The declaration parser implementation.
//!
//! A recursive descent parser over the ambient-declaration grammar: top-level
//! `declare` enums, interfaces, classes, type aliases and consts, import and
//! export-list declarations, and the type expression grammar they reference.
//! On an unparsable declaration it records a defect and skips to the next
//! plausible declaration start; whether the whole file is then excluded is the
//! pipeline's decision.

use bumpalo::Bump;
use declmap_ast::node::*;
use declmap_ast::syntax_kind::SyntaxKind;
use declmap_ast::types::*;
use declmap_core::intern::StringInterner;
use declmap_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use declmap_scanner::Scanner;

/// The parser produces a SourceFile tree from declaration source text.
pub struct Parser<'a> {
    arena: &'a Bump,
    scanner: Scanner,
    interner: StringInterner,
    file_name: String,
    diagnostics: DiagnosticCollection,
    /// End position of the most recently consumed token.
    prev_end: u32,
    /// Set when a top-level import/export is seen.
    is_external_module: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        arena: &'a Bump,
        interner: StringInterner,
        file_name: &str,
        source_text: &str,
    ) -> Self {
        Self {
            arena,
            scanner: Scanner::new(source_text),
            interner,
            file_name: file_name.to_string(),
            diagnostics: DiagnosticCollection::new(),
            prev_end: 0,
            is_external_module: false,
        }
    }

    /// Parse the whole file into a declaration tree.
    pub fn parse_source_file(&mut self) -> SourceFile<'a> {
        self.next_token();
        let declarations = self.parse_declarations();
        let end = self.scanner.text_len() as u32;

        SourceFile {
            data: NodeData::new(SyntaxKind::SourceFile, 0, end),
            declarations,
            file_name: self.file_name.clone(),
            is_external_module: self.is_external_module,
        }
    }

    /// Take all accumulated diagnostics, the scanner's included.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        let mut diags = self.scanner.take_diagnostics();
        diags.extend(std::mem::take(&mut self.diagnostics));
        diags
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current_token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    fn next_token(&mut self) -> SyntaxKind {
        self.prev_end = self.scanner.token_end() as u32;
        self.scanner.scan()
    }

    #[inline]
    fn token_pos(&self) -> u32 {
        self.scanner.token_start() as u32
    }

    #[inline]
    fn token_end(&self) -> u32 {
        self.scanner.token_end() as u32
    }

    #[inline]
    fn token_value(&self) -> String {
        self.scanner.token_value().to_string()
    }

    fn expect_token(&mut self, kind: SyntaxKind) {
        if self.current_token() == kind {
            self.next_token();
        } else {
            let text = kind
                .punctuation_text()
                .or_else(|| kind.keyword_text())
                .unwrap_or("token");
            self.error(&messages::_0_EXPECTED, &[text]);
        }
    }

    fn optional_token(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Accept a terminating `;` if present; declaration files occasionally
    /// omit them before a close brace.
    fn parse_optional_semicolon(&mut self) {
        self.optional_token(SyntaxKind::SemicolonToken);
    }

    fn error(&mut self, msg: &DiagnosticMessage, args: &[&str]) {
        let span =
            declmap_core::text::TextSpan::from_bounds(self.token_pos(), self.token_end());
        self.diagnostics.add(Diagnostic::with_location(
            self.file_name.clone(),
            span,
            msg,
            args,
        ));
    }

    // ========================================================================
    // Allocation helpers
    // ========================================================================

    #[inline]
    fn alloc<T>(&self, val: T) -> &'a T {
        self.arena.alloc(val)
    }

    #[inline]
    fn alloc_list<T>(&self, vec: Vec<T>) -> &'a [T] {
        self.arena.alloc_slice_fill_iter(vec)
    }

    // ========================================================================
    // Identifiers and names
    // ========================================================================

    fn make_identifier(&mut self) -> Identifier {
        let text_name = self.token_value();
        let id = Identifier {
            data: NodeData::new(SyntaxKind::Identifier, self.token_pos(), self.token_end()),
            text: self.interner.intern(&text_name),
            text_name,
        };
        self.next_token();
        id
    }

    fn synthesize_identifier(&mut self) -> Identifier {
        Identifier {
            data: NodeData::new(SyntaxKind::Identifier, self.token_pos(), self.token_pos()),
            text: self.interner.intern(""),
            text_name: String::new(),
        }
    }

    /// A declaration name: must be a plain identifier.
    fn parse_identifier(&mut self) -> Identifier {
        if self.current_token() == SyntaxKind::Identifier {
            self.make_identifier()
        } else {
            self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            self.synthesize_identifier()
        }
    }

    /// A member, parameter, or qualifier name: keywords are valid here
    /// (`type`, `default`, and friends all occur as property names).
    fn parse_identifier_name(&mut self) -> Identifier {
        if self.current_token().is_identifier_or_keyword() {
            self.make_identifier()
        } else {
            self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            self.synthesize_identifier()
        }
    }

    fn parse_property_name(&mut self) -> Option<PropertyName> {
        match self.current_token() {
            SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => {
                let text = self.token_value();
                let data = NodeData::new(
                    SyntaxKind::StringLiteral,
                    self.token_pos(),
                    self.token_end(),
                );
                self.next_token();
                Some(PropertyName::StringLiteral { data, text })
            }
            kind if kind.is_identifier_or_keyword() => {
                Some(PropertyName::Identifier(self.make_identifier()))
            }
            _ => {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                None
            }
        }
    }

    // ========================================================================
    // Top-level declarations
    // ========================================================================

    fn parse_declarations(&mut self) -> &'a [Declaration<'a>] {
        let mut declarations = Vec::new();
        while self.current_token() != SyntaxKind::EndOfFileToken {
            let saved_pos = self.scanner.token_start();
            if let Some(decl) = self.parse_declaration() {
                declarations.push(decl);
            }
            // Error recovery: if nothing advanced, skip forward to the next
            // token that can start a declaration to avoid infinite loops.
            if self.scanner.token_start() == saved_pos
                && self.current_token() != SyntaxKind::EndOfFileToken
            {
                self.next_token();
                self.skip_to_next_declaration();
            }
        }
        self.alloc_list(declarations)
    }

    fn skip_to_next_declaration(&mut self) {
        loop {
            match self.current_token() {
                SyntaxKind::DeclareKeyword
                | SyntaxKind::EnumKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::ClassKeyword
                | SyntaxKind::TypeKeyword
                | SyntaxKind::ConstKeyword
                | SyntaxKind::ImportKeyword
                | SyntaxKind::ExportKeyword
                | SyntaxKind::EndOfFileToken => return,
                _ => {
                    self.next_token();
                }
            }
        }
    }

    fn parse_declaration(&mut self) -> Option<Declaration<'a>> {
        let pos = self.token_pos();

        // `export { A, B };` has no declaration after the modifier position.
        if self.current_token() == SyntaxKind::ExportKeyword
            && self.scanner.look_ahead(|s| s.scan() == SyntaxKind::OpenBraceToken)
        {
            return Some(self.parse_export_list(pos));
        }

        if self.current_token() == SyntaxKind::ImportKeyword {
            return Some(self.parse_import_declaration(pos));
        }

        let modifiers = self.parse_modifiers();
        match self.current_token() {
            SyntaxKind::EnumKeyword => Some(self.parse_enum_declaration(pos, modifiers)),
            SyntaxKind::InterfaceKeyword => Some(self.parse_interface_declaration(pos, modifiers)),
            SyntaxKind::ClassKeyword => Some(self.parse_class_declaration(pos, modifiers)),
            SyntaxKind::TypeKeyword => Some(self.parse_type_alias_declaration(pos, modifiers)),
            SyntaxKind::ConstKeyword => Some(self.parse_const_declaration(pos, modifiers)),
            _ => {
                self.error(&messages::DECLARATION_EXPECTED, &[]);
                None
            }
        }
    }

    fn parse_modifiers(&mut self) -> ModifierFlags {
        let mut flags = ModifierFlags::NONE;
        loop {
            match self.current_token() {
                SyntaxKind::ExportKeyword => {
                    flags |= ModifierFlags::EXPORT;
                    self.is_external_module = true;
                    self.next_token();
                }
                SyntaxKind::DeclareKeyword => {
                    flags |= ModifierFlags::DECLARE;
                    self.next_token();
                }
                SyntaxKind::DefaultKeyword => {
                    flags |= ModifierFlags::DEFAULT;
                    self.next_token();
                }
                SyntaxKind::AbstractKeyword => {
                    flags |= ModifierFlags::ABSTRACT;
                    self.next_token();
                }
                SyntaxKind::ConstKeyword => {
                    // `const enum E` is a modifier; bare `const X: T` starts
                    // a declaration handled elsewhere.
                    if self.scanner.look_ahead(|s| s.scan() == SyntaxKind::EnumKeyword) {
                        flags |= ModifierFlags::CONST;
                        self.next_token();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        flags
    }

    // ========================================================================
    // Enum declarations
    // ========================================================================

    fn parse_enum_declaration(
        &mut self,
        pos: u32,
        modifiers: ModifierFlags,
    ) -> Declaration<'a> {
        self.expect_token(SyntaxKind::EnumKeyword);
        let name = self.parse_identifier();
        self.expect_token(SyntaxKind::OpenBraceToken);

        let mut members = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let member_pos = self.token_pos();
            let Some(member_name) = self.parse_property_name() else {
                self.next_token();
                continue;
            };
            let initializer = if self.optional_token(SyntaxKind::EqualsToken) {
                let parsed = self.parse_enum_initializer();
                // A literal followed by more expression tokens was not a
                // literal initializer after all (`A = 1 + 2`).
                if parsed.is_some()
                    && !matches!(
                        self.current_token(),
                        SyntaxKind::CommaToken
                            | SyntaxKind::CloseBraceToken
                            | SyntaxKind::EndOfFileToken
                    )
                {
                    self.error(&messages::ENUM_MEMBER_INITIALIZER_MUST_BE_A_LITERAL, &[]);
                    self.skip_enum_initializer();
                    None
                } else {
                    parsed
                }
            } else {
                None
            };
            members.push(EnumMember {
                data: NodeData::new(SyntaxKind::EnumMember, member_pos, self.prev_end),
                name: member_name,
                initializer,
            });
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);

        Declaration::Enum(EnumDeclaration {
            data: NodeData::new(SyntaxKind::EnumDeclaration, pos, self.prev_end),
            modifiers,
            name,
            members: self.alloc_list(members),
        })
    }

    fn parse_enum_initializer(&mut self) -> Option<EnumInitializer> {
        let pos = self.token_pos();
        match self.current_token() {
            SyntaxKind::NumericLiteral => {
                let value = parse_numeric_literal(&self.token_value());
                let span = declmap_core::text::TextSpan::from_bounds(pos, self.token_end());
                self.next_token();
                Some(EnumInitializer::Number { span, value })
            }
            SyntaxKind::MinusToken => {
                self.next_token();
                if self.current_token() == SyntaxKind::NumericLiteral {
                    let value = -parse_numeric_literal(&self.token_value());
                    let span = declmap_core::text::TextSpan::from_bounds(pos, self.token_end());
                    self.next_token();
                    Some(EnumInitializer::Number { span, value })
                } else {
                    self.error(&messages::ENUM_MEMBER_INITIALIZER_MUST_BE_A_LITERAL, &[]);
                    self.skip_enum_initializer();
                    None
                }
            }
            SyntaxKind::StringLiteral => {
                let value = self.token_value();
                let span = declmap_core::text::TextSpan::from_bounds(pos, self.token_end());
                self.next_token();
                Some(EnumInitializer::String { span, value })
            }
            _ => {
                self.error(&messages::ENUM_MEMBER_INITIALIZER_MUST_BE_A_LITERAL, &[]);
                self.skip_enum_initializer();
                None
            }
        }
    }

    /// Skip a non-literal initializer expression up to the next member.
    fn skip_enum_initializer(&mut self) {
        loop {
            match self.current_token() {
                SyntaxKind::CommaToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::EndOfFileToken => return,
                _ => {
                    self.next_token();
                }
            }
        }
    }

    // ========================================================================
    // Interface declarations
    // ========================================================================

    fn parse_interface_declaration(
        &mut self,
        pos: u32,
        modifiers: ModifierFlags,
    ) -> Declaration<'a> {
        self.expect_token(SyntaxKind::InterfaceKeyword);
        let name = self.parse_identifier();
        let type_parameters = self.parse_type_parameters_opt();

        let mut heritage = Vec::new();
        if self.optional_token(SyntaxKind::ExtendsKeyword) {
            loop {
                heritage.push(self.parse_type());
                if !self.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }

        let members = self.parse_type_members();

        Declaration::Interface(InterfaceDeclaration {
            data: NodeData::new(SyntaxKind::InterfaceDeclaration, pos, self.prev_end),
            modifiers,
            name,
            type_parameters,
            heritage: self.alloc_list(heritage),
            members,
        })
    }

    fn parse_type_members(&mut self) -> &'a [TypeMember<'a>] {
        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut members = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let saved_pos = self.scanner.token_start();
            if let Some(member) = self.parse_type_member() {
                members.push(member);
            }
            while self.optional_token(SyntaxKind::SemicolonToken)
                || self.optional_token(SyntaxKind::CommaToken)
            {}
            if self.scanner.token_start() == saved_pos
                && self.current_token() != SyntaxKind::CloseBraceToken
                && self.current_token() != SyntaxKind::EndOfFileToken
            {
                self.error(&messages::PROPERTY_OR_SIGNATURE_EXPECTED, &[]);
                self.next_token();
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        self.alloc_list(members)
    }

    fn parse_type_member(&mut self) -> Option<TypeMember<'a>> {
        let pos = self.token_pos();

        match self.current_token() {
            // Call signature: `(src: string): Attribute;`
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken => {
                let sig = self.parse_signature(pos, SyntaxKind::CallSignature);
                return Some(TypeMember::CallSignature(sig));
            }
            // Construct signature: `new (value: string): T;` — `new` followed
            // by anything else is a property named "new".
            SyntaxKind::NewKeyword => {
                let starts_signature = self.scanner.look_ahead(|s| {
                    matches!(
                        s.scan(),
                        SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
                    )
                });
                if starts_signature {
                    self.next_token();
                    let sig = self.parse_signature(pos, SyntaxKind::ConstructSignature);
                    return Some(TypeMember::ConstructSignature(sig));
                }
            }
            // Index signature: `[key: string]: T;`
            SyntaxKind::OpenBracketToken => {
                return self.parse_index_signature(pos).map(TypeMember::IndexSignature);
            }
            _ => {}
        }

        // `readonly` is a modifier only when a name follows it.
        let readonly = self.current_token() == SyntaxKind::ReadonlyKeyword
            && self.scanner.look_ahead(|s| {
                let next = s.scan();
                next.is_identifier_or_keyword()
                    || next == SyntaxKind::StringLiteral
                    || next == SyntaxKind::NumericLiteral
                    || next == SyntaxKind::OpenBracketToken
            });
        if readonly {
            self.next_token();
            if self.current_token() == SyntaxKind::OpenBracketToken {
                return self.parse_index_signature(pos).map(TypeMember::IndexSignature);
            }
        }

        let name = self.parse_property_name()?;
        let optional = self.optional_token(SyntaxKind::QuestionToken);

        if matches!(
            self.current_token(),
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
        ) {
            let sig = self.parse_signature(pos, SyntaxKind::MethodSignature);
            return Some(TypeMember::Method(MethodSignature {
                data: sig.data,
                name,
                optional,
                type_parameters: sig.type_parameters,
                parameters: sig.parameters,
                return_type: sig.return_type,
            }));
        }

        let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_type_alloc())
        } else {
            None
        };
        Some(TypeMember::Property(PropertySignature {
            data: NodeData::new(SyntaxKind::PropertySignature, pos, self.prev_end),
            name,
            optional,
            readonly,
            type_annotation,
        }))
    }

    fn parse_index_signature(&mut self, pos: u32) -> Option<IndexSignatureDeclaration<'a>> {
        self.expect_token(SyntaxKind::OpenBracketToken);
        let param_pos = self.token_pos();
        let name = self.parse_identifier_name();
        self.expect_token(SyntaxKind::ColonToken);
        let key_type = self.parse_type_alloc();
        self.expect_token(SyntaxKind::CloseBracketToken);
        self.expect_token(SyntaxKind::ColonToken);
        let value_type = self.parse_type_alloc();

        let parameter = self.alloc(ParameterDeclaration {
            data: NodeData::new(SyntaxKind::Parameter, param_pos, key_type.span().end()),
            name,
            optional: false,
            dot_dot_dot: false,
            type_annotation: Some(key_type),
        });
        Some(IndexSignatureDeclaration {
            data: NodeData::new(SyntaxKind::IndexSignature, pos, self.prev_end),
            parameter,
            type_annotation: value_type,
        })
    }

    /// Parse `<T>? ( params ) : ReturnType?` into a signature node.
    fn parse_signature(&mut self, pos: u32, kind: SyntaxKind) -> SignatureDeclaration<'a> {
        let type_parameters = self.parse_type_parameters_opt();
        let parameters = self.parse_parameter_list();
        let return_type = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_type_alloc())
        } else {
            None
        };
        SignatureDeclaration {
            data: NodeData::new(kind, pos, self.prev_end),
            type_parameters,
            parameters,
            return_type,
        }
    }

    fn parse_parameter_list(&mut self) -> &'a [ParameterDeclaration<'a>] {
        self.expect_token(SyntaxKind::OpenParenToken);
        let mut parameters = Vec::new();
        while self.current_token() != SyntaxKind::CloseParenToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let pos = self.token_pos();
            let dot_dot_dot = self.optional_token(SyntaxKind::DotDotDotToken);
            let name = self.parse_identifier_name();
            let optional = self.optional_token(SyntaxKind::QuestionToken);
            let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
                Some(self.parse_type_alloc())
            } else {
                None
            };
            parameters.push(ParameterDeclaration {
                data: NodeData::new(SyntaxKind::Parameter, pos, self.prev_end),
                name,
                optional,
                dot_dot_dot,
                type_annotation,
            });
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseParenToken);
        self.alloc_list(parameters)
    }

    fn parse_type_parameters_opt(
        &mut self,
    ) -> Option<&'a [TypeParameterDeclaration<'a>]> {
        if self.current_token() != SyntaxKind::LessThanToken {
            return None;
        }
        self.next_token();
        let mut params = Vec::new();
        while self.current_token() != SyntaxKind::GreaterThanToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let pos = self.token_pos();
            let name = self.parse_identifier();
            let constraint = if self.optional_token(SyntaxKind::ExtendsKeyword) {
                Some(self.parse_type_alloc())
            } else {
                None
            };
            let default = if self.optional_token(SyntaxKind::EqualsToken) {
                Some(self.parse_type_alloc())
            } else {
                None
            };
            params.push(TypeParameterDeclaration {
                data: NodeData::new(SyntaxKind::TypeParameter, pos, self.prev_end),
                name,
                constraint,
                default,
            });
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::GreaterThanToken);
        Some(self.alloc_list(params))
    }

    // ========================================================================
    // Class declarations
    // ========================================================================

    fn parse_class_declaration(
        &mut self,
        pos: u32,
        modifiers: ModifierFlags,
    ) -> Declaration<'a> {
        self.expect_token(SyntaxKind::ClassKeyword);
        let name = self.parse_identifier();
        let type_parameters = self.parse_type_parameters_opt();

        let extends = if self.optional_token(SyntaxKind::ExtendsKeyword) {
            Some(self.parse_type_alloc())
        } else {
            None
        };
        let mut implements = Vec::new();
        if self.optional_token(SyntaxKind::ImplementsKeyword) {
            loop {
                implements.push(self.parse_type());
                if !self.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
        }

        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut members = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let saved_pos = self.scanner.token_start();
            if let Some(member) = self.parse_class_member() {
                members.push(member);
            }
            while self.optional_token(SyntaxKind::SemicolonToken)
                || self.optional_token(SyntaxKind::CommaToken)
            {}
            if self.scanner.token_start() == saved_pos
                && self.current_token() != SyntaxKind::CloseBraceToken
                && self.current_token() != SyntaxKind::EndOfFileToken
            {
                self.error(&messages::PROPERTY_OR_SIGNATURE_EXPECTED, &[]);
                self.next_token();
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);

        Declaration::Class(ClassDeclaration {
            data: NodeData::new(SyntaxKind::ClassDeclaration, pos, self.prev_end),
            modifiers,
            name,
            type_parameters,
            extends,
            implements: self.alloc_list(implements),
            members: self.alloc_list(members),
        })
    }

    fn parse_class_member(&mut self) -> Option<ClassMember<'a>> {
        let pos = self.token_pos();

        if self.current_token() == SyntaxKind::OpenBracketToken {
            return self.parse_index_signature(pos).map(ClassMember::IndexSignature);
        }

        let mut modifiers = ModifierFlags::NONE;
        loop {
            let is_modifier_position = self.scanner.look_ahead(|s| {
                let next = s.scan();
                next.is_identifier_or_keyword()
                    || next == SyntaxKind::StringLiteral
                    || next == SyntaxKind::OpenBracketToken
            });
            match self.current_token() {
                SyntaxKind::StaticKeyword if is_modifier_position => {
                    modifiers |= ModifierFlags::STATIC;
                    self.next_token();
                }
                SyntaxKind::ReadonlyKeyword if is_modifier_position => {
                    modifiers |= ModifierFlags::READONLY;
                    self.next_token();
                }
                SyntaxKind::AbstractKeyword if is_modifier_position => {
                    modifiers |= ModifierFlags::ABSTRACT;
                    self.next_token();
                }
                _ => break,
            }
        }

        if self.current_token() == SyntaxKind::OpenBracketToken {
            return self.parse_index_signature(pos).map(ClassMember::IndexSignature);
        }

        // `constructor(...)` — contextual, not a keyword.
        if self.current_token() == SyntaxKind::Identifier
            && self.scanner.token_value() == "constructor"
            && self
                .scanner
                .look_ahead(|s| s.scan() == SyntaxKind::OpenParenToken)
        {
            self.next_token();
            let parameters = self.parse_parameter_list();
            self.parse_optional_semicolon();
            return Some(ClassMember::Constructor(ConstructorDeclaration {
                data: NodeData::new(SyntaxKind::Constructor, pos, self.prev_end),
                parameters,
            }));
        }

        let name = self.parse_property_name()?;
        let optional = self.optional_token(SyntaxKind::QuestionToken);

        if matches!(
            self.current_token(),
            SyntaxKind::OpenParenToken | SyntaxKind::LessThanToken
        ) {
            let sig = self.parse_signature(pos, SyntaxKind::MethodSignature);
            return Some(ClassMember::Method(MethodDeclaration {
                data: sig.data,
                modifiers,
                name,
                optional,
                type_parameters: sig.type_parameters,
                parameters: sig.parameters,
                return_type: sig.return_type,
            }));
        }

        let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_type_alloc())
        } else {
            None
        };
        Some(ClassMember::Property(PropertyDeclaration {
            data: NodeData::new(SyntaxKind::PropertySignature, pos, self.prev_end),
            modifiers,
            name,
            optional,
            type_annotation,
        }))
    }

    // ========================================================================
    // Type alias, const, import, export
    // ========================================================================

    fn parse_type_alias_declaration(
        &mut self,
        pos: u32,
        modifiers: ModifierFlags,
    ) -> Declaration<'a> {
        self.expect_token(SyntaxKind::TypeKeyword);
        let name = self.parse_identifier();
        let type_parameters = self.parse_type_parameters_opt();
        self.expect_token(SyntaxKind::EqualsToken);
        let ty = self.parse_type_alloc();
        self.parse_optional_semicolon();

        Declaration::TypeAlias(TypeAliasDeclaration {
            data: NodeData::new(SyntaxKind::TypeAliasDeclaration, pos, self.prev_end),
            modifiers,
            name,
            type_parameters,
            ty,
        })
    }

    fn parse_const_declaration(
        &mut self,
        pos: u32,
        modifiers: ModifierFlags,
    ) -> Declaration<'a> {
        self.expect_token(SyntaxKind::ConstKeyword);
        let name = self.parse_identifier();
        let type_annotation = if self.optional_token(SyntaxKind::ColonToken) {
            Some(self.parse_type_alloc())
        } else {
            None
        };
        self.parse_optional_semicolon();

        Declaration::Const(ConstDeclaration {
            data: NodeData::new(SyntaxKind::ConstDeclaration, pos, self.prev_end),
            modifiers,
            name,
            type_annotation,
        })
    }

    fn parse_import_declaration(&mut self, pos: u32) -> Declaration<'a> {
        self.expect_token(SyntaxKind::ImportKeyword);
        self.is_external_module = true;

        // Side-effect import: `import './foo';` — no bindings.
        if self.current_token() == SyntaxKind::StringLiteral {
            let module_specifier = self.token_value();
            self.next_token();
            self.parse_optional_semicolon();
            return Declaration::Import(ImportDeclaration {
                data: NodeData::new(SyntaxKind::ImportDeclaration, pos, self.prev_end),
                module_specifier,
                default_name: None,
                namespace_name: None,
                named: &[],
                type_only: false,
            });
        }

        let type_only = self.current_token() == SyntaxKind::TypeKeyword
            && self.scanner.look_ahead(|s| {
                matches!(
                    s.scan(),
                    SyntaxKind::OpenBraceToken | SyntaxKind::Identifier | SyntaxKind::AsteriskToken
                )
            });
        if type_only {
            self.next_token();
        }

        let mut default_name = None;
        let mut namespace_name = None;
        let mut named = Vec::new();

        if self.current_token() == SyntaxKind::Identifier {
            default_name = Some(self.make_identifier());
            self.optional_token(SyntaxKind::CommaToken);
        }

        if self.optional_token(SyntaxKind::AsteriskToken) {
            self.expect_token(SyntaxKind::AsKeyword);
            namespace_name = Some(self.parse_identifier());
        } else if self.optional_token(SyntaxKind::OpenBraceToken) {
            while self.current_token() != SyntaxKind::CloseBraceToken
                && self.current_token() != SyntaxKind::EndOfFileToken
            {
                let spec_pos = self.token_pos();
                let first = self.parse_identifier_name();
                let (property_name, name) = if self.optional_token(SyntaxKind::AsKeyword) {
                    (Some(first), self.parse_identifier_name())
                } else {
                    (None, first)
                };
                named.push(ImportSpecifier {
                    data: NodeData::new(SyntaxKind::ImportDeclaration, spec_pos, self.prev_end),
                    property_name,
                    name,
                });
                if !self.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
            self.expect_token(SyntaxKind::CloseBraceToken);
        }

        self.expect_token(SyntaxKind::FromKeyword);
        let module_specifier = if self.current_token() == SyntaxKind::StringLiteral {
            let text = self.token_value();
            self.next_token();
            text
        } else {
            self.error(&messages::STRING_LITERAL_EXPECTED, &[]);
            String::new()
        };
        self.parse_optional_semicolon();

        Declaration::Import(ImportDeclaration {
            data: NodeData::new(SyntaxKind::ImportDeclaration, pos, self.prev_end),
            module_specifier,
            default_name,
            namespace_name,
            named: self.alloc_list(named),
            type_only,
        })
    }

    fn parse_export_list(&mut self, pos: u32) -> Declaration<'a> {
        self.expect_token(SyntaxKind::ExportKeyword);
        self.is_external_module = true;
        self.expect_token(SyntaxKind::OpenBraceToken);

        let mut names = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let name = self.parse_identifier_name();
            // `A as B` re-exports A under another name; the declared symbol
            // is what gets marked exported.
            if self.optional_token(SyntaxKind::AsKeyword) {
                self.parse_identifier_name();
            }
            names.push(name);
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        self.parse_optional_semicolon();

        Declaration::ExportList(ExportListDeclaration {
            data: NodeData::new(SyntaxKind::ExportListDeclaration, pos, self.prev_end),
            names: self.alloc_list(names),
        })
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Parse a type and move it into the arena.
    fn parse_type_alloc(&mut self) -> &'a TypeNode<'a> {
        let ty = self.parse_type();
        self.alloc(ty)
    }

    fn parse_type(&mut self) -> TypeNode<'a> {
        let pos = self.token_pos();
        // A leading `|` before the first union arm is legal.
        self.optional_token(SyntaxKind::BarToken);
        let first = self.parse_intersection_type();
        if self.current_token() != SyntaxKind::BarToken {
            return first;
        }
        let mut types = vec![first];
        while self.optional_token(SyntaxKind::BarToken) {
            types.push(self.parse_intersection_type());
        }
        TypeNode::Union(UnionTypeNode {
            data: NodeData::new(SyntaxKind::UnionType, pos, self.prev_end),
            types: self.alloc_list(types),
        })
    }

    fn parse_intersection_type(&mut self) -> TypeNode<'a> {
        let pos = self.token_pos();
        let first = self.parse_postfix_type();
        if self.current_token() != SyntaxKind::AmpersandToken {
            return first;
        }
        let mut types = vec![first];
        while self.optional_token(SyntaxKind::AmpersandToken) {
            types.push(self.parse_postfix_type());
        }
        TypeNode::Intersection(IntersectionTypeNode {
            data: NodeData::new(SyntaxKind::IntersectionType, pos, self.prev_end),
            types: self.alloc_list(types),
        })
    }

    fn parse_postfix_type(&mut self) -> TypeNode<'a> {
        let pos = self.token_pos();
        let mut ty = self.parse_primary_type();
        while self.current_token() == SyntaxKind::OpenBracketToken
            && !self.scanner.has_preceding_line_break()
        {
            self.next_token();
            if self.optional_token(SyntaxKind::CloseBracketToken) {
                ty = TypeNode::Array(ArrayTypeNode {
                    data: NodeData::new(SyntaxKind::ArrayType, pos, self.prev_end),
                    element_type: self.alloc(ty),
                });
            } else {
                let index = self.parse_type();
                self.expect_token(SyntaxKind::CloseBracketToken);
                ty = TypeNode::IndexedAccess(IndexedAccessTypeNode {
                    data: NodeData::new(SyntaxKind::IndexedAccessType, pos, self.prev_end),
                    object_type: self.alloc(ty),
                    index_type: self.alloc(index),
                });
            }
        }
        ty
    }

    fn parse_primary_type(&mut self) -> TypeNode<'a> {
        let pos = self.token_pos();
        match self.current_token() {
            kind if kind.is_primitive_type_keyword() => {
                let data = NodeData::new(kind, pos, self.token_end());
                self.next_token();
                TypeNode::Keyword(KeywordTypeNode { data })
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let value = self.current_token() == SyntaxKind::TrueKeyword;
                let data = NodeData::new(SyntaxKind::LiteralType, pos, self.token_end());
                self.next_token();
                TypeNode::LiteralType(LiteralTypeNode {
                    data,
                    literal: TypeLiteralKind::Boolean(value),
                })
            }
            SyntaxKind::StringLiteral => {
                let text = self.token_value();
                let data = NodeData::new(SyntaxKind::LiteralType, pos, self.token_end());
                self.next_token();
                TypeNode::LiteralType(LiteralTypeNode {
                    data,
                    literal: TypeLiteralKind::String(text),
                })
            }
            SyntaxKind::NumericLiteral => {
                let value = parse_numeric_literal(&self.token_value());
                let data = NodeData::new(SyntaxKind::LiteralType, pos, self.token_end());
                self.next_token();
                TypeNode::LiteralType(LiteralTypeNode {
                    data,
                    literal: TypeLiteralKind::Number(value),
                })
            }
            SyntaxKind::MinusToken => {
                self.next_token();
                if self.current_token() == SyntaxKind::NumericLiteral {
                    let value = -parse_numeric_literal(&self.token_value());
                    let data = NodeData::new(SyntaxKind::LiteralType, pos, self.token_end());
                    self.next_token();
                    TypeNode::LiteralType(LiteralTypeNode {
                        data,
                        literal: TypeLiteralKind::Number(value),
                    })
                } else {
                    self.error(&messages::TYPE_EXPECTED, &[]);
                    self.any_type_placeholder(pos)
                }
            }
            SyntaxKind::TemplateLiteral => {
                let text = self.token_value();
                let data = NodeData::new(SyntaxKind::TemplateLiteralType, pos, self.token_end());
                self.next_token();
                TypeNode::TemplateLiteral(TemplateLiteralTypeNode { data, text })
            }
            SyntaxKind::ImportKeyword => self.parse_import_type(pos),
            SyntaxKind::TypeofKeyword => {
                self.next_token();
                let expr_name = self.parse_entity_name_parts();
                TypeNode::TypeQuery(TypeQueryNode {
                    data: NodeData::new(SyntaxKind::TypeQuery, pos, self.prev_end),
                    expr_name,
                })
            }
            SyntaxKind::KeyofKeyword | SyntaxKind::ReadonlyKeyword => {
                let operator = self.current_token();
                self.next_token();
                let target = self.parse_postfix_type();
                TypeNode::TypeOperator(TypeOperatorNode {
                    data: NodeData::new(SyntaxKind::TypeOperator, pos, self.prev_end),
                    operator,
                    target: self.alloc(target),
                })
            }
            SyntaxKind::NewKeyword => {
                self.next_token();
                let parameters = self.parse_parameter_list();
                self.expect_token(SyntaxKind::EqualsGreaterThanToken);
                let return_type = self.parse_type();
                TypeNode::Constructor(ConstructorTypeNode {
                    data: NodeData::new(SyntaxKind::ConstructorType, pos, self.prev_end),
                    parameters,
                    return_type: self.alloc(return_type),
                })
            }
            SyntaxKind::OpenParenToken => {
                if self.is_start_of_function_type() {
                    self.parse_function_type(pos, None)
                } else {
                    self.next_token();
                    let inner = self.parse_type();
                    self.expect_token(SyntaxKind::CloseParenToken);
                    TypeNode::Parenthesized(ParenthesizedTypeNode {
                        data: NodeData::new(SyntaxKind::ParenthesizedType, pos, self.prev_end),
                        inner: self.alloc(inner),
                    })
                }
            }
            SyntaxKind::LessThanToken => {
                let type_parameters = self.parse_type_parameters_opt();
                self.parse_function_type(pos, type_parameters)
            }
            SyntaxKind::OpenBraceToken => {
                let members = self.parse_type_members();
                TypeNode::TypeLiteral(TypeLiteralNode {
                    data: NodeData::new(SyntaxKind::TypeLiteral, pos, self.prev_end),
                    members,
                })
            }
            SyntaxKind::OpenBracketToken => {
                self.next_token();
                let mut element_types = Vec::new();
                while self.current_token() != SyntaxKind::CloseBracketToken
                    && self.current_token() != SyntaxKind::EndOfFileToken
                {
                    element_types.push(self.parse_type());
                    if !self.optional_token(SyntaxKind::CommaToken) {
                        break;
                    }
                }
                self.expect_token(SyntaxKind::CloseBracketToken);
                TypeNode::Tuple(TupleTypeNode {
                    data: NodeData::new(SyntaxKind::TupleType, pos, self.prev_end),
                    element_types: self.alloc_list(element_types),
                })
            }
            kind if kind.is_identifier_or_keyword() => {
                let name_parts = self.parse_entity_name_parts();
                let type_arguments = self.parse_type_arguments_opt();
                TypeNode::TypeReference(TypeReferenceNode {
                    data: NodeData::new(SyntaxKind::TypeReference, pos, self.prev_end),
                    name_parts,
                    type_arguments,
                })
            }
            _ => {
                self.error(&messages::TYPE_EXPECTED, &[]);
                self.any_type_placeholder(pos)
            }
        }
    }

    fn any_type_placeholder(&self, pos: u32) -> TypeNode<'a> {
        TypeNode::Keyword(KeywordTypeNode {
            data: NodeData::new(SyntaxKind::AnyKeyword, pos, pos),
        })
    }

    /// Whether the `(` at the current token opens a function type
    /// (`(a: T) => U`) rather than a parenthesized type.
    fn is_start_of_function_type(&mut self) -> bool {
        self.scanner.look_ahead(|s| {
            let mut depth = 1u32;
            loop {
                match s.scan() {
                    SyntaxKind::OpenParenToken => depth += 1,
                    SyntaxKind::CloseParenToken => {
                        depth -= 1;
                        if depth == 0 {
                            return s.scan() == SyntaxKind::EqualsGreaterThanToken;
                        }
                    }
                    SyntaxKind::EndOfFileToken => return false,
                    _ => {}
                }
            }
        })
    }

    fn parse_function_type(
        &mut self,
        pos: u32,
        type_parameters: Option<&'a [TypeParameterDeclaration<'a>]>,
    ) -> TypeNode<'a> {
        let parameters = self.parse_parameter_list();
        self.expect_token(SyntaxKind::EqualsGreaterThanToken);
        let return_type = self.parse_type();
        TypeNode::Function(FunctionTypeNode {
            data: NodeData::new(SyntaxKind::FunctionType, pos, self.prev_end),
            type_parameters,
            parameters,
            return_type: self.alloc(return_type),
        })
    }

    fn parse_import_type(&mut self, pos: u32) -> TypeNode<'a> {
        self.expect_token(SyntaxKind::ImportKeyword);
        self.expect_token(SyntaxKind::OpenParenToken);
        let module_specifier = if self.current_token() == SyntaxKind::StringLiteral {
            let text = self.token_value();
            self.next_token();
            text
        } else {
            self.error(&messages::STRING_LITERAL_EXPECTED, &[]);
            String::new()
        };
        self.expect_token(SyntaxKind::CloseParenToken);

        let mut qualifier = Vec::new();
        while self.optional_token(SyntaxKind::DotToken) {
            qualifier.push(self.parse_identifier_name());
        }
        let type_arguments = self.parse_type_arguments_opt();

        TypeNode::ImportType(ImportTypeNode {
            data: NodeData::new(SyntaxKind::ImportType, pos, self.prev_end),
            module_specifier,
            qualifier: self.alloc_list(qualifier),
            type_arguments,
        })
    }

    fn parse_entity_name_parts(&mut self) -> &'a [Identifier] {
        let mut parts = vec![self.parse_identifier_name()];
        while self.optional_token(SyntaxKind::DotToken) {
            parts.push(self.parse_identifier_name());
        }
        self.alloc_list(parts)
    }

    fn parse_type_arguments_opt(&mut self) -> Option<&'a [TypeNode<'a>]> {
        if self.current_token() != SyntaxKind::LessThanToken {
            return None;
        }
        self.next_token();
        let mut args = Vec::new();
        while self.current_token() != SyntaxKind::GreaterThanToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            args.push(self.parse_type());
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::GreaterThanToken);
        Some(self.alloc_list(args))
    }
}

/// Parse a numeric literal token value, hex included, to its f64 value.
fn parse_numeric_literal(text: &str) -> f64 {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(0.0)
    } else {
        text.parse().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'a>(arena: &'a Bump, src: &str) -> (SourceFile<'a>, DiagnosticCollection) {
        let interner = StringInterner::new();
        let mut parser = Parser::new(arena, interner, "test.d.ts", src);
        let sf = parser.parse_source_file();
        let diags = parser.take_diagnostics();
        (sf, diags)
    }

    #[test]
    fn test_parse_enum() {
        let arena = Bump::new();
        let (sf, diags) = parse(&arena, "declare enum Color { White, Black = 1 }");
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        assert_eq!(sf.declarations.len(), 1);
        let Declaration::Enum(e) = &sf.declarations[0] else {
            panic!("expected enum");
        };
        assert_eq!(e.name.text_name, "Color");
        assert_eq!(e.members.len(), 2);
        assert!(e.members[0].initializer.is_none());
        assert!(matches!(
            e.members[1].initializer,
            Some(EnumInitializer::Number { value, .. }) if value == 1.0
        ));
    }

    #[test]
    fn test_parse_negative_enum_value() {
        let arena = Bump::new();
        let (sf, diags) = parse(&arena, "declare enum Edge { Start = -1 }");
        assert!(diags.is_empty());
        let Declaration::Enum(e) = &sf.declarations[0] else {
            panic!("expected enum");
        };
        assert!(matches!(
            e.members[0].initializer,
            Some(EnumInitializer::Number { value, .. }) if value == -1.0
        ));
    }

    #[test]
    fn test_parse_import_type_alias() {
        let arena = Bump::new();
        let (sf, diags) = parse(
            &arena,
            "declare type Lattice = import('../api/@ohos.graphics.drawing').default.Lattice;",
        );
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Declaration::TypeAlias(alias) = &sf.declarations[0] else {
            panic!("expected alias");
        };
        let TypeNode::ImportType(import) = alias.ty else {
            panic!("expected import type");
        };
        assert_eq!(import.module_specifier, "../api/@ohos.graphics.drawing");
        assert_eq!(import.qualifier.len(), 2);
        assert_eq!(import.qualifier[0].text_name, "default");
        assert_eq!(import.qualifier[1].text_name, "Lattice");
    }

    #[test]
    fn test_parse_interface_with_call_signature() {
        let arena = Bump::new();
        let (sf, diags) = parse(
            &arena,
            "interface ImageInterface { (src: string): ImageAttribute; }",
        );
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Declaration::Interface(i) = &sf.declarations[0] else {
            panic!("expected interface");
        };
        assert!(matches!(i.members[0], TypeMember::CallSignature(_)));
    }

    #[test]
    fn test_parse_function_type_vs_parenthesized() {
        let arena = Bump::new();
        let (sf, diags) = parse(
            &arena,
            "declare type VoidCallback = () => void;\ndeclare type Wrapped = (string | number);",
        );
        assert!(diags.is_empty(), "{:?}", diags.diagnostics());
        let Declaration::TypeAlias(cb) = &sf.declarations[0] else {
            panic!()
        };
        assert!(matches!(cb.ty, TypeNode::Function(_)));
        let Declaration::TypeAlias(wrapped) = &sf.declarations[1] else {
            panic!()
        };
        assert!(matches!(wrapped.ty, TypeNode::Parenthesized(_)));
    }

    #[test]
    fn test_recovery_after_bad_declaration() {
        let arena = Bump::new();
        let (sf, diags) = parse(&arena, "garbage garbage;\ndeclare enum Ok { A }");
        assert!(!diags.is_empty());
        assert!(sf
            .declarations
            .iter()
            .any(|d| matches!(d, Declaration::Enum(_))));
    }
}
