//! The resolve pass: rewrite pending references against the merged table.

use declmap_core::collections::{FxMap, FxSet};
use declmap_core::intern::{InternedString, StringInterner};
use declmap_core::text::TextSpan;
use declmap_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use declmap_normalize::Module;
use declmap_table::{
    Member, MemberKind, ModuleId, NamedRef, RefTarget, Scope, Signature, Symbol, SymbolId,
    SymbolTable, TypeRef,
};

use crate::paths;

/// Resolve every pending type reference in the table.
///
/// `modules` must be the same path-sorted slice the merge pass consumed:
/// module ids index into it. Returns the unresolved-reference warnings; the
/// table itself is updated in place and no symbol is tainted by this pass.
pub fn resolve_references(
    modules: &[Module],
    table: &mut SymbolTable,
    interner: &StringInterner,
) -> DiagnosticCollection {
    debug_assert!(modules
        .iter()
        .enumerate()
        .all(|(index, m)| m.id.index() == index));

    let indexes = Indexes::build(modules, table);
    let mut resolver = Resolver {
        modules,
        interner,
        indexes,
        diagnostics: DiagnosticCollection::new(),
        reported: FxSet::default(),
    };

    // Pass 2 proper: contexts are captured up front so the symbol slice can
    // be walked mutably without re-reading the table.
    let contexts: Vec<RefContext> = table
        .symbols()
        .iter()
        .map(|symbol| resolver.context_for(symbol, table))
        .collect();
    for (symbol, ctx) in table.symbols_mut().iter_mut().zip(&contexts) {
        resolver.resolve_symbol(symbol, ctx);
    }

    resolver.diagnostics
}

/// The name→symbol index built once after the merge barrier (pass 1).
struct Indexes {
    /// Global ambient scope: bare name → symbol.
    global: FxMap<InternedString, SymbolId>,
    /// Module-scoped names: (module path, name) → symbol.
    module_scoped: FxMap<(InternedString, InternedString), SymbolId>,
    /// Canonical module key → module id.
    path_to_module: FxMap<String, ModuleId>,
    /// Module path (interned), indexed by module id.
    module_paths: Vec<InternedString>,
    /// Member names per symbol, for nested-qualifier checks.
    member_names: Vec<FxSet<InternedString>>,
}

impl Indexes {
    fn build(modules: &[Module], table: &SymbolTable) -> Self {
        let mut global = FxMap::default();
        let mut module_scoped = FxMap::default();
        let mut member_names = Vec::with_capacity(table.len());
        for symbol in table.symbols() {
            match symbol.scope {
                Scope::Global => {
                    global.insert(symbol.name, symbol.id);
                }
                Scope::Module(path) => {
                    module_scoped.insert((path, symbol.name), symbol.id);
                }
            }
            member_names.push(symbol.members.keys().copied().collect());
        }

        let mut path_to_module = FxMap::default();
        let mut module_paths = Vec::with_capacity(modules.len());
        for module in modules {
            let path = table.interner().resolve(module.path);
            path_to_module.insert(paths::module_key(path), module.id);
            module_paths.push(module.path);
        }

        Self {
            global,
            module_scoped,
            path_to_module,
            module_paths,
            member_names,
        }
    }
}

/// Per-symbol resolution context, captured before the mutable walk.
struct RefContext {
    symbol_id: SymbolId,
    qualified_name: String,
    /// Path of the module that declared the first occurrence.
    file: String,
    span: TextSpan,
    module: ModuleId,
}

struct Resolver<'r> {
    modules: &'r [Module],
    interner: &'r StringInterner,
    indexes: Indexes,
    diagnostics: DiagnosticCollection,
    /// One warning per (symbol, reference text).
    reported: FxSet<(SymbolId, String)>,
}

impl<'r> Resolver<'r> {
    fn context_for(&self, symbol: &Symbol, table: &SymbolTable) -> RefContext {
        let location = symbol.locations[0];
        RefContext {
            symbol_id: symbol.id,
            qualified_name: symbol.qualified_name(self.interner),
            file: table.module_path(location.module).to_string(),
            span: location.span,
            module: location.module,
        }
    }

    fn resolve_symbol(&mut self, symbol: &mut Symbol, ctx: &RefContext) {
        let generics: Vec<InternedString> = symbol.generics.iter().map(|g| g.name).collect();

        for generic in &mut symbol.generics {
            if let Some(constraint) = &mut generic.constraint {
                walk(self, constraint, ctx, &generics);
            }
            if let Some(default) = &mut generic.default {
                walk(self, default, ctx, &generics);
            }
        }
        for heritage in &mut symbol.heritage {
            walk(self, heritage, ctx, &generics);
        }
        if let Some(ty) = &mut symbol.ty {
            walk(self, ty, ctx, &generics);
        }
        for member in symbol.members.values_mut() {
            self.resolve_member(member, ctx, &generics);
        }
    }

    fn resolve_member(&mut self, member: &mut Member, ctx: &RefContext, generics: &[InternedString]) {
        match &mut member.kind {
            MemberKind::EnumVariant { .. } => {}
            MemberKind::Property { ty, .. } => {
                if let Some(ty) = ty {
                    walk(self, ty, ctx, generics);
                }
            }
            MemberKind::Method { signatures }
            | MemberKind::Call { signatures }
            | MemberKind::Construct { signatures } => {
                for signature in signatures {
                    self.resolve_signature(signature, ctx, generics);
                }
            }
            MemberKind::Index { key, ty } => {
                if let Some(key) = key {
                    walk(self, key, ctx, generics);
                }
                walk(self, ty, ctx, generics);
            }
        }
    }

    fn resolve_signature(
        &mut self,
        signature: &mut Signature,
        ctx: &RefContext,
        generics: &[InternedString],
    ) {
        // Signature-level type parameters shadow the symbol's.
        let mut scoped = generics.to_vec();
        scoped.extend(signature.type_params.iter().map(|g| g.name));

        for generic in &mut signature.type_params {
            if let Some(constraint) = &mut generic.constraint {
                walk(self, constraint, ctx, &scoped);
            }
            if let Some(default) = &mut generic.default {
                walk(self, default, ctx, &scoped);
            }
        }
        for param in &mut signature.params {
            if let Some(ty) = &mut param.ty {
                walk(self, ty, ctx, &scoped);
            }
        }
        if let Some(return_type) = &mut signature.return_type {
            walk(self, return_type, ctx, &scoped);
        }
    }

    // ========================================================================
    // Named reference resolution
    // ========================================================================

    fn resolve_named(
        &mut self,
        named: &mut NamedRef,
        ctx: &RefContext,
        generics: &[InternedString],
    ) {
        if named.target != RefTarget::Pending {
            return;
        }
        if named.import_from.is_some() {
            self.resolve_import_ref(named, ctx);
        } else {
            self.resolve_bare_ref(named, ctx, generics);
        }
    }

    fn resolve_import_ref(&mut self, named: &mut NamedRef, ctx: &RefContext) {
        let interner = self.interner;
        let specifier = named.import_from.clone().unwrap_or_default();
        let importer = interner.resolve(self.indexes.module_paths[ctx.module.index()]);
        let key = paths::resolve_specifier(importer, &specifier);

        let Some(&target_module) = self.indexes.path_to_module.get(&key) else {
            named.target = RefTarget::Unresolved;
            let display = named.display(interner);
            self.warn_once(ctx, display, &messages::CANNOT_FIND_MODULE_0, &[&specifier]);
            return;
        };

        // `.default.X` selects through an unmodelled default-export
        // indirection; fall back to looking X up in the module directly.
        let mut parts = named.parts.clone();
        if parts.len() > 1 && interner.resolve(parts[0]) == "default" {
            parts.remove(0);
        }
        let Some(&first) = parts.first() else {
            named.target = RefTarget::Unresolved;
            return;
        };
        let rest = parts[1..].to_vec();

        match self.lookup_in_module(target_module, first) {
            Some(id) => self.finish_with_nested(named, id, &rest, ctx),
            None => {
                named.target = RefTarget::Unresolved;
                let display = named.display(interner);
                let member = interner.resolve(first).to_string();
                self.warn_once(
                    ctx,
                    display,
                    &messages::MODULE_0_HAS_NO_EXPORTED_MEMBER_1,
                    &[&specifier, &member],
                );
            }
        }
    }

    fn resolve_bare_ref(
        &mut self,
        named: &mut NamedRef,
        ctx: &RefContext,
        generics: &[InternedString],
    ) {
        let interner = self.interner;
        let first = named.parts[0];

        // Generic parameters in scope shadow every other tier.
        if generics.contains(&first) {
            named.target = RefTarget::TypeParameter;
            return;
        }

        let module = &self.modules[ctx.module.index()];

        // Tier 1: the declaring module's own top-level names.
        if let Scope::Module(path) = module.scope {
            if let Some(&id) = self.indexes.module_scoped.get(&(path, first)) {
                let rest: Vec<InternedString> = named.parts[1..].to_vec();
                self.finish_with_nested(named, id, &rest, ctx);
                return;
            }
        }

        // Tier 2: the module's import table.
        if let Some(import) = module.imports.get(&first) {
            let import_module = import.module.clone();
            let importer = interner.resolve(module.path);
            let key = paths::resolve_specifier(importer, &import_module);
            let Some(&target_module) = self.indexes.path_to_module.get(&key) else {
                named.target = RefTarget::Unresolved;
                let display = named.display(interner);
                self.warn_once(ctx, display, &messages::CANNOT_FIND_MODULE_0, &[&import_module]);
                return;
            };
            // For `import * as NS`, the second part is the name inside the
            // target module; for named/default imports it is recorded.
            let (target_name, rest) = if import.namespace {
                match named.parts.get(1) {
                    Some(&second) => (second, named.parts[2..].to_vec()),
                    None => {
                        named.target = RefTarget::Unresolved;
                        return;
                    }
                }
            } else {
                (import.exported, named.parts[1..].to_vec())
            };
            match self.lookup_in_module(target_module, target_name) {
                Some(id) => self.finish_with_nested(named, id, &rest, ctx),
                None => {
                    named.target = RefTarget::Unresolved;
                    let display = named.display(interner);
                    let member = interner.resolve(target_name).to_string();
                    self.warn_once(
                        ctx,
                        display,
                        &messages::MODULE_0_HAS_NO_EXPORTED_MEMBER_1,
                        &[&import_module, &member],
                    );
                }
            }
            return;
        }

        // Tier 3: the global ambient scope.
        if let Some(&id) = self.indexes.global.get(&first) {
            let rest: Vec<InternedString> = named.parts[1..].to_vec();
            self.finish_with_nested(named, id, &rest, ctx);
            return;
        }

        named.target = RefTarget::Unresolved;
        let display = named.display(interner);
        let searched = match module.scope {
            Scope::Module(_) => format!(
                "module '{}', its import table, and the global ambient scope",
                interner.resolve(module.path)
            ),
            Scope::Global => "the global ambient scope".to_string(),
        };
        let name = interner.resolve(first).to_string();
        self.warn_once(ctx, display, &messages::CANNOT_RESOLVE_NAME_0, &[&name, &searched]);
    }

    /// Look a name up among a module's top-level symbols, wherever its scope
    /// put them: module-scoped for true modules, global for ambient scripts.
    fn lookup_in_module(&self, module: ModuleId, name: InternedString) -> Option<SymbolId> {
        let path = self.indexes.module_paths[module.index()];
        self.indexes
            .module_scoped
            .get(&(path, name))
            .or_else(|| self.indexes.global.get(&name))
            .copied()
    }

    /// Resolve to `base`, then check any remaining dotted qualifiers against
    /// its member names. A missing nested member degrades the reference to
    /// unresolved; the graph edge stays at symbol granularity either way.
    fn finish_with_nested(
        &mut self,
        named: &mut NamedRef,
        base: SymbolId,
        rest: &[InternedString],
        ctx: &RefContext,
    ) {
        if let Some(&missing) = rest
            .iter()
            .find(|part| !self.indexes.member_names[base.index()].contains(*part))
        {
            named.target = RefTarget::Unresolved;
            let display = named.display(self.interner);
            let owner = self.interner.resolve(named.parts[0]).to_string();
            let member = self.interner.resolve(missing).to_string();
            self.warn_once(
                ctx,
                display,
                &messages::_0_HAS_NO_NESTED_MEMBER_1,
                &[&owner, &member],
            );
            return;
        }
        named.target = RefTarget::Resolved(base);
    }

    fn warn_once(
        &mut self,
        ctx: &RefContext,
        reference: String,
        message: &DiagnosticMessage,
        args: &[&str],
    ) {
        if !self.reported.insert((ctx.symbol_id, reference)) {
            return;
        }
        self.diagnostics.add(
            Diagnostic::with_location(ctx.file.clone(), ctx.span, message, args)
                .for_symbol(ctx.qualified_name.clone()),
        );
    }
}

/// Recursive walk over a type reference tree.
fn walk(
    resolver: &mut Resolver<'_>,
    ty: &mut TypeRef,
    ctx: &RefContext,
    generics: &[InternedString],
) {
    match ty {
        TypeRef::Primitive(_) | TypeRef::Literal(_) | TypeRef::Template(_) => {}
        TypeRef::Named(named) => {
            for arg in &mut named.type_args {
                walk(resolver, arg, ctx, generics);
            }
            resolver.resolve_named(named, ctx, generics);
        }
        TypeRef::Query(named) => {
            resolver.resolve_named(named, ctx, generics);
        }
        TypeRef::Union(types) | TypeRef::Intersection(types) | TypeRef::Tuple(types) => {
            for inner in types {
                walk(resolver, inner, ctx, generics);
            }
        }
        TypeRef::Array(inner) | TypeRef::KeyOf(inner) => {
            walk(resolver, inner, ctx, generics);
        }
        TypeRef::Function { params, return_type } | TypeRef::Constructor { params, return_type } => {
            for param in params {
                if let Some(ty) = &mut param.ty {
                    walk(resolver, ty, ctx, generics);
                }
            }
            walk(resolver, return_type, ctx, generics);
        }
        TypeRef::Object(members) => {
            for member in members {
                resolver.resolve_member(member, ctx, generics);
            }
        }
        TypeRef::IndexedAccess { object, index } => {
            walk(resolver, object, ctx, generics);
            walk(resolver, index, ctx, generics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use declmap_merge::merge_modules;
    use declmap_normalize::normalize_source_file;
    use declmap_parser::Parser;

    fn run(sources: &[(&str, &str)]) -> (SymbolTable, DiagnosticCollection, StringInterner) {
        let interner = StringInterner::new();
        let mut modules = Vec::new();
        for (index, (path, text)) in sources.iter().enumerate() {
            let arena = Bump::new();
            let mut parser = Parser::new(&arena, interner.clone(), path, text);
            let sf = parser.parse_source_file();
            let (module, _) = normalize_source_file(&sf, ModuleId(index as u32), &interner);
            modules.push(module);
        }
        let (mut table, _) = merge_modules(&mut modules, &interner);
        let diagnostics = resolve_references(&modules, &mut table, &interner);
        (table, diagnostics, interner)
    }

    fn property_ref<'t>(table: &'t SymbolTable, symbol: &str, member: &str) -> &'t TypeRef {
        let symbol = table.lookup_global(symbol).unwrap();
        let name = table.interner().get(member).unwrap();
        let MemberKind::Property { ty: Some(ty), .. } = &symbol.members[&name].kind else {
            panic!("expected typed property");
        };
        ty
    }

    #[test]
    fn test_ambient_cross_file_resolution() {
        // `ResourceColor` is used in image.d.ts but declared in units.d.ts,
        // with image ingested first.
        let (table, diagnostics, _) = run(&[
            (
                "component/image.d.ts",
                "declare interface ImageError { color: ResourceColor; }",
            ),
            ("component/units.d.ts", "declare type ResourceColor = string | number;"),
        ]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let target = table.lookup_global("ResourceColor").unwrap().id;
        let TypeRef::Named(named) = property_ref(&table, "ImageError", "color") else {
            panic!("expected named ref");
        };
        assert_eq!(named.target, RefTarget::Resolved(target));
    }

    #[test]
    fn test_unknown_name_warns_once_and_does_not_taint() {
        let (table, diagnostics, _) = run(&[(
            "a.d.ts",
            "declare interface W { top: NoSuchType; bottom: NoSuchType; }",
        )]);
        let symbol = table.lookup_global("W").unwrap();
        assert!(!symbol.tainted);
        assert_eq!(diagnostics.len(), 1);
        let warning = &diagnostics.diagnostics()[0];
        assert_eq!(warning.code, messages::CANNOT_RESOLVE_NAME_0.code);
        assert!(!warning.is_error());
        let TypeRef::Named(named) = property_ref(&table, "W", "top") else {
            panic!()
        };
        assert_eq!(named.target, RefTarget::Unresolved);
    }

    #[test]
    fn test_import_type_resolution() {
        let (table, diagnostics, _) = run(&[
            (
                "component/image.d.ts",
                "declare type Filter = import('../api/graphics').ColorFilter;",
            ),
            ("api/graphics.d.ts", "export declare class ColorFilter { level: number; }"),
        ]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let image = table.lookup_global("Filter").unwrap();
        let Some(TypeRef::Named(named)) = &image.ty else {
            panic!()
        };
        assert!(matches!(named.target, RefTarget::Resolved(_)));
    }

    #[test]
    fn test_import_type_missing_module_warns() {
        let (_, diagnostics, _) = run(&[(
            "a.d.ts",
            "declare type X = import('./missing').Thing;",
        )]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.diagnostics()[0].code,
            messages::CANNOT_FIND_MODULE_0.code
        );
    }

    #[test]
    fn test_generic_parameter_shadows_global() {
        let (table, diagnostics, interner) = run(&[(
            "a.d.ts",
            "declare type T = number;\ndeclare interface Box<T> { value: T; }",
        )]);
        assert!(diagnostics.is_empty());
        let box_symbol = table.lookup_global("Box").unwrap();
        let value = interner.intern("value");
        let MemberKind::Property { ty: Some(TypeRef::Named(named)), .. } =
            &box_symbol.members[&value].kind
        else {
            panic!()
        };
        assert_eq!(named.target, RefTarget::TypeParameter);
    }

    #[test]
    fn test_named_import_resolution() {
        let (table, diagnostics, _) = run(&[
            (
                "component/badge.d.ts",
                "import { Resource } from '../api/global/resource';\nexport declare interface BadgeStyle { color: Resource; }",
            ),
            ("api/global/resource.d.ts", "export declare interface Resource { id: number; }"),
        ]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let badge_path = table.interner().get("component/badge.d.ts").unwrap();
        let badge = table.resolve(Scope::Module(badge_path), "BadgeStyle").unwrap();
        let color = table.interner().get("color").unwrap();
        let MemberKind::Property { ty: Some(TypeRef::Named(named)), .. } =
            &badge.members[&color].kind
        else {
            panic!()
        };
        assert!(matches!(named.target, RefTarget::Resolved(_)));
    }

    #[test]
    fn test_nested_member_qualifier() {
        let (table, diagnostics, _) = run(&[
            ("a.d.ts", "declare type Mode = typeof Config.mode;"),
            ("b.d.ts", "declare interface Config { mode: string; }"),
        ]);
        // `Config.mode` exists, so the query resolves to `Config`.
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let mode = table.lookup_global("Mode").unwrap();
        let Some(TypeRef::Query(named)) = &mode.ty else {
            panic!()
        };
        assert!(matches!(named.target, RefTarget::Resolved(_)));
    }
}
