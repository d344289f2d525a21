//! The merge reduction: draft occurrences → one symbol per key.

use declmap_core::collections::FxIndexMap;
use declmap_core::intern::{InternedString, StringInterner};
use declmap_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use declmap_normalize::{DraftSymbol, Module};
use declmap_table::{
    merge_member, DeclKind, MemberMergeOutcome, ModuleInfo, Scope, SourceLocation, Symbol,
    SymbolId, SymbolTable,
};

/// Merge all modules' drafts into a symbol table.
///
/// Drafts are moved out of the modules; import tables and module metadata are
/// left in place for the resolver pass. Modules must already be in their
/// final (path-sorted) order — ids and reduction order both derive from it.
pub fn merge_modules(
    modules: &mut [Module],
    interner: &StringInterner,
) -> (SymbolTable, DiagnosticCollection) {
    let infos: Vec<ModuleInfo> = modules
        .iter()
        .map(|m| ModuleInfo {
            id: m.id,
            path: m.path,
            kind: m.kind,
        })
        .collect();
    let mut table = SymbolTable::new(interner.clone(), infos);
    let mut diagnostics = DiagnosticCollection::new();

    // Group occurrences by key, preserving first-occurrence order for
    // deterministic id assignment.
    let mut groups: FxIndexMap<(Scope, InternedString), Vec<DraftSymbol>> = FxIndexMap::default();
    for module in modules.iter_mut() {
        for draft in std::mem::take(&mut module.drafts) {
            groups.entry((draft.scope, draft.name)).or_default().push(draft);
        }
    }

    let mut merger = Merger {
        table: &mut table,
        interner,
        diagnostics: &mut diagnostics,
    };
    for ((scope, name), mut occurrences) in groups {
        occurrences.sort_by_key(|draft| draft.location);
        merger.merge_group(scope, name, occurrences);
    }

    (table, diagnostics)
}

struct Merger<'m> {
    table: &'m mut SymbolTable,
    interner: &'m StringInterner,
    diagnostics: &'m mut DiagnosticCollection,
}

impl<'m> Merger<'m> {
    fn merge_group(
        &mut self,
        scope: Scope,
        name: InternedString,
        occurrences: Vec<DraftSymbol>,
    ) {
        let id = SymbolId(self.table.len() as u32);
        let mut occurrences = occurrences.into_iter();
        let Some(first) = occurrences.next() else {
            return;
        };

        let mut symbol = Symbol::new(id, scope, name, first.kind);
        symbol.exported = first.exported;
        symbol.tainted = first.tainted;
        symbol.locations.push(first.location);
        symbol.generics = first.generics;
        symbol.members = first.members;
        symbol.heritage = first.heritage;
        symbol.ty = first.ty;

        for occurrence in occurrences {
            self.merge_occurrence(&mut symbol, occurrence);
        }

        self.table.insert(symbol);
    }

    fn merge_occurrence(&mut self, symbol: &mut Symbol, occurrence: DraftSymbol) {
        let first_location = symbol.locations[0];
        symbol.locations.push(occurrence.location);
        symbol.exported |= occurrence.exported;
        symbol.tainted |= occurrence.tainted;

        if occurrence.kind != symbol.kind {
            symbol.tainted = true;
            let name = self.interner.resolve(symbol.name).to_string();
            self.report(
                symbol,
                occurrence.location,
                first_location,
                &messages::DECLARATION_KIND_CONFLICT_FOR_0,
                &[
                    &name,
                    symbol.kind.article_phrase(),
                    occurrence.kind.article_phrase(),
                ],
            );
            // The rest of the occurrence describes a different kind of
            // entity; folding its members in would only compound the damage.
            return;
        }

        match symbol.kind {
            DeclKind::Enum | DeclKind::Interface | DeclKind::Class => {
                self.merge_members(symbol, occurrence);
            }
            DeclKind::TypeAlias => {
                self.merge_alias(symbol, occurrence, first_location);
            }
            DeclKind::Const => {
                self.merge_const(symbol, occurrence, first_location);
            }
        }
    }

    fn merge_members(&mut self, symbol: &mut Symbol, occurrence: DraftSymbol) {
        if symbol.generics.is_empty() {
            symbol.generics = occurrence.generics;
        }
        for heritage in occurrence.heritage {
            if !symbol.heritage.contains(&heritage) {
                symbol.heritage.push(heritage);
            }
        }

        let is_enum = symbol.kind == DeclKind::Enum;
        for (member_name, incoming) in occurrence.members {
            let Some(existing) = symbol.members.get_mut(&member_name) else {
                symbol.members.insert(member_name, incoming);
                continue;
            };
            let existing_location = existing.locations[0];
            let incoming_location = incoming.locations[0];
            match merge_member(existing, incoming, self.interner) {
                MemberMergeOutcome::Merged => {}
                MemberMergeOutcome::Conflict {
                    existing: existing_text,
                    incoming: incoming_text,
                } => {
                    symbol.tainted = true;
                    let member = self.interner.resolve(member_name).to_string();
                    let message = if is_enum {
                        &messages::ENUM_MEMBER_0_HAS_CONFLICTING_VALUES
                    } else {
                        &messages::PROPERTY_0_HAS_CONFLICTING_TYPES
                    };
                    self.report(
                        symbol,
                        incoming_location,
                        existing_location,
                        message,
                        &[&member, &existing_text, &incoming_text],
                    );
                }
            }
        }
    }

    fn merge_alias(
        &mut self,
        symbol: &mut Symbol,
        occurrence: DraftSymbol,
        first_location: SourceLocation,
    ) {
        let Some(incoming) = occurrence.ty else {
            return;
        };
        let Some(existing) = symbol.ty.as_ref() else {
            symbol.ty = Some(incoming);
            return;
        };
        if *existing == incoming {
            return;
        }
        // A strict widening — the new right-hand side is a union containing
        // every old arm — unions the arms instead of conflicting.
        if incoming.is_widening_of(existing) {
            symbol.ty = Some(incoming);
            return;
        }
        if existing.is_widening_of(&incoming) {
            return;
        }
        symbol.tainted = true;
        let name = self.interner.resolve(symbol.name).to_string();
        self.report(
            symbol,
            occurrence.location,
            first_location,
            &messages::TYPE_ALIAS_0_REDEFINED_INCOMPATIBLY,
            &[&name],
        );
    }

    fn merge_const(
        &mut self,
        symbol: &mut Symbol,
        occurrence: DraftSymbol,
        first_location: SourceLocation,
    ) {
        let Some(incoming) = occurrence.ty else {
            return;
        };
        let Some(existing) = symbol.ty.as_ref() else {
            symbol.ty = Some(incoming);
            return;
        };
        if *existing == incoming {
            return;
        }
        let existing_text = existing.display(self.interner);
        let incoming_text = incoming.display(self.interner);
        symbol.tainted = true;
        let name = self.interner.resolve(symbol.name).to_string();
        self.report(
            symbol,
            occurrence.location,
            first_location,
            &messages::CONST_0_HAS_CONFLICTING_TYPES,
            &[&name, &existing_text, &incoming_text],
        );
    }

    /// Emit a merge-conflict diagnostic naming both locations and the
    /// affected qualified name.
    fn report(
        &mut self,
        symbol: &Symbol,
        at: SourceLocation,
        related: SourceLocation,
        message: &declmap_diagnostics::DiagnosticMessage,
        args: &[&str],
    ) {
        let name = self.interner.resolve(symbol.name).to_string();
        let diagnostic = Diagnostic::with_location(
            self.table.module_path(at.module).to_string(),
            at.span,
            message,
            args,
        )
        .for_symbol(symbol.qualified_name(self.interner))
        .with_related(Diagnostic::with_location(
            self.table.module_path(related.module).to_string(),
            related.span,
            &messages::CONFLICTING_DECLARATION_HERE,
            &[&name],
        ));
        self.diagnostics.add(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use declmap_normalize::normalize_source_file;
    use declmap_parser::Parser;
    use declmap_table::{LiteralValue, MemberKind, ModuleId, TypeRef};

    fn merge_sources(sources: &[(&str, &str)]) -> (SymbolTable, DiagnosticCollection, StringInterner) {
        let interner = StringInterner::new();
        let mut modules = Vec::new();
        for (index, (path, text)) in sources.iter().enumerate() {
            let arena = Bump::new();
            let mut parser = Parser::new(&arena, interner.clone(), path, text);
            let sf = parser.parse_source_file();
            let (module, _) = normalize_source_file(&sf, ModuleId(index as u32), &interner);
            modules.push(module);
        }
        let (table, diagnostics) = merge_modules(&mut modules, &interner);
        (table, diagnostics, interner)
    }

    #[test]
    fn test_enum_pure_addition_merges_clean() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare enum Color { White, Black }"),
            ("b.d.ts", "declare enum Color { White, Black, Blue }"),
        ]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let color = table.lookup_global("Color").unwrap();
        assert!(!color.tainted);
        assert_eq!(color.members.len(), 3);
        assert_eq!(color.locations.len(), 2);
    }

    #[test]
    fn test_enum_value_conflict_taints() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare enum CheckBoxShape { CIRCLE = 0 }"),
            ("b.d.ts", "declare enum CheckBoxShape { CIRCLE = 1 }"),
        ]);
        let symbol = table.lookup_global("CheckBoxShape").unwrap();
        assert!(symbol.tainted);
        assert_eq!(diagnostics.error_count(), 1);
        let diagnostic = &diagnostics.diagnostics()[0];
        assert_eq!(
            diagnostic.code,
            messages::ENUM_MEMBER_0_HAS_CONFLICTING_VALUES.code
        );
        // Both conflicting source locations are named.
        assert_eq!(diagnostic.file.as_deref(), Some("b.d.ts"));
        assert_eq!(
            diagnostic.related_information[0].file.as_deref(),
            Some("a.d.ts")
        );
    }

    #[test]
    fn test_explicit_value_meets_implicit() {
        let (table, diagnostics, interner) = merge_sources(&[
            ("a.d.ts", "declare enum E { A }"),
            ("b.d.ts", "declare enum E { A = 3 }"),
        ]);
        assert!(diagnostics.is_empty());
        let symbol = table.lookup_global("E").unwrap();
        let a = interner.intern("A");
        assert!(matches!(
            &symbol.members[&a].kind,
            MemberKind::EnumVariant { value: Some(LiteralValue::Number(v)) } if *v == 3.0
        ));
    }

    #[test]
    fn test_interface_property_conflict() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare interface Opts { value: string; }"),
            ("b.d.ts", "declare interface Opts { value: boolean; }"),
        ]);
        assert!(table.lookup_global("Opts").unwrap().tainted);
        assert_eq!(diagnostics.error_count(), 1);
    }

    #[test]
    fn test_interface_overloads_merge_clean() {
        let (table, diagnostics, interner) = merge_sources(&[
            ("a.d.ts", "declare interface A { width(v: number): A; }"),
            ("b.d.ts", "declare interface A { width(v: string): A; }"),
        ]);
        assert!(diagnostics.is_empty());
        let symbol = table.lookup_global("A").unwrap();
        let width = interner.intern("width");
        let MemberKind::Method { signatures } = &symbol.members[&width].kind else {
            panic!()
        };
        assert_eq!(signatures.len(), 2);
        assert!(!symbol.tainted);
    }

    #[test]
    fn test_alias_widening_unions_arms() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare type Length = string | number;"),
            ("b.d.ts", "declare type Length = string | number | Resource;"),
        ]);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics.diagnostics());
        let symbol = table.lookup_global("Length").unwrap();
        assert!(!symbol.tainted);
        let Some(TypeRef::Union(arms)) = &symbol.ty else {
            panic!("expected union");
        };
        assert_eq!(arms.len(), 3);
    }

    #[test]
    fn test_alias_incompatible_redefinition() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare type Length = string;"),
            ("b.d.ts", "declare type Length = boolean;"),
        ]);
        assert!(table.lookup_global("Length").unwrap().tainted);
        assert_eq!(
            diagnostics.diagnostics()[0].code,
            messages::TYPE_ALIAS_0_REDEFINED_INCOMPATIBLY.code
        );
    }

    #[test]
    fn test_kind_conflict() {
        let (table, diagnostics, _) = merge_sources(&[
            ("a.d.ts", "declare enum Shape { Circle }"),
            ("b.d.ts", "declare interface Shape { radius: number; }"),
        ]);
        let symbol = table.lookup_global("Shape").unwrap();
        assert!(symbol.tainted);
        assert_eq!(symbol.kind, DeclKind::Enum);
        assert_eq!(
            diagnostics.diagnostics()[0].code,
            messages::DECLARATION_KIND_CONFLICT_FOR_0.code
        );
    }

    #[test]
    fn test_order_independence_of_shapes() {
        let forward = [
            ("a.d.ts", "declare enum Color { White }"),
            ("b.d.ts", "declare enum Color { White, Blue }"),
        ];
        let (table_a, _, _) = merge_sources(&forward);
        // Shuffled ingestion arrives pre-sorted by the pipeline; simulate by
        // swapping which file carries which body.
        let backward = [
            ("a.d.ts", "declare enum Color { White, Blue }"),
            ("b.d.ts", "declare enum Color { White }"),
        ];
        let (table_b, _, _) = merge_sources(&backward);
        let a = table_a.lookup_global("Color").unwrap();
        let b = table_b.lookup_global("Color").unwrap();
        assert_eq!(a.members.len(), b.members.len());
        assert_eq!(a.tainted, b.tainted);
    }

    #[test]
    fn test_module_scoped_symbols_do_not_collide() {
        let (table, diagnostics, interner) = merge_sources(&[
            ("a.d.ts", "export declare enum Kind { A }"),
            ("b.d.ts", "export declare enum Kind { B }"),
        ]);
        assert!(diagnostics.is_empty());
        assert_eq!(table.len(), 2);
        let a_path = interner.intern("a.d.ts");
        let symbol = table
            .resolve(Scope::Module(a_path), "Kind")
            .expect("module-scoped lookup");
        assert_eq!(symbol.members.len(), 1);
    }
}
