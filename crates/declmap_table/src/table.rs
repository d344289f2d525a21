//! The queryable symbol table built once per ingestion run.

use crate::symbol::{Member, ModuleId, Scope, Symbol, SymbolId};
use declmap_core::collections::FxMap;
use declmap_core::intern::{InternedString, StringInterner};

/// Whether a file was a true module or an ambient script.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ModuleKind {
    /// Contains top-level import/export; names are module-scoped.
    ExternalModule,
    /// Pure ambient declarations; names land in the global scope.
    AmbientScript,
}

/// Per-file record kept for location rendering and module-path lookups.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: ModuleId,
    /// The path the file was ingested under, interned.
    pub path: InternedString,
    pub kind: ModuleKind,
}

/// The process-wide symbol table: all modules' symbols after merge and
/// resolution. Queried read-only by the downstream analyzer; mutation
/// requires `&mut self` and stops at the pipeline boundary.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    interner: StringInterner,
    modules: Vec<ModuleInfo>,
    symbols: Vec<Symbol>,
    index: FxMap<(Scope, InternedString), SymbolId>,
}

impl SymbolTable {
    pub fn new(interner: StringInterner, modules: Vec<ModuleInfo>) -> Self {
        Self {
            interner,
            modules,
            symbols: Vec::new(),
            index: FxMap::default(),
        }
    }

    /// The interner shared by every name in this table.
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    // ========================================================================
    // Construction (pipeline-internal; all take &mut self)
    // ========================================================================

    /// Insert a merged symbol. Panics in debug builds if the key is already
    /// present — the merge engine guarantees one symbol per key.
    pub fn insert(&mut self, symbol: Symbol) -> SymbolId {
        let id = symbol.id;
        debug_assert_eq!(id.index(), self.symbols.len());
        debug_assert!(!self.index.contains_key(&(symbol.scope, symbol.name)));
        self.index.insert((symbol.scope, symbol.name), id);
        self.symbols.push(symbol);
        id
    }

    /// Mutable access to all symbols, for the resolver pass.
    pub fn symbols_mut(&mut self) -> &mut [Symbol] {
        &mut self.symbols
    }

    /// Mark a symbol tainted.
    pub fn mark_tainted(&mut self, id: SymbolId) {
        if let Some(symbol) = self.symbols.get_mut(id.index()) {
            symbol.tainted = true;
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Resolve a name within a scope.
    pub fn resolve(&self, scope: Scope, name: &str) -> Option<&Symbol> {
        let name = self.interner.get(name)?;
        self.resolve_interned(scope, name)
    }

    /// Resolve an already-interned name within a scope.
    pub fn resolve_interned(&self, scope: Scope, name: InternedString) -> Option<&Symbol> {
        let id = self.index.get(&(scope, name))?;
        self.symbols.get(id.index())
    }

    /// Resolve a name in the global ambient scope.
    pub fn lookup_global(&self, name: &str) -> Option<&Symbol> {
        self.resolve(Scope::Global, name)
    }

    /// Look up the id for a scope/name pair.
    pub fn lookup_id(&self, scope: Scope, name: InternedString) -> Option<SymbolId> {
        self.index.get(&(scope, name)).copied()
    }

    /// Get a symbol by id.
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// The members of a symbol, in first-seen source order.
    pub fn members_of(&self, id: SymbolId) -> impl Iterator<Item = &Member> {
        self.symbols
            .get(id.index())
            .into_iter()
            .flat_map(|s| s.members.values())
    }

    /// Whether a symbol's occurrences disagreed incompatibly.
    pub fn is_tainted(&self, id: SymbolId) -> bool {
        self.symbols
            .get(id.index())
            .map(|s| s.tainted)
            .unwrap_or(false)
    }

    /// All symbols, in id order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of symbols in the table.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get a module record by id.
    pub fn module(&self, id: ModuleId) -> Option<&ModuleInfo> {
        self.modules.get(id.index())
    }

    /// All module records, in id order.
    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    /// Render the path of a module for diagnostics.
    pub fn module_path(&self, id: ModuleId) -> &str {
        self.modules
            .get(id.index())
            .map(|m| self.interner.resolve(m.path))
            .unwrap_or("<unknown>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::DeclKind;

    #[test]
    fn test_insert_and_resolve() {
        let interner = StringInterner::new();
        let name = interner.intern("Color");
        let mut table = SymbolTable::new(interner.clone(), Vec::new());
        table.insert(Symbol::new(SymbolId(0), Scope::Global, name, DeclKind::Enum));

        let found = table.lookup_global("Color").unwrap();
        assert_eq!(found.kind, DeclKind::Enum);
        assert!(table.resolve(Scope::Global, "Colour").is_none());
    }

    #[test]
    fn test_tainted_query() {
        let interner = StringInterner::new();
        let name = interner.intern("CheckBoxShape");
        let mut table = SymbolTable::new(interner, Vec::new());
        let id = table.insert(Symbol::new(SymbolId(0), Scope::Global, name, DeclKind::Enum));
        assert!(!table.is_tainted(id));
        table.mark_tainted(id);
        assert!(table.is_tainted(id));
    }
}
