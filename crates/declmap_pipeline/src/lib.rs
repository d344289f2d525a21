//! declmap_pipeline: Batch orchestration of the ingestion run.
//!
//! `ingest` is the library entry point the downstream analyzer calls: a set
//! of `(path, text)` pairs in, a symbol table plus diagnostics out. The run
//! never aborts for a single file's or symbol's defect — parse-broken files
//! are excluded and reported, conflicting symbols come back tainted, and
//! unresolved references come back as warnings.
//!
//! Scan, parse, and normalize are embarrassingly parallel per file (each
//! task owns its arena and diagnostics; results are reduced after the join).
//! Merge and the two resolver passes run sequentially after that barrier.
//! Inputs are sorted by path before ids are assigned, which makes the whole
//! run independent of input order.

use declmap_core::arena::DeclArena;
use declmap_core::intern::StringInterner;
use declmap_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use declmap_merge::merge_modules;
use declmap_normalize::{normalize_source_file, Module};
use declmap_parser::Parser;
use declmap_resolve::resolve_references;
use declmap_table::{ModuleId, SymbolTable};
use rayon::prelude::*;
use thiserror::Error;

/// One input file for an ingestion run.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub path: String,
    pub text: String,
}

impl SourceInput {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// The result of an ingestion run: the queryable table plus every
/// diagnostic, sorted by file and position.
#[derive(Debug)]
pub struct Ingestion {
    pub table: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl Ingestion {
    /// Whether any error-category diagnostic was produced.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

/// Catastrophic failures that abort the whole batch. Per-file and per-symbol
/// defects never land here; they are diagnostics.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("cannot ingest {0} files: module id space is 32-bit")]
    TooManyModules(usize),
}

/// Build a symbol table from a set of declaration files.
pub fn ingest(mut sources: Vec<SourceInput>) -> Result<Ingestion, FatalError> {
    if sources.len() >= u32::MAX as usize {
        return Err(FatalError::TooManyModules(sources.len()));
    }
    // Path order, not input order, drives id assignment and merge order.
    sources.sort_by(|a, b| a.path.cmp(&b.path));

    let interner = StringInterner::new();

    // Per-file front-end, one task per file, no shared mutable state.
    let per_file: Vec<(Module, DiagnosticCollection, bool)> = sources
        .par_iter()
        .enumerate()
        .map(|(index, source)| {
            let arena = DeclArena::new();
            let mut parser = Parser::new(
                arena.bump(),
                interner.clone(),
                &source.path,
                &source.text,
            );
            let source_file = parser.parse_source_file();
            let mut diagnostics = parser.take_diagnostics();
            let parse_failed = diagnostics.has_errors();
            let (module, normalize_diagnostics) =
                normalize_source_file(&source_file, ModuleId(index as u32), &interner);
            diagnostics.extend(normalize_diagnostics);
            (module, diagnostics, parse_failed)
        })
        .collect();

    let mut all_diagnostics = DiagnosticCollection::new();
    let mut modules = Vec::with_capacity(per_file.len());
    for (mut module, diagnostics, parse_failed) in per_file {
        if parse_failed {
            // ParseDefect policy: the offending file is excluded from the
            // table; everything else proceeds.
            let path = interner.resolve(module.path).to_string();
            all_diagnostics.add(Diagnostic::new(
                &messages::MODULE_0_EXCLUDED_FROM_INGESTION,
                &[&path],
            ));
            module.drafts.clear();
            module.imports.clear();
        }
        all_diagnostics.extend(diagnostics);
        modules.push(module);
    }

    let (mut table, merge_diagnostics) = merge_modules(&mut modules, &interner);
    all_diagnostics.extend(merge_diagnostics);

    let resolve_diagnostics = resolve_references(&modules, &mut table, &interner);
    all_diagnostics.extend(resolve_diagnostics);

    all_diagnostics.sort();
    Ok(Ingestion {
        table,
        diagnostics: all_diagnostics.into_diagnostics(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_corpus() {
        let ingestion = ingest(Vec::new()).unwrap();
        assert!(ingestion.table.is_empty());
        assert!(ingestion.diagnostics.is_empty());
    }

    #[test]
    fn test_single_file() {
        let ingestion = ingest(vec![SourceInput::new(
            "color.d.ts",
            "declare enum Color { White, Black }",
        )])
        .unwrap();
        assert_eq!(ingestion.table.len(), 1);
        assert!(ingestion.diagnostics.is_empty());
        assert!(!ingestion.has_errors());
    }
}
