//! declmap: Ingest a declaration SDK surface and query the merged symbol table.
//!
//! Usage:
//!   declmap ingest <dir> [--json]
//!   declmap query <dir> <name> [--module <path>]

use clap::{Parser as ClapParser, Subcommand};
use declmap_core::text::LineMap;
use declmap_diagnostics::{Diagnostic, DiagnosticCategory};
use declmap_pipeline::{ingest, Ingestion, SourceInput};
use declmap_table::{LiteralValue, MemberKind, Scope, Symbol, SymbolTable};
use miette::{miette, IntoDiagnostic, WrapErr};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

#[derive(ClapParser, Debug)]
#[command(
    name = "declmap",
    about = "declmap - a declaration-surface symbol resolver for .d.ts SDK trees",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest every declaration file under a directory and report diagnostics.
    Ingest {
        /// Root directory of the declaration corpus.
        dir: PathBuf,
        /// Emit diagnostics as JSON lines instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
    /// Ingest a corpus, resolve one name, and print the merged symbol as JSON.
    Query {
        /// Root directory of the declaration corpus.
        dir: PathBuf,
        /// The symbol name to resolve.
        name: String,
        /// Resolve in a module's scope instead of the global ambient scope.
        #[arg(long)]
        module: Option<String>,
    },
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { dir, json } => run_ingest(&dir, json),
        Command::Query { dir, name, module } => run_query(&dir, &name, module.as_deref()),
    }
}

/// Collect `.d.ts`/`.d.ets` files under the corpus root, keyed by their
/// root-relative forward-slash paths.
fn collect_sources(dir: &Path) -> miette::Result<Vec<SourceInput>> {
    let mut sources = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.into_diagnostic().wrap_err("walking corpus directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".d.ts") && !name.ends_with(".d.ets") {
            continue;
        }
        let text = std::fs::read_to_string(entry.path())
            .into_diagnostic()
            .wrap_err_with(|| format!("reading {}", entry.path().display()))?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        sources.push(SourceInput::new(relative, text));
    }
    Ok(sources)
}

fn run_pipeline(dir: &Path) -> miette::Result<(Ingestion, LineMaps)> {
    let sources = collect_sources(dir)?;
    let line_maps: LineMaps = sources
        .iter()
        .map(|s| (s.path.clone(), LineMap::new(&s.text)))
        .collect();
    let ingestion = ingest(sources).into_diagnostic()?;
    Ok((ingestion, line_maps))
}

/// Per-file line maps for rendering offsets as line:column.
type LineMaps = HashMap<String, LineMap>;

fn run_ingest(dir: &Path, json: bool) -> miette::Result<()> {
    let start = Instant::now();
    let (ingestion, line_maps) = run_pipeline(dir)?;
    let file_count = line_maps.len();

    if json {
        for diagnostic in &ingestion.diagnostics {
            let line = serde_json::to_string(&DiagnosticDto::from(diagnostic)).into_diagnostic()?;
            println!("{}", line);
        }
    } else {
        for diagnostic in &ingestion.diagnostics {
            print_diagnostic(diagnostic, 0, &line_maps);
        }
        let errors = ingestion.diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = ingestion.diagnostics.len() - errors;
        let tainted = ingestion
            .table
            .symbols()
            .iter()
            .filter(|s| s.tainted)
            .count();
        println!(
            "{}{} files, {} symbols ({} tainted), {} errors, {} warnings in {:.1?}{}",
            BOLD,
            file_count,
            ingestion.table.len(),
            tainted,
            errors,
            warnings,
            start.elapsed(),
            RESET,
        );
    }

    if ingestion.has_errors() {
        process::exit(1);
    }
    Ok(())
}

fn print_diagnostic(diagnostic: &Diagnostic, depth: usize, line_maps: &LineMaps) {
    let color = match diagnostic.category {
        DiagnosticCategory::Error => RED,
        DiagnosticCategory::Warning => YELLOW,
    };
    let indent = "  ".repeat(depth);
    if let Some(file) = &diagnostic.file {
        // tsc-style `file(line,col)`, 1-based.
        let pos = match (diagnostic.span, line_maps.get(file)) {
            (Some(span), Some(map)) => {
                let lc = map.line_and_column_of(span.start);
                format!("({},{})", lc.line + 1, lc.character + 1)
            }
            (Some(span), None) => format!("({})", span.start),
            (None, _) => String::new(),
        };
        print!("{}{}{}{}{}: ", indent, GRAY, file, pos, RESET);
    } else {
        print!("{}", indent);
    }
    println!(
        "{}{} DM{}{}: {}",
        color, diagnostic.category, diagnostic.code, RESET, diagnostic.message_text
    );
    for related in &diagnostic.related_information {
        print_diagnostic(related, depth + 1, line_maps);
    }
}

fn run_query(dir: &Path, name: &str, module: Option<&str>) -> miette::Result<()> {
    let (ingestion, _) = run_pipeline(dir)?;
    let table = &ingestion.table;

    let symbol = match module {
        Some(module_path) => {
            let path = table
                .interner()
                .get(module_path)
                .ok_or_else(|| miette!("no module '{}' in the corpus", module_path))?;
            table.resolve(Scope::Module(path), name)
        }
        None => table.lookup_global(name),
    };
    let Some(symbol) = symbol else {
        return Err(miette!("cannot resolve '{}'", name));
    };

    let dto = SymbolDto::from_symbol(symbol, table);
    println!(
        "{}",
        serde_json::to_string_pretty(&dto).into_diagnostic()?
    );
    Ok(())
}

// ============================================================================
// JSON output shapes
// ============================================================================

#[derive(Serialize)]
struct DiagnosticDto<'a> {
    severity: &'static str,
    code: u32,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    related: Vec<DiagnosticDto<'a>>,
}

impl<'a> From<&'a Diagnostic> for DiagnosticDto<'a> {
    fn from(diagnostic: &'a Diagnostic) -> Self {
        Self {
            severity: match diagnostic.category {
                DiagnosticCategory::Error => "error",
                DiagnosticCategory::Warning => "warning",
            },
            code: diagnostic.code,
            message: &diagnostic.message_text,
            file: diagnostic.file.as_deref(),
            start: diagnostic.span.map(|s| s.start),
            symbol: diagnostic.qualified_name.as_deref(),
            related: diagnostic
                .related_information
                .iter()
                .map(DiagnosticDto::from)
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct LocationDto {
    file: String,
    start: u32,
    end: u32,
}

#[derive(Serialize)]
struct MemberDto {
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    readonly: bool,
    #[serde(skip_serializing_if = "is_zero")]
    signatures: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[derive(Serialize)]
struct SymbolDto {
    name: String,
    qualified_name: String,
    kind: String,
    exported: bool,
    tainted: bool,
    occurrences: Vec<LocationDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    generics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    heritage: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<String>,
    members: Vec<MemberDto>,
}

impl SymbolDto {
    fn from_symbol(symbol: &Symbol, table: &SymbolTable) -> Self {
        let interner = table.interner();
        Self {
            name: interner.resolve(symbol.name).to_string(),
            qualified_name: symbol.qualified_name(interner),
            kind: symbol.kind.to_string(),
            exported: symbol.exported,
            tainted: symbol.tainted,
            occurrences: symbol
                .locations
                .iter()
                .map(|location| LocationDto {
                    file: table.module_path(location.module).to_string(),
                    start: location.span.start,
                    end: location.span.end(),
                })
                .collect(),
            generics: symbol
                .generics
                .iter()
                .map(|g| interner.resolve(g.name).to_string())
                .collect(),
            heritage: symbol
                .heritage
                .iter()
                .map(|h| h.display(interner))
                .collect(),
            ty: symbol.ty.as_ref().map(|t| t.display(interner)),
            members: symbol
                .members
                .values()
                .map(|member| {
                    let (kind, value, ty, optional, readonly, signatures) = match &member.kind {
                        MemberKind::EnumVariant { value } => (
                            "enum-member",
                            value.as_ref().map(render_value),
                            None,
                            false,
                            false,
                            0,
                        ),
                        MemberKind::Property { ty, optional, readonly } => (
                            "property",
                            None,
                            ty.as_ref().map(|t| t.display(interner)),
                            *optional,
                            *readonly,
                            0,
                        ),
                        MemberKind::Method { signatures } => {
                            ("method", None, None, false, false, signatures.len())
                        }
                        MemberKind::Call { signatures } => {
                            ("call-signature", None, None, false, false, signatures.len())
                        }
                        MemberKind::Construct { signatures } => (
                            "construct-signature",
                            None,
                            None,
                            false,
                            false,
                            signatures.len(),
                        ),
                        MemberKind::Index { ty, .. } => (
                            "index-signature",
                            None,
                            Some(ty.display(interner)),
                            false,
                            false,
                            0,
                        ),
                    };
                    MemberDto {
                        name: interner.resolve(member.name).to_string(),
                        kind,
                        value,
                        ty,
                        optional,
                        readonly,
                        signatures,
                    }
                })
                .collect(),
        }
    }
}

fn render_value(value: &LiteralValue) -> String {
    value.to_string()
}
