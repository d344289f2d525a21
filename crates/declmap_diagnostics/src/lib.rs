//! declmap_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every defect the pipeline can report — parse defects, unresolved
//! references, merge conflicts — is a structured diagnostic value collected
//! alongside the symbol table, never an abort of the whole batch.

use declmap_core::text::TextSpan;
use std::fmt;

/// Diagnostic category. Merge conflicts and parse defects are errors;
/// unresolved references degrade precision and are warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1002, 3001).
    pub code: u32,
    /// The category of this diagnostic.
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The file path where this diagnostic occurred, if any.
    pub file: Option<String>,
    /// The source text span where this diagnostic occurred, if any.
    pub span: Option<TextSpan>,
    /// The resolved message text.
    pub message_text: String,
    /// The diagnostic code.
    pub code: u32,
    /// The category.
    pub category: DiagnosticCategory,
    /// The qualified symbol name this diagnostic is about, if any.
    pub qualified_name: Option<String>,
    /// Related diagnostics (e.g., the other occurrences of a merge conflict).
    pub related_information: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a new diagnostic without location info (global diagnostic).
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            qualified_name: None,
            related_information: Vec::new(),
        }
    }

    /// Create a new diagnostic with file and span info.
    pub fn with_location(
        file: String,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file),
            span: Some(span),
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            qualified_name: None,
            related_information: Vec::new(),
        }
    }

    /// Attach the qualified name of the affected symbol.
    pub fn for_symbol(mut self, qualified_name: String) -> Self {
        self.qualified_name = Some(qualified_name);
        self
    }

    /// Add related diagnostic information.
    pub fn with_related(mut self, related: Diagnostic) -> Self {
        self.related_information.push(related);
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(
            f,
            "{} DM{}: {}",
            self.category, self.code, self.message_text
        )
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during ingestion.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.category == DiagnosticCategory::Error)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by file, position, and code so the emitted list is
    /// deterministic regardless of the order work was done in.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let file_cmp = a.file.cmp(&b.file);
            if file_cmp != std::cmp::Ordering::Equal {
                return file_cmp;
            }
            let a_pos = a.span.map(|s| s.start).unwrap_or(0);
            let b_pos = b.span.map(|s| s.start).unwrap_or(0);
            let pos_cmp = a_pos.cmp(&b_pos);
            if pos_cmp != std::cmp::Ordering::Equal {
                return pos_cmp;
            }
            a.code.cmp(&b.code)
        });
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Scanner and parser defects (1000-1999)
    // ========================================================================
    pub const INVALID_CHARACTER: DiagnosticMessage = diag!(1001, Error, "Invalid character.");
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1002, Error, "Unterminated string literal.");
    pub const UNTERMINATED_TEMPLATE_LITERAL: DiagnosticMessage = diag!(1003, Error, "Unterminated template literal.");
    pub const DIGIT_EXPECTED: DiagnosticMessage = diag!(1004, Error, "Digit expected.");
    pub const HEXADECIMAL_DIGIT_EXPECTED: DiagnosticMessage = diag!(1005, Error, "Hexadecimal digit expected.");
    pub const UNEXPECTED_END_OF_TEXT: DiagnosticMessage = diag!(1006, Error, "Unexpected end of text.");
    pub const ASTERISK_SLASH_EXPECTED: DiagnosticMessage = diag!(1007, Error, "'*/' expected.");
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1010, Error, "'{0}' expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1011, Error, "Identifier expected.");
    pub const TYPE_EXPECTED: DiagnosticMessage = diag!(1012, Error, "Type expected.");
    pub const DECLARATION_EXPECTED: DiagnosticMessage = diag!(1013, Error, "Declaration expected.");
    pub const ENUM_MEMBER_EXPECTED: DiagnosticMessage = diag!(1014, Error, "Enum member expected.");
    pub const PROPERTY_OR_SIGNATURE_EXPECTED: DiagnosticMessage = diag!(1015, Error, "Property or signature expected.");
    pub const STRING_LITERAL_EXPECTED: DiagnosticMessage = diag!(1016, Error, "String literal expected.");
    pub const ENUM_MEMBER_INITIALIZER_MUST_BE_A_LITERAL: DiagnosticMessage = diag!(1017, Error, "In ambient enum declarations member initializer must be a number or string literal.");
    pub const MODULE_0_EXCLUDED_FROM_INGESTION: DiagnosticMessage = diag!(1020, Error, "File '{0}' could not be parsed as a declaration module and was excluded from the symbol table.");

    // ========================================================================
    // Reference resolution (2000-2999)
    // ========================================================================
    pub const CANNOT_RESOLVE_NAME_0: DiagnosticMessage = diag!(2001, Warning, "Cannot resolve name '{0}'; searched {1}.");
    pub const CANNOT_FIND_MODULE_0: DiagnosticMessage = diag!(2002, Warning, "Cannot find module '{0}' referenced by an import type.");
    pub const MODULE_0_HAS_NO_EXPORTED_MEMBER_1: DiagnosticMessage = diag!(2003, Warning, "Module '{0}' has no exported member '{1}'.");
    pub const _0_HAS_NO_NESTED_MEMBER_1: DiagnosticMessage = diag!(2004, Warning, "'{0}' has no nested member '{1}'.");

    // ========================================================================
    // Declaration merging (3000-3999)
    // ========================================================================
    pub const ENUM_MEMBER_0_HAS_CONFLICTING_VALUES: DiagnosticMessage = diag!(3001, Error, "Enum member '{0}' is declared with conflicting values '{1}' and '{2}'.");
    pub const PROPERTY_0_HAS_CONFLICTING_TYPES: DiagnosticMessage = diag!(3002, Error, "Property '{0}' is declared with conflicting types '{1}' and '{2}'.");
    pub const TYPE_ALIAS_0_REDEFINED_INCOMPATIBLY: DiagnosticMessage = diag!(3003, Error, "Type alias '{0}' is redefined with an incompatible right-hand side.");
    pub const DECLARATION_KIND_CONFLICT_FOR_0: DiagnosticMessage = diag!(3004, Error, "'{0}' is declared both as {1} and as {2}.");
    pub const CONST_0_HAS_CONFLICTING_TYPES: DiagnosticMessage = diag!(3005, Error, "Ambient const '{0}' is declared with conflicting types '{1}' and '{2}'.");
    pub const DUPLICATE_ENUM_MEMBER_0: DiagnosticMessage = diag!(3006, Error, "Enum member '{0}' is declared twice in one body with different values.");
    pub const CONFLICTING_DECLARATION_HERE: DiagnosticMessage = diag!(3009, Error, "The conflicting declaration of '{0}' is here.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let text = format_message("Cannot resolve name '{0}'; searched {1}.", &["Length", "2 modules"]);
        assert_eq!(text, "Cannot resolve name 'Length'; searched 2 modules.");
    }

    #[test]
    fn test_display_with_location() {
        let d = Diagnostic::with_location(
            "units.d.ts".to_string(),
            TextSpan::new(10, 5),
            &messages::_0_EXPECTED,
            &[";"],
        );
        assert_eq!(d.to_string(), "units.d.ts(10): error DM1010: ';' expected.");
    }

    #[test]
    fn test_collection_sort_is_stable_by_file_then_pos() {
        let mut coll = DiagnosticCollection::new();
        coll.add(Diagnostic::with_location(
            "b.d.ts".into(),
            TextSpan::new(3, 1),
            &messages::IDENTIFIER_EXPECTED,
            &[],
        ));
        coll.add(Diagnostic::with_location(
            "a.d.ts".into(),
            TextSpan::new(9, 1),
            &messages::IDENTIFIER_EXPECTED,
            &[],
        ));
        coll.sort();
        assert_eq!(coll.diagnostics()[0].file.as_deref(), Some("a.d.ts"));
    }
}
