//! Editor-facing diagnostics.
//!
//! A failed parse becomes a single [`Diagnostic`]; a collection of them
//! projects into the marker shapes Monaco and CodeMirror consume, or into
//! plain JSON records.

use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::humanize::{extract_location, humanize_error_message};

/// Characters per line assumed when flattening a position into an offset.
const CODEMIRROR_LINE_WIDTH: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Monaco's `MarkerSeverity` value.
    pub fn monaco_code(self) -> u8 {
        match self {
            Severity::Error => 8,
            Severity::Warning => 4,
            Severity::Info => 2,
            Severity::Hint => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Syntax,
    Semantic,
    Runtime,
}

/// One problem at a 1-based line/column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn syntax(line: u32, column: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            column,
            message: message.into(),
            severity: Severity::Error,
            kind: DiagnosticKind::Syntax,
        }
    }

    pub fn from_syntax_error(err: &SyntaxError) -> Self {
        Diagnostic::syntax(err.line, err.column, humanize_error_message(&err.message))
    }

    /// Build from bare error text, such as a message from an older
    /// frontend that embeds `at line N char M`. Falls back to 1:1 when the
    /// text carries no position.
    pub fn from_message(raw: &str) -> Self {
        let (line, column) = extract_location(raw).map_or((1, 1), |l| (l.line, l.column));
        Diagnostic::syntax(line, column, humanize_error_message(raw))
    }

    pub fn to_monaco(&self) -> MonacoMarker {
        MonacoMarker {
            start_line_number: self.line,
            start_column: self.column,
            end_line_number: self.line,
            end_column: self.column + 1,
            message: self.message.clone(),
            severity: self.severity.monaco_code(),
        }
    }

    pub fn to_codemirror(&self) -> CodeMirrorDiagnostic {
        let from = u64::from(self.line.saturating_sub(1)) * CODEMIRROR_LINE_WIDTH
            + u64::from(self.column.saturating_sub(1));
        CodeMirrorDiagnostic {
            from,
            to: from + 1,
            message: self.message.clone(),
            severity: self.severity,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line,
            self.column,
            self.severity.as_str(),
            self.message
        )
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(err: &SyntaxError) -> Self {
        Diagnostic::from_syntax_error(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonacoMarker {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
    pub message: String,
    pub severity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMirrorDiagnostic {
    pub from: u64,
    pub to: u64,
    pub message: String,
    pub severity: Severity,
}

// ──────────────────────────────────────────────
// DiagnosticCollection
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Structured records, in insertion order.
    pub fn records(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn to_monaco(&self) -> Vec<MonacoMarker> {
        self.diagnostics.iter().map(Diagnostic::to_monaco).collect()
    }

    pub fn to_codemirror(&self) -> Vec<CodeMirrorDiagnostic> {
        self.diagnostics
            .iter()
            .map(Diagnostic::to_codemirror)
            .collect()
    }

    /// Flat `{line, column, message, severity, type}` objects.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.diagnostics
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "line": d.line,
                        "column": d.column,
                        "message": d.message,
                        "severity": d.severity,
                        "type": d.kind,
                    })
                })
                .collect(),
        )
    }
}

impl Extend<Diagnostic> for DiagnosticCollection {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.diagnostics.extend(iter);
    }
}

impl FromIterator<Diagnostic> for DiagnosticCollection {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        DiagnosticCollection {
            diagnostics: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DiagnosticCollection {
        let mut c = DiagnosticCollection::new();
        c.push(Diagnostic::syntax(3, 14, "Missing 'do' keyword"));
        c
    }

    #[test]
    fn monaco_marker_shape() {
        let markers = sample().to_monaco();
        assert_eq!(markers.len(), 1);
        let v = serde_json::to_value(&markers[0]).unwrap();
        assert_eq!(v["startLineNumber"], 3);
        assert_eq!(v["startColumn"], 14);
        assert_eq!(v["endLineNumber"], 3);
        assert_eq!(v["endColumn"], 15);
        assert_eq!(v["severity"], 8);
        assert_eq!(v["message"], "Missing 'do' keyword");
    }

    #[test]
    fn codemirror_offsets() {
        let cm = sample().to_codemirror();
        assert_eq!(cm[0].from, 2 * 1000 + 13);
        assert_eq!(cm[0].to, cm[0].from + 1);
        let v = serde_json::to_value(&cm[0]).unwrap();
        assert_eq!(v["severity"], "error");
    }

    #[test]
    fn json_records_use_type_key() {
        let v = sample().to_json();
        assert_eq!(v[0]["type"], "syntax");
        assert_eq!(v[0]["severity"], "error");
        assert_eq!(v[0]["line"], 3);
        // the structured records serialize the same way
        let s = serde_json::to_value(sample()).unwrap();
        assert_eq!(s, v);
    }

    #[test]
    fn severity_codes() {
        assert_eq!(Severity::Warning.monaco_code(), 4);
        assert_eq!(Severity::Info.monaco_code(), 2);
        assert_eq!(Severity::Hint.monaco_code(), 1);
    }

    #[test]
    fn from_legacy_message() {
        let d = Diagnostic::from_message(r#"Expected "do", but got "in" at line 1 char 8."#);
        assert_eq!((d.line, d.column), (1, 8));
        assert_eq!(d.message, r#"Missing 'do' keyword, but got "in""#);

        let d = Diagnostic::from_message("Premature end of input");
        assert_eq!((d.line, d.column), (1, 1));
        assert_eq!(d.message, "Unexpected end of input");
    }

    #[test]
    fn errors_filter_by_severity() {
        let mut c = sample();
        c.push(Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::syntax(1, 1, "unused")
        });
        assert_eq!(c.count(), 2);
        assert_eq!(c.errors().count(), 1);
        assert!(c.has_errors());
        assert_eq!(c.first().map(|d| d.line), Some(3));
    }

    #[test]
    fn display_is_compact() {
        let d = Diagnostic::syntax(2, 4, "Unexpected end of input");
        assert_eq!(d.to_string(), "2:4: error: Unexpected end of input");
    }
}
