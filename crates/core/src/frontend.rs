//! Text -> syntax tree: tokenize, parse, and report failures with
//! user-facing messages.
//!
//! Every entry point here returns [`SyntaxError`] with an already
//! humanized message, so callers never see raw grammar text.

use crate::ast::Root;
use crate::diagnostics::{Diagnostic, DiagnosticCollection};
use crate::error::SyntaxError;
use crate::humanize::humanize_error_message;
use crate::lexer;
use crate::parser;
use crate::token::Token;

/// Name used when the caller has no file to attribute the text to.
pub const DEFAULT_SOURCE_NAME: &str = "<input>";

fn normalize(err: impl Into<SyntaxError>) -> SyntaxError {
    let mut err = err.into();
    err.message = humanize_error_message(&err.message);
    err
}

/// Tokenize `text`. Comment tokens are kept.
pub fn tokenize(text: &str, source_file: &str) -> Result<Vec<Token>, SyntaxError> {
    lexer::tokenize(text, source_file).map_err(normalize)
}

/// Parse a complete schema.
pub fn parse(text: &str, source_file: &str) -> Result<Root, SyntaxError> {
    let tokens = tokenize(text, source_file)?;
    tracing::debug!(file = source_file, tokens = tokens.len(), "tokenized");
    let root = parser::parse(&tokens, source_file).map_err(normalize)?;
    tracing::debug!(
        file = source_file,
        inputs = root.inputs.len(),
        values = root.values.len(),
        traits = root.traits.len(),
        imports = root.imports.len(),
        "parsed schema"
    );
    Ok(root)
}

pub fn is_valid(text: &str, source_file: &str) -> bool {
    parse(text, source_file).is_ok()
}

/// Empty on success, one syntax diagnostic otherwise.
pub fn validate(text: &str, source_file: &str) -> DiagnosticCollection {
    let mut diagnostics = DiagnosticCollection::new();
    if let Err(err) = parse(text, source_file) {
        tracing::debug!(file = source_file, error = %err, "validation failed");
        diagnostics.push(Diagnostic::from_syntax_error(&err));
    }
    diagnostics
}
