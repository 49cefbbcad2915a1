use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::humanize::{extract_location, humanize_error_message};
use crate::token::{Location, Token};

/// Malformed character stream: unterminated string, stray `=` or `!`,
/// unknown character.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{location}: {message}")]
pub struct TokenizerError {
    pub message: String,
    pub file: String,
    pub location: Location,
}

impl TokenizerError {
    pub fn new(file: &str, location: Location, message: impl Into<String>) -> Self {
        TokenizerError {
            message: message.into(),
            file: file.to_owned(),
            location,
        }
    }
}

/// Token stream does not match the grammar. Carries the offending token.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{}: {message}", .token.location)]
pub struct ParseError {
    pub message: String,
    pub file: String,
    pub token: Token,
}

impl ParseError {
    pub fn new(file: &str, token: &Token, message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            file: file.to_owned(),
            token: token.clone(),
        }
    }

    pub fn location(&self) -> Location {
        self.token.location
    }
}

/// Where a [`SyntaxError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    Tokenizer,
    Parser,
    /// Text produced by an older grammar-library frontend.
    Legacy,
}

/// The syntax error handed to callers of [`crate::parse`].
///
/// Both [`TokenizerError`] and [`ParseError`] normalize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{file}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub origin: ErrorOrigin,
}

impl SyntaxError {
    /// Wrap error text from an older frontend, recovering its embedded
    /// `line N char M` position when present.
    pub fn from_legacy_message(file: &str, raw: &str) -> Self {
        let location = extract_location(raw).unwrap_or(Location::new(1, 1));
        SyntaxError {
            message: humanize_error_message(raw),
            file: file.to_owned(),
            line: location.line,
            column: location.column,
            origin: ErrorOrigin::Legacy,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// Serialize with every field present, in a stable key order.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column":  self.column,
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
            "origin":  self.origin,
        })
    }
}

impl From<TokenizerError> for SyntaxError {
    fn from(e: TokenizerError) -> Self {
        SyntaxError {
            message: e.message,
            file: e.file,
            line: e.location.line,
            column: e.location.column,
            origin: ErrorOrigin::Tokenizer,
        }
    }
}

impl From<ParseError> for SyntaxError {
    fn from(e: ParseError) -> Self {
        let location = e.location();
        SyntaxError {
            message: e.message,
            file: e.file,
            line: location.line,
            column: location.column,
            origin: ErrorOrigin::Parser,
        }
    }
}
